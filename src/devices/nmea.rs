use super::GpsFix;
use crate::navigation::GeoPoint;
use regex::Regex;
use std::sync::LazyLock;

static GGA_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\$G[PNL]GGA,").unwrap());

/// Fields extracted from a GGA sentence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GgaFix {
    quality: u8,
    satellites: u8,
    position: Option<GeoPoint>,
}

impl GgaFix {
    pub fn quality(&self) -> u8 { self.quality }
    pub fn satellites(&self) -> u8 { self.satellites }
    pub fn position(&self) -> Option<GeoPoint> { self.position }

    pub fn to_gps_fix(&self) -> GpsFix {
        match self.position {
            Some(pos) if self.quality > 0 => GpsFix::fix(pos),
            _ => GpsFix::none(),
        }
    }
}

/// Extracts fix quality and position from a `$GPGGA` / `$GNGGA` / `$GLGGA` line.
///
/// # Returns
/// - `None` if `sentence` is not a GGA sentence or is truncated before the quality field.
/// - A `GgaFix` without position if the coordinate fields are empty or malformed.
pub fn parse_gga(sentence: &str) -> Option<GgaFix> {
    let line = sentence.trim();
    if !GGA_REGEX.is_match(line) {
        return None;
    }
    let body = line.split('*').next().unwrap_or(line);
    let fields: Vec<&str> = body.split(',').collect();
    if fields.len() < 7 {
        return None;
    }
    let lat = nmea_to_decimal(fields[2], fields[3]);
    let lon = nmea_to_decimal(fields[4], fields[5]);
    Some(GgaFix {
        quality: fields[6].parse().unwrap_or(0),
        satellites: fields.get(7).and_then(|s| s.parse().ok()).unwrap_or(0),
        position: lat.zip(lon).map(|(lat, lon)| GeoPoint::new(lat, lon)),
    })
}

/// Converts `[d]ddmm.mmmm` plus hemisphere letter into signed decimal degrees.
fn nmea_to_decimal(value: &str, hemisphere: &str) -> Option<f64> {
    let dot = value.find('.')?;
    if dot < 3 {
        return None;
    }
    let (deg, min) = value.split_at(dot - 2);
    let deg: f64 = deg.parse().ok()?;
    let min: f64 = min.parse().ok()?;
    if !(0.0..60.0).contains(&min) {
        return None;
    }
    let abs = deg + min / 60.0;
    match hemisphere {
        "N" | "E" => Some(abs),
        "S" | "W" => Some(-abs),
        _ => None,
    }
}
