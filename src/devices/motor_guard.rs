use super::{ActuatorError, MotorDrive, MotorSide};
use crate::error;
use crate::navigation::{DriveCommand, clamp_throttle};

/// Owns the motor driver for the lifetime of the mission and zeroes both sides when released,
/// whether the mission ends normally, through an error or by unwinding.
pub struct MotorGuard<M: MotorDrive> {
    motors: M,
    last: DriveCommand,
}

impl<M: MotorDrive> MotorGuard<M> {
    pub fn new(motors: M) -> Self { Self { motors, last: DriveCommand::STOP } }

    pub fn last_command(&self) -> DriveCommand { self.last }

    /// Writes `cmd` to both sides, clamping again right before the driver call.
    pub fn apply(&mut self, cmd: DriveCommand) -> Result<(), ActuatorError> {
        self.motors.set_throttle(MotorSide::Left, clamp_throttle(cmd.left()))?;
        self.motors.set_throttle(MotorSide::Right, clamp_throttle(cmd.right()))?;
        self.last = cmd;
        Ok(())
    }

    /// Zeroes both sides. The right side is still attempted if the left one fails.
    pub fn stop(&mut self) -> Result<(), ActuatorError> {
        let left = self.motors.set_throttle(MotorSide::Left, 0.0);
        let right = self.motors.set_throttle(MotorSide::Right, 0.0);
        self.last = DriveCommand::STOP;
        left.and(right)
    }
}

impl<M: MotorDrive> Drop for MotorGuard<M> {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            error!("Could not zero motors on release: {e:?}");
        }
    }
}
