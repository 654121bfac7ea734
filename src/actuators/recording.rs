//! # Recording backends.
//!
//! Host-side stand-ins for the vibration motor, haptics engine and camera
//! torch. Each one records the commands it receives with a
//! [`tokio::time::Instant`] timestamp, so a paused test clock yields exact
//! offsets. They also log every command at `trace` so the demos show the
//! cadence on a terminal.
//!
//! Failure knobs (`with_failing_*`, `without_hardware`, `with_permission`)
//! reproduce the degradations the sequencer has to survive.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::torch::{Permission, TorchDevice};
use super::vibrator::{HapticEngine, PatternMotor};
use crate::error::ActuatorError;

/// A command with the instant it was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded<C> {
    /// When the command arrived.
    pub at: Instant,
    /// The command.
    pub command: C,
}

/// Commands a [`RecordingMotor`] can receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MotorCommand {
    /// Pattern started.
    Vibrate(Vec<Duration>),
    /// Motor stopped.
    Cancel,
    /// Handle released.
    Release,
}

/// Commands a [`RecordingTorch`] can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TorchCommand {
    /// Permission prompt.
    RequestPermission,
    /// Torch switched.
    Set(bool),
    /// Handle released.
    Release,
}

fn push<C>(log: &Mutex<Vec<Recorded<C>>>, command: C) {
    log.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(Recorded {
            at: Instant::now(),
            command,
        });
}

fn snapshot<C: Clone>(log: &Mutex<Vec<Recorded<C>>>) -> Vec<Recorded<C>> {
    log.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

/// Pattern-capable motor that records commands.
#[derive(Default)]
pub struct RecordingMotor {
    log: Mutex<Vec<Recorded<MotorCommand>>>,
    fail: AtomicBool,
}

impl RecordingMotor {
    /// A working motor.
    pub fn new() -> Self {
        Self::default()
    }

    /// A motor whose `vibrate` calls fail (still recorded).
    #[must_use]
    pub fn with_failing_commands(self) -> Self {
        self.fail.store(true, Ordering::Release);
        self
    }

    /// Everything received so far.
    pub fn commands(&self) -> Vec<Recorded<MotorCommand>> {
        snapshot(&self.log)
    }

    /// Instants at which a pattern started.
    pub fn pulse_times(&self) -> Vec<Instant> {
        self.commands()
            .into_iter()
            .filter(|c| matches!(c.command, MotorCommand::Vibrate(_)))
            .map(|c| c.at)
            .collect()
    }
}

impl PatternMotor for RecordingMotor {
    fn vibrate(&self, pattern: &[Duration]) -> Result<(), ActuatorError> {
        tracing::trace!(?pattern, "motor: vibrate");
        push(&self.log, MotorCommand::Vibrate(pattern.to_vec()));
        if self.fail.load(Ordering::Acquire) {
            return Err(ActuatorError::command("vibrator", "motor busy"));
        }
        Ok(())
    }

    fn cancel(&self) -> Result<(), ActuatorError> {
        tracing::trace!("motor: cancel");
        push(&self.log, MotorCommand::Cancel);
        Ok(())
    }

    fn release(&self) {
        tracing::trace!("motor: release");
        push(&self.log, MotorCommand::Release);
    }
}

/// Tap-only haptics engine that records taps.
#[derive(Default)]
pub struct RecordingHaptics {
    taps: Mutex<Vec<Recorded<()>>>,
    released: AtomicBool,
}

impl RecordingHaptics {
    /// A working engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Instants of every tap.
    pub fn taps(&self) -> Vec<Instant> {
        snapshot(&self.taps).into_iter().map(|r| r.at).collect()
    }

    /// Whether the engine was released.
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

impl HapticEngine for RecordingHaptics {
    fn tap(&self) -> Result<(), ActuatorError> {
        tracing::trace!("haptics: tap");
        push(&self.taps, ());
        Ok(())
    }

    fn release(&self) {
        self.released.store(true, Ordering::Release);
    }
}

/// Torch device that records commands and answers permission prompts
/// with a configurable decision.
pub struct RecordingTorch {
    log: Mutex<Vec<Recorded<TorchCommand>>>,
    answer: Mutex<Permission>,
    hardware: bool,
    fail_permission: bool,
    fail_commands: bool,
    lit: AtomicBool,
}

impl Default for RecordingTorch {
    fn default() -> Self {
        Self {
            log: Mutex::new(Vec::new()),
            answer: Mutex::new(Permission::Granted),
            hardware: true,
            fail_permission: false,
            fail_commands: false,
            lit: AtomicBool::new(false),
        }
    }
}

impl RecordingTorch {
    /// A torch that exists and grants permission.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer permission prompts with `permission`.
    #[must_use]
    pub fn with_permission(self, permission: Permission) -> Self {
        self.set_permission_answer(permission);
        self
    }

    /// A device without a camera flash.
    #[must_use]
    pub fn without_hardware(mut self) -> Self {
        self.hardware = false;
        self
    }

    /// Permission prompts fail at the OS level.
    #[must_use]
    pub fn with_failing_permission(mut self) -> Self {
        self.fail_permission = true;
        self
    }

    /// `set_torch` fails at the OS level.
    #[must_use]
    pub fn with_failing_commands(mut self) -> Self {
        self.fail_commands = true;
        self
    }

    /// Changes the answer to future prompts (the user flipped the OS setting).
    pub fn set_permission_answer(&self, permission: Permission) {
        *self.answer.lock().unwrap_or_else(PoisonError::into_inner) = permission;
    }

    /// Everything received so far.
    pub fn commands(&self) -> Vec<Recorded<TorchCommand>> {
        snapshot(&self.log)
    }

    /// Whether the torch is currently lit.
    pub fn is_lit(&self) -> bool {
        self.lit.load(Ordering::Acquire)
    }
}

#[async_trait]
impl TorchDevice for RecordingTorch {
    fn has_torch(&self) -> bool {
        self.hardware
    }

    async fn request_permission(&self) -> Result<Permission, ActuatorError> {
        push(&self.log, TorchCommand::RequestPermission);
        if self.fail_permission {
            return Err(ActuatorError::command("torch", "permission service unavailable"));
        }
        Ok(*self.answer.lock().unwrap_or_else(PoisonError::into_inner))
    }

    async fn set_torch(&self, on: bool) -> Result<(), ActuatorError> {
        tracing::trace!(on, "torch: set");
        push(&self.log, TorchCommand::Set(on));
        if self.fail_commands {
            return Err(ActuatorError::command("torch", "camera busy"));
        }
        self.lit.store(on, Ordering::Release);
        Ok(())
    }

    async fn release(&self) {
        push(&self.log, TorchCommand::Release);
    }
}
