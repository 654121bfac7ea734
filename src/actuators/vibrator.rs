//! # Vibration adapters.
//!
//! A vibration *pattern* is a list of durations alternating on/off, starting
//! with "on": `[on, off, on, ...]`. The sequencer asks for one sustained
//! segment per vibration phase (`[phase_duration]`) and cancels explicitly
//! when the phase ends.
//!
//! Platforms differ in what they can do with that:
//! - [`PatternMotor`] can hold the motor on for an arbitrary duration
//!   (pattern vibration); [`SustainedVibrator`] forwards the pattern as is.
//! - [`HapticEngine`] can only fire discrete taps (notification haptics);
//!   [`PulseTrainVibrator`] fills each "on" segment with taps every
//!   `interval`, on its own task, until the segment ends or `cancel()` runs.
//!
//! ```text
//! pattern [1000ms]      interval 250ms
//! taps    ▮   ▮   ▮   ▮
//!         0  250 500 750        (no tap at 1000: the segment is over)
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::ActuatorError;

/// Vibration motor as seen by the sequencer.
///
/// All calls are fire-and-forget: they return as soon as the command is
/// handed to the platform. Errors are reported but never retried.
pub trait Vibrator: Send + Sync + 'static {
    /// Starts `pattern`, replacing any pattern in flight.
    fn pulse(&self, pattern: &[Duration]) -> Result<(), ActuatorError>;

    /// Stops vibration immediately.
    fn cancel(&self) -> Result<(), ActuatorError>;

    /// Stops vibration and relinquishes the platform handle. Idempotent.
    fn release(&self) {}

    /// Adapter name for logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Platform motor that can hold a pattern (e.g. Android pattern vibration).
pub trait PatternMotor: Send + Sync + 'static {
    /// Runs the pattern once.
    fn vibrate(&self, pattern: &[Duration]) -> Result<(), ActuatorError>;

    /// Stops the motor.
    fn cancel(&self) -> Result<(), ActuatorError>;

    /// Relinquishes the platform handle.
    fn release(&self) {}
}

/// Platform haptics that can only fire discrete taps (e.g. iOS notification haptics).
pub trait HapticEngine: Send + Sync + 'static {
    /// Fires one tap.
    fn tap(&self) -> Result<(), ActuatorError>;

    /// Relinquishes the platform handle.
    fn release(&self) {}
}

/// [`Vibrator`] for platforms with sustained pattern vibration.
pub struct SustainedVibrator<M> {
    motor: M,
    released: AtomicBool,
}

impl<M: PatternMotor> SustainedVibrator<M> {
    /// Wraps a pattern-capable motor.
    pub fn new(motor: M) -> Self {
        Self {
            motor,
            released: AtomicBool::new(false),
        }
    }

    /// The wrapped motor.
    pub fn motor(&self) -> &M {
        &self.motor
    }
}

impl<M: PatternMotor> Vibrator for SustainedVibrator<M> {
    fn pulse(&self, pattern: &[Duration]) -> Result<(), ActuatorError> {
        if self.released.load(Ordering::Acquire) {
            return Err(ActuatorError::Released);
        }
        self.motor.vibrate(pattern)
    }

    fn cancel(&self) -> Result<(), ActuatorError> {
        if self.released.load(Ordering::Acquire) {
            return Ok(());
        }
        self.motor.cancel()
    }

    fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Err(e) = self.motor.cancel() {
            tracing::warn!(error = %e, "vibration cancel on release failed");
        }
        self.motor.release();
    }

    fn name(&self) -> &'static str {
        "sustained"
    }
}

/// [`Vibrator`] that emulates sustained vibration with a train of taps.
///
/// Each call to [`pulse`](Vibrator::pulse) cancels the previous train and
/// spawns a new one on the runtime captured at construction (or set with
/// [`with_runtime`](Self::with_runtime)), so `pulse` may be called from any
/// thread. Tap deadlines are computed from the train start, not chained, so a
/// slow tap does not stretch the train.
pub struct PulseTrainVibrator<H> {
    engine: Arc<H>,
    interval: Duration,
    runtime: Option<Handle>,
    train: Mutex<Option<CancellationToken>>,
    released: AtomicBool,
}

impl<H: HapticEngine> PulseTrainVibrator<H> {
    /// Default spacing between taps.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(250);

    /// Wraps a tap-only engine with the default interval.
    pub fn new(engine: H) -> Self {
        Self::with_interval(engine, Self::DEFAULT_INTERVAL)
    }

    /// Wraps a tap-only engine with a custom interval (min 1ms).
    pub fn with_interval(engine: H, interval: Duration) -> Self {
        Self {
            engine: Arc::new(engine),
            interval: interval.max(Duration::from_millis(1)),
            runtime: Handle::try_current().ok(),
            train: Mutex::new(None),
            released: AtomicBool::new(false),
        }
    }

    /// Spawns tap trains on `runtime` instead of the one current at construction.
    #[must_use]
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// The wrapped engine.
    pub fn engine(&self) -> &H {
        &self.engine
    }

    /// Tap spacing.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn stop_train(&self) {
        let mut slot = self.train.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = slot.take() {
            token.cancel();
        }
    }
}

impl<H: HapticEngine> Vibrator for PulseTrainVibrator<H> {
    fn pulse(&self, pattern: &[Duration]) -> Result<(), ActuatorError> {
        if self.released.load(Ordering::Acquire) {
            return Err(ActuatorError::Released);
        }
        let handle = match &self.runtime {
            Some(handle) => handle.clone(),
            None => Handle::try_current()
                .map_err(|_| ActuatorError::command("vibrator", "no async runtime for pulse train"))?,
        };

        let token = CancellationToken::new();
        {
            let mut slot = self.train.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(prev) = slot.replace(token.clone()) {
                prev.cancel();
            }
        }

        let engine = Arc::clone(&self.engine);
        let taps = tap_offsets(pattern, self.interval);
        handle.spawn(async move {
            let start = Instant::now();
            for offset in taps {
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = time::sleep_until(start + offset) => {}
                }
                if let Err(e) = engine.tap() {
                    tracing::warn!(error = %e, "haptic tap failed");
                }
            }
        });
        Ok(())
    }

    fn cancel(&self) -> Result<(), ActuatorError> {
        self.stop_train();
        Ok(())
    }

    fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        self.stop_train();
        self.engine.release();
    }

    fn name(&self) -> &'static str {
        "pulse_train"
    }
}

/// Offsets (from pattern start) at which taps fire for the "on" segments.
fn tap_offsets(pattern: &[Duration], interval: Duration) -> Vec<Duration> {
    let mut out = Vec::new();
    let mut cursor = Duration::ZERO;
    for (i, segment) in pattern.iter().enumerate() {
        if i % 2 == 0 {
            let mut t = Duration::ZERO;
            while t < *segment {
                out.push(cursor + t);
                t += interval;
            }
        }
        cursor += *segment;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuators::recording::{MotorCommand, RecordingHaptics, RecordingMotor};

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn tap_offsets_fill_on_segments_only() {
        assert_eq!(
            tap_offsets(&[ms(1000)], ms(250)),
            vec![ms(0), ms(250), ms(500), ms(750)]
        );
        assert_eq!(
            tap_offsets(&[ms(300), ms(200), ms(100)], ms(250)),
            vec![ms(0), ms(250), ms(500)]
        );
        assert!(tap_offsets(&[], ms(250)).is_empty());
    }

    #[test]
    fn sustained_forwards_pattern_and_refuses_after_release() {
        let v = SustainedVibrator::new(RecordingMotor::new());
        v.pulse(&[ms(1000)]).unwrap();
        v.cancel().unwrap();
        v.release();
        v.release();
        assert_eq!(v.pulse(&[ms(10)]), Err(ActuatorError::Released));

        let kinds: Vec<MotorCommand> = v.motor().commands().into_iter().map(|c| c.command).collect();
        assert_eq!(
            kinds,
            vec![
                MotorCommand::Vibrate(vec![ms(1000)]),
                MotorCommand::Cancel,
                MotorCommand::Cancel,
                MotorCommand::Release,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn pulse_train_taps_until_segment_ends() {
        let v = PulseTrainVibrator::new(RecordingHaptics::new());
        let start = Instant::now();
        v.pulse(&[ms(1000)]).unwrap();
        time::sleep(ms(2000)).await;

        let taps: Vec<u128> = v
            .engine()
            .taps()
            .iter()
            .map(|t| (*t - start).as_millis())
            .collect();
        assert_eq!(taps, vec![0, 250, 500, 750]);
    }

    #[tokio::test(start_paused = true)]
    async fn pulse_train_cancel_stops_pending_taps() {
        let v = PulseTrainVibrator::with_interval(RecordingHaptics::new(), ms(100));
        v.pulse(&[ms(1000)]).unwrap();
        time::sleep(ms(350)).await;
        v.cancel().unwrap();
        time::sleep(ms(1000)).await;
        assert_eq!(v.engine().taps().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn new_pulse_replaces_running_train() {
        let v = PulseTrainVibrator::with_interval(RecordingHaptics::new(), ms(100));
        let start = Instant::now();
        v.pulse(&[ms(1000)]).unwrap();
        time::sleep(ms(150)).await;
        v.pulse(&[ms(200)]).unwrap();
        time::sleep(ms(2000)).await;

        let taps: Vec<u128> = v
            .engine()
            .taps()
            .iter()
            .map(|t| (*t - start).as_millis())
            .collect();
        assert_eq!(taps, vec![0, 100, 150, 250]);
    }

    #[test]
    fn pulse_train_spawns_on_its_own_runtime_from_a_plain_thread() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap();
        let v = PulseTrainVibrator::new(RecordingHaptics::new()).with_runtime(rt.handle().clone());

        v.pulse(&[ms(1000)]).unwrap();
        rt.block_on(async { time::sleep(ms(2000)).await });
        assert_eq!(v.engine().taps().len(), 4);
    }

    #[test]
    fn pulse_train_without_runtime_reports_error() {
        let v = PulseTrainVibrator::new(RecordingHaptics::new());
        let err = v.pulse(&[ms(100)]).unwrap_err();
        assert_eq!(err.as_label(), "actuator_command_failed");
    }
}
