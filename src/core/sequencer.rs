//! # Sequencer: arms, drives and disarms the alert cadence.
//!
//! The [`Sequencer`] owns the alert state, the vibration adapter and the
//! torch worker. It turns `trigger(bool)` into at most one live cycle chain
//! and guarantees every actuator is off once `stop()` returns.
//!
//! ## Key responsibilities
//! - arm a fresh [`Schedule`] anchored at `trigger(true)`; re-arming cancels first
//! - apply each phase edge under the state lock, skipping disabled or unusable channels
//! - hand torch commands to the FIFO worker without waiting for them
//! - publish an [`AlertSnapshot`] after every change and an [`Event`] per fact
//!
//! ## High-level architecture
//! ```text
//! trigger(true) ──► lock ─► halt old chain (token.cancel, motor cancel, torch Off)
//!                        ─► generation += 1, anchor = now
//!                        ─► apply offset-0 edges (phase A on)
//!                        ─► spawn driver(generation, schedule, token)
//!
//! driver ── sleep_until(deadline) ──► lock ─► token cancelled? → exit
//!                                          ─► apply due edges
//!                                               ├─ vibration: Vibrator::pulse / cancel
//!                                               └─ flash:     FlashCommand ──► torch worker
//!                                          ─► watch::send(snapshot)
//!
//! torch worker ── Torch::set_on() result ──► lock ─► revert `flashing` (same epoch)
//!                                                  ─► advisory, camera permission
//!
//! stop() / dispose() ──► lock ─► halt chain, flags off ─► (dispose) release handles
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use alertvisor::{Config, SequencerBuilder, SustainedVibrator, Torch};
//! use alertvisor::actuators::recording::{RecordingMotor, RecordingTorch};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let sequencer = SequencerBuilder::new(Config::default())
//!         .with_vibrator(Arc::new(SustainedVibrator::new(RecordingMotor::new())))
//!         .with_torch(Torch::new(RecordingTorch::new()))
//!         .build();
//!
//!     sequencer.trigger(true);
//!     assert!(sequencer.snapshot().vibrating);
//!
//!     sequencer.trigger(false);
//!     assert!(!sequencer.snapshot().active);
//!     sequencer.dispose();
//! }
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{oneshot, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::actuators::{Permission, Vibrator};
use crate::cadence::{Cadence, Channel, Edge, PhaseSpec, Schedule, Scheduled};
use crate::error::{ActuatorError, AlertError, CapabilityError};
use crate::events::{Bus, Event, EventKind};
use crate::settings::AlertSettings;
use crate::subscribers::SubscriberSet;

use super::driver;
use super::flash::{FlashCommand, FlashHandle};
use super::state::{AlertSnapshot, AlertState, LiveCycle};

/// Shared core reachable from the public handle, the cycle driver and the torch worker.
pub(crate) struct Inner {
    state: Mutex<AlertState>,
    snapshot_tx: watch::Sender<AlertSnapshot>,
    bus: Bus,
    cadence: Cadence,
    advisory_once: bool,
    vibrator: Option<Arc<dyn Vibrator>>,
    flash: Option<FlashHandle>,
    runtime: Handle,
    /// Cancelled by `dispose()`; ends the subscriber listener.
    teardown: CancellationToken,
}

impl Inner {
    pub(crate) fn new(
        cadence: Cadence,
        advisory_once: bool,
        settings: AlertSettings,
        bus: Bus,
        vibrator: Option<Arc<dyn Vibrator>>,
        flash: Option<FlashHandle>,
        runtime: Handle,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(AlertSnapshot::IDLE);
        Self {
            state: Mutex::new(AlertState::new(settings)),
            snapshot_tx,
            bus,
            cadence,
            advisory_once,
            vibrator,
            flash,
            runtime,
            teardown: CancellationToken::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, AlertState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish_snapshot(&self, st: &AlertState) {
        self.snapshot_tx.send_replace(st.snapshot());
    }

    /// Asks for camera permission ahead of the first flash phase.
    pub(crate) fn prefetch_permission(&self) {
        let st = self.lock();
        if !st.settings.enable_flashlight || st.camera != Permission::Unknown {
            return;
        }
        if let Some(flash) = self.flash.as_ref().filter(|f| f.torch.is_available()) {
            flash.send(FlashCommand::RequestPermission);
        }
    }

    // ---- arming ----

    fn arm(self: &Arc<Self>) {
        // trigger() may come from a thread outside the runtime; the anchor
        // must still be read from the runtime clock.
        let _rt = self.runtime.enter();
        let mut st = self.lock();
        if st.disposed {
            let err = AlertError::Disposed;
            tracing::warn!(label = err.as_label(), "trigger(true) after dispose ignored");
            self.bus.publish(
                Event::new(EventKind::TriggerRejected)
                    .with_label(err.as_label())
                    .with_reason(err.to_string()),
            );
            return;
        }

        let restarted = self.halt_locked(&mut st);
        st.generation += 1;
        let generation = st.generation;
        let now = Instant::now();
        st.active = true;
        st.cycle = 0;
        st.cycle_started_at = Some(now);

        tracing::info!(generation, restarted, "alert armed");
        self.bus
            .publish(Event::new(EventKind::Armed).with_generation(generation));
        self.bus.publish(
            Event::new(EventKind::CycleStarted)
                .with_generation(generation)
                .with_cycle(0),
        );

        let mut schedule = Schedule::new(now, &self.cadence);
        for due in schedule.drain_due(now) {
            self.apply_locked(&mut st, generation, &due);
        }

        let token = CancellationToken::new();
        let handle = self.runtime.spawn(driver::run(
            Arc::clone(self),
            generation,
            schedule,
            token.clone(),
        ));
        st.live = Some(LiveCycle { token, handle });
        self.publish_snapshot(&st);
    }

    /// Cancels the live chain and switches every actuator off.
    ///
    /// Returns whether a chain was active.
    fn halt_locked(&self, st: &mut AlertState) -> bool {
        let was_active = st.active;
        let epoch = st.flash_epoch;
        if let Some(live) = st.go_idle() {
            live.cancel();
        }
        if !was_active {
            return false;
        }
        if let Some(vibrator) = &self.vibrator {
            if let Err(e) = vibrator.cancel() {
                self.actuator_failed(Channel::Vibration, &e);
            }
        }
        if let Some(flash) = &self.flash {
            flash.send(FlashCommand::Set { on: false, epoch });
        }
        true
    }

    fn disarm(&self) {
        let mut st = self.lock();
        if !self.halt_locked(&mut st) {
            return;
        }
        tracing::info!(generation = st.generation, "alert disarmed");
        self.bus
            .publish(Event::new(EventKind::Disarmed).with_generation(st.generation));
        self.publish_snapshot(&st);
    }

    fn dispose(&self) {
        let mut st = self.lock();
        if st.disposed {
            return;
        }
        let was_active = self.halt_locked(&mut st);
        st.disposed = true;
        if was_active {
            self.bus
                .publish(Event::new(EventKind::Disarmed).with_generation(st.generation));
        }
        if let Some(vibrator) = &self.vibrator {
            vibrator.release();
        }
        if let Some(flash) = &self.flash {
            flash.send(FlashCommand::Release);
        }
        tracing::info!("sequencer disposed");
        self.bus.publish(Event::new(EventKind::Disposed));
        self.publish_snapshot(&st);
        self.teardown.cancel();
    }

    // ---- cadence ----

    /// Applies transitions that came due for `generation`.
    ///
    /// Returns `false` when the driver must exit.
    pub(crate) fn apply_due(
        &self,
        generation: u64,
        token: &CancellationToken,
        due: &[Scheduled],
    ) -> bool {
        let mut st = self.lock();
        if token.is_cancelled() {
            return false;
        }
        if !st.active || st.generation != generation {
            let err = AlertError::SchedulingConflict { generation };
            tracing::error!(
                generation,
                current = st.generation,
                active = st.active,
                "{err}; resetting to idle"
            );
            self.bus.publish(
                Event::new(EventKind::SchedulingConflict)
                    .with_generation(generation)
                    .with_label(err.as_label()),
            );
            if self.halt_locked(&mut st) {
                self.bus
                    .publish(Event::new(EventKind::Disarmed).with_generation(st.generation));
            }
            self.publish_snapshot(&st);
            return false;
        }
        for s in due {
            self.apply_locked(&mut st, generation, s);
        }
        self.publish_snapshot(&st);
        true
    }

    fn apply_locked(&self, st: &mut AlertState, generation: u64, s: &Scheduled) {
        if s.cycle != st.cycle {
            st.cycle = s.cycle;
            tracing::debug!(generation, cycle = s.cycle, "cycle started");
            self.bus.publish(
                Event::new(EventKind::CycleStarted)
                    .with_generation(generation)
                    .with_cycle(s.cycle),
            );
        }

        let phase = s.transition.phase;
        match s.transition.edge {
            Edge::On => st.phase = Some(phase.kind),
            Edge::Off if st.phase == Some(phase.kind) => st.phase = None,
            Edge::Off => {}
        }

        match (phase.channel, s.transition.edge) {
            (Channel::Vibration, Edge::On) => self.vibration_on(st, generation, &phase),
            (Channel::Vibration, Edge::Off) => self.vibration_off(st, generation, &phase),
            (Channel::Flash, Edge::On) => self.flash_on(st, generation, &phase),
            (Channel::Flash, Edge::Off) => self.flash_off(st, generation, &phase),
        }
    }

    fn vibration_on(&self, st: &mut AlertState, generation: u64, phase: &PhaseSpec) {
        if !st.settings.enable_vibration {
            self.skip(st, generation, phase, "vibration disabled");
            return;
        }
        let Some(vibrator) = &self.vibrator else {
            self.skip(st, generation, phase, "no vibrator configured");
            return;
        };
        st.vibrating = true;
        if let Err(e) = vibrator.pulse(&[phase.duration]) {
            self.actuator_failed(Channel::Vibration, &e);
        }
        self.phase_edge(EventKind::PhaseStarted, st, generation, phase);
    }

    fn vibration_off(&self, st: &mut AlertState, generation: u64, phase: &PhaseSpec) {
        if !st.vibrating {
            return;
        }
        st.vibrating = false;
        if let Some(vibrator) = &self.vibrator {
            if let Err(e) = vibrator.cancel() {
                self.actuator_failed(Channel::Vibration, &e);
            }
        }
        self.phase_edge(EventKind::PhaseEnded, st, generation, phase);
    }

    fn flash_on(&self, st: &mut AlertState, generation: u64, phase: &PhaseSpec) {
        if !st.settings.enable_flashlight {
            self.skip(st, generation, phase, "flashlight disabled");
            return;
        }
        let Some(flash) = &self.flash else {
            self.skip(st, generation, phase, "no torch configured");
            return;
        };
        if let Err(e) = flash.torch.check() {
            self.capability_unavailable(st, &e);
            self.skip(st, generation, phase, e.as_label());
            return;
        }
        st.flash_epoch += 1;
        st.flashing = true;
        st.flash_engaged = true;
        flash.send(FlashCommand::Set {
            on: true,
            epoch: st.flash_epoch,
        });
        self.phase_edge(EventKind::PhaseStarted, st, generation, phase);
    }

    fn flash_off(&self, st: &mut AlertState, generation: u64, phase: &PhaseSpec) {
        if !st.flash_engaged {
            return;
        }
        st.flash_engaged = false;
        st.flashing = false;
        if let Some(flash) = &self.flash {
            flash.send(FlashCommand::Set {
                on: false,
                epoch: st.flash_epoch,
            });
        }
        self.phase_edge(EventKind::PhaseEnded, st, generation, phase);
    }

    fn phase_edge(&self, kind: EventKind, st: &AlertState, generation: u64, phase: &PhaseSpec) {
        tracing::debug!(
            generation,
            cycle = st.cycle,
            phase = phase.kind.as_str(),
            edge = ?kind,
            "phase edge"
        );
        self.bus.publish(
            Event::new(kind)
                .with_generation(generation)
                .with_cycle(st.cycle)
                .with_phase(phase.kind)
                .with_channel(phase.channel),
        );
    }

    fn skip(&self, st: &AlertState, generation: u64, phase: &PhaseSpec, reason: &'static str) {
        tracing::debug!(generation, phase = phase.kind.as_str(), reason, "phase skipped");
        self.bus.publish(
            Event::new(EventKind::PhaseSkipped)
                .with_generation(generation)
                .with_cycle(st.cycle)
                .with_phase(phase.kind)
                .with_channel(phase.channel)
                .with_reason(reason),
        );
    }

    // ---- degradation ----

    fn actuator_failed(&self, channel: Channel, err: &ActuatorError) {
        tracing::warn!(channel = channel.as_str(), label = err.as_label(), error = %err, "actuator command failed");
        self.bus.publish(
            Event::new(EventKind::ActuatorFailed)
                .with_channel(channel)
                .with_reason(err.to_string())
                .with_label(err.as_label()),
        );
    }

    fn capability_unavailable(&self, st: &mut AlertState, err: &CapabilityError) {
        tracing::warn!(label = err.as_label(), error = %err, "flashlight unavailable");
        self.bus.publish(
            Event::new(EventKind::CapabilityUnavailable)
                .with_channel(Channel::Flash)
                .with_reason(err.to_string())
                .with_label(err.as_label()),
        );
        self.raise_advisory(st, err);
    }

    fn raise_advisory(&self, st: &mut AlertState, err: &CapabilityError) {
        if !st.settings.enable_flashlight {
            return;
        }
        st.advisory = true;
        let already = if self.advisory_once {
            st.advisory_raised_in.is_some()
        } else {
            st.advisory_raised_in == Some(st.generation)
        };
        if already {
            return;
        }
        st.advisory_raised_in = Some(st.generation);
        tracing::info!(reason = %err, "flashlight advisory raised");
        self.bus.publish(
            Event::new(EventKind::FlashlightAdvisory)
                .with_reason(err.to_string())
                .with_label(err.as_label()),
        );
    }

    fn sync_camera(&self, st: &mut AlertState, cached: Permission) {
        if st.camera == cached {
            return;
        }
        st.camera = cached;
        if cached == Permission::Granted {
            st.advisory = false;
        }
        tracing::debug!(permission = cached.as_str(), "camera permission changed");
        self.bus
            .publish(Event::new(EventKind::PermissionResolved).with_reason(cached.as_str()));
    }

    /// Torch worker callback after a `set_on`.
    pub(crate) fn on_torch_result(
        &self,
        on: bool,
        epoch: u64,
        res: Result<(), CapabilityError>,
        cached: Permission,
    ) {
        let mut st = self.lock();
        self.sync_camera(&mut st, cached);
        match res {
            Ok(()) => {}
            Err(CapabilityError::Command(e)) => self.actuator_failed(Channel::Flash, &e),
            Err(e) if !on => {
                tracing::debug!(label = e.as_label(), "torch off not applied");
            }
            Err(e) => {
                self.capability_unavailable(&mut st, &e);
                if st.flash_epoch == epoch && st.flashing {
                    st.flashing = false;
                }
            }
        }
        self.publish_snapshot(&st);
    }

    /// Torch worker callback after a permission request.
    pub(crate) fn on_permission(&self, outcome: Permission, cached: Permission) {
        let mut st = self.lock();
        self.sync_camera(&mut st, cached);
        if outcome == Permission::Denied {
            self.raise_advisory(&mut st, &CapabilityError::PermissionDenied);
        }
        self.publish_snapshot(&st);
    }

    fn update_settings(&self, settings: AlertSettings) {
        let mut st = self.lock();
        let previous = st.settings;
        st.settings = settings;
        tracing::info!(
            enable_flashlight = settings.enable_flashlight,
            enable_vibration = settings.enable_vibration,
            sensitivity_level = settings.sensitivity_level.get(),
            "alert settings updated"
        );

        if !settings.enable_vibration && st.vibrating {
            st.vibrating = false;
            if let Some(vibrator) = &self.vibrator {
                if let Err(e) = vibrator.cancel() {
                    self.actuator_failed(Channel::Vibration, &e);
                }
            }
        }
        if !settings.enable_flashlight && st.flash_engaged {
            st.flash_engaged = false;
            st.flashing = false;
            if let Some(flash) = &self.flash {
                flash.send(FlashCommand::Set {
                    on: false,
                    epoch: st.flash_epoch,
                });
            }
        }
        let wants_prompt = settings.enable_flashlight
            && !previous.enable_flashlight
            && st.camera == Permission::Unknown
            && !st.disposed;
        if wants_prompt {
            if let Some(flash) = self.flash.as_ref().filter(|f| f.torch.is_available()) {
                flash.send(FlashCommand::RequestPermission);
            }
        }
        self.publish_snapshot(&st);
    }
}

/// Public handle of the alert sequencer.
///
/// Built with [`SequencerBuilder`](crate::SequencerBuilder). Dropping the
/// last handle disposes the sequencer.
pub struct Sequencer {
    inner: Arc<Inner>,
}

impl Sequencer {
    pub(crate) fn new_internal(inner: Arc<Inner>, subs: SubscriberSet) -> Self {
        let sequencer = Self { inner };
        sequencer.subscriber_listener(subs);
        sequencer
    }

    /// Forwards bus events to the subscriber set until the sequencer is disposed.
    ///
    /// Events published before teardown (including `Disposed`) are still
    /// delivered, then the subscriber workers are drained and joined.
    fn subscriber_listener(&self, set: SubscriberSet) {
        if set.is_empty() {
            return;
        }
        let mut rx = self.inner.bus.subscribe();
        let teardown = self.inner.teardown.clone();
        self.inner.runtime.spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    res = rx.recv() => match res {
                        Ok(ev) => set.emit(&ev),
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "subscriber listener lagged behind the bus");
                        }
                        Err(RecvError::Closed) => break,
                    },
                    _ = teardown.cancelled() => break,
                }
            }
            loop {
                match rx.try_recv() {
                    Ok(ev) => set.emit(&ev),
                    Err(TryRecvError::Lagged(_)) => continue,
                    Err(_) => break,
                }
            }
            set.shutdown().await;
            tracing::debug!("subscriber listener stopped");
        });
    }

    /// Runtime the sequencer spawns its tasks on.
    pub(crate) fn runtime(&self) -> &Handle {
        &self.inner.runtime
    }

    /// Arms (`true`) or disarms (`false`) the alert.
    ///
    /// `trigger(true)` while armed restarts the cadence from phase A; it never
    /// layers a second cycle. `trigger(false)` is [`stop`](Self::stop).
    pub fn trigger(&self, is_emergency: bool) {
        if is_emergency {
            self.inner.arm();
        } else {
            self.inner.disarm();
        }
    }

    /// Cancels the cycle and switches every actuator off. No-op when idle.
    pub fn stop(&self) {
        self.inner.disarm();
    }

    /// Stops and releases the hardware handles. Later calls are no-ops and
    /// later `trigger(true)` calls are rejected.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    /// Current state.
    pub fn snapshot(&self) -> AlertSnapshot {
        self.inner.lock().snapshot()
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<AlertSnapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    /// Settings currently applied.
    pub fn settings(&self) -> AlertSettings {
        self.inner.lock().settings
    }

    /// Replaces the settings and applies them immediately.
    ///
    /// Disabling a channel mid-phase switches that actuator off; enabling
    /// one takes effect at its next phase.
    pub fn update_settings(&self, settings: AlertSettings) {
        self.inner.update_settings(settings);
    }

    /// Manual retry affordance after the user changed the OS camera setting.
    ///
    /// # Errors
    /// - [`CapabilityError::NoHardware`] when no torch is configured or present
    /// - [`CapabilityError::Released`] after [`dispose`](Self::dispose)
    pub async fn retry_flashlight_permission(&self) -> Result<Permission, CapabilityError> {
        let Some(flash) = &self.inner.flash else {
            return Err(CapabilityError::NoHardware);
        };
        if self.inner.lock().disposed {
            return Err(CapabilityError::Released);
        }
        match flash.torch.check() {
            Ok(()) | Err(CapabilityError::PermissionDenied) => {}
            Err(e) => return Err(e),
        }
        let (tx, rx) = oneshot::channel();
        if !flash.send(FlashCommand::Retry(tx)) {
            return Err(CapabilityError::Released);
        }
        rx.await.map_err(|_| CapabilityError::Released)
    }

    /// Event bus shared with the torch worker and the detection bridge.
    pub fn bus(&self) -> &Bus {
        &self.inner.bus
    }

    /// Phase table in use.
    pub fn cadence(&self) -> &Cadence {
        &self.inner.cadence
    }

    /// Whether [`dispose`](Self::dispose) ran.
    pub fn is_disposed(&self) -> bool {
        self.inner.lock().disposed
    }
}

impl Drop for Sequencer {
    fn drop(&mut self) {
        self.inner.dispose();
    }
}
