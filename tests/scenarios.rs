#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use alertvisor::actuators::recording::{
    MotorCommand, RecordingHaptics, RecordingMotor, RecordingTorch, TorchCommand,
};
use alertvisor::{
    AlertSettings, AlertSnapshot, Config, Event, EventKind, LogWriter, Permission, PhaseKind,
    PulseTrainVibrator, Sequencer, SequencerBuilder, Subscribe, SustainedVibrator, Torch,
};
use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::time::{self, Instant};

struct Rig {
    seq: Arc<Sequencer>,
    vibrator: Arc<SustainedVibrator<RecordingMotor>>,
    device: Arc<RecordingTorch>,
}

impl Rig {
    fn pulses_since(&self, start: Instant) -> Vec<u64> {
        self.vibrator
            .motor()
            .pulse_times()
            .into_iter()
            .map(|t| t.duration_since(start).as_millis() as u64)
            .collect()
    }

    fn torch_commands(&self) -> Vec<TorchCommand> {
        self.device.commands().into_iter().map(|c| c.command).collect()
    }

    fn torch_sets_since(&self, start: Instant) -> Vec<(u64, bool)> {
        self.device
            .commands()
            .into_iter()
            .filter_map(|c| match c.command {
                TorchCommand::Set(on) => Some((c.at.duration_since(start).as_millis() as u64, on)),
                _ => None,
            })
            .collect()
    }
}

fn rig(settings: AlertSettings, device: RecordingTorch) -> Rig {
    let vibrator = Arc::new(SustainedVibrator::new(RecordingMotor::new()));
    let device = Arc::new(device);
    let seq = SequencerBuilder::new(Config::default())
        .with_vibrator(vibrator.clone())
        .with_torch(Torch::from_arc(device.clone()))
        .with_settings(settings)
        .build();
    Rig {
        seq,
        vibrator,
        device,
    }
}

/// Lets spawned workers drain their queues.
async fn settle() {
    time::sleep(Duration::from_millis(1)).await;
}

async fn state_at(seq: &Sequencer, start: Instant, ms: u64) -> AlertSnapshot {
    time::sleep_until(start + Duration::from_millis(ms)).await;
    seq.snapshot()
}

fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}

fn count(events: &[Event], kind: EventKind) -> usize {
    events.iter().filter(|e| e.kind == kind).count()
}

#[tokio::test(start_paused = true)]
async fn scenario_a_reference_timeline() {
    let rig = rig(AlertSettings::all_enabled(), RecordingTorch::new());
    settle().await;

    let start = Instant::now();
    rig.seq.trigger(true);
    let s = rig.seq.snapshot();
    assert!(s.active && s.vibrating && !s.flashing);
    assert_eq!(s.phase, Some(PhaseKind::VibrateA));
    assert_eq!(s.camera, Permission::Granted);
    assert_eq!(s.cycle_started_at, Some(start));

    let s = state_at(&rig.seq, start, 950).await;
    assert!(s.vibrating && !s.flashing);

    let s = state_at(&rig.seq, start, 1050).await;
    assert!(s.active && !s.vibrating && !s.flashing);
    assert_eq!(s.phase, None);

    let s = state_at(&rig.seq, start, 1250).await;
    assert!(!s.vibrating && s.flashing);
    assert_eq!(s.phase, Some(PhaseKind::FlashB));
    assert!(rig.device.is_lit());

    let s = state_at(&rig.seq, start, 2250).await;
    assert!(!s.vibrating && !s.flashing);
    assert!(!rig.device.is_lit());

    let s = state_at(&rig.seq, start, 2750).await;
    assert!(s.vibrating && !s.flashing);
    assert_eq!(s.phase, Some(PhaseKind::VibrateC));

    let s = state_at(&rig.seq, start, 4250).await;
    assert!(s.active && !s.vibrating && !s.flashing);
    assert_eq!(s.cycle, 0);

    let s = state_at(&rig.seq, start, 4550).await;
    assert!(s.vibrating);
    assert_eq!(s.cycle, 1);
    assert_eq!(s.phase, Some(PhaseKind::VibrateA));

    assert_eq!(rig.pulses_since(start), vec![0, 2700, 4500]);
    assert_eq!(rig.torch_sets_since(start), vec![(1200, true), (2200, false)]);
    assert_eq!(
        rig.vibrator.motor().commands()[0].command,
        MotorCommand::Vibrate(vec![Duration::from_millis(1000)])
    );
}

#[tokio::test(start_paused = true)]
async fn cadence_does_not_drift_over_many_cycles() {
    let rig = rig(AlertSettings::all_enabled(), RecordingTorch::new());
    settle().await;

    let start = Instant::now();
    rig.seq.trigger(true);
    time::sleep_until(start + Duration::from_millis(4500 * 10 + 100)).await;

    let pulses = rig.pulses_since(start);
    assert_eq!(pulses.len(), 21);
    for (cycle, pair) in pulses.chunks(2).enumerate() {
        let base = 4500 * cycle as u64;
        assert_eq!(pair[0], base);
        if let Some(c) = pair.get(1) {
            assert_eq!(*c, base + 2700);
        }
    }
    assert_eq!(rig.seq.snapshot().cycle, 10);
}

#[tokio::test(start_paused = true)]
async fn scenario_b_stop_mid_phase_a() {
    let rig = rig(AlertSettings::all_enabled(), RecordingTorch::new());
    settle().await;
    let mut events = rig.seq.bus().subscribe();

    let start = Instant::now();
    rig.seq.trigger(true);
    time::sleep_until(start + Duration::from_millis(500)).await;
    rig.seq.trigger(false);

    let s = rig.seq.snapshot();
    assert!(!s.active && !s.vibrating && !s.flashing);

    time::sleep_until(start + Duration::from_millis(10_000)).await;
    assert_eq!(rig.seq.snapshot(), AlertSnapshot { camera: Permission::Granted, ..AlertSnapshot::IDLE });

    let motor: Vec<_> = rig
        .vibrator
        .motor()
        .commands()
        .into_iter()
        .map(|c| (c.at.duration_since(start).as_millis() as u64, c.command))
        .collect();
    assert_eq!(
        motor,
        vec![
            (0, MotorCommand::Vibrate(vec![Duration::from_millis(1000)])),
            (500, MotorCommand::Cancel),
        ]
    );
    assert_eq!(rig.torch_sets_since(start), vec![(500, false)]);

    let events = drain(&mut events);
    assert_eq!(count(&events, EventKind::Armed), 1);
    assert_eq!(count(&events, EventKind::Disarmed), 1);
    assert_eq!(count(&events, EventKind::PhaseStarted), 1);
    assert_eq!(events.last().map(|e| e.kind), Some(EventKind::Disarmed));
}

#[tokio::test(start_paused = true)]
async fn scenario_c_flashlight_disabled() {
    let rig = rig(
        AlertSettings::all_enabled().with_flashlight(false),
        RecordingTorch::new(),
    );
    settle().await;
    let mut events = rig.seq.bus().subscribe();

    let start = Instant::now();
    rig.seq.trigger(true);
    let mut t = 0;
    while t < 9000 {
        let s = state_at(&rig.seq, start, t).await;
        assert!(!s.flashing, "flashing at {t}ms");
        assert!(!s.flashlight_advisory);
        t += 50;
    }

    assert_eq!(rig.pulses_since(start), vec![0, 2700, 4500, 7200]);
    assert!(rig.torch_commands().is_empty(), "no prompt, no torch command");

    let events = drain(&mut events);
    let skipped: Vec<_> = events
        .iter()
        .filter(|e| e.kind == EventKind::PhaseSkipped)
        .map(|e| (e.phase, e.reason.as_deref().map(str::to_owned)))
        .collect();
    assert_eq!(
        skipped,
        vec![
            (Some(PhaseKind::FlashB), Some("flashlight disabled".to_owned())),
            (Some(PhaseKind::FlashB), Some("flashlight disabled".to_owned())),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn stop_from_any_phase_leaves_everything_off() {
    for stop_at in [0, 500, 1000, 1100, 1500, 2200, 2500, 3000, 4300, 4500, 6000] {
        for dispose in [false, true] {
            let rig = rig(AlertSettings::all_enabled(), RecordingTorch::new());
            settle().await;
            let start = Instant::now();
            rig.seq.trigger(true);
            time::sleep_until(start + Duration::from_millis(stop_at)).await;

            if dispose {
                rig.seq.dispose();
                rig.seq.stop();
            } else {
                rig.seq.stop();
                rig.seq.stop();
            }
            let s = rig.seq.snapshot();
            assert!(!s.active && !s.vibrating && !s.flashing, "stop at {stop_at}ms");

            settle().await;
            assert!(!rig.device.is_lit(), "torch lit after stop at {stop_at}ms");

            let before = rig.vibrator.motor().pulse_times().len();
            time::sleep(Duration::from_millis(9000)).await;
            assert_eq!(rig.vibrator.motor().pulse_times().len(), before);
            assert!(!rig.seq.snapshot().active);
        }
    }
}

#[tokio::test(start_paused = true)]
async fn retrigger_restarts_instead_of_layering() {
    let rig = rig(AlertSettings::all_enabled(), RecordingTorch::new());
    settle().await;

    let start = Instant::now();
    rig.seq.trigger(true);
    time::sleep_until(start + Duration::from_millis(300)).await;
    rig.seq.trigger(true);
    assert!(rig.seq.snapshot().vibrating);

    time::sleep_until(start + Duration::from_millis(3100)).await;
    assert_eq!(rig.pulses_since(start), vec![0, 300, 3000]);

    // The first chain's flash at 1200 never fires; the second one flashes at 1500.
    assert_eq!(rig.torch_sets_since(start), vec![(300, false), (1500, true), (2500, false)]);
}

#[tokio::test(start_paused = true)]
async fn vibration_disabled_never_vibrates() {
    let rig = rig(
        AlertSettings::all_enabled().with_vibration(false),
        RecordingTorch::new(),
    );
    settle().await;

    let start = Instant::now();
    rig.seq.trigger(true);
    assert!(rig.seq.snapshot().active);
    let mut saw_flash = false;
    let mut t = 0;
    while t < 9000 {
        let s = state_at(&rig.seq, start, t).await;
        assert!(!s.vibrating, "vibrating at {t}ms");
        saw_flash |= s.flashing;
        t += 50;
    }
    assert!(saw_flash);
    assert!(rig.vibrator.motor().pulse_times().is_empty());
}

#[tokio::test(start_paused = true)]
async fn denied_permission_degrades_flash_only() {
    let rig = rig(
        AlertSettings::all_enabled(),
        RecordingTorch::new().with_permission(Permission::Denied),
    );
    let mut events = rig.seq.bus().subscribe();
    settle().await;

    let s = rig.seq.snapshot();
    assert_eq!(s.camera, Permission::Denied);
    assert!(s.flashlight_advisory);

    let start = Instant::now();
    rig.seq.trigger(true);
    let mut t = 0;
    while t < 9100 {
        let s = state_at(&rig.seq, start, t).await;
        assert!(!s.flashing, "flashing at {t}ms");
        assert!(s.active);
        t += 50;
    }
    assert_eq!(rig.pulses_since(start), vec![0, 2700, 4500, 7200, 9000]);
    assert!(rig.torch_sets_since(start).iter().all(|(_, on)| !on));

    let events = drain(&mut events);
    assert_eq!(count(&events, EventKind::FlashlightAdvisory), 1);
    assert_eq!(count(&events, EventKind::CapabilityUnavailable), 2);
    let unavailable = events
        .iter()
        .find(|e| e.kind == EventKind::CapabilityUnavailable)
        .unwrap();
    assert_eq!(unavailable.label, Some("capability_permission_denied"));
}

#[tokio::test(start_paused = true)]
async fn torch_rejecting_at_runtime_reverts_flashing() {
    let rig = rig(
        AlertSettings::all_enabled(),
        RecordingTorch::new().with_failing_permission(),
    );
    settle().await;
    assert_eq!(rig.seq.snapshot().camera, Permission::Unknown);

    let start = Instant::now();
    rig.seq.trigger(true);

    let s = state_at(&rig.seq, start, 1250).await;
    assert!(!s.flashing);
    assert!(s.flashlight_advisory);

    let s = state_at(&rig.seq, start, 2750).await;
    assert!(s.vibrating);
    let s = state_at(&rig.seq, start, 4550).await;
    assert!(s.vibrating);
    assert_eq!(s.cycle, 1);
    assert_eq!(rig.pulses_since(start), vec![0, 2700, 4500]);
}

#[tokio::test(start_paused = true)]
async fn torch_command_failure_keeps_phase_cosmetically() {
    let rig = rig(
        AlertSettings::all_enabled(),
        RecordingTorch::new().with_failing_commands(),
    );
    settle().await;
    let mut events = rig.seq.bus().subscribe();

    let start = Instant::now();
    rig.seq.trigger(true);
    let s = state_at(&rig.seq, start, 1250).await;
    assert!(s.flashing);
    assert!(!s.flashlight_advisory);

    let s = state_at(&rig.seq, start, 2250).await;
    assert!(!s.flashing);

    let events = drain(&mut events);
    let failed: Vec<_> = events
        .iter()
        .filter(|e| e.kind == EventKind::ActuatorFailed)
        .collect();
    assert_eq!(failed.len(), 2);
    assert_eq!(failed[0].label, Some("actuator_command_failed"));
}

#[tokio::test(start_paused = true)]
async fn missing_torch_hardware_skips_flash() {
    let rig = rig(
        AlertSettings::all_enabled(),
        RecordingTorch::new().without_hardware(),
    );
    settle().await;

    let start = Instant::now();
    rig.seq.trigger(true);
    let s = state_at(&rig.seq, start, 1250).await;
    assert!(!s.flashing);
    assert!(s.flashlight_advisory);
    let s = state_at(&rig.seq, start, 2750).await;
    assert!(s.vibrating);

    assert_eq!(
        rig.seq.retry_flashlight_permission().await,
        Err(alertvisor::CapabilityError::NoHardware)
    );
}

#[tokio::test(start_paused = true)]
async fn retry_permission_restores_flash() {
    let rig = rig(
        AlertSettings::all_enabled(),
        RecordingTorch::new().with_permission(Permission::Denied),
    );
    settle().await;
    assert!(rig.seq.snapshot().flashlight_advisory);

    rig.device.set_permission_answer(Permission::Granted);
    assert_eq!(
        rig.seq.retry_flashlight_permission().await,
        Ok(Permission::Granted)
    );
    let s = rig.seq.snapshot();
    assert_eq!(s.camera, Permission::Granted);
    assert!(!s.flashlight_advisory);

    let start = Instant::now();
    rig.seq.trigger(true);
    let s = state_at(&rig.seq, start, 1250).await;
    assert!(s.flashing);
    assert!(rig.device.is_lit());
}

#[tokio::test(start_paused = true)]
async fn update_settings_applies_mid_phase() {
    let rig = rig(AlertSettings::all_enabled(), RecordingTorch::new());
    settle().await;

    let start = Instant::now();
    rig.seq.trigger(true);

    time::sleep_until(start + Duration::from_millis(400)).await;
    rig.seq
        .update_settings(AlertSettings::all_enabled().with_vibration(false));
    let s = rig.seq.snapshot();
    assert!(s.active && !s.vibrating);
    assert_eq!(
        rig.vibrator.motor().commands().last().map(|c| c.command.clone()),
        Some(MotorCommand::Cancel)
    );

    time::sleep_until(start + Duration::from_millis(1500)).await;
    rig.seq
        .update_settings(AlertSettings::all_enabled().with_flashlight(false));
    let s = rig.seq.snapshot();
    assert!(!s.flashing);
    settle().await;
    assert!(!rig.device.is_lit());

    // Vibration came back on: phase C vibrates, phase B of the next cycle stays dark.
    let s = state_at(&rig.seq, start, 2750).await;
    assert!(s.vibrating);
    let s = state_at(&rig.seq, start, 5750).await;
    assert!(!s.flashing);

    assert_eq!(rig.pulses_since(start), vec![0, 2700, 4500]);
    assert_eq!(rig.seq.settings(), AlertSettings::all_enabled().with_flashlight(false));
}

#[tokio::test(start_paused = true)]
async fn enabling_flashlight_prompts_for_permission() {
    let rig = rig(
        AlertSettings::all_enabled().with_flashlight(false),
        RecordingTorch::new(),
    );
    settle().await;
    assert!(rig.torch_commands().is_empty());

    rig.seq.update_settings(AlertSettings::all_enabled());
    settle().await;
    assert_eq!(rig.torch_commands(), vec![TorchCommand::RequestPermission]);
    assert_eq!(rig.seq.snapshot().camera, Permission::Granted);
}

#[tokio::test(start_paused = true)]
async fn dispose_releases_and_rejects_new_triggers() {
    let rig = rig(AlertSettings::all_enabled(), RecordingTorch::new());
    settle().await;
    let mut events = rig.seq.bus().subscribe();

    let start = Instant::now();
    rig.seq.trigger(true);
    time::sleep_until(start + Duration::from_millis(1300)).await;
    rig.seq.dispose();
    rig.seq.dispose();
    assert!(rig.seq.is_disposed());

    rig.seq.trigger(true);
    assert!(!rig.seq.snapshot().active);
    settle().await;

    assert_eq!(
        rig.vibrator.motor().commands().last().map(|c| c.command.clone()),
        Some(MotorCommand::Release)
    );
    let torch = rig.torch_commands();
    assert_eq!(
        &torch[torch.len() - 2..],
        &[TorchCommand::Set(false), TorchCommand::Release]
    );
    assert!(!rig.device.is_lit());
    assert_eq!(
        rig.seq.retry_flashlight_permission().await,
        Err(alertvisor::CapabilityError::Released)
    );

    let events = drain(&mut events);
    assert_eq!(count(&events, EventKind::Disposed), 1);
    let rejected = events
        .iter()
        .find(|e| e.kind == EventKind::TriggerRejected)
        .unwrap();
    assert_eq!(rejected.label, Some("alert_disposed"));
}

#[tokio::test(start_paused = true)]
async fn dropping_the_last_handle_disposes() {
    let rig = rig(AlertSettings::all_enabled(), RecordingTorch::new());
    settle().await;
    rig.seq.trigger(true);

    let Rig {
        seq,
        vibrator,
        device,
    } = rig;
    drop(seq);
    settle().await;

    let before = vibrator.motor().pulse_times().len();
    time::sleep(Duration::from_millis(9000)).await;
    assert_eq!(vibrator.motor().pulse_times().len(), before);
    assert_eq!(
        device.commands().last().map(|c| c.command),
        Some(TorchCommand::Release)
    );
}

struct Seen(std::sync::Mutex<Vec<EventKind>>);

#[async_trait]
impl Subscribe for Seen {
    async fn on_event(&self, ev: &Event) {
        self.0.lock().unwrap().push(ev.kind);
    }
}

#[tokio::test(start_paused = true)]
async fn dispose_winds_down_every_spawned_task() {
    let metrics = tokio::runtime::Handle::current().metrics();
    let baseline = metrics.num_alive_tasks();

    let seen = Arc::new(Seen(std::sync::Mutex::new(Vec::new())));
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new()), seen.clone()];
    let seq = SequencerBuilder::new(Config::default())
        .with_vibrator(Arc::new(PulseTrainVibrator::new(RecordingHaptics::new())))
        .with_torch(Torch::new(RecordingTorch::new()))
        .with_subscribers(subs)
        .build();
    seq.trigger(true);
    time::sleep(Duration::from_millis(1300)).await;
    assert!(metrics.num_alive_tasks() > baseline);

    seq.dispose();
    drop(seq);
    time::sleep(Duration::from_millis(200)).await;

    assert_eq!(metrics.num_alive_tasks(), baseline);
    assert_eq!(seen.0.lock().unwrap().last(), Some(&EventKind::Disposed));
}

#[tokio::test(start_paused = true)]
async fn watch_receivers_observe_transitions() {
    let rig = rig(AlertSettings::all_enabled(), RecordingTorch::new());
    settle().await;
    let mut rx = rig.seq.subscribe();
    rx.borrow_and_update();

    rig.seq.trigger(true);
    assert!(rx.has_changed().unwrap());
    assert!(rx.borrow_and_update().vibrating);

    rx.changed().await.unwrap();
    assert!(!rx.borrow_and_update().vibrating);
}
