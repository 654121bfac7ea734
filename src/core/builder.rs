use std::sync::Arc;

use tokio::runtime::Handle;

use crate::{
    actuators::{Torch, Vibrator},
    cadence::Cadence,
    core::Config,
    events::Bus,
    settings::AlertSettings,
    subscribers::{Subscribe, SubscriberSet},
};
use super::{flash, sequencer::Inner, sequencer::Sequencer};

/// Builder for constructing a Sequencer with its actuators and subscribers.
pub struct SequencerBuilder {
    cfg: Config,
    settings: AlertSettings,
    vibrator: Option<Arc<dyn Vibrator>>,
    torch: Option<Torch>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl SequencerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            settings: AlertSettings::default(),
            vibrator: None,
            torch: None,
            subscribers: Vec::new(),
        }
    }

    /// Sets the vibration adapter (sustained or pulse-train).
    pub fn with_vibrator(mut self, vibrator: Arc<dyn Vibrator>) -> Self {
        self.vibrator = Some(vibrator);
        self
    }

    /// Sets the flashlight. Without one, flash phases run as idle gaps.
    pub fn with_torch(mut self, torch: Torch) -> Self {
        self.torch = Some(torch);
        self
    }

    /// Sets the initial alert settings snapshot.
    pub fn with_settings(mut self, settings: AlertSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive alert events (arming, phase edges, degradations)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds and returns the Sequencer instance.
    ///
    /// Must be called inside a tokio runtime. Initializes:
    /// - Event bus for broadcasting
    /// - Subscriber workers
    /// - Torch worker (if a torch was given), with an early permission request
    pub fn build(self) -> Arc<Sequencer> {
        let cadence = match self.cfg.cadence.validate() {
            Ok(()) => self.cfg.cadence.clone(),
            Err(e) => {
                tracing::error!(label = e.as_label(), error = %e, "invalid cadence, using the standard one");
                Cadence::standard()
            }
        };

        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = SubscriberSet::new(self.subscribers, bus.clone());
        let runtime = Handle::current();

        let (flash, worker) = match self.torch {
            Some(torch) => {
                let torch = Arc::new(torch);
                let (handle, rx) = flash::channel(Arc::clone(&torch));
                (Some(handle), Some((torch, rx)))
            }
            None => (None, None),
        };

        let inner = Arc::new(Inner::new(
            cadence,
            self.cfg.advisory_once,
            self.settings,
            bus,
            self.vibrator,
            flash,
            runtime,
        ));
        if let Some((torch, rx)) = worker {
            flash::spawn(torch, rx, Arc::downgrade(&inner));
        }
        inner.prefetch_permission();

        Arc::new(Sequencer::new_internal(inner, subs))
    }
}
