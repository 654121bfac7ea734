//! # Torch worker.
//!
//! One task owns the [`Torch`] and executes [`FlashCommand`]s strictly in
//! the order they were sent. The cycle driver never awaits it: it flips
//! `flashing` optimistically, enqueues the command and moves on, so a slow
//! permission prompt cannot stall a vibration phase.
//!
//! ```text
//! driver / stop() ── FlashCommand ──► [unbounded mpsc] ──► worker ──► Torch::set_on()
//!                                                             │
//!                                                             └─► Inner::on_torch_result()
//!                                                                 (revert `flashing`, advisory)
//! ```
//!
//! FIFO order is what makes `stop()` safe: its Off is queued behind any On
//! still in flight, so the torch always ends dark.

use std::sync::{Arc, Weak};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::actuators::{Permission, Torch};

use super::sequencer::Inner;

/// Commands accepted by the torch worker.
#[derive(Debug)]
pub(crate) enum FlashCommand {
    /// Switch the torch; `epoch` identifies the flash phase that asked.
    Set { on: bool, epoch: u64 },
    /// Resolve permission ahead of the first flash phase.
    RequestPermission,
    /// Clear the cached decision and ask again.
    Retry(oneshot::Sender<Permission>),
    /// Switch off, release the device and exit.
    Release,
}

/// Sender side of the worker plus shared access to the torch for
/// non-blocking availability checks.
pub(crate) struct FlashHandle {
    pub(crate) torch: Arc<Torch>,
    tx: mpsc::UnboundedSender<FlashCommand>,
}

impl FlashHandle {
    /// Enqueues a command. Returns `false` if the worker is gone.
    pub(crate) fn send(&self, cmd: FlashCommand) -> bool {
        match self.tx.send(cmd) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(command = ?e.0, "torch worker gone, command dropped");
                false
            }
        }
    }
}

/// Creates the command channel. The worker is started separately with
/// [`spawn`] once the sequencer core exists.
pub(crate) fn channel(torch: Arc<Torch>) -> (FlashHandle, mpsc::UnboundedReceiver<FlashCommand>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (FlashHandle { torch, tx }, rx)
}

/// Spawns the worker loop.
pub(crate) fn spawn(
    torch: Arc<Torch>,
    rx: mpsc::UnboundedReceiver<FlashCommand>,
    inner: Weak<Inner>,
) -> JoinHandle<()> {
    tokio::spawn(run(torch, rx, inner))
}

async fn run(torch: Arc<Torch>, mut rx: mpsc::UnboundedReceiver<FlashCommand>, inner: Weak<Inner>) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            FlashCommand::Set { on, epoch } => {
                let res = torch.set_on(on).await;
                if let Some(inner) = inner.upgrade() {
                    inner.on_torch_result(on, epoch, res, torch.permission());
                }
            }
            FlashCommand::RequestPermission => {
                let outcome = torch.request_permission().await;
                if let Some(inner) = inner.upgrade() {
                    inner.on_permission(outcome, torch.permission());
                }
            }
            FlashCommand::Retry(reply) => {
                let outcome = torch.retry_permission().await;
                if let Some(inner) = inner.upgrade() {
                    inner.on_permission(outcome, torch.permission());
                }
                let _ = reply.send(outcome);
            }
            FlashCommand::Release => {
                torch.release().await;
                tracing::debug!("torch released");
                break;
            }
        }
    }
}
