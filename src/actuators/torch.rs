//! # Flashlight adapter.
//!
//! [`Torch`] wraps a platform [`TorchDevice`] and adds the policy the
//! sequencer relies on:
//! - camera permission is requested at most once and cached for the process
//!   lifetime; [`Torch::retry_permission`] is the manual retry affordance
//!   (the user changed the OS setting);
//! - [`Torch::set_on`] maps every reason the torch cannot be lit to a
//!   [`CapabilityError`] instead of failing the caller;
//! - after [`Torch::release`] every command fails with
//!   [`CapabilityError::Released`].
//!
//! A failed permission request is treated as `Denied` for that call only and
//! is not cached, so the next flash phase asks again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::{ActuatorError, CapabilityError};

/// Camera permission state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Permission {
    /// Not requested yet (or reset for a retry).
    #[default]
    Unknown,
    /// Granted by the user/OS.
    Granted,
    /// Denied by the user/OS.
    Denied,
}

impl Permission {
    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Permission::Unknown => "unknown",
            Permission::Granted => "granted",
            Permission::Denied => "denied",
        }
    }
}

/// Platform torch (camera flash) access.
///
/// Every method may suspend on OS prompts or IPC.
#[async_trait]
pub trait TorchDevice: Send + Sync + 'static {
    /// Whether the device has a usable torch at all.
    fn has_torch(&self) -> bool;

    /// Prompts for (or reads) camera permission.
    async fn request_permission(&self) -> Result<Permission, ActuatorError>;

    /// Switches the torch.
    async fn set_torch(&self, on: bool) -> Result<(), ActuatorError>;

    /// Relinquishes the camera handle.
    async fn release(&self) {}
}

/// Permission-gated torch with a cached permission decision.
pub struct Torch {
    device: Arc<dyn TorchDevice>,
    permission: Mutex<Permission>,
    released: AtomicBool,
}

impl Torch {
    /// Wraps a device.
    pub fn new(device: impl TorchDevice) -> Self {
        Self::from_arc(Arc::new(device))
    }

    /// Wraps a shared device handle.
    pub fn from_arc(device: Arc<dyn TorchDevice>) -> Self {
        Self {
            device,
            permission: Mutex::new(Permission::Unknown),
            released: AtomicBool::new(false),
        }
    }

    /// Cached permission (never prompts).
    pub fn permission(&self) -> Permission {
        *self.permission.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether the hardware exists and the handle is still held.
    pub fn is_available(&self) -> bool {
        !self.released.load(Ordering::Acquire) && self.device.has_torch()
    }

    /// Reports why the torch cannot be lit right now, without prompting.
    ///
    /// An `Unknown` permission passes: the prompt happens on the next `set_on(true)`.
    pub fn check(&self) -> Result<(), CapabilityError> {
        if self.released.load(Ordering::Acquire) {
            return Err(CapabilityError::Released);
        }
        if !self.device.has_torch() {
            return Err(CapabilityError::NoHardware);
        }
        if self.permission() == Permission::Denied {
            return Err(CapabilityError::PermissionDenied);
        }
        Ok(())
    }

    /// Resolves camera permission, prompting only if nothing is cached.
    ///
    /// Idempotent: once `Granted` or `Denied` is cached the device is not asked again.
    pub async fn request_permission(&self) -> Permission {
        let cached = self.permission();
        if cached != Permission::Unknown {
            return cached;
        }
        match self.device.request_permission().await {
            Ok(Permission::Unknown) => Permission::Unknown,
            Ok(resolved) => {
                *self.permission.lock().unwrap_or_else(PoisonError::into_inner) = resolved;
                tracing::debug!(permission = resolved.as_str(), "camera permission resolved");
                resolved
            }
            Err(e) => {
                tracing::warn!(error = %e, "camera permission request failed");
                Permission::Denied
            }
        }
    }

    /// Clears the cached decision and asks again.
    pub async fn retry_permission(&self) -> Permission {
        *self.permission.lock().unwrap_or_else(PoisonError::into_inner) = Permission::Unknown;
        self.request_permission().await
    }

    /// Switches the torch on or off.
    ///
    /// Turning on resolves permission first. Turning off is always sent to the
    /// device when hardware is present, so the torch is never assumed off.
    pub async fn set_on(&self, on: bool) -> Result<(), CapabilityError> {
        if self.released.load(Ordering::Acquire) {
            return Err(CapabilityError::Released);
        }
        if !self.device.has_torch() {
            return Err(CapabilityError::NoHardware);
        }
        if on && self.request_permission().await != Permission::Granted {
            return Err(CapabilityError::PermissionDenied);
        }
        self.device.set_torch(on).await?;
        Ok(())
    }

    /// Switches the torch off and relinquishes the device. Idempotent.
    pub async fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        if self.device.has_torch() {
            if let Err(e) = self.device.set_torch(false).await {
                tracing::warn!(error = %e, "torch off on release failed");
            }
        }
        self.device.release().await;
    }
}
