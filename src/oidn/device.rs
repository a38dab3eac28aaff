//! OIDN logical device (CPU or GPU backend).

use super::sys;
use crate::Error;
use std::ffi::{c_char, CStr};
use std::ptr;

/// Converts a pending OIDN error (code + optional message pointer) into an [`Error`].
fn pending_error(device: sys::OIDNDevice) -> Option<Error> {
    let mut msg_ptr: *const c_char = ptr::null();
    let code = unsafe { sys::oidnGetDeviceError(device, &mut msg_ptr) };
    if code == sys::OIDNError::None {
        return None;
    }
    let message = if msg_ptr.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(msg_ptr).to_string_lossy().into_owned() }
    };
    Some(match code {
        sys::OIDNError::OutOfMemory => Error::OutOfMemory,
        _ => Error::Oidn {
            code: code as u32,
            message,
        },
    })
}

/// Returns the first unqueried error for the current thread (e.g. from a failed device creation)
/// and clears it. Can be called without a device to check why device creation failed.
pub fn take_global_error() -> Option<Error> {
    pending_error(ptr::null_mut())
}

/// OIDN device type used by the denoiser modes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OidnDeviceType {
    /// Auto-select best available (e.g. CUDA if built and available).
    #[default]
    Default,
    /// CPU only (most portable).
    Cpu,
    /// NVIDIA GPU via CUDA. Requires OIDN built with CUDA.
    Cuda,
}

impl OidnDeviceType {
    fn to_raw(self) -> sys::OIDNDeviceType {
        match self {
            OidnDeviceType::Default => sys::OIDNDeviceType::Default,
            OidnDeviceType::Cpu => sys::OIDNDeviceType::CPU,
            OidnDeviceType::Cuda => sys::OIDNDeviceType::CUDA,
        }
    }
}

/// Open Image Denoise logical device. Released on drop.
pub struct OidnDevice {
    raw: sys::OIDNDevice,
    device_type: OidnDeviceType,
}

impl std::fmt::Debug for OidnDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OidnDevice")
            .field("device_type", &self.device_type)
            .finish_non_exhaustive()
    }
}

impl OidnDevice {
    /// Creates and commits a device of the given type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceCreationFailed`] carrying OIDN's own message when it has one.
    pub fn with_type(device_type: OidnDeviceType) -> Result<Self, Error> {
        let raw = unsafe { sys::oidnNewDevice(device_type.to_raw()) };
        if raw.is_null() {
            let message = take_global_error()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Unable to create OIDN Device".to_string());
            return Err(Error::DeviceCreationFailed(message));
        }
        let device = Self { raw, device_type };
        unsafe { sys::oidnCommitDevice(raw) };
        if let Some(e) = device.take_error() {
            return Err(Error::DeviceCreationFailed(e.to_string()));
        }
        Ok(device)
    }

    pub fn device_type(&self) -> OidnDeviceType {
        self.device_type
    }

    /// Gets a boolean device parameter (e.g. `c"systemMemorySupported"`).
    pub fn get_bool(&self, name: &CStr) -> bool {
        unsafe { sys::oidnGetDeviceBool(self.raw, name.as_ptr()) }
    }

    /// Gets an integer device parameter (e.g. `c"type"`).
    pub fn get_int(&self, name: &CStr) -> i32 {
        unsafe { sys::oidnGetDeviceInt(self.raw, name.as_ptr()) }
    }

    /// Returns the first unqueried error and clears it.
    pub fn take_error(&self) -> Option<Error> {
        pending_error(self.raw)
    }

    /// Waits for all async operations on this device to complete.
    pub fn sync(&self) {
        unsafe { sys::oidnSyncDevice(self.raw) };
    }

    pub(crate) fn raw(&self) -> sys::OIDNDevice {
        self.raw
    }
}

impl Drop for OidnDevice {
    fn drop(&mut self) {
        unsafe { sys::oidnReleaseDevice(self.raw) }
    }
}

unsafe impl Send for OidnDevice {}
