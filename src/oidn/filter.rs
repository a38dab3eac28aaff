//! OIDN filter handle: image binding, parameters, commit and execute.

use super::buffer::OidnBuffer;
use super::device::OidnDevice;
use super::sys;
use crate::config::Quality;
use crate::Error;
use std::ffi::CStr;

impl Quality {
    fn to_raw(self) -> sys::OIDNQuality {
        match self {
            Quality::Default => sys::OIDNQuality::Default,
            Quality::Fast => sys::OIDNQuality::Fast,
            Quality::Balanced => sys::OIDNQuality::Balanced,
            Quality::High => sys::OIDNQuality::High,
        }
    }
}

/// Filter created by type name (e.g. `c"RT"`). Released on drop.
///
/// The filter keeps its own reference to the device inside OIDN, but owners should still
/// drop it before the [`OidnDevice`] it was created on.
pub struct Filter {
    raw: sys::OIDNFilter,
}

impl std::fmt::Debug for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Filter").finish_non_exhaustive()
    }
}

impl Filter {
    /// Creates a filter of the given type.
    ///
    /// # Errors
    ///
    /// Returns the device's last error, or [`Error::FilterCreationFailed`] if it has none.
    pub fn new(device: &OidnDevice, type_name: &CStr) -> Result<Self, Error> {
        let raw = unsafe { sys::oidnNewFilter(device.raw(), type_name.as_ptr()) };
        if raw.is_null() {
            return Err(device.take_error().unwrap_or(Error::FilterCreationFailed));
        }
        Ok(Self { raw })
    }

    /// Binds a tightly packed 3-channel float image backed by an OIDN buffer.
    pub fn set_image_float3(&self, name: &CStr, buffer: &OidnBuffer, width: u32, height: u32) {
        unsafe {
            sys::oidnSetFilterImage(
                self.raw,
                name.as_ptr(),
                buffer.raw(),
                sys::OIDNFormat::Float3,
                width as usize,
                height as usize,
                0,
                0,
                0,
            );
        }
    }

    /// Binds a tightly packed 3-channel float image in host memory (zero-copy).
    ///
    /// # Safety
    ///
    /// `data` must hold at least `width * height * 3` floats and stay at the same address,
    /// alive and otherwise unaliased during execution, until the filter is dropped.
    pub unsafe fn set_shared_image_float3(&self, name: &CStr, data: *mut f32, width: u32, height: u32) {
        sys::oidnSetSharedFilterImage(
            self.raw,
            name.as_ptr(),
            data.cast(),
            sys::OIDNFormat::Float3,
            width as usize,
            height as usize,
            0,
            0,
            0,
        );
    }

    /// Sets a boolean parameter.
    pub fn set_bool(&self, name: &CStr, value: bool) {
        unsafe { sys::oidnSetFilterBool(self.raw, name.as_ptr(), value) };
    }

    /// Gets a boolean parameter.
    pub fn get_bool(&self, name: &CStr) -> bool {
        unsafe { sys::oidnGetFilterBool(self.raw, name.as_ptr()) }
    }

    /// Sets an integer parameter.
    pub fn set_int(&self, name: &CStr, value: i32) {
        unsafe { sys::oidnSetFilterInt(self.raw, name.as_ptr(), value) };
    }

    /// Sets the `quality` parameter.
    pub fn set_quality(&self, quality: Quality) {
        self.set_int(c"quality", quality.to_raw() as i32);
    }

    /// Commits all previous filter parameter changes. Must be called before execute.
    pub fn commit(&self) {
        unsafe { sys::oidnCommitFilter(self.raw) };
    }

    /// Executes the filter (synchronous). Call `device.sync()` after if using a GPU device.
    pub fn execute(&self) {
        unsafe { sys::oidnExecuteFilter(self.raw) };
    }
}

impl Drop for Filter {
    fn drop(&mut self) {
        unsafe { sys::oidnReleaseFilter(self.raw) }
    }
}

unsafe impl Send for Filter {}
