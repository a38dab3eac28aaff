//! Library-managed OIDN buffer, used when the device cannot read host memory directly.

use super::device::OidnDevice;
use super::sys;
use crate::Error;

/// OIDN buffer. Owns device-accessible memory allocated by the library.
pub struct OidnBuffer {
    raw: sys::OIDNBuffer,
    byte_size: usize,
}

impl std::fmt::Debug for OidnBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OidnBuffer")
            .field("byte_size", &self.byte_size)
            .finish_non_exhaustive()
    }
}

impl OidnBuffer {
    /// Creates a buffer of `len` f32 values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfMemory`] if allocation fails, or an OIDN error from the device.
    pub fn new_f32(device: &OidnDevice, len: usize) -> Result<Self, Error> {
        let byte_size = len * std::mem::size_of::<f32>();
        let raw = unsafe { sys::oidnNewBuffer(device.raw(), byte_size) };
        if raw.is_null() {
            return Err(device.take_error().unwrap_or(Error::OutOfMemory));
        }
        Ok(Self { raw, byte_size })
    }

    /// Size in bytes, as reported by OIDN.
    pub fn size(&self) -> usize {
        unsafe { sys::oidnGetBufferSize(self.raw) }
    }

    /// Copies `src` into the start of the buffer (synchronous).
    pub fn write(&self, src: &[f32]) {
        let bytes: &[u8] = bytemuck::cast_slice(src);
        assert!(bytes.len() <= self.byte_size, "write past end of OIDN buffer");
        unsafe { sys::oidnWriteBuffer(self.raw, 0, bytes.len(), bytes.as_ptr().cast()) };
    }

    /// Copies the start of the buffer into `dst` (synchronous).
    pub fn read(&self, dst: &mut [f32]) {
        let bytes: &mut [u8] = bytemuck::cast_slice_mut(dst);
        assert!(bytes.len() <= self.byte_size, "read past end of OIDN buffer");
        unsafe { sys::oidnReadBuffer(self.raw, 0, bytes.len(), bytes.as_mut_ptr().cast()) };
    }

    pub(crate) fn raw(&self) -> sys::OIDNBuffer {
        self.raw
    }
}

impl Drop for OidnBuffer {
    fn drop(&mut self) {
        unsafe { sys::oidnReleaseBuffer(self.raw) }
    }
}

unsafe impl Send for OidnBuffer {}
