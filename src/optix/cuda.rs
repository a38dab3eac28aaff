//! CUDA runtime resources owned by the OptiX backend: device selection, stream, device memory.

use super::sys;
use crate::config::GpuRequirements;
use crate::probe;
use crate::Error;
use std::ffi::{c_char, c_void, CStr};
use std::ptr;

fn error_string(code: sys::cudaError_t) -> String {
    let p = unsafe { sys::cudaGetErrorString(code) };
    if p.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(p).to_string_lossy().into_owned() }
}

pub(crate) fn check(code: sys::cudaError_t, context: &'static str) -> Result<(), Error> {
    if code == sys::cudaSuccess {
        return Ok(());
    }
    Err(Error::Cuda {
        context,
        code,
        message: error_string(code),
    })
}

/// The CUDA device the backend runs on.
#[derive(Clone, Debug)]
pub(crate) struct GpuDevice {
    pub index: i32,
    pub name: String,
    pub compute_capability: (i32, i32),
}

/// Makes `index` the calling thread's current CUDA device.
///
/// The current device is per host thread, so this must run on every thread that touches
/// the backend's stream or memory.
pub(crate) fn make_current(index: i32) -> Result<(), Error> {
    check(unsafe { sys::cudaSetDevice(index) }, "Unable to set the CUDA device")
}

/// Runs the device half of the capability probe and makes the chosen device current.
pub(crate) fn select_device(req: &GpuRequirements) -> Result<GpuDevice, Error> {
    // Initializes the runtime on the default device.
    unsafe { sys::cudaFree(ptr::null_mut()) };

    let mut count = 0;
    let rc = unsafe { sys::cudaGetDeviceCount(&mut count) };
    if rc != sys::cudaSuccess {
        count = 0;
    }
    probe::check_device_count(count)?;

    let index = req.device_index;
    if index < 0 || index >= count {
        return Err(Error::Capability(format!(
            "CUDA device {} not present ({} found)",
            index, count
        )));
    }
    make_current(index)?;

    let mut name: [c_char; 256] = [0; 256];
    let (mut major, mut minor) = (0, 0);
    check(
        unsafe {
            sys::dn_cuda_device_properties(index, name.as_mut_ptr(), name.len(), &mut major, &mut minor)
        },
        "Unable to get the CUDA device properties",
    )?;
    let name = unsafe { CStr::from_ptr(name.as_ptr()) }
        .to_string_lossy()
        .into_owned();
    probe::check_compute_capability(major, req)?;

    Ok(GpuDevice {
        index,
        name,
        compute_capability: (major, minor),
    })
}

/// Asynchronous CUDA stream. Destroyed on drop.
pub(crate) struct CudaStream {
    raw: sys::cudaStream_t,
}

impl CudaStream {
    pub fn new() -> Result<Self, Error> {
        let mut raw = ptr::null_mut();
        check(unsafe { sys::cudaStreamCreate(&mut raw) }, "Unable to create the CUDA stream")?;
        Ok(Self { raw })
    }

    pub fn raw(&self) -> sys::cudaStream_t {
        self.raw
    }

    /// Blocks until all work queued on the stream has finished.
    pub fn synchronize(&self) -> Result<(), Error> {
        check(
            unsafe { sys::cudaStreamSynchronize(self.raw) },
            "Denoiser failure waiting for the CUDA stream",
        )
    }
}

impl Drop for CudaStream {
    fn drop(&mut self) {
        unsafe { sys::cudaStreamDestroy(self.raw) };
    }
}

/// A `cudaMalloc` allocation. Freed on drop.
pub(crate) struct DeviceBuffer {
    ptr: *mut c_void,
    bytes: usize,
}

impl DeviceBuffer {
    pub fn alloc(bytes: usize, context: &'static str) -> Result<Self, Error> {
        let mut ptr = ptr::null_mut();
        check(unsafe { sys::cudaMalloc(&mut ptr, bytes) }, context)?;
        Ok(Self { ptr, bytes })
    }

    pub fn device_ptr(&self) -> sys::CUdeviceptr {
        self.ptr as sys::CUdeviceptr
    }

    pub fn len_bytes(&self) -> usize {
        self.bytes
    }

    /// Queues a host→device copy of `src` on `stream`.
    ///
    /// `src` must stay alive and unmodified until the stream is synchronized.
    pub fn upload_async(&self, src: &[f32], stream: &CudaStream, context: &'static str) -> Result<(), Error> {
        let bytes = std::mem::size_of_val(src);
        assert!(bytes <= self.bytes, "upload past end of device buffer");
        check(
            unsafe {
                sys::cudaMemcpyAsync(
                    self.ptr,
                    src.as_ptr().cast(),
                    bytes,
                    sys::cudaMemcpyKind::HostToDevice,
                    stream.raw(),
                )
            },
            context,
        )
    }

    /// Queues a device→host copy into `dst` on `stream`.
    ///
    /// `dst` must stay alive until the stream is synchronized.
    pub fn download_async(&self, dst: &mut [f32], stream: &CudaStream, context: &'static str) -> Result<(), Error> {
        let bytes = std::mem::size_of_val(dst);
        assert!(bytes <= self.bytes, "download past end of device buffer");
        check(
            unsafe {
                sys::cudaMemcpyAsync(
                    dst.as_mut_ptr().cast(),
                    self.ptr,
                    bytes,
                    sys::cudaMemcpyKind::DeviceToHost,
                    stream.raw(),
                )
            },
            context,
        )
    }
}

impl Drop for DeviceBuffer {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            unsafe { sys::cudaFree(self.ptr) };
        }
    }
}
