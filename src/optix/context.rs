//! OptiX device context and denoiser handles.

use super::cuda::{CudaStream, DeviceBuffer};
use super::sys;
use crate::Error;
use std::ffi::{c_char, c_uint, c_void, CStr};
use std::ptr;

fn check(code: sys::OptixResult, context: &'static str) -> Result<(), Error> {
    if code == sys::OPTIX_SUCCESS {
        Ok(())
    } else {
        Err(Error::Optix { context, code })
    }
}

fn lossy(p: *const c_char) -> String {
    if p.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(p).to_string_lossy().into_owned() }
    }
}

/// OptiX calls this for every information and error message; all go to the info level.
unsafe extern "C" fn log_callback(
    level: c_uint,
    tag: *const c_char,
    message: *const c_char,
    _cbdata: *mut c_void,
) {
    let tag = lossy(tag);
    let message = lossy(message);
    tracing::info!(optix_level = level, tag = %tag, "Denoiser: {}", message);
}

/// OptiX device context bound to the current CUDA context. Destroyed on drop.
pub(crate) struct OptixContext {
    raw: sys::OptixDeviceContext,
}

impl OptixContext {
    /// Loads the OptiX function table and creates a context that logs at every level.
    pub fn new() -> Result<Self, Error> {
        check(unsafe { sys::dn_optix_init() }, "Unable to initialize the Optix API")?;

        let mut raw = ptr::null_mut();
        check(
            unsafe { sys::dn_optix_context_create(&mut raw) },
            "Unable to create the Optix device context",
        )?;
        let ctx = Self { raw };

        // Level 4 is the most verbose; filtering belongs to the tracing subscriber.
        check(
            unsafe { sys::dn_optix_context_set_log_callback(ctx.raw, Some(log_callback), ptr::null_mut(), 4) },
            "Unable to set the Optix logging callback",
        )?;
        Ok(ctx)
    }
}

impl Drop for OptixContext {
    fn drop(&mut self) {
        unsafe { sys::dn_optix_context_destroy(self.raw) };
    }
}

/// Scratch and state sizes for one resolution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct DenoiserSizes {
    pub state_bytes: usize,
    pub scratch_bytes: usize,
}

/// HDR OptiX denoiser object. Destroyed on drop.
pub(crate) struct OptixDenoiserHandle {
    raw: sys::OptixDenoiser,
}

impl OptixDenoiserHandle {
    pub fn new(ctx: &OptixContext, guide_albedo: bool, guide_normal: bool) -> Result<Self, Error> {
        let mut raw = ptr::null_mut();
        check(
            unsafe {
                sys::dn_optix_denoiser_create(ctx.raw, guide_albedo as i32, guide_normal as i32, 1, &mut raw)
            },
            "Unable to create the Optix denoiser",
        )?;
        Ok(Self { raw })
    }

    pub fn memory_sizes(&self, width: u32, height: u32) -> Result<DenoiserSizes, Error> {
        let mut sizes = DenoiserSizes::default();
        check(
            unsafe {
                sys::dn_optix_denoiser_memory(
                    self.raw,
                    width,
                    height,
                    &mut sizes.state_bytes,
                    &mut sizes.scratch_bytes,
                )
            },
            "Unable to compute denoiser memory resources",
        )?;
        Ok(sizes)
    }

    pub fn setup(
        &self,
        stream: &CudaStream,
        width: u32,
        height: u32,
        state: &DeviceBuffer,
        scratch: &DeviceBuffer,
    ) -> Result<(), Error> {
        check(
            unsafe {
                sys::dn_optix_denoiser_setup(
                    self.raw,
                    stream.raw(),
                    width,
                    height,
                    state.device_ptr(),
                    state.len_bytes(),
                    scratch.device_ptr(),
                    scratch.len_bytes(),
                )
            },
            "Unable to setup denoiser",
        )
    }

    /// Queues one denoiser launch on `stream`.
    #[allow(clippy::too_many_arguments)]
    pub fn invoke(
        &self,
        stream: &CudaStream,
        params: &sys::DnInvokeParams,
        state: &DeviceBuffer,
        scratch: &DeviceBuffer,
        input: &sys::DnImageLayer,
        output: &sys::DnImageLayer,
        albedo: Option<&sys::DnImageLayer>,
        normal: Option<&sys::DnImageLayer>,
    ) -> Result<(), Error> {
        let albedo = albedo.map_or(ptr::null(), |l| l as *const _);
        let normal = normal.map_or(ptr::null(), |l| l as *const _);
        check(
            unsafe {
                sys::dn_optix_denoiser_invoke(
                    self.raw,
                    stream.raw(),
                    params,
                    state.device_ptr(),
                    state.len_bytes(),
                    input,
                    output,
                    albedo,
                    normal,
                    scratch.device_ptr(),
                    scratch.len_bytes(),
                )
            },
            "Denoiser failure in optixDenoiserInvoke()",
        )
    }
}

impl Drop for OptixDenoiserHandle {
    fn drop(&mut self) {
        unsafe { sys::dn_optix_denoiser_destroy(self.raw) };
    }
}
