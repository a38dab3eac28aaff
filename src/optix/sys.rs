//! Raw bindings: the CUDA runtime calls used by the OptiX backend, plus the OptiX entry
//! points exported by `csrc/optix_shim.c`.

#![allow(non_camel_case_types, dead_code)]

use std::os::raw::{c_char, c_int, c_uint, c_void};

pub type cudaError_t = c_int;
pub const cudaSuccess: cudaError_t = 0;

pub type cudaStream_t = *mut c_void;
pub type CUdeviceptr = u64;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum cudaMemcpyKind {
    HostToHost = 0,
    HostToDevice = 1,
    DeviceToHost = 2,
    DeviceToDevice = 3,
    Default = 4,
}

extern "C" {
    pub fn cudaFree(dev_ptr: *mut c_void) -> cudaError_t;
    pub fn cudaMalloc(dev_ptr: *mut *mut c_void, size: usize) -> cudaError_t;
    pub fn cudaMemcpyAsync(
        dst: *mut c_void,
        src: *const c_void,
        count: usize,
        kind: cudaMemcpyKind,
        stream: cudaStream_t,
    ) -> cudaError_t;
    pub fn cudaGetDeviceCount(count: *mut c_int) -> cudaError_t;
    pub fn cudaSetDevice(device: c_int) -> cudaError_t;
    pub fn cudaStreamCreate(stream: *mut cudaStream_t) -> cudaError_t;
    pub fn cudaStreamSynchronize(stream: cudaStream_t) -> cudaError_t;
    pub fn cudaStreamDestroy(stream: cudaStream_t) -> cudaError_t;
    pub fn cudaGetErrorString(error: cudaError_t) -> *const c_char;
}

// ---------------------------------------------------------------------------
// OptiX (via shim)
// ---------------------------------------------------------------------------

pub type OptixResult = c_int;
pub const OPTIX_SUCCESS: OptixResult = 0;

#[repr(C)]
pub struct OptixDeviceContextImpl {
    _private: [u8; 0],
}
#[repr(C)]
pub struct OptixDenoiserImpl {
    _private: [u8; 0],
}

pub type OptixDeviceContext = *mut OptixDeviceContextImpl;
pub type OptixDenoiser = *mut OptixDenoiserImpl;

pub type OptixLogCallback = Option<
    unsafe extern "C" fn(level: c_uint, tag: *const c_char, message: *const c_char, cbdata: *mut c_void),
>;

/// Mirrors `DnImageLayer` in the shim: one interleaved FLOAT4 image in device memory.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DnImageLayer {
    pub data: CUdeviceptr,
    pub width: c_uint,
    pub height: c_uint,
    pub row_stride_bytes: c_uint,
    pub pixel_stride_bytes: c_uint,
}

/// Mirrors `DnInvokeParams` in the shim.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct DnInvokeParams {
    pub copy_alpha: c_int,
    pub blend_factor: f32,
    pub hdr_intensity: CUdeviceptr,
}

extern "C" {
    pub fn dn_optix_init() -> OptixResult;
    pub fn dn_optix_context_create(ctx: *mut OptixDeviceContext) -> OptixResult;
    pub fn dn_optix_context_set_log_callback(
        ctx: OptixDeviceContext,
        callback: OptixLogCallback,
        data: *mut c_void,
        level: c_uint,
    ) -> OptixResult;
    pub fn dn_optix_context_destroy(ctx: OptixDeviceContext) -> OptixResult;
    pub fn dn_optix_denoiser_create(
        ctx: OptixDeviceContext,
        guide_albedo: c_int,
        guide_normal: c_int,
        copy_alpha: c_int,
        denoiser: *mut OptixDenoiser,
    ) -> OptixResult;
    pub fn dn_optix_denoiser_memory(
        denoiser: OptixDenoiser,
        width: c_uint,
        height: c_uint,
        state_size: *mut usize,
        scratch_size: *mut usize,
    ) -> OptixResult;
    pub fn dn_optix_denoiser_setup(
        denoiser: OptixDenoiser,
        stream: cudaStream_t,
        width: c_uint,
        height: c_uint,
        state: CUdeviceptr,
        state_size: usize,
        scratch: CUdeviceptr,
        scratch_size: usize,
    ) -> OptixResult;
    #[allow(clippy::too_many_arguments)]
    pub fn dn_optix_denoiser_invoke(
        denoiser: OptixDenoiser,
        stream: cudaStream_t,
        params: *const DnInvokeParams,
        state: CUdeviceptr,
        state_size: usize,
        input: *const DnImageLayer,
        output: *const DnImageLayer,
        albedo: *const DnImageLayer,
        normal: *const DnImageLayer,
        scratch: CUdeviceptr,
        scratch_size: usize,
    ) -> OptixResult;
    pub fn dn_optix_denoiser_destroy(denoiser: OptixDenoiser) -> OptixResult;
    pub fn dn_cuda_device_properties(
        device: c_int,
        name: *mut c_char,
        name_len: usize,
        major: *mut c_int,
        minor: *mut c_int,
    ) -> cudaError_t;
}
