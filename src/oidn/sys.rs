//! Raw FFI bindings to the subset of the Intel Open Image Denoise (OIDN) C API used here.
//! Targets OIDN 2.x. See <https://www.openimagedenoise.org>.

#![allow(non_camel_case_types, non_upper_case_globals, dead_code)]

use std::os::raw::{c_char, c_int, c_void};

// ---------------------------------------------------------------------------
// Opaque handles
// ---------------------------------------------------------------------------

#[repr(C)]
pub struct OIDNDeviceImpl {
    _private: [u8; 0],
}
#[repr(C)]
pub struct OIDNBufferImpl {
    _private: [u8; 0],
}
#[repr(C)]
pub struct OIDNFilterImpl {
    _private: [u8; 0],
}

pub type OIDNDevice = *mut OIDNDeviceImpl;
pub type OIDNBuffer = *mut OIDNBufferImpl;
pub type OIDNFilter = *mut OIDNFilterImpl;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum OIDNDeviceType {
    Default = 0,
    CPU = 1,
    SYCL = 2,
    CUDA = 3,
    HIP = 4,
    Metal = 5,
}

#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OIDNError {
    None = 0,
    Unknown = 1,
    InvalidArgument = 2,
    InvalidOperation = 3,
    OutOfMemory = 4,
    UnsupportedHardware = 5,
    Cancelled = 6,
}

#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OIDNFormat {
    Undefined = 0,
    Float = 1,
    Float2,
    Float3,
    Float4,
    Half = 257,
    Half2,
    Half3,
    Half4,
}

#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OIDNQuality {
    Default = 0,
    Fast = 4,
    Balanced = 5,
    High = 6,
}

// ---------------------------------------------------------------------------
// Device
// ---------------------------------------------------------------------------

extern "C" {
    pub fn oidnNewDevice(type_: OIDNDeviceType) -> OIDNDevice;
    pub fn oidnReleaseDevice(device: OIDNDevice);
    pub fn oidnGetDeviceBool(device: OIDNDevice, name: *const c_char) -> bool;
    pub fn oidnGetDeviceInt(device: OIDNDevice, name: *const c_char) -> c_int;
    /// `device` may be null to query the per-thread error of a failed device creation.
    pub fn oidnGetDeviceError(device: OIDNDevice, out_message: *mut *const c_char) -> OIDNError;
    pub fn oidnCommitDevice(device: OIDNDevice);
    pub fn oidnSyncDevice(device: OIDNDevice);
}

// ---------------------------------------------------------------------------
// Buffer
// ---------------------------------------------------------------------------

extern "C" {
    pub fn oidnNewBuffer(device: OIDNDevice, byte_size: usize) -> OIDNBuffer;
    pub fn oidnGetBufferSize(buffer: OIDNBuffer) -> usize;
    pub fn oidnReadBuffer(
        buffer: OIDNBuffer,
        byte_offset: usize,
        byte_size: usize,
        dst_host_ptr: *mut c_void,
    );
    pub fn oidnWriteBuffer(
        buffer: OIDNBuffer,
        byte_offset: usize,
        byte_size: usize,
        src_host_ptr: *const c_void,
    );
    pub fn oidnReleaseBuffer(buffer: OIDNBuffer);
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

extern "C" {
    pub fn oidnNewFilter(device: OIDNDevice, type_name: *const c_char) -> OIDNFilter;
    pub fn oidnReleaseFilter(filter: OIDNFilter);
    pub fn oidnSetFilterImage(
        filter: OIDNFilter,
        name: *const c_char,
        buffer: OIDNBuffer,
        format: OIDNFormat,
        width: usize,
        height: usize,
        byte_offset: usize,
        pixel_byte_stride: usize,
        row_byte_stride: usize,
    );
    pub fn oidnSetSharedFilterImage(
        filter: OIDNFilter,
        name: *const c_char,
        dev_ptr: *mut c_void,
        format: OIDNFormat,
        width: usize,
        height: usize,
        byte_offset: usize,
        pixel_byte_stride: usize,
        row_byte_stride: usize,
    );
    pub fn oidnSetFilterBool(filter: OIDNFilter, name: *const c_char, value: bool);
    pub fn oidnGetFilterBool(filter: OIDNFilter, name: *const c_char) -> bool;
    pub fn oidnSetFilterInt(filter: OIDNFilter, name: *const c_char, value: c_int);
    pub fn oidnCommitFilter(filter: OIDNFilter);
    pub fn oidnExecuteFilter(filter: OIDNFilter);
}
