//! Error types for the denoiser facade and its backends.
//!
//! See [`Error`] for the main error type returned by public APIs. Its `Display` text is a
//! human-readable diagnostic, not a machine-parseable code.

use crate::mode::DenoiserMode;

/// Errors from a denoiser backend or the facade around it.
///
/// This type implements [`std::error::Error`], [`Send`], and [`Sync`], so it can be
/// used with `?` and error handling libraries, and across thread boundaries.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The requested mode's backend family was not compiled into this build.
    #[error("{} mode not supported in this build", .0.label())]
    Unsupported(DenoiserMode),

    /// Width or height is zero, or the image is too large to address.
    #[error("invalid image dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// A caller buffer does not hold `width * height * 4` floats.
    #[error("{role} buffer has {actual} floats, expected {expected}")]
    BufferSize {
        role: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A guide buffer enabled at construction was not supplied.
    #[error("denoiser was created with {0} guide enabled but no {0} buffer was supplied")]
    MissingGuide(&'static str),

    /// OIDN API returned an error.
    #[error("OIDN error ({code}): {message}")]
    Oidn { code: u32, message: String },

    /// OIDN device creation failed (e.g. no supported backend); carries OIDN's message.
    #[error("{0}")]
    DeviceCreationFailed(String),

    /// OIDN filter creation failed.
    #[error("Unable to create OIDN Filter")]
    FilterCreationFailed,

    /// OIDN out of memory.
    #[error("OIDN out of memory")]
    OutOfMemory,

    /// The machine cannot run the GPU-resident backend (driver, device count, compute capability).
    #[error("{0}")]
    Capability(String),

    /// A CUDA runtime call failed.
    #[error("{context} (CUDA error {code}: {message})")]
    Cuda {
        context: &'static str,
        code: i32,
        message: String,
    },

    /// An OptiX call failed.
    #[error("{context} (OptiX error {code})")]
    Optix { context: &'static str, code: i32 },

    /// wgpu buffer mapping failed.
    #[error("wgpu buffer map failed: {0}")]
    BufferMapFailed(#[from] wgpu::BufferAsyncError),
}
