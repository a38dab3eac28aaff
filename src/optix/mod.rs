//! NVIDIA OptiX backend family (CUDA runtime + OptiX denoiser).
//!
//! Compiled only when the `cuda` feature found a CUDA toolkit and OptiX SDK at build time.

mod adapter;
mod context;
mod cuda;
mod sys;

pub(crate) use adapter::OptixBackend;
