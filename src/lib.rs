//! # denoise-backends
//!
//! One denoiser API over interchangeable backends: [Intel Open Image Denoise](https://www.openimagedenoise.org)
//! (OIDN, CPU or GPU device) and the NVIDIA OptiX AI denoiser. Callers hand in noisy RGBA
//! `f32` frames, optionally with albedo and normal guides, and get a denoised RGBA frame of
//! the same size back. A [`Denoiser`] is built once per mode, resolution and guide
//! configuration and reused for every frame.
//!
//! ## Setup
//!
//! Backend families are chosen when the crate is built:
//!
//! - **`oidn`** (default feature): build and install OIDN 2.x, then either set **`OIDN_DIR`**
//!   to the install directory (containing `include/` and `lib/`) or use **pkg-config**.
//! - **`cuda`**: set **`OPTIX_ROOT`** to an OptiX SDK and **`CUDA_PATH`** to a CUDA toolkit
//!   (defaults to `/usr/local/cuda`). Enables [`DenoiserMode::Optix`] and, together with
//!   OIDN, [`DenoiserMode::OpenImageDenoiseCuda`].
//!
//! When a library is not found the crate still builds; asking for one of its modes then
//! fails with [`Error::Unsupported`]. [`DenoiserMode::is_available`] reports this up front.
//!
//! ## Example: denoise CPU buffers
//!
//! ```ignore
//! # fn main() -> Result<(), denoise_backends::Error> {
//! use denoise_backends::{DenoiseInputs, Denoiser, DenoiserMode};
//!
//! let mut denoiser = Denoiser::new(DenoiserMode::OpenImageDenoiseCpu, width, height, false, false)?;
//! let mut output = vec![0.0f32; beauty.len()];
//! denoiser.denoise(DenoiseInputs::new(&beauty), &mut output)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Example: denoise a wgpu texture
//!
//! ```ignore
//! use denoise_backends::{denoise_texture, DenoiseTextureFormat, Denoiser, DenoiserMode};
//!
//! let mut denoiser = Denoiser::new(DenoiserMode::OpenImageDenoise, width, height, false, false)?;
//! denoise_texture(
//!     &mut denoiser,
//!     &wgpu_device,
//!     &wgpu_queue,
//!     &input_texture,
//!     &output_texture,
//!     DenoiseTextureFormat::Rgba16Float,
//!     None,
//!     None,
//! )?;
//! ```

mod backend;
pub mod config;
mod denoiser;
pub mod error;
#[cfg_attr(not(denoise_oidn), allow(dead_code))]
mod marshal;
pub mod mode;
#[cfg(denoise_oidn)]
pub mod oidn;
#[cfg(denoise_cuda)]
mod optix;
pub mod probe;
pub mod wgpu_integration;

#[cfg(test)]
mod tests;

pub use backend::{DenoiseInputs, ImageSpec};
pub use config::{DenoiserConfig, GpuRequirements, Quality};
pub use denoiser::Denoiser;
pub use error::Error;
pub use mode::{DenoiserMode, ParseModeError};
pub use wgpu_integration::{denoise_texture, DenoiseTextureFormat};
