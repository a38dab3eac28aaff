//! Denoiser backend selection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which backend (and, for Open Image Denoise, which device type) a [`Denoiser`](crate::Denoiser) uses.
///
/// Chosen once at construction; a different mode needs a new denoiser.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DenoiserMode {
    /// NVIDIA OptiX AI denoiser on device-resident CUDA memory.
    #[serde(rename = "optix")]
    Optix,
    /// Open Image Denoise, library picks the device.
    #[serde(rename = "oidn")]
    OpenImageDenoise,
    /// Open Image Denoise on the CPU.
    #[serde(rename = "oidn-cpu")]
    OpenImageDenoiseCpu,
    /// Open Image Denoise on an NVIDIA GPU through CUDA.
    #[serde(rename = "oidn-cuda")]
    OpenImageDenoiseCuda,
}

impl DenoiserMode {
    /// All modes, in declaration order.
    pub const ALL: [DenoiserMode; 4] = [
        DenoiserMode::Optix,
        DenoiserMode::OpenImageDenoise,
        DenoiserMode::OpenImageDenoiseCpu,
        DenoiserMode::OpenImageDenoiseCuda,
    ];

    /// Short configuration name (`optix`, `oidn`, `oidn-cpu`, `oidn-cuda`).
    pub fn as_str(self) -> &'static str {
        match self {
            DenoiserMode::Optix => "optix",
            DenoiserMode::OpenImageDenoise => "oidn",
            DenoiserMode::OpenImageDenoiseCpu => "oidn-cpu",
            DenoiserMode::OpenImageDenoiseCuda => "oidn-cuda",
        }
    }

    /// Human-readable name used in diagnostics.
    pub fn label(self) -> &'static str {
        match self {
            DenoiserMode::Optix => "Optix",
            DenoiserMode::OpenImageDenoise => "Open Image Denoise",
            DenoiserMode::OpenImageDenoiseCpu => "Open Image Denoise CPU",
            DenoiserMode::OpenImageDenoiseCuda => "Open Image Denoise CUDA",
        }
    }

    /// Whether this mode's backend family was compiled into this build.
    ///
    /// `false` means construction fails with [`Error::Unsupported`](crate::Error::Unsupported)
    /// without touching any native resource. `true` says nothing about whether the
    /// current machine can actually run it.
    pub fn is_available(self) -> bool {
        match self {
            DenoiserMode::Optix => cfg!(denoise_cuda),
            DenoiserMode::OpenImageDenoise | DenoiserMode::OpenImageDenoiseCpu => {
                cfg!(denoise_oidn)
            }
            DenoiserMode::OpenImageDenoiseCuda => cfg!(all(denoise_oidn, denoise_cuda)),
        }
    }
}

impl fmt::Display for DenoiserMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned by [`DenoiserMode::from_str`] for an unknown name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown denoiser mode '{0}' (expected optix, oidn, oidn-cpu or oidn-cuda)")]
pub struct ParseModeError(String);

impl FromStr for DenoiserMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "optix" => Ok(DenoiserMode::Optix),
            "oidn" | "open-image-denoise" => Ok(DenoiserMode::OpenImageDenoise),
            "oidn-cpu" => Ok(DenoiserMode::OpenImageDenoiseCpu),
            "oidn-cuda" => Ok(DenoiserMode::OpenImageDenoiseCuda),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}
