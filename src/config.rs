//! Denoiser construction settings.
//!
//! [`DenoiserConfig`] can be embedded in a renderer's own (serde) configuration; every
//! field other than the mode and the dimensions has a default.

use crate::mode::DenoiserMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Open Image Denoise filter quality vs performance trade-off (OIDN 2.x).
///
/// Ignored by the OptiX backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Quality {
    /// Library default (high quality).
    #[default]
    Default,
    /// Fast, for interactive preview.
    Fast,
    /// Balanced, for interactive use at higher quality.
    Balanced,
    /// High, for final-frame rendering.
    High,
}

/// Minimum environment for the OptiX backend, checked before any CUDA resource is created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GpuRequirements {
    /// File holding the installed NVIDIA driver version as `<major>.<minor>`.
    pub driver_version_path: PathBuf,
    pub min_driver_major: u32,
    pub min_compute_major: i32,
    /// CUDA device the backend runs on.
    pub device_index: i32,
}

impl Default for GpuRequirements {
    fn default() -> Self {
        Self {
            driver_version_path: PathBuf::from("/sys/module/nvidia/version"),
            min_driver_major: 525,
            min_compute_major: 6,
            device_index: 0,
        }
    }
}

/// Everything needed to build a [`Denoiser`](crate::Denoiser).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DenoiserConfig {
    pub mode: DenoiserMode,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub use_albedo: bool,
    #[serde(default)]
    pub use_normals: bool,
    #[serde(default)]
    pub quality: Quality,
    #[serde(default)]
    pub gpu: GpuRequirements,
}

impl DenoiserConfig {
    /// Config with no guide buffers and default backend settings.
    pub fn new(mode: DenoiserMode, width: u32, height: u32) -> Self {
        Self {
            mode,
            width,
            height,
            use_albedo: false,
            use_normals: false,
            quality: Quality::Default,
            gpu: GpuRequirements::default(),
        }
    }

    pub fn with_albedo(mut self, use_albedo: bool) -> Self {
        self.use_albedo = use_albedo;
        self
    }

    pub fn with_normals(mut self, use_normals: bool) -> Self {
        self.use_normals = use_normals;
        self
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_gpu_requirements(mut self, gpu: GpuRequirements) -> Self {
        self.gpu = gpu;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_json_fills_defaults() {
        let config: DenoiserConfig =
            serde_json::from_str(r#"{ "mode": "oidn-cpu", "width": 640, "height": 480 }"#)
                .expect("parse config");
        assert_eq!(config, DenoiserConfig::new(DenoiserMode::OpenImageDenoiseCpu, 640, 480));
        assert_eq!(config.gpu.min_driver_major, 525);
        assert_eq!(config.gpu.driver_version_path, PathBuf::from("/sys/module/nvidia/version"));
    }

    #[test]
    fn full_json() {
        let config: DenoiserConfig = serde_json::from_str(
            r#"{
                "mode": "optix",
                "width": 8,
                "height": 4,
                "use-albedo": true,
                "use-normals": true,
                "quality": "high",
                "gpu": { "min-driver-major": 550, "device-index": 1 }
            }"#,
        )
        .expect("parse config");
        assert_eq!(config.mode, DenoiserMode::Optix);
        assert!(config.use_albedo && config.use_normals);
        assert_eq!(config.quality, Quality::High);
        assert_eq!(config.gpu.min_driver_major, 550);
        assert_eq!(config.gpu.device_index, 1);
        assert_eq!(config.gpu.min_compute_major, 6);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let parsed = serde_json::from_str::<DenoiserConfig>(
            r#"{ "mode": "nlm", "width": 8, "height": 8 }"#,
        );
        assert!(parsed.is_err());
    }
}
