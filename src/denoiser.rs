//! The public denoiser type: picks one backend for a mode and forwards frames to it.

use crate::backend::{CheckedInputs, DenoiseInputs, DenoiserBackend, ImageSpec};
use crate::config::DenoiserConfig;
use crate::mode::DenoiserMode;
use crate::Error;

/// A denoiser bound to one backend, one resolution and one guide-buffer configuration.
///
/// Construction is expensive and acquires native resources; reuse the value for every
/// frame of the same size. Changing the mode, size or guide flags means building a new one.
/// It is not `Clone`.
///
/// ```ignore
/// use denoise_backends::{DenoiseInputs, Denoiser, DenoiserMode};
///
/// let mut denoiser = Denoiser::new(DenoiserMode::OpenImageDenoiseCpu, 640, 480, true, false)?;
/// denoiser.denoise(DenoiseInputs::new(&beauty).with_albedo(&albedo), &mut output)?;
/// ```
pub struct Denoiser {
    mode: DenoiserMode,
    backend: Box<dyn DenoiserBackend>,
}

impl Denoiser {
    /// Creates a denoiser with default quality and GPU requirements.
    pub fn new(
        mode: DenoiserMode,
        width: u32,
        height: u32,
        use_albedo: bool,
        use_normals: bool,
    ) -> Result<Self, Error> {
        let config = DenoiserConfig::new(mode, width, height)
            .with_albedo(use_albedo)
            .with_normals(use_normals);
        Self::with_config(&config)
    }

    /// Creates a denoiser from a full configuration.
    ///
    /// Every failure is also logged at error level as `Denoiser: <message>` before it is
    /// returned, so it stays visible even if the caller drops the error.
    pub fn with_config(config: &DenoiserConfig) -> Result<Self, Error> {
        let built = ImageSpec::new(config.width, config.height, config.use_albedo, config.use_normals)
            .and_then(|spec| create_backend(config, spec));
        match built {
            Ok(backend) => Ok(Self {
                mode: config.mode,
                backend,
            }),
            Err(err) => {
                tracing::error!("Denoiser: {}", err);
                Err(err)
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn from_backend(mode: DenoiserMode, backend: Box<dyn DenoiserBackend>) -> Self {
        Self { mode, backend }
    }

    /// Denoises one frame of RGBA floats into `output`.
    ///
    /// `output` must hold `width * height * 4` floats. Guide buffers are required exactly
    /// when the matching flag was set at construction and ignored otherwise. On error the
    /// contents of `output` are unspecified, but the denoiser can be used again.
    pub fn denoise(&mut self, inputs: DenoiseInputs<'_>, output: &mut [f32]) -> Result<(), Error> {
        let checked = CheckedInputs::check(self.backend.spec(), inputs, output)?;
        self.backend.denoise(checked, output)
    }

    pub fn mode(&self) -> DenoiserMode {
        self.mode
    }

    pub fn image_width(&self) -> u32 {
        self.backend.spec().width
    }

    pub fn image_height(&self) -> u32 {
        self.backend.spec().height
    }

    pub fn use_albedo(&self) -> bool {
        self.backend.spec().use_albedo
    }

    pub fn use_normals(&self) -> bool {
        self.backend.spec().use_normals
    }
}

impl std::fmt::Debug for Denoiser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Denoiser")
            .field("mode", &self.mode)
            .field("spec", self.backend.spec())
            .finish()
    }
}

#[cfg_attr(not(any(denoise_oidn, denoise_cuda)), allow(unused_variables))]
fn create_backend(config: &DenoiserConfig, spec: ImageSpec) -> Result<Box<dyn DenoiserBackend>, Error> {
    if !config.mode.is_available() {
        return Err(Error::Unsupported(config.mode));
    }
    match config.mode {
        #[cfg(denoise_cuda)]
        DenoiserMode::Optix => Ok(Box::new(crate::optix::OptixBackend::new(spec, &config.gpu)?)),
        #[cfg(denoise_oidn)]
        DenoiserMode::OpenImageDenoise => oidn_backend(crate::oidn::OidnDeviceType::Default, spec, config),
        #[cfg(denoise_oidn)]
        DenoiserMode::OpenImageDenoiseCpu => oidn_backend(crate::oidn::OidnDeviceType::Cpu, spec, config),
        #[cfg(all(denoise_oidn, denoise_cuda))]
        DenoiserMode::OpenImageDenoiseCuda => oidn_backend(crate::oidn::OidnDeviceType::Cuda, spec, config),
        #[allow(unreachable_patterns)]
        mode => Err(Error::Unsupported(mode)),
    }
}

#[cfg(denoise_oidn)]
fn oidn_backend(
    device_type: crate::oidn::OidnDeviceType,
    spec: ImageSpec,
    config: &DenoiserConfig,
) -> Result<Box<dyn DenoiserBackend>, Error> {
    Ok(Box::new(crate::oidn::OidnBackend::new(device_type, spec, config.quality)?))
}
