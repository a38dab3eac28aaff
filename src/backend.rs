//! The contract every backend adapter implements.

use crate::Error;

/// Bytes in one RGBA f32 pixel.
pub(crate) const RGBA_F32_PIXEL_BYTES: u32 = 16;

/// Fixed per-adapter image layout: resolution and which guide buffers are read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageSpec {
    pub width: u32,
    pub height: u32,
    pub use_albedo: bool,
    pub use_normals: bool,
}

impl ImageSpec {
    /// Validates the dimensions; both must be non-zero, one RGBA row must have a byte
    /// stride that fits in `u32`, and the whole image must fit in `usize`.
    pub fn new(width: u32, height: u32, use_albedo: bool, use_normals: bool) -> Result<Self, Error> {
        let valid = width > 0
            && height > 0
            && width.checked_mul(RGBA_F32_PIXEL_BYTES).is_some()
            && (width as usize)
                .checked_mul(height as usize)
                .and_then(|n| n.checked_mul(RGBA_F32_PIXEL_BYTES as usize))
                .is_some();
        if !valid {
            return Err(Error::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            use_albedo,
            use_normals,
        })
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Length in floats of one RGBA image.
    pub fn rgba_len(&self) -> usize {
        self.pixel_count() * 4
    }
}

/// One frame's input images, each `width * height * 4` floats (RGBA, row-major).
///
/// `albedo` and `normals` are only read when the denoiser was created with the matching flag.
#[derive(Clone, Copy, Debug)]
pub struct DenoiseInputs<'a> {
    pub beauty: &'a [f32],
    pub albedo: Option<&'a [f32]>,
    pub normals: Option<&'a [f32]>,
}

impl<'a> DenoiseInputs<'a> {
    pub fn new(beauty: &'a [f32]) -> Self {
        Self {
            beauty,
            albedo: None,
            normals: None,
        }
    }

    pub fn with_albedo(mut self, albedo: &'a [f32]) -> Self {
        self.albedo = Some(albedo);
        self
    }

    pub fn with_normals(mut self, normals: &'a [f32]) -> Self {
        self.normals = Some(normals);
        self
    }
}

/// Inputs after the facade has checked them against an [`ImageSpec`]: every slice has
/// the right length and a guide is present exactly when its flag is set.
#[derive(Clone, Copy, Debug)]
pub(crate) struct CheckedInputs<'a> {
    pub beauty: &'a [f32],
    pub albedo: Option<&'a [f32]>,
    pub normals: Option<&'a [f32]>,
}

impl<'a> CheckedInputs<'a> {
    pub fn check(spec: &ImageSpec, inputs: DenoiseInputs<'a>, output: &[f32]) -> Result<Self, Error> {
        let expected = spec.rgba_len();
        let sized = |role: &'static str, buf: &[f32]| {
            if buf.len() == expected {
                Ok(())
            } else {
                Err(Error::BufferSize {
                    role,
                    expected,
                    actual: buf.len(),
                })
            }
        };
        sized("beauty", inputs.beauty)?;
        sized("output", output)?;
        let albedo = if spec.use_albedo {
            let albedo = inputs.albedo.ok_or(Error::MissingGuide("albedo"))?;
            sized("albedo", albedo)?;
            Some(albedo)
        } else {
            None
        };
        let normals = if spec.use_normals {
            let normals = inputs.normals.ok_or(Error::MissingGuide("normals"))?;
            sized("normals", normals)?;
            Some(normals)
        } else {
            None
        };
        Ok(Self {
            beauty: inputs.beauty,
            albedo,
            normals,
        })
    }
}

/// A backend adapter: owns the native resources for repeated denoising at one
/// resolution and one guide-buffer configuration.
///
/// Dropping the adapter releases its native resources in reverse acquisition order.
pub(crate) trait DenoiserBackend: Send {
    fn spec(&self) -> &ImageSpec;

    /// Denoises one frame into `output`. On error the contents of `output` are unspecified
    /// but the adapter stays usable.
    fn denoise(&mut self, inputs: CheckedInputs<'_>, output: &mut [f32]) -> Result<(), Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_dimensions_rejected() {
        assert!(matches!(
            ImageSpec::new(0, 4, false, false),
            Err(Error::InvalidDimensions { width: 0, height: 4 })
        ));
        assert!(matches!(
            ImageSpec::new(4, 0, true, true),
            Err(Error::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn row_stride_must_fit_u32() {
        assert!(ImageSpec::new((u32::MAX / 16) + 1, 1, false, false).is_err());
        assert!(matches!(
            ImageSpec::new(1 << 28, 1, false, false),
            Err(Error::InvalidDimensions { width: 268_435_456, height: 1 })
        ));
        assert!(ImageSpec::new(u32::MAX / 16, 1, false, false).is_ok());
    }

    #[test]
    fn check_ignores_guides_when_disabled() {
        let spec = ImageSpec::new(2, 2, false, false).unwrap();
        let beauty = vec![0.0f32; 16];
        let stray = vec![0.0f32; 3];
        let output = vec![0.0f32; 16];
        let checked = CheckedInputs::check(
            &spec,
            DenoiseInputs::new(&beauty).with_albedo(&stray),
            &output,
        )
        .expect("valid inputs");
        assert!(checked.albedo.is_none());
        assert!(checked.normals.is_none());
    }

    #[test]
    fn check_reports_role_of_bad_buffer() {
        let spec = ImageSpec::new(2, 2, false, true).unwrap();
        let beauty = vec![0.0f32; 16];
        let normals = vec![0.0f32; 12];
        let output = vec![0.0f32; 16];
        let err = CheckedInputs::check(&spec, DenoiseInputs::new(&beauty), &output)
            .expect_err("normals missing");
        assert!(matches!(err, Error::MissingGuide("normals")));
        let err = CheckedInputs::check(
            &spec,
            DenoiseInputs::new(&beauty).with_normals(&normals),
            &output,
        )
        .expect_err("normals short");
        assert!(matches!(
            err,
            Error::BufferSize { role: "normals", expected: 16, actual: 12 }
        ));
    }
}
