//! Host-shared-memory adapter: runs the OIDN "RT" filter on 3-channel staging images.

use super::buffer::OidnBuffer;
use super::device::{OidnDevice, OidnDeviceType};
use super::filter::Filter;
use crate::backend::{CheckedInputs, DenoiserBackend, ImageSpec};
use crate::config::Quality;
use crate::marshal::{rgb_to_rgba, rgba_to_rgb};
use crate::Error;
use std::ffi::CStr;
use tracing::info;

/// One filter image role. `host` is what the adapter repacks into and out of; when the
/// device cannot address host memory, `buffer` is the library-managed copy the filter
/// actually reads or writes.
struct StagedImage {
    host: Vec<f32>,
    buffer: Option<OidnBuffer>,
}

impl StagedImage {
    fn bind(
        device: &OidnDevice,
        filter: &Filter,
        name: &CStr,
        spec: &ImageSpec,
        shared: bool,
    ) -> Result<Self, Error> {
        let len = spec.pixel_count() * 3;
        let mut host = vec![0.0f32; len];
        let buffer = if shared {
            // SAFETY: `host` is never resized, so its heap allocation keeps this address for
            // as long as the adapter (and therefore the filter) lives.
            unsafe { filter.set_shared_image_float3(name, host.as_mut_ptr(), spec.width, spec.height) };
            None
        } else {
            let buffer = OidnBuffer::new_f32(device, len)?;
            filter.set_image_float3(name, &buffer, spec.width, spec.height);
            Some(buffer)
        };
        Ok(Self { host, buffer })
    }

    fn load_rgba(&mut self, rgba: &[f32]) {
        rgba_to_rgb(rgba, &mut self.host);
        if let Some(buffer) = &self.buffer {
            buffer.write(&self.host);
        }
    }

    fn fetch(&mut self) {
        if let Some(buffer) = &self.buffer {
            buffer.read(&mut self.host);
        }
    }
}

/// Open Image Denoise backend for the `OpenImageDenoise*` modes.
///
/// Output alpha is copied from the beauty input; OIDN itself only sees RGB.
pub(crate) struct OidnBackend {
    spec: ImageSpec,
    // Drop order is release order: images, then filter, then device.
    beauty: StagedImage,
    albedo: Option<StagedImage>,
    normals: Option<StagedImage>,
    output: StagedImage,
    filter: Filter,
    device: OidnDevice,
}

impl OidnBackend {
    pub(crate) fn new(
        device_type: OidnDeviceType,
        spec: ImageSpec,
        quality: Quality,
    ) -> Result<Self, Error> {
        info!(device = ?device_type, "Creating Open Image Denoise denoiser");

        let device = OidnDevice::with_type(device_type)?;
        let filter = Filter::new(&device, c"RT")?;
        filter.set_bool(c"hdr", true);
        filter.set_quality(quality);

        let shared = device.get_bool(c"systemMemorySupported");
        let beauty = StagedImage::bind(&device, &filter, c"color", &spec, shared)?;
        let albedo = spec
            .use_albedo
            .then(|| StagedImage::bind(&device, &filter, c"albedo", &spec, shared))
            .transpose()?;
        let normals = spec
            .use_normals
            .then(|| StagedImage::bind(&device, &filter, c"normal", &spec, shared))
            .transpose()?;
        let output = StagedImage::bind(&device, &filter, c"output", &spec, shared)?;
        filter.commit();

        if let Some(e) = device.take_error() {
            return Err(e);
        }

        info!(
            device = ?device_type,
            shared_memory = shared,
            width = spec.width,
            height = spec.height,
            albedo = spec.use_albedo,
            normals = spec.use_normals,
            "Open Image Denoise denoiser ready"
        );
        Ok(Self {
            spec,
            beauty,
            albedo,
            normals,
            output,
            filter,
            device,
        })
    }
}

impl DenoiserBackend for OidnBackend {
    fn spec(&self) -> &ImageSpec {
        &self.spec
    }

    fn denoise(&mut self, inputs: CheckedInputs<'_>, output: &mut [f32]) -> Result<(), Error> {
        self.beauty.load_rgba(inputs.beauty);
        if let (Some(image), Some(albedo)) = (self.albedo.as_mut(), inputs.albedo) {
            image.load_rgba(albedo);
        }
        if let (Some(image), Some(normals)) = (self.normals.as_mut(), inputs.normals) {
            image.load_rgba(normals);
        }

        self.filter.execute();
        // Required for GPU (e.g. CUDA) devices, where execution and copies may be queued.
        self.device.sync();
        self.output.fetch();

        if let Some(e) = self.device.take_error() {
            return Err(e);
        }

        rgb_to_rgba(&self.output.host, inputs.beauty, output);
        Ok(())
    }
}

impl Drop for OidnBackend {
    fn drop(&mut self) {
        info!("Freeing Open Image Denoise denoiser");
    }
}
