//! GPU-resident adapter: OptiX HDR denoiser on device-memory RGBA buffers.

use super::context::{OptixContext, OptixDenoiserHandle};
use super::cuda::{self, CudaStream, DeviceBuffer};
use super::sys::{DnImageLayer, DnInvokeParams};
use crate::backend::{CheckedInputs, DenoiserBackend, ImageSpec, RGBA_F32_PIXEL_BYTES};
use crate::config::GpuRequirements;
use crate::probe::{self, DriverVersion};
use crate::Error;
use tracing::info;

/// Layout of one interleaved RGBA float image of `spec`'s size at `buffer`. `ImageSpec`
/// guarantees the row stride fits in `u32`.
fn rgba_layer(buffer: &DeviceBuffer, spec: &ImageSpec) -> DnImageLayer {
    DnImageLayer {
        data: buffer.device_ptr(),
        width: spec.width,
        height: spec.height,
        row_stride_bytes: spec.width * RGBA_F32_PIXEL_BYTES,
        pixel_stride_bytes: RGBA_F32_PIXEL_BYTES,
    }
}

/// A device buffer for one guide role together with its layer descriptor.
struct GuideImage {
    buffer: DeviceBuffer,
    layer: DnImageLayer,
}

impl GuideImage {
    fn alloc(spec: &ImageSpec, context: &'static str) -> Result<Self, Error> {
        let buffer = DeviceBuffer::alloc(spec.rgba_len() * std::mem::size_of::<f32>(), context)?;
        let layer = rgba_layer(&buffer, spec);
        Ok(Self { buffer, layer })
    }
}

/// OptiX backend for [`DenoiserMode::Optix`](crate::DenoiserMode::Optix).
///
/// Alpha is copied from the beauty input by OptiX, never denoised.
pub(crate) struct OptixBackend {
    spec: ImageSpec,
    device_index: i32,
    device_name: String,
    params: DnInvokeParams,
    input_layer: DnImageLayer,
    output_layer: DnImageLayer,
    // Drop order is release order: normals, albedo, beauty, output, scratch, state,
    // denoiser, context, stream.
    normals: Option<GuideImage>,
    albedo: Option<GuideImage>,
    beauty: DeviceBuffer,
    output: DeviceBuffer,
    scratch: DeviceBuffer,
    state: DeviceBuffer,
    denoiser: OptixDenoiserHandle,
    context: OptixContext,
    stream: CudaStream,
}

impl OptixBackend {
    pub(crate) fn new(spec: ImageSpec, req: &GpuRequirements) -> Result<Self, Error> {
        info!("Creating Optix denoiser");

        let driver = DriverVersion::read(&req.driver_version_path)?;
        probe::check_driver(driver, req)?;
        let gpu = cuda::select_device(req)?;

        let stream = CudaStream::new()?;
        let context = OptixContext::new()?;
        let denoiser = OptixDenoiserHandle::new(&context, spec.use_albedo, spec.use_normals)?;

        let sizes = denoiser.memory_sizes(spec.width, spec.height)?;
        let state = DeviceBuffer::alloc(sizes.state_bytes, "Unable to allocate denoiser state")?;
        let scratch = DeviceBuffer::alloc(sizes.scratch_bytes, "Unable to allocate denoiser scratch buffer")?;
        denoiser.setup(&stream, spec.width, spec.height, &state, &scratch)?;

        let params = DnInvokeParams {
            copy_alpha: 1,
            blend_factor: 0.0,
            hdr_intensity: 0,
        };

        let image_bytes = spec.rgba_len() * std::mem::size_of::<f32>();
        let output = DeviceBuffer::alloc(image_bytes, "Unable to allocate denoiser output buffer")?;
        let beauty = DeviceBuffer::alloc(image_bytes, "Unable to allocate denoiser input beauty buffer")?;
        let input_layer = rgba_layer(&beauty, &spec);
        let output_layer = rgba_layer(&output, &spec);

        let albedo = spec
            .use_albedo
            .then(|| GuideImage::alloc(&spec, "Unable to allocate denoiser input albedo buffer"))
            .transpose()?;
        let normals = spec
            .use_normals
            .then(|| GuideImage::alloc(&spec, "Unable to allocate denoiser input normals buffer"))
            .transpose()?;

        // Setup is queued on the stream; surface its failure here rather than on the first frame.
        stream.synchronize()?;

        info!(
            device = %gpu.name,
            device_index = gpu.index,
            compute_capability = ?gpu.compute_capability,
            driver = %driver,
            width = spec.width,
            height = spec.height,
            albedo = spec.use_albedo,
            normals = spec.use_normals,
            "Optix denoiser ready"
        );
        Ok(Self {
            spec,
            device_index: gpu.index,
            device_name: gpu.name,
            params,
            input_layer,
            output_layer,
            normals,
            albedo,
            beauty,
            output,
            scratch,
            state,
            denoiser,
            context,
            stream,
        })
    }

    /// Queues the uploads, the launch and the readback. The caller must synchronize the
    /// stream before `inputs` or `output` go out of scope, whether or not this succeeded.
    fn enqueue(&self, inputs: CheckedInputs<'_>, output: &mut [f32]) -> Result<(), Error> {
        self.beauty
            .upload_async(inputs.beauty, &self.stream, "Denoiser failure copying input beauty")?;
        if let (Some(image), Some(albedo)) = (&self.albedo, inputs.albedo) {
            image
                .buffer
                .upload_async(albedo, &self.stream, "Denoiser failure copying input albedo")?;
        }
        if let (Some(image), Some(normals)) = (&self.normals, inputs.normals) {
            image
                .buffer
                .upload_async(normals, &self.stream, "Denoiser failure copying input normals")?;
        }

        self.denoiser.invoke(
            &self.stream,
            &self.params,
            &self.state,
            &self.scratch,
            &self.input_layer,
            &self.output_layer,
            self.albedo.as_ref().map(|g| &g.layer),
            self.normals.as_ref().map(|g| &g.layer),
        )?;

        self.output
            .download_async(output, &self.stream, "Denoiser failure copying output")
    }
}

impl DenoiserBackend for OptixBackend {
    fn spec(&self) -> &ImageSpec {
        &self.spec
    }

    fn denoise(&mut self, inputs: CheckedInputs<'_>, output: &mut [f32]) -> Result<(), Error> {
        // The backend may have moved to another thread since construction.
        cuda::make_current(self.device_index)?;
        let queued = self.enqueue(inputs, output);
        // Always drain the stream: queued copies still reference the caller's buffers.
        let drained = self.stream.synchronize();
        queued.and(drained)
    }
}

// Raw CUDA/OptiX handles; the backend is used by one thread at a time through `&mut self`,
// and every entry point re-binds `device_index` on the calling thread.
unsafe impl Send for OptixBackend {}

impl Drop for OptixBackend {
    fn drop(&mut self) {
        info!(device = %self.device_name, "Freeing Optix denoiser");
        // Fields are released after this body returns, against the current device.
        if let Err(e) = cuda::make_current(self.device_index) {
            tracing::error!("Denoiser: {}", e);
        }
    }
}
