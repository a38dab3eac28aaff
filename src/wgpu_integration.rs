//! Denoise wgpu textures by copying to CPU, running a [`Denoiser`], and copying back.

use crate::backend::DenoiseInputs;
use crate::denoiser::Denoiser;
use crate::Error;
use bytemuck::cast_slice;
use std::sync::mpsc;
use wgpu::util::DeviceExt;

/// Supported texture format for denoising input/output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DenoiseTextureFormat {
    /// RGBA 32-bit float (4 components).
    Rgba32Float,
    /// RGBA 16-bit float (4 components).
    Rgba16Float,
}

impl DenoiseTextureFormat {
    /// Converts from a wgpu texture format if it is supported for denoising.
    pub fn from_wgpu(format: wgpu::TextureFormat) -> Option<Self> {
        format.try_into().ok()
    }

    fn bytes_per_pixel(self) -> u32 {
        match self {
            DenoiseTextureFormat::Rgba32Float => 16,
            DenoiseTextureFormat::Rgba16Float => 8,
        }
    }
}

impl TryFrom<wgpu::TextureFormat> for DenoiseTextureFormat {
    type Error = ();

    fn try_from(format: wgpu::TextureFormat) -> Result<Self, Self::Error> {
        match format {
            wgpu::TextureFormat::Rgba32Float => Ok(Self::Rgba32Float),
            wgpu::TextureFormat::Rgba16Float => Ok(Self::Rgba16Float),
            _ => Err(()),
        }
    }
}

/// Row layout of one texture copy, padded to [`wgpu::COPY_BYTES_PER_ROW_ALIGNMENT`].
#[derive(Clone, Copy, Debug)]
struct RowLayout {
    bytes_per_row: u32,
    padded_bytes_per_row: u32,
    rows: u32,
}

impl RowLayout {
    fn new(width: u32, height: u32, format: DenoiseTextureFormat) -> Result<Self, Error> {
        let alignment = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let bytes_per_row = width.checked_mul(format.bytes_per_pixel());
        let padded = bytes_per_row.and_then(|b| b.div_ceil(alignment).checked_mul(alignment));
        match (bytes_per_row, padded) {
            (Some(bytes_per_row), Some(padded_bytes_per_row)) => Ok(Self {
                bytes_per_row,
                padded_bytes_per_row,
                rows: height,
            }),
            _ => Err(Error::InvalidDimensions { width, height }),
        }
    }

    fn padded_size(&self) -> u64 {
        self.padded_bytes_per_row as u64 * self.rows as u64
    }

    fn buffer_layout(&self) -> wgpu::TexelCopyBufferLayout {
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(self.padded_bytes_per_row),
            rows_per_image: Some(self.rows),
        }
    }
}

fn check_size(texture: &wgpu::Texture, width: u32, height: u32) -> Result<(), Error> {
    let s = texture.size();
    if s.width != width || s.height != height || s.depth_or_array_layers != 1 {
        return Err(Error::InvalidDimensions {
            width: s.width,
            height: s.height,
        });
    }
    Ok(())
}

/// Denoises a wgpu color texture by readback → [`Denoiser::denoise`] → upload.
///
/// `albedo` and `normal` are guide textures of the same size and format as `input`; each is
/// required exactly when `denoiser` was created with the matching flag. Input and output can
/// be the same texture for in-place denoising. Alpha follows the backend's policy, which is
/// to carry the input's alpha through unchanged.
///
/// **Texture usage:** `input` and the guides must have
/// [`TextureUsages::COPY_SRC`](wgpu::TextureUsages::COPY_SRC); `output` must have
/// [`TextureUsages::COPY_DST`](wgpu::TextureUsages::COPY_DST).
///
/// This is a blocking call: it submits copy commands, waits for readback, denoises, then uploads.
///
/// # Errors
///
/// Returns [`Error::InvalidDimensions`] if a texture does not match the denoiser's size or has
/// more than one array layer, [`Error::MissingGuide`] if a guide texture enabled on the
/// denoiser is absent, or [`Error::BufferMapFailed`] if wgpu buffer mapping fails. Backend
/// failures are returned as they come from [`Denoiser::denoise`].
#[allow(clippy::too_many_arguments)]
pub fn denoise_texture(
    denoiser: &mut Denoiser,
    wgpu_device: &wgpu::Device,
    wgpu_queue: &wgpu::Queue,
    input: &wgpu::Texture,
    output: &wgpu::Texture,
    format: DenoiseTextureFormat,
    albedo: Option<&wgpu::Texture>,
    normal: Option<&wgpu::Texture>,
) -> Result<(), Error> {
    let w = denoiser.image_width();
    let h = denoiser.image_height();
    check_size(input, w, h)?;
    check_size(output, w, h)?;
    // Guides the denoiser does not read are neither checked nor copied.
    let albedo = albedo.filter(|_| denoiser.use_albedo());
    let normal = normal.filter(|_| denoiser.use_normals());
    for tex in albedo.iter().chain(normal.iter()) {
        check_size(tex, w, h)?;
    }

    let beauty = read_texture_to_rgba_f32(wgpu_device, wgpu_queue, input, format)?;
    let albedo = albedo
        .map(|t| read_texture_to_rgba_f32(wgpu_device, wgpu_queue, t, format))
        .transpose()?;
    let normal = normal
        .map(|t| read_texture_to_rgba_f32(wgpu_device, wgpu_queue, t, format))
        .transpose()?;

    let mut inputs = DenoiseInputs::new(&beauty);
    if let Some(albedo) = albedo.as_deref() {
        inputs = inputs.with_albedo(albedo);
    }
    if let Some(normal) = normal.as_deref() {
        inputs = inputs.with_normals(normal);
    }
    let mut denoised = vec![0.0f32; beauty.len()];
    denoiser.denoise(inputs, &mut denoised)?;

    upload_rgba_to_texture(wgpu_device, wgpu_queue, output, format, w, h, &denoised)
}

/// Reads a wgpu texture to CPU as interleaved RGBA f32. Blocking.
fn read_texture_to_rgba_f32(
    wgpu_device: &wgpu::Device,
    wgpu_queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    format: DenoiseTextureFormat,
) -> Result<Vec<f32>, Error> {
    let size = texture.size();
    let w = size.width;
    let h = size.height;
    let rows = RowLayout::new(w, h, format)?;

    let read_buffer = wgpu_device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("denoise readback"),
        size: rows.padded_size(),
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let mut encoder = wgpu_device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &read_buffer,
            layout: rows.buffer_layout(),
        },
        size,
    );
    wgpu_queue.submit(Some(encoder.finish()));

    let slice = read_buffer.slice(..);
    let (tx, rx) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |r| {
        let _ = tx.send(r);
    });
    loop {
        let _ = wgpu_device.poll(wgpu::PollType::wait_indefinitely());
        match rx.try_recv() {
            Ok(Ok(())) => break,
            Ok(Err(e)) => return Err(Error::BufferMapFailed(e)),
            Err(mpsc::TryRecvError::Disconnected) => return Err(Error::BufferMapFailed(wgpu::BufferAsyncError)),
            Err(mpsc::TryRecvError::Empty) => std::thread::sleep(std::time::Duration::from_micros(100)),
        }
    }

    let mapped = slice.get_mapped_range();
    let mut rgba = Vec::with_capacity(w as usize * h as usize * 4);
    for row in mapped.chunks_exact(rows.padded_bytes_per_row as usize) {
        let row = &row[..rows.bytes_per_row as usize];
        match format {
            DenoiseTextureFormat::Rgba32Float => rgba.extend_from_slice(cast_slice::<u8, f32>(row)),
            DenoiseTextureFormat::Rgba16Float => rgba.extend(
                row.chunks_exact(2)
                    .map(|b| half::f16::from_le_bytes([b[0], b[1]]).to_f32()),
            ),
        }
    }
    drop(mapped);
    read_buffer.unmap();
    Ok(rgba)
}

/// Uploads RGBA f32 pixels to a wgpu texture (padded row alignment).
fn upload_rgba_to_texture(
    wgpu_device: &wgpu::Device,
    wgpu_queue: &wgpu::Queue,
    output: &wgpu::Texture,
    format: DenoiseTextureFormat,
    w: u32,
    h: u32,
    rgba: &[f32],
) -> Result<(), Error> {
    let rows = RowLayout::new(w, h, format)?;
    let mut upload_data = vec![0u8; rows.padded_size() as usize];
    let src_rows = rgba.chunks_exact(w as usize * 4);
    for (dst, src) in upload_data
        .chunks_exact_mut(rows.padded_bytes_per_row as usize)
        .zip(src_rows)
    {
        let dst = &mut dst[..rows.bytes_per_row as usize];
        match format {
            DenoiseTextureFormat::Rgba32Float => dst.copy_from_slice(cast_slice(src)),
            DenoiseTextureFormat::Rgba16Float => {
                for (d, &s) in dst.chunks_exact_mut(2).zip(src) {
                    d.copy_from_slice(&half::f16::from_f32(s).to_le_bytes());
                }
            }
        }
    }

    let write_buffer = wgpu_device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("denoise upload"),
        contents: &upload_data,
        usage: wgpu::BufferUsages::COPY_SRC,
    });
    let mut enc = wgpu_device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
    enc.copy_buffer_to_texture(
        wgpu::TexelCopyBufferInfo {
            buffer: &write_buffer,
            layout: rows.buffer_layout(),
        },
        wgpu::TexelCopyTextureInfo {
            texture: output,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::Extent3d {
            width: w,
            height: h,
            depth_or_array_layers: 1,
        },
    );
    wgpu_queue.submit(Some(enc.finish()));
    Ok(())
}
