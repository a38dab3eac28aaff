//! RGBA ↔ RGB repacking between caller buffers and backend staging images.
//!
//! Caller images are interleaved `[R, G, B, A]` f32, row-major. Backends that do not
//! carry alpha through their kernel work on `[R, G, B]`.

/// Copies the RGB channels of `rgba` into `rgb`, dropping alpha.
///
/// Both slices must describe the same pixel count.
pub(crate) fn rgba_to_rgb(rgba: &[f32], rgb: &mut [f32]) {
    debug_assert_eq!(rgba.len() / 4, rgb.len() / 3);
    let src: &[[f32; 4]] = bytemuck::cast_slice(rgba);
    let dst: &mut [[f32; 3]] = bytemuck::cast_slice_mut(rgb);
    for (d, s) in dst.iter_mut().zip(src) {
        *d = [s[0], s[1], s[2]];
    }
}

/// Writes `rgb` into the RGB channels of `rgba` and copies alpha from `alpha_source`.
pub(crate) fn rgb_to_rgba(rgb: &[f32], alpha_source: &[f32], rgba: &mut [f32]) {
    debug_assert_eq!(rgba.len() / 4, rgb.len() / 3);
    debug_assert_eq!(rgba.len(), alpha_source.len());
    let src: &[[f32; 3]] = bytemuck::cast_slice(rgb);
    let alpha: &[[f32; 4]] = bytemuck::cast_slice(alpha_source);
    let dst: &mut [[f32; 4]] = bytemuck::cast_slice_mut(rgba);
    for ((d, s), a) in dst.iter_mut().zip(src).zip(alpha) {
        *d = [s[0], s[1], s[2], a[3]];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_alpha_and_keeps_pixel_order() {
        let rgba = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let mut rgb = [0.0f32; 6];
        rgba_to_rgb(&rgba, &mut rgb);
        assert_eq!(rgb, [1.0, 2.0, 3.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn restores_source_alpha() {
        let rgb = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6];
        let source = [9.0, 9.0, 9.0, 0.25, 9.0, 9.0, 9.0, 1.0];
        let mut out = [f32::NAN; 8];
        rgb_to_rgba(&rgb, &source, &mut out);
        assert_eq!(out, [0.1, 0.2, 0.3, 0.25, 0.4, 0.5, 0.6, 1.0]);
    }

    #[test]
    fn overwrites_every_output_value() {
        let rgb = [0.0f32; 12];
        let source = [0.0f32; 16];
        let mut out = [7.0f32; 16];
        rgb_to_rgba(&rgb, &source, &mut out);
        assert!(out.iter().all(|&v| v == 0.0));
    }
}
