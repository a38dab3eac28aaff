//! Facade tests. The OIDN tests need OIDN built and linked; the OptiX test needs a CUDA GPU.

use crate::backend::{CheckedInputs, DenoiserBackend, ImageSpec};
use crate::{DenoiseInputs, Denoiser, DenoiserMode, Error};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Copies the beauty buffer scaled by one half; fails when its beauty alpha is negative.
struct HalvingBackend {
    spec: ImageSpec,
    calls: Arc<AtomicUsize>,
    saw_albedo: Arc<AtomicUsize>,
}

impl DenoiserBackend for HalvingBackend {
    fn spec(&self) -> &ImageSpec {
        &self.spec
    }

    fn denoise(&mut self, inputs: CheckedInputs<'_>, output: &mut [f32]) -> Result<(), Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if inputs.albedo.is_some() {
            self.saw_albedo.fetch_add(1, Ordering::SeqCst);
        }
        if inputs.beauty[3] < 0.0 {
            return Err(Error::Capability("negative alpha".into()));
        }
        for (o, b) in output.iter_mut().zip(inputs.beauty) {
            *o = b * 0.5;
        }
        Ok(())
    }
}

fn halving(width: u32, height: u32, use_albedo: bool) -> (Denoiser, Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let saw_albedo = Arc::new(AtomicUsize::new(0));
    let backend = HalvingBackend {
        spec: ImageSpec::new(width, height, use_albedo, false).unwrap(),
        calls: calls.clone(),
        saw_albedo: saw_albedo.clone(),
    };
    let denoiser = Denoiser::from_backend(DenoiserMode::OpenImageDenoiseCpu, Box::new(backend));
    (denoiser, calls, saw_albedo)
}

fn rgba_fill(width: u32, height: u32, px: [f32; 4]) -> Vec<f32> {
    px.repeat(width as usize * height as usize)
}

/// Deterministic pseudo-random value in `[0, 1)`.
#[cfg(any(denoise_oidn, denoise_cuda))]
fn hash01(seed: usize) -> f32 {
    let x = (seed as u64).wrapping_mul(0x9e3779b97f4a7c15);
    ((x >> 40) as f32) / (1u64 << 24) as f32
}

#[test]
fn test_facade_forwards_and_reports_spec() {
    let (mut denoiser, calls, saw_albedo) = halving(3, 2, true);
    assert_eq!(denoiser.mode(), DenoiserMode::OpenImageDenoiseCpu);
    assert_eq!((denoiser.image_width(), denoiser.image_height()), (3, 2));
    assert!(denoiser.use_albedo());
    assert!(!denoiser.use_normals());

    let beauty = rgba_fill(3, 2, [1.0, 2.0, 4.0, 1.0]);
    let albedo = rgba_fill(3, 2, [0.5; 4]);
    let mut output = vec![0.0f32; beauty.len()];
    denoiser
        .denoise(DenoiseInputs::new(&beauty).with_albedo(&albedo), &mut output)
        .expect("denoise");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(saw_albedo.load(Ordering::SeqCst), 1);
    assert_eq!(&output[..4], &[0.5, 1.0, 2.0, 0.5]);
}

#[test]
fn test_facade_validates_before_backend() {
    let (mut denoiser, calls, _) = halving(2, 2, true);
    let beauty = rgba_fill(2, 2, [1.0; 4]);
    let albedo = rgba_fill(2, 2, [1.0; 4]);

    let mut short = vec![0.0f32; 15];
    let err = denoiser
        .denoise(DenoiseInputs::new(&beauty).with_albedo(&albedo), &mut short)
        .expect_err("short output");
    assert!(matches!(err, Error::BufferSize { role: "output", expected: 16, actual: 15 }));

    let mut output = vec![0.0f32; 16];
    let err = denoiser
        .denoise(DenoiseInputs::new(&beauty), &mut output)
        .expect_err("albedo missing");
    assert!(matches!(err, Error::MissingGuide("albedo")));

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_failed_call_leaves_denoiser_usable() {
    let (mut denoiser, calls, _) = halving(1, 1, false);
    let mut output = vec![0.0f32; 4];
    let bad = [1.0, 1.0, 1.0, -1.0];
    assert!(denoiser.denoise(DenoiseInputs::new(&bad), &mut output).is_err());

    let good = [2.0, 2.0, 2.0, 1.0];
    denoiser.denoise(DenoiseInputs::new(&good), &mut output).expect("second call");
    assert_eq!(output, [1.0, 1.0, 1.0, 0.5]);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_zero_dimensions_rejected_for_every_mode() {
    for mode in DenoiserMode::ALL {
        let err = Denoiser::new(mode, 0, 16, false, false).expect_err("zero width");
        assert!(matches!(err, Error::InvalidDimensions { width: 0, height: 16 }), "{mode}: {err}");
        let err = Denoiser::new(mode, 16, 0, true, true).expect_err("zero height");
        assert!(matches!(err, Error::InvalidDimensions { .. }), "{mode}: {err}");
    }
}

#[test]
fn test_unavailable_modes_fail_with_fixed_message() {
    for mode in DenoiserMode::ALL.into_iter().filter(|m| !m.is_available()) {
        let err = Denoiser::new(mode, 8, 8, false, false).expect_err("mode not compiled in");
        assert!(matches!(err, Error::Unsupported(m) if m == mode));
        assert_eq!(err.to_string(), format!("{} mode not supported in this build", mode.label()));
    }
}

/// Collects formatted log lines from a `tracing_subscriber::fmt` subscriber.
#[derive(Clone, Default)]
struct LogCapture(Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl LogCapture {
    fn error_lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock().unwrap())
            .lines()
            .filter(|line| line.starts_with("ERROR"))
            .map(str::to_owned)
            .collect()
    }
}

#[test]
fn test_construction_failures_are_logged_at_error_level() {
    let capture = LogCapture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .finish();

    let unavailable: Vec<DenoiserMode> =
        DenoiserMode::ALL.into_iter().filter(|m| !m.is_available()).collect();
    tracing::subscriber::with_default(subscriber, || {
        assert!(Denoiser::new(DenoiserMode::OpenImageDenoiseCpu, 0, 4, false, false).is_err());
        for &mode in &unavailable {
            assert!(Denoiser::new(mode, 8, 8, false, false).is_err());
        }
    });

    let mut expected = vec!["Denoiser: invalid image dimensions 0x4".to_string()];
    expected.extend(
        unavailable
            .iter()
            .map(|m| format!("Denoiser: {} mode not supported in this build", m.label())),
    );
    let lines = capture.error_lines();
    assert_eq!(lines.len(), expected.len(), "{lines:?}");
    for (line, message) in lines.iter().zip(&expected) {
        assert!(line.ends_with(message.as_str()), "{line:?} should end with {message:?}");
    }
}

#[cfg(not(denoise_cuda))]
#[test]
fn test_optix_unsupported_without_cuda() {
    let err = Denoiser::new(DenoiserMode::Optix, 8, 8, false, false).expect_err("no cuda");
    assert_eq!(err.to_string(), "Optix mode not supported in this build");
}

#[cfg(denoise_oidn)]
mod oidn {
    use super::*;

    fn cpu(width: u32, height: u32, use_albedo: bool, use_normals: bool) -> Denoiser {
        Denoiser::new(DenoiserMode::OpenImageDenoiseCpu, width, height, use_albedo, use_normals)
            .expect("OIDN CPU denoiser")
    }

    fn assert_rgb_near(output: &[f32], rgb: [f32; 3], tolerance: f32) {
        for px in output.chunks_exact(4) {
            for (c, want) in px[..3].iter().zip(rgb) {
                assert!((c - want).abs() <= tolerance, "got {c}, want {want}");
            }
        }
    }

    #[test]
    fn test_accessors_match_construction() {
        for (albedo, normals) in [(false, false), (true, false), (false, true), (true, true)] {
            let denoiser = cpu(7, 5, albedo, normals);
            assert_eq!(denoiser.mode(), DenoiserMode::OpenImageDenoiseCpu);
            assert_eq!(denoiser.image_width(), 7);
            assert_eq!(denoiser.image_height(), 5);
            assert_eq!(denoiser.use_albedo(), albedo);
            assert_eq!(denoiser.use_normals(), normals);
        }
    }

    #[test]
    fn test_flat_field_is_preserved_and_alpha_passes_through() {
        let (w, h) = (16, 16);
        let mut denoiser = cpu(w, h, false, false);
        let mut beauty = rgba_fill(w, h, [0.25, 0.5, 0.75, 0.0]);
        for (i, px) in beauty.chunks_exact_mut(4).enumerate() {
            px[3] = (i % 5) as f32 * 0.25;
        }
        let mut output = vec![-1.0f32; beauty.len()];
        denoiser.denoise(DenoiseInputs::new(&beauty), &mut output).expect("denoise");

        assert_rgb_near(&output, [0.25, 0.5, 0.75], 0.02);
        for (o, b) in output.chunks_exact(4).zip(beauty.chunks_exact(4)) {
            assert_eq!(o[3], b[3]);
        }
    }

    #[test]
    fn test_consecutive_calls_are_independent() {
        let (w, h) = (8, 8);
        let mut denoiser = cpu(w, h, false, false);
        let mut output = vec![0.0f32; (w * h * 4) as usize];

        let dark = rgba_fill(w, h, [0.2, 0.2, 0.2, 1.0]);
        denoiser.denoise(DenoiseInputs::new(&dark), &mut output).expect("first");
        assert_rgb_near(&output, [0.2; 3], 0.02);

        let bright = rgba_fill(w, h, [0.8, 0.8, 0.8, 0.5]);
        denoiser.denoise(DenoiseInputs::new(&bright), &mut output).expect("second");
        assert_rgb_near(&output, [0.8; 3], 0.02);
        assert!(output.chunks_exact(4).all(|px| px[3] == 0.5));
    }

    #[test]
    fn test_noisy_gray_with_albedo_moves_toward_mean() {
        let (w, h) = (4, 4);
        let mut denoiser = cpu(w, h, true, false);
        let beauty: Vec<f32> = (0..(w * h) as usize)
            .flat_map(|i| {
                let n = |c: usize| 0.5 + (hash01(i * 3 + c) - 0.5) * 0.2;
                [n(0), n(1), n(2), 1.0]
            })
            .collect();
        let albedo = rgba_fill(w, h, [0.5, 0.5, 0.5, 1.0]);
        let mut output = vec![0.0f32; beauty.len()];
        denoiser
            .denoise(DenoiseInputs::new(&beauty).with_albedo(&albedo), &mut output)
            .expect("denoise");

        let deviation = |img: &[f32]| -> f32 {
            img.chunks_exact(4)
                .flat_map(|px| px[..3].iter().map(|c| (c - 0.5).abs()))
                .sum::<f32>()
                / (w * h * 3) as f32
        };
        assert!(
            deviation(&output) < deviation(&beauty),
            "output deviation {} not below input deviation {}",
            deviation(&output),
            deviation(&beauty)
        );
    }

    #[test]
    fn test_oidn_wrappers_report_parameters() {
        use crate::oidn::{Filter, OidnBuffer, OidnDevice, OidnDeviceType};

        let device = OidnDevice::with_type(OidnDeviceType::Cpu).expect("OIDN CPU device");
        assert_eq!(device.device_type(), OidnDeviceType::Cpu);
        // OIDN_DEVICE_TYPE_CPU
        assert_eq!(device.get_int(c"type"), 1);

        let buffer = OidnBuffer::new_f32(&device, 12).expect("buffer");
        assert!(buffer.size() >= 48);
        buffer.write(&[0.25; 12]);
        let mut back = [0.0f32; 12];
        buffer.read(&mut back);
        assert_eq!(back, [0.25; 12]);

        let filter = Filter::new(&device, c"RT").expect("RT filter");
        filter.set_bool(c"hdr", true);
        assert!(filter.get_bool(c"hdr"));
        assert!(device.take_error().is_none());
        assert!(crate::oidn::take_global_error().is_none());
    }

    #[test]
    fn test_unknown_filter_type_fails() {
        use crate::oidn::{Filter, OidnDevice, OidnDeviceType};

        let device = OidnDevice::with_type(OidnDeviceType::Cpu).expect("OIDN CPU device");
        assert!(Filter::new(&device, c"NoSuchFilter").is_err());
    }

    #[test]
    fn test_with_config_applies_quality() {
        let config = crate::DenoiserConfig::new(DenoiserMode::OpenImageDenoiseCpu, 4, 4)
            .with_quality(crate::Quality::Fast);
        let mut denoiser = Denoiser::with_config(&config).expect("OIDN CPU denoiser");
        let beauty = rgba_fill(4, 4, [0.5, 0.5, 0.5, 1.0]);
        let mut output = vec![0.0f32; beauty.len()];
        denoiser.denoise(DenoiseInputs::new(&beauty), &mut output).expect("denoise");
    }
}

#[cfg(denoise_cuda)]
mod optix {
    use super::*;
    use crate::{DenoiserConfig, GpuRequirements};

    /// Builds an OptiX denoiser on `device_index`, or `None` when this machine cannot run one.
    fn optix_on(device_index: i32, w: u32, h: u32) -> Option<Denoiser> {
        let config = DenoiserConfig::new(DenoiserMode::Optix, w, h).with_gpu_requirements(GpuRequirements {
            device_index,
            ..GpuRequirements::default()
        });
        match Denoiser::with_config(&config) {
            Ok(d) => Some(d),
            Err(Error::Capability(_) | Error::Cuda { .. } | Error::Optix { .. }) => None,
            Err(e) => panic!("unexpected construction error: {e}"),
        }
    }

    fn varying_alpha(w: u32, h: u32) -> Vec<f32> {
        (0..(w * h) as usize)
            .flat_map(|i| [0.4, 0.4, 0.4, hash01(i)])
            .collect()
    }

    fn assert_alpha_copied(output: &[f32], beauty: &[f32]) {
        for (o, b) in output.chunks_exact(4).zip(beauty.chunks_exact(4)) {
            assert_eq!(o[3], b[3]);
        }
    }

    #[test]
    fn test_optix_copies_alpha_exactly() {
        let (w, h) = (16, 16);
        let Some(mut denoiser) = optix_on(0, w, h) else {
            return;
        };
        let beauty = varying_alpha(w, h);
        let mut output = vec![0.0f32; beauty.len()];
        denoiser.denoise(DenoiseInputs::new(&beauty), &mut output).expect("denoise");
        assert_alpha_copied(&output, &beauty);
    }

    #[test]
    fn test_optix_denoises_and_drops_on_another_thread() {
        let (w, h) = (16, 16);
        // The last device exercises a non-default current device when there is more than one.
        let Some(mut denoiser) = optix_on(1, w, h).or_else(|| optix_on(0, w, h)) else {
            return;
        };
        std::thread::spawn(move || {
            let beauty = varying_alpha(w, h);
            let mut output = vec![0.0f32; beauty.len()];
            denoiser.denoise(DenoiseInputs::new(&beauty), &mut output).expect("denoise");
            assert_alpha_copied(&output, &beauty);
            drop(denoiser);
        })
        .join()
        .expect("denoise thread");
    }
}
