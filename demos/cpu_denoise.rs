//! Minimal example: denoise a small RGBA float image on the CPU (no wgpu).
//!
//! Run with: cargo run --example cpu_denoise [mode]
//! `mode` is one of `oidn`, `oidn-cpu`, `oidn-cuda`, `optix` (default `oidn-cpu`).
//! Requires OIDN to be built and OIDN_DIR set (or pkg-config).

use denoise_backends::{DenoiseInputs, Denoiser, DenoiserMode};
use std::io::IsTerminal;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let mode: DenoiserMode = std::env::args()
        .nth(1)
        .as_deref()
        .unwrap_or("oidn-cpu")
        .parse()?;
    let width = 64u32;
    let height = 64u32;

    // Fake noisy RGBA f32 image (e.g. from a path tracer) and a flat albedo guide.
    let beauty: Vec<f32> = (0..(width * height) as usize)
        .flat_map(|i| {
            let x = (i % width as usize) as f32 / width as f32;
            let y = (i / width as usize) as f32 / height as f32;
            let v = (x * y).sin() * 0.5 + 0.5;
            [
                v + rand_simple(i * 3) * 0.1,
                v + rand_simple(i * 3 + 1) * 0.1,
                v + rand_simple(i * 3 + 2) * 0.1,
                1.0,
            ]
        })
        .collect();
    let albedo = [0.8f32, 0.8, 0.8, 1.0].repeat((width * height) as usize);

    let mut denoiser = Denoiser::new(mode, width, height, true, false)?;
    let mut output = vec![0.0f32; beauty.len()];
    denoiser.denoise(DenoiseInputs::new(&beauty).with_albedo(&albedo), &mut output)?;

    println!("Denoised {}x{} image with {}.", width, height, mode.label());
    Ok(())
}

fn rand_simple(seed: usize) -> f32 {
    let x = (seed as u64).wrapping_mul(0x9e3779b97f4a7c15);
    ((x >> 32) as f32) / (u32::MAX as f32)
}

fn init_tracing() {
    let ansi_enabled = std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_ansi(ansi_enabled)
        .init();
}
