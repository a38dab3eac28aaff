//! Build script: locate Open Image Denoise and (optionally) the CUDA toolkit and OptiX SDK.
//!
//! Each backend family that is requested by a Cargo feature and found on the build host
//! is announced to the crate with a cfg (`denoise_oidn`, `denoise_cuda`). A family whose
//! SDK is missing is left out with a warning; requesting it at runtime reports
//! "not supported in this build" instead of failing to link.

use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rustc-check-cfg=cfg(denoise_oidn)");
    println!("cargo:rustc-check-cfg=cfg(denoise_cuda)");
    println!("cargo:rerun-if-env-changed=OIDN_DIR");
    println!("cargo:rerun-if-env-changed=CUDA_PATH");
    println!("cargo:rerun-if-env-changed=OPTIX_ROOT");
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=csrc/optix_shim.c");

    if env::var("DOCS_RS").is_ok() {
        return;
    }

    if env::var_os("CARGO_FEATURE_OIDN").is_some() && link_oidn() {
        println!("cargo:rustc-cfg=denoise_oidn");
    }
    if env::var_os("CARGO_FEATURE_CUDA").is_some() && link_cuda() {
        println!("cargo:rustc-cfg=denoise_cuda");
    }
}

fn link_oidn() -> bool {
    let lib_path = if let Ok(dir) = env::var("OIDN_DIR") {
        let root = PathBuf::from(&dir);
        // Try common locations for the OIDN import library (Windows: .lib, Unix: .a or .so)
        ["lib", "lib64", "Release", "Debug"]
            .iter()
            .map(|p| root.join(p))
            .find(|p| p.exists())
            .unwrap_or(root)
    } else {
        match pkg_config::Config::new().probe("OpenImageDenoise") {
            Ok(lib) => lib.link_paths.first().cloned().unwrap_or_else(PathBuf::new),
            Err(e) => {
                println!(
                    "cargo:warning=denoise-backends: OpenImageDenoise not found via pkg-config: {}",
                    e
                );
                println!(
                    "cargo:warning=Set OIDN_DIR to the install directory (containing include/ and lib/); building without Open Image Denoise."
                );
                return false;
            }
        }
    };

    if !lib_path.as_os_str().is_empty() {
        println!("cargo:rustc-link-search=native={}", lib_path.display());
    }
    println!("cargo:rustc-link-lib=OpenImageDenoise");
    true
}

#[cfg(feature = "cuda")]
fn resolve_cuda_root() -> Option<PathBuf> {
    if let Ok(cuda_path) = env::var("CUDA_PATH") {
        return Some(PathBuf::from(cuda_path));
    }

    let mut candidates = vec![PathBuf::from("/usr/local/cuda")];
    if let Ok(entries) = std::fs::read_dir("/usr/local") {
        let mut versioned = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with("cuda-"))
            })
            .collect::<Vec<_>>();
        versioned.sort();
        versioned.reverse();
        candidates.extend(versioned);
    }

    let root = candidates.into_iter().find(|root| root.exists())?;
    println!(
        "cargo:warning=CUDA_PATH is unset; using discovered CUDA root at {}",
        root.display()
    );
    Some(root)
}

#[cfg(feature = "cuda")]
fn link_cuda() -> bool {
    let Some(cuda_root) = resolve_cuda_root() else {
        println!(
            "cargo:warning=CUDA toolkit not found (CUDA_PATH unset and /usr/local/cuda* missing); building without the OptiX backend"
        );
        return false;
    };
    let Some(optix_root) = env::var_os("OPTIX_ROOT").map(PathBuf::from) else {
        println!("cargo:warning=OPTIX_ROOT is unset; building without the OptiX backend");
        return false;
    };
    let optix_include = optix_root.join("include");
    if !optix_include.join("optix.h").exists() {
        println!(
            "cargo:warning=optix.h not found under {}; building without the OptiX backend",
            optix_include.display()
        );
        return false;
    }

    let cuda_include = cuda_root.join("include");
    let cuda_lib_dir = if cfg!(target_os = "windows") {
        cuda_root.join("lib").join("x64")
    } else {
        let wsl_style = cuda_root.join("targets").join("x86_64-linux").join("lib");
        if wsl_style.exists() {
            wsl_style
        } else {
            cuda_root.join("lib64")
        }
    };
    if !cuda_lib_dir.exists() {
        println!(
            "cargo:warning=CUDA library directory not found at {}; building without the OptiX backend",
            cuda_lib_dir.display()
        );
        return false;
    }

    cc::Build::new()
        .file("csrc/optix_shim.c")
        .include(&optix_include)
        .include(&cuda_include)
        .warnings(false)
        .compile("denoise_optix_shim");

    println!("cargo:rustc-link-search=native={}", cuda_lib_dir.display());
    println!("cargo:rustc-link-lib=dylib=cudart");
    if cfg!(target_os = "linux") {
        // optix_stubs.h loads libnvoptix through dlopen.
        println!("cargo:rustc-link-lib=dylib=dl");
    }
    true
}

#[cfg(not(feature = "cuda"))]
fn link_cuda() -> bool {
    false
}
