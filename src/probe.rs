//! Capability checks for the GPU-resident backend.
//!
//! The driver-version file and the threshold comparisons are plain Rust and compiled in
//! every build; the CUDA device queries live with the OptiX backend.

use crate::config::GpuRequirements;
use crate::Error;
use std::fmt;
use std::path::Path;

/// Installed NVIDIA kernel driver version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct DriverVersion {
    pub major: u32,
    pub minor: u32,
}

impl DriverVersion {
    /// Parses `<major>.<minor>` with optional leading whitespace; anything after the minor
    /// number (a patch level, a newline) is ignored.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim_start();
        let (major, rest) = split_number(text)?;
        let rest = rest.strip_prefix('.')?;
        let (minor, _) = split_number(rest)?;
        Some(Self { major, minor })
    }

    /// Reads and parses the version file at `path`.
    pub fn read(path: &Path) -> Result<Self, Error> {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|text| Self::parse(&text))
            .ok_or_else(|| Error::Capability("Unable to query NVIDIA driver version".into()))
    }
}

impl fmt::Display for DriverVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

fn split_number(text: &str) -> Option<(u32, &str)> {
    let end = text
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(text.len(), |(i, _)| i);
    if end == 0 {
        return None;
    }
    let value = text[..end].parse().ok()?;
    Some((value, &text[end..]))
}

/// Fails unless `version` meets the configured minimum driver.
pub fn check_driver(version: DriverVersion, req: &GpuRequirements) -> Result<(), Error> {
    if version.major < req.min_driver_major {
        return Err(Error::Capability(format!(
            "NVIDIA driver too old, must be >= {}",
            req.min_driver_major
        )));
    }
    Ok(())
}

/// Fails unless at least one CUDA device is present.
pub fn check_device_count(count: i32) -> Result<(), Error> {
    if count <= 0 {
        return Err(Error::Capability("No CUDA capable devices found".into()));
    }
    Ok(())
}

/// Fails unless the device's compute capability major version meets the minimum.
pub fn check_compute_capability(major: i32, req: &GpuRequirements) -> Result<(), Error> {
    if major < req.min_compute_major {
        return Err(Error::Capability(format!(
            "GPU too old, must be compute capability {} or greater",
            req.min_compute_major
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_driver_versions() {
        assert_eq!(DriverVersion::parse("535.104.05\n"), Some(DriverVersion { major: 535, minor: 104 }));
        assert_eq!(DriverVersion::parse("  525.60"), Some(DriverVersion { major: 525, minor: 60 }));
        assert_eq!(DriverVersion::parse("550.54beta"), Some(DriverVersion { major: 550, minor: 54 }));
    }

    #[test]
    fn rejects_malformed_versions() {
        assert_eq!(DriverVersion::parse(""), None);
        assert_eq!(DriverVersion::parse("535"), None);
        assert_eq!(DriverVersion::parse("535."), None);
        assert_eq!(DriverVersion::parse("v535.10"), None);
    }

    #[test]
    fn missing_version_file_is_a_capability_error() {
        let err = DriverVersion::read(Path::new("/nonexistent/nvidia/version")).expect_err("missing file");
        assert_eq!(err.to_string(), "Unable to query NVIDIA driver version");
    }

    #[test]
    fn thresholds() {
        let req = GpuRequirements::default();
        assert!(check_driver(DriverVersion { major: 525, minor: 0 }, &req).is_ok());
        let err = check_driver(DriverVersion { major: 470, minor: 82 }, &req).expect_err("old driver");
        assert_eq!(err.to_string(), "NVIDIA driver too old, must be >= 525");

        assert!(check_device_count(1).is_ok());
        assert_eq!(
            check_device_count(0).expect_err("no devices").to_string(),
            "No CUDA capable devices found"
        );

        assert!(check_compute_capability(8, &req).is_ok());
        assert_eq!(
            check_compute_capability(5, &req).expect_err("old gpu").to_string(),
            "GPU too old, must be compute capability 6 or greater"
        );
    }
}
