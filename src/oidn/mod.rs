//! Intel Open Image Denoise backend family.
//!
//! Safe wrappers over the OIDN C API ([`OidnDevice`], [`OidnBuffer`], [`Filter`]) and the
//! adapter that drives the "RT" filter for the facade.

mod adapter;
pub mod buffer;
pub mod device;
pub mod filter;
mod sys;

pub(crate) use adapter::OidnBackend;
pub use buffer::OidnBuffer;
pub use device::{take_global_error, OidnDevice, OidnDeviceType};
pub use filter::Filter;
