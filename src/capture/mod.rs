//! Acquisition sources and frame handling.
//!
//! This module provides abstractions for pulling frames from a camera
//! or a generated source, and the frame type the rest of the pipeline
//! operates on.

mod camera;
mod config;
#[cfg(feature = "camera")]
mod device;
mod frame;
mod reader;
#[cfg(feature = "stream")]
mod stream;

pub use camera::{open_source, BoxedCamera, Camera, CameraError, SyntheticCamera};
pub use config::{CaptureConfig, CaptureConfigError, SourceDescriptor, UnsupportedSource};
#[cfg(feature = "camera")]
pub use device::DeviceCamera;
pub use frame::{ColorSpace, Frame};
#[cfg(feature = "stream")]
pub use stream::StreamCamera;
