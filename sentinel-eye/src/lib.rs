//! sentinel-eye: frame acquisition and inference for the Sentinel pipeline
//!
//! Frames come in through a `FrameSource` supervised for device failures,
//! cross a bounded latest-wins queue, run through an `InferenceProvider`,
//! and feed the alert engine. Camera I/O (`opencv` feature) and ONNX
//! inference (`onnx` feature) are optional backends; the default build is
//! pure Rust and test-driven.

pub mod annotate;
pub mod capture;
pub mod frame;
pub mod infer;
pub mod pipeline;
pub mod queue;
pub mod source;

#[cfg(feature = "opencv")]
pub mod camera;
#[cfg(feature = "onnx")]
pub mod onnx;

pub use capture::CaptureSupervisor;
pub use frame::{Frame, VideoSource};
pub use infer::{InferenceProvider, ScriptedProvider};
pub use pipeline::DetectionPipeline;
pub use queue::FrameQueue;
pub use source::{FrameSource, SyntheticSource};

#[cfg(feature = "opencv")]
pub use camera::CameraSource;
#[cfg(feature = "onnx")]
pub use onnx::OnnxWeaponDetector;
