// THEORY:
// This file is the entry point for the `vibe_segmentation` library crate. It
// exports `ViBe`, a sample-based background model that turns a stream of video
// frames into per-pixel foreground masks and bounding regions, together with
// its configuration, error type and an async worker wrapper.
//
// The algorithmic pieces (pixel formats, the sample store, neighbor selection,
// initialization, classification, blob extraction, persistence) live in
// `core_modules` and stay public for callers that want to compose them
// directly, but `pipeline::ViBe` is the intended front door.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod pipeline;
pub mod worker;

pub use config::VibeConfig;
pub use core_modules::blob::{Blob, BoundingBox, Point, RotatedRect};
pub use core_modules::pixel::{COLOR_BACKGROUND, COLOR_FOREGROUND, PixelFormat};
pub use core_modules::sample_store::{SampleModel, SampleStore};
pub use error::{Result, VibeError};
pub use pipeline::{BoxMask, ViBe};
pub use worker::{FrameResult, SegmentationWorker};
