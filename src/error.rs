//! Error types for the ViBe segmentation engine.

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while building, running or persisting a model.
#[derive(Error, Debug)]
pub enum VibeError {
    #[error("invalid frame: {width}x{height} has no usable pixels")]
    InvalidFrame { width: u32, height: u32 },

    #[error("unsupported pixel format: {0} (expected 8-bit grayscale or 8-bit RGB)")]
    UnsupportedFormat(String),

    #[error("pixel format mismatch: model is {expected}, frame is {actual}")]
    FormatMismatch { expected: String, actual: String },

    #[error("dimension mismatch: expected {}x{}, got {}x{}", expected.0, expected.1, actual.0, actual.1)]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("could not load samples from {}: {reason}", path.display())]
    PersistenceLoad { path: PathBuf, reason: String },

    #[error("the background model has not been initialized yet")]
    NotInitialized,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("segmentation worker is no longer running")]
    WorkerClosed,

    #[error("no tokio runtime is available to host the segmentation worker")]
    NoRuntime,
}

pub type Result<T> = std::result::Result<T, VibeError>;
