pub mod blob;
pub mod blob_detector;
pub mod classifier;
pub mod geometry;
pub mod initializer;
pub mod neighbor;
pub mod persistence;
pub mod pixel;
pub mod sample_store;
pub mod utils;
