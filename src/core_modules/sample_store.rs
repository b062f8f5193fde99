// THEORY:
// The `SampleStore` is the background model itself: for every pixel an ordered
// set of exactly N previously observed values. It is a "dumb" container with no
// behavior beyond indexed reads and writes. All of the policy (what gets
// written, when, and where) lives in the initializer and the classifier.
//
// Layout: one flat `Vec<P>` in `(row, col, sample)` order, so the N samples of
// one pixel are contiguous and the classifier's early-exit search walks a
// single cache line for typical N.
//
// `SampleModel` is the tagged variant over the two supported pixel formats. It
// is what the orchestrator owns and what gets persisted: one array, one tag.

use crate::core_modules::pixel::{PixelFormat, SampleValue};
use serde::{Deserialize, Serialize};

/// Per-pixel sample sets for a `height x width` frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleStore<P> {
    height: u32,
    width: u32,
    samples_per_pixel: usize,
    data: Vec<P>,
}

impl<P: SampleValue> SampleStore<P> {
    /// Allocates a store with every sample set to the default value.
    pub fn new(height: u32, width: u32, samples_per_pixel: usize) -> Self {
        let len = height as usize * width as usize * samples_per_pixel;
        Self {
            height,
            width,
            samples_per_pixel,
            data: vec![P::default(); len],
        }
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn samples_per_pixel(&self) -> usize {
        self.samples_per_pixel
    }

    #[inline]
    fn offset(&self, row: u32, col: u32) -> usize {
        (row as usize * self.width as usize + col as usize) * self.samples_per_pixel
    }

    /// All samples of one pixel, in sample-index order.
    #[inline]
    pub fn pixel_samples(&self, row: u32, col: u32) -> &[P] {
        let start = self.offset(row, col);
        &self.data[start..start + self.samples_per_pixel]
    }

    #[inline]
    pub fn get(&self, row: u32, col: u32, index: usize) -> P {
        self.data[self.offset(row, col) + index]
    }

    #[inline]
    pub fn set(&mut self, row: u32, col: u32, index: usize, value: P) {
        let offset = self.offset(row, col);
        self.data[offset + index] = value;
    }

    /// True when the backing buffer matches the declared shape. Always holds for
    /// stores built in memory; used to reject corrupt files.
    pub fn is_consistent(&self) -> bool {
        self.height > 0
            && self.width > 0
            && self.samples_per_pixel > 0
            && (self.height as usize)
                .checked_mul(self.width as usize)
                .and_then(|cells| cells.checked_mul(self.samples_per_pixel))
                == Some(self.data.len())
    }
}

/// The background model for one of the supported pixel formats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SampleModel {
    Grayscale(SampleStore<u8>),
    Color(SampleStore<[u8; 3]>),
}

impl SampleModel {
    pub fn new(format: PixelFormat, height: u32, width: u32, samples_per_pixel: usize) -> Self {
        match format {
            PixelFormat::Grayscale => {
                SampleModel::Grayscale(SampleStore::new(height, width, samples_per_pixel))
            }
            PixelFormat::Color => {
                SampleModel::Color(SampleStore::new(height, width, samples_per_pixel))
            }
        }
    }

    pub fn format(&self) -> PixelFormat {
        match self {
            SampleModel::Grayscale(_) => PixelFormat::Grayscale,
            SampleModel::Color(_) => PixelFormat::Color,
        }
    }

    /// `(width, height)` of the frames this model was built for.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            SampleModel::Grayscale(store) => (store.width(), store.height()),
            SampleModel::Color(store) => (store.width(), store.height()),
        }
    }

    pub fn samples_per_pixel(&self) -> usize {
        match self {
            SampleModel::Grayscale(store) => store.samples_per_pixel(),
            SampleModel::Color(store) => store.samples_per_pixel(),
        }
    }

    pub fn is_consistent(&self) -> bool {
        match self {
            SampleModel::Grayscale(store) => store.is_consistent(),
            SampleModel::Color(store) => store.is_consistent(),
        }
    }
}
