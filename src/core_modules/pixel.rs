// THEORY:
// The `pixel` module defines the two pixel formats the background model
// understands and the single operation every other module needs from a pixel:
// how far apart two values are.
//
// Key principles:
// 1.  **Closed set of formats**: only 8-bit grayscale and 8-bit RGB are
//     supported. The format is established from the first frame and never
//     converted afterwards; anything else is rejected up front.
// 2.  **One trait, two impls**: `SampleValue` is implemented for `u8` and
//     `[u8; 3]`. The sample store, initializer and classifier are generic over
//     it, so the distance and update logic is written once and monomorphized per
//     format instead of branching on a runtime type tag for every pixel.
// 3.  **Squared distances only**: the distance is the squared Euclidean distance
//     in channel space and is compared directly against the squared radius, so
//     the hot loop never takes a square root.

use crate::error::{Result, VibeError};
use image::{DynamicImage, ImageBuffer, Luma, Rgb};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mask value of a pixel that matches the background model.
pub const COLOR_BACKGROUND: u8 = 0;
/// Mask value of a pixel that does not match the background model.
pub const COLOR_FOREGROUND: u8 = 255;

/// The pixel layouts a model can be built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    Grayscale,
    Color,
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PixelFormat::Grayscale => write!(f, "8-bit grayscale"),
            PixelFormat::Color => write!(f, "8-bit RGB"),
        }
    }
}

impl PixelFormat {
    /// Determines the format of a frame, failing loudly for anything unsupported.
    pub fn of(frame: &DynamicImage) -> Result<Self> {
        match frame {
            DynamicImage::ImageLuma8(_) => Ok(PixelFormat::Grayscale),
            DynamicImage::ImageRgb8(_) => Ok(PixelFormat::Color),
            other => Err(VibeError::UnsupportedFormat(format!("{:?}", other.color()))),
        }
    }
}

/// Per-pixel classification result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLabel {
    Background,
    Foreground,
}

impl PixelLabel {
    pub fn to_mask_value(self) -> u8 {
        match self {
            PixelLabel::Background => COLOR_BACKGROUND,
            PixelLabel::Foreground => COLOR_FOREGROUND,
        }
    }
}

/// A value that can be stored as a background sample.
pub trait SampleValue: Copy + Default + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// The format tag for this value type.
    const FORMAT: PixelFormat;
    /// The `image` pixel type frames of this format are made of.
    type ImagePixel: image::Pixel<Subpixel = u8>;

    fn from_pixel(pixel: &Self::ImagePixel) -> Self;

    /// Squared Euclidean distance between two values in channel space.
    fn distance(&self, other: &Self) -> u32;
}

impl SampleValue for u8 {
    const FORMAT: PixelFormat = PixelFormat::Grayscale;
    type ImagePixel = Luma<u8>;

    #[inline]
    fn from_pixel(pixel: &Luma<u8>) -> Self {
        pixel.0[0]
    }

    #[inline]
    fn distance(&self, other: &Self) -> u32 {
        let diff = *self as i32 - *other as i32;
        (diff * diff) as u32
    }
}

impl SampleValue for [u8; 3] {
    const FORMAT: PixelFormat = PixelFormat::Color;
    type ImagePixel = Rgb<u8>;

    #[inline]
    fn from_pixel(pixel: &Rgb<u8>) -> Self {
        pixel.0
    }

    #[inline]
    fn distance(&self, other: &Self) -> u32 {
        self.iter()
            .zip(other.iter())
            .map(|(a, b)| {
                let diff = *a as i32 - *b as i32;
                (diff * diff) as u32
            })
            .sum()
    }
}

/// A frame whose pixels are of type `P`.
pub type Frame<P> = ImageBuffer<<P as SampleValue>::ImagePixel, Vec<u8>>;

/// Reads the value at `(row, col)` of a typed frame.
#[inline]
pub fn value_at<P: SampleValue>(frame: &Frame<P>, row: u32, col: u32) -> P {
    P::from_pixel(frame.get_pixel(col, row))
}

/// Rejects frames with no pixels and frames too small to have any neighbor.
pub fn validate_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 || (width == 1 && height == 1) {
        return Err(VibeError::InvalidFrame { width, height });
    }
    Ok(())
}
