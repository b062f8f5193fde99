// THEORY:
// The `pipeline` module is the top-level API of the segmentation engine. `ViBe`
// owns everything with a lifetime longer than one frame (the sample model, the
// seeding progress, the random generator) plus the per-frame outputs (the
// foreground mask and the blob list), and drives the core modules in order:
//
//   first frame(s)   → initializer fills the sample store (or a file is loaded)
//   every later frame → classifier scans row-major, producing the mask
//   optionally        → blob detector turns the mask into bounding regions
//
// Key architectural principles:
// 1.  **Explicit state**: seeding progress and the random generator are fields,
//     not globals. Two models in one process never interfere, and a fixed seed
//     makes a whole run reproducible.
// 2.  **Format fixed at birth**: the first frame decides grayscale vs colour and
//     the dimensions. Every later frame is checked against them and rejected
//     (without mutating anything) if it differs.
// 3.  **Blocking and sequential**: `process` is one complete unit of work. The
//     classifier's neighbor diffusion makes scan order observable, so there is
//     no intra-frame parallelism. Callers wanting async use `worker`.

use crate::config::VibeConfig;
use crate::core_modules::blob::{Blob, BoundingBox, RotatedRect};
use crate::core_modules::blob_detector::blob_detector;
use crate::core_modules::classifier::{UpdatePolicy, classify_frame};
use crate::core_modules::initializer::{SeedProgress, fill_pass, fill_remaining};
use crate::core_modules::persistence::{load_samples, save_samples};
use crate::core_modules::pixel::{COLOR_BACKGROUND, PixelFormat, validate_dimensions};
use crate::core_modules::sample_store::SampleModel;
use crate::core_modules::utils::image_helper::image_helper;
use crate::error::{Result, VibeError};
use image::{DynamicImage, GenericImageView, GrayImage, Luma, RgbImage};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Output of [`ViBe::get_mask`].
#[derive(Debug, Clone)]
pub struct BoxMask {
    /// Every blob's rotated box, filled with 255 on a 0 background.
    pub mask: GrayImage,
    /// The foreground mask in colour with each blob's bounding box outlined.
    pub annotated: Option<RgbImage>,
}

/// The sample-based background model and its per-frame outputs.
pub struct ViBe {
    config: VibeConfig,
    policy: UpdatePolicy,
    model: Option<SampleModel>,
    progress: SeedProgress,
    rng: StdRng,
    foreground: GrayImage,
    blobs: Vec<Blob>,
    frame_index: u64,
}

impl ViBe {
    pub fn new(config: VibeConfig) -> Result<Self> {
        config.validate()?;
        let rng = StdRng::seed_from_u64(config.seed.unwrap_or_else(time_seed));
        Ok(Self {
            policy: UpdatePolicy::from(&config),
            progress: SeedProgress::new(config.samples_per_pixel),
            config,
            model: None,
            rng,
            foreground: GrayImage::new(0, 0),
            blobs: Vec::new(),
            frame_index: 0,
        })
    }

    /// Establishes the format and dimensions from `frame` and fills the sample
    /// store, from `samples_path` when it loads and matches, otherwise from
    /// `frame`. Does nothing once the model is complete.
    pub fn initialize(&mut self, frame: &DynamicImage, samples_path: Option<&Path>) -> Result<()> {
        let format = self.check_frame(frame)?;
        if self.is_initialized() {
            debug!("initialize called on a complete model, ignoring");
            return Ok(());
        }

        if let Some(path) = samples_path {
            match self.load_matching(path, frame, format) {
                Ok(model) => {
                    self.model = Some(model);
                    self.progress = SeedProgress::complete(self.config.samples_per_pixel);
                    self.finish_initialization(frame, "loaded");
                    return Ok(());
                }
                Err(e) => warn!("{e}; synthesizing samples from the frame instead"),
            }
        }

        let (width, height) = frame.dimensions();
        let n = self.config.samples_per_pixel;
        let model = self
            .model
            .get_or_insert_with(|| SampleModel::new(format, height, width, n));
        let passes = synthesize(model, frame, &mut self.progress, &mut self.rng, true)?;
        debug!(passes, "synthesized initialization passes");
        self.finish_initialization(frame, "synthesized");
        Ok(())
    }

    /// Runs exactly one initialization pass from `frame`, so the model can be
    /// seeded from several representative images. Returns how many of the N
    /// sample indices are filled afterwards.
    pub fn add_seed_frame(&mut self, frame: &DynamicImage) -> Result<usize> {
        let format = self.check_frame(frame)?;
        if self.is_initialized() {
            return Ok(self.progress.filled());
        }

        let (width, height) = frame.dimensions();
        let n = self.config.samples_per_pixel;
        let model = self
            .model
            .get_or_insert_with(|| SampleModel::new(format, height, width, n));
        synthesize(model, frame, &mut self.progress, &mut self.rng, false)?;
        debug!(filled = self.progress.filled(), total = n, "seed frame added");

        if self.progress.is_complete() {
            self.finish_initialization(frame, "seed frames");
        }
        Ok(self.progress.filled())
    }

    /// Processes one frame. The call that finds the model incomplete initializes
    /// it and yields an all-background mask; later calls classify and update.
    pub fn process(
        &mut self,
        frame: &DynamicImage,
        samples_path: Option<&Path>,
        compute_blobs: bool,
    ) -> Result<&GrayImage> {
        self.check_frame(frame)?;

        let foreground_pixels = if self.is_initialized() {
            let model = self.model.as_mut().ok_or(VibeError::NotInitialized)?;
            classify_model(
                model,
                frame,
                &mut self.foreground,
                &self.policy,
                &mut self.rng,
            )?
        } else {
            self.initialize(frame, samples_path)?;
            0
        };

        if compute_blobs {
            self.blobs = blob_detector::find_blobs(&self.foreground, self.config.min_blob_area);
        } else {
            self.blobs.clear();
        }
        self.frame_index += 1;
        debug!(
            frame = self.frame_index,
            foreground_pixels,
            blobs = self.blobs.len(),
            "frame processed"
        );
        Ok(&self.foreground)
    }

    /// Renders the current rotated boxes as a filled mask and, if asked, the
    /// bounding boxes over a colour copy of the foreground.
    pub fn get_mask(&self, draw_contour: bool) -> BoxMask {
        let (width, height) = self.foreground.dimensions();
        BoxMask {
            mask: image_helper::box_mask(&self.blobs, width, height),
            annotated: draw_contour
                .then(|| image_helper::draw_bounding_boxes(&self.foreground, &self.blobs)),
        }
    }

    /// Zeroes the pixels of `image` that `mask` marks as background.
    pub fn get_masked_img(image: &mut RgbImage, mask: &DynamicImage) -> Result<()> {
        image_helper::apply_mask(image, mask)
    }

    /// Writes the sample store to `path`.
    pub fn save_samples(&self, path: &Path) -> Result<()> {
        let model = self
            .model
            .as_ref()
            .filter(|_| self.is_initialized())
            .ok_or(VibeError::NotInitialized)?;
        save_samples(model, path)?;
        info!("saved samples to {}", path.display());
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.model.is_some() && self.progress.is_complete()
    }

    /// How many of the N sample indices have been filled so far.
    pub fn samples_filled(&self) -> usize {
        self.progress.filled()
    }

    /// Number of frames `process` has accepted.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn config(&self) -> &VibeConfig {
        &self.config
    }

    /// The live sample store, once a frame has established it.
    pub fn samples(&self) -> Option<&SampleModel> {
        self.model.as_ref()
    }

    /// The most recent foreground mask (0 = background, 255 = foreground).
    pub fn foreground(&self) -> &GrayImage {
        &self.foreground
    }

    pub fn blob_count(&self) -> usize {
        self.blobs.len()
    }

    /// Blobs of the most recent frame, largest first.
    pub fn blobs(&self) -> &[Blob] {
        &self.blobs
    }

    pub fn bounding_boxes(&self) -> Vec<BoundingBox> {
        self.blobs.iter().map(|b| b.bounding_box).collect()
    }

    pub fn rotated_boxes(&self) -> Vec<RotatedRect> {
        self.blobs.iter().map(|b| b.rotated_box).collect()
    }

    /// Validates `frame` on its own and against the established model.
    fn check_frame(&self, frame: &DynamicImage) -> Result<PixelFormat> {
        let (width, height) = frame.dimensions();
        validate_dimensions(width, height)?;
        let format = PixelFormat::of(frame)?;
        if let Some(model) = &self.model {
            if model.format() != format {
                return Err(VibeError::FormatMismatch {
                    expected: model.format().to_string(),
                    actual: format.to_string(),
                });
            }
            if model.dimensions() != (width, height) {
                return Err(VibeError::DimensionMismatch {
                    expected: model.dimensions(),
                    actual: (width, height),
                });
            }
        }
        Ok(format)
    }

    fn load_matching(
        &self,
        path: &Path,
        frame: &DynamicImage,
        format: PixelFormat,
    ) -> Result<SampleModel> {
        let model = load_samples(path)?;
        let mismatch = if model.format() != format {
            Some(format!("file holds {} samples, frame is {}", model.format(), format))
        } else if model.dimensions() != frame.dimensions() {
            Some(format!(
                "file is {:?}, frame is {:?}",
                model.dimensions(),
                frame.dimensions()
            ))
        } else if model.samples_per_pixel() != self.config.samples_per_pixel {
            Some(format!(
                "file has {} samples per pixel, model expects {}",
                model.samples_per_pixel(),
                self.config.samples_per_pixel
            ))
        } else {
            None
        };

        match mismatch {
            Some(reason) => Err(VibeError::PersistenceLoad {
                path: path.to_path_buf(),
                reason,
            }),
            None => Ok(model),
        }
    }

    fn finish_initialization(&mut self, frame: &DynamicImage, source: &str) {
        self.rng = StdRng::seed_from_u64(self.config.seed.unwrap_or_else(time_seed));
        let (width, height) = frame.dimensions();
        self.foreground = GrayImage::from_pixel(width, height, Luma([COLOR_BACKGROUND]));
        self.blobs.clear();
        info!(
            width,
            height,
            samples_per_pixel = self.config.samples_per_pixel,
            "background model initialized from {source}"
        );
    }
}

/// Runs initialization passes on whichever store variant matches `frame`.
fn synthesize(
    model: &mut SampleModel,
    frame: &DynamicImage,
    progress: &mut SeedProgress,
    rng: &mut StdRng,
    all_remaining: bool,
) -> Result<usize> {
    let passes = match (model, frame) {
        (SampleModel::Grayscale(store), DynamicImage::ImageLuma8(image)) => {
            if all_remaining {
                fill_remaining(store, image, progress, rng)
            } else {
                fill_pass(store, image, progress, rng) as usize
            }
        }
        (SampleModel::Color(store), DynamicImage::ImageRgb8(image)) => {
            if all_remaining {
                fill_remaining(store, image, progress, rng)
            } else {
                fill_pass(store, image, progress, rng) as usize
            }
        }
        (model, frame) => return Err(format_mismatch(model, frame)),
    };
    Ok(passes)
}

/// Runs the classify/update scan on whichever store variant matches `frame`.
fn classify_model(
    model: &mut SampleModel,
    frame: &DynamicImage,
    mask: &mut GrayImage,
    policy: &UpdatePolicy,
    rng: &mut StdRng,
) -> Result<usize> {
    match (model, frame) {
        (SampleModel::Grayscale(store), DynamicImage::ImageLuma8(image)) => {
            Ok(classify_frame(store, image, mask, policy, rng))
        }
        (SampleModel::Color(store), DynamicImage::ImageRgb8(image)) => {
            Ok(classify_frame(store, image, mask, policy, rng))
        }
        (model, frame) => Err(format_mismatch(model, frame)),
    }
}

fn format_mismatch(model: &SampleModel, frame: &DynamicImage) -> VibeError {
    VibeError::FormatMismatch {
        expected: model.format().to_string(),
        actual: format!("{:?}", frame.color()),
    }
}

fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}
