// THEORY:
// The classifier is where ViBe does its work, once per pixel per frame:
//
// 1.  **Matching search (early exit)**: walk the pixel's samples counting those
//     within the squared radius of the observed value. Stop as soon as
//     `min_matches` is reached. The best case costs `min_matches` comparisons,
//     the worst case N.
// 2.  **Classification**: enough matches means background, otherwise foreground.
// 3.  **Conservative self update**: only background pixels ever touch the model.
//     With probability 1/(sub-1) the observed value replaces a random sample of
//     the pixel itself. Foreground pixels never update, so moving objects do not
//     leak into the background.
// 4.  **Neighbor diffusion**: with an independent 1/(sub-1) draw, the observed
//     value replaces a random sample of a random 8-connected neighbor. This is
//     what lets background information spread into ghost regions.
//
// Random replacement (rather than oldest-first) gives every sample an
// exponentially decaying lifetime, so the model has no fixed memory window.
//
// Ordering: the frame is scanned row-major and diffusion writes straight into
// the shared store. A neighbor that is scanned later in the same frame sees
// values written earlier in that frame. The scan is therefore sequential on
// purpose; with a fixed seed the output is exactly reproducible.

use crate::core_modules::neighbor::random_neighbor;
use crate::core_modules::pixel::{Frame, PixelLabel, SampleValue, value_at};
use crate::core_modules::sample_store::SampleStore;
use crate::config::VibeConfig;
use image::{GrayImage, Luma};
use rand::Rng;

/// The classification and update parameters the per-pixel loop needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdatePolicy {
    pub squared_radius: u32,
    pub min_matches: usize,
    pub subsampling: u32,
}

impl From<&VibeConfig> for UpdatePolicy {
    fn from(config: &VibeConfig) -> Self {
        Self {
            squared_radius: config.squared_radius(),
            min_matches: config.min_matches,
            subsampling: config.subsampling,
        }
    }
}

impl UpdatePolicy {
    /// One Bernoulli draw with probability `1 / (subsampling - 1)`.
    #[inline]
    fn should_update<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        rng.gen_range(0..self.subsampling - 1) == 0
    }
}

/// Counts samples within `squared_radius` of `observed`, stopping at `min_matches`.
#[inline]
pub fn count_matches<P: SampleValue>(
    samples: &[P],
    observed: &P,
    squared_radius: u32,
    min_matches: usize,
) -> usize {
    let mut count = 0;
    for sample in samples {
        if observed.distance(sample) < squared_radius {
            count += 1;
            if count >= min_matches {
                break;
            }
        }
    }
    count
}

/// Classifies the pixel at `(row, col)` against its samples and applies the
/// randomized update policy when it is background.
pub fn classify_pixel<P, R>(
    store: &mut SampleStore<P>,
    row: u32,
    col: u32,
    observed: P,
    policy: &UpdatePolicy,
    rng: &mut R,
) -> PixelLabel
where
    P: SampleValue,
    R: Rng + ?Sized,
{
    let matches = count_matches(
        store.pixel_samples(row, col),
        &observed,
        policy.squared_radius,
        policy.min_matches,
    );
    if matches < policy.min_matches {
        return PixelLabel::Foreground;
    }

    let samples_per_pixel = store.samples_per_pixel();
    if policy.should_update(rng) {
        let index = rng.gen_range(0..samples_per_pixel);
        store.set(row, col, index, observed);
    }
    if policy.should_update(rng) {
        let (n_row, n_col) = random_neighbor(rng, row, col, store.height(), store.width());
        let index = rng.gen_range(0..samples_per_pixel);
        store.set(n_row, n_col, index, observed);
    }
    PixelLabel::Background
}

/// Scans `frame` in row-major order, writing each pixel's label into `mask`.
/// Returns the number of foreground pixels.
pub fn classify_frame<P, R>(
    store: &mut SampleStore<P>,
    frame: &Frame<P>,
    mask: &mut GrayImage,
    policy: &UpdatePolicy,
    rng: &mut R,
) -> usize
where
    P: SampleValue,
    R: Rng + ?Sized,
{
    let mut foreground = 0;
    for row in 0..store.height() {
        for col in 0..store.width() {
            let observed = value_at::<P>(frame, row, col);
            let label = classify_pixel(store, row, col, observed, policy, rng);
            if label == PixelLabel::Foreground {
                foreground += 1;
            }
            mask.put_pixel(col, row, Luma([label.to_mask_value()]));
        }
    }
    foreground
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::pixel::{COLOR_BACKGROUND, COLOR_FOREGROUND};
    use image::RgbImage;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn policy() -> UpdatePolicy {
        UpdatePolicy::from(&VibeConfig::default())
    }

    #[test]
    fn early_exit_stops_at_min_matches() {
        let samples = [100u8, 101, 102, 103, 104];
        assert_eq!(count_matches(&samples, &100, 400, 2), 2);
        assert_eq!(count_matches(&samples, &100, 400, 5), 5);
        assert_eq!(count_matches(&samples, &200, 400, 2), 0);
    }

    #[test]
    fn distance_must_be_strictly_below_radius() {
        // |120 - 100|^2 == 400 is not a match.
        let samples = [120u8, 120, 100];
        assert_eq!(count_matches(&samples, &100, 400, 2), 1);
    }

    #[test]
    fn foreground_pixels_never_touch_the_model() {
        let mut store: SampleStore<u8> = SampleStore::new(3, 3, 20);
        for row in 0..3 {
            for col in 0..3 {
                for i in 0..20 {
                    store.set(row, col, i, 10);
                }
            }
        }
        let snapshot = store.clone();
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..500 {
            let label = classify_pixel(&mut store, 1, 1, 250, &policy(), &mut rng);
            assert_eq!(label, PixelLabel::Foreground);
        }
        assert_eq!(store, snapshot);
    }

    #[test]
    fn background_updates_write_only_the_observed_value() {
        let mut store: SampleStore<u8> = SampleStore::new(3, 3, 20);
        let mut rng = StdRng::seed_from_u64(4);
        let mut updated = false;
        for _ in 0..2000 {
            // Every sample is 0, observed 5: always background.
            assert_eq!(
                classify_pixel(&mut store, 1, 1, 5, &policy(), &mut rng),
                PixelLabel::Background
            );
            for row in 0..3 {
                for col in 0..3 {
                    for &s in store.pixel_samples(row, col) {
                        assert!(s == 0 || s == 5);
                        updated |= s == 5;
                    }
                }
            }
        }
        assert!(updated, "2000 background hits never triggered an update");
    }

    #[test]
    fn color_frames_use_channel_distance() {
        let mut store: SampleStore<[u8; 3]> = SampleStore::new(2, 2, 4);
        for row in 0..2 {
            for col in 0..2 {
                for i in 0..4 {
                    store.set(row, col, i, [50, 50, 50]);
                }
            }
        }
        let mut frame = RgbImage::from_pixel(2, 2, image::Rgb([55, 50, 50]));
        frame.put_pixel(1, 1, image::Rgb([50, 90, 50]));
        let mut mask = GrayImage::new(2, 2);
        let mut rng = StdRng::seed_from_u64(0);

        let foreground = classify_frame(&mut store, &frame, &mut mask, &policy(), &mut rng);
        assert_eq!(foreground, 1);
        assert_eq!(mask.get_pixel(0, 0).0[0], COLOR_BACKGROUND);
        assert_eq!(mask.get_pixel(1, 1).0[0], COLOR_FOREGROUND);
    }

    /// Runs one 1x2 frame where (0,1) starts with a single matching sample, so
    /// it can only become background through (0,0)'s diffusion in the same scan.
    fn scan_pair(left: u8, seed: u64) -> (PixelLabel, SampleStore<u8>) {
        let policy = UpdatePolicy { squared_radius: 400, min_matches: 2, subsampling: 2 };
        let mut store: SampleStore<u8> = SampleStore::new(1, 2, 4);
        for i in 0..4 {
            store.set(0, 0, i, 100);
        }
        store.set(0, 1, 0, 105);

        let mut frame = GrayImage::new(2, 1);
        frame.put_pixel(0, 0, Luma([left]));
        frame.put_pixel(1, 0, Luma([105]));
        let mut mask = GrayImage::new(2, 1);
        let mut rng = StdRng::seed_from_u64(seed);
        classify_frame(&mut store, &frame, &mut mask, &policy, &mut rng);

        let label = if mask.get_pixel(1, 0).0[0] == COLOR_FOREGROUND {
            PixelLabel::Foreground
        } else {
            PixelLabel::Background
        };
        (label, store)
    }

    #[test]
    fn later_pixels_see_diffusion_from_the_same_scan() {
        let (mut background, mut foreground) = (0, 0);
        for seed in 0..200 {
            let (label, store) = scan_pair(100, seed);
            match label {
                PixelLabel::Background => background += 1,
                PixelLabel::Foreground => {
                    // The diffused 100 overwrote the only matching sample.
                    assert_eq!(store.pixel_samples(0, 1), &[100, 0, 0, 0]);
                    foreground += 1;
                }
            }
        }
        assert!(background > 0, "diffusion was never visible to the next pixel");
        assert!(foreground > 0, "diffusion never hit the matching sample");
    }

    #[test]
    fn foreground_left_pixel_diffuses_nothing() {
        for seed in 0..50 {
            let (label, store) = scan_pair(250, seed);
            assert_eq!(label, PixelLabel::Foreground);
            assert_eq!(store.pixel_samples(0, 1), &[105, 0, 0, 0]);
        }
    }
}
