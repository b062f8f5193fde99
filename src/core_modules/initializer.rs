// THEORY:
// The initializer builds the first version of the background model from frames
// alone. ViBe needs N samples per pixel before the first classification, but a
// fresh stream offers only one frame. The trick is spatial: pixels in a small
// neighborhood share similar temporal distributions, so sample `k` of a pixel
// is taken from a random 8-connected neighbor of that pixel in a seed frame.
//
// One "pass" fills sample index `k` for every pixel. N passes fill the store.
// Passes can come from the same frame (the classic single-frame bootstrap) or
// from N distinct representative frames, which gives the model real temporal
// diversity from the start. `SeedProgress` tracks how many passes are done so
// seeding can be resumed across calls and stops once the store is full.
//
// Pixels whose true background was hidden by a moving object in the seed
// frame(s) start out as "ghosts"; the classifier's neighbor diffusion erodes
// them over the following frames.

use crate::core_modules::neighbor::random_neighbor;
use crate::core_modules::pixel::{Frame, SampleValue, value_at};
use crate::core_modules::sample_store::SampleStore;
use rand::Rng;

/// How many of the N synthesis passes have been completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedProgress {
    filled: usize,
    total: usize,
}

impl SeedProgress {
    pub fn new(total: usize) -> Self {
        Self { filled: 0, total }
    }

    /// A store adopted wholesale (e.g. loaded from disk) counts as fully seeded.
    pub fn complete(total: usize) -> Self {
        Self { filled: total, total }
    }

    pub fn filled(&self) -> usize {
        self.filled
    }

    pub fn is_complete(&self) -> bool {
        self.filled >= self.total
    }

    /// The sample index the next pass writes, or `None` once every index is filled.
    pub fn next_index(&self) -> Option<usize> {
        (!self.is_complete()).then_some(self.filled)
    }

    fn advance(&mut self) {
        self.filled = (self.filled + 1).min(self.total);
    }
}

/// Runs one synthesis pass: fills the next unfilled sample index of every pixel
/// from a random neighbor in `frame`. Returns `false` without touching the store
/// when every index is already filled.
pub fn fill_pass<P, R>(
    store: &mut SampleStore<P>,
    frame: &Frame<P>,
    progress: &mut SeedProgress,
    rng: &mut R,
) -> bool
where
    P: SampleValue,
    R: Rng + ?Sized,
{
    let Some(index) = progress.next_index() else {
        return false;
    };

    let (height, width) = (store.height(), store.width());
    for row in 0..height {
        for col in 0..width {
            let (n_row, n_col) = random_neighbor(rng, row, col, height, width);
            store.set(row, col, index, value_at::<P>(frame, n_row, n_col));
        }
    }
    progress.advance();
    true
}

/// Runs passes until the store is full. Returns the number of passes run.
pub fn fill_remaining<P, R>(
    store: &mut SampleStore<P>,
    frame: &Frame<P>,
    progress: &mut SeedProgress,
    rng: &mut R,
) -> usize
where
    P: SampleValue,
    R: Rng + ?Sized,
{
    let mut passes = 0;
    while fill_pass(store, frame, progress, rng) {
        passes += 1;
    }
    passes
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    /// A frame where every pixel value encodes its own position.
    fn coordinate_frame(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| Luma([(y * width + x) as u8]))
    }

    fn neighbor_values(frame: &GrayImage, row: u32, col: u32) -> Vec<u8> {
        let mut values = Vec::new();
        for dr in -1i64..=1 {
            for dc in -1i64..=1 {
                let (r, c) = (row as i64 + dr, col as i64 + dc);
                if (dr, dc) == (0, 0) || r < 0 || c < 0 {
                    continue;
                }
                if r >= frame.height() as i64 || c >= frame.width() as i64 {
                    continue;
                }
                values.push(frame.get_pixel(c as u32, r as u32).0[0]);
            }
        }
        values
    }

    #[test]
    fn every_sample_comes_from_a_valid_neighbor() {
        let (width, height, n) = (9u32, 6u32, 20usize);
        let frame = coordinate_frame(width, height);
        let mut store: SampleStore<u8> = SampleStore::new(height, width, n);
        let mut progress = SeedProgress::new(n);
        let mut rng = StdRng::seed_from_u64(11);

        let passes = fill_remaining(&mut store, &frame, &mut progress, &mut rng);
        assert_eq!(passes, n);
        assert!(progress.is_complete());

        for row in 0..height {
            for col in 0..width {
                let ring = neighbor_values(&frame, row, col);
                for &sample in store.pixel_samples(row, col) {
                    assert!(ring.contains(&sample), "({row},{col}) holds {sample}");
                }
            }
        }
    }

    #[test]
    fn passes_resume_and_stop_when_full() {
        let n = 4;
        let first = GrayImage::from_pixel(5, 5, Luma([10]));
        let second = GrayImage::from_pixel(5, 5, Luma([200]));
        let mut store: SampleStore<u8> = SampleStore::new(5, 5, n);
        let mut progress = SeedProgress::new(n);
        let mut rng = StdRng::seed_from_u64(5);

        assert!(fill_pass(&mut store, &first, &mut progress, &mut rng));
        assert_eq!(progress.filled(), 1);
        assert_eq!(fill_remaining(&mut store, &second, &mut progress, &mut rng), 3);
        assert_eq!(store.pixel_samples(2, 2), &[10, 200, 200, 200]);

        let snapshot = store.clone();
        assert!(!fill_pass(&mut store, &first, &mut progress, &mut rng));
        assert_eq!(store, snapshot);
    }
}
