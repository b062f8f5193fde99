// THEORY:
// The `BlobDetector` turns a binary foreground mask into a list of reportable
// regions. It is plain connected-component analysis, done explicitly on an
// owned label buffer rather than through any drawing primitive.
//
// Algorithm steps:
// 1.  **Label buffer**: every background pixel gets label 0 and every foreground
//     pixel the `UNLABELED` sentinel.
// 2.  **Region growing**: the mask is scanned row-major. Each unlabeled pixel
//     seeds a new component, grown with an explicit stack over its 4-connected
//     foreground neighbors (not diagonals). Growing records the member pixels
//     and the enclosing axis-aligned bounding box as it goes.
// 3.  **Area filter**: components whose bounding box area is not strictly above
//     the minimum are dropped. This rejects speckle noise cheaply.
// 4.  **Ordering**: surviving blobs are stably sorted by bounding box area,
//     largest first. Each blob keeps its own rotated box, so the axis-aligned
//     and rotated lists always line up.
// 5.  **Rotated boxes**: the minimum-area rectangle of each blob's pixel set.
//
// Stateless utility: `find_blobs` sees one mask and has no memory of earlier
// frames.

use crate::core_modules::blob::{Blob, BoundingBox, Point};
use crate::core_modules::geometry::min_area_rect;
use crate::core_modules::pixel::COLOR_BACKGROUND;
use image::GrayImage;

pub mod blob_detector {
    use super::*;

    const UNLABELED: u32 = u32::MAX;

    /// Extracts every 4-connected foreground component of `mask` whose bounding
    /// box area exceeds `min_area`, largest first.
    pub fn find_blobs(mask: &GrayImage, min_area: u32) -> Vec<Blob> {
        let (width, height) = mask.dimensions();

        // --- 1. Label buffer ---
        let mut labels: Vec<u32> = mask
            .pixels()
            .map(|p| if p.0[0] == COLOR_BACKGROUND { 0 } else { UNLABELED })
            .collect();

        // --- 2. & 3. Region growing with area filter ---
        let mut blobs: Vec<Blob> = Vec::new();
        let mut next_label = 1u32;
        for y in 0..height {
            for x in 0..width {
                let index = (y * width + x) as usize;
                if labels[index] != UNLABELED {
                    continue;
                }
                let (pixels, bounding_box) =
                    grow_component(&mut labels, width, height, Point { x, y }, next_label);
                next_label += 1;

                if bounding_box.area() <= min_area as u64 {
                    continue;
                }
                let Some(rotated_box) = min_area_rect(&pixels) else {
                    continue;
                };
                blobs.push(Blob {
                    id: next_label - 1,
                    bounding_box,
                    rotated_box,
                    pixels,
                });
            }
        }

        // --- 4. Ordering ---
        blobs.sort_by(|a, b| b.bounding_box.area().cmp(&a.bounding_box.area()));
        blobs
    }

    /// Depth-first growth of one component from `seed`. Returns its pixels in
    /// row-major order together with its bounding box.
    fn grow_component(
        labels: &mut [u32],
        width: u32,
        height: u32,
        seed: Point,
        label: u32,
    ) -> (Vec<Point>, BoundingBox) {
        let mut pixels: Vec<Point> = Vec::new();
        let mut stack: Vec<Point> = vec![seed];
        labels[(seed.y * width + seed.x) as usize] = label;

        let (mut min_x, mut min_y) = (seed.x, seed.y);
        let (mut max_x, mut max_y) = (seed.x, seed.y);

        while let Some(current) = stack.pop() {
            pixels.push(current);
            min_x = min_x.min(current.x);
            min_y = min_y.min(current.y);
            max_x = max_x.max(current.x);
            max_y = max_y.max(current.y);

            for (dx, dy) in [(0i64, 1i64), (0, -1), (1, 0), (-1, 0)] {
                let nx = current.x as i64 + dx;
                let ny = current.y as i64 + dy;
                if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                    continue;
                }
                let neighbor = Point { x: nx as u32, y: ny as u32 };
                let index = (neighbor.y * width + neighbor.x) as usize;
                if labels[index] == UNLABELED {
                    labels[index] = label;
                    stack.push(neighbor);
                }
            }
        }

        pixels.sort_unstable_by_key(|p| (p.y, p.x));
        let bounding_box = BoundingBox {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        };
        (pixels, bounding_box)
    }
}
