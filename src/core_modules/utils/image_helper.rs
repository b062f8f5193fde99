// Rendering conveniences for consumers of the segmentation output. Nothing in
// here feeds back into the background model.

pub mod image_helper {
    use crate::core_modules::blob::Blob;
    use crate::core_modules::pixel::{COLOR_BACKGROUND, COLOR_FOREGROUND};
    use crate::error::{Result, VibeError};
    use image::{DynamicImage, GenericImageView, GrayImage, Luma, Rgb, RgbImage};
    use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut, draw_polygon_mut};
    use imageproc::point::Point;
    use imageproc::rect::Rect;

    /// Colour used for axis-aligned box outlines.
    pub const CONTOUR_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

    /// Fills every blob's rotated box into a fresh `width x height` mask.
    pub fn box_mask(blobs: &[Blob], width: u32, height: u32) -> GrayImage {
        let mut mask = GrayImage::from_pixel(width, height, Luma([COLOR_BACKGROUND]));
        let fill = Luma([COLOR_FOREGROUND]);

        for blob in blobs {
            let mut corners: Vec<Point<i32>> = blob
                .rotated_box
                .points()
                .iter()
                .map(|&(x, y)| Point::new(x as i32, y as i32))
                .collect();
            corners.dedup();
            while corners.len() > 1 && corners.first() == corners.last() {
                corners.pop();
            }

            match corners.as_slice() {
                [] => {}
                [p] => {
                    if p.x >= 0 && p.y >= 0 && (p.x as u32) < width && (p.y as u32) < height {
                        mask.put_pixel(p.x as u32, p.y as u32, fill);
                    }
                }
                [a, b] => draw_line_segment_mut(
                    &mut mask,
                    (a.x as f32, a.y as f32),
                    (b.x as f32, b.y as f32),
                    fill,
                ),
                polygon => draw_polygon_mut(&mut mask, polygon, fill),
            }
        }
        mask
    }

    /// A colour copy of `foreground` with every blob's bounding box outlined.
    pub fn draw_bounding_boxes(foreground: &GrayImage, blobs: &[Blob]) -> RgbImage {
        let mut annotated = DynamicImage::ImageLuma8(foreground.clone()).to_rgb8();
        for blob in blobs {
            let bbox = blob.bounding_box;
            let rect = Rect::at(bbox.x as i32, bbox.y as i32).of_size(bbox.width, bbox.height);
            draw_hollow_rect_mut(&mut annotated, rect, CONTOUR_COLOR);
        }
        annotated
    }

    /// Blacks out every pixel of `image` where `mask` is background. Accepts a
    /// grayscale mask (background = 0) or a colour mask (background = black).
    pub fn apply_mask(image: &mut RgbImage, mask: &DynamicImage) -> Result<()> {
        if image.dimensions() != mask.dimensions() {
            tracing::warn!(
                "image {:?} and mask {:?} differ in size, skipping",
                image.dimensions(),
                mask.dimensions()
            );
            return Err(VibeError::DimensionMismatch {
                expected: image.dimensions(),
                actual: mask.dimensions(),
            });
        }

        match mask {
            DynamicImage::ImageLuma8(gray) => {
                for (pixel, m) in image.pixels_mut().zip(gray.pixels()) {
                    if m.0[0] == COLOR_BACKGROUND {
                        *pixel = Rgb([0, 0, 0]);
                    }
                }
            }
            DynamicImage::ImageRgb8(color) => {
                for (pixel, m) in image.pixels_mut().zip(color.pixels()) {
                    if m.0 == [0, 0, 0] {
                        *pixel = Rgb([0, 0, 0]);
                    }
                }
            }
            other => {
                return Err(VibeError::UnsupportedFormat(format!("{:?}", other.color())));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::image_helper::*;
    use crate::core_modules::blob::{Blob, BoundingBox, Point, RotatedRect};
    use crate::error::VibeError;
    use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};

    fn square_blob() -> Blob {
        Blob {
            id: 1,
            bounding_box: BoundingBox { x: 2, y: 2, width: 5, height: 5 },
            rotated_box: RotatedRect { center: (4.0, 4.0), size: (4.0, 4.0), angle: 0.0 },
            pixels: (2..7)
                .flat_map(|y| (2..7).map(move |x| Point { x, y }))
                .collect(),
        }
    }

    #[test]
    fn box_mask_fills_the_rotated_box() {
        let mask = box_mask(&[square_blob()], 10, 10);
        assert_eq!(mask.get_pixel(4, 4).0[0], 255);
        assert_eq!(mask.get_pixel(2, 2).0[0], 255);
        assert_eq!(mask.get_pixel(0, 0).0[0], 0);
        assert_eq!(mask.get_pixel(9, 9).0[0], 0);
    }

    #[test]
    fn degenerate_boxes_do_not_panic() {
        let mut line = square_blob();
        line.rotated_box = RotatedRect { center: (5.0, 3.0), size: (6.0, 0.0), angle: 0.0 };
        let mut dot = square_blob();
        dot.rotated_box = RotatedRect { center: (1.0, 1.0), size: (0.0, 0.0), angle: 0.0 };

        let mask = box_mask(&[line, dot], 10, 10);
        assert_eq!(mask.get_pixel(5, 3).0[0], 255);
        assert_eq!(mask.get_pixel(1, 1).0[0], 255);
    }

    #[test]
    fn contours_are_drawn_in_green() {
        let foreground = GrayImage::new(10, 10);
        let annotated = draw_bounding_boxes(&foreground, &[square_blob()]);
        assert_eq!(*annotated.get_pixel(2, 2), CONTOUR_COLOR);
        assert_eq!(*annotated.get_pixel(6, 4), CONTOUR_COLOR);
        assert_eq!(*annotated.get_pixel(4, 4), Rgb([0, 0, 0]));
    }

    #[test]
    fn apply_mask_blacks_out_background() {
        let mut image = RgbImage::from_pixel(3, 1, Rgb([9, 9, 9]));
        let mut mask = GrayImage::new(3, 1);
        mask.put_pixel(1, 0, Luma([255]));
        apply_mask(&mut image, &DynamicImage::ImageLuma8(mask)).expect("same size");
        assert_eq!(*image.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*image.get_pixel(1, 0), Rgb([9, 9, 9]));
    }

    #[test]
    fn apply_mask_rejects_size_mismatch_without_touching_image() {
        let mut image = RgbImage::from_pixel(3, 3, Rgb([9, 9, 9]));
        let mask = DynamicImage::ImageLuma8(GrayImage::new(2, 2));
        let err = apply_mask(&mut image, &mask).unwrap_err();
        assert!(matches!(err, VibeError::DimensionMismatch { .. }));
        assert!(image.pixels().all(|p| *p == Rgb([9, 9, 9])));
    }
}
