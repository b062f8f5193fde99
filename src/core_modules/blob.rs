// THEORY:
// A `Blob` is one spatially coherent region of foreground pixels in a single
// frame: a maximal 4-connected component of the foreground mask that is large
// enough to be worth reporting. It is a "dumb" data container with no memory of
// earlier frames; blobs are recomputed from scratch for every mask.
//
// Each blob carries two summaries of its shape:
// - `bounding_box`: the axis-aligned rectangle enclosing every member pixel,
//   used for sorting, area filtering and quick visual overlays.
// - `rotated_box`: the minimum-area rectangle of any orientation enclosing the
//   member pixel centres, which hugs elongated diagonal objects far tighter.

/// A pixel coordinate in the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

/// An axis-aligned rectangle in pixel units. `width` and `height` count pixels,
/// so a single pixel has a 1x1 box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.y >= self.y
            && point.x < self.x + self.width
            && point.y < self.y + self.height
    }
}

/// A rectangle of arbitrary orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatedRect {
    /// Centre of the rectangle in pixel coordinates.
    pub center: (f64, f64),
    /// `(width, height)`: width runs along `angle`, height perpendicular to it.
    pub size: (f64, f64),
    /// Orientation of the width side in degrees, counter-clockwise from the x axis
    /// (in image coordinates, where y grows downwards).
    pub angle: f64,
}

impl RotatedRect {
    pub fn area(&self) -> f64 {
        self.size.0 * self.size.1
    }

    /// The four corners, in order around the rectangle.
    pub fn points(&self) -> [(f64, f64); 4] {
        let radians = self.angle.to_radians();
        let (sin, cos) = radians.sin_cos();
        let (half_w, half_h) = (self.size.0 / 2.0, self.size.1 / 2.0);
        let u = (cos * half_w, sin * half_w);
        let v = (-sin * half_h, cos * half_h);
        let (cx, cy) = self.center;
        [
            (cx - u.0 - v.0, cy - u.1 - v.1),
            (cx + u.0 - v.0, cy + u.1 - v.1),
            (cx + u.0 + v.0, cy + u.1 + v.1),
            (cx - u.0 + v.0, cy - u.1 + v.1),
        ]
    }
}

/// One reportable foreground region of the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    /// Label assigned during extraction. Unique within one frame only.
    pub id: u32,
    pub bounding_box: BoundingBox,
    pub rotated_box: RotatedRect,
    /// Every member pixel, in row-major order.
    pub pixels: Vec<Point>,
}

impl Blob {
    /// Number of member pixels.
    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_area_and_containment() {
        let bbox = BoundingBox { x: 2, y: 3, width: 10, height: 5 };
        assert_eq!(bbox.area(), 50);
        assert!(bbox.contains(Point { x: 2, y: 3 }));
        assert!(bbox.contains(Point { x: 11, y: 7 }));
        assert!(!bbox.contains(Point { x: 12, y: 7 }));
    }

    #[test]
    fn axis_aligned_rotated_rect_corners() {
        let rect = RotatedRect { center: (5.0, 5.0), size: (4.0, 2.0), angle: 0.0 };
        let corners = rect.points();
        assert_eq!(corners[0], (3.0, 4.0));
        assert_eq!(corners[2], (7.0, 6.0));
        assert_eq!(rect.area(), 8.0);
    }
}
