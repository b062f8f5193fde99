// THEORY:
// Minimum-area enclosing rectangle of a point set, in two steps:
//
// 1.  **Convex hull** (Andrew's monotone chain): the optimal rectangle only ever
//     touches hull vertices, so every interior pixel of a blob can be dropped.
//     Integer cross products keep this exact.
// 2.  **Edge directions**: an optimal rectangle has one side collinear with a
//     hull edge. For each edge we project the hull onto the edge direction and
//     its normal, take the extents, and keep the smallest area. Hulls of a blob
//     are small (a few dozen vertices), so the quadratic scan is cheap and
//     simpler than maintaining four rotating calipers.
//
// Degenerate inputs are handled explicitly: a single point yields a zero-size
// rectangle at that point, and collinear points yield a zero-height rectangle
// along the segment.

use crate::core_modules::blob::{Point, RotatedRect};

fn cross(o: (i64, i64), a: (i64, i64), b: (i64, i64)) -> i64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

/// Convex hull in counter-clockwise order (with y pointing down, visually
/// clockwise). Collinear boundary points are dropped.
pub fn convex_hull(points: &[Point]) -> Vec<(i64, i64)> {
    let mut sorted: Vec<(i64, i64)> = points.iter().map(|p| (p.x as i64, p.y as i64)).collect();
    sorted.sort_unstable();
    sorted.dedup();
    if sorted.len() < 3 {
        return sorted;
    }

    let mut hull: Vec<(i64, i64)> = Vec::with_capacity(2 * sorted.len());
    for &p in &sorted {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0 {
            hull.pop();
        }
        hull.push(p);
    }
    let lower_len = hull.len() + 1;
    for &p in sorted.iter().rev().skip(1) {
        while hull.len() >= lower_len && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0 {
            hull.pop();
        }
        hull.push(p);
    }
    hull.pop();
    hull
}

/// The minimum-area rectangle enclosing `points`. Returns `None` for an empty set.
pub fn min_area_rect(points: &[Point]) -> Option<RotatedRect> {
    let hull = convex_hull(points);
    match hull.as_slice() {
        [] => None,
        [p] => Some(RotatedRect {
            center: (p.0 as f64, p.1 as f64),
            size: (0.0, 0.0),
            angle: 0.0,
        }),
        [a, b] => {
            let (dx, dy) = ((b.0 - a.0) as f64, (b.1 - a.1) as f64);
            Some(RotatedRect {
                center: ((a.0 + b.0) as f64 / 2.0, (a.1 + b.1) as f64 / 2.0),
                size: (dx.hypot(dy), 0.0),
                angle: dy.atan2(dx).to_degrees(),
            })
        }
        _ => Some(min_rect_over_edges(&hull)),
    }
}

fn min_rect_over_edges(hull: &[(i64, i64)]) -> RotatedRect {
    let mut best: Option<(f64, RotatedRect)> = None;
    let origin = (hull[0].0 as f64, hull[0].1 as f64);

    for i in 0..hull.len() {
        let a = hull[i];
        let b = hull[(i + 1) % hull.len()];
        let (ex, ey) = ((b.0 - a.0) as f64, (b.1 - a.1) as f64);
        let length = ex.hypot(ey);
        if length == 0.0 {
            continue;
        }
        let u = (ex / length, ey / length);
        let v = (-u.1, u.0);

        let (mut min_u, mut max_u) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut min_v, mut max_v) = (f64::INFINITY, f64::NEG_INFINITY);
        for &(px, py) in hull {
            let (rx, ry) = (px as f64 - origin.0, py as f64 - origin.1);
            let pu = rx * u.0 + ry * u.1;
            let pv = rx * v.0 + ry * v.1;
            min_u = min_u.min(pu);
            max_u = max_u.max(pu);
            min_v = min_v.min(pv);
            max_v = max_v.max(pv);
        }

        let area = (max_u - min_u) * (max_v - min_v);
        if best.as_ref().is_some_and(|(best_area, _)| *best_area <= area) {
            continue;
        }
        let mid_u = (min_u + max_u) / 2.0;
        let mid_v = (min_v + max_v) / 2.0;
        let rect = RotatedRect {
            center: (
                origin.0 + u.0 * mid_u + v.0 * mid_v,
                origin.1 + u.1 * mid_u + v.1 * mid_v,
            ),
            size: (max_u - min_u, max_v - min_v),
            angle: u.1.atan2(u.0).to_degrees(),
        };
        best = Some((area, rect));
    }

    // Hulls with three or more vertices always have a non-zero edge.
    best.map(|(_, rect)| rect).unwrap_or(RotatedRect {
        center: origin,
        size: (0.0, 0.0),
        angle: 0.0,
    })
}
