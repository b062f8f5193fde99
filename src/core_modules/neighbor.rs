// THEORY:
// The neighbor selector picks a random pixel from the 8-connected ring around a
// coordinate. It is used twice: the initializer fills each sample from a random
// neighbor of the pixel in a seed frame, and the classifier diffuses confirmed
// background values into a random neighbor's sample set.
//
// Offsets on each axis are drawn from {-1, 0, 1}, clamped independently per
// axis: rows against the frame height, columns against the frame width. The
// draw is retried until the offset is not (0, 0), so the pixel never picks
// itself. Frames must hold at least two pixels, otherwise no neighbor exists.

use rand::Rng;

/// How far the neighborhood extends in each direction.
pub const NEIGHBOR_RANGE: i64 = 1;

/// Returns `(row, col)` of a uniformly chosen 8-connected neighbor of
/// `(row, col)` inside a `height x width` frame.
pub fn random_neighbor<R: Rng + ?Sized>(
    rng: &mut R,
    row: u32,
    col: u32,
    height: u32,
    width: u32,
) -> (u32, u32) {
    debug_assert!(height as u64 * width as u64 >= 2, "no neighbor exists in a 1x1 frame");
    let (row_from, row_to) = axis_range(row, height);
    let (col_from, col_to) = axis_range(col, width);

    loop {
        let d_row = rng.gen_range(row_from..=row_to);
        let d_col = rng.gen_range(col_from..=col_to);
        if d_row != 0 || d_col != 0 {
            return ((row as i64 + d_row) as u32, (col as i64 + d_col) as u32);
        }
    }
}

/// Inclusive offset range along one axis, clamped at both borders.
fn axis_range(position: u32, extent: u32) -> (i64, i64) {
    let position = position as i64;
    let from = if position < NEIGHBOR_RANGE { 0 } else { -NEIGHBOR_RANGE };
    let to = if position >= extent as i64 - NEIGHBOR_RANGE { 0 } else { NEIGHBOR_RANGE };
    (from, to)
}
