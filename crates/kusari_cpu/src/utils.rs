/// Row-major flat index -> multi index digits, written into `coords`.
pub fn unravel(mut idx: usize, shape: &[usize], coords: &mut [usize]) {
    for d in (0..shape.len()).rev() {
        coords[d] = idx % shape[d];
        idx /= shape[d];
    }
}

/// Maps coordinates in `to_shape` onto a flat index in `from_shape`,
/// right-aligned, stretching size-1 dims of `from_shape`.
pub fn broadcast_source_index(coords: &[usize], from_shape: &[usize], to_shape: &[usize]) -> usize {
    let rank_diff = to_shape.len() - from_shape.len();
    let mut idx = 0;
    for (d, &size) in from_shape.iter().enumerate() {
        let coord = if size == 1 { 0 } else { coords[rank_diff + d] };
        idx = idx * size + coord;
    }
    idx
}
