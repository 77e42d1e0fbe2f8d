use glam::DVec3;

/// Sum of the Euclidean distances between consecutive points.
///
/// Empty and single point inputs have zero length.
pub fn arc_len(points: &[DVec3]) -> f64 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// Running sum of consecutive distances, starting at zero.
///
/// The output has the same length as the input.
pub fn accumulated_distances(points: &[DVec3]) -> Vec<f64> {
    let mut distances = Vec::with_capacity(points.len());
    let mut total = 0.0;
    if !points.is_empty() {
        distances.push(0.0);
    }
    for w in points.windows(2) {
        total += w[0].distance(w[1]);
        distances.push(total);
    }
    distances
}
