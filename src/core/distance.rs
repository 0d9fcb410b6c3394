use crate::models::Coordinates;

/// Calculate the Manhattan distance between two coordinate pairs
///
/// This is a relative proximity signal, not a geodesic distance: the sum of
/// absolute differences of the two components, in the same units as the
/// coordinates themselves.
///
/// # Returns
/// `None` when either side is unknown. Callers must treat `None` as
/// "distance unknown", never as "nearby".
#[inline]
pub fn distance(a: Option<&Coordinates>, b: Option<&Coordinates>) -> Option<f64> {
    let (a, b) = (a?, b?);
    Some((a.0[0] - b.0[0]).abs() + (a.0[1] - b.0[1]).abs())
}

/// Check whether `point` lies within `radius` of `center`
///
/// `None` when the distance cannot be computed.
#[inline]
pub fn is_within_radius(
    center: Option<&Coordinates>,
    point: Option<&Coordinates>,
    radius: f64,
) -> Option<bool> {
    distance(center, point).map(|d| d <= radius)
}
