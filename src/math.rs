use nalgebra::{Unit, Vector3};

/// Vectors shorter than this are treated as zero when normalizing.
pub const EPSILON: f32 = 1e-6;

/// Normalize `vec`, or return `None` when it is too short to have a direction.
#[inline]
pub fn try_normalize(vec: &Vector3<f32>) -> Option<Unit<Vector3<f32>>> {
    Unit::try_new(*vec, EPSILON)
}

/// Find a unit vector perpendicular to `axis`, preferring `hint`.
///
/// `hint` is made orthogonal to `axis` with a single Gram-Schmidt step. When `hint` is parallel to
/// `axis`, the x axis is tried next, and finally the z axis.
pub fn perpendicular(axis: &Unit<Vector3<f32>>, hint: &Vector3<f32>) -> Unit<Vector3<f32>> {
    [*hint, Vector3::x(), Vector3::z()]
        .iter()
        .find_map(|candidate| try_normalize(&(candidate - axis.scale(candidate.dot(axis.as_ref())))))
        .unwrap_or_else(Vector3::x_axis)
}

#[inline]
pub fn deg_to_rad(deg: f32) -> f32 {
    (deg / 180.) * std::f32::consts::PI
}

#[test]
fn test_deg_to_rad() {
    assert_eq!(std::f32::consts::PI, deg_to_rad(180.));
}

#[test]
fn test_try_normalize() {
    assert!(try_normalize(&Vector3::zeros()).is_none());
    assert!(try_normalize(&Vector3::new(1e-8, 0., 0.)).is_none());

    let unit = try_normalize(&Vector3::new(3., 4., 0.)).expect("non-zero vector");
    approx::assert_relative_eq!(unit.into_inner(), Vector3::new(0.6, 0.8, 0.));
}

#[test]
fn test_perpendicular() {
    let y = Vector3::y();

    // The hint is kept when it is already orthogonal.
    let axis = Vector3::z_axis();
    approx::assert_relative_eq!(perpendicular(&axis, &y).into_inner(), y);

    // The hint is orthogonalized when it is not.
    let axis = Unit::new_normalize(Vector3::new(3., 4., 0.));
    let perp = perpendicular(&axis, &y);
    approx::assert_abs_diff_eq!(perp.dot(axis.as_ref()), 0., epsilon = 1e-6);
    approx::assert_relative_eq!(perp.norm(), 1., epsilon = 1e-6);

    // A hint parallel to the axis falls back to another direction.
    let axis = Vector3::y_axis();
    let perp = perpendicular(&axis, &y);
    approx::assert_abs_diff_eq!(perp.dot(axis.as_ref()), 0., epsilon = 1e-6);
    approx::assert_relative_eq!(perp.into_inner(), Vector3::x());
}
