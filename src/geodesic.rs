//! Fixed-step integration of photon paths in their orbital plane.
//!
//! A photon's motion is planar, so its state reduces to polar coordinates `(r, phi)` in the plane
//! spanned by an [`OrbitalBasis`](crate::photon::OrbitalBasis). The radial equation is advanced
//! with semi-implicit Euler: the radial rate is updated first and the new rate moves the radius.

use nalgebra::{Point3, Unit, Vector3};

/// Which radial acceleration drives the photon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Model {
    /// Bending from the effective potential of the black hole.
    Relativistic,

    /// Flat space: photons travel in straight lines and only the horizon absorbs them.
    Kinematic,
}

impl Model {
    pub fn new(relativistic: bool) -> Self {
        if relativistic {
            Model::Relativistic
        } else {
            Model::Kinematic
        }
    }

    /// The radial pseudo-acceleration at radius `r` for angular momentum `l`, around a hole of
    /// Schwarzschild radius `rs`.
    #[inline]
    pub fn radial_acceleration(&self, r: f32, l: f32, rs: f32) -> f32 {
        let r2 = r * r;
        match self {
            Model::Relativistic => rs * l * l / (r2 * r2) - rs / (2. * r2),
            Model::Kinematic => l * l / (r2 * r),
        }
    }

    /// The radius that enters the null constraint when normalizing the initial radial rate.
    #[inline]
    pub fn constraint_radius(&self, rs: f32) -> f32 {
        match self {
            Model::Relativistic => rs,
            Model::Kinematic => 0.,
        }
    }
}

/// The polar state of a photon within its orbital plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Polar {
    /// Distance from the black hole.
    pub r: f32,

    /// Unwrapped azimuth, in radians.
    pub phi: f32,

    /// Radial rate `dr/dλ`.
    pub dr: f32,

    /// Angular momentum, conserved up to the error of the discrete step.
    pub l: f32,

    /// Initial in-plane speed.
    pub e: f32,

    /// Impact parameter `l / e`.
    pub b: f32,
}

impl Polar {
    /// The angular rate `dphi/dλ` at the current radius.
    #[inline]
    pub fn dphi(&self) -> f32 {
        self.l / (self.r * self.r)
    }

    /// True when the photon is moving away from the hole.
    #[inline]
    pub fn outbound(&self) -> bool {
        self.dr > 0.
    }
}

/// Advance `polar` by one affine-parameter step of `dlambda`.
///
/// The radius is not clamped: boundary checks belong to the caller.
pub fn step(polar: &mut Polar, model: Model, rs: f32, dlambda: f32) {
    // Both the acceleration and the azimuthal rate use the radius at the start of the step.
    let r2 = polar.r * polar.r;
    let d2r = model.radial_acceleration(polar.r, polar.l, rs);
    polar.dr += d2r * dlambda;
    polar.r += polar.dr * dlambda;
    polar.phi += polar.l / r2 * dlambda;
}

/// Rebuild the world-space position and velocity of a planar state.
pub fn reconstruct(
    polar: &Polar,
    u1: &Unit<Vector3<f32>>,
    u2: &Unit<Vector3<f32>>,
) -> (Point3<f32>, Vector3<f32>) {
    let (sin, cos) = polar.phi.sin_cos();
    let radial = u1.scale(cos) + u2.scale(sin);
    let tangent = u2.scale(cos) - u1.scale(sin);

    let position = Point3::from(radial * polar.r);
    let velocity = radial * polar.dr + tangent * (polar.r * polar.dphi());
    (position, velocity)
}
