use nalgebra::{Point3, Unit, Vector2, Vector3};

use crate::error::{Error, Result};
use crate::geodesic::{self, Model, Polar};
use crate::math;
use crate::ray::Ray;

/// The output pixel a photon was launched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pixel {
    pub x: u32,
    pub y: u32,
}

impl Pixel {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// The row-major index of this pixel in a `width` x `height` image.
    pub fn index(&self, width: u32, height: u32) -> Result<usize> {
        if self.x < width && self.y < height {
            Ok(self.y as usize * width as usize + self.x as usize)
        } else {
            Err(Error::PixelOutOfBounds {
                x: self.x,
                y: self.y,
                width,
                height,
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Active,

    /// Crossed the horizon.
    Absorbed,

    /// Left the scene moving outward.
    Escaped,

    /// Dropped after a per-photon fault.
    Discarded,

    /// Still active when the simulation ran out of frames.
    Stalled,
}

/// The plane a photon moves in, spanned by two orthonormal vectors.
#[derive(Debug, Clone)]
pub struct OrbitalBasis {
    /// Direction of the launch position.
    pub u1: Unit<Vector3<f32>>,

    /// In-plane direction perpendicular to `u1`, along the transverse motion.
    pub u2: Unit<Vector3<f32>>,
}

impl OrbitalBasis {
    /// Build the plane containing `position` and `velocity`.
    ///
    /// When the two are parallel the plane is ambiguous, and `u2` falls back to the world up
    /// axis made orthogonal to `u1`.
    pub fn new(position: &Vector3<f32>, velocity: &Vector3<f32>) -> Result<Self> {
        let u1 = math::try_normalize(position).ok_or(Error::DegenerateOrigin)?;
        let momentum = position.cross(velocity);
        let u2 = math::try_normalize(&momentum.cross(&u1.into_inner()))
            .unwrap_or_else(|| math::perpendicular(&u1, &Vector3::y()));
        Ok(Self { u1, u2 })
    }

    /// Plane-local coordinates of a world-space vector.
    #[inline]
    pub fn project(&self, vec: &Vector3<f32>) -> Vector2<f32> {
        Vector2::new(vec.dot(self.u1.as_ref()), vec.dot(self.u2.as_ref()))
    }
}

/// A single light ray traced backwards from the camera.
#[derive(Debug, Clone)]
pub struct Photon {
    pixel: Pixel,
    pub position: Point3<f32>,
    pub velocity: Vector3<f32>,
    basis: OrbitalBasis,
    polar: Polar,
    status: Status,

    /// Total radiance this photon has deposited.
    pub brightness: f32,
}

impl Photon {
    /// Launch a photon from `ray`, deriving its orbital plane and conserved quantities.
    ///
    /// `rs` is the Schwarzschild radius of the hole at the origin.
    pub fn launch(pixel: Pixel, ray: &Ray, rs: f32, model: Model) -> Result<Self> {
        Self::new(pixel, ray.position, ray.direction.into_inner(), rs, model)
    }

    /// Like [`Photon::launch`], for a velocity that need not be unit length.
    pub fn new(
        pixel: Pixel,
        position: Point3<f32>,
        velocity: Vector3<f32>,
        rs: f32,
        model: Model,
    ) -> Result<Self> {
        if velocity.norm() < math::EPSILON {
            return Err(Error::ZeroVelocity);
        }

        let basis = OrbitalBasis::new(&position.coords, &velocity)?;
        let local = basis.project(&position.coords);
        let local_v = basis.project(&velocity);

        let r = local.norm();
        let l = local.x * local_v.y - local.y * local_v.x;
        let e = local_v.norm();
        let b = l / e;

        let vr = local.dot(&local_v) / r;
        let rc = model.constraint_radius(rs);
        let dr = (1. - (1. - rc / r) * (b * b / (r * r))).max(0.).sqrt();

        let polar = Polar {
            r,
            phi: local.y.atan2(local.x),
            dr: if vr > 0. { dr } else { -dr },
            l,
            e,
            b,
        };

        Ok(Self {
            pixel,
            position,
            velocity,
            basis,
            polar,
            status: Status::Active,
            brightness: 0.,
        })
    }

    pub fn pixel(&self) -> Pixel {
        self.pixel
    }

    pub fn basis(&self) -> &OrbitalBasis {
        &self.basis
    }

    pub fn polar(&self) -> &Polar {
        &self.polar
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    /// Distance from the hole.
    pub fn r(&self) -> f32 {
        self.polar.r
    }

    /// Advance one step of `dlambda` and rebuild the world-space state from the plane.
    pub fn step(&mut self, model: Model, rs: f32, dlambda: f32) {
        geodesic::step(&mut self.polar, model, rs, dlambda);
        let (position, velocity) =
            geodesic::reconstruct(&self.polar, &self.basis.u1, &self.basis.u2);
        self.position = position;
        self.velocity = velocity;
    }

    /// The terminal state this photon has reached, if any.
    ///
    /// A photon escapes once it is moving outward beyond `limit`.
    pub fn termination(&self, rs: f32, limit: f32) -> Option<Status> {
        if self.polar.r <= rs {
            Some(Status::Absorbed)
        } else if self.polar.outbound() && self.polar.r > limit {
            Some(Status::Escaped)
        } else {
            None
        }
    }
}
