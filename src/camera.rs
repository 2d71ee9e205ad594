use nalgebra::{Point2, Point3, Unit, Vector3};

use crate::math;
use crate::ray::Ray;

#[derive(Debug, Clone)]
pub struct Sample {
    /// The point on the film where the ray originates, in raster space.
    pub film: Point2<f32>,
}

impl Sample {
    pub fn new(fx: f32, fy: f32) -> Self {
        Self {
            film: Point2::new(fx, fy),
        }
    }

    /// The sample at the center of pixel `(x, y)`.
    pub fn center(x: u32, y: u32) -> Self {
        Self::new(x as f32 + 0.5, y as f32 + 0.5)
    }
}

pub trait Camera {
    /// Given a [`Sample`], generate a ray.
    fn generate_ray(&self, sample: Sample) -> Ray;

    /// The world-space position rays are launched from.
    fn eye(&self) -> Point3<f32>;
}

/// A pinhole camera with the raster origin in the top-left corner.
#[derive(Debug, Clone)]
pub struct PinholeCamera {
    eye: Point3<f32>,
    forward: Unit<Vector3<f32>>,
    right: Unit<Vector3<f32>>,
    up: Unit<Vector3<f32>>,

    /// Half extents of the image plane at unit distance.
    half_width: f32,
    half_height: f32,

    width: f32,
    height: f32,
}

impl PinholeCamera {
    /// Construct a camera at `eye` looking at `target`, with a vertical field of view of `fov`
    /// radians, producing a `width` x `height` raster.
    pub fn look_at(
        eye: Point3<f32>,
        target: Point3<f32>,
        up: &Vector3<f32>,
        fov: f32,
        width: u32,
        height: u32,
    ) -> Self {
        let forward = math::try_normalize(&(target - eye)).unwrap_or_else(Vector3::z_axis);
        let right = math::try_normalize(&forward.cross(up))
            .unwrap_or_else(|| math::perpendicular(&forward, &Vector3::x()));
        let up = Unit::new_normalize(right.cross(&forward.into_inner()));

        let width = width.max(1) as f32;
        let height = height.max(1) as f32;
        let half_height = (fov / 2.).tan();

        Self {
            eye,
            forward,
            right,
            up,
            half_width: half_height * width / height,
            half_height,
            width,
            height,
        }
    }
}

impl Camera for PinholeCamera {
    fn generate_ray(&self, sample: Sample) -> Ray {
        let sx = (2. * sample.film.x / self.width - 1.) * self.half_width;
        let sy = (1. - 2. * sample.film.y / self.height) * self.half_height;
        let direction = Unit::new_normalize(
            self.forward.as_ref() + self.right.scale(sx) + self.up.scale(sy),
        );
        Ray::new(self.eye, direction)
    }

    fn eye(&self) -> Point3<f32> {
        self.eye
    }
}
