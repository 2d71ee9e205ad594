use nalgebra::Point3;

use crate::error::{Error, Result};

/// The radial/azimuthal brightness pattern painted on the disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    /// Parabolic falloff modulated by azimuthal and radial bands.
    #[default]
    Banded,

    /// Brightness grows linearly with the distance from the inner edge.
    Linear,

    /// Parabolic falloff only: zero at both edges, brightest mid-disk.
    Parabolic,
}

/// A thin accretion disk lying in the `y = 0` plane, centered on the black hole.
#[derive(Debug, Clone)]
pub struct AccretionDisk {
    inner: f32,
    outer: f32,
    brightness: f32,
    thickness: f32,
    profile: Profile,
}

impl AccretionDisk {
    pub fn new(inner: f32, outer: f32, brightness: f32, thickness: f32) -> Result<Self> {
        if !(inner >= 0. && inner < outer) || !(thickness >= 0.) {
            return Err(Error::InvalidDisk { inner, outer });
        }

        Ok(Self {
            inner,
            outer,
            brightness,
            thickness,
            profile: Profile::default(),
        })
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    pub fn inner(&self) -> f32 {
        self.inner
    }

    pub fn outer(&self) -> f32 {
        self.outer
    }

    pub fn thickness(&self) -> f32 {
        self.thickness
    }

    /// True when a point at distance `r` from the center lies within the disk slab.
    pub fn contains(&self, position: &Point3<f32>, r: f32) -> bool {
        self.inner < r && r < self.outer && position.y.abs() <= self.thickness / 2.
    }

    /// Brightness of the disk at `(x, z)` in the disk plane, `r` away from the center.
    pub fn brightness(&self, x: f32, z: f32, r: f32) -> f32 {
        match self.profile {
            Profile::Banded => {
                let angle = z.atan2(x);
                let norm_r = ((r - self.inner) / self.outer + 1.)
                    * ((r - self.inner) / self.width() * std::f32::consts::TAU).sin();
                self.brightness
                    * self.curve(r)
                    * (1. - norm_r)
                    * (0.5 + 0.5 * ((4. * angle + 3. * norm_r).cos() + 0.6))
            }
            Profile::Linear => self.brightness * (r - self.inner) / self.outer,
            Profile::Parabolic => self.brightness * self.curve(r),
        }
    }

    /// The contribution of a photon at `position`, or `None` when it is outside the disk.
    pub fn shade(&self, position: &Point3<f32>, r: f32) -> Option<f32> {
        if self.contains(position, r) {
            Some(self.brightness(position.x, position.z, r))
        } else {
            None
        }
    }

    fn width(&self) -> f32 {
        self.outer - self.inner
    }

    /// Parabola through both edges, reaching 1 halfway across the disk.
    fn curve(&self, r: f32) -> f32 {
        let half = self.width() / 2.;
        -(r - self.inner) * (r - self.outer) / (half * half)
    }
}
