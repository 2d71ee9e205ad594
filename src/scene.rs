use nalgebra::Point2;

use crate::disk::AccretionDisk;
use crate::error::Result;

/// A non-rotating black hole at the world origin.
#[derive(Debug, Clone)]
pub struct BlackHole {
    /// Where a top-down preview draws the hole. The physics always places it at the origin.
    pub center: Point2<f32>,

    /// The Schwarzschild radius: photons reaching it are absorbed.
    pub radius: f32,
}

impl BlackHole {
    pub fn new(radius: f32) -> Self {
        Self {
            center: Point2::origin(),
            radius,
        }
    }

    /// True once a photon at distance `r` has crossed the horizon.
    #[inline]
    pub fn absorbs(&self, r: f32) -> bool {
        r <= self.radius
    }
}

/// Everything a photon interacts with during a run.
#[derive(Debug, Clone)]
pub struct Scene {
    pub black_hole: BlackHole,
    pub disk: AccretionDisk,
}

impl Scene {
    pub fn new(black_hole: BlackHole, disk: AccretionDisk) -> Self {
        Self { black_hole, disk }
    }

    /// The reference setup: a hole of radius 15 inside a disk spanning radii 27 to 45.
    pub fn standard(brightness: f32, thickness: f32) -> Result<Self> {
        Ok(Self::new(
            BlackHole::new(15.),
            AccretionDisk::new(27., 45., brightness, thickness)?,
        ))
    }
}

#[test]
fn test_absorbs() {
    let hole = BlackHole::new(15.);
    assert!(hole.absorbs(0.));
    assert!(hole.absorbs(15.));
    assert!(!hole.absorbs(15.001));
}
