use nalgebra::{Point3, Unit, Vector3};

/// A ray leaving the camera, used to launch a photon.
#[derive(Debug, Clone)]
pub struct Ray {
    pub position: Point3<f32>,
    pub direction: Unit<Vector3<f32>>,
}

impl Ray {
    /// Construct a new ray.
    pub fn new(position: Point3<f32>, direction: Unit<Vector3<f32>>) -> Ray {
        Ray {
            position,
            direction,
        }
    }

    /// The point reached after travelling `amount` along the ray.
    pub fn at(&self, amount: f32) -> Point3<f32> {
        self.position + self.direction.scale(amount)
    }
}

#[test]
fn test_at() {
    let ray = Ray::new(Point3::new(0., 0., -5.), Vector3::z_axis());
    assert_eq!(Point3::new(0., 0., -5.), ray.at(0.));
    assert_eq!(Point3::new(0., 0., -3.), ray.at(2.));
}
