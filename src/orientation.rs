// refs:
// https://android.googlesource.com/platform/frameworks/base/+/master/core/java/android/hardware/SensorManager.java
// (getRotationMatrix / getOrientation, reduced to the 3x3 case)

const G: f64 = 9.81;

use nalgebra::{Matrix3, Vector3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    pub azimuth: f64, // rotation around -z, 0 = magnetic north, rad
    pub pitch: f64,   // rotation around -x, rad
    pub roll: f64,    // rotation around y, rad
}

// Rotation from the device frame into the world frame (x east, y north, z up),
// built from a gravity and a geomagnetic field reading taken in the device
// frame. None when the readings cannot anchor a frame.
pub fn rotation_matrix(gravity: Vector3<f64>, geomagnetic: Vector3<f64>) -> Option<Matrix3<f64>> {
    if gravity.norm_squared() < 0.01 * G * G {
        // close to free fall, "down" is unknown
        return None;
    }

    let h = geomagnetic.cross(&gravity);
    let norm_h = h.norm();
    if norm_h < 0.1 {
        // field parallel to gravity: magnetic pole or junk data
        return None;
    }

    let h = h / norm_h;
    let a = gravity.normalize();
    let m = a.cross(&h);

    Some(Matrix3::new(
        h.x, h.y, h.z, //
        m.x, m.y, m.z, //
        a.x, a.y, a.z, //
    ))
}

pub fn angles(r: &Matrix3<f64>) -> Orientation {
    Orientation {
        azimuth: r[(0, 1)].atan2(r[(1, 1)]),
        pitch: (-r[(2, 1)]).asin(),
        roll: (-r[(2, 0)]).atan2(r[(2, 2)]),
    }
}

pub fn from_vectors(gravity: Vector3<f64>, geomagnetic: Vector3<f64>) -> Option<Orientation> {
    rotation_matrix(gravity, geomagnetic).map(|r| angles(&r))
}

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::vector;
    use std::f64::consts::FRAC_PI_2;

    // mid-latitude field, roughly: 22 uT towards north, 43 uT into the ground
    const FIELD_N: f64 = 22.0;
    const FIELD_D: f64 = 43.0;

    #[test]
    fn flat_facing_north() {
        // device lying flat, top of the screen towards magnetic north
        let gravity = vector![0.0, 0.0, 9.81];
        let geomagnetic = vector![0.0, FIELD_N, -FIELD_D];

        let r = rotation_matrix(gravity, geomagnetic).unwrap();
        assert!((r - Matrix3::identity()).norm() < 1e-12);

        let o = angles(&r);
        assert!(o.azimuth.abs() < 1e-12);
        assert!(o.pitch.abs() < 1e-12);
        assert!(o.roll.abs() < 1e-12);
    }

    #[test]
    fn flat_facing_east() {
        // turned 90° clockwise seen from above: north now points along -x
        let gravity = vector![0.0, 0.0, 9.81];
        let geomagnetic = vector![-FIELD_N, 0.0, -FIELD_D];

        let o = from_vectors(gravity, geomagnetic).unwrap();
        assert!((o.azimuth - FRAC_PI_2).abs() < 1e-12);
        assert!(o.pitch.abs() < 1e-12);
        assert!(o.roll.abs() < 1e-12);
    }

    #[test]
    fn flat_facing_west() {
        let gravity = vector![0.0, 0.0, 9.81];
        let geomagnetic = vector![FIELD_N, 0.0, -FIELD_D];

        let o = from_vectors(gravity, geomagnetic).unwrap();
        assert!((o.azimuth + FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn upright_portrait() {
        // held upright, screen towards a user who is facing north
        let gravity = vector![0.0, 9.81, 0.0];
        let geomagnetic = vector![0.0, -FIELD_D, -FIELD_N];

        let o = from_vectors(gravity, geomagnetic).unwrap();
        assert!(o.azimuth.abs() < 1e-12);
        assert!((o.pitch + FRAC_PI_2).abs() < 1e-12);
        assert!(o.roll.abs() < 1e-12);
    }

    #[test]
    fn rolled_to_the_right() {
        // lying flat, then the right edge dipped down by 30°
        let (s, c) = 30.0_f64.to_radians().sin_cos();
        let gravity = vector![-9.81 * s, 0.0, 9.81 * c];
        let geomagnetic = vector![FIELD_D * s, FIELD_N, -FIELD_D * c];

        let o = from_vectors(gravity, geomagnetic).unwrap();
        assert!(o.azimuth.abs() < 1e-9);
        assert!(o.pitch.abs() < 1e-9);
        assert!((o.roll - 30.0_f64.to_radians()).abs() < 1e-9);
    }

    #[test]
    fn free_fall_has_no_orientation() {
        let o = rotation_matrix(vector![0.0, 0.1, 0.3], vector![0.0, FIELD_N, -FIELD_D]);
        assert!(o.is_none());
    }

    #[test]
    fn parallel_vectors_have_no_orientation() {
        assert!(rotation_matrix(vector![0.0, 0.0, 9.81], vector![0.0, 0.0, -50.0]).is_none());
        assert!(rotation_matrix(vector![0.0, 0.0, 9.81], vector![0.0, 0.0, 0.0]).is_none());
    }
}
