//! Heading toward a point expressed in the base frame
//!
//! The base faces +x. A point at base-frame coordinates (px, py) is reached by
//! turning `atan2(py, px)` about +z; positive angles turn left.

use crate::{Result, SoundboardError};
use glam::{DQuat, DVec3, EulerRot};

/// Planar distance below which a point has no meaningful heading
const MIN_PLANAR_DISTANCE: f64 = 1e-9;

/// Yaw (radians, in (-pi, pi]) that turns the base toward `point_in_base`
pub fn heading_to(point_in_base: DVec3) -> Result<f64> {
    let planar = point_in_base.truncate();
    if planar.length() < MIN_PLANAR_DISTANCE {
        return Err(SoundboardError::BearingError(format!(
            "point {:?} lies on the base's vertical axis",
            point_in_base
        )));
    }

    Ok(planar.y.atan2(planar.x))
}

/// Quaternion for roll = 0, pitch = 0, yaw = `yaw`
pub fn yaw_to_quaternion(yaw: f64) -> DQuat {
    DQuat::from_euler(EulerRot::ZYX, yaw, 0.0, 0.0)
}

/// Rotation about +z carried by `rotation`
pub fn yaw_of(rotation: DQuat) -> f64 {
    let (yaw, _, _) = rotation.to_euler(EulerRot::ZYX);
    yaw
}
