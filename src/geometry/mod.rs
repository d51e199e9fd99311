//! Geometry for facing and tracking objects
//!
//! This module provides:
//! - Stamped points tagged with their reference frame
//! - Rigid transforms and a shared tree of named frames
//! - The heading computation used to turn the base toward a point

pub mod bearing;
pub mod point;
pub mod transform;

// Re-export commonly used types
pub use bearing::{heading_to, yaw_of, yaw_to_quaternion};
pub use point::StampedPoint;
pub use transform::{RigidTransform, TransformSource, TransformTree};
