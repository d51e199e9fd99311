use chrono::{DateTime, Utc};
use glam::DVec3;
use serde::{Deserialize, Serialize};

/// A point tagged with the frame it is expressed in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StampedPoint {
    pub frame_id: String,
    pub stamp: DateTime<Utc>,
    pub point: DVec3,
}

impl StampedPoint {
    pub fn new(frame_id: impl Into<String>, point: DVec3) -> Self {
        Self {
            frame_id: frame_id.into(),
            stamp: Utc::now(),
            point,
        }
    }

    /// Same stamp, different frame and coordinates
    pub fn reframed(&self, frame_id: impl Into<String>, point: DVec3) -> Self {
        Self {
            frame_id: frame_id.into(),
            stamp: self.stamp,
            point,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reframed_keeps_stamp() {
        let original = StampedPoint::new("map", DVec3::new(1.0, 2.0, 3.0));
        let moved = original.reframed("base_link", DVec3::X);

        assert_eq!(moved.stamp, original.stamp);
        assert_eq!(moved.frame_id, "base_link");
        assert_eq!(moved.point, DVec3::X);
    }
}
