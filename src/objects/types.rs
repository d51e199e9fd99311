use glam::DVec3;
use serde::{Deserialize, Serialize};

/// A labelled object at a fixed position in the world frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedObject {
    pub label: String,
    pub position: DVec3,
}

impl TrackedObject {
    pub fn new(label: impl Into<String>, position: DVec3) -> Self {
        Self {
            label: label.into(),
            position,
        }
    }
}
