//! Navigation action client
//!
//! Goals are sent to a long-running action server and the caller blocks on the
//! outcome. There is no cancellation or retry: a server that goes away is fatal.

pub mod simulated;

pub use simulated::SimulatedBase;

use crate::geometry::bearing::yaw_to_quaternion;
use crate::geometry::transform::RigidTransform;
use crate::Result;
use chrono::{DateTime, Utc};
use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Terminal outcome of a navigation goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Succeeded,
    Aborted,
    Preempted,
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalStatus::Succeeded => write!(f, "succeeded"),
            GoalStatus::Aborted => write!(f, "aborted"),
            GoalStatus::Preempted => write!(f, "preempted"),
        }
    }
}

/// Target pose for the base
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationGoal {
    pub id: Uuid,
    pub frame_id: String,
    pub stamp: DateTime<Utc>,
    pub position: DVec3,
    pub orientation: DQuat,
}

impl NavigationGoal {
    pub fn new(frame_id: impl Into<String>, position: DVec3, orientation: DQuat) -> Self {
        Self {
            id: Uuid::new_v4(),
            frame_id: frame_id.into(),
            stamp: Utc::now(),
            position,
            orientation,
        }
    }

    /// Turn on the spot by `yaw` relative to `frame_id`
    pub fn rotate_in_place(frame_id: impl Into<String>, yaw: f64) -> Self {
        Self::new(frame_id, DVec3::ZERO, yaw_to_quaternion(yaw))
    }

    /// Pose of the goal in `frame_id` coordinates
    pub fn pose(&self) -> RigidTransform {
        RigidTransform::new(self.orientation, self.position)
    }
}

/// Client side of the navigation action
pub trait NavigationClient: Send {
    /// Block until the action server is reachable; `None` waits indefinitely
    fn wait_for_server(&mut self, timeout: Option<Duration>) -> Result<()>;

    fn send_goal(&mut self, goal: NavigationGoal) -> Result<()>;

    /// Block until the last sent goal finishes
    fn wait_for_result(&mut self) -> Result<GoalStatus>;
}
