//! In-process stand-in for the navigation action server
//!
//! Completing a goal moves the base frame inside the shared [`TransformTree`],
//! so later transform lookups see the robot facing its new heading.

use super::{GoalStatus, NavigationClient, NavigationGoal};
use crate::geometry::transform::TransformTree;
use crate::{Result, SoundboardError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const SERVER_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Simulated mobile base turning in place under the world frame
pub struct SimulatedBase {
    server: String,
    tree: TransformTree,
    world_frame: String,
    base_frame: String,
    travel_time: Duration,
    online: Arc<AtomicBool>,
    pending: Option<NavigationGoal>,
    completed: Arc<Mutex<Vec<NavigationGoal>>>,
}

impl SimulatedBase {
    pub fn new(
        server: impl Into<String>,
        tree: TransformTree,
        world_frame: impl Into<String>,
        base_frame: impl Into<String>,
    ) -> Self {
        Self {
            server: server.into(),
            tree,
            world_frame: world_frame.into(),
            base_frame: base_frame.into(),
            travel_time: Duration::ZERO,
            online: Arc::new(AtomicBool::new(true)),
            pending: None,
            completed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Delay each goal by a fixed travel time
    pub fn with_travel_time(mut self, travel_time: Duration) -> Self {
        self.travel_time = travel_time;
        self
    }

    /// Flag controlling whether the server answers; shareable across threads
    pub fn availability(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.online)
    }

    /// Goals that finished, oldest first
    pub fn completed_goals(&self) -> Arc<Mutex<Vec<NavigationGoal>>> {
        Arc::clone(&self.completed)
    }

    fn unavailable(&self) -> SoundboardError {
        SoundboardError::NavigationUnavailable(self.server.clone())
    }
}

impl NavigationClient for SimulatedBase {
    fn wait_for_server(&mut self, timeout: Option<Duration>) -> Result<()> {
        let start = Instant::now();

        while !self.online.load(Ordering::SeqCst) {
            if timeout.is_some_and(|t| start.elapsed() >= t) {
                return Err(self.unavailable());
            }
            thread::sleep(SERVER_POLL_INTERVAL);
        }

        info!("Connected to navigation server {}", self.server);
        Ok(())
    }

    fn send_goal(&mut self, goal: NavigationGoal) -> Result<()> {
        if !self.online.load(Ordering::SeqCst) {
            return Err(self.unavailable());
        }

        debug!("Goal {} accepted by {}", goal.id, self.server);
        self.pending = Some(goal);
        Ok(())
    }

    fn wait_for_result(&mut self) -> Result<GoalStatus> {
        let goal = self.pending.take().ok_or_else(|| {
            SoundboardError::NavigationError("no goal has been sent".into())
        })?;

        if !self.travel_time.is_zero() {
            thread::sleep(self.travel_time);
        }

        if !self.online.load(Ordering::SeqCst) {
            return Err(self.unavailable());
        }

        // Resolve the goal frame before the base moves, since it may be the base itself
        let world_from_goal_frame = match self.tree.lookup(&self.world_frame, &goal.frame_id) {
            Ok(transform) => transform,
            Err(e) => {
                debug!("Goal {} aborted: {}", goal.id, e);
                return Ok(GoalStatus::Aborted);
            }
        };

        let world_from_base = world_from_goal_frame.compose(&goal.pose());
        self.tree
            .set_transform(&self.world_frame, &self.base_frame, world_from_base)?;

        debug!("Goal {} succeeded", goal.id);
        self.completed.lock().push(goal);
        Ok(GoalStatus::Succeeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::bearing::yaw_of;
    use crate::geometry::transform::RigidTransform;
    use glam::DVec3;
    use std::f64::consts::FRAC_PI_2;

    fn tree() -> TransformTree {
        let tree = TransformTree::new();
        tree.set_transform("map", "base_link", RigidTransform::identity())
            .unwrap();
        tree
    }

    #[test]
    fn test_relative_goals_accumulate() {
        let tree = tree();
        let mut base = SimulatedBase::new("move_base", tree.clone(), "map", "base_link");

        base.wait_for_server(Some(Duration::from_millis(10))).unwrap();
        base.send_goal(NavigationGoal::rotate_in_place("base_link", FRAC_PI_2))
            .unwrap();
        assert_eq!(base.wait_for_result().unwrap(), GoalStatus::Succeeded);
        base.send_goal(NavigationGoal::rotate_in_place("base_link", FRAC_PI_2 / 2.0))
            .unwrap();
        assert_eq!(base.wait_for_result().unwrap(), GoalStatus::Succeeded);

        let pose = tree.lookup("map", "base_link").unwrap();
        assert!((yaw_of(pose.rotation) - 3.0 * FRAC_PI_2 / 2.0).abs() < 1e-9);
        assert!(pose.translation.length() < 1e-9);
        assert_eq!(base.completed_goals().lock().len(), 2);
    }

    #[test]
    fn test_world_frame_goal_is_absolute() {
        let tree = tree();
        let mut base = SimulatedBase::new("move_base", tree.clone(), "map", "base_link");

        base.send_goal(NavigationGoal::rotate_in_place("map", 1.0)).unwrap();
        base.wait_for_result().unwrap();
        base.send_goal(NavigationGoal::rotate_in_place("map", 1.0)).unwrap();
        base.wait_for_result().unwrap();

        let pose = tree.lookup("map", "base_link").unwrap();
        assert!((yaw_of(pose.rotation) - 1.0).abs() < 1e-9);
        assert_eq!(pose.translation, DVec3::ZERO);
    }

    #[test]
    fn test_unknown_goal_frame_aborts() {
        let mut base = SimulatedBase::new("move_base", tree(), "map", "base_link");

        base.send_goal(NavigationGoal::rotate_in_place("odom", 0.5)).unwrap();
        assert_eq!(base.wait_for_result().unwrap(), GoalStatus::Aborted);
        assert!(base.completed_goals().lock().is_empty());
    }

    #[test]
    fn test_offline_server_is_unavailable() {
        let mut base = SimulatedBase::new("move_base", tree(), "map", "base_link");
        base.availability().store(false, Ordering::SeqCst);

        let err = base
            .wait_for_server(Some(Duration::from_millis(60)))
            .unwrap_err();
        assert!(matches!(err, SoundboardError::NavigationUnavailable(_)));
        assert!(!err.is_recoverable());

        assert!(base
            .send_goal(NavigationGoal::rotate_in_place("base_link", 0.1))
            .is_err());
    }

    #[test]
    fn test_server_lost_while_waiting() {
        let mut base = SimulatedBase::new("move_base", tree(), "map", "base_link");
        let online = base.availability();

        base.send_goal(NavigationGoal::rotate_in_place("base_link", 0.1))
            .unwrap();
        online.store(false, Ordering::SeqCst);

        assert!(matches!(
            base.wait_for_result(),
            Err(SoundboardError::NavigationUnavailable(_))
        ));
    }

    #[test]
    fn test_wait_without_goal() {
        let mut base = SimulatedBase::new("move_base", tree(), "map", "base_link");
        assert!(matches!(
            base.wait_for_result(),
            Err(SoundboardError::NavigationError(_))
        ));
    }
}
