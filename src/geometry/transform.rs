//! Rigid transforms and a tree of named reference frames
//!
//! Each frame stores the transform from its own coordinates into its parent's.
//! Lookups walk both frames up to the root and compose through it.

use crate::geometry::point::StampedPoint;
use crate::{Result, SoundboardError};
use glam::{DQuat, DVec3};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// How often `wait_for_transform` re-checks the tree
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Lookup of points between named frames
pub trait TransformSource: Send {
    /// Block until `source` can be expressed in `target`, or fail after `timeout`
    fn wait_for_transform(&self, target: &str, source: &str, timeout: Duration) -> Result<()>;

    /// Express `point` in the `target` frame
    fn transform_point(&self, target: &str, point: &StampedPoint) -> Result<StampedPoint>;
}

/// A rotation followed by a translation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidTransform {
    pub rotation: DQuat,
    pub translation: DVec3,
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl RigidTransform {
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            rotation: DQuat::IDENTITY,
            translation: DVec3::ZERO,
        }
    }

    #[must_use]
    pub const fn new(rotation: DQuat, translation: DVec3) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    #[must_use]
    pub const fn from_translation(translation: DVec3) -> Self {
        Self::new(DQuat::IDENTITY, translation)
    }

    /// Planar pose: position plus a rotation about +z.
    #[must_use]
    pub fn from_yaw(yaw: f64, translation: DVec3) -> Self {
        Self::new(DQuat::from_rotation_z(yaw), translation)
    }

    #[must_use]
    pub fn apply_point(&self, point: DVec3) -> DVec3 {
        self.rotation * point + self.translation
    }

    #[must_use]
    pub fn inverse(&self) -> Self {
        let inv_rotation = self.rotation.inverse();
        Self {
            rotation: inv_rotation,
            translation: inv_rotation * (-self.translation),
        }
    }

    /// Applies `other` first, then `self`.
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            rotation: (self.rotation * other.rotation).normalize(),
            translation: self.rotation * other.translation + self.translation,
        }
    }
}

#[derive(Debug, Clone)]
struct FrameLink {
    parent: String,
    parent_from_child: RigidTransform,
}

/// Shared tree of named frames.
///
/// Clones share the same frames, so one owner can move a frame (the simulated
/// base turning) while another looks points up.
#[derive(Debug, Clone, Default)]
pub struct TransformTree {
    links: Arc<RwLock<HashMap<String, FrameLink>>>,
}

impl TransformTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or replace) the pose of `child` relative to `parent`
    pub fn set_transform(
        &self,
        parent: impl Into<String>,
        child: impl Into<String>,
        parent_from_child: RigidTransform,
    ) -> Result<()> {
        let parent = parent.into();
        let child = child.into();

        if parent == child {
            return Err(SoundboardError::TransformError(format!(
                "frame {} cannot be its own parent",
                child
            )));
        }

        let mut links = self.links.write();

        // Refuse links that would make `child` an ancestor of itself
        let mut cursor = parent.as_str();
        while let Some(link) = links.get(cursor) {
            if link.parent == child {
                return Err(SoundboardError::TransformError(format!(
                    "linking {} under {} would create a cycle",
                    child, parent
                )));
            }
            cursor = link.parent.as_str();
        }

        debug!("Frame {} -> {} updated", parent, child);
        links.insert(
            child,
            FrameLink {
                parent,
                parent_from_child,
            },
        );
        Ok(())
    }

    /// Whether a frame name is known to the tree, as a child or a parent
    pub fn has_frame(&self, frame: &str) -> bool {
        let links = self.links.read();
        links.contains_key(frame) || links.values().any(|l| l.parent == frame)
    }

    /// Transform mapping coordinates in `source` into coordinates in `target`
    pub fn lookup(&self, target: &str, source: &str) -> Result<RigidTransform> {
        let links = self.links.read();

        for frame in [target, source] {
            if !links.contains_key(frame) && !links.values().any(|l| l.parent == frame) {
                return Err(SoundboardError::TransformError(format!(
                    "unknown frame {}",
                    frame
                )));
            }
        }

        let (target_root, root_from_target) = chain_to_root(&links, target);
        let (source_root, root_from_source) = chain_to_root(&links, source);

        if target_root != source_root {
            return Err(SoundboardError::TransformError(format!(
                "frames {} and {} are not connected",
                target, source
            )));
        }

        Ok(root_from_target.inverse().compose(&root_from_source))
    }

    pub fn can_transform(&self, target: &str, source: &str) -> bool {
        self.lookup(target, source).is_ok()
    }
}

fn chain_to_root(links: &HashMap<String, FrameLink>, frame: &str) -> (String, RigidTransform) {
    let mut current = frame;
    let mut root_from_frame = RigidTransform::identity();

    while let Some(link) = links.get(current) {
        root_from_frame = link.parent_from_child.compose(&root_from_frame);
        current = link.parent.as_str();
    }

    (current.to_string(), root_from_frame)
}

impl TransformSource for TransformTree {
    fn wait_for_transform(&self, target: &str, source: &str, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;

        loop {
            if self.can_transform(target, source) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(SoundboardError::TransformError(format!(
                    "timed out after {:?} waiting for {} -> {}",
                    timeout, source, target
                )));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    fn transform_point(&self, target: &str, point: &StampedPoint) -> Result<StampedPoint> {
        let target_from_source = self.lookup(target, &point.frame_id)?;
        Ok(point.reframed(target, target_from_source.apply_point(point.point)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn assert_close(a: DVec3, b: DVec3) {
        assert!((a - b).length() < 1e-9, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_compose_and_inverse() {
        let t = RigidTransform::from_yaw(FRAC_PI_2, DVec3::new(1.0, 0.0, 0.0));
        let p = DVec3::new(1.0, 0.0, 0.0);

        // Rotate +x onto +y, then shift by +x
        assert_close(t.apply_point(p), DVec3::new(1.0, 1.0, 0.0));
        assert_close(t.inverse().apply_point(t.apply_point(p)), p);
        assert_close(t.compose(&t.inverse()).apply_point(p), p);
    }

    #[test]
    fn test_lookup_through_common_root() {
        let tree = TransformTree::new();
        tree.set_transform(
            "map",
            "base_link",
            RigidTransform::from_yaw(FRAC_PI_2, DVec3::new(2.0, 0.0, 0.0)),
        )
        .unwrap();
        tree.set_transform(
            "base_link",
            "pantilt_link",
            RigidTransform::from_translation(DVec3::new(0.0, 0.0, 1.0)),
        )
        .unwrap();

        // The map point (2, 3, 0) is 3m ahead of a base facing +y
        let in_base = tree
            .lookup("base_link", "map")
            .unwrap()
            .apply_point(DVec3::new(2.0, 3.0, 0.0));
        assert_close(in_base, DVec3::new(3.0, 0.0, 0.0));

        let in_pan_tilt = tree
            .lookup("pantilt_link", "map")
            .unwrap()
            .apply_point(DVec3::new(2.0, 3.0, 0.0));
        assert_close(in_pan_tilt, DVec3::new(3.0, 0.0, -1.0));

        // Sibling lookup walks up and back down
        let map_from_pan_tilt = tree.lookup("map", "pantilt_link").unwrap();
        assert_close(map_from_pan_tilt.apply_point(DVec3::ZERO), DVec3::new(2.0, 0.0, 1.0));
    }

    #[test]
    fn test_unknown_and_disconnected_frames() {
        let tree = TransformTree::new();
        tree.set_transform("map", "base_link", RigidTransform::identity())
            .unwrap();
        tree.set_transform("odom", "wheel", RigidTransform::identity())
            .unwrap();

        assert!(tree.has_frame("map"));
        assert!(!tree.has_frame("camera"));
        assert!(matches!(
            tree.lookup("camera", "map"),
            Err(SoundboardError::TransformError(_))
        ));
        assert!(!tree.can_transform("base_link", "wheel"));
    }

    #[test]
    fn test_cycle_rejected() {
        let tree = TransformTree::new();
        tree.set_transform("map", "base_link", RigidTransform::identity())
            .unwrap();
        tree.set_transform("base_link", "pantilt_link", RigidTransform::identity())
            .unwrap();

        assert!(tree
            .set_transform("pantilt_link", "map", RigidTransform::identity())
            .is_err());
        assert!(tree
            .set_transform("map", "map", RigidTransform::identity())
            .is_err());
    }

    #[test]
    fn test_wait_for_transform_times_out() {
        let tree = TransformTree::new();
        tree.set_transform("map", "base_link", RigidTransform::identity())
            .unwrap();

        assert!(tree
            .wait_for_transform("map", "base_link", Duration::from_millis(20))
            .is_ok());

        let start = Instant::now();
        let result = tree.wait_for_transform("pantilt_link", "map", Duration::from_millis(50));
        assert!(matches!(result, Err(SoundboardError::TransformError(_))));
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_wait_for_transform_sees_late_frame() {
        let tree = TransformTree::new();
        tree.set_transform("map", "base_link", RigidTransform::identity())
            .unwrap();

        let publisher = tree.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            publisher
                .set_transform("base_link", "pantilt_link", RigidTransform::identity())
                .unwrap();
        });

        assert!(tree
            .wait_for_transform("pantilt_link", "map", Duration::from_secs(2))
            .is_ok());
        handle.join().unwrap();
    }

    #[test]
    fn test_transform_point_reframes() {
        let tree = TransformTree::new();
        tree.set_transform(
            "map",
            "base_link",
            RigidTransform::from_translation(DVec3::new(1.0, 1.0, 0.0)),
        )
        .unwrap();

        let p = StampedPoint::new("map", DVec3::new(2.0, 1.0, 0.5));
        let out = tree.transform_point("base_link", &p).unwrap();

        assert_eq!(out.frame_id, "base_link");
        assert_eq!(out.stamp, p.stamp);
        assert_close(out.point, DVec3::new(1.0, 0.0, 0.5));
    }
}
