//! Stand-in robot for running the dialogue without hardware

use crate::geometry::transform::{RigidTransform, TransformTree};
use crate::integration::config::SoundboardConfig;
use crate::navigation::SimulatedBase;
use crate::Result;
use glam::DVec3;

/// Frame tree with the base at the world origin and the pan-tilt unit mounted
/// on it, plus a simulated base turning inside that tree
pub fn simulated_robot(config: &SoundboardConfig) -> Result<(TransformTree, SimulatedBase)> {
    let frames = &config.frames;
    let tree = TransformTree::new();

    tree.set_transform(&frames.world, &frames.base, RigidTransform::identity())?;
    tree.set_transform(
        &frames.base,
        &frames.pan_tilt,
        RigidTransform::from_translation(DVec3::from_array(config.pan_tilt_offset)),
    )?;

    let base = SimulatedBase::new(
        config.navigation.server.as_str(),
        tree.clone(),
        frames.world.as_str(),
        frames.base.as_str(),
    )
    .with_travel_time(config.travel_time());

    Ok((tree, base))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_robot_frames() {
        let config = SoundboardConfig::default();
        let (tree, _base) = simulated_robot(&config).unwrap();

        let map_from_pan_tilt = tree.lookup("map", "pantilt_link").unwrap();
        assert_eq!(map_from_pan_tilt.apply_point(DVec3::ZERO), DVec3::new(0.0, 0.0, 1.0));
    }
}
