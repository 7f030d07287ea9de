use deck_engine::{Aabb, AnimatedPart, Pose, PoseRates};
use tracing::info;

use crate::app::config::WhiteboardConfig;

/// Drawable surface that slides between a corner of the desk and the middle
/// of the view. Only its placement is modelled here.
#[derive(Debug, Clone)]
pub(crate) struct Whiteboard {
    deployed: bool,
    part: AnimatedPart,
    stowed_pose: Pose,
    deployed_pose: Pose,
    stowed_collider: Aabb,
    deployed_collider: Aabb,
}

impl Whiteboard {
    pub(crate) fn new(config: &WhiteboardConfig) -> Self {
        let stowed_pose = config.stowed_pose.to_pose();
        Self {
            deployed: false,
            part: AnimatedPart::at_rest(
                stowed_pose,
                PoseRates::uniform(config.speed),
                config.snap_threshold,
            ),
            stowed_pose,
            deployed_pose: config.deployed_pose.to_pose(),
            stowed_collider: config.stowed_collider.to_aabb(),
            deployed_collider: config.deployed_collider.to_aabb(),
        }
    }

    pub(crate) fn is_deployed(&self) -> bool {
        self.deployed
    }

    pub(crate) fn pose(&self) -> Pose {
        self.part.pose()
    }

    pub(crate) fn toggle(&mut self, deploy: bool) -> bool {
        if deploy == self.deployed {
            return false;
        }
        self.deployed = deploy;
        self.part.retarget(if deploy {
            self.deployed_pose
        } else {
            self.stowed_pose
        });
        info!(deployed = deploy, "whiteboard_toggled");
        true
    }

    pub(crate) fn bounds(&self) -> Aabb {
        if self.deployed {
            self.deployed_collider
        } else {
            self.stowed_collider
        }
    }

    pub(crate) fn animate(&mut self, dt_seconds: f32) {
        self.part.tick(dt_seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_swaps_target_and_collider() {
        let config = WhiteboardConfig::default();
        let mut board = Whiteboard::new(&config);
        assert!(board.toggle(true));
        assert!(!board.toggle(true));
        assert_eq!(board.bounds(), config.deployed_collider.to_aabb());

        for _ in 0..600 {
            board.animate(1.0 / 60.0);
        }
        assert_eq!(board.pose(), config.deployed_pose.to_pose());
    }
}
