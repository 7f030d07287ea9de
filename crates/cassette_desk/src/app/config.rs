use std::fs;
use std::path::{Path, PathBuf};

use deck_engine::{Aabb, Camera, LoopConfig, Pose, Viewport};
use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub(crate) const CONFIG_ENV_VAR: &str = "CASSETTE_DESK_CONFIG";
pub(crate) const BUTTON_COUNT: usize = 6;

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode config json at {field}: {source}")]
    Decode {
        field: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {reason}")]
    Invalid { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SavedPose {
    pub(crate) position: [f32; 3],
    pub(crate) rotation_deg: [f32; 3],
    pub(crate) scale: [f32; 3],
}

impl Default for SavedPose {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation_deg: [0.0; 3],
            scale: [1.0; 3],
        }
    }
}

impl SavedPose {
    fn at(position: [f32; 3]) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    fn rotated(mut self, rotation_deg: [f32; 3]) -> Self {
        self.rotation_deg = rotation_deg;
        self
    }

    fn scaled(mut self, uniform: f32) -> Self {
        self.scale = [uniform; 3];
        self
    }

    pub(crate) fn to_pose(self) -> Pose {
        let [x, y, z] = self.rotation_deg;
        Pose {
            position: Vec3::from_array(self.position),
            rotation: Quat::from_euler(
                EulerRot::XYZ,
                x.to_radians(),
                y.to_radians(),
                z.to_radians(),
            ),
            scale: Vec3::from_array(self.scale),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SavedBox {
    pub(crate) center: [f32; 3],
    pub(crate) half_extents: [f32; 3],
}

impl Default for SavedBox {
    fn default() -> Self {
        Self {
            center: [0.0; 3],
            half_extents: [0.5; 3],
        }
    }
}

impl SavedBox {
    fn new(center: [f32; 3], half_extents: [f32; 3]) -> Self {
        Self {
            center,
            half_extents,
        }
    }

    pub(crate) fn to_aabb(self) -> Aabb {
        Aabb::from_center_half_extents(
            Vec3::from_array(self.center),
            Vec3::from_array(self.half_extents),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct CameraConfig {
    pub(crate) position: [f32; 3],
    pub(crate) vertical_fov_deg: f32,
    pub(crate) viewport_width: u32,
    pub(crate) viewport_height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, -10.0],
            vertical_fov_deg: 60.0,
            viewport_width: 1280,
            viewport_height: 720,
        }
    }
}

impl CameraConfig {
    pub(crate) fn to_camera(&self) -> Camera {
        Camera {
            position: Vec3::from_array(self.position),
            vertical_fov_radians: self.vertical_fov_deg.to_radians(),
            viewport: Viewport {
                width: self.viewport_width,
                height: self.viewport_height,
            },
        }
    }
}

/// Door, buttons and the insertion slot are expressed in the body's local frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct PlayerConfig {
    pub(crate) stowed_pose: SavedPose,
    pub(crate) deployed_pose: SavedPose,
    pub(crate) stowed_collider: SavedBox,
    pub(crate) deployed_collider: SavedBox,
    pub(crate) door_closed_pose: SavedPose,
    pub(crate) door_open_pose: SavedPose,
    pub(crate) button_rest_positions: Vec<[f32; 3]>,
    pub(crate) button_half_extents: [f32; 3],
    pub(crate) button_push_offset: [f32; 3],
    pub(crate) locked_depth_fraction: f32,
    pub(crate) trigger_threshold: f32,
    pub(crate) deploy_speed: f32,
    pub(crate) stow_speed: f32,
    pub(crate) rotation_speed: f32,
    pub(crate) door_speed: f32,
    pub(crate) button_speed: f32,
    pub(crate) snap_threshold: f32,
    pub(crate) insertion_slot: SavedPose,
    pub(crate) insertion_half_extents: [f32; 3],
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            stowed_pose: SavedPose::at([6.5, -4.0, 0.0])
                .rotated([0.0, 0.0, -12.0])
                .scaled(0.5),
            deployed_pose: SavedPose::at([0.0, 0.0, 0.0]),
            stowed_collider: SavedBox::new([6.5, -4.0, 0.0], [1.1, 0.7, 0.3]),
            deployed_collider: SavedBox::new([0.0, 0.0, 0.0], [2.0, 1.25, 0.5]),
            door_closed_pose: SavedPose::at([0.0, -0.2, -0.55]),
            door_open_pose: SavedPose::at([0.0, -0.9, -0.9]).rotated([-60.0, 0.0, 0.0]),
            button_rest_positions: vec![
                [-1.5, 1.0, -0.6],
                [-0.9, 1.0, -0.6],
                [-0.3, 1.0, -0.6],
                [0.3, 1.0, -0.6],
                [0.9, 1.0, -0.6],
                [1.5, 1.0, -0.6],
            ],
            button_half_extents: [0.25, 0.2, 0.15],
            button_push_offset: [0.0, 0.0, 0.25],
            locked_depth_fraction: 0.5,
            trigger_threshold: 0.9,
            deploy_speed: 6.0,
            stow_speed: 6.0,
            rotation_speed: 8.0,
            door_speed: 10.0,
            button_speed: 25.0,
            snap_threshold: 0.005,
            insertion_slot: SavedPose::at([0.0, -0.2, -0.45]),
            insertion_half_extents: [1.5, 1.0, 2.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct WhiteboardConfig {
    pub(crate) stowed_pose: SavedPose,
    pub(crate) deployed_pose: SavedPose,
    pub(crate) stowed_collider: SavedBox,
    pub(crate) deployed_collider: SavedBox,
    pub(crate) speed: f32,
    pub(crate) snap_threshold: f32,
}

impl Default for WhiteboardConfig {
    fn default() -> Self {
        Self {
            stowed_pose: SavedPose::at([-7.5, 4.0, 0.5]).scaled(0.4),
            deployed_pose: SavedPose::at([0.0, 0.5, -2.0]),
            stowed_collider: SavedBox::new([-7.5, 4.0, 0.5], [1.2, 0.8, 0.1]),
            deployed_collider: SavedBox::new([0.0, 0.5, -2.0], [5.0, 3.0, 0.1]),
            speed: 6.0,
            snap_threshold: 0.005,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct HoldConfig {
    pub(crate) hold_depth: f32,
    pub(crate) hold_speed: f32,
    pub(crate) return_speed: f32,
    pub(crate) snap_threshold: f32,
    pub(crate) tape_half_extents: [f32; 3],
    pub(crate) max_ray_distance: f32,
}

impl Default for HoldConfig {
    fn default() -> Self {
        Self {
            hold_depth: 9.0,
            hold_speed: 20.0,
            return_speed: 8.0,
            snap_threshold: 0.005,
            tape_half_extents: [0.9, 0.6, 0.15],
            max_ray_distance: 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct TapeConfig {
    pub(crate) name: String,
    pub(crate) clip_length_seconds: f32,
    pub(crate) origin: SavedPose,
}

impl Default for TapeConfig {
    fn default() -> Self {
        Self {
            name: "Untitled".to_string(),
            clip_length_seconds: 60.0,
            origin: SavedPose::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct DeskConfig {
    pub(crate) tick: LoopConfig,
    pub(crate) camera: CameraConfig,
    pub(crate) player: PlayerConfig,
    pub(crate) whiteboard: WhiteboardConfig,
    pub(crate) hold: HoldConfig,
    pub(crate) tapes: Vec<TapeConfig>,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            tick: LoopConfig::default(),
            camera: CameraConfig::default(),
            player: PlayerConfig::default(),
            whiteboard: WhiteboardConfig::default(),
            hold: HoldConfig::default(),
            tapes: vec![
                TapeConfig {
                    name: "Interview - Side A".to_string(),
                    clip_length_seconds: 95.0,
                    origin: SavedPose::at([-7.0, -3.5, 0.0]),
                },
                TapeConfig {
                    name: "Answering Machine".to_string(),
                    clip_length_seconds: 130.0,
                    origin: SavedPose::at([-4.5, -3.5, 0.0]),
                },
            ],
        }
    }
}

impl DeskConfig {
    pub(crate) fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub(crate) fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let config = serde_path_to_error::deserialize::<_, DeskConfig>(&mut deserializer)
            .map_err(|error| {
                let field = error.path().to_string();
                ConfigError::Decode {
                    field,
                    source: error.into_inner(),
                }
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads the file named by [`CONFIG_ENV_VAR`], or returns built-in defaults when unset.
    pub(crate) fn load_from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| Err(ConfigError::Invalid { reason });

        if self.tick.target_tps == 0 {
            return invalid("tick.target_tps must be positive".to_string());
        }
        if self.tapes.is_empty() {
            return invalid("at least one tape is required".to_string());
        }
        for (index, tape) in self.tapes.iter().enumerate() {
            if !(tape.clip_length_seconds > 0.0) {
                return invalid(format!(
                    "tapes[{index}].clip_length_seconds must be positive"
                ));
            }
        }
        if self.player.button_rest_positions.len() != BUTTON_COUNT {
            return invalid(format!(
                "player.button_rest_positions must list {BUTTON_COUNT} buttons, got {}",
                self.player.button_rest_positions.len()
            ));
        }
        let locked = self.player.locked_depth_fraction;
        let trigger = self.player.trigger_threshold;
        if !(0.0..1.0).contains(&locked) {
            return invalid("player.locked_depth_fraction must be in [0, 1)".to_string());
        }
        if !(trigger > locked && trigger <= 1.0) {
            return invalid(
                "player.trigger_threshold must be above locked_depth_fraction and at most 1"
                    .to_string(),
            );
        }
        if Vec3::from_array(self.player.button_push_offset).length_squared() <= f32::EPSILON {
            return invalid("player.button_push_offset must be non-zero".to_string());
        }
        Ok(())
    }
}
