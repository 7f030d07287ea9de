use glam::{Quat, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Maps a point expressed in this pose's local frame into the parent frame.
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * (self.scale * local)
    }

    /// Composes `local` as a child of `self`.
    pub fn transform_pose(&self, local: &Pose) -> Pose {
        Pose {
            position: self.transform_point(local.position),
            rotation: self.rotation * local.rotation,
            scale: self.scale * local.scale,
        }
    }

    pub fn position_distance(&self, other: &Pose) -> f32 {
        self.position.distance(other.position)
    }

    pub fn angle_to(&self, other: &Pose) -> f32 {
        self.rotation.angle_between(other.rotation)
    }
}

/// Per-channel exponential lerp rates, in "fraction of remaining distance per second".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseRates {
    pub translation: f32,
    pub rotation: f32,
    pub scale: f32,
}

impl PoseRates {
    pub const fn uniform(rate: f32) -> Self {
        Self {
            translation: rate,
            rotation: rate,
            scale: rate,
        }
    }

    /// Position and scale share `translation`, orientation uses `rotation`.
    pub const fn split(translation: f32, rotation: f32) -> Self {
        Self {
            translation,
            rotation,
            scale: translation,
        }
    }
}

pub fn is_within_snap(current: &Pose, target: &Pose, snap_threshold: f32) -> bool {
    current.position_distance(target) < snap_threshold && current.angle_to(target) < snap_threshold
}

/// Advances `current` one tick toward `target`.
///
/// Returns the target exactly, with `true`, once the pose is within
/// `snap_threshold` both positionally and angularly. Otherwise every channel
/// moves by `rate * dt` of its remaining distance.
pub fn advance(
    current: Pose,
    target: Pose,
    rates: PoseRates,
    dt_seconds: f32,
    snap_threshold: f32,
) -> (Pose, bool) {
    if is_within_snap(&current, &target, snap_threshold) {
        return (target, true);
    }

    let step = |rate: f32| (rate * dt_seconds).clamp(0.0, 1.0);
    let next = Pose {
        position: current
            .position
            .lerp(target.position, step(rates.translation)),
        rotation: current.rotation.lerp(target.rotation, step(rates.rotation)),
        scale: current.scale.lerp(target.scale, step(rates.scale)),
    };
    (next, false)
}

/// A movable scene element that eases toward a target pose and snaps onto it.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimatedPart {
    pose: Pose,
    target: Pose,
    rates: PoseRates,
    snap_threshold: f32,
    snapped: bool,
}

impl AnimatedPart {
    pub fn at_rest(pose: Pose, rates: PoseRates, snap_threshold: f32) -> Self {
        Self {
            pose,
            target: pose,
            rates,
            snap_threshold,
            snapped: true,
        }
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn target(&self) -> Pose {
        self.target
    }

    pub fn rates(&self) -> PoseRates {
        self.rates
    }

    pub fn set_rates(&mut self, rates: PoseRates) {
        self.rates = rates;
    }

    pub fn is_snapped(&self) -> bool {
        self.snapped
    }

    /// Points the part at a new target and unlocks it for animation.
    pub fn retarget(&mut self, target: Pose) {
        self.target = target;
        self.snapped = false;
    }

    /// Places the part exactly on `pose` with no catch-up motion.
    pub fn snap_to(&mut self, pose: Pose) {
        self.pose = pose;
        self.target = pose;
        self.snapped = true;
    }

    /// Runs one animation step. Returns `true` only on the tick the part snaps.
    pub fn tick(&mut self, dt_seconds: f32) -> bool {
        if self.snapped {
            return false;
        }
        let (pose, snapped) = advance(
            self.pose,
            self.target,
            self.rates,
            dt_seconds,
            self.snap_threshold,
        );
        self.pose = pose;
        self.snapped = snapped;
        snapped
    }
}
