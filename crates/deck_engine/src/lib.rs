//! Frame-driven interaction primitives for tabletop object manipulation:
//! kinematic pose easing, touch session tracking, ray picking against tagged
//! colliders, a console command registry, and a headless fixed-tick driver.

pub mod app;

pub use app::{
    advance, is_within_snap, require_no_args, require_single_arg, tokenize_line, Aabb,
    AnimatedPart, Camera, Collider, CollisionWorld, CommandParseError, CommandRegistry,
    ConsoleError, ContactBoard, ContactSample, LoopConfig, ObjectId, ObjectIdAllocator, Pose,
    PoseRates, Ray, RayHit, RegistryError, Simulation, TickDriver, TouchHandler, TouchId,
    TouchSession, TouchTickCounts, TouchTracker, Viewport,
};
