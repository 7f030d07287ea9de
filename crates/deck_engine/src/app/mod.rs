mod camera;
mod console;
mod input;
mod loop_runner;
mod pose;
mod scene;
mod touch;

pub use camera::{Camera, Viewport};
pub use console::{
    require_no_args, require_single_arg, tokenize_line, CommandParseError, CommandRegistry,
    ConsoleError, RegistryError,
};
pub use input::ContactBoard;
pub use loop_runner::{LoopConfig, Simulation, TickDriver};
pub use pose::{
    advance, is_within_snap, AnimatedPart, Pose, PoseRates,
};
pub use scene::{Aabb, Collider, CollisionWorld, ObjectId, ObjectIdAllocator, Ray, RayHit};
pub use touch::{
    ContactSample, TouchHandler, TouchId, TouchSession, TouchTickCounts, TouchTracker,
};
