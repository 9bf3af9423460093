//! Room walkthrough core: avatar locomotion, camera rig, ray collision, input
//! aggregation and settings.
//!
//! Everything here is plain data plus pure functions over it, so the whole
//! movement and camera pipeline runs in tests without a window or GPU. The
//! client crate feeds it window input and loaded meshes and copies the
//! resolved poses onto Bevy transforms.

pub mod avatar;
pub mod camera;
pub mod collision;
pub mod frame;
pub mod input;
pub mod physics;
pub mod settings;
pub mod touch;
pub mod world;

pub use avatar::Pose;
pub use camera::{CameraConfig, CameraPose, CameraState, ViewMode};
pub use collision::{CollisionMesh, CollisionWorld, RayHit};
pub use frame::{FrameReport, Walkthrough};
pub use input::{InputAggregator, InputIntent, InputSource};
pub use physics::MotionConfig;
pub use settings::{Quality, Settings, SettingsError, SettingsStore};
pub use world::{WorldBounds, WorldMetrics};

/// Asset path of the room scene, relative to the asset root.
pub const ROOM_SCENE_PATH: &str = "room_sample.glb";
