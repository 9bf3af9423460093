//! First-person and third-person camera rig.
//!
//! First person locks the eye to the avatar: horizontal facing is the avatar's
//! yaw, only pitch is free. Third person orbits a point just above the avatar
//! on a yaw/pitch/distance sphere, pulls in when geometry blocks the line of
//! sight, and eases toward its goal unless a snap was requested.

use bevy::prelude::*;
use std::f32::consts::{FRAC_PI_2, PI};

use crate::{
    avatar::{wrap_angle, Pose, TILT_RATE, TURN_RATE},
    collision::CollisionWorld,
    input::InputIntent,
    world::WorldMetrics,
};

/// First-person pitch limit either side of level (55 degrees).
pub const FIRST_PERSON_PITCH_LIMIT: f32 = 0.959_931;

/// Third-person elevation range. The camera may dip a little below the target
/// but never reaches straight up or straight down.
pub const THIRD_PERSON_MIN_PITCH: f32 = FRAC_PI_2 - PI * 0.95;
pub const THIRD_PERSON_MAX_PITCH: f32 = FRAC_PI_2 - 0.05;

/// Starting third-person elevation, a bit above the avatar.
pub const DEFAULT_PITCH: f32 = PI * 0.12;

/// Starting third-person distance.
pub const DEFAULT_DISTANCE: f32 = 7.0;

/// First-person eye height above the feet, in avatar radii.
pub const EYE_HEIGHT_FACTOR: f32 = 1.7;

/// Third-person look target above the avatar centre, in avatar radii.
pub const TARGET_HEIGHT_FACTOR: f32 = 0.8;

/// Per-frame blend toward the goal position at the reference rate.
pub const FOLLOW_BLEND: f32 = 0.18;
pub const FOLLOW_REFERENCE_HZ: f32 = 60.0;

/// Closest the camera may be pulled toward the target by occlusion.
pub const CLEARANCE_FLOOR: f32 = 0.3;

/// How far in front of an occluding surface the camera stops.
pub const OCCLUSION_MARGIN: f32 = 0.2;

/// Camera view mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ViewMode {
    FirstPerson,
    #[default]
    ThirdPerson,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::FirstPerson => ViewMode::ThirdPerson,
            ViewMode::ThirdPerson => ViewMode::FirstPerson,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::FirstPerson => "First Person",
            ViewMode::ThirdPerson => "Third Person",
        }
    }
}

/// Camera tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    pub first_person_pitch_limit: f32,
    pub third_person_min_pitch: f32,
    pub third_person_max_pitch: f32,
    pub eye_height_factor: f32,
    pub target_height_factor: f32,
    pub follow_blend: f32,
    pub follow_reference_hz: f32,
    pub clearance_floor: f32,
    pub occlusion_margin: f32,
    /// Arrow-key orbit rate in third person, rad/s.
    pub orbit_turn_rate: f32,
    /// Arrow-key pitch rate, rad/s.
    pub tilt_rate: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            first_person_pitch_limit: FIRST_PERSON_PITCH_LIMIT,
            third_person_min_pitch: THIRD_PERSON_MIN_PITCH,
            third_person_max_pitch: THIRD_PERSON_MAX_PITCH,
            eye_height_factor: EYE_HEIGHT_FACTOR,
            target_height_factor: TARGET_HEIGHT_FACTOR,
            follow_blend: FOLLOW_BLEND,
            follow_reference_hz: FOLLOW_REFERENCE_HZ,
            clearance_floor: CLEARANCE_FLOOR,
            occlusion_margin: OCCLUSION_MARGIN,
            orbit_turn_rate: TURN_RATE,
            tilt_rate: TILT_RATE,
        }
    }
}

impl CameraConfig {
    /// Allowed `(min, max)` pitch for a mode.
    pub fn pitch_range(&self, mode: ViewMode) -> (f32, f32) {
        match mode {
            ViewMode::FirstPerson => (
                -self.first_person_pitch_limit,
                self.first_person_pitch_limit,
            ),
            ViewMode::ThirdPerson => (self.third_person_min_pitch, self.third_person_max_pitch),
        }
    }

    /// Fraction of the remaining gap closed this frame.
    ///
    /// Exponential in `dt`: one frame at the reference rate closes exactly
    /// `follow_blend`, and the curve stays the same at any frame rate.
    pub fn follow_factor(&self, dt: f32) -> f32 {
        1.0 - (1.0 - self.follow_blend).powf(dt.max(0.0) * self.follow_reference_hz)
    }
}

/// Look state owned by the camera resolver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub mode: ViewMode,
    /// Horizontal look angle, radians in `[0, TAU)`. Mirrors the avatar yaw in first person.
    pub yaw: f32,
    /// Downward tilt of the view. In third person this is the camera's
    /// elevation above the target.
    pub pitch: f32,
    /// Orbit radius in third person.
    pub distance: f32,
    /// Place the camera directly on the next resolve instead of easing.
    pub snap: bool,
    eye: Option<Vec3>,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            mode: ViewMode::default(),
            yaw: 0.0,
            pitch: DEFAULT_PITCH,
            distance: DEFAULT_DISTANCE,
            snap: true,
            eye: None,
        }
    }
}

impl CameraState {
    /// Apply look, tilt, orbit and zoom intent, then clamp.
    pub fn apply_look(
        &mut self,
        intent: &InputIntent,
        metrics: &WorldMetrics,
        config: &CameraConfig,
        dt: f32,
    ) {
        self.pitch += intent.look.y - intent.tilt * config.tilt_rate * dt;
        // Stored in both modes; only visible in third person.
        self.distance += intent.zoom;

        // First person ignores horizontal look; the avatar's turn controls own facing.
        if self.mode == ViewMode::ThirdPerson {
            self.yaw = wrap_angle(self.yaw + intent.look.x + intent.turn * config.orbit_turn_rate * dt);
        }

        self.clamp(metrics, config);
    }

    /// Keep pitch and distance inside their ranges.
    pub fn clamp(&mut self, metrics: &WorldMetrics, config: &CameraConfig) {
        let (min_pitch, max_pitch) = config.pitch_range(self.mode);
        self.pitch = self.pitch.clamp(min_pitch, max_pitch);
        self.distance = metrics.clamp_distance(self.distance);
    }

    /// Switch view mode, carrying the horizontal facing across.
    ///
    /// Entering first person turns the avatar to where the orbit camera was
    /// looking; leaving it starts the orbit behind the avatar.
    pub fn set_mode(
        &mut self,
        mode: ViewMode,
        pose: &mut Pose,
        metrics: &WorldMetrics,
        config: &CameraConfig,
    ) {
        if mode == self.mode {
            return;
        }
        match mode {
            ViewMode::FirstPerson => pose.yaw = self.yaw,
            ViewMode::ThirdPerson => self.yaw = pose.yaw,
        }
        self.mode = mode;
        self.snap = true;
        self.clamp(metrics, config);
    }
}

/// Resolved camera placement for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub rotation: Quat,
    /// Point the camera is aimed at.
    pub target: Vec3,
}

impl CameraPose {
    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position).with_rotation(self.rotation)
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }
}

/// Resolve the camera for this frame. Updates look state from `intent` first.
pub fn resolve_camera(
    pose: &Pose,
    state: &mut CameraState,
    intent: &InputIntent,
    world: &CollisionWorld,
    metrics: &WorldMetrics,
    config: &CameraConfig,
    dt: f32,
) -> CameraPose {
    state.apply_look(intent, metrics, config, dt);

    let camera = match state.mode {
        ViewMode::FirstPerson => {
            state.yaw = pose.yaw;
            first_person_pose(pose, state.pitch, metrics.radius, config)
        }
        ViewMode::ThirdPerson => third_person_pose(pose, state, world, metrics, config, dt),
    };

    state.eye = Some(camera.position);
    state.snap = false;
    camera
}

/// Eye locked to the avatar, no easing.
pub fn first_person_pose(pose: &Pose, pitch: f32, radius: f32, config: &CameraConfig) -> CameraPose {
    let position = Vec3::new(
        pose.position.x,
        pose.feet_y(radius) + radius * config.eye_height_factor,
        pose.position.z,
    );
    let rotation = Quat::from_euler(EulerRot::YXZ, pose.yaw, -pitch, 0.0);
    CameraPose {
        position,
        rotation,
        target: position + rotation * Vec3::NEG_Z,
    }
}

fn third_person_pose(
    pose: &Pose,
    state: &CameraState,
    world: &CollisionWorld,
    metrics: &WorldMetrics,
    config: &CameraConfig,
    dt: f32,
) -> CameraPose {
    let target = pose.position + Vec3::Y * (metrics.radius * config.target_height_factor);
    let dir = orbit_direction(state.yaw, state.pitch);
    let distance = unoccluded_distance(world, target, dir, state.distance, config);
    let desired = target + dir * distance;

    let position = match state.eye {
        Some(eye) if !state.snap => eye.lerp(desired, config.follow_factor(dt)),
        _ => desired,
    };

    CameraPose {
        position,
        rotation: look_at_level(position, target),
        target,
    }
}

/// Unit vector from the orbit pivot to the camera.
///
/// - yaw rotates around Y (the camera sits behind the direction it faces)
/// - pitch is elevation: 0 = level, positive = above
pub fn orbit_direction(yaw: f32, pitch: f32) -> Vec3 {
    let behind = Vec3::new(yaw.sin(), 0.0, yaw.cos());
    behind * pitch.cos() + Vec3::Y * pitch.sin()
}

/// Orbit distance after pulling in in front of any geometry between target and camera.
///
/// Never less than the clearance floor.
pub fn unoccluded_distance(
    world: &CollisionWorld,
    target: Vec3,
    dir: Vec3,
    desired: f32,
    config: &CameraConfig,
) -> f32 {
    match world.cast_ray(target, dir, desired) {
        Some(hit) if hit.distance < desired => {
            (hit.distance - config.occlusion_margin).max(config.clearance_floor)
        }
        _ => desired,
    }
}

/// Rotation looking at `target` with a level horizon.
fn look_at_level(eye: Vec3, target: Vec3) -> Quat {
    Transform::from_translation(eye).looking_at(target, Vec3::Y).rotation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::CollisionMesh;

    /// Two-sided quad in the plane z = `z`.
    fn wall_at_z(z: f32) -> CollisionWorld {
        let a = Vec3::new(-10.0, -10.0, z);
        let b = Vec3::new(10.0, -10.0, z);
        let c = Vec3::new(-10.0, 10.0, z);
        let d = Vec3::new(10.0, 10.0, z);
        let mut world = CollisionWorld::new();
        world.push_mesh(CollisionMesh::new(vec![[a, b, c], [c, b, d]], true).unwrap());
        world
    }

    fn level_state() -> CameraState {
        CameraState {
            pitch: 0.0,
            ..default()
        }
    }

    #[test]
    fn test_follow_factor_matches_fixed_blend_at_60hz() {
        let config = CameraConfig::default();
        assert!((config.follow_factor(1.0 / 60.0) - FOLLOW_BLEND).abs() < 1e-5);
        // Two 120 Hz frames close the same gap as one 60 Hz frame.
        let half = config.follow_factor(1.0 / 120.0);
        let two_halves = 1.0 - (1.0 - half) * (1.0 - half);
        assert!((two_halves - FOLLOW_BLEND).abs() < 1e-5);
        assert_eq!(config.follow_factor(0.0), 0.0);
    }

    #[test]
    fn test_snap_places_camera_exactly() {
        let world = CollisionWorld::new();
        let metrics = WorldMetrics::default();
        let config = CameraConfig::default();
        let pose = Pose::default();
        let mut state = level_state();

        let cam = resolve_camera(&pose, &mut state, &InputIntent::default(), &world, &metrics, &config, 1.0 / 60.0);
        let target = pose.position + Vec3::Y * 0.4;
        assert!((cam.position - (target + Vec3::Z * DEFAULT_DISTANCE)).length() < 1e-4);
        assert!(!state.snap);
        assert!((cam.forward() - Vec3::NEG_Z).length() < 1e-4);
    }

    #[test]
    fn test_eases_toward_goal_after_snap() {
        let world = CollisionWorld::new();
        let metrics = WorldMetrics::default();
        let config = CameraConfig::default();
        let mut pose = Pose::default();
        let mut state = level_state();
        let idle = InputIntent::default();

        let first = resolve_camera(&pose, &mut state, &idle, &world, &metrics, &config, 1.0 / 60.0);
        pose.position.x += 1.0;
        let second = resolve_camera(&pose, &mut state, &idle, &world, &metrics, &config, 1.0 / 60.0);
        assert!((second.position.x - first.position.x - FOLLOW_BLEND).abs() < 1e-4);

        // A teleport snaps.
        state.snap = true;
        pose.position.x += 10.0;
        let third = resolve_camera(&pose, &mut state, &idle, &world, &metrics, &config, 1.0 / 60.0);
        assert!((third.position.x - 11.0).abs() < 1e-4);
    }

    #[test]
    fn test_occlusion_pulls_camera_in() {
        let world = wall_at_z(3.0);
        let metrics = WorldMetrics::default();
        let config = CameraConfig::default();
        let pose = Pose::default();
        let mut state = level_state();

        let cam = resolve_camera(&pose, &mut state, &InputIntent::default(), &world, &metrics, &config, 1.0 / 60.0);
        assert!((cam.position.z - (3.0 - OCCLUSION_MARGIN)).abs() < 1e-4);
        // The configured distance itself is untouched.
        assert_eq!(state.distance, DEFAULT_DISTANCE);
    }

    #[test]
    fn test_occlusion_respects_clearance_floor() {
        let world = wall_at_z(0.1);
        let config = CameraConfig::default();
        let d = unoccluded_distance(&world, Vec3::ZERO, Vec3::Z, 7.0, &config);
        assert_eq!(d, CLEARANCE_FLOOR);

        let open = CollisionWorld::new();
        assert_eq!(unoccluded_distance(&open, Vec3::ZERO, Vec3::Z, 7.0, &config), 7.0);
    }

    #[test]
    fn test_first_person_locked_to_avatar() {
        let world = CollisionWorld::new();
        let metrics = WorldMetrics::default();
        let config = CameraConfig::default();
        let pose = Pose {
            yaw: 1.0,
            ..Pose::at(Vec3::new(3.0, 0.5, -2.0))
        };
        let mut state = CameraState {
            mode: ViewMode::FirstPerson,
            pitch: 0.0,
            ..default()
        };

        let look_sideways = InputIntent {
            look: Vec2::new(0.7, 0.0),
            ..default()
        };
        let cam = resolve_camera(&pose, &mut state, &look_sideways, &world, &metrics, &config, 1.0 / 60.0);
        assert!((cam.position - Vec3::new(3.0, 0.5 * EYE_HEIGHT_FACTOR, -2.0)).length() < 1e-5);
        // Horizontal look is ignored; facing follows the avatar.
        let expected = Vec3::new(-(1.0_f32).sin(), 0.0, -(1.0_f32).cos());
        assert!((cam.forward() - expected).length() < 1e-4);
        assert_eq!(state.yaw, 1.0);
    }

    #[test]
    fn test_first_person_pitch_looks_down() {
        let pose = Pose::default();
        let cam = first_person_pose(&pose, 0.5, 0.5, &CameraConfig::default());
        assert!(cam.forward().y < 0.0);
    }

    #[test]
    fn test_pitch_clamped_in_both_modes() {
        let metrics = WorldMetrics::default();
        let config = CameraConfig::default();
        let up = InputIntent {
            look: Vec2::new(0.0, -10.0),
            ..default()
        };
        let down = InputIntent {
            look: Vec2::new(0.0, 10.0),
            ..default()
        };

        for mode in [ViewMode::FirstPerson, ViewMode::ThirdPerson] {
            let (lo, hi) = config.pitch_range(mode);
            let mut state = CameraState { mode, ..default() };
            state.apply_look(&up, &metrics, &config, 0.016);
            assert_eq!(state.pitch, lo);
            state.apply_look(&down, &metrics, &config, 0.016);
            assert_eq!(state.pitch, hi);
        }
    }

    #[test]
    fn test_zoom_clamped() {
        let metrics = WorldMetrics::default();
        let config = CameraConfig::default();
        let mut state = CameraState::default();

        let zoom_out = InputIntent {
            zoom: 100.0,
            ..default()
        };
        state.apply_look(&zoom_out, &metrics, &config, 0.016);
        assert_eq!(state.distance, metrics.max_distance);

        let zoom_in = InputIntent {
            zoom: -100.0,
            ..default()
        };
        state.apply_look(&zoom_in, &metrics, &config, 0.016);
        assert_eq!(state.distance, metrics.min_distance);
    }

    #[test]
    fn test_first_person_zoom_kept_for_third_person() {
        let metrics = WorldMetrics::default();
        let config = CameraConfig::default();
        let mut state = CameraState {
            mode: ViewMode::FirstPerson,
            ..default()
        };
        let before = state.distance;

        let zoom_out = InputIntent {
            zoom: 0.5,
            ..default()
        };
        state.apply_look(&zoom_out, &metrics, &config, 0.016);
        assert!((state.distance - metrics.clamp_distance(before + 0.5)).abs() < 1e-6);

        state.apply_look(
            &InputIntent {
                zoom: 100.0,
                ..default()
            },
            &metrics,
            &config,
            0.016,
        );
        assert_eq!(state.distance, metrics.max_distance);
    }

    #[test]
    fn test_mode_switch_carries_facing_and_snaps() {
        let metrics = WorldMetrics::default();
        let config = CameraConfig::default();
        let mut pose = Pose::default();
        let mut state = CameraState {
            yaw: 2.0,
            pitch: 1.4,
            snap: false,
            ..default()
        };

        state.set_mode(ViewMode::FirstPerson, &mut pose, &metrics, &config);
        assert_eq!(pose.yaw, 2.0);
        assert!(state.snap);
        assert_eq!(state.pitch, FIRST_PERSON_PITCH_LIMIT);

        pose.yaw = 0.5;
        state.snap = false;
        state.set_mode(ViewMode::ThirdPerson, &mut pose, &metrics, &config);
        assert_eq!(state.yaw, 0.5);
        assert!(state.snap);
    }
}
