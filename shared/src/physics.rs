//! Avatar locomotion.
//!
//! Goals:
//! - One vertical degree of freedom (gravity, jump, ground snap) plus free horizontal motion
//! - Sphere-vs-mesh only: a ray in the move direction stops the avatar short of walls
//! - Deterministic: the same pose, intent, geometry and dt always give the same result
//!
//! The avatar stops at walls instead of sliding along them.

use bevy::prelude::*;

use crate::{
    avatar::{planar_basis, wrap_angle, Pose, RUN_SPEED, TURN_RATE, WALK_SPEED},
    camera::ViewMode,
    collision::CollisionWorld,
    input::InputIntent,
    world::WorldMetrics,
};

/// Gravity in units/s^2 (negative Y).
pub const GRAVITY: f32 = -18.0;

/// Jump velocity in units/s (upward).
pub const JUMP_VELOCITY: f32 = 8.0;

/// Gap kept between the sphere surface and a wall.
pub const WALL_EPSILON: f32 = 1e-2;

/// Tolerance for "resting on the ground".
pub const GROUND_EPSILON: f32 = 1e-3;

/// Locomotion tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionConfig {
    pub walk_speed: f32,
    pub run_speed: f32,
    pub gravity: f32,
    pub jump_velocity: f32,
    pub wall_epsilon: f32,
    pub ground_epsilon: f32,
    pub turn_rate: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            walk_speed: WALK_SPEED,
            run_speed: RUN_SPEED,
            gravity: GRAVITY,
            jump_velocity: JUMP_VELOCITY,
            wall_epsilon: WALL_EPSILON,
            ground_epsilon: GROUND_EPSILON,
            turn_rate: TURN_RATE,
        }
    }
}

/// Where the avatar is stepping: static geometry plus the scale it was fitted to.
#[derive(Clone, Copy)]
pub struct Terrain<'a> {
    pub world: &'a CollisionWorld,
    pub metrics: &'a WorldMetrics,
}

/// Step the avatar one tick.
///
/// - Builds the move basis from the avatar yaw (first person) or `camera_yaw` (third person)
/// - Clamps the horizontal step against walls
/// - Jumps if resting on the ground, applies gravity, snaps to the ground
/// - Turns the avatar from the turn axis (first person only)
pub fn step_avatar(
    pose: &Pose,
    intent: &InputIntent,
    mode: ViewMode,
    camera_yaw: f32,
    terrain: Terrain<'_>,
    config: &MotionConfig,
    dt: f32,
) -> Pose {
    let radius = terrain.metrics.radius;
    let mut next = *pose;

    // --- Desired horizontal movement ---
    let basis_yaw = match mode {
        ViewMode::FirstPerson => pose.yaw,
        ViewMode::ThirdPerson => camera_yaw,
    };
    let move_dir = move_direction(intent.move_axis, basis_yaw);

    if move_dir != Vec3::ZERO {
        let speed = if intent.run {
            config.run_speed
        } else {
            config.walk_speed
        };
        let step = speed * dt;
        let allowed =
            terrain
                .world
                .clamp_step(pose.position, move_dir, step, radius, config.wall_epsilon);
        next.position += move_dir * allowed;
    }

    // --- Vertical ---
    let ground_y = terrain.world.ground_height_at(
        next.position.x,
        next.position.z,
        terrain.metrics.ray_top_y,
    );
    let (y, vy) = resolve_vertical(
        next.position.y,
        pose.vertical_velocity,
        ground_y,
        radius,
        intent.jump,
        config,
        dt,
    );
    next.position.y = y;
    next.vertical_velocity = vy;

    // --- Facing ---
    if mode == ViewMode::FirstPerson && intent.turn != 0.0 {
        next.yaw = wrap_angle(pose.yaw + intent.turn * config.turn_rate * dt);
    }

    next
}

/// Unit horizontal direction for a move axis, or zero when idle.
///
/// Diagonals are normalized so they are no faster than straight moves.
pub fn move_direction(move_axis: Vec2, yaw: f32) -> Vec3 {
    let (forward, right) = planar_basis(yaw);
    (right * move_axis.x + forward * move_axis.y).normalize_or_zero()
}

/// `true` when the sphere rests on the ground within the configured tolerance.
#[inline]
pub fn is_on_ground(y: f32, ground_y: f32, radius: f32, epsilon: f32) -> bool {
    (y - (ground_y + radius)).abs() < epsilon
}

/// Jump, gravity, integration and ground snap for one tick. Returns `(y, vertical_velocity)`.
///
/// Gravity applies even while grounded; the snap cancels it, which keeps the
/// grounded state stable from one tick to the next.
pub fn resolve_vertical(
    y: f32,
    vertical_velocity: f32,
    ground_y: f32,
    radius: f32,
    jump: bool,
    config: &MotionConfig,
    dt: f32,
) -> (f32, f32) {
    let mut vy = vertical_velocity;
    if jump && is_on_ground(y, ground_y, radius, config.ground_epsilon) {
        vy = config.jump_velocity;
    }

    vy += config.gravity * dt;
    let mut y = y + vy * dt;

    let rest_y = ground_y + radius;
    if y < rest_y {
        y = rest_y;
        vy = 0.0;
    }
    (y, vy)
}
