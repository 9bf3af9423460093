//! Avatar pose and locomotion constants.

use bevy::prelude::*;
use std::f32::consts::TAU;

/// Walking speed in units/s.
pub const WALK_SPEED: f32 = 3.0;

/// Running speed (Shift or dash) in units/s.
pub const RUN_SPEED: f32 = 5.6;

/// Collision sphere radius until the room has loaded and the radius is refitted.
pub const DEFAULT_RADIUS: f32 = 0.5;

/// Arrow-key turn rate in rad/s.
pub const TURN_RATE: f32 = 2.2;

/// Arrow-key pitch rate in rad/s.
pub const TILT_RATE: f32 = 1.6;

/// The avatar's simulated state. Position is the centre of the collision sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    /// Facing angle around +Y, radians in `[0, TAU)`. Zero faces -Z.
    pub yaw: f32,
    pub vertical_velocity: f32,
}

impl Default for Pose {
    fn default() -> Self {
        Self::at(Vec3::new(0.0, DEFAULT_RADIUS, 0.0))
    }
}

impl Pose {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            yaw: 0.0,
            vertical_velocity: 0.0,
        }
    }

    /// Height of the bottom of the collision sphere.
    pub fn feet_y(&self, radius: f32) -> f32 {
        self.position.y - radius
    }

    pub fn facing(&self) -> Quat {
        Quat::from_rotation_y(self.yaw)
    }
}

/// Horizontal `(forward, right)` unit vectors for a yaw angle.
///
/// In Bevy: +X right, +Y up, -Z forward.
#[inline]
pub fn planar_basis(yaw: f32) -> (Vec3, Vec3) {
    let forward = Vec3::new(-yaw.sin(), 0.0, -yaw.cos());
    let right = Vec3::new(yaw.cos(), 0.0, -yaw.sin());
    (forward, right)
}

/// Wrap an angle into `[0, TAU)`.
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}
