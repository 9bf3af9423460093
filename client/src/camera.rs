//! The view camera: spawned once, then placed from the resolved camera pose every frame.

use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::prelude::*;
use bevy::render::view::Msaa;
use roomwalk_shared::{Settings, Walkthrough};

/// Background behind the room.
const SKY_COLOR: Color = Color::srgb(0.875, 0.906, 0.945);

/// Spawn the 3D camera. MSAA is fixed here; changing it later needs a restart.
pub fn spawn_camera(mut commands: Commands, settings: Res<Settings>, walkthrough: Res<Walkthrough>) {
    commands.insert_resource(ClearColor(SKY_COLOR));

    let metrics = walkthrough.metrics();
    let msaa = if settings.graphics.antialiasing {
        Msaa::Sample4
    } else {
        Msaa::Off
    };

    commands.spawn((
        Camera3d::default(),
        msaa,
        Tonemapping::AcesFitted,
        Projection::Perspective(PerspectiveProjection {
            fov: settings.graphics.fov_radians(),
            near: metrics.near,
            far: metrics.far,
            ..default()
        }),
        Transform::from_xyz(0.0, 3.0, 8.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    info!(
        "Camera spawned (fov {:.0}, msaa {})",
        settings.graphics.fov_radians().to_degrees(),
        if settings.graphics.antialiasing { "on" } else { "off" }
    );
}

/// Copy this frame's resolved camera pose onto the camera transform.
pub fn apply_camera_pose(
    walkthrough: Res<Walkthrough>,
    mut camera_query: Query<&mut Transform, With<Camera3d>>,
) {
    let Some(pose) = walkthrough.last_camera() else {
        return;
    };
    let Ok(mut camera_transform) = camera_query.single_mut() else {
        return;
    };
    *camera_transform = pose.transform();
}

/// Keep field of view and clip planes in line with settings and world scale.
pub fn apply_projection(
    walkthrough: Res<Walkthrough>,
    settings: Res<Settings>,
    mut camera_query: Query<&mut Projection, With<Camera3d>>,
) {
    let Ok(mut projection) = camera_query.single_mut() else {
        return;
    };
    let Projection::Perspective(current) = &*projection else {
        return;
    };

    let metrics = walkthrough.metrics();
    let fov = settings.graphics.fov_radians();
    if current.fov == fov && current.near == metrics.near && current.far == metrics.far {
        return;
    }
    let updated = PerspectiveProjection {
        fov,
        near: metrics.near,
        far: metrics.far,
        ..current.clone()
    };
    *projection = Projection::Perspective(updated);
}
