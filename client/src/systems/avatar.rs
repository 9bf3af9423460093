//! Avatar visuals
//!
//! A red sphere following the simulated pose, hidden in first person, plus
//! the H-toggled debug helpers.

use bevy::prelude::*;
use roomwalk_shared::{CollisionWorld, Settings, ViewMode, Walkthrough};

/// The avatar sphere. Its mesh has unit radius and is scaled to the collision radius.
#[derive(Component)]
pub struct AvatarModel;

/// Length of the avatar axes helper relative to the radius.
const AXES_SCALE: f32 = 2.4;

pub fn spawn_avatar(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    walkthrough: Res<Walkthrough>,
) {
    let pose = walkthrough.pose();
    let radius = walkthrough.metrics().radius;

    commands
        .spawn((
            AvatarModel,
            Mesh3d(meshes.add(Sphere::new(1.0).mesh().uv(32, 16))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: Color::srgb(1.0, 0.0, 0.0),
                emissive: LinearRgba::rgb(0.13, 0.0, 0.0),
                perceptual_roughness: 0.5,
                metallic: 0.0,
                ..default()
            })),
            Transform::from_translation(pose.position).with_scale(Vec3::splat(radius)),
            Visibility::Inherited,
        ))
        .with_children(|avatar| {
            // Beacon lamp so the avatar stays visible in dark corners.
            avatar.spawn((
                PointLight {
                    color: Color::srgb(1.0, 0.267, 0.267),
                    intensity: 60_000.0,
                    range: 10.0,
                    shadows_enabled: false,
                    ..default()
                },
                Transform::default(),
            ));
        });
}

/// Place and scale the sphere from the simulated pose.
pub fn sync_avatar(
    walkthrough: Res<Walkthrough>,
    mut avatar: Query<&mut Transform, With<AvatarModel>>,
) {
    let Ok(mut transform) = avatar.single_mut() else {
        return;
    };
    let pose = walkthrough.pose();
    transform.translation = pose.position;
    transform.rotation = pose.facing();
    // The radius is refitted once on load.
    transform.scale = Vec3::splat(walkthrough.metrics().radius);
}

/// Hide the sphere in first person so it doesn't block the view.
pub fn update_avatar_visibility(
    walkthrough: Res<Walkthrough>,
    mut last_mode: Local<Option<ViewMode>>,
    mut avatar: Query<&mut Visibility, With<AvatarModel>>,
) {
    let mode = walkthrough.mode();
    if *last_mode == Some(mode) {
        return;
    }
    let Ok(mut visibility) = avatar.single_mut() else {
        return;
    };
    *last_mode = Some(mode);

    *visibility = match mode {
        ViewMode::FirstPerson => Visibility::Hidden,
        ViewMode::ThirdPerson => Visibility::Inherited,
    };
}

/// World bounds box and avatar axes.
pub fn draw_helpers(
    settings: Res<Settings>,
    world: Res<CollisionWorld>,
    walkthrough: Res<Walkthrough>,
    mut gizmos: Gizmos,
) {
    if !settings.ui.show_helpers {
        return;
    }

    if let Some(bounds) = world.bounds() {
        gizmos.cuboid(
            Transform::from_translation(bounds.center()).with_scale(bounds.size()),
            Color::srgb(0.0, 1.0, 0.533),
        );
    }

    let pose = walkthrough.pose();
    let length = walkthrough.metrics().radius * AXES_SCALE;
    let (forward, right) = roomwalk_shared::avatar::planar_basis(pose.yaw);
    let origin = pose.position;
    gizmos.line(origin, origin + right * length, Color::srgb(1.0, 0.2, 0.2));
    gizmos.line(origin, origin + Vec3::Y * length, Color::srgb(0.2, 1.0, 0.2));
    gizmos.line(origin, origin + forward * length, Color::srgb(0.2, 0.4, 1.0));
}
