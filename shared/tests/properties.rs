//! Property tests for locomotion and camera invariants.
//!
//! Runs the shared core headless against hand-built geometry.

use bevy::prelude::*;
use proptest::prelude::*;
use roomwalk_shared::{
    camera::{resolve_camera, CameraConfig, CameraState, ViewMode},
    collision::{CollisionMesh, CollisionWorld},
    physics::{step_avatar, MotionConfig, Terrain, WALL_EPSILON},
    InputIntent, Pose, Walkthrough, WorldBounds, WorldMetrics,
};

/// Quad at x = `x` facing -X.
fn wall(x: f32) -> CollisionMesh {
    let a = Vec3::new(x, -5.0, -5.0);
    let b = Vec3::new(x, -5.0, 5.0);
    let c = Vec3::new(x, 5.0, -5.0);
    let d = Vec3::new(x, 5.0, 5.0);
    CollisionMesh::new(vec![[a, b, c], [c, b, d]], false).unwrap()
}

/// Quad at height `y` facing +Y.
fn floor(y: f32, half: f32) -> CollisionMesh {
    let a = Vec3::new(-half, y, -half);
    let b = Vec3::new(-half, y, half);
    let c = Vec3::new(half, y, -half);
    let d = Vec3::new(half, y, half);
    CollisionMesh::new(vec![[a, b, c], [c, b, d]], false).unwrap()
}

fn walk(axis: Vec2, run: bool) -> InputIntent {
    InputIntent {
        move_axis: axis,
        run,
        ..default()
    }
}

proptest! {
    #[test]
    fn free_walk_covers_speed_times_dt(
        yaw in 0.0f32..std::f32::consts::TAU,
        dt in 0.001f32..0.05,
        run in any::<bool>(),
    ) {
        let world = CollisionWorld::new();
        let metrics = WorldMetrics::default();
        let config = MotionConfig::default();
        let pose = Pose::default();

        let next = step_avatar(
            &pose,
            &walk(Vec2::Y, run),
            ViewMode::ThirdPerson,
            yaw,
            Terrain { world: &world, metrics: &metrics },
            &config,
            dt,
        );

        let moved = (next.position - pose.position).with_y(0.0).length();
        let speed = if run { config.run_speed } else { config.walk_speed };
        prop_assert!((moved - speed * dt).abs() < 1e-4);
        prop_assert!((next.position.y - metrics.radius).abs() < 1e-5);
    }

    #[test]
    fn walls_are_never_crossed(
        start_x in -4.0f32..1.0,
        ticks in 1usize..120,
        run in any::<bool>(),
    ) {
        let mut world = CollisionWorld::new();
        world.push_mesh(wall(2.0));
        let metrics = WorldMetrics::default();
        let config = MotionConfig::default();
        let mut pose = Pose::at(Vec3::new(start_x, metrics.radius, 0.0));

        for _ in 0..ticks {
            let before = pose.position.x;
            pose = step_avatar(
                &pose,
                &walk(Vec2::X, run),
                ViewMode::ThirdPerson,
                0.0,
                Terrain { world: &world, metrics: &metrics },
                &config,
                1.0 / 60.0,
            );
            prop_assert!(pose.position.x >= before - 1e-6);
            prop_assert!(pose.position.x + metrics.radius <= 2.0 - WALL_EPSILON + 1e-4);
        }
    }

    #[test]
    fn clamp_step_stays_in_range(
        origin_x in -10.0f32..1.9,
        step in 0.0f32..5.0,
        radius in 0.25f32..1.5,
    ) {
        let mut world = CollisionWorld::new();
        world.push_mesh(wall(2.0));
        let allowed = world.clamp_step(Vec3::new(origin_x, 0.0, 0.0), Vec3::X, step, radius, WALL_EPSILON);
        prop_assert!(allowed >= 0.0);
        prop_assert!(allowed <= step);
    }

    #[test]
    fn pitch_stays_clamped(
        looks in prop::collection::vec((-2.0f32..2.0, -2.0f32..2.0), 1..40),
        first_person in any::<bool>(),
    ) {
        let world = CollisionWorld::new();
        let metrics = WorldMetrics::default();
        let config = CameraConfig::default();
        let mut pose = Pose::default();
        let mut state = CameraState::default();
        if first_person {
            state.set_mode(ViewMode::FirstPerson, &mut pose, &metrics, &config);
        }
        let (min, max) = config.pitch_range(state.mode);

        for (x, y) in looks {
            let intent = InputIntent { look: Vec2::new(x, y), ..default() };
            resolve_camera(&pose, &mut state, &intent, &world, &metrics, &config, 1.0 / 60.0);
            prop_assert!(state.pitch >= min && state.pitch <= max);
            prop_assert!(state.distance >= metrics.min_distance && state.distance <= metrics.max_distance);
        }
    }

    #[test]
    fn avatar_rests_on_the_floor(
        floor_y in -3.0f32..3.0,
        drop in 0.0f32..4.0,
        x in -4.0f32..4.0,
        z in -4.0f32..4.0,
    ) {
        let mut world = CollisionWorld::new();
        world.push_mesh(floor(floor_y, 5.0));
        let metrics = WorldMetrics::default();
        let config = MotionConfig::default();
        let mut pose = Pose::at(Vec3::new(x, floor_y + metrics.radius + drop, z));

        for _ in 0..200 {
            pose = step_avatar(
                &pose,
                &InputIntent::default(),
                ViewMode::ThirdPerson,
                0.0,
                Terrain { world: &world, metrics: &metrics },
                &config,
                1.0 / 60.0,
            );
            prop_assert!(pose.position.y >= floor_y + metrics.radius - 1e-4);
        }
        prop_assert!((pose.position.y - (floor_y + metrics.radius)).abs() < 1e-4);
        prop_assert_eq!(pose.vertical_velocity, 0.0);
    }
}

fn scripted_intents() -> Vec<InputIntent> {
    (0..600)
        .map(|i| InputIntent {
            move_axis: Vec2::new(((i / 50) % 3) as f32 - 1.0, 1.0),
            run: i % 120 < 60,
            jump: i % 90 == 0,
            look: Vec2::new(0.01, if i % 200 < 100 { 0.004 } else { -0.004 }),
            zoom: if i % 150 == 0 { -0.5 } else { 0.0 },
            toggle_view: i == 300,
            ..default()
        })
        .collect()
}

fn run_session(intents: &[InputIntent]) -> Vec<(Pose, Vec3)> {
    let mut world = CollisionWorld::new();
    world.push_mesh(floor(0.0, 20.0));
    world.push_mesh(wall(6.0));
    let bounds = WorldBounds::new(Vec3::new(-20.0, -5.0, -20.0), Vec3::new(20.0, 5.0, 20.0));
    world.set_bounds(bounds);

    let mut walkthrough = Walkthrough::default();
    walkthrough.on_world_loaded(&bounds, &world);

    intents
        .iter()
        .map(|intent| {
            let report = walkthrough.step(1.0 / 60.0, intent, &world);
            (report.pose, report.camera.position)
        })
        .collect()
}

#[test]
fn test_same_inputs_same_session() {
    let intents = scripted_intents();
    let first = run_session(&intents);
    let second = run_session(&intents);
    assert_eq!(first, second, "identical input scripts diverged");
}
