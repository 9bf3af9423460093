//! Per-frame driver.
//!
//! Order per tick: clamp dt, sample intent, handle commands, locomotion,
//! camera, bookkeeping. The whole resolution runs synchronously inside one
//! call so nothing observes a half-updated avatar or camera.

use bevy::prelude::*;

use crate::{
    avatar::Pose,
    camera::{resolve_camera, CameraConfig, CameraPose, CameraState, ViewMode},
    collision::CollisionWorld,
    input::{InputAggregator, InputIntent},
    physics::{step_avatar, MotionConfig, Terrain},
    world::{WorldBounds, WorldMetrics},
};

/// Longest step the simulation will take. Longer frames (tab resumed, debugger
/// break) are shortened to this.
pub const MAX_FRAME_DT: f32 = 0.05;

/// FPS readings average over windows at least this long.
pub const FPS_WINDOW_SECS: f32 = 0.5;

/// Clamp a raw frame delta into `[0, MAX_FRAME_DT]`.
#[inline]
pub fn clamp_dt(raw_dt: f32) -> f32 {
    if raw_dt.is_finite() {
        raw_dt.clamp(0.0, MAX_FRAME_DT)
    } else {
        0.0
    }
}

/// Average of instantaneous frame rates, published once per window.
#[derive(Debug, Clone, Default)]
pub struct FpsCounter {
    rate_sum: f32,
    frames: u32,
    elapsed: f32,
    last: Option<f32>,
}

impl FpsCounter {
    /// Record one frame. Returns a fresh reading when a window closes.
    pub fn record(&mut self, dt: f32) -> Option<f32> {
        if dt <= 0.0 {
            return None;
        }
        self.rate_sum += 1.0 / dt;
        self.frames += 1;
        self.elapsed += dt;

        if self.elapsed > FPS_WINDOW_SECS {
            let fps = self.rate_sum / self.frames as f32;
            self.rate_sum = 0.0;
            self.frames = 0;
            self.elapsed = 0.0;
            self.last = Some(fps);
            return Some(fps);
        }
        None
    }

    /// Most recent published reading.
    pub fn last(&self) -> Option<f32> {
        self.last
    }
}

/// What one tick produced.
#[derive(Debug, Clone, Copy)]
pub struct FrameReport {
    /// Simulated step after clamping.
    pub dt: f32,
    pub pose: Pose,
    pub camera: CameraPose,
    pub mode: ViewMode,
    /// Set when an FPS window closed this tick.
    pub fps: Option<f32>,
    pub respawned: bool,
}

/// The avatar and camera state for one session.
#[derive(Resource, Debug, Clone)]
pub struct Walkthrough {
    pose: Pose,
    camera: CameraState,
    last_camera: Option<CameraPose>,
    metrics: WorldMetrics,
    motion: MotionConfig,
    camera_config: CameraConfig,
    fps: FpsCounter,
}

impl Default for Walkthrough {
    fn default() -> Self {
        Self::new(MotionConfig::default(), CameraConfig::default())
    }
}

impl Walkthrough {
    pub fn new(motion: MotionConfig, camera_config: CameraConfig) -> Self {
        Self {
            pose: Pose::default(),
            camera: CameraState::default(),
            last_camera: None,
            metrics: WorldMetrics::default(),
            motion,
            camera_config,
            fps: FpsCounter::default(),
        }
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn camera_state(&self) -> &CameraState {
        &self.camera
    }

    pub fn last_camera(&self) -> Option<&CameraPose> {
        self.last_camera.as_ref()
    }

    pub fn metrics(&self) -> &WorldMetrics {
        &self.metrics
    }

    pub fn mode(&self) -> ViewMode {
        self.camera.mode
    }

    pub fn fps(&self) -> Option<f32> {
        self.fps.last()
    }

    /// Run one frame: clamp, sample, resolve.
    pub fn advance(
        &mut self,
        raw_dt: f32,
        input: &mut InputAggregator,
        world: &CollisionWorld,
    ) -> FrameReport {
        let dt = clamp_dt(raw_dt);
        let intent = input.sample(dt);
        self.step(dt, &intent, world)
    }

    /// Resolve one frame from an already-sampled intent. `dt` must already be clamped.
    pub fn step(&mut self, dt: f32, intent: &InputIntent, world: &CollisionWorld) -> FrameReport {
        let respawned = intent.respawn;
        if intent.respawn {
            self.respawn(world);
        }
        if intent.toggle_view {
            self.toggle_view();
        }

        self.pose = step_avatar(
            &self.pose,
            intent,
            self.camera.mode,
            self.camera.yaw,
            Terrain {
                world,
                metrics: &self.metrics,
            },
            &self.motion,
            dt,
        );

        let camera = resolve_camera(
            &self.pose,
            &mut self.camera,
            intent,
            world,
            &self.metrics,
            &self.camera_config,
            dt,
        );
        self.last_camera = Some(camera);

        FrameReport {
            dt,
            pose: self.pose,
            camera,
            mode: self.camera.mode,
            fps: self.fps.record(dt),
            respawned,
        }
    }

    /// Fit radius, ray height and zoom range to freshly loaded bounds, then respawn.
    ///
    /// Only the first call has any effect; the radius never changes afterwards.
    pub fn on_world_loaded(&mut self, bounds: &WorldBounds, world: &CollisionWorld) -> bool {
        if self.metrics.fitted {
            warn!("World metrics already fitted; ignoring reload");
            return false;
        }
        self.metrics = WorldMetrics::from_bounds(bounds);
        self.camera.distance = self.metrics.fit_distance(self.camera.distance);
        self.camera.clamp(&self.metrics, &self.camera_config);
        info!(
            "Fitted to world: radius {:.2}, zoom {:.1}..{:.1}, clip {:.3}..{:.0}",
            self.metrics.radius,
            self.metrics.min_distance,
            self.metrics.max_distance,
            self.metrics.near,
            self.metrics.far
        );
        self.respawn(world);
        true
    }

    /// Teleport to the spawn point and snap the camera.
    pub fn respawn(&mut self, world: &CollisionWorld) {
        let spawn = spawn_point(world, &self.metrics);
        self.pose.position = spawn;
        self.pose.vertical_velocity = 0.0;
        self.camera.snap = true;
        info!("Respawned at {:.2?}", spawn);
    }

    pub fn toggle_view(&mut self) {
        let mode = self.camera.mode.toggled();
        self.camera
            .set_mode(mode, &mut self.pose, &self.metrics, &self.camera_config);
        info!("Camera mode: {}", mode.label());
    }
}

/// Standing position at the centre of the world bounds.
///
/// Before load (no bounds) this is the origin resting on the baseline ground.
/// If nothing lies under the centre, the avatar is placed at the bounds centre height.
pub fn spawn_point(world: &CollisionWorld, metrics: &WorldMetrics) -> Vec3 {
    let radius = metrics.radius;
    let Some(bounds) = world.bounds() else {
        let ground = world.ground_height_at(0.0, 0.0, metrics.ray_top_y);
        return Vec3::new(0.0, ground + radius, 0.0);
    };

    let center = bounds.center();
    let y = world
        .probe_ground(center.x, center.z, metrics.ray_top_y)
        .unwrap_or(center.y)
        + radius;
    Vec3::new(center.x, y, center.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::fixtures::{floor_at, wall_facing_neg_x};

    fn loaded_room() -> CollisionWorld {
        let mut world = CollisionWorld::new();
        world.push_mesh(floor_at(0.0, 10.0));
        world.push_mesh(wall_facing_neg_x(8.0));
        let bounds = world.geometry_bounds().unwrap();
        world.set_bounds(bounds);
        world
    }

    #[test]
    fn test_clamp_dt() {
        assert_eq!(clamp_dt(0.016), 0.016);
        assert_eq!(clamp_dt(2.0), MAX_FRAME_DT);
        assert_eq!(clamp_dt(-1.0), 0.0);
        assert_eq!(clamp_dt(f32::NAN), 0.0);
    }

    #[test]
    fn test_long_frame_integrates_clamped_dt() {
        let world = CollisionWorld::new();
        let mut walk = Walkthrough::default();
        let mut input = InputAggregator::default();
        input.desktop.forward = true;

        let report = walk.advance(2.0, &mut input, &world);
        assert_eq!(report.dt, MAX_FRAME_DT);
        let moved = (report.pose.position - Vec3::new(0.0, 0.5, 0.0)).length();
        assert!((moved - 3.0 * MAX_FRAME_DT).abs() < 1e-5);
    }

    #[test]
    fn test_fps_counter_window() {
        let mut fps = FpsCounter::default();
        let mut frames = 0;
        let reading = loop {
            frames += 1;
            if let Some(reading) = fps.record(1.0 / 60.0) {
                break reading;
            }
        };
        assert!((30..=31).contains(&frames));
        assert!((reading - 60.0).abs() < 0.1);
        assert_eq!(fps.last(), Some(reading));
        assert!(fps.record(0.0).is_none());
    }

    #[test]
    fn test_jump_once_per_press() {
        let world = CollisionWorld::new();
        let mut walk = Walkthrough::default();
        let mut input = InputAggregator::default();

        input.desktop.press_jump();
        let report = walk.advance(0.016, &mut input, &world);
        assert!(report.pose.vertical_velocity > 0.0);

        // Hold through the whole arc: no second jump once landed.
        for _ in 0..200 {
            walk.advance(0.016, &mut input, &world);
        }
        assert_eq!(walk.pose().position.y, 0.5);
        assert_eq!(walk.pose().vertical_velocity, 0.0);
    }

    #[test]
    fn test_world_load_fits_and_respawns() {
        let world = loaded_room();
        let mut walk = Walkthrough::default();
        let bounds = *world.bounds().unwrap();

        assert!(walk.on_world_loaded(&bounds, &world));
        let expected = WorldMetrics::from_bounds(&bounds);
        assert_eq!(walk.metrics().radius, expected.radius);
        let center = bounds.center();
        let pose = walk.pose();
        assert!((pose.position.x - center.x).abs() < 1e-5);
        assert!((pose.position.y - expected.radius).abs() < 1e-4);
        assert!(walk.camera_state().snap);
        let d = walk.camera_state().distance;
        assert!(d >= expected.min_distance && d <= expected.max_distance);

        // Radius is fixed from here on.
        let bigger = WorldBounds::new(Vec3::splat(-100.0), Vec3::splat(100.0));
        assert!(!walk.on_world_loaded(&bigger, &world));
        assert_eq!(walk.metrics().radius, expected.radius);
    }

    #[test]
    fn test_respawn_command_snaps_camera() {
        let world = CollisionWorld::new();
        let mut walk = Walkthrough::default();
        let mut input = InputAggregator::default();

        input.desktop.right = true;
        for _ in 0..10 {
            walk.advance(0.05, &mut input, &world);
        }
        assert!(walk.pose().position.x > 1.0);

        input.desktop.right = false;
        input.request_respawn();
        let report = walk.advance(0.016, &mut input, &world);
        assert!(report.respawned);
        assert!(report.pose.position.x.abs() < 1e-5);
        let target = report.pose.position + Vec3::Y * (0.5 * 0.8);
        let expected = target
            + crate::camera::orbit_direction(walk.camera_state().yaw, walk.camera_state().pitch)
                * walk.camera_state().distance;
        assert!((report.camera.position - expected).length() < 1e-4);
    }

    #[test]
    fn test_view_toggle_command() {
        let world = CollisionWorld::new();
        let mut walk = Walkthrough::default();
        let mut input = InputAggregator::default();
        assert_eq!(walk.mode(), ViewMode::ThirdPerson);

        input.request_view_toggle();
        let report = walk.advance(0.016, &mut input, &world);
        assert_eq!(report.mode, ViewMode::FirstPerson);
        assert!((report.camera.position.y - 0.5 * crate::camera::EYE_HEIGHT_FACTOR).abs() < 1e-4);
    }

    #[test]
    fn test_spawn_point_without_ground_under_center() {
        let mut world = CollisionWorld::new();
        world.push_mesh(wall_facing_neg_x(8.0));
        world.set_bounds(world.geometry_bounds().unwrap());
        let metrics = WorldMetrics::default();

        let spawn = spawn_point(&world, &metrics);
        assert_eq!(spawn, Vec3::new(8.0, 0.0 + metrics.radius, 0.0));
    }
}
