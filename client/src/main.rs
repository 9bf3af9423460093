//! Room walkthrough client - loads the room, drives the avatar and camera, draws the HUD
//!
//! Bevy 0.17

mod camera;
mod input;
mod states;
mod systems;
mod touch;
mod ui;

use bevy::asset::AssetPlugin;
use bevy::prelude::*;
use bevy::window::WindowResolution;
use roomwalk_shared::{settings, CollisionWorld, InputAggregator, Settings, Walkthrough};
use states::PanelState;

/// Get the asset path - for bundled macOS apps, use path relative to executable
fn get_asset_path() -> String {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let bundled_assets = exe_dir.join("assets");
            if bundled_assets.exists() {
                info!("Using bundled assets at: {:?}", bundled_assets);
                return bundled_assets.to_string_lossy().to_string();
            }
        }
    }
    // Development layout
    "assets".to_string()
}

fn main() {
    let asset_path = get_asset_path();

    // Settings are read before the app exists: antialiasing is only applied at startup.
    let store = settings::platform_store();
    let user_settings = Settings::load_or_default(store.as_ref());

    let mut app = App::new();

    app.add_plugins(
        DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Room Walkthrough".to_string(),
                    resolution: WindowResolution::new(1280, 720),
                    // Let the browser canvas follow the page size.
                    fit_canvas_to_parent: true,
                    ..default()
                }),
                ..default()
            })
            .set(AssetPlugin {
                file_path: asset_path,
                ..default()
            }),
    );

    app.init_state::<PanelState>();

    // Core state
    app.insert_resource(user_settings);
    app.insert_resource(ui::SettingsStorage(store));
    app.init_resource::<InputAggregator>();
    app.init_resource::<CollisionWorld>();
    app.init_resource::<Walkthrough>();

    app.add_plugins(ui::HudPlugin);
    app.add_plugins(ui::SettingsPanelPlugin);
    app.add_plugins(touch::TouchControlsPlugin);

    app.add_systems(
        Startup,
        (
            camera::spawn_camera,
            systems::setup_lighting,
            systems::spawn_environment,
            systems::spawn_avatar,
            systems::start_room_load,
        ),
    );

    // Desktop input only while the settings panel is closed; the panel owns the mouse otherwise.
    app.add_systems(
        Update,
        (input::read_keyboard, input::read_mouse)
            .run_if(in_state(PanelState::Closed))
            .before(systems::poll_room_load),
    );
    app.add_systems(Update, input::handle_command_keys.before(systems::poll_room_load));
    app.add_systems(OnEnter(PanelState::Open), input::release_desktop_keys);

    // ORDER MATTERS: colliders are appended before the frame resolves, transforms are
    // written after, so nothing reads a half-updated avatar or camera.
    app.add_systems(
        Update,
        (
            systems::poll_room_load,
            systems::drive_frame,
            (
                camera::apply_camera_pose,
                camera::apply_projection,
                systems::sync_avatar,
                systems::update_avatar_visibility,
            ),
        )
            .chain(),
    );

    app.add_systems(
        Update,
        (systems::apply_graphics_settings, systems::draw_helpers).after(systems::drive_frame),
    );

    info!("Starting room walkthrough");
    app.run();
}
