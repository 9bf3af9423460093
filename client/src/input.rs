//! Keyboard and mouse input
//!
//! Held keys are written as level flags every frame; presses, drags and wheel
//! steps are accumulated into the aggregator until the frame driver samples them.

use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use roomwalk_shared::{
    input::{WHEEL_ZOOM_PER_LINE, WHEEL_ZOOM_PER_PIXEL},
    InputAggregator, InputSource, Settings,
};

use crate::states::PanelState;
use crate::ui::SettingsStorage;

/// Movement, run, jump and arrow-key look.
pub fn read_keyboard(keyboard: Res<ButtonInput<KeyCode>>, mut input: ResMut<InputAggregator>) {
    if keyboard.get_just_pressed().next().is_some() {
        input.activate(InputSource::Desktop);
    }

    let desktop = &mut input.desktop;
    desktop.forward = keyboard.pressed(KeyCode::KeyW);
    desktop.backward = keyboard.pressed(KeyCode::KeyS);
    desktop.left = keyboard.pressed(KeyCode::KeyA);
    desktop.right = keyboard.pressed(KeyCode::KeyD);
    desktop.run = keyboard.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]);
    desktop.turn_left = keyboard.pressed(KeyCode::ArrowLeft);
    desktop.turn_right = keyboard.pressed(KeyCode::ArrowRight);
    desktop.tilt_up = keyboard.pressed(KeyCode::ArrowUp);
    desktop.tilt_down = keyboard.pressed(KeyCode::ArrowDown);

    // Edge only: OS key repeat never re-triggers a jump.
    if keyboard.just_pressed(KeyCode::Space) {
        desktop.press_jump();
    }
}

/// Key reads pause while the panel is open, so a key held when it opened
/// would otherwise stay down until it closes.
pub fn release_desktop_keys(mut input: ResMut<InputAggregator>) {
    input.desktop.release_all();
}

/// Left-button drag to look, wheel to zoom.
pub fn read_mouse(
    mut mouse_motion: MessageReader<MouseMotion>,
    mut mouse_wheel: MessageReader<MouseWheel>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut input: ResMut<InputAggregator>,
) {
    let mut drag = Vec2::ZERO;
    for motion in mouse_motion.read() {
        drag += motion.delta;
    }

    let mut zoom = 0.0;
    for wheel in mouse_wheel.read() {
        // Scrolling up pulls the camera in.
        zoom -= match wheel.unit {
            MouseScrollUnit::Line => wheel.y * WHEEL_ZOOM_PER_LINE,
            MouseScrollUnit::Pixel => wheel.y * WHEEL_ZOOM_PER_PIXEL,
        };
    }

    let dragging = mouse_button.pressed(MouseButton::Left) && drag != Vec2::ZERO;
    if dragging || zoom != 0.0 || mouse_button.get_just_pressed().next().is_some() {
        input.activate(InputSource::Desktop);
    }
    if dragging {
        input.desktop.add_drag(drag);
    }
    if zoom != 0.0 {
        input.desktop.add_zoom(zoom);
    }
}

/// R respawn, V view mode, H helpers, G settings panel.
pub fn handle_command_keys(
    keyboard: Res<ButtonInput<KeyCode>>,
    panel: Res<State<PanelState>>,
    mut next_panel: ResMut<NextState<PanelState>>,
    mut input: ResMut<InputAggregator>,
    mut settings: ResMut<Settings>,
    mut storage: ResMut<SettingsStorage>,
) {
    if keyboard.just_pressed(KeyCode::KeyR) {
        input.request_respawn();
    }
    if keyboard.just_pressed(KeyCode::KeyV) {
        input.request_view_toggle();
    }
    if keyboard.just_pressed(KeyCode::KeyH) {
        settings.ui.show_helpers = !settings.ui.show_helpers;
        info!("Helpers: {}", if settings.ui.show_helpers { "on" } else { "off" });
        storage.persist(&settings);
    }
    if keyboard.just_pressed(KeyCode::KeyG) {
        next_panel.set(match panel.get() {
            PanelState::Closed => PanelState::Open,
            PanelState::Open => PanelState::Closed,
        });
    }
}
