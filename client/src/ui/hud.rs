//! HUD: load status, FPS readout and controls help
//!
//! Each element follows its `ui.show*` setting.

use bevy::prelude::*;
use roomwalk_shared::{Settings, Walkthrough};

use super::styles::*;
use crate::systems::{poll_room_load, RoomLoad};

pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_hud);
        app.add_systems(
            Update,
            (update_status_text, update_fps_text, apply_hud_visibility).after(poll_room_load),
        );
    }
}

#[derive(Component)]
struct StatusText;

#[derive(Component)]
struct FpsText;

#[derive(Component)]
struct ControlsHelp;

const CONTROLS_HELP: &str = "\
WASD move · Shift run · Space jump
Drag look · Wheel zoom · Arrows turn/tilt
V view · R respawn · H helpers · G settings";

fn spawn_hud(mut commands: Commands) {
    // Top-left column: status line, then controls help.
    commands
        .spawn(Node {
            position_type: PositionType::Absolute,
            left: Val::Px(10.0),
            top: Val::Px(10.0),
            flex_direction: FlexDirection::Column,
            row_gap: Val::Px(6.0),
            ..default()
        })
        .with_children(|parent| {
            parent.spawn((
                StatusText,
                Text::new("starting…"),
                hud_text_style(),
                TextColor(TEXT_COLOR),
                Node {
                    padding: UiRect::axes(Val::Px(8.0), Val::Px(4.0)),
                    ..default()
                },
                BackgroundColor(PANEL_BACKGROUND),
                BorderRadius::all(Val::Px(4.0)),
            ));
            parent.spawn((
                ControlsHelp,
                Text::new(CONTROLS_HELP),
                hud_text_style(),
                TextColor(TEXT_MUTED),
                Node {
                    padding: UiRect::axes(Val::Px(8.0), Val::Px(4.0)),
                    ..default()
                },
                BackgroundColor(PANEL_BACKGROUND),
                BorderRadius::all(Val::Px(4.0)),
            ));
        });

    commands.spawn((
        FpsText,
        Text::new("FPS: --"),
        hud_text_style(),
        TextColor(Color::srgb(0.2, 1.0, 0.2)),
        Node {
            position_type: PositionType::Absolute,
            right: Val::Px(10.0),
            top: Val::Px(10.0),
            padding: UiRect::axes(Val::Px(8.0), Val::Px(4.0)),
            ..default()
        },
        BackgroundColor(PANEL_BACKGROUND),
        BorderRadius::all(Val::Px(4.0)),
    ));
}

fn update_status_text(
    room: Option<Res<RoomLoad>>,
    walkthrough: Res<Walkthrough>,
    mut status: Query<&mut Text, With<StatusText>>,
) {
    let Ok(mut text) = status.single_mut() else {
        return;
    };
    let load = room
        .map(|room| room.status.describe())
        .unwrap_or_else(|| "waiting for assets…".to_string());
    let line = format!("{load} · {}", walkthrough.mode().label());
    if text.0 != line {
        text.0 = line;
    }
}

/// Refreshes whenever a new FPS window closes.
fn update_fps_text(
    walkthrough: Res<Walkthrough>,
    mut shown: Local<Option<f32>>,
    mut fps_text: Query<(&mut Text, &mut TextColor), With<FpsText>>,
) {
    let Some(fps) = walkthrough.fps() else {
        return;
    };
    if *shown == Some(fps) {
        return;
    }
    let Ok((mut text, mut color)) = fps_text.single_mut() else {
        return;
    };
    *shown = Some(fps);

    text.0 = format!("FPS: {:.0}", fps);
    *color = if fps >= 55.0 {
        TextColor(Color::srgb(0.2, 1.0, 0.2))
    } else if fps >= 30.0 {
        TextColor(Color::srgb(1.0, 0.8, 0.0))
    } else {
        TextColor(Color::srgb(1.0, 0.2, 0.2))
    };
}

fn apply_hud_visibility(
    settings: Res<Settings>,
    mut status: Query<&mut Visibility, (With<StatusText>, Without<FpsText>, Without<ControlsHelp>)>,
    mut fps: Query<&mut Visibility, (With<FpsText>, Without<StatusText>, Without<ControlsHelp>)>,
    mut controls: Query<&mut Visibility, (With<ControlsHelp>, Without<StatusText>, Without<FpsText>)>,
) {
    if !settings.is_changed() {
        return;
    }
    let shown = |flag: bool| if flag { Visibility::Inherited } else { Visibility::Hidden };

    for mut visibility in status.iter_mut() {
        *visibility = shown(settings.ui.show_status);
    }
    for mut visibility in fps.iter_mut() {
        *visibility = shown(settings.ui.show_fps);
    }
    for mut visibility in controls.iter_mut() {
        *visibility = shown(settings.ui.show_controls);
    }
}
