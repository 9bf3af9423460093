//! Settings panel (G to toggle)
//!
//! Every change is applied immediately and written through the settings store.

use bevy::prelude::*;
use roomwalk_shared::{
    settings::{MAX_FOV_DEGREES, MIN_FOV_DEGREES},
    Settings, SettingsStore,
};

use super::styles::*;
use crate::states::PanelState;

/// FOV change per -/+ press, degrees.
const FOV_STEP: f32 = 5.0;

pub struct SettingsPanelPlugin;

impl Plugin for SettingsPanelPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<StartupAntialiasing>();
        app.add_systems(OnEnter(PanelState::Open), spawn_settings_panel);
        app.add_systems(OnExit(PanelState::Open), despawn_settings_panel);
        app.add_systems(
            Update,
            (
                button_interactions,
                handle_panel_actions,
                refresh_labels,
                handle_escape_key,
            )
                .chain()
                .run_if(in_state(PanelState::Open)),
        );
    }
}

/// Where settings are persisted.
#[derive(Resource)]
pub struct SettingsStorage(pub Box<dyn SettingsStore>);

impl SettingsStorage {
    /// Save, logging instead of failing: a read-only store must not break the panel.
    pub fn persist(&mut self, settings: &Settings) {
        if let Err(e) = settings.save(self.0.as_mut()) {
            warn!("Could not save settings: {}", e);
        }
    }
}

/// Antialiasing as it was when the camera spawned.
#[derive(Resource)]
struct StartupAntialiasing(bool);

impl FromWorld for StartupAntialiasing {
    fn from_world(world: &mut World) -> Self {
        Self(
            world
                .get_resource::<Settings>()
                .is_some_and(|settings| settings.graphics.antialiasing),
        )
    }
}

/// Marker for the panel root
#[derive(Component)]
struct SettingsPanelRoot;

#[derive(Component)]
struct FovLabel;

/// Panel button actions
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
enum PanelButton {
    Quality,
    Shadows,
    Antialiasing,
    FovDown,
    FovUp,
    ShowFps,
    ShowControls,
    ShowHelpers,
    ShowStatus,
    Close,
}

const TOGGLE_ROWS: [PanelButton; 7] = [
    PanelButton::Quality,
    PanelButton::Shadows,
    PanelButton::Antialiasing,
    PanelButton::ShowFps,
    PanelButton::ShowControls,
    PanelButton::ShowHelpers,
    PanelButton::ShowStatus,
];

fn on_off(flag: bool) -> &'static str {
    if flag {
        "On"
    } else {
        "Off"
    }
}

/// Apply a button press. Returns `true` if a setting changed.
fn apply_action(settings: &mut Settings, action: PanelButton) -> bool {
    let graphics = &mut settings.graphics;
    let ui = &mut settings.ui;
    match action {
        PanelButton::Quality => graphics.quality = graphics.quality.cycled(),
        PanelButton::Shadows => graphics.shadows = !graphics.shadows,
        PanelButton::Antialiasing => graphics.antialiasing = !graphics.antialiasing,
        PanelButton::FovDown | PanelButton::FovUp => {
            let step = if action == PanelButton::FovUp {
                FOV_STEP
            } else {
                -FOV_STEP
            };
            let fov = (graphics.fov + step).clamp(MIN_FOV_DEGREES, MAX_FOV_DEGREES);
            if fov == graphics.fov {
                return false;
            }
            graphics.fov = fov;
        }
        PanelButton::ShowFps => ui.show_fps = !ui.show_fps,
        PanelButton::ShowControls => ui.show_controls = !ui.show_controls,
        PanelButton::ShowHelpers => ui.show_helpers = !ui.show_helpers,
        PanelButton::ShowStatus => ui.show_status = !ui.show_status,
        PanelButton::Close => return false,
    }
    true
}

/// Button caption for the current settings.
fn label(settings: &Settings, action: PanelButton, startup_aa: bool) -> String {
    let graphics = &settings.graphics;
    let ui = &settings.ui;
    match action {
        PanelButton::Quality => format!("Quality: {}", graphics.quality.label()),
        PanelButton::Shadows => format!("Shadows: {}", on_off(graphics.shadows)),
        PanelButton::Antialiasing => {
            let restart = if graphics.antialiasing != startup_aa {
                " (restart)"
            } else {
                ""
            };
            format!("Antialiasing: {}{}", on_off(graphics.antialiasing), restart)
        }
        PanelButton::FovDown => "-".to_string(),
        PanelButton::FovUp => "+".to_string(),
        PanelButton::ShowFps => format!("Show FPS: {}", on_off(ui.show_fps)),
        PanelButton::ShowControls => format!("Show Controls: {}", on_off(ui.show_controls)),
        PanelButton::ShowHelpers => format!("Show Helpers: {}", on_off(ui.show_helpers)),
        PanelButton::ShowStatus => format!("Show Status: {}", on_off(ui.show_status)),
        PanelButton::Close => "CLOSE".to_string(),
    }
}

fn fov_label(settings: &Settings) -> String {
    format!("FOV {:.0}", settings.graphics.fov)
}

fn spawn_settings_panel(
    mut commands: Commands,
    settings: Res<Settings>,
    startup_aa: Res<StartupAntialiasing>,
) {
    commands
        .spawn((
            SettingsPanelRoot,
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.35)),
        ))
        .with_children(|parent| {
            parent
                .spawn((
                    Node {
                        flex_direction: FlexDirection::Column,
                        align_items: AlignItems::Center,
                        padding: UiRect::all(Val::Px(20.0)),
                        ..default()
                    },
                    BackgroundColor(PANEL_BACKGROUND),
                    BorderRadius::all(Val::Px(8.0)),
                ))
                .with_children(|panel| {
                    panel.spawn((
                        Text::new("SETTINGS"),
                        title_text_style(),
                        TextColor(ACCENT_COLOR),
                        Node {
                            margin: UiRect::bottom(Val::Px(14.0)),
                            ..default()
                        },
                    ));

                    for action in TOGGLE_ROWS {
                        spawn_button(panel, &label(&settings, action, startup_aa.0), action, button_style());
                    }

                    // FOV row: - [value] +
                    panel
                        .spawn(Node {
                            flex_direction: FlexDirection::Row,
                            align_items: AlignItems::Center,
                            ..default()
                        })
                        .with_children(|row| {
                            spawn_button(row, "-", PanelButton::FovDown, small_button_style());
                            row.spawn((
                                FovLabel,
                                Text::new(fov_label(&settings)),
                                button_text_style(),
                                TextColor(TEXT_COLOR),
                                Node {
                                    width: Val::Px(160.0),
                                    justify_content: JustifyContent::Center,
                                    ..default()
                                },
                            ));
                            spawn_button(row, "+", PanelButton::FovUp, small_button_style());
                        });

                    spawn_button(panel, "CLOSE", PanelButton::Close, button_style());

                    panel.spawn((
                        Text::new("Press G or ESC to close"),
                        TextFont {
                            font_size: 13.0,
                            ..default()
                        },
                        TextColor(TEXT_MUTED),
                        Node {
                            margin: UiRect::top(Val::Px(10.0)),
                            ..default()
                        },
                    ));
                });
        });
}

fn spawn_button(parent: &mut ChildSpawnerCommands<'_>, text: &str, action: PanelButton, node: Node) {
    parent
        .spawn((
            Button,
            action,
            node,
            BackgroundColor(BUTTON_NORMAL),
            BorderRadius::all(Val::Px(4.0)),
        ))
        .with_children(|btn| {
            btn.spawn((Text::new(text), button_text_style(), TextColor(TEXT_COLOR)));
        });
}

fn despawn_settings_panel(mut commands: Commands, query: Query<Entity, With<SettingsPanelRoot>>) {
    for entity in query.iter() {
        commands.entity(entity).despawn();
    }
}

fn button_interactions(
    mut buttons: Query<(&Interaction, &mut BackgroundColor), (Changed<Interaction>, With<Button>)>,
) {
    for (interaction, mut bg_color) in buttons.iter_mut() {
        *bg_color = match interaction {
            Interaction::Pressed => BackgroundColor(BUTTON_PRESSED),
            Interaction::Hovered => BackgroundColor(BUTTON_HOVERED),
            Interaction::None => BackgroundColor(BUTTON_NORMAL),
        };
    }
}

fn handle_panel_actions(
    buttons: Query<(&Interaction, &PanelButton), Changed<Interaction>>,
    mut settings: ResMut<Settings>,
    mut storage: ResMut<SettingsStorage>,
    mut next_state: ResMut<NextState<PanelState>>,
) {
    for (interaction, action) in buttons.iter() {
        if *interaction != Interaction::Pressed {
            continue;
        }
        if *action == PanelButton::Close {
            next_state.set(PanelState::Closed);
            continue;
        }
        // Mutate a copy so change detection only fires on a real change.
        let mut updated = settings.clone();
        if apply_action(&mut updated, *action) {
            *settings = updated;
            storage.persist(&settings);
        }
    }
}

fn refresh_labels(
    settings: Res<Settings>,
    startup_aa: Res<StartupAntialiasing>,
    buttons: Query<(&PanelButton, &Children)>,
    mut texts: Query<&mut Text, Without<FovLabel>>,
    mut fov: Query<&mut Text, With<FovLabel>>,
) {
    if !settings.is_changed() {
        return;
    }
    for (action, children) in buttons.iter() {
        for child in children.iter() {
            if let Ok(mut text) = texts.get_mut(child) {
                text.0 = label(&settings, *action, startup_aa.0);
            }
        }
    }
    for mut text in fov.iter_mut() {
        text.0 = fov_label(&settings);
    }
}

fn handle_escape_key(keyboard: Res<ButtonInput<KeyCode>>, mut next_state: ResMut<NextState<PanelState>>) {
    if keyboard.just_pressed(KeyCode::Escape) {
        next_state.set(PanelState::Closed);
    }
}
