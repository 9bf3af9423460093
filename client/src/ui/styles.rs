//! Shared UI styles - light overlay panels over the room

use bevy::prelude::*;

/// Translucent panel behind HUD text and the settings panel
pub const PANEL_BACKGROUND: Color = Color::srgba(0.07, 0.09, 0.12, 0.72);

/// Button colors
pub const BUTTON_NORMAL: Color = Color::srgb(0.16, 0.19, 0.24);
pub const BUTTON_HOVERED: Color = Color::srgb(0.24, 0.29, 0.36);
pub const BUTTON_PRESSED: Color = Color::srgb(0.20, 0.62, 0.47);

/// Accent for the panel title (matches the helper gizmo green)
pub const ACCENT_COLOR: Color = Color::srgb(0.20, 0.83, 0.60);

/// Text colors
pub const TEXT_COLOR: Color = Color::srgb(0.93, 0.95, 0.97);
pub const TEXT_MUTED: Color = Color::srgb(0.60, 0.65, 0.72);

/// Settings row button
pub fn button_style() -> Node {
    Node {
        width: Val::Px(260.0),
        height: Val::Px(38.0),
        justify_content: JustifyContent::Center,
        align_items: AlignItems::Center,
        margin: UiRect::all(Val::Px(4.0)),
        ..default()
    }
}

/// Small square button (FOV -/+)
pub fn small_button_style() -> Node {
    Node {
        width: Val::Px(38.0),
        height: Val::Px(38.0),
        justify_content: JustifyContent::Center,
        align_items: AlignItems::Center,
        margin: UiRect::all(Val::Px(4.0)),
        ..default()
    }
}

pub fn button_text_style() -> TextFont {
    TextFont {
        font_size: 17.0,
        ..default()
    }
}

pub fn title_text_style() -> TextFont {
    TextFont {
        font_size: 28.0,
        ..default()
    }
}

/// HUD overlay text
pub fn hud_text_style() -> TextFont {
    TextFont {
        font_size: 14.0,
        ..default()
    }
}
