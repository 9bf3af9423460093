//! UI module

pub mod hud;
pub mod settings_panel;
pub mod styles;

pub use hud::HudPlugin;
pub use settings_panel::{SettingsPanelPlugin, SettingsStorage};
