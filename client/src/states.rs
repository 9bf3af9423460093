//! Client UI state machine

use bevy::prelude::*;

/// Whether the settings panel is up.
#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PanelState {
    #[default]
    Closed,
    Open,
}
