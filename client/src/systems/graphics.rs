//! Graphics settings application
//!
//! Quality, shadows and pixel density follow the settings resource live.
//! Antialiasing is read once when the camera spawns.

use bevy::light::DirectionalLightShadowMap;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use roomwalk_shared::Settings;

use super::scene::KeyLight;

pub fn apply_graphics_settings(
    settings: Res<Settings>,
    mut shadow_map: ResMut<DirectionalLightShadowMap>,
    mut lights: Query<&mut DirectionalLight, With<KeyLight>>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
) {
    if !settings.is_changed() {
        return;
    }
    let graphics = &settings.graphics;

    let size = graphics.quality.shadow_map_size();
    if shadow_map.size != size {
        shadow_map.size = size;
    }

    for mut light in lights.iter_mut() {
        if light.shadows_enabled != graphics.shadows {
            light.shadows_enabled = graphics.shadows;
        }
    }

    // Cap the render scale on high-density screens.
    if let Ok(mut window) = windows.single_mut() {
        let native = window.resolution.base_scale_factor();
        let capped = native.min(graphics.quality.pixel_density_cap());
        if window.resolution.scale_factor() != capped {
            window.resolution.set_scale_factor_override(Some(capped));
        }
    }

    debug!(
        "Graphics: quality {}, shadows {}, fov {:.0}",
        graphics.quality.label(),
        graphics.shadows,
        graphics.fov_radians().to_degrees()
    );
}
