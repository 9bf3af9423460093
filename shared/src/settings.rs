//! User settings and their persistence.
//!
//! Settings are one JSON object stored under [`SETTINGS_KEY`]. Reading is
//! forgiving: every missing field takes its default, unknown fields are
//! ignored, a field with a bad value is logged and keeps its default, and a
//! blob that is not JSON at all is logged and replaced by defaults.
//! None of this reaches the movement or camera core.

use bevy::prelude::*;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;

/// Storage key for the settings blob.
pub const SETTINGS_KEY: &str = "roomwalk.settings";

/// Vertical field of view range accepted when applying settings (degrees).
pub const MIN_FOV_DEGREES: f32 = 30.0;
pub const MAX_FOV_DEGREES: f32 = 110.0;

/// Errors from reading or writing settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("settings I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings JSON is malformed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("settings storage unavailable: {0}")]
    Storage(String),
}

/// Render quality preset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Low,
    Medium,
    #[default]
    High,
}

impl Quality {
    pub const ALL: [Quality; 3] = [Quality::Low, Quality::Medium, Quality::High];

    /// Directional shadow map resolution.
    pub fn shadow_map_size(self) -> usize {
        match self {
            Quality::Low => 1024,
            Quality::Medium => 2048,
            Quality::High => 4096,
        }
    }

    /// Upper bound on the window scale factor used for rendering.
    pub fn pixel_density_cap(self) -> f32 {
        match self {
            Quality::Low => 1.0,
            Quality::Medium => 1.5,
            Quality::High => 2.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Quality::Low => "Low",
            Quality::Medium => "Medium",
            Quality::High => "High",
        }
    }

    /// Next preset, wrapping from high back to low.
    pub fn cycled(self) -> Self {
        match self {
            Quality::Low => Quality::Medium,
            Quality::Medium => Quality::High,
            Quality::High => Quality::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphicsSettings {
    pub quality: Quality,
    pub shadows: bool,
    /// MSAA. Only read at startup.
    pub antialiasing: bool,
    /// Vertical field of view in degrees.
    pub fov: f32,
}

impl Default for GraphicsSettings {
    fn default() -> Self {
        Self {
            quality: Quality::High,
            shadows: true,
            antialiasing: true,
            fov: 60.0,
        }
    }
}

impl GraphicsSettings {
    /// Field of view in radians, clamped to the supported range.
    pub fn fov_radians(&self) -> f32 {
        let fov = if self.fov.is_finite() { self.fov } else { 60.0 };
        fov.clamp(MIN_FOV_DEGREES, MAX_FOV_DEGREES).to_radians()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    #[serde(rename = "showFPS")]
    pub show_fps: bool,
    #[serde(rename = "showControls")]
    pub show_controls: bool,
    #[serde(rename = "showHelpers")]
    pub show_helpers: bool,
    #[serde(rename = "showStatus")]
    pub show_status: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            show_fps: true,
            show_controls: true,
            show_helpers: true,
            show_status: true,
        }
    }
}

/// All user-facing settings.
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub graphics: GraphicsSettings,
    pub ui: UiSettings,
}

impl Settings {
    /// Parse a stored blob, merging each recognized field onto the defaults.
    ///
    /// Only invalid JSON is an error. Missing fields, unknown fields and
    /// fields with the wrong type or value leave the default in place.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let root: Value = serde_json::from_str(json)?;
        let mut settings = Self::default();
        let Some(root) = as_section(&root, "settings") else {
            return Ok(settings);
        };

        if let Some(graphics) = root.get("graphics").and_then(|v| as_section(v, "graphics")) {
            let g = &mut settings.graphics;
            merge_field(graphics, "graphics", "quality", &mut g.quality);
            merge_field(graphics, "graphics", "shadows", &mut g.shadows);
            merge_field(graphics, "graphics", "antialiasing", &mut g.antialiasing);
            merge_field(graphics, "graphics", "fov", &mut g.fov);
        }
        if let Some(ui) = root.get("ui").and_then(|v| as_section(v, "ui")) {
            let u = &mut settings.ui;
            merge_field(ui, "ui", "showFPS", &mut u.show_fps);
            merge_field(ui, "ui", "showControls", &mut u.show_controls);
            merge_field(ui, "ui", "showHelpers", &mut u.show_helpers);
            merge_field(ui, "ui", "showStatus", &mut u.show_status);
        }
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Load from `store`, falling back to defaults on any failure.
    pub fn load_or_default(store: &dyn SettingsStore) -> Self {
        match store.read(SETTINGS_KEY) {
            Ok(Some(json)) => match Self::from_json(&json) {
                Ok(settings) => {
                    info!("Loaded settings from {}", store.describe());
                    settings
                }
                Err(e) => {
                    warn!("Ignoring stored settings: {}", e);
                    Self::default()
                }
            },
            Ok(None) => Self::default(),
            Err(e) => {
                warn!("Could not read settings: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &mut dyn SettingsStore) -> Result<(), SettingsError> {
        let json = self.to_json()?;
        store.write(SETTINGS_KEY, &json)?;
        info!("Saved settings to {} ({} bytes)", store.describe(), json.len());
        Ok(())
    }
}

fn as_section<'a>(value: &'a Value, name: &str) -> Option<&'a Map<String, Value>> {
    let section = value.as_object();
    if section.is_none() {
        warn!("Ignoring settings section '{}': not an object", name);
    }
    section
}

/// Overwrite `target` with `section[key]` if present and valid.
fn merge_field<T: DeserializeOwned>(
    section: &Map<String, Value>,
    section_name: &str,
    key: &str,
    target: &mut T,
) {
    let Some(value) = section.get(key) else {
        return;
    };
    match T::deserialize(value) {
        Ok(parsed) => *target = parsed,
        Err(e) => warn!("Ignoring setting {}.{}: {}", section_name, key, e),
    }
}

/// Key/value storage for settings blobs.
pub trait SettingsStore: Send + Sync {
    /// `Ok(None)` when nothing has been stored under `key` yet.
    fn read(&self, key: &str) -> Result<Option<String>, SettingsError>;

    fn write(&mut self, key: &str, value: &str) -> Result<(), SettingsError>;

    /// Human-readable location for log lines.
    fn describe(&self) -> String;
}

/// In-process store, for tests and platforms without persistence.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl SettingsStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, SettingsError> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// One `<key>.json` file per key in a directory.
///
/// Writes go to a temp file and are renamed into place so a crash never leaves
/// a half-written blob.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SettingsStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, SettingsError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(json) => Ok(Some(json)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        std::fs::create_dir_all(&self.dir)?;
        let final_path = self.path_for(key);
        let temp_path = self.dir.join(format!("{key}.tmp"));
        std::fs::write(&temp_path, value)?;
        std::fs::rename(&temp_path, &final_path)?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.dir.display().to_string()
    }
}

/// Browser `localStorage`.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorageStore;

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    fn storage() -> Result<web_sys::Storage, SettingsError> {
        web_sys::window()
            .ok_or_else(|| SettingsError::Storage("no window".to_string()))?
            .local_storage()
            .map_err(|e| SettingsError::Storage(format!("{e:?}")))?
            .ok_or_else(|| SettingsError::Storage("localStorage disabled".to_string()))
    }
}

#[cfg(target_arch = "wasm32")]
impl SettingsStore for LocalStorageStore {
    fn read(&self, key: &str) -> Result<Option<String>, SettingsError> {
        Self::storage()?
            .get_item(key)
            .map_err(|e| SettingsError::Storage(format!("{e:?}")))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| SettingsError::Storage(format!("{e:?}")))
    }

    fn describe(&self) -> String {
        "localStorage".to_string()
    }
}

/// The persistent store for the current platform.
pub fn platform_store() -> Box<dyn SettingsStore> {
    #[cfg(target_arch = "wasm32")]
    {
        Box::new(LocalStorageStore)
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let dir = std::env::var_os("ROOMWALK_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("config"));
        Box::new(FileStore::new(dir))
    }
}
