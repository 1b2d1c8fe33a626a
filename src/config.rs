//! Application configuration
//!
//! Supports multiple profiles (debug, release) with different settings.
//! Every interaction setting has a default, so a profile file only needs the
//! values it changes.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::inertia::InertiaOptions;

/// Window configuration for the demo host
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Window width
    pub width: f64,
    /// Window height
    pub height: f64,
    /// Whether the window should be resizable
    pub resizable: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Map Gestures".to_string(),
            width: 1024.0,
            height: 768.0,
            resizable: true,
        }
    }
}

/// Where two-finger zoom and rotate stay anchored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinchAnchor {
    /// Between the fingers
    #[default]
    Pinch,
    /// At the viewport center
    Center,
}

/// Two-finger zoom and rotate settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TouchZoomRotateConfig {
    pub enabled: bool,
    pub around: PinchAnchor,
}

impl Default for TouchZoomRotateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            around: PinchAnchor::Pinch,
        }
    }
}

/// Which built-in gestures are switched on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerToggles {
    /// Mouse and touch panning
    pub drag_pan: bool,
    /// Mouse rotate and pitch
    pub drag_rotate: bool,
    pub touch_zoom_rotate: TouchZoomRotateConfig,
    pub touch_pitch: bool,
    /// Require two fingers to pan so one finger can scroll the page
    pub cooperative_gestures: bool,
}

impl Default for HandlerToggles {
    fn default() -> Self {
        Self {
            drag_pan: true,
            drag_rotate: true,
            touch_zoom_rotate: TouchZoomRotateConfig::default(),
            touch_pitch: true,
            cooperative_gestures: false,
        }
    }
}

/// Gesture interaction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Pixels the pointer may move before a press becomes a drag
    pub click_tolerance: f64,
    /// Degrees within which the map snaps back to north
    pub bearing_snap: f64,
    pub handlers: HandlerToggles,
    /// Momentum parameters, forwarded to the inertia tracker
    pub inertia: InertiaOptions,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            click_tolerance: 3.0,
            bearing_snap: 7.0,
            handlers: HandlerToggles::default(),
            inertia: InertiaOptions::default(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// The active profile (debug, release, etc.)
    pub profile: String,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub interaction: InteractionConfig,
}

impl AppConfig {
    /// Loads configuration based on the specified profile
    ///
    /// Profiles are loaded from config files in the following order:
    /// 1. config/{profile}.toml (profile-specific configuration)
    /// 2. Environment variables with prefix MAP_ (e.g., MAP_INTERACTION__CLICK_TOLERANCE=5)
    ///
    /// Config files are searched for in:
    /// 1. Next to the executable (target/debug/config or target/release/config)
    /// 2. In the current directory (./config)
    pub fn load(profile: &str) -> Result<Self, ConfigError> {
        let config_dir = Self::find_config_dir().unwrap_or_else(|| PathBuf::from("config"));
        Self::load_from(&config_dir, profile)
    }

    /// Loads `{profile}.toml` from `config_dir`, then environment overrides
    ///
    /// A missing profile file is not an error; defaults apply.
    pub fn load_from(config_dir: &Path, profile: &str) -> Result<Self, ConfigError> {
        let profile_path = config_dir.join(profile);
        let config = Config::builder()
            .add_source(File::from(profile_path.as_path()).required(false))
            // Use __ as separator for nested fields (e.g., MAP_WINDOW__WIDTH)
            .add_source(
                Environment::with_prefix("MAP")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override("profile", profile)?
            .build()?;

        config.try_deserialize()
    }

    /// Finds the config directory by searching in multiple locations
    fn find_config_dir() -> Option<PathBuf> {
        if let Ok(exe_path) = std::env::current_exe()
            && let Some(exe_dir) = exe_path.parent()
        {
            let config_dir = exe_dir.join("config");
            if config_dir.exists() {
                return Some(config_dir);
            }
        }

        let cwd_config = PathBuf::from("config");
        cwd_config.exists().then_some(cwd_config)
    }

    /// Loads configuration using the MAP_PROFILE environment variable,
    /// defaulting to "release"
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let profile = std::env::var("MAP_PROFILE").unwrap_or_else(|_| "release".to_string());
        Self::load(&profile)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: "release".to_string(),
            window: WindowConfig::default(),
            interaction: InteractionConfig::default(),
        }
    }
}
