use std::env;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

pub(crate) const CONFIG_ENV_VAR: &str = "TOROID_DEMO_CONFIG";
pub(crate) const RENDER_FPS_ENV_VAR: &str = "TOROID_RENDER_FPS";

pub(crate) type ConfigResult<T> = Result<T, String>;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct DemoConfig {
    pub(crate) window_title: String,
    pub(crate) window_width: u32,
    pub(crate) window_height: u32,
    pub(crate) max_render_fps: Option<u32>,
    pub(crate) show_hit_overlay: bool,
    pub(crate) windows: Vec<WindowLayout>,
    pub(crate) buttons: Vec<ButtonLayout>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct WindowLayout {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) width: f32,
    pub(crate) height: f32,
    #[serde(default = "default_window_rgb")]
    pub(crate) rgb: [u8; 3],
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ButtonLayout {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) width: f32,
    pub(crate) height: f32,
}

fn default_window_rgb() -> [u8; 3] {
    [70, 86, 120]
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            window_title: "toroid desktop".to_string(),
            window_width: 960,
            window_height: 600,
            max_render_fps: Some(60),
            show_hit_overlay: false,
            windows: vec![
                WindowLayout {
                    x: 80.0,
                    y: 70.0,
                    width: 280.0,
                    height: 200.0,
                    rgb: default_window_rgb(),
                },
                WindowLayout {
                    x: 260.0,
                    y: 180.0,
                    width: 320.0,
                    height: 220.0,
                    rgb: [110, 72, 96],
                },
            ],
            buttons: vec![
                ButtonLayout {
                    x: 640.0,
                    y: 80.0,
                    width: 120.0,
                    height: 40.0,
                },
                ButtonLayout {
                    x: 640.0,
                    y: 140.0,
                    width: 120.0,
                    height: 40.0,
                },
            ],
        }
    }
}

impl DemoConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.window_width == 0 || self.window_height == 0 {
            return Err(format!(
                "validation failed at window size: expected non-zero, got {}x{}",
                self.window_width, self.window_height
            ));
        }
        for (index, window) in self.windows.iter().enumerate() {
            if window.width <= 0.0 || window.height <= 0.0 {
                return Err(format!(
                    "validation failed at windows[{index}]: expected positive size, got {}x{}",
                    window.width, window.height
                ));
            }
        }
        for (index, button) in self.buttons.iter().enumerate() {
            if button.width <= 0.0 || button.height <= 0.0 {
                return Err(format!(
                    "validation failed at buttons[{index}]: expected positive size, got {}x{}",
                    button.width, button.height
                ));
            }
        }
        Ok(())
    }
}

pub(crate) fn parse_demo_config_json(raw: &str) -> ConfigResult<DemoConfig> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let config = match serde_path_to_error::deserialize::<_, DemoConfig>(&mut deserializer) {
        Ok(config) => config,
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            return if path.is_empty() || path == "." {
                Err(format!("parse demo config: {source}"))
            } else {
                Err(format!("parse demo config at {path}: {source}"))
            };
        }
    };
    config.validate()?;
    Ok(config)
}

pub(crate) fn load_demo_config_file(path: &Path) -> ConfigResult<DemoConfig> {
    let raw = fs::read_to_string(path)
        .map_err(|error| format!("read demo config '{}': {error}", path.display()))?;
    parse_demo_config_json(&raw)
}

/// Config named by [`CONFIG_ENV_VAR`], or the built-in desktop when unset or
/// unreadable.
pub(crate) fn resolve_demo_config() -> DemoConfig {
    let path = match env::var(CONFIG_ENV_VAR) {
        Ok(path) => path,
        Err(env::VarError::NotPresent) => return DemoConfig::default(),
        Err(error) => {
            warn!(
                env_var = CONFIG_ENV_VAR,
                error = %error,
                "unable to read config env var; using defaults"
            );
            return DemoConfig::default();
        }
    };
    match load_demo_config_file(Path::new(&path)) {
        Ok(config) => {
            info!(path = path.as_str(), "demo_config_loaded");
            config
        }
        Err(error) => {
            warn!(path = path.as_str(), error = %error, "demo_config_invalid; using defaults");
            DemoConfig::default()
        }
    }
}

pub(crate) fn resolve_render_fps(config_cap: Option<u32>) -> Option<u32> {
    parse_render_fps_override(env::var(RENDER_FPS_ENV_VAR), config_cap)
}

/// `0` or `off` disables the cap.
fn parse_render_fps_override(
    value: Result<String, env::VarError>,
    config_cap: Option<u32>,
) -> Option<u32> {
    match value {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.eq_ignore_ascii_case("off") {
                return None;
            }
            match trimmed.parse::<u32>() {
                Ok(0) => None,
                Ok(fps) => Some(fps),
                Err(_) => {
                    warn!(
                        env_var = RENDER_FPS_ENV_VAR,
                        value = value.as_str(),
                        "invalid render fps env var value; falling back to config"
                    );
                    config_cap
                }
            }
        }
        Err(env::VarError::NotPresent) => config_cap,
        Err(err) => {
            warn!(
                env_var = RENDER_FPS_ENV_VAR,
                error = %err,
                "unable to read render fps env var; falling back to config"
            );
            config_cap
        }
    }
}
