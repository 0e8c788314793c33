use std::{env, path::PathBuf};

use super::schema::Settings;

/// Configuration loading helpers.
///
/// `Settings::load` reads an optional config file, then environment variables
/// (prefix `SONICLOUD__`) on top, and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("SONICLOUD")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.audio.initial_volume) {
            return Err("audio.initial_volume must be within 0.0..=1.0".to_string());
        }
        if !(self.audio.volume_step > 0.0 && self.audio.volume_step <= 1.0) {
            return Err("audio.volume_step must be within (0.0, 1.0]".to_string());
        }
        if self.audio.tick_ms == 0 {
            return Err("audio.tick_ms must be >= 1".to_string());
        }
        if self.audio.fetch_timeout_secs == 0 {
            return Err("audio.fetch_timeout_secs must be >= 1".to_string());
        }
        if self.upload.max_audio_bytes == 0 || self.upload.max_image_bytes == 0 {
            return Err("upload size caps must be > 0".to_string());
        }
        Ok(())
    }

    /// Catalog location: the configured path or the XDG data default.
    pub fn catalog_path(&self) -> Option<PathBuf> {
        self.library
            .catalog_path
            .clone()
            .or_else(default_catalog_path)
    }
}

/// Resolve the config path from `SONICLOUD_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("SONICLOUD_CONFIG_PATH") {
        let p = PathBuf::from(p);
        return Some(p);
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/sonicloud/config.toml`
/// or `~/.config/sonicloud/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    xdg_dir("XDG_CONFIG_HOME", ".config").map(|d| d.join("sonicloud").join("config.toml"))
}

/// `$XDG_DATA_HOME/sonicloud/catalog.toml` or `~/.local/share/sonicloud/catalog.toml`.
pub fn default_catalog_path() -> Option<PathBuf> {
    xdg_dir("XDG_DATA_HOME", ".local/share").map(|d| d.join("sonicloud").join("catalog.toml"))
}

/// Resolve the log file from `SONICLOUD_LOG_PATH`, else
/// `$XDG_STATE_HOME/sonicloud/sonicloud.log` or `~/.local/state/sonicloud/sonicloud.log`.
pub fn resolve_log_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("SONICLOUD_LOG_PATH") {
        return Some(PathBuf::from(p));
    }
    xdg_dir("XDG_STATE_HOME", ".local/state").map(|d| d.join("sonicloud").join("sonicloud.log"))
}

fn xdg_dir(var: &str, home_fallback: &str) -> Option<PathBuf> {
    if let Some(xdg) = env::var_os(var) {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(home_fallback))
    }
}
