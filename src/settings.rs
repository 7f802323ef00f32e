//! Application settings storage
//!
//! Stores the remote store endpoint, its API key and an optional cache-db
//! path override in a JSON file in the app data directory.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

/// Global settings instance
static SETTINGS: RwLock<Option<Settings>> = RwLock::new(None);

/// Path to config file (set during init)
static CONFIG_PATH: RwLock<Option<PathBuf>> = RwLock::new(None);

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Remote store API root, e.g. "https://db.example.com/rest/v1".
    /// None = no remote configured; the pickers run cache-only.
    #[serde(default)]
    pub remote_url: Option<String>,
    #[serde(default)]
    pub remote_api_key: Option<String>,
    /// Override for the local cache database location
    #[serde(default)]
    pub custom_cache_path: Option<String>,
}

impl Settings {
    /// Load settings from disk or create default
    fn load(path: &PathBuf) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
                Err(_) => Settings::default(),
            }
        } else {
            Settings::default()
        }
    }

    /// Save settings to disk
    fn save(&self, path: &PathBuf) -> Result<(), String> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        fs::write(path, content).map_err(|e| format!("Failed to write settings: {}", e))?;

        Ok(())
    }
}

/// Initialize settings with the app data directory
pub fn init(app_data_dir: PathBuf) {
    let config_path = app_data_dir.join("settings.json");
    let settings = Settings::load(&config_path);

    *CONFIG_PATH.write().unwrap() = Some(config_path);
    *SETTINGS.write().unwrap() = Some(settings);
}

/// Get the remote store URL (env var takes precedence)
pub fn get_remote_url() -> Option<String> {
    if let Ok(url) = std::env::var("WORKPLAN_REMOTE_URL") {
        if !url.is_empty() {
            return Some(url);
        }
    }

    let guard = SETTINGS.read().ok()?;
    let settings = guard.as_ref()?;
    settings.remote_url.clone()
}

/// Get the remote store API key (env var takes precedence)
pub fn get_remote_api_key() -> Option<String> {
    if let Ok(key) = std::env::var("WORKPLAN_REMOTE_API_KEY") {
        if !key.is_empty() {
            return Some(key);
        }
    }

    let guard = SETTINGS.read().ok()?;
    let settings = guard.as_ref()?;
    settings.remote_api_key.clone()
}

/// Where the local cache database lives
pub fn get_cache_path(app_data_dir: &std::path::Path) -> PathBuf {
    let custom = SETTINGS
        .read()
        .ok()
        .and_then(|guard| guard.as_ref().and_then(|s| s.custom_cache_path.clone()));
    match custom {
        Some(path) => PathBuf::from(path),
        None => app_data_dir.join("workplan-cache.db"),
    }
}

/// Set and save the remote store URL
pub fn set_remote_url(url: String) -> Result<(), String> {
    update(|settings| {
        settings.remote_url = if url.is_empty() { None } else { Some(url.clone()) };
    })
}

/// Set and save the remote store API key
pub fn set_remote_api_key(key: String) -> Result<(), String> {
    update(|settings| {
        settings.remote_api_key = if key.is_empty() { None } else { Some(key.clone()) };
    })
}

fn update(f: impl Fn(&mut Settings)) -> Result<(), String> {
    let mut settings_guard = SETTINGS
        .write()
        .map_err(|_| "Failed to acquire settings lock")?;

    let settings = settings_guard.get_or_insert_with(Settings::default);
    f(settings);

    let config_path = CONFIG_PATH
        .read()
        .map_err(|_| "Failed to acquire config path lock")?
        .clone()
        .ok_or("Settings not initialized")?;

    settings.save(&config_path)?;
    Ok(())
}
