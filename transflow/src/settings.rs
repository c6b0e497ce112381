use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Duration;
use tracing::warn;

use crate::network::{DEFAULT_LLM_ENDPOINT, DEFAULT_LLM_MODEL};
use crate::scheduler::{
    DEFAULT_MOVE_DEBOUNCE_MS, DEFAULT_SCROLL_DEBOUNCE_MS, DEFAULT_TEXT_DEBOUNCE_MS,
    SchedulerConfig,
};
use crate::segment::{LanguageProfile, normalize_language_code};
use crate::translation::DEFAULT_TRANSLATION_TIMEOUT_SECONDS;

const CONFIG_DIR_NAME: &str = "transflow";
const CONFIG_FILE_NAME: &str = "config.json";
const DEFAULT_SOURCE_LANGUAGE: &str = "zh";
const DEFAULT_TARGET_LANGUAGE: &str = "en";
const DEFAULT_UNDERLINE_COLOR: &str = "#FF9500";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
pub const MIN_POLL_INTERVAL_MS: u64 = 100;
pub const MAX_POLL_INTERVAL_MS: u64 = 5_000;
pub const MIN_DEBOUNCE_MS: u64 = 100;
pub const MAX_DEBOUNCE_MS: u64 = 10_000;
pub const MIN_TRANSLATION_TIMEOUT_SECONDS: u64 = 1;
pub const MAX_TRANSLATION_TIMEOUT_SECONDS: u64 = 120;
const ENV_LLM_ENDPOINT: &str = "TRANSFLOW_LLM_ENDPOINT";
const ENV_LLM_MODEL: &str = "TRANSFLOW_LLM_MODEL";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("no user configuration directory is available")]
    NoConfigDir,
    #[error("failed to access settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{0}")]
    Validation(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionMode {
    #[default]
    Hover,
    Click,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(default = "default_source_language")]
    pub source_language: String,
    #[serde(default = "default_target_language")]
    pub target_language: String,
    #[serde(default)]
    pub interaction_mode: InteractionMode,
    #[serde(default = "default_track_window_position")]
    pub track_window_position: bool,
    #[serde(default = "default_underline_color")]
    pub underline_color: String,
    #[serde(default)]
    pub skip_list: Vec<String>,
    #[serde(default = "default_translator_endpoint")]
    pub translator_endpoint: String,
    #[serde(default = "default_translator_model")]
    pub translator_model: String,
    #[serde(default = "default_translation_timeout_secs")]
    pub translation_timeout_secs: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_text_debounce_ms")]
    pub text_debounce_ms: u64,
    #[serde(default = "default_move_debounce_ms")]
    pub move_debounce_ms: u64,
    #[serde(default = "default_scroll_debounce_ms")]
    pub scroll_debounce_ms: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            source_language: default_source_language(),
            target_language: default_target_language(),
            interaction_mode: InteractionMode::default(),
            track_window_position: default_track_window_position(),
            underline_color: default_underline_color(),
            skip_list: Vec::new(),
            translator_endpoint: default_translator_endpoint(),
            translator_model: default_translator_model(),
            translation_timeout_secs: default_translation_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            text_debounce_ms: default_text_debounce_ms(),
            move_debounce_ms: default_move_debounce_ms(),
            scroll_debounce_ms: default_scroll_debounce_ms(),
        }
    }
}

impl AppSettings {
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            text_debounce: Duration::from_millis(self.text_debounce_ms),
            move_debounce: Duration::from_millis(self.move_debounce_ms),
            scroll_debounce: Duration::from_millis(self.scroll_debounce_ms),
            track_window_position: self.track_window_position,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn translation_timeout(&self) -> Duration {
        Duration::from_secs(self.translation_timeout_secs)
    }

    pub fn is_skipped(&self, app_id: &str) -> bool {
        self.skip_list
            .iter()
            .any(|skipped| skipped.eq_ignore_ascii_case(app_id))
    }

    pub fn source_profile(&self) -> &'static LanguageProfile {
        LanguageProfile::for_code(&self.source_language).unwrap_or_else(|| {
            warn!(
                source_language = self.source_language.as_str(),
                "no language profile for source language; using English"
            );
            LanguageProfile::fallback()
        })
    }
}

fn default_source_language() -> String {
    DEFAULT_SOURCE_LANGUAGE.to_string()
}

fn default_target_language() -> String {
    DEFAULT_TARGET_LANGUAGE.to_string()
}

fn default_track_window_position() -> bool {
    true
}

fn default_underline_color() -> String {
    DEFAULT_UNDERLINE_COLOR.to_string()
}

fn default_translator_endpoint() -> String {
    DEFAULT_LLM_ENDPOINT.to_string()
}

fn default_translator_model() -> String {
    DEFAULT_LLM_MODEL.to_string()
}

fn default_translation_timeout_secs() -> u64 {
    DEFAULT_TRANSLATION_TIMEOUT_SECONDS
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_text_debounce_ms() -> u64 {
    DEFAULT_TEXT_DEBOUNCE_MS
}

fn default_move_debounce_ms() -> u64 {
    DEFAULT_MOVE_DEBOUNCE_MS
}

fn default_scroll_debounce_ms() -> u64 {
    DEFAULT_SCROLL_DEBOUNCE_MS
}

pub fn config_path() -> Result<PathBuf, SettingsError> {
    let config_dir = dirs::config_dir().ok_or(SettingsError::NoConfigDir)?;
    Ok(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

pub fn load_settings() -> Result<AppSettings, SettingsError> {
    load_settings_from(&config_path()?)
}

pub fn load_settings_from(path: &Path) -> Result<AppSettings, SettingsError> {
    let settings = if path.exists() {
        let content = fs::read_to_string(path)?;
        serde_json::from_str::<AppSettings>(&content)?
    } else {
        AppSettings::default()
    };

    let mut settings = normalize_loaded_settings(settings);
    apply_environment_overrides(&mut settings);
    Ok(settings)
}

pub fn save_settings(settings: AppSettings) -> Result<AppSettings, SettingsError> {
    save_settings_to(&config_path()?, settings)
}

pub fn save_settings_to(path: &Path, settings: AppSettings) -> Result<AppSettings, SettingsError> {
    let validated = validate_settings(settings)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let serialized = serde_json::to_string_pretty(&validated)?;
    fs::write(path, serialized)?;
    Ok(validated)
}

fn apply_environment_overrides(settings: &mut AppSettings) {
    if let Some(endpoint) = read_environment(ENV_LLM_ENDPOINT) {
        settings.translator_endpoint = endpoint;
    }
    if let Some(model) = read_environment(ENV_LLM_MODEL) {
        settings.translator_model = model;
    }
}

fn read_environment(key_name: &str) -> Option<String> {
    let value = std::env::var(key_name).ok()?;
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn normalize_loaded_settings(mut settings: AppSettings) -> AppSettings {
    settings.source_language = normalize_language_code(&settings.source_language);
    settings.target_language = normalize_language_code(&settings.target_language);
    settings.skip_list = normalize_skip_list(&settings.skip_list);
    settings.translator_endpoint = settings.translator_endpoint.trim().to_string();
    settings.translator_model = settings.translator_model.trim().to_string();

    if !is_hex_color(&settings.underline_color) {
        warn!(
            underline_color = settings.underline_color.as_str(),
            "loaded underline color is invalid; resetting to default"
        );
        settings.underline_color = default_underline_color();
    }
    if settings.translator_endpoint.is_empty() {
        settings.translator_endpoint = default_translator_endpoint();
    }
    if settings.translator_model.is_empty() {
        settings.translator_model = default_translator_model();
    }

    reset_out_of_range(
        &mut settings.translation_timeout_secs,
        MIN_TRANSLATION_TIMEOUT_SECONDS..=MAX_TRANSLATION_TIMEOUT_SECONDS,
        DEFAULT_TRANSLATION_TIMEOUT_SECONDS,
        "translation timeout",
    );
    reset_out_of_range(
        &mut settings.poll_interval_ms,
        MIN_POLL_INTERVAL_MS..=MAX_POLL_INTERVAL_MS,
        DEFAULT_POLL_INTERVAL_MS,
        "poll interval",
    );
    reset_out_of_range(
        &mut settings.text_debounce_ms,
        MIN_DEBOUNCE_MS..=MAX_DEBOUNCE_MS,
        DEFAULT_TEXT_DEBOUNCE_MS,
        "text debounce",
    );
    reset_out_of_range(
        &mut settings.move_debounce_ms,
        MIN_DEBOUNCE_MS..=MAX_DEBOUNCE_MS,
        DEFAULT_MOVE_DEBOUNCE_MS,
        "window move debounce",
    );
    reset_out_of_range(
        &mut settings.scroll_debounce_ms,
        MIN_DEBOUNCE_MS..=MAX_DEBOUNCE_MS,
        DEFAULT_SCROLL_DEBOUNCE_MS,
        "scroll debounce",
    );

    settings
}

fn reset_out_of_range(
    value: &mut u64,
    range: std::ops::RangeInclusive<u64>,
    default: u64,
    label: &str,
) {
    if !range.contains(value) {
        warn!(
            value = *value,
            setting = label,
            "loaded value is out of range; resetting to default"
        );
        *value = default;
    }
}

pub fn validate_settings(mut settings: AppSettings) -> Result<AppSettings, SettingsError> {
    settings.source_language = normalize_language_code(&settings.source_language);
    if LanguageProfile::for_code(&settings.source_language).is_none() {
        let supported = LanguageProfile::builtin()
            .iter()
            .map(|profile| profile.code())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(SettingsError::Validation(format!(
            "sourceLanguage must be one of: {supported}"
        )));
    }

    settings.target_language = normalize_language_code(&settings.target_language);
    if settings.target_language.is_empty() {
        return Err(SettingsError::Validation(
            "targetLanguage cannot be empty".to_string(),
        ));
    }

    if !is_hex_color(&settings.underline_color) {
        return Err(SettingsError::Validation(
            "underlineColor must be a #RRGGBB hex color".to_string(),
        ));
    }

    settings.translator_endpoint = settings.translator_endpoint.trim().to_string();
    if !(settings.translator_endpoint.starts_with("http://")
        || settings.translator_endpoint.starts_with("https://"))
    {
        return Err(SettingsError::Validation(
            "translatorEndpoint must start with http:// or https://".to_string(),
        ));
    }
    settings.translator_model = settings.translator_model.trim().to_string();
    if settings.translator_model.is_empty() {
        return Err(SettingsError::Validation(
            "translatorModel cannot be empty".to_string(),
        ));
    }

    check_range(
        settings.translation_timeout_secs,
        MIN_TRANSLATION_TIMEOUT_SECONDS..=MAX_TRANSLATION_TIMEOUT_SECONDS,
        "translationTimeoutSecs",
    )?;
    check_range(
        settings.poll_interval_ms,
        MIN_POLL_INTERVAL_MS..=MAX_POLL_INTERVAL_MS,
        "pollIntervalMs",
    )?;
    for (value, name) in [
        (settings.text_debounce_ms, "textDebounceMs"),
        (settings.move_debounce_ms, "moveDebounceMs"),
        (settings.scroll_debounce_ms, "scrollDebounceMs"),
    ] {
        check_range(value, MIN_DEBOUNCE_MS..=MAX_DEBOUNCE_MS, name)?;
    }

    settings.skip_list = normalize_skip_list(&settings.skip_list);
    Ok(settings)
}

fn check_range(
    value: u64,
    range: std::ops::RangeInclusive<u64>,
    name: &str,
) -> Result<(), SettingsError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(SettingsError::Validation(format!(
            "{name} must be between {} and {}",
            range.start(),
            range.end()
        )))
    }
}

fn normalize_skip_list(skip_list: &[String]) -> Vec<String> {
    let mut normalized = skip_list
        .iter()
        .map(|app_id| app_id.trim().to_string())
        .filter(|app_id| !app_id.is_empty())
        .collect::<Vec<_>>();
    normalized.sort_by_key(|app_id| app_id.to_lowercase());
    normalized.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
    normalized
}

fn is_hex_color(value: &str) -> bool {
    let Some(hex) = value.strip_prefix('#') else {
        return false;
    };
    hex.len() == 6 && hex.chars().all(|ch| ch.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!(
                "transflow-settings-{}-{}",
                std::process::id(),
                crate::utils::now_epoch_ms()
            ))
            .join(name)
    }

    #[test]
    fn missing_fields_take_defaults() {
        let parsed: AppSettings =
            serde_json::from_str(r#"{"sourceLanguage":"ja","interactionMode":"click"}"#)
                .expect("partial settings should parse");
        assert_eq!(parsed.source_language, "ja");
        assert_eq!(parsed.interaction_mode, InteractionMode::Click);
        assert_eq!(parsed.text_debounce_ms, DEFAULT_TEXT_DEBOUNCE_MS);
        assert!(parsed.track_window_position);
    }

    #[test]
    fn loading_normalizes_aliases_and_resets_out_of_range_values() {
        let settings = normalize_loaded_settings(AppSettings {
            source_language: "Chinese".to_string(),
            underline_color: "orange".to_string(),
            move_debounce_ms: 50_000,
            skip_list: vec![" com.apple.Terminal ".into(), "com.apple.terminal".into(), "".into()],
            ..AppSettings::default()
        });
        assert_eq!(settings.source_language, "zh");
        assert_eq!(settings.underline_color, DEFAULT_UNDERLINE_COLOR);
        assert_eq!(settings.move_debounce_ms, DEFAULT_MOVE_DEBOUNCE_MS);
        assert_eq!(settings.skip_list.len(), 1);
        assert!(settings.is_skipped("COM.APPLE.TERMINAL"));
    }

    #[test]
    fn validation_rejects_unknown_source_language_and_bad_ranges() {
        let unknown = validate_settings(AppSettings {
            source_language: "klingon".to_string(),
            ..AppSettings::default()
        });
        assert!(matches!(
            unknown,
            Err(SettingsError::Validation(message)) if message.contains("sourceLanguage")
        ));

        let too_fast = validate_settings(AppSettings {
            poll_interval_ms: 10,
            ..AppSettings::default()
        });
        assert!(matches!(
            too_fast,
            Err(SettingsError::Validation(message)) if message.contains("pollIntervalMs")
        ));
    }

    #[test]
    fn save_then_load_preserves_values() {
        let path = temp_path("config.json");
        let saved = save_settings_to(
            &path,
            AppSettings {
                target_language: "fr".to_string(),
                interaction_mode: InteractionMode::Click,
                ..AppSettings::default()
            },
        )
        .expect("settings should save");
        let loaded = load_settings_from(&path).expect("settings should load");
        assert_eq!(loaded.target_language, saved.target_language);
        assert_eq!(loaded.interaction_mode, InteractionMode::Click);
        if let Some(dir) = path.parent() {
            let _ = fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn scheduler_config_mirrors_debounce_settings() {
        let config = AppSettings {
            scroll_debounce_ms: 750,
            track_window_position: false,
            ..AppSettings::default()
        }
        .scheduler_config();
        assert_eq!(config.scroll_debounce, Duration::from_millis(750));
        assert!(!config.track_window_position);
    }
}
