//! Centralized configuration for Ladderview.
//!
//! All tunable parameters and settings are defined here to avoid
//! hard-coded values scattered throughout the codebase.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading configuration from disk.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path that was being read.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for this schema.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Central configuration for all Ladderview components.
///
/// Groups related configuration settings into logical sections.
/// Supports environment variable overrides for runtime customization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LadderviewConfig {
    pub player: PlayerOptions,
    pub selector: SelectorConfig,
    pub labels: LabelConfig,
}

/// Options handed to the embedded player when it is created.
///
/// Serialized in the camelCase shape the player expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerOptions {
    pub controls: bool,
    pub autoplay: bool,
    pub muted: bool,
    /// Preload hint, usually "metadata"
    pub preload: String,
    pub fluid: bool,
    pub html5: Html5Options,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            controls: true,
            autoplay: false,
            muted: true,
            preload: "metadata".to_string(),
            fluid: true,
            html5: Html5Options::default(),
        }
    }
}

impl PlayerOptions {
    /// Renders the options as the JSON object passed to the player.
    ///
    /// # Errors
    ///
    /// - `serde_json::Error` - Serialization failed
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// HTML5 tech options, including the adaptive streaming engine block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Html5Options {
    pub vhs: StreamingTuning,
    pub native_audio_tracks: bool,
    pub native_video_tracks: bool,
}

impl Default for Html5Options {
    fn default() -> Self {
        Self {
            vhs: StreamingTuning::default(),
            native_audio_tracks: false,
            native_video_tracks: false,
        }
    }
}

/// Adaptive streaming engine tuning.
///
/// Buffer values are in seconds of media.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StreamingTuning {
    pub override_native: bool,
    pub limit_rendition_by_player_dimensions: bool,
    pub use_device_pixel_ratio: bool,
    pub enable_low_initial_playlist: bool,
    pub goal_buffer_length: u32,
    pub buffer_low_water_line: u32,
    pub buffer_high_water_line: u32,
    #[serde(rename = "experimentalBufferBasedABR")]
    pub experimental_buffer_based_abr: bool,
}

impl Default for StreamingTuning {
    fn default() -> Self {
        Self {
            override_native: true,
            limit_rendition_by_player_dimensions: true,
            use_device_pixel_ratio: true,
            enable_low_initial_playlist: true,
            goal_buffer_length: 15,
            buffer_low_water_line: 5,
            buffer_high_water_line: 30,
            experimental_buffer_based_abr: true,
        }
    }
}

/// Quality selector activation settings.
///
/// Controls when the selector menu is activated and when deferred
/// activation and relabel attempts run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Menu option selected on activation
    pub default_option: String,
    /// Renditions required before the selector is worth showing
    pub min_renditions: usize,
    /// Delay of the activation retry after metadata loads
    #[serde(with = "millis")]
    pub init_retry_delay: Duration,
    /// Delay of the relabel pass after metadata loads
    #[serde(with = "millis")]
    pub label_reapply_delay: Duration,
    /// Delay of the relabel pass after a successful activation
    #[serde(with = "millis")]
    pub post_activation_label_delay: Duration,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            default_option: "auto".to_string(),
            min_renditions: 2,
            init_retry_delay: Duration::from_millis(300),
            label_reapply_delay: Duration::from_millis(500),
            post_activation_label_delay: Duration::ZERO,
        }
    }
}

/// Where the resolution ladder hint lives in source URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// Query parameter holding the comma-separated transform list
    pub hint_param: String,
    /// Prefix of the ladder token inside that list
    pub token_prefix: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            hint_param: "tr".to_string(),
            token_prefix: "sr-".to_string(),
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

impl LadderviewConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Allows runtime configuration via environment variables while
    /// maintaining sensible defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Applies `LADDERVIEW_*` environment overrides on top of this config.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(param) = std::env::var("LADDERVIEW_HINT_PARAM")
            && !param.is_empty()
        {
            self.labels.hint_param = param;
        }

        if let Ok(prefix) = std::env::var("LADDERVIEW_TOKEN_PREFIX")
            && !prefix.is_empty()
        {
            self.labels.token_prefix = prefix;
        }

        if let Ok(count) = std::env::var("LADDERVIEW_MIN_RENDITIONS")
            && let Ok(count) = count.parse::<usize>()
        {
            self.selector.min_renditions = count;
        }

        if let Ok(delay) = std::env::var("LADDERVIEW_INIT_RETRY_MS")
            && let Ok(millis) = delay.parse::<u64>()
        {
            self.selector.init_retry_delay = Duration::from_millis(millis);
        }

        if let Ok(delay) = std::env::var("LADDERVIEW_LABEL_DELAY_MS")
            && let Ok(millis) = delay.parse::<u64>()
        {
            self.selector.label_reapply_delay = Duration::from_millis(millis);
        }

        if let Ok(autoplay) = std::env::var("LADDERVIEW_AUTOPLAY") {
            self.player.autoplay = autoplay.parse().unwrap_or(false);
        }
    }

    /// Parses configuration from TOML text. Missing sections keep defaults.
    ///
    /// # Errors
    ///
    /// - `ConfigError::Parse` - Text is not valid TOML for this schema
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// - `ConfigError::Read` - File could not be read
    /// - `ConfigError::Parse` - File is not valid TOML for this schema
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Creates a configuration optimized for testing.
    ///
    /// Deferred tasks keep their relative order but use short delays.
    pub fn for_testing() -> Self {
        Self {
            selector: SelectorConfig {
                init_retry_delay: Duration::from_millis(3),
                label_reapply_delay: Duration::from_millis(5),
                ..SelectorConfig::default()
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = LadderviewConfig::default();

        assert_eq!(config.selector.default_option, "auto");
        assert_eq!(config.selector.min_renditions, 2);
        assert_eq!(config.selector.init_retry_delay, Duration::from_millis(300));
        assert_eq!(
            config.selector.label_reapply_delay,
            Duration::from_millis(500)
        );
        assert_eq!(config.selector.post_activation_label_delay, Duration::ZERO);
        assert_eq!(config.labels.hint_param, "tr");
        assert_eq!(config.labels.token_prefix, "sr-");
        assert!(!config.player.autoplay);
        assert!(config.player.muted);
        assert_eq!(config.player.html5.vhs.goal_buffer_length, 15);
    }

    #[test]
    fn test_player_options_json_shape() {
        let json = PlayerOptions::default().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["preload"], "metadata");
        assert_eq!(value["html5"]["vhs"]["overrideNative"], true);
        assert_eq!(value["html5"]["vhs"]["bufferHighWaterLine"], 30);
        assert_eq!(value["html5"]["vhs"]["experimentalBufferBasedABR"], true);
        assert_eq!(value["html5"]["nativeAudioTracks"], false);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = LadderviewConfig::from_toml_str(
            r#"
            [selector]
            init_retry_delay = 1000

            [labels]
            hint_param = "transform"
            "#,
        )
        .unwrap();

        assert_eq!(config.selector.init_retry_delay, Duration::from_secs(1));
        assert_eq!(
            config.selector.label_reapply_delay,
            Duration::from_millis(500)
        );
        assert_eq!(config.labels.hint_param, "transform");
        assert_eq!(config.labels.token_prefix, "sr-");
        assert_eq!(config.player, PlayerOptions::default());
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        let result = LadderviewConfig::from_toml_str("[selector]\nmin_renditions = \"two\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[player]\nmuted = false").unwrap();

        let config = LadderviewConfig::from_file(file.path()).unwrap();
        assert!(!config.player.muted);
        assert!(config.player.controls);

        let missing = LadderviewConfig::from_file(Path::new("/nonexistent/ladderview.toml"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_testing_preset_preserves_task_order() {
        let config = LadderviewConfig::for_testing();
        assert!(config.selector.init_retry_delay < config.selector.label_reapply_delay);
        assert_eq!(config.selector.min_renditions, 2);
    }

    #[test]
    fn test_env_override() {
        unsafe {
            std::env::set_var("LADDERVIEW_HINT_PARAM", "ladder");
            std::env::set_var("LADDERVIEW_TOKEN_PREFIX", "");
            std::env::set_var("LADDERVIEW_MIN_RENDITIONS", "3");
            std::env::set_var("LADDERVIEW_INIT_RETRY_MS", "50");
            std::env::set_var("LADDERVIEW_AUTOPLAY", "true");
        }

        let config = LadderviewConfig::from_env();

        assert_eq!(config.labels.hint_param, "ladder");
        assert_eq!(config.labels.token_prefix, "sr-");
        assert_eq!(config.selector.min_renditions, 3);
        assert_eq!(config.selector.init_retry_delay, Duration::from_millis(50));
        assert!(config.player.autoplay);

        // Cleanup
        unsafe {
            std::env::remove_var("LADDERVIEW_HINT_PARAM");
            std::env::remove_var("LADDERVIEW_TOKEN_PREFIX");
            std::env::remove_var("LADDERVIEW_MIN_RENDITIONS");
            std::env::remove_var("LADDERVIEW_INIT_RETRY_MS");
            std::env::remove_var("LADDERVIEW_AUTOPLAY");
        }
    }
}
