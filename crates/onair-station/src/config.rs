//! Station configuration from the environment.
//!
//! Every integration is optional: a missing credential disables that
//! integration. A value that is present but malformed is an error.

use std::fmt::Display;
use std::net::SocketAddr;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use onair_chat::transports::twitch::TwitchConfig;
use onair_chat::transports::youtube::YouTubeConfig;
use onair_obs::client::ObsConfig;
use onair_openai::chat::DEFAULT_TEXT_MODEL;
use onair_openai::speech::DEFAULT_VOICE_MODEL;
use onair_schedule::domain::cadence::Cadence;
use thiserror::Error;

use crate::logging::LogFormat;

/// Configuration that could not be used.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set to a value that cannot be parsed.
    #[error("{key}={value:?} is invalid: {reason}")]
    Invalid {
        /// Variable name.
        key: &'static str,
        /// Offending value.
        value: String,
        /// Parse failure.
        reason: String,
    },
}

/// OpenAI credentials and model choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiSettings {
    /// API key.
    pub api_key: String,
    /// Chat-completions model.
    pub text_model: String,
    /// Speech model.
    pub voice_model: String,
}

/// Everything the station needs to start.
#[derive(Debug, Clone)]
pub struct StationConfig {
    /// `None` runs on simulated text and silent audio.
    pub openai: Option<OpenAiSettings>,
    /// Speech voice profile.
    pub voice_name: String,
    /// Locale tag passed to synthesis.
    pub language: String,
    /// `None` when any Twitch credential is missing.
    pub twitch: Option<TwitchConfig>,
    /// `None` when any YouTube credential is missing.
    pub youtube: Option<YouTubeConfig>,
    /// Control-plane endpoint.
    pub obs: ObsConfig,
    /// Scene holding the voice and music sources.
    pub scene: String,
    /// Voice source name.
    pub voice_source: String,
    /// Music source name.
    pub music_source: String,
    /// Cycle trigger.
    pub cadence: Cadence,
    /// Music window length.
    pub music_window: Duration,
    /// Pending speech jobs before submissions are refused.
    pub speech_queue_capacity: usize,
    /// Narration pace used for the playback hold.
    pub words_per_minute: u32,
    /// Holds the narrative record.
    pub data_dir: PathBuf,
    /// Holds the voice resource.
    pub runtime_dir: PathBuf,
    /// Status server bind address.
    pub status_addr: SocketAddr,
    /// Log output format.
    pub log_format: LogFormat,
}

impl StationConfig {
    /// Reads the process environment. Call [`load_dotenv`] first to pick up
    /// a local `.env`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for a malformed value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from `lookup`. Blank values count as unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for a malformed value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_owned());

        let openai = get("OPENAI_API_KEY").map(|api_key| OpenAiSettings {
            api_key,
            text_model: get_or("TEXT_MODEL", DEFAULT_TEXT_MODEL),
            voice_model: get_or("VOICE_MODEL", DEFAULT_VOICE_MODEL),
        });

        let channels: Vec<String> = get("TWITCH_CHANNELS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();
        let twitch = match (get("TWITCH_USERNAME"), get("TWITCH_OAUTH_TOKEN")) {
            (Some(username), Some(token)) if !channels.is_empty() => {
                Some(TwitchConfig::new(username, token, channels))
            }
            _ => None,
        };

        let youtube = match (get("YT_API_KEY"), get("YT_LIVE_CHAT_ID")) {
            (Some(key), Some(chat)) => Some(YouTubeConfig::new(key, chat)),
            _ => None,
        };

        let obs = ObsConfig {
            host: get_or("OBS_HOST", "127.0.0.1"),
            port: parse(&get, "OBS_PORT", 4455)?,
            password: get("OBS_PASSWORD"),
        };

        let cadence_spec = get_or("CYCLE_MINUTES", "0,30");
        let cadence = Cadence::parse(&cadence_spec).map_err(|e| ConfigError::Invalid {
            key: "CYCLE_MINUTES",
            value: cadence_spec.clone(),
            reason: e.to_string(),
        })?;

        let window_minutes: u64 = parse(&get, "MUSIC_WINDOW_MINUTES", 5)?;

        let status_host = get_or("STATUS_HOST", "0.0.0.0");
        let status_port: u16 = parse(&get, "STATUS_PORT", 3000)?;
        let status_spec = format!("{status_host}:{status_port}");
        let status_addr = status_spec.parse().map_err(|e: std::net::AddrParseError| {
            ConfigError::Invalid {
                key: "STATUS_HOST",
                value: status_host.clone(),
                reason: e.to_string(),
            }
        })?;

        let log_format = match get("LOG_FORMAT").as_deref() {
            None | Some("json") => LogFormat::Json,
            Some("pretty") => LogFormat::Pretty,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "LOG_FORMAT",
                    value: other.to_owned(),
                    reason: "expected json or pretty".into(),
                });
            }
        };

        Ok(Self {
            openai,
            voice_name: get_or("VOICE_NAME", "alloy"),
            language: get_or("VOICE_LANGUAGE", "es"),
            twitch,
            youtube,
            obs,
            scene: get_or("SCENE_NAME", "Radio"),
            voice_source: get_or("VOICE_SOURCE", "Voz"),
            music_source: get_or("MUSIC_SOURCE", "Musica"),
            cadence,
            music_window: Duration::from_secs(window_minutes.saturating_mul(60)),
            speech_queue_capacity: parse(&get, "SPEECH_QUEUE_CAPACITY", 16)?,
            words_per_minute: parse(&get, "SPEECH_WORDS_PER_MINUTE", 150)?,
            data_dir: PathBuf::from(get_or("DATA_DIR", "data")),
            runtime_dir: PathBuf::from(get_or("RUNTIME_DIR", "runtime")),
            status_addr,
            log_format,
        })
    }

    /// The narrative record.
    #[must_use]
    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join("state.json")
    }

    /// The voice resource.
    #[must_use]
    pub fn voice_path(&self) -> PathBuf {
        self.runtime_dir.join("voice").join("latest.mp3")
    }
}

fn parse<T>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match get(key) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}

/// Loads the nearest `.env` into the process environment.
///
/// Returns the file loaded, or `None` when there is none.
///
/// # Errors
///
/// Returns the `dotenvy` error for an unreadable or malformed file.
pub fn load_dotenv() -> Result<Option<PathBuf>, dotenvy::Error> {
    absent_is_none(dotenvy::dotenv())
}

/// Loads `path` into the process environment, like [`load_dotenv`].
///
/// # Errors
///
/// Returns the `dotenvy` error for an unreadable or malformed file.
pub fn load_dotenv_from(path: &Path) -> Result<Option<PathBuf>, dotenvy::Error> {
    absent_is_none(dotenvy::from_path(path).map(|()| path.to_path_buf()))
}

// A missing .env file is the normal case in production.
fn absent_is_none(
    loaded: Result<PathBuf, dotenvy::Error>,
) -> Result<Option<PathBuf>, dotenvy::Error> {
    match loaded {
        Ok(path) => Ok(Some(path)),
        Err(dotenvy::Error::Io(e)) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<StationConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        StationConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_empty_environment_yields_defaults() {
        // Act
        let config = config(&[]).unwrap();

        // Assert
        assert!(config.openai.is_none());
        assert!(config.twitch.is_none());
        assert!(config.youtube.is_none());
        assert_eq!(config.obs.host, "127.0.0.1");
        assert_eq!(config.obs.port, 4455);
        assert_eq!(config.scene, "Radio");
        assert_eq!(config.voice_source, "Voz");
        assert_eq!(config.music_source, "Musica");
        assert_eq!(config.language, "es");
        assert_eq!(config.cadence.to_string(), "0,30");
        assert_eq!(config.music_window, Duration::from_secs(300));
        assert_eq!(config.speech_queue_capacity, 16);
        assert_eq!(config.status_addr.port(), 3000);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.state_path(), PathBuf::from("data/state.json"));
        assert_eq!(config.voice_path(), PathBuf::from("runtime/voice/latest.mp3"));
    }

    #[test]
    fn test_openai_key_enables_provider_with_default_models() {
        let config = config(&[("OPENAI_API_KEY", "sk-test")]).unwrap();

        let openai = config.openai.unwrap();
        assert_eq!(openai.text_model, "gpt-4o-mini");
        assert_eq!(openai.voice_model, "gpt-4o-mini-tts");
    }

    #[test]
    fn test_twitch_requires_all_credentials() {
        let partial =
            config(&[("TWITCH_USERNAME", "bot"), ("TWITCH_OAUTH_TOKEN", "tok")]).unwrap();
        assert!(partial.twitch.is_none());

        let full = config(&[
            ("TWITCH_USERNAME", "bot"),
            ("TWITCH_OAUTH_TOKEN", "tok"),
            ("TWITCH_CHANNELS", " radio, ,otro "),
        ])
        .unwrap();
        assert_eq!(full.twitch.unwrap().channels, vec!["radio", "otro"]);
    }

    #[test]
    fn test_youtube_requires_key_and_chat_id() {
        assert!(config(&[("YT_API_KEY", "k")]).unwrap().youtube.is_none());
        assert!(
            config(&[("YT_API_KEY", "k"), ("YT_LIVE_CHAT_ID", "c")])
                .unwrap()
                .youtube
                .is_some()
        );
    }

    #[test]
    fn test_blank_values_count_as_unset() {
        let config = config(&[("OPENAI_API_KEY", "  "), ("OBS_PORT", "")]).unwrap();

        assert!(config.openai.is_none());
        assert_eq!(config.obs.port, 4455);
    }

    #[test]
    fn test_malformed_number_is_invalid() {
        let err = config(&[("OBS_PORT", "obs")]).unwrap_err();

        assert!(matches!(err, ConfigError::Invalid { key: "OBS_PORT", .. }));
    }

    #[test]
    fn test_malformed_cadence_is_invalid() {
        let err = config(&[("CYCLE_MINUTES", "0,75")]).unwrap_err();

        assert!(matches!(err, ConfigError::Invalid { key: "CYCLE_MINUTES", .. }));
    }

    #[test]
    fn test_voice_language_ignores_host_locale() {
        // Arrange
        let host_only = [("LANG", "en_US.UTF-8")];
        let explicit = [("LANG", "en_US.UTF-8"), ("VOICE_LANGUAGE", "pt")];

        // Act
        let defaulted = config(&host_only).unwrap();
        let chosen = config(&explicit).unwrap();

        // Assert
        assert_eq!(defaulted.language, "es");
        assert_eq!(chosen.language, "pt");
    }

    #[test]
    fn test_pretty_log_format() {
        let pretty = config(&[("LOG_FORMAT", "pretty")]).unwrap();
        assert_eq!(pretty.log_format, LogFormat::Pretty);

        assert!(config(&[("LOG_FORMAT", "xml")]).is_err());
    }

    #[test]
    fn test_missing_dotenv_is_not_an_error() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();

        // Act
        let loaded = load_dotenv_from(&dir.path().join(".env"));

        // Assert
        assert!(matches!(loaded, Ok(None)), "{loaded:?}");
    }

    #[test]
    fn test_malformed_dotenv_is_reported() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "this line is not an assignment\n").unwrap();

        // Act
        let loaded = load_dotenv_from(&path);

        // Assert
        assert!(matches!(loaded, Err(dotenvy::Error::LineParse(..))), "{loaded:?}");
    }

    #[test]
    fn test_readable_dotenv_reports_its_path() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "# nothing to set\n").unwrap();

        // Act
        let loaded = load_dotenv_from(&path).unwrap();

        // Assert
        assert_eq!(loaded, Some(path));
    }
}
