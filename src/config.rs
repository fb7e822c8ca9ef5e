use std::{fmt, str::FromStr, time::Duration};

use tracing::warn;

use crate::operation::PollPolicy;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.0-flash-preview-image-generation";
pub const DEFAULT_TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";
pub const DEFAULT_VIDEO_MODEL: &str = "veo-2.0-generate-001";
pub const DEFAULT_VOICE: &str = "Algenib";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Process-wide settings, built once at startup and shared read-only.
#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub api_key: Option<String>,
    pub api_base: String,
    pub text_model: String,
    pub image_model: String,
    pub tts_model: String,
    pub video_model: String,
    pub default_voice: String,
    pub poll: PollPolicy,
    pub request_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            tts_model: DEFAULT_TTS_MODEL.to_string(),
            video_model: DEFAULT_VIDEO_MODEL.to_string(),
            default_voice: DEFAULT_VOICE.to_string(),
            poll: PollPolicy::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl AppConfig {
    /// Reads settings from the process environment (and `.env`, once loaded by
    /// the caller). A missing API key is not an error: the provider is simply
    /// reported as unavailable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_key = dotenvy::var("GOOGLE_API_KEY")
            .or_else(|_| dotenvy::var("GEMINI_API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());

        let poll = PollPolicy {
            interval: Duration::from_secs(non_zero(
                "STUDYFLOW_POLL_INTERVAL_SECS",
                parse_var("STUDYFLOW_POLL_INTERVAL_SECS", defaults.poll.interval.as_secs()),
                defaults.poll.interval.as_secs(),
            )),
            max_attempts: non_zero(
                "STUDYFLOW_POLL_MAX_ATTEMPTS",
                parse_var("STUDYFLOW_POLL_MAX_ATTEMPTS", defaults.poll.max_attempts),
                defaults.poll.max_attempts,
            ),
            deadline: dotenvy::var("STUDYFLOW_POLL_DEADLINE_SECS")
                .ok()
                .and_then(|raw| raw.trim().parse().ok())
                .map(Duration::from_secs),
        };

        Self {
            bind_addr: string_var("STUDYFLOW_BIND", defaults.bind_addr),
            api_key,
            api_base: string_var("STUDYFLOW_API_BASE", defaults.api_base),
            text_model: string_var("STUDYFLOW_TEXT_MODEL", defaults.text_model),
            image_model: string_var("STUDYFLOW_IMAGE_MODEL", defaults.image_model),
            tts_model: string_var("STUDYFLOW_TTS_MODEL", defaults.tts_model),
            video_model: string_var("STUDYFLOW_VIDEO_MODEL", defaults.video_model),
            default_voice: string_var("STUDYFLOW_VOICE", defaults.default_voice),
            poll,
            request_timeout: Duration::from_secs(parse_var(
                "STUDYFLOW_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )),
        }
    }

    pub fn provider_available(&self) -> bool {
        self.api_key.is_some()
    }
}

fn string_var(key: &str, default: String) -> String {
    dotenvy::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
}

fn parse_var<T: FromStr + fmt::Display + Copy>(key: &str, default: T) -> T {
    match dotenvy::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = raw.as_str(), %default, "ignoring unparsable setting");
            default
        }),
        Err(_) => default,
    }
}

/// Poll interval and attempt count must be positive.
fn non_zero<T: PartialEq + Default + fmt::Display + Copy>(key: &str, value: T, default: T) -> T {
    if value == T::default() {
        warn!(key, %default, "zero is not allowed for this setting; using default");
        default
    } else {
        value
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("text_model", &self.text_model)
            .field("image_model", &self.image_model)
            .field("tts_model", &self.tts_model)
            .field("video_model", &self.video_model)
            .field("default_voice", &self.default_voice)
            .field("poll", &self.poll)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_no_provider() {
        let config = AppConfig::default();
        assert!(!config.provider_available());
        assert_eq!(config.poll.interval, Duration::from_secs(5));
        assert_eq!(config.text_model, DEFAULT_TEXT_MODEL);
    }

    #[test]
    fn zero_poll_settings_fall_back_to_defaults() {
        assert_eq!(non_zero("STUDYFLOW_POLL_INTERVAL_SECS", 0u64, 5), 5);
        assert_eq!(non_zero("STUDYFLOW_POLL_INTERVAL_SECS", 2u64, 5), 2);
        assert_eq!(non_zero("STUDYFLOW_POLL_MAX_ATTEMPTS", 0u32, 60), 60);
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("secret-key".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret-key"));
    }
}
