//! # configs
//!
//! Layered settings for rusty-chat. Sources, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. `rusty-chat.toml` in the working directory (optional)
//! 3. environment variables, e.g. `RUSTY_CHAT_LOG_LEVEL=debug` or
//!    `RUSTY_CHAT_MATCHMAKING__MAX_DELAY_MS=2000`
//!
//! A `.env` file is loaded into the environment before any of this.

use std::collections::HashMap;

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_FILE: &str = "rusty-chat";
pub const ENV_PREFIX: &str = "RUSTY_CHAT";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),

    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MatchmakingSettings {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessagingSettings {
    pub reply_probability: f64,
    pub min_reply_delay_ms: u64,
    pub max_reply_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    /// Default `EnvFilter` directive; `RUST_LOG` wins when set.
    pub log_level: String,
    pub log_format: LogFormat,
    /// Deep link to the external messaging platform. Passed through untouched.
    pub platform_link: String,
    /// Substring that marks a text message as a platform link.
    pub link_marker: String,
    pub event_capacity: usize,
    /// Fixed seed for reproducible partners and replies.
    #[serde(default)]
    pub rng_seed: Option<u64>,
    pub matchmaking: MatchmakingSettings,
    pub messaging: MessagingSettings,
}

impl Settings {
    /// Loads `.env`, then defaults, the optional config file, and the
    /// process environment.
    pub fn load() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            Err(err) if err.not_found() => {}
            Err(err) => tracing::warn!(error = %err, "ignoring unreadable .env"),
        }

        let builder = Self::defaults()?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Self::environment());
        Self::finish(builder.build()?)
    }

    /// Same layering as [`Settings::load`] but from in-memory sources.
    pub fn from_parts(toml: Option<&str>, env: HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut builder = Self::defaults()?;
        if let Some(toml) = toml {
            builder = builder.add_source(File::from_str(toml, FileFormat::Toml));
        }
        builder = builder.add_source(Self::environment().source(Some(env)));
        Self::finish(builder.build()?)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Ok(Config::builder()
            .set_default("log_level", "info")?
            .set_default("log_format", "pretty")?
            .set_default("platform_link", "https://t.me/rusty_chat_bot")?
            .set_default("link_marker", "t.me/")?
            .set_default("event_capacity", 64_i64)?
            .set_default("matchmaking.min_delay_ms", 1_000_i64)?
            .set_default("matchmaking.max_delay_ms", 4_000_i64)?
            .set_default("messaging.reply_probability", 0.7)?
            .set_default("messaging.min_reply_delay_ms", 1_000_i64)?
            .set_default("messaging.max_reply_delay_ms", 4_000_i64)?)
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn finish(config: Config) -> Result<Self, ConfigError> {
        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        tracing::debug!(?settings, "configuration loaded");
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.matchmaking.min_delay_ms >= self.matchmaking.max_delay_ms {
            return Err(ConfigError::Invalid {
                key: "matchmaking",
                reason: "min_delay_ms must be below max_delay_ms".into(),
            });
        }
        if self.messaging.min_reply_delay_ms >= self.messaging.max_reply_delay_ms {
            return Err(ConfigError::Invalid {
                key: "messaging",
                reason: "min_reply_delay_ms must be below max_reply_delay_ms".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.messaging.reply_probability) {
            return Err(ConfigError::Invalid {
                key: "messaging.reply_probability",
                reason: format!("{} is not within 0..=1", self.messaging.reply_probability),
            });
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::Invalid {
                key: "event_capacity",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}
