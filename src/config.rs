//! Process-wide configuration, resolved once at startup.
//!
//! Components never read the environment themselves: everything they need is
//! resolved here and passed in explicitly.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. Environment variable overrides (`TIDECAST_*`)
//! 2. Built-in defaults

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::profile::AudienceProfile;
use crate::error::{Result, TidecastError};

const DEFAULT_GENERATION_ENDPOINT: &str = "https://openrouter.ai/api/v1";
const DEFAULT_GENERATION_PATH: &str = "/chat/completions";
const DEFAULT_MODEL: &str = "x-ai/grok-4-fast:free";
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_TIMEOUT_MS: u64 = 60_000;

const DEFAULT_FEED_ENDPOINT: &str = "https://api.twitter.com";
const DEFAULT_FEED_PATH: &str = "/2/tweets";

const DEFAULT_OUTPUT_DIR: &str = "output";
const DEFAULT_HISTORY_DB: &str = "tidecast_history.db";
const DEFAULT_HISTORY_JSONL: &str = "tidecast_history.jsonl";

/// Environment-variable names for configuration overrides.
const ENV_GENERATION_ENDPOINT: &str = "TIDECAST_GENERATION_ENDPOINT";
const ENV_GENERATION_PATH: &str = "TIDECAST_GENERATION_PATH";
const ENV_MODEL: &str = "TIDECAST_MODEL";
const ENV_API_KEY: &str = "TIDECAST_API_KEY";
const ENV_TIMEOUT_MS: &str = "TIDECAST_TIMEOUT_MS";
const ENV_FEED_ENDPOINT: &str = "TIDECAST_FEED_ENDPOINT";
const ENV_FEED_PATH: &str = "TIDECAST_FEED_PATH";
const ENV_FEED_API_KEY: &str = "TIDECAST_FEED_API_KEY";
const ENV_OUTPUT_DIR: &str = "TIDECAST_OUTPUT_DIR";
const ENV_HISTORY_DB: &str = "TIDECAST_HISTORY_DB";
const ENV_HISTORY_JSONL: &str = "TIDECAST_HISTORY_JSONL";

/// Configuration for the generation service call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Base URL of the chat-completions service
    pub endpoint: String,
    /// Path of the completions route
    pub path: String,
    /// Model identifier sent in the payload
    pub model: String,
    /// API key for the Authorization header (opaque; may be empty)
    pub api_key: String,
    pub temperature: f32,
    /// Timeout for each generation call in milliseconds
    pub timeout_ms: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_GENERATION_ENDPOINT.to_string(),
            path: DEFAULT_GENERATION_PATH.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: String::new(),
            temperature: DEFAULT_TEMPERATURE,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// Configuration for the social-feed delivery channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub endpoint: String,
    pub path: String,
    pub api_key: String,
    pub timeout_ms: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_FEED_ENDPOINT.to_string(),
            path: DEFAULT_FEED_PATH.to_string(),
            api_key: String::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// Top-level configuration for one process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub generation: GenerationConfig,
    pub feed: FeedConfig,
    /// Directory for letters and run report artifacts
    pub output_dir: PathBuf,
    /// SQLite history database path
    pub history_db: PathBuf,
    /// JSONL history file path
    pub history_jsonl: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            generation: GenerationConfig::default(),
            feed: FeedConfig::default(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            history_db: PathBuf::from(DEFAULT_HISTORY_DB),
            history_jsonl: PathBuf::from(DEFAULT_HISTORY_JSONL),
        }
    }
}

impl Config {
    /// Resolve configuration from defaults and `TIDECAST_*` environment
    /// overrides.
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(v) = env::var(ENV_GENERATION_ENDPOINT) {
            config.generation.endpoint = v;
        }
        if let Ok(v) = env::var(ENV_GENERATION_PATH) {
            config.generation.path = v;
        }
        if let Ok(v) = env::var(ENV_MODEL) {
            config.generation.model = v;
        }
        if let Ok(v) = env::var(ENV_API_KEY) {
            config.generation.api_key = v;
        }
        if let Some(v) = env_parsed::<u64>(ENV_TIMEOUT_MS)? {
            config.generation.timeout_ms = v;
            config.feed.timeout_ms = v;
        }
        if let Ok(v) = env::var(ENV_FEED_ENDPOINT) {
            config.feed.endpoint = v;
        }
        if let Ok(v) = env::var(ENV_FEED_PATH) {
            config.feed.path = v;
        }
        if let Ok(v) = env::var(ENV_FEED_API_KEY) {
            config.feed.api_key = v;
        }
        if let Ok(v) = env::var(ENV_OUTPUT_DIR) {
            config.output_dir = PathBuf::from(v);
        }
        if let Ok(v) = env::var(ENV_HISTORY_DB) {
            config.history_db = PathBuf::from(v);
        }
        if let Ok(v) = env::var(ENV_HISTORY_JSONL) {
            config.history_jsonl = PathBuf::from(v);
        }

        Ok(config)
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse::<T>().map(Some).map_err(|e| {
            TidecastError::Config(format!("invalid value for {}: {}", key, e))
        }),
        Err(_) => Ok(None),
    }
}

/// The built-in audience profiles for the letter channel.
pub fn letter_profiles() -> Vec<AudienceProfile> {
    vec![
        AudienceProfile {
            name: "Ocean Policy Institute".to_string(),
            audience: "Government Officials, Policy Makers, Environmental Agencies".to_string(),
            tone: "formal, evidence-based, diplomatic".to_string(),
            focus_areas: vec![
                "policy reform".to_string(),
                "international cooperation".to_string(),
                "regulatory frameworks".to_string(),
                "funding allocation".to_string(),
            ],
            call_to_action: "implement stronger marine protection policies and increase funding"
                .to_string(),
            contact: Some("advocacy@tidecast.org".to_string()),
        },
        AudienceProfile {
            name: "Sustainable Marine Industries Coalition".to_string(),
            audience: "Corporate Leaders, Manufacturing, Shipping, Energy Companies".to_string(),
            tone: "business-focused, solution-oriented, collaborative".to_string(),
            focus_areas: vec![
                "sustainable practices".to_string(),
                "green technology".to_string(),
                "corporate responsibility".to_string(),
                "economic benefits".to_string(),
            ],
            call_to_action: "adopt sustainable practices and invest in clean marine technologies"
                .to_string(),
            contact: Some("advocacy@tidecast.org".to_string()),
        },
        AudienceProfile {
            name: "Coastal Communities Alliance".to_string(),
            audience: "Local Communities, Volunteers, Community Leaders, Residents".to_string(),
            tone: "passionate, community-focused, inspiring".to_string(),
            focus_areas: vec![
                "grassroots action".to_string(),
                "local impact".to_string(),
                "community engagement".to_string(),
                "educational programs".to_string(),
            ],
            call_to_action: "join local conservation efforts and engage in community marine protection"
                .to_string(),
            contact: Some("advocacy@tidecast.org".to_string()),
        },
    ]
}

/// The single audience profile for the social-feed channel.
pub fn feed_profile() -> AudienceProfile {
    AudienceProfile {
        name: "Ocean Followers".to_string(),
        audience: "Everyone following the feed".to_string(),
        tone: "first-person, urgent, evocative".to_string(),
        focus_areas: vec!["public awareness".to_string()],
        call_to_action: "listen to what the water is telling you".to_string(),
        contact: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.generation.path, "/chat/completions");
        assert_eq!(config.generation.timeout_ms, 60_000);
        assert!(config.generation.api_key.is_empty());
        assert_eq!(config.output_dir, PathBuf::from("output"));
    }

    #[test]
    fn test_letter_profiles_all_specify_tone() {
        for profile in letter_profiles() {
            assert!(!profile.tone.is_empty());
            assert!(!profile.focus_areas.is_empty());
            assert!(!profile.call_to_action.is_empty());
        }
    }
}
