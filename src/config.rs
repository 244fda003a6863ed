//! Client-level configuration loading: scoring defaults, notice lifetime and input limits.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};
use validator::Validate;

use crate::{
    error::ConfigError,
    state::game::{Quiz, Verdict},
};

/// Default location on disk where the client looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/client.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "QUIZ_BUZZER_CONFIG_PATH";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
#[serde(default)]
/// Immutable runtime configuration shared by the client core.
pub struct ClientConfig {
    /// Points awarded for a correct answer when the quiz carries none.
    #[validate(range(max = 10000))]
    pub points_correct: u32,
    /// Points awarded for an incorrect answer.
    #[validate(range(max = 10000))]
    pub points_incorrect: u32,
    /// Lifetime of a transient notice, in milliseconds.
    #[validate(range(min = 500, max = 60000))]
    pub notice_ttl_ms: u64,
    /// Maximum answer length in characters, after trimming.
    #[validate(range(min = 1, max = 1000))]
    pub max_answer_len: usize,
    /// Prompt of the synthetic Free Mode quiz.
    #[validate(length(min = 1, max = 200))]
    pub free_mode_prompt: String,
    /// Whether the host's snapshot shows the canonical answer before the reveal.
    pub snapshot_reveals_answer_to_host: bool,
}

impl ClientConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        Self::load_from(resolve_config_path())
    }

    /// Load the configuration from `path`, falling back to built-in defaults.
    pub fn load_from(path: PathBuf) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        points_correct = config.points_correct,
                        max_answer_len = config.max_answer_len,
                        "loaded client config"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "invalid config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse and validate a JSON document. Missing fields take their default.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(contents).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Lifetime of a transient notice.
    pub fn notice_ttl(&self) -> Duration {
        Duration::from_millis(self.notice_ttl_ms)
    }

    /// Points delta attached to a judgment of `verdict` on `quiz`.
    pub fn points_for(&self, verdict: Verdict, quiz: Option<&Quiz>) -> u32 {
        match verdict {
            Verdict::Correct => quiz
                .and_then(|quiz| quiz.points)
                .unwrap_or(self.points_correct),
            Verdict::Incorrect => self.points_incorrect,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            points_correct: 10,
            points_incorrect: 0,
            notice_ttl_ms: 4_000,
            max_answer_len: 200,
            free_mode_prompt: "Free round".into(),
            snapshot_reveals_answer_to_host: true,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
