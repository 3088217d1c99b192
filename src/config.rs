use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::session::memorize::DEFAULT_MEMORIZATION_SECS;
use crate::session::quiz::DEFAULT_REQUIRED_CORRECT;
use crate::session::quiz_session::DEFAULT_FEEDBACK_DELAY;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_quiz_set_size")]
    pub quiz_set_size: usize,
    #[serde(default = "default_required_correct")]
    pub required_correct: u32,
    #[serde(default = "default_memorization_secs")]
    pub memorization_secs: u64,
    #[serde(default = "default_feedback_delay_ms")]
    pub feedback_delay_ms: u64,
    #[serde(default = "default_theme")]
    pub theme: String,
    /// Extra era files layered over the bundled catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_quiz_set_size() -> usize {
    10
}
fn default_required_correct() -> u32 {
    DEFAULT_REQUIRED_CORRECT
}
fn default_memorization_secs() -> u64 {
    DEFAULT_MEMORIZATION_SECS
}
fn default_feedback_delay_ms() -> u64 {
    DEFAULT_FEEDBACK_DELAY.as_millis() as u64
}
fn default_theme() -> String {
    "catppuccin-mocha".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quiz_set_size: default_quiz_set_size(),
            required_correct: default_required_correct(),
            memorization_secs: default_memorization_secs(),
            feedback_delay_ms: default_feedback_delay_ms(),
            theme: default_theme(),
            content_dir: None,
            data_dir: None,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rekishi")
            .join("config.toml")
    }

    /// Where progress and logs live: the configured directory, else the
    /// platform data dir.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("rekishi")
        })
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir().join("logs")
    }

    /// Clamp numeric fields into usable ranges. Call after loading and after
    /// applying CLI overrides.
    pub fn validate(&mut self) {
        self.quiz_set_size = self.quiz_set_size.clamp(1, 100);
        self.required_correct = self.required_correct.clamp(1, 10);
        self.memorization_secs = self.memorization_secs.clamp(5, 600);
        self.feedback_delay_ms = self.feedback_delay_ms.clamp(200, 10_000);
        if self.theme.trim().is_empty() {
            self.theme = default_theme();
        }
        if self.log_level.trim().is_empty() {
            self.log_level = default_log_level();
        }
    }
}
