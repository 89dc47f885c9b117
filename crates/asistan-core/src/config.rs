use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{AsistanError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub brain: BrainConfig,
    #[serde(default)]
    pub intent: IntentConfig,
    #[serde(default)]
    pub integrations: IntegrationsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub token: String,
    /// Users allowed to talk to the bot. Empty means everyone.
    #[serde(default)]
    pub allowed_user_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_provider")]
    pub provider: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    /// Number of stored messages sent back to the model as history.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

fn default_llm_provider() -> String {
    "gemini".to_string()
}

fn default_llm_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_system_prompt() -> String {
    "Sen bir araba galerisi sahibinin kişisel asistanısın. Kısa, samimi ve \
     Türkçe cevap ver. Araba alım satımı, finans ve günlük planlama konularında \
     yardımcı ol."
        .to_string()
}

fn default_history_window() -> usize {
    20
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            model: default_llm_model(),
            api_key: String::new(),
            system_prompt: default_system_prompt(),
            history_window: default_history_window(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
    #[serde(default)]
    pub turso_url: String,
    #[serde(default)]
    pub turso_token: String,
}

fn default_db_path() -> String {
    "asistan.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            turso_url: String::new(),
            turso_token: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrainConfig {
    /// UTC offset in hours (e.g., 3 for TRT/UTC+3).
    #[serde(default = "default_timezone_offset")]
    pub timezone_offset: i32,
    /// Seconds between reminder polls.
    #[serde(default = "default_reminder_poll_secs")]
    pub reminder_poll_secs: u64,
    /// Reminders whose message is shorter than this (in chars) are rejected.
    #[serde(default = "default_min_reminder_chars")]
    pub min_reminder_chars: usize,
}

fn default_timezone_offset() -> i32 {
    3 // TRT (UTC+3)
}

fn default_reminder_poll_secs() -> u64 {
    60
}

fn default_min_reminder_chars() -> usize {
    3
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            timezone_offset: default_timezone_offset(),
            reminder_poll_secs: default_reminder_poll_secs(),
            min_reminder_chars: default_min_reminder_chars(),
        }
    }
}

/// How a message carrying both income and expense keywords is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Income when a sale/commission word is present, expense otherwise.
    #[default]
    SaleWeighted,
    /// Always expense.
    Expense,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntentConfig {
    #[serde(default)]
    pub tie_break: TieBreak,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntegrationsConfig {
    #[serde(default)]
    pub google: GoogleConfig,
    #[serde(default)]
    pub server: IntegrationServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_callback_url")]
    pub callback_url: String,
    /// Length of calendar events created for reminders.
    #[serde(default = "default_event_minutes")]
    pub event_minutes: i64,
}

fn default_callback_url() -> String {
    "http://localhost:8080/oauth/callback".to_string()
}

fn default_event_minutes() -> i64 {
    60
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            callback_url: default_callback_url(),
            event_minutes: default_event_minutes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationServerConfig {
    #[serde(default = "default_server_port")]
    pub port: u16,
}

fn default_server_port() -> u16 {
    8080
}

impl Default for IntegrationServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load config: defaults → asistan.toml → env vars (env wins).
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .map_err(|e| AsistanError::Config(format!("failed to read config: {e}")))?;
            Self::parse(&content)?
        } else {
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| AsistanError::Config(format!("failed to parse config: {e}")))
    }

    /// Override secrets from the environment. `lookup` is `std::env::var` in production.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("ASISTAN_TELEGRAM_TOKEN") {
            self.telegram.token = v;
        }
        if let Some(v) = lookup("ASISTAN_LLM_API_KEY") {
            self.llm.api_key = v;
        }
        if let Some(v) = lookup("ASISTAN_TURSO_URL") {
            self.database.turso_url = v;
        }
        if let Some(v) = lookup("ASISTAN_TURSO_TOKEN") {
            self.database.turso_token = v;
        }
        if let Some(v) = lookup("ASISTAN_GOOGLE_CLIENT_ID") {
            self.integrations.google.client_id = v;
        }
        if let Some(v) = lookup("ASISTAN_GOOGLE_CLIENT_SECRET") {
            self.integrations.google.client_secret = v;
        }
        if let Some(v) = lookup("ASISTAN_LOG") {
            self.logging.level = v;
        }
    }

    pub fn google_enabled(&self) -> bool {
        !self.integrations.google.client_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.brain.timezone_offset, 3);
        assert_eq!(config.brain.reminder_poll_secs, 60);
        assert_eq!(config.llm.provider, "gemini");
        assert_eq!(config.intent.tie_break, TieBreak::SaleWeighted);
        assert!(config.telegram.allowed_user_ids.is_empty());
        assert!(!config.google_enabled());
    }

    #[test]
    fn test_parse_partial_file_keeps_defaults() {
        let config = Config::parse(
            r#"
            [telegram]
            token = "abc"
            allowed_user_ids = [42]

            [intent]
            tie_break = "expense"
            "#,
        )
        .unwrap();
        assert_eq!(config.telegram.token, "abc");
        assert_eq!(config.telegram.allowed_user_ids, vec![42]);
        assert_eq!(config.intent.tie_break, TieBreak::Expense);
        assert_eq!(config.database.path, "asistan.db");
        assert_eq!(config.integrations.google.event_minutes, 60);
    }

    #[test]
    fn test_parse_invalid_toml() {
        let err = Config::parse("telegram = [").unwrap_err();
        assert!(matches!(err, AsistanError::Config(_)));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = Config::parse("[telegram]\ntoken = \"from-file\"").unwrap();
        config.apply_env(|key| match key {
            "ASISTAN_TELEGRAM_TOKEN" => Some("from-env".to_string()),
            "ASISTAN_GOOGLE_CLIENT_ID" => Some("client".to_string()),
            _ => None,
        });
        assert_eq!(config.telegram.token, "from-env");
        assert!(config.google_enabled());
    }
}
