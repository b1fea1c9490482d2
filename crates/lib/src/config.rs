//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.callsync/config.json`) and environment.
//! Credentials resolve env-first so tokens never have to live on disk; everything
//! else (property names, anchor token) has working defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Telegram channel settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Notion record-store settings.
    #[serde(default)]
    pub notion: NotionConfig,

    /// Chat-title matching settings.
    #[serde(default)]
    pub matcher: MatcherConfig,
}

/// Telegram channel config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramConfig {
    /// Bot token from BotFather. Overridden by TELEGRAM_BOT_TOKEN env when set.
    pub bot_token: Option<String>,
}

/// Notion API config: credentials, target database, and the property names
/// this bot reads and writes on each client page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotionConfig {
    /// Integration token. Overridden by NOTION_TOKEN env when set.
    pub token: Option<String>,

    /// Id of the client database. Overridden by NOTION_DATABASE_ID env when set.
    pub database_id: Option<String>,

    /// API base URL override (default https://api.notion.com). Used by tests.
    pub api_base: Option<String>,

    /// Page property names and the completed-status value.
    #[serde(default)]
    pub properties: NotionProperties,
}

/// Names of the Notion page properties the mutator touches. The client-name
/// property must be the database's title property; history is rich_text;
/// invite/permalink are url; status is a select.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotionProperties {
    #[serde(default = "default_client_name_property")]
    pub client_name: String,

    #[serde(default = "default_status_property")]
    pub status: String,

    /// Select value written to the status property after a summary is filed.
    #[serde(default = "default_completed_status")]
    pub completed_status: String,

    #[serde(default = "default_history_property")]
    pub history: String,

    #[serde(default = "default_invite_link_property")]
    pub invite_link: String,

    #[serde(default = "default_permalink_property")]
    pub permalink: String,
}

fn default_client_name_property() -> String {
    "Client name".to_string()
}

fn default_status_property() -> String {
    "Lead status".to_string()
}

fn default_completed_status() -> String {
    "Meeting held".to_string()
}

fn default_history_property() -> String {
    "Last call".to_string()
}

fn default_invite_link_property() -> String {
    "Chat invite".to_string()
}

fn default_permalink_property() -> String {
    "Call message".to_string()
}

impl Default for NotionProperties {
    fn default() -> Self {
        Self {
            client_name: default_client_name_property(),
            status: default_status_property(),
            completed_status: default_completed_status(),
            history: default_history_property(),
            invite_link: default_invite_link_property(),
            permalink: default_permalink_property(),
        }
    }
}

/// Chat-title matching config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatcherConfig {
    /// The organization's own name as it appears in chat titles; used to
    /// detect which side of the separator is the client name.
    #[serde(default = "default_anchor")]
    pub anchor: String,
}

fn default_anchor() -> String {
    "WeDo".to_string()
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            anchor: default_anchor(),
        }
    }
}

fn env_or(var: &str, fallback: Option<&String>) -> Option<String> {
    std::env::var(var)
        .ok()
        .and_then(|s| {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        })
        .or_else(|| {
            fallback
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

/// Resolve the Telegram bot token: env TELEGRAM_BOT_TOKEN overrides config.
pub fn resolve_telegram_token(config: &Config) -> Option<String> {
    env_or("TELEGRAM_BOT_TOKEN", config.telegram.bot_token.as_ref())
}

/// Resolve the Notion integration token: env NOTION_TOKEN overrides config.
pub fn resolve_notion_token(config: &Config) -> Option<String> {
    env_or("NOTION_TOKEN", config.notion.token.as_ref())
}

/// Resolve the client database id: env NOTION_DATABASE_ID overrides config.
pub fn resolve_database_id(config: &Config) -> Option<String> {
    env_or("NOTION_DATABASE_ID", config.notion.database_id.as_ref())
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("CALLSYNC_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".callsync").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the default path (or CALLSYNC_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

/// Credentials and ids the pipeline cannot run without. Resolved once at
/// startup; missing values are a fatal configuration error.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub telegram_token: String,
    pub notion_token: String,
    pub database_id: String,
}

/// Resolve all required credentials or fail with a message naming what is missing.
pub fn resolve_credentials(config: &Config) -> Result<Credentials> {
    let telegram_token = resolve_telegram_token(config)
        .context("telegram bot token not configured (set TELEGRAM_BOT_TOKEN or telegram.botToken)")?;
    let notion_token = resolve_notion_token(config)
        .context("notion token not configured (set NOTION_TOKEN or notion.token)")?;
    let database_id = resolve_database_id(config)
        .context("notion database id not configured (set NOTION_DATABASE_ID or notion.databaseId)")?;
    Ok(Credentials {
        telegram_token,
        notion_token,
        database_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_property_names() {
        let p = NotionProperties::default();
        assert_eq!(p.client_name, "Client name");
        assert_eq!(p.status, "Lead status");
        assert_eq!(p.completed_status, "Meeting held");
        assert_eq!(p.history, "Last call");
    }

    #[test]
    fn default_anchor_is_org_name() {
        assert_eq!(MatcherConfig::default().anchor, "WeDo");
    }

    #[test]
    fn parse_partial_config_fills_defaults() {
        let config: Config = serde_json::from_str(
            r#"{ "notion": { "databaseId": "db-1", "properties": { "status": "Stage" } } }"#,
        )
        .unwrap();
        assert_eq!(config.notion.database_id.as_deref(), Some("db-1"));
        assert_eq!(config.notion.properties.status, "Stage");
        assert_eq!(config.notion.properties.history, "Last call");
        assert_eq!(config.matcher.anchor, "WeDo");
    }

    #[test]
    fn env_value_overrides_config_fallback() {
        // Test-unique variable name so parallel tests cannot race on it.
        let var = "CALLSYNC_TEST_ENV_OR_OVERRIDE";
        let fallback = "from-config".to_string();
        std::env::set_var(var, "from-env");
        assert_eq!(env_or(var, Some(&fallback)).as_deref(), Some("from-env"));
        std::env::remove_var(var);
    }

    #[test]
    fn blank_env_value_falls_through_to_config() {
        let var = "CALLSYNC_TEST_ENV_OR_BLANK";
        let fallback = "from-config".to_string();
        std::env::set_var(var, "   ");
        assert_eq!(env_or(var, Some(&fallback)).as_deref(), Some("from-config"));
        std::env::remove_var(var);
        assert_eq!(env_or(var, Some(&fallback)).as_deref(), Some("from-config"));
        assert_eq!(env_or(var, None), None);
    }

    #[test]
    fn resolve_credentials_reports_missing_token() {
        let config = Config::default();
        // No env in test runner is expected to carry these; if one does, skip.
        if std::env::var("TELEGRAM_BOT_TOKEN").is_ok() {
            return;
        }
        let err = resolve_credentials(&config).unwrap_err();
        assert!(err.to_string().contains("telegram bot token"));
    }
}
