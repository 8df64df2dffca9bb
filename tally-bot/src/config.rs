//! Startup configuration.
//!
//! Secrets and identity come from the environment (optionally via `.env`);
//! tunables come from `~/.tally/config.toml` and fall back to defaults.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tally_core::{ChatId, DEFAULT_SYMBOL};
use tally_store::StoreConfig;
use tracing::{debug, warn};

use crate::state::{config_path, ensure_tally_home};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreSection,
    pub bot: BotSection,
    pub report: ReportSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub table: String,
    pub id_column: String,
    pub monthly_total_rpc: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotSection {
    /// Server-side long-poll timeout
    pub poll_timeout_secs: u64,
    /// Pause after each processed batch
    pub idle_pause_ms: u64,
    /// Pause after a failed fetch
    pub error_backoff_secs: u64,
    pub recent_limit: usize,
    pub category_chart_top_k: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSection {
    pub cli_category_top_k: usize,
    pub currency_symbol: String,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            table: "expenses".to_string(),
            id_column: "id".to_string(),
            monthly_total_rpc: "get_monthly_total".to_string(),
        }
    }
}

impl Default for BotSection {
    fn default() -> Self {
        Self {
            poll_timeout_secs: 30,
            idle_pause_ms: 500,
            error_backoff_secs: 5,
            recent_limit: 10,
            category_chart_top_k: 5,
        }
    }
}

impl Default for ReportSection {
    fn default() -> Self {
        Self {
            cli_category_top_k: 3,
            currency_symbol: DEFAULT_SYMBOL.to_string(),
        }
    }
}

impl BotSection {
    pub fn idle_pause(&self) -> Duration {
        Duration::from_millis(self.idle_pause_ms)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_secs)
    }
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Write the default config unless one already exists. Returns whether it wrote.
pub fn init_config() -> Result<bool> {
    ensure_tally_home()?;
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(false);
    }
    save_config_to(&p, &Config::default())?;
    println!("Wrote {}", p.display());
    Ok(true)
}

/// Merge `.env` from the working directory (or a parent) into the process
/// environment. Existing variables win.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, "ignoring unreadable .env"),
    }
}

/// Values read from the process environment at startup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    pub bot_token: Option<String>,
    pub authorized_chat_id: Option<ChatId>,
    pub debug: bool,
}

/// What the chat bot needs beyond store access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotCredentials {
    pub token: String,
    pub authorized_chat: ChatId,
}

impl Environment {
    /// Read the process environment. Call [`load_dotenv`] first to pick up `.env`.
    pub fn from_process() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let authorized_chat_id = match get("TALLY_AUTHORIZED_CHAT_ID") {
            Some(raw) => Some(raw.parse::<ChatId>().with_context(|| {
                format!("TALLY_AUTHORIZED_CHAT_ID is not an integer: {raw}")
            })?),
            None => None,
        };

        Ok(Self {
            supabase_url: get("SUPABASE_URL"),
            supabase_key: get("SUPABASE_KEY"),
            bot_token: get("TELEGRAM_BOT_TOKEN").or_else(|| get("bot_token")),
            authorized_chat_id,
            debug: get("TALLY_DEBUG").is_some_and(|v| parse_bool(&v)),
        })
    }

    pub fn store_config(&self, cfg: &Config) -> Result<StoreConfig> {
        let Some(url) = self.supabase_url.clone() else {
            bail!("SUPABASE_URL is not set");
        };
        let Some(key) = self.supabase_key.clone() else {
            bail!("SUPABASE_KEY is not set");
        };
        Ok(StoreConfig {
            table: cfg.store.table.clone(),
            id_column: cfg.store.id_column.clone(),
            monthly_total_rpc: cfg.store.monthly_total_rpc.clone(),
            ..StoreConfig::new(url, key)
        })
    }

    pub fn bot_credentials(&self) -> Result<BotCredentials> {
        let Some(token) = self.bot_token.clone() else {
            bail!("TELEGRAM_BOT_TOKEN is not set");
        };
        let Some(authorized_chat) = self.authorized_chat_id else {
            bail!("TALLY_AUTHORIZED_CHAT_ID is not set");
        };
        Ok(BotCredentials {
            token,
            authorized_chat,
        })
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> Result<Environment> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn test_full_environment() {
        let env = env_from(&[
            ("SUPABASE_URL", "https://demo.supabase.co"),
            ("SUPABASE_KEY", "anon"),
            ("bot_token", "123:abc"),
            ("TALLY_AUTHORIZED_CHAT_ID", " 5515574299 "),
            ("TALLY_DEBUG", "true"),
        ])
        .unwrap();

        let creds = env.bot_credentials().unwrap();
        assert_eq!(creds.token, "123:abc");
        assert_eq!(creds.authorized_chat, 5515574299);
        assert!(env.debug);

        let mut cfg = Config::default();
        cfg.store.table = "labels".to_string();
        let store = env.store_config(&cfg).unwrap();
        assert_eq!(store.table, "labels");
        assert_eq!(store.key, "anon");
    }

    #[test]
    fn test_missing_values_are_errors() {
        let env = env_from(&[("SUPABASE_URL", "https://x")]).unwrap();
        let err = env.store_config(&Config::default()).unwrap_err();
        assert!(err.to_string().contains("SUPABASE_KEY"));
        assert!(env.bot_credentials().is_err());
        assert!(!env.debug);
    }

    #[test]
    fn test_bad_chat_id_is_fatal() {
        let err = env_from(&[("TALLY_AUTHORIZED_CHAT_ID", "me")]).unwrap_err();
        assert!(err.to_string().contains("not an integer"));
    }

    #[test]
    fn test_config_file_round_trip_and_partial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        assert_eq!(load_config_from(&path).unwrap(), Config::default());

        std::fs::write(&path, "[bot]\nrecent_limit = 5\n").unwrap();
        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.bot.recent_limit, 5);
        assert_eq!(cfg.bot.poll_timeout_secs, 30);
        assert_eq!(cfg.report.currency_symbol, "₹");

        save_config_to(&path, &cfg).unwrap();
        assert_eq!(load_config_from(&path).unwrap(), cfg);
    }
}
