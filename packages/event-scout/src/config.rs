use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::domains::channels::reader::DEFAULT_PREVIEW_BASE;
use crate::pipeline::PipelineSettings;

/// Longest accepted staleness horizon, roughly a century.
const MAX_HORIZON_DAYS: i64 = 36_500;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub channels_path: PathBuf,
    pub poll_interval: Duration,
    pub staleness_horizon_days: i64,
    pub fetch_limit: usize,
    pub source_concurrency: usize,
    pub classifier_api_key: Option<String>,
    pub classifier_base_url: String,
    pub classifier_model: String,
    pub classifier_timeout: Duration,
    pub classifier_prompt_path: Option<PathBuf>,
    pub telegram_bot_token: Option<String>,
    pub telegram_bot_chat_id: Option<i64>,
    pub telegram_api_base: String,
    pub channel_preview_base: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present, otherwise the checked-in sample
        if dotenvy::dotenv().is_err() {
            let _ = dotenvy::from_filename("env.sample");
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let or = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let poll_interval = match var("POLL_INTERVAL_SECONDS") {
            Some(seconds) => secs(&seconds).context("POLL_INTERVAL_SECONDS must be a non-negative number")?,
            None => {
                let minutes = or("POLL_INTERVAL_MINUTES", "30");
                secs(&minutes)
                    .map(|d| d * 60)
                    .context("POLL_INTERVAL_MINUTES must be a non-negative number")?
            }
        };

        let staleness_horizon_days: i64 = parse(&or("STALENESS_HORIZON_DAYS", "7"))
            .context("STALENESS_HORIZON_DAYS must be a valid number")?;
        anyhow::ensure!(
            (0..=MAX_HORIZON_DAYS).contains(&staleness_horizon_days),
            "STALENESS_HORIZON_DAYS must be between 0 and {}",
            MAX_HORIZON_DAYS
        );

        Ok(Self {
            database_url: or("DATABASE_URL", "sqlite://database.db?mode=rwc"),
            channels_path: PathBuf::from(or("CHANNELS_PATH", "channels.json")),
            poll_interval,
            staleness_horizon_days,
            fetch_limit: parse(&or("FETCH_LIMIT", "50"))
                .context("FETCH_LIMIT must be a valid number")?,
            source_concurrency: parse::<usize>(&or("SOURCE_CONCURRENCY", "1"))
                .context("SOURCE_CONCURRENCY must be a valid number")?
                .max(1),
            classifier_api_key: var("CLASSIFIER_API_KEY"),
            classifier_base_url: or("CLASSIFIER_BASE_URL", openai_client::DEFAULT_BASE_URL),
            classifier_model: or("CLASSIFIER_MODEL", "gpt-4o-mini"),
            classifier_timeout: Duration::from_secs(
                parse(&or("CLASSIFIER_TIMEOUT_SECONDS", "60"))
                    .context("CLASSIFIER_TIMEOUT_SECONDS must be a valid number")?,
            ),
            classifier_prompt_path: var("CLASSIFIER_PROMPT_PATH").map(PathBuf::from),
            telegram_bot_token: var("TELEGRAM_BOT_TOKEN"),
            telegram_bot_chat_id: var("TELEGRAM_BOT_CHAT_ID")
                .map(|id| parse::<i64>(&id))
                .transpose()
                .context("TELEGRAM_BOT_CHAT_ID must be a valid chat id")?,
            telegram_api_base: or("TELEGRAM_API_BASE", telegram::DEFAULT_API_BASE),
            channel_preview_base: or("CHANNEL_PREVIEW_BASE", DEFAULT_PREVIEW_BASE),
        })
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            staleness_horizon_days: self.staleness_horizon_days,
            fetch_limit: self.fetch_limit,
            source_concurrency: self.source_concurrency,
        }
    }
}

fn parse<T>(raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(raw.parse::<T>()?)
}

fn secs(raw: &str) -> Result<Duration> {
    let value: f64 = parse(raw)?;
    Ok(Duration::try_from_secs_f64(value)?)
}
