//! Engine configuration from the environment

use std::time::Duration;

/// Delay before an assistant reply is appended
pub const DEFAULT_REPLY_DELAY: Duration = Duration::from_millis(1000);
pub const DEFAULT_LOG_FILTER: &str = "trade_assistant=info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub reply_delay: Duration,
    /// Seed for the series generator; fresh entropy when unset
    pub seed: Option<u64>,
    pub log_filter: String,
    pub log_json: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reply_delay: DEFAULT_REPLY_DELAY,
            seed: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            log_json: false,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unparseable values keep their
    /// defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let reply_delay = parse_var(&lookup, "TRADE_ASSISTANT_REPLY_DELAY_MS")
            .map_or(defaults.reply_delay, Duration::from_millis);
        let seed = parse_var(&lookup, "TRADE_ASSISTANT_SEED");
        let log_filter = lookup("TRADE_ASSISTANT_LOG")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.log_filter);
        let log_json = lookup("TRADE_ASSISTANT_LOG_JSON")
            .is_some_and(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"));

        Self {
            reply_delay,
            seed,
            log_filter,
            log_json,
        }
    }

    pub fn with_reply_delay(mut self, delay: Duration) -> Self {
        self.reply_delay = delay;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable configuration value");
            None
        }
    }
}
