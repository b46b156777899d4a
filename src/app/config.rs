use crate::app::time::LocalClock;
use crate::progress::sync::RewardRates;
use anyhow::{bail, Context};
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://./data/progress.db";
pub const DEFAULT_PORT: u16 = 8787;
pub const DEFAULT_CURRENCY_DIVISOR: u32 = 5;
pub const DEFAULT_LEAGUE_POINT_DIVISOR: u32 = 10;
pub const DEFAULT_FLUSH_SETTLE_MS: u64 = 50;
pub const DEFAULT_UNLOCK_NOTIFY_DELAY_MS: u64 = 300;
pub const DEFAULT_FRAME_MS: u64 = 16;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub rewards: RewardRates,
    pub flush_settle: Duration,
    pub unlock_notify_delay: Duration,
    pub frame_interval: Duration,
    pub clock: LocalClock,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            port: DEFAULT_PORT,
            rewards: RewardRates {
                currency_divisor: DEFAULT_CURRENCY_DIVISOR,
                league_point_divisor: DEFAULT_LEAGUE_POINT_DIVISOR,
            },
            flush_settle: Duration::from_millis(DEFAULT_FLUSH_SETTLE_MS),
            unlock_notify_delay: Duration::from_millis(DEFAULT_UNLOCK_NOTIFY_DELAY_MS),
            frame_interval: Duration::from_millis(DEFAULT_FRAME_MS),
            clock: LocalClock::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            database_url: lookup("DATABASE_URL")
                .filter(|value| !value.trim().is_empty())
                .unwrap_or(defaults.database_url),
            port: parse_var(&lookup, "PORT")?.unwrap_or(defaults.port),
            rewards: RewardRates {
                currency_divisor: parse_var(&lookup, "CURRENCY_DIVISOR")?
                    .unwrap_or(defaults.rewards.currency_divisor),
                league_point_divisor: parse_var(&lookup, "LEAGUE_POINT_DIVISOR")?
                    .unwrap_or(defaults.rewards.league_point_divisor),
            },
            flush_settle: parse_var(&lookup, "FLUSH_SETTLE_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.flush_settle),
            unlock_notify_delay: parse_var(&lookup, "UNLOCK_NOTIFY_DELAY_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.unlock_notify_delay),
            frame_interval: parse_var(&lookup, "FRAME_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.frame_interval),
            clock: parse_var(&lookup, "UTC_OFFSET_MINUTES")?
                .map(LocalClock::new)
                .unwrap_or(defaults.clock),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.rewards.currency_divisor == 0 {
            bail!("CURRENCY_DIVISOR must be greater than zero");
        }
        if self.rewards.league_point_divisor == 0 {
            bail!("LEAGUE_POINT_DIVISOR must be greater than zero");
        }
        if self.frame_interval.is_zero() {
            bail!("FRAME_MS must be greater than zero");
        }
        if self.clock.utc_offset_minutes.abs() > 14 * 60 {
            bail!("UTC_OFFSET_MINUTES must be within +/-840");
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> anyhow::Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value = trimmed
        .parse::<T>()
        .with_context(|| format!("invalid {key}: {trimmed}"))?;
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.port, 8787);
        assert_eq!(config.rewards.currency_divisor, 5);
        assert_eq!(config.rewards.league_point_divisor, 10);
        assert_eq!(config.frame_interval, Duration::from_millis(16));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = config_from(&[
            ("PORT", "9000"),
            ("CURRENCY_DIVISOR", "4"),
            ("UTC_OFFSET_MINUTES", "-300"),
            ("FLUSH_SETTLE_MS", "0"),
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.rewards.currency_divisor, 4);
        assert_eq!(config.clock.utc_offset_minutes, -300);
        assert!(config.flush_settle.is_zero());
    }

    #[test]
    fn zero_divisor_is_rejected() {
        let err = config_from(&[("LEAGUE_POINT_DIVISOR", "0")]).unwrap_err();
        assert!(err.to_string().contains("LEAGUE_POINT_DIVISOR"));
    }

    #[test]
    fn garbage_values_name_the_variable() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
