use std::time::Duration;

use crate::orchestrator::PollSettings;

#[derive(Debug, Clone)]
pub struct Config {
    /// Port the runner listens on
    pub port: u16,
    /// Base URL of the actor platform API
    pub platform_base_url: String,
    /// Timeout applied to each individual platform call
    pub platform_request_timeout: Duration,
    /// Sleep between two status polls of one run
    pub poll_interval: Duration,
    /// Status polls allowed before a run is reported as timed out
    pub max_poll_attempts: u32,
    /// Origins allowed by CORS. Empty means any origin.
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: env_parse("RUNNER_PORT", 8080)?,
            platform_base_url: env_str("PLATFORM_BASE_URL", "https://api.apify.com"),
            platform_request_timeout: Duration::from_secs(env_parse(
                "PLATFORM_REQUEST_TIMEOUT_SECS",
                60,
            )?),
            poll_interval: Duration::from_secs(env_parse("RUN_POLL_INTERVAL_SECS", 5)?),
            max_poll_attempts: env_parse("RUN_MAX_POLL_ATTEMPTS", 60)?,
            cors_allowed_origins: env_csv("RUNNER_CORS_ALLOWED_ORIGINS", &[]),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings::new(self.poll_interval, self.max_poll_attempts)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.max_poll_attempts == 0 {
            anyhow::bail!("RUN_MAX_POLL_ATTEMPTS must be at least 1");
        }
        if self.platform_base_url.trim().is_empty() {
            anyhow::bail!("PLATFORM_BASE_URL must not be empty");
        }
        Ok(())
    }
}

fn env_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Failed to parse env var {key}={val}: {e}")),
        Err(_) => Ok(default),
    }
}

fn env_csv(key: &str, default: &[&str]) -> Vec<String> {
    match std::env::var(key) {
        Ok(raw) => split_csv(&raw),
        Err(_) => default.iter().map(|s| (*s).to_string()).collect(),
    }
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            port: 8080,
            platform_base_url: "https://api.apify.com".to_string(),
            platform_request_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_secs(5),
            max_poll_attempts: 60,
            cors_allowed_origins: Vec::new(),
        }
    }

    #[test]
    fn test_poll_settings_follow_config() {
        let mut config = sample();
        config.poll_interval = Duration::from_millis(250);
        config.max_poll_attempts = 4;
        let settings = config.poll_settings();
        assert_eq!(settings.interval, Duration::from_millis(250));
        assert_eq!(settings.max_attempts, 4);
        assert_eq!(sample().poll_settings(), PollSettings::default());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut config = sample();
        config.max_poll_attempts = 0;
        assert!(config.validate().is_err());
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_split_csv_skips_blanks() {
        assert_eq!(
            split_csv(" http://a.test, ,http://b.test "),
            vec!["http://a.test", "http://b.test"]
        );
        assert!(split_csv("").is_empty());
    }

    #[test]
    fn test_missing_env_uses_default() {
        let value: u32 = env_parse("RUNNER_TEST_SURELY_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
        assert_eq!(env_csv("RUNNER_TEST_SURELY_UNSET_VARIABLE", &["x"]), vec!["x"]);
    }
}
