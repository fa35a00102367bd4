use std::str::FromStr;
use std::time::Duration;

/// Default scheduling service URL.
/// Override at build time: SCHEDULER_API_URL=https://example.com cargo build
pub const DEFAULT_API_BASE_URL: &str = match option_env!("SCHEDULER_API_URL") {
    Some(url) => url,
    None => "https://meeting-scheduler-backend.fly.dev",
};

pub const DEFAULT_FETCH_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Language used for fallback error messages when the server gives no detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Ja,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "ja" => Ok(Locale::Ja),
            other => Err(format!("unsupported locale: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    /// Total attempts for a meeting fetch, including the first one.
    pub fetch_retries: u32,
    pub retry_delay: Duration,
    pub locale: Locale,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            fetch_retries: DEFAULT_FETCH_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            locale: Locale::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Invalid values are
    /// logged and replaced by their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_base_url = match lookup("SCHEDULER_API_URL") {
            Some(raw) => match url::Url::parse(raw.trim()) {
                Ok(_) => raw.trim().trim_end_matches('/').to_string(),
                Err(e) => {
                    log::warn!("Ignoring SCHEDULER_API_URL={:?}: {}", raw, e);
                    defaults.api_base_url
                }
            },
            None => defaults.api_base_url,
        };

        let fetch_retries = parse_or(&lookup, "SCHEDULER_FETCH_RETRIES", defaults.fetch_retries)
            .max(1);
        let retry_delay = Duration::from_millis(parse_or(
            &lookup,
            "SCHEDULER_RETRY_DELAY_MS",
            defaults.retry_delay.as_millis() as u64,
        ));
        let locale = parse_or(&lookup, "SCHEDULER_LOCALE", defaults.locale);

        Self {
            api_base_url,
            fetch_retries,
            retry_delay,
            locale,
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            log::warn!("Ignoring {}={:?}: {}", key, raw, e);
            default
        }),
        None => default,
    }
}
