use std::time::Duration;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use config::Config;
use serde::Deserialize;

use crate::constants::{
    DEFAULT_FETCH_RETRIES, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_RELOAD_INTERVAL_SECS,
    DEFAULT_TICKER_FADE_MS, DEFAULT_TICKER_PERIOD_MS,
};
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub display: DisplayConfig,
    pub ticker: TickerConfig,
    pub reload: ReloadConfig,
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds between browser refreshes of the rendered page; `0` disables.
    pub refresh_secs: u32,
}

impl ServerConfig {
    /// ## Summary
    /// Returns the bind address in the format "host:port".
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// Viewport width in pixels.
    pub width: f64,
    /// Viewport height in pixels.
    pub height: f64,
    /// Rendered height of a panel heading in pixels.
    pub heading_height: f64,
    /// Pixels per `em` when resolving style lengths.
    pub font_size: f64,
    /// IANA timezone the display's wall clock runs in.
    pub timezone: String,
    /// Path of the declarative layout file.
    pub layout_path: String,
}

impl DisplayConfig {
    /// ## Summary
    /// Resolves the configured IANA timezone.
    ///
    /// ## Errors
    /// Returns an error if the timezone identifier is unknown.
    pub fn tz(&self) -> CoreResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_err| CoreError::UnknownTimezone(self.timezone.clone()))
    }

    /// ## Summary
    /// Returns the current calendar day on the display's wall clock.
    ///
    /// ## Errors
    /// Returns an error if the timezone identifier is unknown.
    pub fn today(&self) -> CoreResult<NaiveDate> {
        Ok(Utc::now().with_timezone(&self.tz()?).date_naive())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TickerConfig {
    pub period_ms: u64,
    pub fade_ms: u64,
}

impl TickerConfig {
    #[must_use]
    pub const fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    #[must_use]
    pub const fn fade(&self) -> Duration {
        Duration::from_millis(self.fade_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReloadConfig {
    pub interval_secs: u64,
    /// Panel ids skipped by periodic data reloads.
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl ReloadConfig {
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProvidersConfig {
    pub menu_url: String,
    pub calendar_base_url: String,
    pub calendar_api_key: Option<String>,
    pub movie_lookup_url: Option<String>,
    pub movie_lookup_key: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl ProvidersConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Settings {
    /// ## Summary
    /// Loads configuration from `.env` file and environment variables into a `Settings`.
    /// Environment variables take precedence over `.env` file values.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.refresh_secs", 0)?
            .set_default("logging.level", "debug")?
            .set_default("display.width", 1920.0)?
            .set_default("display.height", 1080.0)?
            .set_default("display.heading_height", 48.0)?
            .set_default("display.font_size", 16.0)?
            .set_default("display.timezone", "Pacific/Honolulu")?
            .set_default("display.layout_path", "layout.json")?
            .set_default("ticker.period_ms", DEFAULT_TICKER_PERIOD_MS)?
            .set_default("ticker.fade_ms", DEFAULT_TICKER_FADE_MS)?
            .set_default("reload.interval_secs", DEFAULT_RELOAD_INTERVAL_SECS)?
            .set_default("reload.exclude", vec!["video"])?
            .set_default("providers.menu_url", "http://api.ywamconnect.net/menu/get.php")?
            .set_default(
                "providers.calendar_base_url",
                "https://www.googleapis.com/calendar/v3",
            )?
            .set_default("providers.timeout_secs", DEFAULT_FETCH_TIMEOUT_SECS)?
            .set_default("providers.max_retries", DEFAULT_FETCH_RETRIES)?
            // Env file
            .add_source(
                config::Environment::default()
                    .convert_case(config::Case::Snake)
                    .separator("_")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            .build()?
            .try_deserialize::<Settings>()?;

        settings.validate()?;
        Ok(settings)
    }

    /// ## Summary
    /// Checks cross-field constraints that deserialization cannot express.
    ///
    /// ## Errors
    /// Returns an error if the fade is not shorter than the rotation period,
    /// or if the timezone is unknown.
    pub fn validate(&self) -> CoreResult<()> {
        if self.ticker.fade_ms >= self.ticker.period_ms {
            return Err(CoreError::ConfigError(format!(
                "ticker.fade_ms ({}) must be shorter than ticker.period_ms ({})",
                self.ticker.fade_ms, self.ticker.period_ms
            )));
        }
        self.display.tz()?;
        Ok(())
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    Settings::load()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn display(timezone: &str) -> DisplayConfig {
        DisplayConfig {
            width: 1920.0,
            height: 1080.0,
            heading_height: 48.0,
            font_size: 16.0,
            timezone: timezone.to_string(),
            layout_path: "layout.json".to_string(),
        }
    }

    #[test]
    fn resolves_known_timezone() {
        assert!(display("Pacific/Honolulu").tz().is_ok());
    }

    #[test]
    fn rejects_unknown_timezone() {
        let err = display("Mars/Olympus_Mons").tz().expect_err("unknown tz");
        assert!(matches!(err, CoreError::UnknownTimezone(_)));
    }

    #[test]
    fn ticker_durations() {
        let ticker = TickerConfig {
            period_ms: 10_000,
            fade_ms: 400,
        };
        assert_eq!(ticker.period(), Duration::from_secs(10));
        assert_eq!(ticker.fade(), Duration::from_millis(400));
    }
}
