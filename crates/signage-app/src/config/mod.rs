//! Settings shared with the HTTP handlers.
//!
//! The page handler reads `server.refresh_secs` from here to stamp the
//! served document with its meta refresh.

use std::sync::Arc;

use salvo::async_trait;
use signage_core::config::Settings;
use signage_core::error::CoreError;

use crate::error::AppResult;

/// Makes the loaded settings available to every handler.
pub struct ConfigHandler {
    settings: Arc<Settings>,
}

impl ConfigHandler {
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Arc::new(settings),
        }
    }
}

#[async_trait]
impl salvo::Handler for ConfigHandler {
    #[tracing::instrument(skip(self, _req, depot, _res, _ctrl))]
    async fn handle(
        &self,
        _req: &mut salvo::Request,
        depot: &mut salvo::Depot,
        _res: &mut salvo::Response,
        _ctrl: &mut salvo::FlowCtrl,
    ) {
        depot.inject(Arc::clone(&self.settings));
    }
}

/// ## Summary
/// Retrieves the display settings from the depot.
///
/// ## Errors
/// Returns an error if no [`ConfigHandler`] ran before the caller.
pub fn get_config_from_depot(depot: &salvo::Depot) -> AppResult<Arc<Settings>> {
    depot
        .obtain::<Arc<Settings>>()
        .cloned()
        .map_err(|_err| CoreError::InvariantViolation("Configuration not found in depot").into())
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use salvo::{Depot, Response, Router, Service, handler};
    use signage_core::config::{
        DisplayConfig, LoggingConfig, ProvidersConfig, ReloadConfig, ServerConfig, TickerConfig,
    };

    use super::*;

    fn settings(refresh: u32) -> Settings {
        Settings {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5800,
                refresh_secs: refresh,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            display: DisplayConfig {
                width: 1920.0,
                height: 1080.0,
                heading_height: 40.0,
                font_size: 16.0,
                timezone: "Pacific/Honolulu".to_string(),
                layout_path: "layout.json".to_string(),
            },
            ticker: TickerConfig {
                period_ms: 10_000,
                fade_ms: 400,
            },
            reload: ReloadConfig {
                interval_secs: 900,
                exclude: vec!["video".to_string()],
            },
            providers: ProvidersConfig {
                menu_url: "http://menu.invalid/get.php".to_string(),
                calendar_base_url: "http://calendar.invalid/v3".to_string(),
                calendar_api_key: None,
                movie_lookup_url: None,
                movie_lookup_key: None,
                timeout_secs: 1,
                max_retries: 0,
            },
        }
    }

    #[handler]
    async fn refresh_secs(depot: &mut Depot, res: &mut Response) {
        let body = match get_config_from_depot(depot) {
            Ok(settings) => settings.server.refresh_secs.to_string(),
            Err(e) => e.to_string(),
        };
        res.render(body);
    }

    #[test_log::test]
    fn empty_depot_has_no_settings() {
        let depot = Depot::new();
        assert!(matches!(
            get_config_from_depot(&depot),
            Err(crate::error::AppError::CoreError(
                CoreError::InvariantViolation(_)
            ))
        ));
    }

    #[test_log::test(tokio::test)]
    async fn handlers_see_the_configured_refresh() {
        let router = Router::new()
            .hoop(ConfigHandler::new(settings(300)))
            .get(refresh_secs);

        let mut res = TestClient::get("http://127.0.0.1:5800/")
            .send(&Service::new(router))
            .await;

        assert_eq!(res.take_string().await.expect("body"), "300");
    }
}
