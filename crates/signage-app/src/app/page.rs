use salvo::http::StatusCode;
use salvo::writing::{Json, Text};
use salvo::{Depot, Response, Router, handler};
use tracing::error;

use super::ErrorResponse;
use crate::config::get_config_from_depot;
use crate::display_handler::get_display_from_depot;

/// ## Summary
/// Serves the display page as a complete HTML document.
#[handler]
async fn document(depot: &mut Depot, res: &mut Response) {
    let settings = match get_config_from_depot(depot) {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = ?e, "Failed to get configuration");
            res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
            res.render(Json(ErrorResponse {
                error: "Internal server error".to_string(),
            }));
            return;
        }
    };
    let display = match get_display_from_depot(depot) {
        Ok(display) => display,
        Err(e) => {
            error!(error = ?e, "Failed to get display");
            res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
            res.render(Json(ErrorResponse {
                error: "Internal server error".to_string(),
            }));
            return;
        }
    };

    res.render(Text::Html(
        display.render_document(settings.server.refresh_secs),
    ));
}

#[must_use]
pub fn routes() -> Router {
    Router::new().get(document)
}
