use salvo::http::StatusCode;
use salvo::writing::Json;
use salvo::{Depot, Response, Router, handler};
use serde::Serialize;
use tracing::error;

use crate::app::ErrorResponse;
use crate::display_handler::get_display_from_depot;

/// ## Summary
/// Reload response payload
#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    /// Leaf panels whose loaders ran, in layout order.
    pub panels: Vec<String>,
}

/// ## Summary
/// Rebuilds the display at once, without waiting for the current clip.
#[handler]
async fn reload(depot: &mut Depot, res: &mut Response) {
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

    match display.reload() {
        Some(placement) => res.render(Json(ReloadResponse {
            panels: placement.leaves,
        })),
        None => {
            res.status_code(StatusCode::SERVICE_UNAVAILABLE);
            res.render(Json(ErrorResponse {
                error: "No layout installed".to_string(),
            }));
        }
    }
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("reload").post(reload)
}
