use salvo::http::StatusCode;
use salvo::writing::Json;
use salvo::{Depot, Response, Router, handler};
use serde::Serialize;
use signage_core::constants::VIDEO_ENDED_COMPONENT;
use tracing::error;

use crate::app::ErrorResponse;
use crate::display_handler::get_display_from_depot;

/// ## Summary
/// Clip change response payload
#[derive(Debug, Serialize)]
pub struct NextVideoResponse {
    /// Clip now playing, `None` when no player is mounted.
    pub source: Option<String>,
}

/// ## Summary
/// Called by the page when a clip ends. Runs the work deferred to the clip
/// boundary and moves the player on.
#[handler]
async fn video_ended(depot: &mut Depot, res: &mut Response) {
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

    let source = display.video().next_video();
    tracing::debug!(source = ?source, "Clip ended");
    res.render(Json(NextVideoResponse { source }));
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(VIDEO_ENDED_COMPONENT).post(video_ended)
}
