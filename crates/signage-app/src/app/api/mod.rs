mod app_specific;
mod display;

use salvo::Router;

// Re-export route constants from core
pub use signage_core::constants::{
    API_ROUTE_COMPONENT, API_ROUTE_PREFIX, DISPLAY_ROUTE_COMPONENT, DISPLAY_ROUTE_PREFIX,
};

/// ## Summary
/// Constructs the API router: health checks and display control.
#[must_use]
pub fn routes() -> Router {
    Router::with_path(API_ROUTE_COMPONENT)
        .push(app_specific::routes())
        .push(display::routes())
}
