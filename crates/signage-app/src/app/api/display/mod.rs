//! Control endpoints for the running display.

use salvo::Router;
use signage_core::constants::DISPLAY_ROUTE_COMPONENT;

mod reload;
mod video;

#[must_use]
pub fn routes() -> Router {
    Router::with_path(DISPLAY_ROUTE_COMPONENT)
        .push(video::routes())
        .push(reload::routes())
}
