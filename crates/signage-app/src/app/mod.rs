pub mod api;
mod page;

use salvo::Router;
use serde::Serialize;

/// ## Summary
/// Error response payload
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// ## Summary
/// Constructs the full router: the rendered page at `/` and the API below
/// it.
#[must_use]
pub fn routes() -> Router {
    Router::new().push(page::routes()).push(api::routes())
}
