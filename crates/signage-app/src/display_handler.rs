use std::sync::Arc;

use salvo::async_trait;
use signage_core::error::CoreError;
use signage_display::Display;

use crate::error::AppResult;

/// Makes the running display available to every handler.
pub struct DisplayHandler {
    pub display: Arc<Display>,
}

#[async_trait]
impl salvo::Handler for DisplayHandler {
    #[tracing::instrument(skip(self, _req, depot, _res, _ctrl))]
    async fn handle(
        &self,
        _req: &mut salvo::Request,
        depot: &mut salvo::Depot,
        _res: &mut salvo::Response,
        _ctrl: &mut salvo::FlowCtrl,
    ) {
        depot.inject(Arc::clone(&self.display));
    }
}

/// ## Summary
/// Retrieves the display from the depot.
///
/// ## Errors
/// Returns an error if the display is not found in the depot.
pub fn get_display_from_depot(depot: &salvo::Depot) -> AppResult<Arc<Display>> {
    depot
        .obtain::<Arc<Display>>()
        .cloned()
        .map_err(|_err| CoreError::InvariantViolation("Display not found in depot").into())
}
