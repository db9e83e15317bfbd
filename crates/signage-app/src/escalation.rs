//! Turns reload requests from failing providers into display refreshes.

use std::sync::Arc;

use signage_core::types::ReloadRequest;
use signage_display::Display;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

/// ## Summary
/// Refreshes `display` for every request received on `rx`.
///
/// The refresh waits for the current clip when a video is playing. The task
/// ends once every sender is dropped or the display is gone.
pub fn spawn_reload_listener(
    display: &Arc<Display>,
    mut rx: UnboundedReceiver<ReloadRequest>,
) -> JoinHandle<()> {
    let display = Arc::downgrade(display);
    tokio::spawn(async move {
        while let Some(request) = rx.recv().await {
            let Some(display) = display.upgrade() else {
                break;
            };
            display.request_refresh(&request.reason);
        }
        tracing::debug!("Reload listener stopped");
    })
}
