use tracing::debug;

use crate::page::{Api, Page, PageUi};

/// Asks the server once whether alerts are waiting and badges the bell if so
///
/// Failures are only logged, the badge is a hint. Returns whether there were
/// alerts
pub async fn check_pending_alerts<P: Page>(page: &P, endpoint: &str) -> bool {
    let pending = match page.api().pending_alerts(endpoint).await {
        Ok(pending) => pending,
        Err(e) => {
            debug!("Checking pending alerts failed: {e}");
            return false;
        }
    };

    if !pending.has_alerts() {
        return false;
    }

    let ui = page.ui();
    if !ui.has_alert_badge() {
        debug!("{} pending alerts", pending.count);
        ui.add_alert_badge();
    }
    true
}
