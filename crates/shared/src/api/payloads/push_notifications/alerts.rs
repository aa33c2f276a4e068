use serde::{Deserialize, Serialize};

/// Response of the pending alerts check endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PendingAlertsResponse {
    pub count: i64,
    #[serde(default)]
    pub messages: Vec<String>,
}

impl PendingAlertsResponse {
    pub fn has_alerts(&self) -> bool {
        self.count > 0
    }
}
