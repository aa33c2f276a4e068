use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What the server sends through the push transport
///
/// Every field is optional, the worker fills the gaps from its own defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PushPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl PushPayload {
    /// Leniently reads a payload
    ///
    /// Fields are picked one by one so a single bad field doesn't throw away
    /// the rest. Anything that isn't a json object, and any field that isn't a
    /// string, is treated as missing. Unknown fields are ignored
    pub fn from_json(bytes: &[u8]) -> Self {
        let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(bytes) else {
            return Self::default();
        };

        let field = |name: &str| map.get(name).and_then(Value::as_str).map(str::to_string);

        Self {
            title: field("title"),
            body: field("body"),
            url: field("url"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationData {
    pub url: String,
}

/// A notification as handed to the OS notification surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
    pub renotify: bool,
    pub data: NotificationData,
}
