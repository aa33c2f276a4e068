use serde::{Deserialize, Serialize};
use shared::{api::STATIC_BASE_PATH, ServiceWorkerPackage};

pub use crate::notification::NotificationConfig;
use crate::generation::GenerationId;

/// Everything about a deployment the worker needs to know
///
/// Missing fields take their defaults, so an empty object is a valid config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Prefix of every generation name
    pub cache_prefix: String,
    /// Requests under this path are served cache first
    pub static_prefix: String,
    pub package: ServiceWorkerPackage,
    pub notification: NotificationConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            cache_prefix: "finai".to_string(),
            static_prefix: STATIC_BASE_PATH.to_string(),
            package: ServiceWorkerPackage::default(),
            notification: NotificationConfig::default(),
        }
    }
}

impl WorkerConfig {
    pub fn generation_id(&self) -> GenerationId {
        GenerationId::for_package(&self.cache_prefix, &self.package)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_partial_config() {
        let config: WorkerConfig =
            serde_json::from_str(r#"{"notification":{"title":"Budget bot"},"package":{"version":"3","files":[],"offline":{"path":"/offline/"}}}"#)
                .unwrap();

        assert_eq!(config.cache_prefix, "finai");
        assert_eq!(config.static_prefix, "/static/");
        assert_eq!(config.notification.title, "Budget bot");
        assert_eq!(config.notification.tag, "finai-alert");
        assert!(config.generation_id().as_str().starts_with("finai-v3-"));

        let empty: WorkerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, WorkerConfig::default());
    }
}
