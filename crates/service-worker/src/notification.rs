use std::cell::RefCell;

use serde::{Deserialize, Serialize};
use shared::api::{
    payloads::{NotificationData, NotificationRecord, PushPayload},
    Asset, Object,
};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    environment::{ClientWindow, Clients, NotificationSurface},
    error::WorkerError,
};

/// Fills whatever a push payload leaves out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub title: String,
    pub body: String,
    pub url: String,
    pub icon: String,
    pub badge: String,
    /// Every notification shares this tag so a new one replaces the last
    pub tag: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            title: "FIN.AI".to_string(),
            body: "New financial alert".to_string(),
            url: Object::Dashboard.path().to_string(),
            icon: Asset::Icon192.path().to_string(),
            badge: Asset::Icon192.path().to_string(),
            tag: "finai-alert".to_string(),
        }
    }
}

impl NotificationConfig {
    pub fn render(&self, payload: PushPayload) -> NotificationRecord {
        NotificationRecord {
            title: payload.title.unwrap_or_else(|| self.title.clone()),
            body: payload.body.unwrap_or_else(|| self.body.clone()),
            icon: self.icon.clone(),
            badge: self.badge.clone(),
            tag: self.tag.clone(),
            renotify: true,
            data: NotificationData {
                url: payload.url.unwrap_or_else(|| self.url.clone()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClickAction {
    Focused(ClientWindow),
    Opened(Url),
}

pub struct NotificationAgent {
    config: NotificationConfig,
    origin: Url,
}

impl NotificationAgent {
    pub fn new(config: NotificationConfig, origin: Url) -> Self {
        Self { config, origin }
    }

    /// Shows a notification for a push. A missing or malformed payload still
    /// shows one, built from the defaults
    pub async fn on_push<S: NotificationSurface>(
        &self,
        surface: &S,
        data: Option<&[u8]>,
    ) -> Result<NotificationRecord, WorkerError> {
        let payload = data.map(PushPayload::from_json).unwrap_or_default();
        let record = self.config.render(payload);

        debug!("Showing notification {:?} ({})", record.title, record.tag);
        surface.show(&record).await?;
        Ok(record)
    }

    /// Brings the user to the notification's page, reusing an open window if
    /// one already shows it
    pub async fn on_notification_click<S: NotificationSurface, C: Clients>(
        &self,
        surface: &S,
        clients: &C,
        record: &NotificationRecord,
    ) -> Result<ClickAction, WorkerError> {
        if let Err(e) = surface.close(&record.tag).await {
            warn!("Failed to close notification {}: {e}", record.tag);
        }

        let target = self.target(record);
        let windows = clients.windows().await?;

        if let Some(window) = windows.into_iter().find(|w| w.url == target) {
            info!("Focusing {}", window.url);
            clients.focus(&window).await?;
            return Ok(ClickAction::Focused(window));
        }

        info!("Opening {target}");
        clients.open_window(&target).await?;
        Ok(ClickAction::Opened(target))
    }

    /// Relative urls are resolved against the worker origin. A missing url or
    /// one that doesn't parse falls back to the default
    fn target(&self, record: &NotificationRecord) -> Url {
        let url = match record.data.url.as_str() {
            "" => self.config.url.as_str(),
            url => url,
        };

        self.origin
            .join(url)
            .or_else(|e| {
                warn!("Bad notification url {:?}: {e}", record.data.url);
                self.origin.join(&self.config.url)
            })
            .unwrap_or_else(|_| self.origin.clone())
    }
}

/// In-process [`NotificationSurface`]
///
/// Showing a notification replaces the one with the same tag
#[derive(Debug, Default)]
pub struct NotificationTray {
    shown: RefCell<Vec<NotificationRecord>>,
}

impl NotificationTray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visible(&self) -> Vec<NotificationRecord> {
        self.shown.borrow().clone()
    }
}

impl NotificationSurface for NotificationTray {
    async fn show(&self, record: &NotificationRecord) -> Result<(), WorkerError> {
        let mut shown = self.shown.borrow_mut();
        shown.retain(|r| r.tag != record.tag);
        shown.push(record.clone());
        Ok(())
    }

    async fn close(&self, tag: &str) -> Result<(), WorkerError> {
        self.shown.borrow_mut().retain(|r| r.tag != tag);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testing::{origin, FakeClients};

    fn agent() -> NotificationAgent {
        NotificationAgent::new(NotificationConfig::default(), origin())
    }

    #[tokio::test]
    async fn test_defaults_fill_missing_payload() {
        let tray = NotificationTray::new();

        let record = agent().on_push(&tray, None).await.unwrap();
        assert_eq!(record.title, "FIN.AI");
        assert_eq!(record.body, "New financial alert");
        assert_eq!(record.data.url, "/dashboard/");
        assert_eq!(record.icon, "/static/icons/icon-192.png");
        assert_eq!(record.badge, "/static/icons/icon-192.png");
        assert!(record.renotify);

        let record = agent().on_push(&tray, Some(b"{oops")).await.unwrap();
        assert_eq!(record.title, "FIN.AI");
    }

    #[tokio::test]
    async fn test_payload_merges_over_defaults() {
        let tray = NotificationTray::new();
        let record = agent()
            .on_push(&tray, Some(br#"{"body":"Rent due tomorrow","priority":"high"}"#))
            .await
            .unwrap();

        assert_eq!(record.title, "FIN.AI");
        assert_eq!(record.body, "Rent due tomorrow");
        assert_eq!(record.data.url, "/dashboard/");
    }

    #[tokio::test]
    async fn test_notifications_coalesce_by_tag() {
        let tray = NotificationTray::new();
        let agent = agent();

        for i in 1..=5 {
            let payload = format!(r#"{{"title":"Alert {i}","url":"/journal/{i}/"}}"#);
            agent.on_push(&tray, Some(payload.as_bytes())).await.unwrap();
        }

        let visible = tray.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "Alert 5");
        assert_eq!(visible[0].data.url, "/journal/5/");
    }

    #[tokio::test]
    async fn test_click_focuses_existing_window() {
        let tray = NotificationTray::new();
        let clients = FakeClients::default()
            .with_window("https://finai.test/journal/")
            .with_window("https://finai.test/dashboard/");
        let agent = agent();
        let record = agent.on_push(&tray, None).await.unwrap();

        let action = agent.on_notification_click(&tray, &clients, &record).await.unwrap();
        assert!(matches!(action, ClickAction::Focused(ref w) if w.url.path() == "/dashboard/"));
        assert_eq!(clients.focused().len(), 1);
        assert!(clients.opened().is_empty());
        assert!(tray.visible().is_empty());
    }

    #[tokio::test]
    async fn test_click_opens_window_when_none_match() {
        let tray = NotificationTray::new();
        let clients = FakeClients::default().with_window("https://finai.test/dashboard/?range=1y");
        let agent = agent();
        let record = agent
            .on_push(&tray, Some(br#"{"url":"/journal/"}"#))
            .await
            .unwrap();

        let action = agent.on_notification_click(&tray, &clients, &record).await.unwrap();
        let expected = Url::parse("https://finai.test/journal/").unwrap();
        assert_eq!(action, ClickAction::Opened(expected.clone()));
        assert_eq!(clients.opened(), vec![expected]);
        assert!(clients.focused().is_empty());
    }

    #[tokio::test]
    async fn test_click_accepts_absolute_urls() {
        let tray = NotificationTray::new();
        let clients = FakeClients::default().with_window("https://finai.test/journal/");
        let agent = agent();
        let record = agent
            .on_push(&tray, Some(br#"{"url":"https://finai.test/journal/"}"#))
            .await
            .unwrap();

        let action = agent.on_notification_click(&tray, &clients, &record).await.unwrap();
        assert!(matches!(action, ClickAction::Focused(_)));
    }

    #[tokio::test]
    async fn test_click_without_url_opens_default() {
        let tray = NotificationTray::new();
        let clients = FakeClients::default();
        let agent = agent();
        let mut record = agent.on_push(&tray, None).await.unwrap();
        record.data.url.clear();

        let action = agent.on_notification_click(&tray, &clients, &record).await.unwrap();
        assert_eq!(action, ClickAction::Opened(Url::parse("https://finai.test/dashboard/").unwrap()));
    }
}
