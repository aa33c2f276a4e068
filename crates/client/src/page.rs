//! What the push opt-in needs from the page it runs in

use shared::api::{
    error::{FrontendError, Nothing},
    payloads::{PendingAlertsResponse, PushNotificationSubscription, UpdateSubscriptionRequest},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Not asked yet
    Default,
    Granted,
    Denied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Ok,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Subscribed {
    pub subscription: PushNotificationSubscription,
    /// False when the browser already had a subscription for this worker
    pub created: bool,
}

/// Whether a subscription made with `existing` serves `key`
///
/// A rotated application server key needs a new subscription. Browsers that
/// don't report the key of a subscription get the benefit of the doubt
pub fn is_reusable(existing: Option<&[u8]>, key: &[u8]) -> bool {
    existing.map_or(true, |existing| existing == key)
}

#[allow(async_fn_in_trait)]
pub trait PushTransport {
    /// Both a service worker and a push manager are available
    fn is_supported(&self) -> bool;

    fn permission(&self) -> Permission;

    async fn request_permission(&self) -> Result<Permission, FrontendError<Nothing>>;

    /// Reuses the current subscription if [`is_reusable`] with this key,
    /// otherwise replaces it
    async fn subscribe(&self, application_server_key: &[u8]) -> Result<Subscribed, FrontendError<Nothing>>;

    async fn unsubscribe(&self) -> Result<(), FrontendError<Nothing>>;
}

#[allow(async_fn_in_trait)]
pub trait Api {
    async fn post_subscription(
        &self,
        url: &str,
        request: &UpdateSubscriptionRequest,
    ) -> Result<(), FrontendError<Nothing>>;

    async fn pending_alerts(&self, url: &str) -> Result<PendingAlertsResponse, FrontendError<Nothing>>;
}

/// The bits of the page the opt-in touches. None of them block
pub trait PageUi {
    fn notice(&self, message: &str, level: NoticeLevel);

    /// Shows the bell as subscribed
    fn mark_subscribed(&self);

    fn hide_opt_in(&self);

    fn has_alert_badge(&self) -> bool;

    fn add_alert_badge(&self);
}

pub trait VapidKeyProvider {
    /// The server's public key, base64url encoded
    fn vapid_public_key(&self) -> Option<String>;
}

impl VapidKeyProvider for Option<String> {
    fn vapid_public_key(&self) -> Option<String> {
        self.clone()
    }
}

pub trait Page {
    type Push: PushTransport;
    type Api: Api;
    type Ui: PageUi;

    fn push(&self) -> &Self::Push;
    fn api(&self) -> &Self::Api;
    fn ui(&self) -> &Self::Ui;
}
