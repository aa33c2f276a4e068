//! Opting the user into push notifications

use base64::{
    alphabet::URL_SAFE,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use shared::api::{
    error::{FrontendError, Nothing},
    payloads::UpdateSubscriptionRequest,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    alerts::check_pending_alerts,
    page::{Api, NoticeLevel, Page, PageUi, Permission, PushTransport, VapidKeyProvider},
};

/// Keys are accepted with or without padding
const KEY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptInError {
    #[error("Push notifications aren't supported by this browser")]
    Unsupported,
    #[error("No application server key configured")]
    MissingKey,
    #[error("Invalid application server key: {0}")]
    InvalidKey(String),
    #[error("Notifications refused")]
    Refused,
    #[error("Subscribing failed: {0}")]
    Subscribe(FrontendError<Nothing>),
    #[error("Recording the subscription failed: {0}")]
    Record(FrontendError<Nothing>),
}

impl OptInError {
    /// What the user is told
    pub fn notice(&self) -> &'static str {
        match self {
            OptInError::Unsupported => "Notifications aren't supported by this browser",
            OptInError::Refused => "Notifications refused",
            _ => "Couldn't enable notifications",
        }
    }
}

/// Decodes a base64url application server key, standard base64 characters
/// are tolerated
pub fn decode_application_server_key(key: &str) -> Result<Vec<u8>, OptInError> {
    let normalized: String = key
        .trim()
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            c => c,
        })
        .collect();

    match KEY_ENGINE.decode(normalized) {
        Ok(bytes) if !bytes.is_empty() => Ok(bytes),
        Ok(_) => Err(OptInError::InvalidKey("empty".to_string())),
        Err(e) => Err(OptInError::InvalidKey(e.to_string())),
    }
}

async fn opt_in<P: Page, K: VapidKeyProvider>(
    page: &P,
    keys: &K,
    subscribe_endpoint: &str,
) -> Result<(), OptInError> {
    let push = page.push();
    if !push.is_supported() {
        return Err(OptInError::Unsupported);
    }

    let key = keys
        .vapid_public_key()
        .filter(|k| !k.trim().is_empty())
        .ok_or(OptInError::MissingKey)?;
    let key = decode_application_server_key(&key)?;

    let permission = push.request_permission().await.map_err(OptInError::Subscribe)?;
    if permission != Permission::Granted {
        return Err(OptInError::Refused);
    }

    let subscribed = push.subscribe(&key).await.map_err(OptInError::Subscribe)?;
    debug!("Subscribed to {} (new: {})", subscribed.subscription.endpoint, subscribed.created);

    let request = UpdateSubscriptionRequest { subscription: subscribed.subscription };
    if let Err(e) = page.api().post_subscription(subscribe_endpoint, &request).await {
        // Leave the browser as it was before this call
        if subscribed.created {
            if let Err(unsubscribe_err) = push.unsubscribe().await {
                warn!("Failed to undo subscription: {unsubscribe_err}");
            }
        }
        return Err(OptInError::Record(e));
    }

    Ok(())
}

/// Asks for permission, subscribes and sends the subscription to the server
///
/// The outcome is shown to the user as a notice. A missing key does nothing
/// at all
pub async fn register_interest<P: Page, K: VapidKeyProvider>(
    page: &P,
    keys: &K,
    subscribe_endpoint: &str,
    check_endpoint: Option<&str>,
) -> Result<(), OptInError> {
    let result = opt_in(page, keys, subscribe_endpoint).await;
    let ui = page.ui();

    match &result {
        Ok(()) => {
            info!("Push notifications enabled");
            ui.mark_subscribed();
            ui.notice("Notifications enabled", NoticeLevel::Ok);

            if let Some(endpoint) = check_endpoint {
                check_pending_alerts(page, endpoint).await;
            }
        }
        Err(OptInError::MissingKey) => debug!("No application server key, not subscribing"),
        Err(e) => {
            warn!("Enabling push notifications failed: {e}");
            ui.notice(e.notice(), NoticeLevel::Error);
        }
    }

    result
}

/// Reflects the current permission on page load
pub async fn init_push_notifications<P: Page>(page: &P, check_endpoint: &str) {
    let push = page.push();
    if !push.is_supported() {
        return;
    }

    match push.permission() {
        Permission::Granted => {
            page.ui().mark_subscribed();
            check_pending_alerts(page, check_endpoint).await;
        }
        Permission::Denied => page.ui().hide_opt_in(),
        Permission::Default => {}
    }
}

#[cfg(test)]
mod test {
    use base64::prelude::{Engine as _, BASE64_URL_SAFE_NO_PAD};

    use super::*;
    use crate::{
        page::is_reusable,
        testing::{FakeApi, FakePage, FakePush},
    };

    const SUBSCRIBE: &str = "/journal/api/push/subscribe/";
    const CHECK: &str = "/journal/api/push/check/";

    fn key() -> Option<String> {
        Some(BASE64_URL_SAFE_NO_PAD.encode([4u8; 65]))
    }

    #[test]
    fn test_decode_key() {
        let bytes = [0xfbu8, 0xff, 0x3e, 0x01];
        let url_safe = BASE64_URL_SAFE_NO_PAD.encode(bytes);
        assert_eq!(url_safe, "-_8-AQ");

        assert_eq!(decode_application_server_key(&url_safe).unwrap(), bytes);
        assert_eq!(decode_application_server_key("-_8-AQ==").unwrap(), bytes);
        assert_eq!(decode_application_server_key("+/8+AQ").unwrap(), bytes);
        assert!(matches!(decode_application_server_key("not a key!"), Err(OptInError::InvalidKey(_))));
        assert!(matches!(decode_application_server_key(""), Err(OptInError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_opt_in() {
        let page = FakePage::default().with_api(FakeApi::default().with_alerts(1));

        register_interest(&page, &key(), SUBSCRIBE, Some(CHECK)).await.unwrap();

        assert!(page.push.is_subscribed());
        assert_eq!(page.push.subscribed_with(), Some(vec![4u8; 65]));
        assert_eq!(page.api.posted(), vec![SUBSCRIBE.to_string()]);
        assert!(page.ui.is_subscribed());
        assert_eq!(page.ui.notices(), vec![("Notifications enabled".to_string(), NoticeLevel::Ok)]);
        assert_eq!(page.ui.badges_added(), 1);
    }

    #[tokio::test]
    async fn test_refusal_changes_nothing() {
        let page = FakePage::default().with_push(FakePush::default().answering(Permission::Denied));

        let err = register_interest(&page, &key(), SUBSCRIBE, Some(CHECK)).await.unwrap_err();
        assert_eq!(err, OptInError::Refused);

        assert!(!page.push.is_subscribed());
        assert!(page.api.posted().is_empty());
        assert!(!page.ui.is_subscribed());
        assert_eq!(page.ui.notices(), vec![("Notifications refused".to_string(), NoticeLevel::Error)]);
    }

    #[tokio::test]
    async fn test_failed_post_undoes_new_subscription() {
        let page = FakePage::default().with_api(FakeApi::default().failing_post());

        let err = register_interest(&page, &key(), SUBSCRIBE, None).await.unwrap_err();
        assert!(matches!(err, OptInError::Record(_)));

        assert!(!page.push.is_subscribed());
        assert!(!page.ui.is_subscribed());
        assert_eq!(
            page.ui.notices(),
            vec![("Couldn't enable notifications".to_string(), NoticeLevel::Error)]
        );
    }

    #[tokio::test]
    async fn test_failed_post_keeps_existing_subscription() {
        let page = FakePage::default()
            .with_push(FakePush::default().already_subscribed())
            .with_api(FakeApi::default().failing_post());

        assert!(register_interest(&page, &key(), SUBSCRIBE, None).await.is_err());
        assert!(page.push.is_subscribed());
    }

    #[tokio::test]
    async fn test_rotated_key_replaces_subscription() {
        let page = FakePage::default().with_push(FakePush::default().already_subscribed_with(&[9u8; 65]));

        register_interest(&page, &key(), SUBSCRIBE, None).await.unwrap();
        assert!(page.push.is_subscribed());
        assert_eq!(page.push.subscribed_with(), Some(vec![4u8; 65]));
        assert_eq!(page.api.posted(), vec![SUBSCRIBE.to_string()]);

        // Same key again keeps the subscription even if the server refuses it
        let page = FakePage::default()
            .with_push(FakePush::default().already_subscribed_with(&[4u8; 65]))
            .with_api(FakeApi::default().failing_post());
        assert!(register_interest(&page, &key(), SUBSCRIBE, None).await.is_err());
        assert!(page.push.is_subscribed());
    }

    #[test]
    fn test_reusable_subscription() {
        assert!(is_reusable(None, &[1, 2]));
        assert!(is_reusable(Some(&[1u8, 2][..]), &[1, 2]));
        assert!(!is_reusable(Some(&[1u8, 3][..]), &[1, 2]));
    }

    #[tokio::test]
    async fn test_missing_key_is_silent() {
        let page = FakePage::default();

        let err = register_interest(&page, &None::<String>, SUBSCRIBE, None).await.unwrap_err();
        assert_eq!(err, OptInError::MissingKey);
        assert_eq!(page.push.permission_requests(), 0);
        assert!(page.ui.notices().is_empty());

        let err = register_interest(&page, &Some("  ".to_string()), SUBSCRIBE, None).await.unwrap_err();
        assert_eq!(err, OptInError::MissingKey);
    }

    #[tokio::test]
    async fn test_unsupported_browser() {
        let page = FakePage::default().with_push(FakePush::unsupported());

        let err = register_interest(&page, &key(), SUBSCRIBE, None).await.unwrap_err();
        assert_eq!(err, OptInError::Unsupported);
        assert_eq!(page.ui.notices()[0].1, NoticeLevel::Error);

        init_push_notifications(&page, CHECK).await;
        assert!(!page.ui.is_hidden());
        assert_eq!(page.api.checks(), 0);
    }

    #[tokio::test]
    async fn test_init_reflects_permission() {
        let page = FakePage::default()
            .with_push(FakePush::default().with_permission(Permission::Granted))
            .with_api(FakeApi::default().with_alerts(2));
        init_push_notifications(&page, CHECK).await;
        assert!(page.ui.is_subscribed());
        assert_eq!(page.ui.badges_added(), 1);

        let page = FakePage::default().with_push(FakePush::default().with_permission(Permission::Denied));
        init_push_notifications(&page, CHECK).await;
        assert!(page.ui.is_hidden());
        assert_eq!(page.api.checks(), 0);

        let page = FakePage::default();
        init_push_notifications(&page, CHECK).await;
        assert!(!page.ui.is_hidden());
        assert!(!page.ui.is_subscribed());
        assert_eq!(page.api.checks(), 0);
    }
}
