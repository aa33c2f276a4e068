use gloo::utils::{format::JsValueSerdeExt, window};
use js_sys::{Reflect, Uint8Array};
use shared::api::{
    error::{FrontendError, Nothing},
    payloads::PushNotificationSubscription,
};
use tracing::{debug, trace};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Notification, NotificationPermission, PushManager, PushSubscription, PushSubscriptionOptionsInit,
    ServiceWorkerRegistration,
};

use crate::page::{is_reusable, Permission, PushTransport, Subscribed};

async fn service_worker_registration() -> Result<ServiceWorkerRegistration, FrontendError<Nothing>> {
    let sw = window().navigator().service_worker();
    Ok(JsFuture::from(sw.ready()?).await?.unchecked_into())
}

async fn push_manager() -> Result<PushManager, FrontendError<Nothing>> {
    Ok(service_worker_registration().await?.push_manager()?)
}

async fn current_subscription(push_manager: &PushManager) -> Result<Option<PushSubscription>, FrontendError<Nothing>> {
    let existing = JsFuture::from(push_manager.get_subscription()?).await?;
    if existing.is_null() || existing.is_undefined() {
        Ok(None)
    } else {
        Ok(Some(existing.unchecked_into()))
    }
}

/// The application server key a subscription was made with, if the browser
/// reports it
fn subscription_key(subscription: &PushSubscription) -> Result<Option<Vec<u8>>, FrontendError<Nothing>> {
    let key = subscription.options().application_server_key()?;
    Ok(key.map(|buffer| Uint8Array::new(&buffer).to_vec()))
}

/// The browser's push manager, through the ready service worker registration
pub struct BrowserPush;

impl PushTransport for BrowserPush {
    fn is_supported(&self) -> bool {
        let window = window();
        let has = |target: &JsValue, name: &str| Reflect::has(target, &JsValue::from_str(name)).unwrap_or(false);

        has(&window.navigator(), "serviceWorker") && has(&window, "PushManager") && has(&window, "Notification")
    }

    fn permission(&self) -> Permission {
        match Notification::permission() {
            NotificationPermission::Granted => Permission::Granted,
            NotificationPermission::Denied => Permission::Denied,
            _ => Permission::Default,
        }
    }

    async fn request_permission(&self) -> Result<Permission, FrontendError<Nothing>> {
        let answer = JsFuture::from(Notification::request_permission()?).await?;
        trace!("Permission prompt answered {answer:?}");

        Ok(match answer.as_string().as_deref() {
            Some("granted") => Permission::Granted,
            Some("denied") => Permission::Denied,
            _ => Permission::Default,
        })
    }

    async fn subscribe(&self, application_server_key: &[u8]) -> Result<Subscribed, FrontendError<Nothing>> {
        let push_manager = push_manager().await?;

        let existing = match current_subscription(&push_manager).await? {
            Some(subscription) if is_reusable(subscription_key(&subscription)?.as_deref(), application_server_key) => {
                Some(subscription)
            }
            Some(stale) => {
                debug!("Application server key changed, replacing the subscription");
                JsFuture::from(stale.unsubscribe()?).await?;
                None
            }
            None => None,
        };

        let (subscription, created) = match existing {
            Some(subscription) => (subscription, false),
            None => {
                let key = Uint8Array::from(application_server_key);

                let mut options = PushSubscriptionOptionsInit::new();
                options.user_visible_only(true);
                options.application_server_key(Some(&key));

                let subscription: PushSubscription =
                    JsFuture::from(push_manager.subscribe_with_options(&options)?)
                        .await?
                        .unchecked_into();
                (subscription, true)
            }
        };

        let json = JsValue::from(subscription.to_json()?);
        let subscription: PushNotificationSubscription = json.into_serde()?;

        Ok(Subscribed { subscription, created })
    }

    async fn unsubscribe(&self) -> Result<(), FrontendError<Nothing>> {
        if let Some(subscription) = current_subscription(&push_manager().await?).await? {
            JsFuture::from(subscription.unsubscribe()?).await?;
        }
        Ok(())
    }
}
