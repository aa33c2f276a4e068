//! Page bindings, called from the page template's scripts
//!
//! Every argument is optional; urls default to the standard endpoints and
//! the key to the page's `VAPID_PUBLIC_KEY` global

use console_error_panic_hook::set_once as set_panic_hook;
use gloo::utils::window;
use js_sys::{Promise, Reflect};
use shared::{api::Object, utils::tracing::configure_tracing_once as configure_tracing};
use tracing::debug;
use wasm_bindgen::{prelude::wasm_bindgen, JsValue};
use wasm_bindgen_futures::{future_to_promise, JsFuture};
use web_sys::RegistrationOptions;

mod api;
mod push;
mod ui;

pub use api::GlooApi;
pub use push::BrowserPush;
pub use ui::DomUi;

use crate::{
    alerts::check_pending_alerts,
    page::{Page, VapidKeyProvider},
    push::{init_push_notifications, register_interest},
};

const SERVICE_WORKER_URL: &str = "/sw.js";
const VAPID_KEY_GLOBAL: &str = "VAPID_PUBLIC_KEY";

pub struct WebPage {
    push: BrowserPush,
    api: GlooApi,
    ui: DomUi,
}

impl WebPage {
    pub fn new() -> Self {
        Self {
            push: BrowserPush,
            api: GlooApi,
            ui: DomUi,
        }
    }
}

impl Default for WebPage {
    fn default() -> Self {
        Self::new()
    }
}

impl Page for WebPage {
    type Push = BrowserPush;
    type Api = GlooApi;
    type Ui = DomUi;

    fn push(&self) -> &BrowserPush {
        &self.push
    }

    fn api(&self) -> &GlooApi {
        &self.api
    }

    fn ui(&self) -> &DomUi {
        &self.ui
    }
}

/// An explicit key, else the page global
struct PageVapidKey(Option<String>);

impl VapidKeyProvider for PageVapidKey {
    fn vapid_public_key(&self) -> Option<String> {
        self.0.clone().or_else(|| {
            Reflect::get(&window(), &JsValue::from_str(VAPID_KEY_GLOBAL))
                .ok()?
                .as_string()
        })
    }
}

fn setup() {
    set_panic_hook();
    configure_tracing();
}

/// Registers the worker for the whole origin. Failing is expected without
/// https in development, so it's only logged
#[wasm_bindgen(js_name = registerServiceWorker)]
pub fn register_service_worker(script_url: Option<String>) -> Promise {
    setup();

    future_to_promise(async move {
        let container = window().navigator().service_worker();
        let mut options = RegistrationOptions::new();
        options.scope("/");

        let url = script_url.as_deref().unwrap_or(SERVICE_WORKER_URL);
        if let Err(e) = JsFuture::from(container.register_with_options(url, &options)).await {
            debug!("Service worker registration failed: {e:?}");
        }
        Ok(JsValue::undefined())
    })
}

#[wasm_bindgen(js_name = initPushNotifications)]
pub fn init_push(check_url: Option<String>) -> Promise {
    setup();

    future_to_promise(async move {
        let check_url = check_url.as_deref().unwrap_or(Object::PushCheck.path());
        init_push_notifications(&WebPage::new(), check_url).await;
        Ok(JsValue::undefined())
    })
}

/// Resolves once the opt-in finished. Failures have been shown to the user
/// already so they reject with the message only
#[wasm_bindgen(js_name = requestPushPermission)]
pub fn request_push_permission(
    vapid_public_key: Option<String>,
    subscribe_url: Option<String>,
    check_url: Option<String>,
) -> Promise {
    setup();

    future_to_promise(async move {
        let subscribe_url = subscribe_url.as_deref().unwrap_or(Object::PushSubscribe.path());
        let check_url = check_url.as_deref().unwrap_or(Object::PushCheck.path());

        register_interest(
            &WebPage::new(),
            &PageVapidKey(vapid_public_key),
            subscribe_url,
            Some(check_url),
        )
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

        Ok(JsValue::undefined())
    })
}

#[wasm_bindgen(js_name = checkPushAlerts)]
pub fn check_push_alerts(check_url: Option<String>) -> Promise {
    setup();

    future_to_promise(async move {
        let check_url = check_url.as_deref().unwrap_or(Object::PushCheck.path());
        let found = check_pending_alerts(&WebPage::new(), check_url).await;
        Ok(JsValue::from_bool(found))
    })
}
