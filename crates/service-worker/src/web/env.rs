use gloo::utils::format::JsValueSerdeExt;
use js_sys::Array;
use shared::api::{
    error::{FrontendError, Nothing},
    payloads::NotificationRecord,
};
use tracing::warn;
use url::Url;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    ClientQueryOptions, ClientType, GetNotificationOptions, Notification, NotificationOptions,
    ServiceWorkerGlobalScope, WindowClient,
};

use super::{
    cache::WebCacheStore,
    convert::{request_to_js, response_from_js},
};
use crate::{
    environment::{ClientWindow, Clients, Environment, Network, NotificationSurface},
    error::{NetworkError, WorkerError},
    request::{Request, Response, ResponseSource},
};

fn js_message(e: JsValue) -> String {
    FrontendError::<Nothing>::from(e).to_string()
}

pub struct WebNetwork {
    sw: ServiceWorkerGlobalScope,
}

impl Network for WebNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        let result = async {
            let js_request = request_to_js(request)?;
            let response: web_sys::Response = JsFuture::from(self.sw.fetch_with_request(&js_request))
                .await?
                .dyn_into()?;
            response_from_js(response, ResponseSource::Network).await
        }
        .await;

        result.map_err(|e| NetworkError::new(request.key(), js_message(e)))
    }
}

pub struct WebClients {
    sw: ServiceWorkerGlobalScope,
}

impl Clients for WebClients {
    async fn claim(&self) -> Result<(), WorkerError> {
        JsFuture::from(self.sw.clients().claim())
            .await
            .map_err(|e| WorkerError::clients("claim", js_message(e)))?;
        Ok(())
    }

    async fn windows(&self) -> Result<Vec<ClientWindow>, WorkerError> {
        // Pages opened before this worker activated aren't controlled yet
        let mut options = ClientQueryOptions::new();
        options.include_uncontrolled(true).type_(ClientType::Window);

        let clients: Array = JsFuture::from(self.sw.clients().match_all_with_options(&options))
            .await
            .map_err(|e| WorkerError::clients("match_all", js_message(e)))?
            .unchecked_into();

        Ok(clients
            .iter()
            .filter_map(|c| c.dyn_into::<WindowClient>().ok())
            .filter_map(|c| match Url::parse(&c.url()) {
                Ok(url) => Some(ClientWindow { id: c.id(), url }),
                Err(e) => {
                    warn!("Skipping client with url {:?}: {e}", c.url());
                    None
                }
            })
            .collect())
    }

    async fn focus(&self, window: &ClientWindow) -> Result<(), WorkerError> {
        let client = JsFuture::from(self.sw.clients().get(&window.id))
            .await
            .map_err(|e| WorkerError::clients("get", js_message(e)))?
            .dyn_into::<WindowClient>()
            .map_err(|_| WorkerError::clients("get", format!("{} is gone", window.url)))?;

        let focus = client.focus().map_err(|e| WorkerError::clients("focus", js_message(e)))?;
        JsFuture::from(focus)
            .await
            .map_err(|e| WorkerError::clients("focus", js_message(e)))?;
        Ok(())
    }

    async fn open_window(&self, url: &Url) -> Result<(), WorkerError> {
        JsFuture::from(self.sw.clients().open_window(url.as_str()))
            .await
            .map_err(|e| WorkerError::clients("open_window", js_message(e)))?;
        Ok(())
    }
}

pub struct WebNotifications {
    sw: ServiceWorkerGlobalScope,
}

impl NotificationSurface for WebNotifications {
    async fn show(&self, record: &NotificationRecord) -> Result<(), WorkerError> {
        let data = <JsValue as JsValueSerdeExt>::from_serde(&record.data)
            .map_err(|e| WorkerError::notification("show", e))?;

        let mut options = NotificationOptions::new();
        options
            .body(&record.body)
            .icon(&record.icon)
            .badge(&record.badge)
            .tag(&record.tag)
            .renotify(record.renotify)
            .data(&data);

        let shown = self
            .sw
            .registration()
            .show_notification_with_options(&record.title, &options)
            .map_err(|e| WorkerError::notification("show", js_message(e)))?;
        JsFuture::from(shown)
            .await
            .map_err(|e| WorkerError::notification("show", js_message(e)))?;
        Ok(())
    }

    async fn close(&self, tag: &str) -> Result<(), WorkerError> {
        let mut filter = GetNotificationOptions::new();
        filter.tag(tag);

        let pending = self
            .sw
            .registration()
            .get_notifications_with_filter(&filter)
            .map_err(|e| WorkerError::notification("close", js_message(e)))?;
        let notifications: Array = JsFuture::from(pending)
            .await
            .map_err(|e| WorkerError::notification("close", js_message(e)))?
            .unchecked_into();

        for n in notifications.iter() {
            n.unchecked_into::<Notification>().close();
        }
        Ok(())
    }
}

pub struct WebEnvironment {
    store: WebCacheStore,
    network: WebNetwork,
    clients: WebClients,
    notifications: WebNotifications,
}

impl WebEnvironment {
    pub fn new(sw: ServiceWorkerGlobalScope) -> Result<Self, JsValue> {
        Ok(Self {
            store: WebCacheStore::new(sw.caches()?),
            network: WebNetwork { sw: sw.clone() },
            clients: WebClients { sw: sw.clone() },
            notifications: WebNotifications { sw },
        })
    }
}

impl Environment for WebEnvironment {
    type Store = WebCacheStore;
    type Network = WebNetwork;
    type Clients = WebClients;
    type Notifications = WebNotifications;

    fn store(&self) -> &WebCacheStore {
        &self.store
    }

    fn network(&self) -> &WebNetwork {
        &self.network
    }

    fn clients(&self) -> &WebClients {
        &self.clients
    }

    fn notifications(&self) -> &WebNotifications {
        &self.notifications
    }
}
