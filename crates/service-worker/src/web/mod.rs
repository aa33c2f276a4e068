//! Bindings to the browser's service worker global scope
//!
//! `sw.js` forwards every event to one of the `worker_*` functions. Each takes
//! the deployment config as a plain object, only read the first time the
//! worker is built

use std::{cell::RefCell, rc::Rc};

use console_error_panic_hook::set_once as set_panic_hook;
use futures::channel::oneshot;
use gloo::utils::format::JsValueSerdeExt;
use js_sys::Promise;
use shared::{
    api::payloads::{NotificationData, NotificationRecord},
    utils::tracing::configure_tracing_once as configure_tracing,
};
use tracing::{debug, error, info};
use url::Url;
use wasm_bindgen::{prelude::wasm_bindgen, JsValue};
use wasm_bindgen_futures::{future_to_promise, JsFuture};
use web_sys::{FetchEvent, NotificationEvent, PushEvent, ServiceWorkerGlobalScope};

mod cache;
mod convert;
mod env;

pub use cache::{WebCachePartition, WebCacheStore};
pub use env::{WebClients, WebEnvironment, WebNetwork, WebNotifications};

use crate::{
    config::WorkerConfig,
    generation::Lifecycle,
    strategy::CacheWrite,
    worker::{EventKind, Outcome, Worker, WorkerEvent},
};
use convert::{request_from_js, response_for_page};

/// Matches the first argument as a result
/// If there is an error, the remaining arguments are passed to format_args!()
/// to be prepended to ": {e}". The error is logged and handed back as a
/// `JsValue` so it can reject a promise
macro_rules! log_frontend_err {
    ($f:expr, $($t:tt)*) => {
        match $f {
            Ok(v) => Ok(v),
            Err(e) => {
                let message = format!("{}: {e}", format_args!($($t)*));
                error!("{message}");
                Err(JsValue::from(message))
            }
        }
    };
}

thread_local! {
    static WORKER: RefCell<Option<Rc<Worker<WebEnvironment>>>> = const { RefCell::new(None) };
}

fn read_config(config: &JsValue) -> Result<WorkerConfig, JsValue> {
    if config.is_undefined() || config.is_null() {
        return Ok(WorkerConfig::default());
    }
    log_frontend_err!(config.into_serde::<WorkerConfig>(), "Reading worker config")
}

/// The worker for this global scope, built on the first event it receives
fn worker(
    sw: &ServiceWorkerGlobalScope,
    config: &JsValue,
    kind: EventKind,
) -> Result<Rc<Worker<WebEnvironment>>, JsValue> {
    set_panic_hook();
    configure_tracing();

    WORKER.with(|cell| {
        if let Some(worker) = cell.borrow().as_ref() {
            return Ok(worker.clone());
        }

        let config = read_config(config)?;
        let origin = log_frontend_err!(Url::parse(&sw.origin()), "sw::origin")?;
        let env = WebEnvironment::new(sw.clone())?;
        let lifecycle = Lifecycle::initial_for(kind);

        let worker = log_frontend_err!(
            Worker::with_lifecycle(config, origin, env, lifecycle),
            "Creating worker",
        )?;
        debug!("Worker {} started {lifecycle:?}", worker.generations().current_id());

        let worker = Rc::new(worker);
        *cell.borrow_mut() = Some(worker.clone());
        Ok(worker)
    })
}

#[wasm_bindgen]
pub fn worker_install(sw: ServiceWorkerGlobalScope, config: JsValue) -> Result<Promise, JsValue> {
    let worker = worker(&sw, &config, EventKind::Install)?;

    Ok(future_to_promise(async move {
        log_frontend_err!(worker.dispatch(WorkerEvent::Install).await, "install")?;

        // Replace the previous worker without waiting for its pages to close.
        // MDN states the promise returned can be safely ignored
        let _ = sw.skip_waiting()?;

        Ok(JsValue::undefined())
    }))
}

#[wasm_bindgen]
pub fn worker_activate(sw: ServiceWorkerGlobalScope, config: JsValue) -> Result<Promise, JsValue> {
    let worker = worker(&sw, &config, EventKind::Activate)?;

    Ok(future_to_promise(async move {
        log_frontend_err!(worker.dispatch(WorkerEvent::Activate).await, "activate")?;
        Ok(JsValue::undefined())
    }))
}

/// Requests the worker doesn't intercept go straight to the network
async fn fetch_direct(sw: &ServiceWorkerGlobalScope, request: &web_sys::Request) -> Result<JsValue, JsValue> {
    JsFuture::from(sw.fetch_with_request(request)).await
}

/// Answers the page and stores the response as two separate tasks
///
/// Returns without calling `respond_with` for requests the worker leaves
/// alone, so the browser handles them as if there were no worker
#[wasm_bindgen]
pub fn worker_fetch(sw: ServiceWorkerGlobalScope, config: JsValue, event: FetchEvent) -> Result<(), JsValue> {
    let worker = worker(&sw, &config, EventKind::Fetch)?;
    let js_request = event.request();
    let request = log_frontend_err!(request_from_js(&js_request), "fetch::request")?;

    if !worker.route(&request).is_intercepted() {
        return Ok(());
    }

    let (write_tx, write_rx) = oneshot::channel::<CacheWrite<WebCachePartition>>();

    let respond = future_to_promise(async move {
        let outcome = log_frontend_err!(
            worker.dispatch(WorkerEvent::Fetch(request)).await,
            "fetch:: {}",
            js_request.url(),
        )?;

        let fetched = match outcome {
            Outcome::Respond(fetched) => fetched,
            // Lost activation between routing and dispatch
            _ => return fetch_direct(&sw, &js_request).await,
        };

        if let Some(write) = fetched.write {
            // A dropped receiver means the event is gone, skipping the write
            // is fine
            let _ = write_tx.send(write);
        }

        Ok(JsValue::from(response_for_page(&fetched.response)?))
    });
    event.respond_with(&respond)?;

    let store = future_to_promise(async move {
        if let Ok(write) = write_rx.await {
            let key = write.key().clone();
            log_frontend_err!(write.commit().await, "cache::put:: {key}")?;
        }
        Ok(JsValue::undefined())
    });
    event.wait_until(&store)?;

    Ok(())
}

#[wasm_bindgen]
pub fn worker_push(sw: ServiceWorkerGlobalScope, config: JsValue, event: PushEvent) -> Result<Promise, JsValue> {
    let worker = worker(&sw, &config, EventKind::Push)?;
    let data = event.data().map(|d| d.text().into_bytes());

    Ok(future_to_promise(async move {
        log_frontend_err!(worker.dispatch(WorkerEvent::Push(data)).await, "push")?;
        Ok(JsValue::undefined())
    }))
}

/// Reads the record back from the clicked notification
///
/// Only the tag and url matter for routing the click. The url is left empty
/// when the notification carries none, so the default is used
fn clicked_record(notification: &web_sys::Notification) -> NotificationRecord {
    let url = notification
        .data()
        .into_serde::<NotificationData>()
        .map(|d| d.url)
        .unwrap_or_default();

    NotificationRecord {
        title: notification.title(),
        body: notification.body(),
        icon: notification.icon(),
        badge: String::new(),
        tag: notification.tag(),
        renotify: true,
        data: NotificationData { url },
    }
}

#[wasm_bindgen]
pub fn worker_notification_click(
    sw: ServiceWorkerGlobalScope,
    config: JsValue,
    event: NotificationEvent,
) -> Result<Promise, JsValue> {
    let worker = worker(&sw, &config, EventKind::NotificationClick)?;

    // Close it here too, chrome doesn't do this by itself and the tag lookup
    // misses untagged notifications
    let notification = event.notification();
    notification.close();
    let record = clicked_record(&notification);

    Ok(future_to_promise(async move {
        let outcome = log_frontend_err!(
            worker.dispatch(WorkerEvent::NotificationClick(record)).await,
            "notification_click",
        )?;
        if let Outcome::Clicked(action) = outcome {
            info!("Notification click: {action:?}");
        }
        Ok(JsValue::undefined())
    }))
}
