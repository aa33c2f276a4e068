use gloo::net::http::{Method, RequestBuilder, Response};
use headers::{CacheControl, Header};
use http::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use mime::APPLICATION_JSON;
use shared::api::{
    error::{FrontendError, Nothing, ResultContext, WrongContentTypeError},
    payloads::{PendingAlertsResponse, UpdateSubscriptionRequest},
    CSRF_COOKIE, CSRF_HEADER,
};
use tracing::debug;
use wasm_bindgen::JsCast;
use web_sys::{HtmlDocument, HtmlInputElement};

use crate::page::Api;

/// The token from the page's form field, or the cookie when there's no form
fn csrf_token() -> Option<String> {
    let document = gloo::utils::document();

    let input = document
        .query_selector("[name=csrfmiddlewaretoken]")
        .ok()
        .flatten()
        .and_then(|e| e.dyn_into::<HtmlInputElement>().ok());
    if let Some(input) = input {
        return Some(input.value());
    }

    let cookies = document.dyn_into::<HtmlDocument>().ok()?.cookie().ok()?;
    cookies
        .split(';')
        .filter_map(|c| c.trim().split_once('='))
        .find(|(name, _)| *name == CSRF_COOKIE)
        .map(|(_, value)| value.to_string())
}

fn no_cache(builder: RequestBuilder) -> RequestBuilder {
    let cc = CacheControl::new().with_no_store();
    let mut values = Vec::with_capacity(1);
    cc.encode(&mut values);

    match values.pop().as_ref().and_then(|v| v.to_str().ok()) {
        Some(value) => builder.header(CACHE_CONTROL.as_str(), value),
        None => builder,
    }
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE.as_str())
        .map_or(false, |v| v.starts_with(APPLICATION_JSON.essence_str()))
}

/// Same-origin json calls through `gloo`
pub struct GlooApi;

impl Api for GlooApi {
    async fn post_subscription(
        &self,
        url: &str,
        request: &UpdateSubscriptionRequest,
    ) -> Result<(), FrontendError<Nothing>> {
        let mut builder = RequestBuilder::new(url)
            .method(Method::POST)
            .header(ACCEPT.as_str(), APPLICATION_JSON.essence_str());
        if let Some(token) = csrf_token() {
            builder = builder.header(CSRF_HEADER, &token);
        }

        let response = builder
            .json(request)
            .map_err(FrontendError::<Nothing>::from)
            .with_context(|| format!("Converting subscription to json body (for: POST {url})"))?
            .send()
            .await
            .map_err(FrontendError::<Nothing>::from)
            .with_context(|| format!("Sending subscription to POST {url}"))?;

        debug!("post_subscription::status {}", response.status());
        if !response.ok() {
            return Err(FrontendError::Status {
                status: response.status(),
                url: url.to_string(),
            });
        }
        Ok(())
    }

    async fn pending_alerts(&self, url: &str) -> Result<PendingAlertsResponse, FrontendError<Nothing>> {
        let response = no_cache(RequestBuilder::new(url))
            .method(Method::GET)
            .header(ACCEPT.as_str(), APPLICATION_JSON.essence_str())
            .send()
            .await
            .map_err(FrontendError::<Nothing>::from)
            .with_context(|| format!("Sending to GET {url}"))?;

        if !response.ok() {
            return Err(FrontendError::Status {
                status: response.status(),
                url: url.to_string(),
            });
        }

        if !is_json(&response) {
            let got = response.headers().get(CONTENT_TYPE.as_str());
            let body = response
                .text()
                .await
                .map_err(FrontendError::<Nothing>::from)
                .with_context(|| format!("Extracting response body as text from GET {url}"))?;

            return Err(FrontendError::<Nothing>::from(WrongContentTypeError {
                expected: APPLICATION_JSON.to_string(),
                got,
                body,
            }))
            .with_context(|| format!("Response from GET {url}"));
        }

        response
            .json::<PendingAlertsResponse>()
            .await
            .map_err(FrontendError::<Nothing>::from)
            .with_context(|| format!("Deserializing pending alerts from GET {url}"))
    }
}
