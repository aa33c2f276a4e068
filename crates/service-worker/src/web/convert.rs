//! Moving requests and responses across the js boundary

use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use js_sys::{Array, Object, Uint8Array};
use url::Url;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, RequestInit, ResponseInit};

use crate::request::{Request, Response, ResponseSource};

fn js_err<E: ToString>(e: E) -> JsValue {
    JsValue::from_str(&e.to_string())
}

pub fn headers_from_js(headers: &Headers) -> Result<HeaderMap, JsValue> {
    let mut map = HeaderMap::new();
    let Some(entries) = js_sys::try_iter(headers)? else {
        return Ok(map);
    };

    for entry in entries {
        let entry: Array = entry?.unchecked_into();
        let (Some(name), Some(value)) = (entry.get(0).as_string(), entry.get(1).as_string()) else {
            continue;
        };
        if let (Ok(name), Ok(value)) = (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(&value)) {
            map.append(name, value);
        }
    }
    Ok(map)
}

pub fn headers_to_js(map: &HeaderMap) -> Result<Headers, JsValue> {
    let headers = Headers::new()?;
    for (name, value) in map.iter() {
        if let Ok(value) = value.to_str() {
            headers.append(name.as_str(), value)?;
        }
    }
    Ok(headers)
}

pub fn request_from_js(request: &web_sys::Request) -> Result<Request, JsValue> {
    let method = Method::from_bytes(request.method().as_bytes()).map_err(js_err)?;
    let url = Url::parse(&request.url()).map_err(js_err)?;

    Ok(Request {
        method,
        url,
        headers: headers_from_js(&request.headers())?,
    })
}

pub fn request_to_js(request: &Request) -> Result<web_sys::Request, JsValue> {
    let headers = headers_to_js(&request.headers)?;

    let mut r_init = RequestInit::new();
    r_init.method(request.method.as_str()).headers(&headers);

    web_sys::Request::new_with_str_and_init(request.url.as_str(), &r_init)
}

/// Buffers the whole body
pub async fn response_from_js(response: web_sys::Response, source: ResponseSource) -> Result<Response, JsValue> {
    let status = StatusCode::from_u16(response.status()).map_err(js_err)?;
    let headers = headers_from_js(&response.headers())?;
    let redirected_to = match response.redirected() {
        true => Some(Url::parse(&response.url()).map_err(js_err)?),
        false => None,
    };
    let body = JsFuture::from(response.array_buffer()?).await?;

    Ok(Response {
        status,
        headers,
        body: Uint8Array::new(&body).to_vec(),
        source,
        redirected_to,
    })
}

/// What the page gets for a response
///
/// A followed redirect is handed back as a redirect, so the page ends up on
/// the final url instead of showing its content under the requested one
pub fn response_for_page(response: &Response) -> Result<web_sys::Response, JsValue> {
    match &response.redirected_to {
        Some(to) => web_sys::Response::redirect(to.as_str()),
        None => response_to_js(response, headers_to_js(&response.headers)?),
    }
}

pub fn response_to_js(response: &Response, headers: Headers) -> Result<web_sys::Response, JsValue> {
    let mut r_init = ResponseInit::new();
    r_init.status(response.status.as_u16()).headers(&headers);

    // These statuses can't carry a body, not even an empty one
    let array = Uint8Array::from(response.body.as_slice());
    let body: Option<&Object> = match response.status.as_u16() {
        101 | 204 | 205 | 304 => None,
        _ => Some(array.as_ref()),
    };

    web_sys::Response::new_with_opt_buffer_source_and_init(body, &r_init)
}
