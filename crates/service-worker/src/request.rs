use std::fmt::{self, Display};

use http::{header::CONTENT_TYPE, HeaderMap, HeaderValue, Method, StatusCode};
use url::Url;

/// An intercepted request
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self { method, url, headers: HeaderMap::new() }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn key(&self) -> RequestKey {
        RequestKey::new(self.method.clone(), &self.url)
    }
}

/// Normalized request descriptor used to address cache entries
///
/// Absolute url with the fragment dropped, since fragments never reach the
/// server
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    method: Method,
    url: String,
}

impl RequestKey {
    pub fn new(method: Method, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self { method, url: url.into() }
    }

    pub fn get(url: &Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Network,
    Cache,
}

/// A fully buffered response
///
/// Cloning is how the same response gets both returned to the page and
/// written to the cache
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    pub source: ResponseSource,
    /// Where the network ended up when it followed a redirect
    pub redirected_to: Option<Url>,
}

impl Response {
    pub fn new<B: Into<Vec<u8>>>(status: StatusCode, body: B) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
            source: ResponseSource::Network,
            redirected_to: None,
        }
    }

    pub fn ok<B: Into<Vec<u8>>>(body: B) -> Self {
        Self::new(StatusCode::OK, body)
    }

    pub fn with_content_type(mut self, content_type: &'static str) -> Self {
        self.headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        self
    }

    pub fn redirected(mut self, to: Url) -> Self {
        self.redirected_to = Some(to);
        self
    }

    /// 2xx responses are the only ones worth keeping
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn is_redirected(&self) -> bool {
        self.redirected_to.is_some()
    }

    pub fn is_from_cache(&self) -> bool {
        self.source == ResponseSource::Cache
    }
}
