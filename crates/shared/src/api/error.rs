use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(feature = "wasm")]
pub use frontend::*;

#[cfg(feature = "wasm")]
mod frontend {
    use thiserror::Error;
    use wasm_bindgen::{JsCast, JsValue};
    use web_sys::js_sys::{
        Error as GenericJsError, RangeError as JsRangeError, ReferenceError as JsReferenceError,
        SyntaxError as JsSyntaxError, TypeError as JsTypeError, UriError as JsUriError,
    };

    use std::fmt::Display;

    use super::FrontendError;

    #[derive(Debug, Clone, Error)]
    pub enum JsError {
        #[error("GenericJs Error: {0:?}")]
        GenericJs(GenericJsError),
        #[error("JsRange Error: {0:?}")]
        JsRange(JsRangeError),
        #[error("JsReference Error: {0:?}")]
        JsReference(JsReferenceError),
        #[error("JsSyntax Error: {0:?}")]
        JsSyntax(JsSyntaxError),
        #[error("JsType Error: {0:?}")]
        JsType(JsTypeError),
        #[error("JsUri Error: {0:?}")]
        JsUri(JsUriError),
        #[error("UnknownJsValue Error: {0:?}")]
        UnknownJsValue(String),
    }

    impl From<JsValue> for JsError {
        fn from(err: JsValue) -> JsError {
            if err.is_instance_of::<JsRangeError>() {
                return JsError::JsRange(err.into());
            }
            if err.is_instance_of::<JsReferenceError>() {
                return JsError::JsReference(err.into());
            }
            if err.is_instance_of::<JsSyntaxError>() {
                return JsError::JsSyntax(err.into());
            }
            if err.is_instance_of::<JsTypeError>() {
                return JsError::JsType(err.into());
            }
            if err.is_instance_of::<JsUriError>() {
                return JsError::JsUri(err.into());
            }
            if err.is_instance_of::<GenericJsError>() {
                return JsError::GenericJs(err.into());
            }
            JsError::UnknownJsValue(format!("{:?}", err))
        }
    }

    impl<T: Display> From<JsValue> for FrontendError<T> {
        fn from(value: JsValue) -> Self {
            Self::Js { message: JsError::from(value).to_string() }
        }
    }

    impl<T: Display> From<gloo::net::Error> for FrontendError<T> {
        fn from(value: gloo::net::Error) -> Self {
            Self::Client { message: format!("gloo-net error: {}", value) }
        }
    }
}

/// Placeholder for requests that have no specific error payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("Nothing")]
pub struct Nothing;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("Expected content-type {expected} but got {got:?}: {body}")]
pub struct WrongContentTypeError {
    pub expected: String,
    pub got: Option<String>,
    pub body: String,
}

/// Errors surfaced by page-side code
///
/// `T` carries the operation specific failure (for example a refused
/// permission prompt)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrontendError<T: Display> {
    #[error("{inner}")]
    Inner { inner: T },
    #[error("Client error: {message}")]
    Client { message: String },
    #[error("Js error: {message}")]
    Js { message: String },
    #[error("Status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("Deserialize error: {message}")]
    Deserialize { message: String },
    #[error(transparent)]
    WrongContentType { inner: WrongContentTypeError },
    #[error("{context}: {inner}")]
    WithContext { context: String, inner: Box<Self> },
}

impl<T: Display> FrontendError<T> {
    /// Strips any context wrappers
    pub fn root(&self) -> &Self {
        match self {
            Self::WithContext { inner, .. } => inner.root(),
            other => other,
        }
    }

    /// The operation specific failure, if that is what this error is
    pub fn inner(&self) -> Option<&T> {
        match self.root() {
            Self::Inner { inner } => Some(inner),
            _ => None,
        }
    }
}

impl<T: Display> From<WrongContentTypeError> for FrontendError<T> {
    fn from(inner: WrongContentTypeError) -> Self {
        Self::WrongContentType { inner }
    }
}

impl<T: Display> From<serde_json::Error> for FrontendError<T> {
    fn from(value: serde_json::Error) -> Self {
        Self::Deserialize { message: value.to_string() }
    }
}

impl<T: Display> FrontendError<T> {
    /// Re-types an error that has no operation specific payload
    pub fn from_nothing(value: FrontendError<Nothing>) -> Self {
        match value {
            FrontendError::Inner { inner: Nothing } => Self::Client { message: Nothing.to_string() },
            FrontendError::Client { message } => Self::Client { message },
            FrontendError::Js { message } => Self::Js { message },
            FrontendError::Status { status, url } => Self::Status { status, url },
            FrontendError::Deserialize { message } => Self::Deserialize { message },
            FrontendError::WrongContentType { inner } => Self::WrongContentType { inner },
            FrontendError::WithContext { context, inner } => Self::WithContext {
                context,
                inner: Box::new(Self::from_nothing(*inner)),
            },
        }
    }
}

impl<T: Display, E: Into<FrontendError<T>>> ErrorContext<FrontendError<T>> for E {
    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, context: F) -> FrontendError<T> {
        self.context(context())
    }
    fn context<S: Into<String>>(self, context: S) -> FrontendError<T> {
        FrontendError::WithContext {
            context: context.into(),
            inner: Box::new(self.into()),
        }
    }
}

pub trait ErrorContext<E>: Sized {
    /// Add helpful context to errors
    ///
    /// `context` is provided as a closure to avoid potential formatting cost if
    /// the result isn't an error
    #[allow(dead_code)]
    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, context: F) -> E;
    /// Add helpful context to errors
    fn context<S: Into<String>>(self, context: S) -> E;
}

pub trait ResultContext<T, E: ErrorContext<E>> {
    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, context: F) -> Result<T, E>;
    fn context<S: Into<String>>(self, context: S) -> Result<T, E>;
}

impl<T, E: ErrorContext<E>> ResultContext<T, E> for Result<T, E> {
    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, context: F) -> Result<T, E> {
        self.context(context())
    }
    fn context<S: Into<String>>(self, context: S) -> Result<T, E> {
        self.map_err(|e| e.context(context))
    }
}
