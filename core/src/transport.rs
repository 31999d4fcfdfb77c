//! Request and response types exchanged with a transport.
//!
//! These types describe one request/response round-trip at the level the
//! controller cares about: a path, a [`Method`], an opaque JSON [`Body`] and a
//! string [`Headers`] map going out; a JSON result, an application-error flag
//! and a status coming back. How they are put on the wire is the transport's
//! concern.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Opaque request body (a JSON object)
pub type Body = Map<String, Value>;

/// Opaque request headers
pub type Headers = BTreeMap<String, String>;

/// Request method understood by transports
///
/// `FormData` is not an HTTP verb: it asks the transport to submit the body
/// as a form post.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Method {
    /// `DELETE`
    Delete,
    /// Form submission
    FormData,
    /// `GET`
    #[default]
    Get,
    /// `HEAD`
    Head,
    /// `PATCH`
    Patch,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `TRACE`
    Trace,
}

impl Method {
    /// All methods, in declaration order
    pub const ALL: [Self; 8] = [
        Self::Delete,
        Self::FormData,
        Self::Get,
        Self::Head,
        Self::Patch,
        Self::Post,
        Self::Put,
        Self::Trace,
    ];

    /// Canonical upper-case name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::FormData => "FORM_DATA",
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Patch => "PATCH",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Trace => "TRACE",
        }
    }

    /// Whether the body travels in the query string rather than the payload
    #[must_use]
    pub const fn body_in_query(self) -> bool {
        matches!(self, Self::Get | Self::Head)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| TransportError::InvalidRequest(format!("unknown method: {s}")))
    }
}

/// Method and body of a request
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestParams {
    /// Request method (defaults to `GET`)
    #[serde(default)]
    pub method: Method,
    /// Request body (defaults to an empty object)
    #[serde(default)]
    pub body: Body,
}

impl RequestParams {
    /// Create params with the given method and an empty body
    #[must_use]
    pub fn new(method: Method) -> Self {
        Self {
            method,
            body: Body::new(),
        }
    }

    /// Set the body
    #[must_use]
    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }
}

/// A single request handed to a transport
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransportRequest {
    /// Resource path, relative to whatever base the transport is configured with
    pub path: String,
    /// Request method
    pub method: Method,
    /// Request body
    pub body: Body,
    /// Request headers
    pub headers: Headers,
}

impl TransportRequest {
    /// Create a `GET` request for `path` with no body and no headers
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: Method::Get,
            body: Body::new(),
            headers: Headers::new(),
        }
    }
}

/// Raw response metadata passed through to delivery channels
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMeta {
    /// Final URL the response came from
    pub url: String,
    /// Response headers
    pub headers: Headers,
}

/// What a transport resolves with
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransportResponse {
    /// Decoded response payload (the error payload when `error` is set)
    pub result: Value,
    /// Application-level error flag
    pub error: bool,
    /// Whether the transport considers the response successful
    pub is_ok: bool,
    /// Status code reported by the server
    pub status: u16,
    /// Raw response metadata, if the transport exposes it
    pub response: Option<ResponseMeta>,
}

impl TransportResponse {
    /// A successful response carrying `result`
    #[must_use]
    pub const fn ok(status: u16, result: Value) -> Self {
        Self {
            result,
            error: false,
            is_ok: true,
            status,
            response: None,
        }
    }

    /// A response with the application-error flag set, carrying `payload`
    #[must_use]
    pub const fn rejected(status: u16, payload: Value) -> Self {
        Self {
            result: payload,
            error: true,
            is_ok: false,
            status,
            response: None,
        }
    }

    /// Attach raw response metadata
    #[must_use]
    pub fn with_meta(mut self, meta: ResponseMeta) -> Self {
        self.response = Some(meta);
        self
    }
}

/// Errors raised by a transport when a request cannot be performed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request could not be built (bad URL, unsupported body, ...)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The request failed before a response was received
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The response arrived but could not be read
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),
}
