//! Per-instance fetch configuration.
//!
//! A [`FetchConfig`] names the resource to fetch and the delivery channels
//! that receive the result. It is handed over wholesale on activation and on
//! every reconfiguration; the controller never merges configs.
//!
//! # Example
//!
//! ```
//! use lifecycle_fetch::{Delivery, FetchConfig};
//!
//! let config: FetchConfig<String> = FetchConfig::new("/users")
//!     .with_header("accept", "application/json")
//!     .on_load(|| "loading...".to_string())
//!     .render(|delivery: Delivery| format!("{:?}", delivery.data()));
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.identity().path, "/users");
//! ```

use std::fmt;
use std::sync::Arc;

use lifecycle_fetch_core::transport::{Body, Headers, Method, RequestParams, TransportRequest};

use crate::error::ConfigError;
use crate::identity::FetchIdentity;
use crate::outcome::{Delivery, ErrorReport};

/// Produces the view shown while loading
pub type LoadFn<V> = Arc<dyn Fn() -> V + Send + Sync>;

/// Receives every dispatched delivery
pub type DeliveryFn = Arc<dyn Fn(Delivery) + Send + Sync>;

/// Receives the error of failed outcomes
pub type ErrorFn = Arc<dyn Fn(ErrorReport) + Send + Sync>;

/// Turns a delivery into a view
pub type RenderFn<V> = Arc<dyn Fn(Delivery) -> V + Send + Sync>;

/// Turns a delivery into downstream values (exactly one is expected)
pub type ChildrenFn<V> = Arc<dyn Fn(Delivery) -> Vec<V> + Send + Sync>;

/// What to fetch and where to deliver it
///
/// `V` is the caller's view type, produced by `on_load`, `render` and
/// `children`.
pub struct FetchConfig<V> {
    path: String,
    params: RequestParams,
    headers: Headers,
    refetch: bool,
    result_only: bool,
    pub(crate) on_load: Option<LoadFn<V>>,
    pub(crate) on_fetch: Option<DeliveryFn>,
    pub(crate) on_error: Option<ErrorFn>,
    pub(crate) render: Option<RenderFn<V>>,
    pub(crate) children: Option<ChildrenFn<V>>,
}

impl<V> FetchConfig<V> {
    /// Create a `GET` config for `path` with no delivery channels
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: RequestParams::default(),
            headers: Headers::new(),
            refetch: false,
            result_only: false,
            on_load: None,
            on_fetch: None,
            on_error: None,
            render: None,
            children: None,
        }
    }

    /// Replace method and body at once
    #[must_use]
    pub fn with_params(mut self, params: RequestParams) -> Self {
        self.params = params;
        self
    }

    /// Set the request method
    #[must_use]
    pub const fn with_method(mut self, method: Method) -> Self {
        self.params.method = method;
        self
    }

    /// Set the request body
    #[must_use]
    pub fn with_body(mut self, body: Body) -> Self {
        self.params.body = body;
        self
    }

    /// Replace all headers
    #[must_use]
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Add a single header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the refetch toggle; flipping it forces a new request
    #[must_use]
    pub const fn with_refetch(mut self, refetch: bool) -> Self {
        self.refetch = refetch;
        self
    }

    /// Deliver only `outcome.data` instead of the whole outcome
    #[must_use]
    pub const fn with_result_only(mut self, result_only: bool) -> Self {
        self.result_only = result_only;
        self
    }

    /// Register the loading view
    #[must_use]
    pub fn on_load(mut self, f: impl Fn() -> V + Send + Sync + 'static) -> Self {
        self.on_load = Some(Arc::new(f));
        self
    }

    /// Register a callback for every delivery
    #[must_use]
    pub fn on_fetch(mut self, f: impl Fn(Delivery) + Send + Sync + 'static) -> Self {
        self.on_fetch = Some(Arc::new(f));
        self
    }

    /// Register a callback for failed outcomes
    #[must_use]
    pub fn on_error(mut self, f: impl Fn(ErrorReport) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    /// Register the view renderer
    #[must_use]
    pub fn render(mut self, f: impl Fn(Delivery) -> V + Send + Sync + 'static) -> Self {
        self.render = Some(Arc::new(f));
        self
    }

    /// Register the render-prop, which must return exactly one value
    #[must_use]
    pub fn children(mut self, f: impl Fn(Delivery) -> Vec<V> + Send + Sync + 'static) -> Self {
        self.children = Some(Arc::new(f));
        self
    }

    /// Resource path
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Method and body
    #[must_use]
    pub const fn params(&self) -> &RequestParams {
        &self.params
    }

    /// Request headers
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Refetch toggle
    #[must_use]
    pub const fn refetch(&self) -> bool {
        self.refetch
    }

    /// Whether channels receive only the data
    #[must_use]
    pub const fn result_only(&self) -> bool {
        self.result_only
    }

    /// The identity used for change detection
    #[must_use]
    pub fn identity(&self) -> FetchIdentity {
        FetchIdentity::new(self.path.clone(), self.refetch)
    }

    /// The transport request this config resolves to
    #[must_use]
    pub fn request(&self) -> TransportRequest {
        TransportRequest {
            path: self.path.clone(),
            method: self.params.method,
            body: self.params.body.clone(),
            headers: self.headers.clone(),
        }
    }

    /// The loading view, if `on_load` is registered
    #[must_use]
    pub fn loading_view(&self) -> Option<V> {
        self.on_load.as_ref().map(|on_load| on_load())
    }

    /// Check that this config can be honoured
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingPath`] if the path is blank
    /// - [`ConfigError::NoDeliveryChannel`] if none of `children`, `on_fetch`
    ///   or `render` is registered
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path.trim().is_empty() {
            return Err(ConfigError::MissingPath);
        }
        if self.children.is_none() && self.on_fetch.is_none() && self.render.is_none() {
            return Err(ConfigError::NoDeliveryChannel);
        }
        Ok(())
    }
}

impl<V> Clone for FetchConfig<V> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            params: self.params.clone(),
            headers: self.headers.clone(),
            refetch: self.refetch,
            result_only: self.result_only,
            on_load: self.on_load.clone(),
            on_fetch: self.on_fetch.clone(),
            on_error: self.on_error.clone(),
            render: self.render.clone(),
            children: self.children.clone(),
        }
    }
}

// Manual Debug implementation since callbacks don't implement Debug
impl<V> fmt::Debug for FetchConfig<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchConfig")
            .field("path", &self.path)
            .field("params", &self.params)
            .field("headers", &self.headers)
            .field("refetch", &self.refetch)
            .field("result_only", &self.result_only)
            .field("on_load", &self.on_load.is_some())
            .field("on_fetch", &self.on_fetch.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("render", &self.render.is_some())
            .field("children", &self.children.is_some())
            .finish()
    }
}
