//! # Lifecycle Fetch
//!
//! A declarative data-fetch controller bound to the lifecycle of its owner.
//!
//! Given a resource path (plus method, body and headers) the controller
//! issues one request per fetch identity, follows the owner through
//! activation, reconfiguration and teardown, and delivers the outcome to
//! the caller's delivery channels.
//!
//! ## Architecture
//!
//! - [`identity`]: decides whether a config change requires a new request
//! - [`reducer`]: the lifecycle state machine, driven by a [`Store`](lifecycle_fetch_runtime::Store)
//! - [`executor`]: one transport call normalized into an [`Outcome`]
//! - [`dispatcher`]: fans an outcome out to `on_error`, `on_fetch`, `render`, `children`
//! - [`controller`]: the [`FetchController`] owners talk to
//! - [`http`]: a `reqwest` implementation of the transport
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use lifecycle_fetch::{FetchConfig, FetchController, HttpTransport};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpTransport::from_env()?;
//! let controller: FetchController<String> = FetchController::new(Arc::new(transport));
//!
//! controller
//!     .activate(
//!         FetchConfig::new("/users")
//!             .on_load(|| "Loading...".to_string())
//!             .on_error(|report| eprintln!("fetch failed: {}", report.error))
//!             .render(|delivery| format!("{:?}", delivery.data())),
//!     )
//!     .await?
//!     .wait()
//!     .await;
//!
//! println!("{:?}", controller.view().await);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod http;
pub mod identity;
pub mod outcome;
pub mod reducer;

pub use config::FetchConfig;
pub use controller::FetchController;
pub use error::{ConfigError, ControllerError, DispatchError, Rejection};
pub use http::{HttpTransport, HttpTransportConfig};
pub use identity::{FetchIdentity, IdentityTracker, needs_fetch};
pub use outcome::{Delivery, ErrorReport, FetchError, GENERIC_FAILURE_MESSAGE, Outcome};
pub use reducer::{ControllerAction, ControllerReducer, ControllerState, FetchEnvironment, Phase};

pub use lifecycle_fetch_core::transport::{
    Body, Headers, Method, RequestParams, TransportError, TransportRequest, TransportResponse,
};
