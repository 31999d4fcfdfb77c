//! The normalized result of one fetch and the shapes it is delivered in.

use lifecycle_fetch_core::transport::ResponseMeta;
use serde_json::Value;
use thiserror::Error;

/// Display text of every transport failure
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong while fetching data";

/// What went wrong with a fetch
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// The server answered with the application-error flag set
    #[error("{}", payload_text(.payload))]
    Application {
        /// Error payload returned by the server
        payload: Value,
    },

    /// The transport raised instead of answering
    ///
    /// Always displays [`GENERIC_FAILURE_MESSAGE`]; the original error text
    /// is kept in `detail` for logs and diagnostics.
    #[error("{}", GENERIC_FAILURE_MESSAGE)]
    TransportFailure {
        /// Original transport error text
        detail: String,
    },
}

fn payload_text(payload: &Value) -> String {
    match payload {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

impl FetchError {
    /// Original transport error text, if this is a transport failure
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::TransportFailure { detail } => Some(detail),
            Self::Application { .. } => None,
        }
    }

    /// Server error payload, if this is an application error
    #[must_use]
    pub const fn payload(&self) -> Option<&Value> {
        match self {
            Self::Application { payload } => Some(payload),
            Self::TransportFailure { .. } => None,
        }
    }

    /// Whether the transport itself failed
    #[must_use]
    pub const fn is_transport_failure(&self) -> bool {
        matches!(self, Self::TransportFailure { .. })
    }
}

/// Normalized result of a fetch
///
/// The default value is the reset placeholder dispatched while a new
/// identity loads: nothing set and `loaded = false`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Outcome {
    /// Response payload on success
    pub data: Option<Value>,
    /// Failure description on error
    pub error: Option<FetchError>,
    /// Transport success flag (`None` until loaded)
    pub is_ok: Option<bool>,
    /// `false` only for the reset placeholder
    pub loaded: bool,
    /// Status code, absent on errors and on the placeholder
    pub status: Option<u16>,
    /// Raw response metadata
    pub response: Option<ResponseMeta>,
}

impl Outcome {
    /// The reset placeholder
    #[must_use]
    pub fn reset() -> Self {
        Self::default()
    }

    /// Whether this outcome carries an error
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Whether this is the reset placeholder
    #[must_use]
    pub const fn is_reset(&self) -> bool {
        !self.loaded
    }
}

/// What a delivery channel receives
///
/// `Data` when the config asks for `result_only`, the full outcome otherwise.
#[derive(Clone, Debug, PartialEq)]
pub enum Delivery {
    /// The whole outcome
    Outcome(Outcome),
    /// Only `outcome.data`
    Data(Option<Value>),
}

impl Delivery {
    /// Shape `outcome` for delivery
    #[must_use]
    pub fn shape(outcome: &Outcome, result_only: bool) -> Self {
        if result_only {
            Self::Data(outcome.data.clone())
        } else {
            Self::Outcome(outcome.clone())
        }
    }

    /// The data carried by either shape
    #[must_use]
    pub const fn data(&self) -> Option<&Value> {
        match self {
            Self::Outcome(outcome) => outcome.data.as_ref(),
            Self::Data(data) => data.as_ref(),
        }
    }

    /// The full outcome, if delivered in full
    #[must_use]
    pub const fn outcome(&self) -> Option<&Outcome> {
        match self {
            Self::Outcome(outcome) => Some(outcome),
            Self::Data(_) => None,
        }
    }
}

/// What `on_error` receives
#[derive(Clone, Debug, PartialEq)]
pub struct ErrorReport {
    /// The error of the outcome
    pub error: FetchError,
    /// The status of the outcome
    pub status: Option<u16>,
}
