//! One transport call, normalized into an [`Outcome`].

use lifecycle_fetch_core::environment::Transport;
use lifecycle_fetch_core::transport::{TransportError, TransportRequest, TransportResponse};
use lifecycle_fetch_runtime::metrics::{FETCH_REQUESTS_ISSUED, FETCH_TRANSPORT_FAILURES};

use crate::outcome::{FetchError, Outcome};

/// Call the transport once and normalize what comes back
///
/// Never fails: transport errors are logged, counted and turned into a
/// [`FetchError::TransportFailure`] outcome.
#[tracing::instrument(
    skip(transport, request),
    fields(path = %request.path, method = %request.method)
)]
pub async fn execute(transport: &dyn Transport, request: TransportRequest) -> Outcome {
    metrics::counter!(FETCH_REQUESTS_ISSUED).increment(1);

    let result = transport.request(request).await;

    if let Err(error) = &result {
        tracing::error!(%error, "Transport call failed");
        metrics::counter!(FETCH_TRANSPORT_FAILURES).increment(1);
    }

    normalize(result)
}

/// Map a transport result onto the outcome shape
///
/// - success: `data` is the result, status and `is_ok` pass through
/// - application error: `error` carries the payload, no status
/// - transport error: generic failure, no status
#[must_use]
pub fn normalize(result: Result<TransportResponse, TransportError>) -> Outcome {
    match result {
        Ok(response) if response.error => Outcome {
            data: None,
            error: Some(FetchError::Application {
                payload: response.result,
            }),
            is_ok: Some(false),
            loaded: true,
            status: None,
            response: None,
        },
        Ok(response) => Outcome {
            data: Some(response.result),
            error: None,
            is_ok: Some(response.is_ok),
            loaded: true,
            status: Some(response.status),
            response: response.response,
        },
        Err(error) => Outcome {
            data: None,
            error: Some(FetchError::TransportFailure {
                detail: error.to_string(),
            }),
            is_ok: Some(false),
            loaded: true,
            status: None,
            response: None,
        },
    }
}
