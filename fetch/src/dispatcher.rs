//! Fans one outcome out to the registered delivery channels.

use lifecycle_fetch_runtime::metrics::FETCH_OUTCOMES_DISPATCHED;

use crate::config::FetchConfig;
use crate::error::DispatchError;
use crate::outcome::{Delivery, ErrorReport, Outcome};

/// Deliver `outcome` through every channel registered on `config`
///
/// Channels run in a fixed order: `on_error` (only for failed outcomes),
/// `on_fetch`, `render`, `children`. All of them see the same shape,
/// `Delivery::Data` when `result_only` is set and the full outcome
/// otherwise.
///
/// Returns the view produced by `children`, or by `render` when no
/// `children` is registered.
///
/// # Errors
///
/// Returns [`DispatchError::ChildCount`] if `children` does not return
/// exactly one value. Channels before it have already run.
pub fn dispatch<V>(config: &FetchConfig<V>, outcome: &Outcome) -> Result<Option<V>, DispatchError> {
    let kind = if outcome.is_reset() {
        "reset"
    } else if outcome.is_error() {
        "error"
    } else {
        "data"
    };
    tracing::debug!(path = config.path(), kind, "Dispatching outcome");
    metrics::counter!(FETCH_OUTCOMES_DISPATCHED, "kind" => kind).increment(1);

    if let (Some(on_error), Some(error)) = (&config.on_error, &outcome.error) {
        on_error(ErrorReport {
            error: error.clone(),
            status: outcome.status,
        });
    }

    let delivery = Delivery::shape(outcome, config.result_only());

    if let Some(on_fetch) = &config.on_fetch {
        on_fetch(delivery.clone());
    }

    let rendered = config.render.as_ref().map(|render| render(delivery.clone()));

    let Some(children) = &config.children else {
        return Ok(rendered);
    };

    let mut produced = children(delivery);
    if produced.len() != 1 {
        let error = DispatchError::ChildCount {
            count: produced.len(),
        };
        tracing::error!(path = config.path(), %error, "Invalid children result");
        return Err(error);
    }
    Ok(produced.pop())
}
