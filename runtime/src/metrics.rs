//! Metric names and descriptions.
//!
//! The runtime and the controller record through the `metrics` facade; any
//! recorder installed by the host application picks them up. Call
//! [`register_metrics`] once after installing a recorder so exporters can show
//! descriptions and units.
//!
//! # Example
//!
//! ```rust
//! use lifecycle_fetch_runtime::metrics::register_metrics;
//!
//! // Without an installed recorder this is a no-op
//! register_metrics();
//! ```

use metrics::{Unit, describe_counter, describe_histogram};

// Re-export metrics macros for use in other crates
pub use metrics::{counter, histogram};

/// Actions reduced by a store
pub const STORE_COMMANDS_TOTAL: &str = "store.commands.total";
/// Effects executed by a store, labelled by `type`
pub const STORE_EFFECTS_EXECUTED: &str = "store.effects.executed";
/// Reducer execution time
pub const STORE_REDUCER_DURATION: &str = "store.reducer.duration_seconds";
/// Transport requests issued by controllers
pub const FETCH_REQUESTS_ISSUED: &str = "fetch.requests.issued";
/// Outcomes handed to delivery channels, labelled by `kind`
pub const FETCH_OUTCOMES_DISPATCHED: &str = "fetch.outcomes.dispatched";
/// Outcomes dropped before dispatch, labelled by `reason`
pub const FETCH_OUTCOMES_DISCARDED: &str = "fetch.outcomes.discarded";
/// Transport calls that raised instead of resolving
pub const FETCH_TRANSPORT_FAILURES: &str = "fetch.transport.failures";

/// Register all metric descriptions.
pub fn register_metrics() {
    // Store Metrics
    describe_counter!(
        STORE_COMMANDS_TOTAL,
        Unit::Count,
        "Total number of actions processed by stores"
    );
    describe_counter!(
        STORE_EFFECTS_EXECUTED,
        Unit::Count,
        "Total number of effects executed, by effect type"
    );
    describe_histogram!(
        STORE_REDUCER_DURATION,
        Unit::Seconds,
        "Time taken to execute reducers"
    );

    // Fetch Metrics
    describe_counter!(
        FETCH_REQUESTS_ISSUED,
        Unit::Count,
        "Total number of transport requests issued"
    );
    describe_counter!(
        FETCH_OUTCOMES_DISPATCHED,
        Unit::Count,
        "Total number of outcomes dispatched to delivery channels"
    );
    describe_counter!(
        FETCH_OUTCOMES_DISCARDED,
        Unit::Count,
        "Total number of outcomes discarded as stale or orphaned"
    );
    describe_counter!(
        FETCH_TRANSPORT_FAILURES,
        Unit::Count,
        "Total number of transport calls that failed outright"
    );
}
