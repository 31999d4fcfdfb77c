//! Lifecycle fetch demo binary
//!
//! Walks one controller through activation, a reconfiguration that keeps
//! the identity, one that changes it, and teardown. Uses the HTTP transport
//! when `FETCH_BASE_URL` is set, otherwise a scripted in-memory transport.

use std::sync::Arc;
use std::time::Duration;

use lifecycle_fetch::{
    Delivery, FetchConfig, FetchController, HttpTransport, Method, TransportResponse,
};
use lifecycle_fetch_core::environment::Transport;
use lifecycle_fetch_runtime::StoreConfig;
use lifecycle_fetch_runtime::metrics::register_metrics;
use lifecycle_fetch_testing::MockTransport;
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn transport() -> Arc<dyn Transport> {
    match HttpTransport::from_env() {
        Ok(http) => {
            tracing::info!(base_url = %http.config().base_url, "Using HTTP transport");
            Arc::new(http)
        },
        Err(error) => {
            tracing::info!(%error, "Falling back to scripted transport");
            let mock = MockTransport::new();
            mock.respond(
                "/users",
                TransportResponse::ok(200, json!([{"id": 1, "name": "Ada"}])),
            );
            mock.respond(
                "/users/missing",
                TransportResponse::rejected(404, json!({"message": "no such user"})),
            );
            Arc::new(mock)
        },
    }
}

fn config(path: &str) -> FetchConfig<String> {
    FetchConfig::new(path)
        .on_load(|| "Loading...".to_string())
        .on_fetch(|delivery: Delivery| println!("  on_fetch: {delivery:?}"))
        .on_error(|report| println!("  on_error: {} (status {:?})", report.error, report.status))
        .render(|delivery| match delivery.data() {
            Some(data) => format!("Rendered {data}"),
            None => "Nothing to show".to_string(),
        })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lifecycle_fetch=debug,lifecycle_fetch_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
    register_metrics();

    println!("=== Lifecycle Fetch Demo ===\n");

    let controller: FetchController<String> = FetchController::with_store_config(
        transport(),
        StoreConfig::default().with_shutdown_timeout(Duration::from_secs(5)),
    );

    println!(">>> Activate /users");
    let mut handle = controller.activate(config("/users")).await?;
    println!("  view while loading: {:?}", controller.view().await);
    handle.wait_with_timeout(Duration::from_secs(10)).await?;
    println!("  phase: {:?}, view: {:?}", controller.phase().await, controller.view().await);

    println!("\n>>> Reconfigure /users with POST (same identity, no fetch)");
    controller
        .reconfigure(config("/users").with_method(Method::Post))
        .await?;
    println!("  phase: {:?}", controller.phase().await);

    println!("\n>>> Reconfigure /users/missing (new identity)");
    let mut handle = controller.reconfigure(config("/users/missing")).await?;
    handle.wait_with_timeout(Duration::from_secs(10)).await?;
    println!("  phase: {:?}, view: {:?}", controller.phase().await, controller.view().await);

    println!("\n>>> Deactivate");
    controller.deactivate().await?;
    println!("  live: {}", controller.is_live().await);

    controller.shutdown_default().await?;
    println!("\n=== Demo Complete ===");
    Ok(())
}
