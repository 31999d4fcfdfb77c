//! The public face of the fetch controller.

use std::sync::Arc;
use std::time::Duration;

use lifecycle_fetch_core::environment::Transport;
use lifecycle_fetch_runtime::{EffectHandle, Store, StoreConfig};
use tokio::sync::broadcast;

use crate::config::FetchConfig;
use crate::error::{ControllerError, DispatchError};
use crate::identity::FetchIdentity;
use crate::reducer::{ControllerAction, ControllerReducer, ControllerState, FetchEnvironment, Phase};

type ControllerStore<V> =
    Store<ControllerState<V>, ControllerAction<V>, FetchEnvironment, ControllerReducer<V>>;

/// A lifecycle-bound fetch controller
///
/// One controller serves one owner: it is activated once, reconfigured any
/// number of times and deactivated once. Clones share the same controller.
///
/// Delivery channels run while the controller state is locked. A lifecycle
/// event sent from another task waits for a running dispatch to finish, so
/// once `deactivate` returns no channel is invoked again.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use lifecycle_fetch::{FetchConfig, FetchController};
/// use lifecycle_fetch_testing::MockTransport;
///
/// # async fn example() -> Result<(), lifecycle_fetch::ControllerError> {
/// let controller: FetchController<String> = FetchController::new(Arc::new(MockTransport::new()));
///
/// let mut handle = controller
///     .activate(FetchConfig::new("/users").render(|d| format!("{:?}", d.data())))
///     .await?;
/// handle.wait().await;
///
/// println!("{:?}", controller.view().await);
/// controller.deactivate().await?;
/// # Ok(())
/// # }
/// ```
pub struct FetchController<V: Clone + Send + Sync + 'static> {
    store: ControllerStore<V>,
}

impl<V: Clone + Send + Sync + 'static> Clone for FetchController<V> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<V: Clone + Send + Sync + 'static> std::fmt::Debug for FetchController<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchController").finish_non_exhaustive()
    }
}

impl<V: Clone + Send + Sync + 'static> FetchController<V> {
    /// Create an idle controller using `transport`
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_store_config(transport, StoreConfig::default())
    }

    /// Create an idle controller with custom store settings
    #[must_use]
    pub fn with_store_config(transport: Arc<dyn Transport>, config: StoreConfig) -> Self {
        Self {
            store: Store::with_config(
                ControllerState::default(),
                ControllerReducer::new(),
                FetchEnvironment::new(transport),
                config,
            ),
        }
    }

    /// The owner was created: validate `config` and issue the first fetch
    ///
    /// The returned handle completes once the fetch has been dispatched (or
    /// discarded).
    ///
    /// # Errors
    ///
    /// - [`ControllerError::Config`] if `config` fails validation; nothing is fetched
    /// - [`ControllerError::AlreadyActivated`] on a second activation
    /// - [`ControllerError::Deactivated`] after deactivation
    /// - [`ControllerError::Store`] if the controller is shutting down
    pub async fn activate(&self, config: FetchConfig<V>) -> Result<EffectHandle, ControllerError> {
        tracing::debug!(path = config.path(), "Activating fetch controller");
        self.submit(ControllerAction::Activate(config)).await
    }

    /// The owner received a new config
    ///
    /// Fetches again only if path or refetch changed, dispatching the reset
    /// outcome first. The returned handle completes once that fetch has been
    /// dispatched or discarded.
    ///
    /// # Errors
    ///
    /// - [`ControllerError::Config`] if `config` fails validation; state is untouched
    /// - [`ControllerError::NotActivated`] before activation
    /// - [`ControllerError::Deactivated`] after deactivation
    /// - [`ControllerError::Store`] if the controller is shutting down
    pub async fn reconfigure(
        &self,
        config: FetchConfig<V>,
    ) -> Result<EffectHandle, ControllerError> {
        self.submit(ControllerAction::Reconfigure(config)).await
    }

    /// Send a lifecycle event and report the reducer's verdict on it
    async fn submit(&self, action: ControllerAction<V>) -> Result<EffectHandle, ControllerError> {
        let (handle, rejection) = self
            .store
            .send_and_inspect(action, ControllerState::rejection)
            .await?;

        match rejection {
            Some(rejection) => Err(rejection.into()),
            None => Ok(handle),
        }
    }

    /// The owner was torn down
    ///
    /// In-flight requests are not cancelled; their outcomes are dropped.
    /// Calling this more than once is harmless.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Store`] if the controller is shutting down.
    pub async fn deactivate(&self) -> Result<(), ControllerError> {
        self.store.send(ControllerAction::Deactivate).await?;
        Ok(())
    }

    /// Current phase
    pub async fn phase(&self) -> Phase {
        self.store.state(|s| s.phase).await
    }

    /// Identity of the config in force
    pub async fn identity(&self) -> Option<FetchIdentity> {
        self.store.state(|s| s.identity().cloned()).await
    }

    /// Whether outcomes are still dispatched
    pub async fn is_live(&self) -> bool {
        self.store.state(ControllerState::is_live).await
    }

    /// What the owner should show right now
    ///
    /// While idle or loading this is the `on_load` view (if registered);
    /// afterwards it is the view produced by the last dispatch.
    pub async fn view(&self) -> Option<V> {
        self.store
            .state(|s| match s.phase {
                Phase::Idle | Phase::Loading => {
                    s.config.as_ref().and_then(FetchConfig::loading_view)
                },
                Phase::Loaded | Phase::Errored => s.view.clone(),
            })
            .await
    }

    /// Error raised by the last dispatch, if any
    pub async fn fault(&self) -> Option<DispatchError> {
        self.store.state(|s| s.fault).await
    }

    /// Subscribe to every action fed back by effects
    ///
    /// Completions and presentations show up here, including discarded ones.
    #[must_use]
    pub fn subscribe_actions(&self) -> broadcast::Receiver<ControllerAction<V>> {
        self.store.subscribe_actions()
    }

    /// Number of fetches still running
    #[must_use]
    pub fn pending_fetches(&self) -> usize {
        self.store.pending_effects()
    }

    /// Stop accepting events and wait for in-flight fetches to finish
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Store`] if fetches are still running when
    /// `timeout` expires.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), ControllerError> {
        self.store.shutdown(timeout).await?;
        Ok(())
    }

    /// [`shutdown`](Self::shutdown) with the timeout from [`StoreConfig`]
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Store`] if fetches are still running when
    /// the configured timeout expires.
    pub async fn shutdown_default(&self) -> Result<(), ControllerError> {
        self.store.shutdown_default().await?;
        Ok(())
    }
}
