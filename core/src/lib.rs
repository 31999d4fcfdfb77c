//! # Lifecycle Fetch Core
//!
//! Core traits and types for the lifecycle-bound fetch controller.
//!
//! This crate provides the abstractions the controller is built from:
//!
//! - **State**: Controller state owned by a single instance
//! - **Action**: All inputs to a reducer (lifecycle events and fed-back fetch results)
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Side effect descriptions (not execution)
//! - **Environment**: Injected dependencies via traits (the [`Transport`](environment::Transport))
//!
//! The transport wire types ([`transport`]) live here as well so that the
//! runtime, the testing crate and the controller agree on one request and
//! response shape.
//!
//! ## Example
//!
//! ```ignore
//! use lifecycle_fetch_core::*;
//!
//! impl Reducer for ControllerReducer {
//!     type State = ControllerState;
//!     type Action = ControllerAction;
//!     type Environment = FetchEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut ControllerState,
//!         action: ControllerAction,
//!         env: &FetchEnvironment,
//!     ) -> SmallVec<[Effect<ControllerAction>; 4]> {
//!         smallvec![Effect::None]
//!     }
//! }
//! ```

pub use smallvec::{SmallVec, smallvec};

/// Request and response types exchanged with a [`Transport`](environment::Transport)
pub mod transport;

/// Reducer module - The core trait for controller logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They contain all state-machine logic and are deterministic and testable.
pub mod reducer {
    use super::SmallVec;
    use super::effect::Effect;

    /// The Reducer trait - core abstraction for state-machine logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for ControllerReducer {
    ///     type State = ControllerState;
    ///     type Action = ControllerAction;
    ///     type Environment = FetchEnvironment;
    ///
    ///     fn reduce(
    ///         &self,
    ///         state: &mut ControllerState,
    ///         action: ControllerAction,
    ///         env: &FetchEnvironment,
    ///     ) -> SmallVec<[Effect<ControllerAction>; 4]> {
    ///         match action {
    ///             ControllerAction::Deactivate => {
    ///                 state.live = false;
    ///                 SmallVec::new()
    ///             },
    ///             _ => SmallVec::new(),
    ///         }
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Validates the action
        /// 2. Updates state in place
        /// 3. Returns effect descriptions to be executed
        ///
        /// # Returns
        ///
        /// The effects to be executed by the runtime, in order
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values (not execution), returned from reducers.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;

    /// Boxed future produced by [`Effect::Future`]
    pub type EffectFuture<Action> = Pin<Box<dyn Future<Output = Option<Action>> + Send>>;

    /// Boxed closure produced by [`Effect::Immediate`]
    pub type EffectThunk<Action> = Box<dyn FnOnce() -> Option<Action> + Send>;

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Asynchronous computation, spawned by the runtime
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(EffectFuture<Action>),

        /// Synchronous computation, run inline by the runtime
        ///
        /// Immediate effects run in the order they were returned, before any later
        /// effect of the same reduction starts and before `send` returns. If the
        /// closure yields an action it is reduced right away.
        Immediate(EffectThunk<Action>),
    }

    // Manual Debug implementation since closures and futures don't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
                Effect::Immediate(_) => write!(f, "Effect::Immediate(<closure>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Wrap an async computation as an effect
        #[must_use]
        pub fn future<F>(future: F) -> Self
        where
            F: Future<Output = Option<Action>> + Send + 'static,
        {
            Effect::Future(Box::pin(future))
        }

        /// Wrap a synchronous computation as an effect
        #[must_use]
        pub fn immediate<F>(f: F) -> Self
        where
            F: FnOnce() -> Option<Action> + Send + 'static,
        {
            Effect::Immediate(Box::new(f))
        }

        /// Returns `true` for [`Effect::None`]
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter.
pub mod environment {
    use futures::future::BoxFuture;

    use crate::transport::{TransportError, TransportRequest, TransportResponse};

    /// Future returned by [`Transport::request`]
    pub type TransportFuture<'a> = BoxFuture<'a, Result<TransportResponse, TransportError>>;

    /// Transport trait - the opaque request/response primitive
    ///
    /// A transport performs exactly one request per call and settles exactly
    /// once. It owns its own wire protocol, timeouts and connection handling;
    /// the controller never retries or cancels.
    ///
    /// # Outcomes
    ///
    /// - `Ok(response)` with `response.error == false`: the request succeeded
    /// - `Ok(response)` with `response.error == true`: the server answered with an
    ///   application-level error, `response.result` carries the payload
    /// - `Err(error)`: the request could not be performed at all
    ///
    /// # Dyn Compatibility
    ///
    /// This trait returns boxed futures ([`TransportFuture`]) instead of using `async fn`
    /// to enable trait object usage (`Arc<dyn Transport>`). This is required for
    /// the effect system where reducers create effects that capture the transport.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // Production - reqwest backed
    /// let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(config)?);
    ///
    /// // Test - scripted responses
    /// let transport: Arc<dyn Transport> = Arc::new(MockTransport::new());
    /// ```
    pub trait Transport: Send + Sync {
        /// Perform a single request
        ///
        /// # Errors
        ///
        /// Returns a [`TransportError`] when the request could not be performed
        /// or its response could not be read.
        fn request(&self, request: TransportRequest) -> TransportFuture<'_>;
    }
}
