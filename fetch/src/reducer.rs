//! The request lifecycle state machine.
//!
//! [`ControllerReducer`] decides when a fetch is issued, which completions
//! are honoured and when the dispatcher runs. It never touches the transport
//! directly: fetches leave as [`Effect::Future`] and dispatches as
//! [`Effect::Immediate`], both executed by the store.
//!
//! Every issued fetch carries a generation number. A completion is only
//! dispatched if the controller is still live and its generation is the
//! latest one issued.

use std::marker::PhantomData;
use std::sync::Arc;

use lifecycle_fetch_core::environment::Transport;
use lifecycle_fetch_core::transport::TransportRequest;
use lifecycle_fetch_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use lifecycle_fetch_runtime::metrics::FETCH_OUTCOMES_DISCARDED;
use serde::{Deserialize, Serialize};

use crate::config::FetchConfig;
use crate::dispatcher;
use crate::error::{DispatchError, Rejection};
use crate::executor;
use crate::identity::{FetchIdentity, IdentityTracker};
use crate::outcome::Outcome;

/// Where the current fetch stands
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Not activated yet
    #[default]
    Idle,
    /// A fetch is in flight
    Loading,
    /// The latest fetch succeeded
    Loaded,
    /// The latest fetch failed
    Errored,
}

impl Phase {
    /// Whether a terminal outcome has been dispatched for the current identity
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Loaded | Self::Errored)
    }
}

/// Controller state
#[derive(Clone, Debug)]
pub struct ControllerState<V> {
    /// Current phase
    pub phase: Phase,
    /// The config in force
    pub config: Option<FetchConfig<V>>,
    /// View produced by the last dispatch
    pub view: Option<V>,
    /// Error raised by the last dispatch, cleared by the next good one
    pub fault: Option<DispatchError>,
    rejection: Option<Rejection>,
    tracker: IdentityTracker,
    generation: u64,
    live: bool,
    activated: bool,
}

impl<V> Default for ControllerState<V> {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            config: None,
            view: None,
            fault: None,
            rejection: None,
            tracker: IdentityTracker::new(),
            generation: 0,
            live: false,
            activated: false,
        }
    }
}

impl<V> ControllerState<V> {
    /// Generation of the most recently issued fetch (0 before the first)
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether completions are still dispatched
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.live
    }

    /// Whether `Activate` has been accepted
    #[must_use]
    pub const fn is_activated(&self) -> bool {
        self.activated
    }

    /// Identity of the current config
    #[must_use]
    pub const fn identity(&self) -> Option<&FetchIdentity> {
        self.tracker.current()
    }

    /// Why the most recent `Activate` or `Reconfigure` was refused, if it was
    #[must_use]
    pub const fn rejection(&self) -> Option<Rejection> {
        self.rejection
    }

    fn reject(&mut self, rejection: Rejection) -> SmallVec<[Effect<ControllerAction<V>>; 4]> {
        tracing::warn!(%rejection, "Lifecycle event refused");
        self.rejection = Some(rejection);
        SmallVec::new()
    }
}

/// Inputs to the controller
#[derive(Clone, Debug)]
pub enum ControllerAction<V> {
    /// The owner was created
    Activate(FetchConfig<V>),
    /// The owner received a new config
    Reconfigure(FetchConfig<V>),
    /// The owner was torn down
    Deactivate,
    /// A fetch finished (fed back by the fetch effect)
    FetchCompleted {
        /// Generation the fetch was issued under
        generation: u64,
        /// Normalized result
        outcome: Outcome,
    },
    /// An outcome was dispatched (fed back by the dispatch effect)
    Presented {
        /// Generation the dispatched outcome belongs to
        generation: u64,
        /// View produced by the channels, or the contract they broke
        result: Result<Option<V>, DispatchError>,
    },
}

/// Injected dependencies
#[derive(Clone)]
pub struct FetchEnvironment {
    /// The transport every fetch goes through
    pub transport: Arc<dyn Transport>,
}

impl FetchEnvironment {
    /// Create an environment around `transport`
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

impl std::fmt::Debug for FetchEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchEnvironment").finish_non_exhaustive()
    }
}

/// The lifecycle reducer
///
/// Generic over the view type only; it holds no data.
pub struct ControllerReducer<V> {
    _view: PhantomData<fn() -> V>,
}

impl<V> ControllerReducer<V> {
    /// Create a new controller reducer
    #[must_use]
    pub const fn new() -> Self {
        Self { _view: PhantomData }
    }
}

impl<V> Default for ControllerReducer<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Clone for ControllerReducer<V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for ControllerReducer<V> {}

impl<V> std::fmt::Debug for ControllerReducer<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ControllerReducer")
    }
}

/// Bump the generation, enter `Loading` and describe the fetch
fn issue_fetch<V: Send + 'static>(
    state: &mut ControllerState<V>,
    request: TransportRequest,
    env: &FetchEnvironment,
) -> Effect<ControllerAction<V>> {
    state.generation += 1;
    state.phase = Phase::Loading;

    let generation = state.generation;
    let transport = Arc::clone(&env.transport);
    tracing::debug!(generation, path = %request.path, "Issuing fetch");

    Effect::future(async move {
        let outcome = executor::execute(transport.as_ref(), request).await;
        Some(ControllerAction::FetchCompleted {
            generation,
            outcome,
        })
    })
}

/// Describe a synchronous dispatch of `outcome` through `config`
fn present<V: Send + 'static>(
    config: FetchConfig<V>,
    outcome: Outcome,
    generation: u64,
) -> Effect<ControllerAction<V>> {
    Effect::immediate(move || {
        Some(ControllerAction::Presented {
            generation,
            result: dispatcher::dispatch(&config, &outcome),
        })
    })
}

fn discard(generation: u64, reason: &'static str) {
    tracing::debug!(generation, reason, "Discarding fetch outcome");
    metrics::counter!(FETCH_OUTCOMES_DISCARDED, "reason" => reason).increment(1);
}

impl<V: Clone + Send + Sync + 'static> Reducer for ControllerReducer<V> {
    type State = ControllerState<V>;
    type Action = ControllerAction<V>;
    type Environment = FetchEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            ControllerAction::Activate(config) => {
                state.rejection = None;
                if let Err(error) = config.validate() {
                    return state.reject(error.into());
                }
                if state.activated {
                    return state.reject(if state.live {
                        Rejection::AlreadyActivated
                    } else {
                        Rejection::Deactivated
                    });
                }

                state.activated = true;
                state.live = true;
                state.tracker.observe(config.identity());

                let request = config.request();
                state.config = Some(config);
                smallvec![issue_fetch(state, request, env)]
            },

            ControllerAction::Reconfigure(config) => {
                state.rejection = None;
                if let Err(error) = config.validate() {
                    return state.reject(error.into());
                }
                if !state.activated {
                    return state.reject(Rejection::NotActivated);
                }
                if !state.live {
                    return state.reject(Rejection::Deactivated);
                }

                let needs_fetch = state.tracker.observe(config.identity());
                if !needs_fetch {
                    state.config = Some(config);
                    return SmallVec::new();
                }

                let request = config.request();
                state.config = Some(config.clone());
                let fetch = issue_fetch(state, request, env);

                // Reset runs inline before the fetch is spawned
                smallvec![present(config, Outcome::reset(), state.generation), fetch]
            },

            ControllerAction::Deactivate => {
                if state.live {
                    tracing::debug!(generation = state.generation, "Controller deactivated");
                }
                state.live = false;
                SmallVec::new()
            },

            ControllerAction::FetchCompleted {
                generation,
                outcome,
            } => {
                if !state.live {
                    discard(generation, "deactivated");
                    return SmallVec::new();
                }
                if generation != state.generation {
                    discard(generation, "superseded");
                    return SmallVec::new();
                }
                let Some(config) = state.config.clone() else {
                    return SmallVec::new();
                };

                state.phase = if outcome.is_error() {
                    Phase::Errored
                } else {
                    Phase::Loaded
                };
                tracing::debug!(generation, phase = ?state.phase, "Fetch completed");

                smallvec![present(config, outcome, generation)]
            },

            ControllerAction::Presented { generation, result } => {
                if generation == state.generation {
                    match result {
                        Ok(view) => {
                            state.view = view;
                            state.fault = None;
                        },
                        Err(error) => state.fault = Some(error),
                    }
                }
                SmallVec::new()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use lifecycle_fetch_core::transport::{Method, TransportResponse};
    use lifecycle_fetch_testing::{MockTransport, ReducerTest, assertions};
    use proptest::prelude::*;
    use serde_json::json;

    fn env(transport: &MockTransport) -> FetchEnvironment {
        FetchEnvironment::new(Arc::new(transport.clone()))
    }

    fn config(path: &str) -> FetchConfig<String> {
        FetchConfig::new(path).render(|delivery| format!("{:?}", delivery.data()))
    }

    fn active(path: &str) -> ControllerState<String> {
        let mut state = ControllerState::default();
        let transport = MockTransport::new();
        let _ = ControllerReducer::new().reduce(
            &mut state,
            ControllerAction::Activate(config(path)),
            &env(&transport),
        );
        state
    }

    fn loaded() -> Outcome {
        Outcome {
            data: Some(json!(1)),
            is_ok: Some(true),
            loaded: true,
            status: Some(200),
            ..Outcome::default()
        }
    }

    #[test]
    fn activate_enters_loading_with_one_fetch() {
        ReducerTest::new(ControllerReducer::new())
            .with_env(env(&MockTransport::new()))
            .given_state(ControllerState::default())
            .when_action(ControllerAction::Activate(config("/users")))
            .then_state(|state| {
                assert_eq!(state.phase, Phase::Loading);
                assert!(state.is_live());
                assert!(state.is_activated());
                assert_eq!(state.generation(), 1);
                assert_eq!(state.identity(), Some(&FetchIdentity::new("/users", false)));
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn invalid_activation_leaves_state_untouched() {
        ReducerTest::new(ControllerReducer::new())
            .with_env(env(&MockTransport::new()))
            .given_state(ControllerState::default())
            .when_action(ControllerAction::Activate(FetchConfig::new("")))
            .then_state(|state: &ControllerState<String>| {
                assert_eq!(state.phase, Phase::Idle);
                assert!(!state.is_activated());
                assert_eq!(state.generation(), 0);
                assert_eq!(
                    state.rejection(),
                    Some(Rejection::Config(ConfigError::MissingPath))
                );
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn second_activation_is_rejected() {
        ReducerTest::new(ControllerReducer::new())
            .with_env(env(&MockTransport::new()))
            .given_state(active("/a"))
            .when_action(ControllerAction::Activate(config("/b")))
            .then_state(|state| {
                assert_eq!(state.generation(), 1);
                assert_eq!(state.identity(), Some(&FetchIdentity::new("/a", false)));
                assert_eq!(state.rejection(), Some(Rejection::AlreadyActivated));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn reconfigure_outside_the_active_window_is_rejected() {
        ReducerTest::new(ControllerReducer::new())
            .with_env(env(&MockTransport::new()))
            .given_state(ControllerState::default())
            .when_action(ControllerAction::Reconfigure(config("/a")))
            .then_state(|state| {
                assert_eq!(state.rejection(), Some(Rejection::NotActivated));
                assert_eq!(state.generation(), 0);
            })
            .then_effects(assertions::assert_no_effects)
            .run();

        ReducerTest::new(ControllerReducer::new())
            .with_env(env(&MockTransport::new()))
            .given_state(active("/a"))
            .when_actions([
                ControllerAction::Deactivate,
                ControllerAction::Reconfigure(config("/b")),
            ])
            .then_state(|state| {
                assert_eq!(state.rejection(), Some(Rejection::Deactivated));
                assert_eq!(state.identity(), Some(&FetchIdentity::new("/a", false)));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn accepted_event_clears_previous_rejection() {
        ReducerTest::new(ControllerReducer::new())
            .with_env(env(&MockTransport::new()))
            .given_state(active("/a"))
            .when_actions([
                ControllerAction::Reconfigure(FetchConfig::new("")),
                ControllerAction::Reconfigure(config("/b")),
            ])
            .then_state(|state| {
                assert_eq!(state.rejection(), None);
                assert_eq!(state.generation(), 2);
            })
            .run();
    }

    #[test]
    fn reconfigure_with_same_identity_only_swaps_config() {
        ReducerTest::new(ControllerReducer::new())
            .with_env(env(&MockTransport::new()))
            .given_state(active("/a"))
            .when_action(ControllerAction::Reconfigure(
                config("/a").with_method(Method::Post).with_result_only(true),
            ))
            .then_state(|state| {
                assert_eq!(state.generation(), 1);
                assert_eq!(state.phase, Phase::Loading);
                assert!(state.config.as_ref().unwrap().result_only());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn identity_change_resets_then_fetches() {
        ReducerTest::new(ControllerReducer::new())
            .with_env(env(&MockTransport::new()))
            .given_state(active("/a"))
            .when_action(ControllerAction::Reconfigure(config("/b")))
            .then_state(|state| {
                assert_eq!(state.generation(), 2);
                assert_eq!(state.phase, Phase::Loading);
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 2);
                assert!(matches!(effects[0], Effect::Immediate(_)));
                assert!(matches!(effects[1], Effect::Future(_)));
            })
            .run();
    }

    #[test]
    fn completion_after_deactivate_is_discarded() {
        ReducerTest::new(ControllerReducer::new())
            .with_env(env(&MockTransport::new()))
            .given_state(active("/a"))
            .when_action(ControllerAction::Deactivate)
            .when_action(ControllerAction::FetchCompleted {
                generation: 1,
                outcome: loaded(),
            })
            .then_state(|state| {
                assert!(!state.is_live());
                assert_eq!(state.phase, Phase::Loading);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn superseded_completion_is_discarded() {
        ReducerTest::new(ControllerReducer::new())
            .with_env(env(&MockTransport::new()))
            .given_state(active("/a"))
            .when_action(ControllerAction::Reconfigure(config("/b")))
            .when_action(ControllerAction::FetchCompleted {
                generation: 1,
                outcome: loaded(),
            })
            .then_state(|state| assert_eq!(state.phase, Phase::Loading))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn current_completion_is_presented() {
        let failed = Outcome {
            error: Some(crate::outcome::FetchError::TransportFailure {
                detail: "x".to_string(),
            }),
            is_ok: Some(false),
            loaded: true,
            ..Outcome::default()
        };

        ReducerTest::new(ControllerReducer::new())
            .with_env(env(&MockTransport::new()))
            .given_state(active("/a"))
            .when_action(ControllerAction::FetchCompleted {
                generation: 1,
                outcome: failed,
            })
            .then_state(|state| assert_eq!(state.phase, Phase::Errored))
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_immediate_effect(effects);
            })
            .run();
    }

    #[test]
    fn presented_view_and_fault_are_recorded() {
        ReducerTest::new(ControllerReducer::new())
            .with_env(env(&MockTransport::new()))
            .given_state(active("/a"))
            .when_action(ControllerAction::Presented {
                generation: 1,
                result: Err(DispatchError::ChildCount { count: 2 }),
            })
            .then_state(|state| {
                assert_eq!(state.fault, Some(DispatchError::ChildCount { count: 2 }));
            })
            .run();

        ReducerTest::new(ControllerReducer::new())
            .with_env(env(&MockTransport::new()))
            .given_state(active("/a"))
            .when_actions([
                ControllerAction::Presented {
                    generation: 1,
                    result: Err(DispatchError::ChildCount { count: 0 }),
                },
                ControllerAction::Presented {
                    generation: 1,
                    result: Ok(Some("view".to_string())),
                },
            ])
            .then_state(|state| {
                assert_eq!(state.view.as_deref(), Some("view"));
                assert_eq!(state.fault, None);
            })
            .run();
    }

    #[tokio::test]
    async fn fetch_effect_feeds_back_completion() {
        let transport = MockTransport::new();
        transport.respond("/users", TransportResponse::ok(200, json!([{"id": 1}])));

        let mut state = ControllerState::default();
        let mut effects = ControllerReducer::new().reduce(
            &mut state,
            ControllerAction::Activate(config("/users")),
            &env(&transport),
        );

        let Some(Effect::Future(fetch)) = effects.pop() else {
            panic!("expected a fetch effect");
        };
        let Some(ControllerAction::FetchCompleted {
            generation,
            outcome,
        }) = fetch.await
        else {
            panic!("expected a completion");
        };

        assert_eq!(generation, 1);
        assert_eq!(outcome.data, Some(json!([{"id": 1}])));
        assert_eq!(transport.call_count(), 1);
    }

    fn arb_config() -> impl Strategy<Value = (String, bool, bool, bool)> {
        (
            prop_oneof![Just("/a".to_string()), Just("/b".to_string())],
            any::<bool>(),
            any::<bool>(),
            any::<bool>(),
        )
    }

    proptest! {
        #[test]
        fn fetches_follow_identity_changes(
            configs in prop::collection::vec(arb_config(), 1..12)
        ) {
            let transport = MockTransport::new();
            let env = env(&transport);
            let reducer = ControllerReducer::new();
            let mut state = ControllerState::default();

            let mut fetches = 0;
            let mut previous: Option<FetchIdentity> = None;
            let mut expected = 0;

            for (index, (path, refetch, post, result_only)) in configs.into_iter().enumerate() {
                let method = if post { Method::Post } else { Method::Get };
                let next = config(&path)
                    .with_refetch(refetch)
                    .with_method(method)
                    .with_result_only(result_only);

                if previous.as_ref() != Some(&next.identity()) {
                    expected += 1;
                }
                previous = Some(next.identity());

                let action = if index == 0 {
                    ControllerAction::Activate(next)
                } else {
                    ControllerAction::Reconfigure(next)
                };
                let effects = reducer.reduce(&mut state, action, &env);
                fetches += assertions::future_count(&effects);
            }

            prop_assert_eq!(fetches, expected);
            prop_assert_eq!(state.generation(), expected as u64);
        }
    }
}
