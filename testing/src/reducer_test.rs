//! Ergonomic testing utilities for reducers
//!
//! Given-When-Then syntax over a single reducer call, or over a sequence of
//! actions where only the effects of the last one are asserted on.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use lifecycle_fetch_core::{effect::Effect, reducer::Reducer};

type StateAssertion<S> = Box<dyn FnOnce(&S)>;

type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// # Example
///
/// ```ignore
/// use lifecycle_fetch_testing::{ReducerTest, assertions};
///
/// ReducerTest::new(ControllerReducer::new())
///     .with_env(FetchEnvironment::new(Arc::new(MockTransport::new())))
///     .given_state(ControllerState::default())
///     .when_action(ControllerAction::Activate(config))
///     .then_state(|state| assert_eq!(state.phase, Phase::Loading))
///     .then_effects(assertions::assert_has_future_effect)
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    actions: Vec<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            actions: Vec::new(),
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Set the environment for the test
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Add an action to reduce (When)
    ///
    /// Calling this more than once reduces the actions in order.
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.actions.push(action);
        self
    }

    /// Add several actions to reduce in order (When)
    #[must_use]
    pub fn when_actions(mut self, actions: impl IntoIterator<Item = A>) -> Self {
        self.actions.extend(actions);
        self
    }

    /// Add an assertion about the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the effects of the last action (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if initial state, action, or environment is not set,
    /// or if any assertions fail.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        assert!(
            !self.actions.is_empty(),
            "At least one action must be set with when_action()"
        );

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        let mut effects = Vec::new();
        for action in self.actions {
            effects = self.reducer.reduce(&mut state, action, &env).into_vec();
        }

        for assertion in self.state_assertions {
            assertion(&state);
        }

        for assertion in self.effect_assertions {
            assertion(&effects);
        }
    }
}

/// Helper assertions for effects
pub mod assertions {
    use lifecycle_fetch_core::effect::Effect;

    /// Assert that there are no effects
    ///
    /// # Panics
    ///
    /// Panics if effects is not empty.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(Effect::is_none),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// Number of `Future` effects, i.e. transport requests about to be issued
    #[must_use]
    pub fn future_count<A>(effects: &[Effect<A>]) -> usize {
        effects
            .iter()
            .filter(|e| matches!(e, Effect::Future(_)))
            .count()
    }

    /// Assert that effects contain at least one Future effect
    ///
    /// # Panics
    ///
    /// Panics if no Future effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            future_count(effects) > 0,
            "Expected at least one Future effect, but none found"
        );
    }

    /// Assert that effects contain at least one Immediate effect
    ///
    /// # Panics
    ///
    /// Panics if no Immediate effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_immediate_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Immediate(_))),
            "Expected at least one Immediate effect, but none found"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifecycle_fetch_core::effect::Effect;
    use lifecycle_fetch_core::reducer::Reducer;
    use lifecycle_fetch_core::{SmallVec, smallvec};

    #[derive(Clone, Debug)]
    struct TestState {
        count: i32,
    }

    #[derive(Clone, Debug)]
    enum TestAction {
        Increment,
        Report,
        Reported(i32),
    }

    struct TestReducer;

    struct TestEnv;

    impl Reducer for TestReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = TestEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                TestAction::Increment => {
                    state.count += 1;
                    smallvec![Effect::None]
                },
                TestAction::Report => {
                    let count = state.count;
                    smallvec![
                        Effect::immediate(move || Some(TestAction::Reported(count))),
                        Effect::future(async move { Some(TestAction::Reported(count)) }),
                    ]
                },
                TestAction::Reported(_) => SmallVec::new(),
            }
        }
    }

    #[test]
    fn test_reducer_test_increment() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { count: 0 })
            .when_action(TestAction::Increment)
            .then_state(|state| {
                assert_eq!(state.count, 1);
            })
            .then_effects(|effects| {
                assertions::assert_no_effects(effects);
            })
            .run();
    }

    #[test]
    fn test_reducer_test_action_sequence() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { count: 0 })
            .when_actions([TestAction::Increment, TestAction::Increment])
            .when_action(TestAction::Report)
            .then_state(|state| {
                assert_eq!(state.count, 2);
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 2);
                assertions::assert_has_immediate_effect(effects);
                assertions::assert_has_future_effect(effects);
                assert_eq!(assertions::future_count(effects), 1);
            })
            .run();
    }

    #[test]
    fn test_assertions_no_effects() {
        assertions::assert_no_effects::<TestAction>(&[Effect::None]);
        assertions::assert_no_effects::<TestAction>(&[]);
    }

    #[test]
    #[should_panic(expected = "Expected no effects")]
    fn test_assertions_no_effects_rejects_future() {
        assertions::assert_no_effects(&[Effect::future(async { Some(TestAction::Increment) })]);
    }

    #[test]
    fn test_assertions_effects_count() {
        assertions::assert_effects_count(&[Effect::<TestAction>::None], 1);
        assertions::assert_effects_count::<TestAction>(&[], 0);
    }
}
