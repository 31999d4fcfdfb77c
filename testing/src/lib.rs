//! # Lifecycle Fetch Testing
//!
//! Testing utilities and helpers for the lifecycle fetch controller.
//!
//! This crate provides:
//! - A scriptable [`MockTransport`] that records every request
//! - A [`Recorder`] that captures what delivery channels receive
//! - The [`ReducerTest`] Given-When-Then harness and effect assertions
//!
//! ## Example
//!
//! ```ignore
//! use lifecycle_fetch_testing::{MockTransport, Recorder};
//!
//! #[tokio::test]
//! async fn test_users_load() {
//!     let transport = MockTransport::new();
//!     transport.respond("/users", TransportResponse::ok(200, json!([{"id": 1}])));
//!
//!     let deliveries = Recorder::new();
//!     let controller = FetchController::new(Arc::new(transport.clone()));
//!     controller
//!         .activate(FetchConfig::new("/users").on_fetch(deliveries.sink()))
//!         .await?
//!         .wait()
//!         .await;
//!
//!     assert_eq!(transport.call_count(), 1);
//!     assert_eq!(deliveries.len(), 1);
//! }
//! ```

/// Given-When-Then harness for reducers
pub mod reducer_test;

/// Mock implementations of Environment traits
pub mod mocks {
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

    use lifecycle_fetch_core::environment::{Transport, TransportFuture};
    use lifecycle_fetch_core::transport::{TransportError, TransportRequest, TransportResponse};
    use tokio::sync::oneshot;

    type Reply = Result<TransportResponse, TransportError>;

    enum Scripted {
        Ready(Reply),
        Held(oneshot::Receiver<Reply>),
    }

    #[derive(Default)]
    struct MockState {
        calls: Vec<TransportRequest>,
        scripts: HashMap<String, VecDeque<Scripted>>,
    }

    /// Scriptable in-memory transport
    ///
    /// Replies are scripted per path and consumed in order. The last ready
    /// reply for a path is sticky: it keeps answering once the queue is down
    /// to it. Paths without a script answer `200` with a `null` result.
    ///
    /// Clones share the same script and call log.
    ///
    /// # Example
    ///
    /// ```
    /// use lifecycle_fetch_core::environment::Transport;
    /// use lifecycle_fetch_core::transport::{TransportRequest, TransportResponse};
    /// use lifecycle_fetch_testing::MockTransport;
    /// use serde_json::json;
    ///
    /// # tokio_test::block_on(async {
    /// let transport = MockTransport::new();
    /// transport.respond("/users", TransportResponse::ok(200, json!([{"id": 1}])));
    ///
    /// let response = transport.request(TransportRequest::get("/users")).await.unwrap();
    /// assert_eq!(response.result, json!([{"id": 1}]));
    /// assert_eq!(transport.call_count(), 1);
    /// # });
    /// ```
    #[derive(Clone, Default)]
    pub struct MockTransport {
        state: Arc<Mutex<MockState>>,
    }

    impl MockTransport {
        /// Create a transport with no scripted replies
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        fn lock(&self) -> MutexGuard<'_, MockState> {
            self.state.lock().unwrap_or_else(PoisonError::into_inner)
        }

        fn push(&self, path: &str, scripted: Scripted) {
            self.lock()
                .scripts
                .entry(path.to_string())
                .or_default()
                .push_back(scripted);
        }

        /// Queue a successful or application-error response for `path`
        pub fn respond(&self, path: &str, response: TransportResponse) {
            self.push(path, Scripted::Ready(Ok(response)));
        }

        /// Queue a transport failure for `path`
        pub fn fail(&self, path: &str, error: TransportError) {
            self.push(path, Scripted::Ready(Err(error)));
        }

        /// Queue a reply for `path` that stays pending until resolved
        #[must_use]
        pub fn hold(&self, path: &str) -> PendingReply {
            let (tx, rx) = oneshot::channel();
            self.push(path, Scripted::Held(rx));
            PendingReply { tx }
        }

        /// Every request received so far, in order
        #[must_use]
        pub fn calls(&self) -> Vec<TransportRequest> {
            self.lock().calls.clone()
        }

        /// Number of requests received so far
        #[must_use]
        pub fn call_count(&self) -> usize {
            self.lock().calls.len()
        }

        /// Number of requests received for `path`
        #[must_use]
        pub fn calls_for(&self, path: &str) -> usize {
            self.lock().calls.iter().filter(|c| c.path == path).count()
        }

        fn next_reply(&self, request: TransportRequest) -> Scripted {
            let mut state = self.lock();
            let scripted = state.scripts.get_mut(&request.path).and_then(|queue| {
                if queue.len() == 1 {
                    if let Some(Scripted::Ready(reply)) = queue.front() {
                        return Some(Scripted::Ready(reply.clone()));
                    }
                }
                queue.pop_front()
            });
            state.calls.push(request);

            scripted.unwrap_or_else(|| {
                Scripted::Ready(Ok(TransportResponse::ok(200, serde_json::Value::Null)))
            })
        }
    }

    impl std::fmt::Debug for MockTransport {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("MockTransport")
                .field("calls", &self.call_count())
                .finish_non_exhaustive()
        }
    }

    impl Transport for MockTransport {
        fn request(&self, request: TransportRequest) -> TransportFuture<'_> {
            let scripted = self.next_reply(request);
            Box::pin(async move {
                match scripted {
                    Scripted::Ready(reply) => reply,
                    Scripted::Held(rx) => rx.await.unwrap_or_else(|_| {
                        Err(TransportError::RequestFailed(
                            "held reply dropped before resolving".to_string(),
                        ))
                    }),
                }
            })
        }
    }

    /// A reply queued with [`MockTransport::hold`]
    #[derive(Debug)]
    pub struct PendingReply {
        tx: oneshot::Sender<Reply>,
    }

    impl PendingReply {
        /// Resolve the pending request with `response`
        pub fn resolve(self, response: TransportResponse) {
            let _ = self.tx.send(Ok(response));
        }

        /// Fail the pending request with `error`
        pub fn fail(self, error: TransportError) {
            let _ = self.tx.send(Err(error));
        }
    }

    /// Captures values handed to a callback
    ///
    /// # Example
    ///
    /// ```
    /// use lifecycle_fetch_testing::Recorder;
    ///
    /// let recorder = Recorder::new();
    /// let sink = recorder.sink();
    /// sink(1);
    /// sink(2);
    /// assert_eq!(recorder.take(), vec![1, 2]);
    /// assert!(recorder.is_empty());
    /// ```
    #[derive(Debug)]
    pub struct Recorder<T> {
        entries: Arc<Mutex<Vec<T>>>,
    }

    impl<T> Clone for Recorder<T> {
        fn clone(&self) -> Self {
            Self {
                entries: Arc::clone(&self.entries),
            }
        }
    }

    impl<T> Default for Recorder<T> {
        fn default() -> Self {
            Self {
                entries: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl<T: Send + 'static> Recorder<T> {
        /// Create an empty recorder
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        fn lock(&self) -> MutexGuard<'_, Vec<T>> {
            self.entries.lock().unwrap_or_else(PoisonError::into_inner)
        }

        /// A callback that appends every value it receives
        #[must_use]
        pub fn sink(&self) -> impl Fn(T) + Send + Sync + 'static {
            let entries = Arc::clone(&self.entries);
            move |value| {
                entries
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(value);
            }
        }

        /// Record a value directly
        pub fn record(&self, value: T) {
            self.lock().push(value);
        }

        /// Number of recorded values
        #[must_use]
        pub fn len(&self) -> usize {
            self.lock().len()
        }

        /// Whether nothing was recorded
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.lock().is_empty()
        }

        /// Remove and return everything recorded so far
        #[must_use]
        pub fn take(&self) -> Vec<T> {
            std::mem::take(&mut *self.lock())
        }
    }

    impl<T: Clone + Send + 'static> Recorder<T> {
        /// Copy of everything recorded so far
        #[must_use]
        pub fn entries(&self) -> Vec<T> {
            self.lock().clone()
        }

        /// The most recent value
        #[must_use]
        pub fn last(&self) -> Option<T> {
            self.lock().last().cloned()
        }
    }
}

/// Test helpers and utilities
pub mod helpers {
    use std::future::Future;
    use std::time::Duration;

    /// Poll `condition` until it holds or `timeout` elapses
    ///
    /// Returns whether the condition held in time.
    pub async fn eventually<F, Fut>(timeout: Duration, mut condition: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if condition().await {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

// Re-export commonly used items
pub use mocks::{MockTransport, PendingReply, Recorder};
pub use reducer_test::{ReducerTest, assertions};

#[cfg(test)]
mod tests {
    use super::*;
    use lifecycle_fetch_core::environment::Transport;
    use lifecycle_fetch_core::transport::{TransportError, TransportRequest, TransportResponse};
    use serde_json::json;

    #[tokio::test]
    async fn test_unscripted_path_answers_null() {
        let transport = MockTransport::new();
        let response = transport
            .request(TransportRequest::get("/anything"))
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.result, serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_replies_are_consumed_in_order_and_last_is_sticky() {
        let transport = MockTransport::new();
        transport.respond("/a", TransportResponse::ok(200, json!(1)));
        transport.respond("/a", TransportResponse::ok(200, json!(2)));

        for expected in [1, 2, 2] {
            let response = transport.request(TransportRequest::get("/a")).await.unwrap();
            assert_eq!(response.result, json!(expected));
        }
        assert_eq!(transport.calls_for("/a"), 3);
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let transport = MockTransport::new();
        transport.fail("/a", TransportError::RequestFailed("offline".to_string()));

        let result = transport.request(TransportRequest::get("/a")).await;
        assert_eq!(
            result,
            Err(TransportError::RequestFailed("offline".to_string()))
        );
    }

    #[tokio::test]
    async fn test_held_reply_waits_for_resolution() {
        let transport = MockTransport::new();
        let pending = transport.hold("/slow");

        let clone = transport.clone();
        let task = tokio::spawn(async move { clone.request(TransportRequest::get("/slow")).await });

        tokio::task::yield_now().await;
        assert!(!task.is_finished());

        pending.resolve(TransportResponse::ok(201, json!("done")));
        let response = task.await.unwrap().unwrap();
        assert_eq!(response.status, 201);
    }

    #[tokio::test]
    async fn test_dropped_hold_fails_request() {
        let transport = MockTransport::new();
        drop(transport.hold("/gone"));

        let result = transport.request(TransportRequest::get("/gone")).await;
        assert!(matches!(result, Err(TransportError::RequestFailed(_))));
    }

    #[test]
    fn test_recorder_shares_entries_across_clones() {
        let recorder = Recorder::new();
        let clone = recorder.clone();
        (recorder.sink())("a");
        clone.record("b");
        assert_eq!(recorder.entries(), vec!["a", "b"]);
        assert_eq!(clone.last(), Some("b"));
    }

    #[tokio::test]
    async fn test_eventually() {
        assert!(helpers::eventually(std::time::Duration::from_millis(20), || async { true }).await);
        assert!(!helpers::eventually(std::time::Duration::from_millis(20), || async { false }).await);
    }
}
