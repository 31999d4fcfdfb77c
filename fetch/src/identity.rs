//! Change detection for fetch identities.

use serde::{Deserialize, Serialize};

/// What decides whether a fetch must be (re)issued
///
/// Only the path and the refetch flag take part. Params, headers and
/// delivery channels can change freely without causing a new request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchIdentity {
    /// Resource path
    pub path: String,
    /// Caller-controlled refetch toggle
    pub refetch: bool,
}

impl FetchIdentity {
    /// Create an identity
    #[must_use]
    pub fn new(path: impl Into<String>, refetch: bool) -> Self {
        Self {
            path: path.into(),
            refetch,
        }
    }
}

/// Whether moving from `previous` to `next` requires a fetch
///
/// True on the first observation and whenever path or refetch changed.
#[must_use]
pub fn needs_fetch(previous: Option<&FetchIdentity>, next: &FetchIdentity) -> bool {
    previous != Some(next)
}

/// Remembers the last observed identity
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdentityTracker {
    current: Option<FetchIdentity>,
}

impl IdentityTracker {
    /// Create a tracker that has observed nothing
    #[must_use]
    pub const fn new() -> Self {
        Self { current: None }
    }

    /// Record `next` and report whether it requires a fetch
    pub fn observe(&mut self, next: FetchIdentity) -> bool {
        let changed = needs_fetch(self.current.as_ref(), &next);
        self.current = Some(next);
        changed
    }

    /// The last observed identity
    #[must_use]
    pub const fn current(&self) -> Option<&FetchIdentity> {
        self.current.as_ref()
    }
}
