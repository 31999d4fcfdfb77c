//! Error types for the fetch controller.

use lifecycle_fetch_runtime::StoreError;
use thiserror::Error;

/// A fetch configuration that can never be honoured
///
/// These are programmer errors: the controller refuses the lifecycle event
/// before any transport call and leaves its state untouched.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The path is empty or only whitespace
    #[error("fetch path is required")]
    MissingPath,

    /// None of `children`, `on_fetch` or `render` is registered
    #[error("at least one of children, on_fetch or render must be registered")]
    NoDeliveryChannel,
}

/// A delivery channel broke its contract during dispatch
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    /// `children` returned something other than exactly one value
    #[error("children must produce exactly one value, got {count}")]
    ChildCount {
        /// Number of values returned
        count: usize,
    },
}

/// A lifecycle event the controller refused
///
/// Decided by the reducer while it holds the controller state, so two
/// racing events can never both be accepted.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The configuration failed validation
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// `Activate` arrived after an accepted activation
    #[error("controller is already activated")]
    AlreadyActivated,

    /// `Reconfigure` arrived before activation
    #[error("controller has not been activated")]
    NotActivated,

    /// `Activate` or `Reconfigure` arrived after deactivation
    #[error("controller has been deactivated")]
    Deactivated,
}

/// Errors returned to the lifecycle caller
#[derive(Error, Debug)]
pub enum ControllerError {
    /// The configuration failed validation
    #[error("invalid fetch configuration: {0}")]
    Config(#[from] ConfigError),

    /// `activate` was called on an already activated controller
    #[error("controller is already activated")]
    AlreadyActivated,

    /// `reconfigure` was called before `activate`
    #[error("controller has not been activated")]
    NotActivated,

    /// `reconfigure` or `activate` was called after `deactivate`
    #[error("controller has been deactivated")]
    Deactivated,

    /// The underlying store refused the event
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<Rejection> for ControllerError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::Config(error) => Self::Config(error),
            Rejection::AlreadyActivated => Self::AlreadyActivated,
            Rejection::NotActivated => Self::NotActivated,
            Rejection::Deactivated => Self::Deactivated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_convert_into_controller_errors() {
        let error: ControllerError = ConfigError::MissingPath.into();
        assert!(matches!(error, ControllerError::Config(ConfigError::MissingPath)));
        assert_eq!(
            error.to_string(),
            "invalid fetch configuration: fetch path is required"
        );
    }

    #[test]
    fn rejections_map_onto_controller_errors() {
        assert!(matches!(
            ControllerError::from(Rejection::Config(ConfigError::NoDeliveryChannel)),
            ControllerError::Config(ConfigError::NoDeliveryChannel)
        ));
        assert!(matches!(
            ControllerError::from(Rejection::AlreadyActivated),
            ControllerError::AlreadyActivated
        ));
        assert!(matches!(
            ControllerError::from(Rejection::NotActivated),
            ControllerError::NotActivated
        ));
        assert!(matches!(
            ControllerError::from(Rejection::Deactivated),
            ControllerError::Deactivated
        ));
        assert_eq!(
            Rejection::Config(ConfigError::MissingPath).to_string(),
            "fetch path is required"
        );
    }

    #[test]
    fn child_count_reports_the_count() {
        let error = DispatchError::ChildCount { count: 3 };
        assert_eq!(
            error.to_string(),
            "children must produce exactly one value, got 3"
        );
    }
}
