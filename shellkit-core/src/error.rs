// Error types for shellkit

use crate::shell_id::ShellId;
use thiserror::Error;

/// Boxed error used for causes raised by user-supplied code (features, handlers, factories).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Circular dependency detected involving feature '{feature}': {}", path.join(" -> "))]
    DependencyCycle { feature: String, path: Vec<String> },

    #[error("{}", feature_not_found_message(feature, dependent.as_deref()))]
    FeatureNotFound {
        feature: String,
        dependent: Option<String>,
    },

    #[error("Duplicate shell id: {0}")]
    DuplicateShell(ShellId),

    #[error("Shell not found: {0}")]
    ShellNotFound(ShellId),

    #[error("Handler '{handler}' failed for shell '{shell}': {source}")]
    HandlerFailure {
        shell: ShellId,
        handler: String,
        #[source]
        source: BoxError,
    },

    #[error("Feature '{feature}' failed to configure services: {source}")]
    FeatureConfiguration {
        feature: String,
        #[source]
        source: BoxError,
    },

    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    #[error("Service factory for '{service}' failed: {source}")]
    ServiceFactory {
        service: String,
        #[source]
        source: BoxError,
    },

    #[error("No resolvers have been configured. Add at least one resolver before building.")]
    NoResolvers,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Shell settings error: {0}")]
    Settings(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Operation cancelled")]
    Cancelled,
}

fn feature_not_found_message(feature: &str, dependent: Option<&str>) -> String {
    match dependent {
        Some(dependent) => format!(
            "Feature '{}' not found. Required by feature '{}'.",
            feature, dependent
        ),
        None => format!("Feature '{}' not found.", feature),
    }
}

impl Error {
    /// Wrap a failure raised while a feature registered its services.
    pub fn feature_configuration(feature: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::FeatureConfiguration {
            feature: feature.into(),
            source: source.into(),
        }
    }

    /// Wrap a failure raised by a lifecycle handler.
    pub fn handler_failure(
        shell: ShellId,
        handler: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::HandlerFailure {
            shell,
            handler: handler.into(),
            source: source.into(),
        }
    }

    /// Whether this is a not-found error for a shell.
    pub fn is_shell_not_found(&self) -> bool {
        matches!(self, Self::ShellNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_names_path() {
        let err = Error::DependencyCycle {
            feature: "A".to_string(),
            path: vec!["A".to_string(), "B".to_string(), "A".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("Circular dependency"));
        assert!(msg.contains("A -> B -> A"));
    }

    #[test]
    fn test_not_found_message_with_dependent() {
        let err = Error::FeatureNotFound {
            feature: "Missing".to_string(),
            dependent: Some("Core".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Feature 'Missing' not found. Required by feature 'Core'."
        );

        let err = Error::FeatureNotFound {
            feature: "Missing".to_string(),
            dependent: None,
        };
        assert_eq!(err.to_string(), "Feature 'Missing' not found.");
    }

    #[test]
    fn test_handler_failure_keeps_source() {
        let err = Error::handler_failure(ShellId::new("acme"), "Migrations", "boom");
        assert!(err.to_string().contains("Migrations"));
        assert!(err.to_string().contains("acme"));
        assert_eq!(std::error::Error::source(&err).unwrap().to_string(), "boom");
    }
}
