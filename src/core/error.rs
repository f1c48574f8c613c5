use thiserror::Error;

/// Error taxonomy for proxy configuration operations.
///
/// Modeled as a closed enum so callers can match exhaustively; the retry
/// machinery relies on [`ProxyError::is_retryable`] to single out lock
/// contention from every other failure.
#[derive(Error, Debug, Clone)]
pub enum ProxyError {
    #[error("Failed to create configuration store session. Check permissions and store availability.")]
    SessionCreationFailed,

    #[error("Failed to lock the configuration store. Another process may be modifying network settings.")]
    LockFailed,

    #[error("Network interface '{0}' not found. Please check the interface name.")]
    InterfaceNotFound(String),

    #[error("Proxy protocol not found for interface '{0}'.")]
    ProtocolNotFound(String),

    #[error("Proxy configuration not found for interface '{0}'.")]
    ConfigNotFound(String),

    #[error("Failed to commit changes to the configuration store.")]
    CommitFailed,

    #[error("Changes committed but failed to apply.")]
    ApplyFailed,

    #[error("Failed to unlock the configuration store.")]
    UnlockFailed,

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("All batch operations failed: {}", fmt_failures(.failures))]
    BatchFailed {
        failures: Vec<(String, ProxyError)>,
    },

    #[error("Retry attempts exhausted. Last error: {last_error}")]
    RetryExhausted { last_error: String },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

pub type Result<T> = std::result::Result<T, ProxyError>;

fn fmt_failures(failures: &[(String, ProxyError)]) -> String {
    failures
        .iter()
        .map(|(interface, err)| format!("{interface}: {err}"))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ProxyError {
    /// Whether the retry wrapper may re-attempt after this error.
    ///
    /// Lock contention is the only transient condition; everything else
    /// is either permanent or needs caller intervention.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProxyError::LockFailed)
    }

    /// Human-oriented hint on how to recover, surfaced by the CLI.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            ProxyError::SessionCreationFailed => {
                Some("Ensure the process has the privileges required to open the store.")
            }
            ProxyError::LockFailed => Some(
                "Wait a moment and try again. Close any other tools that might be modifying network settings.",
            ),
            ProxyError::InterfaceNotFound(_) => {
                Some("Run 'sysproxy list' to see the available network interfaces.")
            }
            ProxyError::ProtocolNotFound(_) | ProxyError::ConfigNotFound(_) => Some(
                "This may indicate a corrupted store record. Inspect the interface's configuration entry.",
            ),
            ProxyError::CommitFailed => {
                Some("Run the command with elevated privileges or provide a valid authorization token.")
            }
            ProxyError::ApplyFailed => {
                Some("The configuration was written but not applied. Retry, or restart the consuming services.")
            }
            ProxyError::RetryExhausted { .. } => {
                Some("Consider a more patient retry policy or investigate what is holding the lock.")
            }
            ProxyError::InvalidConfiguration(_) => {
                Some("Review and correct the configuration parameters.")
            }
            ProxyError::BatchFailed { .. } => Some(
                "Check the per-interface errors. Some interfaces may not exist or may be disabled.",
            ),
            ProxyError::UnlockFailed | ProxyError::Io(_) | ProxyError::Unknown(_) => None,
        }
    }
}

impl From<std::io::Error> for ProxyError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for ProxyError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Unknown(err.to_string())
    }
}
