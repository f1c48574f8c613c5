use crate::core::ProxyError;

/// Outcome of one batch write: which interfaces took the new
/// configuration and which failed, in submission order.
///
/// Built once per batch call and handed to the caller; the manager
/// never retains it.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    /// Interfaces that were successfully configured
    pub succeeded: Vec<String>,

    /// Interfaces that failed, each with its error
    pub failed: Vec<(String, ProxyError)>,
}

impl BatchResult {
    pub fn new(succeeded: Vec<String>, failed: Vec<(String, ProxyError)>) -> Self {
        Self { succeeded, failed }
    }

    /// Whether every interface in the batch succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    /// Whether every interface in the batch failed.
    pub fn all_failed(&self) -> bool {
        self.succeeded.is_empty()
    }

    /// Total number of interfaces attempted.
    pub fn total_count(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn success_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }
}

impl std::fmt::Display for BatchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.total_count() == 0 {
            write!(f, "BatchResult(empty)")
        } else if self.all_succeeded() {
            write!(f, "BatchResult(all {} succeeded)", self.success_count())
        } else if self.all_failed() {
            write!(f, "BatchResult(all {} failed)", self.failure_count())
        } else {
            write!(
                f,
                "BatchResult({} succeeded, {} failed)",
                self.success_count(),
                self.failure_count()
            )
        }
    }
}
