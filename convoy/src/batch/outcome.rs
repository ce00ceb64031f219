use std::time::Duration;

/// Final result of a task. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T, E> {
    /// The operation completed with a value.
    Fulfilled(T),

    /// The operation failed or ran past its deadline.
    Rejected(Rejection<E>),

    /// The task was cancelled before it could settle on its own.
    Cancelled,
}

impl<T, E> Outcome<T, E> {
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Outcome::Fulfilled(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Outcome::Rejected(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }

    /// Returns `true` if the task was rejected by a deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Outcome::Rejected(Rejection::Timeout { .. }))
    }

    /// Returns the fulfilled value, if any.
    pub fn fulfilled(self) -> Option<T> {
        match self {
            Outcome::Fulfilled(value) => Some(value),
            _ => None,
        }
    }

    /// Splits the outcome into the value or the reason it is missing.
    pub fn into_result(self) -> Result<T, Failure<E>> {
        match self {
            Outcome::Fulfilled(value) => Ok(value),
            Outcome::Rejected(rejection) => Err(Failure::Rejected(rejection)),
            Outcome::Cancelled => Err(Failure::Cancelled),
        }
    }
}

impl<T, E> From<Result<T, E>> for Outcome<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Outcome::Fulfilled(value),
            Err(error) => Outcome::Rejected(Rejection::Error(error)),
        }
    }
}

/// Why a task was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection<E> {
    /// The operation returned an error.
    #[error("{0}")]
    Error(E),

    /// The task did not settle before its deadline.
    #[error("timed out after {after:?}")]
    Timeout { after: Duration },
}

impl<E> Rejection<E> {
    /// Returns the operation's error, if this is not a timeout.
    pub fn error(&self) -> Option<&E> {
        match self {
            Rejection::Error(error) => Some(error),
            Rejection::Timeout { .. } => None,
        }
    }
}

/// A task that did not fulfill.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Failure<E> {
    #[error("rejected: {0}")]
    Rejected(Rejection<E>),

    #[error("cancelled")]
    Cancelled,
}

impl<E> Failure<E> {
    /// Returns the operation's error, if the task failed on its own.
    pub fn error(&self) -> Option<&E> {
        match self {
            Failure::Rejected(rejection) => rejection.error(),
            Failure::Cancelled => None,
        }
    }
}

/// Every task of a batch failed.
///
/// Returned by [`BatchHandle::first_fulfilled`](super::BatchHandle::first_fulfilled).
/// Holds one reason per task, in submission order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("none of the {} tasks fulfilled", .reasons.len())]
pub struct AggregateFailure<E> {
    reasons: Vec<Failure<E>>,
}

impl<E> AggregateFailure<E> {
    pub(crate) fn new(reasons: Vec<Failure<E>>) -> Self {
        Self { reasons }
    }

    /// Failure reasons, index-aligned with the submitted tasks.
    pub fn reasons(&self) -> &[Failure<E>] {
        &self.reasons
    }

    pub fn into_reasons(self) -> Vec<Failure<E>> {
        self.reasons
    }

    /// Operation errors only, in submission order; timeouts and
    /// cancellations are skipped.
    pub fn errors(&self) -> impl Iterator<Item = &E> {
        self.reasons.iter().filter_map(Failure::error)
    }

    pub fn len(&self) -> usize {
        self.reasons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_converts_into_outcome() {
        let ok: Outcome<u8, &str> = Ok(1).into();
        let err: Outcome<u8, &str> = Err("boom").into();

        assert_eq!(ok, Outcome::Fulfilled(1));
        assert_eq!(err, Outcome::Rejected(Rejection::Error("boom")));
    }

    #[test]
    fn aggregate_failure_lists_only_operation_errors() {
        let failure = AggregateFailure::new(vec![
            Failure::Rejected(Rejection::Error("a")),
            Failure::Cancelled,
            Failure::Rejected(Rejection::Timeout {
                after: Duration::from_millis(5),
            }),
            Failure::Rejected(Rejection::Error("b")),
        ]);

        assert_eq!(failure.len(), 4);
        assert_eq!(failure.errors().copied().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(failure.to_string(), "none of the 4 tasks fulfilled");
    }
}
