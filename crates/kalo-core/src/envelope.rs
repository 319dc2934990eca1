//! Three-state result of an asynchronous request.

use std::fmt::Display;

/// Outcome of a request as seen by the UI.
///
/// `None` means nothing has been published yet. A payload only exists in
/// `Success`, a message only in `Failure`, so the two can never be set at
/// the same time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Envelope<T> {
    #[default]
    None,
    Success(T),
    Failure(String),
}

impl<T> Envelope<T> {
    pub fn failure(message: impl Into<String>) -> Self {
        Envelope::Failure(message.into())
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Envelope::None)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Envelope::Failure(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Envelope::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Envelope::Failure(message) => Some(message),
            _ => None,
        }
    }

    /// Calls `success` or `failure` depending on the state; does nothing
    /// while the envelope is still `None`.
    pub fn handle(&self, success: impl FnOnce(&T), failure: impl FnOnce(&str)) {
        match self {
            Envelope::None => {}
            Envelope::Success(data) => success(data),
            Envelope::Failure(message) => failure(message),
        }
    }
}

impl<T, E: Display> From<Result<T, E>> for Envelope<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Envelope::Success(data),
            Err(err) => Envelope::Failure(err.to_string()),
        }
    }
}
