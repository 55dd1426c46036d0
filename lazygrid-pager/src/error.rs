use thiserror::Error;

/// How a failed fetch should be treated by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FetchErrorKind {
    /// Worth retrying (timeouts, connection resets, 5xx).
    Transient,
    /// Retrying the same request will fail again (bad filter, 4xx).
    Permanent,
}

/// A page fetch failed.
///
/// The pager recovers from both kinds: the loading guard is cleared and `has_more` is left
/// untouched, so the next load-more trigger retries the same page.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("transient fetch error: {0}")]
    Transient(String),

    #[error("permanent fetch error: {0}")]
    Permanent(String),
}

impl FetchError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient(message.into())
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self::Permanent(message.into())
    }

    pub fn kind(&self) -> FetchErrorKind {
        match self {
            Self::Transient(_) => FetchErrorKind::Transient,
            Self::Permanent(_) => FetchErrorKind::Permanent,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind() == FetchErrorKind::Transient
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Transient(m) | Self::Permanent(m) => m,
        }
    }
}
