use std::fmt::{self, Display};

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No credential is available for the provider.
    NoCredential,
    /// The credential is missing, empty or refused by the backend.
    Authentication,
    /// The backend rejected the request (bad request, quota, unknown model).
    Rejected,
    /// The backend could not be reached, or the request timed out or was
    /// cancelled.
    Transient,
    /// The backend answered but the response has no usable content.
    EmptyResult,
    /// The provider tag is not one of the supported backends.
    UnsupportedProvider,
    /// The request violates a precondition and was never sent.
    InvalidRequest,
}

impl ErrorKind {
    /// Classifies a non-success HTTP status code returned by a backend.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            401 | 403 => ErrorKind::Authentication,
            408 | 500..=599 => ErrorKind::Transient,
            _ => ErrorKind::Rejected,
        }
    }

    /// Returns `true` if the caller may reasonably try the same request
    /// again later.
    #[inline]
    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorKind::Transient)
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::NoCredential => write!(f, "no credential"),
            ErrorKind::Authentication => write!(f, "authentication failed"),
            ErrorKind::Rejected => write!(f, "backend rejected request"),
            ErrorKind::Transient => write!(f, "backend unreachable"),
            ErrorKind::EmptyResult => write!(f, "backend returned no content"),
            ErrorKind::UnsupportedProvider => write!(f, "unsupported provider"),
            ErrorKind::InvalidRequest => write!(f, "invalid request"),
        }
    }
}
