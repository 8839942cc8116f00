use polyllm_model::ErrorKind;

/// How the test model answers one request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum PresetResponse {
    /// Answer with this text.
    Text(String),
    /// Answer with `You said <last user message>`.
    #[default]
    Echo,
    /// Reach the "backend" but produce no content.
    Empty,
    /// Fail with the given error kind and optional HTTP status.
    Failure {
        /// The kind reported by the error.
        kind: ErrorKind,
        /// The HTTP status reported by the error.
        status: Option<u16>,
    },
}

impl PresetResponse {
    /// Creates a text response.
    #[inline]
    pub fn text<S: Into<String>>(text: S) -> Self {
        PresetResponse::Text(text.into())
    }

    /// Creates a failure without an HTTP status.
    #[inline]
    pub fn failure(kind: ErrorKind) -> Self {
        PresetResponse::Failure { kind, status: None }
    }

    /// Creates a failure carrying an HTTP status, classified the way the
    /// HTTP backends classify it.
    #[inline]
    pub fn http_failure(status: u16) -> Self {
        PresetResponse::Failure {
            kind: ErrorKind::from_http_status(status),
            status: Some(status),
        }
    }
}
