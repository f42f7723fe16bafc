use thiserror::Error;

/// Everything that can go wrong during a sandbox run.
///
/// None of these escape `run`; they are rendered into the result's `errors`
/// list as `"<Kind>: <message>"`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SandboxError {
    #[error("no executable target: {0}")]
    TargetNotFound(String),

    #[error("failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("request to {url} timed out after {elapsed_ms} ms")]
    Timeout { url: String, elapsed_ms: u64 },

    #[error("redirect cycle detected: {url} was already visited")]
    RedirectLoop { url: String },

    #[error("redirect limit of {limit} reached at {url}")]
    RedirectLimitExceeded { limit: usize, url: String },

    #[error("{0}")]
    Parse(String),

    #[error("form probe to {url} failed: {message}")]
    FormProbe { url: String, message: String },
}

/// Classification tag for a [`SandboxError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    TargetNotFound,
    FetchError,
    TimeoutError,
    RedirectLoopError,
    RedirectLimitExceeded,
    ParseError,
    FormProbeError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::TargetNotFound => "TargetNotFound",
            ErrorKind::FetchError => "FetchError",
            ErrorKind::TimeoutError => "TimeoutError",
            ErrorKind::RedirectLoopError => "RedirectLoopError",
            ErrorKind::RedirectLimitExceeded => "RedirectLimitExceeded",
            ErrorKind::ParseError => "ParseError",
            ErrorKind::FormProbeError => "FormProbeError",
        }
    }

    /// Prefix that every rendered entry of this kind starts with
    pub fn prefix(&self) -> String {
        format!("{}: ", self.as_str())
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SandboxError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SandboxError::TargetNotFound(_) => ErrorKind::TargetNotFound,
            SandboxError::Fetch { .. } => ErrorKind::FetchError,
            SandboxError::Timeout { .. } => ErrorKind::TimeoutError,
            SandboxError::RedirectLoop { .. } => ErrorKind::RedirectLoopError,
            SandboxError::RedirectLimitExceeded { .. } => ErrorKind::RedirectLimitExceeded,
            SandboxError::Parse(_) => ErrorKind::ParseError,
            SandboxError::FormProbe { .. } => ErrorKind::FormProbeError,
        }
    }

    /// Render as an entry for `SandboxResult::errors`
    pub fn to_entry(&self) -> String {
        format!("{}{}", self.kind().prefix(), self)
    }

    /// Classify a transport error raised while fetching `url`
    pub fn from_reqwest(url: &str, err: &reqwest::Error, elapsed_ms: u64) -> Self {
        if err.is_timeout() {
            SandboxError::Timeout {
                url: url.to_string(),
                elapsed_ms,
            }
        } else {
            SandboxError::Fetch {
                url: url.to_string(),
                message: describe_transport_error(err),
            }
        }
    }
}

/// Walk the source chain so DNS and connection failures show their cause
fn describe_transport_error(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = std::error::Error::source(cause);
    }
    message
}
