use thiserror::Error;

/// A failed call against an external HTTP service, carrying enough
/// structure for retry classification without sniffing error text.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// The service answered with a non-success status.
    #[error("status {status}: {message}")]
    Status { status: u16, message: String },

    /// The request never completed (DNS, connect, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered 2xx but the body was not what we asked for.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl RemoteError {
    /// Whether the failure is worth retrying.
    ///
    /// Transient markers: HTTP 429, any 5xx, and rate-limit / quota /
    /// upstream-connectivity wording for failures that carry no status.
    pub fn is_transient(&self) -> bool {
        match self {
            RemoteError::Status { status, message } => {
                *status == 429 || (500..600).contains(status) || has_transient_wording(message)
            }
            RemoteError::Transport(message) => {
                has_transient_wording(message) || is_timeoutish(message)
            }
            RemoteError::Malformed(_) => false,
        }
    }
}

fn has_transient_wording(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("rate limit")
        || lower.contains("quota")
        || lower.contains("upstream connect error")
}

fn is_timeoutish(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("timed out") || lower.contains("connection reset")
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        RemoteError::Transport(e.to_string())
    }
}

/// Terminal outcome of a retried operation.
#[derive(Debug, Error)]
pub enum RetryError {
    /// Every allowed attempt failed; wraps the last underlying failure.
    #[error("retries exhausted after {attempts} attempts: {source}")]
    Exhausted { attempts: u32, source: RemoteError },

    /// The failure was not transient, so no further attempt was made.
    #[error(transparent)]
    Fatal(RemoteError),
}

impl RetryError {
    /// The underlying remote failure, whichever way it ended.
    pub fn remote(&self) -> &RemoteError {
        match self {
            RetryError::Exhausted { source, .. } => source,
            RetryError::Fatal(source) => source,
        }
    }
}

#[derive(Debug, Error)]
pub enum BrandpulseError {
    /// A required credential or identifier is missing. Names the key.
    #[error("Config error: missing {0}")]
    Config(String),

    /// The batched flush exhausted its retries; accumulated results
    /// would be lost, so this is fatal to the run.
    #[error("Persist failure: {0}")]
    Persist(RetryError),

    /// A destination column label did not resolve during provisioning.
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Remote call failed: {0}")]
    Remote(#[from] RetryError),

    #[error("Sheet call failed: {0}")]
    Sheet(#[from] RemoteError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
