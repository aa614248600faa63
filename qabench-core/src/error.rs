use thiserror::Error;

/// Configuration errors detected before any task is dispatched.
///
/// These are the only fatal errors in a benchmark run: everything that goes
/// wrong after dispatch is recorded as per-task error data instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// No models configured for the run
    #[error("no models configured")]
    NoModels,

    /// Two models share a display name, which is the result join key
    #[error("duplicate model name '{0}' in configuration")]
    DuplicateModelName(String),

    /// Failed to read a configuration file
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse a configuration file
    #[error("failed to parse config: {0}")]
    Parse(String),
}

/// Errors raised by a model backend for a single call.
///
/// Dispatchers never propagate these; each one is converted into an error
/// [`TaskResult`](crate::TaskResult) so a failing task cannot abort the run
/// or abandon its siblings.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BackendError {
    /// No API key available in the environment
    #[error("no API key found (set OPENROUTER_API_KEY or OPENAI_API_KEY)")]
    MissingApiKey,

    /// Transport-level failure (connection, timeout, TLS)
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The response carried no answer content
    #[error("no content in response")]
    NoContent,

    /// The response body did not match the expected shape
    #[error("failed to parse response: {0}")]
    InvalidResponse(String),
}
