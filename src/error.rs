use thiserror::Error;

/// Failure kinds surfaced by the repository client, the manifest editor and
/// the command line.
///
/// These travel inside `anyhow::Error`; use `err.downcast_ref::<Error>()` to
/// recover the kind after context has been attached.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or rejected credentials.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Repository, path, directory or ref does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Branch or pull request already exists, or a stale file sha was used.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Manifest could not be parsed or does not have the expected shape.
    #[error("failed to parse manifest: {0}")]
    Parse(String),

    #[error("unknown action '{0}' (expected one of: pause, resume, push)")]
    UnknownAction(String),

    #[error("action '{0}' is not supported yet")]
    UnsupportedAction(String),

    #[error("invalid environment name '{0}'")]
    InvalidEnvironment(String),

    /// Any other non-success response from the hosted API.
    #[error("GitHub API request failed with status {status}: {message}")]
    Api { status: u16, message: String },
}

impl Error {
    /// Map an HTTP status code and message to an error kind.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => Self::Auth(message),
            404 => Self::NotFound(message),
            409 | 422 => Self::Conflict(message),
            _ => Self::Api { status, message },
        }
    }
}
