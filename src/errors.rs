/// The message shown for every report fetch failure the user can see.
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch data. Try again.";

/// Errors that can end a report fetch.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Report service returned HTTP {0}")]
    HttpStatus(u16),

    #[error("Report body could not be decoded: {0}")]
    Decode(String),

    #[error("Fetch cancelled")]
    Cancelled,
}

impl FetchError {
    /// Text for the error banner, or `None` when the failure must stay silent.
    ///
    /// Every visible failure gets the same text; status codes and transport
    /// details stay in the logs.
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            FetchError::Cancelled => None,
            FetchError::Transport(_) | FetchError::HttpStatus(_) | FetchError::Decode(_) => {
                Some(FETCH_FAILED_MESSAGE)
            }
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            FetchError::HttpStatus(status.as_u16())
        } else if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

/// Startup configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid value for '{name}': {message}")]
    Invalid { name: &'static str, message: String },
}
