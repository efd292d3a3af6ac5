use thiserror::Error;

#[derive(Error, Debug)]
pub enum GlmrError {
    /// Credential rejected by the instance (missing, expired or revoked token).
    #[error("Authorization failed: {0}")]
    Authorization(String),

    /// The request was accepted but GraphQL reported errors. Carries the first message.
    #[error("Request rejected: {0}")]
    Validation(String),

    #[error("GitLab server error: {0}")]
    UnknownServer(String),

    #[error("Merge request cannot be merged: {0}")]
    MergeRequestCannotBeMerged(String),

    #[error("GraphQL response contained no data")]
    NoResponseData,

    #[error("Project '{0}' not found")]
    ProjectNotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("State store error: {0}")]
    Storage(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GlmrError {
    /// Classifies a failed HTTP exchange.
    ///
    /// 401/403 and "invalid token" bodies are authorization failures, anything
    /// else is an unknown server error.
    pub fn from_status(status: u16, message: String) -> Self {
        if status == 401 || status == 403 || mentions_invalid_token(&message) {
            Self::Authorization(message)
        } else {
            Self::UnknownServer(format!("HTTP {status}: {message}"))
        }
    }

    /// Builds an error from the first GraphQL or mutation error message.
    ///
    /// GitLab reports some credential problems as GraphQL errors, so an
    /// "invalid token" message still counts as an authorization failure.
    pub fn from_messages<I, S>(messages: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        messages.into_iter().next().map(|first| {
            let first = first.into();
            if mentions_invalid_token(&first) {
                Self::Authorization(first)
            } else {
                Self::Validation(first)
            }
        })
    }

    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::Authorization(_))
    }
}

impl From<reqwest::Error> for GlmrError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => Self::from_status(status.as_u16(), e.to_string()),
            None if mentions_invalid_token(&e.to_string()) => Self::Authorization(e.to_string()),
            None => Self::UnknownServer(e.to_string()),
        }
    }
}

fn mentions_invalid_token(message: &str) -> bool {
    message
        .to_lowercase()
        .replace('_', " ")
        .contains("invalid token")
}

pub type Result<T> = std::result::Result<T, GlmrError>;
