use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a call to the remote finance API.
///
/// Cloneable so a single failed request can be handed to every caller that
/// was waiting on the same query.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// 401 or 403 from the API. The session is left as-is.
    #[error("not authorized ({status}): {message}")]
    Unauthorized { status: StatusCode, message: String },

    #[error("request failed ({status}): {message}")]
    Status { status: StatusCode, message: String },

    #[error("network error: {0}")]
    Transport(String),

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("client configuration error: {0}")]
    Config(String),

    #[error("session storage error: {0}")]
    Session(String),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Unauthorized { status, .. } | ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Transport failures and 5xx responses; everything else would fail the
    /// same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport(_) => true,
            ApiError::Status { status, .. } => status.is_server_error(),
            _ => false,
        }
    }

    /// Text suitable for a transient notification.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized { message, .. } | ApiError::Status { message, .. }
                if !message.is_empty() =>
            {
                message.clone()
            }
            ApiError::Unauthorized { .. } => "Your session has expired. Please sign in again.".into(),
            ApiError::Transport(_) => "Could not reach the server. Please try again.".into(),
            _ => "Something went wrong. Please try again.".into(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else if e.is_builder() {
            ApiError::Config(e.to_string())
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        ApiError::Session(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("token store io: {0}")]
    Io(#[from] std::io::Error),

    #[error("token must not be empty")]
    EmptyToken,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_and_server_errors_are_retryable() {
        assert!(ApiError::Transport("reset".into()).is_retryable());
        assert!(ApiError::Status {
            status: StatusCode::BAD_GATEWAY,
            message: String::new()
        }
        .is_retryable());
        assert!(!ApiError::Status {
            status: StatusCode::NOT_FOUND,
            message: String::new()
        }
        .is_retryable());
        assert!(!ApiError::Unauthorized {
            status: StatusCode::UNAUTHORIZED,
            message: String::new()
        }
        .is_retryable());
    }

    #[test]
    fn user_message_prefers_server_text() {
        let e = ApiError::Status {
            status: StatusCode::CONFLICT,
            message: "Category already exists".into(),
        };
        assert_eq!(e.user_message(), "Category already exists");
        assert_eq!(e.status(), Some(StatusCode::CONFLICT));
    }
}
