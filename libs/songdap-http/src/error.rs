use http::StatusCode;
use thiserror::Error;

/// Failures surfaced by the transport and the auth gate.
#[derive(Error, Debug, Clone)]
pub enum HttpError {
    /// No response at all (connect error, reset, timeout).
    #[error("network failure: {message}")]
    Network { message: String, timeout: bool },

    /// Terminal authentication failure; the user has to sign in again.
    #[error("session expired, re-authentication required")]
    SessionExpired,

    #[error("access to {path} is forbidden")]
    Forbidden { path: String },

    #[error("{path} answered HTTP {status}")]
    Status {
        path: String,
        status: StatusCode,
        body: String,
    },

    #[error("failed to decode response from {path}: {message}")]
    Decode { path: String, message: String },

    #[error("invalid request URL: {0}")]
    InvalidUrl(String),
}

impl HttpError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            timeout: false,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            timeout: true,
        }
    }

    pub fn status(path: impl Into<String>, status: StatusCode, body: impl Into<String>) -> Self {
        Self::Status {
            path: path.into(),
            status,
            body: body.into(),
        }
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden { .. })
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }

    /// HTTP status carried by the error, when the server answered at all.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Forbidden { .. } => Some(StatusCode::FORBIDDEN),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for HttpError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::timeout(e.to_string())
        } else {
            Self::network(e.to_string())
        }
    }
}
