use songdap_http::{HttpError, StatusCode};
use thiserror::Error;

use crate::contract::model::AlbumId;

/// Domain-specific errors using thiserror
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Album not found: {id}")]
    AlbumNotFound { id: AlbumId },

    #[error("Session expired")]
    SessionExpired,

    #[error("Access to {resource} is forbidden")]
    Forbidden { resource: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Backend error: HTTP {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("Malformed backend response: {message}")]
    Decode { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn album_not_found(id: AlbumId) -> Self {
        Self::AlbumNotFound { id }
    }

    pub fn forbidden(resource: impl Into<String>) -> Self {
        Self::Forbidden {
            resource: resource.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden { .. })
    }

    /// Like the `From` conversion, but a 404 or 403 names the album.
    pub fn for_album(err: HttpError, id: &AlbumId) -> Self {
        match err {
            HttpError::Status { status, .. } if status == StatusCode::NOT_FOUND => {
                Self::album_not_found(id.clone())
            }
            HttpError::Forbidden { .. } => Self::forbidden(format!("album {id}")),
            other => other.into(),
        }
    }
}

impl From<HttpError> for DomainError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::SessionExpired => Self::SessionExpired,
            HttpError::Forbidden { path } => Self::forbidden(path),
            HttpError::Network { message, .. } => Self::Network { message },
            HttpError::Status { status, body, .. } => Self::Backend {
                status: status.as_u16(),
                message: body,
            },
            HttpError::Decode { message, .. } => Self::Decode { message },
            HttpError::InvalidUrl(message) => Self::internal(message),
        }
    }
}
