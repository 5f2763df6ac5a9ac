use thiserror::Error;

use crate::contract::model::AlbumId;

/// Errors that are safe to expose to callers of the albums API
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlbumsError {
    #[error("Album not found: {id}")]
    NotFound { id: AlbumId },

    #[error("Session expired, please sign in again")]
    SessionExpired,

    #[error("Albums service unavailable: {message}")]
    Unavailable { message: String },

    #[error("Internal error")]
    Internal,
}

impl AlbumsError {
    pub fn not_found(id: AlbumId) -> Self {
        Self::NotFound { id }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn internal() -> Self {
        Self::Internal
    }
}

impl From<crate::domain::error::DomainError> for AlbumsError {
    fn from(domain_error: crate::domain::error::DomainError) -> Self {
        use crate::domain::error::DomainError::*;
        match domain_error {
            AlbumNotFound { id } => Self::not_found(id),
            SessionExpired => Self::SessionExpired,
            Network { message } => Self::unavailable(message),
            Forbidden { resource } => Self::unavailable(format!("access to {resource} denied")),
            Backend { status, .. } => Self::unavailable(format!("backend answered HTTP {status}")),
            Decode { .. } | Internal { .. } => Self::internal(),
        }
    }
}
