use async_trait::async_trait;
use paging::{PageQuery, PageResult};

use crate::contract::model::{AlbumDetail, AlbumId, AlbumSort, AlbumSummary};
use crate::domain::error::DomainError;

/// Transport-agnostic port to the albums backend.
#[async_trait]
pub trait AlbumsBackend: Send + Sync {
    async fn list_albums(
        &self,
        query: &PageQuery<AlbumSort>,
    ) -> Result<PageResult<AlbumSummary>, DomainError>;

    /// Fails with [`DomainError::Forbidden`] when the album is private to another owner.
    async fn get_album(&self, id: &AlbumId) -> Result<AlbumDetail, DomainError>;

    async fn delete_album(&self, id: &AlbumId) -> Result<(), DomainError>;
}
