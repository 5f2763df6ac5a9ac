use async_trait::async_trait;

use crate::contract::{
    error::AlbumsError,
    model::{AlbumId, AlbumPage, AlbumSort},
};

/// Public API of the album list. Each call returns the settled page.
#[async_trait]
pub trait AlbumsApi: Send + Sync {
    /// Reload the current page.
    async fn refresh(&self) -> Result<AlbumPage, AlbumsError>;

    /// Change ordering; goes back to page 1.
    async fn set_sort(&self, sort: AlbumSort) -> Result<AlbumPage, AlbumsError>;

    /// Go to a 1-based page, clamped to the known range.
    async fn set_page(&self, page: u32) -> Result<AlbumPage, AlbumsError>;

    /// Delete an album and reload, stepping back if the page became empty.
    async fn delete_album(&self, id: &AlbumId) -> Result<AlbumPage, AlbumsError>;

    /// Last settled page without touching the network.
    fn current(&self) -> AlbumPage;
}
