use async_trait::async_trait;
use std::sync::Arc;

use crate::contract::{
    client::AlbumsApi,
    error::AlbumsError,
    model::{AlbumId, AlbumPage, AlbumSort},
};
use crate::domain::service::AlbumListService;

/// Local implementation of the AlbumsApi trait that delegates to the domain service
pub struct AlbumsLocalClient {
    service: Arc<AlbumListService>,
}

impl AlbumsLocalClient {
    pub fn new(service: Arc<AlbumListService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl AlbumsApi for AlbumsLocalClient {
    async fn refresh(&self) -> Result<AlbumPage, AlbumsError> {
        self.service.refresh().await?;
        Ok(self.service.page())
    }

    async fn set_sort(&self, sort: AlbumSort) -> Result<AlbumPage, AlbumsError> {
        self.service.set_sort(sort).await?;
        Ok(self.service.page())
    }

    async fn set_page(&self, page: u32) -> Result<AlbumPage, AlbumsError> {
        self.service.set_page(page).await?;
        Ok(self.service.page())
    }

    async fn delete_album(&self, id: &AlbumId) -> Result<AlbumPage, AlbumsError> {
        self.service.delete_album(id).await?;
        Ok(self.service.page())
    }

    fn current(&self) -> AlbumPage {
        self.service.page()
    }
}
