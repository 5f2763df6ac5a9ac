use std::sync::Arc;

use async_trait::async_trait;
use paging::{PageQuery, PageResult};
use songdap_http::{ApiRequest, AuthRefreshGate};
use tracing::instrument;

use crate::contract::model::{AlbumDetail, AlbumId, AlbumSort, AlbumSummary};
use crate::domain::error::DomainError;
use crate::domain::ports::AlbumsBackend;

/// HTTP adapter for the albums backend. Every call goes through the auth gate.
pub struct HttpAlbumsClient {
    gate: Arc<AuthRefreshGate>,
}

impl HttpAlbumsClient {
    pub fn new(gate: Arc<AuthRefreshGate>) -> Self {
        Self { gate }
    }

    fn album_path(id: &AlbumId) -> String {
        format!("/albums/{}", urlencoding::encode(id.as_str()))
    }
}

#[async_trait]
impl AlbumsBackend for HttpAlbumsClient {
    #[instrument(
        name = "songdap.albums.http.list",
        skip_all,
        fields(sort = %query.sort, page = query.backend_index(), size = query.page_size)
    )]
    async fn list_albums(
        &self,
        query: &PageQuery<AlbumSort>,
    ) -> Result<PageResult<AlbumSummary>, DomainError> {
        let request = ApiRequest::get("/albums")
            .query("sort", query.sort.as_wire())
            .query("page", query.backend_index())
            .query("size", query.page_size);

        Ok(self.gate.execute_json(request).await?)
    }

    #[instrument(name = "songdap.albums.http.get", skip_all, fields(album_id = %id))]
    async fn get_album(&self, id: &AlbumId) -> Result<AlbumDetail, DomainError> {
        self.gate
            .execute_json(ApiRequest::get(Self::album_path(id)))
            .await
            .map_err(|e| DomainError::for_album(e, id))
    }

    #[instrument(name = "songdap.albums.http.delete", skip_all, fields(album_id = %id))]
    async fn delete_album(&self, id: &AlbumId) -> Result<(), DomainError> {
        self.gate
            .execute(ApiRequest::delete(Self::album_path(id)))
            .await
            .map(|_| ())
            .map_err(|e| DomainError::for_album(e, id))
    }
}
