use std::sync::Arc;

use async_trait::async_trait;
use paging::{PageQuery, PageResult, PageSource};
use tracing::{debug, instrument};

use crate::contract::model::{AlbumId, AlbumRow, AlbumSort};
use crate::domain::error::DomainError;
use crate::domain::ports::AlbumsBackend;

/// Adapts the albums backend to the paged list controller.
///
/// Enrichment never fails: a 403 marks the row private, anything else leaves
/// it as listed.
pub struct AlbumSource {
    backend: Arc<dyn AlbumsBackend>,
    enrich_details: bool,
}

impl AlbumSource {
    pub fn new(backend: Arc<dyn AlbumsBackend>, enrich_details: bool) -> Self {
        Self {
            backend,
            enrich_details,
        }
    }
}

#[async_trait]
impl PageSource for AlbumSource {
    type Sort = AlbumSort;
    type Row = AlbumRow;
    type Id = AlbumId;
    type Error = DomainError;

    async fn fetch_page(
        &self,
        query: &PageQuery<AlbumSort>,
    ) -> Result<PageResult<AlbumRow>, DomainError> {
        let page = self.backend.list_albums(query).await?;
        Ok(page.map_items(AlbumRow::from))
    }

    #[instrument(name = "songdap.albums.enrich", skip_all, fields(album_id = %row.id()))]
    async fn enrich(&self, row: AlbumRow) -> AlbumRow {
        if !self.enrich_details {
            return row;
        }

        match self.backend.get_album(row.id()).await {
            Ok(detail) => row.with_detail(detail),
            Err(e) if e.is_forbidden() => row.private_to_other(),
            Err(e) => {
                debug!(error = %e, "album detail unavailable, keeping summary");
                row
            }
        }
    }

    async fn delete(&self, id: &AlbumId) -> Result<(), DomainError> {
        self.backend.delete_album(id).await
    }
}
