use std::sync::Arc;

use paging::{FetchOutcome, ListView, PagedListController};
use tokio::sync::watch;
use tracing::{debug, info, instrument};

use crate::config::AlbumsConfig;
use crate::contract::model::{AlbumId, AlbumPage, AlbumRow, AlbumSort};
use crate::domain::error::DomainError;
use crate::domain::ports::AlbumsBackend;
use crate::domain::source::AlbumSource;

pub type AlbumListView = ListView<AlbumRow, AlbumSort>;

/// The album list screen's state machine: sort, page, delete.
pub struct AlbumListService {
    list: PagedListController<AlbumSource>,
}

impl AlbumListService {
    pub fn new(backend: Arc<dyn AlbumsBackend>, config: &AlbumsConfig) -> Self {
        let source = Arc::new(AlbumSource::new(backend, config.enrich_details));
        Self {
            list: PagedListController::new(source, config.default_sort, config.page_size),
        }
    }

    #[instrument(name = "songdap.albums.service.refresh", skip(self))]
    pub async fn refresh(&self) -> Result<FetchOutcome, DomainError> {
        self.list.fetch(None).await
    }

    #[instrument(name = "songdap.albums.service.set_sort", skip(self, sort), fields(sort = %sort))]
    pub async fn set_sort(&self, sort: AlbumSort) -> Result<FetchOutcome, DomainError> {
        debug!("changing album order");
        self.list.set_sort(sort).await
    }

    #[instrument(name = "songdap.albums.service.set_page", skip(self))]
    pub async fn set_page(&self, page: u32) -> Result<FetchOutcome, DomainError> {
        self.list.set_page(page).await
    }

    #[instrument(name = "songdap.albums.service.delete_album", skip(self, id), fields(album_id = %id))]
    pub async fn delete_album(&self, id: &AlbumId) -> Result<FetchOutcome, DomainError> {
        let outcome = self.list.delete_row(id).await?;
        info!(?outcome, "album deleted");
        Ok(outcome)
    }

    pub fn view(&self) -> AlbumListView {
        self.list.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<AlbumListView> {
        self.list.subscribe()
    }

    pub fn page(&self) -> AlbumPage {
        let view = self.list.snapshot();
        AlbumPage {
            rows: view.rows,
            total_elements: view.total_elements,
            total_pages: view.total_pages,
            current_page: view.current_page,
            sort: view.sort,
        }
    }
}
