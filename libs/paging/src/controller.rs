//! Paginated list controller.
//!
//! Every fetch claims a number from [`FetchSequence`] before touching the
//! network and only applies its result if that number is still the latest.
//! Nothing is cancelled; overlapping fetches simply lose.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, instrument};

use crate::page::{PageQuery, PageResult};
use crate::sequence::FetchSequence;

/// Backend port for one kind of list.
#[async_trait]
pub trait PageSource: Send + Sync {
    type Sort: Clone + Debug + Send + Sync + 'static;
    type Row: Clone + Send + Sync + 'static;
    type Id: Debug + Send + Sync;
    type Error: std::error::Error + Send + Sync + 'static;

    async fn fetch_page(
        &self,
        query: &PageQuery<Self::Sort>,
    ) -> Result<PageResult<Self::Row>, Self::Error>;

    /// Per-row follow-up lookup. Must not fail: a row that cannot be enriched
    /// is returned as it came in.
    async fn enrich(&self, row: Self::Row) -> Self::Row {
        row
    }

    async fn delete(&self, id: &Self::Id) -> Result<(), Self::Error>;
}

/// What the presentation layer renders.
#[derive(Clone, Debug, PartialEq)]
pub struct ListView<R, S> {
    pub rows: Vec<R>,
    pub total_elements: u64,
    pub total_pages: u32,
    pub current_page: u32,
    pub sort: S,
    pub is_loading: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The result was applied; `page` is where the view settled.
    Applied { page: u32 },
    /// A newer fetch started meanwhile; this result was dropped.
    Superseded,
}

struct Nav<S> {
    sort: S,
    page: u32,
}

pub struct PagedListController<P: PageSource> {
    source: Arc<P>,
    page_size: u32,
    sequence: FetchSequence,
    nav: Mutex<Nav<P::Sort>>,
    view: watch::Sender<ListView<P::Row, P::Sort>>,
}

impl<P: PageSource> PagedListController<P> {
    pub fn new(source: Arc<P>, sort: P::Sort, page_size: u32) -> Self {
        let (view, _) = watch::channel(ListView {
            rows: Vec::new(),
            total_elements: 0,
            total_pages: 0,
            current_page: 1,
            sort: sort.clone(),
            is_loading: false,
        });
        Self {
            source,
            page_size: page_size.max(1),
            sequence: FetchSequence::new(),
            nav: Mutex::new(Nav { sort, page: 1 }),
            view,
        }
    }

    pub fn source(&self) -> &Arc<P> {
        &self.source
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn snapshot(&self) -> ListView<P::Row, P::Sort> {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListView<P::Row, P::Sort>> {
        self.view.subscribe()
    }

    /// Switch ordering and go back to the first page.
    pub async fn set_sort(&self, sort: P::Sort) -> Result<FetchOutcome, P::Error> {
        {
            let mut nav = self.nav.lock();
            nav.sort = sort;
            nav.page = 1;
        }
        self.fetch(None).await
    }

    /// Navigate to `page`, clamped to the known page range.
    pub async fn set_page(&self, page: u32) -> Result<FetchOutcome, P::Error> {
        let total_pages = self.view.borrow().total_pages;
        let page = if total_pages > 0 {
            page.clamp(1, total_pages)
        } else {
            page.max(1)
        };
        self.fetch(Some(page)).await
    }

    /// Delete one row, then reload the current page (self-correcting if it
    /// became empty).
    #[instrument(name = "songdap.paging.delete_row", skip(self))]
    pub async fn delete_row(&self, id: &P::Id) -> Result<FetchOutcome, P::Error> {
        self.source.delete(id).await?;
        self.fetch(None).await
    }

    /// Load `target` (or the current page) with the current sort.
    #[instrument(name = "songdap.paging.fetch", skip(self), fields(page_size = self.page_size))]
    pub async fn fetch(&self, target: Option<u32>) -> Result<FetchOutcome, P::Error> {
        let (sort, mut page) = {
            let mut nav = self.nav.lock();
            if let Some(p) = target {
                nav.page = p.max(1);
            }
            (nav.sort.clone(), nav.page)
        };

        let mut loading = LoadingGuard {
            controller: self,
            seq: self.sequence.next(),
        };
        loop {
            let seq = loading.seq;
            self.view.send_modify(|v| v.is_loading = true);

            let query = PageQuery::new(sort.clone(), page, self.page_size);
            let result = match self.source.fetch_page(&query).await {
                Ok(r) => r,
                Err(e) => {
                    let reset = self.apply_if_current(seq, |v| {
                        v.rows.clear();
                        v.total_elements = 0;
                        v.total_pages = 0;
                        v.is_loading = false;
                    });
                    if !reset {
                        debug!(seq, "discarding failure of superseded fetch");
                        return Ok(FetchOutcome::Superseded);
                    }
                    return Err(e);
                }
            };

            let rows = join_all(result.items.into_iter().map(|row| self.source.enrich(row))).await;
            let step_back = rows.is_empty() && page > 1;

            let applied = self.apply_if_current(seq, |v| {
                v.rows = rows;
                v.total_elements = result.total_elements;
                v.total_pages = result.total_pages;
                v.sort = sort.clone();
                if !step_back {
                    v.current_page = page;
                    v.is_loading = false;
                    self.nav.lock().page = page;
                }
            });
            if !applied {
                debug!(seq, page, "discarding superseded page");
                return Ok(FetchOutcome::Superseded);
            }

            if !step_back {
                return Ok(FetchOutcome::Applied { page });
            }
            debug!(page, "page came back empty, stepping back");
            page -= 1;
            loading.seq = self.sequence.next();
        }
    }

    /// Runs `update` only if `seq` is still the latest fetch. The check happens
    /// under the view's write lock, so a newer fetch cannot apply in between.
    fn apply_if_current(
        &self,
        seq: u64,
        update: impl FnOnce(&mut ListView<P::Row, P::Sort>),
    ) -> bool {
        self.view.send_if_modified(|v| {
            if !self.sequence.is_current(seq) {
                return false;
            }
            update(v);
            true
        })
    }
}

/// Clears `is_loading` when a fetch future is dropped mid-flight, unless a
/// newer fetch owns the flag by then.
struct LoadingGuard<'a, P: PageSource> {
    controller: &'a PagedListController<P>,
    seq: u64,
}

impl<P: PageSource> Drop for LoadingGuard<'_, P> {
    fn drop(&mut self) {
        let controller = self.controller;
        controller.view.send_if_modified(|v| {
            if !v.is_loading || !controller.sequence.is_current(self.seq) {
                return false;
            }
            v.is_loading = false;
            true
        });
    }
}
