//! Cached newest-first listings re-derived from the row store.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tracing::warn;

use crate::rows::{Row, RowStore, RowStoreError};

struct Snapshot<R> {
    entries: Arc<Vec<R>>,
    /// Ticket of the refresh that produced `entries`; 0 before the first one.
    ticket: u64,
}

/// Result of a refresh.
#[derive(Debug, Clone)]
pub struct Refreshed<R> {
    pub entries: Arc<Vec<R>>,
    /// The row store could not be read and the previous listing was kept.
    pub stale: bool,
}

/// Shared listing of one table.
///
/// Every refresh draws a ticket. A result is applied only when its ticket is
/// newer than the one already applied, so a slow refresh finishing late
/// cannot overwrite a fresher listing.
pub struct Listing<R: Row> {
    store: Arc<dyn RowStore<R>>,
    snapshot: RwLock<Snapshot<R>>,
    next_ticket: AtomicU64,
}

impl<R: Row> Listing<R> {
    pub fn new(store: Arc<dyn RowStore<R>>) -> Self {
        Self {
            store,
            snapshot: RwLock::new(Snapshot {
                entries: Arc::new(Vec::new()),
                ticket: 0,
            }),
            next_ticket: AtomicU64::new(1),
        }
    }

    pub fn store(&self) -> &dyn RowStore<R> {
        self.store.as_ref()
    }

    /// The last applied listing without contacting the row store.
    pub async fn current(&self) -> Arc<Vec<R>> {
        Arc::clone(&self.snapshot.read().await.entries)
    }

    /// Re-read the table newest-first and replace the listing.
    ///
    /// On failure the error is logged and the previous listing is returned
    /// marked stale.
    pub async fn refresh(&self) -> Refreshed<R> {
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst);
        match self.store.list_newest_first().await {
            Ok(rows) => Refreshed {
                entries: self.apply(ticket, rows).await,
                stale: false,
            },
            Err(e) => self.keep_previous(e).await,
        }
    }

    async fn apply(&self, ticket: u64, rows: Vec<R>) -> Arc<Vec<R>> {
        let rows = Arc::new(rows);
        let mut snapshot = self.snapshot.write().await;
        if ticket > snapshot.ticket {
            snapshot.ticket = ticket;
            snapshot.entries = Arc::clone(&rows);
        }
        // The caller still gets what it read, even when a newer listing won.
        rows
    }

    async fn keep_previous(&self, err: RowStoreError) -> Refreshed<R> {
        warn!(table = R::TABLE, "Listing refresh failed, keeping previous entries: {}", err);
        Refreshed {
            entries: self.current().await,
            stale: true,
        }
    }
}
