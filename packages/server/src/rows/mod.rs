//! Row store boundary: typed tables persisted by the hosted backend.

mod database;
mod rest;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use database::DatabaseRowStore;
pub use rest::RestRowStore;

/// A record type stored in one table.
pub trait Row: DeserializeOwned + Clone + Send + Sync + 'static {
    /// Table name in the row store.
    const TABLE: &'static str;
    /// Column values supplied on insert; the store assigns id and creation time.
    type Insert: Serialize + Send + Sync + 'static;
}

#[derive(Debug, Error)]
pub enum RowStoreError {
    #[error("row store rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("row store unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("row store returned malformed data: {0}")]
    Malformed(String),
}

/// Insert and list operations on the table of `R`.
#[async_trait]
pub trait RowStore<R: Row>: Send + Sync {
    /// Insert one row and return it as stored.
    async fn insert(&self, row: R::Insert) -> Result<R, RowStoreError>;

    /// Every row of the table, most recently created first.
    async fn list_newest_first(&self) -> Result<Vec<R>, RowStoreError>;
}
