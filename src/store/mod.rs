//! Key-value record store for card data kept outside the session.
//!
//! The backing store is an external collaborator; this layer only consumes
//! item shapes. "Not found" and "unavailable" stay distinguishable all the
//! way up: a missing item is `Ok(None)`, a backend failure is
//! [`StoreError::Backend`] carrying the store's native error message.

pub mod cards;
pub mod http;
pub mod memory;

use serde_json::Value;
use thiserror::Error;

pub use cards::{AvailableTime, CardRecord, CardStore, DateEntry};
pub use http::HttpRecordBackend;
pub use memory::InMemoryBackend;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("item not found")]
    NotFound,
    #[error("no matching entry")]
    EntryNotFound,
    #[error("{0}")]
    Backend(String),
    #[error("malformed item: {0}")]
    Malformed(String),
}

/// Whole-item operations keyed by the card identifier.
#[async_trait::async_trait]
pub trait RecordBackend: Send + Sync {
    /// `Ok(None)` means the key does not exist; `Err` means the store could
    /// not answer.
    async fn get_item(&self, key: &str) -> Result<Option<Value>, StoreError>;

    async fn put_item(&self, key: &str, item: Value) -> Result<(), StoreError>;

    async fn delete_item(&self, key: &str) -> Result<(), StoreError>;
}
