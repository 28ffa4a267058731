//! HTTP backend for a remote table store.
//!
//! Items live at `{base}/tables/{table}/items/{key}` and are exchanged as
//! JSON bodies. Any transport or server failure surfaces as
//! [`StoreError::Backend`] carrying the store's own message, so callers can
//! tell "the store is down" apart from "the item does not exist".

use super::{RecordBackend, StoreError};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub struct HttpRecordBackend {
    client: Client,
    base_url: Url,
    table: String,
}

impl HttpRecordBackend {
    pub fn new(base_url: &str, table: impl Into<String>) -> Result<Self, StoreError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| StoreError::Backend(format!("invalid store url: {e}")))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Self {
            client,
            base_url,
            table: table.into(),
        })
    }

    fn item_url(&self, key: &str) -> Result<Url, StoreError> {
        self.base_url
            .join(&format!("tables/{}/items/{}", self.table, key))
            .map_err(|e| StoreError::Backend(e.to_string()))
    }
}

#[async_trait::async_trait]
impl RecordBackend for HttpRecordBackend {
    async fn get_item(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let url = self.item_url(key)?;
        debug!(%url, "fetching item");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Backend(format!("{status}: {body}")));
        }
        let item = response
            .json::<Value>()
            .await
            .map_err(|e| StoreError::Malformed(e.to_string()))?;
        Ok(Some(item))
    }

    async fn put_item(&self, key: &str, item: Value) -> Result<(), StoreError> {
        let url = self.item_url(key)?;
        let response = self
            .client
            .put(url)
            .json(&item)
            .send()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Backend(format!("{status}: {body}")));
        }
        Ok(())
    }

    async fn delete_item(&self, key: &str) -> Result<(), StoreError> {
        let url = self.item_url(key)?;
        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        // Deleting an absent item is a no-op, same as the in-memory backend.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Backend(format!("{status}: {body}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_url_joins_table_and_key() {
        let backend = HttpRecordBackend::new("http://records.local/", "cards").unwrap();
        let url = backend.item_url("card-9").unwrap();
        assert_eq!(url.as_str(), "http://records.local/tables/cards/items/card-9");
    }

    #[test]
    fn malformed_base_url_is_rejected() {
        assert!(matches!(
            HttpRecordBackend::new("not a url", "cards"),
            Err(StoreError::Backend(_))
        ));
    }
}
