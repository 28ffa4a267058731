//! Typed operations over card records and their nested list attributes.

use super::{RecordBackend, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, instrument};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AvailableTime {
    pub day: String,
    pub start: String,
    pub end: String,
}

/// Entries in the dates list are keyed by composite equality over all three
/// fields, not by position.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DateEntry {
    pub date: String,
    pub time: String,
    pub card_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CardRecord {
    pub uid: String,
    #[serde(default)]
    pub qr_codes: Vec<String>,
    #[serde(default)]
    pub available_times: Vec<AvailableTime>,
    #[serde(default)]
    pub dates: Vec<DateEntry>,
    pub created_at: DateTime<Utc>,
}

impl CardRecord {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            qr_codes: Vec::new(),
            available_times: Vec::new(),
            dates: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

pub struct CardStore {
    backend: Arc<dyn RecordBackend>,
}

impl CardStore {
    pub fn new(backend: Arc<dyn RecordBackend>) -> Self {
        Self { backend }
    }

    #[instrument(skip(self))]
    pub async fn create_card(&self, uid: &str) -> Result<CardRecord, StoreError> {
        let record = CardRecord::new(uid);
        self.put(&record).await?;
        Ok(record)
    }

    /// `Ok(None)` when the card does not exist, so callers can treat a
    /// missing card as an empty collection where that makes sense.
    #[instrument(skip(self))]
    pub async fn get_card(&self, uid: &str) -> Result<Option<CardRecord>, StoreError> {
        match self.backend.get_item(uid).await {
            Ok(Some(item)) => serde_json::from_value(item)
                .map(Some)
                .map_err(|e| StoreError::Malformed(e.to_string())),
            Ok(None) => Ok(None),
            Err(err) => {
                error!(%uid, %err, "record store read failed");
                Err(err)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn delete_card(&self, uid: &str) -> Result<(), StoreError> {
        self.backend.delete_item(uid).await
    }

    async fn put(&self, record: &CardRecord) -> Result<(), StoreError> {
        let item = serde_json::to_value(record).map_err(|e| StoreError::Malformed(e.to_string()))?;
        self.backend.put_item(&record.uid, item).await
    }

    /// Read-modify-write of one card. The mutation returns `Err` to abort
    /// without writing, leaving the stored record untouched.
    async fn update_card<F>(&self, uid: &str, mutate: F) -> Result<CardRecord, StoreError>
    where
        F: FnOnce(&mut CardRecord) -> Result<(), StoreError>,
    {
        let mut record = self.get_card(uid).await?.ok_or(StoreError::NotFound)?;
        mutate(&mut record)?;
        self.put(&record).await?;
        Ok(record)
    }

    pub async fn add_qr_code(&self, uid: &str, code: &str) -> Result<CardRecord, StoreError> {
        let code = code.to_string();
        self.update_card(uid, move |record| {
            record.qr_codes.push(code);
            Ok(())
        })
        .await
    }

    /// Removes exactly the matched code. A code that is not present is
    /// reported as [`StoreError::EntryNotFound`] and the list is unchanged.
    pub async fn remove_qr_code(&self, uid: &str, code: &str) -> Result<CardRecord, StoreError> {
        self.update_card(uid, |record| {
            remove_matched(&mut record.qr_codes, |c| c == code)
        })
        .await
    }

    pub async fn add_available_time(
        &self,
        uid: &str,
        time: AvailableTime,
    ) -> Result<CardRecord, StoreError> {
        self.update_card(uid, move |record| {
            record.available_times.push(time);
            Ok(())
        })
        .await
    }

    pub async fn remove_available_time(
        &self,
        uid: &str,
        time: &AvailableTime,
    ) -> Result<CardRecord, StoreError> {
        self.update_card(uid, |record| {
            remove_matched(&mut record.available_times, |t| t == time)
        })
        .await
    }

    pub async fn add_date(&self, uid: &str, entry: DateEntry) -> Result<CardRecord, StoreError> {
        self.update_card(uid, move |record| {
            record.dates.push(entry);
            Ok(())
        })
        .await
    }

    /// Removal targets the entry whose (date, time, card_id) all match,
    /// wherever it sits in the list.
    pub async fn remove_date(&self, uid: &str, entry: &DateEntry) -> Result<CardRecord, StoreError> {
        self.update_card(uid, |record| {
            remove_matched(&mut record.dates, |d| d == entry)
        })
        .await
    }
}

/// Remove the first element matching the predicate, by its own index.
fn remove_matched<T, F>(list: &mut Vec<T>, matches: F) -> Result<(), StoreError>
where
    F: Fn(&T) -> bool,
{
    match list.iter().position(matches) {
        Some(index) => {
            list.remove(index);
            Ok(())
        }
        None => Err(StoreError::EntryNotFound),
    }
}
