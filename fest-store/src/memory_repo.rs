use async_trait::async_trait;
use fest_booking::{BookingFlow, BookingRecord, BookingReference};
use fest_core::{BookingRepository, DraftRepository, RepositoryError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// In-process store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryBookingStore {
    bookings: RwLock<HashMap<BookingReference, BookingRecord>>,
    draft: RwLock<Option<BookingFlow>>,
    unavailable: AtomicBool,
}

impl MemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every booking write fail until switched back
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.bookings.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.bookings.read().await.is_empty()
    }
}

#[async_trait]
impl BookingRepository for MemoryBookingStore {
    async fn put(
        &self,
        reference: &BookingReference,
        record: &BookingRecord,
    ) -> Result<(), RepositoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("memory store switched off".to_string()));
        }
        self.bookings.write().await.insert(reference.clone(), record.clone());
        Ok(())
    }

    async fn get(
        &self,
        reference: &BookingReference,
    ) -> Result<Option<BookingRecord>, RepositoryError> {
        Ok(self.bookings.read().await.get(reference).cloned())
    }
}

#[async_trait]
impl DraftRepository for MemoryBookingStore {
    async fn save_draft(&self, flow: &BookingFlow) -> Result<(), RepositoryError> {
        *self.draft.write().await = Some(flow.clone());
        Ok(())
    }

    async fn load_draft(&self) -> Result<Option<BookingFlow>, RepositoryError> {
        Ok(self.draft.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fest_catalog::TicketTier;

    #[tokio::test]
    async fn test_unavailable_store_refuses_writes() {
        let store = MemoryBookingStore::new();
        let record = BookingRecord::confirm(BookingReference::new("REF"), TicketTier::Standard, &[], Utc::now());

        store.set_unavailable(true);
        assert!(store.put(&record.booking_reference, &record).await.is_err());
        assert!(store.is_empty().await);

        store.set_unavailable(false);
        store.put(&record.booking_reference, &record).await.unwrap();
        assert_eq!(store.get(&record.booking_reference).await.unwrap(), Some(record));
    }
}
