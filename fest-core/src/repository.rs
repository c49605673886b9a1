use async_trait::async_trait;
use fest_booking::{BookingFlow, BookingRecord, BookingReference};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Stored document is malformed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Durable key-value store for finalized bookings, keyed by booking reference
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn put(
        &self,
        reference: &BookingReference,
        record: &BookingRecord,
    ) -> Result<(), RepositoryError>;

    async fn get(
        &self,
        reference: &BookingReference,
    ) -> Result<Option<BookingRecord>, RepositoryError>;
}

/// Mirror of the in-progress flow, restored after a restart
#[async_trait]
pub trait DraftRepository: Send + Sync {
    async fn save_draft(&self, flow: &BookingFlow) -> Result<(), RepositoryError>;

    async fn load_draft(&self) -> Result<Option<BookingFlow>, RepositoryError>;
}
