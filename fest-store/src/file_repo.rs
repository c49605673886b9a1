use async_trait::async_trait;
use fest_booking::{BookingFlow, BookingRecord, BookingReference};
use fest_core::{BookingRepository, DraftRepository, RepositoryError};
use serde::{de::DeserializeOwned, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const BOOKINGS_DIR: &str = "bookings";
const DRAFT_FILE: &str = "draft.json";

/// Local key-value store: one JSON document per key under `data_dir`.
/// Writes go to a temp file first and are renamed into place.
#[derive(Debug, Clone)]
pub struct FileBookingStore {
    data_dir: PathBuf,
}

impl FileBookingStore {
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let data_dir = data_dir.into();
        tokio::fs::create_dir_all(data_dir.join(BOOKINGS_DIR)).await?;
        info!("Booking store opened at {}", data_dir.display());
        Ok(Self { data_dir })
    }

    fn booking_path(&self, reference: &BookingReference) -> Result<PathBuf, RepositoryError> {
        let key = reference.as_str();
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(RepositoryError::InvalidKey(key.to_string()));
        }
        Ok(self.data_dir.join(BOOKINGS_DIR).join(format!("{}.json", key)))
    }

    fn draft_path(&self) -> PathBuf {
        self.data_dir.join(DRAFT_FILE)
    }
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), RepositoryError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, RepositoryError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl BookingRepository for FileBookingStore {
    async fn put(
        &self,
        reference: &BookingReference,
        record: &BookingRecord,
    ) -> Result<(), RepositoryError> {
        let path = self.booking_path(reference)?;
        write_json(&path, record).await?;
        info!("Booking {} stored ({} attendees)", reference, record.attendees.len());
        Ok(())
    }

    async fn get(
        &self,
        reference: &BookingReference,
    ) -> Result<Option<BookingRecord>, RepositoryError> {
        let path = self.booking_path(reference)?;
        read_json(&path).await
    }
}

#[async_trait]
impl DraftRepository for FileBookingStore {
    async fn save_draft(&self, flow: &BookingFlow) -> Result<(), RepositoryError> {
        write_json(&self.draft_path(), flow).await?;
        debug!("Draft saved for {}", flow.reference());
        Ok(())
    }

    async fn load_draft(&self) -> Result<Option<BookingFlow>, RepositoryError> {
        read_json(&self.draft_path()).await
    }
}
