use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BookingConfirmedEvent {
    pub booking_reference: String,
    pub tier: String,
    pub attendee_count: usize,
    pub timestamp: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BookingResetEvent {
    pub previous_reference: String,
    pub booking_reference: String,
    pub timestamp: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AvatarUploadedEvent {
    pub booking_reference: String,
    pub attendee_index: usize,
    pub url: String,
    pub timestamp: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AvatarUploadFailedEvent {
    pub booking_reference: String,
    pub attendee_index: usize,
    pub message: String,
    pub timestamp: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PersistenceFailedEvent {
    pub booking_reference: String,
    pub message: String,
    pub timestamp: i64,
}

/// Non-blocking notices pushed to whoever is watching the flow.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlowNotice {
    BookingConfirmed(BookingConfirmedEvent),
    BookingReset(BookingResetEvent),
    AvatarUploaded(AvatarUploadedEvent),
    AvatarUploadFailed(AvatarUploadFailedEvent),
    PersistenceFailed(PersistenceFailedEvent),
}

impl FlowNotice {
    pub fn booking_reference(&self) -> &str {
        match self {
            FlowNotice::BookingConfirmed(e) => &e.booking_reference,
            FlowNotice::BookingReset(e) => &e.booking_reference,
            FlowNotice::AvatarUploaded(e) => &e.booking_reference,
            FlowNotice::AvatarUploadFailed(e) => &e.booking_reference,
            FlowNotice::PersistenceFailed(e) => &e.booking_reference,
        }
    }

    /// SSE event name for this notice.
    pub fn kind(&self) -> &'static str {
        match self {
            FlowNotice::BookingConfirmed(_) => "booking_confirmed",
            FlowNotice::BookingReset(_) => "booking_reset",
            FlowNotice::AvatarUploaded(_) => "avatar_uploaded",
            FlowNotice::AvatarUploadFailed(_) => "avatar_upload_failed",
            FlowNotice::PersistenceFailed(_) => "persistence_failed",
        }
    }
}
