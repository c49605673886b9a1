use chrono::{DateTime, Utc};
use fest_catalog::TicketTier;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque token identifying one booking attempt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct BookingReference(String);

impl BookingReference {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// `TKT-` followed by eight upper-case hex digits
    pub fn generate() -> Self {
        let id = Uuid::new_v4().simple().to_string();
        Self(format!("TKT-{}", id[..8].to_uppercase()))
    }

    /// Fresh reference guaranteed to differ from `previous`
    pub fn generate_after(previous: &BookingReference) -> Self {
        loop {
            let next = Self::generate();
            if &next != previous {
                return next;
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Per-attendee sub-identifier, 1-based: `REF-1`, `REF-2`, ...
    pub fn ticket_id(&self, index: usize) -> String {
        format!("{}-{}", self.0, index + 1)
    }
}

impl fmt::Display for BookingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Editable attendee fields
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum AttendeeField {
    FullName,
    Email,
    Phone,
    AvatarUrl,
    Company,
    JobTitle,
    TwitterHandle,
}

impl AttendeeField {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendeeField::FullName => "fullName",
            AttendeeField::Email => "email",
            AttendeeField::Phone => "phone",
            AttendeeField::AvatarUrl => "avatarUrl",
            AttendeeField::Company => "company",
            AttendeeField::JobTitle => "jobTitle",
            AttendeeField::TwitterHandle => "twitterHandle",
        }
    }
}

impl fmt::Display for AttendeeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Personal details for one ticket
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeRecord {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter_handle: Option<String>,
    /// `${bookingReference}-${index+1}`, stamped on submission
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
}

impl AttendeeRecord {
    pub fn get(&self, field: AttendeeField) -> Option<&str> {
        match field {
            AttendeeField::FullName => Some(self.full_name.as_str()),
            AttendeeField::Email => Some(self.email.as_str()),
            AttendeeField::Phone => self.phone.as_deref(),
            AttendeeField::AvatarUrl => self.avatar_url.as_deref(),
            AttendeeField::Company => self.company.as_deref(),
            AttendeeField::JobTitle => self.job_title.as_deref(),
            AttendeeField::TwitterHandle => self.twitter_handle.as_deref(),
        }
    }

    /// Set a field. Input is stored trimmed; blank input clears optional fields.
    pub fn set(&mut self, field: AttendeeField, value: String) {
        let value = value.trim().to_string();
        let optional = if value.is_empty() { None } else { Some(value.clone()) };
        match field {
            AttendeeField::FullName => self.full_name = value,
            AttendeeField::Email => self.email = value,
            AttendeeField::Phone => self.phone = optional,
            AttendeeField::AvatarUrl => self.avatar_url = optional,
            AttendeeField::Company => self.company = optional,
            AttendeeField::JobTitle => self.job_title = optional,
            AttendeeField::TwitterHandle => self.twitter_handle = optional,
        }
    }

    pub fn is_blank(&self) -> bool {
        self == &AttendeeRecord::default()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
}

/// A finalized booking, persisted under its reference
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    pub booking_reference: BookingReference,
    pub tier: TicketTier,
    pub attendees: Vec<AttendeeRecord>,
    pub created_at: DateTime<Utc>,
    pub status: BookingStatus,
}

impl BookingRecord {
    /// Stamp each attendee with its sub-identifier and seal the record
    pub fn confirm(
        booking_reference: BookingReference,
        tier: TicketTier,
        attendees: &[AttendeeRecord],
        created_at: DateTime<Utc>,
    ) -> Self {
        let attendees = attendees
            .iter()
            .enumerate()
            .map(|(index, attendee)| AttendeeRecord {
                ticket_id: Some(booking_reference.ticket_id(index)),
                ..attendee.clone()
            })
            .collect();

        Self {
            booking_reference,
            tier,
            attendees,
            created_at,
            status: BookingStatus::Confirmed,
        }
    }
}
