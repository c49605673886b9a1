use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{AttendeeField, AttendeeRecord};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9\s().-]{7,20}$").expect("phone pattern compiles"));

pub const MIN_NAME_CHARS: usize = 2;

/// Check one field. Required rules run before format rules and the first
/// failing rule wins.
/// Format rules see the value as given, so padded input fails them.
pub fn validate_field(field: AttendeeField, value: Option<&str>) -> Option<&'static str> {
    let raw = value.unwrap_or("");
    let value = raw.trim();
    match field {
        AttendeeField::FullName => {
            if value.is_empty() {
                Some("Full name is required")
            } else if value.chars().count() < MIN_NAME_CHARS {
                Some("Full name must be at least 2 characters")
            } else {
                None
            }
        }
        AttendeeField::Email => {
            if value.is_empty() {
                Some("Email is required")
            } else if !EMAIL_RE.is_match(raw) {
                Some("Please enter a valid email address")
            } else {
                None
            }
        }
        AttendeeField::Phone => {
            if !value.is_empty() && !PHONE_RE.is_match(raw) {
                Some("Please enter a valid phone number")
            } else {
                None
            }
        }
        AttendeeField::AvatarUrl
        | AttendeeField::Company
        | AttendeeField::JobTitle
        | AttendeeField::TwitterHandle => None,
    }
}

const CHECKED_FIELDS: [AttendeeField; 3] = [AttendeeField::FullName, AttendeeField::Email, AttendeeField::Phone];

pub fn validate_attendee(attendee: &AttendeeRecord) -> BTreeMap<AttendeeField, String> {
    CHECKED_FIELDS
        .iter()
        .filter_map(|field| {
            validate_field(*field, attendee.get(*field)).map(|message| (*field, message.to_string()))
        })
        .collect()
}

/// Field errors keyed by attendee index, then field name
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<usize, BTreeMap<AttendeeField, String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exhaustive check over every attendee
    pub fn collect(attendees: &[AttendeeRecord]) -> Self {
        let errors = attendees
            .iter()
            .enumerate()
            .map(|(index, attendee)| (index, validate_attendee(attendee)))
            .filter(|(_, fields)| !fields.is_empty())
            .collect();
        Self(errors)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of failing fields
    pub fn len(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    pub fn get(&self, index: usize, field: AttendeeField) -> Option<&str> {
        self.0.get(&index).and_then(|fields| fields.get(&field)).map(String::as_str)
    }

    pub fn for_attendee(&self, index: usize) -> Option<&BTreeMap<AttendeeField, String>> {
        self.0.get(&index)
    }

    /// Re-check a single field after an edit, clearing its error once valid
    pub fn refresh(&mut self, index: usize, field: AttendeeField, value: Option<&str>) {
        match validate_field(field, value) {
            Some(message) => {
                self.0.entry(index).or_default().insert(field, message.to_string());
            }
            None => {
                if let Some(fields) = self.0.get_mut(&index) {
                    fields.remove(&field);
                    if fields.is_empty() {
                        self.0.remove(&index);
                    }
                }
            }
        }
    }

    /// Drop errors for attendee slots at or beyond `len`
    pub fn truncate(&mut self, len: usize) {
        self.0.retain(|index, _| *index < len);
    }
}
