use chrono::{DateTime, Utc};
use fest_catalog::{EventDetails, PricingEngine, Quote, TicketCount, TicketTier};
use fest_shared::models::events::{
    AvatarUploadFailedEvent, AvatarUploadedEvent, BookingConfirmedEvent, BookingResetEvent,
    PersistenceFailedEvent,
};
use fest_shared::{FlowNotice, Masked};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};

use crate::card::TicketCard;
use crate::models::{AttendeeField, AttendeeRecord, BookingRecord, BookingReference};
use crate::validation::ValidationErrors;

const DISCARDED_UPLOAD: &str = "Upload finished after the booking moved on; the photo was not attached";

/// Stage of the booking flow
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Selecting,
    Detailing,
    Reviewing,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Selecting => "SELECTING",
            Step::Detailing => "DETAILING",
            Step::Reviewing => "REVIEWING",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TicketSelection {
    pub tier: TicketTier,
    pub count: TicketCount,
}

/// Avatar upload state of one attendee slot. Absent means idle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum UploadStatus {
    Uploading,
    Failed(String),
}

/// Inputs to the flow
#[derive(Debug, Clone, PartialEq)]
pub enum FlowEvent {
    Select(TicketSelection),
    ChangeCount(TicketCount),
    EditField {
        index: usize,
        field: AttendeeField,
        value: String,
    },
    /// Several fields of one attendee, applied together or not at all
    EditFields {
        index: usize,
        changes: BTreeMap<AttendeeField, String>,
    },
    AvatarUploadStarted {
        index: usize,
    },
    AvatarUploadFinished {
        index: usize,
        reference: BookingReference,
        result: Result<String, String>,
    },
    Submit {
        at: DateTime<Utc>,
    },
    PersistenceSucceeded,
    PersistenceFailed {
        message: String,
    },
    Back,
    NewBooking,
}

impl FlowEvent {
    pub fn name(&self) -> &'static str {
        match self {
            FlowEvent::Select(_) => "SELECT",
            FlowEvent::ChangeCount(_) => "CHANGE_COUNT",
            FlowEvent::EditField { .. } => "EDIT_FIELD",
            FlowEvent::EditFields { .. } => "EDIT_FIELDS",
            FlowEvent::AvatarUploadStarted { .. } => "AVATAR_UPLOAD_STARTED",
            FlowEvent::AvatarUploadFinished { .. } => "AVATAR_UPLOAD_FINISHED",
            FlowEvent::Submit { .. } => "SUBMIT",
            FlowEvent::PersistenceSucceeded => "PERSISTENCE_SUCCEEDED",
            FlowEvent::PersistenceFailed { .. } => "PERSISTENCE_FAILED",
            FlowEvent::Back => "BACK",
            FlowEvent::NewBooking => "NEW_BOOKING",
        }
    }
}

/// Work the owner of the flow must carry out after a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Write the record, then feed back `PersistenceSucceeded` or `PersistenceFailed`
    Persist(BookingRecord),
    Notify(FlowNotice),
}

#[derive(Debug)]
pub struct Transition {
    pub flow: BookingFlow,
    pub effects: Vec<Effect>,
}

/// A refused event. `flow` is the flow as it stood, plus any field errors
/// the refusal produced.
#[derive(Debug)]
pub struct Rejection {
    pub flow: BookingFlow,
    pub error: FlowError,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FlowError {
    #[error("Invalid transition: {event} not allowed while {from}")]
    InvalidTransition {
        from: Step,
        event: &'static str,
    },

    #[error("Attendee {index} does not exist (booking has {count})")]
    AttendeeOutOfRange {
        index: usize,
        count: usize,
    },

    #[error("{} field(s) failed validation", .0.len())]
    Validation(ValidationErrors),

    #[error("Booking could not be saved: {0}")]
    Persistence(String),

    #[error("A booking save is already in progress")]
    SavePending,

    #[error("Avatar upload for attendee {index} is still running")]
    UploadInProgress {
        index: usize,
    },
}

/// The booking flow controller. Owned by value: every event consumes the
/// flow and hands back the next one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingFlow {
    step: Step,
    reference: BookingReference,
    selection: Option<TicketSelection>,
    attendees: Vec<AttendeeRecord>,
    /// Slots cut off by a count decrease; `stash[i]` belonged to index `attendees.len() + i`
    #[serde(default)]
    stash: Vec<AttendeeRecord>,
    #[serde(default)]
    errors: ValidationErrors,
    #[serde(default)]
    uploads: BTreeMap<usize, UploadStatus>,
    /// Record awaiting its write; never mirrored, a restart drops an unfinished save
    #[serde(skip)]
    pending: Option<BookingRecord>,
    #[serde(default)]
    confirmed: Option<BookingRecord>,
}

/// Read-only snapshot handed to views
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlowView {
    pub step: Step,
    pub booking_reference: BookingReference,
    pub selection: Option<TicketSelection>,
    pub quote: Option<Quote>,
    pub attendees: Vec<AttendeeRecord>,
    pub errors: ValidationErrors,
    pub uploads: BTreeMap<usize, UploadStatus>,
    pub confirmed: Option<BookingRecord>,
}

impl Default for BookingFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl BookingFlow {
    pub fn new() -> Self {
        Self::with_reference(BookingReference::generate())
    }

    pub fn with_reference(reference: BookingReference) -> Self {
        Self {
            step: Step::Selecting,
            reference,
            selection: None,
            attendees: vec![AttendeeRecord::default()],
            stash: Vec::new(),
            errors: ValidationErrors::new(),
            uploads: BTreeMap::new(),
            pending: None,
            confirmed: None,
        }
    }

    /// Ready a mirrored flow for use after a restart. Uploads that were in
    /// flight died with the old process.
    pub fn resume(mut self) -> Self {
        self.uploads.retain(|_, status| *status != UploadStatus::Uploading);
        self
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn reference(&self) -> &BookingReference {
        &self.reference
    }

    pub fn selection(&self) -> Option<&TicketSelection> {
        self.selection.as_ref()
    }

    pub fn attendees(&self) -> &[AttendeeRecord] {
        &self.attendees
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn upload_status(&self, index: usize) -> Option<&UploadStatus> {
        self.uploads.get(&index)
    }

    pub fn confirmed(&self) -> Option<&BookingRecord> {
        self.confirmed.as_ref()
    }

    pub fn is_save_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn view(&self) -> FlowView {
        let pricing = PricingEngine::new();
        FlowView {
            step: self.step,
            booking_reference: self.reference.clone(),
            selection: self.selection,
            quote: self
                .selection
                .map(|s| pricing.quote_for(s.tier, self.attendees.len())),
            attendees: self.attendees.clone(),
            errors: self.errors.clone(),
            uploads: self.uploads.clone(),
            confirmed: self.confirmed.clone(),
        }
    }

    /// Card for one confirmed attendee. Only available on the summary screen.
    pub fn card(&self, index: usize, event: &EventDetails) -> Result<TicketCard, FlowError> {
        let record = match (&self.step, &self.confirmed) {
            (Step::Reviewing, Some(record)) => record,
            _ => {
                return Err(FlowError::InvalidTransition {
                    from: self.step,
                    event: "RENDER_CARD",
                })
            }
        };
        let attendee = record.attendees.get(index).ok_or(FlowError::AttendeeOutOfRange {
            index,
            count: record.attendees.len(),
        })?;
        Ok(TicketCard::new(
            attendee.clone(),
            index,
            record.tier,
            record.booking_reference.clone(),
            event.clone(),
        ))
    }

    pub fn apply(self, event: FlowEvent) -> Result<Transition, Rejection> {
        if self.pending.is_some()
            && !matches!(
                event,
                FlowEvent::PersistenceSucceeded | FlowEvent::PersistenceFailed { .. }
            )
        {
            return Err(self.reject(FlowError::SavePending));
        }

        debug!(step = %self.step, event = event.name(), reference = %self.reference, "Applying flow event");

        match (self.step, event) {
            (Step::Selecting, FlowEvent::Select(selection)) => Ok(self.select(selection)),
            (Step::Detailing, FlowEvent::ChangeCount(count)) => Ok(self.change_count(count)),
            (Step::Detailing, FlowEvent::EditField { index, field, value }) => {
                self.edit_fields(index, BTreeMap::from([(field, value)]))
            }
            (Step::Detailing, FlowEvent::EditFields { index, changes }) => self.edit_fields(index, changes),
            (Step::Detailing, FlowEvent::AvatarUploadStarted { index }) => self.start_upload(index),
            (_, FlowEvent::AvatarUploadFinished { index, reference, result }) => {
                Ok(self.finish_upload(index, reference, result))
            }
            (Step::Detailing, FlowEvent::Submit { at }) => self.submit(at),
            (Step::Detailing, FlowEvent::PersistenceSucceeded) if self.pending.is_some() => {
                Ok(self.confirm())
            }
            (Step::Detailing, FlowEvent::PersistenceFailed { message }) if self.pending.is_some() => {
                Err(self.persistence_failed(message))
            }
            (Step::Detailing, FlowEvent::Back) => Ok(self.back_to_selection()),
            (Step::Reviewing, FlowEvent::Back) => Ok(self.back_to_details()),
            (Step::Reviewing, FlowEvent::NewBooking) => Ok(self.new_booking()),
            (from, event) => Err(Rejection {
                flow: self,
                error: FlowError::InvalidTransition {
                    from,
                    event: event.name(),
                },
            }),
        }
    }

    // Selecting → Detailing
    fn select(mut self, selection: TicketSelection) -> Transition {
        info!(
            reference = %self.reference,
            tier = %selection.tier,
            count = %selection.count,
            "Ticket selection made"
        );
        self.selection = Some(selection);
        self.resize(selection.count.get());
        self.step = Step::Detailing;
        Transition::quiet(self)
    }

    fn change_count(mut self, count: TicketCount) -> Transition {
        if let Some(selection) = self.selection.as_mut() {
            selection.count = count;
        }
        self.resize(count.get());
        Transition::quiet(self)
    }

    /// Grow or shrink the attendee list to `count`, keeping entries by index.
    /// Shrinking stashes the tail so a later grow in the same session gets it back.
    fn resize(&mut self, count: usize) {
        let len = self.attendees.len();
        if count < len {
            let mut tail = self.attendees.split_off(count);
            tail.append(&mut self.stash);
            self.stash = tail;
        } else if count > len {
            let wanted = count - len;
            let restored = wanted.min(self.stash.len());
            self.attendees.extend(self.stash.drain(..restored));
            self.attendees.resize_with(count, AttendeeRecord::default);
        }
        self.errors.truncate(count);
        self.uploads.retain(|index, _| *index < count);
    }

    fn edit_fields(
        mut self,
        index: usize,
        changes: BTreeMap<AttendeeField, String>,
    ) -> Result<Transition, Rejection> {
        if index >= self.attendees.len() {
            let count = self.attendees.len();
            return Err(self.reject(FlowError::AttendeeOutOfRange { index, count }));
        }

        for (field, value) in changes {
            let attendee = &mut self.attendees[index];
            attendee.set(field, value);
            let current = attendee.get(field).map(str::to_owned);
            self.errors.refresh(index, field, current.as_deref());

            if field == AttendeeField::AvatarUrl {
                self.uploads.remove(&index);
            }
        }
        Ok(Transition::quiet(self))
    }

    fn start_upload(mut self, index: usize) -> Result<Transition, Rejection> {
        if index >= self.attendees.len() {
            let count = self.attendees.len();
            return Err(self.reject(FlowError::AttendeeOutOfRange { index, count }));
        }
        self.uploads.insert(index, UploadStatus::Uploading);
        Ok(Transition::quiet(self))
    }

    // Results for a superseded booking, a shrunk slot or a flow that has
    // already moved on are not applied; the uploader still hears about it
    // through a failure notice. Otherwise the last write to the avatar wins.
    fn finish_upload(
        mut self,
        index: usize,
        reference: BookingReference,
        result: Result<String, String>,
    ) -> Transition {
        if reference != self.reference || self.step != Step::Detailing || index >= self.attendees.len() {
            debug!(
                reference = %reference,
                current = %self.reference,
                index,
                "Discarding stale avatar upload result"
            );
            let notice = FlowNotice::AvatarUploadFailed(AvatarUploadFailedEvent {
                booking_reference: reference.to_string(),
                attendee_index: index,
                message: DISCARDED_UPLOAD.to_string(),
                timestamp: Utc::now().timestamp(),
            });
            return Transition {
                flow: self,
                effects: vec![Effect::Notify(notice)],
            };
        }

        let timestamp = Utc::now().timestamp();
        let notice = match result {
            Ok(url) => {
                self.attendees[index].avatar_url = Some(url.clone());
                self.uploads.remove(&index);
                FlowNotice::AvatarUploaded(AvatarUploadedEvent {
                    booking_reference: self.reference.to_string(),
                    attendee_index: index,
                    url,
                    timestamp,
                })
            }
            Err(message) => {
                warn!(reference = %self.reference, index, "Avatar upload failed: {}", message);
                self.uploads.insert(index, UploadStatus::Failed(message.clone()));
                FlowNotice::AvatarUploadFailed(AvatarUploadFailedEvent {
                    booking_reference: self.reference.to_string(),
                    attendee_index: index,
                    message,
                    timestamp,
                })
            }
        };
        Transition {
            flow: self,
            effects: vec![Effect::Notify(notice)],
        }
    }

    // All-or-nothing: any invalid attendee keeps the flow in Detailing.
    fn submit(mut self, at: DateTime<Utc>) -> Result<Transition, Rejection> {
        let uploading = self
            .uploads
            .iter()
            .find_map(|(index, status)| (*status == UploadStatus::Uploading).then_some(*index));
        if let Some(index) = uploading {
            return Err(self.reject(FlowError::UploadInProgress { index }));
        }

        let errors = ValidationErrors::collect(&self.attendees);
        if !errors.is_empty() {
            info!(reference = %self.reference, failures = errors.len(), "Submission rejected by validation");
            self.errors = errors.clone();
            return Err(self.reject(FlowError::Validation(errors)));
        }
        self.errors = ValidationErrors::new();

        let Some(selection) = self.selection else {
            return Err(self.reject(FlowError::InvalidTransition {
                from: Step::Detailing,
                event: "SUBMIT",
            }));
        };

        let record = BookingRecord::confirm(self.reference.clone(), selection.tier, &self.attendees, at);
        for attendee in &record.attendees {
            debug!(
                ticket_id = attendee.ticket_id.as_deref().unwrap_or_default(),
                email = %Masked(attendee.email.as_str()),
                "Ticket issued"
            );
        }
        self.pending = Some(record.clone());
        Ok(Transition {
            flow: self,
            effects: vec![Effect::Persist(record)],
        })
    }

    // Detailing → Reviewing, once the record is durable
    fn confirm(mut self) -> Transition {
        let Some(record) = self.pending.take() else {
            return Transition::quiet(self);
        };
        info!(
            reference = %record.booking_reference,
            tier = %record.tier,
            attendees = record.attendees.len(),
            "Booking confirmed"
        );
        let notice = FlowNotice::BookingConfirmed(BookingConfirmedEvent {
            booking_reference: record.booking_reference.to_string(),
            tier: record.tier.to_string(),
            attendee_count: record.attendees.len(),
            timestamp: record.created_at.timestamp(),
        });
        self.attendees = record.attendees.clone();
        self.stash.clear();
        self.uploads.clear();
        self.confirmed = Some(record);
        self.step = Step::Reviewing;
        Transition {
            flow: self,
            effects: vec![Effect::Notify(notice)],
        }
    }

    fn persistence_failed(mut self, message: String) -> Rejection {
        self.pending = None;
        Rejection {
            flow: self,
            error: FlowError::Persistence(message),
        }
    }

    // Detailing → Selecting: attendee data for the abandoned choice is dropped
    fn back_to_selection(mut self) -> Transition {
        let count = self.selection.map(|s| s.count.get()).unwrap_or(1);
        self.attendees = vec![AttendeeRecord::default(); count];
        self.stash.clear();
        self.errors = ValidationErrors::new();
        self.uploads.clear();
        self.confirmed = None;
        self.step = Step::Selecting;
        Transition::quiet(self)
    }

    // Reviewing → Detailing: everything entered stays as it was
    fn back_to_details(mut self) -> Transition {
        self.step = Step::Detailing;
        Transition::quiet(self)
    }

    // Reviewing → Selecting with a fresh reference
    fn new_booking(self) -> Transition {
        let previous = self.reference;
        let next = BookingFlow::with_reference(BookingReference::generate_after(&previous));
        info!(previous = %previous, reference = %next.reference, "New booking started");
        let notice = FlowNotice::BookingReset(BookingResetEvent {
            previous_reference: previous.to_string(),
            booking_reference: next.reference.to_string(),
            timestamp: Utc::now().timestamp(),
        });
        Transition {
            flow: next,
            effects: vec![Effect::Notify(notice)],
        }
    }

    fn reject(self, error: FlowError) -> Rejection {
        Rejection { flow: self, error }
    }
}

impl Transition {
    fn quiet(flow: BookingFlow) -> Self {
        Self {
            flow,
            effects: Vec::new(),
        }
    }

    pub fn persist_request(&self) -> Option<&BookingRecord> {
        self.effects.iter().find_map(|effect| match effect {
            Effect::Persist(record) => Some(record),
            Effect::Notify(_) => None,
        })
    }

    pub fn notices(&self) -> impl Iterator<Item = &FlowNotice> {
        self.effects.iter().filter_map(|effect| match effect {
            Effect::Notify(notice) => Some(notice),
            Effect::Persist(_) => None,
        })
    }
}

impl Rejection {
    /// Notice to broadcast for this refusal, if it is one users should hear about
    pub fn notice(&self) -> Option<FlowNotice> {
        match &self.error {
            FlowError::Persistence(message) => Some(FlowNotice::PersistenceFailed(PersistenceFailedEvent {
                booking_reference: self.flow.reference.to_string(),
                message: message.clone(),
                timestamp: Utc::now().timestamp(),
            })),
            _ => None,
        }
    }
}
