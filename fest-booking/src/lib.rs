pub mod models;
pub mod validation;
pub mod flow;
pub mod card;
pub mod export;

pub use models::{AttendeeField, AttendeeRecord, BookingRecord, BookingReference, BookingStatus};
pub use validation::ValidationErrors;
pub use flow::{BookingFlow, Effect, FlowError, FlowEvent, FlowView, Rejection, Step, TicketSelection, Transition, UploadStatus};
pub use card::{QrPayload, TicketCard};
pub use export::ExportFormat;
