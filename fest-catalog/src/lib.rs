pub mod tier;
pub mod pricing;
pub mod count;
pub mod style;
pub mod event;

pub use tier::{TicketTier, TierInfo};
pub use pricing::{Quote, PricingEngine};
pub use count::{TicketCount, MAX_TICKETS, MIN_TICKETS};
pub use style::TierStyle;
pub use event::EventDetails;

/// Catalog-related errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("Unknown ticket tier: {0}")]
    UnknownTier(String),

    #[error("Ticket count {requested} outside {min}..={max}")]
    CountOutOfRange {
        requested: i64,
        min: u8,
        max: u8,
    },
}
