use serde::{Deserialize, Serialize};
use std::fmt;

use crate::CatalogError;

pub const MIN_TICKETS: u8 = 1;
pub const MAX_TICKETS: u8 = 10;

/// Number of tickets in one booking, always within `MIN_TICKETS..=MAX_TICKETS`
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct TicketCount(u8);

impl TicketCount {
    pub const ONE: TicketCount = TicketCount(1);

    pub fn new(requested: i64) -> Result<Self, CatalogError> {
        if requested < MIN_TICKETS as i64 || requested > MAX_TICKETS as i64 {
            return Err(CatalogError::CountOutOfRange {
                requested,
                min: MIN_TICKETS,
                max: MAX_TICKETS,
            });
        }
        Ok(Self(requested as u8))
    }

    pub fn get(&self) -> usize {
        self.0 as usize
    }
}

impl Default for TicketCount {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for TicketCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Out-of-range counts must not sneak in through a draft file or request body.
impl<'de> Deserialize<'de> for TicketCount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = i64::deserialize(deserializer)?;
        TicketCount::new(raw).map_err(serde::de::Error::custom)
    }
}
