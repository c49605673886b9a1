use serde::{Deserialize, Serialize};

use crate::TicketTier;

/// Price breakdown for a selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Quote {
    pub tier: TicketTier,
    pub count: usize,
    pub unit_price_usd: u32,
    pub total_usd: u32,
}

/// Flat per-tier pricing
#[derive(Debug, Clone, Default)]
pub struct PricingEngine;

impl PricingEngine {
    pub fn new() -> Self {
        Self
    }

    /// Quote for an arbitrary number of attendees (summary screen total)
    pub fn quote_for(&self, tier: TicketTier, attendees: usize) -> Quote {
        let unit = tier.price_usd();
        Quote {
            tier,
            count: attendees,
            unit_price_usd: unit,
            total_usd: unit.saturating_mul(attendees as u32),
        }
    }
}
