use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::CatalogError;

/// Ticket tiers on sale
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TicketTier {
    Standard,
    #[serde(rename = "VIP")]
    Vip,
    Interns,
}

/// Catalogue entry shown on the selection screen
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierInfo {
    pub tier: TicketTier,
    pub price_usd: u32,
    pub description: String,
}

impl TicketTier {
    pub const ALL: [TicketTier; 3] = [TicketTier::Standard, TicketTier::Vip, TicketTier::Interns];

    pub fn label(&self) -> &'static str {
        match self {
            TicketTier::Standard => "Standard",
            TicketTier::Vip => "VIP",
            TicketTier::Interns => "Interns",
        }
    }

    /// Unit price in whole dollars
    pub fn price_usd(&self) -> u32 {
        match self {
            TicketTier::Standard => 50,
            TicketTier::Vip => 100,
            TicketTier::Interns => 10,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TicketTier::Standard => "General admission ticket.",
            TicketTier::Vip => "Access to VIP lounge & front-row seating.",
            TicketTier::Interns => "Discounted ticket for Interns (ID required).",
        }
    }

    pub fn info(&self) -> TierInfo {
        TierInfo {
            tier: *self,
            price_usd: self.price_usd(),
            description: self.description().to_string(),
        }
    }

    pub fn catalogue() -> Vec<TierInfo> {
        Self::ALL.iter().map(TicketTier::info).collect()
    }
}

impl fmt::Display for TicketTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TicketTier {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(TicketTier::Standard),
            "vip" => Ok(TicketTier::Vip),
            "interns" | "intern" => Ok(TicketTier::Interns),
            _ => Err(CatalogError::UnknownTier(s.to_string())),
        }
    }
}
