use serde::{Deserialize, Serialize};

/// The event the tickets are for. Printed on every card and embedded in the
/// QR payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EventDetails {
    pub name: String,
    pub tagline: String,
    pub date: String,
    pub venue: String,
    pub address: String,
    /// Prefix for exported file names, e.g. `HNG2025`
    pub file_prefix: String,
}

impl Default for EventDetails {
    fn default() -> Self {
        Self {
            name: "HNG FEST 2025".to_string(),
            tagline: "Africa's Biggest Tech Festival".to_string(),
            date: "July 15, 2025".to_string(),
            venue: "Eko Hotel & Suites, Lagos".to_string(),
            address: "1415 Adetokunbo Ademola Street, Victoria Island, Lagos".to_string(),
            file_prefix: "HNG2025".to_string(),
        }
    }
}
