use crate::TicketTier;

/// Card colours for a tier. Only the accent differs between tiers; the card
/// layout is shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierStyle {
    pub accent_from: &'static str,
    pub accent_to: &'static str,
    pub badge_text: &'static str,
    pub pattern_stroke: &'static str,
}

const STANDARD: TierStyle = TierStyle {
    accent_from: "#9333ea",
    accent_to: "#4f46e5",
    badge_text: "#ffffff",
    pattern_stroke: "#6B46C1",
};

const VIP: TierStyle = TierStyle {
    accent_from: "#d97706",
    accent_to: "#b45309",
    badge_text: "#fffbeb",
    pattern_stroke: "#92400e",
};

const INTERNS: TierStyle = TierStyle {
    accent_from: "#059669",
    accent_to: "#0d9488",
    badge_text: "#ecfdf5",
    pattern_stroke: "#047857",
};

impl TierStyle {
    pub const fn for_tier(tier: TicketTier) -> &'static TierStyle {
        match tier {
            TicketTier::Standard => &STANDARD,
            TicketTier::Vip => &VIP,
            TicketTier::Interns => &INTERNS,
        }
    }
}
