use fest_catalog::{EventDetails, TicketTier, TierStyle};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::export::ExportFormat;
use crate::models::{AttendeeRecord, BookingReference};

pub const CARD_WIDTH: u32 = 400;
pub const CARD_HEIGHT: u32 = 250;

/// Data encoded in the card's QR code
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QrPayload {
    pub booking_ref: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "type")]
    pub tier: TicketTier,
    pub event: String,
    pub date: String,
    pub venue: String,
    pub ticket_id: String,
}

/// ID card for one confirmed attendee
#[derive(Debug, Clone, PartialEq)]
pub struct TicketCard {
    attendee: AttendeeRecord,
    index: usize,
    tier: TicketTier,
    reference: BookingReference,
    event: EventDetails,
}

impl TicketCard {
    pub fn new(
        attendee: AttendeeRecord,
        index: usize,
        tier: TicketTier,
        reference: BookingReference,
        event: EventDetails,
    ) -> Self {
        Self {
            attendee,
            index,
            tier,
            reference,
            event,
        }
    }

    pub fn ticket_id(&self) -> String {
        self.attendee
            .ticket_id
            .clone()
            .unwrap_or_else(|| self.reference.ticket_id(self.index))
    }

    pub fn qr_payload(&self) -> QrPayload {
        QrPayload {
            booking_ref: self.reference.to_string(),
            name: self.attendee.full_name.clone(),
            email: self.attendee.email.clone(),
            tier: self.tier,
            event: self.event.name.clone(),
            date: self.event.date.clone(),
            venue: self.event.venue.clone(),
            ticket_id: self.ticket_id(),
        }
    }

    pub fn qr_data(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.qr_payload())
    }

    pub fn file_name(&self, format: ExportFormat) -> String {
        format.file_name(&self.event.file_prefix, &self.attendee.full_name)
    }

    /// Standalone SVG document for download and printing
    pub fn render_svg(&self) -> Result<String, serde_json::Error> {
        let style = TierStyle::for_tier(self.tier);
        let qr = self.qr_data()?;
        let a = &self.attendee;
        let mut svg = String::with_capacity(4096);

        // Writing into a String cannot fail.
        let _ = write!(
            svg,
            r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="Inter, sans-serif">
<title>{title}</title>
<metadata id="qr-payload">{qr}</metadata>
<defs>
<linearGradient id="bg" x1="0" y1="0" x2="1" y2="1"><stop offset="0%" stop-color="#f3e8ff"/><stop offset="100%" stop-color="#e0e7ff"/></linearGradient>
<linearGradient id="accent" x1="0" y1="0" x2="1" y2="0"><stop offset="0%" stop-color="{from}"/><stop offset="100%" stop-color="{to}"/></linearGradient>
<pattern id="grid" patternUnits="userSpaceOnUse" width="40" height="40"><path d="M0 40L40 0M40 40L0 0" stroke="{stroke}" stroke-width="1" fill="none" opacity="0.08"/></pattern>
<clipPath id="photo"><circle cx="70" cy="112" r="36"/></clipPath>
</defs>
<rect width="{w}" height="{h}" rx="12" fill="url(#bg)"/>
<rect width="{w}" height="{h}" rx="12" fill="url(#grid)"/>
<rect width="{w}" height="56" fill="url(#accent)"/>
<text x="16" y="26" font-size="16" font-weight="700" fill="{badge}">{event}</text>
<text x="16" y="44" font-size="10" fill="{badge}">{tagline}</text>
<text x="{badge_x}" y="34" font-size="12" font-weight="700" fill="{badge}" text-anchor="end">{tier}</text>
"##,
            w = CARD_WIDTH,
            h = CARD_HEIGHT,
            title = escape_xml(&format!("{} - {}", self.event.name, self.ticket_id())),
            qr = escape_xml(&qr),
            from = style.accent_from,
            to = style.accent_to,
            stroke = style.pattern_stroke,
            badge = style.badge_text,
            event = escape_xml(&self.event.name),
            tagline = escape_xml(&self.event.tagline),
            badge_x = CARD_WIDTH - 16,
            tier = escape_xml(self.tier.label()),
        );

        match a.avatar_url.as_deref() {
            Some(url) => {
                let _ = writeln!(
                    svg,
                    r#"<image x="34" y="76" width="72" height="72" clip-path="url(#photo)" preserveAspectRatio="xMidYMid slice" xlink:href="{}" href="{}"/>"#,
                    escape_xml(url),
                    escape_xml(url),
                );
            }
            None => {
                let _ = writeln!(
                    svg,
                    r#"<circle cx="70" cy="112" r="36" fill="{}"/><text x="70" y="124" font-size="32" font-weight="700" fill="{}" text-anchor="middle">{}</text>"#,
                    style.accent_from,
                    style.badge_text,
                    escape_xml(&initial(&a.full_name)),
                );
            }
        }

        // QR image rendering is left to the printing client; the payload is in <metadata>.
        let _ = writeln!(
            svg,
            r##"<rect x="40" y="158" width="60" height="60" fill="#ffffff" stroke="{}" stroke-dasharray="3 2"/><text x="70" y="192" font-size="9" fill="#6b7280" text-anchor="middle">QR</text>"##,
            style.pattern_stroke,
        );

        let mut y = 88;
        let mut detail = |label: &str, value: &str, svg: &mut String| {
            let _ = writeln!(
                svg,
                r##"<text x="130" y="{}" font-size="9" fill="#6b7280">{}</text><text x="130" y="{}" font-size="13" font-weight="600" fill="#111827">{}</text>"##,
                y,
                escape_xml(label),
                y + 15,
                escape_xml(value),
            );
            y += 34;
        };
        detail("Name", &a.full_name, &mut svg);
        detail("Email", &a.email, &mut svg);
        if let Some(company) = a.company.as_deref() {
            detail("Company/School", company, &mut svg);
        }
        if let Some(job_title) = a.job_title.as_deref() {
            detail("Job Title", job_title, &mut svg);
        }

        let _ = write!(
            svg,
            r##"<text x="{right}" y="220" font-size="8" fill="#9ca3af" text-anchor="end">{address}</text>
<line x1="0" y1="226" x2="{w}" y2="226" stroke="#d1d5db" stroke-dasharray="4 3"/>
<text x="16" y="242" font-size="10" font-family="monospace" fill="#6b7280">#{ticket}</text>
<text x="{right}" y="242" font-size="10" fill="#6b7280" text-anchor="end">{venue} • {date}</text>
</svg>
"##,
            w = CARD_WIDTH,
            ticket = escape_xml(&self.ticket_id()),
            right = CARD_WIDTH - 16,
            venue = escape_xml(&self.event.venue),
            address = escape_xml(&self.event.address),
            date = escape_xml(&self.event.date),
        );

        Ok(svg)
    }
}

fn initial(full_name: &str) -> String {
    full_name
        .trim()
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_else(|| "?".to_string())
}

fn escape_xml(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
