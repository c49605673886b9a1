use async_trait::async_trait;
use fest_booking::{ExportFormat, TicketCard};
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Export format {0} is not supported")]
    UnsupportedFormat(ExportFormat),
    #[error("Card rendering failed: {0}")]
    Render(#[from] serde_json::Error),
    #[error("Could not write export: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes a rendered card to a file and returns where it landed
#[async_trait]
pub trait CardExporter: Send + Sync {
    async fn export(&self, card: &TicketCard, format: ExportFormat) -> Result<PathBuf, ExportError>;
}
