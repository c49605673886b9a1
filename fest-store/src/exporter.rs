use async_trait::async_trait;
use fest_booking::{ExportFormat, TicketCard};
use fest_core::{CardExporter, ExportError};
use std::path::PathBuf;
use tracing::info;

/// Writes cards as SVG documents into one directory. Raster and PDF
/// output are not produced here.
#[derive(Debug, Clone)]
pub struct SvgFileExporter {
    export_dir: PathBuf,
}

impl SvgFileExporter {
    pub fn new(export_dir: impl Into<PathBuf>) -> Self {
        Self {
            export_dir: export_dir.into(),
        }
    }
}

#[async_trait]
impl CardExporter for SvgFileExporter {
    async fn export(&self, card: &TicketCard, format: ExportFormat) -> Result<PathBuf, ExportError> {
        if format != ExportFormat::Svg {
            return Err(ExportError::UnsupportedFormat(format));
        }

        let svg = card.render_svg()?;
        tokio::fs::create_dir_all(&self.export_dir).await?;
        let path = self.export_dir.join(card.file_name(format));
        tokio::fs::write(&path, svg).await?;

        info!("Exported {} to {}", card.ticket_id(), path.display());
        Ok(path)
    }
}
