use serde::{Deserialize, Serialize};
use std::fmt;

/// Output formats for a downloaded card
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Svg,
    Png,
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Svg => "svg",
            ExportFormat::Png => "png",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Svg => "image/svg+xml",
            ExportFormat::Png => "image/png",
            ExportFormat::Pdf => "application/pdf",
        }
    }

    /// `{prefix}_{Full_Name}_ID.{ext}`; whitespace runs in the name become one underscore
    pub fn file_name(&self, prefix: &str, full_name: &str) -> String {
        let name = full_name.split_whitespace().collect::<Vec<_>>().join("_");
        format!("{}_{}_ID.{}", prefix, name, self.extension())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
