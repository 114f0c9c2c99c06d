use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Serialize;

use crate::config::ChartFormat;

pub const MAP_CONTENT_TYPE: &str = "text/html";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RenderedArtifact {
    /// Base64-encoded image bytes.
    Chart { format: ChartFormat, payload: String },
    Map { html: String },
}

impl RenderedArtifact {
    pub fn chart(format: ChartFormat, bytes: &[u8]) -> Self {
        Self::Chart {
            format,
            payload: BASE64.encode(bytes),
        }
    }

    pub fn map(html: String) -> Self {
        Self::Map { html }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Chart { format, .. } => format.content_type(),
            Self::Map { .. } => MAP_CONTENT_TYPE,
        }
    }

    pub fn file_name(&self) -> String {
        match self {
            Self::Chart { format, .. } => format!("chart.{}", format.extension()),
            Self::Map { .. } => "map.html".to_string(),
        }
    }

    /// The string carried in the response body: base64 for charts, markup
    /// for maps.
    pub fn payload(&self) -> &str {
        match self {
            Self::Chart { payload, .. } => payload,
            Self::Map { html } => html,
        }
    }

    pub fn bytes(&self) -> Result<Vec<u8>> {
        match self {
            Self::Chart { payload, .. } => BASE64
                .decode(payload)
                .context("chart payload is not valid base64"),
            Self::Map { html } => Ok(html.as_bytes().to_vec()),
        }
    }

    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output dir {}", dir.display()))?;
        let path = dir.join(self.file_name());
        fs::write(&path, self.bytes()?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::RenderedArtifact;
    use crate::config::ChartFormat;

    #[test]
    fn chart_payload_is_base64_and_decodes_on_save() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let artifact = RenderedArtifact::chart(ChartFormat::Svg, b"<svg/>");
        assert_eq!(artifact.payload(), "PHN2Zy8+");
        assert_eq!(artifact.content_type(), "image/svg+xml");

        let path = artifact.write_to(&temp.path().join("out"))?;
        assert!(path.ends_with("chart.svg"));
        assert_eq!(std::fs::read(path)?, b"<svg/>");
        Ok(())
    }

    #[test]
    fn map_is_written_as_html() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let artifact = RenderedArtifact::map("<html></html>".to_string());
        assert_eq!(artifact.content_type(), "text/html");
        let path = artifact.write_to(temp.path())?;
        assert_eq!(std::fs::read_to_string(path)?, "<html></html>");
        Ok(())
    }
}
