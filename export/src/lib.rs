//! Deck exporters.

pub mod error;
pub mod pptx;

use deckgen_common::{Deck, ImagePayload};
use std::path::{Path, PathBuf};

pub use error::{ExportError, Result};
pub use pptx::PptxExporter;

/// Longest file stem produced by [`artifact_file_name`], in characters.
pub const MAX_FILE_STEM_CHARS: usize = 80;

/// A finished, downloadable export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Artifact {
    /// Writes the artifact into `dir`, creating it if needed.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// Serializes a settled deck. Implementations must only read their inputs.
pub trait Exporter: Send + Sync {
    fn export(&self, deck: &Deck, cover: Option<&ImagePayload>) -> Result<Artifact>;
}

/// File name derived from a deck title: unsafe characters dropped,
/// whitespace runs joined with `_`, bounded length.
pub fn artifact_file_name(title: &str, extension: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| !c.is_control())
        .filter(|c| !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .collect();
    let stem: String = cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .take(MAX_FILE_STEM_CHARS)
        .collect();
    let stem = stem.trim_matches(|c| c == '.' || c == '_');
    if stem.is_empty() {
        format!("presentation.{extension}")
    } else {
        format!("{stem}.{extension}")
    }
}
