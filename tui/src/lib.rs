//! Terminal preview of a deck while its images arrive.

pub mod preview;
pub mod view;

use anyhow::Result;
use deckgen_core::DeckEngine;
use std::path::PathBuf;

pub use preview::{DeckPreview, Source};

/// Runs the preview until the user quits.
pub async fn run_preview(engine: DeckEngine, source: Source, output_dir: PathBuf) -> Result<()> {
    let mut preview = DeckPreview::new(engine, source, output_dir);
    preview.run().await
}
