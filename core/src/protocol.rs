use std::path::PathBuf;

use crate::state::Navigation;

/// Commands accepted by the deck engine.
#[derive(Debug, Clone)]
pub enum Op {
    /// Start a new round from raw text. Blank text is ignored.
    Begin { text: String },
    /// Extract text from a document, then start a round with it.
    Upload { path: PathBuf },
    Navigate(Navigation),
    Reset,
    Shutdown,
}

/// How the content round started by a begin or upload ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeginOutcome {
    /// Blank input; nothing happened.
    Ignored,
    /// Skeleton installed, images are being generated.
    Preview,
    /// Ingestion or content generation failed; the message is user-facing.
    Failed(String),
    /// A reset or a newer round retired this one before it resolved.
    Superseded,
}

/// What an image request was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageTarget {
    Cover,
    Slide(usize),
}
