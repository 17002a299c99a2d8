use deckgen_export::ExportError;
use thiserror::Error;

/// Shown when the content round fails, whatever the cause.
pub const CONTENT_FAILED_MESSAGE: &str =
    "Something went wrong while preparing the presentation. Please try again.";

/// Shown when a document cannot be turned into text.
pub const INGEST_FAILED_MESSAGE: &str =
    "Could not read the file. Only .docx and .txt files are supported.";

/// Errors surfaced by the deck engine handle
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Deck engine is not running")]
    Closed,

    #[error("Export refused: no deck, or images are still generating")]
    ExportNotReady,

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
}

/// Document ingestion errors
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Unsupported file type: {extension}")]
    Unsupported { extension: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid .docx archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Invalid .docx XML: {0}")]
    Xml(String),

    #[error("The document contains no text")]
    Empty,
}

pub type Result<T> = std::result::Result<T, EngineError>;
