use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML generation error: {0}")]
    Xml(#[from] std::fmt::Error),
}

pub type Result<T> = std::result::Result<T, ExportError>;
