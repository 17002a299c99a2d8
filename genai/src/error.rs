use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenAiError {
    #[error("No API key configured (set GEMINI_API_KEY or api_key in the config file)")]
    MissingApiKey,

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Model API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Model response was empty")]
    EmptyResponse,

    #[error("Model response was not a valid presentation: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Model returned a presentation without slides")]
    NoSlides,
}

pub type Result<T> = std::result::Result<T, GenAiError>;
