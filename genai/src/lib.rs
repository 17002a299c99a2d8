//! Client for the hosted generative model: deck content and slide images.

pub mod client;
pub mod error;
pub mod prompts;

pub use client::{parse_deck, GeminiClient, GenerateContentResponse};
pub use error::{GenAiError, Result};
