use deckgen_common::{Deck, DeckgenConfig, ImagePayload};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::{GenAiError, Result};
use crate::prompts::{content_prompt, image_prompt, presentation_schema};

#[derive(Debug, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(default = "default_mime")]
    pub mime_type: String,
    pub data: String,
}

fn default_mime() -> String {
    "image/png".to_string()
}

impl GenerateContentResponse {
    fn first_parts(&self) -> &[Part] {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .unwrap_or_default()
    }

    /// Concatenated text parts of the first candidate.
    pub fn text(&self) -> String {
        self.first_parts()
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect()
    }

    /// First inline image of the first candidate that decodes cleanly.
    pub fn image(&self) -> Option<ImagePayload> {
        self.first_parts().iter().find_map(|p| {
            let inline = p.inline_data.as_ref()?;
            match ImagePayload::from_base64(&inline.mime_type, &inline.data) {
                Ok(payload) if !payload.is_empty() => Some(payload),
                Ok(_) => None,
                Err(e) => {
                    warn!("discarding undecodable inline image: {e}");
                    None
                }
            }
        })
    }
}

/// Parses the content model's JSON answer into a deck skeleton.
pub fn parse_deck(output: &str) -> Result<Deck> {
    let trimmed = strip_code_fence(output.trim());
    if trimmed.is_empty() {
        return Err(GenAiError::EmptyResponse);
    }
    let deck: Deck = serde_json::from_str(trimmed)?;
    if deck.slides.is_empty() {
        return Err(GenAiError::NoSlides);
    }
    Ok(deck.into_skeleton())
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Minimal client for the Gemini `generateContent` REST endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
    pub content_model: String,
    pub image_model: String,
    max_input_chars: usize,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        let defaults = DeckgenConfig::default();
        Self {
            http: reqwest::Client::new(),
            api_key,
            api_base: defaults.api_base,
            content_model: defaults.content_model,
            image_model: defaults.image_model,
            max_input_chars: defaults.max_input_chars,
        }
    }

    pub fn from_config(config: &DeckgenConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(GenAiError::MissingApiKey)?;
        Ok(Self {
            http: reqwest::Client::new(),
            api_key,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            content_model: config.content_model.clone(),
            image_model: config.image_model.clone(),
            max_input_chars: config.max_input_chars,
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Content round: raw text in, deck skeleton out.
    pub async fn generate_presentation(&self, text: &str) -> Result<Deck> {
        let prompt = content_prompt(text, self.max_input_chars);
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": presentation_schema(),
            },
        });
        let response = self.generate(&self.content_model, &body).await?;
        parse_deck(&response.text())
    }

    /// One illustration. `Ok(None)` when the model answered without an image.
    pub async fn generate_image(&self, prompt: &str) -> Result<Option<ImagePayload>> {
        let body = json!({
            "contents": [{ "parts": [{ "text": image_prompt(prompt) }] }],
        });
        let response = self.generate(&self.image_model, &body).await?;
        Ok(response.image())
    }

    async fn generate(&self, model: &str, body: &Value) -> Result<GenerateContentResponse> {
        let url = format!("{}/models/{}:generateContent", self.api_base, model);
        debug!("POST {url}");

        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!("model http {status}: {body}");
            return Err(GenAiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(resp.json::<GenerateContentResponse>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DECK_JSON: &str = r##"{"mainTitle":"T","subtitle":"S","themeColor":"#000000","coverImagePrompt":"c","slides":[{"title":"A","layout":"steps","description":"a","content":[]}]}"##;

    #[test]
    fn parse_deck_accepts_fenced_json() {
        let fenced = format!("```json\n{DECK_JSON}\n```");
        let deck = parse_deck(&fenced).unwrap();
        assert_eq!(deck.main_title, "T");
        assert_eq!(deck.slide_count(), 1);
    }

    #[test]
    fn parse_deck_rejects_empty_and_garbage() {
        assert!(matches!(parse_deck("   "), Err(GenAiError::EmptyResponse)));
        assert!(matches!(parse_deck("not json"), Err(GenAiError::Malformed(_))));
        let no_slides = r#"{"mainTitle":"T","slides":[]}"#;
        assert!(matches!(parse_deck(no_slides), Err(GenAiError::NoSlides)));
    }

    #[test]
    fn response_text_joins_parts() {
        let resp: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "{\"a\":" }, { "text": "1}" }] } }]
        }))
        .unwrap();
        assert_eq!(resp.text(), "{\"a\":1}");
    }

    #[test]
    fn response_image_skips_text_and_bad_parts() {
        let resp: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [
                { "text": "here you go" },
                { "inlineData": { "mimeType": "image/png", "data": "!!!" } },
                { "inlineData": { "mimeType": "image/jpeg", "data": "AQID" } }
            ] } }]
        }))
        .unwrap();
        let image = resp.image().unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(&image.bytes[..], &[1, 2, 3]);
    }

    #[test]
    fn empty_response_has_no_image_or_text() {
        let resp = GenerateContentResponse::default();
        assert_eq!(resp.text(), "");
        assert!(resp.image().is_none());
    }

    #[test]
    fn from_config_requires_api_key() {
        let config = DeckgenConfig::default();
        assert!(matches!(
            GeminiClient::from_config(&config),
            Err(GenAiError::MissingApiKey)
        ));
    }
}
