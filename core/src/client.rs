use anyhow::Result;
use async_trait::async_trait;
use deckgen_common::{
    Deck, DeckgenConfig, Icon, IconRef, ImagePayload, Slide, SlideItem, SlideLayout,
};
use deckgen_genai::GeminiClient;

/// Raw text in, deck skeleton out.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate_content(&self, text: &str) -> Result<Deck>;
}

/// One illustration per call. `Ok(None)` means the model produced no image.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_image(&self, prompt: &str) -> Result<Option<ImagePayload>>;
}

/// Adapter wrapping [`GeminiClient`] for both generator roles.
pub struct GeminiAdapter {
    inner: GeminiClient,
}

impl GeminiAdapter {
    pub fn new(inner: GeminiClient) -> Self {
        Self { inner }
    }

    pub fn from_config(config: &DeckgenConfig) -> Result<Self> {
        Ok(Self::new(GeminiClient::from_config(config)?))
    }
}

#[async_trait]
impl ContentGenerator for GeminiAdapter {
    async fn generate_content(&self, text: &str) -> Result<Deck> {
        Ok(self.inner.generate_presentation(text).await?)
    }
}

#[async_trait]
impl ImageGenerator for GeminiAdapter {
    async fn generate_image(&self, prompt: &str) -> Result<Option<ImagePayload>> {
        Ok(self.inner.generate_image(prompt).await?)
    }
}

/// 1x1 transparent PNG.
const STUB_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

const STUB_SLIDES: usize = 3;

/// Offline generator: a deterministic deck built from the input text and a
/// tiny placeholder image for every prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubGenerator;

impl StubGenerator {
    pub fn deck_for(text: &str) -> Deck {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        let title = lines.first().copied().unwrap_or("Untitled");
        let title: String = title.chars().take(60).collect();
        let layouts = [SlideLayout::Steps, SlideLayout::Grid, SlideLayout::Classic];
        let icons = [Icon::Lightbulb, Icon::Target, Icon::Rocket];

        let slides = (0..STUB_SLIDES)
            .map(|i| {
                let source = lines.get(i + 1).copied().unwrap_or(title.as_str());
                Slide {
                    title: format!("{title}: part {}", i + 1),
                    layout: layouts[i % layouts.len()],
                    description: format!("Illustration of {source}"),
                    content: vec![
                        SlideItem {
                            text: source.to_string(),
                            icon: IconRef::from(icons[i % icons.len()]),
                        },
                        SlideItem {
                            text: format!("Key point {}", i + 1),
                            icon: IconRef::new("CheckCircle"),
                        },
                    ],
                    image: None,
                }
            })
            .collect();

        Deck {
            main_title: title.clone(),
            subtitle: "Generated offline".to_string(),
            theme_color: "#4F46E5".to_string(),
            cover_image_prompt: format!("Cover art for {title}"),
            slides,
        }
    }
}

#[async_trait]
impl ContentGenerator for StubGenerator {
    async fn generate_content(&self, text: &str) -> Result<Deck> {
        Ok(Self::deck_for(text))
    }
}

#[async_trait]
impl ImageGenerator for StubGenerator {
    async fn generate_image(&self, _prompt: &str) -> Result<Option<ImagePayload>> {
        Ok(Some(ImagePayload::from_base64("image/png", STUB_PNG_BASE64)?))
    }
}
