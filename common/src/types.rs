use serde::{Deserialize, Deserializer, Serialize};

use crate::icons::IconRef;
use crate::image::ImagePayload;

/// Theme color used when the model hands back something that is not a hex color.
pub const DEFAULT_THEME_COLOR: &str = "4F46E5";

/// Layout hint chosen by the content model for a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideLayout {
    Steps,
    Comparison,
    Grid,
    Process,
    #[default]
    #[serde(other)]
    Classic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideItem {
    pub text: String,
    /// Missing or `null` icons resolve to the fallback icon.
    #[serde(default, deserialize_with = "icon_or_default")]
    pub icon: IconRef,
}

fn icon_or_default<'de, D>(deserializer: D) -> Result<IconRef, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<IconRef>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    pub title: String,
    #[serde(default)]
    pub layout: SlideLayout,
    /// Illustration prompt for this slide.
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: Vec<SlideItem>,
    #[serde(skip)]
    pub image: Option<ImagePayload>,
}

impl Slide {
    /// Prompt sent to the image generator: the description, or the title when
    /// the description is blank.
    pub fn image_prompt(&self) -> &str {
        if self.description.trim().is_empty() {
            &self.title
        } else {
            &self.description
        }
    }
}

/// Structured presentation produced by one content round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub main_title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub theme_color: String,
    #[serde(default)]
    pub cover_image_prompt: String,
    pub slides: Vec<Slide>,
}

impl Deck {
    /// Drops any image already attached to a slide. A fresh skeleton never
    /// carries images, whatever the generator returned.
    pub fn into_skeleton(mut self) -> Self {
        for slide in &mut self.slides {
            slide.image = None;
        }
        self
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Theme color as six uppercase hex digits without the leading `#`.
    pub fn theme_hex(&self) -> String {
        normalize_hex_color(&self.theme_color)
            .unwrap_or_else(|| DEFAULT_THEME_COLOR.to_string())
    }
}

/// Accepts `#RGB`, `RGB`, `#RRGGBB` and `RRGGBB`.
pub fn normalize_hex_color(raw: &str) -> Option<String> {
    let hex = raw.trim().trim_start_matches('#');
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        6 => Some(hex.to_ascii_uppercase()),
        3 => Some(
            hex.chars()
                .flat_map(|c| [c, c])
                .collect::<String>()
                .to_ascii_uppercase(),
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icons::Icon;

    const SAMPLE: &str = r##"{
        "mainTitle": "Solar Power",
        "subtitle": "A short tour",
        "themeColor": "#1e40af",
        "coverImagePrompt": "sunrise over panels",
        "slides": [
            {
                "title": "Why solar",
                "layout": "grid",
                "description": "panels on a roof",
                "content": [{"text": "Cheap", "icon": "Sun"}, {"text": "Clean", "icon": "NotAnIcon"}]
            },
            {
                "title": "Storage",
                "layout": "timeline",
                "description": "  ",
                "content": []
            }
        ]
    }"##;

    #[test]
    fn deserialize_model_output() {
        let deck: Deck = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(deck.main_title, "Solar Power");
        assert_eq!(deck.slide_count(), 2);
        assert_eq!(deck.slides[0].layout, SlideLayout::Grid);
        assert_eq!(deck.slides[0].content[0].icon.icon(), Icon::Sun);
        assert_eq!(deck.slides[0].content[1].icon.icon(), Icon::HelpCircle);
        assert!(deck.slides.iter().all(|s| s.image.is_none()));
    }

    #[test]
    fn unknown_layout_falls_back_to_classic() {
        let deck: Deck = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(deck.slides[1].layout, SlideLayout::Classic);
    }

    #[test]
    fn image_prompt_falls_back_to_title() {
        let deck: Deck = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(deck.slides[0].image_prompt(), "panels on a roof");
        assert_eq!(deck.slides[1].image_prompt(), "Storage");
    }

    #[test]
    fn theme_color_normalization() {
        assert_eq!(normalize_hex_color("#1e40af").as_deref(), Some("1E40AF"));
        assert_eq!(normalize_hex_color("abc").as_deref(), Some("AABBCC"));
        assert_eq!(normalize_hex_color("blue"), None);
        assert_eq!(normalize_hex_color("#12345"), None);

        let mut deck: Deck = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(deck.theme_hex(), "1E40AF");
        deck.theme_color = "teal".to_string();
        assert_eq!(deck.theme_hex(), DEFAULT_THEME_COLOR);
    }

    #[test]
    fn missing_or_null_icon_uses_fallback() {
        let json = r#"[{"text": "a"}, {"text": "b", "icon": null}, {"text": "c", "icon": "Zap"}]"#;
        let items: Vec<SlideItem> = serde_json::from_str(json).unwrap();
        assert_eq!(items[0].icon.icon(), Icon::HelpCircle);
        assert_eq!(items[1].icon.icon(), Icon::HelpCircle);
        assert_eq!(items[2].icon.icon(), Icon::Zap);
    }

    #[test]
    fn missing_slides_is_an_error() {
        let err = serde_json::from_str::<Deck>(r#"{"mainTitle": "x"}"#);
        assert!(err.is_err());
    }
}
