use serde_json::{json, Value};

/// Longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

pub fn content_prompt(text: &str, max_chars: usize) -> String {
    let source = truncate_chars(text, max_chars);
    format!(
        "Build the structure of a modern, professional presentation from this text: \"{source}\".\n\
         \n\
         Rules:\n\
         1. Language: answer in the language of the text.\n\
         2. Slides: 7-8 slides.\n\
         3. Layout: pick one of 'steps', 'comparison', 'grid', 'classic' or 'process' per slide.\n\
         4. Icons: give each bullet a fitting Lucide icon name.\n\
         5. Image prompts: in each slide's 'description', write a detailed English prompt for an illustration of that slide.\n\
         6. Color: choose a professional hex theme color (themeColor)."
    )
}

pub fn image_prompt(prompt: &str) -> String {
    format!(
        "High-quality professional 4k presentation slide illustration for: {prompt}. \
         Minimalist, clean corporate style."
    )
}

/// JSON schema the content model must answer with.
pub fn presentation_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "mainTitle": { "type": "STRING" },
            "subtitle": { "type": "STRING" },
            "themeColor": { "type": "STRING" },
            "coverImagePrompt": { "type": "STRING" },
            "slides": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": { "type": "STRING" },
                        "layout": {
                            "type": "STRING",
                            "enum": ["steps", "comparison", "grid", "classic", "process"]
                        },
                        "description": { "type": "STRING" },
                        "content": {
                            "type": "ARRAY",
                            "items": {
                                "type": "OBJECT",
                                "properties": {
                                    "text": { "type": "STRING" },
                                    "icon": { "type": "STRING" }
                                },
                                "required": ["text", "icon"]
                            }
                        }
                    },
                    "required": ["title", "layout", "content", "description"]
                }
            }
        },
        "required": ["mainTitle", "subtitle", "slides", "themeColor", "coverImagePrompt"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 2), "he");
        assert_eq!(truncate_chars("o‘zbek", 2), "o‘");
        assert_eq!(truncate_chars("", 0), "");
    }

    #[test]
    fn content_prompt_is_bounded() {
        let long = "x".repeat(10_000);
        let prompt = content_prompt(&long, 4000);
        assert!(prompt.contains(&"x".repeat(4000)));
        assert!(!prompt.contains(&"x".repeat(4001)));
    }

    #[test]
    fn schema_requires_top_level_fields() {
        let schema = presentation_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        for field in ["mainTitle", "subtitle", "slides", "themeColor", "coverImagePrompt"] {
            assert!(required.contains(&field), "{field} missing");
        }
    }
}
