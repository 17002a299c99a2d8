//! Pure rendering of workflow snapshots into styled lines.

use deckgen_common::{Deck, Slide, SlideLayout};
use deckgen_core::{CoverStatus, Phase, WorkflowState};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

fn theme(deck: &Deck) -> Color {
    let hex = deck.theme_hex();
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(0);
    Color::Rgb(channel(0), channel(2), channel(4))
}

fn layout_label(layout: SlideLayout) -> &'static str {
    match layout {
        SlideLayout::Steps => "steps",
        SlideLayout::Comparison => "comparison",
        SlideLayout::Grid => "grid",
        SlideLayout::Classic => "classic",
        SlideLayout::Process => "process",
    }
}

/// Block title: deck title plus the "n / N" counter.
pub fn title(state: &WorkflowState) -> String {
    match &state.deck {
        Some(deck) => format!("{} ({})", deck.main_title, state.counter_label()),
        None => "deckgen".to_string(),
    }
}

/// Lines for the main area.
pub fn body(state: &WorkflowState) -> Vec<Line<'static>> {
    match state.phase {
        Phase::ReadingFile => vec![Line::from("Reading file...")],
        Phase::Generating => vec![Line::from("Preparing presentation...")],
        Phase::Error if state.deck.is_none() => error_lines(state),
        Phase::Idle => vec![Line::from("Nothing generated yet. Press g to generate.")],
        _ => {
            let Some(deck) = &state.deck else {
                return error_lines(state);
            };
            let mut lines = match state.current_slide {
                0 => cover_lines(deck, &state.cover),
                n => match deck.slides.get(n - 1) {
                    Some(slide) => slide_lines(deck, slide, state.slide_pending(n - 1)),
                    None => Vec::new(),
                },
            };
            if state.phase == Phase::Error {
                lines.push(Line::from(""));
                lines.extend(error_lines(state));
            }
            lines
        }
    }
}

fn error_lines(state: &WorkflowState) -> Vec<Line<'static>> {
    let message = state.error.clone().unwrap_or_else(|| "Unknown error".to_string());
    vec![Line::from(Span::styled(message, Style::default().fg(Color::Red)))]
}

fn cover_lines(deck: &Deck, cover: &CoverStatus) -> Vec<Line<'static>> {
    let image = match cover {
        CoverStatus::Pending => "⟳ generating cover image".to_string(),
        CoverStatus::Ready(image) => {
            format!("▣ cover image ({} bytes, {})", image.len(), image.extension())
        }
        CoverStatus::Missing => "□ no cover image".to_string(),
    };
    vec![
        Line::from(""),
        Line::from(Span::styled(
            deck.main_title.clone(),
            Style::default().fg(theme(deck)).add_modifier(Modifier::BOLD),
        ))
        .centered(),
        Line::from(deck.subtitle.clone()).centered(),
        Line::from(""),
        Line::from(Span::styled(image, Style::default().fg(Color::DarkGray))).centered(),
    ]
}

fn slide_lines(deck: &Deck, slide: &Slide, pending: bool) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                slide.title.clone(),
                Style::default().fg(theme(deck)).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  [{}]", layout_label(slide.layout)),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        Line::from(""),
    ];
    for item in &slide.content {
        lines.push(Line::from(vec![
            Span::styled(
                format!(" {} ", item.icon.icon().glyph()),
                Style::default().fg(theme(deck)),
            ),
            Span::raw(item.text.clone()),
        ]));
    }
    lines.push(Line::from(""));
    let image = match (&slide.image, pending) {
        (Some(image), _) => format!("▣ image ({} bytes, {})", image.len(), image.extension()),
        (None, true) => "⟳ generating image".to_string(),
        (None, false) => "□ no image".to_string(),
    };
    lines.push(Line::from(Span::styled(image, Style::default().fg(Color::DarkGray))));
    lines
}

/// Footer: image progress, optional status message, key hints.
pub fn footer(state: &WorkflowState, status: Option<&str>) -> Line<'static> {
    let progress = if state.deck.is_none() {
        String::new()
    } else if state.is_settled() {
        format!("images {}/{} ready", state.images_ready(), state.position_count())
    } else {
        format!("generating images {}/{}", state.images_ready(), state.position_count())
    };
    let mut spans = vec![Span::styled(progress, Style::default().fg(Color::Cyan))];
    if let Some(status) = status {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(status.to_string(), Style::default().fg(Color::Yellow)));
    }
    spans.push(Span::styled(
        "  ←/→ navigate  e export  r reset  g generate  q quit",
        Style::default().fg(Color::DarkGray),
    ));
    Line::from(spans)
}
