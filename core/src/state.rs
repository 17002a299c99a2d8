//! Workflow state and its pure transitions.
//!
//! Every change is `(state, Transition) -> state`. The engine publishes each
//! resulting value as a fresh `Arc`, so observers only ever hold complete
//! states.

use deckgen_common::{Deck, ImagePayload};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Identifies one generation round. Completions carry the round they were
/// issued for and are dropped unless it is still the active one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoundId(pub u64);

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    ReadingFile,
    Generating,
    Preview,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CoverStatus {
    #[default]
    Pending,
    Ready(ImagePayload),
    /// The cover request resolved without an image. Final for the round.
    Missing,
}

impl CoverStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, CoverStatus::Pending)
    }

    pub fn image(&self) -> Option<&ImagePayload> {
        match self {
            CoverStatus::Ready(image) => Some(image),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Next,
    Previous,
    First,
    Last,
    /// Absolute position; 0 is the cover.
    To(usize),
}

#[derive(Debug, Clone)]
pub enum Transition {
    ReadingFile,
    IngestFailed { message: String },
    Begin { round: RoundId },
    ContentReady { round: RoundId, deck: Deck },
    ContentFailed { round: RoundId, message: String },
    SlideImageRequested { round: RoundId, index: usize },
    SlideImageFinished {
        round: RoundId,
        index: usize,
        image: Option<ImagePayload>,
    },
    CoverImageFinished {
        round: RoundId,
        image: Option<ImagePayload>,
    },
    Navigate(Navigation),
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkflowState {
    pub phase: Phase,
    pub active_round: Option<RoundId>,
    pub deck: Option<Arc<Deck>>,
    pub cover: CoverStatus,
    /// Slide index -> request outstanding. Entries are never removed within a round.
    pub pending: Arc<BTreeMap<usize, bool>>,
    /// 0 is the cover, `n` is slide `n - 1`.
    pub current_slide: usize,
    pub error: Option<String>,
}

impl WorkflowState {
    pub fn apply(&self, transition: Transition) -> WorkflowState {
        let mut next = self.clone();
        match transition {
            Transition::ReadingFile => {
                next.phase = Phase::ReadingFile;
                next.error = None;
            }
            Transition::IngestFailed { message } => {
                next.phase = Phase::Error;
                next.error = Some(message);
            }
            Transition::Begin { round } => {
                next = WorkflowState {
                    phase: Phase::Generating,
                    active_round: Some(round),
                    ..WorkflowState::default()
                };
            }
            Transition::ContentReady { round, deck } => {
                if !self.is_active(round) {
                    return next;
                }
                next.phase = Phase::Preview;
                next.deck = Some(Arc::new(deck.into_skeleton()));
                next.cover = CoverStatus::Pending;
                next.pending = Arc::default();
                next.current_slide = 0;
                next.error = None;
            }
            Transition::ContentFailed { round, message } => {
                if !self.is_active(round) {
                    return next;
                }
                next.phase = Phase::Error;
                next.deck = None;
                next.cover = CoverStatus::Pending;
                next.pending = Arc::default();
                next.current_slide = 0;
                next.error = Some(message);
            }
            Transition::SlideImageRequested { round, index } => {
                if !self.is_active(round) || !self.has_slide(index) {
                    return next;
                }
                Arc::make_mut(&mut next.pending).entry(index).or_insert(true);
            }
            Transition::SlideImageFinished { round, index, image } => {
                if !self.is_active(round) || !self.has_slide(index) {
                    return next;
                }
                let image = image.filter(|i| !i.is_empty());
                if let (Some(image), Some(deck)) = (image, next.deck.as_mut()) {
                    let slide = &mut Arc::make_mut(deck).slides[index];
                    if slide.image.is_none() {
                        slide.image = Some(image);
                    }
                }
                Arc::make_mut(&mut next.pending).insert(index, false);
            }
            Transition::CoverImageFinished { round, image } => {
                if !self.is_active(round) || self.deck.is_none() || !self.cover.is_pending() {
                    return next;
                }
                next.cover = match image.filter(|i| !i.is_empty()) {
                    Some(image) => CoverStatus::Ready(image),
                    None => CoverStatus::Missing,
                };
            }
            Transition::Navigate(nav) => {
                let Some(deck) = &self.deck else {
                    return next;
                };
                let last = deck.slides.len();
                let current = self.current_slide.min(last);
                next.current_slide = match nav {
                    Navigation::Next => (current + 1).min(last),
                    Navigation::Previous => current.saturating_sub(1),
                    Navigation::First => 0,
                    Navigation::Last => last,
                    Navigation::To(index) => index.min(last),
                };
            }
            Transition::Reset => {
                next = WorkflowState::default();
            }
        }
        next
    }

    fn is_active(&self, round: RoundId) -> bool {
        self.active_round == Some(round)
    }

    fn has_slide(&self, index: usize) -> bool {
        self.deck.as_ref().is_some_and(|d| index < d.slides.len())
    }

    /// Whether slide `index` still has a request outstanding.
    pub fn slide_pending(&self, index: usize) -> bool {
        self.pending.get(&index).copied().unwrap_or(false)
    }

    /// Any image of the active round still in flight.
    pub fn images_generating(&self) -> bool {
        (self.deck.is_some() && self.cover.is_pending()) || self.pending.values().any(|p| *p)
    }

    pub fn is_settled(&self) -> bool {
        !self.images_generating()
    }

    /// Deck and cover to export, only once settled.
    pub fn export_view(&self) -> Option<(Arc<Deck>, Option<ImagePayload>)> {
        if !self.is_settled() {
            return None;
        }
        let deck = self.deck.clone()?;
        Some((deck, self.cover.image().cloned()))
    }

    /// Number of images (cover included) that landed.
    pub fn images_ready(&self) -> usize {
        let slides = self
            .deck
            .as_ref()
            .map_or(0, |d| d.slides.iter().filter(|s| s.image.is_some()).count());
        slides + usize::from(self.cover.image().is_some())
    }

    /// Cover plus one per slide.
    pub fn position_count(&self) -> usize {
        self.deck.as_ref().map_or(0, |d| d.slides.len() + 1)
    }

    /// One-based "current / total" label, cover included.
    pub fn counter_label(&self) -> String {
        format!("{} / {}", self.current_slide + 1, self.position_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckgen_common::{Slide, SlideLayout};

    const R1: RoundId = RoundId(1);
    const R2: RoundId = RoundId(2);

    fn deck(n: usize) -> Deck {
        Deck {
            main_title: "Title".to_string(),
            subtitle: "Sub".to_string(),
            theme_color: "#112233".to_string(),
            cover_image_prompt: "cover".to_string(),
            slides: (0..n)
                .map(|i| Slide {
                    title: format!("S{i}"),
                    layout: SlideLayout::Classic,
                    description: format!("d{i}"),
                    content: vec![],
                    image: None,
                })
                .collect(),
        }
    }

    fn img(tag: u8) -> ImagePayload {
        ImagePayload::new("image/png", vec![tag])
    }

    fn previewing(n: usize) -> WorkflowState {
        let mut state = WorkflowState::default()
            .apply(Transition::Begin { round: R1 })
            .apply(Transition::ContentReady { round: R1, deck: deck(n) });
        for index in 0..n {
            state = state.apply(Transition::SlideImageRequested { round: R1, index });
        }
        state
    }

    #[test]
    fn test_settled_lifecycle() {
        let initial = WorkflowState::default();
        assert!(initial.is_settled());

        let begun = initial.apply(Transition::Begin { round: R1 });
        assert_eq!(begun.phase, Phase::Generating);
        assert!(begun.is_settled());

        let ready = begun.apply(Transition::ContentReady { round: R1, deck: deck(2) });
        assert_eq!(ready.phase, Phase::Preview);
        assert!(!ready.is_settled(), "cover pending before fan-out");

        let mut state = ready;
        for index in 0..2 {
            state = state.apply(Transition::SlideImageRequested { round: R1, index });
        }
        state = state.apply(Transition::SlideImageFinished {
            round: R1,
            index: 0,
            image: Some(img(0)),
        });
        state = state.apply(Transition::CoverImageFinished { round: R1, image: None });
        assert!(!state.is_settled());
        assert!(state.export_view().is_none());

        state = state.apply(Transition::SlideImageFinished { round: R1, index: 1, image: None });
        assert!(state.is_settled());
        assert_eq!(state.cover, CoverStatus::Missing);
        assert_eq!(state.pending.len(), 2);
        assert!(state.pending.values().all(|p| !p));
        let (deck, cover) = state.export_view().unwrap();
        assert!(cover.is_none());
        assert_eq!(deck.slides[0].image, Some(img(0)));
        assert_eq!(deck.slides[1].image, None);
    }

    #[test]
    fn test_completion_order_does_not_matter() {
        let completions = [
            Transition::SlideImageFinished { round: R1, index: 0, image: Some(img(0)) },
            Transition::SlideImageFinished { round: R1, index: 1, image: None },
            Transition::SlideImageFinished { round: R1, index: 2, image: Some(img(2)) },
            Transition::CoverImageFinished { round: R1, image: Some(img(9)) },
        ];
        let orders: [[usize; 4]; 4] = [[0, 1, 2, 3], [3, 2, 1, 0], [1, 3, 0, 2], [2, 0, 3, 1]];
        let results: Vec<WorkflowState> = orders
            .iter()
            .map(|order| {
                order
                    .iter()
                    .fold(previewing(3), |s, &i| s.apply(completions[i].clone()))
            })
            .collect();
        for result in &results[1..] {
            assert_eq!(result, &results[0]);
        }
        assert!(results[0].is_settled());
    }

    #[test]
    fn test_image_set_at_most_once() {
        let state = previewing(1)
            .apply(Transition::SlideImageFinished { round: R1, index: 0, image: Some(img(1)) })
            .apply(Transition::SlideImageFinished { round: R1, index: 0, image: Some(img(2)) })
            .apply(Transition::CoverImageFinished { round: R1, image: Some(img(3)) })
            .apply(Transition::CoverImageFinished { round: R1, image: Some(img(4)) });
        assert_eq!(state.deck.unwrap().slides[0].image, Some(img(1)));
        assert_eq!(state.cover, CoverStatus::Ready(img(3)));
    }

    #[test]
    fn test_stale_round_is_ignored() {
        let old = previewing(2);
        let fresh = old.apply(Transition::Begin { round: R2 });
        let after = fresh
            .apply(Transition::ContentReady { round: R1, deck: deck(5) })
            .apply(Transition::SlideImageFinished { round: R1, index: 0, image: Some(img(1)) })
            .apply(Transition::CoverImageFinished { round: R1, image: Some(img(1)) });
        assert_eq!(after, fresh);

        let reset = old.apply(Transition::Reset);
        assert_eq!(reset, WorkflowState::default());
        let late = reset.apply(Transition::SlideImageFinished {
            round: R1,
            index: 0,
            image: Some(img(1)),
        });
        assert_eq!(late, reset);
    }

    #[test]
    fn test_completion_only_touches_its_slide() {
        let before = previewing(3);
        let after = before.apply(Transition::SlideImageFinished {
            round: R1,
            index: 1,
            image: Some(img(7)),
        });
        let (b, a) = (before.deck.unwrap(), after.deck.unwrap());
        assert_eq!(a.slides.len(), 3);
        assert_eq!(b.slides[1].image, None, "earlier snapshot is untouched");
        assert_eq!(a.slides[1].image, Some(img(7)));
        assert_eq!(a.slides[0], b.slides[0]);
        assert_eq!(a.slides[2], b.slides[2]);
    }

    #[test]
    fn test_empty_payload_counts_as_missing() {
        let state = previewing(1)
            .apply(Transition::SlideImageFinished {
                round: R1,
                index: 0,
                image: Some(ImagePayload::new("image/png", Vec::new())),
            })
            .apply(Transition::CoverImageFinished {
                round: R1,
                image: Some(ImagePayload::new("image/png", Vec::new())),
            });
        assert!(state.is_settled());
        assert_eq!(state.deck.unwrap().slides[0].image, None);
        assert_eq!(state.cover, CoverStatus::Missing);
    }

    #[test]
    fn test_out_of_range_index_is_ignored() {
        let state = previewing(1);
        let after = state
            .apply(Transition::SlideImageRequested { round: R1, index: 4 })
            .apply(Transition::SlideImageFinished { round: R1, index: 4, image: Some(img(1)) });
        assert_eq!(after, state);
    }

    #[test]
    fn test_content_failure() {
        let state = WorkflowState::default()
            .apply(Transition::Begin { round: R1 })
            .apply(Transition::ContentFailed { round: R1, message: "boom".to_string() });
        assert_eq!(state.phase, Phase::Error);
        assert!(state.deck.is_none());
        assert_eq!(state.error.as_deref(), Some("boom"));
        assert!(state.is_settled());
        assert!(state.export_view().is_none());
    }

    #[test]
    fn test_ingest_failure_keeps_deck() {
        let state = previewing(1)
            .apply(Transition::ReadingFile)
            .apply(Transition::IngestFailed { message: "bad file".to_string() });
        assert_eq!(state.phase, Phase::Error);
        assert!(state.deck.is_some());
        assert!(state.slide_pending(0));
    }

    #[test]
    fn test_navigation_clamps() {
        let idle = WorkflowState::default();
        assert_eq!(idle.apply(Transition::Navigate(Navigation::Next)).current_slide, 0);

        let state = previewing(2);
        assert_eq!(state.counter_label(), "1 / 3");
        let s = state.apply(Transition::Navigate(Navigation::Previous));
        assert_eq!(s.current_slide, 0);
        let s = s
            .apply(Transition::Navigate(Navigation::Next))
            .apply(Transition::Navigate(Navigation::Next))
            .apply(Transition::Navigate(Navigation::Next));
        assert_eq!(s.current_slide, 2);
        assert_eq!(s.counter_label(), "3 / 3");
        assert_eq!(s.apply(Transition::Navigate(Navigation::First)).current_slide, 0);
        assert_eq!(s.apply(Transition::Navigate(Navigation::To(99))).current_slide, 2);
        assert_eq!(
            state.apply(Transition::Navigate(Navigation::Last)).current_slide,
            2
        );
    }
}
