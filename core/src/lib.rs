//! Deck assembly: one content round, a fan-out of image requests, and a
//! progressively merged deck that can be exported once settled.

pub mod client;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod protocol;
pub mod state;

pub use client::{ContentGenerator, GeminiAdapter, ImageGenerator, StubGenerator};
pub use engine::{DeckEngine, EngineConfig};
pub use error::{EngineError, IngestError, Result};
pub use protocol::{BeginOutcome, ImageTarget, Op};
pub use state::{CoverStatus, Navigation, Phase, RoundId, Transition, WorkflowState};
