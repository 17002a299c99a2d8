//! The deck assembly engine.
//!
//! A single task owns the [`WorkflowState`]. Commands from [`DeckEngine`]
//! handles and completions from generator tasks are processed one at a time;
//! only the generator calls themselves run concurrently.

use deckgen_common::{Deck, ImagePayload};
use deckgen_export::{Artifact, Exporter};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::client::{ContentGenerator, ImageGenerator};
use crate::error::{
    EngineError, IngestError, Result, CONTENT_FAILED_MESSAGE, INGEST_FAILED_MESSAGE,
};
use crate::ingest;
use crate::protocol::{BeginOutcome, ImageTarget, Op};
use crate::state::{Navigation, RoundId, Transition, WorkflowState};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound for a single image request. A request that runs longer
    /// resolves as "no image".
    pub image_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            image_timeout: Duration::from_secs(120),
        }
    }
}

enum Command {
    Submit(Op),
    Begin {
        text: String,
        reply: oneshot::Sender<BeginOutcome>,
    },
    Upload {
        path: PathBuf,
        reply: oneshot::Sender<BeginOutcome>,
    },
    Apply {
        op: Op,
        done: oneshot::Sender<()>,
    },
}

enum Completion {
    Ingested {
        ticket: u64,
        result: std::result::Result<String, IngestError>,
    },
    Content {
        round: RoundId,
        result: std::result::Result<Deck, String>,
    },
    Image {
        round: RoundId,
        target: ImageTarget,
        image: Option<ImagePayload>,
    },
}

/// Handle to a running engine. Cheap to clone.
#[derive(Clone)]
pub struct DeckEngine {
    tx: mpsc::Sender<Command>,
    state: watch::Receiver<Arc<WorkflowState>>,
}

impl DeckEngine {
    /// Starts the engine task on the current tokio runtime.
    pub fn spawn(
        content: Arc<dyn ContentGenerator>,
        images: Arc<dyn ImageGenerator>,
        config: EngineConfig,
    ) -> Self {
        let (tx, rx) = mpsc::channel::<Command>(64);
        let (tx_done, rx_done) = mpsc::unbounded_channel::<Completion>();
        let (publisher, state) = watch::channel(Arc::new(WorkflowState::default()));

        let actor = Actor {
            state: Arc::new(WorkflowState::default()),
            publisher,
            content,
            images,
            config,
            tx_done,
            next_round: 0,
            next_ticket: 0,
            upload: None,
            awaiting: None,
        };
        tokio::spawn(actor.run(rx, rx_done));

        Self { tx, state }
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.tx.send(command).await.map_err(|_| EngineError::Closed)
    }

    /// Fire-and-forget submission.
    pub async fn submit(&self, op: Op) -> Result<()> {
        self.send(Command::Submit(op)).await
    }

    /// Starts a round and waits until its content request resolves.
    pub async fn begin_generation(&self, text: impl Into<String>) -> Result<BeginOutcome> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Begin {
            text: text.into(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| EngineError::Closed)
    }

    /// Reads a document and starts a round with its text.
    pub async fn upload(&self, path: impl Into<PathBuf>) -> Result<BeginOutcome> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Upload {
            path: path.into(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| EngineError::Closed)
    }

    async fn apply(&self, op: Op) -> Result<()> {
        let (done, rx) = oneshot::channel();
        self.send(Command::Apply { op, done }).await?;
        rx.await.map_err(|_| EngineError::Closed)
    }

    pub async fn navigate(&self, nav: Navigation) -> Result<()> {
        self.apply(Op::Navigate(nav)).await
    }

    /// Back to idle. Late completions of the retired round are discarded.
    pub async fn reset(&self) -> Result<()> {
        self.apply(Op::Reset).await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.submit(Op::Shutdown).await
    }

    pub fn snapshot(&self) -> Arc<WorkflowState> {
        self.state.borrow().clone()
    }

    pub fn is_settled(&self) -> bool {
        self.state.borrow().is_settled()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<WorkflowState>> {
        self.state.clone()
    }

    /// Resolves with the first settled state.
    pub async fn wait_settled(&self) -> Result<Arc<WorkflowState>> {
        let mut rx = self.state.clone();
        let state = rx
            .wait_for(|s| s.is_settled())
            .await
            .map_err(|_| EngineError::Closed)?;
        Ok(state.clone())
    }

    /// Exports the current snapshot. Refused while no deck exists or any
    /// image is still generating.
    pub fn export(&self, exporter: &dyn Exporter) -> Result<Artifact> {
        let snapshot = self.snapshot();
        let Some((deck, cover)) = snapshot.export_view() else {
            debug!("export refused: deck missing or images pending");
            return Err(EngineError::ExportNotReady);
        };
        Ok(exporter.export(&deck, cover.as_ref())?)
    }
}

struct Actor {
    state: Arc<WorkflowState>,
    publisher: watch::Sender<Arc<WorkflowState>>,
    content: Arc<dyn ContentGenerator>,
    images: Arc<dyn ImageGenerator>,
    config: EngineConfig,
    tx_done: mpsc::UnboundedSender<Completion>,
    next_round: u64,
    next_ticket: u64,
    /// Outstanding document extraction and whoever waits on it.
    upload: Option<(u64, Option<oneshot::Sender<BeginOutcome>>)>,
    /// Caller waiting on the active round's content request.
    awaiting: Option<(RoundId, oneshot::Sender<BeginOutcome>)>,
}

impl Actor {
    async fn run(
        mut self,
        mut rx: mpsc::Receiver<Command>,
        mut rx_done: mpsc::UnboundedReceiver<Completion>,
    ) {
        loop {
            tokio::select! {
                command = rx.recv() => {
                    let Some(command) = command else { break };
                    if !self.handle_command(command) {
                        break;
                    }
                }
                Some(done) = rx_done.recv() => self.handle_completion(done),
            }
        }
        debug!("deck engine stopped");
    }

    fn transition(&mut self, transition: Transition) {
        self.state = Arc::new(self.state.apply(transition));
    }

    fn publish(&self) {
        self.publisher.send_replace(self.state.clone());
    }

    /// Returns false once the engine should stop.
    fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Submit(op) => self.handle_op(op, None),
            Command::Begin { text, reply } => self.handle_op(Op::Begin { text }, Some(reply)),
            Command::Upload { path, reply } => self.handle_op(Op::Upload { path }, Some(reply)),
            Command::Apply { op, done } => {
                let running = self.handle_op(op, None);
                let _ = done.send(());
                running
            }
        }
    }

    fn handle_op(&mut self, op: Op, reply: Option<oneshot::Sender<BeginOutcome>>) -> bool {
        match op {
            Op::Begin { text } => self.begin(text, reply),
            Op::Upload { path } => self.start_upload(path, reply),
            Op::Navigate(nav) => {
                self.transition(Transition::Navigate(nav));
                self.publish();
            }
            Op::Reset => {
                self.retire_waiters();
                self.transition(Transition::Reset);
                self.publish();
                info!("workflow reset");
            }
            Op::Shutdown => return false,
        }
        true
    }

    fn retire_waiters(&mut self) {
        if let Some((_, Some(reply))) = self.upload.take() {
            let _ = reply.send(BeginOutcome::Superseded);
        }
        if let Some((round, reply)) = self.awaiting.take() {
            debug!("round {round} superseded");
            let _ = reply.send(BeginOutcome::Superseded);
        }
    }

    fn begin(&mut self, text: String, reply: Option<oneshot::Sender<BeginOutcome>>) {
        if text.trim().is_empty() {
            debug!("ignoring blank input");
            if let Some(reply) = reply {
                let _ = reply.send(BeginOutcome::Ignored);
            }
            return;
        }

        self.retire_waiters();
        self.next_round += 1;
        let round = RoundId(self.next_round);
        self.transition(Transition::Begin { round });
        self.publish();
        info!("round {round}: generating content from {} chars", text.chars().count());

        if let Some(reply) = reply {
            self.awaiting = Some((round, reply));
        }

        let content = self.content.clone();
        let tx = self.tx_done.clone();
        tokio::spawn(async move {
            let outcome = AssertUnwindSafe(content.generate_content(&text))
                .catch_unwind()
                .await;
            let result = match outcome {
                Ok(Ok(deck)) if deck.slides.is_empty() => {
                    warn!("round {round}: content generator returned no slides");
                    Err(CONTENT_FAILED_MESSAGE.to_string())
                }
                Ok(Ok(deck)) => Ok(deck),
                Ok(Err(e)) => {
                    warn!("round {round}: content generation failed: {e:#}");
                    Err(CONTENT_FAILED_MESSAGE.to_string())
                }
                Err(_) => {
                    warn!("round {round}: content generator panicked");
                    Err(CONTENT_FAILED_MESSAGE.to_string())
                }
            };
            let _ = tx.send(Completion::Content { round, result });
        });
    }

    fn start_upload(&mut self, path: PathBuf, reply: Option<oneshot::Sender<BeginOutcome>>) {
        if let Some((_, Some(previous))) = self.upload.take() {
            let _ = previous.send(BeginOutcome::Superseded);
        }
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.upload = Some((ticket, reply));
        self.transition(Transition::ReadingFile);
        self.publish();
        info!("reading {}", path.display());

        let tx = self.tx_done.clone();
        tokio::spawn(async move {
            let read = tokio::task::spawn_blocking(move || ingest::extract_text(&path));
            let result = match read.await {
                Ok(result) => result,
                Err(e) => Err(IngestError::Io(std::io::Error::other(e.to_string()))),
            };
            let _ = tx.send(Completion::Ingested { ticket, result });
        });
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Ingested { ticket, result } => self.on_ingested(ticket, result),
            Completion::Content { round, result } => self.on_content(round, result),
            Completion::Image { round, target, image } => self.on_image(round, target, image),
        }
    }

    fn on_ingested(&mut self, ticket: u64, result: std::result::Result<String, IngestError>) {
        let reply = match self.upload.take() {
            Some((current, reply)) if current == ticket => reply,
            other => {
                self.upload = other;
                debug!("dropping stale upload #{ticket}");
                return;
            }
        };
        match result {
            Ok(text) => self.begin(text, reply),
            Err(e) => {
                warn!("ingestion failed: {e}");
                let message = match e {
                    IngestError::Unsupported { .. } => INGEST_FAILED_MESSAGE.to_string(),
                    other => format!("Could not read the file: {other}"),
                };
                self.transition(Transition::IngestFailed {
                    message: message.clone(),
                });
                self.publish();
                if let Some(reply) = reply {
                    let _ = reply.send(BeginOutcome::Failed(message));
                }
            }
        }
    }

    fn on_content(&mut self, round: RoundId, result: std::result::Result<Deck, String>) {
        if self.state.active_round != Some(round) {
            debug!("dropping stale content for round {round}");
            return;
        }
        let reply = match self.awaiting.take() {
            Some((r, reply)) if r == round => Some(reply),
            other => {
                self.awaiting = other;
                None
            }
        };

        match result {
            Ok(deck) => {
                let requests: Vec<(ImageTarget, String)> = std::iter::once((
                    ImageTarget::Cover,
                    cover_prompt(&deck).to_string(),
                ))
                .chain(
                    deck.slides
                        .iter()
                        .enumerate()
                        .map(|(i, s)| (ImageTarget::Slide(i), s.image_prompt().to_string())),
                )
                .collect();
                info!(
                    "round {round}: \"{}\" with {} slides, requesting {} images",
                    deck.main_title,
                    deck.slides.len(),
                    requests.len()
                );

                self.transition(Transition::ContentReady { round, deck });
                for (target, _) in &requests {
                    if let ImageTarget::Slide(index) = *target {
                        self.transition(Transition::SlideImageRequested { round, index });
                    }
                }
                self.publish();
                for (target, prompt) in requests {
                    self.spawn_image(round, target, prompt);
                }
                if let Some(reply) = reply {
                    let _ = reply.send(BeginOutcome::Preview);
                }
            }
            Err(message) => {
                self.transition(Transition::ContentFailed {
                    round,
                    message: message.clone(),
                });
                self.publish();
                if let Some(reply) = reply {
                    let _ = reply.send(BeginOutcome::Failed(message));
                }
            }
        }
    }

    /// Runs one image request. Exactly one completion is sent, whatever the
    /// request does.
    fn spawn_image(&self, round: RoundId, target: ImageTarget, prompt: String) {
        let images = self.images.clone();
        let tx = self.tx_done.clone();
        let timeout = self.config.image_timeout;
        tokio::spawn(async move {
            let request = AssertUnwindSafe(images.generate_image(&prompt)).catch_unwind();
            let image = match tokio::time::timeout(timeout, request).await {
                Ok(Ok(Ok(Some(image)))) if !image.is_empty() => Some(image),
                Ok(Ok(Ok(_))) => {
                    warn!("round {round}: no image returned for {target:?}");
                    None
                }
                Ok(Ok(Err(e))) => {
                    warn!("round {round}: image generation failed for {target:?}: {e:#}");
                    None
                }
                Ok(Err(_)) => {
                    warn!("round {round}: image generator panicked for {target:?}");
                    None
                }
                Err(_) => {
                    warn!(
                        "round {round}: image request for {target:?} timed out after {timeout:?}"
                    );
                    None
                }
            };
            let _ = tx.send(Completion::Image { round, target, image });
        });
    }

    fn on_image(&mut self, round: RoundId, target: ImageTarget, image: Option<ImagePayload>) {
        if self.state.active_round != Some(round) {
            debug!("dropping stale {target:?} image from round {round}");
            return;
        }
        let was_settled = self.state.is_settled();
        let transition = match target {
            ImageTarget::Cover => Transition::CoverImageFinished { round, image },
            ImageTarget::Slide(index) => Transition::SlideImageFinished { round, index, image },
        };
        self.transition(transition);
        self.publish();

        if !was_settled && self.state.is_settled() {
            info!(
                "round {round} settled: {} of {} images ready",
                self.state.images_ready(),
                self.state.position_count()
            );
        }
    }
}

/// The cover prompt, or the main title when the model left it blank.
fn cover_prompt(deck: &Deck) -> &str {
    if deck.cover_image_prompt.trim().is_empty() {
        &deck.main_title
    } else {
        &deck.cover_image_prompt
    }
}
