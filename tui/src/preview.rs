use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use deckgen_core::{DeckEngine, EngineError, Navigation, Op, WorkflowState};
use deckgen_export::PptxExporter;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::Duration;
use tracing::{info, warn};

use crate::view;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What a round is generated from.
#[derive(Debug, Clone)]
pub enum Source {
    Topic(String),
    File(PathBuf),
}

impl Source {
    fn op(&self) -> Op {
        match self {
            Source::Topic(text) => Op::Begin { text: text.clone() },
            Source::File(path) => Op::Upload { path: path.clone() },
        }
    }
}

/// Terminal surface over a running [`DeckEngine`].
pub struct DeckPreview {
    engine: DeckEngine,
    source: Source,
    output_dir: PathBuf,
    state: Arc<WorkflowState>,
    status: Option<String>,
    running: bool,
}

impl DeckPreview {
    pub fn new(engine: DeckEngine, source: Source, output_dir: PathBuf) -> Self {
        let state = engine.snapshot();
        Self {
            engine,
            source,
            output_dir,
            state,
            status: None,
            running: true,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.engine.submit(self.source.op()).await?;

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal).await;

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<()> {
        let mut updates = self.engine.subscribe();
        while self.running {
            terminal.draw(|f| self.draw(f))?;

            tokio::select! {
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    self.state = updates.borrow_and_update().clone();
                }
                polled = tokio::task::spawn_blocking(|| event::poll(POLL_INTERVAL)) => {
                    if let Ok(Ok(true)) = polled {
                        if let Event::Key(key) = event::read()? {
                            if key.kind == KeyEventKind::Press {
                                self.handle_key(key.code).await?;
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    async fn handle_key(&mut self, code: KeyCode) -> Result<()> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Left | KeyCode::Char('h') => self.engine.navigate(Navigation::Previous).await?,
            KeyCode::Right | KeyCode::Char('l') => self.engine.navigate(Navigation::Next).await?,
            KeyCode::Home => self.engine.navigate(Navigation::First).await?,
            KeyCode::End => self.engine.navigate(Navigation::Last).await?,
            KeyCode::Char('e') => self.export(),
            KeyCode::Char('r') => {
                self.engine.reset().await?;
                self.status = Some("Reset".to_string());
            }
            KeyCode::Char('g') => {
                self.status = None;
                self.engine.submit(self.source.op()).await?;
            }
            _ => {}
        }
        Ok(())
    }

    fn export(&mut self) {
        let saved = self
            .engine
            .export(&PptxExporter)
            .map_err(anyhow::Error::from)
            .and_then(|artifact| Ok(artifact.write_to(&self.output_dir)?));
        self.status = Some(match saved {
            Ok(path) => {
                info!("exported {}", path.display());
                format!("Saved to {}", path.display())
            }
            Err(e) if is_not_ready(&e) => "Images are still generating".to_string(),
            Err(e) => {
                warn!("export failed: {e:#}");
                format!("Export failed: {e}")
            }
        });
    }

    fn draw(&self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(f.area());

        let block = Block::default()
            .title(view::title(&self.state))
            .borders(Borders::ALL);
        let paragraph = Paragraph::new(view::body(&self.state))
            .block(block)
            .wrap(Wrap { trim: false });
        f.render_widget(paragraph, chunks[0]);

        f.render_widget(
            Paragraph::new(view::footer(&self.state, self.status.as_deref())),
            chunks[1],
        );
    }
}

fn is_not_ready(e: &anyhow::Error) -> bool {
    matches!(e.downcast_ref::<EngineError>(), Some(EngineError::ExportNotReady))
}
