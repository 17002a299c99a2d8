use anyhow::{bail, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use deckgen_common::DeckgenConfig;
use deckgen_core::{
    BeginOutcome, ContentGenerator, DeckEngine, EngineConfig, GeminiAdapter, ImageGenerator,
    StubGenerator,
};
use deckgen_export::PptxExporter;
use deckgen_tui::Source;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "deckgen")]
#[command(about = "Generate illustrated slide decks from a topic or a document")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable debug output
    #[arg(long, global = true)]
    pub debug: bool,

    /// Override the content model
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Read configuration from this file instead of the default locations
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Use the built-in offline generator instead of the model API
    #[arg(long, global = true)]
    pub offline: bool,
}

#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct InputArgs {
    /// Topic or free text to build the deck from
    #[arg(long)]
    pub topic: Option<String>,

    /// Document to build the deck from (.txt or .docx)
    #[arg(long)]
    pub file: Option<PathBuf>,
}

impl InputArgs {
    fn source(&self) -> Source {
        match (&self.topic, &self.file) {
            (_, Some(path)) => Source::File(path.clone()),
            (Some(topic), None) => Source::Topic(topic.clone()),
            (None, None) => Source::Topic(String::new()),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a deck, wait for every image and export it as .pptx
    Generate {
        #[command(flatten)]
        input: InputArgs,
        /// Output directory (defaults to `output_dir` from the config)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Generate a deck and watch it fill in, in the terminal
    Preview {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Print the effective configuration, or write it to the user config file
    Config {
        #[arg(long)]
        write: bool,
    },
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref()).await?;
    if let Some(model) = &cli.model {
        config.content_model = model.clone();
    }

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let owns_screen = matches!(command, Commands::Preview { .. });
    init_tracing(cli.debug, config.log_path.as_deref(), owns_screen)?;

    match command {
        Commands::Generate { input, out } => {
            let engine = spawn_engine(&config, cli.offline)?;
            let out = out.unwrap_or_else(|| config.output_dir.clone());
            generate(&engine, input.source(), &out).await?;
            engine.shutdown().await?;
        }
        Commands::Preview { input } => {
            let engine = spawn_engine(&config, cli.offline)?;
            let output_dir = config.output_dir.clone();
            deckgen_tui::run_preview(engine.clone(), input.source(), output_dir).await?;
            engine.shutdown().await?;
        }
        Commands::Config { write } => show_config(&config, write)?,
    }

    Ok(())
}

/// Explicit `--config` file, else the default search path. Environment
/// overrides apply either way.
async fn load_config(path: Option<&Path>) -> Result<DeckgenConfig> {
    let Some(path) = path else {
        return Ok(DeckgenConfig::load_with_fallback());
    };
    let mut config = DeckgenConfig::load(path)
        .await
        .with_context(|| format!("failed to load config from {}", path.display()))?;
    config.apply_env(|key| std::env::var(key).ok());
    Ok(config)
}

fn init_tracing(debug: bool, log_path: Option<&Path>, owns_screen: bool) -> Result<()> {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match log_path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
        }
        None if owns_screen => builder.with_writer(std::io::sink).try_init(),
        None => builder.with_writer(std::io::stderr).try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!(e))
}

fn generators(
    config: &DeckgenConfig,
    offline: bool,
) -> Result<(Arc<dyn ContentGenerator>, Arc<dyn ImageGenerator>)> {
    if offline {
        info!("Using offline generator");
        return Ok((Arc::new(StubGenerator), Arc::new(StubGenerator)));
    }
    let adapter = Arc::new(GeminiAdapter::from_config(config)?);
    info!(
        "Using content model {} and image model {}",
        config.content_model, config.image_model
    );
    Ok((adapter.clone(), adapter))
}

fn spawn_engine(config: &DeckgenConfig, offline: bool) -> Result<DeckEngine> {
    let (content, images) = generators(config, offline)?;
    let engine_config = EngineConfig {
        image_timeout: config.image_timeout(),
    };
    Ok(DeckEngine::spawn(content, images, engine_config))
}

async fn generate(engine: &DeckEngine, source: Source, out: &Path) -> Result<PathBuf> {
    let outcome = match source {
        Source::Topic(text) => engine.begin_generation(text).await?,
        Source::File(path) => {
            eprintln!("Reading {}...", path.display());
            engine.upload(path).await?
        }
    };
    match outcome {
        BeginOutcome::Preview => {}
        BeginOutcome::Ignored => bail!("Nothing to generate from: the input is empty"),
        BeginOutcome::Failed(message) => bail!(message),
        BeginOutcome::Superseded => bail!("Generation was interrupted"),
    }

    let state = engine.snapshot();
    if let Some(deck) = &state.deck {
        println!("{} ({} slides)", deck.main_title, deck.slide_count());
    }

    let mut updates = engine.subscribe();
    let mut reported = 0;
    loop {
        let state = updates.borrow_and_update().clone();
        let ready = state.images_ready();
        if ready != reported {
            reported = ready;
            eprintln!("  images {ready}/{}", state.position_count());
        }
        if state.is_settled() {
            break;
        }
        updates.changed().await?;
    }

    let artifact = engine.export(&PptxExporter)?;
    let path = artifact.write_to(out)?;
    println!("Saved to {}", path.display());
    Ok(path)
}

fn show_config(config: &DeckgenConfig, write: bool) -> Result<()> {
    if write {
        let path = DeckgenConfig::config_path()?;
        config.save_to_file(&path)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }
    let mut shown = config.clone();
    if shown.api_key.is_some() {
        shown.api_key = Some("********".to_string());
    }
    println!("{shown:#?}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_is_required_and_exclusive() {
        assert!(Cli::try_parse_from(["deckgen", "generate"]).is_err());
        let both = ["deckgen", "generate", "--topic", "a", "--file", "b.txt"];
        assert!(Cli::try_parse_from(both).is_err());

        let cli =
            Cli::try_parse_from(["deckgen", "generate", "--topic", "Bees", "--offline"]).unwrap();
        assert!(cli.offline);
        match cli.command {
            Some(Commands::Generate { input, out }) => {
                assert!(matches!(input.source(), Source::Topic(t) if t == "Bees"));
                assert!(out.is_none());
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_preview_with_file() {
        let cli = Cli::try_parse_from(["deckgen", "preview", "--file", "notes.docx"]).unwrap();
        match cli.command {
            Some(Commands::Preview { input }) => {
                assert!(matches!(input.source(), Source::File(p) if p == Path::new("notes.docx")));
            }
            _ => panic!("expected preview"),
        }
    }

    #[tokio::test]
    async fn test_offline_generate_writes_pptx() {
        let dir = tempfile::tempdir().unwrap();
        let engine = spawn_engine(&DeckgenConfig::default(), true).unwrap();
        let path = generate(&engine, Source::Topic("Deep sea\nAnglerfish".to_string()), dir.path())
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("Deep_sea.pptx"));
        assert!(std::fs::read(&path).unwrap().starts_with(b"PK"));
    }

    #[tokio::test]
    async fn test_generate_rejects_blank_topic() {
        let dir = tempfile::tempdir().unwrap();
        let engine = spawn_engine(&DeckgenConfig::default(), true).unwrap();
        let err = generate(&engine, Source::Topic("   ".to_string()), dir.path())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[tokio::test]
    async fn test_explicit_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deckgen.toml");
        std::fs::write(&path, "image_timeout_secs = 7\noutput_dir = \"slides\"\n").unwrap();
        let config = load_config(Some(&path)).await.unwrap();
        assert_eq!(config.image_timeout_secs, 7);
        assert_eq!(config.output_dir, PathBuf::from("slides"));

        let missing = dir.path().join("missing.json");
        let err = load_config(Some(&missing)).await.unwrap_err();
        assert!(err.to_string().contains("failed to load config"));
    }

    #[test]
    fn test_online_requires_api_key() {
        let config = DeckgenConfig::default();
        assert!(spawn_engine(&config, false).is_err());
    }
}
