//! view-labels - fuzzy search over cluster node label keys
//!
//! Read-only: nothing is ever written back to the cluster.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::{Parser, ValueEnum};
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use view_labels::events::{AppEvent, EventHandler, map_key};
use view_labels::{
    App, FilterOrder, FuzzyFilter, KubeNodeSource, NodeLabelIndex, ViewConfig, ViewModel,
    WatchSynchronizer, ui,
};

/// Resource kinds that can be inspected.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ResourceKind {
    /// Nodes
    #[value(name = "node", aliases = ["no", "nodes"])]
    Node,
}

#[derive(Parser)]
#[command(name = "view-labels")]
#[command(about = "Fuzzy search with label keys for a resource")]
#[command(version)]
struct Cli {
    /// Resource to inspect
    resource: ResourceKind,

    /// Path to a kubeconfig file
    #[arg(long)]
    kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    #[arg(long)]
    context: Option<String>,

    /// Label keys per page
    #[arg(long, default_value = "10")]
    page_size: usize,

    /// Ordering of matching keys
    #[arg(long, value_enum, default_value_t = FilterOrder::Catalogue)]
    order: FilterOrder,

    /// Initial search query
    #[arg(long, default_value = "")]
    query: String,

    /// Print the matching keys and node values as JSON and exit
    #[arg(long)]
    json: bool,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn view_config(&self) -> ViewConfig {
        let mut config = ViewConfig::new()
            .with_page_size(self.page_size)
            .with_filter_order(self.order);
        if let Some(path) = &self.kubeconfig {
            config = config.with_kubeconfig(path);
        }
        if let Some(context) = &self.context {
            config = config.with_context(context);
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_file.as_deref(), cli.json)?;

    let config = cli.view_config();
    config.validate()?;

    let ResourceKind::Node = cli.resource;
    let source = KubeNodeSource::connect(&config).await?;
    let index = NodeLabelIndex::new().shared();

    if cli.json {
        WatchSynchronizer::new(index.clone()).seed(&source).await?;
        let view = ViewModel::build(
            &index.lock(),
            &FuzzyFilter::new(config.filter_order),
            &cli.query,
        );
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    // Seed before touching the terminal so a failed listing shows no UI.
    let mut events = EventHandler::new();
    let cancel = CancellationToken::new();
    let watch_task = WatchSynchronizer::new(index.clone())
        .with_notifier(events.sender())
        .start(&source, cancel.clone())
        .await?;

    let mut terminal = match setup_terminal() {
        Ok(terminal) => terminal,
        Err(err) => {
            let _ = disable_raw_mode();
            cancel.cancel();
            return Err(err.into());
        }
    };

    let app = App::new(index, &config).with_query(cli.query);
    events.start_polling(config.tick_rate);
    let result = run_app(&mut terminal, app, &mut events, &config).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    cancel.cancel();
    if let Err(err) = watch_task.await {
        warn!(error = %err, "Watch task did not shut down cleanly");
    }

    if let Err(err) = result {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }

    Ok(())
}

fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
    events: &mut EventHandler,
    config: &ViewConfig,
) -> anyhow::Result<()> {
    info!("Interaction loop started");

    while app.is_running() {
        terminal.draw(|frame| ui::draw(frame, &app, config))?;

        match events.next().await {
            Some(AppEvent::Key(key)) => {
                if let Some(input) = map_key(key) {
                    app.handle_input(input);
                }
            }
            Some(AppEvent::IndexChanged(generation)) => {
                app.on_index_changed(generation);
            }
            Some(AppEvent::Resize(_, _) | AppEvent::Tick) => {
                // Redrawn at the top of the loop
            }
            None => break,
        }
    }

    Ok(())
}

/// Route logs to `log_file` if given. Without one, interactive mode discards
/// logs (the terminal belongs to the UI) and JSON mode writes to stderr.
fn init_logging(log_file: Option<&Path>, json_mode: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("view_labels=info"));
    let registry = tracing_subscriber::registry().with(filter);

    match log_file {
        Some(path) => {
            let file = File::create(path)?;
            registry
                .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
                .init();
        }
        None if json_mode => {
            registry.with(fmt::layer().with_writer(io::stderr)).init();
        }
        None => {}
    }

    Ok(())
}
