use std::fs::{self, File};
use std::io::stdout;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use ratatui::crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use ratatui::crossterm::execute;
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod controller;
mod debt;
mod domain;
mod inputter;
mod loader;
mod model;
mod query;
mod ui;

use controller::Controller;
use domain::{API_URL, AppConfig, DebtsError};
use loader::Source;
use model::{Model, Status};
use ui::TableUI;

/// Browse the list of top debts in the terminal.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Endpoint returning the debts list as a JSON array
    #[arg(short, long, default_value = API_URL)]
    url: String,

    /// Read the debts list from a local JSON file instead of the endpoint
    #[arg(short, long)]
    file: Option<String>,

    /// Where to write the log
    #[arg(long, default_value = "~/.local/state/debts/debts.log")]
    log_file: String,

    /// Terminal event poll interval in milliseconds
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,

    /// Hide the key hints in the status line
    #[arg(long)]
    no_hints: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = run(cli);
    ratatui::restore();
    match result {
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn expand_path(path: &str) -> Result<PathBuf, DebtsError> {
    shellexpand::full(path)
        .map(|p| PathBuf::from(p.as_ref()))
        .map_err(|e| DebtsError::InvalidPath(e.to_string()))
}

fn setup_logging(path: &str) -> Result<(), DebtsError> {
    let path = expand_path(path)?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = File::create(&path)?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .with(ErrorLayer::default())
        .try_init()
        .map_err(|e| DebtsError::LoggingFailed(e.to_string()))
}

fn build_config(cli: &Cli) -> Result<AppConfig, DebtsError> {
    let mut cfg = AppConfig::default()
        .url(cli.url.clone())
        .event_poll_time(cli.poll_ms)
        .show_hints(!cli.no_hints);
    if let Some(file) = &cli.file {
        cfg = cfg.source_file(expand_path(file)?);
    }
    Ok(cfg)
}

fn run(cli: Cli) -> Result<(), DebtsError> {
    setup_logging(&cli.log_file)?;
    let cfg = build_config(&cli)?;
    info!("Starting debts viewer with {cfg:?}");

    let source = match &cfg.source_file {
        Some(path) => Source::File(path.clone()),
        None => Source::Remote(cfg.url.clone()),
    };
    // The list is loaded exactly once per run
    let mut controller = Controller::new(&cfg, loader::spawn(source));

    let mut terminal = ratatui::init();
    execute!(stdout(), EnableMouseCapture)?;

    let size = terminal.size()?;
    let mut model = Model::init(&cfg, size.width, size.height);
    let mut ui = TableUI::new(&cfg);

    let result = (|| -> Result<(), DebtsError> {
        while model.status != Status::Quitting {
            // Render the current view
            terminal.draw(|f| ui.draw(&model, f))?;

            // Handle events and map to a Message
            if let Some(message) = controller.handle_event(&model)? {
                model.update(message);
            };
        }
        Ok(())
    })();

    execute!(stdout(), DisableMouseCapture)?;
    info!("Bye!");
    result
}
