use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Instant;

use tracing::{debug, error, info, instrument};
use tracing_error::SpanTrace;

use crate::debt::Debt;
use crate::domain::DebtsError;

/// Where the debts list comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Remote(String),
    File(PathBuf),
}

/// Result of the one load a viewer performs.
pub type LoadOutcome = Result<Vec<Debt>, DebtsError>;

#[derive(Debug, Default)]
pub enum LoadState {
    #[default]
    Pending,
    Loaded(Vec<Debt>),
    Failed(String),
}

impl LoadState {
    pub fn debts(&self) -> &[Debt] {
        match self {
            LoadState::Loaded(debts) => debts,
            LoadState::Pending | LoadState::Failed(_) => &[],
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, LoadState::Pending)
    }
}

impl From<LoadOutcome> for LoadState {
    fn from(outcome: LoadOutcome) -> Self {
        match outcome {
            Ok(debts) => LoadState::Loaded(debts),
            Err(e) => LoadState::Failed(e.to_string()),
        }
    }
}

/// Starts the load on a background thread. Exactly one outcome is sent.
///
/// If the receiver is gone by the time the load finishes, the outcome is dropped.
pub fn spawn(source: Source) -> flume::Receiver<LoadOutcome> {
    let (tx, rx) = flume::bounded(1);
    thread::spawn(move || {
        let outcome = load(&source);
        if tx.send(outcome).is_err() {
            debug!("Viewer is gone, dropping load result for {source:?}");
        }
    });
    rx
}

#[instrument]
pub fn load(source: &Source) -> LoadOutcome {
    let start_time = Instant::now();
    let outcome = match source {
        Source::Remote(url) => fetch(url),
        Source::File(path) => read_file(path),
    };
    match &outcome {
        Ok(debts) => info!(
            "Loaded {} debts in {}ms ...",
            debts.len(),
            start_time.elapsed().as_millis()
        ),
        Err(e) => error!("Error fetching data: {e}\n{}", SpanTrace::capture()),
    }
    outcome
}

fn fetch(url: &str) -> LoadOutcome {
    let response = reqwest::blocking::get(url)?;
    let status = response.status();
    let body = response.bytes()?;
    parse_response(status.as_u16(), &body)
}

fn read_file(path: &PathBuf) -> LoadOutcome {
    let body = fs::read(path)?;
    Ok(serde_json::from_slice(&body)?)
}

/// Anything outside 2xx counts as a failed load, whatever the body holds.
pub fn parse_response(status: u16, body: &[u8]) -> LoadOutcome {
    if !(200..300).contains(&status) {
        return Err(DebtsError::BadStatus(status));
    }
    Ok(serde_json::from_slice(body)?)
}
