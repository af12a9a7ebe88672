use std::fmt;
use std::io::Error;
use std::path::PathBuf;

use derive_setters::Setters;
use ratatui::crossterm::event::KeyEvent;

use crate::debt::Column;
use crate::loader::LoadOutcome;

pub const API_URL: &str = "https://rekrutacja-webhosting-it.krd.pl/api/Recruitment/GetTopDebts";

pub const TEXT_LOADING: &str = "Wczytywanie danych...";
pub const TEXT_NO_DATA: &str = "Brak dostępnych danych";
pub const TEXT_SEARCH_PLACEHOLDER: &str = "Podaj NIP lub nazwę dłużnika";
pub const TEXT_SEARCH_BUTTON: &str = "Szukaj";
pub const TEXT_LOAD_FAILED: &str = "Nie udało się wczytać danych";

pub const HELP_TEXT: &str = "\
Tab / Shift+Tab   zmiana aktywnego pola
/                 przejdź do wyszukiwania
Enter / Spacja    naciśnij przycisk / sortuj po kolumnie
1-4               sortuj po kolumnie
←/→               wybór kolumny
↑/↓ j/k           wybór wiersza
PgUp/PgDn         przewiń stronę
g / G             początek / koniec tabeli
c                 kopiuj komórkę
y                 kopiuj wiersz
?                 pomoc
Esc               zamknij okno
q                 wyjście";

#[derive(Debug, Clone, Setters)]
#[setters(into)]
pub struct AppConfig {
    pub url: String,
    #[setters(strip_option)]
    pub source_file: Option<PathBuf>,
    pub event_poll_time: u64,
    pub status_message_timeout: u64,
    pub show_hints: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            url: API_URL.to_string(),
            source_file: None,
            event_poll_time: 100,
            status_message_timeout: 4000,
            show_hints: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    SearchInput,
    SearchButton,
    Table,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::SearchInput => Focus::SearchButton,
            Focus::SearchButton => Focus::Table,
            Focus::Table => Focus::SearchInput,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            Focus::SearchInput => Focus::Table,
            Focus::SearchButton => Focus::SearchInput,
            Focus::Table => Focus::SearchButton,
        }
    }
}

#[derive(Debug)]
pub enum Message {
    Quit,
    Loaded(LoadOutcome),
    RawKey(KeyEvent),
    FocusNext,
    FocusPrevious,
    FocusSearch,
    Activate,
    SortBy(Column),
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    MovePageUp,
    MovePageDown,
    MoveBeginning,
    MoveEnd,
    CopyCell,
    CopyRow,
    Help,
    Exit,
    Click(u16, u16),
    Resize(u16, u16),
}

#[derive(Debug)]
pub enum DebtsError {
    IoError(Error),
    HttpError(reqwest::Error),
    JsonError(serde_json::Error),
    BadStatus(u16),
    InvalidPath(String),
    LoggingFailed(String),
}

impl fmt::Display for DebtsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DebtsError::IoError(e) => write!(f, "io error: {e}"),
            DebtsError::HttpError(e) => write!(f, "request failed: {e}"),
            DebtsError::JsonError(e) => write!(f, "invalid response: {e}"),
            DebtsError::BadStatus(code) => write!(f, "network response was not ok ({code})"),
            DebtsError::InvalidPath(e) => write!(f, "invalid path: {e}"),
            DebtsError::LoggingFailed(e) => write!(f, "could not set up logging: {e}"),
        }
    }
}

impl std::error::Error for DebtsError {}

impl From<Error> for DebtsError {
    fn from(err: Error) -> Self {
        DebtsError::IoError(err)
    }
}

impl From<reqwest::Error> for DebtsError {
    fn from(err: reqwest::Error) -> Self {
        DebtsError::HttpError(err)
    }
}

impl From<serde_json::Error> for DebtsError {
    fn from(err: serde_json::Error) -> Self {
        DebtsError::JsonError(err)
    }
}
