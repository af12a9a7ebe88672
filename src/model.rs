use std::time::{Duration, Instant};

use arboard::Clipboard;
use ratatui::layout::{Constraint, Layout, Position, Rect};
use ratatui::widgets::Block;
use tracing::{debug, error, info, trace, warn};

use crate::debt::{Column, Debt};
use crate::domain::{AppConfig, Focus, Message, TEXT_LOAD_FAILED};
use crate::inputter::Inputter;
use crate::loader::{LoadOutcome, LoadState};
use crate::query::{SortConfig, visible_rows};
use crate::ui::{
    BUTTON_WIDTH, COLUMN_SPACING, COLUMN_WIDTHS, SEARCH_HEIGHT, STATUSLINE_HEIGHT,
    TABLE_HEADER_HEIGHT,
};

#[derive(Debug, PartialEq)]
pub enum Status {
    Running,
    Quitting,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    Table,
    Popup,
}

/// Screen areas of the viewer, shared by rendering and mouse hit testing.
#[derive(Default, Clone, Debug)]
pub struct UILayout {
    pub width: u16,
    pub height: u16,
    pub search_input: Rect,
    pub search_button: Rect,
    pub table: Rect,
    pub header: Vec<Rect>,
    pub body: Rect,
    pub statusline: Rect,
}

impl UILayout {
    pub fn from_values(width: u16, height: u16) -> Self {
        let area = Rect::new(0, 0, width, height);
        let [search, table, statusline] = Layout::vertical([
            Constraint::Length(SEARCH_HEIGHT),
            Constraint::Min(0),
            Constraint::Length(STATUSLINE_HEIGHT),
        ])
        .areas(area);
        let [search_input, search_button] =
            Layout::horizontal([Constraint::Min(0), Constraint::Length(BUTTON_WIDTH)])
                .areas(search);

        let inner = Block::bordered().inner(table);
        let [header_row, body] = Layout::vertical([
            Constraint::Length(TABLE_HEADER_HEIGHT),
            Constraint::Min(0),
        ])
        .areas(inner);
        let header = Layout::horizontal(COLUMN_WIDTHS)
            .spacing(COLUMN_SPACING)
            .split(header_row)
            .to_vec();

        let layout = UILayout {
            width,
            height,
            search_input,
            search_button,
            table,
            header,
            body,
            statusline,
        };
        trace!("Build UILayout: {:?}", layout);
        layout
    }

    pub fn body_height(&self) -> usize {
        self.body.height as usize
    }
}

pub struct Model {
    config: AppConfig,
    pub status: Status,
    modus: Modus,
    load: LoadState,
    rows: Vec<usize>, // Indices into the loaded debts, filtered and sorted
    search: String,
    input: Inputter,
    sort: SortConfig,
    focus: Focus,
    header_curser: usize,
    curser_row: usize,
    offset_row: usize,
    uilayout: UILayout,
    clipboard: Option<Clipboard>,
    status_message: String,
    last_status_message_update: Instant,
}

impl Model {
    pub fn init(config: &AppConfig, ui_width: u16, ui_height: u16) -> Self {
        let mut model = Self {
            config: config.clone(),
            status: Status::Running,
            modus: Modus::Table,
            load: LoadState::Pending,
            rows: Vec::new(),
            search: String::new(),
            input: Inputter::default(),
            sort: SortConfig::default(),
            focus: Focus::SearchInput,
            header_curser: 0,
            curser_row: 0,
            offset_row: 0,
            uilayout: UILayout::default(),
            clipboard: None,
            status_message: String::new(),
            last_status_message_update: Instant::now(),
        };
        model.ui_resize(ui_width, ui_height);
        model
    }

    pub fn update(&mut self, message: Message) {
        if self.modus == Modus::Popup {
            match message {
                Message::Quit => self.quit(),
                Message::Loaded(outcome) => self.loaded(outcome),
                Message::Resize(width, height) => self.ui_resize(width, height),
                Message::Exit | Message::Help | Message::Click(_, _) | Message::Activate => {
                    self.modus = Modus::Table
                }
                _ => (),
            }
            return;
        }

        match message {
            Message::Quit => self.quit(),
            Message::Loaded(outcome) => self.loaded(outcome),
            Message::Resize(width, height) => self.ui_resize(width, height),
            Message::Help => self.modus = Modus::Popup,
            Message::Exit => (),
            // Everything below needs a loaded, non empty list on screen
            _ if !self.has_data() => (),
            Message::RawKey(key) => {
                if self.focus == Focus::SearchInput {
                    self.input.read(key);
                }
            }
            Message::FocusNext => self.set_focus(self.focus.next()),
            Message::FocusPrevious => self.set_focus(self.focus.previous()),
            Message::FocusSearch => self.set_focus(Focus::SearchInput),
            Message::Activate => self.activate(),
            Message::SortBy(column) => self.sort_by(column),
            Message::MoveUp => self.move_selection_up(1),
            Message::MoveDown => self.move_selection_down(1),
            Message::MovePageUp => self.move_selection_up(self.page_size()),
            Message::MovePageDown => self.move_selection_down(self.page_size()),
            Message::MoveBeginning => self.select_row(0),
            Message::MoveEnd => self.select_row(self.rows.len().saturating_sub(1)),
            Message::MoveLeft => self.header_curser = self.header_curser.saturating_sub(1),
            Message::MoveRight => {
                self.header_curser = std::cmp::min(self.header_curser + 1, Column::SHOWN.len() - 1)
            }
            Message::CopyCell => self.copy_cell(),
            Message::CopyRow => self.copy_row(),
            Message::Click(x, y) => self.click(x, y),
        }
    }

    // -------------------- Accessors for rendering ---------------------- //

    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    pub fn debts(&self) -> &[Debt] {
        self.load.debts()
    }

    /// True once the load finished with at least one record.
    pub fn has_data(&self) -> bool {
        !self.debts().is_empty()
    }

    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    /// The rows currently scrolled into the table body.
    pub fn visible_rows(&self) -> &[usize] {
        let rbegin = std::cmp::min(self.offset_row, self.rows.len());
        let rend = std::cmp::min(rbegin + self.uilayout.body_height(), self.rows.len());
        &self.rows[rbegin..rend]
    }

    pub fn committed_search(&self) -> &str {
        &self.search
    }

    pub fn draft(&self) -> &str {
        self.input.value()
    }

    pub fn visible_draft(&self) -> (String, usize) {
        self.input.visible()
    }

    pub fn sort(&self) -> SortConfig {
        self.sort
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn header_curser(&self) -> usize {
        self.header_curser
    }

    /// Position of the selected row inside the visible rows.
    pub fn curser_row(&self) -> usize {
        self.curser_row
    }

    pub fn selected_debt(&self) -> Option<&Debt> {
        self.rows
            .get(self.offset_row + self.curser_row)
            .and_then(|&idx| self.debts().get(idx))
    }

    pub fn show_popup(&self) -> bool {
        self.modus == Modus::Popup
    }

    pub fn layout(&self) -> &UILayout {
        &self.uilayout
    }

    pub fn status_message(&self) -> Option<&str> {
        let timeout = Duration::from_millis(self.config.status_message_timeout);
        (!self.status_message.is_empty() && self.last_status_message_update.elapsed() < timeout)
            .then_some(self.status_message.as_str())
    }

    /// Key events go to the search box instead of being mapped to commands.
    pub fn raw_keyevents(&self) -> bool {
        self.modus == Modus::Table && self.focus == Focus::SearchInput && self.has_data()
    }

    pub fn quit(&mut self) {
        self.status = Status::Quitting;
    }

    // -------------------- Control handling functions ---------------------- //

    fn loaded(&mut self, outcome: LoadOutcome) {
        if !self.load.is_pending() {
            warn!("Ignoring a second load result, the list is loaded only once");
            return;
        }
        self.load = LoadState::from(outcome);
        let message = match &self.load {
            LoadState::Loaded(debts) => {
                info!("Showing {} debts", debts.len());
                format!("Wczytano {} rekordów", debts.len())
            }
            LoadState::Failed(reason) => {
                error!("Load failed: {reason}");
                TEXT_LOAD_FAILED.to_string()
            }
            LoadState::Pending => String::new(),
        };
        self.set_status_message(message);
        self.refresh_rows();
    }

    fn set_focus(&mut self, focus: Focus) {
        trace!("Focus {:?} -> {:?}", self.focus, focus);
        self.focus = focus;
    }

    fn activate(&mut self) {
        match self.focus {
            Focus::SearchInput => {}
            Focus::SearchButton => self.commit_search(),
            Focus::Table => self.sort_by(Column::SHOWN[self.header_curser]),
        }
    }

    fn commit_search(&mut self) {
        self.search = self.input.value().to_string();
        debug!("Committed search \"{}\"", self.search);
        self.refresh_rows();
        self.set_status_message(format!("Znaleziono {} rekordów", self.rows.len()));
    }

    fn sort_by(&mut self, column: Column) {
        self.sort.toggle(column);
        if let Some(pos) = column.position() {
            self.header_curser = pos;
        }
        debug!("Sort by {} {:?}", column.key(), self.sort.direction);
        self.refresh_rows();
    }

    // Filter and sort are derived from the loaded list, the committed search and the sort config
    fn refresh_rows(&mut self) {
        let start_time = Instant::now();
        self.rows = visible_rows(self.load.debts(), &self.search, self.sort);
        trace!(
            "Derived {} rows in {}us",
            self.rows.len(),
            start_time.elapsed().as_micros()
        );
        self.curser_row = 0;
        self.offset_row = 0;
    }

    fn click(&mut self, x: u16, y: u16) {
        let pos = Position::new(x, y);
        let header_idx = self.uilayout.header.iter().position(|r| r.contains(pos));
        let body = self.uilayout.body;
        trace!("Click at {x}:{y}");
        if self.uilayout.search_input.contains(pos) {
            self.set_focus(Focus::SearchInput);
        } else if self.uilayout.search_button.contains(pos) {
            self.set_focus(Focus::SearchButton);
            self.commit_search();
        } else if let Some(idx) = header_idx {
            self.set_focus(Focus::Table);
            self.sort_by(Column::SHOWN[idx]);
        } else if body.contains(pos) {
            self.set_focus(Focus::Table);
            let row = self.offset_row + (y - body.y) as usize;
            if row < self.rows.len() {
                self.select_row(row);
            }
        }
    }

    fn ui_resize(&mut self, width: u16, height: u16) {
        trace!(
            "UI was resized! w:{}->{}, h:{}->{}",
            self.uilayout.width, width, self.uilayout.height, height
        );
        self.uilayout = UILayout::from_values(width, height);
        self.input
            .set_width(self.uilayout.search_input.width.saturating_sub(2) as usize);
        let selected = self.offset_row + self.curser_row;
        self.select_row(selected);
    }

    fn page_size(&self) -> usize {
        std::cmp::max(self.uilayout.body_height(), 1)
    }

    fn select_row(&mut self, row: usize) {
        if self.rows.is_empty() {
            self.curser_row = 0;
            self.offset_row = 0;
            return;
        }
        let row = std::cmp::min(row, self.rows.len() - 1);
        let height = self.page_size();
        if row < self.offset_row {
            self.offset_row = row;
        } else if row >= self.offset_row + height {
            self.offset_row = row + 1 - height;
        }
        self.curser_row = row - self.offset_row;
    }

    fn move_selection_up(&mut self, size: usize) {
        let row = (self.offset_row + self.curser_row).saturating_sub(size);
        self.select_row(row);
    }

    fn move_selection_down(&mut self, size: usize) {
        let row = self.offset_row + self.curser_row + size;
        self.select_row(row);
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.last_status_message_update = Instant::now();
    }

    fn copy_to_clipboard(&mut self, content: String) {
        if self.clipboard.is_none() {
            match Clipboard::new() {
                Ok(clipboard) => self.clipboard = Some(clipboard),
                Err(e) => {
                    warn!("Clipboard not available: {:?}", e);
                    self.set_status_message("Schowek niedostępny");
                    return;
                }
            }
        }
        if let Some(clipboard) = self.clipboard.as_mut() {
            match clipboard.set_text(content) {
                Ok(_) => {
                    trace!("Copied content to clipboard.");
                    self.set_status_message("Skopiowano do schowka");
                }
                Err(e) => error!("Error copying to clipboard: {:?}", e),
            }
        }
    }

    fn copy_cell(&mut self) {
        let column = Column::SHOWN[self.header_curser];
        if let Some(cell) = self.selected_debt().map(|d| d.cell_text(column)) {
            trace!("Cell content: {}", cell);
            self.copy_to_clipboard(cell);
        }
    }

    fn copy_row(&mut self) {
        let row = self.selected_debt().map(|d| {
            Column::SHOWN
                .iter()
                .map(|&c| wrap_cell_content(&d.cell_text(c)))
                .collect::<Vec<String>>()
                .join(",")
        });
        if let Some(row) = row {
            self.copy_to_clipboard(row);
        }
    }
}

fn wrap_cell_content(c: &str) -> String {
    let needs_escaping = c.contains('"');
    let needs_wrapping = c.chars().any(|c| c == ' ' || c == '\t' || c == ',' || c == '"');
    let mut out = String::from(c);

    if needs_escaping {
        out = out.replace('"', "\"\"");
    }
    if needs_wrapping {
        out = format!("\"{out}\"");
    }
    out
}
