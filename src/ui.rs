use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Position, Rect},
    style::{Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Cell, Clear, HighlightSpacing, Paragraph, Row, Table, TableState},
};

use crate::debt::Column;
use crate::domain::{
    AppConfig, Focus, HELP_TEXT, TEXT_LOADING, TEXT_NO_DATA, TEXT_SEARCH_BUTTON,
    TEXT_SEARCH_PLACEHOLDER,
};
use crate::model::Model;

pub const SEARCH_HEIGHT: u16 = 3;
pub const STATUSLINE_HEIGHT: u16 = 1;
pub const TABLE_HEADER_HEIGHT: u16 = 1;
pub const BUTTON_WIDTH: u16 = 10;
pub const COLUMN_SPACING: u16 = 1;
// Name, NIP, Value, Date. Fixed widths leave room for the label and the sort indicator.
pub const COLUMN_WIDTHS: [Constraint; 4] = [
    Constraint::Fill(1),
    Constraint::Length(12),
    Constraint::Length(18),
    Constraint::Length(29),
];

const FOCUS_COLOR: ratatui::style::Color = ratatui::style::Color::Yellow;

#[derive(Debug)]
pub struct TableUI {
    show_hints: bool,
}

impl TableUI {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            show_hints: config.show_hints,
        }
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let layout = model.layout();
        let main = layout.search_input.union(layout.table);

        if model.load_state().is_pending() {
            Self::draw_message(TEXT_LOADING, main, frame);
        } else if !model.has_data() {
            Self::draw_message(TEXT_NO_DATA, main, frame);
        } else {
            self.draw_search(model, frame);
            self.draw_table(model, frame);
        }
        self.draw_statusline(model, frame);

        if model.show_popup() {
            Self::draw_help(frame);
        }
    }

    fn draw_message(text: &str, area: Rect, frame: &mut Frame) {
        frame.render_widget(Paragraph::new(text).block(Block::bordered()), area);
    }

    fn focus_style(model: &Model, focus: Focus) -> Style {
        if model.focus() == focus {
            Style::default().fg(FOCUS_COLOR)
        } else {
            Style::default()
        }
    }

    fn draw_search(&self, model: &Model, frame: &mut Frame) {
        let layout = model.layout();
        let (visible, curser) = model.visible_draft();

        let content = if model.draft().is_empty() {
            Line::from(TEXT_SEARCH_PLACEHOLDER.dark_gray())
        } else {
            Line::from(visible)
        };
        let input = Paragraph::new(content).block(
            Block::bordered().border_style(Self::focus_style(model, Focus::SearchInput)),
        );
        frame.render_widget(input, layout.search_input);

        if model.focus() == Focus::SearchInput && !model.show_popup() {
            frame.set_cursor_position(Position::new(
                layout.search_input.x + 1 + curser as u16,
                layout.search_input.y + 1,
            ));
        }

        let mut button_style = Style::default().bold();
        if model.focus() == Focus::SearchButton {
            button_style = button_style.add_modifier(Modifier::REVERSED);
        }
        let button = Paragraph::new(Span::styled(TEXT_SEARCH_BUTTON, button_style))
            .centered()
            .block(Block::bordered().border_style(Self::focus_style(model, Focus::SearchButton)));
        frame.render_widget(button, layout.search_button);
    }

    fn draw_table(&self, model: &Model, frame: &mut Frame) {
        let sort = model.sort();
        let table_focused = model.focus() == Focus::Table;

        let header = Row::new(Column::SHOWN.iter().enumerate().map(|(idx, &column)| {
            let mut style = Style::default().bold();
            if table_focused && idx == model.header_curser() {
                style = style.underlined().fg(FOCUS_COLOR);
            }
            Cell::from(format!("{}{}", column.label(), sort.indicator(column))).style(style)
        }))
        .height(TABLE_HEADER_HEIGHT);

        let debts = model.debts();
        let rows = model.visible_rows().iter().map(|&idx| {
            let debt = &debts[idx];
            Row::new(Column::SHOWN.map(|column| Cell::from(debt.cell_text(column))))
        });

        let title = if model.committed_search().is_empty() {
            Line::from(format!(" {} / {} ", model.rows().len(), debts.len()))
        } else {
            Line::from(format!(
                " \"{}\": {} / {} ",
                model.committed_search(),
                model.rows().len(),
                debts.len()
            ))
        };
        let table = Table::new(rows, COLUMN_WIDTHS)
            .header(header)
            .column_spacing(COLUMN_SPACING)
            .flex(Flex::Start)
            .highlight_spacing(HighlightSpacing::Never)
            .row_highlight_style(if table_focused {
                Style::default().reversed()
            } else {
                Style::default().add_modifier(Modifier::DIM | Modifier::REVERSED)
            })
            .block(
                Block::bordered()
                    .title(title.right_aligned())
                    .border_style(Self::focus_style(model, Focus::Table)),
            );

        let mut state = TableState::default();
        if !model.rows().is_empty() {
            state.select(Some(model.curser_row()));
        }
        frame.render_stateful_widget(table, model.layout().table, &mut state);
    }

    fn draw_statusline(&self, model: &Model, frame: &mut Frame) {
        let area = model.layout().statusline;
        let [left, right] =
            Layout::horizontal([Constraint::Min(0), Constraint::Length(28)]).areas(area);

        if let Some(message) = model.status_message() {
            frame.render_widget(Paragraph::new(Span::from(message).cyan()), left);
        }
        if self.show_hints {
            let hints = Line::from(vec![
                "<?>".blue().bold(),
                " pomoc ".into(),
                "<Ctrl+C>".blue().bold(),
                " wyjście".into(),
            ]);
            frame.render_widget(Paragraph::new(hints).right_aligned(), right);
        }
    }

    fn draw_help(frame: &mut Frame) {
        let area = centered_rect(60, 70, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(HELP_TEXT).block(Block::bordered().title(" Pomoc ".bold()));
        frame.render_widget(help, area);
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let [_, middle, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(area);

    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(middle);
    center
}
