use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};
use tracing::trace;

/// Single line editor behind the search box. Holds the draft search term.
#[derive(Default)]
pub struct Inputter {
    current_input: String,
    curser_pos: usize,
    input_width: usize,
}

impl Inputter {
    pub fn read(&mut self, key: event::KeyEvent) {
        match (key.code, key.modifiers) {
            (KeyCode::Esc, _) => self.clear(),
            (KeyCode::Backspace, _) => self.backspace(),
            (KeyCode::Delete, _) => self.delete(),
            (KeyCode::Left, _) => self.left(),
            (KeyCode::Right, _) => self.right(),
            (KeyCode::Home, _) => self.curser_pos = 0,
            (KeyCode::End, _) => self.curser_pos = self.len(),
            (kc, km) => self.key(kc, km),
        }
        trace!("Input: \"{}\" @ {}", self.current_input, self.curser_pos);
    }

    pub fn value(&self) -> &str {
        &self.current_input
    }

    pub fn set_width(&mut self, width: usize) {
        self.input_width = width;
    }

    /// Part of the input that fits the box, and the curser column inside it.
    pub fn visible(&self) -> (String, usize) {
        if self.input_width == 0 {
            return (String::new(), 0);
        }
        let skip = (self.curser_pos + 1).saturating_sub(self.input_width);
        let text = self
            .current_input
            .chars()
            .skip(skip)
            .take(self.input_width)
            .collect();
        (text, self.curser_pos - skip)
    }

    pub fn clear(&mut self) {
        self.current_input.clear();
        self.curser_pos = 0;
    }

    fn len(&self) -> usize {
        self.current_input.chars().count()
    }

    fn backspace(&mut self) {
        if self.curser_pos > 0 {
            self.curser_pos -= 1;
            let idx = self.getbytepos();
            self.current_input.remove(idx);
        }
    }

    fn delete(&mut self) {
        if self.curser_pos < self.len() {
            let idx = self.getbytepos();
            self.current_input.remove(idx);
        }
    }

    fn left(&mut self) {
        self.curser_pos = self.curser_pos.saturating_sub(1);
    }

    fn right(&mut self) {
        if self.curser_pos < self.len() {
            self.curser_pos += 1;
        }
    }

    fn key(&mut self, code: KeyCode, modifier: KeyModifiers) {
        if modifier.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
            return;
        }
        if let Some(chr) = code.as_char() {
            self.current_input.insert(self.getbytepos(), chr);
            self.curser_pos += 1;
        }
    }

    fn getbytepos(&self) -> usize {
        self.current_input
            .char_indices()
            .nth(self.curser_pos)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.current_input.len())
    }
}
