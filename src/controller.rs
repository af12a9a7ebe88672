use std::time::Duration;
use tracing::trace;

use crate::debt::Column;
use crate::domain::{AppConfig, DebtsError, Message};
use crate::loader::LoadOutcome;
use crate::model::Model;
use ratatui::crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

pub struct Controller {
    event_poll_time: u64,
    loader: Option<flume::Receiver<LoadOutcome>>,
}

impl Controller {
    pub fn new(cfg: &AppConfig, loader: flume::Receiver<LoadOutcome>) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
            loader: Some(loader),
        }
    }

    /// Next message for the model: the load result once it arrives, otherwise terminal input.
    pub fn handle_event(&mut self, model: &Model) -> Result<Option<Message>, DebtsError> {
        if let Some(message) = self.poll_loader() {
            return Ok(Some(message));
        }

        if event::poll(Duration::from_millis(self.event_poll_time))? {
            return Ok(match event::read()? {
                Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                    self.handle_key(key, model.raw_keyevents())
                }
                Event::Mouse(mouse) => self.handle_mouse(mouse),
                Event::Resize(width, height) => Some(Message::Resize(width, height)),
                _ => None,
            });
        }
        Ok(None)
    }

    fn poll_loader(&mut self) -> Option<Message> {
        let rx = self.loader.as_ref()?;
        match rx.try_recv() {
            Ok(outcome) => {
                self.loader = None;
                Some(Message::Loaded(outcome))
            }
            Err(flume::TryRecvError::Empty) => None,
            Err(flume::TryRecvError::Disconnected) => {
                // The loader thread died without sending anything
                self.loader = None;
                Some(Message::Loaded(Err(DebtsError::IoError(std::io::Error::other(
                    "loader stopped without a result",
                )))))
            }
        }
    }

    fn handle_key(&self, key: KeyEvent, raw: bool) -> Option<Message> {
        let message = match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Message::Quit),
            (KeyCode::Tab, _) => Some(Message::FocusNext),
            (KeyCode::BackTab, _) => Some(Message::FocusPrevious),
            (KeyCode::Up, _) if raw => Some(Message::FocusPrevious),
            (KeyCode::Down, _) if raw => Some(Message::FocusNext),
            _ if raw => Some(Message::RawKey(key)),
            (KeyCode::Char('q'), _) => Some(Message::Quit),
            (KeyCode::Char('?'), _) => Some(Message::Help),
            (KeyCode::Esc, _) => Some(Message::Exit),
            (KeyCode::Char('/'), _) => Some(Message::FocusSearch),
            (KeyCode::Enter, _) | (KeyCode::Char(' '), _) => Some(Message::Activate),
            (KeyCode::Up, _) | (KeyCode::Char('k'), _) => Some(Message::MoveUp),
            (KeyCode::Down, _) | (KeyCode::Char('j'), _) => Some(Message::MoveDown),
            (KeyCode::Left, _) | (KeyCode::Char('h'), _) => Some(Message::MoveLeft),
            (KeyCode::Right, _) | (KeyCode::Char('l'), _) => Some(Message::MoveRight),
            (KeyCode::PageUp, _) => Some(Message::MovePageUp),
            (KeyCode::PageDown, _) => Some(Message::MovePageDown),
            (KeyCode::Home, _) | (KeyCode::Char('g'), _) => Some(Message::MoveBeginning),
            (KeyCode::End, _) | (KeyCode::Char('G'), _) => Some(Message::MoveEnd),
            (KeyCode::Char('c'), _) => Some(Message::CopyCell),
            (KeyCode::Char('y'), _) => Some(Message::CopyRow),
            (KeyCode::Char(d @ '1'..='4'), _) => {
                let idx = d as usize - '1' as usize;
                Some(Message::SortBy(Column::SHOWN[idx]))
            }
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }

    fn handle_mouse(&self, mouse: MouseEvent) -> Option<Message> {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => Some(Message::Click(mouse.column, mouse.row)),
            MouseEventKind::ScrollUp => Some(Message::MoveUp),
            MouseEventKind::ScrollDown => Some(Message::MoveDown),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debt::Debt;

    fn controller() -> (Controller, flume::Sender<LoadOutcome>) {
        let (tx, rx) = flume::bounded(1);
        (Controller::new(&AppConfig::default(), rx), tx)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn command_keys() {
        let (c, _tx) = controller();
        assert!(matches!(c.handle_key(key(KeyCode::Char('q')), false), Some(Message::Quit)));
        assert!(matches!(
            c.handle_key(key(KeyCode::Char('3')), false),
            Some(Message::SortBy(Column::Value))
        ));
        assert!(matches!(c.handle_key(key(KeyCode::Enter), false), Some(Message::Activate)));
        assert!(matches!(c.handle_key(key(KeyCode::Char('5')), false), None));
    }

    #[test]
    fn search_box_receives_raw_keys() {
        let (c, _tx) = controller();
        assert!(matches!(
            c.handle_key(key(KeyCode::Char('q')), true),
            Some(Message::RawKey(_))
        ));
        assert!(matches!(c.handle_key(key(KeyCode::Enter), true), Some(Message::RawKey(_))));
        assert!(matches!(c.handle_key(key(KeyCode::Tab), true), Some(Message::FocusNext)));
        assert!(matches!(
            c.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), true),
            Some(Message::Quit)
        ));
    }

    #[test]
    fn left_click_maps_to_position() {
        let (c, _tx) = controller();
        let click = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 12,
            row: 4,
            modifiers: KeyModifiers::NONE,
        };
        assert!(matches!(c.handle_mouse(click), Some(Message::Click(12, 4))));
    }

    #[test]
    fn load_result_is_delivered_once() {
        let (mut c, tx) = controller();
        assert!(c.poll_loader().is_none());
        tx.send(Ok(vec![Debt::default()])).unwrap();
        assert!(matches!(c.poll_loader(), Some(Message::Loaded(Ok(_)))));
        assert!(c.poll_loader().is_none());
    }

    #[test]
    fn dead_loader_becomes_a_failure() {
        let (mut c, tx) = controller();
        drop(tx);
        assert!(matches!(c.poll_loader(), Some(Message::Loaded(Err(_)))));
        assert!(c.poll_loader().is_none());
    }
}
