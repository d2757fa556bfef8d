pub mod thread;

use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers};
use std::fmt;
use std::sync::mpsc::{Receiver, TryRecvError};

use crate::input::thread::InputMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    Quit,
    ToggleWindow,
    ToggleStats,
    ToggleMirror,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    Read(String),
    Disconnected,
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(err) => write!(f, "input thread read failed: {err}"),
            Self::Disconnected => f.write_str("input channel disconnected"),
        }
    }
}

impl std::error::Error for InputError {}

/// Only plain `q`, `w`, `s` and `m` presses mean anything.
pub fn key_command(event: &Event) -> Option<KeyCommand> {
    let Event::Key(key_event) = event else {
        return None;
    };
    if key_event.kind != KeyEventKind::Press {
        return None;
    }
    if key_event
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
    {
        return None;
    }
    match key_event.code {
        KeyCode::Char('q') => Some(KeyCommand::Quit),
        KeyCode::Char('w') => Some(KeyCommand::ToggleWindow),
        KeyCode::Char('s') => Some(KeyCommand::ToggleStats),
        KeyCode::Char('m') => Some(KeyCommand::ToggleMirror),
        _ => None,
    }
}

/// Returns the first recognised command waiting in the channel, if any.
/// Unrecognised events are consumed and dropped; later commands stay
/// queued for the next tick.
pub fn next_key_command(input_rx: &Receiver<InputMessage>) -> Result<Option<KeyCommand>, InputError> {
    loop {
        match input_rx.try_recv() {
            Ok(InputMessage::Event(event)) => {
                if let Some(command) = key_command(&event) {
                    return Ok(Some(command));
                }
            }
            Ok(InputMessage::ReadError(err)) => return Err(InputError::Read(err)),
            Err(TryRecvError::Empty) => return Ok(None),
            Err(TryRecvError::Disconnected) => return Err(InputError::Disconnected),
        }
    }
}
