use crossterm::event::{self, Event};
use std::io;
use std::sync::mpsc::{self, Receiver};

#[derive(Debug)]
pub enum InputMessage {
    Event(Event),
    ReadError(String),
}

pub type InputReceiver = Receiver<InputMessage>;

/// Blocks on terminal events off the main thread so the dashboard loop
/// only ever does a non-blocking `try_recv`.
pub fn spawn_input_thread() -> io::Result<InputReceiver> {
    spawn_event_reader(event::read)
}

/// Forwards everything `read` yields until it fails or the receiver is
/// dropped. A read failure is sent on as the last message.
fn spawn_event_reader<F>(mut read: F) -> io::Result<InputReceiver>
where
    F: FnMut() -> io::Result<Event> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    std::thread::Builder::new()
        .name("depthwatch-input".into())
        .spawn(move || loop {
            match read() {
                Ok(ev) => {
                    if tx.send(InputMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    tracing::warn!(%err, "terminal event read failed");
                    let _ = tx.send(InputMessage::ReadError(err.to_string()));
                    break;
                }
            }
        })?;
    Ok(rx)
}
