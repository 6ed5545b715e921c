use std::io;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam::channel::{unbounded, Receiver, Sender, TryRecvError};
use crossterm::event::{self, Event, KeyCode};
use log::{debug, warn};

/// Operator intent, independent of the input surface that produced it.
/// Keyboard, a future UI button, and the interrupt handler all feed the
/// same channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
    StartRecording,
    Pause,
    Resume,
    Stop,
    Disconnect,
}

/// Receiving side of the operator channel, drained once per tick.
pub struct OperatorControl {
    rx: Receiver<OperatorCommand>,
}

impl OperatorControl {
    pub fn channel() -> (Sender<OperatorCommand>, Self) {
        let (tx, rx) = unbounded();
        (tx, Self { rx })
    }

    /// Non-blocking; `None` when no command is pending.
    pub fn try_next(&self) -> Option<OperatorCommand> {
        match self.rx.try_recv() {
            Ok(cmd) => Some(cmd),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                // All senders gone: treat as an orderly shutdown request.
                Some(OperatorCommand::Disconnect)
            }
        }
    }
}

/// Keyboard control surface:
/// Enter starts or resumes, Space pauses, `s` stops the session,
/// `q` (or Esc) disconnects and exits.
pub fn spawn_keyboard_listener(tx: Sender<OperatorCommand>) -> io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("operator-kbd".to_string())
        .spawn(move || {
            if let Err(err) = crossterm::terminal::enable_raw_mode() {
                warn!("operator: raw mode unavailable, keyboard control disabled: {err}");
                return;
            }
            loop {
                match event::poll(Duration::from_millis(200)) {
                    Ok(false) => continue,
                    Ok(true) => {}
                    Err(err) => {
                        warn!("operator: event poll failed: {err}");
                        break;
                    }
                }
                let key = match event::read() {
                    Ok(Event::Key(key)) => key,
                    Ok(_) => continue,
                    Err(err) => {
                        warn!("operator: event read failed: {err}");
                        break;
                    }
                };
                let command = match key.code {
                    KeyCode::Enter => Some(OperatorCommand::StartRecording),
                    KeyCode::Char(' ') => Some(OperatorCommand::Pause),
                    KeyCode::Char('r') => Some(OperatorCommand::Resume),
                    KeyCode::Char('s') => Some(OperatorCommand::Stop),
                    KeyCode::Char('q') | KeyCode::Esc => Some(OperatorCommand::Disconnect),
                    _ => None,
                };
                if let Some(command) = command {
                    debug!("operator: {command:?}");
                    let exit = command == OperatorCommand::Disconnect;
                    if tx.send(command).is_err() || exit {
                        break;
                    }
                }
            }
            let _ = crossterm::terminal::disable_raw_mode();
        })
}
