use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::{io, thread};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

const QUIT: u8 = b'q';

/// What the reader thread hands to the event loop.
#[derive(Debug)]
pub enum Input {
    Key(u8),
    /// Save and stop. The loop answers on the sender once the save is done.
    Quit(oneshot::Sender<()>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Pause,
    Skip,
    Reset,
    Lengthen,
    Shorten,
}

impl Command {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b's' => Some(Self::Pause),
            b'f' => Some(Self::Skip),
            b'r' => Some(Self::Reset),
            b'+' | b'=' => Some(Self::Lengthen),
            b'-' => Some(Self::Shorten),
            _ => None,
        }
    }
}

// ============================================================================
// Reader Thread
// ============================================================================

pub fn spawn(tx: mpsc::Sender<Input>) -> thread::JoinHandle<()> {
    thread::spawn(move || forward(read_key, &tx))
}

/// Waits for the reader to finish. Returns `false` if it panicked.
pub fn join(reader: thread::JoinHandle<()>) -> bool {
    match reader.join() {
        Ok(()) => true,
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .copied()
                .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
                .unwrap_or("unknown");
            warn!(reason, "input reader thread panicked");
            false
        }
    }
}

fn read_key() -> io::Result<Option<u8>> {
    match event::read()? {
        Event::Key(KeyEvent { code: KeyCode::Char('c'), modifiers, kind: KeyEventKind::Press, .. })
            if modifiers.contains(KeyModifiers::CONTROL) =>
        {
            Ok(Some(QUIT))
        }
        Event::Key(KeyEvent { code: KeyCode::Char(c), kind: KeyEventKind::Press, .. })
            if c.is_ascii() =>
        {
            Ok(Some(c as u8))
        }
        _ => Ok(None),
    }
}

/// Pumps keys from `next_key` into `tx` until quit, then waits for the loop
/// to confirm the session was saved.
pub fn forward<F>(mut next_key: F, tx: &mpsc::Sender<Input>)
where
    F: FnMut() -> io::Result<Option<u8>>,
{
    loop {
        match next_key() {
            Ok(Some(QUIT)) => break,
            Ok(Some(byte)) => {
                if tx.blocking_send(Input::Key(byte)).is_err() {
                    debug!("event loop gone, reader exiting");
                    return;
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "reading keys failed, quitting");
                break;
            }
        }
    }

    let (ack_tx, ack_rx) = oneshot::channel();
    if tx.blocking_send(Input::Quit(ack_tx)).is_ok() {
        // wait for confirmation that the shutdown save is complete
        let _ = ack_rx.blocking_recv();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scripted(keys: Vec<io::Result<Option<u8>>>) -> impl FnMut() -> io::Result<Option<u8>> {
        let mut keys = keys.into_iter();
        move || keys.next().unwrap_or(Ok(Some(QUIT)))
    }

    #[test]
    fn maps_command_bytes() {
        assert_eq!(Command::from_byte(b's'), Some(Command::Pause));
        assert_eq!(Command::from_byte(b'f'), Some(Command::Skip));
        assert_eq!(Command::from_byte(b'r'), Some(Command::Reset));
        assert_eq!(Command::from_byte(b'='), Some(Command::Lengthen));
        assert_eq!(Command::from_byte(b'-'), Some(Command::Shorten));
        assert_eq!(Command::from_byte(b'x'), None);
        assert_eq!(Command::from_byte(b'S'), None);
    }

    #[test]
    fn forwards_keys_then_waits_for_quit_ack() {
        let (tx, mut rx) = mpsc::channel(8);
        let reader = thread::spawn(move || {
            forward(scripted(vec![Ok(Some(b's')), Ok(None), Ok(Some(b'x')), Ok(Some(QUIT))]), &tx)
        });

        assert!(matches!(rx.blocking_recv(), Some(Input::Key(b's'))));
        assert!(matches!(rx.blocking_recv(), Some(Input::Key(b'x'))));
        match rx.blocking_recv() {
            Some(Input::Quit(ack)) => {
                assert!(!reader.is_finished());
                ack.send(()).unwrap();
            }
            other => panic!("expected quit, got {other:?}"),
        }
        reader.join().unwrap();
        assert!(rx.blocking_recv().is_none());
    }

    #[test]
    fn read_error_requests_a_clean_quit() {
        let (tx, mut rx) = mpsc::channel(8);
        let reader = thread::spawn(move || {
            forward(scripted(vec![Err(io::Error::other("tty gone"))]), &tx)
        });

        match rx.blocking_recv() {
            Some(Input::Quit(ack)) => ack.send(()).unwrap(),
            other => panic!("expected quit, got {other:?}"),
        }
        reader.join().unwrap();
    }

    #[test]
    fn join_reports_a_panicked_reader() {
        assert!(join(thread::spawn(|| {})));
        assert!(!join(thread::spawn(|| panic!("stdin vanished"))));
    }

    #[test]
    fn stops_quietly_when_the_loop_is_gone() {
        let (tx, rx) = mpsc::channel(8);
        drop(rx);
        forward(scripted(vec![Ok(Some(b's'))]), &tx);
    }
}
