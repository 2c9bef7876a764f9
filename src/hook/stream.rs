//! Raw event stream handed back by [`Hook::start`](crate::Hook::start)

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::warn;

use crate::events::Event;

/// Every event the dispatcher processed, in arrival order
///
/// Events appear after their chord callbacks have run. The stream ends when
/// the session stops, either explicitly or because the source closed. A
/// reader that falls too far behind skips ahead and the gap is logged;
/// it never holds up dispatch.
#[derive(Debug)]
pub struct EventStream {
    rx: broadcast::Receiver<Event>,
}

impl EventStream {
    pub(crate) fn new(rx: broadcast::Receiver<Event>) -> Self {
        Self { rx }
    }

    /// Next event, or `None` once the session is over
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "raw event stream lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next event if one is already buffered
    pub fn try_recv(&mut self) -> Option<Event> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "raw event stream lagged");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio_test::task;
    use tokio_test::{assert_pending, assert_ready_eq};

    use super::*;
    use crate::events::Kind;

    #[test]
    fn test_recv_waits_then_completes() {
        let (tx, rx) = broadcast::channel(4);
        let mut stream = EventStream::new(rx);

        {
            let mut next = task::spawn(stream.recv());
            assert_pending!(next.poll());

            tx.send(Event::key(Kind::KeyDown, 30)).unwrap();
            assert!(next.is_woken());
            assert_ready_eq!(next.poll(), Some(Event::key(Kind::KeyDown, 30)));
        }

        drop(tx);
        let mut next = task::spawn(stream.recv());
        assert_ready_eq!(next.poll(), None);
    }

    #[test]
    fn test_lagging_reader_skips_ahead() {
        let (tx, rx) = broadcast::channel(2);
        let mut stream = EventStream::new(rx);
        for code in 1..=4 {
            tx.send(Event::key(Kind::KeyDown, code)).unwrap();
        }

        assert_eq!(stream.try_recv().map(|e| e.keycode), Some(3));
        assert_eq!(stream.try_recv().map(|e| e.keycode), Some(4));
        assert_eq!(stream.try_recv(), None);
    }
}
