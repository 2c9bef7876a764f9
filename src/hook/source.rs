//! Raw event sources
//!
//! A source is whatever delivers hook events: a native OS listener, a pipe
//! of JSON records, or a test harness. The hook hands it the sending half
//! of the bounded event queue on start and asks it to let go on stop.

use std::io::BufRead;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::events::Event;

use super::HookError;

/// Producer of raw hook events
pub trait EventSource: Send + 'static {
    /// Begin delivering events into `events`
    ///
    /// Sources must apply backpressure when the queue is full rather than
    /// drop events. Dropping the last sender ends the session.
    fn start_capture(&mut self, events: mpsc::Sender<Event>) -> Result<(), HookError>;

    /// Stop delivering events and release the sender
    fn stop_capture(&mut self);
}

/// In-process source fed by hand
///
/// Clones share the same slot, so keep one clone to push events after
/// handing another to [`Hook::new`](crate::Hook::new).
#[derive(Debug, Clone, Default)]
pub struct ChannelSource {
    sender: Arc<Mutex<Option<mpsc::Sender<Event>>>>,
}

impl ChannelSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn sender(&self) -> Option<mpsc::Sender<Event>> {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Queue an event, waiting while the queue is full
    ///
    /// Returns `false` if no session is capturing.
    pub async fn send(&self, event: Event) -> bool {
        match self.sender() {
            Some(tx) => tx.send(event).await.is_ok(),
            None => false,
        }
    }

    /// Queue an event from a non-async thread, blocking while the queue is full
    ///
    /// Must not be called from within an async runtime.
    pub fn blocking_send(&self, event: Event) -> bool {
        match self.sender() {
            Some(tx) => tx.blocking_send(event).is_ok(),
            None => false,
        }
    }

    /// End the current stream, as a native hook shutting down would
    pub fn close(&self) {
        if self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
        {
            debug!("channel source closed");
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.sender().is_some_and(|tx| !tx.is_closed())
    }
}

impl EventSource for ChannelSource {
    fn start_capture(&mut self, events: mpsc::Sender<Event>) -> Result<(), HookError> {
        *self.sender.lock().unwrap_or_else(PoisonError::into_inner) = Some(events);
        Ok(())
    }

    fn stop_capture(&mut self) {
        self.close();
    }
}

/// Reads newline-delimited hook JSON on a dedicated thread
///
/// Undecodable lines are logged and skipped. End of input closes the
/// stream. One reader thread serves every session: a record read while no
/// session is capturing is held and delivered to the next one.
pub struct JsonLineSource<R> {
    reader: Option<R>,
    outlet: Arc<Outlet>,
}

impl<R: BufRead + Send + 'static> JsonLineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
            outlet: Arc::new(Outlet::default()),
        }
    }
}

impl<R: BufRead + Send + 'static> EventSource for JsonLineSource<R> {
    fn start_capture(&mut self, events: mpsc::Sender<Event>) -> Result<(), HookError> {
        if !self.outlet.install(events) {
            return Err(HookError::Capture("hook input already ended".to_string()));
        }

        let Some(reader) = self.reader.take() else {
            debug!("hook reader already running, session attached");
            return Ok(());
        };

        let outlet = Arc::clone(&self.outlet);
        let spawned = thread::Builder::new()
            .name("hook-reader".to_string())
            .spawn(move || {
                info!("hook reader thread started");
                read_lines(reader, &outlet);
                outlet.finish();
                info!("hook reader thread stopped");
            });

        if let Err(e) = spawned {
            self.outlet.finish();
            return Err(HookError::ThreadSpawn(e.to_string()));
        }
        Ok(())
    }

    fn stop_capture(&mut self) {
        self.outlet.release();
    }
}

impl<R> Drop for JsonLineSource<R> {
    fn drop(&mut self) {
        self.outlet.finish();
    }
}

/// Sender handoff between the reader thread and successive sessions
#[derive(Default)]
struct Outlet {
    state: Mutex<OutletState>,
    ready: Condvar,
}

#[derive(Default)]
struct OutletState {
    sender: Option<mpsc::Sender<Event>>,
    /// Input ended or the source was dropped
    finished: bool,
}

impl Outlet {
    fn lock(&self) -> MutexGuard<'_, OutletState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn install(&self, sender: mpsc::Sender<Event>) -> bool {
        let mut state = self.lock();
        if state.finished {
            return false;
        }
        state.sender = Some(sender);
        self.ready.notify_all();
        true
    }

    fn release(&self) {
        if self.lock().sender.take().is_some() {
            debug!("hook reader detached from session");
        }
    }

    /// Drops the installed sender, which ends a running session
    fn finish(&self) {
        let mut state = self.lock();
        state.finished = true;
        state.sender = None;
        self.ready.notify_all();
    }

    /// Block until a session is capturing, `None` once finished
    fn wait_sender(&self) -> Option<mpsc::Sender<Event>> {
        let mut state = self.lock();
        loop {
            if state.finished {
                return None;
            }
            if let Some(sender) = &state.sender {
                return Some(sender.clone());
            }
            state = self
                .ready
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Forget `sender` if it is still the installed one
    fn discard(&self, sender: &mpsc::Sender<Event>) {
        let mut state = self.lock();
        if state
            .sender
            .as_ref()
            .is_some_and(|installed| installed.same_channel(sender))
        {
            state.sender = None;
        }
    }

    /// Hand `event` to the capturing session, waiting for one if needed
    ///
    /// Returns `false` once the source has finished.
    fn deliver(&self, mut event: Event) -> bool {
        loop {
            let Some(sender) = self.wait_sender() else {
                return false;
            };
            // blocks while the queue is full
            match sender.blocking_send(event) {
                Ok(()) => return true,
                Err(mpsc::error::SendError(returned)) => {
                    debug!("event queue closed, holding event for the next session");
                    self.discard(&sender);
                    event = returned;
                }
            }
        }
    }
}

fn read_lines<R: BufRead>(mut reader: R, outlet: &Outlet) {
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => {
                info!("hook input reached end of stream");
                return;
            }
            Ok(_) => {}
            Err(e) => {
                error!(?e, "failed to read hook input");
                return;
            }
        }

        let record = line.trim();
        if record.is_empty() {
            continue;
        }

        let event = match Event::from_json(record) {
            Ok(event) => event,
            Err(e) => {
                warn!(%e, record, "skipping undecodable hook record");
                continue;
            }
        };

        if !outlet.deliver(event) {
            debug!("hook source dropped, reader exiting");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, BufReader, Cursor, Read};
    use std::sync::mpsc as std_mpsc;

    use super::*;
    use crate::events::Kind;
    use crate::keys::CodeSpace;
    use crate::Hook;

    /// Reader that blocks until the test writes the next chunk
    struct Pipe {
        chunks: std_mpsc::Receiver<Vec<u8>>,
        pending: Vec<u8>,
    }

    impl Read for Pipe {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.pending.is_empty() {
                match self.chunks.recv() {
                    Ok(chunk) => self.pending = chunk,
                    Err(_) => return Ok(0),
                }
            }
            let n = buf.len().min(self.pending.len());
            buf[..n].copy_from_slice(&self.pending[..n]);
            self.pending.drain(..n);
            Ok(n)
        }
    }

    fn pipe() -> (std_mpsc::Sender<Vec<u8>>, BufReader<Pipe>) {
        let (tx, chunks) = std_mpsc::channel();
        let reader = BufReader::new(Pipe {
            chunks,
            pending: Vec::new(),
        });
        (tx, reader)
    }

    fn key_down(code: u16) -> Vec<u8> {
        format!("{{\"id\":3,\"keycode\":{code}}}\n").into_bytes()
    }

    #[tokio::test]
    async fn test_channel_source_delivers_and_closes() {
        let source = ChannelSource::new();
        assert!(!source.send(Event::new(Kind::FakeEvent)).await);

        let (tx, mut rx) = mpsc::channel(4);
        let mut handle = source.clone();
        handle.start_capture(tx).unwrap();
        assert!(source.is_capturing());

        assert!(source.send(Event::key(Kind::KeyDown, 30)).await);
        assert_eq!(rx.recv().await, Some(Event::key(Kind::KeyDown, 30)));

        handle.stop_capture();
        assert!(!source.is_capturing());
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_json_source_skips_bad_lines() {
        let input = concat!(
            r#"{"id":3,"time":1,"keycode":29}"#,
            "\n",
            "not json\n",
            "\n",
            r#"{"id":99}"#,
            "\n",
            r#"{"id":8,"time":2,"button":1,"x":5,"y":6,"clicks":1}"#,
            "\n",
        );
        let mut source = JsonLineSource::new(Cursor::new(input.as_bytes().to_vec()));
        let (tx, mut rx) = mpsc::channel(4);
        source.start_capture(tx).unwrap();

        let first = rx.recv().await.unwrap();
        assert_eq!(first.kind, Kind::KeyDown);
        assert_eq!(first.keycode, 29);

        let second = rx.recv().await.unwrap();
        assert_eq!(second.kind, Kind::MouseDown);
        assert_eq!((second.button, second.x, second.y), (1, 5, 6));

        // end of input drops the sender
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn test_json_source_applies_backpressure() {
        let input = [
            r#"{"id":3,"keycode":30}"#,
            r#"{"id":5,"keycode":30}"#,
            r#"{"id":3,"keycode":31}"#,
        ]
        .join("\n");
        let mut source = JsonLineSource::new(Cursor::new(input.into_bytes()));
        let (tx, mut rx) = mpsc::channel(1);
        source.start_capture(tx).unwrap();

        // the reader blocks on a full queue instead of dropping records
        let mut kinds = Vec::new();
        while let Some(event) = rx.blocking_recv() {
            kinds.push((event.kind, event.keycode));
        }
        assert_eq!(
            kinds,
            [(Kind::KeyDown, 30), (Kind::KeyUp, 30), (Kind::KeyDown, 31)]
        );
    }

    #[test]
    fn test_json_source_holds_record_between_sessions() {
        let (input, reader) = pipe();
        let mut source = JsonLineSource::new(reader);

        let (tx, rx) = mpsc::channel(4);
        source.start_capture(tx).unwrap();
        source.stop_capture();
        drop(rx);

        // read while no session is capturing
        input.send(key_down(30)).unwrap();

        let (tx, mut rx) = mpsc::channel(4);
        source.start_capture(tx).unwrap();
        assert_eq!(rx.blocking_recv().map(|e| e.keycode), Some(30));
        input.send(key_down(31)).unwrap();
        assert_eq!(rx.blocking_recv().map(|e| e.keycode), Some(31));

        drop(input);
        assert_eq!(rx.blocking_recv(), None);

        let (tx, _rx) = mpsc::channel(1);
        assert!(matches!(source.start_capture(tx), Err(HookError::Capture(_))));
    }

    #[tokio::test]
    async fn test_json_source_restart_keeps_first_record() {
        let (input, reader) = pipe();
        let hook = Hook::new(JsonLineSource::new(reader));

        let first = hook.start().unwrap();
        hook.stop();
        drop(first);

        let mut stream = hook.start().unwrap();
        input.send(key_down(30)).unwrap();
        input.send(key_down(31)).unwrap();

        assert_eq!(stream.recv().await.map(|e| e.keycode), Some(30));
        assert_eq!(stream.recv().await.map(|e| e.keycode), Some(31));
        assert!(hook.is_held(CodeSpace::Keyboard, 30));
        assert!(hook.is_held(CodeSpace::Keyboard, 31));
    }
}
