//! Hook lifecycle and public entry points
//!
//! [`Hook`] is the service object callers talk to. It owns the chord
//! registry and press state for its lifetime, starts and stops sessions
//! against an [`EventSource`], and exposes the register/unregister API.
//!
//! A session is one start..stop span: a bounded event queue, a dispatcher
//! task draining it and a raw [`EventStream`] for callers. Stopping a
//! session clears every registration and every press, so chords must be
//! registered again after a stop/start cycle.

mod source;
mod stream;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::dispatch::{DebugLevel, Dispatcher, Shared};
use crate::events::{Event, Kind};
use crate::keys::{Code, CodeSpace};
use crate::registry::{Chord, ChordHandle, RegisterError};

pub use source::{ChannelSource, EventSource, JsonLineSource};
pub use stream::EventStream;

/// Raw event queue capacity used by [`Hook::new`]
pub const DEFAULT_CAPACITY: usize = 1024;

/// Errors that can occur while starting a session
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("no tokio runtime available to run the dispatcher")]
    NoRuntime,

    #[error("failed to spawn event source thread: {0}")]
    ThreadSpawn(String),

    #[error("event source failed to start: {0}")]
    Capture(String),
}

struct Session {
    active: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Session {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// Chord registration and dispatch service
pub struct Hook {
    shared: Arc<Shared>,
    source: Mutex<Box<dyn EventSource>>,
    session: Mutex<Option<Session>>,
    capacity: usize,
}

impl Hook {
    /// Create a hook over `source` with the default queue capacity
    pub fn new(source: impl EventSource) -> Self {
        Self::with_capacity(source, DEFAULT_CAPACITY)
    }

    /// Create a hook whose raw event queue holds at most `capacity` events
    pub fn with_capacity(source: impl EventSource, capacity: usize) -> Self {
        Self {
            shared: Arc::new(Shared::new()),
            source: Mutex::new(Box::new(source)),
            session: Mutex::new(None),
            capacity: capacity.max(1),
        }
    }

    /// Bind `callback` to the chord named by `names` for `kind`
    ///
    /// Key kinds take keyboard names, mouse kinds take button names. An
    /// existing registration for the same chord is replaced atomically.
    /// Nothing is registered on error.
    pub fn register<I, S, F>(
        &self,
        kind: Kind,
        names: I,
        callback: F,
    ) -> Result<ChordHandle, RegisterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let result = self
            .shared
            .registry_mut()
            .register(kind, names, Arc::new(callback));
        match &result {
            Ok(handle) => info!(chord = %handle, "chord registered"),
            Err(e) => warn!(%kind, error = %e, "chord registration rejected"),
        }
        result
    }

    /// Remove the chord named by `names` for `kind`
    ///
    /// Name order does not matter. Returns `false` if no such chord was
    /// registered.
    pub fn unregister<I, S>(&self, kind: Kind, names: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let removed = self.shared.registry_mut().unregister(kind, names);
        if self.shared.verbose() {
            debug!(%kind, removed, "unregister lookup");
        }
        removed
    }

    /// Remove the registration `handle` refers to
    pub fn unregister_handle(&self, handle: &ChordHandle) -> bool {
        self.shared.registry_mut().unregister_handle(handle)
    }

    /// Number of chords currently bound for `kind`
    pub fn registrations(&self, kind: Kind) -> usize {
        self.shared.registry().count(kind)
    }

    pub fn set_debug_level(&self, level: DebugLevel) {
        self.shared.set_debug_level(level);
        info!(?level, "debug level set");
    }

    pub fn debug_level(&self) -> DebugLevel {
        self.shared.debug_level()
    }

    /// Whether `code` is currently held in `space`
    pub fn is_held(&self, space: CodeSpace, code: Code) -> bool {
        self.shared.press().is_held(space, code)
    }

    /// Whether every member of `chord` is held
    pub fn all_held(&self, chord: &Chord) -> bool {
        self.shared.press().all_held(chord.space(), chord.slots())
    }

    /// Whether no member of `chord` is held
    pub fn all_released(&self, chord: &Chord) -> bool {
        self.shared.press().all_released(chord.space(), chord.codes())
    }

    /// Callbacks that have panicked so far
    pub fn callback_failures(&self) -> u64 {
        self.shared.callback_failures()
    }

    /// Whether a session is running
    pub fn is_running(&self) -> bool {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(Session::is_active)
    }

    /// Start a session and return its raw event stream
    ///
    /// Starting while a session is running stops it first, which clears
    /// every registration. Must be called from within a tokio runtime.
    pub fn start(&self) -> Result<EventStream, HookError> {
        let runtime = Handle::try_current().map_err(|_| HookError::NoRuntime)?;

        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = session.take() {
            info!("restarting hook, previous session will be stopped");
            self.end_session(previous);
        }

        let (event_tx, event_rx) = mpsc::channel(self.capacity);
        let (raw_tx, raw_rx) = broadcast::channel(self.capacity);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let active = Arc::new(AtomicBool::new(true));

        self.source
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .start_capture(event_tx)?;

        let dispatcher = Dispatcher::new(Arc::clone(&self.shared), Arc::clone(&active), raw_tx);
        runtime.spawn(dispatcher.run(event_rx, shutdown_rx));

        *session = Some(Session {
            active,
            shutdown_tx,
        });

        info!(capacity = self.capacity, "hook started");
        Ok(EventStream::new(raw_rx))
    }

    /// Stop the running session, if any
    ///
    /// Queued events are discarded, callbacks stop within at most one
    /// in-flight event, and the registry and press state are cleared. A
    /// no-op when already stopped.
    pub fn stop(&self) {
        let previous = self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(previous) = previous {
            self.end_session(previous);
        }
    }

    fn end_session(&self, session: Session) {
        self.source
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stop_capture();

        if !session.active.swap(false, Ordering::SeqCst) {
            // the source already closed and the dispatcher cleaned up
            debug!("session had already ended");
            return;
        }

        let _ = session.shutdown_tx.send(());
        self.shared.clear();
        info!("hook stopped");
    }
}

impl Drop for Hook {
    fn drop(&mut self) {
        self.stop();
    }
}
