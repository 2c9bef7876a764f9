//! Serial event dispatcher
//!
//! Consumes the raw event queue one event at a time. For each event it
//! updates the press state, collects the chords that now match, invokes
//! their callbacks and finally republishes the event on the raw stream.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use crate::events::Event;
use crate::registry::{Callback, Chord};

use super::Shared;

/// Applies events to the shared state and fires matching chords
pub struct Dispatcher {
    shared: Arc<Shared>,
    /// Cleared when the owning session stops
    active: Arc<AtomicBool>,
    /// Raw stream for callers that also want every event
    raw_tx: broadcast::Sender<Event>,
}

impl Dispatcher {
    pub fn new(
        shared: Arc<Shared>,
        active: Arc<AtomicBool>,
        raw_tx: broadcast::Sender<Event>,
    ) -> Self {
        Self {
            shared,
            active,
            raw_tx,
        }
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Run until stopped or until the event source closes its stream
    ///
    /// Events still queued when the loop ends are discarded unprocessed. If
    /// the source closed the stream while the session was still active, the
    /// shared state is cleared here, as an explicit stop would have.
    pub async fn run(
        self,
        mut events: mpsc::Receiver<Event>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        info!("dispatcher started");

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.recv() => {
                    debug!("dispatcher received stop");
                    break;
                }

                next = events.recv() => {
                    match next {
                        Some(event) => {
                            if !self.process(&event) {
                                break;
                            }
                            // no receivers is fine
                            let _ = self.raw_tx.send(event);
                        }
                        None => {
                            warn!("event source closed its stream");
                            break;
                        }
                    }
                }
            }
        }

        events.close();
        let mut discarded = 0usize;
        while events.try_recv().is_ok() {
            discarded += 1;
        }

        if self.active.swap(false, Ordering::SeqCst) {
            self.shared.clear();
            info!("session ended by event source, state cleared");
        }

        info!(discarded, "dispatcher stopped");
    }

    /// Process one event synchronously
    ///
    /// Returns `false` without touching any state once the session is no
    /// longer active.
    pub fn process(&self, event: &Event) -> bool {
        let matched = {
            let mut press = self.shared.press();
            // checked under the press lock so a concurrent stop cannot
            // clear the table and then have it repopulated by this event
            if !self.is_active() {
                return false;
            }
            press.update(event);

            if !event.kind.is_chord_kind() {
                return true;
            }

            let registry = self.shared.registry();
            let verbose = self.shared.verbose();
            let down = event.kind.is_down();

            if verbose {
                debug!(
                    kind = %event.kind,
                    candidates = registry.count(event.kind),
                    "registry lookup"
                );
            }

            registry
                .iter(event.kind)
                .filter(|(chord, _)| {
                    let hit = if down {
                        press.all_held(chord.space(), chord.slots())
                    } else {
                        press.all_released(chord.space(), chord.codes())
                    };
                    if verbose {
                        debug!(kind = %event.kind, %chord, matched = hit, "chord evaluated");
                    }
                    hit
                })
                .map(|(chord, callback)| (*chord, Arc::clone(callback)))
                .collect::<Vec<(Chord, Callback)>>()
        };

        for (chord, callback) in matched {
            if !self.is_active() {
                debug!("session stopped mid-dispatch, skipping remaining callbacks");
                break;
            }
            self.invoke(&chord, &callback, event);
        }

        true
    }

    fn invoke(&self, chord: &Chord, callback: &Callback, event: &Event) {
        if self.shared.verbose() {
            debug!(%chord, kind = %event.kind, "invoking chord callback");
        }

        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback(event))) {
            self.shared.record_failure();
            error!(
                %chord,
                kind = %event.kind,
                panic = panic_message(payload.as_ref()),
                "chord callback panicked"
            );
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
