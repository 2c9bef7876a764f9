//! Event dispatch
//!
//! The dispatcher owns the serial "update press state, match chords, invoke
//! callbacks" step for every incoming event. [`Shared`] is the state it
//! works over: the chord registry, the press table and the debug switch,
//! all shared with the caller-facing [`Hook`](crate::Hook).

mod dispatcher;

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::registry::Registry;
use crate::state::PressState;

pub use dispatcher::Dispatcher;

/// How much the engine reports about its own decisions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DebugLevel {
    /// Only lifecycle and failures are logged
    #[default]
    Silent,
    /// Every registry lookup and chord match decision is logged
    Verbose,
}

impl FromStr for DebugLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "silent" => Ok(DebugLevel::Silent),
            "verbose" => Ok(DebugLevel::Verbose),
            other => Err(format!("unknown debug level '{other}'")),
        }
    }
}

/// State shared between the dispatcher task and callers
///
/// Lock order is `press` before `registry`.
#[derive(Debug, Default)]
pub struct Shared {
    registry: RwLock<Registry>,
    press: Mutex<PressState>,
    verbose: AtomicBool,
    failures: AtomicU64,
}

impl Shared {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> RwLockReadGuard<'_, Registry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn registry_mut(&self) -> RwLockWriteGuard<'_, Registry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn press(&self) -> MutexGuard<'_, PressState> {
        self.press.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_debug_level(&self, level: DebugLevel) {
        self.verbose
            .store(level == DebugLevel::Verbose, Ordering::Relaxed);
    }

    pub fn debug_level(&self) -> DebugLevel {
        if self.verbose() {
            DebugLevel::Verbose
        } else {
            DebugLevel::Silent
        }
    }

    pub(crate) fn verbose(&self) -> bool {
        self.verbose.load(Ordering::Relaxed)
    }

    /// Callbacks that have panicked since creation
    pub fn callback_failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Drop every registration and every press
    pub fn clear(&self) {
        let mut press = self.press();
        press.clear();
        let mut registry = self.registry_mut();
        let dropped = registry.len();
        registry.clear();
        debug!(dropped, "press state and registry cleared");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::events::{Event, Kind};

    #[test]
    fn test_debug_level_parse() {
        assert_eq!("verbose".parse::<DebugLevel>(), Ok(DebugLevel::Verbose));
        assert_eq!("silent".parse::<DebugLevel>(), Ok(DebugLevel::Silent));
        assert!("loud".parse::<DebugLevel>().is_err());
    }

    #[test]
    fn test_debug_level_switch() {
        let shared = Shared::new();
        assert_eq!(shared.debug_level(), DebugLevel::Silent);
        shared.set_debug_level(DebugLevel::Verbose);
        assert_eq!(shared.debug_level(), DebugLevel::Verbose);
    }

    #[test]
    fn test_clear_resets_everything() {
        let shared = Shared::new();
        shared.press().update(&Event::key(Kind::KeyDown, 29));
        shared
            .registry_mut()
            .register(Kind::KeyDown, ["ctrl"], Arc::new(|_: &Event| {}))
            .unwrap();

        shared.clear();
        assert!(shared.press().is_empty());
        assert!(shared.registry().is_empty());
    }
}
