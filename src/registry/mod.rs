//! Chord registry
//!
//! Maps (kind, chord) to a callback. Each key holds at most one callback;
//! registering the same key again swaps the callback in place. Within a
//! kind, chords are kept in registration order, which is the order the
//! dispatcher invokes them in.

mod chord;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::events::{Event, Kind};
use crate::keys::CodeSpace;

pub use chord::{Chord, MAX_KEYS};

/// A chord callback
pub type Callback = Arc<dyn Fn(&Event) + Send + Sync>;

/// Errors returned when registering a chord
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegisterError {
    #[error("chord has {count} keys, at most {max} are supported", max = MAX_KEYS)]
    TooManyKeys { count: usize },

    #[error("unknown {space} key name '{name}'")]
    UnknownKey { name: String, space: CodeSpace },

    #[error("chord has no keys")]
    EmptyChord,

    #[error("key '{name}' appears more than once in the chord")]
    DuplicateKey { name: String },

    #[error("chords cannot be registered for {0} events")]
    UnsupportedKind(Kind),
}

/// Identifies one registration, independent of the order its names were given in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChordHandle {
    kind: Kind,
    chord: Chord,
}

impl ChordHandle {
    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn chord(&self) -> &Chord {
        &self.chord
    }
}

impl fmt::Display for ChordHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.chord)
    }
}

struct Binding {
    chord: Chord,
    callback: Callback,
}

/// Registered chords, grouped by the event kind they fire on
#[derive(Default)]
pub struct Registry {
    bindings: HashMap<Kind, Vec<Binding>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `names` into a chord for `kind`
    ///
    /// `kind` picks the code space: key kinds resolve against the keyboard
    /// table, mouse kinds against the mouse table.
    pub fn chord_for<I, S>(kind: Kind, names: I) -> Result<Chord, RegisterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let space = match kind.space() {
            Some(space) if kind.is_chord_kind() => space,
            _ => return Err(RegisterError::UnsupportedKind(kind)),
        };
        Chord::resolve(space, names)
    }

    /// Bind `callback` to `chord` for `kind`, replacing any existing binding
    ///
    /// Returns `true` if an earlier callback was replaced.
    pub fn insert(&mut self, kind: Kind, chord: Chord, callback: Callback) -> bool {
        let bindings = self.bindings.entry(kind).or_default();

        if let Some(existing) = bindings.iter_mut().find(|b| b.chord == chord) {
            existing.callback = callback;
            debug!(%kind, %chord, "chord callback replaced");
            return true;
        }

        bindings.push(Binding { chord, callback });
        debug!(%kind, %chord, "chord registered");
        false
    }

    /// Resolve, validate and bind in one step
    pub fn register<I, S>(
        &mut self,
        kind: Kind,
        names: I,
        callback: Callback,
    ) -> Result<ChordHandle, RegisterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let chord = Self::chord_for(kind, names)?;
        reject_duplicates(&chord)?;
        self.insert(kind, chord, callback);
        Ok(ChordHandle { kind, chord })
    }

    /// Remove the binding for `chord`, returning whether one existed
    pub fn remove(&mut self, kind: Kind, chord: &Chord) -> bool {
        let Some(bindings) = self.bindings.get_mut(&kind) else {
            return false;
        };
        let Some(index) = bindings.iter().position(|b| b.chord == *chord) else {
            return false;
        };

        bindings.remove(index);
        if bindings.is_empty() {
            self.bindings.remove(&kind);
        }
        debug!(%kind, %chord, "chord unregistered");
        true
    }

    /// Resolve `names` and remove the matching binding
    ///
    /// Names that do not resolve cannot match anything, so they yield `false`
    /// rather than an error.
    pub fn unregister<I, S>(&mut self, kind: Kind, names: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        match Self::chord_for(kind, names) {
            Ok(chord) => self.remove(kind, &chord),
            Err(e) => {
                debug!(%kind, error = %e, "unregister of unresolvable chord");
                false
            }
        }
    }

    pub fn unregister_handle(&mut self, handle: &ChordHandle) -> bool {
        self.remove(handle.kind, &handle.chord)
    }

    pub fn contains(&self, kind: Kind, chord: &Chord) -> bool {
        self.bindings
            .get(&kind)
            .is_some_and(|bindings| bindings.iter().any(|b| b.chord == *chord))
    }

    /// Number of chords bound for `kind`
    pub fn count(&self, kind: Kind) -> usize {
        self.bindings.get(&kind).map_or(0, Vec::len)
    }

    /// Number of chords bound across all kinds
    pub fn len(&self) -> usize {
        self.bindings.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Chords bound for `kind` in registration order, with their callbacks
    pub fn iter(&self, kind: Kind) -> impl Iterator<Item = (&Chord, &Callback)> {
        self.bindings
            .get(&kind)
            .into_iter()
            .flatten()
            .map(|b| (&b.chord, &b.callback))
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (kind, bindings) in &self.bindings {
            let chords: Vec<String> = bindings.iter().map(|b| b.chord.to_string()).collect();
            map.entry(kind, &chords);
        }
        map.finish()
    }
}

fn reject_duplicates(chord: &Chord) -> Result<(), RegisterError> {
    if let Some(code) = chord.duplicate() {
        let name = crate::keys::unresolve(chord.space(), code)
            .map(str::to_string)
            .unwrap_or_else(|| code.to_string());
        return Err(RegisterError::DuplicateKey { name });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn noop() -> Callback {
        Arc::new(|_: &Event| {})
    }

    #[test]
    fn test_unregister_ignores_name_order() {
        let mut registry = Registry::new();
        registry.register(Kind::KeyDown, ["ctrl", "alt"], noop()).unwrap();
        assert!(registry.unregister(Kind::KeyDown, ["alt", "ctrl"]));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unregister_missing_returns_false() {
        let mut registry = Registry::new();
        assert!(!registry.unregister(Kind::KeyDown, ["ctrl"]));
        registry.register(Kind::KeyDown, ["ctrl"], noop()).unwrap();
        assert!(!registry.unregister(Kind::KeyUp, ["ctrl"]));
        assert!(!registry.unregister(Kind::KeyDown, ["ctrl", "a"]));
        assert!(!registry.unregister(Kind::KeyDown, ["nope"]));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_key_limit() {
        let mut registry = Registry::new();
        let err = registry
            .register(Kind::KeyDown, ["ctrl", "alt", "shift", "a", "b"], noop())
            .unwrap_err();
        assert_eq!(err, RegisterError::TooManyKeys { count: 5 });
        assert!(registry.is_empty());

        registry
            .register(Kind::KeyDown, ["ctrl", "alt", "shift", "a"], noop())
            .unwrap();
        assert_eq!(registry.count(Kind::KeyDown), 1);
    }

    #[test]
    fn test_unknown_key_commits_nothing() {
        let mut registry = Registry::new();
        let err = registry
            .register(Kind::KeyDown, ["ctrl", "hyper"], noop())
            .unwrap_err();
        assert_eq!(
            err,
            RegisterError::UnknownKey {
                name: "hyper".to_string(),
                space: CodeSpace::Keyboard,
            }
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_kind_selects_code_space() {
        let mut registry = Registry::new();
        let handle = registry.register(Kind::MouseDown, ["mleft"], noop()).unwrap();
        assert_eq!(handle.chord().space(), CodeSpace::Mouse);
        assert_eq!(handle.chord().codes(), &[1]);

        assert!(matches!(
            registry.register(Kind::MouseUp, ["ctrl"], noop()),
            Err(RegisterError::UnknownKey { .. })
        ));
    }

    #[test]
    fn test_non_chord_kinds_rejected() {
        let mut registry = Registry::new();
        for kind in [Kind::KeyHold, Kind::MouseMove, Kind::MouseWheel, Kind::HookEnabled] {
            assert_eq!(
                registry.register(kind, ["a"], noop()).unwrap_err(),
                RegisterError::UnsupportedKind(kind)
            );
        }
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut registry = Registry::new();
        let err = registry
            .register(Kind::KeyDown, ["ctrl", "control"], noop())
            .unwrap_err();
        assert_eq!(err, RegisterError::DuplicateKey { name: "ctrl".to_string() });
    }

    #[test]
    fn test_unregister_only_touches_matching_kind() {
        let mut registry = Registry::new();
        registry.register(Kind::KeyDown, ["a", "b"], noop()).unwrap();
        registry.register(Kind::KeyDown, ["c", "d"], noop()).unwrap();
        registry.register(Kind::KeyUp, ["a", "b"], noop()).unwrap();

        assert!(registry.unregister(Kind::KeyDown, ["a", "b"]));
        assert_eq!(registry.count(Kind::KeyDown), 1);
        assert_eq!(registry.count(Kind::KeyUp), 1);
        assert!(registry.contains(Kind::KeyUp, &Chord::resolve(CodeSpace::Keyboard, ["b", "a"]).unwrap()));
    }

    #[test]
    fn test_reregister_replaces_callback() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let mut registry = Registry::new();

        let f = Arc::clone(&first);
        registry
            .register(Kind::KeyDown, ["ctrl", "a"], Arc::new(move |_: &Event| {
                f.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        let s = Arc::clone(&second);
        registry
            .register(Kind::KeyDown, ["a", "ctrl"], Arc::new(move |_: &Event| {
                s.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        assert_eq!(registry.count(Kind::KeyDown), 1);
        let event = Event::key(Kind::KeyDown, 30);
        for (_, callback) in registry.iter(Kind::KeyDown) {
            callback(&event);
        }
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_replacement_keeps_position() {
        let mut registry = Registry::new();
        registry.register(Kind::KeyDown, ["a"], noop()).unwrap();
        registry.register(Kind::KeyDown, ["b"], noop()).unwrap();
        registry.register(Kind::KeyDown, ["a"], noop()).unwrap();

        let order: Vec<String> = registry.iter(Kind::KeyDown).map(|(c, _)| c.to_string()).collect();
        assert_eq!(order, ["a", "b"]);
    }

    #[test]
    fn test_unregister_by_handle() {
        let mut registry = Registry::new();
        let handle = registry.register(Kind::KeyUp, ["shift", "f1"], noop()).unwrap();
        assert_eq!(handle.to_string(), "KeyUp(shift+f1)");
        assert!(registry.unregister_handle(&handle));
        assert!(!registry.unregister_handle(&handle));
    }
}
