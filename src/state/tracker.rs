//! Per-code press state
//!
//! Tracks which keys and mouse buttons are currently held. Only Down, Hold
//! and Up events of a code space mutate that space; a key that has never
//! been seen counts as released.

use std::collections::HashSet;

use tracing::debug;

use crate::events::{Event, Kind};
use crate::keys::{Code, CodeSpace};

/// Live table of held codes, one set per code space
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PressState {
    keyboard: HashSet<Code>,
    mouse: HashSet<Code>,
}

impl PressState {
    /// Create an empty press state
    pub fn new() -> Self {
        Self::default()
    }

    fn space(&self, space: CodeSpace) -> &HashSet<Code> {
        match space {
            CodeSpace::Keyboard => &self.keyboard,
            CodeSpace::Mouse => &self.mouse,
        }
    }

    fn space_mut(&mut self, space: CodeSpace) -> &mut HashSet<Code> {
        match space {
            CodeSpace::Keyboard => &mut self.keyboard,
            CodeSpace::Mouse => &mut self.mouse,
        }
    }

    /// Apply one event
    ///
    /// KeyHold counts as a press (the hook repeats it while a key is held).
    /// MouseHold is only a repeat confirmation and leaves the state alone,
    /// as do move, drag, wheel and hook status events.
    pub fn update(&mut self, event: &Event) {
        let Some((space, code)) = event.code() else {
            return;
        };

        match event.kind {
            Kind::KeyDown | Kind::KeyHold | Kind::MouseDown => {
                if self.space_mut(space).insert(code) {
                    debug!(%space, code, "code pressed");
                }
            }
            Kind::KeyUp | Kind::MouseUp => {
                if self.space_mut(space).remove(&code) {
                    debug!(%space, code, "code released");
                }
            }
            _ => {}
        }
    }

    /// Whether `code` is currently held in `space`
    pub fn is_held(&self, space: CodeSpace, code: Code) -> bool {
        self.space(space).contains(&code)
    }

    /// True iff every code is held. Zero codes are empty slots and always
    /// satisfied.
    pub fn all_held(&self, space: CodeSpace, codes: &[Code]) -> bool {
        let held = self.space(space);
        codes.iter().all(|code| *code == 0 || held.contains(code))
    }

    /// True iff none of the codes is held
    pub fn all_released(&self, space: CodeSpace, codes: &[Code]) -> bool {
        let held = self.space(space);
        codes.iter().all(|code| !held.contains(code))
    }

    /// Whether nothing at all is held
    pub fn is_empty(&self) -> bool {
        self.keyboard.is_empty() && self.mouse.is_empty()
    }

    /// Forget every press
    pub fn clear(&mut self) {
        self.keyboard.clear();
        self.mouse.clear();
    }
}
