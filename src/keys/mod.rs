//! Key and mouse-button name resolution
//!
//! Callers name keys the way a person would ("ctrl", "f1", "left"). This
//! module maps those names onto the numeric codes carried by hook events,
//! separately for the keyboard and mouse code spaces.

mod names;

use std::fmt;

pub use names::{KEYBOARD, MOUSE};

/// Normalized code of one physical key or mouse button
pub type Code = u16;

/// The two disjoint code spaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CodeSpace {
    Keyboard,
    Mouse,
}

impl CodeSpace {
    fn table(self) -> &'static [(&'static str, Code)] {
        match self {
            CodeSpace::Keyboard => KEYBOARD,
            CodeSpace::Mouse => MOUSE,
        }
    }
}

impl fmt::Display for CodeSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeSpace::Keyboard => write!(f, "keyboard"),
            CodeSpace::Mouse => write!(f, "mouse"),
        }
    }
}

/// Look up the code for `name` in `space`
///
/// Matching is exact and case-sensitive. Returns `None` for unknown names;
/// whether that is fatal is up to the caller.
pub fn resolve(space: CodeSpace, name: &str) -> Option<Code> {
    space
        .table()
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, code)| *code)
}

/// Canonical name for `code` in `space`
pub fn unresolve(space: CodeSpace, code: Code) -> Option<&'static str> {
    space
        .table()
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(name, _)| *name)
}

/// Every accepted name in `space`, aliases included
pub fn names(space: CodeSpace) -> impl Iterator<Item = &'static str> {
    space.table().iter().map(|(name, _)| *name)
}
