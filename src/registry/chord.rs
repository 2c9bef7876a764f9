//! Canonical chord representation
//!
//! A chord is stored as its codes sorted into a fixed-size, zero-padded
//! array. Equality and hashing on that form give order-independent but
//! duplicate-sensitive comparison: `[1,2,2,3]` equals `[3,1,2,2]` but not
//! `[1,2,3,3]`.

use std::fmt;

use crate::keys::{self, Code, CodeSpace};

use super::RegisterError;

/// Most codes a single chord may hold
pub const MAX_KEYS: usize = 4;

/// An unordered set of 1 to [`MAX_KEYS`] codes within one code space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chord {
    space: CodeSpace,
    codes: [Code; MAX_KEYS],
    len: u8,
}

impl Chord {
    /// Build a chord from raw codes, in any order
    pub fn new(space: CodeSpace, codes: &[Code]) -> Result<Self, RegisterError> {
        if codes.is_empty() {
            return Err(RegisterError::EmptyChord);
        }
        if codes.len() > MAX_KEYS {
            return Err(RegisterError::TooManyKeys { count: codes.len() });
        }

        let mut slots = [0; MAX_KEYS];
        slots[..codes.len()].copy_from_slice(codes);
        slots[..codes.len()].sort_unstable();

        Ok(Self {
            space,
            codes: slots,
            len: codes.len() as u8,
        })
    }

    /// Build a chord from key or button names
    ///
    /// The key count is checked before any name is looked up. Fails on the
    /// first name that does not resolve in `space`; nothing partial is ever
    /// returned.
    pub fn resolve<I, S>(space: CodeSpace, names: I) -> Result<Self, RegisterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<S> = names.into_iter().collect();
        if names.len() > MAX_KEYS {
            return Err(RegisterError::TooManyKeys { count: names.len() });
        }

        let mut codes = Vec::with_capacity(names.len());
        for name in &names {
            let name = name.as_ref();
            let code = keys::resolve(space, name).ok_or_else(|| RegisterError::UnknownKey {
                name: name.to_string(),
                space,
            })?;
            codes.push(code);
        }
        Self::new(space, &codes)
    }

    pub fn space(&self) -> CodeSpace {
        self.space
    }

    /// The chord's codes in ascending order
    pub fn codes(&self) -> &[Code] {
        &self.codes[..usize::from(self.len)]
    }

    /// All slots, zero-padded past the chord's length
    pub fn slots(&self) -> &[Code; MAX_KEYS] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        usize::from(self.len)
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// A code that appears more than once, if any
    pub fn duplicate(&self) -> Option<Code> {
        self.codes()
            .windows(2)
            .find(|pair| pair[0] == pair[1])
            .map(|pair| pair[0])
    }
}

/// Formats as `name+name`, falling back to the numeric code
impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, code) in self.codes().iter().enumerate() {
            if i > 0 {
                write!(f, "+")?;
            }
            match keys::unresolve(self.space, *code) {
                Some(name) => write!(f, "{name}")?,
                None => write!(f, "#{code}")?,
            }
        }
        Ok(())
    }
}
