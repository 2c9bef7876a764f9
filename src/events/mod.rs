//! Hook event types
//!
//! An [`Event`] is one record from the native input hook. The hook encodes
//! events as flat JSON objects keyed by `id` (the kind) with the remaining
//! fields zeroed when they do not apply to that kind.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::keys::{Code, CodeSpace};

/// `keychar` value for events that carry no character
pub const CHAR_UNDEFINED: u16 = 0xFFFF;
/// Wheel rotation direction reported for scrolling up
pub const WHEEL_UP: i16 = -1;
/// Wheel rotation direction reported for scrolling down
pub const WHEEL_DOWN: i16 = 1;

/// Event category, numbered as the native hook numbers them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Kind {
    HookEnabled = 1,
    HookDisabled = 2,
    KeyDown = 3,
    KeyHold = 4,
    KeyUp = 5,
    MouseUp = 6,
    MouseHold = 7,
    MouseDown = 8,
    MouseMove = 9,
    MouseDrag = 10,
    MouseWheel = 11,
    FakeEvent = 12,
}

/// An event id outside the hook's numbering
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown event kind {0}")]
pub struct UnknownKind(pub u8);

impl Kind {
    /// Code space whose press state this kind reads or writes
    pub fn space(self) -> Option<CodeSpace> {
        match self {
            Kind::KeyDown | Kind::KeyHold | Kind::KeyUp => Some(CodeSpace::Keyboard),
            Kind::MouseDown | Kind::MouseHold | Kind::MouseUp => Some(CodeSpace::Mouse),
            _ => None,
        }
    }

    /// Whether chords can be registered for this kind
    pub fn is_chord_kind(self) -> bool {
        matches!(
            self,
            Kind::KeyDown | Kind::KeyUp | Kind::MouseDown | Kind::MouseUp
        )
    }

    /// Whether this is a press (as opposed to release) transition
    pub fn is_down(self) -> bool {
        matches!(self, Kind::KeyDown | Kind::MouseDown)
    }
}

impl TryFrom<u8> for Kind {
    type Error = UnknownKind;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Ok(match id {
            1 => Kind::HookEnabled,
            2 => Kind::HookDisabled,
            3 => Kind::KeyDown,
            4 => Kind::KeyHold,
            5 => Kind::KeyUp,
            6 => Kind::MouseUp,
            7 => Kind::MouseHold,
            8 => Kind::MouseDown,
            9 => Kind::MouseMove,
            10 => Kind::MouseDrag,
            11 => Kind::MouseWheel,
            12 => Kind::FakeEvent,
            other => return Err(UnknownKind(other)),
        })
    }
}

impl From<Kind> for u8 {
    fn from(kind: Kind) -> Self {
        kind as u8
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Parses the snake_case kind names used in configuration, e.g. `key_down`
impl FromStr for Kind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "hook_enabled" => Kind::HookEnabled,
            "hook_disabled" => Kind::HookDisabled,
            "key_down" => Kind::KeyDown,
            "key_hold" => Kind::KeyHold,
            "key_up" => Kind::KeyUp,
            "mouse_up" => Kind::MouseUp,
            "mouse_hold" => Kind::MouseHold,
            "mouse_down" => Kind::MouseDown,
            "mouse_move" => Kind::MouseMove,
            "mouse_drag" => Kind::MouseDrag,
            "mouse_wheel" => Kind::MouseWheel,
            "fake_event" => Kind::FakeEvent,
            other => return Err(format!("unknown event kind '{other}'")),
        })
    }
}

fn undefined_char() -> u16 {
    CHAR_UNDEFINED
}

/// One input event as delivered by the hook
///
/// Keyboard events use `mask`, `keycode`, `rawcode` and `keychar`; mouse
/// events use `button`, `clicks`, `x` and `y`; wheel events add
/// `wheel_type`, `amount`, `rotation` and `direction`. Only `kind` plus `keycode` or `button` drive
/// chord matching, everything else is passed through to callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "id")]
    pub kind: Kind,
    /// Hook timestamp in milliseconds
    #[serde(default)]
    pub time: u64,
    #[serde(default)]
    pub mask: u16,
    #[serde(default)]
    pub reserved: u16,
    #[serde(default)]
    pub keycode: Code,
    #[serde(default)]
    pub rawcode: u16,
    #[serde(default = "undefined_char")]
    pub keychar: u16,
    #[serde(default)]
    pub button: Code,
    #[serde(default)]
    pub clicks: u16,
    #[serde(default)]
    pub x: i16,
    #[serde(default)]
    pub y: i16,
    /// Scroll type reported by the hook, `type` on the wire
    #[serde(default, rename = "type")]
    pub wheel_type: u16,
    /// `ammount` on the wire, matching the hook's spelling
    #[serde(default, rename = "ammount", alias = "amount")]
    pub amount: u16,
    #[serde(default)]
    pub rotation: i16,
    #[serde(default)]
    pub direction: u8,
}

impl Event {
    /// An event of `kind` with every other field zeroed
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            time: 0,
            mask: 0,
            reserved: 0,
            keycode: 0,
            rawcode: 0,
            keychar: CHAR_UNDEFINED,
            button: 0,
            clicks: 0,
            x: 0,
            y: 0,
            wheel_type: 0,
            amount: 0,
            rotation: 0,
            direction: 0,
        }
    }

    /// A keyboard event for `keycode`
    pub fn key(kind: Kind, keycode: Code) -> Self {
        Self {
            keycode,
            ..Self::new(kind)
        }
    }

    /// A mouse event for `button`
    pub fn mouse(kind: Kind, button: Code) -> Self {
        Self {
            button,
            ..Self::new(kind)
        }
    }

    /// Decode one hook JSON record
    pub fn from_json(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }

    /// The code this event carries in its own code space
    pub fn code(&self) -> Option<(CodeSpace, Code)> {
        match self.kind.space()? {
            CodeSpace::Keyboard => Some((CodeSpace::Keyboard, self.keycode)),
            CodeSpace::Mouse => Some((CodeSpace::Mouse, self.button)),
        }
    }

    /// Decoded character, if the hook reported one
    pub fn char(&self) -> Option<char> {
        if self.keychar == CHAR_UNDEFINED {
            return None;
        }
        char::from_u32(u32::from(self.keychar))
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            Kind::HookEnabled | Kind::HookDisabled | Kind::FakeEvent => {
                write!(f, "{} - Event: {{Kind: {}}}", self.time, self.kind)
            }
            Kind::KeyDown | Kind::KeyHold | Kind::KeyUp => write!(
                f,
                "{} - Event: {{Kind: {}, Rawcode: {}, Keychar: {}}}",
                self.time, self.kind, self.rawcode, self.keychar
            ),
            Kind::MouseWheel => write!(
                f,
                "{} - Event: {{Kind: {}, Amount: {}, Rotation: {}, Direction: {}}}",
                self.time, self.kind, self.amount, self.rotation, self.direction
            ),
            _ => write!(
                f,
                "{} - Event: {{Kind: {}, Button: {}, X: {}, Y: {}, Clicks: {}}}",
                self.time, self.kind, self.button, self.x, self.y, self.clicks
            ),
        }
    }
}
