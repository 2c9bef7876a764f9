//! Static name tables for keyboard and mouse-button codes
//!
//! Codes are the normalized values the native hook reports in the `keycode`
//! and `button` fields. When several names share a code, the first entry is
//! the canonical one returned by reverse lookups.

use super::Code;

/// Keyboard key names
pub const KEYBOARD: &[(&str, Code)] = &[
    ("`", 41),
    ("1", 2),
    ("2", 3),
    ("3", 4),
    ("4", 5),
    ("5", 6),
    ("6", 7),
    ("7", 8),
    ("8", 9),
    ("9", 10),
    ("0", 11),
    ("-", 12),
    ("+", 13),
    ("q", 16),
    ("w", 17),
    ("e", 18),
    ("r", 19),
    ("t", 20),
    ("y", 21),
    ("u", 22),
    ("i", 23),
    ("o", 24),
    ("p", 25),
    ("[", 26),
    ("]", 27),
    ("\\", 43),
    ("a", 30),
    ("s", 31),
    ("d", 32),
    ("f", 33),
    ("g", 34),
    ("h", 35),
    ("j", 36),
    ("k", 37),
    ("l", 38),
    (";", 39),
    ("'", 40),
    ("z", 44),
    ("x", 45),
    ("c", 46),
    ("v", 47),
    ("b", 48),
    ("n", 49),
    ("m", 50),
    (",", 51),
    (".", 52),
    ("/", 53),
    ("f1", 59),
    ("f2", 60),
    ("f3", 61),
    ("f4", 62),
    ("f5", 63),
    ("f6", 64),
    ("f7", 65),
    ("f8", 66),
    ("f9", 67),
    ("f10", 68),
    ("f11", 69),
    ("f12", 70),
    ("esc", 1),
    ("delete", 14),
    ("tab", 15),
    ("ctrl", 29),
    ("control", 29),
    ("alt", 56),
    ("space", 57),
    ("shift", 42),
    ("rshift", 54),
    ("enter", 28),
    ("cmd", 3675),
    ("command", 3675),
    ("rcmd", 3676),
    ("ralt", 3640),
    ("up", 57416),
    ("down", 57424),
    ("left", 57419),
    ("right", 57421),
];

/// Mouse button names, including the `m`-prefixed aliases
pub const MOUSE: &[(&str, Code)] = &[
    ("left", 1),
    ("right", 2),
    ("center", 3),
    ("wheelDown", 4),
    ("wheelUp", 5),
    ("wheelLeft", 6),
    ("wheelRight", 7),
    ("mleft", 1),
    ("mright", 2),
    ("mcenter", 3),
];
