//! chordhook: chord registration and dispatch over raw input events
//!
//! Register interest in a combination of up to four keys or mouse buttons
//! and get called back when it is pressed or released, driven by a stream
//! of low-level hook events:
//! - Name resolution for keyboard keys and mouse buttons
//! - Per-code press state tracking
//! - A chord registry with order-independent chord identity
//! - A serial dispatcher task with panic-isolated callbacks
//! - Start/stop lifecycle against a pluggable event source
//!
//! Capturing input from the OS is left to an [`EventSource`]
//! implementation; [`JsonLineSource`] reads the hook's JSON records and
//! [`ChannelSource`] accepts events pushed from elsewhere in-process.
//!
//! ```no_run
//! use chordhook::{ChannelSource, Event, Hook, Kind};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let source = ChannelSource::new();
//! let hook = Hook::new(source.clone());
//! hook.register(Kind::KeyDown, ["ctrl", "shift", "q"], |event: &Event| {
//!     println!("quit chord: {event}");
//! })?;
//!
//! let mut stream = hook.start()?;
//! while let Some(event) = stream.recv().await {
//!     println!("{event}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod dispatch;
pub mod events;
pub mod hook;
pub mod keys;
pub mod registry;
pub mod state;

pub use dispatch::DebugLevel;
pub use events::{Event, Kind, CHAR_UNDEFINED, WHEEL_DOWN, WHEEL_UP};
pub use hook::{ChannelSource, EventSource, EventStream, Hook, HookError, JsonLineSource};
pub use keys::{resolve, unresolve, Code, CodeSpace};
pub use registry::{Chord, ChordHandle, RegisterError, MAX_KEYS};
