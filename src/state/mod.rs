//! Press state tracking
//!
//! Holds the "is this code currently held" table that chord matching reads:
//! - Down and Hold events mark a code held
//! - Up events mark it released
//! - everything else leaves the table alone

mod tracker;

pub use tracker::PressState;
