//! Spread detection engine.
//!
//! Turns per-exchange quotes into filtered, scored spread opportunities and
//! keeps the cooldown state that stops repeat alerts.

pub mod cooldown;
pub mod detector;
pub mod quality;

pub use cooldown::*;
pub use detector::*;
pub use quality::*;
