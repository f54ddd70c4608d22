//! Core data types for the spread monitor.

pub mod exchange;
pub mod opportunity;
pub mod price;
pub mod symbol;

pub use exchange::*;
pub use opportunity::*;
pub use price::*;
pub use symbol::*;
