//! Fiscal year lifecycle and year-end closing

pub mod closing;
pub mod year;

pub use closing::*;
pub use year::*;
