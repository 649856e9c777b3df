//! Balance computation and trial balance reporting

pub mod calculator;
pub mod trial;

pub use calculator::*;
pub use trial::*;
