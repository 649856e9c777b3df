//! Presentation-level reports over the posting store

pub mod balance_sheet;
pub mod export;

pub use balance_sheet::*;
pub use export::*;
