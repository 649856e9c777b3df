//! Ledger module containing account management, documents, and transaction
//! processing

pub mod account;
pub mod core;
pub mod document;
pub mod transaction;

pub use account::*;
pub use self::core::*;
pub use document::*;
pub use transaction::*;
