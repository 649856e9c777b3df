//! # Daftar Core
//!
//! A double-entry bookkeeping library for construction-project management,
//! with a Persian-first chart of accounts and fiscal-year lifecycle.
//!
//! ## Features
//!
//! - **Four-level chart of accounts**: Groups, classes, subclasses, and details
//!   with positional codes and soft deletion
//! - **Double-entry documents**: Balanced multi-line documents with sequential
//!   numbering and draft/permanent lifecycle
//! - **Nature-aware balances**: Debit/credit columns resolved per account type,
//!   trial balance, and cached ledger snapshots
//! - **Fiscal years**: One active year per project, with an atomic year-end
//!   closing that zeroes temporary accounts and carries balances forward
//! - **Financial reporting**: Balance sheet with current/non-current asset
//!   split and journal exports
//! - **Storage abstraction**: Database-agnostic design with trait-based storage
//!
//! ## Quick Start
//!
//! ```rust
//! use daftar_core::{AccountingCore, MemoryStorage, AccountType, Caller};
//! use bigdecimal::BigDecimal;
//! use chrono::NaiveDate;
//!
//! // The facade works against any LedgerStorage + ChartStorage + FiscalStorage
//! // implementation; MemoryStorage ships for tests and prototyping.
//! // let core = AccountingCore::new(MemoryStorage::new());
//! ```

pub mod balance;
pub mod chart;
pub mod fiscal;
pub mod ledger;
pub mod reports;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use balance::*;
pub use chart::*;
pub use fiscal::*;
pub use ledger::*;
pub use reports::*;
pub use traits::*;
pub use types::*;
pub use utils::*;

// Re-export document patterns for convenience
pub use ledger::document::patterns;
