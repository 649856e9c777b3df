//! Core types and data structures for the accounting engine

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account types following standard accounting principles
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    /// Assets - what the project owns (cash, bank, buildings, equipment)
    Asset,
    /// Liabilities - what the project owes (payables, contractor deposits)
    Liability,
    /// Equity - owners' interest in the project (capital, retained earnings)
    Equity,
    /// Income/Revenue - money earned (member installments, sales)
    Income,
    /// Expenses - costs incurred (materials, wages, fees)
    Expense,
}

impl AccountType {
    /// Returns the nature of this account type: the entry side that
    /// increases its balance.
    ///
    /// Assets and Expenses are debit-positive (balance = debit - credit);
    /// Liabilities, Equity, and Income are credit-positive
    /// (balance = credit - debit).
    pub fn nature(&self) -> EntryType {
        match self {
            AccountType::Asset | AccountType::Expense => EntryType::Debit,
            AccountType::Liability | AccountType::Equity | AccountType::Income => EntryType::Credit,
        }
    }

    /// Temporary accounts are zeroed by the year-end closing entry.
    /// Permanent accounts carry their balance into the next fiscal year.
    pub fn is_temporary(&self) -> bool {
        matches!(self, AccountType::Income | AccountType::Expense)
    }
}

/// Side of a posting in double-entry bookkeeping
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    /// Debit entry - increases Assets and Expenses
    Debit,
    /// Credit entry - increases Liabilities, Equity, and Income
    Credit,
}

impl EntryType {
    /// The opposite posting side
    pub fn opposite(&self) -> EntryType {
        match self {
            EntryType::Debit => EntryType::Credit,
            EntryType::Credit => EntryType::Debit,
        }
    }
}

/// Which classical book a posting is tagged for.
///
/// The daybook records every posting chronologically; the general ledger
/// and subsidiary ledger are projections of the same posting store, not
/// separate stores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JournalType {
    /// Chronological journal of all postings
    Daybook,
    /// Per-account-type projection
    GeneralLedger,
    /// Per-counterparty projection
    Subsidiary,
}

/// Document lifecycle status
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentStatus {
    /// Draft document, not yet audit-relevant
    Temporary,
    /// Posted document; feeds the daybook and downstream reports
    Permanent,
}

impl DocumentStatus {
    pub fn is_permanent(&self) -> bool {
        matches!(self, DocumentStatus::Permanent)
    }
}

/// Declared nature of an account class in the chart of accounts
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassNature {
    /// Accounts under this class normally carry debit balances
    Debit,
    /// Accounts under this class normally carry credit balances
    Credit,
    /// Mixed-nature class (clearing and adjustment accounts)
    DebitCredit,
}

/// Per-call capability context passed into every mutating operation.
///
/// The surrounding application resolves sessions and roles; the engine only
/// sees the resulting capability and never consults ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    /// Actor identity, recorded in audit events
    pub id: Uuid,
    privileged: bool,
}

impl Caller {
    /// A privileged (administrator) caller
    pub fn privileged(id: Uuid) -> Self {
        Self {
            id,
            privileged: true,
        }
    }

    /// A regular caller without mutation rights
    pub fn regular(id: Uuid) -> Self {
        Self {
            id,
            privileged: false,
        }
    }

    pub fn is_privileged(&self) -> bool {
        self.privileged
    }

    /// Reject non-privileged callers attempting a mutation
    pub fn require_privileged(&self) -> CoreResult<()> {
        if self.privileged {
            Ok(())
        } else {
            Err(CoreError::Unauthorized)
        }
    }
}

/// A ledger-postable account.
///
/// Either linked to a hierarchy detail (full code derived from the detail's
/// ancestry: group, class, subclass, detail concatenated into 6 digits) or
/// standalone ("direct") with a self-assigned code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier for the account
    pub id: Uuid,
    /// Project this account belongs to
    pub project_id: Uuid,
    /// Resolved full code for linked accounts, self-assigned for direct ones
    pub code: String,
    /// Human-readable account name
    pub name: String,
    /// Type of account (Asset, Liability, etc.)
    pub account_type: AccountType,
    /// Linked hierarchy detail, if any
    pub detail_id: Option<Uuid>,
    /// Inactive accounts are excluded from reports and reject new postings
    pub is_active: bool,
    /// When the account was created
    pub created_at: NaiveDateTime,
    /// When the account was last updated
    pub updated_at: NaiveDateTime,
}

impl Account {
    /// Create a standalone account with a self-assigned code
    pub fn new_direct(
        project_id: Uuid,
        code: String,
        name: String,
        account_type: AccountType,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4(),
            project_id,
            code,
            name,
            account_type,
            detail_id: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create an account linked to a hierarchy detail, storing the resolved
    /// 6-digit full code denormalized
    pub fn new_linked(
        project_id: Uuid,
        detail_id: Uuid,
        full_code: String,
        name: String,
        account_type: AccountType,
    ) -> Self {
        let mut account = Self::new_direct(project_id, full_code, name, account_type);
        account.detail_id = Some(detail_id);
        account
    }

    pub fn is_linked(&self) -> bool {
        self.detail_id.is_some()
    }

    /// The entry side that increases this account's balance
    pub fn nature(&self) -> EntryType {
        self.account_type.nature()
    }

    /// Nature-aware signed balance from gross debit/credit totals
    pub fn signed_balance(
        &self,
        debit_total: &BigDecimal,
        credit_total: &BigDecimal,
    ) -> BigDecimal {
        match self.nature() {
            EntryType::Debit => debit_total - credit_total,
            EntryType::Credit => credit_total - debit_total,
        }
    }
}

/// An immutable posting against exactly one account.
///
/// Postings are recorded singly or as lines of an [`AccountingDocument`];
/// once their fiscal year is closed they can no longer be touched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier for the posting
    pub id: Uuid,
    /// Project this posting belongs to
    pub project_id: Uuid,
    /// The single account being moved
    pub account_id: Uuid,
    /// Date the posting takes effect
    pub date: NaiveDate,
    /// Posted amount, always positive
    pub amount: BigDecimal,
    /// Debit or credit
    pub entry_type: EntryType,
    /// Which classical book this posting is tagged for
    pub journal_type: JournalType,
    /// Owning document, if posted as part of a batch
    pub document_id: Option<Uuid>,
    /// Description of the posting
    pub description: String,
    /// When the posting was recorded
    pub created_at: NaiveDateTime,
}

/// Input for recording a single posting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub project_id: Uuid,
    pub account_id: Uuid,
    pub date: NaiveDate,
    pub amount: BigDecimal,
    pub entry_type: EntryType,
    pub journal_type: JournalType,
    pub description: String,
}

impl Transaction {
    /// Materialize a posting from its input, optionally linked to a document
    pub fn from_input(input: NewTransaction, document_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id: input.project_id,
            account_id: input.account_id,
            date: input.date,
            amount: input.amount,
            entry_type: input.entry_type,
            journal_type: input.journal_type,
            document_id,
            description: input.description,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}

/// A balanced batch of postings under one sequential document number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountingDocument {
    /// Unique identifier for the document
    pub id: Uuid,
    /// Project this document belongs to
    pub project_id: Uuid,
    /// Sequential prefixed number ("DOC-0012"; "CL-0001" for closing)
    pub document_number: String,
    /// Date of the document
    pub document_date: NaiveDate,
    /// Sum of all debit lines
    pub total_debit: BigDecimal,
    /// Sum of all credit lines; equals `total_debit` within 0.01
    pub total_credit: BigDecimal,
    /// Draft (temporary) or posted (permanent)
    pub status: DocumentStatus,
    /// Description of the document
    pub description: String,
    /// When the document was created
    pub created_at: NaiveDateTime,
}

/// A line item of a document, with the account identity denormalized so the
/// document explains itself without further lookups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountingEntry {
    pub id: Uuid,
    pub document_id: Uuid,
    pub account_id: Uuid,
    /// Account code at posting time
    pub account_code: String,
    /// Account name at posting time
    pub account_name: String,
    /// Debit amount of this line (zero for credit lines)
    pub debit: BigDecimal,
    /// Credit amount of this line (zero for debit lines)
    pub credit: BigDecimal,
    /// Optional line description
    pub description: Option<String>,
}

/// An accounting period with an open-then-closed lifecycle.
///
/// At most one fiscal year per project is active (open) at a time; a closed
/// year accepts no new postings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiscalYear {
    /// Unique identifier for the fiscal year
    pub id: Uuid,
    /// Project this fiscal year belongs to
    pub project_id: Uuid,
    /// Calendar label of the year (e.g. 1403)
    pub year: i32,
    /// First day of the period
    pub start_date: NaiveDate,
    /// Last day of the period
    pub end_date: NaiveDate,
    /// Open for postings
    pub is_active: bool,
    /// Closed by a closing entry
    pub is_closed: bool,
    /// Closing document, once closed
    pub closing_entry_id: Option<Uuid>,
}

impl FiscalYear {
    /// A newly opened fiscal year
    pub fn open(project_id: Uuid, year: i32, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            year,
            start_date,
            end_date,
            is_active: true,
            is_closed: false,
            closing_entry_id: None,
        }
    }

    /// Whether a date falls inside this fiscal year
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// Cached signed balance for one (account, project) pair.
///
/// Derived data only: recomputed from the full posting history on every
/// mutation, never incremented. Used as a fallback when detailed
/// trial-balance computation yields nothing for an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub account_id: Uuid,
    pub project_id: Uuid,
    /// Nature-aware signed balance
    pub balance: BigDecimal,
    /// When the snapshot was last recomputed
    pub computed_at: NaiveDateTime,
}

/// The complete set of writes performed by a fiscal-year closing.
///
/// Assembled in memory by the closing engine and handed to
/// `FiscalStorage::commit_closing`, whose contract is all-or-nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosingBatch {
    /// The fiscal year with `is_closed`, `is_active`, and
    /// `closing_entry_id` already flipped
    pub fiscal_year: FiscalYear,
    /// The CL-numbered permanent closing document
    pub document: AccountingDocument,
    /// Its line items
    pub entries: Vec<AccountingEntry>,
    /// The zeroing, carry-forward, and capital postings
    pub transactions: Vec<Transaction>,
    /// Refreshed ledger snapshots for every touched account
    pub snapshots: Vec<LedgerSnapshot>,
}

/// Maximum difference tolerated between debit and credit totals when a
/// document or closing entry is checked for balance
pub fn balance_tolerance() -> BigDecimal {
    BigDecimal::new(1.into(), 2)
}

/// Whether two totals balance within [`balance_tolerance`]
pub fn totals_match(debit: &BigDecimal, credit: &BigDecimal) -> bool {
    (debit - credit).abs() <= balance_tolerance()
}

/// Errors that can occur in the accounting engine
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Bad code format, missing required field, out-of-range value
    #[error("Validation error: {0}")]
    Validation(String),
    /// Duplicate active code or document number
    #[error("Code '{code}' is already used by an active {scope}")]
    Conflict { code: String, scope: String },
    /// Debit and credit totals differ beyond tolerance
    #[error("Document is not balanced: debit = {debit}, credit = {credit}")]
    Unbalanced {
        debit: BigDecimal,
        credit: BigDecimal,
    },
    /// Missing parent, account, document, or fiscal year
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    /// Non-privileged caller attempting a mutation
    #[error("Operation requires a privileged caller")]
    Unauthorized,
    /// Attempt to delete a protected or default node
    #[error("'{0}' is protected and cannot be deleted")]
    Protected(String),
    /// Closing or posting requested while no fiscal year is open
    #[error("No active fiscal year for project {0}")]
    NoActiveFiscalYear(Uuid),
    /// Posting dated inside a closed fiscal year
    #[error("Fiscal year {year} is closed and accepts no new postings")]
    ClosedFiscalYear { year: i32 },
    /// Storage failure, surfaced generically
    #[error("Storage error: {0}")]
    Storage(String),
}

impl CoreError {
    /// Shorthand for a [`CoreError::NotFound`]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        CoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Result type for engine operations
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nature_follows_account_type() {
        assert_eq!(AccountType::Asset.nature(), EntryType::Debit);
        assert_eq!(AccountType::Expense.nature(), EntryType::Debit);
        assert_eq!(AccountType::Liability.nature(), EntryType::Credit);
        assert_eq!(AccountType::Equity.nature(), EntryType::Credit);
        assert_eq!(AccountType::Income.nature(), EntryType::Credit);
    }

    #[test]
    fn temporary_accounts_are_income_and_expense() {
        assert!(AccountType::Income.is_temporary());
        assert!(AccountType::Expense.is_temporary());
        assert!(!AccountType::Asset.is_temporary());
        assert!(!AccountType::Liability.is_temporary());
        assert!(!AccountType::Equity.is_temporary());
    }

    #[test]
    fn signed_balance_honors_nature() {
        let project = Uuid::new_v4();
        let asset = Account::new_direct(
            project,
            "101".to_string(),
            "صندوق".to_string(),
            AccountType::Asset,
        );
        let liability = Account::new_direct(
            project,
            "201".to_string(),
            "حساب‌های پرداختنی".to_string(),
            AccountType::Liability,
        );

        assert_eq!(
            asset.signed_balance(&BigDecimal::from(100), &BigDecimal::from(30)),
            BigDecimal::from(70)
        );
        assert_eq!(
            liability.signed_balance(&BigDecimal::from(30), &BigDecimal::from(100)),
            BigDecimal::from(70)
        );
    }

    #[test]
    fn totals_match_within_tolerance() {
        let debit = BigDecimal::from(500_000);
        let mut credit = BigDecimal::from(500_000);
        assert!(totals_match(&debit, &credit));

        credit += balance_tolerance();
        assert!(totals_match(&debit, &credit));

        credit += balance_tolerance();
        assert!(!totals_match(&debit, &credit));
    }

    #[test]
    fn regular_caller_is_rejected() {
        let caller = Caller::regular(Uuid::new_v4());
        assert!(matches!(
            caller.require_privileged(),
            Err(CoreError::Unauthorized)
        ));
        assert!(Caller::privileged(Uuid::new_v4())
            .require_privileged()
            .is_ok());
    }

    #[test]
    fn fiscal_year_date_containment() {
        let year = FiscalYear::open(
            Uuid::new_v4(),
            1403,
            NaiveDate::from_ymd_opt(2024, 3, 20).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 20).unwrap(),
        );
        assert!(year.contains(NaiveDate::from_ymd_opt(2024, 3, 20).unwrap()));
        assert!(year.contains(NaiveDate::from_ymd_opt(2024, 9, 1).unwrap()));
        assert!(!year.contains(NaiveDate::from_ymd_opt(2025, 3, 21).unwrap()));
    }
}
