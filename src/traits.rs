//! Traits for storage abstraction and engine collaborators

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chart::{AccountClass, AccountDetail, AccountGroup, AccountSubClass};
use crate::types::*;

/// Storage abstraction for the chart of accounts hierarchy.
///
/// Lets the engine work with any backend (PostgreSQL, SQLite, in-memory)
/// by implementing these methods. Code uniqueness among active siblings is
/// enforced here, at insert/update time: callers pre-check for friendlier
/// errors, but the storage conflict is the guard that holds under
/// concurrent writers.
#[async_trait]
pub trait ChartStorage: Send + Sync {
    /// Insert a new group. Fails with [`CoreError::Conflict`] if an active
    /// group with the same code exists in the project.
    async fn insert_group(&mut self, group: &AccountGroup) -> CoreResult<()>;

    /// Update a group. Fails with [`CoreError::Conflict`] if the update
    /// would leave two active groups sharing a code.
    async fn update_group(&mut self, group: &AccountGroup) -> CoreResult<()>;

    /// Get a group by ID
    async fn get_group(&self, group_id: Uuid) -> CoreResult<Option<AccountGroup>>;

    /// List all groups of a project, active and inactive, ordered by
    /// sort order
    async fn list_groups(&self, project_id: Uuid) -> CoreResult<Vec<AccountGroup>>;

    /// Insert a new class. Fails with [`CoreError::Conflict`] if an active
    /// sibling with the same code exists under the group.
    async fn insert_class(&mut self, class: &AccountClass) -> CoreResult<()>;

    /// Update a class, with the same conflict rule as [`Self::insert_class`]
    async fn update_class(&mut self, class: &AccountClass) -> CoreResult<()>;

    /// Get a class by ID
    async fn get_class(&self, class_id: Uuid) -> CoreResult<Option<AccountClass>>;

    /// List all classes under a group, active and inactive, ordered by
    /// sort order
    async fn list_classes(&self, group_id: Uuid) -> CoreResult<Vec<AccountClass>>;

    /// Insert a new subclass. Fails with [`CoreError::Conflict`] if an
    /// active sibling with the same code exists under the class.
    async fn insert_subclass(&mut self, subclass: &AccountSubClass) -> CoreResult<()>;

    /// Update a subclass, with the same conflict rule as
    /// [`Self::insert_subclass`]
    async fn update_subclass(&mut self, subclass: &AccountSubClass) -> CoreResult<()>;

    /// Get a subclass by ID
    async fn get_subclass(&self, subclass_id: Uuid) -> CoreResult<Option<AccountSubClass>>;

    /// List all subclasses under a class, active and inactive, ordered by
    /// sort order
    async fn list_subclasses(&self, class_id: Uuid) -> CoreResult<Vec<AccountSubClass>>;

    /// Insert a new detail. Fails with [`CoreError::Conflict`] if an active
    /// sibling with the same code exists under the subclass.
    async fn insert_detail(&mut self, detail: &AccountDetail) -> CoreResult<()>;

    /// Update a detail, with the same conflict rule as
    /// [`Self::insert_detail`]
    async fn update_detail(&mut self, detail: &AccountDetail) -> CoreResult<()>;

    /// Get a detail by ID
    async fn get_detail(&self, detail_id: Uuid) -> CoreResult<Option<AccountDetail>>;

    /// List all details under a subclass, active and inactive, ordered by
    /// sort order
    async fn list_details(&self, subclass_id: Uuid) -> CoreResult<Vec<AccountDetail>>;
}

/// Storage abstraction for accounts, postings, documents, and cached
/// balances
#[async_trait]
pub trait LedgerStorage: Send + Sync {
    /// Insert a new account. Fails with [`CoreError::Conflict`] if an
    /// active account with the same code exists in the project.
    async fn insert_account(&mut self, account: &Account) -> CoreResult<()>;

    /// Update an account, with the same conflict rule as
    /// [`Self::insert_account`]
    async fn update_account(&mut self, account: &Account) -> CoreResult<()>;

    /// Get an account by ID, active or not
    async fn get_account(&self, account_id: Uuid) -> CoreResult<Option<Account>>;

    /// Find an active account by exact name
    async fn find_account_by_name(
        &self,
        project_id: Uuid,
        name: &str,
    ) -> CoreResult<Option<Account>>;

    /// List the active accounts of a project, ordered by code
    async fn list_accounts(&self, project_id: Uuid) -> CoreResult<Vec<Account>>;

    /// Insert a single posting
    async fn insert_transaction(&mut self, transaction: &Transaction) -> CoreResult<()>;

    /// Update a posting in place
    async fn update_transaction(&mut self, transaction: &Transaction) -> CoreResult<()>;

    /// Delete a posting
    async fn delete_transaction(&mut self, transaction_id: Uuid) -> CoreResult<()>;

    /// Get a posting by ID
    async fn get_transaction(&self, transaction_id: Uuid) -> CoreResult<Option<Transaction>>;

    /// List all postings of a project, ordered by date then creation time
    async fn list_transactions(&self, project_id: Uuid) -> CoreResult<Vec<Transaction>>;

    /// List all postings against one account, ordered by date then
    /// creation time
    async fn list_account_transactions(&self, account_id: Uuid) -> CoreResult<Vec<Transaction>>;

    /// Insert a document together with its entries and postings in one
    /// atomic write. Fails with [`CoreError::Conflict`] on a duplicate
    /// document number, leaving nothing behind.
    async fn insert_document(
        &mut self,
        document: &AccountingDocument,
        entries: &[AccountingEntry],
        transactions: &[Transaction],
    ) -> CoreResult<()>;

    /// Update a document header (status, description)
    async fn update_document(&mut self, document: &AccountingDocument) -> CoreResult<()>;

    /// Get a document by ID
    async fn get_document(&self, document_id: Uuid) -> CoreResult<Option<AccountingDocument>>;

    /// List all documents of a project, ordered by creation time
    async fn list_documents(&self, project_id: Uuid) -> CoreResult<Vec<AccountingDocument>>;

    /// List the line items of a document
    async fn list_document_entries(&self, document_id: Uuid) -> CoreResult<Vec<AccountingEntry>>;

    /// Count documents of a project whose number carries the given prefix,
    /// for sequential numbering
    async fn count_documents(&self, project_id: Uuid, number_prefix: &str) -> CoreResult<u64>;

    /// Insert or replace the cached balance snapshot of an account
    async fn upsert_snapshot(&mut self, snapshot: &LedgerSnapshot) -> CoreResult<()>;

    /// Get the cached balance snapshot of an account, if one was computed
    async fn get_snapshot(
        &self,
        project_id: Uuid,
        account_id: Uuid,
    ) -> CoreResult<Option<LedgerSnapshot>>;

    /// List all cached balance snapshots of a project
    async fn list_snapshots(&self, project_id: Uuid) -> CoreResult<Vec<LedgerSnapshot>>;
}

/// Storage abstraction for fiscal years and the closing commit
#[async_trait]
pub trait FiscalStorage: Send + Sync {
    /// Insert a new fiscal year. Fails with [`CoreError::Conflict`] if the
    /// project already has an active year or a year with the same label.
    async fn insert_fiscal_year(&mut self, fiscal_year: &FiscalYear) -> CoreResult<()>;

    /// Update a fiscal year
    async fn update_fiscal_year(&mut self, fiscal_year: &FiscalYear) -> CoreResult<()>;

    /// Get a fiscal year by ID
    async fn get_fiscal_year(&self, fiscal_year_id: Uuid) -> CoreResult<Option<FiscalYear>>;

    /// The single active fiscal year of a project, if any
    async fn active_fiscal_year(&self, project_id: Uuid) -> CoreResult<Option<FiscalYear>>;

    /// The fiscal year whose date range covers the given date, if any
    async fn fiscal_year_covering(
        &self,
        project_id: Uuid,
        date: NaiveDate,
    ) -> CoreResult<Option<FiscalYear>>;

    /// List all fiscal years of a project, newest first
    async fn list_fiscal_years(&self, project_id: Uuid) -> CoreResult<Vec<FiscalYear>>;

    /// Apply a fully assembled closing batch in one atomic write: the
    /// flipped fiscal year, the closing document with its entries and
    /// postings, and the refreshed snapshots all land together or not
    /// at all.
    async fn commit_closing(&mut self, batch: &ClosingBatch) -> CoreResult<()>;
}

/// Everything the full engine facade needs from one backend
pub trait CoreStorage: ChartStorage + LedgerStorage + FiscalStorage {}

impl<S: ChartStorage + LedgerStorage + FiscalStorage> CoreStorage for S {}

/// A recorded audit fact about a mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Who performed the action
    pub actor_id: Uuid,
    /// Project the action touched
    pub project_id: Uuid,
    /// Short action verb ("post_document", "close_fiscal_year")
    pub action: String,
    /// Identity of the touched object (document number, account code)
    pub subject: String,
    /// When the event was emitted
    pub recorded_at: NaiveDateTime,
}

impl AuditEvent {
    pub fn new(
        actor_id: Uuid,
        project_id: Uuid,
        action: impl Into<String>,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            actor_id,
            project_id,
            action: action.into(),
            subject: subject.into(),
            recorded_at: chrono::Utc::now().naive_utc(),
        }
    }
}

/// Destination for audit events.
///
/// Emission is fire-and-forget: a sink must not fail the originating
/// operation, so `record` returns nothing and sinks swallow their own
/// errors.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: AuditEvent);
}

/// Sink that drops every event
pub struct NoopAuditSink;

#[async_trait]
impl AuditSink for NoopAuditSink {
    async fn record(&self, _event: AuditEvent) {}
}

/// Sink that forwards events to the active `tracing` subscriber
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: AuditEvent) {
        tracing::info!(
            actor = %event.actor_id,
            project = %event.project_id,
            action = %event.action,
            subject = %event.subject,
            "audit event"
        );
    }
}

/// Resolves whether a project exists.
///
/// The engine never manages projects itself; postings are rejected for
/// projects the directory does not know.
#[async_trait]
pub trait ProjectDirectory: Send + Sync {
    async fn project_exists(&self, project_id: Uuid) -> bool;
}

/// Directory that accepts every project ID, for embedding the engine
/// without a surrounding project registry
pub struct AnyProject;

#[async_trait]
impl ProjectDirectory for AnyProject {
    async fn project_exists(&self, _project_id: Uuid) -> bool {
        true
    }
}
