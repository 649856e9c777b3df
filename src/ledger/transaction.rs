//! Posting engine: documents, single postings, journals, and snapshots

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::balance::calculator;
use crate::ledger::document::{format_document_number, DraftDocument, GENERAL_DOCUMENT_PREFIX};
use crate::traits::{AuditEvent, AuditSink, FiscalStorage, LedgerStorage, NoopAuditSink};
use crate::types::*;
use crate::utils::validation::{validate_description, validate_positive_amount};

/// Partial update for a standalone posting
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPatch {
    pub date: Option<NaiveDate>,
    pub amount: Option<BigDecimal>,
    pub entry_type: Option<EntryType>,
    pub description: Option<String>,
}

/// Manager for postings and accounting documents.
///
/// Every mutation ends by recomputing the ledger snapshots of the touched
/// accounts from their full posting history; snapshots are never patched
/// incrementally.
pub struct TransactionManager<S: LedgerStorage + FiscalStorage> {
    storage: S,
    audit: Arc<dyn AuditSink>,
}

impl<S: LedgerStorage + FiscalStorage> TransactionManager<S> {
    /// Create a new transaction manager
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            audit: Arc::new(NoopAuditSink),
        }
    }

    /// Create a new transaction manager with an audit sink
    pub fn with_audit(storage: S, audit: Arc<dyn AuditSink>) -> Self {
        Self { storage, audit }
    }

    /// Post a balanced draft as a permanent document.
    ///
    /// Assigns the next sequential DOC number, materializes one posting
    /// per line, and writes document, entries, and postings in a single
    /// atomic storage call.
    pub async fn post_document(
        &mut self,
        caller: &Caller,
        draft: DraftDocument,
    ) -> CoreResult<AccountingDocument> {
        self.insert_draft(caller, draft, DocumentStatus::Permanent)
            .await
    }

    /// Store a draft as a temporary document: the document and its lines
    /// are kept, but no postings exist until it is finalized, so it moves
    /// no balances and stays out of the daybook.
    pub async fn post_draft_document(
        &mut self,
        caller: &Caller,
        draft: DraftDocument,
    ) -> CoreResult<AccountingDocument> {
        self.insert_draft(caller, draft, DocumentStatus::Temporary)
            .await
    }

    async fn insert_draft(
        &mut self,
        caller: &Caller,
        draft: DraftDocument,
        status: DocumentStatus,
    ) -> CoreResult<AccountingDocument> {
        caller.require_privileged()?;
        self.guard_open_fiscal_year(draft.project_id, draft.document_date)
            .await?;

        // Resolve every line account once; all must be active and in-project
        let mut accounts: HashMap<Uuid, Account> = HashMap::new();
        for line in &draft.lines {
            if accounts.contains_key(&line.account_id) {
                continue;
            }
            let account = self
                .storage
                .get_account(line.account_id)
                .await?
                .ok_or_else(|| CoreError::not_found("account", line.account_id))?;
            if account.project_id != draft.project_id {
                return Err(CoreError::Validation(format!(
                    "Account '{}' belongs to a different project",
                    account.code
                )));
            }
            if !account.is_active {
                return Err(CoreError::Validation(format!(
                    "Account '{}' is inactive and rejects postings",
                    account.code
                )));
            }
            accounts.insert(line.account_id, account);
        }

        let sequence = self
            .storage
            .count_documents(draft.project_id, GENERAL_DOCUMENT_PREFIX)
            .await?
            + 1;
        let document = AccountingDocument {
            id: Uuid::new_v4(),
            project_id: draft.project_id,
            document_number: format_document_number(GENERAL_DOCUMENT_PREFIX, sequence),
            document_date: draft.document_date,
            total_debit: draft.total_debit.clone(),
            total_credit: draft.total_credit.clone(),
            status: status.clone(),
            description: draft.description.clone(),
            created_at: chrono::Utc::now().naive_utc(),
        };

        let mut entries = Vec::with_capacity(draft.lines.len());
        let mut postings = Vec::new();
        for line in &draft.lines {
            let account = &accounts[&line.account_id];
            let (debit, credit) = match line.entry_type {
                EntryType::Debit => (line.amount.clone(), BigDecimal::from(0)),
                EntryType::Credit => (BigDecimal::from(0), line.amount.clone()),
            };
            entries.push(AccountingEntry {
                id: Uuid::new_v4(),
                document_id: document.id,
                account_id: line.account_id,
                account_code: account.code.clone(),
                account_name: account.name.clone(),
                debit,
                credit,
                description: line.description.clone(),
            });

            if status.is_permanent() {
                postings.push(Transaction::from_input(
                    NewTransaction {
                        project_id: draft.project_id,
                        account_id: line.account_id,
                        date: draft.document_date,
                        amount: line.amount.clone(),
                        entry_type: line.entry_type.clone(),
                        journal_type: JournalType::Daybook,
                        description: line
                            .description
                            .clone()
                            .unwrap_or_else(|| draft.description.clone()),
                    },
                    Some(document.id),
                ));
            }
        }

        self.storage
            .insert_document(&document, &entries, &postings)
            .await?;

        if status.is_permanent() {
            self.refresh_snapshots(accounts.keys().copied()).await?;
        }

        tracing::info!(
            number = %document.document_number,
            lines = entries.len(),
            total = %document.total_debit,
            "document posted"
        );
        self.audit
            .record(AuditEvent::new(
                caller.id,
                document.project_id,
                "post_document",
                document.document_number.clone(),
            ))
            .await;

        Ok(document)
    }

    /// Turn a temporary document permanent, materializing its postings.
    /// Finalizing an already permanent document is a no-op.
    pub async fn finalize_document(
        &mut self,
        caller: &Caller,
        document_id: Uuid,
    ) -> CoreResult<AccountingDocument> {
        caller.require_privileged()?;

        let mut document = self
            .storage
            .get_document(document_id)
            .await?
            .ok_or_else(|| CoreError::not_found("document", document_id))?;
        if document.status.is_permanent() {
            return Ok(document);
        }

        self.guard_open_fiscal_year(document.project_id, document.document_date)
            .await?;

        let entries = self.storage.list_document_entries(document_id).await?;
        let mut touched = HashSet::new();
        for entry in &entries {
            let zero = BigDecimal::from(0);
            let (amount, entry_type) = if entry.debit > zero {
                (entry.debit.clone(), EntryType::Debit)
            } else if entry.credit > zero {
                (entry.credit.clone(), EntryType::Credit)
            } else {
                continue;
            };

            let posting = Transaction::from_input(
                NewTransaction {
                    project_id: document.project_id,
                    account_id: entry.account_id,
                    date: document.document_date,
                    amount,
                    entry_type,
                    journal_type: JournalType::Daybook,
                    description: entry
                        .description
                        .clone()
                        .unwrap_or_else(|| document.description.clone()),
                },
                Some(document.id),
            );
            self.storage.insert_transaction(&posting).await?;
            touched.insert(entry.account_id);
        }

        document.status = DocumentStatus::Permanent;
        self.storage.update_document(&document).await?;
        self.refresh_snapshots(touched.into_iter()).await?;

        tracing::info!(number = %document.document_number, "document finalized");
        self.audit
            .record(AuditEvent::new(
                caller.id,
                document.project_id,
                "finalize_document",
                document.document_number.clone(),
            ))
            .await;

        Ok(document)
    }

    /// Record a standalone posting outside any document
    pub async fn record_transaction(
        &mut self,
        caller: &Caller,
        input: NewTransaction,
    ) -> CoreResult<Transaction> {
        caller.require_privileged()?;
        validate_positive_amount(&input.amount)?;
        validate_description(&input.description)?;
        self.guard_open_fiscal_year(input.project_id, input.date)
            .await?;

        let account = self
            .storage
            .get_account(input.account_id)
            .await?
            .ok_or_else(|| CoreError::not_found("account", input.account_id))?;
        if account.project_id != input.project_id {
            return Err(CoreError::Validation(format!(
                "Account '{}' belongs to a different project",
                account.code
            )));
        }
        if !account.is_active {
            return Err(CoreError::Validation(format!(
                "Account '{}' is inactive and rejects postings",
                account.code
            )));
        }

        let transaction = Transaction::from_input(input, None);
        self.storage.insert_transaction(&transaction).await?;
        self.refresh_snapshot(transaction.account_id).await?;

        self.audit
            .record(AuditEvent::new(
                caller.id,
                transaction.project_id,
                "record_transaction",
                transaction.id.to_string(),
            ))
            .await;

        Ok(transaction)
    }

    /// Amend a standalone posting. Lines of a document cannot be edited
    /// individually; postings inside a closed fiscal year cannot be
    /// touched at all.
    pub async fn update_transaction(
        &mut self,
        caller: &Caller,
        transaction_id: Uuid,
        patch: TransactionPatch,
    ) -> CoreResult<Transaction> {
        caller.require_privileged()?;

        let mut transaction = self.get_transaction_required(transaction_id).await?;
        if transaction.document_id.is_some() {
            return Err(CoreError::Validation(
                "Postings of a document cannot be edited individually".to_string(),
            ));
        }
        self.guard_open_fiscal_year(transaction.project_id, transaction.date)
            .await?;

        if let Some(date) = patch.date {
            transaction.date = date;
        }
        if let Some(amount) = patch.amount {
            validate_positive_amount(&amount)?;
            transaction.amount = amount;
        }
        if let Some(entry_type) = patch.entry_type {
            transaction.entry_type = entry_type;
        }
        if let Some(description) = patch.description {
            validate_description(&description)?;
            transaction.description = description;
        }

        // The new date must not land inside a closed year either
        self.guard_open_fiscal_year(transaction.project_id, transaction.date)
            .await?;

        self.storage.update_transaction(&transaction).await?;
        self.refresh_snapshot(transaction.account_id).await?;

        self.audit
            .record(AuditEvent::new(
                caller.id,
                transaction.project_id,
                "update_transaction",
                transaction.id.to_string(),
            ))
            .await;

        Ok(transaction)
    }

    /// Delete a standalone posting and recompute the account's snapshot
    pub async fn delete_transaction(
        &mut self,
        caller: &Caller,
        transaction_id: Uuid,
    ) -> CoreResult<()> {
        caller.require_privileged()?;

        let transaction = self.get_transaction_required(transaction_id).await?;
        if transaction.document_id.is_some() {
            return Err(CoreError::Validation(
                "Postings of a document cannot be deleted individually".to_string(),
            ));
        }
        self.guard_open_fiscal_year(transaction.project_id, transaction.date)
            .await?;

        self.storage.delete_transaction(transaction_id).await?;
        self.refresh_snapshot(transaction.account_id).await?;

        self.audit
            .record(AuditEvent::new(
                caller.id,
                transaction.project_id,
                "delete_transaction",
                transaction.id.to_string(),
            ))
            .await;

        Ok(())
    }

    /// Get a posting by ID
    pub async fn get_transaction(&self, transaction_id: Uuid) -> CoreResult<Option<Transaction>> {
        self.storage.get_transaction(transaction_id).await
    }

    /// Get a posting by ID, returning an error if not found
    pub async fn get_transaction_required(&self, transaction_id: Uuid) -> CoreResult<Transaction> {
        self.storage
            .get_transaction(transaction_id)
            .await?
            .ok_or_else(|| CoreError::not_found("transaction", transaction_id))
    }

    /// Get a document by ID
    pub async fn get_document(&self, document_id: Uuid) -> CoreResult<Option<AccountingDocument>> {
        self.storage.get_document(document_id).await
    }

    /// List all documents of a project
    pub async fn list_documents(&self, project_id: Uuid) -> CoreResult<Vec<AccountingDocument>> {
        self.storage.list_documents(project_id).await
    }

    /// List the line items of a document
    pub async fn list_document_entries(
        &self,
        document_id: Uuid,
    ) -> CoreResult<Vec<AccountingEntry>> {
        self.storage.list_document_entries(document_id).await
    }

    /// The daybook: every posting of the project in chronological order.
    /// Temporary documents have no postings yet, so only permanent
    /// documents and standalone postings appear.
    pub async fn daybook(&self, project_id: Uuid) -> CoreResult<Vec<Transaction>> {
        self.storage.list_transactions(project_id).await
    }

    /// The ledger card of one account: its postings in chronological order
    pub async fn account_ledger(&self, account_id: Uuid) -> CoreResult<Vec<Transaction>> {
        self.storage.list_account_transactions(account_id).await
    }

    /// Postings tagged for one classical book
    pub async fn journal_postings(
        &self,
        project_id: Uuid,
        journal_type: JournalType,
    ) -> CoreResult<Vec<Transaction>> {
        let postings = self.storage.list_transactions(project_id).await?;
        Ok(postings
            .into_iter()
            .filter(|t| t.journal_type == journal_type)
            .collect())
    }

    /// Recompute one account's cached balance from its full posting
    /// history. Safe to call at any time; the result only depends on the
    /// stored postings.
    pub async fn refresh_snapshot(&mut self, account_id: Uuid) -> CoreResult<LedgerSnapshot> {
        let account = self
            .storage
            .get_account(account_id)
            .await?
            .ok_or_else(|| CoreError::not_found("account", account_id))?;
        let postings = self.storage.list_account_transactions(account_id).await?;

        let snapshot = LedgerSnapshot {
            account_id,
            project_id: account.project_id,
            balance: calculator::signed_total(&account, &postings),
            computed_at: chrono::Utc::now().naive_utc(),
        };
        self.storage.upsert_snapshot(&snapshot).await?;
        Ok(snapshot)
    }

    async fn refresh_snapshots(
        &mut self,
        account_ids: impl Iterator<Item = Uuid>,
    ) -> CoreResult<()> {
        for account_id in account_ids {
            self.refresh_snapshot(account_id).await?;
        }
        Ok(())
    }

    /// Reject mutations dated inside a closed fiscal year. Dates not
    /// covered by any fiscal year are allowed; they fold into opening
    /// balances when a period report runs.
    async fn guard_open_fiscal_year(&self, project_id: Uuid, date: NaiveDate) -> CoreResult<()> {
        if let Some(year) = self.storage.fiscal_year_covering(project_id, date).await? {
            if year.is_closed {
                return Err(CoreError::ClosedFiscalYear { year: year.year });
            }
        }
        Ok(())
    }
}
