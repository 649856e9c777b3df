//! Engine facade that coordinates the chart, accounts, postings, fiscal
//! years, and reports behind one entry point.
//!
//! Managers share one cloned storage handle, so a facade built over a
//! shared backend sees every write immediately. The surrounding
//! application supplies the caller capability per call and, optionally,
//! an audit sink and a project directory.

use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::balance::calculator::signed_total;
use crate::balance::trial::{TrialBalance, TrialBalanceBuilder};
use crate::chart::manager::seed::{seed_standard_chart, StandardChart};
use crate::chart::{
    AccountClass, AccountDetail, AccountGroup, AccountSubClass, ChartIndex, ChartManager,
    ClassPatch, NodePatch,
};
use crate::fiscal::{ClosingEngine, ClosingOutcome, ClosingRequest, FiscalYearManager};
use crate::ledger::document::DraftDocument;
use crate::ledger::{AccountManager, TransactionManager, TransactionPatch};
use crate::reports::{BalanceSheet, BalanceSheetBuilder, LedgerExporter, LedgerExportRow};
use crate::traits::{AnyProject, AuditSink, CoreStorage, NoopAuditSink, ProjectDirectory};
use crate::types::{
    Account, AccountType, AccountingDocument, AccountingEntry, Caller, ClassNature, CoreError,
    CoreResult, FiscalYear, JournalType, NewTransaction, Transaction,
};

/// Facade over all bookkeeping operations of the engine
pub struct AccountingCore<S: CoreStorage + Clone> {
    chart: ChartManager<S>,
    accounts: AccountManager<S>,
    transactions: TransactionManager<S>,
    fiscal: FiscalYearManager<S>,
    closing: ClosingEngine<S>,
    storage: S,
    projects: Arc<dyn ProjectDirectory>,
}

impl<S: CoreStorage + Clone> AccountingCore<S> {
    /// Create a facade over a storage backend, with auditing disabled and
    /// every project accepted
    pub fn new(storage: S) -> Self {
        Self::with_collaborators(storage, Arc::new(NoopAuditSink), Arc::new(AnyProject))
    }

    /// Create a facade wired to an audit sink and a project directory
    pub fn with_collaborators(
        storage: S,
        audit: Arc<dyn AuditSink>,
        projects: Arc<dyn ProjectDirectory>,
    ) -> Self {
        Self {
            chart: ChartManager::with_audit(storage.clone(), audit.clone()),
            accounts: AccountManager::with_audit(storage.clone(), audit.clone()),
            transactions: TransactionManager::with_audit(storage.clone(), audit.clone()),
            fiscal: FiscalYearManager::with_audit(storage.clone(), audit.clone()),
            closing: ClosingEngine::with_audit(storage.clone(), audit),
            storage,
            projects,
        }
    }

    async fn ensure_project(&self, project_id: Uuid) -> CoreResult<()> {
        if self.projects.project_exists(project_id).await {
            Ok(())
        } else {
            Err(CoreError::not_found("project", project_id))
        }
    }

    // Chart of accounts

    /// Seed the standard construction-project chart for a project
    pub async fn seed_standard_chart(
        &mut self,
        caller: &Caller,
        project_id: Uuid,
    ) -> CoreResult<StandardChart> {
        self.ensure_project(project_id).await?;
        seed_standard_chart(&mut self.chart, caller, project_id).await
    }

    /// Create a top-level group
    pub async fn create_group(
        &mut self,
        caller: &Caller,
        project_id: Uuid,
        code: &str,
        name: &str,
    ) -> CoreResult<AccountGroup> {
        self.ensure_project(project_id).await?;
        self.chart.create_group(caller, project_id, code, name).await
    }

    /// Create a class under an active group
    pub async fn create_class(
        &mut self,
        caller: &Caller,
        group_id: Uuid,
        code: &str,
        name: &str,
        nature: ClassNature,
    ) -> CoreResult<AccountClass> {
        self.chart
            .create_class(caller, group_id, code, name, nature)
            .await
    }

    /// Create a subclass under an active class
    pub async fn create_subclass(
        &mut self,
        caller: &Caller,
        class_id: Uuid,
        code: &str,
        name: &str,
    ) -> CoreResult<AccountSubClass> {
        self.chart.create_subclass(caller, class_id, code, name).await
    }

    /// Create a leaf detail under an active subclass
    pub async fn create_detail(
        &mut self,
        caller: &Caller,
        subclass_id: Uuid,
        code: &str,
        name: &str,
    ) -> CoreResult<AccountDetail> {
        self.chart
            .create_detail(caller, subclass_id, code, name)
            .await
    }

    /// Update a group's mutable fields
    pub async fn update_group(
        &mut self,
        caller: &Caller,
        group_id: Uuid,
        patch: NodePatch,
    ) -> CoreResult<AccountGroup> {
        self.chart.update_group(caller, group_id, patch).await
    }

    /// Update a class's mutable fields
    pub async fn update_class(
        &mut self,
        caller: &Caller,
        class_id: Uuid,
        patch: ClassPatch,
    ) -> CoreResult<AccountClass> {
        self.chart.update_class(caller, class_id, patch).await
    }

    /// Update a subclass's mutable fields
    pub async fn update_subclass(
        &mut self,
        caller: &Caller,
        subclass_id: Uuid,
        patch: NodePatch,
    ) -> CoreResult<AccountSubClass> {
        self.chart.update_subclass(caller, subclass_id, patch).await
    }

    /// Update a detail's mutable fields
    pub async fn update_detail(
        &mut self,
        caller: &Caller,
        detail_id: Uuid,
        patch: NodePatch,
    ) -> CoreResult<AccountDetail> {
        self.chart.update_detail(caller, detail_id, patch).await
    }

    /// Soft-delete a group, freeing its code for reuse
    pub async fn deactivate_group(&mut self, caller: &Caller, group_id: Uuid) -> CoreResult<()> {
        self.chart.deactivate_group(caller, group_id).await
    }

    /// Soft-delete a class
    pub async fn deactivate_class(&mut self, caller: &Caller, class_id: Uuid) -> CoreResult<()> {
        self.chart.deactivate_class(caller, class_id).await
    }

    /// Soft-delete a subclass
    pub async fn deactivate_subclass(
        &mut self,
        caller: &Caller,
        subclass_id: Uuid,
    ) -> CoreResult<()> {
        self.chart.deactivate_subclass(caller, subclass_id).await
    }

    /// Soft-delete a detail
    pub async fn deactivate_detail(&mut self, caller: &Caller, detail_id: Uuid) -> CoreResult<()> {
        self.chart.deactivate_detail(caller, detail_id).await
    }

    /// List a project's groups, including inactive ones
    pub async fn list_groups(&self, project_id: Uuid) -> CoreResult<Vec<AccountGroup>> {
        self.chart.list_groups(project_id).await
    }

    /// List the classes of a group, including inactive ones
    pub async fn list_classes(&self, group_id: Uuid) -> CoreResult<Vec<AccountClass>> {
        self.chart.list_classes(group_id).await
    }

    /// List the subclasses of a class, including inactive ones
    pub async fn list_subclasses(&self, class_id: Uuid) -> CoreResult<Vec<AccountSubClass>> {
        self.chart.list_subclasses(class_id).await
    }

    /// List the details of a subclass, including inactive ones
    pub async fn list_details(&self, subclass_id: Uuid) -> CoreResult<Vec<AccountDetail>> {
        self.chart.list_details(subclass_id).await
    }

    /// Snapshot of the project's active chart for code resolution
    pub async fn chart_index(&self, project_id: Uuid) -> CoreResult<ChartIndex> {
        self.chart.index(project_id).await
    }

    // Accounts

    /// Create an account addressed by a resolved 6-digit full code
    pub async fn create_linked_account(
        &mut self,
        caller: &Caller,
        project_id: Uuid,
        full_code: &str,
        name: &str,
        account_type: AccountType,
    ) -> CoreResult<Account> {
        self.ensure_project(project_id).await?;
        self.accounts
            .create_linked_account(caller, project_id, full_code, name, account_type)
            .await
    }

    /// Create an account outside the hierarchy with a self-assigned code
    pub async fn create_direct_account(
        &mut self,
        caller: &Caller,
        project_id: Uuid,
        code: &str,
        name: &str,
        account_type: AccountType,
    ) -> CoreResult<Account> {
        self.ensure_project(project_id).await?;
        self.accounts
            .create_direct_account(caller, project_id, code, name, account_type)
            .await
    }

    /// Get an account by ID
    pub async fn get_account(&self, account_id: Uuid) -> CoreResult<Option<Account>> {
        self.accounts.get_account(account_id).await
    }

    /// List the active accounts of a project
    pub async fn list_accounts(&self, project_id: Uuid) -> CoreResult<Vec<Account>> {
        self.accounts.list_accounts(project_id).await
    }

    /// Rename an account
    pub async fn rename_account(
        &mut self,
        caller: &Caller,
        account_id: Uuid,
        name: &str,
    ) -> CoreResult<Account> {
        self.accounts.rename_account(caller, account_id, name).await
    }

    /// Soft-delete an account, keeping its postings in the books
    pub async fn deactivate_account(
        &mut self,
        caller: &Caller,
        account_id: Uuid,
    ) -> CoreResult<()> {
        self.accounts.deactivate_account(caller, account_id).await
    }

    /// Nature-aware signed balance of an account over its whole history
    pub async fn account_balance(&self, account_id: Uuid) -> CoreResult<BigDecimal> {
        let account = self
            .storage
            .get_account(account_id)
            .await?
            .ok_or_else(|| CoreError::not_found("account", account_id))?;
        let postings = self.storage.list_account_transactions(account_id).await?;
        Ok(signed_total(&account, &postings))
    }

    // Documents and postings

    /// Post a balanced draft as a permanent document
    pub async fn post_document(
        &mut self,
        caller: &Caller,
        draft: DraftDocument,
    ) -> CoreResult<AccountingDocument> {
        self.ensure_project(draft.project_id).await?;
        self.transactions.post_document(caller, draft).await
    }

    /// Store a balanced draft as a temporary document that moves no
    /// balances until finalized
    pub async fn post_draft_document(
        &mut self,
        caller: &Caller,
        draft: DraftDocument,
    ) -> CoreResult<AccountingDocument> {
        self.ensure_project(draft.project_id).await?;
        self.transactions.post_draft_document(caller, draft).await
    }

    /// Turn a temporary document permanent
    pub async fn finalize_document(
        &mut self,
        caller: &Caller,
        document_id: Uuid,
    ) -> CoreResult<AccountingDocument> {
        self.transactions.finalize_document(caller, document_id).await
    }

    /// Record a standalone posting outside any document
    pub async fn record_transaction(
        &mut self,
        caller: &Caller,
        input: NewTransaction,
    ) -> CoreResult<Transaction> {
        self.ensure_project(input.project_id).await?;
        self.transactions.record_transaction(caller, input).await
    }

    /// Amend a standalone posting
    pub async fn update_transaction(
        &mut self,
        caller: &Caller,
        transaction_id: Uuid,
        patch: TransactionPatch,
    ) -> CoreResult<Transaction> {
        self.transactions
            .update_transaction(caller, transaction_id, patch)
            .await
    }

    /// Delete a standalone posting
    pub async fn delete_transaction(
        &mut self,
        caller: &Caller,
        transaction_id: Uuid,
    ) -> CoreResult<()> {
        self.transactions
            .delete_transaction(caller, transaction_id)
            .await
    }

    /// Get a posting by ID
    pub async fn get_transaction(&self, transaction_id: Uuid) -> CoreResult<Option<Transaction>> {
        self.transactions.get_transaction(transaction_id).await
    }

    /// Get a document by ID
    pub async fn get_document(&self, document_id: Uuid) -> CoreResult<Option<AccountingDocument>> {
        self.transactions.get_document(document_id).await
    }

    /// List a project's documents in creation order
    pub async fn list_documents(&self, project_id: Uuid) -> CoreResult<Vec<AccountingDocument>> {
        self.transactions.list_documents(project_id).await
    }

    /// List the line items of a document
    pub async fn list_document_entries(
        &self,
        document_id: Uuid,
    ) -> CoreResult<Vec<AccountingEntry>> {
        self.transactions.list_document_entries(document_id).await
    }

    /// The daybook: every posting of the project in chronological order
    pub async fn daybook(&self, project_id: Uuid) -> CoreResult<Vec<Transaction>> {
        self.transactions.daybook(project_id).await
    }

    /// The ledger card of one account
    pub async fn account_ledger(&self, account_id: Uuid) -> CoreResult<Vec<Transaction>> {
        self.transactions.account_ledger(account_id).await
    }

    /// Postings tagged for one classical book
    pub async fn journal_postings(
        &self,
        project_id: Uuid,
        journal_type: JournalType,
    ) -> CoreResult<Vec<Transaction>> {
        self.transactions.journal_postings(project_id, journal_type).await
    }

    // Fiscal years

    /// Open a fiscal year for a project
    pub async fn open_fiscal_year(
        &mut self,
        caller: &Caller,
        project_id: Uuid,
        year: i32,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> CoreResult<FiscalYear> {
        self.ensure_project(project_id).await?;
        self.fiscal
            .open_fiscal_year(caller, project_id, year, start_date, end_date)
            .await
    }

    /// The project's single active fiscal year, if any
    pub async fn active_fiscal_year(&self, project_id: Uuid) -> CoreResult<Option<FiscalYear>> {
        self.fiscal.active_fiscal_year(project_id).await
    }

    /// Get a fiscal year by ID
    pub async fn get_fiscal_year(&self, fiscal_year_id: Uuid) -> CoreResult<Option<FiscalYear>> {
        self.fiscal.get_fiscal_year(fiscal_year_id).await
    }

    /// The fiscal year covering a date, if any
    pub async fn fiscal_year_covering(
        &self,
        project_id: Uuid,
        date: NaiveDate,
    ) -> CoreResult<Option<FiscalYear>> {
        self.fiscal.fiscal_year_covering(project_id, date).await
    }

    /// List all fiscal years of a project
    pub async fn list_fiscal_years(&self, project_id: Uuid) -> CoreResult<Vec<FiscalYear>> {
        self.fiscal.list_fiscal_years(project_id).await
    }

    /// Close the project's active fiscal year with one atomic batch
    pub async fn close_fiscal_year(
        &mut self,
        caller: &Caller,
        request: ClosingRequest,
    ) -> CoreResult<ClosingOutcome> {
        self.ensure_project(request.project_id).await?;
        self.closing.close_fiscal_year(caller, request).await
    }

    // Reports

    /// Trial balance of a project, optionally split around a period
    pub async fn trial_balance(
        &self,
        project_id: Uuid,
        period: Option<(NaiveDate, NaiveDate)>,
    ) -> CoreResult<TrialBalance> {
        TrialBalanceBuilder::new(&self.storage)
            .build(project_id, period)
            .await
    }

    /// Balance sheet of a project over its full posting history
    pub async fn balance_sheet(&self, project_id: Uuid) -> CoreResult<BalanceSheet> {
        BalanceSheetBuilder::new(&self.storage).build(project_id).await
    }

    /// Export one classical book as printable rows
    pub async fn export_ledger(
        &self,
        project_id: Uuid,
        journal_type: JournalType,
        date_range: Option<(NaiveDate, NaiveDate)>,
    ) -> CoreResult<Vec<LedgerExportRow>> {
        LedgerExporter::new(&self.storage)
            .export(project_id, journal_type, date_range)
            .await
    }

    /// Cross-check the books: the trial balance and the balance sheet
    /// must both balance
    pub async fn verify_books(&self, project_id: Uuid) -> CoreResult<BooksIntegrityReport> {
        let trial = self.trial_balance(project_id, None).await?;
        let sheet = self.balance_sheet(project_id).await?;

        let mut issues = Vec::new();
        if !trial.is_balanced {
            issues.push(format!(
                "Trial balance is not balanced: debit = {}, credit = {}",
                trial.totals.closing_debit, trial.totals.closing_credit
            ));
        }
        let liabilities_and_equity = &sheet.total_liabilities + &sheet.total_equity;
        if !sheet.is_balanced {
            issues.push(format!(
                "Balance sheet is not balanced: assets = {}, liabilities + equity = {}",
                sheet.total_assets, liabilities_and_equity
            ));
        }

        Ok(BooksIntegrityReport {
            project_id,
            is_valid: issues.is_empty(),
            issues,
            trial_closing_debit: trial.totals.closing_debit,
            trial_closing_credit: trial.totals.closing_credit,
            sheet_total_assets: sheet.total_assets,
            sheet_liabilities_and_equity: liabilities_and_equity,
        })
    }
}

/// Result of a books cross-check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BooksIntegrityReport {
    pub project_id: Uuid,
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub trial_closing_debit: BigDecimal,
    pub trial_closing_credit: BigDecimal,
    pub sheet_total_assets: BigDecimal,
    pub sheet_liabilities_and_equity: BigDecimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::document::patterns;
    use crate::utils::memory_storage::MemoryStorage;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn books_flow_from_seed_to_reports() {
        let mut core = AccountingCore::new(MemoryStorage::new());
        let caller = Caller::privileged(Uuid::new_v4());
        let project = Uuid::new_v4();

        let chart = core.seed_standard_chart(&caller, project).await.unwrap();
        let index = core.chart_index(project).await.unwrap();
        let cash_code = index
            .full_code_of_detail(chart.details["cash"].id)
            .unwrap();
        assert_eq!(cash_code, "110101");

        let cash = core
            .create_linked_account(&caller, project, "110101", "صندوق", AccountType::Asset)
            .await
            .unwrap();
        let income = core
            .create_linked_account(
                &caller,
                project,
                "410101",
                "اقساط اعضا",
                AccountType::Income,
            )
            .await
            .unwrap();

        core.open_fiscal_year(&caller, project, 1403, day(2024, 3, 20), day(2025, 3, 19))
            .await
            .unwrap();

        let draft = patterns::member_installment(
            project,
            day(2024, 4, 1),
            cash.id,
            income.id,
            BigDecimal::from(500_000),
            "عضو ۱",
        )
        .unwrap();
        let document = core.post_document(&caller, draft).await.unwrap();
        assert_eq!(document.document_number, "DOC-0001");

        assert_eq!(
            core.account_balance(cash.id).await.unwrap(),
            BigDecimal::from(500_000)
        );

        let trial = core.trial_balance(project, None).await.unwrap();
        assert!(trial.is_balanced);
        assert_eq!(trial.totals.closing_debit, BigDecimal::from(500_000));

        let report = core.verify_books(project).await.unwrap();
        assert!(!report.is_valid); // unclosed income keeps the sheet off
        assert_eq!(report.trial_closing_debit, report.trial_closing_credit);
    }
}
