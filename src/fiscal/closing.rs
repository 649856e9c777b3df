//! Year-end closing.
//!
//! Closing a fiscal year settles every proposed account with a balancing
//! posting inside a single permanent closing document, optionally posts the
//! company's initial capital, and flips the year to closed. All writes are
//! assembled in memory as a [`ClosingBatch`] and committed through
//! `FiscalStorage::commit_closing`, so a failure leaves the year untouched.

use std::collections::HashMap;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::balance::calculator::signed_total;
use crate::ledger::account::{CAPITAL_ACCOUNT_NAME, DEFAULT_CAPITAL_CODE};
use crate::ledger::document::{format_document_number, CLOSING_DOCUMENT_PREFIX};
use crate::traits::{AuditEvent, AuditSink, FiscalStorage, LedgerStorage, NoopAuditSink};
use crate::types::{
    totals_match, Account, AccountType, AccountingDocument, AccountingEntry, Caller, ClosingBatch,
    CoreError, CoreResult, DocumentStatus, EntryType, FiscalYear, JournalType, LedgerSnapshot,
    NewTransaction, Transaction,
};
use crate::utils::validation::validate_positive_amount;

/// Description carried by every closing document ("closing entry")
pub const CLOSING_DOCUMENT_DESCRIPTION: &str = "سند اختتامیه";

/// Posting description for accounts closed for the period
pub const CLOSE_DESCRIPTION: &str = "بستن حساب";

/// Posting description for balances carried into the next year
pub const CARRY_FORWARD_DESCRIPTION: &str = "انتقال به سال بعد";

/// Posting description for the bootstrap capital credit
pub const INITIAL_CAPITAL_DESCRIPTION: &str = "سرمایه اولیه";

/// What happens to an account's balance at year end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClosingDisposition {
    /// Temporary account: the balance is closed for the period
    Close,
    /// Permanent account: the balance is transferred to the next year
    CarryForward,
}

impl ClosingDisposition {
    /// Description stamped on the settling posting
    pub fn posting_description(&self) -> &'static str {
        match self {
            ClosingDisposition::Close => CLOSE_DESCRIPTION,
            ClosingDisposition::CarryForward => CARRY_FORWARD_DESCRIPTION,
        }
    }

    /// The conventional disposition for an account type
    pub fn for_account_type(account_type: &AccountType) -> Self {
        if account_type.is_temporary() {
            ClosingDisposition::Close
        } else {
            ClosingDisposition::CarryForward
        }
    }
}

/// One account's gross totals as proposed for closing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosingAccount {
    pub account_id: Uuid,
    /// Gross debit total of the account for the year
    pub debit: BigDecimal,
    /// Gross credit total of the account for the year
    pub credit: BigDecimal,
    pub disposition: ClosingDisposition,
}

impl ClosingAccount {
    /// Propose an account for closing from its gross totals
    pub fn new(
        account_id: Uuid,
        debit: BigDecimal,
        credit: BigDecimal,
        disposition: ClosingDisposition,
    ) -> Self {
        Self {
            account_id,
            debit,
            credit,
            disposition,
        }
    }
}

/// A full closing proposal for a project's active fiscal year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosingRequest {
    pub project_id: Uuid,
    /// Date of the closing document; must fall inside the active year
    pub closing_date: NaiveDate,
    /// Accounts to settle, with gross totals that must balance overall
    pub accounts: Vec<ClosingAccount>,
    /// Bootstrap share capital, credited to the capital account when set
    pub initial_capital: Option<BigDecimal>,
}

/// The result of a committed closing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosingOutcome {
    /// The fiscal year, now closed and inactive
    pub fiscal_year: FiscalYear,
    /// The permanent CL-numbered closing document
    pub document: AccountingDocument,
}

/// The posting side and amount that settle a gross debit/credit pair,
/// or `None` when the pair already nets to zero
fn settling_side(debit: &BigDecimal, credit: &BigDecimal) -> Option<(EntryType, BigDecimal)> {
    let net = debit - credit;
    let zero = BigDecimal::from(0);
    if net == zero {
        None
    } else if net > zero {
        Some((EntryType::Credit, net))
    } else {
        Some((EntryType::Debit, net.abs()))
    }
}

/// Engine that closes fiscal years
pub struct ClosingEngine<S: LedgerStorage + FiscalStorage> {
    storage: S,
    audit: Arc<dyn AuditSink>,
}

impl<S: LedgerStorage + FiscalStorage> ClosingEngine<S> {
    /// Create a new closing engine
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            audit: Arc::new(NoopAuditSink),
        }
    }

    /// Create a new closing engine with an audit sink
    pub fn with_audit(storage: S, audit: Arc<dyn AuditSink>) -> Self {
        Self { storage, audit }
    }

    /// Close the project's active fiscal year.
    ///
    /// Every proposed account receives the posting that settles its net
    /// balance, stamped per its disposition; the postings form one permanent
    /// closing document that balances because the proposal does. An initial
    /// capital amount, when given, is credited to the project's capital
    /// account (created on first use) as a standalone posting alongside the
    /// document. The whole batch commits atomically.
    pub async fn close_fiscal_year(
        &mut self,
        caller: &Caller,
        request: ClosingRequest,
    ) -> CoreResult<ClosingOutcome> {
        caller.require_privileged()?;

        if request.accounts.is_empty() {
            return Err(CoreError::Validation(
                "Closing requires at least one account".to_string(),
            ));
        }

        let mut total_debit = BigDecimal::from(0);
        let mut total_credit = BigDecimal::from(0);
        for proposed in &request.accounts {
            if proposed.debit < BigDecimal::from(0) || proposed.credit < BigDecimal::from(0) {
                return Err(CoreError::Validation(
                    "Closing totals cannot be negative".to_string(),
                ));
            }
            total_debit += &proposed.debit;
            total_credit += &proposed.credit;
        }
        if !totals_match(&total_debit, &total_credit) {
            return Err(CoreError::Unbalanced {
                debit: total_debit,
                credit: total_credit,
            });
        }

        let year = self
            .storage
            .active_fiscal_year(request.project_id)
            .await?
            .ok_or(CoreError::NoActiveFiscalYear(request.project_id))?;
        if !year.contains(request.closing_date) {
            return Err(CoreError::Validation(format!(
                "Closing date {} falls outside fiscal year {}",
                request.closing_date, year.year
            )));
        }

        let sequence = self
            .storage
            .count_documents(request.project_id, CLOSING_DOCUMENT_PREFIX)
            .await?
            + 1;
        let document_number = format_document_number(CLOSING_DOCUMENT_PREFIX, sequence);

        let now = chrono::Utc::now().naive_utc();
        let document_id = Uuid::new_v4();
        let mut entries = Vec::new();
        let mut transactions = Vec::new();
        let mut touched: HashMap<Uuid, Account> = HashMap::new();
        let mut document_debit = BigDecimal::from(0);
        let mut document_credit = BigDecimal::from(0);

        for proposed in &request.accounts {
            let account = self
                .storage
                .get_account(proposed.account_id)
                .await?
                .ok_or_else(|| CoreError::not_found("account", proposed.account_id))?;
            if account.project_id != request.project_id {
                return Err(CoreError::Validation(format!(
                    "Account '{}' does not belong to this project",
                    account.name
                )));
            }

            let Some((entry_type, amount)) = settling_side(&proposed.debit, &proposed.credit)
            else {
                // already settled, nothing to post
                touched.insert(account.id, account);
                continue;
            };
            let description = proposed.disposition.posting_description();

            let (line_debit, line_credit) = match entry_type {
                EntryType::Debit => (amount.clone(), BigDecimal::from(0)),
                EntryType::Credit => (BigDecimal::from(0), amount.clone()),
            };
            document_debit += &line_debit;
            document_credit += &line_credit;

            entries.push(AccountingEntry {
                id: Uuid::new_v4(),
                document_id,
                account_id: account.id,
                account_code: account.code.clone(),
                account_name: account.name.clone(),
                debit: line_debit,
                credit: line_credit,
                description: Some(description.to_string()),
            });
            transactions.push(Transaction::from_input(
                NewTransaction {
                    project_id: request.project_id,
                    account_id: account.id,
                    date: request.closing_date,
                    amount,
                    entry_type,
                    journal_type: JournalType::Daybook,
                    description: description.to_string(),
                },
                Some(document_id),
            ));
            touched.insert(account.id, account);
        }

        // The bootstrap capital is a standalone credit posting, not a line
        // of the closing document; the document's own lines balance on
        // their own.
        if let Some(capital) = &request.initial_capital {
            validate_positive_amount(capital)?;
            let capital_account = self.find_or_create_capital_account(request.project_id).await?;
            transactions.push(Transaction::from_input(
                NewTransaction {
                    project_id: request.project_id,
                    account_id: capital_account.id,
                    date: request.closing_date,
                    amount: capital.clone(),
                    entry_type: EntryType::Credit,
                    journal_type: JournalType::Daybook,
                    description: INITIAL_CAPITAL_DESCRIPTION.to_string(),
                },
                None,
            ));
            touched.insert(capital_account.id, capital_account);
        }

        let document = AccountingDocument {
            id: document_id,
            project_id: request.project_id,
            document_number,
            document_date: request.closing_date,
            total_debit: document_debit,
            total_credit: document_credit,
            status: DocumentStatus::Permanent,
            description: CLOSING_DOCUMENT_DESCRIPTION.to_string(),
            created_at: now,
        };

        let mut closed_year = year.clone();
        closed_year.is_active = false;
        closed_year.is_closed = true;
        closed_year.closing_entry_id = Some(document.id);

        let mut snapshots = Vec::with_capacity(touched.len());
        for account in touched.values() {
            let mut postings = self.storage.list_account_transactions(account.id).await?;
            postings.extend(
                transactions
                    .iter()
                    .filter(|posting| posting.account_id == account.id)
                    .cloned(),
            );
            snapshots.push(LedgerSnapshot {
                account_id: account.id,
                project_id: request.project_id,
                balance: signed_total(account, postings.iter()),
                computed_at: now,
            });
        }

        let batch = ClosingBatch {
            fiscal_year: closed_year.clone(),
            document: document.clone(),
            entries,
            transactions,
            snapshots,
        };
        self.storage.commit_closing(&batch).await?;

        tracing::info!(
            project_id = %request.project_id,
            document_number = %document.document_number,
            total_debit = %document.total_debit,
            total_credit = %document.total_credit,
            accounts = request.accounts.len(),
            "fiscal year closed"
        );
        self.audit
            .record(AuditEvent::new(
                caller.id,
                request.project_id,
                "close_fiscal_year",
                document.document_number.clone(),
            ))
            .await;

        Ok(ClosingOutcome {
            fiscal_year: closed_year,
            document,
        })
    }

    /// Find the project's capital equity account by name, creating it with
    /// the default code when missing. The account row is inserted before the
    /// closing batch commits so a failed closing can reuse it.
    async fn find_or_create_capital_account(&mut self, project_id: Uuid) -> CoreResult<Account> {
        if let Some(existing) = self
            .storage
            .find_account_by_name(project_id, CAPITAL_ACCOUNT_NAME)
            .await?
        {
            return Ok(existing);
        }

        let account = Account::new_direct(
            project_id,
            DEFAULT_CAPITAL_CODE.to_string(),
            CAPITAL_ACCOUNT_NAME.to_string(),
            AccountType::Equity,
        );
        self.storage.insert_account(&account).await?;
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debit_heavy_accounts_settle_with_a_credit() {
        let side = settling_side(&BigDecimal::from(1_000_000), &BigDecimal::from(0));
        assert_eq!(
            side,
            Some((EntryType::Credit, BigDecimal::from(1_000_000)))
        );
    }

    #[test]
    fn credit_heavy_accounts_settle_with_a_debit() {
        let side = settling_side(&BigDecimal::from(100_000), &BigDecimal::from(350_000));
        assert_eq!(side, Some((EntryType::Debit, BigDecimal::from(250_000))));
    }

    #[test]
    fn settled_accounts_need_no_posting() {
        let side = settling_side(&BigDecimal::from(42), &BigDecimal::from(42));
        assert_eq!(side, None);
    }

    #[test]
    fn dispositions_carry_their_persian_descriptions() {
        assert_eq!(
            ClosingDisposition::Close.posting_description(),
            CLOSE_DESCRIPTION
        );
        assert_eq!(
            ClosingDisposition::CarryForward.posting_description(),
            CARRY_FORWARD_DESCRIPTION
        );
    }

    #[test]
    fn temporary_account_types_default_to_close() {
        assert_eq!(
            ClosingDisposition::for_account_type(&AccountType::Income),
            ClosingDisposition::Close
        );
        assert_eq!(
            ClosingDisposition::for_account_type(&AccountType::Expense),
            ClosingDisposition::Close
        );
        assert_eq!(
            ClosingDisposition::for_account_type(&AccountType::Asset),
            ClosingDisposition::CarryForward
        );
        assert_eq!(
            ClosingDisposition::for_account_type(&AccountType::Equity),
            ClosingDisposition::CarryForward
        );
    }
}
