//! Account management: direct and hierarchy-linked accounts

use std::sync::Arc;
use uuid::Uuid;

use crate::chart::{parse_full_code, ChartIndex, HierarchyLevel};
use crate::traits::{AuditEvent, AuditSink, ChartStorage, LedgerStorage, NoopAuditSink};
use crate::types::{Account, AccountType, Caller, CoreError, CoreResult};
use crate::utils::validation::validate_name;

/// Name of the equity account the closing entry books initial capital
/// against
pub const CAPITAL_ACCOUNT_NAME: &str = "سرمایه";

/// Code assigned to the capital account when it has to be created
pub const DEFAULT_CAPITAL_CODE: &str = "3000";

/// Manager for ledger-postable accounts
pub struct AccountManager<S: LedgerStorage> {
    storage: S,
    audit: Arc<dyn AuditSink>,
}

impl<S: LedgerStorage> AccountManager<S> {
    /// Create a new account manager
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            audit: Arc::new(NoopAuditSink),
        }
    }

    /// Create a new account manager with an audit sink
    pub fn with_audit(storage: S, audit: Arc<dyn AuditSink>) -> Self {
        Self { storage, audit }
    }

    /// Create a standalone account with a self-assigned numeric code.
    ///
    /// Direct accounts live outside the hierarchy; their codes only have
    /// to be digits and unique among the project's active accounts.
    pub async fn create_direct_account(
        &mut self,
        caller: &Caller,
        project_id: Uuid,
        code: &str,
        name: &str,
        account_type: AccountType,
    ) -> CoreResult<Account> {
        caller.require_privileged()?;
        validate_name(name)?;

        if code.is_empty() || code.len() > 10 || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoreError::Validation(format!(
                "Account code must be 1 to 10 digits, got '{}'",
                code
            )));
        }

        let account =
            Account::new_direct(project_id, code.to_string(), name.to_string(), account_type);
        self.storage.insert_account(&account).await?;

        self.audit
            .record(AuditEvent::new(
                caller.id,
                project_id,
                "create_account",
                code,
            ))
            .await;
        Ok(account)
    }

    /// Get an account by ID
    pub async fn get_account(&self, account_id: Uuid) -> CoreResult<Option<Account>> {
        self.storage.get_account(account_id).await
    }

    /// Get an account by ID, returning an error if not found
    pub async fn get_account_required(&self, account_id: Uuid) -> CoreResult<Account> {
        self.storage
            .get_account(account_id)
            .await?
            .ok_or_else(|| CoreError::not_found("account", account_id))
    }

    /// Find an active account by exact name
    pub async fn find_account_by_name(
        &self,
        project_id: Uuid,
        name: &str,
    ) -> CoreResult<Option<Account>> {
        self.storage.find_account_by_name(project_id, name).await
    }

    /// List the active accounts of a project
    pub async fn list_accounts(&self, project_id: Uuid) -> CoreResult<Vec<Account>> {
        self.storage.list_accounts(project_id).await
    }

    /// Rename an account
    pub async fn rename_account(
        &mut self,
        caller: &Caller,
        account_id: Uuid,
        name: &str,
    ) -> CoreResult<Account> {
        caller.require_privileged()?;
        validate_name(name)?;

        let mut account = self.get_account_required(account_id).await?;
        account.name = name.to_string();
        account.updated_at = chrono::Utc::now().naive_utc();
        self.storage.update_account(&account).await?;
        Ok(account)
    }

    /// Soft-delete an account. Its postings stay in the books; the code
    /// becomes available for a fresh account.
    pub async fn deactivate_account(&mut self, caller: &Caller, account_id: Uuid) -> CoreResult<()> {
        caller.require_privileged()?;

        let mut account = self.get_account_required(account_id).await?;
        if !account.is_active {
            return Ok(());
        }

        account.is_active = false;
        account.updated_at = chrono::Utc::now().naive_utc();
        self.storage.update_account(&account).await?;

        tracing::debug!(code = %account.code, "account deactivated");
        self.audit
            .record(AuditEvent::new(
                caller.id,
                account.project_id,
                "deactivate_account",
                account.code,
            ))
            .await;
        Ok(())
    }
}

impl<S: LedgerStorage + ChartStorage> AccountManager<S> {
    /// Create an account linked to a hierarchy detail, addressed by its
    /// 6-digit full code. The code must resolve through the project's
    /// active chart.
    pub async fn create_linked_account(
        &mut self,
        caller: &Caller,
        project_id: Uuid,
        full_code: &str,
        name: &str,
        account_type: AccountType,
    ) -> CoreResult<Account> {
        caller.require_privileged()?;
        validate_name(name)?;

        let parsed = parse_full_code(full_code)?;
        if parsed.level() != HierarchyLevel::Detail {
            return Err(CoreError::Validation(format!(
                "Linked accounts attach to details; '{}' does not address one",
                full_code
            )));
        }

        let index = ChartIndex::load(&self.storage, project_id).await?;
        let detail = index
            .detail_by_full_code(full_code)
            .ok_or_else(|| CoreError::not_found("detail", full_code))?;

        let account = Account::new_linked(
            project_id,
            detail.id,
            full_code.to_string(),
            name.to_string(),
            account_type,
        );
        self.storage.insert_account(&account).await?;

        self.audit
            .record(AuditEvent::new(
                caller.id,
                project_id,
                "create_account",
                full_code,
            ))
            .await;
        Ok(account)
    }
}
