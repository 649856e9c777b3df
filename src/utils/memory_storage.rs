//! In-memory storage backend for testing and development

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::chart::{AccountClass, AccountDetail, AccountGroup, AccountSubClass};
use crate::traits::{ChartStorage, FiscalStorage, LedgerStorage};
use crate::types::{
    Account, AccountingDocument, AccountingEntry, ClosingBatch, CoreError, CoreResult, FiscalYear,
    LedgerSnapshot, Transaction,
};

#[derive(Debug, Default)]
struct Inner {
    groups: HashMap<Uuid, AccountGroup>,
    classes: HashMap<Uuid, AccountClass>,
    subclasses: HashMap<Uuid, AccountSubClass>,
    details: HashMap<Uuid, AccountDetail>,
    accounts: HashMap<Uuid, Account>,
    transactions: HashMap<Uuid, Transaction>,
    documents: HashMap<Uuid, AccountingDocument>,
    /// Document line items keyed by document ID
    entries: HashMap<Uuid, Vec<AccountingEntry>>,
    /// Cached balances keyed by (project, account)
    snapshots: HashMap<(Uuid, Uuid), LedgerSnapshot>,
    fiscal_years: HashMap<Uuid, FiscalYear>,
}

/// In-memory storage backend.
///
/// All collections live behind one lock, so the multi-row writes
/// (`insert_document`, `commit_closing`) apply under a single guard and
/// are atomic. Clones share the same underlying store.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
        }
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        *self.inner.write().unwrap() = Inner::default();
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChartStorage for MemoryStorage {
    async fn insert_group(&mut self, group: &AccountGroup) -> CoreResult<()> {
        let mut inner = self.inner.write().unwrap();
        let clash = inner.groups.values().any(|existing| {
            existing.project_id == group.project_id
                && existing.is_active
                && existing.code == group.code
        });
        if group.is_active && clash {
            return Err(CoreError::Conflict {
                code: group.code.clone(),
                scope: "group".to_string(),
            });
        }
        inner.groups.insert(group.id, group.clone());
        Ok(())
    }

    async fn update_group(&mut self, group: &AccountGroup) -> CoreResult<()> {
        let mut inner = self.inner.write().unwrap();
        if !inner.groups.contains_key(&group.id) {
            return Err(CoreError::not_found("group", group.id));
        }
        let clash = inner.groups.values().any(|existing| {
            existing.id != group.id
                && existing.project_id == group.project_id
                && existing.is_active
                && existing.code == group.code
        });
        if group.is_active && clash {
            return Err(CoreError::Conflict {
                code: group.code.clone(),
                scope: "group".to_string(),
            });
        }
        inner.groups.insert(group.id, group.clone());
        Ok(())
    }

    async fn get_group(&self, group_id: Uuid) -> CoreResult<Option<AccountGroup>> {
        Ok(self.inner.read().unwrap().groups.get(&group_id).cloned())
    }

    async fn list_groups(&self, project_id: Uuid) -> CoreResult<Vec<AccountGroup>> {
        let inner = self.inner.read().unwrap();
        let mut rows: Vec<AccountGroup> = inner
            .groups
            .values()
            .filter(|group| group.project_id == project_id)
            .cloned()
            .collect();
        rows.sort_by_key(|group| group.sort_order);
        Ok(rows)
    }

    async fn insert_class(&mut self, class: &AccountClass) -> CoreResult<()> {
        let mut inner = self.inner.write().unwrap();
        let clash = inner.classes.values().any(|existing| {
            existing.group_id == class.group_id
                && existing.is_active
                && existing.code == class.code
        });
        if class.is_active && clash {
            return Err(CoreError::Conflict {
                code: class.code.clone(),
                scope: "class".to_string(),
            });
        }
        inner.classes.insert(class.id, class.clone());
        Ok(())
    }

    async fn update_class(&mut self, class: &AccountClass) -> CoreResult<()> {
        let mut inner = self.inner.write().unwrap();
        if !inner.classes.contains_key(&class.id) {
            return Err(CoreError::not_found("class", class.id));
        }
        let clash = inner.classes.values().any(|existing| {
            existing.id != class.id
                && existing.group_id == class.group_id
                && existing.is_active
                && existing.code == class.code
        });
        if class.is_active && clash {
            return Err(CoreError::Conflict {
                code: class.code.clone(),
                scope: "class".to_string(),
            });
        }
        inner.classes.insert(class.id, class.clone());
        Ok(())
    }

    async fn get_class(&self, class_id: Uuid) -> CoreResult<Option<AccountClass>> {
        Ok(self.inner.read().unwrap().classes.get(&class_id).cloned())
    }

    async fn list_classes(&self, group_id: Uuid) -> CoreResult<Vec<AccountClass>> {
        let inner = self.inner.read().unwrap();
        let mut rows: Vec<AccountClass> = inner
            .classes
            .values()
            .filter(|class| class.group_id == group_id)
            .cloned()
            .collect();
        rows.sort_by_key(|class| class.sort_order);
        Ok(rows)
    }

    async fn insert_subclass(&mut self, subclass: &AccountSubClass) -> CoreResult<()> {
        let mut inner = self.inner.write().unwrap();
        let clash = inner.subclasses.values().any(|existing| {
            existing.class_id == subclass.class_id
                && existing.is_active
                && existing.code == subclass.code
        });
        if subclass.is_active && clash {
            return Err(CoreError::Conflict {
                code: subclass.code.clone(),
                scope: "subclass".to_string(),
            });
        }
        inner.subclasses.insert(subclass.id, subclass.clone());
        Ok(())
    }

    async fn update_subclass(&mut self, subclass: &AccountSubClass) -> CoreResult<()> {
        let mut inner = self.inner.write().unwrap();
        if !inner.subclasses.contains_key(&subclass.id) {
            return Err(CoreError::not_found("subclass", subclass.id));
        }
        let clash = inner.subclasses.values().any(|existing| {
            existing.id != subclass.id
                && existing.class_id == subclass.class_id
                && existing.is_active
                && existing.code == subclass.code
        });
        if subclass.is_active && clash {
            return Err(CoreError::Conflict {
                code: subclass.code.clone(),
                scope: "subclass".to_string(),
            });
        }
        inner.subclasses.insert(subclass.id, subclass.clone());
        Ok(())
    }

    async fn get_subclass(&self, subclass_id: Uuid) -> CoreResult<Option<AccountSubClass>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .subclasses
            .get(&subclass_id)
            .cloned())
    }

    async fn list_subclasses(&self, class_id: Uuid) -> CoreResult<Vec<AccountSubClass>> {
        let inner = self.inner.read().unwrap();
        let mut rows: Vec<AccountSubClass> = inner
            .subclasses
            .values()
            .filter(|subclass| subclass.class_id == class_id)
            .cloned()
            .collect();
        rows.sort_by_key(|subclass| subclass.sort_order);
        Ok(rows)
    }

    async fn insert_detail(&mut self, detail: &AccountDetail) -> CoreResult<()> {
        let mut inner = self.inner.write().unwrap();
        let clash = inner.details.values().any(|existing| {
            existing.subclass_id == detail.subclass_id
                && existing.is_active
                && existing.code == detail.code
        });
        if detail.is_active && clash {
            return Err(CoreError::Conflict {
                code: detail.code.clone(),
                scope: "detail".to_string(),
            });
        }
        inner.details.insert(detail.id, detail.clone());
        Ok(())
    }

    async fn update_detail(&mut self, detail: &AccountDetail) -> CoreResult<()> {
        let mut inner = self.inner.write().unwrap();
        if !inner.details.contains_key(&detail.id) {
            return Err(CoreError::not_found("detail", detail.id));
        }
        let clash = inner.details.values().any(|existing| {
            existing.id != detail.id
                && existing.subclass_id == detail.subclass_id
                && existing.is_active
                && existing.code == detail.code
        });
        if detail.is_active && clash {
            return Err(CoreError::Conflict {
                code: detail.code.clone(),
                scope: "detail".to_string(),
            });
        }
        inner.details.insert(detail.id, detail.clone());
        Ok(())
    }

    async fn get_detail(&self, detail_id: Uuid) -> CoreResult<Option<AccountDetail>> {
        Ok(self.inner.read().unwrap().details.get(&detail_id).cloned())
    }

    async fn list_details(&self, subclass_id: Uuid) -> CoreResult<Vec<AccountDetail>> {
        let inner = self.inner.read().unwrap();
        let mut rows: Vec<AccountDetail> = inner
            .details
            .values()
            .filter(|detail| detail.subclass_id == subclass_id)
            .cloned()
            .collect();
        rows.sort_by_key(|detail| detail.sort_order);
        Ok(rows)
    }
}

#[async_trait]
impl LedgerStorage for MemoryStorage {
    async fn insert_account(&mut self, account: &Account) -> CoreResult<()> {
        let mut inner = self.inner.write().unwrap();
        let clash = inner.accounts.values().any(|existing| {
            existing.project_id == account.project_id
                && existing.is_active
                && existing.code == account.code
        });
        if account.is_active && clash {
            return Err(CoreError::Conflict {
                code: account.code.clone(),
                scope: "account".to_string(),
            });
        }
        inner.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn update_account(&mut self, account: &Account) -> CoreResult<()> {
        let mut inner = self.inner.write().unwrap();
        if !inner.accounts.contains_key(&account.id) {
            return Err(CoreError::not_found("account", account.id));
        }
        let clash = inner.accounts.values().any(|existing| {
            existing.id != account.id
                && existing.project_id == account.project_id
                && existing.is_active
                && existing.code == account.code
        });
        if account.is_active && clash {
            return Err(CoreError::Conflict {
                code: account.code.clone(),
                scope: "account".to_string(),
            });
        }
        inner.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn get_account(&self, account_id: Uuid) -> CoreResult<Option<Account>> {
        Ok(self.inner.read().unwrap().accounts.get(&account_id).cloned())
    }

    async fn find_account_by_name(
        &self,
        project_id: Uuid,
        name: &str,
    ) -> CoreResult<Option<Account>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .accounts
            .values()
            .find(|account| {
                account.project_id == project_id && account.is_active && account.name == name
            })
            .cloned())
    }

    async fn list_accounts(&self, project_id: Uuid) -> CoreResult<Vec<Account>> {
        let inner = self.inner.read().unwrap();
        let mut rows: Vec<Account> = inner
            .accounts
            .values()
            .filter(|account| account.project_id == project_id && account.is_active)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(rows)
    }

    async fn insert_transaction(&mut self, transaction: &Transaction) -> CoreResult<()> {
        self.inner
            .write()
            .unwrap()
            .transactions
            .insert(transaction.id, transaction.clone());
        Ok(())
    }

    async fn update_transaction(&mut self, transaction: &Transaction) -> CoreResult<()> {
        let mut inner = self.inner.write().unwrap();
        if !inner.transactions.contains_key(&transaction.id) {
            return Err(CoreError::not_found("transaction", transaction.id));
        }
        inner.transactions.insert(transaction.id, transaction.clone());
        Ok(())
    }

    async fn delete_transaction(&mut self, transaction_id: Uuid) -> CoreResult<()> {
        let mut inner = self.inner.write().unwrap();
        if inner.transactions.remove(&transaction_id).is_none() {
            return Err(CoreError::not_found("transaction", transaction_id));
        }
        Ok(())
    }

    async fn get_transaction(&self, transaction_id: Uuid) -> CoreResult<Option<Transaction>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .transactions
            .get(&transaction_id)
            .cloned())
    }

    async fn list_transactions(&self, project_id: Uuid) -> CoreResult<Vec<Transaction>> {
        let inner = self.inner.read().unwrap();
        let mut rows: Vec<Transaction> = inner
            .transactions
            .values()
            .filter(|transaction| transaction.project_id == project_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(rows)
    }

    async fn list_account_transactions(&self, account_id: Uuid) -> CoreResult<Vec<Transaction>> {
        let inner = self.inner.read().unwrap();
        let mut rows: Vec<Transaction> = inner
            .transactions
            .values()
            .filter(|transaction| transaction.account_id == account_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(rows)
    }

    async fn insert_document(
        &mut self,
        document: &AccountingDocument,
        entries: &[AccountingEntry],
        transactions: &[Transaction],
    ) -> CoreResult<()> {
        let mut inner = self.inner.write().unwrap();
        let clash = inner.documents.values().any(|existing| {
            existing.project_id == document.project_id
                && existing.document_number == document.document_number
        });
        if clash {
            return Err(CoreError::Conflict {
                code: document.document_number.clone(),
                scope: "document".to_string(),
            });
        }

        inner.documents.insert(document.id, document.clone());
        inner.entries.insert(document.id, entries.to_vec());
        for transaction in transactions {
            inner.transactions.insert(transaction.id, transaction.clone());
        }
        Ok(())
    }

    async fn update_document(&mut self, document: &AccountingDocument) -> CoreResult<()> {
        let mut inner = self.inner.write().unwrap();
        if !inner.documents.contains_key(&document.id) {
            return Err(CoreError::not_found("document", document.id));
        }
        inner.documents.insert(document.id, document.clone());
        Ok(())
    }

    async fn get_document(&self, document_id: Uuid) -> CoreResult<Option<AccountingDocument>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .documents
            .get(&document_id)
            .cloned())
    }

    async fn list_documents(&self, project_id: Uuid) -> CoreResult<Vec<AccountingDocument>> {
        let inner = self.inner.read().unwrap();
        let mut rows: Vec<AccountingDocument> = inner
            .documents
            .values()
            .filter(|document| document.project_id == project_id)
            .cloned()
            .collect();
        rows.sort_by_key(|document| document.created_at);
        Ok(rows)
    }

    async fn list_document_entries(&self, document_id: Uuid) -> CoreResult<Vec<AccountingEntry>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .entries
            .get(&document_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn count_documents(&self, project_id: Uuid, number_prefix: &str) -> CoreResult<u64> {
        let inner = self.inner.read().unwrap();
        let prefix = format!("{}-", number_prefix);
        Ok(inner
            .documents
            .values()
            .filter(|document| {
                document.project_id == project_id && document.document_number.starts_with(&prefix)
            })
            .count() as u64)
    }

    async fn upsert_snapshot(&mut self, snapshot: &LedgerSnapshot) -> CoreResult<()> {
        self.inner
            .write()
            .unwrap()
            .snapshots
            .insert((snapshot.project_id, snapshot.account_id), snapshot.clone());
        Ok(())
    }

    async fn get_snapshot(
        &self,
        project_id: Uuid,
        account_id: Uuid,
    ) -> CoreResult<Option<LedgerSnapshot>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .snapshots
            .get(&(project_id, account_id))
            .cloned())
    }

    async fn list_snapshots(&self, project_id: Uuid) -> CoreResult<Vec<LedgerSnapshot>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .snapshots
            .values()
            .filter(|snapshot| snapshot.project_id == project_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl FiscalStorage for MemoryStorage {
    async fn insert_fiscal_year(&mut self, fiscal_year: &FiscalYear) -> CoreResult<()> {
        let mut inner = self.inner.write().unwrap();
        let clash = inner.fiscal_years.values().any(|existing| {
            existing.project_id == fiscal_year.project_id
                && ((fiscal_year.is_active && existing.is_active)
                    || existing.year == fiscal_year.year)
        });
        if clash {
            return Err(CoreError::Conflict {
                code: fiscal_year.year.to_string(),
                scope: "fiscal year".to_string(),
            });
        }
        inner.fiscal_years.insert(fiscal_year.id, fiscal_year.clone());
        Ok(())
    }

    async fn update_fiscal_year(&mut self, fiscal_year: &FiscalYear) -> CoreResult<()> {
        let mut inner = self.inner.write().unwrap();
        if !inner.fiscal_years.contains_key(&fiscal_year.id) {
            return Err(CoreError::not_found("fiscal year", fiscal_year.id));
        }
        inner.fiscal_years.insert(fiscal_year.id, fiscal_year.clone());
        Ok(())
    }

    async fn get_fiscal_year(&self, fiscal_year_id: Uuid) -> CoreResult<Option<FiscalYear>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .fiscal_years
            .get(&fiscal_year_id)
            .cloned())
    }

    async fn active_fiscal_year(&self, project_id: Uuid) -> CoreResult<Option<FiscalYear>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .fiscal_years
            .values()
            .find(|year| year.project_id == project_id && year.is_active)
            .cloned())
    }

    async fn fiscal_year_covering(
        &self,
        project_id: Uuid,
        date: NaiveDate,
    ) -> CoreResult<Option<FiscalYear>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .fiscal_years
            .values()
            .find(|year| year.project_id == project_id && year.contains(date))
            .cloned())
    }

    async fn list_fiscal_years(&self, project_id: Uuid) -> CoreResult<Vec<FiscalYear>> {
        let inner = self.inner.read().unwrap();
        let mut rows: Vec<FiscalYear> = inner
            .fiscal_years
            .values()
            .filter(|year| year.project_id == project_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.year.cmp(&a.year));
        Ok(rows)
    }

    async fn commit_closing(&mut self, batch: &ClosingBatch) -> CoreResult<()> {
        let mut inner = self.inner.write().unwrap();
        if !inner.fiscal_years.contains_key(&batch.fiscal_year.id) {
            return Err(CoreError::not_found("fiscal year", batch.fiscal_year.id));
        }
        let clash = inner.documents.values().any(|existing| {
            existing.project_id == batch.document.project_id
                && existing.document_number == batch.document.document_number
        });
        if clash {
            return Err(CoreError::Conflict {
                code: batch.document.document_number.clone(),
                scope: "document".to_string(),
            });
        }

        inner
            .fiscal_years
            .insert(batch.fiscal_year.id, batch.fiscal_year.clone());
        inner
            .documents
            .insert(batch.document.id, batch.document.clone());
        inner.entries.insert(batch.document.id, batch.entries.clone());
        for transaction in &batch.transactions {
            inner.transactions.insert(transaction.id, transaction.clone());
        }
        for snapshot in &batch.snapshots {
            inner
                .snapshots
                .insert((snapshot.project_id, snapshot.account_id), snapshot.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AccountType;

    #[tokio::test]
    async fn active_account_codes_are_unique_per_project() {
        let mut storage = MemoryStorage::new();
        let project = Uuid::new_v4();

        let first = Account::new_direct(
            project,
            "3000".to_string(),
            "سرمایه".to_string(),
            AccountType::Equity,
        );
        storage.insert_account(&first).await.unwrap();

        let duplicate = Account::new_direct(
            project,
            "3000".to_string(),
            "سرمایه دوم".to_string(),
            AccountType::Equity,
        );
        let err = storage.insert_account(&duplicate).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict { .. }));

        // same code in another project is fine
        let other = Account::new_direct(
            Uuid::new_v4(),
            "3000".to_string(),
            "سرمایه".to_string(),
            AccountType::Equity,
        );
        storage.insert_account(&other).await.unwrap();
    }

    #[tokio::test]
    async fn deactivated_codes_become_reusable() {
        let mut storage = MemoryStorage::new();
        let project = Uuid::new_v4();

        let mut first = Account::new_direct(
            project,
            "4000".to_string(),
            "درآمد".to_string(),
            AccountType::Income,
        );
        storage.insert_account(&first).await.unwrap();

        first.is_active = false;
        storage.update_account(&first).await.unwrap();

        let fresh = Account::new_direct(
            project,
            "4000".to_string(),
            "درآمد جدید".to_string(),
            AccountType::Income,
        );
        storage.insert_account(&fresh).await.unwrap();
    }

    #[tokio::test]
    async fn document_numbers_are_unique_per_project() {
        let mut storage = MemoryStorage::new();
        let project = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let document = |id: Uuid| AccountingDocument {
            id,
            project_id: project,
            document_number: "DOC-0001".to_string(),
            document_date: date,
            total_debit: 0.into(),
            total_credit: 0.into(),
            status: crate::types::DocumentStatus::Permanent,
            description: "سند".to_string(),
            created_at: chrono::Utc::now().naive_utc(),
        };

        storage
            .insert_document(&document(Uuid::new_v4()), &[], &[])
            .await
            .unwrap();
        let err = storage
            .insert_document(&document(Uuid::new_v4()), &[], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn only_one_active_fiscal_year_per_project() {
        let mut storage = MemoryStorage::new();
        let project = Uuid::new_v4();

        let year = FiscalYear::open(
            project,
            1403,
            NaiveDate::from_ymd_opt(2024, 3, 20).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 19).unwrap(),
        );
        storage.insert_fiscal_year(&year).await.unwrap();

        let second = FiscalYear::open(
            project,
            1404,
            NaiveDate::from_ymd_opt(2025, 3, 21).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 20).unwrap(),
        );
        let err = storage.insert_fiscal_year(&second).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn clones_share_the_same_store() {
        let mut storage = MemoryStorage::new();
        let reader = storage.clone();
        let project = Uuid::new_v4();

        let account = Account::new_direct(
            project,
            "1000".to_string(),
            "صندوق".to_string(),
            AccountType::Asset,
        );
        storage.insert_account(&account).await.unwrap();

        let seen = reader.get_account(account.id).await.unwrap();
        assert_eq!(seen.map(|a| a.name), Some("صندوق".to_string()));
    }
}
