//! Balance sheet presentation.
//!
//! Buckets nature-signed closing balances into current assets, non-current
//! assets, liabilities, and equity. Temporary accounts never appear here;
//! their period result enters equity only through the year-end closing.

use std::collections::HashMap;

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::balance::trial::TrialBalanceBuilder;
use crate::traits::LedgerStorage;
use crate::types::{totals_match, Account, AccountType, CoreResult, EntryType};

/// Name fragments marking an asset account as non-current. Checked before
/// the current markers since "غیر جاری" contains "جاری".
const NON_CURRENT_NAME_MARKERS: [&str; 4] = ["غیر جاری", "ساختمان", "زمین", "تجهیزات"];

/// Name fragments marking an asset account as current
const CURRENT_NAME_MARKERS: [&str; 3] = ["جاری", "صندوق", "بانک"];

/// Asset sub-bucket on the balance sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetBucket {
    Current,
    NonCurrent,
}

/// Bucket an asset account by its leading code digit and name markers; a
/// non-current marker outranks the digit. Unrecognized accounts default
/// to current.
pub fn asset_bucket(code: &str, name: &str) -> AssetBucket {
    if code.starts_with('2')
        || NON_CURRENT_NAME_MARKERS
            .iter()
            .any(|marker| name.contains(marker))
    {
        return AssetBucket::NonCurrent;
    }
    if code.starts_with('1')
        || CURRENT_NAME_MARKERS
            .iter()
            .any(|marker| name.contains(marker))
    {
        return AssetBucket::Current;
    }
    AssetBucket::Current
}

/// One account line of a balance sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheetRow {
    pub account_id: Uuid,
    pub account_code: String,
    pub account_name: String,
    /// Nature-signed closing balance; positive in the normal case
    pub balance: BigDecimal,
}

/// The asset side, split into current and non-current
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetSection {
    pub current: Vec<BalanceSheetRow>,
    pub non_current: Vec<BalanceSheetRow>,
}

/// A complete balance sheet of one project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub project_id: Uuid,
    pub assets: AssetSection,
    pub liabilities: Vec<BalanceSheetRow>,
    pub equity: Vec<BalanceSheetRow>,
    pub total_assets: BigDecimal,
    pub total_liabilities: BigDecimal,
    pub total_equity: BigDecimal,
    /// Assets equal liabilities plus equity within tolerance. Stays false
    /// while unclosed income or expense balances exist.
    pub is_balanced: bool,
}

/// Assembles balance sheets from the same closing balances the trial
/// balance reports
pub struct BalanceSheetBuilder<'a, S> {
    storage: &'a S,
}

impl<'a, S: LedgerStorage> BalanceSheetBuilder<'a, S> {
    pub fn new(storage: &'a S) -> Self {
        Self { storage }
    }

    /// Build the balance sheet over the project's full posting history.
    /// Zero-balance accounts are excluded.
    pub async fn build(&self, project_id: Uuid) -> CoreResult<BalanceSheet> {
        let trial = TrialBalanceBuilder::new(self.storage)
            .build(project_id, None)
            .await?;
        let accounts = self.storage.list_accounts(project_id).await?;
        let by_id: HashMap<Uuid, &Account> =
            accounts.iter().map(|account| (account.id, account)).collect();

        let zero = BigDecimal::from(0);
        let mut assets = AssetSection::default();
        let mut liabilities = Vec::new();
        let mut equity = Vec::new();

        for row in &trial.rows {
            let account = match by_id.get(&row.account_id) {
                Some(account) => account,
                None => continue,
            };
            let balance = match account.nature() {
                EntryType::Debit => &row.closing_debit - &row.closing_credit,
                EntryType::Credit => &row.closing_credit - &row.closing_debit,
            };
            if balance == zero {
                continue;
            }

            let sheet_row = BalanceSheetRow {
                account_id: row.account_id,
                account_code: row.account_code.clone(),
                account_name: row.account_name.clone(),
                balance,
            };
            match account.account_type {
                AccountType::Asset => match asset_bucket(&row.account_code, &row.account_name) {
                    AssetBucket::Current => assets.current.push(sheet_row),
                    AssetBucket::NonCurrent => assets.non_current.push(sheet_row),
                },
                AccountType::Liability => liabilities.push(sheet_row),
                AccountType::Equity => equity.push(sheet_row),
                AccountType::Income | AccountType::Expense => continue,
            }
        }

        assets.current.sort_by(|a, b| a.account_code.cmp(&b.account_code));
        assets
            .non_current
            .sort_by(|a, b| a.account_code.cmp(&b.account_code));
        liabilities.sort_by(|a, b| a.account_code.cmp(&b.account_code));
        equity.sort_by(|a, b| a.account_code.cmp(&b.account_code));

        let total_assets: BigDecimal = assets
            .current
            .iter()
            .chain(&assets.non_current)
            .map(|row| &row.balance)
            .sum();
        let total_liabilities: BigDecimal = liabilities.iter().map(|row| &row.balance).sum();
        let total_equity: BigDecimal = equity.iter().map(|row| &row.balance).sum();
        let is_balanced = totals_match(&total_assets, &(&total_liabilities + &total_equity));

        Ok(BalanceSheet {
            project_id,
            assets,
            liabilities,
            equity,
            total_assets,
            total_liabilities,
            total_equity,
            is_balanced,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_one_assets_are_current() {
        assert_eq!(asset_bucket("110101", "صندوق"), AssetBucket::Current);
        assert_eq!(asset_bucket("110201", "بانک ملی"), AssetBucket::Current);
    }

    #[test]
    fn group_two_assets_are_non_current() {
        assert_eq!(asset_bucket("210101", "ماشین آلات"), AssetBucket::NonCurrent);
    }

    #[test]
    fn fixed_asset_names_override_the_group_digit() {
        assert_eq!(asset_bucket("120101", "ساختمان"), AssetBucket::NonCurrent);
        assert_eq!(asset_bucket("120201", "زمین"), AssetBucket::NonCurrent);
    }

    #[test]
    fn non_current_marker_wins_over_its_current_substring() {
        assert_eq!(
            asset_bucket("900101", "دارایی‌های غیر جاری"),
            AssetBucket::NonCurrent
        );
        assert_eq!(
            asset_bucket("900102", "دارایی‌های جاری"),
            AssetBucket::Current
        );
    }

    #[test]
    fn unrecognized_assets_default_to_current() {
        assert_eq!(asset_bucket("900103", "سایر"), AssetBucket::Current);
    }
}
