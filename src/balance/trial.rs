//! Trial balance assembly with opening, period, and closing columns

use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::balance::calculator::{breakdown, BalanceBreakdown};
use crate::traits::LedgerStorage;
use crate::types::{totals_match, Account, CoreResult, EntryType, LedgerSnapshot};

/// One account row of a trial balance.
///
/// Signed balances are rendered into debit/credit columns: a positive
/// balance lands in the account's nature column, a negative one lands as
/// its absolute value in the opposite column. Period columns carry gross
/// movement and are never netted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    pub account_id: Uuid,
    pub account_code: String,
    pub account_name: String,
    pub opening_debit: BigDecimal,
    pub opening_credit: BigDecimal,
    pub period_debit: BigDecimal,
    pub period_credit: BigDecimal,
    pub closing_debit: BigDecimal,
    pub closing_credit: BigDecimal,
}

/// Column sums across all rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrialBalanceTotals {
    pub opening_debit: BigDecimal,
    pub opening_credit: BigDecimal,
    pub period_debit: BigDecimal,
    pub period_credit: BigDecimal,
    pub closing_debit: BigDecimal,
    pub closing_credit: BigDecimal,
}

/// A complete trial balance of one project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialBalance {
    pub project_id: Uuid,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub rows: Vec<TrialBalanceRow>,
    pub totals: TrialBalanceTotals,
    /// Closing columns agree within tolerance
    pub is_balanced: bool,
    /// Rows came from cached snapshots instead of posting detail
    pub from_ledger_cache: bool,
}

/// Assembles trial balances from posting detail, falling back to cached
/// ledger snapshots when the project has accounts but no posting detail
/// to fold.
pub struct TrialBalanceBuilder<'a, S> {
    storage: &'a S,
}

impl<'a, S: LedgerStorage> TrialBalanceBuilder<'a, S> {
    pub fn new(storage: &'a S) -> Self {
        Self { storage }
    }

    /// Build the trial balance, optionally split around a reporting
    /// period. Silent accounts are omitted.
    pub async fn build(
        &self,
        project_id: Uuid,
        period: Option<(NaiveDate, NaiveDate)>,
    ) -> CoreResult<TrialBalance> {
        let accounts = self.storage.list_accounts(project_id).await?;

        let mut rows = Vec::new();
        let mut saw_postings = false;
        for account in &accounts {
            let postings = self.storage.list_account_transactions(account.id).await?;
            if !postings.is_empty() {
                saw_postings = true;
            }

            let split = breakdown(account, &postings, period);
            if split.is_silent() {
                continue;
            }
            rows.push(row_from_breakdown(account, &split));
        }

        let mut from_ledger_cache = false;
        if !saw_postings {
            let snapshot_rows = self.rows_from_snapshots(project_id, &accounts).await?;
            if !snapshot_rows.is_empty() {
                rows = snapshot_rows;
                from_ledger_cache = true;
            }
        }

        let totals = sum_rows(&rows);
        let is_balanced = totals_match(&totals.closing_debit, &totals.closing_credit);

        Ok(TrialBalance {
            project_id,
            period_start: period.map(|p| p.0),
            period_end: period.map(|p| p.1),
            rows,
            totals,
            is_balanced,
            from_ledger_cache,
        })
    }

    /// Closing-only rows derived from cached snapshots; opening and
    /// period columns stay zero because the detail behind them is gone
    async fn rows_from_snapshots(
        &self,
        project_id: Uuid,
        accounts: &[Account],
    ) -> CoreResult<Vec<TrialBalanceRow>> {
        let snapshots = self.storage.list_snapshots(project_id).await?;
        let by_account: HashMap<Uuid, &LedgerSnapshot> =
            snapshots.iter().map(|s| (s.account_id, s)).collect();

        let zero = BigDecimal::from(0);
        let mut rows = Vec::new();
        for account in accounts {
            let snapshot = match by_account.get(&account.id) {
                Some(snapshot) => snapshot,
                None => continue,
            };
            if snapshot.balance == zero {
                continue;
            }

            let (closing_debit, closing_credit) =
                signed_to_columns(account.nature(), &snapshot.balance);
            rows.push(TrialBalanceRow {
                account_id: account.id,
                account_code: account.code.clone(),
                account_name: account.name.clone(),
                opening_debit: zero.clone(),
                opening_credit: zero.clone(),
                period_debit: zero.clone(),
                period_credit: zero.clone(),
                closing_debit,
                closing_credit,
            });
        }
        Ok(rows)
    }
}

fn row_from_breakdown(account: &Account, split: &BalanceBreakdown) -> TrialBalanceRow {
    let nature = account.nature();
    let (opening_debit, opening_credit) = signed_to_columns(nature.clone(), &split.opening);
    let (closing_debit, closing_credit) = signed_to_columns(nature, &split.closing);

    TrialBalanceRow {
        account_id: account.id,
        account_code: account.code.clone(),
        account_name: account.name.clone(),
        opening_debit,
        opening_credit,
        period_debit: split.period_debit.clone(),
        period_credit: split.period_credit.clone(),
        closing_debit,
        closing_credit,
    }
}

fn sum_rows(rows: &[TrialBalanceRow]) -> TrialBalanceTotals {
    let mut totals = TrialBalanceTotals::default();
    for row in rows {
        totals.opening_debit += &row.opening_debit;
        totals.opening_credit += &row.opening_credit;
        totals.period_debit += &row.period_debit;
        totals.period_credit += &row.period_credit;
        totals.closing_debit += &row.closing_debit;
        totals.closing_credit += &row.closing_credit;
    }
    totals
}

/// Render a signed balance into (debit, credit) columns for its nature
fn signed_to_columns(nature: EntryType, value: &BigDecimal) -> (BigDecimal, BigDecimal) {
    let zero = BigDecimal::from(0);
    let (column, magnitude) = if *value >= zero {
        (nature, value.clone())
    } else {
        (nature.opposite(), value.abs())
    };
    match column {
        EntryType::Debit => (magnitude, zero),
        EntryType::Credit => (zero, magnitude),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_balance_lands_in_nature_column() {
        let (debit, credit) = signed_to_columns(EntryType::Debit, &BigDecimal::from(70));
        assert_eq!(debit, BigDecimal::from(70));
        assert_eq!(credit, BigDecimal::from(0));

        let (debit, credit) = signed_to_columns(EntryType::Credit, &BigDecimal::from(70));
        assert_eq!(debit, BigDecimal::from(0));
        assert_eq!(credit, BigDecimal::from(70));
    }

    #[test]
    fn negative_balance_flips_to_opposite_column() {
        let (debit, credit) = signed_to_columns(EntryType::Debit, &BigDecimal::from(-20));
        assert_eq!(debit, BigDecimal::from(0));
        assert_eq!(credit, BigDecimal::from(20));

        let (debit, credit) = signed_to_columns(EntryType::Credit, &BigDecimal::from(-20));
        assert_eq!(debit, BigDecimal::from(20));
        assert_eq!(credit, BigDecimal::from(0));
    }

    #[test]
    fn totals_accumulate_all_columns() {
        let row = |debit: i64, credit: i64| TrialBalanceRow {
            account_id: Uuid::new_v4(),
            account_code: "110101".to_string(),
            account_name: "صندوق".to_string(),
            opening_debit: BigDecimal::from(0),
            opening_credit: BigDecimal::from(0),
            period_debit: BigDecimal::from(debit),
            period_credit: BigDecimal::from(credit),
            closing_debit: BigDecimal::from(debit),
            closing_credit: BigDecimal::from(credit),
        };

        let totals = sum_rows(&[row(100, 0), row(0, 100)]);
        assert_eq!(totals.period_debit, BigDecimal::from(100));
        assert_eq!(totals.period_credit, BigDecimal::from(100));
        assert_eq!(totals.closing_debit, totals.closing_credit);
    }
}
