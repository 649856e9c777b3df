//! Nature-aware balance computation over posting histories

use bigdecimal::BigDecimal;
use chrono::NaiveDate;

use crate::types::{Account, EntryType, Transaction};

/// Gross debit and credit totals over a set of postings
pub fn sum_postings<'a, I>(postings: I) -> (BigDecimal, BigDecimal)
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut debit = BigDecimal::from(0);
    let mut credit = BigDecimal::from(0);
    for posting in postings {
        match posting.entry_type {
            EntryType::Debit => debit += &posting.amount,
            EntryType::Credit => credit += &posting.amount,
        }
    }
    (debit, credit)
}

/// Signed, nature-aware balance of an account over a set of postings
pub fn signed_total<'a, I>(account: &Account, postings: I) -> BigDecimal
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let (debit, credit) = sum_postings(postings);
    account.signed_balance(&debit, &credit)
}

/// An account's balance split around a reporting period
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceBreakdown {
    /// Signed balance accumulated strictly before the period start
    pub opening: BigDecimal,
    /// Gross debit movement inside the period
    pub period_debit: BigDecimal,
    /// Gross credit movement inside the period
    pub period_credit: BigDecimal,
    /// Signed movement inside the period
    pub current: BigDecimal,
    /// Opening plus current
    pub closing: BigDecimal,
}

impl BalanceBreakdown {
    /// An account with no opening balance and no period movement
    /// contributes nothing to a report
    pub fn is_silent(&self) -> bool {
        let zero = BigDecimal::from(0);
        self.opening == zero && self.period_debit == zero && self.period_credit == zero
    }
}

/// Split an account's postings around a reporting period.
///
/// Everything dated strictly before the period start folds into the
/// opening balance, regardless of when it was recorded; postings dated
/// after the period end are ignored. Without a period, opening is zero
/// and the whole history counts as movement.
pub fn breakdown(
    account: &Account,
    postings: &[Transaction],
    period: Option<(NaiveDate, NaiveDate)>,
) -> BalanceBreakdown {
    let mut opening_debit = BigDecimal::from(0);
    let mut opening_credit = BigDecimal::from(0);
    let mut period_debit = BigDecimal::from(0);
    let mut period_credit = BigDecimal::from(0);

    for posting in postings {
        let (debit_total, credit_total) = match period {
            Some((start, _)) if posting.date < start => (&mut opening_debit, &mut opening_credit),
            Some((_, end)) if posting.date > end => continue,
            _ => (&mut period_debit, &mut period_credit),
        };
        match posting.entry_type {
            EntryType::Debit => *debit_total += &posting.amount,
            EntryType::Credit => *credit_total += &posting.amount,
        }
    }

    let opening = account.signed_balance(&opening_debit, &opening_credit);
    let current = account.signed_balance(&period_debit, &period_credit);
    let closing = &opening + &current;

    BalanceBreakdown {
        opening,
        period_debit,
        period_credit,
        current,
        closing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccountType, JournalType, NewTransaction, Transaction};
    use uuid::Uuid;

    fn posting(
        account: &Account,
        date: NaiveDate,
        amount: i64,
        entry_type: EntryType,
    ) -> Transaction {
        Transaction::from_input(
            NewTransaction {
                project_id: account.project_id,
                account_id: account.id,
                date,
                amount: BigDecimal::from(amount),
                entry_type,
                journal_type: JournalType::Daybook,
                description: "آزمایشی".to_string(),
            },
            None,
        )
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn cash_account() -> Account {
        Account::new_direct(
            Uuid::new_v4(),
            "110101".to_string(),
            "صندوق".to_string(),
            AccountType::Asset,
        )
    }

    #[test]
    fn whole_history_counts_without_a_period() {
        let cash = cash_account();
        let postings = vec![
            posting(&cash, day(2024, 4, 1), 100, EntryType::Debit),
            posting(&cash, day(2024, 5, 1), 30, EntryType::Credit),
        ];

        let b = breakdown(&cash, &postings, None);
        assert_eq!(b.opening, BigDecimal::from(0));
        assert_eq!(b.period_debit, BigDecimal::from(100));
        assert_eq!(b.period_credit, BigDecimal::from(30));
        assert_eq!(b.current, BigDecimal::from(70));
        assert_eq!(b.closing, BigDecimal::from(70));
    }

    #[test]
    fn postings_before_period_start_fold_into_opening() {
        let cash = cash_account();
        let postings = vec![
            posting(&cash, day(2024, 2, 10), 500, EntryType::Debit),
            posting(&cash, day(2024, 4, 5), 200, EntryType::Debit),
            posting(&cash, day(2024, 5, 5), 80, EntryType::Credit),
        ];

        let period = Some((day(2024, 3, 20), day(2025, 3, 20)));
        let b = breakdown(&cash, &postings, period);

        assert_eq!(b.opening, BigDecimal::from(500));
        assert_eq!(b.period_debit, BigDecimal::from(200));
        assert_eq!(b.period_credit, BigDecimal::from(80));
        assert_eq!(b.closing, BigDecimal::from(620));
    }

    #[test]
    fn postings_after_period_end_are_ignored() {
        let cash = cash_account();
        let postings = vec![
            posting(&cash, day(2024, 6, 1), 100, EntryType::Debit),
            posting(&cash, day(2025, 6, 1), 999, EntryType::Debit),
        ];

        let period = Some((day(2024, 3, 20), day(2025, 3, 20)));
        let b = breakdown(&cash, &postings, period);

        assert_eq!(b.period_debit, BigDecimal::from(100));
        assert_eq!(b.closing, BigDecimal::from(100));
    }

    #[test]
    fn credit_nature_flips_the_sign() {
        let project = Uuid::new_v4();
        let income = Account::new_direct(
            project,
            "410101".to_string(),
            "اقساط اعضا".to_string(),
            AccountType::Income,
        );
        let postings = vec![
            posting(&income, day(2024, 6, 1), 1_000_000, EntryType::Credit),
            posting(&income, day(2024, 7, 1), 100_000, EntryType::Debit),
        ];

        let b = breakdown(&income, &postings, None);
        assert_eq!(b.current, BigDecimal::from(900_000));
    }

    #[test]
    fn silent_accounts_are_detected() {
        let cash = cash_account();
        let b = breakdown(&cash, &[], None);
        assert!(b.is_silent());

        let with_movement = breakdown(
            &cash,
            &[posting(&cash, day(2024, 6, 1), 1, EntryType::Debit)],
            None,
        );
        assert!(!with_movement.is_silent());
    }

    #[test]
    fn offsetting_movement_is_not_silent() {
        let cash = cash_account();
        let postings = vec![
            posting(&cash, day(2024, 6, 1), 50, EntryType::Debit),
            posting(&cash, day(2024, 6, 2), 50, EntryType::Credit),
        ];
        let b = breakdown(&cash, &postings, None);
        assert_eq!(b.closing, BigDecimal::from(0));
        assert!(!b.is_silent());
    }
}
