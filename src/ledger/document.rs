//! Accounting documents: numbering, drafting, and balance checking

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::types::{totals_match, CoreError, CoreResult, EntryType};
use crate::utils::validation::{validate_description, validate_positive_amount};

/// Number prefix of ordinary documents
pub const GENERAL_DOCUMENT_PREFIX: &str = "DOC";

/// Number prefix of fiscal-year closing documents
pub const CLOSING_DOCUMENT_PREFIX: &str = "CL";

/// Render a sequential document number, zero-padded to four digits
/// ("DOC-0001", "CL-0001")
pub fn format_document_number(prefix: &str, sequence: u64) -> String {
    format!("{}-{:04}", prefix, sequence)
}

/// One line of a draft document
#[derive(Debug, Clone, PartialEq)]
pub struct DraftLine {
    pub account_id: Uuid,
    pub entry_type: EntryType,
    pub amount: BigDecimal,
    pub description: Option<String>,
}

/// A validated document draft: at least two lines, positive amounts,
/// debits equal to credits within tolerance.
///
/// Drafts carry no number or status; those are assigned when the draft is
/// posted.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftDocument {
    pub project_id: Uuid,
    pub document_date: NaiveDate,
    pub description: String,
    pub lines: Vec<DraftLine>,
    pub total_debit: BigDecimal,
    pub total_credit: BigDecimal,
}

/// Builder for assembling balanced document drafts
#[derive(Debug)]
pub struct DocumentBuilder {
    project_id: Uuid,
    document_date: NaiveDate,
    description: String,
    lines: Vec<DraftLine>,
}

impl DocumentBuilder {
    /// Create a new document builder
    pub fn new(project_id: Uuid, document_date: NaiveDate, description: impl Into<String>) -> Self {
        Self {
            project_id,
            document_date,
            description: description.into(),
            lines: Vec::new(),
        }
    }

    /// Add a debit line
    pub fn debit(mut self, account_id: Uuid, amount: BigDecimal, description: Option<String>) -> Self {
        self.lines.push(DraftLine {
            account_id,
            entry_type: EntryType::Debit,
            amount,
            description,
        });
        self
    }

    /// Add a credit line
    pub fn credit(
        mut self,
        account_id: Uuid,
        amount: BigDecimal,
        description: Option<String>,
    ) -> Self {
        self.lines.push(DraftLine {
            account_id,
            entry_type: EntryType::Credit,
            amount,
            description,
        });
        self
    }

    /// Add a custom line
    pub fn line(mut self, line: DraftLine) -> Self {
        self.lines.push(line);
        self
    }

    /// Validate and finish the draft
    pub fn build(self) -> CoreResult<DraftDocument> {
        validate_description(&self.description)?;

        if self.lines.len() < 2 {
            return Err(CoreError::Validation(
                "Document must have at least two lines for double-entry bookkeeping".to_string(),
            ));
        }

        for line in &self.lines {
            validate_positive_amount(&line.amount)?;
        }

        let total_debit: BigDecimal = self
            .lines
            .iter()
            .filter(|l| l.entry_type == EntryType::Debit)
            .map(|l| &l.amount)
            .sum();
        let total_credit: BigDecimal = self
            .lines
            .iter()
            .filter(|l| l.entry_type == EntryType::Credit)
            .map(|l| &l.amount)
            .sum();

        if !totals_match(&total_debit, &total_credit) {
            return Err(CoreError::Unbalanced {
                debit: total_debit,
                credit: total_credit,
            });
        }

        Ok(DraftDocument {
            project_id: self.project_id,
            document_date: self.document_date,
            description: self.description,
            lines: self.lines,
            total_debit,
            total_credit,
        })
    }
}

/// Common document patterns of a construction project's books
pub mod patterns {
    use super::*;

    /// A member installment received in cash: debit the cash account,
    /// credit the installment income account
    pub fn member_installment(
        project_id: Uuid,
        date: NaiveDate,
        cash_account_id: Uuid,
        income_account_id: Uuid,
        amount: BigDecimal,
        member_name: &str,
    ) -> CoreResult<DraftDocument> {
        DocumentBuilder::new(project_id, date, format!("دریافت قسط {}", member_name))
            .debit(cash_account_id, amount.clone(), None)
            .credit(income_account_id, amount, None)
            .build()
    }

    /// A construction expense paid in cash: debit the expense account,
    /// credit the cash account
    pub fn construction_expense(
        project_id: Uuid,
        date: NaiveDate,
        expense_account_id: Uuid,
        cash_account_id: Uuid,
        amount: BigDecimal,
        description: impl Into<String>,
    ) -> CoreResult<DraftDocument> {
        DocumentBuilder::new(project_id, date, description)
            .debit(expense_account_id, amount.clone(), None)
            .credit(cash_account_id, amount, None)
            .build()
    }

    /// A fixed asset bought on credit: debit the asset account, credit
    /// the contractor payable account
    pub fn asset_on_credit(
        project_id: Uuid,
        date: NaiveDate,
        asset_account_id: Uuid,
        payable_account_id: Uuid,
        amount: BigDecimal,
        description: impl Into<String>,
    ) -> CoreResult<DraftDocument> {
        DocumentBuilder::new(project_id, date, description)
            .debit(asset_account_id, amount.clone(), None)
            .credit(payable_account_id, amount, None)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn numbers_are_zero_padded() {
        assert_eq!(format_document_number(GENERAL_DOCUMENT_PREFIX, 1), "DOC-0001");
        assert_eq!(format_document_number(CLOSING_DOCUMENT_PREFIX, 12), "CL-0012");
        assert_eq!(format_document_number(GENERAL_DOCUMENT_PREFIX, 10000), "DOC-10000");
    }

    #[test]
    fn balanced_draft_builds_with_totals() {
        let cash = Uuid::new_v4();
        let income = Uuid::new_v4();

        let draft = DocumentBuilder::new(Uuid::new_v4(), date(), "دریافت قسط")
            .debit(cash, BigDecimal::from(500_000), None)
            .credit(income, BigDecimal::from(500_000), None)
            .build()
            .unwrap();

        assert_eq!(draft.total_debit, BigDecimal::from(500_000));
        assert_eq!(draft.total_credit, BigDecimal::from(500_000));
        assert_eq!(draft.lines.len(), 2);
    }

    #[test]
    fn unbalanced_draft_reports_both_totals() {
        let result = DocumentBuilder::new(Uuid::new_v4(), date(), "سند نامتوازن")
            .debit(Uuid::new_v4(), BigDecimal::from(500_000), None)
            .credit(Uuid::new_v4(), BigDecimal::from(450_000), None)
            .build();

        match result {
            Err(CoreError::Unbalanced { debit, credit }) => {
                assert_eq!(debit, BigDecimal::from(500_000));
                assert_eq!(credit, BigDecimal::from(450_000));
            }
            other => panic!("expected Unbalanced, got {:?}", other),
        }
    }

    #[test]
    fn single_line_draft_is_rejected() {
        let result = DocumentBuilder::new(Uuid::new_v4(), date(), "تک سطر")
            .debit(Uuid::new_v4(), BigDecimal::from(100), None)
            .build();
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        let result = DocumentBuilder::new(Uuid::new_v4(), date(), "مبلغ صفر")
            .debit(Uuid::new_v4(), BigDecimal::from(0), None)
            .credit(Uuid::new_v4(), BigDecimal::from(0), None)
            .build();
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn rounding_residue_within_tolerance_is_accepted() {
        let draft = DocumentBuilder::new(Uuid::new_v4(), date(), "خطای گرد کردن")
            .debit(Uuid::new_v4(), BigDecimal::new(100001.into(), 2), None)
            .credit(Uuid::new_v4(), BigDecimal::new(100000.into(), 2), None)
            .build();
        assert!(draft.is_ok());
    }

    #[test]
    fn installment_pattern_is_balanced() {
        let draft = patterns::member_installment(
            Uuid::new_v4(),
            date(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            BigDecimal::from(750_000),
            "عضو ۱۲",
        )
        .unwrap();
        assert_eq!(draft.total_debit, draft.total_credit);
        assert!(draft.description.contains("عضو ۱۲"));
    }
}
