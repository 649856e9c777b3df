//! Printable ledger exports.
//!
//! Renders one classical book as numbered tabular rows with the account
//! identity and document number resolved inline. Formatting only; every
//! figure comes straight from the posting store.

use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::traits::LedgerStorage;
use crate::types::{CoreError, CoreResult, EntryType, JournalType, Transaction};

/// One printable row of a ledger export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerExportRow {
    /// 1-based row number in the rendered table
    pub row: u64,
    pub date: NaiveDate,
    /// Owning document number, when the posting came from a document
    pub document_number: Option<String>,
    pub account_code: String,
    pub account_name: String,
    pub description: String,
    pub debit: BigDecimal,
    pub credit: BigDecimal,
}

/// Renders ledger books as tabular rows
pub struct LedgerExporter<'a, S> {
    storage: &'a S,
}

impl<'a, S: LedgerStorage> LedgerExporter<'a, S> {
    pub fn new(storage: &'a S) -> Self {
        Self { storage }
    }

    /// Export one book of a project in chronological order, optionally
    /// limited to an inclusive date range
    pub async fn export(
        &self,
        project_id: Uuid,
        journal_type: JournalType,
        date_range: Option<(NaiveDate, NaiveDate)>,
    ) -> CoreResult<Vec<LedgerExportRow>> {
        let mut postings: Vec<Transaction> = self
            .storage
            .list_transactions(project_id)
            .await?
            .into_iter()
            .filter(|posting| posting.journal_type == journal_type)
            .filter(|posting| match date_range {
                Some((start, end)) => start <= posting.date && posting.date <= end,
                None => true,
            })
            .collect();
        postings.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });

        let mut account_names: HashMap<Uuid, (String, String)> = HashMap::new();
        let mut document_numbers: HashMap<Uuid, String> = HashMap::new();
        let mut rows = Vec::with_capacity(postings.len());

        for posting in &postings {
            if !account_names.contains_key(&posting.account_id) {
                let account = self
                    .storage
                    .get_account(posting.account_id)
                    .await?
                    .ok_or_else(|| CoreError::not_found("account", posting.account_id))?;
                account_names.insert(posting.account_id, (account.code, account.name));
            }
            let (account_code, account_name) = account_names[&posting.account_id].clone();

            let document_number = match posting.document_id {
                Some(document_id) => {
                    if !document_numbers.contains_key(&document_id) {
                        let document = self
                            .storage
                            .get_document(document_id)
                            .await?
                            .ok_or_else(|| CoreError::not_found("document", document_id))?;
                        document_numbers.insert(document_id, document.document_number);
                    }
                    Some(document_numbers[&document_id].clone())
                }
                None => None,
            };

            let (debit, credit) = match posting.entry_type {
                EntryType::Debit => (posting.amount.clone(), BigDecimal::from(0)),
                EntryType::Credit => (BigDecimal::from(0), posting.amount.clone()),
            };

            rows.push(LedgerExportRow {
                row: rows.len() as u64 + 1,
                date: posting.date,
                document_number,
                account_code,
                account_name,
                description: posting.description.clone(),
                debit,
                credit,
            });
        }

        Ok(rows)
    }
}
