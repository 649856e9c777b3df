//! Integration tests for daftar-core

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use daftar_core::utils::MemoryStorage;
use daftar_core::{
    patterns, Account, AccountType, AccountingCore, Caller, ClosingAccount, ClosingDisposition,
    ClosingRequest, CoreError, DocumentBuilder, DocumentStatus, EntryType, JournalType,
    LedgerSnapshot, LedgerStorage, NewTransaction, TransactionPatch, TrialBalance,
    TrialBalanceBuilder, CARRY_FORWARD_DESCRIPTION, CLOSE_DESCRIPTION,
    CLOSING_DOCUMENT_DESCRIPTION, INITIAL_CAPITAL_DESCRIPTION,
};
use uuid::Uuid;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn books() -> (AccountingCore<MemoryStorage>, Caller, Uuid) {
    let core = AccountingCore::new(MemoryStorage::new());
    let caller = Caller::privileged(Uuid::new_v4());
    let project = Uuid::new_v4();
    (core, caller, project)
}

/// Seeded chart, cash and income accounts, fiscal year 1403 open
async fn construction_books() -> (AccountingCore<MemoryStorage>, Caller, Uuid, Account, Account) {
    let (mut core, caller, project) = books();
    let chart = core.seed_standard_chart(&caller, project).await.unwrap();
    let index = core.chart_index(project).await.unwrap();

    let cash_code = index
        .full_code_of_detail(chart.details["cash"].id)
        .unwrap()
        .to_string();
    let income_code = index
        .full_code_of_detail(chart.details["member_installments"].id)
        .unwrap()
        .to_string();

    let cash = core
        .create_linked_account(&caller, project, &cash_code, "صندوق", AccountType::Asset)
        .await
        .unwrap();
    let income = core
        .create_linked_account(&caller, project, &income_code, "اقساط اعضا", AccountType::Income)
        .await
        .unwrap();

    core.open_fiscal_year(&caller, project, 1403, day(2024, 3, 20), day(2025, 3, 19))
        .await
        .unwrap();

    (core, caller, project, cash, income)
}

#[tokio::test]
async fn test_complete_bookkeeping_workflow() {
    let (mut core, caller, project, cash, income) = construction_books().await;

    let bank = core
        .create_linked_account(&caller, project, "110102", "بانک", AccountType::Asset)
        .await
        .unwrap();
    let materials = core
        .create_linked_account(&caller, project, "510101", "مصالح", AccountType::Expense)
        .await
        .unwrap();

    // A year of documents
    let first = patterns::member_installment(
        project,
        day(2024, 4, 1),
        cash.id,
        income.id,
        BigDecimal::from(500_000),
        "علی رضایی",
    )
    .unwrap();
    let document = core.post_document(&caller, first).await.unwrap();
    assert_eq!(document.document_number, "DOC-0001");
    assert_eq!(document.status, DocumentStatus::Permanent);

    let split = DocumentBuilder::new(project, day(2024, 5, 10), "دریافت قسط مریم احمدی")
        .debit(cash.id, BigDecimal::from(200_000), None)
        .debit(bank.id, BigDecimal::from(100_000), None)
        .credit(income.id, BigDecimal::from(300_000), None)
        .build()
        .unwrap();
    let document = core.post_document(&caller, split).await.unwrap();
    assert_eq!(document.document_number, "DOC-0002");

    let purchase = patterns::construction_expense(
        project,
        day(2024, 6, 2),
        materials.id,
        cash.id,
        BigDecimal::from(200_000),
        "خرید مصالح",
    )
    .unwrap();
    let document = core.post_document(&caller, purchase).await.unwrap();
    assert_eq!(document.document_number, "DOC-0003");

    // Balances are nature-aware
    assert_eq!(
        core.account_balance(cash.id).await.unwrap(),
        BigDecimal::from(500_000)
    );
    assert_eq!(
        core.account_balance(bank.id).await.unwrap(),
        BigDecimal::from(100_000)
    );
    assert_eq!(
        core.account_balance(income.id).await.unwrap(),
        BigDecimal::from(800_000)
    );

    // Trial balance agrees on both sides
    let trial = core.trial_balance(project, None).await.unwrap();
    assert!(trial.is_balanced);
    assert!(!trial.from_ledger_cache);
    assert_eq!(trial.totals.closing_debit, BigDecimal::from(800_000));
    assert_eq!(trial.totals.closing_credit, BigDecimal::from(800_000));

    // The sheet splits assets but stays off while income is unclosed
    let sheet = core.balance_sheet(project).await.unwrap();
    assert_eq!(sheet.assets.current.len(), 2);
    assert!(sheet.assets.non_current.is_empty());
    assert_eq!(sheet.total_assets, BigDecimal::from(600_000));
    assert!(!sheet.is_balanced);

    let report = core.verify_books(project).await.unwrap();
    assert!(!report.is_valid);
    assert_eq!(report.trial_closing_debit, report.trial_closing_credit);

    // Every posting shows up in the daybook export
    let rows = core
        .export_ledger(project, JournalType::Daybook, None)
        .await
        .unwrap();
    assert_eq!(rows.len(), 7);
    assert_eq!(rows[0].row, 1);
    assert_eq!(rows[0].document_number.as_deref(), Some("DOC-0001"));
}

#[tokio::test]
async fn test_full_code_resolution_through_the_chart() {
    let (mut core, caller, project) = books();
    let chart = core.seed_standard_chart(&caller, project).await.unwrap();
    let index = core.chart_index(project).await.unwrap();

    assert_eq!(index.full_code_of_detail(chart.details["cash"].id), Some("110101"));
    assert_eq!(index.full_code_of_detail(chart.details["bank"].id), Some("110102"));
    assert_eq!(index.full_code_of_detail(chart.details["land"].id), Some("120101"));
    assert_eq!(
        index.full_code_of_detail(chart.details["building"].id),
        Some("120102")
    );
    assert_eq!(
        index.full_code_of_detail(chart.details["contractors_payable"].id),
        Some("210101")
    );
    assert_eq!(
        index.full_code_of_detail(chart.details["wages"].id),
        Some("510102")
    );

    assert_eq!(index.detail_by_full_code("110102").unwrap().name, "بانک");
    assert!(index.detail_by_full_code("999999").is_none());

    let bank_id = chart.details["bank"].id;
    assert_eq!(index.class_of_detail(bank_id).unwrap().name, "دارایی‌های جاری");
    assert_eq!(index.group_of_detail(bank_id).unwrap().code, "1");
    assert_eq!(index.detail_count(), 9);

    // Linked accounts must address an existing detail
    let err = core
        .create_linked_account(&caller, project, "12345", "بد", AccountType::Asset)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    let err = core
        .create_linked_account(&caller, project, "1201", "بد", AccountType::Asset)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    let err = core
        .create_linked_account(&caller, project, "999999", "بد", AccountType::Asset)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound { entity: "detail", .. }));
}

#[tokio::test]
async fn test_document_balance_validation() {
    let (_, _, project) = books();
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();

    // Balanced within the 0.01 tolerance
    let draft = DocumentBuilder::new(project, day(2024, 4, 1), "سند متعادل")
        .debit(a, "100.00".parse::<BigDecimal>().unwrap(), None)
        .credit(b, "100.005".parse::<BigDecimal>().unwrap(), None)
        .build()
        .unwrap();
    assert_eq!(draft.lines.len(), 2);

    // Beyond tolerance
    let err = DocumentBuilder::new(project, day(2024, 4, 1), "سند نامتعادل")
        .debit(a, BigDecimal::from(1000), None)
        .credit(b, BigDecimal::from(500), None)
        .build()
        .unwrap_err();
    assert!(matches!(err, CoreError::Unbalanced { .. }));

    // A single line is not double entry
    let err = DocumentBuilder::new(project, day(2024, 4, 1), "یک سطر")
        .debit(a, BigDecimal::from(1000), None)
        .build()
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    // Amounts must be positive
    let err = DocumentBuilder::new(project, day(2024, 4, 1), "مبلغ صفر")
        .debit(a, BigDecimal::from(0), None)
        .credit(b, BigDecimal::from(0), None)
        .build()
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}

#[tokio::test]
async fn test_group_code_reuse_revives_the_node() {
    let (mut core, caller, project) = books();

    let original = core
        .create_group(&caller, project, "6", "پروژه‌های جنبی")
        .await
        .unwrap();

    // An active holder blocks the code
    let err = core
        .create_group(&caller, project, "6", "تکراری")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict { .. }));

    core.deactivate_group(&caller, original.id).await.unwrap();

    // Recreating the code revives the same record with the new name
    let revived = core
        .create_group(&caller, project, "6", "امکانات رفاهی")
        .await
        .unwrap();
    assert_eq!(revived.id, original.id);
    assert!(revived.is_active);
    assert_eq!(revived.name, "امکانات رفاهی");

    let groups = core.list_groups(project).await.unwrap();
    assert_eq!(groups.iter().filter(|g| g.code == "6").count(), 1);
}

#[tokio::test]
async fn test_protected_groups_refuse_deactivation() {
    let (mut core, caller, project) = books();
    let chart = core.seed_standard_chart(&caller, project).await.unwrap();

    for code in ["1", "2", "3", "4", "5"] {
        let group = &chart.groups[code];
        assert!(group.is_protected);
        let err = core.deactivate_group(&caller, group.id).await.unwrap_err();
        assert!(matches!(err, CoreError::Protected(_)));
    }
}

#[tokio::test]
async fn test_fiscal_year_closing() {
    let (mut core, caller, project, cash, income) = construction_books().await;

    let received = patterns::member_installment(
        project,
        day(2024, 5, 1),
        cash.id,
        income.id,
        BigDecimal::from(1_000_000),
        "اعضا",
    )
    .unwrap();
    core.post_document(&caller, received).await.unwrap();

    let request = ClosingRequest {
        project_id: project,
        closing_date: day(2025, 3, 19),
        accounts: vec![
            ClosingAccount::new(
                cash.id,
                BigDecimal::from(1_000_000),
                BigDecimal::from(0),
                ClosingDisposition::CarryForward,
            ),
            ClosingAccount::new(
                income.id,
                BigDecimal::from(0),
                BigDecimal::from(1_000_000),
                ClosingDisposition::Close,
            ),
        ],
        initial_capital: None,
    };
    let outcome = core.close_fiscal_year(&caller, request).await.unwrap();

    // The closing document is permanent and balanced
    assert_eq!(outcome.document.document_number, "CL-0001");
    assert_eq!(outcome.document.status, DocumentStatus::Permanent);
    assert_eq!(outcome.document.description, CLOSING_DOCUMENT_DESCRIPTION);
    assert_eq!(outcome.document.total_debit, BigDecimal::from(1_000_000));
    assert_eq!(outcome.document.total_credit, BigDecimal::from(1_000_000));

    // The year flipped to closed and dropped out of the active slot
    assert!(outcome.fiscal_year.is_closed);
    assert!(!outcome.fiscal_year.is_active);
    assert_eq!(outcome.fiscal_year.closing_entry_id, Some(outcome.document.id));
    assert!(core.active_fiscal_year(project).await.unwrap().is_none());
    assert_eq!(
        core.get_fiscal_year(outcome.fiscal_year.id).await.unwrap(),
        Some(outcome.fiscal_year.clone())
    );

    // Settling postings zero both accounts and carry their descriptions
    assert_eq!(
        core.account_balance(income.id).await.unwrap(),
        BigDecimal::from(0)
    );
    assert_eq!(
        core.account_balance(cash.id).await.unwrap(),
        BigDecimal::from(0)
    );

    let income_ledger = core.account_ledger(income.id).await.unwrap();
    assert_eq!(income_ledger.last().unwrap().description, CLOSE_DESCRIPTION);
    let cash_ledger = core.account_ledger(cash.id).await.unwrap();
    assert_eq!(
        cash_ledger.last().unwrap().description,
        CARRY_FORWARD_DESCRIPTION
    );
}

#[tokio::test]
async fn test_closing_with_initial_capital() {
    let (mut core, caller, project, cash, income) = construction_books().await;

    let received = patterns::member_installment(
        project,
        day(2024, 5, 1),
        cash.id,
        income.id,
        BigDecimal::from(1_000_000),
        "اعضا",
    )
    .unwrap();
    core.post_document(&caller, received).await.unwrap();

    let request = ClosingRequest {
        project_id: project,
        closing_date: day(2025, 3, 19),
        accounts: vec![
            ClosingAccount::new(
                cash.id,
                BigDecimal::from(1_000_000),
                BigDecimal::from(0),
                ClosingDisposition::CarryForward,
            ),
            ClosingAccount::new(
                income.id,
                BigDecimal::from(0),
                BigDecimal::from(1_000_000),
                ClosingDisposition::Close,
            ),
        ],
        initial_capital: Some(BigDecimal::from(2_500_000_000i64)),
    };
    let outcome = core.close_fiscal_year(&caller, request).await.unwrap();

    // The capital credit stands outside the document, which stays balanced
    assert_eq!(outcome.document.total_debit, BigDecimal::from(1_000_000));
    assert_eq!(outcome.document.total_credit, BigDecimal::from(1_000_000));

    let capital = core
        .list_accounts(project)
        .await
        .unwrap()
        .into_iter()
        .find(|account| account.code == "3000")
        .expect("capital account created by the closing");
    assert_eq!(capital.name, "سرمایه");
    assert_eq!(capital.account_type, AccountType::Equity);
    assert_eq!(
        core.account_balance(capital.id).await.unwrap(),
        BigDecimal::from(2_500_000_000i64)
    );

    let capital_ledger = core.account_ledger(capital.id).await.unwrap();
    assert_eq!(capital_ledger.len(), 1);
    assert_eq!(capital_ledger[0].description, INITIAL_CAPITAL_DESCRIPTION);
    assert_eq!(capital_ledger[0].document_id, None);
    assert_eq!(capital_ledger[0].entry_type, EntryType::Credit);
}

#[tokio::test]
async fn test_closing_validation_errors() {
    let (mut core, caller, project, cash, income) = construction_books().await;

    // Empty proposal
    let err = core
        .close_fiscal_year(
            &caller,
            ClosingRequest {
                project_id: project,
                closing_date: day(2025, 3, 19),
                accounts: vec![],
                initial_capital: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    // Unbalanced proposal
    let err = core
        .close_fiscal_year(
            &caller,
            ClosingRequest {
                project_id: project,
                closing_date: day(2025, 3, 19),
                accounts: vec![
                    ClosingAccount::new(
                        cash.id,
                        BigDecimal::from(900_000),
                        BigDecimal::from(0),
                        ClosingDisposition::CarryForward,
                    ),
                    ClosingAccount::new(
                        income.id,
                        BigDecimal::from(0),
                        BigDecimal::from(1_000_000),
                        ClosingDisposition::Close,
                    ),
                ],
                initial_capital: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Unbalanced { .. }));

    // Closing date outside the active year
    let err = core
        .close_fiscal_year(
            &caller,
            ClosingRequest {
                project_id: project,
                closing_date: day(2025, 6, 1),
                accounts: vec![
                    ClosingAccount::new(
                        cash.id,
                        BigDecimal::from(0),
                        BigDecimal::from(0),
                        ClosingDisposition::CarryForward,
                    ),
                ],
                initial_capital: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    // A failed closing leaves the year open and writes nothing
    let year = core.active_fiscal_year(project).await.unwrap().unwrap();
    assert!(!year.is_closed);
    assert!(core.list_documents(project).await.unwrap().is_empty());

    // Without any active year there is nothing to close
    let (mut fresh, caller2, project2) = books();
    let err = fresh
        .close_fiscal_year(
            &caller2,
            ClosingRequest {
                project_id: project2,
                closing_date: day(2025, 3, 19),
                accounts: vec![ClosingAccount::new(
                    Uuid::new_v4(),
                    BigDecimal::from(0),
                    BigDecimal::from(0),
                    ClosingDisposition::Close,
                )],
                initial_capital: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NoActiveFiscalYear(_)));
}

#[tokio::test]
async fn test_closed_year_rejects_mutations() {
    let (mut core, caller, project, cash, income) = construction_books().await;

    let standalone = core
        .record_transaction(
            &caller,
            NewTransaction {
                project_id: project,
                account_id: cash.id,
                date: day(2024, 5, 1),
                amount: BigDecimal::from(600_000),
                entry_type: EntryType::Debit,
                journal_type: JournalType::Daybook,
                description: "واریز نقدی".to_string(),
            },
        )
        .await
        .unwrap();
    core.record_transaction(
        &caller,
        NewTransaction {
            project_id: project,
            account_id: income.id,
            date: day(2024, 5, 1),
            amount: BigDecimal::from(600_000),
            entry_type: EntryType::Credit,
            journal_type: JournalType::Daybook,
            description: "دریافت قسط".to_string(),
        },
    )
    .await
    .unwrap();

    core.close_fiscal_year(
        &caller,
        ClosingRequest {
            project_id: project,
            closing_date: day(2025, 3, 19),
            accounts: vec![
                ClosingAccount::new(
                    cash.id,
                    BigDecimal::from(600_000),
                    BigDecimal::from(0),
                    ClosingDisposition::CarryForward,
                ),
                ClosingAccount::new(
                    income.id,
                    BigDecimal::from(0),
                    BigDecimal::from(600_000),
                    ClosingDisposition::Close,
                ),
            ],
            initial_capital: None,
        },
    )
    .await
    .unwrap();

    // Documents dated inside the closed year bounce
    let late = patterns::member_installment(
        project,
        day(2024, 12, 1),
        cash.id,
        income.id,
        BigDecimal::from(10_000),
        "دیرکرد",
    )
    .unwrap();
    let err = core.post_document(&caller, late).await.unwrap_err();
    assert!(matches!(err, CoreError::ClosedFiscalYear { year: 1403 }));

    // So do edits and deletes of postings dated inside it
    let err = core
        .update_transaction(
            &caller,
            standalone.id,
            TransactionPatch {
                amount: Some(BigDecimal::from(700_000)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ClosedFiscalYear { year: 1403 }));

    let err = core
        .delete_transaction(&caller, standalone.id)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ClosedFiscalYear { year: 1403 }));

    // Dates no fiscal year covers are still accepted
    core.record_transaction(
        &caller,
        NewTransaction {
            project_id: project,
            account_id: cash.id,
            date: day(2025, 6, 1),
            amount: BigDecimal::from(5_000),
            entry_type: EntryType::Debit,
            journal_type: JournalType::Daybook,
            description: "واریز پس از سال مالی".to_string(),
        },
    )
    .await
    .unwrap();

    let covering = core
        .fiscal_year_covering(project, day(2024, 12, 1))
        .await
        .unwrap()
        .unwrap();
    assert!(covering.is_closed);
    assert!(core
        .fiscal_year_covering(project, day(2025, 6, 1))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_single_active_fiscal_year() {
    let (mut core, caller, project, cash, income) = construction_books().await;

    // A second active year is refused while 1403 is open
    let err = core
        .open_fiscal_year(&caller, project, 1404, day(2025, 3, 21), day(2026, 3, 20))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict { .. }));

    let received = patterns::member_installment(
        project,
        day(2024, 5, 1),
        cash.id,
        income.id,
        BigDecimal::from(100_000),
        "اعضا",
    )
    .unwrap();
    core.post_document(&caller, received).await.unwrap();

    core.close_fiscal_year(
        &caller,
        ClosingRequest {
            project_id: project,
            closing_date: day(2025, 3, 19),
            accounts: vec![
                ClosingAccount::new(
                    cash.id,
                    BigDecimal::from(100_000),
                    BigDecimal::from(0),
                    ClosingDisposition::CarryForward,
                ),
                ClosingAccount::new(
                    income.id,
                    BigDecimal::from(0),
                    BigDecimal::from(100_000),
                    ClosingDisposition::Close,
                ),
            ],
            initial_capital: None,
        },
    )
    .await
    .unwrap();

    // Reopening the same year number stays blocked after closing
    let err = core
        .open_fiscal_year(&caller, project, 1403, day(2024, 3, 20), day(2025, 3, 19))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict { .. }));

    // The next year opens normally
    let next = core
        .open_fiscal_year(&caller, project, 1404, day(2025, 3, 21), day(2026, 3, 20))
        .await
        .unwrap();
    assert!(next.is_active);

    let years = core.list_fiscal_years(project).await.unwrap();
    assert_eq!(
        years.iter().map(|y| y.year).collect::<Vec<_>>(),
        vec![1404, 1403]
    );
}

#[tokio::test]
async fn test_trial_balance_falls_back_to_snapshots() {
    let mut storage = MemoryStorage::new();
    let project = Uuid::new_v4();

    let cash = Account::new_direct(
        project,
        "110101".to_string(),
        "صندوق".to_string(),
        AccountType::Asset,
    );
    let income = Account::new_direct(
        project,
        "410101".to_string(),
        "اقساط اعضا".to_string(),
        AccountType::Income,
    );
    storage.insert_account(&cash).await.unwrap();
    storage.insert_account(&income).await.unwrap();

    // Cached balances exist, posting detail does not
    let now = chrono::Utc::now().naive_utc();
    storage
        .upsert_snapshot(&LedgerSnapshot {
            account_id: cash.id,
            project_id: project,
            balance: BigDecimal::from(750_000),
            computed_at: now,
        })
        .await
        .unwrap();
    storage
        .upsert_snapshot(&LedgerSnapshot {
            account_id: income.id,
            project_id: project,
            balance: BigDecimal::from(750_000),
            computed_at: now,
        })
        .await
        .unwrap();

    let trial = TrialBalanceBuilder::new(&storage)
        .build(project, None)
        .await
        .unwrap();

    assert!(trial.from_ledger_cache);
    assert_eq!(trial.rows.len(), 2);
    assert!(trial.is_balanced);
    assert_eq!(trial.totals.closing_debit, BigDecimal::from(750_000));
    assert_eq!(trial.totals.closing_credit, BigDecimal::from(750_000));

    // Opening and period columns stay zero in cache rows
    for row in &trial.rows {
        assert_eq!(row.opening_debit, BigDecimal::from(0));
        assert_eq!(row.period_debit, BigDecimal::from(0));
    }
}

#[tokio::test]
async fn test_nature_aware_account_balances() {
    let (mut core, caller, project) = books();

    let cash = core
        .create_direct_account(&caller, project, "1100", "صندوق", AccountType::Asset)
        .await
        .unwrap();
    let payable = core
        .create_direct_account(&caller, project, "2100", "پیمانکاران", AccountType::Liability)
        .await
        .unwrap();

    let entry = |account_id, amount: i64, entry_type| NewTransaction {
        project_id: project,
        account_id,
        date: day(2024, 6, 1),
        amount: BigDecimal::from(amount),
        entry_type,
        journal_type: JournalType::Daybook,
        description: "ثبت".to_string(),
    };

    for input in [
        entry(cash.id, 500_000, EntryType::Debit),
        entry(cash.id, 120_000, EntryType::Credit),
        entry(payable.id, 300_000, EntryType::Credit),
        entry(payable.id, 100_000, EntryType::Debit),
    ] {
        core.record_transaction(&caller, input).await.unwrap();
    }

    // Debit-nature accounts grow on the debit side
    assert_eq!(
        core.account_balance(cash.id).await.unwrap(),
        BigDecimal::from(380_000)
    );
    // Credit-nature accounts grow on the credit side
    assert_eq!(
        core.account_balance(payable.id).await.unwrap(),
        BigDecimal::from(200_000)
    );
}

#[tokio::test]
async fn test_daybook_export() {
    let (mut core, caller, project, cash, income) = construction_books().await;
    let materials = core
        .create_linked_account(&caller, project, "510101", "مصالح", AccountType::Expense)
        .await
        .unwrap();

    let received = patterns::member_installment(
        project,
        day(2024, 4, 1),
        cash.id,
        income.id,
        BigDecimal::from(500_000),
        "اعضا",
    )
    .unwrap();
    core.post_document(&caller, received).await.unwrap();

    core.record_transaction(
        &caller,
        NewTransaction {
            project_id: project,
            account_id: cash.id,
            date: day(2024, 4, 15),
            amount: BigDecimal::from(50_000),
            entry_type: EntryType::Debit,
            journal_type: JournalType::Daybook,
            description: "واریز متفرقه".to_string(),
        },
    )
    .await
    .unwrap();

    let spent = patterns::construction_expense(
        project,
        day(2024, 5, 1),
        materials.id,
        cash.id,
        BigDecimal::from(200_000),
        "خرید مصالح",
    )
    .unwrap();
    core.post_document(&caller, spent).await.unwrap();

    let rows = core
        .export_ledger(project, JournalType::Daybook, None)
        .await
        .unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(
        rows.iter().map(|r| r.row).collect::<Vec<_>>(),
        vec![1, 2, 3, 4, 5]
    );

    // Document postings resolve their number; standalone ones carry none
    assert_eq!(rows[0].date, day(2024, 4, 1));
    assert_eq!(rows[0].document_number.as_deref(), Some("DOC-0001"));
    assert_eq!(rows[2].date, day(2024, 4, 15));
    assert_eq!(rows[2].document_number, None);
    assert_eq!(rows[2].description, "واریز متفرقه");

    // The date range filter is inclusive
    let april = core
        .export_ledger(
            project,
            JournalType::Daybook,
            Some((day(2024, 4, 15), day(2024, 4, 30))),
        )
        .await
        .unwrap();
    assert_eq!(april.len(), 1);
    assert_eq!(april[0].row, 1);
    assert_eq!(april[0].account_code, cash.code);

    // Nothing is tagged for the other books
    assert_eq!(
        core.journal_postings(project, JournalType::Daybook)
            .await
            .unwrap()
            .len(),
        5
    );
    let general = core
        .export_ledger(project, JournalType::GeneralLedger, None)
        .await
        .unwrap();
    assert!(general.is_empty());
    assert!(core
        .journal_postings(project, JournalType::GeneralLedger)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_drafts_move_no_balances_until_finalized() {
    let (mut core, caller, project, cash, income) = construction_books().await;

    let draft = patterns::member_installment(
        project,
        day(2024, 4, 1),
        cash.id,
        income.id,
        BigDecimal::from(500_000),
        "اعضا",
    )
    .unwrap();
    let document = core.post_draft_document(&caller, draft).await.unwrap();
    assert_eq!(document.status, DocumentStatus::Temporary);
    assert_eq!(document.document_number, "DOC-0001");

    // The lines are stored, the postings are not
    assert_eq!(
        core.list_document_entries(document.id).await.unwrap().len(),
        2
    );
    assert!(core.daybook(project).await.unwrap().is_empty());
    assert_eq!(
        core.account_balance(cash.id).await.unwrap(),
        BigDecimal::from(0)
    );

    let finalized = core.finalize_document(&caller, document.id).await.unwrap();
    assert_eq!(finalized.status, DocumentStatus::Permanent);
    assert_eq!(
        core.account_balance(cash.id).await.unwrap(),
        BigDecimal::from(500_000)
    );
    assert_eq!(core.daybook(project).await.unwrap().len(), 2);

    // Finalizing twice does not double the postings
    core.finalize_document(&caller, document.id).await.unwrap();
    assert_eq!(core.daybook(project).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_unauthorized_callers_are_rejected() {
    let (mut core, _admin, project, cash, income) = construction_books().await;
    let outsider = Caller::regular(Uuid::new_v4());

    let err = core
        .create_group(&outsider, project, "6", "متفرقه")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Unauthorized));

    let err = core
        .create_direct_account(&outsider, project, "9000", "متفرقه", AccountType::Asset)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Unauthorized));

    let draft = patterns::member_installment(
        project,
        day(2024, 4, 1),
        cash.id,
        income.id,
        BigDecimal::from(100_000),
        "اعضا",
    )
    .unwrap();
    let err = core.post_document(&outsider, draft).await.unwrap_err();
    assert!(matches!(err, CoreError::Unauthorized));

    let err = core
        .open_fiscal_year(&outsider, project, 1404, day(2025, 3, 21), day(2026, 3, 20))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Unauthorized));

    let err = core
        .close_fiscal_year(
            &outsider,
            ClosingRequest {
                project_id: project,
                closing_date: day(2025, 3, 19),
                accounts: vec![ClosingAccount::new(
                    cash.id,
                    BigDecimal::from(0),
                    BigDecimal::from(0),
                    ClosingDisposition::CarryForward,
                )],
                initial_capital: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Unauthorized));

    // The books are untouched
    assert!(core.list_documents(project).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_account_code_reuse_after_deactivation() {
    let (mut core, caller, project) = books();

    let original = core
        .create_direct_account(&caller, project, "7000", "تنخواه", AccountType::Asset)
        .await
        .unwrap();

    let err = core
        .create_direct_account(&caller, project, "7000", "تکراری", AccountType::Asset)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict { .. }));

    core.deactivate_account(&caller, original.id).await.unwrap();

    // Unlike chart nodes, a freed account code goes to a fresh account
    let fresh = core
        .create_direct_account(&caller, project, "7000", "تنخواه جدید", AccountType::Asset)
        .await
        .unwrap();
    assert_ne!(fresh.id, original.id);

    let active = core.list_accounts(project).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].name, "تنخواه جدید");
}

#[tokio::test]
async fn test_report_serialization() {
    let (mut core, caller, project, cash, income) = construction_books().await;

    let received = patterns::member_installment(
        project,
        day(2024, 4, 1),
        cash.id,
        income.id,
        BigDecimal::from(500_000),
        "اعضا",
    )
    .unwrap();
    core.post_document(&caller, received).await.unwrap();

    let trial = core.trial_balance(project, None).await.unwrap();
    let json = serde_json::to_string(&trial).unwrap();
    let parsed: TrialBalance = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, trial);

    let sheet = core.balance_sheet(project).await.unwrap();
    let value = serde_json::to_value(&sheet).unwrap();
    assert_eq!(value["is_balanced"], serde_json::Value::Bool(false));
}
