//! Fiscal-year lifecycle: open a year, post into it, close it atomically

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use daftar_core::utils::MemoryStorage;
use daftar_core::{
    patterns, AccountType, AccountingCore, Caller, ClosingAccount, ClosingDisposition,
    ClosingRequest,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("📅 Daftar Core - Year-End Closing\n");

    let mut core = AccountingCore::new(MemoryStorage::new());
    let caller = Caller::privileged(Uuid::new_v4());
    let project = Uuid::new_v4();

    // 1. Chart, accounts, and an open year
    let chart = core.seed_standard_chart(&caller, project).await?;
    let index = core.chart_index(project).await?;

    let cash_code = index.full_code_of_detail(chart.details["cash"].id).unwrap();
    let income_code = index
        .full_code_of_detail(chart.details["member_installments"].id)
        .unwrap();
    let expense_code = index
        .full_code_of_detail(chart.details["materials"].id)
        .unwrap();

    let cash = core
        .create_linked_account(&caller, project, cash_code, "صندوق", AccountType::Asset)
        .await?;
    let income = core
        .create_linked_account(&caller, project, income_code, "اقساط اعضا", AccountType::Income)
        .await?;
    let materials = core
        .create_linked_account(&caller, project, expense_code, "مصالح", AccountType::Expense)
        .await?;

    core.open_fiscal_year(
        &caller,
        project,
        1403,
        NaiveDate::from_ymd_opt(2024, 3, 20).unwrap(),
        NaiveDate::from_ymd_opt(2025, 3, 19).unwrap(),
    )
    .await?;
    println!("✓ Fiscal year 1403 open");

    // 2. A year of activity
    let received = patterns::member_installment(
        project,
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        cash.id,
        income.id,
        BigDecimal::from(1_000_000_000),
        "اعضای بلوک یک",
    )?;
    core.post_document(&caller, received).await?;

    let spent = patterns::construction_expense(
        project,
        NaiveDate::from_ymd_opt(2024, 11, 8).unwrap(),
        materials.id,
        cash.id,
        BigDecimal::from(400_000_000),
        "خرید مصالح",
    )?;
    core.post_document(&caller, spent).await?;
    println!("✓ Posted the year's documents\n");

    let trial = core.trial_balance(project, None).await?;
    println!(
        "📈 Trial balance before closing: debit {} / credit {} ({})",
        trial.totals.closing_debit,
        trial.totals.closing_credit,
        if trial.is_balanced { "balanced" } else { "off" }
    );

    // 3. Close the year: zero income and expenses, carry cash forward,
    //    and seed the share capital
    let request = ClosingRequest {
        project_id: project,
        closing_date: NaiveDate::from_ymd_opt(2025, 3, 19).unwrap(),
        accounts: vec![
            ClosingAccount::new(
                cash.id,
                BigDecimal::from(1_000_000_000),
                BigDecimal::from(400_000_000),
                ClosingDisposition::for_account_type(&AccountType::Asset),
            ),
            ClosingAccount::new(
                income.id,
                BigDecimal::from(0),
                BigDecimal::from(1_000_000_000),
                ClosingDisposition::for_account_type(&AccountType::Income),
            ),
            ClosingAccount::new(
                materials.id,
                BigDecimal::from(400_000_000),
                BigDecimal::from(0),
                ClosingDisposition::for_account_type(&AccountType::Expense),
            ),
        ],
        initial_capital: Some(BigDecimal::from(2_500_000_000i64)),
    };

    let outcome = core.close_fiscal_year(&caller, request).await?;
    println!("\n🔒 Year closed with {}", outcome.document.document_number);
    println!(
        "  Document totals: debit {} / credit {}",
        outcome.document.total_debit, outcome.document.total_credit
    );
    println!(
        "  Year {}: closed = {}, active = {}",
        outcome.fiscal_year.year, outcome.fiscal_year.is_closed, outcome.fiscal_year.is_active
    );

    // 4. Settled balances
    println!("\n🔍 Balances after closing:");
    println!("  صندوق      {} ریال", core.account_balance(cash.id).await?);
    println!("  اقساط اعضا {} ریال", core.account_balance(income.id).await?);
    println!("  مصالح      {} ریال", core.account_balance(materials.id).await?);

    let capital = core
        .list_accounts(project)
        .await?
        .into_iter()
        .find(|account| account.code == "3000")
        .expect("capital account created by the closing");
    println!(
        "  {} ({})   {} ریال",
        capital.name,
        capital.code,
        core.account_balance(capital.id).await?
    );

    // 5. The closed year takes no more postings
    let late = patterns::member_installment(
        project,
        NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
        cash.id,
        income.id,
        BigDecimal::from(50_000_000),
        "عضو دیرکرد",
    )?;
    match core.post_document(&caller, late).await {
        Err(err) => println!("\n❌ Late posting rejected: {}", err),
        Ok(_) => println!("\n⚠️ Late posting unexpectedly accepted"),
    }

    // 6. Open the next year and continue
    core.open_fiscal_year(
        &caller,
        project,
        1404,
        NaiveDate::from_ymd_opt(2025, 3, 21).unwrap(),
        NaiveDate::from_ymd_opt(2026, 3, 20).unwrap(),
    )
    .await?;

    let fresh = patterns::member_installment(
        project,
        NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(),
        cash.id,
        income.id,
        BigDecimal::from(50_000_000),
        "عضو دیرکرد",
    )?;
    let document = core.post_document(&caller, fresh).await?;
    println!("✓ Fiscal year 1404 open, first document {}", document.document_number);

    println!("\n🎉 Example completed successfully!");
    Ok(())
}
