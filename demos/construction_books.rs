//! Bookkeeping for a construction project, from chart seeding to reports

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use daftar_core::utils::MemoryStorage;
use daftar_core::{
    patterns, AccountType, AccountingCore, Caller, DocumentBuilder, JournalType,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🏗️ Daftar Core - Construction Project Books\n");

    let mut core = AccountingCore::new(MemoryStorage::new());
    let caller = Caller::privileged(Uuid::new_v4());
    let project = Uuid::new_v4();

    // 1. Seed the standard chart of accounts
    println!("📊 Seeding the standard chart...");
    let chart = core.seed_standard_chart(&caller, project).await?;

    for group in core.list_groups(project).await? {
        println!("  ✓ Group {} - {}", group.code, group.name);
    }
    println!();

    // 2. Resolve full codes from the hierarchy and open accounts on them
    println!("🧾 Opening ledger accounts on seeded details...");
    let index = core.chart_index(project).await?;
    let code_of = |slug: &str| {
        index
            .full_code_of_detail(chart.details[slug].id)
            .expect("seeded detail resolves")
            .to_string()
    };

    let cash = core
        .create_linked_account(&caller, project, &code_of("cash"), "صندوق", AccountType::Asset)
        .await?;
    let bank = core
        .create_linked_account(&caller, project, &code_of("bank"), "بانک", AccountType::Asset)
        .await?;
    let building = core
        .create_linked_account(
            &caller,
            project,
            &code_of("building"),
            "ساختمان",
            AccountType::Asset,
        )
        .await?;
    let contractors = core
        .create_linked_account(
            &caller,
            project,
            &code_of("contractors_payable"),
            "پیمانکاران",
            AccountType::Liability,
        )
        .await?;
    let installments = core
        .create_linked_account(
            &caller,
            project,
            &code_of("member_installments"),
            "اقساط اعضا",
            AccountType::Income,
        )
        .await?;
    let materials = core
        .create_linked_account(
            &caller,
            project,
            &code_of("materials"),
            "مصالح",
            AccountType::Expense,
        )
        .await?;
    let wages = core
        .create_linked_account(&caller, project, &code_of("wages"), "دستمزد", AccountType::Expense)
        .await?;

    for account in core.list_accounts(project).await? {
        println!("  ✓ Account {} - {}", account.code, account.name);
    }
    println!();

    // 3. Open the fiscal year
    println!("📅 Opening fiscal year 1403...");
    let year = core
        .open_fiscal_year(
            &caller,
            project,
            1403,
            NaiveDate::from_ymd_opt(2024, 3, 20).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 19).unwrap(),
        )
        .await?;
    println!("  ✓ Year {} open: {} to {}\n", year.year, year.start_date, year.end_date);

    // 4. Post the year's documents
    println!("💰 Posting documents...\n");

    let installment = patterns::member_installment(
        project,
        NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
        cash.id,
        installments.id,
        BigDecimal::from(500_000_000),
        "علی رضایی",
    )?;
    let document = core.post_document(&caller, installment).await?;
    println!("  ✓ {}: installment received, 500,000,000 ریال", document.document_number);

    // An installment split between the cash box and the bank
    let split = DocumentBuilder::new(
        project,
        NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
        "دریافت قسط مریم احمدی",
    )
    .debit(cash.id, BigDecimal::from(200_000_000), None)
    .debit(bank.id, BigDecimal::from(100_000_000), None)
    .credit(installments.id, BigDecimal::from(300_000_000), None)
    .build()?;
    let document = core.post_document(&caller, split).await?;
    println!("  ✓ {}: installment split across cash and bank", document.document_number);

    let purchase = patterns::construction_expense(
        project,
        NaiveDate::from_ymd_opt(2024, 6, 2).unwrap(),
        materials.id,
        cash.id,
        BigDecimal::from(200_000_000),
        "خرید مصالح",
    )?;
    let document = core.post_document(&caller, purchase).await?;
    println!("  ✓ {}: materials bought for cash", document.document_number);

    let payroll = patterns::construction_expense(
        project,
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        wages.id,
        cash.id,
        BigDecimal::from(150_000_000),
        "پرداخت دستمزد",
    )?;
    let document = core.post_document(&caller, payroll).await?;
    println!("  ✓ {}: wages paid", document.document_number);

    let skeleton = patterns::asset_on_credit(
        project,
        NaiveDate::from_ymd_opt(2024, 8, 15).unwrap(),
        building.id,
        contractors.id,
        BigDecimal::from(400_000_000),
        "اجرای اسکلت ساختمان",
    )?;
    let document = core.post_document(&caller, skeleton).await?;
    println!("  ✓ {}: building work billed by contractor", document.document_number);

    let settlement = DocumentBuilder::new(
        project,
        NaiveDate::from_ymd_opt(2024, 9, 20).unwrap(),
        "پرداخت به پیمانکار",
    )
    .debit(contractors.id, BigDecimal::from(250_000_000), None)
    .credit(cash.id, BigDecimal::from(200_000_000), None)
    .credit(bank.id, BigDecimal::from(50_000_000), None)
    .build()?;
    let document = core.post_document(&caller, settlement).await?;
    println!("  ✓ {}: contractor partly paid\n", document.document_number);

    // 5. Read balances off the ledger
    println!("🔍 Account balances:");
    for (name, id) in [
        ("صندوق", cash.id),
        ("بانک", bank.id),
        ("ساختمان", building.id),
        ("پیمانکاران", contractors.id),
        ("اقساط اعضا", installments.id),
    ] {
        println!("  {:<12} {} ریال", name, core.account_balance(id).await?);
    }
    println!();

    // 6. Trial balance
    let trial = core.trial_balance(project, None).await?;
    println!("📈 Trial balance:");
    for row in &trial.rows {
        println!(
            "  {} {:<12} debit {:>13}  credit {:>13}",
            row.account_code, row.account_name, row.closing_debit, row.closing_credit
        );
    }
    println!("  Totals: debit {} / credit {}", trial.totals.closing_debit, trial.totals.closing_credit);
    println!("  Balanced: {}\n", if trial.is_balanced { "✅ Yes" } else { "❌ No" });

    // 7. Balance sheet with the current / non-current split
    let sheet = core.balance_sheet(project).await?;
    println!("📊 Balance sheet:");
    println!("  Current assets:");
    for row in &sheet.assets.current {
        println!("    {} {}: {} ریال", row.account_code, row.account_name, row.balance);
    }
    println!("  Non-current assets:");
    for row in &sheet.assets.non_current {
        println!("    {} {}: {} ریال", row.account_code, row.account_name, row.balance);
    }
    println!("  Total assets:      {} ریال", sheet.total_assets);
    println!("  Total liabilities: {} ریال", sheet.total_liabilities);
    println!("  Total equity:      {} ریال", sheet.total_equity);
    println!(
        "  Balanced: {} (year still open, income not yet closed to equity)\n",
        if sheet.is_balanced { "✅ Yes" } else { "❌ No" }
    );

    // 8. Export the daybook
    let rows = core.export_ledger(project, JournalType::Daybook, None).await?;
    println!("📄 Daybook export ({} rows), first entries:", rows.len());
    for row in rows.iter().take(4) {
        println!(
            "  #{} {} {} {} debit {} credit {}",
            row.row,
            row.date,
            row.document_number.as_deref().unwrap_or("-"),
            row.account_code,
            row.debit,
            row.credit
        );
    }
    println!();

    // 9. Cross-check the books
    println!("🔍 Verifying the books...");
    let report = core.verify_books(project).await?;
    if report.is_valid {
        println!("  ✅ Books check out");
    } else {
        for issue in &report.issues {
            println!("  ⚠️ {}", issue);
        }
        println!("  Run the year-end closing to settle income into equity.");
    }

    println!("\n🎉 Example completed successfully!");
    Ok(())
}
