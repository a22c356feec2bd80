use chrono::NaiveDate;
use fattura::core::*;
use fattura::report::{available_years, default_year, summarize, summary_table};
use rust_decimal_macros::dec;

fn main() {
    let mut session = Session::new(
        Issuer::new("Studio Bianchi", "01234567890", Address::default()),
        SessionConfig::default(),
    );

    let invoices = [
        (2025, 1, 15, dec!(400)),
        (2025, 2, 3, dec!(250)),
        (2025, 2, 27, dec!(1200)),
        (2025, 7, 10, dec!(90)),
        (2024, 11, 5, dec!(300)),
    ];
    for (y, m, d, amount) in invoices {
        let draft = InvoiceDraft {
            counterparty: "Acme Srl".into(),
            counterparty_details: ContactDetailsBuilder::new().vat_number("09876543210").build(),
            lines: vec![InvoiceLine::new("Consulenza", dec!(1), amount, VatRate::Standard)],
            ..Default::default()
        };
        session
            .create_invoice(draft, NaiveDate::from_ymd_opt(y, m, d).unwrap())
            .unwrap();
    }

    let years = available_years(session.documents().invoices());
    let Some(year) = default_year(&years, 2025) else {
        println!("Nessun documento.");
        return;
    };

    let summary = summarize(session.documents().invoices(), year);
    println!("Riepilogo {year}");
    println!("{:<14} {:>12} {:>12} {:>12}", "Periodo", "Imponibile", "IVA", "Totale");
    for row in summary.rows() {
        println!(
            "{:<14} {:>12} {:>12} {:>12}",
            row.label,
            row.taxable_display(),
            row.tax_display(),
            row.total_display()
        );
    }

    println!("\n{}", summary_table(&summary).to_csv());
}
