#![cfg(feature = "report")]

use chrono::NaiveDate;
use fattura::core::*;
use fattura::report::*;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn draft(price: rust_decimal::Decimal) -> InvoiceDraft {
    InvoiceDraft {
        counterparty: "Acme Srl".into(),
        counterparty_details: ContactDetailsBuilder::new().vat_number("09876543210").build(),
        lines: vec![InvoiceLine::new("Consulenza", dec!(1), price, VatRate::Standard)],
        ..Default::default()
    }
}

fn populated() -> (Session, Vec<InvoiceId>) {
    let mut s = Session::new(
        Issuer::new("Studio Bianchi", "01234567890", Address::default()),
        SessionConfig::default(),
    );
    let ids = vec![
        s.create_invoice(draft(dec!(100)), date(2025, 1, 10)).unwrap(),
        s.create_invoice(draft(dec!(200)), date(2025, 1, 20)).unwrap(),
        s.create_invoice(draft(dec!(300)), date(2025, 5, 5)).unwrap(),
        s.create_invoice(draft(dec!(1000)), date(2025, 12, 31)).unwrap(),
        s.create_invoice(draft(dec!(50)), date(2024, 1, 15)).unwrap(),
    ];
    (s, ids)
}

#[test]
fn months_quarters_and_year() {
    let (s, _) = populated();
    let summary = summarize(s.documents().invoices(), 2025);

    assert_eq!(summary.months.len(), 12);
    assert_eq!(summary.quarters.len(), 4);

    let jan = summary.row(Period::Month(1)).unwrap();
    assert_eq!(jan.label, "Gennaio");
    assert_eq!(jan.taxable, dec!(300));
    assert_eq!(jan.tax, dec!(66));
    assert_eq!(jan.total, dec!(366));
    assert_eq!(jan.documents, 2);

    let q2 = summary.row(Period::Quarter(2)).unwrap();
    assert_eq!(q2.label, "2° Trimestre");
    assert_eq!(q2.total, dec!(366));

    assert!(summary.row(Period::Quarter(3)).unwrap().total.is_zero());
    assert_eq!(summary.annual.label, "Annuale");
    assert_eq!(summary.annual.taxable, dec!(1600));
    assert_eq!(summary.annual.total, dec!(1952));
    assert_eq!(summary.annual.documents, 4);
    insta::assert_snapshot!(summary.annual.total_display(), @"1.952,00");
}

#[test]
fn quarters_and_months_add_up_to_the_year() {
    let (s, _) = populated();
    let summary = summarize(s.documents().invoices(), 2025);
    let months: rust_decimal::Decimal = summary.months.iter().map(|r| r.total).sum();
    let quarters: rust_decimal::Decimal = summary.quarters.iter().map(|r| r.total).sum();
    assert_eq!(months, summary.annual.total);
    assert_eq!(quarters, summary.annual.total);
}

#[test]
fn deleting_an_invoice_changes_the_summary_by_exactly_its_totals() {
    let (mut s, ids) = populated();
    let before = summarize(s.documents().invoices(), 2025);

    let removed = s.delete(ids[1]).unwrap();
    let after = summarize(s.documents().invoices(), 2025);

    let month = Period::Month(removed.month());
    let (b, a) = (before.row(month).unwrap(), after.row(month).unwrap());
    assert_eq!(b.taxable - a.taxable, removed.totals.taxable);
    assert_eq!(b.tax - a.tax, removed.totals.tax);
    assert_eq!(b.total - a.total, removed.totals.total);
    assert_eq!(b.documents - a.documents, 1);

    for m in (1..=12).filter(|m| *m != removed.month()) {
        assert_eq!(before.row(Period::Month(m)), after.row(Period::Month(m)));
    }
    assert_eq!(before.annual.total - after.annual.total, removed.totals.total);
}

#[test]
fn years_available() {
    let (s, _) = populated();
    let years = available_years(s.documents().invoices());
    assert_eq!(years, vec![2024, 2025]);
    assert_eq!(default_year(&years, 2026), Some(2025));
}

#[test]
fn summary_as_table() {
    let (s, _) = populated();
    let table = summary_table(&summarize(s.documents().invoices(), 2025));
    assert_eq!(table.headers, ["Anno", "Periodo", "Imponibile", "IVA", "Totale"]);
    assert_eq!(table.rows.len(), 17);
    assert_eq!(table.rows[0], ["2025", "Gennaio", "300.00", "66.00", "366.00"]);
    assert_eq!(table.rows[16][1], "Annuale");
    assert!(table.to_csv().starts_with("\"Anno\";\"Periodo\""));
}
