//! Boundary behaviour of the invoice form, registry and flat tables.

use chrono::NaiveDate;
use fattura::core::*;
use rust_decimal_macros::dec;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn session() -> Session {
    Session::new(
        Issuer::new("Studio Bianchi", "01234567890", Address::default()),
        SessionConfig::default(),
    )
}

fn line(price: rust_decimal::Decimal) -> InvoiceLine {
    InvoiceLine::new("Consulenza", dec!(1), price, VatRate::Standard)
}

fn draft_with(lines: Vec<InvoiceLine>) -> InvoiceDraft {
    InvoiceDraft {
        counterparty: "Acme Srl".into(),
        counterparty_details: ContactDetailsBuilder::new().vat_number("09876543210").build(),
        lines,
        ..Default::default()
    }
}

fn validation_message(err: FatturaError) -> String {
    match err {
        FatturaError::Validation(msg) => msg,
        other => panic!("expected a validation error, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Invoice form
// ---------------------------------------------------------------------------

#[test]
fn draft_without_lines_is_rejected_and_nothing_changes() {
    let mut s = session();
    let err = s.create_invoice(draft_with(vec![]), date(2025, 3, 1)).unwrap_err();
    assert!(validation_message(err).contains("lines"));
    assert!(s.documents().is_empty());
    assert!(s.contacts().is_empty());
}

#[test]
fn counterparty_without_tax_id_is_rejected() {
    let mut s = session();
    let mut draft = draft_with(vec![line(dec!(100))]);
    draft.counterparty_details = ContactDetails::default();
    let msg = validation_message(s.create_invoice(draft, date(2025, 3, 1)).unwrap_err());
    assert!(msg.contains("counterparty"));
    assert!(s.contacts().is_empty());
}

#[test]
fn blank_counterparty_name_is_rejected() {
    let mut s = session();
    let mut draft = draft_with(vec![line(dec!(100))]);
    draft.counterparty = "   ".into();
    let msg = validation_message(s.create_invoice(draft, date(2025, 3, 1)).unwrap_err());
    assert!(msg.contains("counterparty.denomination"));
}

#[test]
fn zero_amount_invoice_is_rejected() {
    let mut s = session();
    let err = s
        .create_invoice(draft_with(vec![line(dec!(0))]), date(2025, 3, 1))
        .unwrap_err();
    assert!(validation_message(err).contains("greater than zero"));
}

#[test]
fn thousand_lines_accepted_one_more_rejected() {
    let mut s = session();
    let many: Vec<InvoiceLine> = (0..MAX_LINES).map(|_| line(dec!(1))).collect();
    let id = s.create_invoice(draft_with(many.clone()), date(2025, 3, 1)).unwrap();
    assert_eq!(s.invoice(id).unwrap().totals.taxable, dec!(1000));

    let mut too_many = many;
    too_many.push(line(dec!(1)));
    let err = s.create_invoice(draft_with(too_many), date(2025, 3, 2)).unwrap_err();
    assert!(validation_message(err).contains("1000"));
    assert_eq!(s.documents().len(), 1);
}

#[test]
fn amount_beyond_decimal_range_is_rejected_and_nothing_changes() {
    let mut s = session();
    let huge = parse_line("Fornitura", "100000000000000000000", "10000000000", VatRate::Standard)
        .unwrap();
    let err = s
        .create_invoice(draft_with(vec![huge]), date(2025, 3, 1))
        .unwrap_err();
    assert!(validation_message(err).contains("too large"));
    assert!(s.documents().is_empty());
    assert!(s.contacts().is_empty());

    let id = s
        .create_invoice(draft_with(vec![line(dec!(100))]), date(2025, 3, 1))
        .unwrap();
    assert_eq!(s.invoice(id).unwrap().number, "FT2025001");
}

#[test]
fn zero_rate_without_nature_defaults_to_n2_2() {
    let zero = InvoiceLine::new("Diritti", dec!(1), dec!(30), VatRate::Zero);
    assert_eq!(zero.effective_nature().map(|n| n.code()), Some("N2.2"));
    let standard = line(dec!(30));
    assert_eq!(standard.effective_nature(), None);

    let totals = compute_invoice_totals(&[zero], rust_decimal::Decimal::ZERO).unwrap();
    assert_eq!(totals.tax, dec!(0));
    assert_eq!(totals.total, dec!(30));
}

#[test]
fn explicit_issue_date_is_kept_but_number_follows_today() {
    let mut s = session();
    let mut draft = draft_with(vec![line(dec!(100))]);
    draft.issue_date = Some(date(2024, 12, 31));
    let id = s.create_invoice(draft, date(2025, 1, 3)).unwrap();
    let invoice = s.invoice(id).unwrap();
    assert_eq!(invoice.issue_date, date(2024, 12, 31));
    assert_eq!(invoice.number, "FT2025001");
}

#[test]
fn stamp_duty_uses_configured_amount() {
    let mut s = Session::new(
        Issuer::new("Studio Bianchi", "01234567890", Address::default()),
        SessionConfig {
            stamp_duty_amount: dec!(2.00),
            ..SessionConfig::default()
        },
    );
    let mut draft = draft_with(vec![line(dec!(100))]);
    draft.stamp_duty = true;
    let id = s.create_invoice(draft, date(2025, 3, 1)).unwrap();
    let totals = &s.invoice(id).unwrap().totals;
    assert_eq!(totals.stamp_duty, dec!(2.00));
    assert_eq!(totals.total, dec!(124.00));
}

// ---------------------------------------------------------------------------
// Editing and lifecycle
// ---------------------------------------------------------------------------

#[test]
fn edit_recomputes_totals_and_keeps_number() {
    let mut s = session();
    let id = s
        .create_invoice(draft_with(vec![line(dec!(100))]), date(2025, 3, 1))
        .unwrap();
    let mut draft = s.draft_for(id).unwrap();
    draft.lines.push(line(dec!(50)));
    s.edit(id, draft).unwrap();

    let invoice = s.invoice(id).unwrap();
    assert_eq!(invoice.number, "FT2025001");
    assert_eq!(invoice.totals.total, dec!(183.00));
    assert_eq!(invoice.state, InvoiceState::Draft);
}

#[test]
fn sent_invoice_is_read_only_until_confirmed_back() {
    let mut s = session();
    let id = s
        .create_invoice(draft_with(vec![line(dec!(100))]), date(2025, 3, 1))
        .unwrap();
    s.set_state(id, InvoiceState::Sent, Transition::Normal).unwrap();

    let draft = s.draft_for(id).unwrap();
    assert!(matches!(
        s.edit(id, draft.clone()),
        Err(FatturaError::Lifecycle(_))
    ));

    s.set_state(id, InvoiceState::Created, Transition::Confirmed)
        .unwrap();
    s.edit(id, draft).unwrap();
}

#[test]
fn finalize_requires_a_pdf() {
    let mut s = session();
    let id = s
        .create_invoice(draft_with(vec![line(dec!(100))]), date(2025, 3, 1))
        .unwrap();
    assert!(matches!(s.finalize(id), Err(FatturaError::Lifecycle(_))));
    assert_eq!(s.invoice(id).unwrap().state, InvoiceState::Draft);
}

#[test]
fn unknown_state_label_reads_as_draft() {
    assert_eq!(InvoiceState::from_label(""), InvoiceState::Draft);
    assert_eq!(InvoiceState::from_label("Bozza"), InvoiceState::Draft);
    assert_eq!(InvoiceState::from_label(" Inviato "), InvoiceState::Sent);
}

#[test]
fn placeholders_report_not_implemented() {
    let mut s = session();
    let id = s
        .create_invoice(draft_with(vec![line(dec!(100))]), date(2025, 3, 1))
        .unwrap();
    assert!(matches!(s.download_package(id), Err(FatturaError::NotImplemented(_))));
    assert!(matches!(s.proforma_pdf(id), Err(FatturaError::NotImplemented(_))));
    assert!(matches!(s.received_invoices(), Err(FatturaError::NotImplemented(_))));
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[test]
fn sdi_code_must_be_seven_alphanumerics() {
    assert!(validate_sdi_code("0000000").is_ok());
    assert!(validate_sdi_code("M5UXCR1").is_ok());
    assert!(validate_sdi_code("ABC").is_err());
    assert!(validate_sdi_code("ABC-123").is_err());

    let mut registry = ContactRegistry::new();
    let details = ContactDetailsBuilder::new().sdi_code("12345678").build();
    assert!(registry.upsert("Acme Srl", details).is_err());
    assert!(registry.is_empty());
}

#[test]
fn new_contact_defaults() {
    let mut registry = ContactRegistry::new();
    let id = registry.upsert("Acme Srl", ContactDetails::default()).unwrap();
    let acme = registry.get(id).unwrap();
    assert_eq!(acme.sdi_code, DEFAULT_SDI_CODE);
    assert_eq!(acme.kind, ContactKind::Client);
    assert_eq!(acme.address.country_code, "IT");
    assert!(registry.lookup_by_denomination("acme srl").is_none());
}

// ---------------------------------------------------------------------------
// Flat tables
// ---------------------------------------------------------------------------

#[test]
fn csv_quotes_separators_quotes_and_newlines() {
    let mut table = Table::new(&["Denominazione", "Note"]);
    table.push_row(vec!["Rossi; Bianchi".into(), "detto \"il Conte\"\nsecondo rigo".into()]);
    let csv = table.to_csv();
    assert!(csv.contains("\"Rossi; Bianchi\""));
    assert!(csv.contains("\"\"il Conte\"\""));

    let back = Table::from_csv(&csv).unwrap();
    assert_eq!(back, table);
}

#[test]
fn csv_with_bom_and_short_rows() {
    let input = "\u{feff}\"A\";\"B\";\"C\"\r\n\"1\";\"2\"\r\n";
    let table = Table::from_csv(input).unwrap();
    assert_eq!(table.headers, ["A", "B", "C"]);
    assert_eq!(table.rows[0], ["1", "2", ""]);
    assert_eq!(table.cell(0, "Z"), "");
}

#[test]
fn malformed_csv_is_rejected() {
    assert!(Table::from_csv("").is_err());
    assert!(Table::from_csv("\"A\"\r\n\"1\";\"2\"\r\n").is_err());
    assert!(Table::from_csv("\"A\"\r\n\"unterminated\r\n").is_err());
}

#[test]
fn contacts_table_round_trip_into_a_fresh_registry() {
    let mut registry = ContactRegistry::new();
    registry
        .upsert(
            "Acme Srl",
            ContactDetailsBuilder::new()
                .vat_number("09876543210")
                .kind(ContactKind::Supplier)
                .pec("acme@pec.it")
                .build(),
        )
        .unwrap();
    let table = contacts_table(&registry);

    let mut fresh = ContactRegistry::new();
    assert_eq!(contacts_from_table(&table, &mut fresh).unwrap(), 1);
    let acme = fresh.lookup_by_denomination("Acme Srl").unwrap();
    assert_eq!(acme.kind, ContactKind::Supplier);
    assert_eq!(acme.pec.as_deref(), Some("acme@pec.it"));
}

#[test]
fn contacts_table_keeps_fields_it_does_not_carry() {
    let mut registry = ContactRegistry::new();
    registry
        .upsert(
            "Kunde AG",
            ContactDetailsBuilder::new()
                .vat_number("DE123456789")
                .address(
                    AddressBuilder::new("München", "80331", "")
                        .country("DE")
                        .build(),
                )
                .email("info@kunde.de")
                .kind(ContactKind::Client)
                .build(),
        )
        .unwrap();
    let mut table = contacts_table(&registry);
    let street = table.headers.iter().position(|h| h == "Indirizzo").unwrap();
    table.rows[0][street] = "Marienplatz 1".into();

    assert_eq!(contacts_from_table(&table, &mut registry).unwrap(), 1);
    let kunde = registry.lookup_by_denomination("Kunde AG").unwrap();
    assert_eq!(kunde.address.street, "Marienplatz 1");
    assert_eq!(kunde.address.country_code, "DE");
    assert_eq!(kunde.email.as_deref(), Some("info@kunde.de"));
    assert_eq!(registry.len(), 1);
}

#[test]
fn contacts_table_with_a_bad_row_applies_nothing() {
    let mut registry = ContactRegistry::new();
    registry
        .upsert("Acme Srl", ContactDetailsBuilder::new().vat_number("09876543210").build())
        .unwrap();

    let mut table = Table::new(&["Denominazione", "PIVA", "CodiceDestinatario"]);
    table.push_row(vec!["Acme Srl".into(), "11111111111".into(), "".into()]);
    table.push_row(vec!["Beta Spa".into(), "22222222222".into(), "".into()]);
    table.push_row(vec!["Gamma Snc".into(), "33333333333".into(), "TROPPOLUNGO".into()]);

    let msg = validation_message(contacts_from_table(&table, &mut registry).unwrap_err());
    assert!(msg.contains("row 3"), "{msg}");
    assert_eq!(registry.len(), 1);
    assert!(registry.lookup_by_denomination("Beta Spa").is_none());
    let acme = registry.lookup_by_denomination("Acme Srl").unwrap();
    assert_eq!(acme.vat_number.as_deref(), Some("09876543210"));
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

#[test]
fn dates_parse_in_both_layouts() {
    assert_eq!(parse_date("07/03/2025").unwrap(), date(2025, 3, 7));
    assert_eq!(parse_date("2025-03-07").unwrap(), date(2025, 3, 7));
    assert!(parse_date("31/02/2025").is_err());
}
