use chrono::NaiveDate;
use fattura::core::*;
use rust_decimal_macros::dec;

fn main() {
    let mut issuer = Issuer::new(
        "Studio Bianchi Commercialisti",
        "01234567890",
        AddressBuilder::new("Milano", "20121", "MI")
            .street("Via Roma 1")
            .build(),
    );
    issuer.pec = Some("studiobianchi@pec.it".into());

    let mut session = Session::new(issuer, SessionConfig::default());
    let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

    let draft = InvoiceDraft {
        counterparty: "Acme Srl".into(),
        counterparty_details: ContactDetailsBuilder::new()
            .vat_number("09876543210")
            .address(
                AddressBuilder::new("Torino", "10121", "TO")
                    .street("Corso Francia 10")
                    .build(),
            )
            .pec("acme@pec.it")
            .build(),
        lines: vec![
            InvoiceLine::new("Consulenza fiscale", dec!(2), dec!(100), VatRate::Standard),
            InvoiceLine::new("Trasferta", dec!(1), dec!(50), VatRate::Standard),
        ],
        notes: Some("Consulenza marzo 2025".into()),
        payment: Payment {
            method: PaymentMethod::BankTransfer,
            iban: Some("IT60X0542811101000000123456".into()),
            due_date: NaiveDate::from_ymd_opt(2025, 4, 9),
        },
        ..Default::default()
    };

    let id = match session.create_invoice(draft, today) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("Invoice rejected: {e}");
            std::process::exit(1);
        }
    };

    let invoice = session.invoice(id).unwrap();
    println!("Fattura {} del {}", invoice.number, format_date(invoice.issue_date));
    println!("Cliente: {}", invoice.counterparty_name);
    println!("---");
    for line in &invoice.lines {
        let totals = compute_line_totals(line).unwrap();
        println!(
            "  {} x {} @ {} = {} (IVA {}%)",
            line.quantity,
            line.description,
            format_eur(line.unit_price),
            format_eur(totals.taxable),
            line.vat_rate.percent()
        );
    }
    println!("---");
    println!("Imponibile: {}", format_eur_symbol(invoice.totals.taxable));
    println!("IVA:        {}", format_eur_symbol(invoice.totals.tax));
    println!("Totale:     {}", format_eur_symbol(invoice.totals.total));
    println!("Stato:      {}", invoice.state);

    let next = next_invoice_number(session.documents().numbers(), today);
    println!("\nProssimo numero: {next}");
}
