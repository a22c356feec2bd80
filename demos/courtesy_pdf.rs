use chrono::NaiveDate;
use fattura::core::*;
use fattura::pdf::render_pdf;
use rust_decimal_macros::dec;

fn main() -> Result<(), FatturaError> {
    let issuer = Issuer::new(
        "Studio Bianchi",
        "01234567890",
        AddressBuilder::new("Milano", "20121", "MI")
            .street("Via Roma 1")
            .build(),
    );
    let config = SessionConfig {
        pdf_dir: std::env::temp_dir().join("fattura_demo_pdf"),
        ..SessionConfig::default()
    };
    let mut session = Session::new(issuer, config);

    let draft = InvoiceDraft {
        counterparty: "Rossi Mario".into(),
        counterparty_details: ContactDetailsBuilder::new()
            .fiscal_code("RSSMRA80A01L219X")
            .address(
                AddressBuilder::new("Torino", "10121", "TO")
                    .street("Via Po 3")
                    .build(),
            )
            .build(),
        lines: vec![
            InvoiceLine::new("Dichiarazione dei redditi", dec!(1), dec!(180), VatRate::Standard),
            InvoiceLine::new("Visura catastale", dec!(2), dec!(15), VatRate::Standard),
        ],
        ..Default::default()
    };
    let id = session.create_invoice(draft, NaiveDate::from_ymd_opt(2025, 6, 20).unwrap())?;

    let bytes = render_pdf(
        session.invoice(id)?,
        session.issuer(),
        session.counterparty_of(id)?,
    )?;
    let path = session.attach_pdf(id, &bytes)?;
    session.finalize(id)?;

    println!("Copia di cortesia: {}", path.display());
    println!("Stato: {}", session.invoice(id)?.state);
    Ok(())
}
