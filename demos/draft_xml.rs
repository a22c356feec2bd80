use chrono::NaiveDate;
use fattura::core::*;
use fattura::fatturapa::render_draft_xml;
use rust_decimal_macros::dec;

fn main() {
    let mut issuer = Issuer::new(
        "Studio Bianchi",
        "01234567890",
        AddressBuilder::new("Milano", "20121", "MI")
            .street("Via Roma 1")
            .build(),
    );
    issuer.tax_regime = TaxRegime::Flat;

    let mut session = Session::new(issuer, SessionConfig::default());
    let draft = InvoiceDraft {
        counterparty: "Acme Srl".into(),
        counterparty_details: ContactDetailsBuilder::new()
            .vat_number("09876543210")
            .address(AddressBuilder::new("Torino", "10121", "TO").build())
            .sdi_code("M5UXCR1")
            .build(),
        lines: vec![
            InvoiceLine::new("Tenuta contabilità", dec!(1), dec!(600), VatRate::Zero)
                .with_nature(VatNature::NotSubjectOther),
        ],
        stamp_duty: true,
        ..Default::default()
    };

    let today = NaiveDate::from_ymd_opt(2025, 5, 2).unwrap();
    let id = session.create_invoice(draft, today).unwrap();

    match render_draft_xml(
        session.invoice(id).unwrap(),
        session.issuer(),
        session.counterparty_of(id).unwrap(),
    ) {
        Ok(xml) => {
            println!("{xml}");
            eprintln!("File: {}", xml_filename(&session.invoice(id).unwrap().number));
        }
        Err(e) => {
            eprintln!("XML not generated: {e}");
            std::process::exit(1);
        }
    }
}
