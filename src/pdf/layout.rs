use rust_decimal::Decimal;

use super::NOTICE_SENTENCES;
use super::canvas::{Canvas, Font, MARGIN, PAGE_WIDTH, text_ops, text_width, wrap};
use crate::core::*;
use lopdf::content::Operation;

const RIGHT: i64 = PAGE_WIDTH - MARGIN;
const CONTENT_WIDTH: i64 = RIGHT - MARGIN;
const BODY: i64 = 9;
const SMALL: i64 = 7;
const LEADING: i64 = 12;
/// Space reserved at the bottom of every page for the notice and page number.
const FOOTER_HEIGHT: i64 = 70;

// Line-item table columns: description on the left, numbers right-aligned.
const COL_DESC_WIDTH: i64 = 250;
const COL_QTY_RIGHT: i64 = MARGIN + 310;
const COL_PRICE_RIGHT: i64 = MARGIN + 390;
const COL_RATE_RIGHT: i64 = MARGIN + 440;

/// Lay out all pages of a courtesy copy.
pub fn draw_invoice(
    invoice: &Invoice,
    issuer: &Issuer,
    counterparty: &Contact,
) -> Result<Vec<Vec<Operation>>, FatturaError> {
    let mut c = Canvas::new(MARGIN + FOOTER_HEIGHT);

    draw_page_header(&mut c, invoice, issuer);
    draw_counterparty(&mut c, counterparty);
    draw_document_data(&mut c, invoice, issuer, counterparty);
    draw_lines(&mut c, invoice, issuer)?;
    draw_notes(&mut c, invoice, issuer);
    draw_totals(&mut c, invoice, issuer);
    draw_vat_summary(&mut c, invoice, issuer);
    draw_payment(&mut c, invoice, issuer);

    let mut pages = c.into_pages();
    let count = pages.len();
    for (i, ops) in pages.iter_mut().enumerate() {
        draw_footer(ops, i + 1, count);
    }
    Ok(pages)
}

fn draw_page_header(c: &mut Canvas, invoice: &Invoice, issuer: &Issuer) {
    let top = c.y;
    c.text(MARGIN, top, Font::Bold, 12, &issuer.denomination);
    let mut y = top - LEADING - 2;
    let mut lines = vec![issuer.address.street.clone(), issuer.address.locality_line()];
    lines.push(format!("P.IVA {}", issuer.vat_number));
    if let Some(cf) = non_blank(&issuer.fiscal_code) {
        lines.push(format!("C.F. {cf}"));
    }
    if let Some(pec) = non_blank(&issuer.pec) {
        lines.push(format!("PEC {pec}"));
    }
    for line in lines.iter().filter(|l| !l.trim().is_empty()) {
        c.text(MARGIN, y, Font::Regular, BODY, line);
        y -= LEADING;
    }

    c.text_right(RIGHT, top, Font::Bold, 14, invoice.doc_type.label());
    c.text_right(
        RIGHT,
        top - 18,
        Font::Regular,
        10,
        &format!("N. {} del {}", invoice.number, format_date(invoice.issue_date)),
    );
    if c.page_number() > 1 {
        c.text_right(RIGHT, top - 32, Font::Regular, SMALL, "(segue)");
    }

    c.y = y - 6;
    c.hline(MARGIN, RIGHT, c.y);
    c.y -= LEADING + 4;
}

/// Start a new page when `height` does not fit.
fn ensure_space(c: &mut Canvas, height: i64, invoice: &Invoice, issuer: &Issuer) {
    if !c.fits(height) {
        c.new_page();
        draw_page_header(c, invoice, issuer);
    }
}

fn draw_counterparty(c: &mut Canvas, contact: &Contact) {
    let x = MARGIN + CONTENT_WIDTH / 2;
    c.text(x, c.y, Font::Bold, 10, "Spett.le");
    c.y -= LEADING;
    for line in wrap(&contact.denomination, Font::Bold, 10, CONTENT_WIDTH / 2) {
        c.text(x, c.y, Font::Bold, 10, &line);
        c.y -= LEADING;
    }

    let mut lines = vec![contact.address.street.clone(), contact.address.locality_line()];
    if !contact.address.country_code.eq_ignore_ascii_case("IT") {
        lines.push(contact.address.country_code.clone());
    }
    if let Some(vat) = non_blank(&contact.vat_number) {
        lines.push(format!("P.IVA {vat}"));
    }
    if let Some(cf) = non_blank(&contact.fiscal_code) {
        lines.push(format!("C.F. {cf}"));
    }
    for line in lines.iter().filter(|l| !l.trim().is_empty()) {
        c.text(x, c.y, Font::Regular, BODY, line);
        c.y -= LEADING;
    }
    c.y -= 8;
}

/// Two columns: document data on the left, transmission data on the right.
fn draw_document_data(c: &mut Canvas, invoice: &Invoice, issuer: &Issuer, contact: &Contact) {
    let half = MARGIN + CONTENT_WIDTH / 2;
    c.text(MARGIN, c.y, Font::Bold, 10, "Dati documento");
    c.text(half, c.y, Font::Bold, 10, "Dati trasmissione");
    c.y -= 4;
    c.hline(MARGIN, RIGHT, c.y);
    c.y -= LEADING;

    let left = [
        format!(
            "Tipo documento: {} {}",
            invoice.doc_type.code(),
            invoice.doc_type.label()
        ),
        format!("Numero: {}", invoice.number),
        format!("Data: {}", format_date(invoice.issue_date)),
        "Divisa: EUR".to_string(),
    ];
    let mut right = vec![
        "Formato: FPR12".to_string(),
        format!("Codice destinatario: {}", contact.sdi_code),
    ];
    if let Some(pec) = non_blank(&contact.pec) {
        right.push(format!("PEC destinatario: {pec}"));
    }
    right.push(format!(
        "Regime fiscale: {} {}",
        issuer.tax_regime.code(),
        issuer.tax_regime.description()
    ));

    let rows = left.len().max(right.len());
    for i in 0..rows {
        if let Some(l) = left.get(i) {
            c.text(MARGIN, c.y, Font::Regular, BODY, l);
        }
        if let Some(r) = right.get(i) {
            c.text(half, c.y, Font::Regular, BODY, r);
        }
        c.y -= LEADING;
    }
    c.y -= 8;
}

fn draw_line_header(c: &mut Canvas) {
    c.text(MARGIN, c.y, Font::Bold, BODY, "Descrizione");
    c.text_right(COL_QTY_RIGHT, c.y, Font::Bold, BODY, "Quantità");
    c.text_right(COL_PRICE_RIGHT, c.y, Font::Bold, BODY, "Prezzo unitario");
    c.text_right(COL_RATE_RIGHT, c.y, Font::Bold, BODY, "IVA %");
    c.text_right(RIGHT, c.y, Font::Bold, BODY, "Importo");
    c.y -= 4;
    c.hline(MARGIN, RIGHT, c.y);
    c.y -= LEADING;
}

fn draw_lines(c: &mut Canvas, invoice: &Invoice, issuer: &Issuer) -> Result<(), FatturaError> {
    ensure_space(c, 3 * LEADING, invoice, issuer);
    draw_line_header(c);

    for line in &invoice.lines {
        let amount = compute_line_totals(line)?.taxable;
        let desc = wrap(&line.description, Font::Regular, BODY, COL_DESC_WIDTH);
        // Keep short rows together; longer ones continue on the next page.
        let rows = desc.len().clamp(1, 3) as i64;
        if !c.fits(rows * LEADING) {
            continue_table(c, invoice, issuer);
        }

        let row = c.y;
        let rate = match line.effective_nature() {
            Some(nature) => format!("0 {}", nature.code()),
            None => line.vat_rate.percent().normalize().to_string(),
        };
        c.text_right(COL_QTY_RIGHT, row, Font::Regular, BODY, &format_quantity(line.quantity));
        c.text_right(COL_PRICE_RIGHT, row, Font::Regular, BODY, &format_eur(line.unit_price));
        c.text_right(COL_RATE_RIGHT, row, Font::Regular, BODY, &rate);
        c.text_right(RIGHT, row, Font::Regular, BODY, &format_eur(amount));
        for text in desc {
            if !c.fits(LEADING) {
                continue_table(c, invoice, issuer);
            }
            c.text(MARGIN, c.y, Font::Regular, BODY, &text);
            c.y -= LEADING;
        }
    }
    c.hline(MARGIN, RIGHT, c.y + LEADING - 4);
    c.y -= 6;
    Ok(())
}

fn continue_table(c: &mut Canvas, invoice: &Invoice, issuer: &Issuer) {
    c.new_page();
    draw_page_header(c, invoice, issuer);
    draw_line_header(c);
}

fn draw_notes(c: &mut Canvas, invoice: &Invoice, issuer: &Issuer) {
    let Some(notes) = non_blank(&invoice.notes) else {
        return;
    };
    let lines = wrap(notes, Font::Regular, BODY, CONTENT_WIDTH);
    ensure_space(c, (lines.len() as i64 + 1) * LEADING, invoice, issuer);
    c.text(MARGIN, c.y, Font::Bold, BODY, "Causale");
    c.y -= LEADING;
    for line in lines {
        c.text(MARGIN, c.y, Font::Regular, BODY, &line);
        c.y -= LEADING;
    }
    c.y -= 6;
}

fn draw_totals(c: &mut Canvas, invoice: &Invoice, issuer: &Issuer) {
    let totals = &invoice.totals;
    let mut rows: Vec<(&str, Decimal)> = vec![("Imponibile", totals.taxable), ("IVA", totals.tax)];
    if !totals.stamp_duty.is_zero() {
        rows.push(("Bollo", totals.stamp_duty));
    }
    ensure_space(c, (rows.len() as i64 + 2) * LEADING, invoice, issuer);

    let label_x = MARGIN + CONTENT_WIDTH / 2 + 60;
    for (label, amount) in rows {
        c.text(label_x, c.y, Font::Regular, 10, label);
        c.text_right(RIGHT, c.y, Font::Regular, 10, &format_eur_symbol(amount));
        c.y -= LEADING;
    }
    c.hline(label_x, RIGHT, c.y + LEADING - 4);
    c.y -= 2;
    c.text(label_x, c.y, Font::Bold, 11, "Totale documento");
    c.text_right(RIGHT, c.y, Font::Bold, 11, &format_eur_symbol(totals.total));
    c.y -= LEADING + 8;
}

fn draw_vat_summary(c: &mut Canvas, invoice: &Invoice, issuer: &Issuer) {
    let groups = &invoice.totals.vat_summary;
    ensure_space(c, (groups.len() as i64 + 3) * LEADING, invoice, issuer);

    let nature_x = MARGIN + 90;
    c.text(MARGIN, c.y, Font::Bold, 10, "Riepilogo IVA");
    c.y -= LEADING + 2;
    c.text(MARGIN, c.y, Font::Bold, BODY, "Aliquota");
    c.text(nature_x, c.y, Font::Bold, BODY, "Natura");
    c.text_right(COL_PRICE_RIGHT, c.y, Font::Bold, BODY, "Imponibile");
    c.text_right(RIGHT, c.y, Font::Bold, BODY, "Imposta");
    c.y -= 4;
    c.hline(MARGIN, RIGHT, c.y);
    c.y -= LEADING;

    for group in groups {
        c.text(
            MARGIN,
            c.y,
            Font::Regular,
            BODY,
            &format!("{}%", group.rate.percent().normalize()),
        );
        c.text(
            nature_x,
            c.y,
            Font::Regular,
            BODY,
            group.nature.map(|n| n.code()).unwrap_or("-"),
        );
        c.text_right(COL_PRICE_RIGHT, c.y, Font::Regular, BODY, &format_eur(group.taxable));
        c.text_right(RIGHT, c.y, Font::Regular, BODY, &format_eur(group.tax));
        c.y -= LEADING;
    }
    c.y -= 8;
}

fn draw_payment(c: &mut Canvas, invoice: &Invoice, issuer: &Issuer) {
    let payment = &invoice.payment;
    let mut lines = vec![format!(
        "Modalità: {} ({})",
        payment.method.label(),
        payment.method.code()
    )];
    if let Some(iban) = non_blank(&payment.iban) {
        lines.push(format!("IBAN: {iban}"));
    }
    if let Some(due) = payment.due_date {
        lines.push(format!("Scadenza: {}", format_date(due)));
    }
    lines.push(format!("Importo: {}", format_eur_symbol(invoice.totals.total)));

    ensure_space(c, (lines.len() as i64 + 1) * LEADING, invoice, issuer);
    c.text(MARGIN, c.y, Font::Bold, 10, "Pagamento");
    c.y -= LEADING + 2;
    for line in lines {
        c.text(MARGIN, c.y, Font::Regular, BODY, &line);
        c.y -= LEADING;
    }
}

fn draw_footer(ops: &mut Vec<Operation>, page: usize, count: usize) {
    let mut y = MARGIN + FOOTER_HEIGHT - 20;
    ops.extend([
        Operation::new("w", vec![1.into()]),
        Operation::new("m", vec![MARGIN.into(), (y + 12).into()]),
        Operation::new("l", vec![RIGHT.into(), (y + 12).into()]),
        Operation::new("S", vec![]),
    ]);
    for sentence in NOTICE_SENTENCES {
        for line in wrap(sentence, Font::Regular, SMALL, CONTENT_WIDTH) {
            ops.extend(text_ops(MARGIN, y, Font::Regular, SMALL, &line));
            y -= SMALL + 2;
        }
    }
    let label = format!("Pagina {page} di {count}");
    let x = RIGHT - text_width(&label, Font::Regular, SMALL);
    ops.extend(text_ops(x, MARGIN, Font::Regular, SMALL, &label));
}

/// Quantities print without trailing zeros: 2 → "2", 1.5 → "1,5".
fn format_quantity(q: Decimal) -> String {
    q.normalize().to_string().replace('.', ",")
}
