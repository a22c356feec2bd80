//! Flat tables for persisted records and spreadsheet exchange.
//!
//! CSV files use `;` separators, every field double-quoted, `\r\n` line
//! endings and a header row.

use serde::{Deserialize, Serialize};

use super::error::FatturaError;
use super::format::{format_date, format_plain};
use super::registry::ContactRegistry;
use super::store::DocumentStore;
use super::types::*;

/// Columns of the documents table.
pub const DOCUMENT_COLUMNS: [&str; 11] = [
    "Tipo",
    "Numero",
    "Data",
    "Controparte",
    "Imponibile",
    "IVA",
    "Importo",
    "TipoXML",
    "Stato",
    "UUID",
    "PDF",
];

/// Columns of the contacts table.
pub const CONTACT_COLUMNS: [&str; 10] = [
    "Denominazione",
    "PIVA",
    "CF",
    "Indirizzo",
    "CAP",
    "Comune",
    "Provincia",
    "CodiceDestinatario",
    "PEC",
    "Tipo",
];

/// A header row plus string cells.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell by row index and column name; missing columns read as "".
    pub fn cell(&self, row: usize, name: &str) -> &str {
        self.column(name)
            .and_then(|c| self.rows.get(row).and_then(|r| r.get(c)))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        write_csv_row(&mut out, &self.headers);
        for row in &self.rows {
            write_csv_row(&mut out, row);
        }
        out
    }

    pub fn from_csv(input: &str) -> Result<Self, FatturaError> {
        let mut records = parse_csv(input)?.into_iter();
        let headers = records
            .next()
            .ok_or_else(|| FatturaError::Validation("table: missing header row".into()))?;
        let width = headers.len();
        let mut rows = Vec::new();
        for (i, mut record) in records.enumerate() {
            if record.len() > width {
                return Err(FatturaError::Validation(format!(
                    "table: row {} has {} fields, header has {width}",
                    i + 1,
                    record.len()
                )));
            }
            record.resize(width, String::new());
            rows.push(record);
        }
        Ok(Self { headers, rows })
    }
}

fn write_csv_row(out: &mut String, fields: &[String]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(';');
        }
        out.push('"');
        for ch in field.chars() {
            if ch == '"' {
                out.push_str("\"\"");
            } else {
                out.push(ch);
            }
        }
        out.push('"');
    }
    out.push_str("\r\n");
}

fn parse_csv(input: &str) -> Result<Vec<Vec<String>>, FatturaError> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = input.trim_start_matches('\u{feff}').chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                other => field.push(other),
            }
            continue;
        }
        match ch {
            '"' => in_quotes = true,
            ';' => record.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            other => field.push(other),
        }
    }

    if in_quotes {
        return Err(FatturaError::Validation(
            "table: unterminated quoted field".into(),
        ));
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    Ok(records)
}

/// Contacts table in registry order.
pub fn contacts_table(registry: &ContactRegistry) -> Table {
    let mut table = Table::new(&CONTACT_COLUMNS);
    for c in registry.iter() {
        table.push_row(vec![
            c.denomination.clone(),
            c.vat_number.clone().unwrap_or_default(),
            c.fiscal_code.clone().unwrap_or_default(),
            c.address.street.clone(),
            c.address.postal_code.clone(),
            c.address.municipality.clone(),
            c.address.province.clone(),
            c.sdi_code.clone(),
            c.pec.clone().unwrap_or_default(),
            c.kind.label().to_string(),
        ]);
    }
    table
}

/// Upsert every row of a contacts table into `registry`.
///
/// Only the table's columns are overwritten; an existing contact keeps its
/// country and e-mail. Either every row applies or the registry is left as
/// it was. Returns the number of rows applied; rows without a denomination
/// are skipped.
pub fn contacts_from_table(
    table: &Table,
    registry: &mut ContactRegistry,
) -> Result<usize, FatturaError> {
    let opt = |s: &str| {
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_string())
    };
    let cell = |row: usize, column: &str| table.cell(row, column).trim().to_string();

    let mut staged = registry.clone();
    let mut applied = 0;
    for row in 0..table.rows.len() {
        let denomination = table.cell(row, "Denominazione").trim();
        if denomination.is_empty() {
            continue;
        }
        let mut details = staged
            .lookup_by_denomination(denomination)
            .map(Contact::details)
            .unwrap_or_default();
        details.vat_number = opt(table.cell(row, "PIVA"));
        details.fiscal_code = opt(table.cell(row, "CF"));
        details.address.street = cell(row, "Indirizzo");
        details.address.postal_code = cell(row, "CAP");
        details.address.municipality = cell(row, "Comune");
        details.address.province = cell(row, "Provincia");
        details.sdi_code = opt(table.cell(row, "CodiceDestinatario"));
        details.pec = opt(table.cell(row, "PEC"));
        details.kind = ContactKind::from_label(table.cell(row, "Tipo"));

        staged.upsert(denomination, details).map_err(|e| match e {
            FatturaError::Validation(msg) => {
                FatturaError::Validation(format!("row {}: {msg}", row + 1))
            }
            other => other,
        })?;
        applied += 1;
    }
    *registry = staged;
    Ok(applied)
}

/// Documents table in store order.
pub fn documents_table(store: &DocumentStore) -> Table {
    let mut table = Table::new(&DOCUMENT_COLUMNS);
    for inv in store.invoices() {
        table.push_row(vec![
            inv.doc_type.label().to_string(),
            inv.number.clone(),
            format_date(inv.issue_date),
            inv.counterparty_name.clone(),
            format_plain(inv.totals.taxable),
            format_plain(inv.totals.tax),
            format_plain(inv.totals.total),
            inv.doc_type.code().to_string(),
            inv.state.label().to_string(),
            inv.uuid.map(|u| u.to_string()).unwrap_or_default(),
            inv.pdf_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        ]);
    }
    table
}
