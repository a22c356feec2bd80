use serde::{Deserialize, Serialize};

use super::types::{Invoice, InvoiceId};

/// Ordered collection of issued documents.
///
/// Every invoice gets a stable [`InvoiceId`] on insert. Row positions are
/// derived from insertion order and shift when earlier rows are removed;
/// ids and invoice numbers never do.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentStore {
    entries: Vec<(InvoiceId, Invoice)>,
    next_id: u64,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an invoice and return its id.
    pub fn insert(&mut self, invoice: Invoice) -> InvoiceId {
        self.next_id += 1;
        let id = InvoiceId(self.next_id);
        self.entries.push((id, invoice));
        id
    }

    pub fn get(&self, id: InvoiceId) -> Option<&Invoice> {
        self.entries.iter().find(|(i, _)| *i == id).map(|(_, inv)| inv)
    }

    pub fn get_mut(&mut self, id: InvoiceId) -> Option<&mut Invoice> {
        self.entries
            .iter_mut()
            .find(|(i, _)| *i == id)
            .map(|(_, inv)| inv)
    }

    /// Remove an invoice permanently.
    pub fn remove(&mut self, id: InvoiceId) -> Option<Invoice> {
        let pos = self.position(id)?;
        Some(self.entries.remove(pos).1)
    }

    /// Current row position of an invoice.
    pub fn position(&self, id: InvoiceId) -> Option<usize> {
        self.entries.iter().position(|(i, _)| *i == id)
    }

    pub fn find_by_number(&self, number: &str) -> Option<(InvoiceId, &Invoice)> {
        self.entries
            .iter()
            .find(|(_, inv)| inv.number == number)
            .map(|(id, inv)| (*id, inv))
    }

    /// All invoice numbers, in row order.
    pub fn numbers(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, inv)| inv.number.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (InvoiceId, &Invoice)> {
        self.entries.iter().map(|(id, inv)| (*id, inv))
    }

    pub fn invoices(&self) -> impl Iterator<Item = &Invoice> {
        self.entries.iter().map(|(_, inv)| inv)
    }

    /// Invoices issued in `year` and, optionally, `month`.
    pub fn in_period(&self, year: i32, month: Option<u32>) -> Vec<(InvoiceId, &Invoice)> {
        self.iter()
            .filter(|(_, inv)| inv.year() == year && month.is_none_or(|m| inv.month() == m))
            .collect()
    }

    /// Case-insensitive substring search on number and counterparty name.
    /// An empty query matches everything.
    pub fn search(&self, query: &str) -> Vec<(InvoiceId, &Invoice)> {
        let needle = query.trim().to_lowercase();
        self.iter()
            .filter(|(_, inv)| {
                needle.is_empty()
                    || inv.number.to_lowercase().contains(&needle)
                    || inv.counterparty_name.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Number of documents per month of `year`; index 0 is January.
    pub fn count_per_month(&self, year: i32) -> [usize; 12] {
        let mut counts = [0usize; 12];
        for inv in self.invoices().filter(|inv| inv.year() == year) {
            counts[(inv.month() - 1) as usize] += 1;
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
