use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};

use super::error::FatturaError;

/// Prefix of every outgoing invoice number.
pub const INVOICE_PREFIX: &str = "FT";

/// Width of the zero-padded sequence part.
const SEQUENCE_WIDTH: usize = 3;

/// A parsed invoice number of the form `FT<yyyy><seq>`, e.g. "FT2025007".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InvoiceNumber {
    pub year: i32,
    pub sequence: u64,
}

impl InvoiceNumber {
    pub fn new(year: i32, sequence: u64) -> Self {
        Self { year, sequence }
    }

    /// Sequence part of `number` if it belongs to `year`.
    ///
    /// The tail after `FT<year>` must be a non-empty run of ASCII digits;
    /// anything else is not part of the year's sequence.
    pub fn sequence_in_year(number: &str, year: i32) -> Option<u64> {
        let tail = number.strip_prefix(&year_prefix(year))?;
        if tail.is_empty() || !tail.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        tail.parse().ok()
    }
}

impl fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:04}{:0>width$}",
            INVOICE_PREFIX,
            self.year,
            self.sequence,
            width = SEQUENCE_WIDTH
        )
    }
}

impl FromStr for InvoiceNumber {
    type Err = FatturaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s.strip_prefix(INVOICE_PREFIX).ok_or_else(|| {
            FatturaError::Numbering(format!("'{s}' does not start with {INVOICE_PREFIX}"))
        })?;
        if rest.len() <= 4 || !rest.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FatturaError::Numbering(format!(
                "'{s}' is not of the form {INVOICE_PREFIX}<year><sequence>"
            )));
        }
        let (year, seq) = rest.split_at(4);
        let year = year
            .parse()
            .map_err(|e| FatturaError::Numbering(format!("invalid year in '{s}': {e}")))?;
        let sequence = seq
            .parse()
            .map_err(|e| FatturaError::Numbering(format!("invalid sequence in '{s}': {e}")))?;
        Ok(Self { year, sequence })
    }
}

fn year_prefix(year: i32) -> String {
    format!("{INVOICE_PREFIX}{year:04}")
}

/// Per-year invoice number sequence.
///
/// Continues from the highest number already issued in the year. Deleted
/// numbers are never reused and gaps are never filled.
#[derive(Debug, Clone)]
pub struct InvoiceNumberSequence {
    year: i32,
    next_number: u64,
}

impl InvoiceNumberSequence {
    /// Create a sequence for `year` starting at 1.
    pub fn new(year: i32) -> Self {
        Self {
            year,
            next_number: 1,
        }
    }

    /// Create a sequence continuing after the highest number of `year`
    /// found in `existing`. The sequence saturates at `u64::MAX`.
    pub fn from_existing<'a, I>(existing: I, year: i32) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let max = existing
            .into_iter()
            .filter_map(|n| InvoiceNumber::sequence_in_year(n, year))
            .max()
            .unwrap_or(0);
        Self {
            year,
            next_number: max.saturating_add(1),
        }
    }

    /// Generate the next invoice number.
    pub fn next_number(&mut self) -> String {
        let number = self.peek();
        self.next_number = self.next_number.saturating_add(1);
        number
    }

    /// Preview the next number without consuming it.
    pub fn peek(&self) -> String {
        InvoiceNumber::new(self.year, self.next_number).to_string()
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// The next sequence value (without prefix/formatting).
    pub fn next_raw(&self) -> u64 {
        self.next_number
    }

    /// Restart at 1 if `date` falls in a later year.
    /// Returns true if the year was advanced.
    pub fn auto_advance(&mut self, date: NaiveDate) -> bool {
        if date.year() > self.year {
            self.year = date.year();
            self.next_number = 1;
            true
        } else {
            false
        }
    }
}

/// Next invoice number for the fiscal year of `today`.
///
/// Numbers of other years and numbers not shaped like `FT<year><digits>`
/// are ignored; the result is max-plus-one of the remaining sequences, or
/// `FT<year>001` when there are none.
pub fn next_invoice_number<'a, I>(existing: I, today: NaiveDate) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    InvoiceNumberSequence::from_existing(existing, today.year()).peek()
}
