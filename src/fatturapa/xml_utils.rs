use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use rust_decimal::Decimal;
use std::io::Cursor;

use crate::core::{FatturaError, round_cents};

pub type XmlResult = Result<String, FatturaError>;

fn xml_io(e: std::io::Error) -> FatturaError {
    FatturaError::Xml(format!("XML write error: {e}"))
}

pub struct XmlWriter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlWriter {
    pub fn new() -> Result<Self, FatturaError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_io)?;
        Ok(Self { writer })
    }

    pub fn into_string(self) -> Result<String, FatturaError> {
        let buf = self.writer.into_inner().into_inner();
        String::from_utf8(buf).map_err(|e| FatturaError::Xml(format!("XML UTF-8 error: {e}")))
    }

    /// `<!-- text -->`; `text` must not contain `--`.
    pub fn comment(&mut self, text: &str) -> Result<&mut Self, FatturaError> {
        if text.contains("--") {
            return Err(FatturaError::Xml("comment must not contain '--'".into()));
        }
        self.writer
            .write_event(Event::Comment(BytesText::from_escaped(format!(" {text} "))))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn start_element(&mut self, name: &str) -> Result<&mut Self, FatturaError> {
        self.writer
            .write_event(Event::Start(BytesStart::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn start_element_with_attrs(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, FatturaError> {
        let mut elem = BytesStart::new(name);
        for (k, v) in attrs {
            elem.push_attribute((*k, *v));
        }
        self.writer
            .write_event(Event::Start(elem))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn end_element(&mut self, name: &str) -> Result<&mut Self, FatturaError> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn text_element(&mut self, name: &str, text: &str) -> Result<&mut Self, FatturaError> {
        self.start_element(name)?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_io)?;
        self.end_element(name)
    }

    /// Text element skipped when `text` is `None` or blank.
    pub fn opt_text_element(
        &mut self,
        name: &str,
        text: Option<&str>,
    ) -> Result<&mut Self, FatturaError> {
        match text.map(str::trim).filter(|t| !t.is_empty()) {
            Some(t) => self.text_element(name, t),
            None => Ok(self),
        }
    }

    /// Monetary amount, always exactly two decimals.
    pub fn amount_element(&mut self, name: &str, amount: Decimal) -> Result<&mut Self, FatturaError> {
        self.text_element(name, &format_amount(amount))
    }

    /// Quantity or unit price: at least two decimals, more when present.
    pub fn decimal_element(&mut self, name: &str, value: Decimal) -> Result<&mut Self, FatturaError> {
        self.text_element(name, &format_decimal(value))
    }
}

/// Two decimals, half-up rounded: `dec!(2)` → `"2.00"`.
pub fn format_amount(d: Decimal) -> String {
    format!("{:.2}", round_cents(d))
}

/// At least 2 decimal places, trailing zeros beyond that stripped.
pub fn format_decimal(d: Decimal) -> String {
    let s = d.normalize().to_string();
    if let Some(dot_pos) = s.find('.') {
        let decimals = s.len() - dot_pos - 1;
        if decimals < 2 {
            format!("{s}{}", "0".repeat(2 - decimals))
        } else {
            s
        }
    } else {
        format!("{s}.00")
    }
}
