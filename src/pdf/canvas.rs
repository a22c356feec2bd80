use lopdf::content::Operation;
use lopdf::{Object, StringFormat};

/// A4 portrait, in points.
pub const PAGE_WIDTH: i64 = 595;
pub const PAGE_HEIGHT: i64 = 842;
pub const MARGIN: i64 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    /// Resource name in the page font dictionary.
    pub fn resource(self) -> &'static str {
        match self {
            Self::Regular => "F1",
            Self::Bold => "F2",
        }
    }

    pub fn base_font(self) -> &'static str {
        match self {
            Self::Regular => "Helvetica",
            Self::Bold => "Helvetica-Bold",
        }
    }
}

/// Multi-page drawing surface with a top-down cursor.
///
/// Coordinates are whole points with the origin at the bottom-left corner,
/// as in PDF.
pub struct Canvas {
    pages: Vec<Vec<Operation>>,
    current: Vec<Operation>,
    /// Baseline of the next line to draw.
    pub y: i64,
    /// Lowest baseline usable for content; space below is the footer.
    pub bottom: i64,
}

impl Canvas {
    pub fn new(bottom: i64) -> Self {
        Self {
            pages: Vec::new(),
            current: Vec::new(),
            y: PAGE_HEIGHT - MARGIN,
            bottom,
        }
    }

    /// Close the current page and start a new one with the cursor at the top.
    pub fn new_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.current));
        self.y = PAGE_HEIGHT - MARGIN;
    }

    /// True when `height` more points fit above the footer.
    pub fn fits(&self, height: i64) -> bool {
        self.y - height >= self.bottom
    }

    pub fn page_number(&self) -> usize {
        self.pages.len() + 1
    }

    pub fn text(&mut self, x: i64, y: i64, font: Font, size: i64, text: &str) {
        self.current.extend(text_ops(x, y, font, size, text));
    }

    /// Draw `text` ending at `right`.
    pub fn text_right(&mut self, right: i64, y: i64, font: Font, size: i64, text: &str) {
        let x = right - text_width(text, font, size);
        self.text(x, y, font, size, text);
    }

    /// Horizontal rule at `y`.
    pub fn hline(&mut self, x1: i64, x2: i64, y: i64) {
        self.current.extend([
            Operation::new("w", vec![1.into()]),
            Operation::new("m", vec![x1.into(), y.into()]),
            Operation::new("l", vec![x2.into(), y.into()]),
            Operation::new("S", vec![]),
        ]);
    }

    /// All pages, including the one being drawn.
    pub fn into_pages(mut self) -> Vec<Vec<Operation>> {
        self.pages.push(self.current);
        self.pages
    }
}

/// BT … ET block drawing one line of text.
pub fn text_ops(x: i64, y: i64, font: Font, size: i64, text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![font.resource().into(), size.into()]),
        Operation::new("Td", vec![x.into(), y.into()]),
        Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
        ),
        Operation::new("ET", vec![]),
    ]
}

/// Encode text for the standard fonts' WinAnsiEncoding. Characters outside
/// the code page become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7e}' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            '€' => 0x80,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '\t' => b' ',
            _ => b'?',
        })
        .collect()
}

/// Approximate Helvetica advance width in thousandths of the font size.
fn char_width(c: char, font: Font) -> i64 {
    let bold = font == Font::Bold;
    match c {
        ' ' | '.' | ',' | ':' | ';' | '!' | '/' | '\'' => 278,
        'i' | 'j' | 'l' => {
            if bold {
                278
            } else {
                222
            }
        }
        'f' | 't' | 'I' | '(' | ')' | '-' => {
            if bold {
                333
            } else {
                278
            }
        }
        'r' => {
            if bold {
                389
            } else {
                333
            }
        }
        'm' => {
            if bold {
                889
            } else {
                833
            }
        }
        'w' => {
            if bold {
                778
            } else {
                722
            }
        }
        'M' => 833,
        'W' => 944,
        '0'..='9' | '€' => 556,
        c if c.is_uppercase() => {
            if bold {
                722
            } else {
                667
            }
        }
        _ => {
            if bold {
                611
            } else {
                556
            }
        }
    }
}

/// Width of `text` in points, rounded up.
pub fn text_width(text: &str, font: Font, size: i64) -> i64 {
    let units: i64 = text.chars().map(|c| char_width(c, font)).sum();
    (units * size + 999) / 1000
}

/// Greedy word wrap to `max_width` points. Words wider than a line are
/// split by character. Explicit newlines start new lines.
pub fn wrap(text: &str, font: Font, size: i64, max_width: i64) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{line} {word}")
            };
            if text_width(&candidate, font, size) <= max_width {
                line = candidate;
                continue;
            }
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            for ch in word.chars() {
                line.push(ch);
                if text_width(&line, font, size) > max_width && line.chars().count() > 1 {
                    line.pop();
                    lines.push(std::mem::replace(&mut line, ch.to_string()));
                }
            }
        }
        lines.push(line);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn win_ansi_maps_euro_and_accents() {
        assert_eq!(encode_win_ansi("€ 1,00"), b"\x80 1,00".to_vec());
        assert_eq!(encode_win_ansi("è"), vec![0xe8]);
        assert_eq!(encode_win_ansi("日"), b"?".to_vec());
    }

    #[test]
    fn wrap_respects_width() {
        let text = "Consulenza fiscale e contabile per il primo trimestre dell'anno in corso";
        let lines = wrap(text, Font::Regular, 10, 120);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, Font::Regular, 10) <= 120, "{line}");
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn wrap_splits_long_words_and_keeps_newlines() {
        let lines = wrap("AAAAAAAAAAAAAAAAAAAA", Font::Bold, 10, 50);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), "AAAAAAAAAAAAAAAAAAAA");
        assert_eq!(wrap("uno\ndue", Font::Regular, 10, 500), vec!["uno", "due"]);
        assert_eq!(wrap("", Font::Regular, 10, 500), vec![""]);
    }

    #[test]
    fn pages_accumulate() {
        let mut c = Canvas::new(100);
        c.text(MARGIN, c.y, Font::Regular, 10, "uno");
        assert!(c.fits(600));
        assert!(!c.fits(800));
        c.new_page();
        assert_eq!(c.page_number(), 2);
        c.text_right(PAGE_WIDTH - MARGIN, c.y, Font::Bold, 10, "due");
        let pages = c.into_pages();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].len(), 5);
    }
}
