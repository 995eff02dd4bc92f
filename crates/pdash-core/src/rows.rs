use std::borrow::Cow;
use std::collections::BTreeMap;

/// One spreadsheet row as extracted from a sheet: header text → cell.
///
/// Headers are taken verbatim from the sheet, so the same logical column may
/// appear as `product_id`, `Product ID`, or `productId` depending on who built
/// the file.
pub type RawRow = BTreeMap<String, Cell>;

/// A raw cell value, before any coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Renders the cell as text. Whole numbers print without a fractional
    /// part (`1234.0` → `"1234"`). `Empty` has no text.
    #[must_use]
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => Some(Cow::Borrowed(s.as_str())),
            Cell::Number(n) => Some(Cow::Owned(n.to_string())),
            Cell::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}
