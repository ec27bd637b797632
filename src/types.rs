//! Cell values handed to the export writers

use crate::composer::HeaderRow;
use std::fmt;

/// A single cell of an exported row
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Empty cell
    Empty,
    /// String value
    String(String),
    /// Integer value
    Int(i64),
    /// Float value
    Float(f64),
    /// Boolean value
    Bool(bool),
}

impl CellValue {
    /// Convert cell value to string
    pub fn as_string(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::String(s) => s.clone(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::Bool(b) => b.to_string(),
        }
    }

    /// Check if cell is empty
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::String(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Empty)
    }
}

/// Letterhead rows are written as plain string cells
impl From<&HeaderRow> for Vec<CellValue> {
    fn from(row: &HeaderRow) -> Self {
        row.cells()
            .iter()
            .map(|c| {
                if c.is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::String(c.clone())
                }
            })
            .collect()
    }
}

/// Build a data row from anything convertible into cells
pub fn row<I, T>(cells: I) -> Vec<CellValue>
where
    I: IntoIterator<Item = T>,
    T: Into<CellValue>,
{
    cells.into_iter().map(Into::into).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_strings() {
        assert_eq!(CellValue::Int(42).as_string(), "42");
        assert_eq!(CellValue::Float(1.5).to_string(), "1.5");
        assert_eq!(CellValue::Bool(true).as_string(), "true");
        assert_eq!(CellValue::Empty.as_string(), "");
    }

    #[test]
    fn test_is_empty() {
        assert!(CellValue::Empty.is_empty());
        assert!(CellValue::from("").is_empty());
        assert!(!CellValue::Int(0).is_empty());
        assert!(CellValue::from(None::<i64>).is_empty());
    }

    #[test]
    fn test_header_row_conversion() {
        let header = HeaderRow::new(vec!["Acme".to_string(), String::new()]);
        let cells: Vec<CellValue> = (&header).into();
        assert_eq!(cells, vec![CellValue::from("Acme"), CellValue::Empty]);
    }

    #[test]
    fn test_row_builder() {
        let r = row(["a", "b"]);
        assert_eq!(r, vec![CellValue::from("a"), CellValue::from("b")]);
    }
}
