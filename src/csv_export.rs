//! CSV output with letterhead rows on top
//!
//! Letterhead rows are usually narrower than the data, so the underlying
//! writer is built with flexible record lengths. Fonts have no meaning in
//! CSV and are ignored.

use crate::composer::{HeaderRow, Letterhead};
use crate::error::{LetterheadError, Result};
use crate::types::CellValue;
use std::io::{self, Write};

/// Quoting style for CSV fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CsvQuoting {
    /// Quote only fields that need it
    #[default]
    Minimal,
    /// Quote every field
    All,
    /// Quote every field that is not a number
    NonNumeric,
    /// Never quote
    Never,
}

impl From<CsvQuoting> for csv::QuoteStyle {
    fn from(quoting: CsvQuoting) -> Self {
        match quoting {
            CsvQuoting::Minimal => csv::QuoteStyle::Necessary,
            CsvQuoting::All => csv::QuoteStyle::Always,
            CsvQuoting::NonNumeric => csv::QuoteStyle::NonNumeric,
            CsvQuoting::Never => csv::QuoteStyle::Never,
        }
    }
}

/// Delimiter and quoting for a CSV export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvParams {
    pub delimiter: u8,
    pub quoting: CsvQuoting,
}

impl Default for CsvParams {
    fn default() -> Self {
        CsvParams {
            delimiter: b',',
            quoting: CsvQuoting::Minimal,
        }
    }
}

impl CsvParams {
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_quoting(mut self, quoting: CsvQuoting) -> Self {
        self.quoting = quoting;
        self
    }
}

/// CSV writer for letterhead and data rows
pub struct CsvExportWriter<W: Write> {
    writer: csv::Writer<W>,
    rows_written: u64,
}

impl CsvExportWriter<Vec<u8>> {
    pub fn in_memory(params: CsvParams) -> Self {
        Self::new(Vec::new(), params)
    }
}

impl<W: Write> CsvExportWriter<W> {
    pub fn new(output: W, params: CsvParams) -> Self {
        let writer = csv::WriterBuilder::new()
            .delimiter(params.delimiter)
            .quote_style(params.quoting.into())
            .flexible(true)
            .from_writer(output);
        CsvExportWriter {
            writer,
            rows_written: 0,
        }
    }

    /// Write every letterhead row, in order
    pub fn write_letterhead(&mut self, letterhead: &Letterhead) -> Result<()> {
        for row in &letterhead.rows {
            self.write_header_row(row)?;
        }
        Ok(())
    }

    pub fn write_header_row(&mut self, row: &HeaderRow) -> Result<()> {
        self.writer.write_record(row.cells())?;
        self.rows_written += 1;
        Ok(())
    }

    /// Write one data row; empty cells become empty fields
    pub fn write_row(&mut self, cells: &[CellValue]) -> Result<()> {
        self.writer
            .write_record(cells.iter().map(CellValue::as_string))?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Flush and hand back the sink
    pub fn into_inner(self) -> Result<W> {
        self.writer.into_inner().map_err(|err| {
            LetterheadError::IoError(io::Error::new(err.error().kind(), err.error().to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::row;

    fn letterhead() -> Letterhead {
        Letterhead {
            rows: vec![
                HeaderRow::new(vec!["Acme, Inc.".to_string(), "Invoices".to_string()]),
                HeaderRow::blank(2),
            ],
            font: None,
        }
    }

    fn written(writer: CsvExportWriter<Vec<u8>>) -> String {
        String::from_utf8(writer.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_letterhead_then_data() {
        let mut writer = CsvExportWriter::in_memory(CsvParams::default());
        writer.write_letterhead(&letterhead()).unwrap();
        writer
            .write_row(&[CellValue::from("INV-1"), CellValue::Int(3), CellValue::Float(9.5)])
            .unwrap();
        assert_eq!(writer.rows_written(), 3);

        assert_eq!(written(writer), "\"Acme, Inc.\",Invoices\n,\nINV-1,3,9.5\n");
    }

    #[test]
    fn test_delimiter_and_quoting() {
        let params = CsvParams::default()
            .with_delimiter(b';')
            .with_quoting(CsvQuoting::All);
        let mut writer = CsvExportWriter::in_memory(params);
        writer.write_row(&row(["a", "b"])).unwrap();
        assert_eq!(written(writer), "\"a\";\"b\"\n");
    }

    #[test]
    fn test_non_numeric_quoting() {
        let params = CsvParams::default().with_quoting(CsvQuoting::NonNumeric);
        let mut writer = CsvExportWriter::in_memory(params);
        writer
            .write_row(&[CellValue::from("x"), CellValue::Int(1)])
            .unwrap();
        assert_eq!(written(writer), "\"x\",1\n");
    }

    #[test]
    fn test_rows_of_different_widths() {
        let mut writer = CsvExportWriter::in_memory(CsvParams::default());
        writer.write_header_row(&HeaderRow::from_line("Title")).unwrap();
        writer.write_row(&row(["a", "b", "c"])).unwrap();
        assert_eq!(written(writer), "Title\na,b,c\n");
    }
}
