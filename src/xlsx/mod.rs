//! XLSX output
//!
//! A minimal OOXML writer: sheet XML is streamed into a deflated `zip`
//! archive, so nothing beyond the current row is buffered.

pub mod workbook;
pub mod xml_writer;

pub use workbook::{column_letter, sanitize_sheet_name, XlsxWorkbook};
