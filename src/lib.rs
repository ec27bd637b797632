//! # export-letterhead
//!
//! Configurable letterheads for spreadsheet and CSV exports.
//!
//! ## Features
//!
//! - **Templated header rows**: a Jinja template renders the block placed
//!   above the exported data; `|` or tab splits a line into cells
//! - **Printed-by row**: optional row recording who exported the file and when
//! - **Font directive**: one font name and size applied to every cell of an
//!   XLSX export
//! - **Never breaks an export**: template errors become a single fallback row
//! - **Streaming writers**: XLSX output into any seekable sink, CSV into any `Write`
//!
//! ## Quick Start
//!
//! ### Composing a letterhead
//!
//! ```rust
//! use chrono::NaiveDate;
//! use export_letterhead::{compose, ExportLetterheadSettings, TemplateContext};
//!
//! let now = NaiveDate::from_ymd_opt(2025, 1, 15)
//!     .unwrap()
//!     .and_hms_opt(14, 30, 0)
//!     .unwrap();
//! let ctx = TemplateContext::new("Acme", "Sales Invoice", "John Doe", now);
//! let settings = ExportLetterheadSettings::with_template("{{ company }}\n{{ doctype }} | {{ date }}");
//!
//! let letterhead = compose(&settings, &ctx);
//! assert_eq!(letterhead.rows[0].cells(), ["Acme"]);
//! assert_eq!(letterhead.rows[1].cells(), ["Sales Invoice", "2025-01-15"]);
//! assert!(letterhead.rows[2].is_blank());
//! assert!(letterhead.rows[3].cells()[0].starts_with("Printed by:"));
//! ```
//!
//! ### Exporting with a letterhead
//!
//! ```rust,no_run
//! use export_letterhead::{
//!     CellValue, ExportParams, LetterheadExporter, SessionContext, SettingsFile,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let exporter = LetterheadExporter::new(
//!     SettingsFile::new("export_letterhead.toml"),
//!     SessionContext::new("jdoe@example.com").with_company("Acme"),
//! );
//!
//! let data = vec![
//!     vec![CellValue::from("Invoice"), CellValue::from("Total")],
//!     vec![CellValue::from("INV-001"), CellValue::Float(120.5)],
//! ];
//! let bytes = exporter.export_xlsx(&ExportParams::report_view("Sales Invoice", None), "Invoices", &data)?;
//! std::fs::write("invoices.xlsx", bytes)?;
//! # Ok(())
//! # }
//! ```

pub mod composer;
pub mod context;
pub mod csv_export;
pub mod error;
pub mod export;
pub mod render;
pub mod settings;
pub mod types;
pub mod xlsx;

pub use composer::{
    compose, split_rows, ComposeOptions, HeaderRow, Letterhead, LetterheadComposer,
    SeparatorWidth,
};
pub use context::{
    ContextSource, ExportParams, HostHandle, HostLookup, SessionContext, TemplateContext,
};
pub use csv_export::{CsvExportWriter, CsvParams, CsvQuoting};
pub use error::{LetterheadError, RenderError, Result};
pub use export::LetterheadExporter;
pub use render::{JinjaRenderer, TemplateRenderer};
pub use settings::{
    ExportLetterheadSettings, FontDirective, FontName, SettingsFile, SettingsSource,
};
pub use types::CellValue;
pub use xlsx::XlsxWorkbook;
