//! Export pipeline: settings, context, compose, write
//!
//! The exporter reads its settings on every call, builds the request
//! context, composes the letterhead and writes it above the caller's data.
//! With the feature disabled the output is byte-for-byte what a plain export
//! of the same data produces.

use crate::composer::{ComposeOptions, Letterhead, LetterheadComposer, SeparatorWidth};
use crate::context::{ContextSource, ExportParams};
use crate::csv_export::{CsvExportWriter, CsvParams};
use crate::error::Result;
use crate::render::{JinjaRenderer, TemplateRenderer};
use crate::settings::SettingsSource;
use crate::types::CellValue;
use crate::xlsx::XlsxWorkbook;
use std::io::{Cursor, Seek, Write};

/// Wraps spreadsheet and CSV exports with the configured letterhead
#[derive(Debug)]
pub struct LetterheadExporter<S, C, R = JinjaRenderer> {
    settings: S,
    context: C,
    composer: LetterheadComposer<R>,
}

impl<S: SettingsSource, C: ContextSource> LetterheadExporter<S, C, JinjaRenderer> {
    pub fn new(settings: S, context: C) -> Self {
        Self::with_renderer(settings, context, JinjaRenderer::new())
    }
}

impl<S: SettingsSource, C: ContextSource, R: TemplateRenderer> LetterheadExporter<S, C, R> {
    pub fn with_renderer(settings: S, context: C, renderer: R) -> Self {
        LetterheadExporter {
            settings,
            context,
            composer: LetterheadComposer::with_renderer(renderer),
        }
    }

    pub fn with_options(mut self, options: ComposeOptions) -> Self {
        self.composer = self.composer.with_options(options);
        self
    }

    pub fn settings_source(&self) -> &S {
        &self.settings
    }

    pub fn context_source(&self) -> &C {
        &self.context
    }

    pub fn composer(&self) -> &LetterheadComposer<R> {
        &self.composer
    }

    /// Compose the letterhead for one export request
    ///
    /// `data_columns` is the width of the exported table, used when the
    /// separator is configured as [`SeparatorWidth::DataWidth`]. Settings that
    /// cannot be read disable the letterhead for this request.
    pub fn letterhead(&self, params: &ExportParams, data_columns: Option<usize>) -> Letterhead {
        let settings = match self.settings.get_export_settings() {
            Ok(settings) => settings,
            Err(err) => {
                log::debug!("export letterhead settings unavailable: {}", err);
                return Letterhead::default();
            }
        };
        if !settings.is_active() {
            return Letterhead::default();
        }

        let mut options = self.composer.options();
        if options.separator_width == SeparatorWidth::DataWidth {
            if let Some(columns) = data_columns.filter(|&n| n > 0) {
                options.separator_width = SeparatorWidth::Columns(columns);
            }
        }

        let ctx = self
            .context
            .get_export_context(params.doctype(), params.report_name());
        self.composer.compose_with(&settings, &ctx, options)
    }

    /// Export `data` as an XLSX workbook with the letterhead on top
    pub fn export_xlsx(
        &self,
        params: &ExportParams,
        sheet_name: &str,
        data: &[Vec<CellValue>],
    ) -> Result<Vec<u8>> {
        let output = Cursor::new(Vec::with_capacity(16 * 1024));
        Ok(self.write_xlsx(params, sheet_name, data, output)?.into_inner())
    }

    /// Stream the XLSX export into `output` and return it
    pub fn write_xlsx<W: Write + Seek>(
        &self,
        params: &ExportParams,
        sheet_name: &str,
        data: &[Vec<CellValue>],
        output: W,
    ) -> Result<W> {
        let params = params.clone().or_fallback(sheet_name);
        let letterhead = self.letterhead(&params, data_width(data));

        let mut workbook = XlsxWorkbook::new(output, letterhead.font);
        workbook.add_worksheet(sheet_name)?;
        for row in &letterhead.rows {
            workbook.write_row(&Vec::<CellValue>::from(row))?;
        }
        workbook.write_rows(data)?;
        workbook.close()
    }

    /// Export `data` as CSV with the letterhead rows on top
    pub fn export_csv(
        &self,
        params: &ExportParams,
        data: &[Vec<CellValue>],
        csv_params: CsvParams,
    ) -> Result<Vec<u8>> {
        self.write_csv(params, data, csv_params, Vec::new())
    }

    /// Stream the CSV export into `output` and return it
    pub fn write_csv<W: Write>(
        &self,
        params: &ExportParams,
        data: &[Vec<CellValue>],
        csv_params: CsvParams,
        output: W,
    ) -> Result<W> {
        let letterhead = self.letterhead(params, data_width(data));

        let mut writer = CsvExportWriter::new(output, csv_params);
        writer.write_letterhead(&letterhead)?;
        for row in data {
            writer.write_row(row)?;
        }
        writer.into_inner()
    }
}

fn data_width(data: &[Vec<CellValue>]) -> Option<usize> {
    data.iter().map(Vec::len).max()
}
