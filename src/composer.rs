//! Letterhead composition
//!
//! Turns settings plus a per-export context into the rows to place above the
//! exported data, and the font to apply to the whole sheet.
//!
//! ```
//! use chrono::NaiveDate;
//! use export_letterhead::{compose, ExportLetterheadSettings, TemplateContext};
//!
//! let now = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap().and_hms_opt(9, 0, 0).unwrap();
//! let ctx = TemplateContext::new("Acme", "Sales Invoice", "John Doe", now);
//! let mut settings = ExportLetterheadSettings::with_template("{{ company }} | {{ doctype }}");
//! settings.add_printed_by = false;
//!
//! let letterhead = compose(&settings, &ctx);
//! assert_eq!(letterhead.rows[0].cells(), ["Acme", "Sales Invoice"]);
//! assert!(letterhead.rows[1].is_blank());
//! ```

use crate::context::TemplateContext;
use crate::render::{format_date, format_time, JinjaRenderer, TemplateRenderer};
use crate::settings::{ExportLetterheadSettings, FontDirective};

/// Prefix of the row emitted when the template cannot be rendered
pub const TEMPLATE_ERROR_PREFIX: &str = "Letterhead template error";

/// One letterhead row
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeaderRow(Vec<String>);

impl HeaderRow {
    pub fn new(cells: Vec<String>) -> Self {
        HeaderRow(cells)
    }

    /// Row of `width` empty cells (at least one)
    pub fn blank(width: usize) -> Self {
        HeaderRow(vec![String::new(); width.max(1)])
    }

    /// Split one rendered line into trimmed cells
    ///
    /// Pipe takes precedence over tab; a line with neither is one cell.
    pub fn from_line(line: &str) -> Self {
        let cells = if line.contains('|') {
            line.split('|').map(|c| c.trim().to_string()).collect()
        } else if line.contains('\t') {
            line.split('\t').map(|c| c.trim().to_string()).collect()
        } else {
            vec![line.trim().to_string()]
        };
        HeaderRow(cells)
    }

    pub fn cells(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when every cell is empty
    pub fn is_blank(&self) -> bool {
        self.0.iter().all(|c| c.is_empty())
    }

    pub fn into_cells(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for HeaderRow {
    fn from(cells: Vec<String>) -> Self {
        HeaderRow(cells)
    }
}

/// Result of composing a letterhead
///
/// An empty `rows` with no `font` means the export must be left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Letterhead {
    pub rows: Vec<HeaderRow>,
    pub font: Option<FontDirective>,
}

impl Letterhead {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.font.is_none()
    }
}

/// Width of the blank row between the letterhead and the data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeparatorWidth {
    /// As wide as the widest rendered header row
    #[default]
    WidestHeader,
    /// Fixed number of columns
    Columns(usize),
    /// As wide as the exported data; the exporter resolves this to
    /// `Columns`, elsewhere it behaves like `WidestHeader`
    DataWidth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComposeOptions {
    pub separator_width: SeparatorWidth,
}

/// Composes letterheads with a pluggable template renderer
#[derive(Debug, Default)]
pub struct LetterheadComposer<R = JinjaRenderer> {
    renderer: R,
    options: ComposeOptions,
}

impl LetterheadComposer<JinjaRenderer> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: TemplateRenderer> LetterheadComposer<R> {
    pub fn with_renderer(renderer: R) -> Self {
        LetterheadComposer {
            renderer,
            options: ComposeOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ComposeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> ComposeOptions {
        self.options
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn compose(&self, settings: &ExportLetterheadSettings, ctx: &TemplateContext) -> Letterhead {
        self.compose_with(settings, ctx, self.options)
    }

    /// Compose with per-call options
    pub fn compose_with(
        &self,
        settings: &ExportLetterheadSettings,
        ctx: &TemplateContext,
        options: ComposeOptions,
    ) -> Letterhead {
        if !settings.is_active() {
            return Letterhead::default();
        }

        let mut rows = match self.renderer.render(&settings.template, ctx) {
            Ok(rendered) => split_rows(&rendered),
            Err(err) => {
                log::error!(
                    "failed to render export letterhead for '{}': {}{}",
                    ctx.doctype,
                    err,
                    err.line()
                        .map(|line| format!(" (line {})", line))
                        .unwrap_or_default()
                );
                vec![HeaderRow::new(vec![format!("{}: {}", TEMPLATE_ERROR_PREFIX, err)])]
            }
        };

        if !rows.is_empty() {
            let width = match options.separator_width {
                SeparatorWidth::Columns(n) => n,
                SeparatorWidth::WidestHeader | SeparatorWidth::DataWidth => {
                    rows.iter().map(HeaderRow::len).max().unwrap_or(1)
                }
            };
            rows.push(HeaderRow::blank(width));
        }

        if settings.add_printed_by {
            rows.push(printed_by_row(ctx));
        }

        Letterhead {
            rows,
            font: Some(settings.font_directive()),
        }
    }
}

/// Compose a letterhead with the default Jinja renderer
pub fn compose(settings: &ExportLetterheadSettings, ctx: &TemplateContext) -> Letterhead {
    LetterheadComposer::new().compose(settings, ctx)
}

/// Split rendered text into rows, dropping blank lines
pub fn split_rows(rendered: &str) -> Vec<HeaderRow> {
    rendered
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(HeaderRow::from_line)
        .collect()
}

fn printed_by_row(ctx: &TemplateContext) -> HeaderRow {
    HeaderRow::new(vec![
        format!("Printed by: {}", ctx.user_fullname),
        format!("Date: {}", format_date(ctx.date())),
        format!("Time: {}", format_time(ctx.time())),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use crate::settings::FontName;
    use chrono::NaiveDate;

    fn ctx() -> TemplateContext {
        let now = NaiveDate::from_ymd_opt(2025, 1, 15)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        TemplateContext::new("Acme", "Sales Invoice", "John Doe", now)
    }

    fn settings(template: &str) -> ExportLetterheadSettings {
        ExportLetterheadSettings {
            enabled: true,
            template: template.to_string(),
            font_name: FontName::Calibri,
            font_size: 12,
            add_printed_by: false,
        }
    }

    fn cells(letterhead: &Letterhead) -> Vec<Vec<String>> {
        letterhead
            .rows
            .iter()
            .map(|r| r.cells().to_vec())
            .collect()
    }

    #[test]
    fn test_disabled_is_noop() {
        let mut s = settings("{{ company }}");
        s.enabled = false;
        s.add_printed_by = true;
        let letterhead = compose(&s, &ctx());
        assert!(letterhead.rows.is_empty());
        assert!(letterhead.font.is_none());
        assert!(letterhead.is_empty());
    }

    #[test]
    fn test_blank_template_is_noop() {
        let mut s = settings(" \n \t");
        s.add_printed_by = true;
        assert_eq!(compose(&s, &ctx()), Letterhead::default());
    }

    #[test]
    fn test_single_variable() {
        let letterhead = compose(&settings("{{ company }}"), &ctx());
        assert_eq!(cells(&letterhead), vec![vec!["Acme"], vec![""]]);
        assert_eq!(
            letterhead.font,
            Some(FontDirective {
                name: FontName::Calibri,
                size: 12
            })
        );
    }

    #[test]
    fn test_pipe_split() {
        let letterhead = compose(&settings("{{ company }} | {{ doctype }}"), &ctx());
        assert_eq!(letterhead.rows[0].cells(), ["Acme", "Sales Invoice"]);
        assert_eq!(letterhead.rows[1], HeaderRow::blank(2));
    }

    #[test]
    fn test_tab_split_and_pipe_precedence() {
        assert_eq!(HeaderRow::from_line("a\t b \tc").cells(), ["a", "b", "c"]);
        assert_eq!(HeaderRow::from_line("a\tb | c").cells(), ["a\tb", "c"]);
        assert_eq!(HeaderRow::from_line("  plain  ").cells(), ["plain"]);
    }

    #[test]
    fn test_empty_lines_dropped() {
        let letterhead = compose(&settings("A\n\nB\n   \n"), &ctx());
        assert_eq!(cells(&letterhead), vec![vec!["A"], vec!["B"], vec![""]]);
    }

    #[test]
    fn test_separator_matches_widest_row() {
        let letterhead = compose(&settings("A\nB | C | D\nE | F"), &ctx());
        let separator = &letterhead.rows[3];
        assert!(separator.is_blank());
        assert_eq!(separator.len(), 3);
    }

    #[test]
    fn test_separator_fixed_columns() {
        let composer = LetterheadComposer::new().with_options(ComposeOptions {
            separator_width: SeparatorWidth::Columns(5),
        });
        let letterhead = composer.compose(&settings("A"), &ctx());
        assert_eq!(letterhead.rows[1], HeaderRow::blank(5));

        let letterhead = composer.compose_with(
            &settings("A"),
            &ctx(),
            ComposeOptions {
                separator_width: SeparatorWidth::Columns(0),
            },
        );
        assert_eq!(letterhead.rows[1], HeaderRow::blank(1));
    }

    #[test]
    fn test_printed_by_row_last() {
        let mut s = settings("{{ company }}");
        s.add_printed_by = true;
        let letterhead = compose(&s, &ctx());

        assert_eq!(letterhead.rows.len(), 3);
        assert!(letterhead.rows[1].is_blank());
        let last = letterhead.rows.last().unwrap();
        assert_eq!(
            last.cells(),
            ["Printed by: John Doe", "Date: 2025-01-15", "Time: 14:30:00"]
        );
    }

    #[test]
    fn test_printed_by_ignores_template_format() {
        let mut s = settings("{{ now.strftime('%d.%m.%Y') }}");
        s.add_printed_by = true;
        let letterhead = compose(&s, &ctx());
        assert_eq!(letterhead.rows[0].cells(), ["15.01.2025"]);
        assert_eq!(letterhead.rows[2].cells()[1], "Date: 2025-01-15");
    }

    #[test]
    fn test_template_rendering_to_nothing() {
        let mut s = settings("{% if false %}hidden{% endif %}");
        s.add_printed_by = true;
        let letterhead = compose(&s, &ctx());
        assert_eq!(letterhead.rows.len(), 1);
        assert!(letterhead.rows[0].cells()[0].starts_with("Printed by:"));
        assert!(letterhead.font.is_some());
    }

    #[test]
    fn test_invalid_template_falls_back() {
        for template in ["{% if company %}unterminated", "{{ missing_var }}", "{{ company | nope }}"] {
            let letterhead = compose(&settings(template), &ctx());
            assert_eq!(letterhead.rows.len(), 2, "template: {}", template);
            assert!(letterhead.rows[0].cells()[0].starts_with(TEMPLATE_ERROR_PREFIX));
            assert!(letterhead.rows[1].is_blank());
            assert_eq!(letterhead.font, Some(settings(template).font_directive()));
        }
    }

    #[test]
    fn test_fallback_row_keeps_separator_and_printed_by() {
        let mut s = settings("{{ missing_var }}");
        s.add_printed_by = true;
        let letterhead = compose(&s, &ctx());

        assert_eq!(letterhead.rows.len(), 3);
        assert!(letterhead.rows[0].cells()[0].starts_with(TEMPLATE_ERROR_PREFIX));
        assert_eq!(letterhead.rows[1], HeaderRow::blank(1));
        assert_eq!(
            letterhead.rows[2].cells(),
            ["Printed by: John Doe", "Date: 2025-01-15", "Time: 14:30:00"]
        );
        assert_eq!(letterhead.font, Some(FontDirective::new(FontName::Calibri, 12)));
    }

    #[test]
    fn test_compose_is_idempotent() {
        let mut s = settings("{{ company }} | {{ now }}\n{{ report_name or doctype }}");
        s.add_printed_by = true;
        let c = ctx();
        assert_eq!(compose(&s, &c), compose(&s, &c));
    }

    struct FailingRenderer;

    impl TemplateRenderer for FailingRenderer {
        fn render(&self, _template: &str, _ctx: &TemplateContext) -> Result<String, RenderError> {
            Err(RenderError::new("engine unavailable"))
        }
    }

    struct UppercaseRenderer;

    impl TemplateRenderer for UppercaseRenderer {
        fn render(&self, template: &str, _ctx: &TemplateContext) -> Result<String, RenderError> {
            Ok(template.to_uppercase())
        }
    }

    #[test]
    fn test_custom_renderers() {
        let composer = LetterheadComposer::with_renderer(FailingRenderer);
        let letterhead = composer.compose(&settings("x"), &ctx());
        assert_eq!(
            letterhead.rows[0].cells(),
            ["Letterhead template error: engine unavailable"]
        );

        let composer = LetterheadComposer::with_renderer(UppercaseRenderer);
        let letterhead = composer.compose(&settings("a | b"), &ctx());
        assert_eq!(letterhead.rows[0].cells(), ["A", "B"]);
    }
}
