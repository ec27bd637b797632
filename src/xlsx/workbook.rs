//! XLSX workbook that streams sheet XML straight into a deflated ZIP archive
//!
//! Every cell uses the workbook's default font, so a [`FontDirective`]
//! becomes font 0 of `styles.xml` and applies to letterhead and data rows
//! alike.

use super::xml_writer::XmlWriter;
use crate::error::{LetterheadError, Result};
use crate::settings::FontDirective;
use crate::types::CellValue;
use std::io::{Cursor, Seek, Write};
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

/// Excel sheet name maximum length
pub const MAX_SHEET_NAME_LEN: usize = 31;
/// Characters not allowed in sheet names
pub const ILLEGAL_SHEET_CHARS: [char; 7] = ['*', ':', '?', '/', '\\', '[', ']'];
/// Excel worksheet maximum row count
pub const MAX_ROWS: u32 = 1_048_576;

const DEFAULT_FONT_NAME: &str = "Calibri";
const DEFAULT_FONT_SIZE: u16 = 11;
const COMPRESSION_LEVEL: i64 = 6;

/// Make a string acceptable as a worksheet name
pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if ILLEGAL_SHEET_CHARS.contains(&c) { '_' } else { c })
        .take(MAX_SHEET_NAME_LEN)
        .collect();
    let cleaned = cleaned.trim_matches('\'').trim().to_string();
    if cleaned.is_empty() {
        "Sheet1".to_string()
    } else {
        cleaned
    }
}

/// Streaming XLSX workbook over any seekable sink
pub struct XlsxWorkbook<W: Write + Seek> {
    zip: ZipWriter<W>,
    options: SimpleFileOptions,
    font: Option<FontDirective>,
    worksheets: Vec<String>,
    current_row: u32,
    xml_buffer: Vec<u8>,
    in_worksheet: bool,
}

impl XlsxWorkbook<Cursor<Vec<u8>>> {
    /// Workbook collected into memory
    pub fn in_memory(font: Option<FontDirective>) -> Self {
        Self::new(Cursor::new(Vec::with_capacity(16 * 1024)), font)
    }

    /// Finish the in-memory workbook and return the archive bytes
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        Ok(self.close()?.into_inner())
    }
}

impl<W: Write + Seek> XlsxWorkbook<W> {
    pub fn new(output: W, font: Option<FontDirective>) -> Self {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(COMPRESSION_LEVEL))
            .last_modified_time(zip::DateTime::default());
        XlsxWorkbook {
            zip: ZipWriter::new(output),
            options,
            font,
            worksheets: Vec::new(),
            current_row: 0,
            xml_buffer: Vec::with_capacity(4096),
            in_worksheet: false,
        }
    }

    /// Start a new worksheet; the name is sanitized and de-duplicated
    pub fn add_worksheet(&mut self, name: &str) -> Result<()> {
        self.finish_current_worksheet()?;

        let mut sheet_name = sanitize_sheet_name(name);
        let base = sheet_name.clone();
        let mut suffix = 2;
        while self
            .worksheets
            .iter()
            .any(|existing| existing.eq_ignore_ascii_case(&sheet_name))
        {
            let tail = format!(" ({})", suffix);
            let keep = MAX_SHEET_NAME_LEN.saturating_sub(tail.chars().count());
            sheet_name = base.chars().take(keep).collect::<String>() + &tail;
            suffix += 1;
        }

        self.worksheets.push(sheet_name);
        self.current_row = 0;

        let entry_name = format!("xl/worksheets/sheet{}.xml", self.worksheets.len());
        self.zip.start_file(entry_name, self.options)?;

        let header = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheetData>"#;
        self.zip.write_all(header.as_bytes())?;
        self.in_worksheet = true;

        Ok(())
    }

    /// Write a row of typed cells to the current worksheet
    pub fn write_row(&mut self, cells: &[CellValue]) -> Result<()> {
        if !self.in_worksheet {
            return Err(LetterheadError::WriteError(
                "No worksheet started".to_string(),
            ));
        }
        if self.current_row >= MAX_ROWS {
            return Err(LetterheadError::WriteRowError {
                row: self.current_row + 1,
                sheet: self.current_sheet_name().to_string(),
                source: Box::new(LetterheadError::WriteError(format!(
                    "worksheet is limited to {} rows",
                    MAX_ROWS
                ))),
            });
        }

        self.current_row += 1;
        let row_num = self.current_row;

        self.xml_buffer.clear();
        {
            let mut xml = XmlWriter::new(&mut self.xml_buffer);
            xml.start_element("row")?;
            xml.attribute_int("r", row_num)?;
            xml.close_start_tag()?;

            for (col_idx, value) in cells.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                let cell_ref = format!("{}{}", column_letter(col_idx as u32 + 1), row_num);
                write_cell(&mut xml, &cell_ref, value)?;
            }

            xml.end_element("row")?;
            xml.flush()?;
        }

        self.zip.write_all(&self.xml_buffer)?;
        Ok(())
    }

    /// Write several rows
    pub fn write_rows<'a, I>(&mut self, rows: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Vec<CellValue>>,
    {
        for row in rows {
            self.write_row(row)?;
        }
        Ok(())
    }

    /// Row number of the last written row (1-based, 0 before the first row)
    pub fn current_row(&self) -> u32 {
        self.current_row
    }

    fn current_sheet_name(&self) -> &str {
        self.worksheets.last().map(String::as_str).unwrap_or("")
    }

    fn finish_current_worksheet(&mut self) -> Result<()> {
        if self.in_worksheet {
            self.zip.write_all(b"</sheetData></worksheet>")?;
            self.in_worksheet = false;
        }
        Ok(())
    }

    /// Finish the workbook and return the sink
    pub fn close(mut self) -> Result<W> {
        if self.worksheets.is_empty() {
            self.add_worksheet("Sheet1")?;
        }
        self.finish_current_worksheet()?;

        self.write_content_types()?;
        self.write_rels()?;
        self.write_workbook()?;
        self.write_workbook_rels()?;
        self.write_styles()?;
        self.write_app_props()?;
        self.write_core_props()?;

        Ok(self.zip.finish()?)
    }

    fn write_content_types(&mut self) -> Result<()> {
        self.zip.start_file("[Content_Types].xml", self.options)?;
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>"#,
        );

        for i in 1..=self.worksheets.len() {
            xml.push_str(&format!(
                r#"
<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                i
            ));
        }

        xml.push_str("\n</Types>");
        self.zip.write_all(xml.as_bytes())?;
        Ok(())
    }

    fn write_rels(&mut self) -> Result<()> {
        self.zip.start_file("_rels/.rels", self.options)?;
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#;
        self.zip.write_all(xml.as_bytes())?;
        Ok(())
    }

    fn write_workbook(&mut self) -> Result<()> {
        self.zip.start_file("xl/workbook.xml", self.options)?;

        let mut buffer = Vec::with_capacity(1024);
        {
            let mut xml = XmlWriter::new(&mut buffer);
            xml.write_str(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets>"#,
            )?;
            for (i, name) in self.worksheets.iter().enumerate() {
                xml.start_element("sheet")?;
                xml.attribute("name", name)?;
                xml.attribute_int("sheetId", i + 1)?;
                xml.attribute("r:id", &format!("rId{}", i + 1))?;
                xml.close_empty_tag()?;
            }
            xml.write_str("</sheets>\n</workbook>")?;
            xml.flush()?;
        }
        self.zip.write_all(&buffer)?;
        Ok(())
    }

    fn write_workbook_rels(&mut self) -> Result<()> {
        self.zip.start_file("xl/_rels/workbook.xml.rels", self.options)?;
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );

        let sheet_count = self.worksheets.len();
        for i in 1..=sheet_count {
            xml.push_str(&format!(
                r#"
<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                i, i
            ));
        }

        xml.push_str(&format!(
            r#"
<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#,
            sheet_count + 1
        ));

        self.zip.write_all(xml.as_bytes())?;
        Ok(())
    }

    fn write_styles(&mut self) -> Result<()> {
        self.zip.start_file("xl/styles.xml", self.options)?;

        let (font_name, font_size) = match self.font {
            Some(font) => (font.name.name(), font.size),
            None => (DEFAULT_FONT_NAME, DEFAULT_FONT_SIZE),
        };

        let mut buffer = Vec::with_capacity(1024);
        {
            let mut xml = XmlWriter::new(&mut buffer);
            xml.write_str(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<fonts count="1">
<font>"#,
            )?;
            xml.start_element("sz")?;
            xml.attribute_int("val", font_size)?;
            xml.close_empty_tag()?;
            xml.start_element("name")?;
            xml.attribute("val", font_name)?;
            xml.close_empty_tag()?;
            xml.write_str(
                r#"</font>
</fonts>
<fills count="2">
<fill><patternFill patternType="none"/></fill>
<fill><patternFill patternType="gray125"/></fill>
</fills>
<borders count="1">
<border><left/><right/><top/><bottom/><diagonal/></border>
</borders>
<cellStyleXfs count="1">
<xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
</cellStyleXfs>
<cellXfs count="1">
<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0" applyFont="1"/>
</cellXfs>
<cellStyles count="1">
<cellStyle name="Normal" xfId="0" builtinId="0"/>
</cellStyles>
</styleSheet>"#,
            )?;
            xml.flush()?;
        }
        self.zip.write_all(&buffer)?;
        Ok(())
    }

    fn write_app_props(&mut self) -> Result<()> {
        self.zip.start_file("docProps/app.xml", self.options)?;
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">
<Application>export-letterhead</Application>
</Properties>"#;
        self.zip.write_all(xml.as_bytes())?;
        Ok(())
    }

    fn write_core_props(&mut self) -> Result<()> {
        self.zip.start_file("docProps/core.xml", self.options)?;
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
<dc:creator>export-letterhead</dc:creator>
</cp:coreProperties>"#;
        self.zip.write_all(xml.as_bytes())?;
        Ok(())
    }
}

fn write_cell<W: Write>(xml: &mut XmlWriter<W>, cell_ref: &str, value: &CellValue) -> Result<()> {
    xml.start_element("c")?;
    xml.attribute("r", cell_ref)?;

    match value {
        CellValue::Int(i) => {
            xml.write_str(" t=\"n\"><v>")?;
            xml.write_int(*i)?;
            xml.write_str("</v></c>")?;
        }
        CellValue::Float(f) if f.is_finite() => {
            xml.write_str(" t=\"n\"><v>")?;
            xml.write_str(&f.to_string())?;
            xml.write_str("</v></c>")?;
        }
        CellValue::Bool(b) => {
            xml.write_str(" t=\"b\"><v>")?;
            xml.write_str(if *b { "1" } else { "0" })?;
            xml.write_str("</v></c>")?;
        }
        other => {
            let text = other.as_string();
            xml.write_str(" t=\"inlineStr\"><is>")?;
            if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
                xml.write_str("<t xml:space=\"preserve\">")?;
            } else {
                xml.write_str("<t>")?;
            }
            xml.write_escaped(&text)?;
            xml.write_str("</t></is></c>")?;
        }
    }
    Ok(())
}

/// Convert a 1-based column number to its letter (1 -> A, 27 -> AA)
pub fn column_letter(mut n: u32) -> String {
    let mut letters = Vec::with_capacity(3);
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.iter().rev().map(|&b| b as char).collect()
}
