//! Export letterhead settings
//!
//! The settings record is a singleton document owned by the host. It is
//! stored as TOML:
//!
//! ```toml
//! enabled = true
//! template = """
//! {{ company }}
//! {{ report_name or doctype }} | {{ date }}
//! """
//! font_name = "Calibri"
//! font_size = 12
//! add_printed_by = true
//! ```

use crate::error::{LetterheadError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Smallest font size Excel accepts (points)
pub const MIN_FONT_SIZE: u16 = 1;
/// Largest font size Excel accepts (points)
pub const MAX_FONT_SIZE: u16 = 409;
/// Font size used when none is configured
pub const DEFAULT_FONT_SIZE: u16 = 11;

/// Fonts an administrator can pick for exports
#[derive(Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Debug, Default)]
#[serde(try_from = "String", into = "String")]
pub enum FontName {
    #[default]
    Arial,
    Calibri,
    Cambria,
    CourierNew,
    Georgia,
    Helvetica,
    SegoeUi,
    Tahoma,
    TimesNewRoman,
    TrebuchetMs,
    Verdana,
}

impl FontName {
    pub fn name(&self) -> &'static str {
        match self {
            FontName::Arial => "Arial",
            FontName::Calibri => "Calibri",
            FontName::Cambria => "Cambria",
            FontName::CourierNew => "Courier New",
            FontName::Georgia => "Georgia",
            FontName::Helvetica => "Helvetica",
            FontName::SegoeUi => "Segoe UI",
            FontName::Tahoma => "Tahoma",
            FontName::TimesNewRoman => "Times New Roman",
            FontName::TrebuchetMs => "Trebuchet MS",
            FontName::Verdana => "Verdana",
        }
    }

    pub fn all() -> &'static [FontName] {
        &[
            FontName::Arial,
            FontName::Calibri,
            FontName::Cambria,
            FontName::CourierNew,
            FontName::Georgia,
            FontName::Helvetica,
            FontName::SegoeUi,
            FontName::Tahoma,
            FontName::TimesNewRoman,
            FontName::TrebuchetMs,
            FontName::Verdana,
        ]
    }
}

impl fmt::Display for FontName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for FontName {
    type Err = LetterheadError;

    /// Parse a font name, ignoring case, surrounding whitespace and any
    /// character Excel would not accept in a font name.
    fn from_str(s: &str) -> Result<Self> {
        let cleaned: String = s
            .chars()
            .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | ' '))
            .collect();
        let normalized = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

        FontName::all()
            .iter()
            .copied()
            .find(|font| font.name().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| LetterheadError::InvalidSettings(format!("unknown font '{}'", s.trim())))
    }
}

impl TryFrom<String> for FontName {
    type Error = LetterheadError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<FontName> for String {
    fn from(font: FontName) -> Self {
        font.name().to_string()
    }
}

/// Font name and size applied to every cell of a spreadsheet export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontDirective {
    pub name: FontName,
    pub size: u16,
}

impl FontDirective {
    /// Create a directive, clamping the size into the range Excel accepts
    pub fn new(name: FontName, size: u16) -> Self {
        let clamped = size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        if clamped != size {
            log::warn!(
                "font size {} outside {}..={}, using {}",
                size,
                MIN_FONT_SIZE,
                MAX_FONT_SIZE,
                clamped
            );
        }
        FontDirective {
            name,
            size: clamped,
        }
    }
}

impl Default for FontDirective {
    fn default() -> Self {
        FontDirective {
            name: FontName::Arial,
            size: DEFAULT_FONT_SIZE,
        }
    }
}

/// Export letterhead settings record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportLetterheadSettings {
    #[serde(default)]
    pub enabled: bool,
    /// Jinja template, one output line per letterhead row
    #[serde(default, alias = "letterhead_template")]
    pub template: String,
    #[serde(default)]
    pub font_name: FontName,
    #[serde(default = "default_font_size")]
    pub font_size: u16,
    #[serde(default = "default_add_printed_by")]
    pub add_printed_by: bool,
}

fn default_font_size() -> u16 {
    DEFAULT_FONT_SIZE
}

fn default_add_printed_by() -> bool {
    true
}

impl Default for ExportLetterheadSettings {
    fn default() -> Self {
        ExportLetterheadSettings {
            enabled: false,
            template: String::new(),
            font_name: FontName::default(),
            font_size: DEFAULT_FONT_SIZE,
            add_printed_by: true,
        }
    }
}

impl ExportLetterheadSettings {
    /// Enabled settings with the given template and default font
    pub fn with_template(template: impl Into<String>) -> Self {
        ExportLetterheadSettings {
            enabled: true,
            template: template.into(),
            ..Default::default()
        }
    }

    /// Parse and validate a TOML settings document
    ///
    /// An unknown font name is reported as `InvalidSettings`, like any other
    /// rejected value; malformed documents are `ConfigError`.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let table: toml::Table = content.parse()?;
        if let Some(toml::Value::String(font_name)) = table.get("font_name") {
            font_name.parse::<FontName>()?;
        }
        let settings: ExportLetterheadSettings = toml::Value::Table(table).try_into()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate and write settings to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.validate()?;
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the settings form would not accept
    pub fn validate(&self) -> Result<()> {
        if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&self.font_size) {
            return Err(LetterheadError::InvalidSettings(format!(
                "font size {} must be between {} and {}",
                self.font_size, MIN_FONT_SIZE, MAX_FONT_SIZE
            )));
        }
        Ok(())
    }

    /// True when exports should be modified at all
    pub fn is_active(&self) -> bool {
        self.enabled && !self.template.trim().is_empty()
    }

    pub fn font_directive(&self) -> FontDirective {
        FontDirective::new(self.font_name, self.font_size)
    }
}

/// Where the exporter reads its settings from
///
/// Caching and invalidation belong to the implementor.
pub trait SettingsSource {
    fn get_export_settings(&self) -> Result<ExportLetterheadSettings>;
}

impl SettingsSource for ExportLetterheadSettings {
    fn get_export_settings(&self) -> Result<ExportLetterheadSettings> {
        Ok(self.clone())
    }
}

impl<T: SettingsSource + ?Sized> SettingsSource for &T {
    fn get_export_settings(&self) -> Result<ExportLetterheadSettings> {
        (**self).get_export_settings()
    }
}

/// Settings read from a TOML file on every export
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        SettingsFile {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsSource for SettingsFile {
    fn get_export_settings(&self) -> Result<ExportLetterheadSettings> {
        ExportLetterheadSettings::from_file(&self.path)
    }
}
