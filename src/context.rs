//! Per-export template context
//!
//! A [`TemplateContext`] is built fresh for every export request from the
//! request parameters and the current session. It is never persisted.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Name used when an export carries neither a doctype nor a report name
pub const FALLBACK_DOCTYPE: &str = "Export";
/// Report name used for query reports that do not identify themselves
pub const FALLBACK_REPORT_NAME: &str = "Query Report";

const DOCTYPE_KEYS: &[&str] = &["doctype", "ref_doctype", "data_doctype"];
const REPORT_NAME_KEYS: &[&str] = &["report_name", "report", "title"];

/// Host-specific lookups available to templates as `host.lookup(key, ...)`
///
/// Returning `None` renders as an empty value.
pub trait HostLookup: Send + Sync {
    fn lookup(&self, key: &str, args: &[String]) -> Option<String>;
}

/// Shared handle to a [`HostLookup`] implementation
#[derive(Clone)]
pub struct HostHandle(Arc<dyn HostLookup>);

impl HostHandle {
    pub fn new<H: HostLookup + 'static>(lookup: H) -> Self {
        HostHandle(Arc::new(lookup))
    }

    pub fn lookup(&self, key: &str, args: &[String]) -> Option<String> {
        self.0.lookup(key, args)
    }
}

impl fmt::Debug for HostHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HostHandle")
    }
}

/// Values a letterhead template can reference
#[derive(Debug, Clone)]
pub struct TemplateContext {
    pub company: String,
    pub doctype: String,
    pub report_name: Option<String>,
    pub user_fullname: String,
    pub now: NaiveDateTime,
    pub host: Option<HostHandle>,
}

impl TemplateContext {
    pub fn new(
        company: impl Into<String>,
        doctype: impl Into<String>,
        user_fullname: impl Into<String>,
        now: NaiveDateTime,
    ) -> Self {
        TemplateContext {
            company: company.into(),
            doctype: doctype.into(),
            report_name: None,
            user_fullname: user_fullname.into(),
            now,
            host: None,
        }
    }

    pub fn with_report_name(mut self, report_name: impl Into<String>) -> Self {
        self.report_name = Some(report_name.into());
        self
    }

    pub fn with_host(mut self, host: HostHandle) -> Self {
        self.host = Some(host);
        self
    }

    pub fn date(&self) -> NaiveDate {
        self.now.date()
    }

    pub fn time(&self) -> NaiveTime {
        self.now.time()
    }
}

/// Doctype and report name of one export request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportParams {
    pub doctype: Option<String>,
    pub report_name: Option<String>,
}

impl ExportParams {
    /// Build params, treating blank values as missing
    ///
    /// When only one of the two is known the other falls back to it.
    pub fn new(doctype: Option<&str>, report_name: Option<&str>) -> Self {
        let doctype = non_blank(doctype);
        let report_name = non_blank(report_name);

        match (doctype, report_name) {
            (Some(d), None) => ExportParams {
                report_name: Some(d.clone()),
                doctype: Some(d),
            },
            (None, Some(r)) => ExportParams {
                doctype: Some(r.clone()),
                report_name: Some(r),
            },
            (doctype, report_name) => ExportParams {
                doctype,
                report_name,
            },
        }
    }

    /// Resolve params from a host form dictionary
    ///
    /// Doctype is read from `doctype`, `ref_doctype` or `data_doctype`;
    /// report name from `report_name`, `report` or `title`. The first
    /// non-blank value wins.
    pub fn from_form(form: &IndexMap<String, String>) -> Self {
        Self::new(
            first_value(form, DOCTYPE_KEYS),
            first_value(form, REPORT_NAME_KEYS),
        )
    }

    /// Params for a query report export
    ///
    /// The doctype is the report's reference doctype when it has one.
    pub fn query_report(report_name: Option<&str>, ref_doctype: Option<&str>) -> Self {
        let report_name = non_blank(report_name).unwrap_or_else(|| FALLBACK_REPORT_NAME.to_string());
        let doctype = non_blank(ref_doctype).unwrap_or_else(|| report_name.clone());
        ExportParams {
            doctype: Some(doctype),
            report_name: Some(report_name),
        }
    }

    /// Params for a list/report view export of `doctype`
    pub fn report_view(doctype: &str, label: Option<&str>) -> Self {
        Self::new(Some(doctype), non_blank(label).as_deref().or(Some(doctype)))
    }

    /// Use `name` (typically the file or sheet name) when nothing else is known
    pub fn or_fallback(self, name: &str) -> Self {
        if self.doctype.is_some() || self.report_name.is_some() {
            self
        } else {
            Self::new(Some(name), Some(name))
        }
    }

    pub fn doctype(&self) -> Option<&str> {
        self.doctype.as_deref()
    }

    pub fn report_name(&self) -> Option<&str> {
        self.report_name.as_deref()
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn first_value<'a>(form: &'a IndexMap<String, String>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| form.get(*key))
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
}

/// Where the exporter gets its per-request context from
pub trait ContextSource {
    fn get_export_context(&self, doctype: Option<&str>, report_name: Option<&str>) -> TemplateContext;
}

impl<T: ContextSource + ?Sized> ContextSource for &T {
    fn get_export_context(&self, doctype: Option<&str>, report_name: Option<&str>) -> TemplateContext {
        (**self).get_export_context(doctype, report_name)
    }
}

/// Context built from the exporting user's session
///
/// `now` is read from the local clock unless pinned with [`SessionContext::at`].
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    user: String,
    user_fullname: Option<String>,
    company: String,
    now: Option<NaiveDateTime>,
    host: Option<HostHandle>,
}

impl SessionContext {
    pub fn new(user: impl Into<String>) -> Self {
        SessionContext {
            user: user.into(),
            ..Default::default()
        }
    }

    pub fn with_user_fullname(mut self, fullname: impl Into<String>) -> Self {
        self.user_fullname = Some(fullname.into());
        self
    }

    /// Default company of the user
    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = company.into();
        self
    }

    pub fn with_host<H: HostLookup + 'static>(mut self, lookup: H) -> Self {
        self.host = Some(HostHandle::new(lookup));
        self
    }

    pub fn at(mut self, now: NaiveDateTime) -> Self {
        self.now = Some(now);
        self
    }

    fn display_name(&self) -> &str {
        self.user_fullname
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.user)
    }
}

impl ContextSource for SessionContext {
    fn get_export_context(&self, doctype: Option<&str>, report_name: Option<&str>) -> TemplateContext {
        let params = ExportParams::new(doctype, report_name);
        let now = self
            .now
            .unwrap_or_else(|| chrono::Local::now().naive_local());

        TemplateContext {
            company: self.company.clone(),
            doctype: params
                .doctype
                .unwrap_or_else(|| FALLBACK_DOCTYPE.to_string()),
            report_name: params.report_name,
            user_fullname: self.display_name().to_string(),
            now,
            host: self.host.clone(),
        }
    }
}
