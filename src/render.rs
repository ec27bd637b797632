//! Template rendering
//!
//! The composer only needs "turn this template text and context into text";
//! [`TemplateRenderer`] is that seam. [`JinjaRenderer`] is the default
//! implementation on top of minijinja.
//!
//! Variables available to templates:
//!
//! | name | value |
//! |---|---|
//! | `company` | company of the exporting user |
//! | `doctype` | document type being exported |
//! | `report_name` | report title, or none |
//! | `user_fullname` | full name of the exporting user |
//! | `date`, `time`, `now` | export timestamp, with `strftime(format)` |
//! | `host` | host lookups: `host.lookup(key, ...)` |

use crate::context::{HostHandle, TemplateContext};
use crate::error::RenderError;
use chrono::format::{Item, StrftimeItems};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use minijinja::value::{from_args, Object, ObjectRepr, Value};
use minijinja::{context, AutoEscape, Environment, Error, ErrorKind, State, UndefinedBehavior};
use std::fmt::{self, Write};
use std::sync::Arc;

/// Default `str()` form of the date/time variables
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Renders letterhead template text against a context
pub trait TemplateRenderer {
    fn render(&self, template: &str, context: &TemplateContext) -> Result<String, RenderError>;
}

impl<T: TemplateRenderer + ?Sized> TemplateRenderer for &T {
    fn render(&self, template: &str, context: &TemplateContext) -> Result<String, RenderError> {
        (**self).render(template, context)
    }
}

/// Jinja renderer backed by minijinja
///
/// Undefined variables are errors unless guarded with `default` or
/// `is defined`. `none` values print as nothing.
pub struct JinjaRenderer {
    env: Environment<'static>,
}

impl JinjaRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_formatter(|out, state, value| {
            if value.is_none() {
                Ok(())
            } else {
                minijinja::escape_formatter(out, state, value)
            }
        });
        JinjaRenderer { env }
    }
}

impl Default for JinjaRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for JinjaRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JinjaRenderer").finish_non_exhaustive()
    }
}

impl TemplateRenderer for JinjaRenderer {
    fn render(&self, template: &str, ctx: &TemplateContext) -> Result<String, RenderError> {
        let values = context! {
            company => ctx.company.as_str(),
            doctype => ctx.doctype.as_str(),
            report_name => ctx.report_name.as_deref(),
            user_fullname => ctx.user_fullname.as_str(),
            date => Value::from_object(Moment::Date(ctx.date())),
            time => Value::from_object(Moment::Time(ctx.time())),
            now => Value::from_object(Moment::DateTime(ctx.now)),
            host => Value::from_object(HostObject(ctx.host.clone())),
        };
        Ok(self.env.render_str(template, values)?)
    }
}

/// Format with a strftime pattern without panicking on bad patterns
fn strftime<T>(value: &T, pattern: &str) -> Result<String, RenderError>
where
    T: FormatItems,
{
    let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(RenderError::new(format!(
            "invalid strftime format '{}'",
            pattern
        )));
    }

    let mut out = String::new();
    value
        .write_items(&mut out, &items)
        .map_err(|_| RenderError::new(format!("format '{}' does not apply to this value", pattern)))?;
    Ok(out)
}

trait FormatItems {
    fn write_items(&self, out: &mut String, items: &[Item<'_>]) -> fmt::Result;
}

impl FormatItems for NaiveDate {
    fn write_items(&self, out: &mut String, items: &[Item<'_>]) -> fmt::Result {
        write!(out, "{}", self.format_with_items(items.iter()))
    }
}

impl FormatItems for NaiveTime {
    fn write_items(&self, out: &mut String, items: &[Item<'_>]) -> fmt::Result {
        write!(out, "{}", self.format_with_items(items.iter()))
    }
}

impl FormatItems for NaiveDateTime {
    fn write_items(&self, out: &mut String, items: &[Item<'_>]) -> fmt::Result {
        write!(out, "{}", self.format_with_items(items.iter()))
    }
}

/// Fixed default string form of a date
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Fixed default string form of a time (whole seconds)
pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Date/time template value
#[derive(Debug, Clone, Copy)]
enum Moment {
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
}

impl Moment {
    fn strftime(&self, pattern: &str) -> Result<String, RenderError> {
        match self {
            Moment::Date(d) => strftime(d, pattern),
            Moment::Time(t) => strftime(t, pattern),
            Moment::DateTime(dt) => strftime(dt, pattern),
        }
    }

    fn date(&self) -> Option<NaiveDate> {
        match self {
            Moment::Date(d) => Some(*d),
            Moment::DateTime(dt) => Some(dt.date()),
            Moment::Time(_) => None,
        }
    }

    fn time(&self) -> Option<NaiveTime> {
        match self {
            Moment::Time(t) => Some(*t),
            Moment::DateTime(dt) => Some(dt.time()),
            Moment::Date(_) => None,
        }
    }
}

impl fmt::Display for Moment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Moment::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Moment::Time(t) => write!(f, "{}", t.format(TIME_FORMAT)),
            Moment::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
        }
    }
}

impl Object for Moment {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Plain
    }

    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let date = self.date();
        let time = self.time();
        match key.as_str()? {
            "year" => date.map(|d| Value::from(d.year())),
            "month" => date.map(|d| Value::from(d.month())),
            "day" => date.map(|d| Value::from(d.day())),
            "hour" => time.map(|t| Value::from(t.hour())),
            "minute" => time.map(|t| Value::from(t.minute())),
            "second" => time.map(|t| Value::from(t.second())),
            _ => None,
        }
    }

    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        method: &str,
        args: &[Value],
    ) -> Result<Value, Error> {
        match method {
            "strftime" => {
                let (pattern,): (&str,) = from_args(args)?;
                self.strftime(pattern)
                    .map(Value::from)
                    .map_err(|e| Error::new(ErrorKind::InvalidOperation, e.message().to_string()))
            }
            "isoformat" => {
                if !args.is_empty() {
                    return Err(Error::from(ErrorKind::TooManyArguments));
                }
                Ok(Value::from(self.to_string().replacen(' ', "T", 1)))
            }
            "date" => match **self {
                Moment::DateTime(dt) => Ok(Value::from_object(Moment::Date(dt.date()))),
                _ => Err(Error::from(ErrorKind::UnknownMethod)),
            },
            "time" => match **self {
                Moment::DateTime(dt) => Ok(Value::from_object(Moment::Time(dt.time()))),
                _ => Err(Error::from(ErrorKind::UnknownMethod)),
            },
            _ => Err(Error::from(ErrorKind::UnknownMethod)),
        }
    }

    fn render(self: &Arc<Self>, f: &mut fmt::Formatter<'_>) -> fmt::Result
    where
        Self: Sized + 'static,
    {
        fmt::Display::fmt(&**self, f)
    }
}

/// The `host` template variable
#[derive(Debug)]
struct HostObject(Option<HostHandle>);

impl Object for HostObject {
    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        method: &str,
        args: &[Value],
    ) -> Result<Value, Error> {
        if method != "lookup" {
            return Err(Error::from(ErrorKind::UnknownMethod));
        }

        let (key, rest) = args.split_first().ok_or_else(|| {
            Error::new(ErrorKind::MissingArgument, "host.lookup() requires a key")
        })?;
        let key = key.as_str().ok_or_else(|| {
            Error::new(ErrorKind::InvalidOperation, "host.lookup() key must be a string")
        })?;
        let rest: Vec<String> = rest.iter().map(|v| v.to_string()).collect();

        let found = self.0.as_ref().and_then(|host| host.lookup(key, &rest));
        Ok(match found {
            Some(value) => Value::from(value),
            None => Value::from(()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::HostLookup;

    fn ctx() -> TemplateContext {
        let now = NaiveDate::from_ymd_opt(2025, 1, 15)
            .unwrap()
            .and_hms_opt(14, 30, 5)
            .unwrap();
        TemplateContext::new("Acme Corp", "Sales Invoice", "John Doe", now)
    }

    fn render(template: &str, ctx: &TemplateContext) -> Result<String, RenderError> {
        JinjaRenderer::new().render(template, ctx)
    }

    #[test]
    fn test_basic_variables() {
        let out = render("{{ company }} | {{ doctype }} | {{ user_fullname }}", &ctx()).unwrap();
        assert_eq!(out, "Acme Corp | Sales Invoice | John Doe");
    }

    #[test]
    fn test_date_time_default_format() {
        let out = render("{{ date }} {{ time }} / {{ now }}", &ctx()).unwrap();
        assert_eq!(out, "2025-01-15 14:30:05 / 2025-01-15 14:30:05");
    }

    #[test]
    fn test_strftime_and_attributes() {
        let out = render(
            "{{ now.strftime('%d/%m/%Y %H:%M') }} {{ date.year }} {{ time.hour }} {{ now.date() }}",
            &ctx(),
        )
        .unwrap();
        assert_eq!(out, "15/01/2025 14:30 2025 14 2025-01-15");
    }

    #[test]
    fn test_invalid_strftime_is_error() {
        assert!(render("{{ date.strftime('%Q') }}", &ctx()).is_err());
        assert!(render("{{ date.strftime('%H') }}", &ctx()).is_err());
    }

    #[test]
    fn test_missing_report_name_renders_empty() {
        let out = render("[{{ report_name }}]", &ctx()).unwrap();
        assert_eq!(out, "[]");

        let out = render("{{ report_name or doctype }}", &ctx()).unwrap();
        assert_eq!(out, "Sales Invoice");

        let out = render(
            "{{ report_name or doctype }}",
            &ctx().with_report_name("Sales Register"),
        )
        .unwrap();
        assert_eq!(out, "Sales Register");
    }

    #[test]
    fn test_conditional_block() {
        let template = "{% if report_name %}Report: {{ report_name }}{% else %}Export: {{ doctype }}{% endif %}";
        assert_eq!(render(template, &ctx()).unwrap(), "Export: Sales Invoice");
    }

    #[test]
    fn test_undefined_variable_is_error() {
        let err = render("{{ branch }}", &ctx()).unwrap_err();
        assert!(!err.message().is_empty());
    }

    #[test]
    fn test_syntax_error_reports_line() {
        let err = render("{{ company }}\n{% if %}", &ctx()).unwrap_err();
        assert_eq!(err.line(), Some(2));
    }

    struct Addresses;

    impl HostLookup for Addresses {
        fn lookup(&self, key: &str, args: &[String]) -> Option<String> {
            match (key, args) {
                ("address", [company]) if company == "Acme Corp" => Some("1 Main St".to_string()),
                _ => None,
            }
        }
    }

    #[test]
    fn test_host_lookup() {
        let ctx = ctx().with_host(HostHandle::new(Addresses));
        let out = render("{{ host.lookup('address', company) }}|{{ host.lookup('tax_id') }}", &ctx).unwrap();
        assert_eq!(out, "1 Main St|");

        let out = render("[{{ host.lookup('address', company) }}]", &self::ctx()).unwrap();
        assert_eq!(out, "[]");
    }
}
