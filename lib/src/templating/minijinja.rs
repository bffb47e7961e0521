use std::sync::Arc;

use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use minijinja::value::Value;

use crate::error::Result;
use crate::templating::Engine;
use crate::util::is_template;
use crate::value::{self, Dict};

/// A template engine backed by `minijinja`.
///
/// Undefined values are chainable and render as nothing, output is never
/// escaped, and a trailing newline in a template is kept.
#[derive(Debug)]
pub struct MiniJinjaEngine {
    env: Environment<'static>,
}

impl MiniJinjaEngine {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Chainable);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_keep_trailing_newline(true);

        env.add_filter("date_to_string", ext::date_to_string);
        env.add_filter("date_to_long_string", ext::date_to_long_string);
        env.add_filter("date_to_xmlschema", ext::date_to_xmlschema);
        env.add_filter("xml_escape", ext::xml_escape);
        env.add_filter("cgi_escape", ext::cgi_escape);
        env.add_filter("number_of_words", ext::number_of_words);
        env.add_filter("array_to_sentence_string", ext::array_to_sentence_string);
        MiniJinjaEngine { env }
    }

    /// Makes `value` available to every template as the global `name`.
    pub fn with_register<N, V>(mut self, name: N, value: V) -> Self
        where N: Into<String>, V: Into<value::Value>
    {
        self.env.add_global(name.into(), Value::from(value.into()));
        self
    }
}

impl Default for MiniJinjaEngine {
    fn default() -> Self {
        MiniJinjaEngine::new()
    }
}

impl Engine for MiniJinjaEngine {
    fn render(&self, name: &str, source: &str, payload: &Dict) -> Result<String> {
        if !is_template(source) {
            return Ok(source.to_string());
        }

        let context = Value::from(value::Value::Dict(Arc::new(payload.clone())));
        Ok(self.env.render_named_str(name, source, context)?)
    }
}

impl From<value::Value> for Value {
    fn from(value: value::Value) -> Self {
        use crate::value::{Num, Value as V};

        match value {
            V::Null => Value::UNDEFINED,
            V::Bool(b) => Value::from(b),
            V::Num(Num::I64(n)) => Value::from(n),
            V::Num(Num::U64(n)) => Value::from(n),
            V::Num(Num::F64(n)) => Value::from(n),
            V::String(s) => Value::from(s),
            V::Array(a) => a.iter().cloned().map(Value::from).collect(),
            V::Dict(d) => d.iter()
                .map(|(k, v)| (Value::from(k.clone()), Value::from(v.clone())))
                .collect(),
        }
    }
}

mod ext {
    use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
    use minijinja::{Error, ErrorKind};

    fn parse_date(value: &str) -> Result<DateTime<FixedOffset>, Error> {
        let value = value.trim();
        if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
            return Ok(datetime);
        }

        let naive = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"].iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
            .or_else(|| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?.and_hms_opt(0, 0, 0))
            .ok_or_else(|| Error::new(
                ErrorKind::InvalidOperation,
                format!("failed to parse {value:?} as a date")
            ))?;

        Ok(naive.and_utc().fixed_offset())
    }

    pub fn date_to_string(value: &str) -> Result<String, Error> {
        Ok(parse_date(value)?.format("%d %b %Y").to_string())
    }

    pub fn date_to_long_string(value: &str) -> Result<String, Error> {
        Ok(parse_date(value)?.format("%d %B %Y").to_string())
    }

    pub fn date_to_xmlschema(value: &str) -> Result<String, Error> {
        Ok(parse_date(value)?.format("%Y-%m-%dT%H:%M:%S%:z").to_string())
    }

    pub fn xml_escape(value: &str) -> String {
        let mut escaped = String::with_capacity(value.len());
        for c in value.chars() {
            match c {
                '&' => escaped.push_str("&amp;"),
                '<' => escaped.push_str("&lt;"),
                '>' => escaped.push_str("&gt;"),
                '"' => escaped.push_str("&quot;"),
                c => escaped.push(c),
            }
        }

        escaped
    }

    pub fn cgi_escape(value: &str) -> String {
        use std::fmt::Write;

        let mut escaped = String::with_capacity(value.len());
        for b in value.bytes() {
            match b {
                b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'*' | b'-' | b'.' | b'_' => {
                    escaped.push(b as char)
                }
                b' ' => escaped.push('+'),
                b => { let _ = write!(escaped, "%{b:02X}"); }
            }
        }

        escaped
    }

    pub fn number_of_words(value: &str) -> usize {
        value.split_whitespace().count()
    }

    pub fn array_to_sentence_string(values: Vec<String>) -> String {
        match values.as_slice() {
            [] => String::new(),
            [one] => one.clone(),
            [a, b] => format!("{a} and {b}"),
            [init @ .., last] => format!("{}, and {last}", init.join(", ")),
        }
    }
}
