use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::field_value::{FieldValue, format_float};

/// One extracted record: a name, tags (currently always empty), typed fields
/// and a timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    name: String,
    tags: BTreeMap<String, String>,
    fields: BTreeMap<String, FieldValue>,
    timestamp: DateTime<Utc>,
}

impl Metric {
    pub fn new(
        name: impl Into<String>,
        tags: BTreeMap<String, String>,
        fields: BTreeMap<String, FieldValue>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            tags,
            fields,
            timestamp,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Renders the metric as an InfluxDB line-protocol line, e.g.
    /// `file name="Bilbo",count=1i,ok=true 3600000000000`.
    ///
    /// Line protocol requires at least one field; a metric without fields
    /// renders as `name timestamp`, which InfluxDB rejects.
    pub fn to_line_protocol(&self) -> String {
        let mut out = escape(&self.name, &[',', ' ']);
        for (key, value) in &self.tags {
            out.push(',');
            out.push_str(&escape(key, &[',', '=', ' ']));
            out.push('=');
            out.push_str(&escape(value, &[',', '=', ' ']));
        }

        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|(key, value)| {
                format!("{}={}", escape(key, &[',', '=', ' ']), line_value(value))
            })
            .collect();
        if !fields.is_empty() {
            out.push(' ');
            out.push_str(&fields.join(","));
        }

        // Out of range for i64 nanoseconds only past year 2262.
        let nanos = self
            .timestamp
            .timestamp_nanos_opt()
            .unwrap_or_else(|| self.timestamp.timestamp().saturating_mul(1_000_000_000));
        out.push(' ');
        out.push_str(&nanos.to_string());
        out
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line_protocol())
    }
}

fn escape(text: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if special.contains(&c) || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn line_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Str(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
        FieldValue::Int(i) => format!("{i}i"),
        FieldValue::Float(f) => format_float(*f),
        FieldValue::Bool(b) => b.to_string(),
    }
}
