use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Requested target type of a field. Absent on a `FieldSpec` means
/// "keep the decoded native type".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Int,
    Float,
    Bool,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "string" => Ok(FieldType::String),
            "int" => Ok(FieldType::Int),
            "float" => Ok(FieldType::Float),
            "bool" => Ok(FieldType::Bool),
            _ => bail!("Unsupported field type: {s:?} (expected string, int, float or bool)"),
        }
    }
}

/// One extraction rule.
///
/// ```JSON
/// { "name": "temperature", "query": "temp", "type": "float" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FieldSpec {
    pub name: String,
    pub query: String,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "deserialize_field_type",
        skip_serializing_if = "Option::is_none"
    )]
    pub ty: Option<FieldType>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            query: query.into(),
            ty: None,
        }
    }

    pub fn typed(name: impl Into<String>, query: impl Into<String>, ty: FieldType) -> Self {
        Self {
            ty: Some(ty),
            ..Self::new(name, query)
        }
    }
}

// `null` and `""` both mean native.
fn deserialize_field_type<'de, D>(deserializer: D) -> Result<Option<FieldType>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse::<FieldType>()
            .map(Some)
            .map_err(<D::Error as serde::de::Error>::custom),
    }
}

/// Shape of one output record.
///
/// ```JSON
/// {
///     "metric_name": "file",
///     "fields": [
///         { "name": "explicitstringtypeName", "query": "explicitstringtype", "type": "string" },
///         { "name": "defaultstringtypeName", "query": "defaultstringtype" }
///     ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RecordSpec {
    pub metric_name: String,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl RecordSpec {
    pub fn new(metric_name: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            metric_name: metric_name.into(),
            fields,
        }
    }

    /// Checks the rules the parser itself does not enforce.
    pub fn validate(&self) -> Result<()> {
        if self.metric_name.trim().is_empty() {
            bail!("metric_name must not be empty");
        }

        if self.fields.is_empty() {
            bail!("Metric '{}' has no fields", self.metric_name);
        }

        let mut seen = HashSet::new();
        for (idx, field) in self.fields.iter().enumerate() {
            if field.name.is_empty() {
                bail!("Field #{} of metric '{}' has an empty name", idx, self.metric_name);
            }
            if field.query.is_empty() {
                bail!(
                    "Field '{}' of metric '{}' has an empty query",
                    field.name,
                    self.metric_name
                );
            }
            if !seen.insert(field.name.as_str()) {
                bail!(
                    "Duplicate field name '{}' in metric '{}'",
                    field.name,
                    self.metric_name
                );
            }
        }

        Ok(())
    }
}

/// Loads and validates record specs from JSON: either an array of specs or a
/// single spec object.
pub fn load_record_specs(json: &str) -> Result<Vec<RecordSpec>> {
    let root: serde_json::Value = serde_json::from_str(json)
        .with_context(|| "Invalid JSON: expected a record spec object or an array of them")?;

    let specs = if root.is_array() {
        serde_json::from_value::<Vec<RecordSpec>>(root)
    } else {
        serde_json::from_value::<RecordSpec>(root).map(|spec| vec![spec])
    }
    .with_context(|| "Invalid record spec: expected `metric_name` and `fields`")?;

    for (idx, spec) in specs.iter().enumerate() {
        spec.validate().map_err(|e| anyhow!("Record spec #{idx}: {e}"))?;
    }

    Ok(specs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_type_parses_known_literals() {
        assert_eq!("string".parse::<FieldType>().unwrap(), FieldType::String);
        assert_eq!("int".parse::<FieldType>().unwrap(), FieldType::Int);
        assert_eq!("float".parse::<FieldType>().unwrap(), FieldType::Float);
        assert_eq!("bool".parse::<FieldType>().unwrap(), FieldType::Bool);
        assert!("dec".parse::<FieldType>().is_err());
        assert!("Int".parse::<FieldType>().is_err());
    }

    #[test]
    fn loads_single_spec_with_optional_types() {
        let specs = load_record_specs(
            r#"{
                "metric_name": "file",
                "fields": [
                    { "name": "a", "query": "a", "type": "int" },
                    { "name": "b", "query": "b" },
                    { "name": "c", "query": "c", "type": "" },
                    { "name": "d", "query": "d", "type": null }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(specs.len(), 1);
        let fields = &specs[0].fields;
        assert_eq!(fields[0], FieldSpec::typed("a", "a", FieldType::Int));
        assert_eq!(fields[1].ty, None);
        assert_eq!(fields[2].ty, None);
        assert_eq!(fields[3].ty, None);
    }

    #[test]
    fn loads_spec_array_in_order() {
        let specs = load_record_specs(
            r#"[
                { "metric_name": "first", "fields": [{ "name": "a", "query": "a" }] },
                { "metric_name": "second", "fields": [{ "name": "b", "query": "b" }] }
            ]"#,
        )
        .unwrap();

        let names: Vec<_> = specs.iter().map(|s| s.metric_name.as_str()).collect();
        assert_eq!(names, ["first", "second"]);
    }

    #[test]
    fn rejects_unknown_type() {
        let err = load_record_specs(
            r#"{ "metric_name": "m", "fields": [{ "name": "a", "query": "a", "type": "dt" }] }"#,
        )
        .unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("Invalid record spec"), "{message}");
        assert!(message.contains(r#"Unsupported field type: "dt""#), "{message}");
    }

    #[test]
    fn reports_missing_keys_by_name() {
        let err = load_record_specs(r#"[{ "fields": [{ "name": "a", "query": "a" }] }]"#)
            .unwrap_err();
        assert!(format!("{err:#}").contains("missing field `metric_name`"));

        let err = load_record_specs("{ \"metric_name\": \"m\",").unwrap_err();
        assert!(err.to_string().contains("Invalid JSON"));
    }

    #[test]
    fn rejects_specs_without_fields() {
        let err = load_record_specs(r#"{ "metric_name": "m", "fields": [] }"#).unwrap_err();
        assert!(err.to_string().contains("Metric 'm' has no fields"));

        let err = load_record_specs(r#"[{ "metric_name": "m" }]"#).unwrap_err();
        assert!(err.to_string().contains("Record spec #0"));
    }

    #[test]
    fn rejects_duplicate_field_names() {
        let err = load_record_specs(
            r#"{ "metric_name": "m", "fields": [
                { "name": "a", "query": "x" },
                { "name": "a", "query": "y" }
            ] }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Duplicate field name 'a'"));
    }

    #[test]
    fn rejects_empty_query_and_metric_name() {
        let spec = RecordSpec::new("m", vec![FieldSpec::new("a", "")]);
        assert!(spec.validate().is_err());

        let spec = RecordSpec::new(" ", vec![FieldSpec::new("a", "a")]);
        assert!(spec.validate().is_err());
    }

    #[test]
    fn serializes_type_under_type_key() {
        let json = serde_json::to_value(FieldSpec::typed("n", "q", FieldType::Bool)).unwrap();
        assert_eq!(json, serde_json::json!({ "name": "n", "query": "q", "type": "bool" }));

        let json = serde_json::to_value(FieldSpec::new("n", "q")).unwrap();
        assert_eq!(json, serde_json::json!({ "name": "n", "query": "q" }));
    }
}
