use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::error::ExtractError;
use crate::field_types::RecordSpec;
use crate::field_value::{CoerceError, FieldValue, coerce};
use crate::locate::{KeyLocator, Locate};
use crate::metric::Metric;
use crate::notice::{LogSink, NoticeSink};

/// Decodes one JSON document. Trailing commas, unterminated structures and
/// empty input are all rejected.
pub fn decode_document(input: &[u8]) -> Result<Value, ExtractError> {
    serde_json::from_slice(input).map_err(ExtractError::InvalidDocument)
}

/// Extracts typed fields from JSON documents according to a list of
/// [`RecordSpec`]s. Holds no per-call state, so one parser may be shared
/// across threads.
///
/// ```JSON
/// {"explicitstringtype": "Bilbo", "convertinttostring": 1}
/// ```
#[derive(Clone)]
pub struct Parser {
    specs: Vec<RecordSpec>,
    locator: Arc<dyn Locate>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn NoticeSink>,
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("specs", &self.specs)
            .finish_non_exhaustive()
    }
}

impl Parser {
    pub fn new(specs: Vec<RecordSpec>) -> Self {
        Self {
            specs,
            locator: Arc::new(KeyLocator),
            clock: Arc::new(SystemClock),
            sink: Arc::new(LogSink::default()),
        }
    }

    pub fn with_locator(mut self, locator: impl Locate + 'static) -> Self {
        self.locator = Arc::new(locator);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_sink(mut self, sink: impl NoticeSink + 'static) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    pub fn specs(&self) -> &[RecordSpec] {
        &self.specs
    }

    /// Builds the record for the first configured spec from one line of text.
    pub fn parse_line(&self, line: &str) -> Result<Metric, ExtractError> {
        let document = decode_document(line.as_bytes())?;

        let Some(spec) = self.specs.first() else {
            return Err(ExtractError::NoRecordSpec);
        };
        if self.specs.len() > 1 {
            self.sink.notice(&format!(
                "parse_line uses only the first of {} record specs ('{}')",
                self.specs.len(),
                spec.metric_name
            ));
        }

        self.build(&document, spec)
    }

    /// Builds one record per configured spec, in declaration order.
    pub fn parse(&self, input: &[u8]) -> Result<Vec<Metric>, ExtractError> {
        let document = decode_document(input)?;

        if self.specs.is_empty() {
            self.sink.notice("parse called with no record specs configured");
        }

        self.specs
            .iter()
            .map(|spec| self.build(&document, spec))
            .collect()
    }

    fn build(&self, document: &Value, spec: &RecordSpec) -> Result<Metric, ExtractError> {
        let mut fields = BTreeMap::new();

        for field in &spec.fields {
            let not_found = || ExtractError::QueryNotFound {
                field: field.name.clone(),
                query: field.query.clone(),
            };

            let raw = self.locator.locate(document, &field.query).ok_or_else(not_found)?;
            let value: FieldValue = coerce(raw, field.ty.into()).map_err(|e| match e {
                CoerceError::Null => not_found(),
                CoerceError::Unsupported { target, found } => ExtractError::UnsupportedCoercion {
                    field: field.name.clone(),
                    query: field.query.clone(),
                    target,
                    found,
                },
            })?;

            if fields.insert(field.name.clone(), value).is_some() {
                self.sink.notice(&format!(
                    "field '{}' of metric '{}' was written more than once; keeping the last value",
                    field.name, spec.metric_name
                ));
            }
        }

        log::debug!(
            "extracted {} field(s) for metric '{}'",
            fields.len(),
            spec.metric_name
        );

        Ok(Metric::new(
            spec.metric_name.clone(),
            BTreeMap::new(),
            fields,
            self.clock.now(),
        ))
    }
}
