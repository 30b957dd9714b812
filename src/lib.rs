//! Extracts typed fields from JSON documents into metrics.
//!
//! A [`Parser`] is configured with [`RecordSpec`]s, each naming a metric and a
//! list of [`FieldSpec`] queries. Every parse call decodes the input, resolves
//! each query, coerces the value to the declared [`FieldType`] (or keeps its
//! native type) and stamps the resulting [`Metric`] with the injected clock.
//! Any failure aborts the whole call.

pub mod clock;
pub mod error;
pub mod field_types;
pub mod field_value;
pub mod locate;
pub mod metric;
pub mod notice;
pub mod parser;

pub use clock::{Clock, SystemClock};
pub use error::ExtractError;
pub use field_types::{FieldSpec, FieldType, RecordSpec, load_record_specs};
pub use field_value::{CoerceError, FieldValue, Target, coerce};
pub use locate::{KeyLocator, Locate, PointerLocator, Query, Segment};
pub use metric::Metric;
pub use notice::{LogSink, MemorySink, NoticeSink, NullSink};
pub use parser::{Parser, decode_document};
