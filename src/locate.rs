//! Query resolution against a decoded JSON tree.
//!
//! A query string is parsed into a [`Query`] (a path of [`Segment`]s) by a
//! [`Locate`] implementation and resolved against the document root. The
//! default [`KeyLocator`] treats the whole query as one top-level member name;
//! [`PointerLocator`] accepts RFC 6901 JSON pointers.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Query {
    segments: Vec<Segment>,
}

impl Query {
    pub fn key(name: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::Key(name.into())],
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Walks the path from `root`. An empty query resolves to the root itself.
    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.segments.iter().try_fold(root, |node, segment| match (segment, node) {
            (Segment::Key(key), Value::Object(map)) => map.get(key),
            (Segment::Index(idx), Value::Array(items)) => items.get(*idx),
            // "/0" may also name an object member.
            (Segment::Index(idx), Value::Object(map)) => map.get(&idx.to_string()),
            _ => None,
        })
    }
}

impl FromIterator<Segment> for Query {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

/// Resolves a query string against a document.
pub trait Locate: Send + Sync {
    fn locate<'a>(&self, document: &'a Value, query: &str) -> Option<&'a Value>;
}

/// Exact-name lookup of a first-level object member.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyLocator;

impl Locate for KeyLocator {
    fn locate<'a>(&self, document: &'a Value, query: &str) -> Option<&'a Value> {
        Query::key(query).resolve(document)
    }
}

/// RFC 6901 JSON pointer lookup, e.g. `/readings/0/temp`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerLocator;

impl PointerLocator {
    pub fn parse(pointer: &str) -> Option<Query> {
        if pointer.is_empty() {
            return Some(Query::default());
        }
        let rest = pointer.strip_prefix('/')?;
        Some(rest.split('/').map(pointer_segment).collect())
    }
}

fn pointer_segment(token: &str) -> Segment {
    let token = token.replace("~1", "/").replace("~0", "~");
    let canonical_index = !token.is_empty()
        && token.bytes().all(|b| b.is_ascii_digit())
        && (token == "0" || !token.starts_with('0'));
    match token.parse::<usize>() {
        Ok(idx) if canonical_index => Segment::Index(idx),
        _ => Segment::Key(token),
    }
}

impl Locate for PointerLocator {
    fn locate<'a>(&self, document: &'a Value, query: &str) -> Option<&'a Value> {
        Self::parse(query)?.resolve(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_locator_reads_top_level_members_only() {
        let doc = json!({ "name": "John", "a.b": 1, "nested": { "name": "inner" } });

        assert_eq!(KeyLocator.locate(&doc, "name"), Some(&json!("John")));
        assert_eq!(KeyLocator.locate(&doc, "a.b"), Some(&json!(1)));
        assert_eq!(KeyLocator.locate(&doc, "nested.name"), None);
        assert_eq!(KeyLocator.locate(&doc, "missing"), None);
    }

    #[test]
    fn key_locator_requires_object_root() {
        assert_eq!(KeyLocator.locate(&json!([1, 2]), "0"), None);
        assert_eq!(KeyLocator.locate(&json!("name"), "name"), None);
    }

    #[test]
    fn key_locator_returns_null_members() {
        let doc = json!({ "gone": null });
        assert_eq!(KeyLocator.locate(&doc, "gone"), Some(&Value::Null));
    }

    #[test]
    fn pointer_parses_escapes_and_indices() {
        let q = PointerLocator::parse("/a~1b/m~0n/0/01").unwrap();
        assert_eq!(
            q.segments(),
            &[
                Segment::Key("a/b".into()),
                Segment::Key("m~n".into()),
                Segment::Index(0),
                Segment::Key("01".into()),
            ]
        );
        assert!(PointerLocator::parse("no-slash").is_none());
        assert_eq!(PointerLocator::parse(""), Some(Query::default()));
    }

    #[test]
    fn pointer_locator_walks_nested_paths() {
        let doc = json!({
            "readings": [{ "temp": 21.5 }, { "temp": 22.0 }],
            "meta": { "0": "zero" }
        });

        assert_eq!(PointerLocator.locate(&doc, "/readings/1/temp"), Some(&json!(22.0)));
        assert_eq!(PointerLocator.locate(&doc, "/meta/0"), Some(&json!("zero")));
        assert_eq!(PointerLocator.locate(&doc, "/readings/5/temp"), None);
        assert_eq!(PointerLocator.locate(&doc, "readings"), None);
        assert_eq!(PointerLocator.locate(&doc, ""), Some(&doc));
    }
}
