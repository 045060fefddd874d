//! Document serialization.
//!
//! The transfer form is JSON shaped as
//! `{"pages":[{"id", "looseElements":[…], "panels":[{…, "elements":[…]}]}]}`,
//! every node carrying its `type` tag. MessagePack with named fields is the
//! compact binary equivalent. Images are stored by source reference only.
//!
//! Decoding validates the result (non-empty, unique ids, finite numbers)
//! before handing it out, so a failed import never reaches a live document.

use crate::id::NodeId;
use crate::lint::{LintSeverity, lint_document};
use crate::model::Document;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeserializationError {
    #[error("malformed document JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed document MessagePack: {0}")]
    MsgPack(#[from] rmp_serde::decode::Error),
    #[error("document has no pages")]
    NoPages,
    #[error("invalid document ({rule} on `{node}`, page {page}): {message}")]
    Invalid {
        rule: &'static str,
        page: usize,
        node: NodeId,
        message: String,
    },
}

#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("failed to encode document as JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to encode document as MessagePack: {0}")]
    MsgPack(#[from] rmp_serde::encode::Error),
}

// ─── Encode ──────────────────────────────────────────────────────────────

/// The structured transfer form.
pub fn to_value(doc: &Document) -> Result<serde_json::Value, SerializationError> {
    Ok(serde_json::to_value(doc)?)
}

pub fn to_json(doc: &Document) -> Result<String, SerializationError> {
    Ok(serde_json::to_string(doc)?)
}

pub fn to_json_pretty(doc: &Document) -> Result<String, SerializationError> {
    Ok(serde_json::to_string_pretty(doc)?)
}

/// MessagePack with field names, so the binary form carries the same keys
/// as the JSON form.
pub fn to_msgpack(doc: &Document) -> Result<Vec<u8>, SerializationError> {
    Ok(rmp_serde::to_vec_named(doc)?)
}

// ─── Decode ──────────────────────────────────────────────────────────────

pub fn from_value(value: serde_json::Value) -> Result<Document, DeserializationError> {
    validate(serde_json::from_value(value)?)
}

pub fn from_json(text: &str) -> Result<Document, DeserializationError> {
    validate(serde_json::from_str(text)?)
}

pub fn from_msgpack(bytes: &[u8]) -> Result<Document, DeserializationError> {
    validate(rmp_serde::from_slice(bytes)?)
}

fn validate(doc: Document) -> Result<Document, DeserializationError> {
    if doc.pages.is_empty() {
        return Err(DeserializationError::NoPages);
    }
    if let Some(d) = lint_document(&doc)
        .into_iter()
        .find(|d| d.severity == LintSeverity::Error)
    {
        return Err(DeserializationError::Invalid {
            rule: d.rule,
            page: d.page,
            node: d.node_id,
            message: d.message,
        });
    }
    log::debug!("decoded document with {} page(s)", doc.pages.len());
    Ok(doc)
}

/// Serde adapter: point pairs as a flat `[x0, y0, x1, y1, …]` list.
pub(crate) mod flat_points {
    use serde::de::{self, Deserialize, Deserializer};
    use serde::ser::{SerializeSeq, Serializer};

    pub fn serialize<S: Serializer>(points: &[(f32, f32)], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(points.len() * 2))?;
        for (x, y) in points {
            seq.serialize_element(x)?;
            seq.serialize_element(y)?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<(f32, f32)>, D::Error> {
        let flat = Vec::<f32>::deserialize(deserializer)?;
        if flat.len() % 2 != 0 {
            return Err(de::Error::custom(format!(
                "point list has an odd number of coordinates ({})",
                flat.len()
            )));
        }
        Ok(flat.chunks_exact(2).map(|c| (c[0], c[1])).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Color, Node, NodeKind, Page};

    #[test]
    fn line_points_are_flat() {
        let mut page = Page::new();
        page.loose_elements.push(
            Node::new(
                NodeId::intern("ln"),
                NodeKind::Line {
                    points: vec![(0.0, 0.0), (200.0, 0.0)],
                    stroke: Color::BLACK,
                    stroke_width: 2.0,
                },
            )
            .at(100.0, 100.0),
        );
        let value = to_value(&Document { pages: vec![page] }).unwrap();
        let line = &value["pages"][0]["looseElements"][0];
        assert_eq!(line["type"], "line");
        assert_eq!(line["points"], serde_json::json!([0.0, 0.0, 200.0, 0.0]));
        assert_eq!(line["strokeWidth"], 2.0);
    }

    #[test]
    fn odd_point_list_is_malformed() {
        let text = r##"{"pages":[{"looseElements":[
            {"type":"line","id":"l","x":0,"y":0,"points":[0,0,5],"stroke":"#000","strokeWidth":1}
        ],"panels":[]}]}"##;
        assert!(matches!(from_json(text), Err(DeserializationError::Json(_))));
    }

    #[test]
    fn empty_pages_rejected() {
        assert!(matches!(from_json(r#"{"pages":[]}"#), Err(DeserializationError::NoPages)));
    }

    #[test]
    fn non_finite_survives_msgpack_but_not_validation() {
        let mut page = Page::new();
        page.loose_elements.push(
            Node::new(
                NodeId::intern("inf"),
                NodeKind::Image {
                    src: "a.png".into(),
                    width: f32::INFINITY,
                    height: 10.0,
                    brightness: 0.0,
                    contrast: 0.0,
                    crop: None,
                },
            ),
        );
        let bytes = to_msgpack(&Document { pages: vec![page] }).unwrap();
        let err = from_msgpack(&bytes).unwrap_err();
        assert!(matches!(err, DeserializationError::Invalid { rule: "non-finite", .. }));
    }
}
