//! `richtext-wire` - JSON attribute exchange for `richtext-core`.
//!
//! Hosts persist and transport attribute sets as JSON arrays of
//! `{ "start": …, "length": …, "type": <numeric tag>, "content": … }`. The numeric tags are
//! the stable [`DisplayType`] tags; decoding skips (and logs) entries carrying a tag this
//! build does not know, so newer peers can add types without breaking older ones.

use serde::{Deserialize, Serialize};
use richtext_core::{Attribute, DisplayType};

/// Serialized form of one attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireAttribute {
    /// Start char offset.
    pub start: usize,
    /// Length in chars.
    pub length: usize,
    /// Numeric [`DisplayType`] tag.
    #[serde(rename = "type")]
    pub ty: u8,
    /// Optional payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl From<&Attribute> for WireAttribute {
    fn from(attr: &Attribute) -> Self {
        Self {
            start: attr.start,
            length: attr.length,
            ty: attr.ty.tag(),
            content: attr.content.clone(),
        }
    }
}

impl WireAttribute {
    /// Decode into an engine attribute; `None` when the tag is unknown.
    pub fn decode(self) -> Option<Attribute> {
        let ty = DisplayType::from_tag(self.ty)?;
        Some(Attribute {
            start: self.start,
            length: self.length,
            ty,
            content: self.content,
        })
    }
}

/// Encode attributes as a JSON array.
pub fn attributes_to_json(attrs: &[Attribute]) -> serde_json::Result<String> {
    let wire: Vec<WireAttribute> = attrs.iter().map(WireAttribute::from).collect();
    serde_json::to_string(&wire)
}

/// Decode a JSON array of attributes.
///
/// Entries with an unknown type tag are skipped with a warning; malformed JSON is an error.
pub fn attributes_from_json(json: &str) -> serde_json::Result<Vec<Attribute>> {
    let wire: Vec<WireAttribute> = serde_json::from_str(json)?;
    Ok(wire
        .into_iter()
        .filter_map(|w| {
            let tag = w.ty;
            let decoded = w.decode();
            if decoded.is_none() {
                tracing::warn!(tag, "skipping attribute with unknown type tag");
            }
            decoded
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_round_trip() {
        let attrs = vec![
            Attribute::with_content(DisplayType::Mention, 3, 7, "user-1"),
            Attribute::new(DisplayType::Bold, 11, 2),
        ];
        let json = attributes_to_json(&attrs).unwrap();
        assert_eq!(attributes_from_json(&json).unwrap(), attrs);
    }

    #[test]
    fn test_wire_shape_is_stable() {
        let json = attributes_to_json(&[Attribute::new(DisplayType::Bold, 0, 2)]).unwrap();
        assert_eq!(json, r#"[{"start":0,"length":2,"type":4}]"#);
    }

    #[test]
    fn test_unknown_tag_skipped() {
        let json = r#"[
            {"start":0,"length":2,"type":4},
            {"start":2,"length":3,"type":77,"content":"x"}
        ]"#;
        let attrs = attributes_from_json(json).unwrap();
        assert_eq!(attrs, vec![Attribute::new(DisplayType::Bold, 0, 2)]);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(attributes_from_json("{not json").is_err());
    }
}
