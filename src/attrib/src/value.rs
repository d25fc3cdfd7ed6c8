//! Raw value shapes
//!
//! Attribute files are recursive lists of `{ "key": ..., "value": ... }`
//! entries. A handful of entry lists carry special meaning (pointer markers,
//! split map/name paths). [`classify`] decides which shape a raw value has so
//! the normalizer can match on it exhaustively.

use serde_json::Value;

/// Pointer marker: a one-entry list whose value is the referenced value
pub const REF_KEY: &str = "$REF";
/// Map half of a split path marker
pub const PBG_MAP_KEY: &str = "$PBGMAP";
/// Name half of a split path marker
pub const PBG_NAME_KEY: &str = "$PBGNAME";

/// The recognized shapes of a raw value
#[derive(Debug, Clone, PartialEq)]
pub enum Shape<'a> {
    /// `[{"key":"$REF","value":v}]`
    Reference(&'a Value),
    /// `$PBGMAP` / `$PBGNAME` pair, either half possibly missing
    PbgPath {
        map: Option<&'a Value>,
        name: Option<&'a Value>,
    },
    /// Ordinary key/value entry list
    Entries(Vec<(&'a str, &'a Value)>),
    Text(&'a str),
    /// Number, bool or null
    Scalar(&'a Value),
    /// Anything else; passed through untouched
    Opaque(&'a Value),
}

/// Classify a raw value
pub fn classify(raw: &Value) -> Shape<'_> {
    match raw {
        Value::String(s) => Shape::Text(s),
        Value::Null | Value::Bool(_) | Value::Number(_) => Shape::Scalar(raw),
        Value::Object(_) => Shape::Opaque(raw),
        Value::Array(items) => match entries(items) {
            Some(list) => classify_entries(raw, list),
            None => Shape::Opaque(raw),
        },
    }
}

fn classify_entries<'a>(raw: &'a Value, list: Vec<(&'a str, &'a Value)>) -> Shape<'a> {
    if let [(REF_KEY, value)] = list.as_slice() {
        return Shape::Reference(*value);
    }

    // An empty list is not distinguishable from an empty record
    if list.is_empty() {
        return Shape::Opaque(raw);
    }

    let is_pbg = |key: &str| key == PBG_MAP_KEY || key == PBG_NAME_KEY;
    if list.len() <= 2 && list.iter().all(|(key, _)| is_pbg(key)) {
        let find = |wanted: &str| {
            list.iter()
                .find(|(key, _)| *key == wanted)
                .map(|(_, v)| *v)
        };
        return Shape::PbgPath {
            map: find(PBG_MAP_KEY),
            name: find(PBG_NAME_KEY),
        };
    }

    Shape::Entries(list)
}

/// Interpret an array as key/value entries, if every element is one
fn entries(items: &[Value]) -> Option<Vec<(&str, &Value)>> {
    items
        .iter()
        .map(|item| {
            let obj = item.as_object()?;
            let key = obj.get("key")?.as_str()?;
            Some((key, obj.get("value").unwrap_or(&Value::Null)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_reference() {
        let raw = json!([{"key": "$REF", "value": "ebps\\races\\common\\unit_villager"}]);
        assert_eq!(
            classify(&raw),
            Shape::Reference(&json!("ebps\\races\\common\\unit_villager"))
        );
    }

    #[test]
    fn test_classify_pbg_pair() {
        let raw = json!([
            {"key": "$PBGMAP", "value": "sbps"},
            {"key": "$PBGNAME", "value": "races/rus/unit_knight_2_rus"}
        ]);
        match classify(&raw) {
            Shape::PbgPath { map, name } => {
                assert_eq!(map, Some(&json!("sbps")));
                assert_eq!(name, Some(&json!("races/rus/unit_knight_2_rus")));
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_classify_half_pbg() {
        let raw = json!([{"key": "$PBGNAME", "value": "x"}]);
        assert!(matches!(classify(&raw), Shape::PbgPath { map: None, .. }));
    }

    #[test]
    fn test_classify_entries_and_opaque() {
        let raw = json!([{"key": "a", "value": 1}, {"key": "b"}]);
        match classify(&raw) {
            Shape::Entries(list) => {
                assert_eq!(list.len(), 2);
                assert_eq!(list[1], ("b", &Value::Null));
            }
            other => panic!("unexpected shape {:?}", other),
        }

        let mixed = json!([{"key": "a", "value": 1}, 7]);
        assert!(matches!(classify(&mixed), Shape::Opaque(_)));
        assert!(matches!(classify(&json!([])), Shape::Opaque(_)));
        assert!(matches!(classify(&json!({"a": 1})), Shape::Opaque(_)));
        assert!(matches!(classify(&json!(3.5)), Shape::Scalar(_)));
    }
}
