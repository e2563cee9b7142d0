//! Feature identity and attribute extraction from property maps.

use crate::dataset::Attribute;
use serde_json::{Map, Value};

/// Property keys that identify a feature, in order of preference.
pub const ID_KEYS: [&str; 5] = ["id", "fid", "osm_id", "uid", "uuid"];

const NAME_KEY: &str = "name";
const STYLE_TYPE_KEY: &str = "styletype";
const TAGS_KEY: &str = "tags";

/// Feature fields pulled out of a property map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureProperties {
    /// Feature id, or empty if none of the id keys is present.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Style category used by the renderer.
    pub style_type: String,
    /// Remaining properties, ordered by key.
    pub attributes: Vec<Attribute>,
}

impl FeatureProperties {
    /// Splits a property map into feature fields and plain attributes.
    ///
    /// Empty values (`null`, `""`, numeric zero, `"0"`) are dropped. `name`, `styletype` and the
    /// id keys are promoted, `tags` is dropped, everything else becomes an attribute.
    pub fn extract(properties: &Map<String, Value>) -> Self {
        let mut extracted = Self::default();
        let mut id_rank = ID_KEYS.len();

        let mut entries: Vec<(&String, &Value)> =
            properties.iter().filter(|(_, v)| !is_empty(v)).collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        for (key, value) in entries {
            if let Some(rank) = ID_KEYS.iter().position(|k| k == key) {
                if rank < id_rank {
                    id_rank = rank;
                    extracted.id = render(value);
                }
                continue;
            }

            match key.as_str() {
                NAME_KEY => extracted.name = render(value),
                STYLE_TYPE_KEY => extracted.style_type = render(value),
                TAGS_KEY => {}
                _ => extracted.attributes.push(Attribute {
                    key: key.clone(),
                    value: render(value),
                }),
            }
        }

        extracted
    }

    /// Same as [`FeatureProperties::extract`] for string columns, such as a CSV row.
    pub fn from_columns<'a>(columns: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let map = columns
            .into_iter()
            .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
            .collect();
        Self::extract(&map)
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty() || s == "0",
        Value::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    }
}

/// Strings verbatim, everything else as compact JSON.
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn drops_empty_values() {
        let extracted = FeatureProperties::extract(&props(json!({
            "a": null,
            "b": "",
            "c": 0,
            "d": "0",
            "e": 0.0,
            "f": "keep",
            "g": false,
        })));

        assert_eq!(
            extracted.attributes,
            vec![
                Attribute::new("f", "keep"),
                Attribute::new("g", "false"),
            ]
        );
    }

    #[test]
    fn promotes_reserved_keys() {
        let extracted = FeatureProperties::extract(&props(json!({
            "name": "Bridger Bowl",
            "styletype": "ski",
            "osm_id": 12345,
            "tags": {"piste": "yes"},
            "elevation": 2200.5,
            "lifts": ["a", "b"],
        })));

        assert_eq!(extracted.id, "12345");
        assert_eq!(extracted.name, "Bridger Bowl");
        assert_eq!(extracted.style_type, "ski");
        assert_eq!(
            extracted.attributes,
            vec![
                Attribute::new("elevation", "2200.5"),
                Attribute::new("lifts", "[\"a\",\"b\"]"),
            ]
        );
    }

    #[test]
    fn id_priority() {
        let extracted = FeatureProperties::extract(&props(json!({
            "uuid": "u-1",
            "fid": 7,
            "uid": "x",
        })));
        assert_eq!(extracted.id, "7");
        assert!(extracted.attributes.is_empty());

        let extracted = FeatureProperties::extract(&props(json!({"id": 0, "uid": "x"})));
        assert_eq!(extracted.id, "x");
    }

    #[test]
    fn columns() {
        let extracted = FeatureProperties::from_columns([
            ("id", "17"),
            ("category", "tree"),
            ("height", "0"),
        ]);
        assert_eq!(extracted.id, "17");
        assert_eq!(extracted.attributes, vec![Attribute::new("category", "tree")]);
    }
}
