//! Query canonicalization.
//!
//! Nested mappings and sequences are flattened with bracket notation
//! (`a[b]=..`, `a[0]=..`) and form-encoded the way HTML forms are
//! serialized: alphanumerics and `-_.` stay literal, space becomes `+`,
//! everything else is `%XX`.

use serde_json::{Map, Value};
use url::form_urlencoded;

/// Form-encode a single key or value.
pub fn encode_component(raw: &str) -> String {
    // byte_serialize keeps `*` literal, the rendering service expects it escaped
    form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('*', "%2A")
}

/// Percent-encode a single path segment (tenant, deck, template, project)
pub fn encode_segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

/// Textual form of a scalar; `None` for null and containers.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Bool(true) => Some("1".to_string()),
        Value::Bool(false) => Some("0".to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn collect_pairs(key: &str, value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (child, v) in map {
                collect_pairs(&format!("{key}[{child}]"), v, out);
            }
        }
        Value::Array(items) => {
            for (index, v) in items.iter().enumerate() {
                collect_pairs(&format!("{key}[{index}]"), v, out);
            }
        }
        scalar => {
            if let Some(text) = scalar_to_string(scalar) {
                out.push(format!("{}={}", encode_component(key), encode_component(&text)));
            }
        }
    }
}

fn encoded_pairs(map: &Map<String, Value>) -> Vec<String> {
    let mut out = Vec::with_capacity(map.len());
    for (key, value) in map {
        collect_pairs(key, value, &mut out);
    }
    out
}

/// Canonical query string in encounter order.
pub fn to_query(map: &Map<String, Value>) -> String {
    encoded_pairs(map).join("&")
}

/// Canonical query string with its `key=value` tokens sorted bytewise.
///
/// Verifiers rebuild this independently of insertion order.
pub fn to_sorted_query(map: &Map<String, Value>) -> String {
    let mut pairs = encoded_pairs(map);
    pairs.sort_unstable();
    pairs.join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test fixture must be an object"),
        }
    }

    fn decode(query: &str) -> String {
        urlencoding::decode(&query.replace('+', " ")).unwrap().into_owned()
    }

    #[test]
    fn test_primitives() {
        let mut map = Map::new();
        map.insert("a".into(), json!("hello"));
        map.insert("b".into(), json!(100));
        map.insert("c".into(), json!(false));
        map.insert("d".into(), Value::Null);
        map.insert("b".into(), json!(999));

        assert_eq!(to_query(&map), "a=hello&b=999&c=0");
    }

    #[test]
    fn test_nested() {
        let map = object(json!({
            "a": { "aa": "bar", "ab": "foo" },
            "b": [{ "c": "foo" }, { "c": "bar" }],
        }));

        let query = to_query(&map);
        assert!(query.starts_with("a%5Baa%5D=bar"));
        assert_eq!(decode(&query), "a[aa]=bar&a[ab]=foo&b[0][c]=foo&b[1][c]=bar");
    }

    #[test]
    fn test_nested_nulls_and_empty_containers_are_dropped() {
        let map = object(json!({
            "a": { "x": null, "y": 1 },
            "b": [],
            "c": {},
            "d": [null, true],
        }));

        assert_eq!(decode(&to_query(&map)), "a[y]=1&d[1]=1");
    }

    #[test]
    fn test_form_encoding() {
        assert_eq!(encode_component("Hello world!"), "Hello+world%21");
        assert_eq!(encode_component("https://image.com"), "https%3A%2F%2Fimage.com");
        assert_eq!(encode_component("a-b_c.d*e~"), "a-b_c.d%2Ae%7E");
        assert_eq!(encode_component("ñ"), "%C3%B1");
    }

    #[test]
    fn test_segment_encoding() {
        assert_eq!(encode_segment("my-deck"), "my-deck");
        assert_eq!(encode_segment("a b/c"), "a%20b%2Fc");
    }

    #[test]
    fn test_insertion_order_preserved() {
        let map = object(json!({ "z": 1, "a": 2, "m": 3 }));
        assert_eq!(to_query(&map), "z=1&a=2&m=3");
    }

    #[test]
    fn test_sorted_query() {
        let map = object(json!({
            "title": "Hello world!",
            "__id": "dev forgot to slugify",
            "_w": "100",
            "_h": 200,
        }));

        assert_eq!(
            to_sorted_query(&map),
            "__id=dev+forgot+to+slugify&_h=200&_w=100&title=Hello+world%21"
        );
    }

    #[test]
    fn test_round_trip_decodes_to_pairs() {
        let map = object(json!({
            "title": "Ünïcode & spaces = fun",
            "n": 0.9,
            "flag": false,
            "skip": null,
            "tags": ["x y", "z"],
        }));

        let decoded: Vec<(String, String)> = form_urlencoded::parse(to_query(&map).as_bytes())
            .into_owned()
            .collect();
        assert_eq!(
            decoded,
            vec![
                ("title".to_string(), "Ünïcode & spaces = fun".to_string()),
                ("n".to_string(), "0.9".to_string()),
                ("flag".to_string(), "0".to_string()),
                ("tags[0]".to_string(), "x y".to_string()),
                ("tags[1]".to_string(), "z".to_string()),
            ]
        );
    }

    #[test]
    fn test_scalar_to_string() {
        assert_eq!(scalar_to_string(&json!(true)).as_deref(), Some("1"));
        assert_eq!(scalar_to_string(&json!(4)).as_deref(), Some("4"));
        assert_eq!(scalar_to_string(&json!("2.1")).as_deref(), Some("2.1"));
        assert_eq!(scalar_to_string(&Value::Null), None);
        assert_eq!(scalar_to_string(&json!([1])), None);
    }
}
