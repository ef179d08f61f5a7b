#![forbid(unsafe_code)]

//! Compacted JSON-LD as emitted by the connector's management API.
//!
//! The connector is inconsistent about cardinality: a property holding one
//! node is serialized as a bare object, several nodes as an array. It is
//! also inconsistent about prefixes (`odrl:permission` vs `permission`).
//! Everything that reads connector documents goes through the helpers here.

use serde_json::{json, Value};

pub const EDC_VOCAB: &str = "https://w3id.org/edc/v0.0.1/ns/";
pub const ODRL_NS: &str = "http://www.w3.org/ns/odrl/2/";
pub const DCAT_NS: &str = "http://www.w3.org/ns/dcat#";
pub const DCT_NS: &str = "http://purl.org/dc/terms/";
pub const DSPACE_NS: &str = "https://w3id.org/dspace/v0.8/";
pub const ODRL_CONTEXT_URL: &str = "http://www.w3.org/ns/odrl.jsonld";

pub const DATASPACE_PROTOCOL: &str = "dataspace-protocol-http";

pub const KEY_ID: &str = "@id";
pub const KEY_VALUE: &str = "@value";

/// Normalizes a singleton-or-list property to a list.
///
/// An object becomes a one-element list, an array is passed through, and
/// anything else (missing, null, scalar) is an empty list.
pub fn one_or_many(value: Option<&Value>) -> Vec<&Value> {
    match value {
        Some(Value::Object(_)) => value.into_iter().collect(),
        Some(Value::Array(items)) => items.iter().collect(),
        _ => Vec::new(),
    }
}

/// Like [`one_or_many`] but also accepts a bare string, for keyword-style
/// properties (`dcat:keyword`).
pub fn one_or_many_strings(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// Looks up `key` on an object, falling back to the key with its compact
/// prefix removed (`odrl:permission` -> `permission`).
pub fn property<'a>(node: &'a Value, key: &str) -> Option<&'a Value> {
    let obj = node.as_object()?;
    if let Some(v) = obj.get(key) {
        return Some(v);
    }
    let (_, bare) = key.split_once(':')?;
    obj.get(bare)
}

/// True when the value carries content: not null, not an empty object,
/// array or string.
pub fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Object(o)) => !o.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

/// Plain string form of a node that may be a string or an `{"@id": ..}`
/// reference.
pub fn id_or_str(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s.as_str()),
        Value::Object(o) => o.get(KEY_ID).and_then(Value::as_str),
        _ => None,
    }
}

/// Literal form of an operand: strings, `@id` references, `@value`
/// literals and scalars.
pub fn literal_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(o) => o
            .get(KEY_ID)
            .or_else(|| o.get(KEY_VALUE))
            .and_then(literal_string),
        _ => None,
    }
}

pub fn node_id(node: &Value) -> Option<&str> {
    node.get(KEY_ID).and_then(Value::as_str)
}

pub fn id_ref(id: &str) -> Value {
    json!({ "@id": id })
}

pub fn vocab_context() -> Value {
    json!({ "@vocab": EDC_VOCAB })
}

pub fn vocab_context_with_odrl() -> Value {
    json!({ "@vocab": EDC_VOCAB, "odrl": ODRL_NS })
}

pub fn negotiation_context() -> Value {
    json!({
        "@vocab": EDC_VOCAB,
        "edc": EDC_VOCAB,
        "odrl": ODRL_NS,
        "dcat": DCAT_NS,
        "dct": DCT_NS,
        "dspace": DSPACE_NS,
    })
}

pub fn query_spec() -> Value {
    json!({ "@context": vocab_context(), "@type": "QuerySpec" })
}
