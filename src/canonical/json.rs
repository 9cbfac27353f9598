//! Canonical JSON text: object keys sorted recursively, no insignificant
//! whitespace. Every hash and signature in the engine is taken over this form.

use crate::model::Hash;
use crate::Result;
use serde::Serialize;
use serde_json::Value;

/// Serialize a JSON value canonically
pub fn to_canonical_string(value: &Value) -> String {
    let mut out = String::new();
    write_value(value, &mut out);
    out
}

/// Serialize any serde value canonically
pub fn to_canonical_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let value = serde_json::to_value(value)?;
    Ok(to_canonical_string(&value).into_bytes())
}

/// SHA3-256 over the canonical form; used as a tie-free sort key
pub fn content_hash<T: Serialize + ?Sized>(value: &T) -> Result<Hash> {
    Ok(Hash::sha3(&to_canonical_bytes(value)?))
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(key, out);
                out.push(':');
                write_value(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        Value::String(s) => write_string(s, out),
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn write_string(s: &str, out: &mut String) {
    out.push_str(&Value::String(s.to_owned()).to_string());
}
