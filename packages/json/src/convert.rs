//! Conversions between protostruct values and serde types.

use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;

use protostruct_core::{obj_to_struct, ConvertOptions, Kind, Object, Struct, TaggedValue, Value};

use crate::Error;

/// Convert a Rust type to a Struct via serde.
///
/// The type must serialize to a JSON object. Serialized data is always
/// plain, so the strict default options are used.
pub fn to_struct<T: Serialize>(data: &T) -> Result<Struct, Error> {
    // Serialize to serde_json::Value first, then encode the parsed object
    let json = serde_json::to_value(data)?;
    let map = match json {
        serde_json::Value::Object(map) => map,
        other => {
            return Err(Error::NotAnObject {
                found: json_kind(&other),
            })
        }
    };
    Ok(obj_to_struct(&map_to_object(map), ConvertOptions::default())?)
}

/// Convert a Struct to a Rust type via serde.
pub fn from_struct<T: DeserializeOwned>(s: &Struct) -> Result<T, Error> {
    Ok(serde_json::from_value(struct_to_json(s)?)?)
}

/// Convert parsed JSON to a native value.
///
/// JSON objects become base-prototype (plain) objects.
pub fn json_to_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        // as_f64 is always Some without serde_json's arbitrary_precision
        serde_json::Value::Number(n) => n.as_f64().map_or(Value::Null, Value::Number),
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(arr) => Value::List(arr.into_iter().map(json_to_value).collect()),
        serde_json::Value::Object(map) => Value::Object(map_to_object(map)),
    }
}

fn map_to_object(map: serde_json::Map<String, serde_json::Value>) -> Object {
    let object = Object::new();
    for (k, v) in map {
        object.insert(k, json_to_value(v));
    }
    object
}

/// Convert a Struct to untagged JSON.
pub fn struct_to_json(s: &Struct) -> Result<serde_json::Value, Error> {
    let mut map = serde_json::Map::new();
    for (k, v) in &s.fields {
        map.insert(k.clone(), tagged_to_json(v)?);
    }
    Ok(serde_json::Value::Object(map))
}

/// Convert a tagged value to untagged JSON.
///
/// Blobs become base64 strings, integral numbers become JSON integers and
/// non-finite numbers become `null`.
pub fn tagged_to_json(value: &TaggedValue) -> Result<serde_json::Value, Error> {
    let kind = value
        .kind()
        .ok_or_else(|| protostruct_core::Error::malformed("no kind set"))?;
    Ok(match kind {
        Kind::NullValue(_) => serde_json::Value::Null,
        Kind::BoolValue(b) => serde_json::Value::Bool(*b),
        Kind::NumberValue(f) => number_to_json(*f),
        Kind::StringValue(s) => serde_json::Value::String(s.clone()),
        Kind::BlobValue(b) => {
            // JSON doesn't have bytes, so we base64 encode
            let encoded = base64::engine::general_purpose::STANDARD.encode(b);
            serde_json::Value::String(encoded)
        }
        Kind::ListValue(list) => serde_json::Value::Array(
            list.values
                .iter()
                .map(tagged_to_json)
                .collect::<Result<_, _>>()?,
        ),
        Kind::StructValue(s) => struct_to_json(s)?,
    })
}

// Integral numbers within the exact f64 range are written as JSON integers
// so that integer fields deserialize again. Negative zero stays a float.
fn number_to_json(f: f64) -> serde_json::Value {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    let negative_zero = f == 0.0 && f.is_sign_negative();
    if f.fract() == 0.0 && f.abs() <= MAX_EXACT && !negative_zero {
        return serde_json::Value::Number((f as i64).into());
    }
    serde_json::Number::from_f64(f)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
