//! The tagged Struct representation.
//!
//! A [`Struct`] is a mapping from field name to [`TaggedValue`], and each
//! tagged value carries exactly one [`Kind`]. This is the shape that an
//! external serializer (protobuf, JSON) puts on the wire.
//!
//! # Wire shape
//!
//! With serde, the tree uses the canonical camelCase field names:
//!
//! ```json
//! {"fields": {"id": {"numberValue": 7.0}, "tags": {"listValue": {"values": [{"nullValue": 0}]}}}}
//! ```
//!
//! `blobValue` payloads are base64 (standard alphabet). Non-finite numbers
//! are written as the strings `"NaN"`, `"Infinity"` and `"-Infinity"`.
//! `nullValue` is written as `0`; `null` is accepted when reading.

use std::collections::BTreeMap;

use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::Error;

/// An encoded mapping from field name to tagged value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Struct {
    #[serde(default)]
    pub fields: BTreeMap<String, TaggedValue>,
}

impl Struct {
    /// Create an empty struct.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, returning the previous value.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<TaggedValue>,
    ) -> Option<TaggedValue> {
        self.fields.insert(key.into(), value.into())
    }

    /// Get a field.
    pub fn get(&self, key: &str) -> Option<&TaggedValue> {
        self.fields.get(key)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check whether the struct has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<TaggedValue>> FromIterator<(K, V)> for Struct {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Struct {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// An ordered sequence of tagged values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ListValue {
    #[serde(default)]
    pub values: Vec<TaggedValue>,
}

impl FromIterator<TaggedValue> for ListValue {
    fn from_iter<I: IntoIterator<Item = TaggedValue>>(iter: I) -> Self {
        ListValue {
            values: iter.into_iter().collect(),
        }
    }
}

/// The null marker. On the wire it is always the number `0`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct NullValue;

impl From<NullValue> for i32 {
    fn from(_: NullValue) -> i32 {
        0
    }
}

impl TryFrom<i32> for NullValue {
    type Error = Error;

    fn try_from(v: i32) -> Result<Self, Error> {
        if v == 0 {
            Ok(NullValue)
        } else {
            Err(Error::malformed(format!("nullValue must be 0, got {}", v)))
        }
    }
}

/// The populated variant of a tagged value.
#[derive(Clone, Debug, PartialEq)]
pub enum Kind {
    NullValue(NullValue),
    BoolValue(bool),
    NumberValue(f64),
    StringValue(String),
    BlobValue(Bytes),
    ListValue(ListValue),
    StructValue(Struct),
}

impl Kind {
    /// The wire name of this variant.
    pub fn name(&self) -> &'static str {
        match self {
            Kind::NullValue(_) => "nullValue",
            Kind::BoolValue(_) => "boolValue",
            Kind::NumberValue(_) => "numberValue",
            Kind::StringValue(_) => "stringValue",
            Kind::BlobValue(_) => "blobValue",
            Kind::ListValue(_) => "listValue",
            Kind::StructValue(_) => "structValue",
        }
    }
}

/// A value with exactly one populated [`Kind`].
///
/// `kind` is `None` only for malformed input (for example a wire object with
/// no recognized variant); the decoder rejects it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireValue", into = "WireValue")]
pub struct TaggedValue {
    pub kind: Option<Kind>,
}

impl TaggedValue {
    /// Wrap a kind.
    pub fn new(kind: Kind) -> Self {
        TaggedValue { kind: Some(kind) }
    }

    /// The null tagged value.
    pub fn null() -> Self {
        Self::new(Kind::NullValue(NullValue))
    }

    /// The populated variant, if any.
    pub fn kind(&self) -> Option<&Kind> {
        self.kind.as_ref()
    }
}

impl From<Kind> for TaggedValue {
    fn from(kind: Kind) -> Self {
        TaggedValue::new(kind)
    }
}

impl From<bool> for TaggedValue {
    fn from(v: bool) -> Self {
        Kind::BoolValue(v).into()
    }
}

impl From<f64> for TaggedValue {
    fn from(v: f64) -> Self {
        Kind::NumberValue(v).into()
    }
}

impl From<String> for TaggedValue {
    fn from(v: String) -> Self {
        Kind::StringValue(v).into()
    }
}

impl From<&str> for TaggedValue {
    fn from(v: &str) -> Self {
        Kind::StringValue(v.to_string()).into()
    }
}

impl From<Bytes> for TaggedValue {
    fn from(v: Bytes) -> Self {
        Kind::BlobValue(v).into()
    }
}

impl From<ListValue> for TaggedValue {
    fn from(v: ListValue) -> Self {
        Kind::ListValue(v).into()
    }
}

impl From<Struct> for TaggedValue {
    fn from(v: Struct) -> Self {
        Kind::StructValue(v).into()
    }
}

/// Serde form of a tagged value: every variant as an optional field.
#[derive(Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct WireValue {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_null_value"
    )]
    null_value: Option<NullValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bool_value: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "number_value")]
    number_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    string_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    blob_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    list_value: Option<ListValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    struct_value: Option<Struct>,
}

// A present `nullValue` is either `0` or JSON `null`.
fn deserialize_null_value<'de, D>(deserializer: D) -> Result<Option<NullValue>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<i32>::deserialize(deserializer)? {
        None => Ok(Some(NullValue)),
        Some(v) => NullValue::try_from(v).map(Some).map_err(serde::de::Error::custom),
    }
}

/// `numberValue` on the wire: finite numbers as JSON numbers, non-finite
/// ones as the strings `"NaN"`, `"Infinity"` and `"-Infinity"`.
mod number_value {
    use std::fmt;

    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    const NAN: &str = "NaN";
    const INFINITY: &str = "Infinity";
    const NEG_INFINITY: &str = "-Infinity";

    pub(super) fn serialize<S: Serializer>(v: &Option<f64>, s: S) -> Result<S::Ok, S::Error> {
        match *v {
            None => s.serialize_none(),
            Some(f) if f.is_nan() => s.serialize_str(NAN),
            Some(f) if f == f64::INFINITY => s.serialize_str(INFINITY),
            Some(f) if f == f64::NEG_INFINITY => s.serialize_str(NEG_INFINITY),
            Some(f) => s.serialize_f64(f),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        d.deserialize_any(NumberVisitor).map(Some)
    }

    struct NumberVisitor;

    impl Visitor<'_> for NumberVisitor {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "a number, \"{}\", \"{}\" or \"{}\"", NAN, INFINITY, NEG_INFINITY)
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
            match v {
                NAN => Ok(f64::NAN),
                INFINITY => Ok(f64::INFINITY),
                NEG_INFINITY => Ok(f64::NEG_INFINITY),
                other => Err(E::custom(format!("invalid numberValue: {:?}", other))),
            }
        }
    }
}

impl From<TaggedValue> for WireValue {
    fn from(value: TaggedValue) -> Self {
        let mut wire = WireValue::default();
        match value.kind {
            None => {}
            Some(Kind::NullValue(v)) => wire.null_value = Some(v),
            Some(Kind::BoolValue(v)) => wire.bool_value = Some(v),
            Some(Kind::NumberValue(v)) => wire.number_value = Some(v),
            Some(Kind::StringValue(v)) => wire.string_value = Some(v),
            Some(Kind::BlobValue(v)) => {
                wire.blob_value = Some(base64::engine::general_purpose::STANDARD.encode(&v))
            }
            Some(Kind::ListValue(v)) => wire.list_value = Some(v),
            Some(Kind::StructValue(v)) => wire.struct_value = Some(v),
        }
        wire
    }
}

impl TryFrom<WireValue> for TaggedValue {
    type Error = Error;

    fn try_from(wire: WireValue) -> Result<Self, Error> {
        let mut kinds = Vec::with_capacity(1);
        if let Some(v) = wire.null_value {
            kinds.push(Kind::NullValue(v));
        }
        if let Some(v) = wire.bool_value {
            kinds.push(Kind::BoolValue(v));
        }
        if let Some(v) = wire.number_value {
            kinds.push(Kind::NumberValue(v));
        }
        if let Some(v) = wire.string_value {
            kinds.push(Kind::StringValue(v));
        }
        if let Some(encoded) = wire.blob_value {
            let raw = base64::engine::general_purpose::STANDARD
                .decode(&encoded)
                .map_err(|e| Error::malformed(format!("invalid blobValue: {}", e)))?;
            kinds.push(Kind::BlobValue(Bytes::from(raw)));
        }
        if let Some(v) = wire.list_value {
            kinds.push(Kind::ListValue(v));
        }
        if let Some(v) = wire.struct_value {
            kinds.push(Kind::StructValue(v));
        }

        if kinds.len() > 1 {
            let names: Vec<&str> = kinds.iter().map(Kind::name).collect();
            return Err(Error::malformed(format!(
                "more than one kind populated: {}",
                names.join(", ")
            )));
        }
        Ok(TaggedValue { kind: kinds.pop() })
    }
}
