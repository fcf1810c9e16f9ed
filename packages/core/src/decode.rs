//! Decoding tagged `Struct` trees back into native values.
//!
//! Decoding is a pure tree walk: no options, no shared state. The result is
//! always a tree of fresh base-prototype objects.

use std::fmt;

use crate::tagged::{Kind, Struct, TaggedValue};
use crate::value::{Object, Value};
use crate::Error;

/// Decode a struct into a plain object.
///
/// # Errors
///
/// Returns [`Error::MalformedStruct`] if any value in the tree has no
/// populated kind.
pub fn struct_to_obj(s: &Struct) -> Result<Object, Error> {
    decode_struct(s, &Location::Root)
}

/// Decode a single tagged value.
///
/// ```rust
/// use protostruct_core::{decode_value, ListValue, TaggedValue, Value};
///
/// let items = [TaggedValue::from("a"), TaggedValue::null()];
/// let list = TaggedValue::from(ListValue::from_iter(items));
/// assert_eq!(
///     decode_value(&list).unwrap(),
///     Value::List(vec![Value::from("a"), Value::Null]),
/// );
/// ```
pub fn decode_value(value: &TaggedValue) -> Result<Value, Error> {
    decode_at(value, &Location::Root)
}

fn decode_struct(s: &Struct, at: &Location<'_>) -> Result<Object, Error> {
    let object = Object::new();
    for (key, value) in &s.fields {
        let decoded = decode_at(value, &Location::Key(at, key))?;
        object.insert(key.clone(), decoded);
    }
    Ok(object)
}

fn decode_at(value: &TaggedValue, at: &Location<'_>) -> Result<Value, Error> {
    let kind = value
        .kind()
        .ok_or_else(|| Error::malformed(format!("no kind set at {}", at)))?;
    Ok(match kind {
        Kind::StructValue(s) => Value::Object(decode_struct(s, at)?),
        Kind::NullValue(_) => Value::Null,
        Kind::ListValue(list) => Value::List(
            list.values
                .iter()
                .enumerate()
                .map(|(i, v)| decode_at(v, &Location::Index(at, i)))
                .collect::<Result<_, _>>()?,
        ),
        Kind::BoolValue(b) => Value::Bool(*b),
        Kind::NumberValue(n) => Value::Number(*n),
        Kind::StringValue(s) => Value::String(s.clone()),
        Kind::BlobValue(b) => Value::Bytes(b.clone()),
    })
}

// Where in the tree a value sits; only rendered when reporting an error.
enum Location<'a> {
    Root,
    Key(&'a Location<'a>, &'a str),
    Index(&'a Location<'a>, usize),
}

impl fmt::Display for Location<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Root => write!(f, "$"),
            Location::Key(parent, key) => write!(f, "{}.{}", parent, key),
            Location::Index(parent, i) => write!(f, "{}[{}]", parent, i),
        }
    }
}
