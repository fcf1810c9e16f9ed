//! Encoding native values into tagged `Struct` trees.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::classify::PlainObjectCache;
use crate::tagged::{ListValue, Struct, TaggedValue};
use crate::value::{Object, Prototype, Value};
use crate::Error;

/// Placeholder emitted for a circular reference when `remove_circular` is set.
pub const CIRCULAR_PLACEHOLDER: &str = "[Circular]";

/// Encoder policy, fixed when the converter is created.
///
/// Both switches default to `false`, which makes the encoder strict: cycles
/// and non-plain values abort the conversion.
///
/// Hosts can load the options from their own configuration:
///
/// ```rust
/// use protostruct_core::ConvertOptions;
///
/// let options: ConvertOptions = serde_json::from_str(r#"{"removeCircular": true}"#).unwrap();
/// assert!(options.remove_circular);
/// assert!(!options.stringify);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConvertOptions {
    /// Emit [`CIRCULAR_PLACEHOLDER`] on a cycle instead of failing.
    pub remove_circular: bool,
    /// Emit the string form of non-plain values instead of failing.
    pub stringify: bool,
}

impl ConvertOptions {
    /// Strict options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `remove_circular`.
    pub fn with_remove_circular(mut self, remove_circular: bool) -> Self {
        self.remove_circular = remove_circular;
        self
    }

    /// Set `stringify`.
    pub fn with_stringify(mut self, stringify: bool) -> Self {
        self.stringify = stringify;
        self
    }
}

enum Segment {
    Key(String),
    Index(usize),
}

/// Depth-first encoder from native objects to [`Struct`] trees.
///
/// The converter tracks the objects currently being encoded (the ancestors
/// of the node being visited) to detect cycles. An object that appears
/// twice as a sibling is encoded twice; only re-entering an ancestor is a
/// cycle.
///
/// A converter may be reused for several conversions with the same options;
/// its classification cache carries over between them.
pub struct ObjectToStructConverter {
    options: ConvertOptions,
    classifier: PlainObjectCache,
    visiting: Vec<usize>,
    path: Vec<Segment>,
}

impl ObjectToStructConverter {
    /// Create a converter with the given options.
    pub fn new(options: ConvertOptions) -> Self {
        Self {
            options,
            classifier: PlainObjectCache::new(),
            visiting: Vec::new(),
            path: Vec::new(),
        }
    }

    /// The options this converter was created with.
    pub fn options(&self) -> ConvertOptions {
        self.options
    }

    /// Number of objects currently being encoded. Zero between calls.
    pub fn visiting_depth(&self) -> usize {
        self.visiting.len()
    }

    /// The classification cache.
    pub fn classifier(&mut self) -> &mut PlainObjectCache {
        &mut self.classifier
    }

    /// Encode the own enumerable properties of an object.
    ///
    /// Properties holding [`Value::Undefined`] are omitted. The object is on
    /// the visiting stack for the duration of the call and is removed again
    /// on every exit path, including errors. When the outermost call
    /// returns, cached classifications of dropped objects are discarded.
    ///
    /// # Errors
    ///
    /// The first unsupported value or cycle aborts the conversion.
    pub fn convert(&mut self, object: &Object) -> Result<Struct, Error> {
        tracing::trace!(depth = self.visiting.len(), "converting object");
        self.visiting.push(object.id());
        let result = self.convert_fields(object);
        self.visiting.pop();
        if self.visiting.is_empty() {
            self.classifier.prune();
        }
        result
    }

    fn convert_fields(&mut self, object: &Object) -> Result<Struct, Error> {
        let properties = object.properties();
        let mut fields = BTreeMap::new();
        for (key, property) in properties.iter() {
            if !property.enumerable || property.value.is_undefined() {
                continue;
            }
            self.path.push(Segment::Key(key.clone()));
            let encoded = self.encode_value(&property.value);
            self.path.pop();
            fields.insert(key.clone(), encoded?);
        }
        Ok(Struct { fields })
    }

    /// Encode a single value.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedType`] for `Undefined` (reachable through list
    ///   elements), and for non-plain values unless `stringify` is set
    /// - [`Error::CircularReference`] when a plain object is one of its own
    ///   ancestors, unless `remove_circular` is set
    pub fn encode_value(&mut self, value: &Value) -> Result<TaggedValue, Error> {
        match value {
            Value::Undefined => Err(Error::unsupported(value.type_name())),
            Value::Null => Ok(TaggedValue::null()),
            Value::Bool(b) => Ok((*b).into()),
            Value::Number(n) => Ok((*n).into()),
            Value::String(s) => Ok(s.as_str().into()),
            Value::List(items) => self.encode_list(items),
            Value::Bytes(bytes) => Ok(bytes.clone().into()),
            Value::Object(object) if self.classifier.is_plain_object(object) => {
                self.encode_plain(object)
            }
            Value::Object(object) => self.encode_foreign(value, || describe(object)),
            Value::Opaque(opaque) => self.encode_foreign(value, || opaque.to_string()),
        }
    }

    fn encode_list(&mut self, items: &[Value]) -> Result<TaggedValue, Error> {
        let mut values = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            self.path.push(Segment::Index(index));
            let encoded = self.encode_value(item);
            self.path.pop();
            values.push(encoded?);
        }
        Ok(ListValue { values }.into())
    }

    fn encode_plain(&mut self, object: &Object) -> Result<TaggedValue, Error> {
        if self.visiting.contains(&object.id()) {
            let path = self.current_path();
            if !self.options.remove_circular {
                return Err(Error::CircularReference { path });
            }
            tracing::debug!(%path, "replacing circular reference");
            return Ok(CIRCULAR_PLACEHOLDER.into());
        }
        Ok(self.convert(object)?.into())
    }

    fn encode_foreign(
        &self,
        value: &Value,
        render: impl FnOnce() -> String,
    ) -> Result<TaggedValue, Error> {
        if !self.options.stringify {
            return Err(Error::unsupported(value.type_name()));
        }
        let rendered = render();
        tracing::debug!(path = %self.current_path(), "stringifying {}", foreign_name(value));
        Ok(rendered.into())
    }

    fn current_path(&self) -> String {
        let mut out = String::from("$");
        for segment in &self.path {
            match segment {
                Segment::Key(key) => {
                    let _ = write!(out, ".{}", key);
                }
                Segment::Index(index) => {
                    let _ = write!(out, "[{}]", index);
                }
            }
        }
        out
    }
}

impl Default for ObjectToStructConverter {
    fn default() -> Self {
        Self::new(ConvertOptions::default())
    }
}

/// Encode an object with a fresh converter.
///
/// ```rust
/// use protostruct_core::{object, obj_to_struct, ConvertOptions, TaggedValue};
///
/// let s = obj_to_struct(&object! { "a" => 1.0 }, ConvertOptions::default()).unwrap();
/// assert_eq!(s.get("a"), Some(&TaggedValue::from(1.0)));
/// ```
pub fn obj_to_struct(object: &Object, options: ConvertOptions) -> Result<Struct, Error> {
    ObjectToStructConverter::new(options).convert(object)
}

// String form of a non-plain object.
fn describe(object: &Object) -> String {
    match object.prototype() {
        Prototype::Derived(ty) => format!("[object {}]", ty.name()),
        Prototype::Null | Prototype::Base => "[object Object]".to_string(),
    }
}

fn foreign_name(value: &Value) -> String {
    match value {
        Value::Opaque(opaque) => opaque.type_name().to_string(),
        Value::Object(object) => match object.prototype() {
            Prototype::Derived(ty) => ty.name().to_string(),
            Prototype::Null | Prototype::Base => "Object".to_string(),
        },
        other => other.type_name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::fmt;
    use std::rc::Rc;

    use bytes::Bytes;

    use super::*;
    use crate::object;
    use crate::tagged::Kind;
    use crate::value::{ObjectType, Opaque, OpaqueObject};

    #[derive(Debug)]
    struct Timestamp(u64);

    impl fmt::Display for Timestamp {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "ts:{}", self.0)
        }
    }

    impl OpaqueObject for Timestamp {
        fn type_name(&self) -> &str {
            "Timestamp"
        }
    }

    fn strict() -> ObjectToStructConverter {
        ObjectToStructConverter::default()
    }

    fn struct_field<'a>(s: &'a Struct, key: &str) -> &'a Struct {
        match s.get(key).and_then(TaggedValue::kind) {
            Some(Kind::StructValue(inner)) => inner,
            other => panic!("expected struct at {}, got {:?}", key, other),
        }
    }

    #[test]
    fn encodes_scalars() {
        let obj = object! {
            "null" => Value::Null,
            "flag" => true,
            "n" => 2.5,
            "s" => "text",
            "blob" => Bytes::from_static(b"\x00\xff"),
        };
        let s = strict().convert(&obj).unwrap();

        assert_eq!(s.get("null"), Some(&TaggedValue::null()));
        assert_eq!(s.get("flag"), Some(&TaggedValue::from(true)));
        assert_eq!(s.get("n"), Some(&TaggedValue::from(2.5)));
        assert_eq!(s.get("s"), Some(&TaggedValue::from("text")));
        assert_eq!(
            s.get("blob"),
            Some(&TaggedValue::from(Bytes::from_static(b"\x00\xff")))
        );
    }

    #[test]
    fn undefined_fields_are_omitted() {
        let obj = object! { "a" => 1, "b" => Value::Undefined };
        let s = strict().convert(&obj).unwrap();

        assert_eq!(s.len(), 1);
        assert_eq!(s.get("a"), Some(&TaggedValue::from(1.0)));
        assert!(s.get("b").is_none());
    }

    #[test]
    fn hidden_fields_are_omitted() {
        let obj = object! { "a" => 1 };
        obj.insert_hidden("internal", "x");
        let s = strict().convert(&obj).unwrap();

        assert_eq!(s.len(), 1);
        assert!(s.get("internal").is_none());
    }

    #[test]
    fn undefined_in_list_fails() {
        let obj = object! { "a" => Value::List(vec![Value::from(1), Value::Undefined]) };
        let err = strict().convert(&obj).unwrap_err();

        assert_eq!(err, Error::unsupported("undefined"));
        assert_eq!(err.to_string(), "Value of type undefined not recognized");
    }

    #[test]
    fn lists_preserve_order() {
        let obj = object! { "xs" => vec!["b", "a", "c"] };
        let s = strict().convert(&obj).unwrap();

        let expected = TaggedValue::from(ListValue::from_iter(
            ["b", "a", "c"].into_iter().map(TaggedValue::from),
        ));
        assert_eq!(s.get("xs"), Some(&expected));
    }

    #[test]
    fn circular_fails_by_default() {
        let obj = Object::new();
        obj.insert("self", obj.clone());
        let mut converter = strict();

        let err = converter.convert(&obj).unwrap_err();
        assert_eq!(
            err,
            Error::CircularReference {
                path: "$.self".to_string()
            }
        );
        assert_eq!(converter.visiting_depth(), 0);
    }

    #[test]
    fn circular_is_replaced_when_removing() {
        let obj = Object::new();
        obj.insert("self", obj.clone());
        let options = ConvertOptions::new().with_remove_circular(true);

        let s = obj_to_struct(&obj, options).unwrap();
        assert_eq!(s.get("self"), Some(&TaggedValue::from("[Circular]")));
    }

    #[test]
    fn indirect_cycle_reports_path() {
        let a = Object::new();
        let b = object! { "items" => vec![Value::from(a.clone())] };
        a.insert("b", b);

        let err = strict().convert(&a).unwrap_err();
        assert_eq!(
            err,
            Error::CircularReference {
                path: "$.b.items[0]".to_string()
            }
        );

        let options = ConvertOptions::new().with_remove_circular(true);
        let s = obj_to_struct(&a, options).unwrap();
        let b = struct_field(&s, "b");
        let expected = TaggedValue::from(ListValue::from_iter([TaggedValue::from("[Circular]")]));
        assert_eq!(b.get("items"), Some(&expected));
    }

    #[test]
    fn shared_siblings_are_not_cycles() {
        let shared = object! { "v" => 1 };
        let obj = object! { "left" => shared.clone(), "right" => shared };
        let s = strict().convert(&obj).unwrap();

        assert_eq!(struct_field(&s, "left"), struct_field(&s, "right"));
    }

    #[test]
    fn opaque_fails_by_default() {
        let obj = object! { "at" => Opaque::new(Timestamp(42)) };
        let err = strict().convert(&obj).unwrap_err();

        assert_eq!(err.to_string(), "Value of type object not recognized");
    }

    #[test]
    fn opaque_is_stringified_when_enabled() {
        let obj = object! { "at" => Opaque::new(Timestamp(42)) };
        let options = ConvertOptions::new().with_stringify(true);

        let s = obj_to_struct(&obj, options).unwrap();
        assert_eq!(s.get("at"), Some(&TaggedValue::from("ts:42")));
    }

    #[test]
    fn class_instances_are_not_structs() {
        let ty = Rc::new(ObjectType::class("Point"));
        let point = Object::instance_of(&ty);
        point.insert("x", 1);
        let obj = object! { "p" => point };

        let err = strict().convert(&obj).unwrap_err();
        assert_eq!(err, Error::unsupported("object"));

        let options = ConvertOptions::new().with_stringify(true);
        let s = obj_to_struct(&obj, options).unwrap();
        assert_eq!(s.get("p"), Some(&TaggedValue::from("[object Point]")));
    }

    #[test]
    fn generic_instances_are_structs() {
        let ty = Rc::new(ObjectType::generic("Object"));
        let record = Object::instance_of(&ty);
        record.insert("x", 1);
        let obj = object! { "r" => record };

        let s = strict().convert(&obj).unwrap();
        assert_eq!(struct_field(&s, "r").get("x"), Some(&TaggedValue::from(1.0)));
    }

    #[test]
    fn failure_unwinds_visiting_stack() {
        let obj = object! {
            "inner" => object! { "bad" => Opaque::new(Timestamp(1)) },
        };
        let mut converter = strict();
        assert!(converter.convert(&obj).is_err());
        assert_eq!(converter.visiting_depth(), 0);

        // The same converter still encodes the object once it is fixed.
        obj.insert("inner", object! { "good" => 1 });
        assert!(converter.convert(&obj).is_ok());
    }

    #[test]
    fn reused_converter_forgets_dropped_objects() {
        let mut converter = strict();
        {
            let first = object! { "x" => object! {}, "y" => object! {} };
            converter.convert(&first).unwrap();
            assert_eq!(converter.classifier().len(), 2);
        }

        let second = object! { "a" => object! {} };
        converter.convert(&second).unwrap();
        assert_eq!(converter.classifier().len(), 1);
    }

    #[test]
    fn options_default_to_strict() {
        let options: ConvertOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, ConvertOptions::default());
        assert!(!options.remove_circular);
        assert!(!options.stringify);
    }
}
