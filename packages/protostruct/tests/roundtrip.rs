use std::fmt;
use std::rc::Rc;

use protostruct::json::{json_to_value, struct_to_json};
use protostruct::{
    decode_value, obj_to_struct, object, struct_to_obj, ConvertOptions, Error, JsonCodec, Kind,
    ListValue, Object, ObjectToStructConverter, ObjectType, Opaque, OpaqueObject, Struct,
    TaggedValue, Value,
};

#[derive(Debug)]
struct Point {
    x: i32,
    y: i32,
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point({}, {})", self.x, self.y)
    }
}

impl OpaqueObject for Point {
    fn type_name(&self) -> &str {
        "Point"
    }
}

fn sample() -> Object {
    object! {
        "null" => Value::Null,
        "flag" => false,
        "count" => 12,
        "ratio" => 0.25,
        "name" => "sample",
        "blob" => protostruct::Bytes::from_static(b"\xde\xad"),
        "list" => vec![Value::from(1), Value::from("two"), Value::List(vec![])],
        "nested" => object! { "deeper" => object! { "leaf" => true } },
    }
}

#[test]
fn plain_data_roundtrips() {
    let original = sample();
    let encoded = obj_to_struct(&original, ConvertOptions::default()).unwrap();
    let decoded = struct_to_obj(&encoded).unwrap();

    assert_eq!(decoded, original);
}

#[test]
fn roundtrips_through_wire_bytes() {
    let codec = JsonCodec::new();
    let encoded = obj_to_struct(&sample(), ConvertOptions::default()).unwrap();

    let bytes = codec.encode(&encoded).unwrap();
    let restored = struct_to_obj(&codec.decode(&bytes).unwrap()).unwrap();
    assert_eq!(restored, sample());
}

#[test]
fn parsed_json_roundtrips() {
    let json = serde_json::json!({
        "id": 7,
        "tags": ["a", "b"],
        "meta": {"owner": null, "active": true}
    });
    let value = json_to_value(json.clone());
    let encoded = obj_to_struct(value.as_object().unwrap(), ConvertOptions::default()).unwrap();

    assert_eq!(struct_to_json(&encoded).unwrap(), json);
}

#[test]
fn undefined_members_are_dropped() {
    let obj = object! { "a" => 1, "b" => Value::Undefined };
    let encoded = obj_to_struct(&obj, ConvertOptions::default()).unwrap();

    let expected: Struct = [("a", 1.0)].into_iter().collect();
    assert_eq!(encoded, expected);
}

#[test]
fn undefined_list_element_aborts() {
    let obj = object! {
        "ok" => "fine",
        "a" => Value::List(vec![Value::from(1), Value::Undefined]),
    };
    let err = obj_to_struct(&obj, ConvertOptions::default()).unwrap_err();
    assert!(matches!(err, Error::UnsupportedType { .. }));
}

#[test]
fn cycles_follow_policy() {
    let o = Object::new();
    o.insert("self", o.clone());

    let err = obj_to_struct(&o, ConvertOptions::default()).unwrap_err();
    assert!(matches!(err, Error::CircularReference { .. }));
    assert!(err.to_string().contains("Circular reference"));

    let options = ConvertOptions::new().with_remove_circular(true);
    let encoded = obj_to_struct(&o, options).unwrap();
    assert_eq!(encoded.get("self"), Some(&TaggedValue::from("[Circular]")));
}

#[test]
fn opaque_values_follow_policy() {
    let obj = object! { "at" => Opaque::new(Point { x: 1, y: 2 }) };

    let err = obj_to_struct(&obj, ConvertOptions::default()).unwrap_err();
    assert_eq!(err.to_string(), "Value of type object not recognized");

    let options = ConvertOptions::new().with_stringify(true);
    let encoded = obj_to_struct(&obj, options).unwrap();
    assert_eq!(encoded.get("at"), Some(&TaggedValue::from("Point(1, 2)")));
}

#[test]
fn converter_reuse_keeps_classification() {
    let ty = Rc::new(ObjectType::class("Widget"));
    let widget = Object::instance_of(&ty);
    let obj = object! { "w" => widget.clone(), "plain" => object! {} };

    let mut converter = ObjectToStructConverter::new(ConvertOptions::new().with_stringify(true));
    let first = converter.convert(&obj).unwrap();
    let second = converter.convert(&obj).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.get("w"), Some(&TaggedValue::from("[object Widget]")));
    assert!(!converter.classifier().is_plain_object(&widget));
    assert_eq!(converter.visiting_depth(), 0);
}

#[test]
fn wire_json_decodes_nested_struct() {
    let raw = br#"{"fields":{"p":{"structValue":{"fields":{"q":{"numberValue":5}}}}}}"#;
    let s = JsonCodec::new().decode(raw).unwrap();

    assert_eq!(
        struct_to_obj(&s).unwrap(),
        object! { "p" => object! { "q" => 5 } }
    );
}

#[test]
fn wire_json_decodes_list() {
    let raw = br#"{"listValue":{"values":[{"stringValue":"a"},{"nullValue":0}]}}"#;
    let value = JsonCodec::new().decode_value(raw).unwrap();

    assert!(matches!(
        value.kind(),
        Some(Kind::ListValue(ListValue { values })) if values.len() == 2
    ));
    assert_eq!(
        decode_value(&value).unwrap(),
        Value::List(vec![Value::from("a"), Value::Null])
    );
}

#[test]
fn wire_value_without_kind_fails_to_decode() {
    let raw = br#"{"fields":{"a":{}}}"#;
    let s = JsonCodec::new().decode(raw).unwrap();

    let err = struct_to_obj(&s).unwrap_err();
    assert_eq!(err.to_string(), "malformed struct: no kind set at $.a");
}
