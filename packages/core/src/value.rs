//! The native Value type - composite values that may share structure.
//!
//! Unlike a `Struct` tree, native values form a graph: an [`Object`] is a
//! shared handle, so the same object can appear in several places, including
//! inside itself. Encoding is what turns a graph back into a tree.

use std::cell::{Cell, Ref, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use bytes::Bytes;

/// A native composite value.
///
/// # Design Notes
///
/// - `Number` is a single `f64` kind; integers are not distinguished
/// - `Undefined` marks an absent value. It is never encoded: object fields
///   holding it are skipped, anywhere else it is rejected
/// - `Object` and `Opaque` have identity; everything else is plain data
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// An absent value.
    Undefined,
    /// Explicit null.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit floating point.
    Number(f64),
    /// UTF-8 string.
    String(String),
    /// Binary blob, carried through unchanged.
    Bytes(Bytes),
    /// Ordered sequence of values.
    List(Vec<Value>),
    /// A shared, possibly cyclic, keyed object.
    Object(Object),
    /// A foreign value that is never treated as plain data.
    Opaque(Opaque),
}

impl Value {
    /// Create a binary blob from anything convertible to [`Bytes`].
    ///
    /// ```rust
    /// use protostruct_core::Value;
    ///
    /// assert_eq!(Value::bytes(vec![1u8, 2]).type_name(), "bytes");
    /// ```
    pub fn bytes(data: impl Into<Bytes>) -> Self {
        Value::Bytes(data.into())
    }

    /// Check if this value is undefined.
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the object handle, if this is an object.
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Get the string contents, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the number, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The kind of value, as reported in error messages.
    ///
    /// Objects and opaque values both report `object`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Object(_) | Value::Opaque(_) => "object",
        }
    }
}

/// The ancestor of an object, fixed when the object is created.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Prototype {
    /// No ancestor at all.
    Null,
    /// The base object type. Object literals and parsed JSON use this.
    #[default]
    Base,
    /// An instance of a named type.
    Derived(Rc<ObjectType>),
}

/// A named type that objects can be instances of.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectType {
    name: String,
    constructor: Option<Constructor>,
}

impl ObjectType {
    /// Create a type with an explicit constructor (or none).
    pub fn new(name: impl Into<String>, constructor: Option<Constructor>) -> Self {
        Self {
            name: name.into(),
            constructor,
        }
    }

    /// A class-like type whose constructor carries custom behavior.
    pub fn class(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            constructor: Some(Constructor::Named(name.clone())),
            name,
        }
    }

    /// A type constructed by the generic base object constructor.
    pub fn generic(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constructor: Some(Constructor::Generic),
        }
    }

    /// The type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared constructor, if the type has one.
    pub fn constructor(&self) -> Option<&Constructor> {
        self.constructor.as_ref()
    }
}

/// The constructor a type declares.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Constructor {
    /// The generic base object constructor, possibly from another context.
    Generic,
    /// A class or custom constructor.
    Named(String),
}

/// An own property of an object.
#[derive(Clone, Debug, PartialEq)]
pub struct Property {
    /// The property value.
    pub value: Value,
    /// Whether the property is visible to enumeration (and thus encoded).
    pub enumerable: bool,
}

struct ObjectData {
    prototype: Prototype,
    properties: BTreeMap<String, Property>,
    // Set while Debug is formatting this object.
    formatting: Cell<bool>,
}

/// A shared handle to a keyed object.
///
/// Cloning the handle does not copy the object; both handles have the same
/// identity. Properties can be changed through any handle, which is how
/// cyclic graphs are built.
///
/// ```rust
/// use protostruct_core::Object;
///
/// let node = Object::new();
/// node.insert("name", "root");
/// node.insert("self", node.clone());
///
/// assert!(Object::ptr_eq(&node, node.get("self").unwrap().as_object().unwrap()));
/// ```
#[derive(Clone)]
pub struct Object(Rc<RefCell<ObjectData>>);

impl Object {
    /// Create an empty object with the base prototype.
    pub fn new() -> Self {
        Self::with_prototype(Prototype::Base)
    }

    /// Create an empty object with no prototype.
    pub fn bare() -> Self {
        Self::with_prototype(Prototype::Null)
    }

    /// Create an empty instance of the given type.
    pub fn instance_of(ty: &Rc<ObjectType>) -> Self {
        Self::with_prototype(Prototype::Derived(Rc::clone(ty)))
    }

    /// Create an empty object with the given prototype.
    pub fn with_prototype(prototype: Prototype) -> Self {
        Object(Rc::new(RefCell::new(ObjectData {
            prototype,
            properties: BTreeMap::new(),
            formatting: Cell::new(false),
        })))
    }

    /// Set an enumerable property, returning the previous value.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.insert_property(key.into(), value.into(), true)
    }

    /// Set a non-enumerable property, returning the previous value.
    ///
    /// Hidden properties are readable but never encoded.
    pub fn insert_hidden(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.insert_property(key.into(), value.into(), false)
    }

    fn insert_property(&self, key: String, value: Value, enumerable: bool) -> Option<Value> {
        self.0
            .borrow_mut()
            .properties
            .insert(key, Property { value, enumerable })
            .map(|old| old.value)
    }

    /// Get a copy of a property value.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0
            .borrow()
            .properties
            .get(key)
            .map(|p| p.value.clone())
    }

    /// Remove a property, returning its value.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.0
            .borrow_mut()
            .properties
            .remove(key)
            .map(|p| p.value)
    }

    /// Check whether an own property exists, enumerable or not.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.borrow().properties.contains_key(key)
    }

    /// Number of own properties, enumerable or not.
    pub fn len(&self) -> usize {
        self.0.borrow().properties.len()
    }

    /// Check whether the object has no own properties.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Own enumerable keys, in order.
    pub fn keys(&self) -> Vec<String> {
        self.0
            .borrow()
            .properties
            .iter()
            .filter(|(_, p)| p.enumerable)
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Borrow the own properties.
    ///
    /// # Panics
    ///
    /// Panics if a property is being set through another handle while the
    /// borrow is alive.
    pub fn properties(&self) -> Ref<'_, BTreeMap<String, Property>> {
        Ref::map(self.0.borrow(), |data| &data.properties)
    }

    /// The object's prototype.
    pub fn prototype(&self) -> Prototype {
        self.0.borrow().prototype.clone()
    }

    /// Check whether two handles refer to the same object.
    pub fn ptr_eq(a: &Object, b: &Object) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    /// A number identifying this object while it is alive.
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    pub(crate) fn downgrade(&self) -> WeakObject {
        WeakObject(Rc::downgrade(&self.0))
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

/// Structural equality over own enumerable properties.
///
/// Comparing two distinct cyclic graphs does not terminate.
impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        if Object::ptr_eq(self, other) {
            return true;
        }
        let a = self.0.borrow();
        let b = other.0.borrow();
        if a.prototype != b.prototype {
            return false;
        }
        let visible = |props: &BTreeMap<String, Property>| -> Vec<(String, Value)> {
            props
                .iter()
                .filter(|(_, p)| p.enumerable)
                .map(|(k, p)| (k.clone(), p.value.clone()))
                .collect()
        };
        visible(&a.properties) == visible(&b.properties)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        if data.formatting.replace(true) {
            return f.write_str("[Circular]");
        }
        let result = f
            .debug_struct("Object")
            .field("prototype", &data.prototype)
            .field("properties", &data.properties)
            .finish();
        data.formatting.set(false);
        result
    }
}

/// A non-owning handle that keeps an object's address reserved.
pub(crate) struct WeakObject(Weak<RefCell<ObjectData>>);

impl WeakObject {
    pub(crate) fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

/// Behavior required of foreign values carried as [`Value::Opaque`].
///
/// `Display` provides the string form used when stringification is enabled.
pub trait OpaqueObject: fmt::Debug + fmt::Display {
    /// Name of the concrete type, for diagnostics.
    fn type_name(&self) -> &str;
}

/// A shared handle to a foreign value. Compares by identity.
#[derive(Clone)]
pub struct Opaque(Rc<dyn OpaqueObject>);

impl Opaque {
    /// Wrap a foreign value.
    pub fn new(value: impl OpaqueObject + 'static) -> Self {
        Opaque(Rc::new(value))
    }

    /// Name of the wrapped type.
    pub fn type_name(&self) -> &str {
        self.0.type_name()
    }

    /// Check whether two handles refer to the same value.
    pub fn ptr_eq(a: &Opaque, b: &Opaque) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&a.0), Rc::as_ptr(&b.0))
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        Opaque::ptr_eq(self, other)
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

/// Build a base-prototype [`Object`] from `key => value` pairs.
///
/// ```rust
/// use protostruct_core::{object, Value};
///
/// let point = object! { "x" => 1.0, "y" => 2.0 };
/// assert_eq!(point.get("y"), Some(Value::Number(2.0)));
/// ```
#[macro_export]
macro_rules! object {
    () => {
        $crate::Object::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let object = $crate::Object::new();
        $( object.insert($key, $value); )+
        object
    }};
}

// Conversion from common types

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(v as f64)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Number(v as f64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v as f64)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Bytes> for Value {
    fn from(v: Bytes) -> Self {
        Value::Bytes(v)
    }
}

impl From<Object> for Value {
    fn from(v: Object) -> Self {
        Value::Object(v)
    }
}

impl From<Opaque> for Value {
    fn from(v: Opaque) -> Self {
        Value::Opaque(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Undefined)
    }
}
