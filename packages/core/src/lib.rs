//! Core protostruct: native values and tagged Struct trees
//!
//! This layer converts between two representations of structured data:
//! - `Value`: native composite values. Objects are shared handles, so a
//!   value can be a graph with cycles
//! - `Struct` / `TaggedValue`: the tagged, self-describing tree an external
//!   serializer carries on the wire
//!
//! The encoder (`ObjectToStructConverter`, `obj_to_struct`) turns graphs into
//! trees under an explicit policy for cycles and non-plain values. The
//! decoder (`struct_to_obj`, `decode_value`) is its pure inverse.
//!
//! # Example
//!
//! ```rust
//! use protostruct_core::{object, obj_to_struct, struct_to_obj, ConvertOptions};
//!
//! let user = object! { "name" => "Alice", "tags" => vec!["admin"] };
//! let encoded = obj_to_struct(&user, ConvertOptions::default()).unwrap();
//! let decoded = struct_to_obj(&encoded).unwrap();
//!
//! assert_eq!(decoded, user);
//! ```

pub use bytes::Bytes;

mod classify;
mod decode;
mod encode;
mod error;
pub mod tagged;
mod value;

pub use classify::{classify, PlainObjectCache};
pub use decode::{decode_value, struct_to_obj};
pub use encode::{obj_to_struct, ConvertOptions, ObjectToStructConverter, CIRCULAR_PLACEHOLDER};
pub use error::Error;
pub use tagged::{Kind, ListValue, NullValue, Struct, TaggedValue};
pub use value::{Constructor, Object, ObjectType, Opaque, OpaqueObject, Property, Prototype, Value};
