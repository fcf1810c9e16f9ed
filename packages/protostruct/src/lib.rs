//! protostruct: carry arbitrary JSON-like data inside a strongly-typed protocol message.
//!
//! Native composite values (objects, lists, strings, numbers, booleans, null,
//! binary blobs) are encoded into a tagged `Struct` tree and decoded back.
//! The core layer owns the data model and the conversion policy; the JSON
//! layer adds wire bytes and serde interop.
//!
//! ```rust
//! use protostruct::{object, obj_to_struct, struct_to_obj, ConvertOptions, JsonCodec};
//!
//! let config = object! { "retries" => 3, "hosts" => vec!["a", "b"] };
//! let s = obj_to_struct(&config, ConvertOptions::default()).unwrap();
//!
//! let bytes = JsonCodec::new().encode(&s).unwrap();
//! let restored = struct_to_obj(&JsonCodec::new().decode(&bytes).unwrap()).unwrap();
//! assert_eq!(restored, config);
//! ```

pub use protostruct_core::*;

pub mod json {
    //! JSON interop, re-exported from `protostruct-json`.
    pub use protostruct_json::*;
}

pub use protostruct_json::JsonCodec;
