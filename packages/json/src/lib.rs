//! JSON Integration for protostruct
//!
//! This layer connects Struct trees to JSON. It adds:
//! - `JsonCodec`: wire bytes for the tagged shape
//! - `json_to_value`: parsed JSON as native values
//! - `struct_to_json` / `tagged_to_json`: untagged JSON views of a tree
//! - `to_struct` / `from_struct`: serde types <-> Struct
//!
//! # Example
//!
//! ```rust
//! use protostruct_json::{from_struct, to_struct};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct User {
//!     name: String,
//!     age: u32,
//! }
//!
//! let user = User { name: "Alice".into(), age: 30 };
//! let s = to_struct(&user).unwrap();
//! let back: User = from_struct(&s).unwrap();
//! assert_eq!(back, user);
//! ```

pub use bytes::Bytes;

mod codec;
mod convert;
mod error;

pub use codec::JsonCodec;
pub use convert::{from_struct, json_to_value, struct_to_json, tagged_to_json, to_struct};
pub use error::Error;
