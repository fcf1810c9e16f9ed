//! Error types for encoding and decoding.

/// Errors raised while converting between native values and `Struct` trees.
///
/// Every variant aborts the whole conversion: there is no partial result and
/// no per-field recovery.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An `Undefined` list element, or an object that is not plain data
    /// while stringification is disabled.
    #[error("Value of type {type_name} not recognized")]
    UnsupportedType { type_name: String },

    /// A plain object was reached again while it was still being encoded.
    #[error("Circular reference detected at {path}")]
    CircularReference { path: String },

    /// A tagged value with no populated variant, or an invalid wire payload.
    #[error("malformed struct: {message}")]
    MalformedStruct { message: String },
}

impl Error {
    /// Create an unsupported-type error for the given type name.
    pub fn unsupported(type_name: impl Into<String>) -> Self {
        Error::UnsupportedType {
            type_name: type_name.into(),
        }
    }

    /// Create a malformed-struct error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedStruct {
            message: message.into(),
        }
    }
}
