//! Wire codec for Struct trees.

use bytes::Bytes;
use protostruct_core::{Struct, TaggedValue};

use crate::Error;

/// A codec that writes Struct trees as wire JSON.
///
/// The output keeps the tagged shape (`{"fields": {"a": {"numberValue": 1.0}}}`),
/// so decoding restores the exact tree, kinds included.
///
/// # Example
///
/// ```rust
/// use protostruct_json::JsonCodec;
/// use protostruct_core::{Struct, TaggedValue};
///
/// let codec = JsonCodec::new();
/// let mut s = Struct::new();
/// s.insert("greeting", "hello");
///
/// let bytes = codec.encode(&s).unwrap();
/// let decoded = codec.decode(&bytes).unwrap();
///
/// assert_eq!(decoded, s);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    /// Create a codec producing compact JSON.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a codec producing indented JSON.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    /// Encode a struct to wire bytes.
    pub fn encode(&self, s: &Struct) -> Result<Bytes, Error> {
        self.write(s)
    }

    /// Decode wire bytes into a struct.
    ///
    /// Values with more than one populated kind, or invalid blob payloads,
    /// are rejected here; values with no kind are left for the decoder.
    pub fn decode(&self, bytes: &[u8]) -> Result<Struct, Error> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Encode a single tagged value to wire bytes.
    pub fn encode_value(&self, value: &TaggedValue) -> Result<Bytes, Error> {
        self.write(value)
    }

    /// Decode wire bytes into a single tagged value.
    pub fn decode_value(&self, bytes: &[u8]) -> Result<TaggedValue, Error> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn write<T: serde::Serialize>(&self, data: &T) -> Result<Bytes, Error> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(data)?
        } else {
            serde_json::to_vec(data)?
        };
        Ok(Bytes::from(bytes))
    }
}
