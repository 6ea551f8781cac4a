//! Entry Envelope Module
//!
//! Wraps a single value together with the key it is stored under and turns it
//! into the byte payload both backends persist.
//!
//! # Wire Format
//! ```text
//! [0..2]  magic b"DC"
//! [2]     format version
//! [3..7]  payload length, u32 big-endian
//! [7..]   MessagePack map with exactly one entry: { key: value }
//! ```

use std::collections::{BTreeMap, HashMap};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::CodecError;

// == Format Constants ==
/// Leading bytes of every envelope
pub const ENVELOPE_MAGIC: [u8; 2] = *b"DC";

/// Current envelope format version
pub const ENVELOPE_VERSION: u8 = 1;

/// Magic + version + length prefix
pub const HEADER_LEN: usize = 7;

// == Entry ==
/// A single key/value pair used as a serialization envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<V> {
    key: String,
    value: V,
}

impl<V> Entry<V> {
    // == Constructor ==
    /// Creates an envelope for `value` stored under `key`.
    pub fn new(key: impl Into<String>, value: V) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// The key the value is stored under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Borrows the wrapped value.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Consumes the envelope, returning the wrapped value.
    pub fn into_value(self) -> V {
        self.value
    }
}

impl<V: Serialize> Entry<V> {
    // == Encode ==
    /// Serializes the envelope into its wire form.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        encode(&self.key, &self.value)
    }
}

impl<V: DeserializeOwned> Entry<V> {
    // == Decode ==
    /// Parses an envelope that must hold exactly `key`.
    pub fn decode(key: &str, bytes: &[u8]) -> Result<Self, CodecError> {
        decode(key, bytes).map(|value| Self::new(key, value))
    }
}

// == Codec Functions ==
/// Encodes `value` under `key` without taking ownership of either.
pub fn encode<V: Serialize + ?Sized>(key: &str, value: &V) -> Result<Vec<u8>, CodecError> {
    let mut mapping = BTreeMap::new();
    mapping.insert(key, value);
    let payload = rmp_serde::to_vec_named(&mapping)?;

    let len = u32::try_from(payload.len()).map_err(|_| CodecError::TooLarge(payload.len()))?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(&ENVELOPE_MAGIC);
    bytes.push(ENVELOPE_VERSION);
    bytes.extend_from_slice(&len.to_be_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decodes an envelope and returns the value stored under `key`.
pub fn decode<V: DeserializeOwned>(key: &str, bytes: &[u8]) -> Result<V, CodecError> {
    let payload = payload(bytes)?;

    let mut mapping: HashMap<String, V> = rmp_serde::from_slice(payload)?;
    if mapping.len() != 1 {
        return Err(CodecError::KeyMismatch {
            expected: key.to_string(),
        });
    }

    mapping.remove(key).ok_or_else(|| CodecError::KeyMismatch {
        expected: key.to_string(),
    })
}

/// Validates the header and returns the payload slice.
fn payload(bytes: &[u8]) -> Result<&[u8], CodecError> {
    if bytes.len() < HEADER_LEN {
        return Err(CodecError::Truncated {
            needed: HEADER_LEN,
            actual: bytes.len(),
        });
    }
    if bytes[..2] != ENVELOPE_MAGIC {
        return Err(CodecError::BadMagic);
    }
    if bytes[2] != ENVELOPE_VERSION {
        return Err(CodecError::UnsupportedVersion(bytes[2]));
    }

    let len = u32::from_be_bytes([bytes[3], bytes[4], bytes[5], bytes[6]]) as usize;
    let needed = HEADER_LEN + len;
    if bytes.len() < needed {
        return Err(CodecError::Truncated {
            needed,
            actual: bytes.len(),
        });
    }
    if bytes.len() > needed {
        return Err(CodecError::TrailingBytes(bytes.len() - needed));
    }

    Ok(&bytes[HEADER_LEN..])
}
