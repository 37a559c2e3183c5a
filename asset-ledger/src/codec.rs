//! Record codec
//!
//! Persisted records are bincode-encoded; read replies are JSON. The
//! persisted encoding is private to this module: callers only see
//! `encode`/`decode` and the JSON payload helpers.

use crate::Result;
use serde::{de::DeserializeOwned, Serialize};

/// Encode a record for storage
pub fn encode<T: Serialize + ?Sized>(record: &T) -> Result<Vec<u8>> {
    Ok(bincode::serialize(record)?)
}

/// Decode a stored record
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(bincode::deserialize(bytes)?)
}

/// Encode a read reply payload
pub fn to_payload<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Decode a read reply payload
pub fn from_payload<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(bytes)?)
}
