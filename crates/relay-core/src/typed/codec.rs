//! PayloadCodec - envelope bytes / payload と型付き値の相互変換
//!
//! I/O なしの純粋関数。同じ入力には常に同じ出力。

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::domain::Envelope;

#[derive(Debug, Error)]
pub enum CodecError {
    /// Payload does not match the expected shape (missing field, wrong type).
    #[error("failed to decode {target}: {source}")]
    Decode {
        target: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode {target}: {source}")]
    Encode {
        target: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Stateless codec over `serde_json`.
pub struct PayloadCodec;

impl PayloadCodec {
    /// Decode a payload into `T`.
    pub fn decode<T: DeserializeOwned>(payload: &serde_json::Value) -> Result<T, CodecError> {
        T::deserialize(payload).map_err(|source| CodecError::Decode {
            target: short_type_name::<T>(),
            source,
        })
    }

    pub fn encode<T: Serialize>(value: &T) -> Result<serde_json::Value, CodecError> {
        serde_json::to_value(value).map_err(|source| CodecError::Encode {
            target: short_type_name::<T>(),
            source,
        })
    }

    pub fn decode_envelope(bytes: &[u8]) -> Result<Envelope, CodecError> {
        serde_json::from_slice(bytes).map_err(|source| CodecError::Decode {
            target: "Envelope",
            source,
        })
    }

    pub fn encode_envelope(envelope: &Envelope) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(envelope).map_err(|source| CodecError::Encode {
            target: "Envelope",
            source,
        })
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
