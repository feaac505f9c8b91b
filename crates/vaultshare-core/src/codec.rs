//! CBOR record encoding.
//!
//! Records are stored as CBOR maps with their field names, so every field of
//! a [`Share`](crate::Share) or [`TeamRecord`](crate::TeamRecord) survives a
//! round trip and a decoder can report which field is broken.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CoreError, Result};

/// Encode a record to CBOR bytes.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| CoreError::EncodingError(e.to_string()))?;
    Ok(buf)
}

/// Decode a record from CBOR bytes.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        n: i64,
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = decode::<Sample>(b"\xff\x00garbage").unwrap_err();
        assert!(matches!(err, CoreError::DecodingError(_)));
    }

    #[test]
    fn test_decode_wrong_shape_fails() {
        let bytes = encode(&vec![1u8, 2, 3]).unwrap();
        assert!(decode::<Sample>(&bytes).is_err());
    }
}
