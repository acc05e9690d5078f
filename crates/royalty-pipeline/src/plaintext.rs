//! CBOR encoding of confidential values handed to a `Cipher`.
//!
//! Encoded plaintext is held in a [`Zeroizing`] buffer and wiped as soon as
//! the cipher call returns.

use royalty_types::ConfidentialValue;
use zeroize::Zeroizing;

use crate::error::CapabilityError;

/// Encode a value to CBOR bytes.
///
/// # Errors
///
/// Returns [`CapabilityError::InvalidInput`] if the value cannot be encoded.
pub fn encode(value: &ConfidentialValue) -> Result<Zeroizing<Vec<u8>>, CapabilityError> {
    let mut buf = Zeroizing::new(Vec::new());
    ciborium::into_writer(value, &mut *buf)
        .map_err(|e| CapabilityError::InvalidInput(format!("CBOR encoding failed: {e}")))?;
    Ok(buf)
}

/// Decode CBOR bytes produced by [`encode`].
pub fn decode(bytes: &[u8]) -> Result<ConfidentialValue, CapabilityError> {
    ciborium::from_reader(bytes)
        .map_err(|e| CapabilityError::InvalidInput(format!("CBOR decoding failed: {e}")))
}

#[cfg(test)]
mod tests {
    use royalty_types::{PercentageTriple, Role};

    use super::*;

    #[test]
    fn test_each_kind_decodes_to_itself() {
        let values = [
            ConfidentialValue::amount(1_250),
            ConfidentialValue::share(Role::Producer, 30),
            ConfidentialValue::PercentageTriple(PercentageTriple {
                artist: 60,
                producer: 30,
                label: 10,
            }),
        ];
        for value in values {
            let bytes = encode(&value).expect("encode");
            assert_eq!(decode(&bytes).expect("decode"), value);
        }
    }

    #[test]
    fn test_roles_encode_differently() {
        let a = encode(&ConfidentialValue::share(Role::Artist, 50)).expect("encode");
        let b = encode(&ConfidentialValue::share(Role::Label, 50)).expect("encode");
        assert_ne!(*a, *b);
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(decode(&[0xff, 0x00, 0x13]).is_err());
    }
}
