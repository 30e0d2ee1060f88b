//! Wire representation of the signed envelope.
//!
//! The envelope is a protobuf message with three length-delimited byte
//! fields. Field numbers are fixed; external verifiers parse them by tag:
//!
//! | tag | field               | content                                 |
//! |-----|---------------------|-----------------------------------------|
//! | 1   | `certificate_chain` | DER certificates, leaf first, concatenated |
//! | 2   | `payload`           | original file bytes                     |
//! | 3   | `signature`         | raw 64-byte Ed25519 signature           |

use prost::Message;

use crate::error::EnvelopeResult;

#[derive(Clone, PartialEq, Message)]
pub struct SignedPayload {
    #[prost(bytes = "vec", tag = "1")]
    pub certificate_chain: Vec<u8>,

    #[prost(bytes = "vec", tag = "2")]
    pub payload: Vec<u8>,

    #[prost(bytes = "vec", tag = "3")]
    pub signature: Vec<u8>,
}

impl SignedPayload {
    pub fn new(certificate_chain: Vec<u8>, payload: Vec<u8>, signature: Vec<u8>) -> Self {
        Self {
            certificate_chain,
            payload,
            signature,
        }
    }

    /// Encode to the on-disk byte layout
    pub fn to_bytes(&self) -> Vec<u8> {
        self.encode_to_vec()
    }

    /// Decode from the on-disk byte layout
    pub fn from_bytes(bytes: &[u8]) -> EnvelopeResult<Self> {
        Ok(Self::decode(bytes)?)
    }
}
