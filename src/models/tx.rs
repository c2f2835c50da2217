//! Decoder for the paired-chain transaction envelope carried in consensus
//! blocks: `[u32 BE message type][u32 BE payload length][payload]`, base64
//! encoded.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use thiserror::Error;

const HEADER_LEN: usize = 8;

/// Errors produced while decoding a consensus transaction.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TxDecodeError {
    /// The transaction string is not valid base64.
    #[error("base64 decode failed: {0}")]
    Base64(String),

    /// Fewer bytes than the envelope header.
    #[error("tx data too short: {0} bytes")]
    TooShort(usize),

    /// The declared payload length exceeds the available bytes.
    #[error("payload length mismatch: expected {declared}, got {available}")]
    LengthMismatch {
        /// Length declared in the header.
        declared: u32,
        /// Bytes available after the header.
        available: usize,
    },
}

/// A decoded consensus transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsensusTx {
    /// Message type tag.
    pub msg_type: u32,
    /// Declared payload length.
    pub data_length: u32,
    /// Payload bytes.
    pub payload: Vec<u8>,
}

impl ConsensusTx {
    /// Decodes a base64 transaction string.
    pub fn decode(encoded: &str) -> Result<Self, TxDecodeError> {
        let data = STANDARD.decode(encoded).map_err(|e| TxDecodeError::Base64(e.to_string()))?;
        if data.len() < HEADER_LEN {
            return Err(TxDecodeError::TooShort(data.len()));
        }

        let msg_type = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        let data_length = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
        let available = data.len() - HEADER_LEN;
        let end = HEADER_LEN + data_length as usize;
        if end > data.len() {
            return Err(TxDecodeError::LengthMismatch { declared: data_length, available });
        }

        Ok(Self { msg_type, data_length, payload: data[HEADER_LEN..end].to_vec() })
    }

    /// Hex rendering of the payload, 32 bytes per chunk.
    pub fn payload_chunks(&self) -> impl Iterator<Item = String> + '_ {
        self.payload.chunks(32).map(hex::encode)
    }
}
