//! Minimal JSON-RPC envelopes used for the raw `eth_blockNumber` height read.

use serde::{Deserialize, Serialize};

use crate::http_client::FetchError;

/// A JSON-RPC 2.0 request with no parameters.
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: &'static str,
    method: &'a str,
    params: Vec<serde_json::Value>,
}

impl<'a> JsonRpcRequest<'a> {
    /// Builds a request for `method` with id `"1"`.
    pub fn new(method: &'a str) -> Self {
        Self { jsonrpc: "2.0", id: "1", method, params: Vec::new() }
    }
}

/// Error object returned by a JSON-RPC server.
#[derive(Debug, Deserialize)]
pub struct JsonRpcError {
    /// Error code.
    pub code: i64,
    /// Human-readable message.
    pub message: String,
}

/// Response to `eth_blockNumber`.
#[derive(Debug, Deserialize)]
pub struct BlockNumberResponse {
    /// Hex quantity, present on success.
    #[serde(default)]
    pub result: Option<String>,
    /// Error object, present on failure.
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

impl BlockNumberResponse {
    /// Extracts the block number from the response.
    pub fn block_number(&self) -> Result<u64, FetchError> {
        if let Some(err) = &self.error {
            return Err(FetchError::Parse(format!(
                "eth_blockNumber returned error {}: {}",
                err.code, err.message
            )));
        }
        match &self.result {
            Some(hex) => parse_hex_quantity(hex),
            None => Err(FetchError::Parse("eth_blockNumber returned no result".into())),
        }
    }
}

/// Parses a `0x`-prefixed hex quantity.
pub fn parse_hex_quantity(raw: &str) -> Result<u64, FetchError> {
    let digits = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")).unwrap_or(raw);
    if digits.is_empty() {
        return Err(FetchError::Parse(format!("empty hex quantity {raw:?}")));
    }
    u64::from_str_radix(digits, 16)
        .map_err(|e| FetchError::Parse(format!("invalid hex quantity {raw:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_envelope_shape() {
        let body = serde_json::to_value(JsonRpcRequest::new("eth_blockNumber")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "jsonrpc": "2.0",
                "id": "1",
                "method": "eth_blockNumber",
                "params": []
            })
        );
    }

    #[test]
    fn test_parse_hex_quantity() {
        assert_eq!(parse_hex_quantity("0x1A").unwrap(), 26);
        assert_eq!(parse_hex_quantity("0x1a").unwrap(), 26);
        assert_eq!(parse_hex_quantity("0x0").unwrap(), 0);
        assert!(matches!(parse_hex_quantity("0x"), Err(FetchError::Parse(_))));
        assert!(matches!(parse_hex_quantity(""), Err(FetchError::Parse(_))));
        assert!(matches!(parse_hex_quantity("0xzz"), Err(FetchError::Parse(_))));
    }

    #[test]
    fn test_block_number_response() {
        let ok: BlockNumberResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":"1","result":"0x64"}"#).unwrap();
        assert_eq!(ok.block_number().unwrap(), 100);

        let err: BlockNumberResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":"1","error":{"code":-32601,"message":"method not found"}}"#,
        )
        .unwrap();
        assert!(matches!(
            err.block_number(),
            Err(FetchError::Parse(msg)) if msg.contains("-32601")
        ));
    }
}
