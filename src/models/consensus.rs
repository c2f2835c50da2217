//! Consensus-layer block model and the CometBFT RPC response shapes it is
//! decoded from.

use serde::Deserialize;

use crate::http_client::FetchError;

/// A consensus-layer block as seen by the correlation engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsensusBlock {
    /// Block ID hash.
    pub hash: String,
    /// Height as reported by the header (decimal string).
    pub height: String,
    /// Proposer address from the header.
    pub proposer_address: String,
    /// Chain identifier from the header.
    pub chain_id: String,
    /// Opaque (base64) transaction payloads, in block order.
    pub txs: Vec<String>,
}

impl ConsensusBlock {
    /// Parses the decimal header height.
    pub fn parse_height(&self) -> Result<i64, FetchError> {
        self.height
            .trim()
            .parse::<i64>()
            .map_err(|e| FetchError::Parse(format!("invalid block height {:?}: {e}", self.height)))
    }

    /// Number of transactions in the block.
    pub fn tx_count(&self) -> usize {
        self.txs.len()
    }

    /// A block with zero transactions.
    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }

    /// Both the block hash and the proposer address are present.
    pub fn is_well_formed(&self) -> bool {
        !self.hash.is_empty() && !self.proposer_address.is_empty()
    }
}

/// Response of `GET {rpc}/block?height=N`.
#[derive(Debug, Deserialize)]
pub struct BlockResponse {
    result: BlockResult,
}

#[derive(Debug, Deserialize)]
struct BlockResult {
    #[serde(default)]
    block_id: BlockId,
    block: BlockEnvelope,
}

#[derive(Debug, Default, Deserialize)]
struct BlockId {
    #[serde(default)]
    hash: String,
}

#[derive(Debug, Deserialize)]
struct BlockEnvelope {
    header: BlockHeader,
    #[serde(default)]
    data: BlockData,
}

#[derive(Debug, Deserialize)]
struct BlockHeader {
    #[serde(default)]
    height: String,
    #[serde(default)]
    proposer_address: String,
    #[serde(default)]
    chain_id: String,
}

// CometBFT serialises an empty transaction list as `null`.
#[derive(Debug, Default, Deserialize)]
struct BlockData {
    #[serde(default)]
    txs: Option<Vec<String>>,
}

impl From<BlockResponse> for ConsensusBlock {
    fn from(response: BlockResponse) -> Self {
        let BlockResult { block_id, block } = response.result;
        ConsensusBlock {
            hash: block_id.hash,
            height: block.header.height,
            proposer_address: block.header.proposer_address,
            chain_id: block.header.chain_id,
            txs: block.data.txs.unwrap_or_default(),
        }
    }
}

/// Response of `GET {rpc}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    result: StatusResult,
}

#[derive(Debug, Deserialize)]
struct StatusResult {
    sync_info: SyncInfo,
}

#[derive(Debug, Deserialize)]
struct SyncInfo {
    latest_block_height: String,
}

impl StatusResponse {
    /// The node's latest block height.
    pub fn latest_height(&self) -> Result<i64, FetchError> {
        let raw = &self.result.sync_info.latest_block_height;
        raw.trim()
            .parse::<i64>()
            .map_err(|e| FetchError::Parse(format!("invalid latest_block_height {raw:?}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_response_into_consensus_block() {
        let json = r#"{
            "jsonrpc": "2.0",
            "id": -1,
            "result": {
                "block_id": { "hash": "ABCDEF" },
                "block": {
                    "header": { "chain_id": "test-1", "height": "100", "proposer_address": "VAL" },
                    "data": { "txs": ["AAAAAQAAAAA="] }
                }
            }
        }"#;
        let response: BlockResponse = serde_json::from_str(json).unwrap();
        let block = ConsensusBlock::from(response);

        assert_eq!(block.hash, "ABCDEF");
        assert_eq!(block.parse_height().unwrap(), 100);
        assert_eq!(block.proposer_address, "VAL");
        assert_eq!(block.chain_id, "test-1");
        assert_eq!(block.tx_count(), 1);
        assert!(block.is_well_formed());
    }

    #[test]
    fn test_null_txs_is_empty_block() {
        let json = r#"{"result":{
            "block_id":{"hash":"H"},
            "block":{"header":{"height":"5","proposer_address":"P"},"data":{"txs":null}}
        }}"#;
        let block = ConsensusBlock::from(serde_json::from_str::<BlockResponse>(json).unwrap());
        assert!(block.is_empty());
    }

    #[test]
    fn test_missing_proposer_is_not_well_formed() {
        let json = r#"{"result":{"block_id":{"hash":"H"},"block":{"header":{"height":"5"}}}}"#;
        let block = ConsensusBlock::from(serde_json::from_str::<BlockResponse>(json).unwrap());
        assert!(!block.is_well_formed());

        let block = ConsensusBlock { proposer_address: "P".into(), ..Default::default() };
        assert!(!block.is_well_formed());
    }

    #[test]
    fn test_parse_height_rejects_non_numeric() {
        let block = ConsensusBlock { height: "12a".into(), ..Default::default() };
        assert!(matches!(block.parse_height(), Err(FetchError::Parse(_))));
    }

    #[test]
    fn test_status_latest_height() {
        let json =
            r#"{"result":{"sync_info":{"latest_block_height":"12345","catching_up":false}}}"#;
        let status: StatusResponse = serde_json::from_str(json).unwrap();
        assert_eq!(status.latest_height().unwrap(), 12345);

        let json = r#"{"result":{"sync_info":{"latest_block_height":"abc"}}}"#;
        let status: StatusResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(status.latest_height(), Err(FetchError::Parse(_))));
    }
}
