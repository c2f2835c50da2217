use crate::models::ConsensusBlock;

/// A builder for creating `ConsensusBlock` instances for testing.
///
/// Defaults to a well-formed block at height 1 with a non-empty hash and
/// proposer and no transactions.
#[derive(Debug, Clone)]
pub struct ConsensusBlockBuilder {
    block: ConsensusBlock,
}

impl Default for ConsensusBlockBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsensusBlockBuilder {
    /// Creates a new `ConsensusBlockBuilder`.
    pub fn new() -> Self {
        Self {
            block: ConsensusBlock {
                hash: "0F1E2D3C4B5A69788796A5B4C3D2E1F00F1E2D3C4B5A69788796A5B4C3D2E1F0".into(),
                height: "1".into(),
                proposer_address: "PROPOSER".into(),
                chain_id: "test-1".into(),
                txs: Vec::new(),
            },
        }
    }

    /// Sets the block height.
    pub fn height(mut self, height: i64) -> Self {
        self.block.height = height.to_string();
        self
    }

    /// Sets the block hash.
    pub fn hash(mut self, hash: &str) -> Self {
        self.block.hash = hash.to_string();
        self
    }

    /// Sets the proposer address.
    pub fn proposer(mut self, proposer: &str) -> Self {
        self.block.proposer_address = proposer.to_string();
        self
    }

    /// Appends a base64 transaction.
    pub fn tx(mut self, tx: &str) -> Self {
        self.block.txs.push(tx.to_string());
        self
    }

    /// Builds the `ConsensusBlock`.
    pub fn build(self) -> ConsensusBlock {
        self.block
    }

    /// Renders the block as a `/block?height=N` JSON-RPC response body.
    pub fn response_body(self) -> String {
        let block = self.block;
        serde_json::json!({
            "jsonrpc": "2.0",
            "id": -1,
            "result": {
                "block_id": { "hash": block.hash },
                "block": {
                    "header": {
                        "chain_id": block.chain_id,
                        "height": block.height,
                        "proposer_address": block.proposer_address,
                    },
                    "data": { "txs": block.txs },
                }
            }
        })
        .to_string()
    }
}
