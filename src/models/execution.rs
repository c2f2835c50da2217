use alloy::{primitives::B256, rpc::types::Block};

/// An execution-layer block reduced to the fields correlation needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionBlock {
    /// Block number.
    pub height: u64,
    /// Coinbase address in EIP-55 checksum form.
    pub producer: String,
    /// Block hash.
    pub hash: B256,
    /// Number of transactions in the block.
    pub tx_count: usize,
}

impl ExecutionBlock {
    /// A block with zero transactions.
    pub fn is_empty(&self) -> bool {
        self.tx_count == 0
    }
}

impl From<&Block> for ExecutionBlock {
    fn from(block: &Block) -> Self {
        ExecutionBlock {
            height: block.header.number,
            producer: block.header.beneficiary.to_checksum(None),
            hash: block.header.hash,
            tx_count: block.transactions.len(),
        }
    }
}
