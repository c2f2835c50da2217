//! A builder for creating execution-layer `Block` instances for testing.

use alloy::{
    primitives::{Address, B256},
    rpc::types::{Block, BlockTransactions, Header},
};

/// A builder for creating `Block` instances for testing.
#[derive(Debug, Clone, Default)]
pub struct BlockBuilder {
    header: Header,
    tx_count: usize,
}

impl BlockBuilder {
    /// Creates a new `BlockBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the block number.
    pub fn number(mut self, number: u64) -> Self {
        self.header.number = number;
        self
    }

    /// Sets the block hash.
    pub fn hash(mut self, hash: B256) -> Self {
        self.header.hash = hash;
        self
    }

    /// Sets the coinbase (block producer).
    pub fn beneficiary(mut self, beneficiary: Address) -> Self {
        self.header.beneficiary = beneficiary;
        self
    }

    /// Sets how many transaction hashes the block lists.
    pub fn tx_count(mut self, tx_count: usize) -> Self {
        self.tx_count = tx_count;
        self
    }

    /// Builds the `Block` with the provided values.
    pub fn build(self) -> Block {
        let hashes = (0..self.tx_count).map(|i| B256::with_last_byte(i as u8 + 1)).collect();
        Block {
            header: self.header,
            transactions: BlockTransactions::Hashes(hashes),
            uncles: Default::default(),
            withdrawals: Default::default(),
        }
    }
}
