//! Data models shared by the sources and the correlation engine.

pub mod consensus;
pub mod execution;
pub mod rpc;
pub mod tx;

pub use consensus::{BlockResponse, ConsensusBlock, StatusResponse};
pub use execution::ExecutionBlock;
pub use rpc::{BlockNumberResponse, JsonRpcRequest, parse_hex_quantity};
pub use tx::{ConsensusTx, TxDecodeError};
