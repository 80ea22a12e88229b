//! Ethereum ledger tools.
//!
//! [`ToolRegistry`] holds the fixed catalogue of ledger tools, validates
//! arguments against each tool's declarative [`InputSchema`] and runs the
//! matching executor against a [`Ledger`]. [`RpcLedger`] is the JSON-RPC
//! implementation used by the server binary.

pub mod abi;
mod context;
pub mod ens;
mod error;
mod ledger;
mod network;
mod primitives;
mod registry;
mod rpc;
pub mod schema;
mod signer;
mod tools;
pub mod units;

pub use context::{DEV_WALLETS, LedgerContext};
pub use error::{LedgerError, Result};
pub use ledger::Ledger;
pub use network::Network;
pub use primitives::{Address, B256, BlockId, U256, parse_address};
pub use registry::ToolRegistry;
pub use rpc::RpcLedger;
pub use schema::{InputSchema, ValidationError};
pub use signer::Signer;
pub use tools::{ToolKind, WALLET_NOT_CONFIGURED};
