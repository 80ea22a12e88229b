//! Supported networks.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::LedgerError;

/// A network the server can be pointed at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Goerli,
    Sepolia,
    /// A local development node.
    Local,
}

impl Network {
    pub const ALL: [Network; 4] = [
        Network::Mainnet,
        Network::Goerli,
        Network::Sepolia,
        Network::Local,
    ];

    pub fn chain_id(self) -> u64 {
        match self {
            Self::Mainnet => 1,
            Self::Goerli => 5,
            Self::Sepolia => 11_155_111,
            Self::Local => 31_337,
        }
    }

    /// Human-readable chain name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Mainnet => "Ethereum",
            Self::Goerli => "Goerli",
            Self::Sepolia => "Sepolia",
            Self::Local => "Localhost",
        }
    }

    /// Public JSON-RPC endpoint used when no override is configured.
    pub fn default_rpc_url(self) -> &'static str {
        match self {
            Self::Mainnet => "https://eth.merkle.io",
            Self::Goerli => "https://rpc.ankr.com/eth_goerli",
            Self::Sepolia => "https://sepolia.drpc.org",
            Self::Local => "http://127.0.0.1:8545",
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Goerli => "goerli",
            Self::Sepolia => "sepolia",
            Self::Local => "local",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Network {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|network| network.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                LedgerError::InvalidInput(format!(
                    "unknown network `{s}` (expected one of mainnet, goerli, sepolia, local)"
                ))
            })
    }
}
