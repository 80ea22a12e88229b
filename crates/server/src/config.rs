//! Server configuration from the environment.

use ledger::{Address, DEV_WALLETS, Network, Signer, parse_address};

use crate::error::{Error, Result};

#[derive(Debug)]
pub struct ServerConfig {
    pub network: Network,
    pub rpc_url: String,
    pub signer: Option<Signer>,
    /// Accounts reported by `getAllWalletsBalances`.
    pub wallets: Vec<Address>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read `CHAIN_ENV`, `RPC_URL`, `PRIVATE_KEY` and `WALLET_ADDRESSES`
    /// through `lookup`. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let network = match var("CHAIN_ENV") {
            Some(value) => value.parse().map_err(|source| Error::Config {
                var: "CHAIN_ENV",
                source,
            })?,
            None => Network::default(),
        };

        let rpc_url = var("RPC_URL")
            .map(|url| url.trim().to_string())
            .unwrap_or_else(|| network.default_rpc_url().to_string());

        let signer = var("PRIVATE_KEY")
            .map(|key| Signer::from_hex(&key))
            .transpose()
            .map_err(|source| Error::Config {
                var: "PRIVATE_KEY",
                source,
            })?;

        let wallets = match var("WALLET_ADDRESSES") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(parse_address)
                .collect::<ledger::Result<Vec<Address>>>()
                .map_err(|source| Error::Config {
                    var: "WALLET_ADDRESSES",
                    source,
                })?,
            None => DEV_WALLETS.to_vec(),
        };

        Ok(Self {
            network,
            rpc_url,
            signer,
            wallets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const HARDHAT_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_to_mainnet_without_signer() {
        let config = ServerConfig::from_lookup(env(&[])).unwrap();
        assert_eq!(config.network, Network::Mainnet);
        assert_eq!(config.rpc_url, "https://eth.merkle.io");
        assert!(config.signer.is_none());
        assert_eq!(config.wallets, DEV_WALLETS.to_vec());
    }

    #[test]
    fn chain_env_selects_network_and_endpoint() {
        let config = ServerConfig::from_lookup(env(&[("CHAIN_ENV", "local")])).unwrap();
        assert_eq!(config.network, Network::Local);
        assert_eq!(config.rpc_url, "http://127.0.0.1:8545");
    }

    #[test]
    fn rpc_url_overrides_network_default() {
        let config = ServerConfig::from_lookup(env(&[
            ("CHAIN_ENV", "sepolia"),
            ("RPC_URL", "https://rpc.example.org"),
        ]))
        .unwrap();
        assert_eq!(config.network, Network::Sepolia);
        assert_eq!(config.rpc_url, "https://rpc.example.org");
    }

    #[test]
    fn unknown_chain_env_is_fatal() {
        let err = ServerConfig::from_lookup(env(&[("CHAIN_ENV", "ropsten")])).unwrap_err();
        assert!(err.to_string().starts_with("invalid CHAIN_ENV"));
    }

    #[test]
    fn private_key_yields_signer() {
        let config = ServerConfig::from_lookup(env(&[("PRIVATE_KEY", HARDHAT_KEY)])).unwrap();
        let signer = config.signer.unwrap();
        assert_eq!(signer.address(), DEV_WALLETS[0]);
    }

    #[test]
    fn malformed_private_key_is_fatal() {
        let err = ServerConfig::from_lookup(env(&[("PRIVATE_KEY", "0x1234")])).unwrap_err();
        assert!(matches!(err, Error::Config { var: "PRIVATE_KEY", .. }));
    }

    #[test]
    fn wallet_list_is_parsed_in_order() {
        let config = ServerConfig::from_lookup(env(&[(
            "WALLET_ADDRESSES",
            "0x70997970C51812dc3A010C7d01b50e0d17dc79C8, \
             0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266,",
        )]))
        .unwrap();
        assert_eq!(config.wallets, vec![DEV_WALLETS[1], DEV_WALLETS[0]]);
    }

    #[test]
    fn bad_wallet_entry_is_fatal() {
        let err =
            ServerConfig::from_lookup(env(&[("WALLET_ADDRESSES", "0xf39F,not-an-address")]))
                .unwrap_err();
        assert!(matches!(err, Error::Config { var: "WALLET_ADDRESSES", .. }));
    }
}
