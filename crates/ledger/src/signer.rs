//! Local transaction signing with a secp256k1 key.

use alloy_consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy_eips::eip2718::Encodable2718;
use alloy_primitives::{Address, TxKind, U256, hex};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;

use crate::error::{LedgerError, Result};

/// Gas limit of a plain value transfer.
pub const TRANSFER_GAS: u64 = 21_000;

/// An EIP-155 legacy value transfer carrying no calldata.
pub fn transfer(chain_id: u64, nonce: u64, gas_price: u128, to: Address, value: U256) -> TxLegacy {
    TxLegacy {
        chain_id: Some(chain_id),
        nonce,
        gas_price,
        gas_limit: TRANSFER_GAS,
        to: TxKind::Call(to),
        value,
        ..Default::default()
    }
}

/// A wallet key. The key material never leaves this type.
pub struct Signer {
    key: PrivateKeySigner,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

impl Signer {
    /// Parse a 32-byte hex private key, with or without `0x`.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim())
            .map_err(|_| LedgerError::Signer("private key is not valid hex".into()))?;
        if bytes.len() != 32 {
            return Err(LedgerError::Signer(format!(
                "private key must be 32 bytes, got {}",
                bytes.len()
            )));
        }
        let key = PrivateKeySigner::from_slice(&bytes)
            .map_err(|e| LedgerError::Signer(format!("invalid private key: {e}")))?;
        Ok(Self { key })
    }

    pub fn address(&self) -> Address {
        self.key.address()
    }

    /// Sign and return the raw transaction bytes ready for submission.
    pub fn sign(&self, tx: TxLegacy) -> Result<Vec<u8>> {
        let signature = self
            .key
            .sign_hash_sync(&tx.signature_hash())
            .map_err(|e| LedgerError::Signer(format!("signing failed: {e}")))?;
        Ok(TxEnvelope::from(tx.into_signed(signature)).encoded_2718())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_address_from_key() {
        let signer = Signer::from_hex(
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        )
        .unwrap();
        assert_eq!(
            signer.address().to_string(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
        assert!(!format!("{signer:?}").contains("ac0974"));
    }

    #[test]
    fn rejects_bad_keys() {
        assert!(Signer::from_hex("0x1234").is_err());
        assert!(Signer::from_hex("not hex").is_err());
        assert!(Signer::from_hex(&"00".repeat(32)).is_err());
    }

    fn eip155_example() -> TxLegacy {
        transfer(
            1,
            9,
            20_000_000_000,
            Address::repeat_byte(0x35),
            U256::from(1_000_000_000_000_000_000u64),
        )
    }

    #[test]
    fn signing_hash_matches_eip155_example() {
        assert_eq!(
            eip155_example().signature_hash().to_string(),
            "0xdaf5a779ae972f972197303d7b574746c7ef83eadac0f2791ad23db92e4c8e53"
        );
    }

    #[test]
    fn signs_eip155_example() {
        let signer = Signer::from_hex(&"46".repeat(32)).unwrap();
        let raw = signer.sign(eip155_example()).unwrap();
        assert_eq!(
            hex::encode_prefixed(raw),
            concat!(
                "0xf86c098504a817c800825208943535353535353535353535353535353535353535",
                "880de0b6b3a76400008025a028ef61340bd939bc2195fe537567866003e1a15d3c",
                "71ff63e1590620aa636276a067cbe9d8997f761aecb703304b3800ccf555c9f3dc",
                "64214b297fb1966a3b6d83",
            )
        );
    }
}
