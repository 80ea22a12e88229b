use alloy_primitives::address;

use crate::ledger::Ledger;
use crate::primitives::Address;
use crate::signer::Signer;

/// Well-known local development accounts.
pub const DEV_WALLETS: [Address; 5] = [
    address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
    address!("70997970C51812dc3A010C7d01b50e0d17dc79C8"),
    address!("3C44CdDdB6a900fa2b585dd299e03d12FA4293BC"),
    address!("90F79bf6EB2c4f870365E785982E1f101E93b906"),
    address!("15d34AAf54267DB7D7c367839AAf71A00a2C6A65"),
];

/// Everything the tool executors need, built once at startup.
#[derive(Debug)]
pub struct LedgerContext<L> {
    pub ledger: L,
    /// Present only when a private key is configured.
    pub signer: Option<Signer>,
    /// Accounts reported by `getAllWalletsBalances`.
    pub wallets: Vec<Address>,
}

impl<L: Ledger> LedgerContext<L> {
    pub fn new(ledger: L) -> Self {
        Self {
            ledger,
            signer: None,
            wallets: DEV_WALLETS.to_vec(),
        }
    }

    pub fn with_signer(mut self, signer: Signer) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn with_wallets(mut self, wallets: Vec<Address>) -> Self {
        self.wallets = wallets;
        self
    }
}
