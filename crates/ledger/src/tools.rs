//! The tool catalogue and one executor per tool.
//!
//! Executors receive arguments that already passed schema validation and
//! return `Result<String>`; [`execute`] prefixes failures with the tool's
//! error prefix and turns them into [`ToolOutcome::Failure`].

use alloy_dyn_abi::DynSolValue;
use mcp::ToolOutcome;
use serde_json::{Map, Value};

use crate::abi::Method;
use crate::context::LedgerContext;
use crate::ens;
use crate::error::{LedgerError, Result};
use crate::ledger::Ledger;
use crate::primitives::{Address, BlockId, U256, parse_address};
use crate::schema::{Field, InputSchema, Rule, address_rules};
use crate::signer::transfer;
use crate::units::{format_ether, format_gwei, is_positive_amount, parse_ether};

pub const WALLET_NOT_CONFIGURED: &str = "Wallet not configured. Set PRIVATE_KEY in your .env file.";

/// Every tool, in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    GetEthBalance,
    GetTransactionDetails,
    GetBlockDetails,
    GetLatestBlockNumber,
    GetCurrentGasPrice,
    GetTokenBalance,
    CallContractMethod,
    ResolveEnsName,
    LookupEnsName,
    SendEth,
    GetAllWalletsBalances,
}

impl ToolKind {
    pub const ALL: [ToolKind; 11] = [
        Self::GetEthBalance,
        Self::GetTransactionDetails,
        Self::GetBlockDetails,
        Self::GetLatestBlockNumber,
        Self::GetCurrentGasPrice,
        Self::GetTokenBalance,
        Self::CallContractMethod,
        Self::ResolveEnsName,
        Self::LookupEnsName,
        Self::SendEth,
        Self::GetAllWalletsBalances,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::GetEthBalance => "getEthBalance",
            Self::GetTransactionDetails => "getTransactionDetails",
            Self::GetBlockDetails => "getBlockDetails",
            Self::GetLatestBlockNumber => "getLatestBlockNumber",
            Self::GetCurrentGasPrice => "getCurrentGasPrice",
            Self::GetTokenBalance => "getTokenBalance",
            Self::CallContractMethod => "callContractMethod",
            Self::ResolveEnsName => "resolveEnsName",
            Self::LookupEnsName => "lookupEnsName",
            Self::SendEth => "sendEth",
            Self::GetAllWalletsBalances => "getAllWalletsBalances",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::GetEthBalance => "Get the balance of an Ethereum address",
            Self::GetTransactionDetails => "Get details of a transaction by its hash",
            Self::GetBlockDetails => "Get details of a block by its number or hash",
            Self::GetLatestBlockNumber => "Get the latest block number",
            Self::GetCurrentGasPrice => "Get the current gas price (in Gwei)",
            Self::GetTokenBalance => "Get the ERC-20 token balance of an address",
            Self::CallContractMethod => "Call a read-only method on a smart contract",
            Self::ResolveEnsName => "Resolve an ENS name to an Ethereum address",
            Self::LookupEnsName => "Lookup the ENS name for an Ethereum address",
            Self::SendEth => "Send ETH from the configured wallet to an address",
            Self::GetAllWalletsBalances => {
                "Get the ETH balance of all configured wallet addresses"
            }
        }
    }

    fn error_prefix(self) -> &'static str {
        match self {
            Self::GetEthBalance => "Error getting balance: ",
            Self::GetTransactionDetails => "Error getting transaction details: ",
            Self::GetBlockDetails => "Error getting block details: ",
            Self::GetLatestBlockNumber => "Error getting latest block number: ",
            Self::GetCurrentGasPrice => "Error getting current gas price: ",
            Self::GetTokenBalance => "Error getting token balance: ",
            Self::CallContractMethod => "Error calling contract method: ",
            Self::ResolveEnsName => "Error resolving ENS name: ",
            Self::LookupEnsName => "Error looking up ENS name: ",
            Self::SendEth => "Error sending ETH: ",
            Self::GetAllWalletsBalances => "Error getting wallet balances: ",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn schema(self) -> Result<InputSchema> {
        let address = |name, description, message| -> Result<Field> {
            Ok(Field::string(name, description).with_rules(address_rules(message)?))
        };

        let fields = match self {
            Self::GetEthBalance => vec![address(
                "address",
                "The address to get the balance of",
                "Invalid Ethereum address",
            )?],
            Self::GetTransactionDetails => {
                vec![Field::string("txHash", "The transaction hash to look up")]
            }
            Self::GetBlockDetails => vec![Field::string(
                "blockNumberOrHash",
                "The block number, block hash, or tag \
                 (latest, earliest, pending, safe, finalized) to look up",
            )],
            Self::GetLatestBlockNumber | Self::GetCurrentGasPrice | Self::GetAllWalletsBalances => {
                Vec::new()
            }
            Self::GetTokenBalance => vec![
                address(
                    "address",
                    "The address to get the token balance of",
                    "Invalid Ethereum address",
                )?,
                address(
                    "tokenContract",
                    "The ERC-20 token contract address",
                    "Invalid contract address",
                )?,
            ],
            Self::CallContractMethod => vec![
                address("contractAddress", "The contract address", "Invalid contract address")?,
                Field::string("abi", "The contract ABI as a JSON string"),
                Field::string("method", "The method name to call"),
                Field::string_array("args", "Arguments for the method as strings (will be parsed)")
                    .optional(),
            ],
            Self::ResolveEnsName => vec![Field::string(
                "ensName",
                "The ENS name to resolve (e.g. vitalik.eth)",
            )],
            Self::LookupEnsName => vec![address(
                "address",
                "The Ethereum address to lookup the ENS name for",
                "Invalid Ethereum address",
            )?],
            Self::SendEth => vec![
                address("to", "Recipient address", "Invalid Ethereum address")?,
                Field::string("amount", "Amount of ETH to send (as a string, in ETH)").with_rules(
                    vec![Rule::Custom {
                        check: is_positive_amount,
                        message: "Amount must be a positive number (in ETH)",
                    }],
                ),
            ],
        };
        Ok(InputSchema::new(fields))
    }
}

/// Run one validated invocation. Never fails past this boundary.
pub async fn execute<L: Ledger>(
    kind: ToolKind,
    context: &LedgerContext<L>,
    args: &Map<String, Value>,
) -> ToolOutcome {
    let result = match kind {
        ToolKind::GetEthBalance => get_eth_balance(context, args).await,
        ToolKind::GetTransactionDetails => get_transaction_details(context, args).await,
        ToolKind::GetBlockDetails => get_block_details(context, args).await,
        ToolKind::GetLatestBlockNumber => get_latest_block_number(context).await,
        ToolKind::GetCurrentGasPrice => get_current_gas_price(context).await,
        ToolKind::GetTokenBalance => get_token_balance(context, args).await,
        ToolKind::CallContractMethod => call_contract_method(context, args).await,
        ToolKind::ResolveEnsName => resolve_ens_name(context, args).await,
        ToolKind::LookupEnsName => lookup_ens_name(context, args).await,
        ToolKind::SendEth => {
            if context.signer.is_none() {
                return ToolOutcome::failure(WALLET_NOT_CONFIGURED);
            }
            send_eth(context, args).await
        }
        ToolKind::GetAllWalletsBalances => get_all_wallets_balances(context).await,
    };

    match result {
        Ok(text) => ToolOutcome::success(text),
        Err(e) => {
            tracing::debug!(tool = kind.name(), error = %e, "tool failed");
            ToolOutcome::failure(format!("{}{e}", kind.error_prefix()))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Executors
// ─────────────────────────────────────────────────────────────────────────────

fn str_arg<'a>(args: &'a Map<String, Value>, name: &str) -> Result<&'a str> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| LedgerError::InvalidInput(format!("missing argument {name}")))
}

fn address_arg(args: &Map<String, Value>, name: &str) -> Result<Address> {
    parse_address(str_arg(args, name)?)
}

fn pretty(value: &Value) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| LedgerError::InvalidResponse(e.to_string()))
}

async fn get_eth_balance<L: Ledger>(
    context: &LedgerContext<L>,
    args: &Map<String, Value>,
) -> Result<String> {
    let address = address_arg(args, "address")?;
    format_ether(context.ledger.balance(address).await?)
}

async fn get_transaction_details<L: Ledger>(
    context: &LedgerContext<L>,
    args: &Map<String, Value>,
) -> Result<String> {
    let hash = str_arg(args, "txHash")?;
    let tx = context.ledger.transaction(hash).await?.ok_or_else(|| {
        LedgerError::NotFound(format!("Transaction with hash \"{hash}\" could not be found."))
    })?;
    let receipt = context.ledger.receipt(hash).await?.ok_or_else(|| {
        LedgerError::NotFound(format!(
            "Transaction receipt with hash \"{hash}\" could not be found. \
             The Transaction may not be processed on a block yet."
        ))
    })?;
    Ok(format!("Transaction: {}\nReceipt: {}", pretty(&tx)?, pretty(&receipt)?))
}

async fn get_block_details<L: Ledger>(
    context: &LedgerContext<L>,
    args: &Map<String, Value>,
) -> Result<String> {
    let raw = str_arg(args, "blockNumberOrHash")?;
    let id: BlockId = raw.parse()?;
    let block = context
        .ledger
        .block(&id)
        .await?
        .ok_or_else(|| LedgerError::NotFound(format!("Block at \"{raw}\" could not be found.")))?;
    Ok(format!("Block: {}", pretty(&block)?))
}

async fn get_latest_block_number<L: Ledger>(context: &LedgerContext<L>) -> Result<String> {
    Ok(context.ledger.block_number().await?.to_string())
}

async fn get_current_gas_price<L: Ledger>(context: &LedgerContext<L>) -> Result<String> {
    let wei = U256::from(context.ledger.gas_price().await?);
    Ok(format!("{} Gwei", format_gwei(wei)?))
}

async fn read_single<L: Ledger>(
    context: &LedgerContext<L>,
    contract: Address,
    signature: &str,
    args: &[DynSolValue],
) -> Result<DynSolValue> {
    let method = Method::parse(signature)?;
    let output = context.ledger.call(contract, &method.encode_call(args)?).await?;
    method.decode_single(&output)
}

async fn get_token_balance<L: Ledger>(
    context: &LedgerContext<L>,
    args: &Map<String, Value>,
) -> Result<String> {
    let owner = address_arg(args, "address")?;
    let token = address_arg(args, "tokenContract")?;

    let decimals = read_single(context, token, "function decimals() view returns (uint8)", &[])
        .await?
        .as_uint()
        .map(|(decimals, _)| decimals)
        .ok_or_else(|| LedgerError::InvalidResponse("decimals is not an integer".into()))?;
    let balance = read_single(
        context,
        token,
        "function balanceOf(address owner) view returns (uint256)",
        &[DynSolValue::Address(owner)],
    )
    .await?
    .as_uint()
    .map(|(balance, _)| balance)
    .ok_or_else(|| LedgerError::InvalidResponse("balance is not an integer".into()))?;
    let symbol = match read_single(context, token, "function symbol() view returns (string)", &[])
        .await?
    {
        DynSolValue::String(symbol) => symbol,
        _ => return Err(LedgerError::InvalidResponse("symbol is not a string".into())),
    };

    let whole = U256::from(10)
        .checked_pow(decimals)
        .map_or(U256::ZERO, |scale| balance / scale);
    Ok(format!("{whole} {symbol}"))
}

async fn call_contract_method<L: Ledger>(
    context: &LedgerContext<L>,
    args: &Map<String, Value>,
) -> Result<String> {
    let contract = address_arg(args, "contractAddress")?;
    let method = str_arg(args, "method")?;
    let call_args: Vec<String> = args
        .get("args")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default();

    let method = Method::from_abi(str_arg(args, "abi")?, method, call_args.len())?;
    let data = method.encode_call(&method.coerce_args(&call_args)?)?;
    let output = context.ledger.call(contract, &data).await?;
    let result = method.decode_output_json(&output)?;
    Ok(format!("Result: {}", pretty(&result)?))
}

async fn resolve_ens_name<L: Ledger>(
    context: &LedgerContext<L>,
    args: &Map<String, Value>,
) -> Result<String> {
    let name = str_arg(args, "ensName")?;
    ens::resolve(&context.ledger, name)
        .await?
        .map(|address| address.to_string())
        .ok_or_else(|| LedgerError::NotFound("ENS name not found".into()))
}

async fn lookup_ens_name<L: Ledger>(
    context: &LedgerContext<L>,
    args: &Map<String, Value>,
) -> Result<String> {
    let address = address_arg(args, "address")?;
    ens::lookup(&context.ledger, address)
        .await?
        .ok_or_else(|| LedgerError::NotFound("No ENS name found for this address".into()))
}

async fn send_eth<L: Ledger>(
    context: &LedgerContext<L>,
    args: &Map<String, Value>,
) -> Result<String> {
    let signer = context
        .signer
        .as_ref()
        .ok_or_else(|| LedgerError::Signer(WALLET_NOT_CONFIGURED.into()))?;
    let to = address_arg(args, "to")?;
    let value = parse_ether(str_arg(args, "amount")?)?;

    let tx = transfer(
        context.ledger.chain_id().await?,
        context.ledger.nonce(signer.address()).await?,
        context.ledger.gas_price().await?,
        to,
        value,
    );
    let nonce = tx.nonce;
    let raw = signer.sign(tx)?;

    tracing::info!(from = %signer.address(), %to, %value, nonce, "submitting transfer");
    let hash = context.ledger.send_raw_transaction(&raw).await?;
    Ok(format!("Transaction sent! Hash: {hash}"))
}

async fn get_all_wallets_balances<L: Ledger>(context: &LedgerContext<L>) -> Result<String> {
    let mut balances = Map::new();
    for address in &context.wallets {
        let entry = match context.ledger.balance(*address).await.and_then(format_ether) {
            Ok(ether) => ether,
            Err(e) => format!("Error: {}{e}", ToolKind::GetEthBalance.error_prefix()),
        };
        balances.insert(address.to_string(), Value::String(entry));
    }
    pretty(&Value::Object(balances))
}
