//! Ethereum Name Service lookups through the on-chain registry.
//!
//! Names are resolved against the registry directly. When a name has no
//! resolver of its own, the closest ancestor's resolver is asked through
//! the ENSIP-10 `resolve(bytes,bytes)` extension, which covers wildcard
//! subdomains. Offchain (CCIP-read) answers are not followed, and name
//! normalization is limited to trimming and lowercasing ASCII; full
//! ENSIP-15 (UTS-46) normalization is not applied.

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, B256, address, hex, keccak256};

use crate::abi::Method;
use crate::error::{LedgerError, Result};
use crate::ledger::Ledger;

/// The ENS registry, deployed at the same address on every supported network.
pub const REGISTRY: Address = address!("00000000000C2E074eC69A0dFb2997BA6C7d2e1e");

/// ENSIP-10 extended resolver interface id.
const EXTENDED_RESOLVER: [u8; 4] = [0x90, 0x61, 0xb9, 0x23];

/// Lowercase and trim a name, rejecting empty labels.
pub fn normalize(name: &str) -> Result<String> {
    let name = name.trim().to_lowercase();
    if name.is_empty() || name.split('.').any(str::is_empty) {
        return Err(LedgerError::InvalidInput(format!("invalid ENS name: {name:?}")));
    }
    Ok(name)
}

/// EIP-137 namehash.
pub fn namehash(name: &str) -> B256 {
    if name.is_empty() {
        return B256::ZERO;
    }
    name.rsplit('.').fold(B256::ZERO, |node, label| {
        keccak256([node.as_slice(), keccak256(label.as_bytes()).as_slice()].concat())
    })
}

/// DNS wire encoding of a name, as `resolve(bytes,bytes)` expects it.
pub fn dns_encode(name: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(name.len() + 2);
    for label in name.split('.') {
        let len = u8::try_from(label.len())
            .map_err(|_| LedgerError::InvalidInput(format!("ENS label too long: {label}")))?;
        out.push(len);
        out.extend_from_slice(label.as_bytes());
    }
    out.push(0);
    Ok(out)
}

/// `name` followed by each of its ancestors, ending with the top-level label.
fn ancestry(name: &str) -> impl Iterator<Item = &str> {
    std::iter::successors(Some(name), |&current| {
        current.split_once('.').map(|(_, parent)| parent)
    })
}

async fn call_single<L: Ledger>(
    ledger: &L,
    to: Address,
    method: &Method,
    args: &[DynSolValue],
) -> Result<DynSolValue> {
    let output = ledger.call(to, &method.encode_call(args)?).await?;
    method.decode_single(&output)
}

fn node_arg(node: B256) -> DynSolValue {
    DynSolValue::FixedBytes(node, 32)
}

fn non_zero(value: DynSolValue) -> Option<Address> {
    value.as_address().filter(|address| !address.is_zero())
}

async fn resolver_of<L: Ledger>(ledger: &L, node: B256) -> Result<Option<Address>> {
    let method = Method::parse("function resolver(bytes32 node) view returns (address)")?;
    Ok(non_zero(call_single(ledger, REGISTRY, &method, &[node_arg(node)]).await?))
}

async fn supports_extended<L: Ledger>(ledger: &L, resolver: Address) -> bool {
    let Ok(method) =
        Method::parse("function supportsInterface(bytes4 interfaceId) view returns (bool)")
    else {
        return false;
    };
    let id = DynSolValue::FixedBytes(B256::right_padding_from(&EXTENDED_RESOLVER), 4);
    match call_single(ledger, resolver, &method, &[id]).await {
        Ok(value) => value.as_bool().unwrap_or(false),
        // Older resolvers revert on unknown interface queries.
        Err(_) => false,
    }
}

/// Forward resolution: name → address. `None` when no resolver answers or
/// the address record is empty.
pub async fn resolve<L: Ledger>(ledger: &L, name: &str) -> Result<Option<Address>> {
    let name = normalize(name)?;
    let node = namehash(&name);
    let addr = Method::parse("function addr(bytes32 node) view returns (address)")?;

    for candidate in ancestry(&name) {
        let Some(resolver) = resolver_of(ledger, namehash(candidate)).await? else {
            continue;
        };
        if candidate == name {
            return Ok(non_zero(call_single(ledger, resolver, &addr, &[node_arg(node)]).await?));
        }
        if !supports_extended(ledger, resolver).await {
            tracing::debug!(%name, parent = candidate, "parent resolver has no wildcard support");
            return Ok(None);
        }

        tracing::debug!(%name, parent = candidate, %resolver, "wildcard resolution");
        let resolve = Method::parse(
            "function resolve(bytes name, bytes data) view returns (bytes)",
        )?;
        let inner = addr.encode_call(&[node_arg(node)])?;
        let answer = call_single(
            ledger,
            resolver,
            &resolve,
            &[
                DynSolValue::Bytes(dns_encode(&name)?),
                DynSolValue::Bytes(inner),
            ],
        )
        .await?;
        let bytes = answer
            .as_bytes()
            .ok_or_else(|| LedgerError::InvalidResponse("resolve() did not return bytes".into()))?;
        return Ok(non_zero(addr.decode_single(bytes)?));
    }
    Ok(None)
}

/// Reverse resolution: address → primary name, accepted only when the name
/// resolves back to the same address.
pub async fn lookup<L: Ledger>(ledger: &L, address: Address) -> Result<Option<String>> {
    let reverse = format!("{}.addr.reverse", hex::encode(address));
    let node = namehash(&reverse);
    let Some(resolver) = resolver_of(ledger, node).await? else {
        return Ok(None);
    };
    let method = Method::parse("function name(bytes32 node) view returns (string)")?;
    let name = match call_single(ledger, resolver, &method, &[node_arg(node)]).await? {
        DynSolValue::String(name) if !name.is_empty() => name,
        _ => return Ok(None),
    };

    match resolve(ledger, &name).await? {
        Some(forward) if forward == address => Ok(Some(name)),
        _ => {
            tracing::debug!(%address, %name, "reverse record does not resolve back");
            Ok(None)
        }
    }
}
