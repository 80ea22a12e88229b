//! Contract calls: picking a function from an ABI, coercing textual
//! arguments, encoding calldata and rendering decoded results as JSON.

use alloy_dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt, Specifier};
use alloy_json_abi::{Function, JsonAbi};
use alloy_primitives::{Selector, hex};
use serde_json::Value;

use crate::error::{LedgerError, Result};

/// One callable contract function.
#[derive(Debug, Clone)]
pub struct Method {
    function: Function,
}

impl Method {
    /// Parse a human-readable signature such as
    /// `function balanceOf(address) view returns (uint256)`.
    pub fn parse(signature: &str) -> Result<Self> {
        Function::parse(signature)
            .map(|function| Self { function })
            .map_err(|e| {
                LedgerError::InvalidInput(format!("invalid function signature `{signature}`: {e}"))
            })
    }

    /// Find `name` in a JSON ABI, choosing the overload with `arg_count` inputs.
    pub fn from_abi(abi: &str, name: &str, arg_count: usize) -> Result<Self> {
        let abi: JsonAbi = serde_json::from_str(abi)
            .map_err(|e| LedgerError::InvalidInput(format!("invalid ABI: {e}")))?;
        let overloads = abi
            .function(name)
            .ok_or_else(|| LedgerError::InvalidInput(format!("no function `{name}` in ABI")))?;
        overloads
            .iter()
            .find(|function| function.inputs.len() == arg_count)
            .map(|function| Self {
                function: function.clone(),
            })
            .ok_or_else(|| {
                LedgerError::InvalidInput(format!(
                    "`{name}` does not take {arg_count} argument(s)"
                ))
            })
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }

    pub fn selector(&self) -> Selector {
        self.function.selector()
    }

    /// Convert textual arguments to the function's input types. A JSON
    /// string is unquoted first; anything else is read as written, so large
    /// integers keep full precision.
    pub fn coerce_args(&self, args: &[String]) -> Result<Vec<DynSolValue>> {
        if args.len() != self.function.inputs.len() {
            return Err(LedgerError::InvalidInput(format!(
                "`{}` takes {} argument(s), got {}",
                self.name(),
                self.function.inputs.len(),
                args.len()
            )));
        }
        self.function
            .inputs
            .iter()
            .zip(args)
            .map(|(param, arg)| {
                let ty = param
                    .resolve()
                    .map_err(|e| LedgerError::UnsupportedAbiType(format!("{}: {e}", param.ty)))?;
                let text = match serde_json::from_str::<Value>(arg) {
                    Ok(Value::String(unquoted)) => unquoted,
                    _ => arg.clone(),
                };
                ty.coerce_str(&text).map_err(|e| {
                    LedgerError::InvalidInput(format!("cannot encode `{text}` as {ty}: {e}"))
                })
            })
            .collect()
    }

    /// Selector followed by the encoded arguments.
    pub fn encode_call(&self, args: &[DynSolValue]) -> Result<Vec<u8>> {
        self.function.abi_encode_input(args).map_err(|e| {
            LedgerError::InvalidInput(format!("cannot encode arguments of `{}`: {e}", self.name()))
        })
    }

    pub fn decode_output(&self, data: &[u8]) -> Result<Vec<DynSolValue>> {
        self.function.abi_decode_output(data).map_err(|e| {
            LedgerError::InvalidResponse(format!("cannot decode result of `{}`: {e}", self.name()))
        })
    }

    /// The first return value.
    pub fn decode_single(&self, data: &[u8]) -> Result<DynSolValue> {
        self.decode_output(data)?.into_iter().next().ok_or_else(|| {
            LedgerError::InvalidResponse(format!("`{}` returned nothing", self.name()))
        })
    }

    /// A single return value as itself, several as an array.
    pub fn decode_output_json(&self, data: &[u8]) -> Result<Value> {
        let mut values = self.decode_output(data)?;
        Ok(if values.len() == 1 {
            to_json(&values.remove(0))
        } else {
            Value::Array(values.iter().map(to_json).collect())
        })
    }
}

/// JSON rendering of a decoded value. Integers become decimal strings.
pub fn to_json(value: &DynSolValue) -> Value {
    match value {
        DynSolValue::Bool(b) => Value::Bool(*b),
        DynSolValue::Int(n, _) => Value::String(n.to_string()),
        DynSolValue::Uint(n, _) => Value::String(n.to_string()),
        DynSolValue::Address(address) => Value::String(address.to_checksum(None)),
        DynSolValue::FixedBytes(word, size) => Value::String(hex::encode_prefixed(&word[..*size])),
        DynSolValue::Function(function) => Value::String(hex::encode_prefixed(function)),
        DynSolValue::Bytes(bytes) => Value::String(hex::encode_prefixed(bytes)),
        DynSolValue::String(s) => Value::String(s.clone()),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
            Value::Array(items.iter().map(to_json).collect())
        }
        #[allow(unreachable_patterns)]
        _ => Value::Null,
    }
}
