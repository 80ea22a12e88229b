//! Declarative tool input schemas.
//!
//! Each field carries a list of [`Rule`]s that the registry evaluates, in
//! order, before a tool runs. The same description is rendered as JSON
//! Schema for the tool catalogue.

use regex::Regex;
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::error::{LedgerError, Result};

const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";
const ADDRESS_PATTERN: &str = "^0x[a-fA-F0-9]{40}$";

/// A violated constraint on one input field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid arguments: {field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// A constraint on a string value.
#[derive(Debug, Clone)]
pub enum Rule {
    /// The value must match the regex.
    Pattern { regex: Regex, message: &'static str },
    /// The value must differ from a forbidden one.
    NotEqual {
        value: &'static str,
        message: &'static str,
    },
    /// The predicate must hold.
    Custom {
        check: fn(&str) -> bool,
        message: &'static str,
    },
}

impl Rule {
    pub fn pattern(pattern: &str, message: &'static str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| LedgerError::InvalidInput(format!("invalid pattern {pattern}: {e}")))?;
        Ok(Self::Pattern { regex, message })
    }

    fn check(&self, value: &str) -> std::result::Result<(), &'static str> {
        let ok = match self {
            Self::Pattern { regex, .. } => regex.is_match(value),
            Self::NotEqual { value: forbidden, .. } => value != *forbidden,
            Self::Custom { check, .. } => check(value),
        };
        if ok { Ok(()) } else { Err(self.message()) }
    }

    fn message(&self) -> &'static str {
        match self {
            Self::Pattern { message, .. }
            | Self::NotEqual { message, .. }
            | Self::Custom { message, .. } => message,
        }
    }
}

/// The address rules: hex pattern, then not the zero address.
pub fn address_rules(invalid_message: &'static str) -> Result<Vec<Rule>> {
    Ok(vec![
        Rule::pattern(ADDRESS_PATTERN, invalid_message)?,
        Rule::NotEqual {
            value: ZERO_ADDRESS,
            message: "Zero address is not allowed",
        },
    ])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    StringArray,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub rules: Vec<Rule>,
}

impl Field {
    pub fn string(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            kind: FieldKind::String,
            required: true,
            rules: Vec::new(),
        }
    }

    pub fn string_array(name: &'static str, description: &'static str) -> Self {
        Self {
            kind: FieldKind::StringArray,
            ..Self::string(name, description)
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_rules(mut self, rules: Vec<Rule>) -> Self {
        self.rules.extend(rules);
        self
    }

    fn to_json(&self) -> Value {
        let mut property = match self.kind {
            FieldKind::String => json!({ "type": "string" }),
            FieldKind::StringArray => json!({ "type": "array", "items": { "type": "string" } }),
        };
        if let Some(pattern) = self.rules.iter().find_map(|rule| match rule {
            Rule::Pattern { regex, .. } => Some(regex.as_str()),
            _ => None,
        }) {
            property["pattern"] = json!(pattern);
        }
        property["description"] = json!(self.description);
        property
    }

    fn validate(&self, value: &Value) -> std::result::Result<(), ValidationError> {
        let check = |s: &str| {
            self.rules
                .iter()
                .try_for_each(|rule| rule.check(s))
                .map_err(|message| ValidationError::new(self.name, message))
        };
        match (self.kind, value) {
            (FieldKind::String, Value::String(s)) => check(s),
            (FieldKind::String, other) => Err(ValidationError::new(
                self.name,
                format!("Expected string, received {}", json_type(other)),
            )),
            (FieldKind::StringArray, Value::Array(items)) => items.iter().try_for_each(|item| {
                match item {
                    Value::String(s) => check(s),
                    other => Err(ValidationError::new(
                        self.name,
                        format!("Expected string, received {}", json_type(other)),
                    )),
                }
            }),
            (FieldKind::StringArray, other) => Err(ValidationError::new(
                self.name,
                format!("Expected array, received {}", json_type(other)),
            )),
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The input schema of one tool.
#[derive(Debug, Clone, Default)]
pub struct InputSchema {
    fields: Vec<Field>,
}

impl InputSchema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// JSON Schema object advertised in the tool catalogue.
    pub fn to_json(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|field| (field.name.to_string(), field.to_json()))
            .collect();
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|field| field.required)
            .map(|field| field.name)
            .collect();

        let mut schema = json!({
            "type": "object",
            "properties": properties,
            "additionalProperties": false,
        });
        if !required.is_empty() {
            schema["required"] = json!(required);
        }
        schema
    }

    /// Check `args` against every field. Returns the known fields only.
    pub fn validate(
        &self,
        args: &Value,
    ) -> std::result::Result<Map<String, Value>, ValidationError> {
        let empty = Map::new();
        let object = match args {
            Value::Object(object) => object,
            Value::Null => &empty,
            other => {
                return Err(ValidationError::new(
                    "arguments",
                    format!("Expected object, received {}", json_type(other)),
                ));
            }
        };

        let mut validated = Map::new();
        for field in &self.fields {
            match object.get(field.name) {
                Some(value) => {
                    field.validate(value)?;
                    validated.insert(field.name.to_string(), value.clone());
                }
                None if field.required => {
                    return Err(ValidationError::new(field.name, "Required"));
                }
                None => {}
            }
        }
        Ok(validated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address_schema() -> InputSchema {
        InputSchema::new(vec![
            Field::string("address", "The address")
                .with_rules(address_rules("Invalid Ethereum address").unwrap()),
        ])
    }

    #[test]
    fn accepts_valid_address() {
        let args = json!({ "address": "0x70997970C51812dc3A010C7d01b50e0d17dc79C8" });
        let validated = address_schema().validate(&args).unwrap();
        assert_eq!(validated["address"], args["address"]);
    }

    #[test]
    fn reports_field_and_rule() {
        let err = address_schema()
            .validate(&json!({ "address": "0x1234" }))
            .unwrap_err();
        assert_eq!(err.field, "address");
        assert_eq!(err.message, "Invalid Ethereum address");

        let err = address_schema()
            .validate(&json!({ "address": ZERO_ADDRESS }))
            .unwrap_err();
        assert_eq!(err.message, "Zero address is not allowed");
        assert!(err.to_string().contains("address"));
    }

    #[test]
    fn missing_and_mistyped_fields() {
        let err = address_schema().validate(&json!({})).unwrap_err();
        assert_eq!(err.message, "Required");

        let err = address_schema().validate(&json!({ "address": 5 })).unwrap_err();
        assert_eq!(err.message, "Expected string, received number");

        let err = address_schema().validate(&json!("0x00")).unwrap_err();
        assert_eq!(err.field, "arguments");
    }

    #[test]
    fn optional_array_field() {
        let schema = InputSchema::new(vec![Field::string_array("args", "Arguments").optional()]);
        assert!(schema.validate(&json!({})).unwrap().is_empty());
        assert!(schema.validate(&json!({ "args": ["1", "two"] })).is_ok());
        assert!(schema.validate(&json!({ "args": [1] })).is_err());
    }

    #[test]
    fn custom_rule() {
        let schema = InputSchema::new(vec![Field::string("amount", "Amount").with_rules(vec![
            Rule::Custom {
                check: |s| s.parse::<f64>().is_ok_and(|n| n > 0.0),
                message: "Amount must be positive",
            },
        ])]);
        assert!(schema.validate(&json!({ "amount": "0.5" })).is_ok());
        assert_eq!(
            schema.validate(&json!({ "amount": "0" })).unwrap_err().message,
            "Amount must be positive"
        );
    }

    #[test]
    fn renders_json_schema() {
        let schema = address_schema().to_json();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["address"]));
        assert_eq!(schema["properties"]["address"]["pattern"], ADDRESS_PATTERN);
        assert_eq!(schema["additionalProperties"], false);

        let empty = InputSchema::default().to_json();
        assert!(empty.get("required").is_none());
    }
}
