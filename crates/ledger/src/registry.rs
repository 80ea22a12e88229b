use mcp::{Tool, ToolHandler, ToolOutcome};
use serde_json::Value;

use crate::context::LedgerContext;
use crate::error::Result;
use crate::ledger::Ledger;
use crate::schema::InputSchema;
use crate::tools::{self, ToolKind};

struct Entry {
    kind: ToolKind,
    schema: InputSchema,
}

/// The fixed tool catalogue bound to a ledger context.
///
/// Contents are read-only after construction, so invocations of different
/// tools may run concurrently.
pub struct ToolRegistry<L> {
    context: LedgerContext<L>,
    entries: Vec<Entry>,
}

impl<L: Ledger> ToolRegistry<L> {
    pub fn new(context: LedgerContext<L>) -> Result<Self> {
        let entries = ToolKind::ALL
            .into_iter()
            .map(|kind| Ok(Entry { kind, schema: kind.schema()? }))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { context, entries })
    }

    pub fn context(&self) -> &LedgerContext<L> {
        &self.context
    }

    /// Tool descriptors in registration order.
    pub fn list(&self) -> Vec<Tool> {
        self.entries
            .iter()
            .map(|entry| Tool {
                name: entry.kind.name().to_string(),
                description: Some(entry.kind.description().to_string()),
                input_schema: entry.schema.to_json(),
            })
            .collect()
    }

    /// Look up, validate and run a tool. Every failure comes back as
    /// [`ToolOutcome::Failure`].
    pub async fn invoke(&self, name: &str, args: Value) -> ToolOutcome {
        let Some(entry) = self.entries.iter().find(|entry| entry.kind.name() == name) else {
            tracing::warn!(tool = name, "unknown tool requested");
            return ToolOutcome::failure(format!("unknown tool: {name}"));
        };

        let validated = match entry.schema.validate(&args) {
            Ok(validated) => validated,
            Err(e) => {
                tracing::info!(tool = name, field = %e.field, "rejected invalid arguments");
                return ToolOutcome::failure(e.to_string());
            }
        };

        tracing::info!(tool = name, "invoking tool");
        tools::execute(entry.kind, &self.context, &validated).await
    }
}

impl<L: Ledger> ToolHandler for ToolRegistry<L> {
    fn tools(&self) -> Vec<Tool> {
        self.list()
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> ToolOutcome {
        self.invoke(name, arguments).await
    }
}
