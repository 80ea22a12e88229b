//! The tool-calling conversation loop.
//!
//! One call to [`Conversation::process_query`] turns a user utterance into
//! a single block of text:
//!
//! 1. The model is queried with the utterance and the tool catalogue.
//! 2. Response blocks are handled in order. Text is appended to the output.
//!    Each tool call is dispatched, a marker is appended, the result is
//!    added to the turn history and a follow-up query is issued.
//! 3. Follow-ups issued below `max_tool_depth` carry the catalogue and are
//!    processed the same way, depth-first. At the limit, a follow-up gets no
//!    catalogue and only its first text block is kept.
//!
//! With the default depth of 1, a query costs at most `1 + k` model calls,
//! where `k` is the number of tool calls in the first response.

use crate::model::{Backend, ModelRequest, ModelResponse, Part, ToolCall, ToolResult, Turn};
use crate::tools::ToolHost;
use crate::{Error, Result};

pub const DEFAULT_MAX_TOOL_DEPTH: usize = 1;

/// Marker recorded in the output for each dispatched tool call.
pub fn tool_marker(call: &ToolCall) -> String {
    format!("[Calling tool {} with args {}]", call.name, call.input)
}

struct Frame {
    parts: std::vec::IntoIter<Part>,
    level: usize,
}

/// Drives a model and a tool host through one query at a time.
pub struct Conversation<B, T> {
    backend: B,
    tools: T,
    max_tool_depth: usize,
}

impl<B: Backend, T: ToolHost> Conversation<B, T> {
    pub fn new(backend: B, tools: T) -> Self {
        Self {
            backend,
            tools,
            max_tool_depth: DEFAULT_MAX_TOOL_DEPTH,
        }
    }

    /// Nesting limit for tool calls made from follow-up responses.
    /// Values below 1 are treated as 1.
    pub fn with_max_tool_depth(mut self, depth: usize) -> Self {
        self.max_tool_depth = depth.max(1);
        self
    }

    pub fn tools(&self) -> &T {
        &self.tools
    }

    /// Give back the tool host, e.g. to shut it down.
    pub fn into_tools(self) -> T {
        self.tools
    }

    async fn query(&self, turns: &[Turn], with_tools: bool) -> Result<ModelResponse> {
        let request = ModelRequest {
            turns,
            tools: with_tools.then(|| self.tools.specs()),
        };
        let response = self.backend.call(request).await?;
        tracing::debug!(
            with_tools,
            tool_calls = response.message.tool_calls().count(),
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "model responded"
        );
        Ok(response)
    }

    /// Resolve one user utterance. Tool failures are fed to the model as
    /// results; model and transport errors abort the query.
    pub async fn process_query(&self, query: &str) -> Result<String> {
        let mut turns = vec![Turn::user(query)];
        let mut output: Vec<String> = Vec::new();

        let first = self.query(&turns, true).await?;
        let mut stack = vec![Frame {
            parts: first.message.parts.into_iter(),
            level: 1,
        }];

        while let Some(frame) = stack.last_mut() {
            let level = frame.level;
            let Some(part) = frame.parts.next() else {
                stack.pop();
                continue;
            };

            let call = match part {
                Part::Text(text) => {
                    output.push(text);
                    continue;
                }
                Part::ToolCall(call) => call,
                Part::ToolResult(_) => continue,
            };

            tracing::info!(tool = %call.name, depth = level, "dispatching tool call");
            let outcome = self.tools.execute(&call).await.map_err(Error::Transport)?;
            if !outcome.is_success() {
                tracing::debug!(tool = %call.name, error = outcome.text(), "tool reported failure");
            }
            output.push(tool_marker(&call));
            turns.push(Turn::tool_result(ToolResult {
                tool_call_id: call.id,
                outcome,
            }));

            let nested = level < self.max_tool_depth;
            let follow_up = self.query(&turns, nested).await?.message;
            if nested {
                let text = follow_up.text();
                if !text.is_empty() {
                    turns.push(Turn::model(vec![Part::Text(text)]));
                }
                stack.push(Frame {
                    parts: follow_up.parts.into_iter(),
                    level: level + 1,
                });
            } else if let Some(text) = follow_up.first_text() {
                output.push(text.to_string());
            }
        }

        Ok(output.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelError, Role, ToolSpec, Usage};
    use crate::tools::ToolError;
    use mcp::ToolOutcome;
    use serde_json::{Value, json};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted responses and records every request.
    #[derive(Default)]
    struct ScriptedBackend {
        responses: Mutex<VecDeque<std::result::Result<Vec<Part>, ModelError>>>,
        requests: Mutex<Vec<(Vec<Turn>, bool)>>,
    }

    impl ScriptedBackend {
        fn new(responses: Vec<Vec<Part>>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().map(Ok).collect()),
                requests: Mutex::default(),
            }
        }

        fn failing(error: ModelError) -> Self {
            Self {
                responses: Mutex::new(VecDeque::from([Err(error)])),
                requests: Mutex::default(),
            }
        }

        fn requests(&self) -> Vec<(Vec<Turn>, bool)> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Backend for ScriptedBackend {
        async fn call(
            &self,
            request: ModelRequest<'_>,
        ) -> std::result::Result<ModelResponse, ModelError> {
            self.requests
                .lock()
                .unwrap()
                .push((request.turns.to_vec(), request.tools.is_some()));
            let parts = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(vec![text("(no more responses)")]))?;
            Ok(ModelResponse {
                message: Turn::model(parts),
                usage: Usage::default(),
            })
        }
    }

    /// Answers every call from a fixed table and records the order.
    struct RecordingHost {
        specs: Vec<ToolSpec>,
        calls: Mutex<Vec<String>>,
        broken: bool,
    }

    impl RecordingHost {
        fn new(names: &[&str]) -> Self {
            Self {
                specs: names
                    .iter()
                    .map(|name| ToolSpec {
                        name: name.to_string(),
                        description: String::new(),
                        schema: json!({ "type": "object" }),
                    })
                    .collect(),
                calls: Mutex::default(),
                broken: false,
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ToolHost for RecordingHost {
        fn specs(&self) -> &[ToolSpec] {
            &self.specs
        }

        async fn execute(&self, call: &ToolCall) -> std::result::Result<ToolOutcome, ToolError> {
            if self.broken {
                return Err(ToolError::Transport("pipe closed".into()));
            }
            self.calls.lock().unwrap().push(call.name.clone());
            Ok(match call.name.as_str() {
                "getEthBalance" => ToolOutcome::success("1000"),
                "fail" => ToolOutcome::failure("Error getting balance: timeout"),
                name => ToolOutcome::success(format!("{name} done")),
            })
        }
    }

    fn text(s: &str) -> Part {
        Part::Text(s.to_string())
    }

    fn tool(id: &str, name: &str, input: Value) -> Part {
        Part::ToolCall(ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            input,
        })
    }

    #[tokio::test]
    async fn text_only_response() {
        let backend = ScriptedBackend::new(vec![vec![text("Hello!")]]);
        let conversation = Conversation::new(backend, RecordingHost::new(&[]));
        assert_eq!(conversation.process_query("hi").await.unwrap(), "Hello!");

        let requests = conversation.backend.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].1, "first query carries the catalogue");
        assert_eq!(requests[0].0, vec![Turn::user("hi")]);
    }

    #[tokio::test]
    async fn balance_query_end_to_end() {
        let address = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
        let backend = ScriptedBackend::new(vec![
            vec![tool("t1", "getEthBalance", json!({ "address": address }))],
            vec![text("The balance is 1000 ETH.")],
        ]);
        let conversation = Conversation::new(backend, RecordingHost::new(&["getEthBalance"]));
        let output = conversation
            .process_query(&format!("What is the balance of {address}?"))
            .await
            .unwrap();

        assert_eq!(
            output,
            format!(
                "[Calling tool getEthBalance with args {{\"address\":\"{address}\"}}]\n\
                 The balance is 1000 ETH."
            )
        );

        let requests = conversation.backend.requests();
        assert_eq!(requests.len(), 2);
        let (turns, with_tools) = &requests[1];
        assert!(!with_tools, "follow-up carries no catalogue at depth 1");
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].role, Role::ToolResult);
        assert_eq!(
            turns[1].parts,
            vec![Part::ToolResult(ToolResult {
                tool_call_id: "t1".into(),
                outcome: ToolOutcome::success("1000"),
            })]
        );
    }

    #[tokio::test]
    async fn tool_calls_run_in_order_with_text_interleaved() {
        let backend = ScriptedBackend::new(vec![
            vec![
                text("first"),
                tool("a", "A", json!({})),
                text("between"),
                tool("b", "B", json!({})),
                tool("c", "C", json!({})),
            ],
            vec![text("after A")],
            vec![text("after B")],
            vec![text("after C")],
        ]);
        let conversation = Conversation::new(backend, RecordingHost::new(&["A", "B", "C"]));
        let output = conversation.process_query("go").await.unwrap();

        assert_eq!(conversation.tools().calls(), ["A", "B", "C"]);
        assert_eq!(
            output.lines().collect::<Vec<_>>(),
            [
                "first",
                "[Calling tool A with args {}]",
                "after A",
                "between",
                "[Calling tool B with args {}]",
                "after B",
                "[Calling tool C with args {}]",
                "after C",
            ]
        );

        // Each follow-up sees every earlier tool result.
        let requests = conversation.backend.requests();
        let history: Vec<usize> = requests.iter().map(|(turns, _)| turns.len()).collect();
        assert_eq!(history, [1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn depth_one_terminates_after_one_plus_k_queries() {
        for k in 0..4 {
            let mut first = vec![text("start")];
            first.extend((0..k).map(|i| tool(&format!("t{i}"), "A", json!({}))));
            // Follow-ups try to call more tools; at depth 1 these are ignored.
            let mut script = vec![first];
            script.extend((0..k).map(|_| vec![tool("x", "A", json!({})), text("done")]));

            let conversation =
                Conversation::new(ScriptedBackend::new(script), RecordingHost::new(&["A"]));
            conversation.process_query("q").await.unwrap();

            assert_eq!(conversation.backend.requests().len(), 1 + k);
            assert_eq!(conversation.tools().calls().len(), k);
        }
    }

    #[tokio::test]
    async fn follow_up_without_text_adds_nothing() {
        let backend = ScriptedBackend::new(vec![vec![tool("a", "A", json!({}))], vec![]]);
        let conversation = Conversation::new(backend, RecordingHost::new(&["A"]));
        let output = conversation.process_query("q").await.unwrap();
        assert_eq!(output, "[Calling tool A with args {}]");
    }

    #[tokio::test]
    async fn tool_failures_are_injected_not_raised() {
        let backend = ScriptedBackend::new(vec![
            vec![tool("f", "fail", json!({}))],
            vec![text("The node timed out.")],
        ]);
        let conversation = Conversation::new(backend, RecordingHost::new(&["fail"]));
        let output = conversation.process_query("q").await.unwrap();
        assert!(output.ends_with("The node timed out."));

        let requests = conversation.backend.requests();
        let Part::ToolResult(result) = &requests[1].0[1].parts[0] else {
            panic!("expected a tool result turn");
        };
        assert_eq!(
            result.outcome,
            ToolOutcome::failure("Error getting balance: timeout")
        );
    }

    #[tokio::test]
    async fn model_errors_propagate() {
        let backend = ScriptedBackend::failing(ModelError::Network("connection reset".into()));
        let conversation = Conversation::new(backend, RecordingHost::new(&["A"]));
        let err = conversation.process_query("q").await.unwrap_err();
        assert!(matches!(err, Error::Model(ModelError::Network(_))));
        assert!(conversation.tools().calls().is_empty());
    }

    #[tokio::test]
    async fn transport_errors_propagate() {
        let backend = ScriptedBackend::new(vec![vec![tool("a", "A", json!({}))]]);
        let mut host = RecordingHost::new(&["A"]);
        host.broken = true;
        let conversation = Conversation::new(backend, host);
        let err = conversation.process_query("q").await.unwrap_err();
        assert!(matches!(err, Error::Transport(ToolError::Transport(_))));
        assert_eq!(conversation.backend.requests().len(), 1);
    }

    #[tokio::test]
    async fn deeper_limit_follows_nested_tool_calls() {
        let backend = ScriptedBackend::new(vec![
            vec![tool("a", "A", json!({})), text("tail")],
            vec![text("need B"), tool("b", "B", json!({}))],
            vec![text("all done")],
        ]);
        let conversation =
            Conversation::new(backend, RecordingHost::new(&["A", "B"])).with_max_tool_depth(2);
        let output = conversation.process_query("q").await.unwrap();

        assert_eq!(conversation.tools().calls(), ["A", "B"]);
        assert_eq!(
            output.lines().collect::<Vec<_>>(),
            [
                "[Calling tool A with args {}]",
                "need B",
                "[Calling tool B with args {}]",
                "all done",
                "tail",
            ]
        );

        let requests = conversation.backend.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[1].1, "level-1 follow-up carries the catalogue");
        assert!(!requests[2].1, "level-2 follow-up does not");
        // user, result A, model text, result B
        let roles: Vec<Role> = requests[2].0.iter().map(|turn| turn.role).collect();
        assert_eq!(
            roles,
            [Role::User, Role::ToolResult, Role::Model, Role::ToolResult]
        );
    }
}
