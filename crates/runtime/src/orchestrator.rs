//! The conversation orchestrator.
//!
//! One call to [`Bridge::process_query`] is one turn: seed the history with
//! the inbound text, round-trip with the model, dispatch any requested tool
//! invocations, and repeat until the model answers without asking for tools.
//!
//! Tool dispatch is strictly sequential. Every invocation the model requests
//! is answered in history before the next model call goes out, so correlation
//! never spans an outstanding call.

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::lifecycle::ConnectionManager;
use crate::model::{Backend, Message, ModelRequest, Part, Role, ToolResult};
use crate::tools::ToolHost;

/// A chat bridge: one LLM backend plus one tool host connection.
pub struct Bridge<B: Backend> {
    backend: B,
    manager: ConnectionManager,
}

impl<B: Backend> Bridge<B> {
    pub fn new(backend: B, manager: ConnectionManager) -> Self {
        Self { backend, manager }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut ConnectionManager {
        &mut self.manager
    }

    pub fn is_connected(&self) -> bool {
        self.manager.is_connected()
    }

    /// Run one orchestration turn.
    ///
    /// Fails with [`Error::NotConnected`] before issuing any model or
    /// transport call if the lifecycle manager does not report a live
    /// connection.
    pub async fn process_query(&mut self, text: &str) -> Result<String> {
        if !self.manager.is_connected() {
            return Err(Error::NotConnected);
        }
        let host = self.manager.client().ok_or(Error::NotConnected)?;
        run_turn(&self.backend, host, text).await
    }
}

/// The turn state machine, generic over both seams so tests can script them.
pub(crate) async fn run_turn<B, H>(backend: &B, host: &H, text: &str) -> Result<String>
where
    B: Backend,
    H: ToolHost,
{
    let turn = Uuid::new_v4();

    // Descriptors are fetched once per turn and reused for every model call.
    let tools = host.list_tools().await?;
    tracing::debug!(%turn, tools = tools.len(), "turn started");

    let mut history = vec![Message::user(text)];
    let mut output: Vec<String> = Vec::new();

    let mut response = backend
        .call(ModelRequest {
            messages: &history,
            tools: &tools,
        })
        .await?;

    loop {
        for part in &response.message.parts {
            if let Part::Text(text) = part {
                output.push(text.clone());
            }
        }

        let calls = response.message.tool_calls();
        if calls.is_empty() {
            break;
        }

        for call in calls {
            tracing::debug!(%turn, tool = %call.name, id = %call.id, "dispatching tool");

            history.push(Message::from_parts(
                Role::Assistant,
                vec![Part::ToolCall(call.clone())],
            ));

            let content = host.call_tool(&call).await?;

            history.push(Message::from_parts(
                Role::User,
                vec![Part::ToolResult(ToolResult {
                    tool_call_id: call.id,
                    content,
                })],
            ));
        }

        response = backend
            .call(ModelRequest {
                messages: &history,
                tools: &tools,
            })
            .await?;
    }

    tracing::debug!(%turn, blocks = output.len(), "turn finished");
    Ok(output.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelError, ModelResponse, ToolCall, ToolSpec, Usage};
    use crate::tools::ToolError;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedBackend {
        responses: Mutex<VecDeque<ModelResponse>>,
        requests: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedBackend {
        fn new(responses: Vec<ModelResponse>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn seen_requests(&self) -> Vec<Vec<Message>> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Backend for ScriptedBackend {
        async fn call(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
            self.requests.lock().unwrap().push(request.messages.to_vec());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ModelError::Api("script exhausted".into()))
        }
    }

    struct ScriptedHost {
        tools: Vec<ToolSpec>,
        results: Mutex<VecDeque<Result<String, ToolError>>>,
        calls: Mutex<Vec<ToolCall>>,
        listings: Mutex<u32>,
    }

    impl ScriptedHost {
        fn new(results: Vec<Result<String, ToolError>>) -> Self {
            Self {
                tools: vec![ToolSpec {
                    name: "get_contact_details".into(),
                    description: "Look up a contact".into(),
                    input_schema: json!({"type": "object"}),
                }],
                results: Mutex::new(results.into()),
                calls: Mutex::new(Vec::new()),
                listings: Mutex::new(0),
            }
        }

        fn seen_calls(&self) -> Vec<ToolCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ToolHost for ScriptedHost {
        async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolError> {
            *self.listings.lock().unwrap() += 1;
            Ok(self.tools.clone())
        }

        async fn call_tool(&self, call: &ToolCall) -> Result<String, ToolError> {
            self.calls.lock().unwrap().push(call.clone());
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ToolError::Call("script exhausted".into())))
        }
    }

    fn text(s: &str) -> Part {
        Part::Text(s.into())
    }

    fn tool_use(id: &str, name: &str) -> Part {
        Part::ToolCall(ToolCall {
            id: id.into(),
            name: name.into(),
            input: json!({"contact_id": "42"}),
        })
    }

    fn response(parts: Vec<Part>) -> ModelResponse {
        ModelResponse {
            message: Message::from_parts(Role::Assistant, parts),
            usage: Usage::default(),
        }
    }

    #[tokio::test]
    async fn plain_answer_needs_one_model_call() {
        let backend = ScriptedBackend::new(vec![response(vec![text("hello there")])]);
        let host = ScriptedHost::new(vec![]);

        let out = run_turn(&backend, &host, "hi").await.unwrap();
        assert_eq!(out, "hello there");
        assert!(host.seen_calls().is_empty());

        let requests = backend.seen_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].len(), 1);
        assert_eq!(requests[0][0].text(), "hi");
        assert_eq!(requests[0][0].role, Role::User);
    }

    #[tokio::test]
    async fn text_then_tool_then_text_joins_in_emission_order() {
        // Scenario: first response carries one text block and one tool-use
        // block, the follow-up carries only text.
        let backend = ScriptedBackend::new(vec![
            response(vec![text("looking that up"), tool_use("toolu_1", "get_contact_details")]),
            response(vec![text("found it")]),
        ]);
        let host = ScriptedHost::new(vec![Ok("{\"id\":\"42\"}".into())]);

        let out = run_turn(&backend, &host, "who is contact 42?").await.unwrap();
        assert_eq!(out, "looking that up\nfound it");
        assert_eq!(host.seen_calls().len(), 1);
        assert_eq!(host.seen_calls()[0].id, "toolu_1");
    }

    #[tokio::test]
    async fn every_invocation_is_answered_before_the_next_model_call() {
        let backend = ScriptedBackend::new(vec![
            response(vec![
                tool_use("toolu_1", "get_contact_details"),
                tool_use("toolu_2", "get_contact_details"),
            ]),
            response(vec![text("done")]),
        ]);
        let host = ScriptedHost::new(vec![Ok("first".into()), Ok("second".into())]);

        let out = run_turn(&backend, &host, "two lookups").await.unwrap();
        assert_eq!(out, "done");

        // The second model call must see both invocation/result pairs, each
        // result directly after its directive and keyed by the same id.
        let requests = backend.seen_requests();
        assert_eq!(requests.len(), 2);
        let history = &requests[1];
        assert_eq!(history.len(), 5);
        for (directive, result, id) in [(1usize, 2usize, "toolu_1"), (3, 4, "toolu_2")] {
            match (&history[directive].parts[0], &history[result].parts[0]) {
                (Part::ToolCall(call), Part::ToolResult(res)) => {
                    assert_eq!(call.id, id);
                    assert_eq!(res.tool_call_id, id);
                }
                other => panic!("unexpected history shape: {other:?}"),
            }
            assert_eq!(history[directive].role, Role::Assistant);
            assert_eq!(history[result].role, Role::User);
        }
    }

    #[tokio::test]
    async fn output_accumulates_text_across_every_response() {
        let backend = ScriptedBackend::new(vec![
            response(vec![text("a"), tool_use("toolu_1", "get_contact_details")]),
            response(vec![text("b"), tool_use("toolu_2", "get_contact_details")]),
            response(vec![text("c")]),
        ]);
        let host = ScriptedHost::new(vec![Ok("r1".into()), Ok("r2".into())]);

        let out = run_turn(&backend, &host, "chain").await.unwrap();
        assert_eq!(out, "a\nb\nc");
        assert_eq!(host.seen_calls().len(), 2);
    }

    #[tokio::test]
    async fn descriptors_are_fetched_once_per_turn() {
        let backend = ScriptedBackend::new(vec![
            response(vec![tool_use("toolu_1", "get_contact_details")]),
            response(vec![text("done")]),
        ]);
        let host = ScriptedHost::new(vec![Ok("r".into())]);

        run_turn(&backend, &host, "x").await.unwrap();
        assert_eq!(*host.listings.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn tool_failure_aborts_the_turn_without_retry() {
        let backend = ScriptedBackend::new(vec![
            response(vec![tool_use("toolu_1", "get_contact_details")]),
            response(vec![text("never reached")]),
        ]);
        let host = ScriptedHost::new(vec![Err(ToolError::Call("upstream 500".into()))]);

        let err = run_turn(&backend, &host, "x").await.unwrap_err();
        assert!(matches!(err, Error::Tool(_)));
        // The failing call is not retried and no further model call goes out.
        assert_eq!(host.seen_calls().len(), 1);
        assert_eq!(backend.seen_requests().len(), 1);
    }

    #[tokio::test]
    async fn disconnected_bridge_rejects_queries_without_any_calls() {
        let backend = ScriptedBackend::new(vec![]);
        let mut bridge = Bridge::new(backend, ConnectionManager::new());

        let err = bridge.process_query("hi").await.unwrap_err();
        assert!(matches!(err, Error::NotConnected));
        assert!(bridge.backend.seen_requests().is_empty());
    }
}
