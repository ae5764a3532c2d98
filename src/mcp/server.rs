//! Stdio JSON-RPC server dispatching tool calls to a handler.

use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use super::protocol::{
    CallToolParams, CallToolResult, Request, Response, RpcError, ToolDefinition, INTERNAL_ERROR,
    INVALID_REQUEST, JSONRPC_VERSION, PARSE_ERROR, PROTOCOL_VERSION,
};

/// Handler trait for listing and invoking tools.
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync {
    /// Tools advertised by `tools/list`.
    fn tools(&self) -> Vec<ToolDefinition>;

    /// Invoke a tool by name.
    async fn call(&self, name: &str, arguments: Value) -> Result<CallToolResult, RpcError>;
}

/// Name and version reported during `initialize`.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: "social".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Tool server speaking newline-delimited JSON-RPC.
pub struct McpServer<H> {
    handler: Arc<H>,
    info: ServerInfo,
}

impl<H> McpServer<H>
where
    H: ToolHandler + 'static,
{
    pub fn new(handler: H) -> Self {
        Self {
            handler: Arc::new(handler),
            info: ServerInfo::default(),
        }
    }

    /// Serve on the process's stdin and stdout until stdin closes.
    pub async fn serve_stdio(&self) -> Result<()> {
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await?;
        Ok(())
    }

    /// Serve requests read from `reader`, writing responses to `writer`.
    ///
    /// Tool calls run concurrently; responses may be written out of request order. Returns the
    /// writer once the input is exhausted and every pending call has answered.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<W>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel::<Response>();
        let writer_task = tokio::spawn(write_responses(rx, writer));
        let mut calls = JoinSet::new();

        let mut lines = BufReader::new(reader).lines();
        while let Some(line) = lines
            .next_line()
            .await
            .context("Failed to read from stdin")?
        {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let pending = reap_finished(&mut calls);
            tracing::debug!("{} tool call(s) in flight", pending);

            let request = match parse_request(line) {
                Ok(request) => request,
                Err(response) => {
                    let _ = tx.send(response);
                    continue;
                }
            };

            if let Some(response) = self.dispatch(request, &tx, &mut calls) {
                let _ = tx.send(response);
            }
        }

        tracing::info!("Input closed, waiting for {} pending call(s)", calls.len());
        while calls.join_next().await.is_some() {}
        drop(tx);

        writer_task
            .await
            .context("Response writer task failed")?
            .context("Failed to write response")
    }

    /// Handle one request; returns an immediate response, or `None` for notifications and
    /// for tool calls answered later by a spawned task.
    fn dispatch(
        &self,
        request: Request,
        tx: &mpsc::UnboundedSender<Response>,
        calls: &mut JoinSet<()>,
    ) -> Option<Response> {
        tracing::debug!("Received {}", request.method);

        if request.jsonrpc != JSONRPC_VERSION {
            let id = request.id.unwrap_or(Value::Null);
            let error = RpcError::new(INVALID_REQUEST, "Invalid Request: jsonrpc must be \"2.0\"");
            return Some(Response::failure(id, error));
        }

        let Some(id) = request.id else {
            // Notifications (e.g. notifications/initialized) never get a reply.
            return None;
        };

        match request.method.as_str() {
            "initialize" => Some(Response::success(id, self.initialize_result())),
            "ping" => Some(Response::success(id, json!({}))),
            "tools/list" => Some(Response::success(id, json!({ "tools": self.handler.tools() }))),
            "tools/call" => {
                let params: CallToolParams =
                    match serde_json::from_value(request.params.unwrap_or(Value::Null)) {
                        Ok(params) => params,
                        Err(e) => {
                            return Some(Response::failure(
                                id,
                                RpcError::invalid_params(format!("Invalid tool call: {}", e)),
                            ))
                        }
                    };

                let handler = Arc::clone(&self.handler);
                let tx = tx.clone();
                calls.spawn(async move {
                    let response = run_tool_call(handler, id, params).await;
                    let _ = tx.send(response);
                });
                None
            }
            other => Some(Response::failure(id, RpcError::method_not_found(other))),
        }
    }

    fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": { "listChanged": false } },
            "serverInfo": { "name": self.info.name, "version": self.info.version },
        })
    }
}

/// Parse one line into a request, or into the error response owed to the sender.
fn parse_request(line: &str) -> Result<Request, Response> {
    let value: Value = serde_json::from_str(line).map_err(|e| {
        tracing::warn!("Discarding malformed message: {}", e);
        Response::failure(
            Value::Null,
            RpcError::new(PARSE_ERROR, format!("Parse error: {}", e)),
        )
    })?;

    let id = value.get("id").cloned().unwrap_or(Value::Null);
    serde_json::from_value(value).map_err(|e| {
        tracing::warn!("Rejecting invalid request: {}", e);
        Response::failure(
            id,
            RpcError::new(INVALID_REQUEST, format!("Invalid Request: {}", e)),
        )
    })
}

/// Drop finished call tasks; returns how many are still running.
fn reap_finished(calls: &mut JoinSet<()>) -> usize {
    while let Some(outcome) = calls.try_join_next() {
        if let Err(e) = outcome {
            tracing::error!("Tool call task failed: {}", e);
        }
    }
    calls.len()
}

/// Run a tool call on its own task so a panic becomes an error response.
async fn run_tool_call<H>(handler: Arc<H>, id: Value, params: CallToolParams) -> Response
where
    H: ToolHandler + 'static,
{
    let CallToolParams { name, arguments } = params;
    let arguments = arguments.unwrap_or_else(|| json!({}));
    let outcome = tokio::spawn(async move { handler.call(&name, arguments).await }).await;

    match outcome {
        Ok(Ok(result)) => match serde_json::to_value(result) {
            Ok(value) => Response::success(id, value),
            Err(e) => Response::failure(id, RpcError::new(INTERNAL_ERROR, e.to_string())),
        },
        Ok(Err(error)) => Response::failure(id, error),
        Err(e) => {
            tracing::error!("Tool call task failed: {}", e);
            Response::failure(id, RpcError::new(INTERNAL_ERROR, format!("Tool call failed: {}", e)))
        }
    }
}

/// Write each response as one JSON line, flushing after every message.
async fn write_responses<W>(
    mut rx: mpsc::UnboundedReceiver<Response>,
    mut writer: W,
) -> std::io::Result<W>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let json = match response.to_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to serialize response: {}", e);
                continue;
            }
        };

        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }

    Ok(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::protocol::{INVALID_PARAMS, METHOD_NOT_FOUND};

    // Mock handler for testing
    struct EchoHandler;

    #[async_trait::async_trait]
    impl ToolHandler for EchoHandler {
        fn tools(&self) -> Vec<ToolDefinition> {
            vec![ToolDefinition {
                name: "echo".to_string(),
                description: "Echo the message".to_string(),
                input_schema: json!({ "type": "object" }),
            }]
        }

        async fn call(&self, name: &str, arguments: Value) -> Result<CallToolResult, RpcError> {
            match name {
                "echo" => Ok(CallToolResult::text(
                    arguments["message"].as_str().unwrap_or_default(),
                )),
                "panic" => panic!("tool exploded"),
                other => Err(RpcError::invalid_params(format!("Unknown tool: {}", other))),
            }
        }
    }

    async fn exchange(input: &str) -> Vec<Value> {
        let server = McpServer::new(EchoHandler);
        let output = server.serve(input.as_bytes(), Vec::new()).await.unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    fn find(responses: &[Value], id: Value) -> &Value {
        responses
            .iter()
            .find(|r| r["id"] == id)
            .unwrap_or_else(|| panic!("no response with id {}", id))
    }

    #[tokio::test]
    async fn test_initialize_handshake() {
        let responses = exchange(concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"test","version":"0"}}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
        ))
        .await;

        assert_eq!(responses.len(), 1, "notifications must not be answered");
        let result = &responses[0]["result"];
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "social");
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_tools_list_and_call() {
        let responses = exchange(concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"echo","arguments":{"message":"hi"}}}"#,
            "\n",
        ))
        .await;

        assert_eq!(find(&responses, json!(1))["result"]["tools"][0]["name"], "echo");
        let call = find(&responses, json!(2));
        assert_eq!(call["result"]["content"][0]["text"], "hi");
        assert_eq!(call["result"]["isError"], false);
    }

    #[tokio::test]
    async fn test_error_responses() {
        let responses = exchange(concat!(
            "this is not json\n",
            r#"{"jsonrpc":"2.0","id":"u","method":"resources/list"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":"bad","method":"tools/call","params":{"arguments":{}}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":"missing","method":"tools/call","params":{"name":"nope"}}"#,
            "\n",
            r#"{"jsonrpc":"1.0","id":"old","method":"ping"}"#,
            "\n",
        ))
        .await;

        assert_eq!(find(&responses, Value::Null)["error"]["code"], PARSE_ERROR);
        assert_eq!(find(&responses, json!("u"))["error"]["code"], METHOD_NOT_FOUND);
        assert_eq!(find(&responses, json!("bad"))["error"]["code"], INVALID_PARAMS);
        assert_eq!(find(&responses, json!("missing"))["error"]["code"], INVALID_PARAMS);
        assert_eq!(find(&responses, json!("old"))["error"]["code"], INVALID_REQUEST);
    }

    #[tokio::test]
    async fn test_request_shape_errors() {
        let responses = exchange(concat!(
            r#"{"jsonrpc":"2.0","id":"nomethod"}"#,
            "\n",
            r#"[1,2,3]"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#,
            "\n",
        ))
        .await;

        assert_eq!(responses.len(), 3);
        assert_eq!(find(&responses, json!("nomethod"))["error"]["code"], INVALID_REQUEST);
        let null_ids: Vec<&Value> = responses.iter().filter(|r| r["id"].is_null()).collect();
        assert_eq!(null_ids.len(), 2);
        assert!(null_ids
            .iter()
            .any(|r| r["error"]["code"] == json!(INVALID_REQUEST)));
        assert!(null_ids.iter().any(|r| r["result"] == json!({})));
    }

    #[tokio::test]
    async fn test_finished_calls_are_reaped() {
        let mut calls = JoinSet::new();
        for _ in 0..50 {
            calls.spawn(async {});
        }
        let (_gate, gate_rx) = tokio::sync::oneshot::channel::<()>();
        calls.spawn(async move {
            let _ = gate_rx.await;
        });

        let pending = tokio::time::timeout(std::time::Duration::from_secs(5), async {
            loop {
                let pending = reap_finished(&mut calls);
                if pending == 1 {
                    return pending;
                }
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("finished calls should be reaped");

        assert_eq!(pending, 1);
    }

    #[tokio::test]
    async fn test_many_calls_all_answered() {
        let input: String = (0..200)
            .map(|i| {
                format!(
                    "{{\"jsonrpc\":\"2.0\",\"id\":{},\"method\":\"tools/call\",\"params\":{{\"name\":\"echo\",\"arguments\":{{\"message\":\"m{}\"}}}}}}\n",
                    i, i
                )
            })
            .collect();

        let responses = exchange(&input).await;

        assert_eq!(responses.len(), 200);
        assert_eq!(find(&responses, json!(199))["result"]["content"][0]["text"], "m199");
    }

    #[tokio::test]
    async fn test_panicking_tool_reports_internal_error() {
        let responses = exchange(concat!(
            r#"{"jsonrpc":"2.0","id":9,"method":"tools/call","params":{"name":"panic"}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":10,"method":"ping"}"#,
            "\n",
        ))
        .await;

        assert_eq!(find(&responses, json!(9))["error"]["code"], INTERNAL_ERROR);
        assert_eq!(find(&responses, json!(10))["result"], json!({}));
    }
}
