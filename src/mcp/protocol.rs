//! JSON-RPC 2.0 message types for the stdio tool protocol.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// Protocol revision announced during `initialize`
pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

/// Incoming request or notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub jsonrpc: String,
    /// Absent for notifications; an explicit `null` is still a request
    #[serde(
        default,
        deserialize_with = "present_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Request {
    /// Deserialize a request from one line of JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

fn present_id<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Error object carried by a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(METHOD_NOT_FOUND, format!("Method not found: {}", method))
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, message)
    }
}

/// Outgoing response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl Response {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Serialize response to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Tool metadata advertised by `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Parameters of `tools/call`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    Text { text: String },
}

/// Result of `tools/call`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    pub content: Vec<Content>,
    pub is_error: bool,
}

impl CallToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content::Text { text: text.into() }],
            is_error: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_with_id() {
        let req = Request::from_json(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#)
            .expect("should deserialize");
        assert_eq!(req.id, Some(json!(1)));
        assert_eq!(req.method, "tools/list");
        assert_eq!(req.params, None);
        assert!(!req.is_notification());
    }

    #[test]
    fn test_notification_has_no_id() {
        let req = Request::from_json(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .expect("should deserialize");
        assert!(req.is_notification());
    }

    #[test]
    fn test_null_id_is_not_a_notification() {
        let req = Request::from_json(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#)
            .expect("should deserialize");
        assert_eq!(req.id, Some(Value::Null));
        assert!(!req.is_notification());
    }

    #[test]
    fn test_invalid_json_returns_error() {
        assert!(Request::from_json("not json at all").is_err());
        assert!(Request::from_json(r#"{"jsonrpc":"2.0","id":1}"#).is_err());
    }

    #[test]
    fn test_success_response_omits_error() {
        let json = Response::success(json!("a"), json!({})).to_json().unwrap();
        assert_eq!(json, r#"{"jsonrpc":"2.0","id":"a","result":{}}"#);
    }

    #[test]
    fn test_failure_response_omits_result() {
        let json = Response::failure(json!(7), RpcError::method_not_found("nope"))
            .to_json()
            .unwrap();
        assert_eq!(
            json,
            r#"{"jsonrpc":"2.0","id":7,"error":{"code":-32601,"message":"Method not found: nope"}}"#
        );
    }

    #[test]
    fn test_call_tool_result_format() {
        let value = serde_json::to_value(CallToolResult::text("hello")).unwrap();
        assert_eq!(
            value,
            json!({ "content": [{ "type": "text", "text": "hello" }], "isError": false })
        );
    }

    #[test]
    fn test_tool_definition_uses_camel_case() {
        let tool = ToolDefinition {
            name: "t".to_string(),
            description: "d".to_string(),
            input_schema: json!({ "type": "object" }),
        };
        let json = serde_json::to_string(&tool).unwrap();
        assert!(json.contains("\"inputSchema\""));
    }
}
