use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::{ErrorKind, ProtocolError};

/// Method names understood by the server
pub const LIST_TOOLS: &str = "listTools";
pub const CALL_TOOL: &str = "callTool";

// --- Request ---

/// One inbound request message.
///
/// Fields are kept loose at this level so that a request with a bad
/// `method` still yields its `id` for the error response.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Request {
    #[serde(default = "default_request_id")]
    pub id: Value, // Echoed back verbatim, 0 when absent
    #[serde(default)]
    pub method: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

fn default_request_id() -> Value {
    json!(0)
}

impl Request {
    pub fn new(id: i64, method: &str, params: Option<Value>) -> Self {
        Self {
            id: json!(id),
            method: json!(method),
            params,
        }
    }

    /// Parse a request from an already-decoded JSON value.
    ///
    /// Anything other than a JSON object is an internal fault.
    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        if !value.is_object() {
            return Err(ProtocolError::internal(format!(
                "Request must be a JSON object, got: {}",
                value
            )));
        }
        serde_json::from_value(value).map_err(|e| ProtocolError::internal(e.to_string()))
    }

    pub fn method(&self) -> Method {
        match self.method.as_str() {
            Some(LIST_TOOLS) => Method::ListTools,
            Some(CALL_TOOL) => Method::CallTool,
            Some(other) => Method::Unknown(other.to_string()),
            None => Method::Unknown(self.method.to_string()),
        }
    }
}

/// Routing target of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    ListTools,
    CallTool,
    Unknown(String),
}

/// `params` of a `callTool` request
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CallToolParams {
    #[serde(default)]
    pub name: Value,
    #[serde(default = "empty_object")]
    pub arguments: Value,
}

fn empty_object() -> Value {
    json!({})
}

impl CallToolParams {
    /// Extract `callTool` params; absent params behave like `{}`.
    pub fn from_params(params: Option<&Value>) -> Result<Self, ProtocolError> {
        match params {
            None | Some(Value::Null) => Ok(Self {
                name: Value::Null,
                arguments: empty_object(),
            }),
            Some(value @ Value::Object(_)) => serde_json::from_value(value.clone())
                .map_err(|e| ProtocolError::invalid_arguments(e.to_string())),
            Some(other) => Err(ProtocolError::invalid_arguments(format!(
                "params must be an object, got: {}",
                other
            ))),
        }
    }

    /// Tool name as text, for matching and error messages
    pub fn tool_name(&self) -> String {
        match &self.name {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

// --- Response ---

/// Error object inside an error response
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorObject {
    pub code: ErrorKind,
    pub message: String,
}

/// One outbound response message. Exactly one of `result`/`error` is set.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Response {
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

impl Response {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, err: ProtocolError) -> Self {
        Self {
            id,
            result: None,
            error: Some(ErrorObject {
                code: err.kind,
                message: err.message,
            }),
        }
    }

    /// Convenience method to extract the result or return the error.
    pub fn result(&self) -> Result<Value, ErrorObject> {
        if let Some(err) = &self.error {
            Err(err.clone())
        } else {
            Ok(self.result.clone().unwrap_or(Value::Null))
        }
    }
}

// --- Tool types ---

/// Static description of a tool, returned by `listTools`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// `listTools` result
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ListToolsResult {
    pub tools: Vec<ToolDescriptor>,
}

/// Content block in a tool result
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Content {
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
}

/// Result of a tool call.
///
/// `is_error` marks a soft failure reported as data (an upstream API
/// problem); it is omitted from the wire when false.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub content: Vec<Content>,
    #[serde(rename = "isError", default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolResult {
    pub fn text(msg: impl Into<String>) -> Self {
        Self {
            content: vec![Content {
                content_type: "text".to_string(),
                text: msg.into(),
            }],
            is_error: false,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::text(msg)
        }
    }

    /// Text of the first content block, if any
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().map(|c| c.text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_defaults_to_zero() {
        let req = Request::from_value(json!({"method": "listTools"})).unwrap();
        assert_eq!(req.id, json!(0));
        assert_eq!(req.method(), Method::ListTools);
        assert!(req.params.is_none());
    }

    #[test]
    fn test_request_rejects_non_object() {
        let err = Request::from_value(json!([1, "listTools"])).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InternalError);
    }

    #[test]
    fn test_request_unknown_and_missing_method() {
        let req = Request::from_value(json!({"id": 4, "method": "unknown"})).unwrap();
        assert_eq!(req.method(), Method::Unknown("unknown".to_string()));

        let req = Request::from_value(json!({"id": 4})).unwrap();
        assert_eq!(req.method(), Method::Unknown("null".to_string()));
    }

    #[test]
    fn test_call_tool_params_defaults() {
        let params = CallToolParams::from_params(None).unwrap();
        assert_eq!(params.tool_name(), "null");
        assert_eq!(params.arguments, json!({}));

        let raw = json!({"name": "get_demographics"});
        let params = CallToolParams::from_params(Some(&raw)).unwrap();
        assert_eq!(params.tool_name(), "get_demographics");
        assert_eq!(params.arguments, json!({}));
    }

    #[test]
    fn test_call_tool_params_rejects_non_object() {
        let raw = json!("get_demographics");
        let err = CallToolParams::from_params(Some(&raw)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArguments);
    }

    #[test]
    fn test_response_wire_shapes() {
        let ok = Response::success(json!(7), json!({"tools": []}));
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"id": 7, "result": {"tools": []}})
        );

        let err = Response::failure(json!(0), ProtocolError::invalid_arguments("Invalid JSON"));
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"id": 0, "error": {"code": "InvalidArguments", "message": "Invalid JSON"}})
        );
    }

    #[test]
    fn test_tool_result_is_error_flag_on_wire() {
        let ok = serde_json::to_value(ToolResult::text("hello")).unwrap();
        assert_eq!(ok, json!({"content": [{"type": "text", "text": "hello"}]}));

        let soft = serde_json::to_value(ToolResult::error("boom")).unwrap();
        assert_eq!(soft["isError"], json!(true));
        assert_eq!(soft["content"][0]["text"], json!("boom"));
    }
}
