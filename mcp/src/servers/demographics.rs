use log::{debug, warn};
use serde_json::{json, Value};
use unhcr_core::{
    CallToolParams, DemographicsArguments, DemographicsSource, ListToolsResult, Method,
    ProtocolError, Request, Response, ToolDescriptor, ToolResult,
};

/// The single tool this server exposes
pub const TOOL_NAME: &str = "get_demographics";

/// Text returned when the upstream answers with zero rows
pub const NO_DATA_TEXT: &str = "No data available";

/// Routes requests to `listTools` or the demographics fetch.
///
/// Stateless between calls; the only thing it holds is the upstream source.
pub struct DemographicsServer<S> {
    source: S,
    default_limit: i64,
}

impl<S: DemographicsSource> DemographicsServer<S> {
    pub fn new(source: S, default_limit: i64) -> Self {
        Self {
            source,
            default_limit,
        }
    }

    /// Static capability descriptor
    pub fn list_tools(&self) -> ListToolsResult {
        ListToolsResult {
            tools: vec![ToolDescriptor {
                name: TOOL_NAME.to_string(),
                description: "Fetch refugee demographic statistics from UNHCR API".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "year": {"type": "integer", "description": "Year of data to fetch"},
                        "coo": {"type": "string", "description": "Country of Origin ISO3 code"},
                        "coa": {"type": "string", "description": "Country of Asylum ISO3 code"},
                        "limit": {
                            "type": "integer",
                            "description": "Max results",
                            "default": self.default_limit
                        }
                    },
                    "required": ["year"],
                    "additionalProperties": false
                }),
            }],
        }
    }

    /// Validate arguments, query the upstream and shape the rows into a tool result.
    ///
    /// Upstream failures come back as `Ok` with `is_error` set; only bad
    /// arguments and unexpected payload shapes are `Err`.
    pub async fn fetch_demographics(&self, arguments: &Value) -> Result<ToolResult, ProtocolError> {
        let args = DemographicsArguments::from_value(arguments, self.default_limit)?;

        let payload = match self.source.fetch(&args).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!("UNHCR API request failed: {}", e);
                return Ok(ToolResult::error(format!("UNHCR API error: {}", e)));
            }
        };

        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "Raw API response: {}",
                serde_json::to_string_pretty(&payload).unwrap_or_default()
            );
        }

        let rows = reshape_payload(payload).map_err(|e| {
            ProtocolError::internal(format!("Failed to fetch demographics: {}", e.message))
        })?;
        render_rows(&rows)
    }

    /// Route a parsed request and produce its result value
    pub async fn dispatch(&self, request: &Request) -> Result<Value, ProtocolError> {
        match request.method() {
            Method::ListTools => to_result_value(&self.list_tools()),
            Method::CallTool => {
                let params = CallToolParams::from_params(request.params.as_ref())?;
                let name = params.tool_name();
                if name != TOOL_NAME {
                    return Err(ProtocolError::method_not_found(format!("Unknown tool: {}", name)));
                }
                let result = self.fetch_demographics(&params.arguments).await?;
                to_result_value(&result)
            }
            Method::Unknown(method) => Err(ProtocolError::method_not_found(format!(
                "Unknown method: {}",
                method
            ))),
        }
    }

    /// Turn a request into exactly one response with the same id
    pub async fn handle_request(&self, request: Request) -> Response {
        let id = request.id.clone();
        match self.dispatch(&request).await {
            Ok(result) => Response::success(id, result),
            Err(e) => {
                debug!("Request {} failed: {}", id, e);
                Response::failure(id, e)
            }
        }
    }

    /// Parse one inbound message and handle it.
    ///
    /// Undecodable JSON answers with `InvalidArguments` and id 0.
    pub async fn handle_message(&self, text: &str) -> Response {
        let value: Value = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(e) => {
                warn!("Invalid JSON ({}): {}", e, text);
                return Response::failure(json!(0), ProtocolError::invalid_arguments("Invalid JSON"));
            }
        };

        match Request::from_value(value) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => Response::failure(json!(0), e),
        }
    }
}

/// Pull the row sequence out of an upstream payload.
///
/// Uses `data` when present, otherwise the whole payload. A single object
/// becomes a one-row sequence; anything else is rejected.
pub fn reshape_payload(payload: Value) -> Result<Vec<Value>, ProtocolError> {
    let data = match payload {
        Value::Object(mut map) => match map.remove("data") {
            Some(data) => data,
            None => Value::Object(map),
        },
        other => other,
    };

    match data {
        Value::Array(rows) => Ok(rows),
        obj @ Value::Object(_) => Ok(vec![obj]),
        _ => Err(ProtocolError::internal("Unexpected API response format")),
    }
}

fn render_rows(rows: &[Value]) -> Result<ToolResult, ProtocolError> {
    if rows.is_empty() {
        return Ok(ToolResult::text(NO_DATA_TEXT));
    }
    let text = serde_json::to_string_pretty(rows)
        .map_err(|e| ProtocolError::internal(format!("Failed to fetch demographics: {}", e)))?;
    Ok(ToolResult::text(text))
}

fn to_result_value<T: serde::Serialize>(value: &T) -> Result<Value, ProtocolError> {
    serde_json::to_value(value).map_err(|e| ProtocolError::internal(e.to_string()))
}
