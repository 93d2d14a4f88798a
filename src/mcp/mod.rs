//! MCP (Model Context Protocol) server for tool-calling clients.
//!
//! Exposes tools: compute_scores, list_presets.

use crate::aggregator::ScoreAggregator;
use crate::presets::all_presets;
use crate::request::ScoreRequest;
use crate::RawAnswers;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Write};

const INVALID_REQUEST: i32 = -32600;
const METHOD_NOT_FOUND: i32 = -32601;

/// MCP JSON-RPC request
#[derive(Debug, Deserialize, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: Option<String>,
    pub id: Option<serde_json::Value>,
    pub method: String,
    pub params: Option<serde_json::Value>,
}

/// MCP JSON-RPC response
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

/// Tool definition for MCP tools/list
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolDef {
    name: String,
    description: String,
    input_schema: InputSchema,
}

#[derive(Debug, Serialize)]
struct InputSchema {
    #[serde(rename = "type")]
    typ: &'static str,
    properties: serde_json::Value,
    required: Vec<&'static str>,
}

fn score_request_properties() -> serde_json::Value {
    let mut props = serde_json::Map::new();
    for i in 0..crate::CYCLE_LEN {
        props.insert(
            crate::question_key(i),
            serde_json::json!({ "type": "number", "description": format!("Stage {} score (0-10)", i + 1) }),
        );
    }
    for i in 0..crate::CYCLE_LEN {
        props.insert(
            crate::transition_key(i),
            serde_json::json!({ "type": "number", "description": format!("Transition {} score (0-10)", i + 1) }),
        );
    }
    props.insert(
        "penalty".to_string(),
        serde_json::json!({ "type": "boolean", "description": "Penalize stages next to blocked transitions" }),
    );
    props.insert(
        "tau".to_string(),
        serde_json::json!({ "type": "number", "minimum": 0, "maximum": 10, "description": "Blocked-transition threshold (default 4.0)" }),
    );
    props.insert(
        "delta".to_string(),
        serde_json::json!({ "type": "number", "minimum": 0, "description": "Penalty per blocked neighbour (default 0.3)" }),
    );
    serde_json::Value::Object(props)
}

/// Handle a single JSON-RPC request and return a response.
/// Extracted from `run_mcp_server` for testability.
pub fn handle_request(
    req: &JsonRpcRequest,
    aggregator: &ScoreAggregator,
    presets: &BTreeMap<String, RawAnswers>,
) -> JsonRpcResponse {
    let id = req.id.clone();
    if req.jsonrpc.as_deref().is_some_and(|v| v != "2.0") {
        return error_response(id, INVALID_REQUEST, "Unsupported jsonrpc version".to_string());
    }

    let result = match req.method.as_str() {
        "initialize" => Some(serde_json::json!({
            "protocolVersion": "0.1.0",
            "capabilities": { "tools": {} },
            "serverInfo": { "name": "enervi", "version": env!("CARGO_PKG_VERSION") }
        })),
        "tools/list" => {
            let tools = vec![
                ToolDef {
                    name: "compute_scores".to_string(),
                    description: "Score seven stages and seven transitions; returns stage and transition scores, the dominant stage and the two bottleneck transitions"
                        .to_string(),
                    input_schema: InputSchema {
                        typ: "object",
                        properties: score_request_properties(),
                        required: vec![],
                    },
                },
                ToolDef {
                    name: "list_presets".to_string(),
                    description: "List the built-in and configured answer presets".to_string(),
                    input_schema: InputSchema {
                        typ: "object",
                        properties: serde_json::json!({}),
                        required: vec![],
                    },
                },
            ];
            Some(serde_json::json!({ "tools": tools }))
        }
        "tools/call" => {
            let (name, args) = req
                .params
                .as_ref()
                .and_then(|p| p.get("params").or(Some(p)))
                .map(|p| {
                    let name = p.get("name").and_then(|n| n.as_str()).unwrap_or("");
                    let args = p
                        .get("arguments")
                        .cloned()
                        .unwrap_or_else(|| serde_json::json!({}));
                    (name, args)
                })
                .unwrap_or(("", serde_json::json!({})));

            let result = match name {
                "compute_scores" => run_compute(&args, aggregator),
                "list_presets" => Ok(run_list_presets(presets)),
                _ => Err(anyhow::anyhow!("Unknown tool: {}", name)),
            };

            match result {
                Ok(val) => Some(serde_json::json!({
                    "content": [{ "type": "text", "text": serde_json::to_string(&val).unwrap_or_else(|_| "{}".to_string()) }]
                })),
                Err(e) => Some(serde_json::json!({
                    "content": [{ "type": "text", "text": format!("Error: {}", e) }],
                    "isError": true
                })),
            }
        }
        method => {
            return error_response(id, METHOD_NOT_FOUND, format!("Method not found: {}", method))
        }
    };

    JsonRpcResponse {
        jsonrpc: "2.0",
        id,
        result,
        error: None,
    }
}

fn error_response(id: Option<serde_json::Value>, code: i32, message: String) -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: "2.0",
        id,
        result: None,
        error: Some(JsonRpcError { code, message }),
    }
}

/// Run the MCP server loop (stdin / stdout).
pub fn run_mcp_server(
    aggregator: &ScoreAggregator,
    presets: &BTreeMap<String, RawAnswers>,
) -> anyhow::Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let reader = BufReader::new(stdin.lock());

    for line in reader.lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let req: JsonRpcRequest = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => {
                log::debug!("skipping unparseable request: {}", e);
                continue;
            }
        };

        // Notifications carry no id and get no response
        if req.id.is_none() {
            log::debug!("notification: {}", req.method);
            continue;
        }

        let response = handle_request(&req, aggregator, presets);
        writeln!(stdout, "{}", serde_json::to_string(&response)?)?;
        stdout.flush()?;
    }
    Ok(())
}

fn run_compute(
    args: &serde_json::Value,
    aggregator: &ScoreAggregator,
) -> anyhow::Result<serde_json::Value> {
    let request = ScoreRequest::from_value(args)?;
    let result = aggregator.score_request(&request)?;
    Ok(serde_json::to_value(result)?)
}

fn run_list_presets(configured: &BTreeMap<String, RawAnswers>) -> serde_json::Value {
    let presets: Vec<serde_json::Value> = all_presets(configured)
        .into_iter()
        .map(|p| serde_json::json!({ "name": p.name, "answers": p.answers }))
        .collect();
    serde_json::json!({ "presets": presets })
}
