//! MCP tool surface.
//!
//! Exposes the three externally-callable operations over the MCP JSON-RPC
//! protocol so chat agents can invoke them:
//!
//! * `network_query` — the full orchestration pipeline
//! * `list_network_devices` — direct listing with health scoring
//! * `get_device_details` — single-device lookup with health
//!
//! Every tool is total over malformed input: failures come back as
//! structured error text on the tool-result channel, never a protocol
//! error or a panic.

use std::borrow::Cow;
use std::sync::Arc;

use rmcp::model::*;
use rmcp::{ErrorData as McpError, ServerHandler};
use serde_json::json;

use crate::format;
use crate::orchestrator::{Orchestrator, QueryFlags};

/// Bridges the orchestrator to the MCP protocol. Each session shares the
/// same orchestrator behind `Arc`.
#[derive(Clone)]
pub struct NetragServer {
    orchestrator: Arc<Orchestrator>,
}

impl NetragServer {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }

    fn tools() -> Vec<Tool> {
        vec![
            tool(
                "network_query",
                "Answer a natural-language question about the network fleet using \
                 retrieval-augmented analysis over documentation and live device data.",
                json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "The question, e.g. \"Show me FTTH OLTs in HOBO region\""
                        },
                        "include_recommendations": {
                            "type": "boolean",
                            "description": "Append knowledge-based recommendations",
                            "default": true
                        }
                    },
                    "required": ["query"]
                }),
            ),
            tool(
                "list_network_devices",
                "List network devices with health summaries, filtered by type, region, \
                 and environment.",
                json!({
                    "type": "object",
                    "properties": {
                        "device_type": {
                            "type": "string",
                            "description": "olt, modem, lag, team, pxc, or all",
                            "default": "all"
                        },
                        "region": {"type": "string", "description": "HOBO, GENT, ROES, or ASSE"},
                        "environment": {"type": "string", "description": "PRODUCTION, UAT, or TEST"},
                        "filter": {"type": "string", "description": "Device name prefix"},
                        "limit": {"type": "integer", "default": 50}
                    }
                }),
            ),
            tool(
                "get_device_details",
                "Fetch one device's configuration and health report by name.",
                json!({
                    "type": "object",
                    "properties": {
                        "device_name": {
                            "type": "string",
                            "description": "Device name, e.g. OLT17PROP01"
                        },
                        "device_type": {
                            "type": "string",
                            "description": "olt, modem, lag, team, or pxc",
                            "default": "olt"
                        }
                    },
                    "required": ["device_name"]
                }),
            ),
        ]
    }

    async fn dispatch(&self, name: &str, args: &serde_json::Value) -> Option<String> {
        match name {
            "network_query" => {
                let query = str_arg(args, "query").unwrap_or_default();
                let flags = QueryFlags {
                    include_recommendations: args
                        .get("include_recommendations")
                        .and_then(|v| v.as_bool())
                        .unwrap_or(true),
                    limit: None,
                };
                Some(match self.orchestrator.execute(&query, flags).await {
                    Ok(text) => text,
                    Err(e) => format::error_response(&e),
                })
            }
            "list_network_devices" => {
                let device_type = str_arg(args, "device_type").unwrap_or_else(|| "all".to_string());
                let limit = args
                    .get("limit")
                    .and_then(|v| v.as_u64())
                    .map(|v| v as usize)
                    .unwrap_or(50);
                let result = self
                    .orchestrator
                    .list_devices(
                        &device_type,
                        str_arg(args, "region").as_deref(),
                        str_arg(args, "environment").as_deref(),
                        str_arg(args, "filter").as_deref(),
                        limit,
                    )
                    .await;
                Some(match result {
                    Ok(text) => text,
                    Err(e) => format::error_response(&e),
                })
            }
            "get_device_details" => {
                let device_name = str_arg(args, "device_name").unwrap_or_default();
                let device_type = str_arg(args, "device_type").unwrap_or_else(|| "olt".to_string());
                let result = self
                    .orchestrator
                    .device_details(&device_name, &device_type)
                    .await;
                Some(match result {
                    Ok(text) => text,
                    Err(e) => format::error_response(&e),
                })
            }
            _ => None,
        }
    }
}

fn tool(name: &str, description: &str, schema: serde_json::Value) -> Tool {
    let input_schema: Arc<serde_json::Map<String, serde_json::Value>> = match schema {
        serde_json::Value::Object(map) => Arc::new(map),
        _ => Arc::new(serde_json::Map::new()),
    };
    Tool {
        name: Cow::Owned(name.to_string()),
        title: None,
        description: Some(Cow::Owned(description.to_string())),
        input_schema,
        output_schema: None,
        annotations: Some(ToolAnnotations::new().read_only(true)),
        icons: None,
    }
}

fn str_arg(args: &serde_json::Value, key: &str) -> Option<String> {
    args.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

impl ServerHandler for NetragServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "netrag".to_string(),
                title: Some("Network RAG".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "netrag answers questions about the network fleet. Use network_query for \
                 natural-language questions, list_network_devices for inventory listings, \
                 and get_device_details for a single device."
                    .to_string(),
            ),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult::with_all_items(Self::tools())))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let args = request
            .arguments
            .map(serde_json::Value::Object)
            .unwrap_or(serde_json::Value::Object(serde_json::Map::new()));

        match self.dispatch(&request.name, &args).await {
            Some(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            None => Err(McpError::new(
                ErrorCode::METHOD_NOT_FOUND,
                format!("no tool registered with name: {}", request.name),
                None,
            )),
        }
    }
}
