//! MCP server implementation for Scryfall card data.
//!
//! This module implements the MCP server lifecycle:
//!
//! 1. **Initialisation**: Capability negotiation and version agreement
//! 2. **Operation**: Handling tool calls and resource reads
//! 3. **Shutdown**: Graceful connection termination
//!
//! # Architecture
//!
//! The server binds two logical operations to the protocol: `search`
//! (Scryfall query → result summaries) and `fetch` (card UUID → full
//! record). Inputs are validated before the rate-limited API client is
//! invoked; upstream failures come back as tool error results, never as
//! protocol-level faults. App-capable hosts can read the card viewer
//! document through the resources surface.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::mcp::protocol::{
    ErrorCode, IncomingMessage, JsonRpcError, JsonRpcErrorData, JsonRpcNotification,
    JsonRpcRequest, JsonRpcResponse, RequestId, ToolAnnotations, ToolCallParams, ToolCallResult,
    ToolDefinition, MCP_PROTOCOL_VERSION, SERVER_INSTRUCTIONS, SERVER_NAME,
};
use crate::mcp::transport::StdioTransport;
use crate::render::format_card_text;
use crate::scryfall::{ApiFailure, Card, ScryfallClient};

/// URI of the rendered-card viewer resource.
pub const CARD_VIEWER_URI: &str = "ui://scryfall/card-viewer.html";

/// MIME type marking the viewer as an MCP app surface.
pub const CARD_VIEWER_MIME_TYPE: &str = "text/html;profile=mcp-app";

/// Hosts the viewer is allowed to load images from.
pub const VIEWER_RESOURCE_DOMAINS: [&str; 2] =
    ["https://cards.scryfall.io", "https://svgs.scryfall.io"];

/// The viewer document, bundled at compile time.
const CARD_VIEWER_HTML: &str = include_str!("../../assets/card-viewer.html");

/// Server state in the MCP lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Waiting for initialize request.
    AwaitingInit,
    /// Initialize received, waiting for initialized notification.
    Initialising,
    /// Ready for normal operation.
    Running,
    /// Shutdown in progress.
    ShuttingDown,
}

/// Server capabilities advertised during initialisation.
#[derive(Debug, Clone, Serialize)]
pub struct ServerCapabilities {
    /// Tool-related capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Value>,
    /// Resource-related capabilities (the card viewer document).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Value>,
}

impl Default for ServerCapabilities {
    fn default() -> Self {
        Self {
            tools: Some(json!({})),
            resources: Some(json!({})),
        }
    }
}

/// Server information for initialisation response.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Client information received during initialisation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    /// Client name.
    pub name: String,
    /// Client version.
    #[serde(default)]
    pub version: Option<String>,
}

/// Parameters for the initialize request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Protocol version requested by client.
    pub protocol_version: String,
    /// Client capabilities.
    #[serde(default)]
    pub capabilities: Value,
    /// Client information.
    #[serde(default)]
    pub client_info: Option<ClientInfo>,
}

/// Parameters for resources/read request.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceReadParams {
    /// URI of the resource to read.
    pub uri: String,
}

/// The MCP server exposing Scryfall card data.
pub struct McpServer {
    /// Current server state.
    state: ServerState,
    /// The transport layer.
    transport: StdioTransport,
    /// Negotiated protocol version (set after initialisation).
    protocol_version: Option<String>,
    /// Rate-limited Scryfall API client.
    client: ScryfallClient,
}

impl McpServer {
    /// Creates a new MCP server around the given API client.
    #[must_use]
    pub fn new(client: ScryfallClient) -> Self {
        Self {
            state: ServerState::AwaitingInit,
            transport: StdioTransport::new(),
            protocol_version: None,
            client,
        }
    }

    /// Returns the current server state.
    #[must_use]
    pub const fn state(&self) -> ServerState {
        self.state
    }

    /// Runs the MCP server main loop with graceful shutdown handling.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    pub async fn run(&mut self) -> std::io::Result<()> {
        self.run_with_shutdown().await
    }

    /// Runs the main loop and handles shutdown.
    #[cfg(unix)]
    async fn run_with_shutdown(&mut self) -> std::io::Result<()> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt()).map_err(std::io::Error::other)?;
        let mut sigterm = signal(SignalKind::terminate()).map_err(std::io::Error::other)?;

        loop {
            tokio::select! {
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT, initiating graceful shutdown");
                    self.state = ServerState::ShuttingDown;
                    return Ok(());
                }

                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, initiating graceful shutdown");
                    self.state = ServerState::ShuttingDown;
                    return Ok(());
                }

                line_result = self.transport.read_line() => {
                    if self.handle_transport_result(line_result).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Runs the main loop and handles shutdown.
    #[cfg(windows)]
    async fn run_with_shutdown(&mut self) -> std::io::Result<()> {
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = &mut ctrl_c => {
                    tracing::info!("Received Ctrl+C, initiating graceful shutdown");
                    self.state = ServerState::ShuttingDown;
                    return Ok(());
                }

                line_result = self.transport.read_line() => {
                    if self.handle_transport_result(line_result).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Handles the result from transport read.
    ///
    /// Returns `true` if the server should shut down.
    async fn handle_transport_result(
        &mut self,
        line_result: std::io::Result<Option<String>>,
    ) -> std::io::Result<bool> {
        let Some(line) = line_result? else {
            self.state = ServerState::ShuttingDown;
            return Ok(true);
        };

        if line.trim().is_empty() {
            return Ok(false);
        }

        self.handle_line(&line).await?;

        if self.state == ServerState::ShuttingDown {
            return Ok(true);
        }

        Ok(false)
    }

    /// Handles a single line of input.
    async fn handle_line(&mut self, line: &str) -> std::io::Result<()> {
        use crate::mcp::protocol::parse_message;

        match parse_message(line) {
            Ok(msg) => self.handle_message(msg).await,
            Err(error) => {
                self.transport.write_error(&error).await?;
                Ok(())
            }
        }
    }

    /// Handles a parsed incoming message.
    async fn handle_message(&mut self, msg: IncomingMessage) -> std::io::Result<()> {
        match msg {
            IncomingMessage::Request(req) => self.handle_request(req).await,
            IncomingMessage::Notification(ref notif) => {
                self.handle_notification(notif);
                Ok(())
            }
        }
    }

    /// Handles an incoming request.
    async fn handle_request(&mut self, req: JsonRpcRequest) -> std::io::Result<()> {
        let response = match req.method.as_str() {
            "initialize" => self.handle_initialize(&req),
            "tools/list" => self.handle_tools_list(&req),
            "tools/call" => self.handle_tools_call(&req).await,
            "resources/list" => self.handle_resources_list(&req),
            "resources/read" => self.handle_resources_read(&req),
            "ping" => Ok(Self::handle_ping(&req)),
            _ => Err(JsonRpcError::method_not_found(req.id.clone(), &req.method)),
        };

        match response {
            Ok(resp) => self.transport.write_response(&resp).await,
            Err(error) => self.transport.write_error(&error).await,
        }
    }

    /// Handles an incoming notification.
    fn handle_notification(&mut self, notif: &JsonRpcNotification) {
        if notif.method == "notifications/initialized" && self.state == ServerState::Initialising {
            self.state = ServerState::Running;
        }
    }

    /// Handles the initialize request.
    fn handle_initialize(&mut self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        if self.state != ServerState::AwaitingInit {
            return Err(JsonRpcError::new(
                Some(req.id.clone()),
                JsonRpcErrorData::with_message(
                    ErrorCode::InvalidRequest,
                    "Server already initialised",
                ),
            ));
        }

        let _params: InitializeParams = req
            .params
            .as_ref()
            .map(|p| serde_json::from_value(p.clone()))
            .transpose()
            .map_err(|e| {
                JsonRpcError::invalid_params(
                    req.id.clone(),
                    format!("Invalid initialize params: {e}"),
                )
            })?
            .ok_or_else(|| {
                JsonRpcError::invalid_params(req.id.clone(), "Missing initialize params")
            })?;

        let negotiated_version = MCP_PROTOCOL_VERSION.to_string();

        self.protocol_version = Some(negotiated_version.clone());
        self.state = ServerState::Initialising;

        let result = json!({
            "protocolVersion": negotiated_version,
            "capabilities": ServerCapabilities::default(),
            "serverInfo": ServerInfo::default(),
            "instructions": SERVER_INSTRUCTIONS,
        });

        Ok(JsonRpcResponse::success(req.id.clone(), result))
    }

    /// Handles the tools/list request.
    fn handle_tools_list(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        self.require_running(&req.id)?;

        let result = json!({
            "tools": Self::get_tool_definitions(),
        });

        Ok(JsonRpcResponse::success(req.id.clone(), result))
    }

    /// Handles the tools/call request.
    async fn handle_tools_call(
        &self,
        req: &JsonRpcRequest,
    ) -> Result<JsonRpcResponse, JsonRpcError> {
        self.require_running(&req.id)?;

        let params: ToolCallParams = req
            .params
            .as_ref()
            .map(|p| serde_json::from_value(p.clone()))
            .transpose()
            .map_err(|e| {
                JsonRpcError::invalid_params(
                    req.id.clone(),
                    format!("Invalid tool call params: {e}"),
                )
            })?
            .ok_or_else(|| {
                JsonRpcError::invalid_params(req.id.clone(), "Missing tool call params")
            })?;

        let result = match params.name.as_str() {
            "search" => self.call_search(&params.arguments).await,
            "fetch" => self.call_fetch(&params.arguments).await,
            _ => ToolCallResult::error(format!("Unknown tool: {}", params.name)),
        };

        let result_value = serde_json::to_value(&result).map_err(|e| {
            tracing::error!(error = %e, "Failed to serialise tool call result");
            JsonRpcError::internal_error(
                req.id.clone(),
                "Internal error: failed to serialise result",
            )
        })?;

        Ok(JsonRpcResponse::success(req.id.clone(), result_value))
    }

    /// Handles the resources/list request.
    fn handle_resources_list(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        self.require_running(&req.id)?;

        let result = json!({
            "resources": [
                {
                    "uri": CARD_VIEWER_URI,
                    "name": "card-viewer",
                    "description": "Rendered Magic card viewer for app-capable hosts",
                    "mimeType": CARD_VIEWER_MIME_TYPE,
                }
            ],
        });

        Ok(JsonRpcResponse::success(req.id.clone(), result))
    }

    /// Handles the resources/read request.
    fn handle_resources_read(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        self.require_running(&req.id)?;

        let params: ResourceReadParams = req
            .params
            .as_ref()
            .map(|p| serde_json::from_value(p.clone()))
            .transpose()
            .map_err(|e| {
                JsonRpcError::invalid_params(
                    req.id.clone(),
                    format!("Invalid resource read params: {e}"),
                )
            })?
            .ok_or_else(|| {
                JsonRpcError::invalid_params(req.id.clone(), "Missing resource read params")
            })?;

        if params.uri != CARD_VIEWER_URI {
            // -32002 is the MCP "resource not found" code
            return Err(JsonRpcError::new(
                Some(req.id.clone()),
                JsonRpcErrorData::with_message(
                    ErrorCode::ServerError(-32002),
                    format!("Resource not found: {}", params.uri),
                ),
            ));
        }

        let result = json!({
            "contents": [
                {
                    "uri": CARD_VIEWER_URI,
                    "mimeType": CARD_VIEWER_MIME_TYPE,
                    "text": CARD_VIEWER_HTML,
                    "_meta": {
                        "ui": {
                            "csp": {
                                "resourceDomains": VIEWER_RESOURCE_DOMAINS,
                            }
                        }
                    }
                }
            ],
        });

        Ok(JsonRpcResponse::success(req.id.clone(), result))
    }

    /// Handles the ping request.
    fn handle_ping(req: &JsonRpcRequest) -> JsonRpcResponse {
        JsonRpcResponse::success(req.id.clone(), json!({}))
    }

    /// Ensures the server is in the Running state.
    fn require_running(&self, id: &RequestId) -> Result<(), JsonRpcError> {
        if self.state != ServerState::Running {
            return Err(JsonRpcError::new(
                Some(id.clone()),
                JsonRpcErrorData::with_message(ErrorCode::InvalidRequest, "Server not initialised"),
            ));
        }
        Ok(())
    }

    /// Returns the list of available tools.
    fn get_tool_definitions() -> Vec<ToolDefinition> {
        vec![
            ToolDefinition {
                name: "search".to_string(),
                title: Some("Search Cards".to_string()),
                description: Some(
                    "Search for Magic: The Gathering cards using Scryfall full-text query \
                     syntax. Returns a list of matching cards with their Scryfall IDs, names, \
                     and URLs. Use Scryfall search syntax: color (c:), type (t:), CMC (cmc=), \
                     set (set:), oracle text (o:\"...\"), power/toughness (pow=, tou=), \
                     rarity (r:), etc."
                        .to_string(),
                ),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "minLength": 1,
                            "description": "Scryfall full-text search query. Supports Scryfall \
                                syntax (e.g., \"c:red t:creature cmc=3\", \"set:mkm\", \
                                \"o:\\\"draw a card\\\"\")"
                        }
                    },
                    "required": ["query"]
                }),
                annotations: ToolAnnotations::read_only(),
            },
            ToolDefinition {
                name: "fetch".to_string(),
                title: Some("Fetch Card".to_string()),
                description: Some(
                    "Fetch detailed information for a single Magic: The Gathering card by its \
                     Scryfall UUID. Returns the card's full oracle text, type line, mana cost, \
                     colors, set info, rarity, prices, and image URIs. Handles double-faced \
                     cards (e.g., transform, modal DFC)."
                        .to_string(),
                ),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "id": {
                            "type": "string",
                            "format": "uuid",
                            "description": "Scryfall card UUID (obtained from the search tool results)"
                        }
                    },
                    "required": ["id"]
                }),
                annotations: ToolAnnotations::read_only(),
            },
        ]
    }

    // ==================== Tool Handlers ====================

    /// Shapes an upstream failure as a tool error result.
    fn failure_result(failure: &ApiFailure) -> ToolCallResult {
        ToolCallResult::error(
            json!({
                "error": true,
                "status": failure.status,
                "body": failure.body,
            })
            .to_string(),
        )
    }

    /// Searches Scryfall and returns `{id, title, url}` summaries.
    async fn call_search(&self, arguments: &Value) -> ToolCallResult {
        let Some(query) = arguments.get("query").and_then(Value::as_str) else {
            return ToolCallResult::error("Missing required parameter: query");
        };

        // Fail fast; an empty query never reaches the rate-limited client
        if query.is_empty() {
            return ToolCallResult::error("Parameter 'query' cannot be empty");
        }

        match self.client.search(query).await {
            Ok(response) => {
                let results: Vec<Value> = response
                    .data
                    .iter()
                    .map(|card| {
                        json!({
                            "id": card.id,
                            "title": card.name,
                            "url": card.web_url(),
                        })
                    })
                    .collect();

                tracing::debug!(
                    total_cards = response.total_cards,
                    has_more = response.has_more,
                    "search completed"
                );

                ToolCallResult::text(json!({ "results": results }).to_string())
            }
            Err(failure) => Self::failure_result(&failure),
        }
    }

    /// Fetches one card and returns the rendered document plus its
    /// structured twin.
    async fn call_fetch(&self, arguments: &Value) -> ToolCallResult {
        let Some(id) = arguments.get("id").and_then(Value::as_str) else {
            return ToolCallResult::error("Missing required parameter: id");
        };

        // Reject malformed ids before spending a rate-limited API call
        if Uuid::parse_str(id).is_err() {
            return ToolCallResult::error(format!(
                "Parameter 'id' must be a UUID, got '{id}'"
            ));
        }

        match self.client.fetch_by_id(id).await {
            Ok(card) => Self::card_result(&card),
            Err(failure) => Self::failure_result(&failure),
        }
    }

    /// Builds the fetch tool result for a retrieved card.
    fn card_result(card: &Card) -> ToolCallResult {
        let document = json!({
            "id": card.id,
            "title": card.name,
            "text": format_card_text(card),
            "url": card.web_url(),
            "metadata": {
                "type_line": card.type_line,
                "mana_cost": card.mana_cost,
                "colors": card.colors,
                "set": card.set,
                "set_name": card.set_name,
                "rarity": card.rarity,
                "released_at": card.released_at,
                "prices": card.prices,
                "image_uris": card.primary_image_uris(),
                "uri": card.uri,
            },
        });

        match serde_json::to_value(card) {
            Ok(structured) => {
                ToolCallResult::text_with_structured(document.to_string(), structured)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialise card");
                ToolCallResult::error("Internal error: failed to serialise card")
            }
        }
    }
}
