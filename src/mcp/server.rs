/// MCP server implementation that handles JSON-RPC communication
///
/// This module implements the actual MCP server that:
/// 1. Reads JSON-RPC requests from stdin
/// 2. Routes tool calls to the habit tools with the logged-in session
/// 3. Sends JSON-RPC responses to stdout

use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use crate::domain::Session;
use crate::mcp::protocol::*;
use crate::tools::{self, ToolError};
use crate::{HabitTrackerServer, ServerError};

/// Tools that work without a session
const PUBLIC_TOOLS: [&str; 2] = ["account_register", "account_login"];

/// MCP server that handles communication with the client
pub struct McpServer {
    habit_tracker: HabitTrackerServer,
    initialized: bool,
    /// Set by account_register / account_login for the rest of the connection
    session: Option<Session>,
}

impl McpServer {
    pub fn new(habit_tracker: HabitTrackerServer) -> Self {
        Self {
            habit_tracker,
            initialized: false,
            session: None,
        }
    }

    /// The logged-in session, if any
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Run the MCP server, handling JSON-RPC over stdin/stdout
    pub async fn run(&mut self) -> Result<(), ServerError> {
        info!("Starting MCP server, waiting for JSON-RPC requests...");

        let stdin = tokio::io::stdin();
        let mut reader = BufReader::new(stdin);
        let mut stdout = tokio::io::stdout();

        let mut line = String::new();

        loop {
            line.clear();

            match reader.read_line(&mut line).await {
                Ok(0) => {
                    info!("MCP server shutting down (stdin closed)");
                    break;
                }
                Ok(_) => {
                    if let Some(response) = self.process_line(&line).await {
                        let response_str = serde_json::to_string(&response)?;

                        stdout.write_all(response_str.as_bytes()).await?;
                        stdout.write_all(b"\n").await?;
                        stdout.flush().await?;

                        debug!("Sent response: {}", response_str);
                    }
                }
                Err(e) => {
                    error!("Failed to read from stdin: {}", e);
                    break;
                }
            }
        }

        Ok(())
    }

    /// Process a single line of JSON-RPC input
    pub async fn process_line(&mut self, line: &str) -> Option<JsonRpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        debug!("Processing request: {}", line);

        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse JSON-RPC request: {}", e);
                return Some(JsonRpcResponse::error(
                    json!(null),
                    error_codes::PARSE_ERROR,
                    format!("Invalid JSON: {}", e),
                    None,
                ));
            }
        };

        self.handle_request(request).await
    }

    /// Handle a JSON-RPC request. Notifications get no response.
    pub async fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.method.starts_with("notifications/") {
            if request.method == "notifications/initialized" {
                self.initialized = true;
            }
            return None;
        }

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request),
            "initialized" => {
                self.initialized = true;
                JsonRpcResponse::success(request.id, json!(null))
            }
            "ping" => JsonRpcResponse::success(request.id, json!({})),
            "tools/list" => self.handle_tools_list(request),
            "tools/call" => self.handle_tools_call(request),
            _ => JsonRpcResponse::error(
                request.id,
                error_codes::METHOD_NOT_FOUND,
                format!("Method '{}' not found", request.method),
                None,
            ),
        };
        Some(response)
    }

    fn handle_initialize(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        let params: InitializeParams = request
            .params
            .and_then(|p| serde_json::from_value(p).ok())
            .unwrap_or_default();
        match &params.client_info {
            Some(client) => info!(
                "MCP client connected: {} {} (protocol {})",
                client.name, client.version, params.protocol_version
            ),
            None => info!("MCP client connected"),
        }

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: Implementation {
                name: "Habit Punchcard MCP".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        to_response(request.id, &result)
    }

    fn handle_tools_list(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        to_response(request.id, &json!({ "tools": tool_definitions() }))
    }

    fn handle_tools_call(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        let tool_params: ToolCallParams = match request.params {
            Some(params) => match serde_json::from_value(params) {
                Ok(p) => p,
                Err(e) => {
                    return JsonRpcResponse::error(
                        request.id,
                        error_codes::INVALID_PARAMS,
                        format!("Invalid parameters: {}", e),
                        None,
                    );
                }
            },
            None => {
                return JsonRpcResponse::error(
                    request.id,
                    error_codes::INVALID_PARAMS,
                    "Missing parameters".to_string(),
                    None,
                );
            }
        };

        let name = tool_params.name;
        let args = Value::Object(tool_params.arguments.into_iter().collect());

        match self.call_tool(&name, args) {
            Ok(Some(text)) => to_response(request.id, &ToolCallResult::success(text)),
            Ok(None) => to_response(
                request.id,
                &ToolCallResult::error(format!("Unknown tool: {}", name)),
            ),
            Err(e) => {
                warn!("Tool {} failed: {}", name, e);
                JsonRpcResponse::tool_error(request.id, &name, &e)
            }
        }
    }

    /// Run one tool. `Ok(None)` means no tool has that name.
    fn call_tool(&mut self, name: &str, args: Value) -> Result<Option<String>, ToolError> {
        if !self.initialized {
            debug!("Tool call before initialization: {}", name);
        }

        let session = match self.session.clone() {
            Some(s) => s,
            None if PUBLIC_TOOLS.contains(&name) => {
                return self.call_account_tool(name, args).map(Some);
            }
            None => {
                if tool_definitions().iter().any(|d| d.name == name) {
                    return Err(ToolError::NotLoggedIn);
                }
                return Ok(None);
            }
        };

        let storage = self.habit_tracker.storage();
        let analytics = self.habit_tracker.analytics();
        let (today, now) = request_clock();

        let text = match name {
            "account_register" | "account_login" => self.call_account_tool(name, args)?,

            "category_list" => {
                let r = tools::list_categories(storage, &session)?;
                render(&r, &r.message)
            }
            "category_create" => {
                let r = tools::create_category(storage, &session, parse_args(args)?)?;
                render(&r, &r.message)
            }
            "category_update" => {
                let r = tools::update_category(storage, &session, parse_args(args)?)?;
                render(&r, &r.message)
            }
            "category_delete" => {
                let r = tools::delete_category(storage, &session, parse_args(args)?)?;
                render(&r, &r.message)
            }

            "habit_create" => {
                let r = tools::create_habit(storage, &session, parse_args(args)?)?;
                format!("{}\nHabit ID: {}", r.message, r.habit_id)
            }
            "habit_update" => {
                let r = tools::update_habit(storage, &session, parse_args(args)?)?;
                render(&r, &r.message)
            }
            "habit_archive" => {
                let r = tools::archive_habit(storage, &session, parse_args(args)?)?;
                r.message
            }
            "habit_status" => {
                let r = tools::get_habit_status(storage, analytics, &session, today, parse_args(args)?)?;
                render(&r, &r.message)
            }
            "habit_today" => {
                let r = tools::get_todays_habits(storage, analytics, &session, today)?;
                render(&r, &r.message)
            }
            "habit_toggle" => {
                let r = tools::toggle_habit(storage, &session, today, parse_args(args)?)?;
                render(&r, &r.message)
            }
            "habit_week" => {
                let r = tools::get_week(storage, analytics, &session, today, parse_args(args)?)?;
                render(&r, &r.message)
            }

            "punchcard_progress" => {
                let r = tools::get_punchcard_progress(storage, &session, now, parse_args(args)?)?;
                render(&r, &r.message)
            }
            "punchcard_claim" => {
                let r = tools::claim_punchcard(
                    storage,
                    &session,
                    now,
                    parse_args(args)?,
                    &mut rand::rng(),
                )?;
                render(&r, &r.message)
            }

            "reward_create" => {
                let r = tools::create_reward(storage, &session, parse_args(args)?)?;
                render(&r, &r.message)
            }
            "reward_list" => {
                let r = tools::list_rewards(storage, &session, parse_args(args)?)?;
                render(&r, &r.message)
            }
            "reward_update" => {
                let r = tools::update_reward(storage, &session, parse_args(args)?)?;
                render(&r, &r.message)
            }
            "reward_delete" => {
                let r = tools::delete_reward(storage, &session, parse_args(args)?)?;
                r.message
            }

            _ => return Ok(None),
        };

        Ok(Some(text))
    }

    /// Register or log in, replacing the connection's session
    fn call_account_tool(&mut self, name: &str, args: Value) -> Result<String, ToolError> {
        let storage = self.habit_tracker.storage();
        let response = if name == "account_register" {
            tools::register_user(storage, parse_args(args)?)?
        } else {
            tools::login_user(storage, parse_args(args)?)?
        };

        info!("Session started for user {}", response.session.user_id);
        self.session = Some(response.session.clone());
        Ok(render(&response, &response.message))
    }
}

/// Every tool this server offers
fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new::<tools::RegisterParams>(
            "account_register",
            "Create an account with a name and a 4-8 digit PIN, then log in",
        ),
        ToolDefinition::new::<tools::LoginParams>("account_login", "Log in with your PIN"),
        ToolDefinition::without_params("category_list", "List your habit categories"),
        ToolDefinition::new::<tools::CreateCategoryParams>("category_create", "Create a category"),
        ToolDefinition::new::<tools::UpdateCategoryParams>(
            "category_update",
            "Rename or restyle a category",
        ),
        ToolDefinition::new::<tools::CategoryIdParams>(
            "category_delete",
            "Delete a category; its habits become uncategorised",
        ),
        ToolDefinition::new::<tools::CreateHabitParams>(
            "habit_create",
            "Create a habit with a schedule (daily, times_per_week, times_per_month or monthly_on_weeks) and an optional punchcard",
        ),
        ToolDefinition::new::<tools::UpdateHabitParams>(
            "habit_update",
            "Change a habit's details, schedule or punchcard",
        ),
        ToolDefinition::new::<tools::HabitIdParams>(
            "habit_archive",
            "Archive a habit, keeping its history",
        ),
        ToolDefinition::new::<tools::StatusParams>(
            "habit_status",
            "Check habit status, quota progress and streaks",
        ),
        ToolDefinition::without_params(
            "habit_today",
            "List the habits due today that are still visible",
        ),
        ToolDefinition::new::<tools::ToggleHabitParams>(
            "habit_toggle",
            "Mark a habit done or not done for today or a past date",
        ),
        ToolDefinition::new::<tools::WeekParams>(
            "habit_week",
            "Show the Monday-start week grid with punchcard stats",
        ),
        ToolDefinition::new::<tools::PunchcardProgressParams>(
            "punchcard_progress",
            "Show punchcards and what was punched since you last looked",
        ),
        ToolDefinition::new::<tools::ClaimPunchcardParams>(
            "punchcard_claim",
            "Claim the reward for a full punchcard and start a fresh one",
        ),
        ToolDefinition::new::<tools::CreateRewardParams>(
            "reward_create",
            "Add a reward to the baby or baller bag",
        ),
        ToolDefinition::new::<tools::ListRewardsParams>("reward_list", "List your rewards by bag"),
        ToolDefinition::new::<tools::UpdateRewardParams>("reward_update", "Edit a reward"),
        ToolDefinition::new::<tools::RewardIdParams>("reward_delete", "Delete a reward"),
    ]
}

/// Local date and time for one request, read from a single clock sample
fn request_clock() -> (NaiveDate, NaiveDateTime) {
    let now = Local::now().naive_local();
    (now.date(), now)
}

fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(|e| ToolError::InvalidParams(e.to_string()))
}

/// Human-readable message followed by the full structured response
fn render<T: Serialize>(response: &T, message: &str) -> String {
    match serde_json::to_string_pretty(response) {
        Ok(data) => format!("{}\n\n{}", message, data),
        Err(_) => message.to_string(),
    }
}

fn to_response<T: Serialize>(id: Value, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(
            id,
            error_codes::INTERNAL_ERROR,
            format!("Failed to serialize response: {}", e),
            None,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{HabitStorage, SqliteStorage};
    use crate::AnalyticsEngine;

    fn server() -> McpServer {
        let storage = SqliteStorage::open_in_memory().unwrap();
        McpServer::new(HabitTrackerServer::from_parts(storage, AnalyticsEngine::new()))
    }

    fn request(id: u64, method: &str, params: Value) -> JsonRpcRequest {
        serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        }))
        .unwrap()
    }

    fn call(id: u64, tool: &str, arguments: Value) -> JsonRpcRequest {
        request(id, "tools/call", json!({ "name": tool, "arguments": arguments }))
    }

    fn response_json(response: Option<JsonRpcResponse>) -> Value {
        serde_json::to_value(response.unwrap()).unwrap()
    }

    #[test]
    fn test_request_clock_date_matches_time() {
        let (today, now) = request_clock();
        assert_eq!(today, now.date());
    }

    #[tokio::test]
    async fn test_initialize_and_list_tools() {
        let mut server = server();
        let init = response_json(
            server
                .handle_request(request(1, "initialize", json!({"protocolVersion": MCP_VERSION})))
                .await,
        );
        assert_eq!(init["result"]["protocolVersion"], MCP_VERSION);

        let tools = response_json(server.handle_request(request(2, "tools/list", json!({}))).await);
        let names: Vec<&str> = tools["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|t| t["name"].as_str())
            .collect();
        assert_eq!(names.len(), 19);
        assert!(names.contains(&"habit_toggle"));
        assert!(names.contains(&"punchcard_claim"));
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let mut server = server();
        let notification: JsonRpcRequest = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized"
        }))
        .unwrap();
        assert!(server.handle_request(notification).await.is_none());
    }

    #[tokio::test]
    async fn test_tools_need_a_session() {
        let mut server = server();
        let denied = response_json(server.handle_request(call(1, "habit_today", json!({}))).await);
        assert_eq!(denied["error"]["code"], error_codes::NOT_LOGGED_IN);

        let registered = response_json(
            server
                .handle_request(call(2, "account_register", json!({"name": "Sam", "pin": "4821"})))
                .await,
        );
        assert_eq!(registered["result"]["isError"], false);
        assert_eq!(server.session().map(|s| s.user_name.as_str()), Some("Sam"));

        let today = response_json(server.handle_request(call(3, "habit_today", json!({}))).await);
        assert!(today["result"]["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("Nothing left"));
    }

    #[tokio::test]
    async fn test_bad_arguments_and_unknown_tools() {
        let mut server = server();
        server
            .handle_request(call(1, "account_register", json!({"name": "Sam", "pin": "4821"})))
            .await;

        let bad = response_json(server.handle_request(call(2, "habit_toggle", json!({}))).await);
        assert_eq!(bad["error"]["code"], error_codes::INVALID_PARAMS);

        let missing = response_json(
            server
                .handle_request(call(
                    3,
                    "habit_toggle",
                    json!({"habit_id": "0b8c2a52-8a4e-4a57-9d4a-5f0f6f3a9c11"}),
                ))
                .await,
        );
        assert_eq!(missing["error"]["code"], error_codes::NOT_FOUND);

        let unknown = response_json(server.handle_request(call(4, "habit_teleport", json!({}))).await);
        assert_eq!(unknown["result"]["isError"], true);
    }

    #[tokio::test]
    async fn test_create_and_toggle_through_protocol() {
        let mut server = server();
        server
            .handle_request(call(1, "account_register", json!({"name": "Sam", "pin": "4821"})))
            .await;

        server
            .handle_request(call(
                2,
                "habit_create",
                json!({"name": "Stretch", "punchcard_enabled": true, "punchcard_target": 2}),
            ))
            .await;
        let session = server.session().cloned().unwrap();
        let habits = server
            .habit_tracker
            .storage()
            .list_habits(&session.user_id, true)
            .unwrap();
        assert_eq!(habits.len(), 1);
        let habit_id = habits[0].habit.id.to_string();

        let toggled = response_json(
            server
                .handle_request(call(3, "habit_toggle", json!({ "habit_id": habit_id })))
                .await,
        );
        let text = toggled["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("Punchcard: 1/2"));
    }
}
