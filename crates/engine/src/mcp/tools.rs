//! Tool handlers exposed over the tool transport.
//!
//! Each handler catches its own failures and folds them into the result
//! envelope, so one bad call never tears down the session.

use std::sync::Arc;

use serde_json::{json, Value};

use orrery_domain::{UniverseId, CATALOG};

use crate::mcp::protocol::{ToolCallResult, ToolDescriptor};
use crate::mcp::session::{McpSession, SessionManager};
use crate::use_cases::ProcessError;

pub const GET_UNIVERSE: &str = "get_universe";
pub const LIST_COMMANDS: &str = "list_commands";
pub const SEND_COMMAND: &str = "send_command";

pub fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: GET_UNIVERSE,
            description: "Fetch the current document of one universe",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "universe_id": { "type": "string" }
                },
                "required": ["universe_id"]
            }),
        },
        ToolDescriptor {
            name: LIST_COMMANDS,
            description: "List every command kind the reducer understands",
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
        ToolDescriptor {
            name: SEND_COMMAND,
            description: "Apply one command envelope to a universe",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "universe_id": { "type": "string" },
                    "command": { "type": "object" }
                },
                "required": ["universe_id", "command"]
            }),
        },
    ]
}

/// Dispatch one `tools/call`. Unknown tool names are a result-level
/// error, not a protocol error.
pub async fn handle_call(
    manager: &SessionManager,
    session: &Arc<McpSession>,
    name: &str,
    arguments: &Value,
) -> ToolCallResult {
    match name {
        GET_UNIVERSE => get_universe(manager, session, arguments).await,
        LIST_COMMANDS => list_commands(),
        SEND_COMMAND => send_command(manager, session, arguments).await,
        other => ToolCallResult::error(format!("unknown tool: {other}")),
    }
}

fn required_universe_id(arguments: &Value) -> Result<UniverseId, ToolCallResult> {
    arguments
        .get("universe_id")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(UniverseId::from)
        .ok_or_else(|| ToolCallResult::error("missing required argument: universe_id"))
}

async fn get_universe(
    manager: &SessionManager,
    session: &Arc<McpSession>,
    arguments: &Value,
) -> ToolCallResult {
    let universe_id = match required_universe_id(arguments) {
        Ok(id) => id,
        Err(result) => return result,
    };

    match manager.repo.get(&universe_id).await {
        Ok(Some(universe)) => {
            manager.watch(session, &universe_id);
            match serde_json::to_string(&universe) {
                Ok(text) => ToolCallResult::text(text),
                Err(e) => ToolCallResult::error(format!("serialization failed: {e}")),
            }
        }
        Ok(None) => ToolCallResult::error(format!("universe {universe_id} not found")),
        Err(e) => ToolCallResult::error(format!("storage failure: {e}")),
    }
}

fn list_commands() -> ToolCallResult {
    let listing: Vec<Value> = CATALOG
        .iter()
        .map(|spec| {
            json!({
                "type": spec.kind,
                "category": spec.category,
                "summary": spec.summary,
            })
        })
        .collect();
    match serde_json::to_string(&listing) {
        Ok(text) => ToolCallResult::text(text),
        Err(e) => ToolCallResult::error(format!("serialization failed: {e}")),
    }
}

async fn send_command(
    manager: &SessionManager,
    session: &Arc<McpSession>,
    arguments: &Value,
) -> ToolCallResult {
    let universe_id = match required_universe_id(arguments) {
        Ok(id) => id,
        Err(result) => return result,
    };
    let Some(command) = arguments.get("command").cloned() else {
        return ToolCallResult::error("missing required argument: command");
    };

    manager.watch(session, &universe_id);

    match manager.processor.process(&universe_id, command).await {
        Ok(outcome) => {
            // Domain rejections are ordinary content, never isError.
            let body = json!({ "events": outcome.events });
            ToolCallResult::text(body.to_string())
        }
        Err(ProcessError::UniverseNotFound(id)) => {
            ToolCallResult::error(format!("universe {id} not found"))
        }
        Err(ProcessError::MalformedEnvelope(e)) => ToolCallResult::error(e.to_string()),
        Err(ProcessError::Repo(e)) => ToolCallResult::error(format!("storage failure: {e}")),
    }
}
