//! Streamable-HTTP endpoint for the tool transport.
//!
//! One route, three verbs: POST carries JSON-RPC requests, GET opens the
//! session's SSE notification stream, DELETE terminates the session.
//! The session id travels in the `Mcp-Session-Id` header.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::sse::{Event as SseEvent, KeepAlive, Sse},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use futures_util::stream;
use serde_json::{json, Value};

use crate::app::App;
use crate::mcp::protocol::{
    InitializeResult, JsonRpcRequest, JsonRpcResponse, INVALID_PARAMS, METHOD_NOT_FOUND,
    PARSE_ERROR,
};
use crate::mcp::session::McpSession;
use crate::mcp::tools;

pub const SESSION_HEADER: &str = "mcp-session-id";

pub fn routes() -> Router<Arc<App>> {
    Router::new().route("/mcp", post(post_mcp).get(get_mcp).delete(delete_mcp))
}

fn header_session_id(headers: &HeaderMap) -> Option<&str> {
    headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok())
}

async fn post_mcp(State(app): State<Arc<App>>, headers: HeaderMap, body: String) -> Response {
    let request: JsonRpcRequest = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(e) => {
            return Json(JsonRpcResponse::error(
                Value::Null,
                PARSE_ERROR,
                format!("parse error: {e}"),
            ))
            .into_response();
        }
    };

    // Resolve the session. An `initialize` request may arrive with no
    // session id, or with a stale one; both mint a fresh session. Other
    // methods require a live id. Notifications never mint: they get no
    // response, so a minted id could never reach the client.
    let provided = header_session_id(&headers);
    let (session, minted) = match provided.and_then(|id| app.sessions.get(id)) {
        Some(session) => (session, false),
        None if request.method == "initialize" && !request.is_notification() => {
            (app.sessions.create(), true)
        }
        None if provided.is_some() => {
            return (StatusCode::NOT_FOUND, "unknown session").into_response();
        }
        None => {
            return (StatusCode::BAD_REQUEST, "missing mcp-session-id header").into_response();
        }
    };

    if request.is_notification() {
        return StatusCode::ACCEPTED.into_response();
    }

    let response = dispatch(&app, &session, request).await;
    if minted {
        (
            [(SESSION_HEADER, session.id.clone())],
            Json(response),
        )
            .into_response()
    } else {
        Json(response).into_response()
    }
}

async fn dispatch(app: &App, session: &Arc<McpSession>, request: JsonRpcRequest) -> JsonRpcResponse {
    let id = request.id.clone().unwrap_or(Value::Null);
    match request.method.as_str() {
        "initialize" => match serde_json::to_value(InitializeResult::current()) {
            Ok(result) => JsonRpcResponse::result(id, result),
            Err(e) => JsonRpcResponse::error(id, PARSE_ERROR, e.to_string()),
        },
        "ping" => JsonRpcResponse::result(id, json!({})),
        "tools/list" => match serde_json::to_value(tools::descriptors()) {
            Ok(listing) => JsonRpcResponse::result(id, json!({ "tools": listing })),
            Err(e) => JsonRpcResponse::error(id, PARSE_ERROR, e.to_string()),
        },
        "tools/call" => {
            let params = request.params.unwrap_or(Value::Null);
            let Some(name) = params.get("name").and_then(Value::as_str) else {
                return JsonRpcResponse::error(id, INVALID_PARAMS, "missing tool name");
            };
            let arguments = params.get("arguments").cloned().unwrap_or(json!({}));
            let result = tools::handle_call(&app.sessions, session, name, &arguments).await;
            match serde_json::to_value(result) {
                Ok(result) => JsonRpcResponse::result(id, result),
                Err(e) => JsonRpcResponse::error(id, PARSE_ERROR, e.to_string()),
            }
        }
        other => JsonRpcResponse::error(
            id,
            METHOD_NOT_FOUND,
            format!("unknown method: {other}"),
        ),
    }
}

async fn get_mcp(State(app): State<Arc<App>>, headers: HeaderMap) -> Response {
    let session = match header_session_id(&headers).and_then(|id| app.sessions.get(id)) {
        Some(session) => session,
        None => return (StatusCode::NOT_FOUND, "unknown session").into_response(),
    };

    let receiver = session.attach_stream().await;
    let stream = stream::unfold(receiver, |mut receiver| async move {
        let message = receiver.recv().await?;
        let event = SseEvent::default().event("message").data(message.to_string());
        Some((Ok::<_, Infallible>(event), receiver))
    });

    Sse::new(stream).keep_alive(KeepAlive::default()).into_response()
}

async fn delete_mcp(State(app): State<Arc<App>>, headers: HeaderMap) -> Response {
    match header_session_id(&headers) {
        Some(id) if app.sessions.terminate(id) => StatusCode::NO_CONTENT.into_response(),
        _ => (StatusCode::NOT_FOUND, "unknown session").into_response(),
    }
}
