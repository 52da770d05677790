//! Chat front-end routes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

/// GET / - the chat page.
pub async fn index() -> Html<&'static str> {
    Html(include_str!("../assets/chat.html"))
}

/// GET /health - connection status view.
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let bridge = state.bridge.lock().await;
    let conn = bridge.manager().state();
    Json(json!({
        "status": if conn.connected { "healthy" } else { "disconnected" },
        "server_connected": conn.connected,
        "transport": conn.kind,
        "endpoint": conn.endpoint.clone(),
    }))
}

/// POST /chat - run one orchestration turn.
pub async fn chat(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Response {
    let mut bridge = state.bridge.lock().await;

    if !bridge.is_connected() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "tool host not connected" })),
        )
            .into_response();
    }

    match bridge.process_query(&request.message).await {
        Ok(response) => Json(ChatResponse { response }).into_response(),
        Err(e @ runtime::Error::NotConnected) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "chat turn failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": format!("Error processing query: {e}") })),
            )
                .into_response()
        }
    }
}
