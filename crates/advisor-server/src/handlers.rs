//! HTTP/WebSocket Handlers

use axum::{
    Json,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    http::header,
    response::{IntoResponse, Response},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use futures::{Sink, SinkExt, Stream, StreamExt};
use serde::{Deserialize, Serialize};

use consolidation_advisor::{Advice, ConsolidationRequest, OptimizationResult, usage_message};

use crate::error::ServerError;
use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub chart_format: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UsageResponse {
    pub message: String,
}

/// Chart image embedded in a JSON reply
#[derive(Debug, Serialize, Deserialize)]
pub struct ChartAttachment {
    pub file_name: String,
    pub content_type: String,
    pub data_base64: String,
}

impl From<&Advice> for ChartAttachment {
    fn from(advice: &Advice) -> Self {
        Self {
            file_name: advice.file_name.clone(),
            content_type: advice.content_type.into(),
            data_base64: STANDARD.encode(&advice.chart),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OptimizeResponse {
    /// Markdown summary
    pub summary: String,

    /// Plain-text per-platform breakdown
    pub details: String,

    pub result: OptimizationResult,
    pub chart: ChartAttachment,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub conversation_id: String,
    pub reply: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub chart: Option<ChartAttachment>,
    pub is_error: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        chart_format: state.chart_format.to_string(),
    })
}

/// Welcome text with an example request
pub async fn usage() -> Json<UsageResponse> {
    Json(UsageResponse {
        message: usage_message(),
    })
}

/// Structured optimization: summary, numbers and the chart as base64
pub async fn optimize_handler(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<OptimizeResponse>, ServerError> {
    let request = ConsolidationRequest::from_json(&body)?;
    let advice = advise(&state, request).await?;

    Ok(Json(OptimizeResponse {
        summary: advice.summary(),
        details: advice.result.breakdown(),
        chart: ChartAttachment::from(&advice),
        result: advice.result,
    }))
}

/// Chart only, as raw image bytes
pub async fn chart_handler(
    State(state): State<AppState>,
    body: String,
) -> Result<Response, ServerError> {
    let request = ConsolidationRequest::from_json(&body)?;
    let advice = advise(&state, request).await?;

    let headers = [
        (header::CONTENT_TYPE, advice.content_type.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", advice.file_name),
        ),
    ];
    Ok((headers, advice.chart).into_response())
}

/// Conversational endpoint (non-streaming)
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let conversation_id = payload
        .conversation_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    Json(converse(&state, &payload.message, conversation_id).await)
}

/// WebSocket chat: one reply frame per text frame
pub async fn chat_stream_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_stream(socket, state))
}

async fn handle_stream(socket: WebSocket, state: AppState) {
    let (sender, receiver) = socket.split();
    relay(sender, receiver, state).await;
}

/// Answer each incoming text frame with one JSON reply frame
async fn relay<S, R>(mut sender: S, mut receiver: R, state: AppState)
where
    S: Sink<Message> + Unpin,
    R: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    let conversation_id = uuid::Uuid::new_v4().to_string();
    tracing::debug!(%conversation_id, "Chat session opened");

    while let Some(msg) = receiver.next().await {
        let text = match msg {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Err(e) => {
                tracing::error!("WebSocket error: {}", e);
                break;
            }
            _ => continue,
        };

        let reply = converse(&state, text.as_str(), conversation_id.clone()).await;
        let frame = match serde_json::to_string(&reply) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!("Could not encode reply: {}", e);
                continue;
            }
        };

        if sender.send(Message::Text(frame.into())).await.is_err() {
            break;
        }
    }

    tracing::debug!(%conversation_id, "Chat session closed");
}

// ============================================================================
// Helpers
// ============================================================================

/// Run the CPU-bound advice step off the async executor
async fn advise(state: &AppState, request: ConsolidationRequest) -> Result<Advice, ServerError> {
    let advisor = state.advisor.clone();
    let advice = tokio::task::spawn_blocking(move || advisor.advise(&request)).await??;
    Ok(advice)
}

/// Answer one chat message; failures become an error reply, never a dropped session
async fn converse(state: &AppState, message: &str, conversation_id: String) -> ChatResponse {
    let message = message.trim();

    if matches!(message, "/start" | "/help") {
        return ChatResponse {
            conversation_id,
            reply: usage_message(),
            chart: None,
            is_error: false,
        };
    }

    let outcome = match ConsolidationRequest::from_json(message) {
        Ok(request) => advise(state, request).await,
        Err(e) => Err(e.into()),
    };

    match outcome {
        Ok(advice) => ChatResponse {
            conversation_id,
            reply: advice.summary(),
            chart: Some(ChartAttachment::from(&advice)),
            is_error: false,
        },
        Err(e) => {
            tracing::warn!(%conversation_id, "Chat request failed: {}", e);
            ChatResponse {
                conversation_id,
                reply: format!("An error occurred: {}", e.user_message()),
                chart: None,
                is_error: true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
    };
    use consolidation_advisor::{ChartFormat, ChartStyle, ConsolidationAdvisor};
    use tower::ServiceExt;

    const WORKED_EXAMPLE: &str = r#"{
        "platforms": ["A", "B", "C"],
        "balances": [1000, 2000, 0],
        "APRs": [0.10, 0.20, 0.30],
        "transfer_fee_matrix": [[0, 5, 10], [5, 0, 8], [10, 8, 0]]
    }"#;

    fn app(format: ChartFormat) -> Router {
        crate::router(AppState {
            advisor: Arc::new(ConsolidationAdvisor::with_format(format, ChartStyle::default())),
            chart_format: format,
        })
    }

    async fn send(app: Router, method: &str, uri: &str, body: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(app(ChartFormat::Svg), "GET", "/health", "").await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["chart_format"], "svg");
    }

    #[tokio::test]
    async fn test_optimize_png() {
        let (status, body) = send(app(ChartFormat::Png), "POST", "/api/optimize", WORKED_EXAMPLE).await;
        assert_eq!(status, StatusCode::OK);

        let response: OptimizeResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(response.result.best_platform, "C");
        assert_eq!(response.result.comparison.len(), 4);
        assert!(response.summary.contains("`$1.37`"));
        assert!(response.summary.contains("`$2.45`"));
        assert!(response.details.contains("Moving everything into C"));

        assert_eq!(response.chart.content_type, "image/png");
        let png = STANDARD.decode(response.chart.data_base64).unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[tokio::test]
    async fn test_optimize_shape_mismatch() {
        let body = r#"{"platforms":["A","B"],"balances":[1],"APRs":[0.1,0.2],"transfer_fee_matrix":[[0,1],[1,0]]}"#;
        let (status, body) = send(app(ChartFormat::Svg), "POST", "/api/optimize", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "INVALID_INPUT");
        assert!(json["error"].as_str().unwrap().contains("balances"));
    }

    #[tokio::test]
    async fn test_optimize_malformed_json() {
        let (status, body) = send(app(ChartFormat::Svg), "POST", "/api/optimize", "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_chart_endpoint_returns_image() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/optimize/chart")
            .body(Body::from(WORKED_EXAMPLE))
            .unwrap();

        let response = app(ChartFormat::Svg).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/svg+xml");

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let svg = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Projected Returns after Consolidating Funds"));
    }

    #[tokio::test]
    async fn test_usage() {
        let (status, body) = send(app(ChartFormat::Svg), "GET", "/api/usage", "").await;
        assert_eq!(status, StatusCode::OK);

        let usage: UsageResponse = serde_json::from_slice(&body).unwrap();
        assert!(usage.message.contains("transfer_fee_matrix"));
    }

    #[tokio::test]
    async fn test_chat_start() {
        let body = serde_json::json!({"message": "/start", "conversation_id": "abc"}).to_string();
        let (status, body) = send(app(ChartFormat::Svg), "POST", "/api/chat", &body).await;
        assert_eq!(status, StatusCode::OK);

        let reply: ChatResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(reply.conversation_id, "abc");
        assert!(reply.reply.contains("Hello there"));
        assert!(reply.chart.is_none());
        assert!(!reply.is_error);
    }

    #[tokio::test]
    async fn test_chat_optimizes_message() {
        let body = serde_json::json!({"message": WORKED_EXAMPLE}).to_string();
        let (status, body) = send(app(ChartFormat::Svg), "POST", "/api/chat", &body).await;
        assert_eq!(status, StatusCode::OK);

        let reply: ChatResponse = serde_json::from_slice(&body).unwrap();
        assert!(!reply.conversation_id.is_empty());
        assert!(reply.reply.contains("*Best Platform:* `C`"));
        assert_eq!(reply.chart.unwrap().file_name, "result.svg");
    }

    #[tokio::test]
    async fn test_chat_error_keeps_session() {
        let body = serde_json::json!({"message": "what is my best option?"}).to_string();
        let (status, body) = send(app(ChartFormat::Svg), "POST", "/api/chat", &body).await;
        assert_eq!(status, StatusCode::OK);

        let reply: ChatResponse = serde_json::from_slice(&body).unwrap();
        assert!(reply.is_error);
        assert!(reply.reply.starts_with("An error occurred: "));
    }

    #[tokio::test]
    async fn test_optimize_overflow_is_rejected() {
        let body = r#"{
            "platforms": ["A", "B"],
            "balances": ["50000000000000000000000000000", "50000000000000000000000000000"],
            "APRs": [0.1, 0.1],
            "transfer_fee_matrix": [[0, 0], [0, 0]]
        }"#;
        let (status, body) = send(app(ChartFormat::Svg), "POST", "/api/optimize", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "INVALID_INPUT");
        assert!(json["error"].as_str().unwrap().contains("too large"));
    }

    #[tokio::test]
    async fn test_stream_replies_per_text_frame() {
        let state = AppState {
            advisor: Arc::new(ConsolidationAdvisor::with_format(
                ChartFormat::Svg,
                ChartStyle::default(),
            )),
            chart_format: ChartFormat::Svg,
        };
        let frames: Vec<Result<Message, axum::Error>> = vec![
            Ok(Message::Text("/start".into())),
            Ok(Message::Ping(Default::default())),
            Ok(Message::Text(WORKED_EXAMPLE.into())),
            Ok(Message::Text("not a request".into())),
            Ok(Message::Close(None)),
            Ok(Message::Text("/help".into())),
        ];
        let incoming = futures::stream::iter(frames);
        let (outgoing, replies) = futures::channel::mpsc::unbounded::<Message>();

        relay(outgoing, incoming, state).await;

        let replies: Vec<ChatResponse> = replies
            .map(|frame| match frame {
                Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
                other => panic!("unexpected frame {other:?}"),
            })
            .collect()
            .await;

        assert_eq!(replies.len(), 3);
        assert!(replies.iter().all(|r| r.conversation_id == replies[0].conversation_id));

        assert!(replies[0].reply.contains("Hello there"));
        assert!(!replies[0].is_error);

        assert!(replies[1].reply.contains("*Best Platform:* `C`"));
        assert_eq!(replies[1].chart.as_ref().unwrap().content_type, "image/svg+xml");

        assert!(replies[2].is_error);
        assert!(replies[2].reply.starts_with("An error occurred: "));
    }
}
