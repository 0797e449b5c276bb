// 🌐 HTTP + WebSocket API
// Thin transport over BudgetService and SubscriberRegistry

use crate::error::DeliveryError;
use crate::events::Event;
use crate::ledger::{Expense, LedgerSnapshot};
use crate::registry::{Subscriber, SubscriberRegistry};
use crate::service::{BudgetEngine, BudgetService};
use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{debug, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<BudgetService>,
    pub registry: Arc<SubscriberRegistry>,
}

impl From<&BudgetEngine> for AppState {
    fn from(engine: &BudgetEngine) -> Self {
        AppState {
            service: Arc::clone(&engine.service),
            registry: Arc::clone(&engine.registry),
        }
    }
}

/// API Response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

#[derive(Serialize)]
pub struct AddExpenseResponse {
    status: &'static str,
    total_expenses: f64,
    category_totals: HashMap<String, f64>,
}

// ============================================================================
// WEBSOCKET SUBSCRIBER
// ============================================================================

/// Writes each event as one JSON text frame on the socket's send half.
/// `close` cancels `closed`, which makes the reader task drop the receive
/// half; once both halves are gone the connection is torn down.
pub struct WebSocketSubscriber {
    sink: AsyncMutex<SplitSink<WebSocket, Message>>,
    closed: CancellationToken,
}

impl WebSocketSubscriber {
    pub fn new(sink: SplitSink<WebSocket, Message>, closed: CancellationToken) -> Self {
        WebSocketSubscriber {
            sink: AsyncMutex::new(sink),
            closed,
        }
    }
}

#[async_trait]
impl Subscriber for WebSocketSubscriber {
    async fn deliver(&self, event: &Event) -> Result<(), DeliveryError> {
        if self.closed.is_cancelled() {
            return Err(DeliveryError::Closed);
        }

        let json = event
            .to_json()
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        self.sink
            .lock()
            .await
            .send(Message::Text(json))
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))
    }

    fn close(&self) {
        self.closed.cancel();
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// POST /addExpense - Append an expense and broadcast it
async fn add_expense(State(state): State<AppState>, body: Bytes) -> Response {
    let expense = match Expense::from_json(&body) {
        Ok(expense) => expense,
        Err(e) => {
            debug!(error = %e, "rejected expense payload");
            return (StatusCode::BAD_REQUEST, Json(ApiResponse::<()>::err(e.to_string()))).into_response();
        }
    };

    let totals = state.service.add_expense(expense);

    let response = AddExpenseResponse {
        status: "success",
        total_expenses: totals.total_expenses,
        category_totals: totals.category_totals,
    };

    (StatusCode::OK, Json(ApiResponse::ok(response))).into_response()
}

/// GET /api/budget - Consistent snapshot of the ledger
async fn get_budget(State(state): State<AppState>) -> Json<ApiResponse<LedgerSnapshot>> {
    Json(ApiResponse::ok(state.service.read_snapshot()))
}

/// GET /ws - Subscribe to live events
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Register the send half, then watch the receive half until the client
/// leaves, the transport errors, or the dispatcher prunes the subscriber.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (sink, mut stream) = socket.split();
    let closed = CancellationToken::new();
    let id = state
        .registry
        .register(Arc::new(WebSocketSubscriber::new(sink, closed.clone())));

    loop {
        tokio::select! {
            _ = closed.cancelled() => {
                debug!(subscriber = %id, "pruned, dropping websocket");
                break;
            }
            frame = stream.next() => match frame {
                Some(Ok(Message::Close(_))) | None => break,
                // Inbound frames carry no meaning; clients only listen
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(subscriber = %id, error = %e, "websocket error");
                    break;
                }
            },
        }
    }

    state.registry.unregister(id);
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/addExpense", post(add_expense))
        .route("/ws", get(ws_handler))
        .route("/api/health", get(health_check))
        .route("/api/budget", get(get_budget))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
