//! HTTP API — validation, canonicalization, and forwarding to the session.
//!
//! Two send endpoints plus health and QR-pairing endpoints. Static assets
//! from the configured public directory are served as the router fallback.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::services::ServeDir;
use tracing::{error, info};

use wagate_core::config::ServerConfig;
use wagate_core::recipient::canonicalize;
use wagate_core::traits::Session;
use wagate_whatsapp::{generate_qr_image, WhatsAppSession};

use crate::fetch::fetch_attachment;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    session: Arc<dyn Session>,
    http: reqwest::Client,
    uptime: Instant,
}

impl ApiState {
    pub fn new(session: Arc<dyn Session>) -> Self {
        Self {
            session,
            http: reqwest::Client::new(),
            uptime: Instant::now(),
        }
    }
}

/// `POST /send-text` request body.
#[derive(Debug, Deserialize)]
struct SendTextRequest {
    number: Option<String>,
    message: Option<String>,
}

/// `POST /send-image-url` request body.
#[derive(Debug, Deserialize)]
struct SendImageUrlRequest {
    number: Option<String>,
    #[serde(rename = "imageUrl")]
    image_url: Option<String>,
    caption: Option<String>,
}

fn bad_request(message: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"success": false, "error": message})),
    )
}

fn send_failed(message: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"success": false, "error": message})),
    )
}

fn sent(message: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({"success": true, "message": message})),
    )
}

/// `POST /send-text` — validate, canonicalize, send a text body.
async fn send_text(
    State(state): State<ApiState>,
    body: Result<Json<SendTextRequest>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    // A body that doesn't parse carries no usable fields; same answer as
    // missing fields.
    let Ok(Json(request)) = body else {
        return bad_request("Number and message are required.");
    };

    let (number, message) = match (request.number, request.message) {
        (Some(n), Some(m)) if !n.is_empty() && !m.is_empty() => (n, m),
        _ => return bad_request("Number and message are required."),
    };

    let chat_id = canonicalize(&number);

    match state.session.send_text(&chat_id, &message).await {
        Ok(()) => sent("Message sent successfully."),
        Err(e) => {
            error!("Error sending message: {e}");
            send_failed("Failed to send message.")
        }
    }
}

/// `POST /send-image-url` — validate, fetch the image, send it with a
/// caption. Fetch and send failures are not distinguished in the response.
async fn send_image_url(
    State(state): State<ApiState>,
    body: Result<Json<SendImageUrlRequest>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    let Ok(Json(request)) = body else {
        return bad_request("Number and image URL are required.");
    };

    let (number, image_url) = match (request.number, request.image_url) {
        (Some(n), Some(u)) if !n.is_empty() && !u.is_empty() => (n, u),
        _ => return bad_request("Number and image URL are required."),
    };

    let chat_id = canonicalize(&number);
    let caption = request.caption.unwrap_or_default();

    let attachment = match fetch_attachment(&state.http, &image_url).await {
        Ok(a) => a,
        Err(e) => {
            error!("Error sending image: {e}");
            return send_failed("Failed to send image.");
        }
    };

    match state
        .session
        .send_media(&chat_id, &attachment, &caption)
        .await
    {
        Ok(()) => sent("Image sent successfully."),
        Err(e) => {
            error!("Error sending image: {e}");
            send_failed("Failed to send image.")
        }
    }
}

/// `GET /health` — uptime and session readiness.
async fn health(State(state): State<ApiState>) -> Json<Value> {
    let session_status = if state.session.is_ready().await {
        "connected"
    } else {
        "disconnected"
    };

    Json(json!({
        "status": "ok",
        "uptime_secs": state.uptime.elapsed().as_secs(),
        "whatsapp": session_status,
    }))
}

/// Downcast the concrete WhatsApp session from shared state.
///
/// The pairing endpoints drive the restart/QR machinery, which lives on
/// the concrete type rather than the send seam.
fn get_whatsapp(state: &ApiState) -> Result<&WhatsAppSession, (StatusCode, Json<Value>)> {
    state
        .session
        .as_any()
        .downcast_ref::<WhatsAppSession>()
        .ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"success": false, "error": "WhatsApp session not available"})),
        ))
}

/// `POST /pair` — re-pair the session, return the QR as base64 PNG.
async fn pair(State(state): State<ApiState>) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let wa = get_whatsapp(&state)?;

    if state.session.is_ready().await {
        return Ok(Json(json!({
            "status": "already_paired",
            "message": "WhatsApp is already connected",
        })));
    }

    // Restart the bot so fresh QR codes flow.
    wa.restart_for_pairing().await.map_err(|e| {
        error!("WhatsApp restart for pairing failed: {e}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"success": false, "error": "pairing restart failed"})),
        )
    })?;

    let (mut qr_rx, _done_rx) = wa.pairing_channels().await;

    // Wait up to 30s for the first QR code.
    let qr_data = tokio::time::timeout(std::time::Duration::from_secs(30), qr_rx.recv())
        .await
        .map_err(|_| {
            (
                StatusCode::GATEWAY_TIMEOUT,
                Json(json!({"success": false, "error": "timed out waiting for QR code"})),
            )
        })?
        .ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"success": false, "error": "QR channel closed unexpectedly"})),
        ))?;

    let png_bytes = generate_qr_image(&qr_data).map_err(|e| {
        error!("QR image generation failed: {e}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"success": false, "error": "QR generation failed"})),
        )
    })?;

    Ok(Json(json!({
        "status": "qr_ready",
        "qr_png_base64": BASE64.encode(&png_bytes),
    })))
}

/// `GET /pair/status` — long-poll (60s) for pairing completion.
async fn pair_status(
    State(state): State<ApiState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let wa = get_whatsapp(&state)?;

    if state.session.is_ready().await {
        return Ok(Json(json!({
            "status": "paired",
            "message": "WhatsApp is connected",
        })));
    }

    let (_qr_rx, mut done_rx) = wa.pairing_channels().await;

    let paired = tokio::time::timeout(std::time::Duration::from_secs(60), done_rx.recv())
        .await
        .unwrap_or(Some(false))
        .unwrap_or(false);

    if paired {
        Ok(Json(json!({
            "status": "paired",
            "message": "WhatsApp pairing completed",
        })))
    } else {
        Ok(Json(json!({
            "status": "pending",
            "message": "Pairing not yet completed",
        })))
    }
}

/// Build the axum router with shared state and static fallback.
fn build_router(state: ApiState, public_dir: &str) -> Router {
    Router::new()
        .route("/send-text", post(send_text))
        .route("/send-image-url", post(send_image_url))
        .route("/health", get(health))
        .route("/pair", post(pair))
        .route("/pair/status", get(pair_status))
        .fallback_service(ServeDir::new(public_dir))
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1 MB max request body
        .with_state(state)
}

/// Bind and serve until shutdown.
pub async fn serve(config: &ServerConfig, state: ApiState) -> anyhow::Result<()> {
    let app = build_router(state, &config.public_dir);
    let addr = format!("{}:{}", config.host, config.port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("WhatsApp API server running at http://{addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
