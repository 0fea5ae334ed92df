use axum::extract::rejection::JsonRejection;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use tradehook_core::intent::{Intent, WebhookRequest};
use tradehook_engine::{IntentOutcome, OrderSequencer};

/// Response envelope for the webhook endpoint.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum WebhookResponse {
    Ok {
        /// The validated intent, echoed back.
        data: Intent,
        outcome: IntentOutcome,
    },
    Error {
        error: String,
    },
}

/// Health probe response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub connected: bool,
}

/// Receives a trade signal, validates it, and hands it to the sequencer.
///
/// Validation failures come back as 400 (no broker side effects);
/// resolution and broker failures as 500 (orders may have been partially
/// submitted).
pub async fn webhook(
    State(sequencer): State<Arc<OrderSequencer>>,
    payload: Result<Json<WebhookRequest>, JsonRejection>,
) -> (StatusCode, Json<WebhookResponse>) {
    // Deserialization failures get the same error envelope as every
    // other rejection, not the extractor's plain-text default.
    let Json(req) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            error!(error = %rejection, "rejected webhook body");
            return (
                StatusCode::BAD_REQUEST,
                Json(WebhookResponse::Error {
                    error: rejection.body_text(),
                }),
            );
        }
    };
    info!(symbol = %req.symbol, action = %req.action, "webhook received");

    let intent = match Intent::from_request(&req) {
        Ok(intent) => intent,
        Err(err) => {
            error!(error = %err, "rejected webhook payload");
            return (
                StatusCode::BAD_REQUEST,
                Json(WebhookResponse::Error {
                    error: err.to_string(),
                }),
            );
        }
    };

    match sequencer.apply_intent(&intent).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(WebhookResponse::Ok {
                data: intent,
                outcome,
            }),
        ),
        Err(err) => {
            error!(symbol = %intent.symbol, error = %err, "intent failed");
            let status = if err.is_validation() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (
                status,
                Json(WebhookResponse::Error {
                    error: err.to_string(),
                }),
            )
        }
    }
}

/// Reports process liveness and broker connectivity.
pub async fn health(State(sequencer): State<Arc<OrderSequencer>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        connected: sequencer.is_connected(),
    })
}
