//! Webhook endpoint handler.
//!
//! Verifies the delivery's signature before anything else, parses it, and runs
//! it through the agent inside a span. The response body says what happened.

use std::time::Instant;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::{Instrument, debug, field, info, info_span, warn};

use super::AppState;
use crate::agent::Outcome;
use crate::effects::GitHubConnector;
use crate::error::{AgentError, ErrorKind};
use crate::patch::{GenerationMetadata, ModelClient};
use crate::publish::PullRequestResult;
use crate::types::DeliveryId;
use crate::webhooks::{GitHubEvent, ParseError, parse_webhook, verify_signature};

/// Header name for GitHub event type.
const HEADER_EVENT: &str = "x-github-event";
/// Header name for GitHub delivery ID.
const HEADER_DELIVERY: &str = "x-github-delivery";
/// Header name for GitHub signature.
const HEADER_SIGNATURE: &str = "x-hub-signature-256";

/// Deliveries rejected before they reach the agent.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Missing or wrong `X-Hub-Signature-256`.
    #[error("invalid signature")]
    InvalidSignature,

    /// Missing required header.
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    /// The payload didn't match the event's shape.
    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] ParseError),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebhookError::InvalidSignature => StatusCode::FORBIDDEN,
            WebhookError::MissingHeader(_) | WebhookError::InvalidPayload(_) => {
                StatusCode::BAD_REQUEST
            }
        };

        (status, self.to_string()).into_response()
    }
}

/// The JSON body returned for a delivery that passed verification.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum DeliveryResponse {
    Ignored {
        reason: String,
    },
    NoOp,
    Pong,
    Completed {
        pull_request: PullRequestResult,
        metadata: GenerationMetadata,
        elapsed_ms: u64,
    },
    Failed {
        error: FailureDetail,
        elapsed_ms: u64,
    },
}

/// Enough about a failure for a caller to render a message.
#[derive(Debug, Serialize)]
pub struct FailureDetail {
    pub kind: ErrorKind,
    pub message: String,
    pub step: Option<&'static str>,
}

impl From<&AgentError> for FailureDetail {
    fn from(err: &AgentError) -> Self {
        FailureDetail {
            kind: err.kind(),
            message: err.to_string(),
            step: err.step(),
        }
    }
}

impl DeliveryResponse {
    fn from_result(result: Result<Outcome, AgentError>, elapsed_ms: u64) -> Self {
        match result {
            Ok(Outcome::Pong) => DeliveryResponse::Pong,
            Ok(Outcome::Ignored { reason }) => DeliveryResponse::Ignored { reason },
            Ok(Outcome::NoOp) => DeliveryResponse::NoOp,
            Ok(Outcome::Completed(completion)) => DeliveryResponse::Completed {
                pull_request: completion.pull_request,
                metadata: completion.metadata,
                elapsed_ms,
            },
            Err(err) => DeliveryResponse::Failed {
                error: FailureDetail::from(&err),
                elapsed_ms,
            },
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            DeliveryResponse::Failed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::OK,
        }
    }
}

impl IntoResponse for DeliveryResponse {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

/// Webhook handler.
///
/// # Response
///
/// - 200 OK: handled, ignored, or not an activation (body says which)
/// - 400 Bad Request: missing event header or a payload that doesn't parse
/// - 403 Forbidden: missing or invalid signature
/// - 500 Internal Server Error: the delivery failed (body carries kind,
///   message, failing step and elapsed time)
pub async fn webhook_handler<C, M>(
    State(app_state): State<AppState<C, M>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<DeliveryResponse, WebhookError>
where
    C: GitHubConnector + 'static,
    M: ModelClient + 'static,
{
    let signature_header = header(&headers, HEADER_SIGNATURE);
    let delivery_id = DeliveryId::new(header(&headers, HEADER_DELIVERY).unwrap_or("unknown"));

    // Nothing is parsed before the signature checks out.
    if !verify_signature(&body, signature_header, app_state.webhook_secret()) {
        warn!(delivery_id = %delivery_id, "Invalid webhook signature");
        return Err(WebhookError::InvalidSignature);
    }

    let event_type =
        header(&headers, HEADER_EVENT).ok_or(WebhookError::MissingHeader(HEADER_EVENT))?;

    let Some(event) = parse_webhook(event_type, &body)? else {
        debug!(delivery_id = %delivery_id, event_type = %event_type, "Ignoring unhandled event type");
        return Ok(DeliveryResponse::Ignored {
            reason: format!("event `{}` is not handled", event_type),
        });
    };

    let span = info_span!(
        "delivery",
        delivery_id = %delivery_id,
        event_type = %event_type,
        repo = field::Empty,
        issue = field::Empty,
    );
    if let GitHubEvent::IssueComment(comment) = &event {
        span.record("repo", field::display(&comment.repo));
        span.record("issue", comment.issue.number.0);
    }

    let started = Instant::now();
    let result = app_state.agent().handle(event).instrument(span.clone()).await;
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    span.in_scope(|| match &result {
        Ok(Outcome::Completed(completion)) => info!(
            pr = completion.pull_request.number,
            elapsed_ms,
            "Delivery completed"
        ),
        Ok(_) => debug!(elapsed_ms, "Delivery handled without changes"),
        Err(err) => warn!(
            kind = %err.kind(),
            step = ?err.step(),
            error = %err,
            elapsed_ms,
            "Delivery failed"
        ),
    });

    Ok(DeliveryResponse::from_result(result, elapsed_ms))
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
