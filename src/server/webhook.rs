//! Trello webhook callbacks.
//!
//! Trello probes a callback with `HEAD` before registering a webhook and
//! then POSTs one action per delivery. Every POST is acknowledged with 200
//! straight away; the triggered workflow runs on a spawned task and its
//! failures only reach the logs.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::{debug, info, warn};

use super::AppState;
use crate::model::action::WebhookDelivery;
use crate::twin::{classify, Endpoint, Workflow};

pub async fn probe_handler() -> StatusCode {
    StatusCode::OK
}

/// `POST /` and `POST /twin`: member assignment only.
pub async fn membership_handler(State(state): State<AppState>, body: Bytes) -> StatusCode {
    accept(state, &body, Endpoint::Membership)
}

/// `POST /sync`: archive status only. This is the watch-webhook callback.
pub async fn status_handler(State(state): State<AppState>, body: Bytes) -> StatusCode {
    accept(state, &body, Endpoint::Status)
}

fn accept(state: AppState, body: &[u8], endpoint: Endpoint) -> StatusCode {
    if let Some(workflow) = dispatch(&state, body, endpoint) {
        info!(
            workflow = workflow.name(),
            card_id = %workflow.card_id(),
            "Starting workflow"
        );
        tokio::spawn(async move {
            workflow.run(state.gateway(), state.settings()).await;
        });
    }
    StatusCode::OK
}

/// Decides which workflow, if any, a delivery to `endpoint` triggers.
pub fn dispatch(state: &AppState, body: &[u8], endpoint: Endpoint) -> Option<Workflow> {
    let delivery: WebhookDelivery = match serde_json::from_slice(body) {
        Ok(delivery) => delivery,
        Err(e) => {
            warn!(?endpoint, error = %e, "Ignoring unparseable webhook delivery");
            return None;
        }
    };

    let action_type = delivery.action.action_type.as_str();
    match classify(state.settings(), &delivery.action) {
        Some(workflow) if endpoint.accepts(&workflow) => Some(workflow),
        Some(workflow) => {
            debug!(?endpoint, workflow = workflow.name(), "Workflow not served by this endpoint");
            None
        }
        None => {
            debug!(?endpoint, action_type, "Action does not trigger a workflow");
            None
        }
    }
}
