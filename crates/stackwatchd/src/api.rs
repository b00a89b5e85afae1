//! HTTP surface
//!
//! - `POST   /stacks`                 create a tenant stack
//! - `DELETE /stacks/{stack}`         start deleting a stack
//! - `GET    /stacks/{stack}/events`  stream the stack's events (SSE)
//! - `GET    /health`                 liveness probe

use crate::error::ApiError;
use crate::lifecycle::LifecycleInitiator;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use stackwatch_cloud::ProvisioningClient;
use stackwatch_stream::{StreamConfig, StreamFrame, spawn_session};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::warn;

/// Shared by every request; holds no per-session state
#[derive(Clone)]
pub struct AppState {
    client: Arc<dyn ProvisioningClient>,
    lifecycle: LifecycleInitiator,
    stream: StreamConfig,
}

impl AppState {
    pub fn new(client: Arc<dyn ProvisioningClient>, stream: StreamConfig) -> Self {
        Self {
            lifecycle: LifecycleInitiator::new(client.clone()),
            client,
            stream,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateStackRequest {
    pub tenant: String,
}

/// Where to follow a stack after a create or delete request
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StackAccepted {
    pub stack_name: String,
    pub events_url: String,
}

impl StackAccepted {
    fn new(stack_name: String) -> Self {
        let events_url = format!("/stacks/{}/events", stack_name);
        Self {
            stack_name,
            events_url,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/stacks", post(create_stack))
        .route("/stacks/{stack}", delete(delete_stack))
        .route("/stacks/{stack}/events", get(stream_events))
        .route("/health", get(health))
        .with_state(state)
}

async fn create_stack(
    State(state): State<AppState>,
    Json(request): Json<CreateStackRequest>,
) -> Result<(StatusCode, Json<StackAccepted>), ApiError> {
    let stack_name = state
        .lifecycle
        .request_create(&request.tenant)
        .await
        .map_err(ApiError::creation)?;

    Ok((StatusCode::CREATED, Json(StackAccepted::new(stack_name))))
}

async fn delete_stack(
    State(state): State<AppState>,
    Path(stack): Path<String>,
) -> Result<(StatusCode, Json<StackAccepted>), ApiError> {
    state
        .lifecycle
        .request_delete(&stack)
        .await
        .map_err(ApiError::deletion)?;

    Ok((StatusCode::ACCEPTED, Json(StackAccepted::new(stack))))
}

async fn stream_events(
    State(state): State<AppState>,
    Path(stack): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // The session stops by itself once the client disconnects and this
    // stream is dropped.
    let session = spawn_session(state.client.clone(), stack, state.stream.clone());
    let events = session
        .into_stream()
        .map(|frame| Ok::<_, Infallible>(sse_event(&frame)));

    Sse::new(events).keep_alive(KeepAlive::default())
}

async fn health() -> StatusCode {
    StatusCode::OK
}

fn sse_event(frame: &StreamFrame) -> Event {
    let payload = match frame.payload() {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Failed to encode frame");
            return Event::default().data(format!("[ERROR] {}", e));
        }
    };

    let event = match frame.event_name() {
        Some(name) => Event::default().event(name),
        None => Event::default(),
    };
    event.data(payload)
}
