//! Task endpoints and background generation

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    routing::{delete, get, post},
};
use easel_imagegen::{ImageRequest, ImageRouter, Params, ProviderKind, RequestOverrides};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    error::ServerError,
    events::TaskEvents,
    tasks::{Task, TaskStore},
};

/// Shared state for task handlers
#[derive(Clone)]
pub struct AppState {
    router: Arc<ImageRouter>,
    store: Arc<dyn TaskStore>,
    events: TaskEvents,
}

impl AppState {
    pub fn new(router: Arc<ImageRouter>, store: Arc<dyn TaskStore>, events: TaskEvents) -> Self {
        Self { router, store, events }
    }
}

/// Body of `POST /generate/image`
#[derive(Debug, Deserialize)]
pub struct GenerateImageRequest {
    pub prompt: String,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub additional_params: Option<Params>,
    #[serde(default)]
    pub webhook_url: Option<String>,
}

impl GenerateImageRequest {
    fn overrides(&mut self) -> RequestOverrides {
        RequestOverrides {
            size: self.size.take(),
            quality: self.quality.take(),
            model: self.model.take(),
            additional_params: self.additional_params.take().unwrap_or_default(),
        }
    }
}

/// Create the task router; mounted under `/api/v1`
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/generate/image", post(generate_image))
        .route("/status/{task_id}", get(task_status))
        .route("/tasks/{task_id}", delete(delete_task))
        .with_state(state)
}

pub async fn health_handler() -> &'static str {
    "ok"
}

/// Validate the request, record a pending task and start generation
async fn generate_image(
    State(state): State<AppState>,
    payload: Result<Json<GenerateImageRequest>, JsonRejection>,
) -> Result<Json<Task>, ServerError> {
    let Json(mut body) = payload?;

    let kind = state.router.resolve(body.provider.as_deref())?;
    let request = ImageRequest::new(body.prompt.as_str())?.with_params(body.overrides());

    let task = Task::new(body.prompt, kind, body.webhook_url);
    state.store.save(task.clone());

    tracing::debug!(task_id = %task.task_id, provider = %kind, "accepted image generation request");

    tokio::spawn(process_task(state, task.clone(), kind, request));

    Ok(Json(task))
}

/// Drive one task from pending to a terminal state
async fn process_task(state: AppState, mut task: Task, kind: ProviderKind, request: ImageRequest) {
    state.events.created(&task).await;

    task.start();
    if !state.store.update(task.clone()) {
        tracing::debug!(task_id = %task.task_id, "task deleted before processing, skipping");
        return;
    }
    state.events.started(&task).await;

    match state.router.route_request(kind, &request).await {
        Ok(Some(url)) => task.complete(url),
        Ok(None) => task.fail("No image generated"),
        Err(e) => task.fail(e.to_string()),
    }

    if !state.store.update(task.clone()) {
        tracing::debug!(task_id = %task.task_id, "task deleted before completion, dropping result");
        return;
    }

    state.events.completed(&task).await;
}

async fn task_status(State(state): State<AppState>, Path(task_id): Path<String>) -> Result<Json<Task>, ServerError> {
    let task_id = parse_task_id(&task_id)?;

    state.store.get(&task_id).map(Json).ok_or(ServerError::TaskNotFound)
}

async fn delete_task(State(state): State<AppState>, Path(task_id): Path<String>) -> Result<Json<Value>, ServerError> {
    let task_id = parse_task_id(&task_id)?;
    let task = state.store.remove(&task_id).ok_or(ServerError::TaskNotFound)?;

    let events = state.events.clone();
    tokio::spawn(async move { events.deleted(&task).await });

    Ok(Json(json!({"status": "deleted"})))
}

fn parse_task_id(raw: &str) -> Result<Uuid, ServerError> {
    Uuid::parse_str(raw).map_err(|_| ServerError::TaskNotFound)
}
