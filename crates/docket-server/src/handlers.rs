use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{
  Path,
  State
};
use axum::http::StatusCode;
use docket_shared::{
  Case,
  Employee,
  Matter,
  Task,
  TaskId
};
use serde_json::{
  Map,
  Value
};
use tracing::{
  info,
  instrument
};

use crate::AppState;
use crate::error::ApiError;

type Body = Result<
  Json<Map<String, Value>>,
  JsonRejection
>;

/// Anything that is not a plain number
/// cannot name a stored task.
fn task_id(raw: &str) -> Result<TaskId, ApiError> {
  raw
    .trim()
    .parse()
    .map_err(|_| ApiError::not_found())
}

#[instrument(skip_all)]
pub async fn list_tasks(
  State(state): State<AppState>
) -> Json<Vec<Task>> {
  let tasks = state.store.list();
  info!(count = tasks.len(), "listing tasks");
  Json(tasks)
}

#[instrument(skip_all)]
pub async fn create_task(
  State(state): State<AppState>,
  body: Body
) -> Result<(StatusCode, Json<Task>), ApiError> {
  let Json(body) = body?;
  let task = state.store.create(body)?;
  info!(task_id = task.id, "task created");
  Ok((StatusCode::CREATED, Json(task)))
}

#[instrument(skip(state, body))]
pub async fn update_task(
  State(state): State<AppState>,
  Path(id): Path<String>,
  body: Body
) -> Result<Json<Task>, ApiError> {
  let id = task_id(&id)?;
  let Json(patch) = body?;
  let task = state.store.update(id, patch)?;
  info!(task_id = id, "task updated");
  Ok(Json(task))
}

#[instrument(skip(state))]
pub async fn delete_task(
  State(state): State<AppState>,
  Path(id): Path<String>
) -> Result<StatusCode, ApiError> {
  let id = task_id(&id)?;
  state.store.delete(id)?;
  info!(task_id = id, "task deleted");
  Ok(StatusCode::NO_CONTENT)
}

pub async fn list_cases(
  State(state): State<AppState>
) -> Json<Vec<Case>> {
  Json(state.store.cases().to_vec())
}

pub async fn list_matters(
  State(state): State<AppState>
) -> Json<Vec<Matter>> {
  Json(state.store.matters().to_vec())
}

pub async fn list_employees(
  State(state): State<AppState>
) -> Json<Vec<Employee>> {
  Json(state.store.employees().to_vec())
}
