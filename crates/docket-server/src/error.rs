use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{
  IntoResponse,
  Response
};
use docket_shared::ErrorBody;
use tracing::{
  error,
  warn
};

use crate::store::StoreError;

/// JSON `{"error": ...}` response with a
/// status code.
#[derive(Debug, Clone)]
pub struct ApiError {
  pub status: StatusCode,
  pub body:   ErrorBody
}

impl ApiError {
  pub fn new(
    status: StatusCode,
    message: impl Into<String>
  ) -> Self {
    Self {
      status,
      body: ErrorBody {
        error: message.into()
      }
    }
  }

  pub fn not_found() -> Self {
    Self::new(
      StatusCode::NOT_FOUND,
      "Task not found"
    )
  }

  pub fn bad_request(
    message: impl Into<String>
  ) -> Self {
    Self::new(StatusCode::BAD_REQUEST, message)
  }

  pub fn internal() -> Self {
    Self::new(
      StatusCode::INTERNAL_SERVER_ERROR,
      "An internal error occurred"
    )
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    (self.status, Json(self.body))
      .into_response()
  }
}

impl From<StoreError> for ApiError {
  fn from(err: StoreError) -> Self {
    match err {
      | StoreError::NotFound(id) => {
        warn!(task_id = id, "task not found");
        Self::not_found()
      }
      | StoreError::Malformed(source) => {
        warn!(%source, "rejected task body");
        Self::bad_request(format!(
          "malformed task: {source}"
        ))
      }
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    let status = rejection.status();
    if status.is_server_error() {
      error!(%rejection, "failed to read request body");
      return Self::internal();
    }
    Self::new(status, rejection.body_text())
  }
}
