//! Mock `/pms/` backend for the docket
//! client: tasks with create, update and
//! delete, plus read-only cases, matters
//! and employees.

pub mod error;
pub mod handlers;
pub mod seed;
pub mod store;

use std::sync::Arc;

use axum::Router;
use axum::routing::{
  get,
  put
};
use tower_http::cors::{
  Any,
  CorsLayer
};
use tower_http::trace::TraceLayer;

use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
  pub store: Arc<Store>
}

impl AppState {
  pub fn new(store: Store) -> Self {
    Self {
      store: Arc::new(store)
    }
  }

  pub fn seeded() -> Self {
    Self::new(Store::seeded())
  }
}

/// Every route answers with and without
/// a trailing slash.
pub fn router(state: AppState) -> Router {
  let tasks = get(handlers::list_tasks)
    .post(handlers::create_task);
  let task = put(handlers::update_task)
    .delete(handlers::delete_task);

  let cors = CorsLayer::new()
    .allow_origin(Any)
    .allow_methods(Any)
    .allow_headers(Any);

  Router::new()
    .route("/pms/tasks", tasks.clone())
    .route("/pms/tasks/", tasks)
    .route("/pms/tasks/{id}", task.clone())
    .route("/pms/tasks/{id}/", task)
    .route(
      "/pms/cases",
      get(handlers::list_cases)
    )
    .route(
      "/pms/cases/",
      get(handlers::list_cases)
    )
    .route(
      "/pms/matters",
      get(handlers::list_matters)
    )
    .route(
      "/pms/matters/",
      get(handlers::list_matters)
    )
    .route(
      "/pms/employees",
      get(handlers::list_employees)
    )
    .route(
      "/pms/employees/",
      get(handlers::list_employees)
    )
    .layer(TraceLayer::new_for_http())
    .layer(cors)
    .with_state(state)
}
