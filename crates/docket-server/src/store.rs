use chrono::{
  SecondsFormat,
  Utc
};
use docket_shared::{
  Case,
  Employee,
  Matter,
  Task,
  TaskId
};
use parking_lot::Mutex;
use serde_json::{
  Map,
  Value
};
use thiserror::Error;
use tracing::{
  debug,
  instrument
};

use crate::seed;

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("Task not found")]
  NotFound(TaskId),
  #[error("malformed task: {0}")]
  Malformed(#[from] serde_json::Error)
}

/// Folds the `caseId` spelling into
/// `case_id` so a record never carries
/// both.
fn fold_aliases(map: &mut Map<String, Value>) {
  if let Some(case_id) = map.remove("caseId") {
    map.insert("case_id".into(), case_id);
  }
}

struct Tasks {
  rows:    Vec<Task>,
  last_id: TaskId
}

/// Task collection plus the read-only
/// reference lists.
pub struct Store {
  tasks:     Mutex<Tasks>,
  cases:     Vec<Case>,
  matters:   Vec<Matter>,
  employees: Vec<Employee>
}

impl Store {
  pub fn new(
    tasks: Vec<Task>,
    cases: Vec<Case>,
    matters: Vec<Matter>,
    employees: Vec<Employee>
  ) -> Self {
    let last_id = tasks
      .iter()
      .map(|t| t.id)
      .max()
      .unwrap_or(0);
    Self {
      tasks: Mutex::new(Tasks {
        rows: tasks,
        last_id
      }),
      cases,
      matters,
      employees
    }
  }

  pub fn seeded() -> Self {
    Self::new(
      seed::tasks(),
      seed::cases(),
      seed::matters(),
      seed::employees()
    )
  }

  pub fn list(&self) -> Vec<Task> {
    self.tasks.lock().rows.clone()
  }

  pub fn cases(&self) -> &[Case] {
    &self.cases
  }

  pub fn matters(&self) -> &[Matter] {
    &self.matters
  }

  pub fn employees(&self) -> &[Employee] {
    &self.employees
  }

  /// Ids come from the wall clock in
  /// milliseconds, bumped past the last
  /// id handed out.
  #[instrument(skip(self, body))]
  pub fn create(
    &self,
    mut body: Map<String, Value>
  ) -> Result<Task, StoreError> {
    let now = Utc::now();
    let mut tasks = self.tasks.lock();

    let clock = u64::try_from(
      now.timestamp_millis()
    )
    .unwrap_or(0);
    let id = clock.max(tasks.last_id + 1);

    fold_aliases(&mut body);
    body.insert("id".into(), Value::from(id));
    body.insert(
      "is_new".into(),
      Value::Bool(true)
    );
    if !body
      .get("created_at")
      .is_some_and(|v| !v.is_null())
    {
      body.insert(
        "created_at".into(),
        Value::String(now.to_rfc3339_opts(
          SecondsFormat::Secs,
          true
        ))
      );
    }

    let task: Task =
      serde_json::from_value(
        Value::Object(body)
      )?;
    tasks.last_id = id;
    tasks.rows.push(task.clone());
    debug!(task_id = id, "created task");
    Ok(task)
  }

  /// Shallow merge: top-level fields of
  /// `patch` replace the stored ones. The
  /// id always comes from the path.
  #[instrument(skip(self, patch))]
  pub fn update(
    &self,
    id: TaskId,
    mut patch: Map<String, Value>
  ) -> Result<Task, StoreError> {
    fold_aliases(&mut patch);
    let mut tasks = self.tasks.lock();
    let slot = tasks
      .rows
      .iter_mut()
      .find(|t| t.id == id)
      .ok_or(StoreError::NotFound(id))?;

    let mut merged =
      match serde_json::to_value(&*slot)? {
        | Value::Object(map) => map,
        | _ => Map::new()
      };
    merged.extend(patch);
    merged.insert("id".into(), Value::from(id));

    let task: Task =
      serde_json::from_value(
        Value::Object(merged)
      )?;
    *slot = task.clone();
    debug!(task_id = id, "updated task");
    Ok(task)
  }

  #[instrument(skip(self))]
  pub fn delete(
    &self,
    id: TaskId
  ) -> Result<(), StoreError> {
    let mut tasks = self.tasks.lock();
    let before = tasks.rows.len();
    tasks.rows.retain(|t| t.id != id);
    if tasks.rows.len() == before {
      return Err(StoreError::NotFound(id));
    }
    debug!(task_id = id, "deleted task");
    Ok(())
  }
}
