use std::fmt;

use anyhow::Context;
use chrono::Utc;
use chrono_tz::Tz;
use docket_shared::{
  Case,
  Employee,
  Matter,
  Task,
  TaskDraft,
  TaskId
};
use futures::future::join_all;
use thiserror::Error;
use tracing::{
  info,
  instrument,
  warn
};

use crate::bulk::{
  BulkAction,
  BulkChange
};
use crate::cache::{
  QueryCache,
  Resource
};
use crate::datetime::to_wire;
use crate::engine::TaskListEngine;
use crate::source::{
  DataSource,
  SourceError
};
use crate::validate::{
  FormKind,
  TaskForm,
  ValidationErrors
};

#[derive(Debug, Error)]
pub enum BoardError {
  #[error(transparent)]
  Validation(#[from] ValidationErrors),
  #[error(transparent)]
  Source(#[from] SourceError),
  #[error("task {0} not found")]
  UnknownTask(TaskId),
  #[error(
    "{failed} of {total} {action} \
     requests failed"
  )]
  PartialBulk {
    action: BulkAction,
    failed: usize,
    total:  usize,
    errors: Vec<SourceError>
  }
}

/// Read-only lists used to resolve the
/// foreign keys on a task.
#[derive(Debug, Clone, Default)]
pub struct References {
  pub cases:     Vec<Case>,
  pub matters:   Vec<Matter>,
  pub employees: Vec<Employee>
}

impl References {
  pub fn case(&self, id: u64) -> Option<&Case> {
    self.cases.iter().find(|c| c.id == id)
  }

  pub fn matter(
    &self,
    id: u64
  ) -> Option<&Matter> {
    self.matters.iter().find(|m| m.id == id)
  }

  pub fn employee(
    &self,
    id: u64
  ) -> Option<&Employee> {
    self.employees.iter().find(|e| e.id == id)
  }

  fn fill_names(&self, draft: &mut TaskDraft) {
    draft.assignee_name = self
      .employee(draft.assigned_to)
      .map(|e| e.full_name.clone());
    draft.case_number = self
      .case(draft.case_id)
      .map(|c| c.case_number.clone());
  }
}

/// A task with its references resolved,
/// as shown by the detail view.
#[derive(Debug, Clone)]
pub struct TaskDetail {
  pub task:     Task,
  pub case:     Option<Case>,
  pub matter:   Option<Matter>,
  pub assignee: Option<Employee>
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
  Success,
  Error
}

/// Outcome of one user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
  pub kind:    NoticeKind,
  pub title:   String,
  pub message: String
}

impl Notice {
  pub fn success(
    title: impl Into<String>,
    message: impl Into<String>
  ) -> Self {
    Self {
      kind:    NoticeKind::Success,
      title:   title.into(),
      message: message.into()
    }
  }

  pub fn failure(
    title: impl Into<String>,
    err: &anyhow::Error
  ) -> Self {
    Self {
      kind:    NoticeKind::Error,
      title:   title.into(),
      message: format!("{err:#}")
    }
  }

}

impl fmt::Display for Notice {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(f, "{}: {}", self.title, self.message)
  }
}

/// Drives the engine against a data
/// source. Mutations go straight to the
/// source; the affected cache entry is
/// invalidated and refetched only after
/// the source reports success.
#[derive(Debug)]
pub struct TaskBoard<S> {
  source: S,
  cache:  QueryCache,
  engine: TaskListEngine,
  tz:     Tz
}

impl<S: DataSource> TaskBoard<S> {
  pub fn new(
    source: S,
    cache: QueryCache,
    engine: TaskListEngine,
    tz: Tz
  ) -> Self {
    Self {
      source,
      cache,
      engine,
      tz
    }
  }

  pub fn engine(&self) -> &TaskListEngine {
    &self.engine
  }

  pub fn engine_mut(
    &mut self
  ) -> &mut TaskListEngine {
    &mut self.engine
  }

  pub fn source(&self) -> &S {
    &self.source
  }

  pub fn timezone(&self) -> &Tz {
    &self.tz
  }

  /// Loads the task collection through the
  /// cache and hands it to the engine.
  /// Returns the number of tasks.
  #[instrument(skip(self))]
  pub async fn refresh(
    &mut self
  ) -> anyhow::Result<usize> {
    let source = &self.source;
    let tasks: Vec<Task> = self
      .cache
      .fetch(Resource::Tasks, || async {
        source
          .list_tasks()
          .await
          .context("failed to load tasks")
      })
      .await?;
    let count = tasks.len();
    self.engine.set_tasks(tasks);
    Ok(count)
  }

  #[instrument(skip(self))]
  pub async fn references(
    &mut self
  ) -> anyhow::Result<References> {
    let source = &self.source;
    let cases: Vec<Case> = self
      .cache
      .fetch(Resource::Cases, || async {
        source
          .list_cases()
          .await
          .context("failed to load cases")
      })
      .await?;
    let matters: Vec<Matter> = self
      .cache
      .fetch(Resource::Matters, || async {
        source
          .list_matters()
          .await
          .context("failed to load matters")
      })
      .await?;
    let employees: Vec<Employee> = self
      .cache
      .fetch(Resource::Employees, || async {
        source
          .list_employees()
          .await
          .context(
            "failed to load employees"
          )
      })
      .await?;

    Ok(References {
      cases,
      matters,
      employees
    })
  }

  /// Drops the cached task collection and
  /// loads it again.
  pub async fn reload_tasks(
    &mut self
  ) -> anyhow::Result<()> {
    self.cache.invalidate(Resource::Tasks);
    self.refresh().await.map(|_| ())
  }

  #[instrument(skip(self, form), fields(title = %form.title))]
  pub async fn create(
    &mut self,
    form: &TaskForm
  ) -> anyhow::Result<Task> {
    let mut draft = form
      .validate(
        FormKind::Create,
        Utc::now(),
        &self.tz
      )
      .map_err(BoardError::from)?;
    let refs = self.references().await?;
    refs.fill_names(&mut draft);

    let created = self
      .source
      .create_task(&draft)
      .await
      .map_err(BoardError::from)?;
    info!(task_id = created.id, "created task");

    self.reload_tasks().await?;
    Ok(created)
  }

  /// Validates `form` against the edit
  /// rules and writes it over the stored
  /// task. Fields the form does not carry
  /// are kept.
  #[instrument(skip(self, form))]
  pub async fn update(
    &mut self,
    id: TaskId,
    form: &TaskForm
  ) -> anyhow::Result<Task> {
    let current = self
      .engine
      .task(id)
      .cloned()
      .ok_or(BoardError::UnknownTask(id))?;
    let mut draft = form
      .validate(
        FormKind::Edit,
        Utc::now(),
        &self.tz
      )
      .map_err(BoardError::from)?;
    let refs = self.references().await?;
    refs.fill_names(&mut draft);

    let merged = merge_draft(current, draft);
    let updated = self
      .source
      .update_task(&merged)
      .await
      .map_err(BoardError::from)?;
    info!(task_id = id, "updated task");

    self.reload_tasks().await?;
    Ok(updated)
  }

  #[instrument(skip(self))]
  pub async fn delete(
    &mut self,
    id: TaskId
  ) -> anyhow::Result<()> {
    self
      .source
      .delete_task(id)
      .await
      .map_err(BoardError::from)?;
    info!(task_id = id, "deleted task");
    self.reload_tasks().await
  }

  /// Applies `action` to the selection and
  /// persists every change concurrently.
  /// Nothing is rolled back when some
  /// requests fail, and the cache is only
  /// invalidated when all succeed. Returns
  /// the number of tasks changed.
  #[instrument(skip(self))]
  pub async fn bulk(
    &mut self,
    action: BulkAction
  ) -> anyhow::Result<usize> {
    let plan = self.engine.bulk_apply(action);
    if plan.is_empty() {
      return Ok(0);
    }

    let source = &self.source;
    let results =
      join_all(plan.changes.iter().map(
        |change| async move {
          match change {
            | BulkChange::Update(task) => {
              source
                .update_task(task)
                .await
                .map(|_| ())
            }
            | BulkChange::Remove(id) => {
              source.delete_task(*id).await
            }
          }
        }
      ))
      .await;

    let total = results.len();
    let errors: Vec<SourceError> = results
      .into_iter()
      .filter_map(Result::err)
      .collect();

    if !errors.is_empty() {
      warn!(
        action = %action,
        failed = errors.len(),
        total,
        "bulk action partially failed"
      );
      return Err(
        BoardError::PartialBulk {
          action,
          failed: errors.len(),
          total,
          errors
        }
        .into()
      );
    }

    info!(action = %action, total, "bulk action applied");
    self.reload_tasks().await?;
    Ok(total)
  }

  /// Opens the detail of a task. A new task
  /// is reported as viewed once; a failed
  /// report or reload is logged and the
  /// detail is still returned.
  #[instrument(skip(self))]
  pub async fn open(
    &mut self,
    id: TaskId
  ) -> anyhow::Result<TaskDetail> {
    if let Some(update) =
      self.engine.open_task(id)?
    {
      match self.source.update_task(&update).await
      {
        | Ok(_) => {
          if let Err(err) =
            self.reload_tasks().await
          {
            warn!(task_id = id, error = %err, "failed to reload after marking task as viewed");
          }
        }
        | Err(err) => {
          warn!(task_id = id, error = %err, "failed to mark task as viewed");
        }
      }
    }

    let task = self
      .engine
      .viewing()
      .cloned()
      .ok_or(BoardError::UnknownTask(id))?;
    let refs = self.references().await?;

    let case = task
      .case_id
      .and_then(|cid| refs.case(cid))
      .cloned();
    let matter = task
      .matter
      .and_then(|mid| refs.matter(mid))
      .cloned();
    let assignee = task
      .assigned_to
      .and_then(|eid| refs.employee(eid))
      .cloned();

    Ok(TaskDetail {
      task,
      case,
      matter,
      assignee
    })
  }

  pub fn close(&mut self) {
    self.engine.close_task();
  }
}

fn merge_draft(
  mut task: Task,
  draft: TaskDraft
) -> Task {
  task.title = draft.title;
  task.description = draft.description;
  task.status = draft.status;
  task.priority = Some(draft.priority);
  task.due_date = Some(draft.due_date);
  task.assigned_to = Some(draft.assigned_to);
  if draft.assignee_name.is_some() {
    task.assignee_name = draft.assignee_name;
  }
  task.case_id = Some(draft.case_id);
  if draft.case_number.is_some() {
    task.case_number = draft.case_number;
  }
  task.matter = draft.matter;
  task.updated_at = Some(to_wire(Utc::now()));
  task
}
