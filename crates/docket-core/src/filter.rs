use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use docket_shared::{
  Task,
  TaskStatus
};
use serde_json::Value;
use tracing::trace;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
)]
pub enum Completion {
  #[default]
  All,
  Outstanding,
  Completed
}

impl Completion {
  /// Selecting the active mode again
  /// falls back to `All`.
  pub fn toggled(
    self,
    mode: Completion
  ) -> Completion {
    if self == mode {
      Completion::All
    } else {
      mode
    }
  }

  fn admits(
    self,
    status: &TaskStatus
  ) -> bool {
    match self {
      | Completion::All => true,
      | Completion::Completed => {
        status.is_done()
      }
      | Completion::Outstanding => {
        !status.is_done()
      }
    }
  }
}

impl FromStr for Completion {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "all" | "" => Ok(Self::All),
      | "outstanding" | "open" => {
        Ok(Self::Outstanding)
      }
      | "completed" | "done" => {
        Ok(Self::Completed)
      }
      | other => {
        Err(anyhow!(
          "unknown completion filter: \
           {other}"
        ))
      }
    }
  }
}

impl fmt::Display for Completion {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(match self {
      | Self::All => "all",
      | Self::Outstanding => "outstanding",
      | Self::Completed => "completed"
    })
  }
}

#[derive(Debug, Clone, Default)]
pub struct FilterState {
  query:      String,
  needle:     String,
  status:     Option<TaskStatus>,
  completion: Completion
}

impl FilterState {
  pub fn set_search(
    &mut self,
    query: &str
  ) {
    self.query = query.to_string();
    self.needle = query.to_lowercase();
  }

  /// An empty value or `all` clears the
  /// status filter.
  pub fn set_status(&mut self, raw: &str) {
    let trimmed = raw.trim();
    self.status = if trimmed.is_empty()
      || trimmed
        .eq_ignore_ascii_case("all")
    {
      None
    } else {
      Some(TaskStatus::parse(trimmed))
    };
  }

  pub fn toggle_completion(
    &mut self,
    mode: Completion
  ) {
    self.completion =
      self.completion.toggled(mode);
  }

  pub fn set_completion(
    &mut self,
    mode: Completion
  ) {
    self.completion = mode;
  }

  pub fn query(&self) -> &str {
    &self.query
  }

  pub fn status(
    &self
  ) -> Option<&TaskStatus> {
    self.status.as_ref()
  }

  pub fn completion(&self) -> Completion {
    self.completion
  }

  pub fn is_active(&self) -> bool {
    !self.needle.is_empty()
      || self.status.is_some()
      || self.completion != Completion::All
  }

  pub fn matches(
    &self,
    task: &Task
  ) -> bool {
    if !self.needle.is_empty()
      && !search_fields(task)
        .any(|field| {
          field
            .to_lowercase()
            .contains(&self.needle)
        })
    {
      return false;
    }

    if let Some(status) = &self.status
      && !status
        .label()
        .eq_ignore_ascii_case(
          task.status.label()
        )
    {
      return false;
    }

    self.completion.admits(&task.status)
  }
}

/// Every string-valued field of a task in
/// its transmitted form. Numbers, flags and
/// nested values are not searched.
fn search_fields(
  task: &Task
) -> impl Iterator<Item = &str> {
  let fixed = [
    Some(task.title.as_str()),
    Some(task.description.as_str()),
    task.case_number.as_deref(),
    task.created_at.as_deref(),
    task.updated_at.as_deref(),
    task.due_date.as_deref(),
    task.assignee_name.as_deref(),
    Some(task.status.label()),
    task.priority.map(|p| p.label())
  ];

  fixed.into_iter().flatten().chain(
    task.extra.values().filter_map(
      |value| match value {
        | Value::String(s) => {
          Some(s.as_str())
        }
        | _ => None
      }
    )
  )
}

/// Tasks passing every active predicate,
/// in collection order.
pub fn derive_visible<'a>(
  tasks: &'a [Task],
  filters: &FilterState
) -> Vec<&'a Task> {
  let visible: Vec<&Task> = tasks
    .iter()
    .filter(|task| filters.matches(task))
    .collect();
  trace!(
    total = tasks.len(),
    visible = visible.len(),
    query = %filters.query,
    completion = %filters.completion,
    "derived visible tasks"
  );
  visible
}
