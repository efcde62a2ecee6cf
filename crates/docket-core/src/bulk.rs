use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use docket_shared::{
  Task,
  TaskId,
  TaskStatus
};
use tracing::info;

use crate::selection::SelectionSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
  Delete,
  MarkCompleted,
  MarkOutstanding,
  MarkRead,
  MarkUnread
}

impl BulkAction {
  pub const ALL: [BulkAction; 5] = [
    BulkAction::Delete,
    BulkAction::MarkCompleted,
    BulkAction::MarkOutstanding,
    BulkAction::MarkRead,
    BulkAction::MarkUnread
  ];

  pub fn name(self) -> &'static str {
    match self {
      | Self::Delete => "delete",
      | Self::MarkCompleted => "completed",
      | Self::MarkOutstanding => {
        "outstanding"
      }
      | Self::MarkRead => "read",
      | Self::MarkUnread => "unread"
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      | Self::Delete => "Delete Selected",
      | Self::MarkCompleted => {
        "Mark as Completed"
      }
      | Self::MarkOutstanding => {
        "Mark as Outstanding"
      }
      | Self::MarkRead => "Mark as Read",
      | Self::MarkUnread => {
        "Unmark as Read"
      }
    }
  }

  fn apply(
    self,
    task: &Task
  ) -> BulkChange {
    let mut updated = task.clone();
    match self {
      | Self::Delete => {
        return BulkChange::Remove(task.id);
      }
      | Self::MarkCompleted => {
        updated.status = TaskStatus::Done;
      }
      | Self::MarkOutstanding => {
        updated.status =
          TaskStatus::InProgress;
      }
      | Self::MarkRead => {
        updated.is_new = false;
      }
      | Self::MarkUnread => {
        updated.is_new = true;
      }
    }
    BulkChange::Update(updated)
  }
}

impl FromStr for BulkAction {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    let key = s
      .trim()
      .to_ascii_lowercase()
      .replace(['_', ' '], "-");
    match key.as_str() {
      | "delete" => Ok(Self::Delete),
      | "completed" | "mark-completed"
      | "markascompleted" | "done" => {
        Ok(Self::MarkCompleted)
      }
      | "outstanding"
      | "mark-outstanding"
      | "markasoutstanding" => {
        Ok(Self::MarkOutstanding)
      }
      | "read" | "mark-read"
      | "markasread" => Ok(Self::MarkRead),
      | "unread" | "mark-unread"
      | "unmarkasread" => {
        Ok(Self::MarkUnread)
      }
      | other => {
        Err(anyhow!(
          "unknown bulk action: {other}"
        ))
      }
    }
  }
}

impl fmt::Display for BulkAction {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.name())
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BulkChange {
  Update(Task),
  Remove(TaskId)
}

impl BulkChange {
  pub fn task_id(&self) -> TaskId {
    match self {
      | BulkChange::Update(task) => task.id,
      | BulkChange::Remove(id) => *id
    }
  }
}

/// Changes produced by one bulk gesture,
/// in collection order. Persisting them is
/// the caller's job.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkPlan {
  pub action:  BulkAction,
  pub changes: Vec<BulkChange>
}

impl BulkPlan {
  pub fn is_empty(&self) -> bool {
    self.changes.is_empty()
  }
}

/// Builds the change list for every
/// selected task still present in `tasks`
/// and empties the selection.
#[tracing::instrument(skip(selection, tasks), fields(selected = selection.len()))]
pub fn bulk_apply(
  action: BulkAction,
  selection: &mut SelectionSet,
  tasks: &[Task]
) -> BulkPlan {
  let changes: Vec<BulkChange> = tasks
    .iter()
    .filter(|task| {
      selection.contains(task.id)
    })
    .map(|task| action.apply(task))
    .collect();

  selection.clear();

  info!(
    action = %action,
    changes = changes.len(),
    "planned bulk action"
  );

  BulkPlan {
    action,
    changes
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample() -> Vec<Task> {
    let mut first = Task::new(1, "one");
    first.is_new = true;
    let mut second = Task::new(2, "two");
    second.status = TaskStatus::Done;
    let third = Task::new(3, "three");
    vec![first, second, third]
  }

  #[test]
  fn mark_completed_updates_only_selected()
  {
    let tasks = sample();
    let mut selection =
      SelectionSet::default();
    selection.toggle(3);
    selection.toggle(1);
    selection.toggle(42);

    let plan = bulk_apply(
      BulkAction::MarkCompleted,
      &mut selection,
      &tasks
    );

    assert!(selection.is_empty());
    let ids: Vec<TaskId> = plan
      .changes
      .iter()
      .map(BulkChange::task_id)
      .collect();
    assert_eq!(ids, vec![1, 3]);
    for change in &plan.changes {
      let BulkChange::Update(task) = change
      else {
        panic!("expected update");
      };
      assert_eq!(
        task.status,
        TaskStatus::Done
      );
    }
  }

  #[test]
  fn each_action_produces_expected_change()
  {
    let tasks = sample();
    let expectations = [
      (BulkAction::Delete, None),
      (
        BulkAction::MarkOutstanding,
        Some((TaskStatus::InProgress, true))
      ),
      (
        BulkAction::MarkRead,
        Some((TaskStatus::Due, false))
      ),
      (
        BulkAction::MarkUnread,
        Some((TaskStatus::Due, true))
      )
    ];

    for (action, expected) in expectations {
      let mut selection =
        SelectionSet::default();
      selection.toggle(1);
      let plan = bulk_apply(
        action,
        &mut selection,
        &tasks
      );
      match (&plan.changes[..], expected) {
        | (
          [BulkChange::Remove(1)],
          None
        ) => {}
        | (
          [BulkChange::Update(task)],
          Some((status, is_new))
        ) => {
          assert_eq!(task.status, status);
          assert_eq!(task.is_new, is_new);
        }
        | (changes, _) => {
          panic!(
            "{action}: unexpected {changes:?}"
          )
        }
      }
    }
  }

  #[test]
  fn parses_ui_and_cli_spellings() {
    assert_eq!(
      "markAsRead"
        .parse::<BulkAction>()
        .expect("parse"),
      BulkAction::MarkRead
    );
    assert_eq!(
      "mark_completed"
        .parse::<BulkAction>()
        .expect("parse"),
      BulkAction::MarkCompleted
    );
    assert!(
      "archive"
        .parse::<BulkAction>()
        .is_err()
    );
  }
}
