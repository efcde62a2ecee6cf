use std::collections::HashSet;

use docket_shared::{
  Task,
  TaskId
};
use tracing::debug;
use uuid::Uuid;

/// Lifetime of one opened task detail.
/// Remembers which tasks were already
/// reported as viewed so repeated renders
/// never repeat the update.
#[derive(Debug, Clone)]
pub struct ViewSession {
  id:       Uuid,
  task_id:  TaskId,
  reported: HashSet<TaskId>
}

impl ViewSession {
  pub fn open(task_id: TaskId) -> Self {
    let session = Self {
      id: Uuid::new_v4(),
      task_id,
      reported: HashSet::new()
    };
    debug!(session = %session.id, task_id, "opened view session");
    session
  }

  pub fn task_id(&self) -> TaskId {
    self.task_id
  }

  /// Returns the update clearing the
  /// `is_new` flag the first time a new
  /// task is seen in this session, `None`
  /// afterwards or when the task is not
  /// new.
  pub fn mark_viewed(
    &mut self,
    task: &Task
  ) -> Option<Task> {
    if !task.is_new
      || !self.reported.insert(task.id)
    {
      return None;
    }

    debug!(session = %self.id, task_id = task.id, "reporting task as viewed");
    let mut updated = task.clone();
    updated.is_new = false;
    Some(updated)
  }
}
