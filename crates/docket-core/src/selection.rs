use std::collections::{
  BTreeSet,
  HashSet
};

use docket_shared::TaskId;
use tracing::debug;

/// Check-box state of a "select all"
/// control. `Indeterminate` is only a
/// rendering hint; toggling treats it like
/// `Unchecked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
  Unchecked,
  Indeterminate,
  Checked
}

impl CheckState {
  pub fn marker(self) -> &'static str {
    match self {
      | CheckState::Unchecked => "[ ]",
      | CheckState::Indeterminate => "[-]",
      | CheckState::Checked => "[x]"
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
  ids: BTreeSet<TaskId>
}

impl SelectionSet {
  pub fn contains(&self, id: TaskId) -> bool {
    self.ids.contains(&id)
  }

  pub fn len(&self) -> usize {
    self.ids.len()
  }

  pub fn is_empty(&self) -> bool {
    self.ids.is_empty()
  }

  pub fn ids(
    &self
  ) -> impl Iterator<Item = TaskId> + '_ {
    self.ids.iter().copied()
  }

  pub fn toggle(&mut self, id: TaskId) {
    if !self.ids.remove(&id) {
      self.ids.insert(id);
    }
  }

  pub fn clear(&mut self) {
    self.ids.clear();
  }

  /// Deselects the whole page when every
  /// row on it is selected, selects the
  /// whole page otherwise.
  pub fn toggle_page(
    &mut self,
    page_ids: &[TaskId]
  ) {
    if page_ids.is_empty() {
      return;
    }

    if page_ids
      .iter()
      .all(|id| self.ids.contains(id))
    {
      for id in page_ids {
        self.ids.remove(id);
      }
    } else {
      self.ids.extend(page_ids.iter().copied());
    }
  }

  pub fn page_state(
    &self,
    page_ids: &[TaskId]
  ) -> CheckState {
    let selected = page_ids
      .iter()
      .filter(|id| self.ids.contains(id))
      .count();

    if selected == 0 {
      CheckState::Unchecked
    } else if selected == page_ids.len() {
      CheckState::Checked
    } else {
      CheckState::Indeterminate
    }
  }

  /// Drops ids that are no longer in the
  /// collection. Returns how many were
  /// dropped.
  pub fn retain_known(
    &mut self,
    known: &HashSet<TaskId>
  ) -> usize {
    let before = self.ids.len();
    self.ids.retain(|id| known.contains(id));
    let pruned = before - self.ids.len();
    if pruned > 0 {
      debug!(
        pruned,
        remaining = self.ids.len(),
        "pruned selection entries for vanished tasks"
      );
    }
    pruned
  }
}
