use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use docket_shared::{
  Task,
  TaskId
};
use tracing::{
  debug,
  instrument
};

use crate::bulk::{
  BulkAction,
  BulkPlan,
  bulk_apply
};
use crate::filter::{
  Completion,
  FilterState,
  derive_visible
};
use crate::pagination::{
  Pagination,
  paginate
};
use crate::selection::{
  CheckState,
  SelectionSet
};
use crate::view::ViewSession;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
)]
pub enum Layout {
  #[default]
  Table,
  Grid
}

impl FromStr for Layout {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "table" | "list" => Ok(Self::Table),
      | "grid" | "cards" => Ok(Self::Grid),
      | other => {
        Err(anyhow!(
          "unknown layout: {other}"
        ))
      }
    }
  }
}

impl fmt::Display for Layout {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(match self {
      | Layout::Table => "table",
      | Layout::Grid => "grid"
    })
  }
}

/// One page of the visible tasks, ready to
/// render.
#[derive(Debug, Clone)]
pub struct PageView<'a> {
  pub tasks:      Vec<&'a Task>,
  pub page_index: usize,
  pub page_count: usize,
  pub page_size:  usize,
  pub total:      usize,
  pub check:      CheckState
}

impl PageView<'_> {
  pub fn ids(&self) -> Vec<TaskId> {
    self.tasks.iter().map(|t| t.id).collect()
  }

  pub fn shows_controls(&self) -> bool {
    self.total
      > crate::pagination::PAGINATION_CONTROLS_THRESHOLD
  }
}

/// Client-side state behind the task list:
/// the fetched collection, the filters,
/// one pager per layout, the selection and
/// the open detail view.
#[derive(Debug, Clone)]
pub struct TaskListEngine {
  tasks:       Vec<Task>,
  filters:     FilterState,
  layout:      Layout,
  table_pager: Pagination,
  grid_pager:  Pagination,
  selection:   SelectionSet,
  viewing:     Option<ViewSession>
}

impl TaskListEngine {
  pub fn new(page_size: usize) -> Self {
    Self {
      tasks:       vec![],
      filters:     FilterState::default(),
      layout:      Layout::default(),
      table_pager: Pagination::new(page_size),
      grid_pager:  Pagination::new(page_size),
      selection:   SelectionSet::default(),
      viewing:     None
    }
  }

  pub fn tasks(&self) -> &[Task] {
    &self.tasks
  }

  pub fn task(
    &self,
    id: TaskId
  ) -> Option<&Task> {
    self.tasks.iter().find(|t| t.id == id)
  }

  pub fn filters(&self) -> &FilterState {
    &self.filters
  }

  pub fn selection(&self) -> &SelectionSet {
    &self.selection
  }

  pub fn layout(&self) -> Layout {
    self.layout
  }

  pub fn set_layout(
    &mut self,
    layout: Layout
  ) {
    self.layout = layout;
  }

  /// Replaces the collection with a fresh
  /// fetch. Responses may arrive after newer
  /// filter or selection changes; they are
  /// applied on top of the current state.
  #[instrument(skip(self, tasks), fields(count = tasks.len()))]
  pub fn set_tasks(
    &mut self,
    tasks: Vec<Task>
  ) {
    self.tasks = tasks;
    self.recompute();
  }

  pub fn set_search(&mut self, query: &str) {
    self.filters.set_search(query);
    self.recompute();
  }

  pub fn set_status_filter(
    &mut self,
    status: &str
  ) {
    self.filters.set_status(status);
    self.recompute();
  }

  pub fn toggle_completion_filter(
    &mut self,
    mode: Completion
  ) {
    self.filters.toggle_completion(mode);
    self.recompute();
  }

  pub fn set_completion_filter(
    &mut self,
    mode: Completion
  ) {
    self.filters.set_completion(mode);
    self.recompute();
  }

  pub fn visible(&self) -> Vec<&Task> {
    derive_visible(&self.tasks, &self.filters)
  }

  pub fn pagination(
    &self,
    layout: Layout
  ) -> Pagination {
    match layout {
      | Layout::Table => self.table_pager,
      | Layout::Grid => self.grid_pager
    }
  }

  fn pager_mut(&mut self) -> &mut Pagination {
    match self.layout {
      | Layout::Table => {
        &mut self.table_pager
      }
      | Layout::Grid => &mut self.grid_pager
    }
  }

  pub fn current_page(&self) -> PageView<'_> {
    let visible = self.visible();
    let pager = self.pagination(self.layout);
    let page = paginate(
      &visible,
      pager.page_index(),
      pager.page_size()
    );
    let tasks = page.items.to_vec();
    let ids: Vec<TaskId> =
      tasks.iter().map(|t| t.id).collect();

    PageView {
      check: self.selection.page_state(&ids),
      tasks,
      page_index: page.page_index,
      page_count: page.page_count,
      page_size: page.page_size,
      total: page.total
    }
  }

  pub fn next_page(&mut self) {
    let total = self.visible().len();
    self.pager_mut().next(total);
  }

  pub fn previous_page(&mut self) {
    self.pager_mut().previous();
  }

  pub fn go_to_page(
    &mut self,
    page_index: usize
  ) {
    let total = self.visible().len();
    self.pager_mut().go_to(page_index, total);
  }

  pub fn set_page_size(
    &mut self,
    page_size: usize
  ) {
    let total = self.visible().len();
    self
      .pager_mut()
      .set_page_size(page_size, total);
  }

  /// Flips one row. Ids outside the
  /// collection are ignored and reported
  /// as `false`.
  pub fn toggle_select(
    &mut self,
    id: TaskId
  ) -> bool {
    if self.task(id).is_none() {
      debug!(task_id = id, "ignoring selection of unknown task");
      return false;
    }
    self.selection.toggle(id);
    true
  }

  pub fn toggle_select_page(&mut self) {
    let ids = self.current_page().ids();
    self.selection.toggle_page(&ids);
  }

  pub fn bulk_apply(
    &mut self,
    action: BulkAction
  ) -> BulkPlan {
    bulk_apply(
      action,
      &mut self.selection,
      &self.tasks
    )
  }

  /// Opens the detail view of a task and
  /// returns the viewed-flag update, if the
  /// task was new.
  #[instrument(skip(self))]
  pub fn open_task(
    &mut self,
    id: TaskId
  ) -> anyhow::Result<Option<Task>> {
    if self.task(id).is_none() {
      return Err(anyhow!(
        "task {id} not found"
      ));
    }
    self.viewing = Some(ViewSession::open(id));
    Ok(self.mark_viewed())
  }

  /// Safe to call on every redraw of the
  /// open detail view; only the first call
  /// of a session can return an update.
  pub fn mark_viewed(
    &mut self
  ) -> Option<Task> {
    let session = self.viewing.as_mut()?;
    let task = self
      .tasks
      .iter()
      .find(|t| t.id == session.task_id())?;
    session.mark_viewed(task)
  }

  pub fn viewing(&self) -> Option<&Task> {
    self
      .viewing
      .as_ref()
      .and_then(|s| self.task(s.task_id()))
  }

  pub fn close_task(&mut self) {
    self.viewing = None;
  }

  fn recompute(&mut self) {
    let known: HashSet<TaskId> =
      self.tasks.iter().map(|t| t.id).collect();
    self.selection.retain_known(&known);

    if let Some(session) = &self.viewing
      && !known.contains(&session.task_id())
    {
      debug!(task_id = session.task_id(), "closing view of vanished task");
      self.viewing = None;
    }

    let total = self.visible().len();
    self.table_pager.clamp(total);
    self.grid_pager.clamp(total);
  }
}

#[cfg(test)]
mod tests {
  use docket_shared::TaskStatus;

  use super::*;

  fn tasks(count: u64) -> Vec<Task> {
    (1..=count)
      .map(|id| {
        let mut task =
          Task::new(id, format!("task {id}"));
        if id % 3 == 0 {
          task.status = TaskStatus::Done;
        }
        task
      })
      .collect()
  }

  #[test]
  fn pagers_are_independent_per_layout() {
    let mut engine = TaskListEngine::new(5);
    engine.set_tasks(tasks(12));

    engine.next_page();
    engine.next_page();
    assert_eq!(
      engine.current_page().page_index,
      2
    );

    engine.set_layout(Layout::Grid);
    assert_eq!(
      engine.current_page().page_index,
      0
    );
    engine.set_page_size(10);
    assert_eq!(
      engine.current_page().tasks.len(),
      10
    );

    engine.set_layout(Layout::Table);
    assert_eq!(
      engine.current_page().ids(),
      vec![11, 12]
    );
  }

  #[test]
  fn shrinking_filter_clamps_page() {
    let mut engine = TaskListEngine::new(5);
    engine.set_tasks(tasks(12));
    engine.go_to_page(2);

    engine.toggle_completion_filter(
      Completion::Completed
    );
    let page = engine.current_page();
    assert_eq!(page.total, 4);
    assert_eq!(page.page_index, 0);
    assert_eq!(page.ids(), vec![3, 6, 9, 12]);
  }

  #[test]
  fn refresh_prunes_selection_of_deleted_task()
  {
    let mut engine = TaskListEngine::new(10);
    engine.set_tasks(tasks(3));
    assert!(engine.toggle_select(2));
    assert!(engine.toggle_select(3));
    assert!(!engine.toggle_select(99));

    let remaining: Vec<Task> = engine
      .tasks()
      .iter()
      .filter(|t| t.id != 2)
      .cloned()
      .collect();
    engine.set_tasks(remaining);

    assert!(!engine.selection().contains(2));
    assert!(engine.selection().contains(3));
  }

  #[test]
  fn select_page_checks_current_page_only() {
    let mut engine = TaskListEngine::new(5);
    engine.set_tasks(tasks(8));
    engine.toggle_select(1);
    assert_eq!(
      engine.current_page().check,
      CheckState::Indeterminate
    );

    engine.toggle_select_page();
    assert_eq!(
      engine.current_page().check,
      CheckState::Checked
    );
    assert_eq!(engine.selection().len(), 5);

    engine.next_page();
    assert_eq!(
      engine.current_page().check,
      CheckState::Unchecked
    );
  }

  #[test]
  fn bulk_apply_clears_selection() {
    let mut engine = TaskListEngine::new(5);
    engine.set_tasks(tasks(4));
    engine.toggle_select(1);
    engine.toggle_select(4);

    let plan =
      engine.bulk_apply(BulkAction::MarkRead);
    assert_eq!(plan.changes.len(), 2);
    assert!(engine.selection().is_empty());
  }

  #[test]
  fn opening_a_new_task_reports_once() {
    let mut list = tasks(2);
    list[1].is_new = true;
    let mut engine = TaskListEngine::new(5);
    engine.set_tasks(list);

    let update = engine
      .open_task(2)
      .expect("open")
      .expect("new task reports");
    assert!(!update.is_new);
    assert!(engine.mark_viewed().is_none());
    assert!(engine.mark_viewed().is_none());
    assert_eq!(
      engine.viewing().map(|t| t.id),
      Some(2)
    );

    engine.close_task();
    assert!(engine.viewing().is_none());
    assert!(engine.open_task(42).is_err());
  }
}
