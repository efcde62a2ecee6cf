#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use docket_core::board::TaskBoard;
use docket_core::cache::QueryCache;
use docket_core::engine::TaskListEngine;
use docket_core::source::{DataSource, SourceError};
use docket_shared::{Case, Employee, Matter, Task, TaskDraft, TaskId, TaskStatus};

/// The nine sample tasks the mock server starts with.
pub fn sample_tasks() -> Vec<Task> {
    let rows = [
        (1, "Prepare Report", "Compile the monthly financial report.", "Alice Smith", "In Progress", true),
        (2, "Client Meeting", "Meet with client to discuss project scope.", "Bob Johnson", "Due", false),
        (3, "Review Contract", "Review the new vendor contract for approval.", "Charlie Lee", "Done", false),
        (4, "Draft Proposal", "Draft the initial project proposal.", "Dana White", "Due", true),
        (5, "Legal Review", "Conduct legal review of documents.", "Eve Black", "In Progress", false),
        (6, "Team Meeting", "Weekly team sync-up.", "Frank Green", "Done", false),
        (7, "Budget Planning", "Plan the budget for Q3.", "Grace Hopper", "Over Due", true),
        (8, "Client Feedback", "Collect feedback from client.", "Henry Ford", "Due", false),
        (9, "Test New Badge", "This task should show a New badge until viewed.", "Test User", "Due", true),
    ];

    rows.into_iter()
        .map(|(id, title, description, assignee, status, is_new)| {
            let mut task = Task::new(id, title);
            task.description = description.to_string();
            task.case_number = Some(format!("CASE-{id:03}"));
            task.created_at = Some(format!("2024-06-0{id}T10:00:00Z"));
            task.due_date = Some(format!("2024-06-{}T16:00:00Z", 9 + 2 * id));
            task.assignee_name = Some(assignee.to_string());
            task.status = TaskStatus::parse(status);
            task.is_new = is_new;
            task
        })
        .collect()
}

pub fn sample_cases() -> Vec<Case> {
    vec![
        Case {
            id: 1,
            case_number: "CASE-001".into(),
            coming_up: "Hearing on 2024-06-20".into(),
            opened: "2024-05-01T09:00:00Z".into(),
            last_updated: "2024-06-05T10:00:00Z".into(),
            lawyer: "Alice Smith".into(),
            client: "Acme Corp".into(),
            matter: Some(1),
            case_documents: 3,
        },
        Case {
            id: 2,
            case_number: "CASE-002".into(),
            coming_up: "Filing Deadline 2024-06-18".into(),
            opened: "2024-05-10T11:30:00Z".into(),
            last_updated: "2024-06-07T14:00:00Z".into(),
            lawyer: "Bob Johnson".into(),
            client: "Beta LLC".into(),
            matter: Some(2),
            case_documents: 5,
        },
    ]
}

/// In-memory data source. Requests touching an id registered with
/// [`MemorySource::fail_on`] answer with a 500.
pub struct MemorySource {
    tasks: RefCell<Vec<Task>>,
    next_id: Cell<TaskId>,
    failing: RefCell<HashSet<TaskId>>,
    list_calls: Cell<usize>,
    lists_fail: Cell<bool>,
    pub cases: Vec<Case>,
    pub matters: Vec<Matter>,
    pub employees: Vec<Employee>,
}

impl MemorySource {
    pub fn new(tasks: Vec<Task>) -> Self {
        let next_id = tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        Self {
            tasks: RefCell::new(tasks),
            next_id: Cell::new(next_id),
            failing: RefCell::new(HashSet::new()),
            list_calls: Cell::new(0),
            lists_fail: Cell::new(false),
            cases: sample_cases(),
            matters: vec![
                Matter { id: 1, title: "Matter 1".into() },
                Matter { id: 2, title: "Matter 2".into() },
            ],
            employees: vec![
                Employee { id: 1, full_name: "Alice Smith".into() },
                Employee { id: 2, full_name: "Bob Johnson".into() },
            ],
        }
    }

    pub fn seeded() -> Self {
        Self::new(sample_tasks())
    }

    pub fn fail_on(&self, id: TaskId) {
        self.failing.borrow_mut().insert(id);
    }

    /// Every later task listing answers with a 503.
    pub fn fail_lists(&self) {
        self.lists_fail.set(true);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.get()
    }

    pub fn stored(&self, id: TaskId) -> Option<Task> {
        self.tasks.borrow().iter().find(|t| t.id == id).cloned()
    }

    pub fn remove_behind_the_back(&self, id: TaskId) {
        self.tasks.borrow_mut().retain(|t| t.id != id);
    }

    fn check(&self, method: &'static str, id: TaskId) -> Result<(), SourceError> {
        if self.failing.borrow().contains(&id) {
            return Err(SourceError::UnexpectedStatus {
                method,
                url: format!("memory://tasks/{id}"),
                status: 500,
            });
        }
        Ok(())
    }
}

impl DataSource for MemorySource {
    async fn list_tasks(&self) -> Result<Vec<Task>, SourceError> {
        self.list_calls.set(self.list_calls.get() + 1);
        if self.lists_fail.get() {
            return Err(SourceError::UnexpectedStatus {
                method: "GET",
                url: "memory://tasks/".to_string(),
                status: 503,
            });
        }
        Ok(self.tasks.borrow().clone())
    }

    async fn create_task(&self, draft: &TaskDraft) -> Result<Task, SourceError> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let mut task = Task::new(id, draft.title.clone());
        task.description = draft.description.clone();
        task.status = draft.status.clone();
        task.priority = Some(draft.priority);
        task.due_date = Some(draft.due_date.clone());
        task.assigned_to = Some(draft.assigned_to);
        task.assignee_name = draft.assignee_name.clone();
        task.case_id = Some(draft.case_id);
        task.case_number = draft.case_number.clone();
        task.matter = draft.matter;
        task.is_new = true;

        self.tasks.borrow_mut().push(task.clone());
        Ok(task)
    }

    async fn update_task(&self, task: &Task) -> Result<Task, SourceError> {
        self.check("PUT", task.id)?;
        let mut tasks = self.tasks.borrow_mut();
        let slot = tasks
            .iter_mut()
            .find(|t| t.id == task.id)
            .ok_or(SourceError::NotFound(task.id))?;
        *slot = task.clone();
        Ok(task.clone())
    }

    async fn delete_task(&self, id: TaskId) -> Result<(), SourceError> {
        self.check("DELETE", id)?;
        let mut tasks = self.tasks.borrow_mut();
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            return Err(SourceError::NotFound(id));
        }
        Ok(())
    }

    async fn list_cases(&self) -> Result<Vec<Case>, SourceError> {
        Ok(self.cases.clone())
    }

    async fn list_matters(&self) -> Result<Vec<Matter>, SourceError> {
        Ok(self.matters.clone())
    }

    async fn list_employees(&self) -> Result<Vec<Employee>, SourceError> {
        Ok(self.employees.clone())
    }
}

pub fn board(source: MemorySource, page_size: usize) -> TaskBoard<MemorySource> {
    TaskBoard::new(
        source,
        QueryCache::new(0),
        TaskListEngine::new(page_size),
        chrono_tz::UTC,
    )
}
