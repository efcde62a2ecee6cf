use std::fmt;

use chrono::{
  DateTime,
  Utc
};
use chrono_tz::Tz;
use docket_shared::{
  Case,
  Matter,
  Priority,
  Task,
  TaskDraft,
  TaskStatus
};
use thiserror::Error;

use crate::datetime::parse_due_input;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
  Create,
  Edit
}

impl FormKind {
  fn title_len(self) -> (usize, usize) {
    match self {
      | FormKind::Create => (2, 50),
      | FormKind::Edit => (2, 100)
    }
  }

  fn description_len(
    self
  ) -> (usize, usize) {
    match self {
      | FormKind::Create => (2, 300),
      | FormKind::Edit => (2, 500)
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
  pub field:   &'static str,
  pub message: String
}

impl fmt::Display for FieldError {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(f, "{}: {}", self.field, self.message)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid task: {}", summarize(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
  pub fn fields(&self) -> Vec<&'static str> {
    self.0.iter().map(|e| e.field).collect()
  }

  pub fn message_for(
    &self,
    field: &str
  ) -> Option<&str> {
    self
      .0
      .iter()
      .find(|e| e.field == field)
      .map(|e| e.message.as_str())
  }
}

fn summarize(errors: &[FieldError]) -> String {
  errors
    .iter()
    .map(ToString::to_string)
    .collect::<Vec<_>>()
    .join("; ")
}

/// Raw form input, as typed. Every field is
/// a string so partially filled forms can
/// be held and re-validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskForm {
  pub title:       String,
  pub description: String,
  pub assigned_to: String,
  pub status:      String,
  pub due_date:    String,
  pub priority:    String,
  pub case_id:     String,
  pub matter:      String
}

impl TaskForm {
  /// Prefills an edit form from a stored
  /// task.
  pub fn from_task(task: &Task) -> Self {
    let id = |v: Option<u64>| {
      v.map(|n| n.to_string())
        .unwrap_or_default()
    };
    Self {
      title:       task.title.clone(),
      description: task.description.clone(),
      assigned_to: id(task.assigned_to),
      status:      task.status.label().to_string(),
      due_date:    task
        .due_date
        .clone()
        .unwrap_or_default(),
      priority:    task
        .priority
        .map(|p| p.label().to_string())
        .unwrap_or_default(),
      case_id:     id(task.case_id),
      matter:      id(task.matter)
    }
  }

  /// Sets the case and fills the matter from
  /// that case. The matter is cleared when
  /// the case has none or it is not a known
  /// matter.
  pub fn select_case(
    &mut self,
    case_id: &str,
    cases: &[Case],
    matters: &[Matter]
  ) {
    self.case_id = case_id.trim().to_string();

    let matter = self
      .case_id
      .parse::<u64>()
      .ok()
      .and_then(|id| {
        cases.iter().find(|c| c.id == id)
      })
      .and_then(|case| case.matter)
      .filter(|id| {
        matters.iter().any(|m| m.id == *id)
      });

    self.matter = matter
      .map(|id| id.to_string())
      .unwrap_or_default();
  }

  /// Applies the shape rules for `kind` and
  /// returns the request body. Display
  /// names are left for the caller to
  /// resolve.
  pub fn validate(
    &self,
    kind: FormKind,
    now: DateTime<Utc>,
    tz: &Tz
  ) -> Result<TaskDraft, ValidationErrors> {
    let mut errors = Vec::new();
    let mut fail = |field: &'static str, message: String| {
      errors.push(FieldError {
        field,
        message
      });
    };

    let title = self.title.trim();
    if let Some(msg) =
      check_length(title, kind.title_len())
    {
      fail("title", msg);
    }

    let description = self.description.trim();
    if let Some(msg) = check_length(
      description,
      kind.description_len()
    ) {
      fail("description", msg);
    }

    let assigned_to = match required_id(
      &self.assigned_to,
      "an employee"
    ) {
      | Ok(id) => Some(id),
      | Err(msg) => {
        fail("assigned_to", msg);
        None
      }
    };

    let status = if self.status.trim().is_empty()
    {
      fail(
        "status",
        "status is required".to_string()
      );
      None
    } else {
      Some(TaskStatus::parse(&self.status))
    };

    let due_date = if self
      .due_date
      .trim()
      .is_empty()
    {
      fail(
        "due_date",
        "due date is required".to_string()
      );
      None
    } else {
      match parse_due_input(
        &self.due_date,
        now,
        tz
      ) {
        | Ok(wire) => Some(wire),
        | Err(err) => {
          fail(
            "due_date",
            format!(
              "expected YYYY-MM-DD or an \
               RFC 3339 timestamp ({err})"
            )
          );
          None
        }
      }
    };

    let priority = if self
      .priority
      .trim()
      .is_empty()
    {
      fail(
        "priority",
        "priority is required".to_string()
      );
      None
    } else {
      match self.priority.parse::<Priority>()
      {
        | Ok(p) => Some(p),
        | Err(_) => {
          fail(
            "priority",
            "expected High, Medium or Low"
              .to_string()
          );
          None
        }
      }
    };

    let case_id = match required_id(
      &self.case_id,
      "a case"
    ) {
      | Ok(id) => Some(id),
      | Err(msg) => {
        fail("case_id", msg);
        None
      }
    };

    let matter = if self.matter.trim().is_empty()
    {
      if kind == FormKind::Edit
        && case_id.is_some()
      {
        fail(
          "matter",
          "matter is required when a case \
           is chosen"
            .to_string()
        );
      }
      None
    } else {
      match self.matter.trim().parse::<u64>() {
        | Ok(id) => Some(id),
        | Err(_) => {
          fail(
            "matter",
            "expected a matter id"
              .to_string()
          );
          None
        }
      }
    };

    match (
      assigned_to,
      status,
      due_date,
      priority,
      case_id
    ) {
      | (
        Some(assigned_to),
        Some(status),
        Some(due_date),
        Some(priority),
        Some(case_id)
      ) if errors.is_empty() => {
        Ok(TaskDraft {
          title: title.to_string(),
          description: description
            .to_string(),
          status,
          priority,
          due_date,
          assigned_to,
          assignee_name: None,
          case_id,
          case_number: None,
          matter
        })
      }
      | _ => Err(ValidationErrors(errors))
    }
  }
}

fn check_length(
  value: &str,
  (min, max): (usize, usize)
) -> Option<String> {
  let len = value.chars().count();
  if len == 0 {
    Some("required".to_string())
  } else if len < min {
    Some(format!(
      "must be at least {min} characters"
    ))
  } else if len > max {
    Some(format!(
      "must be at most {max} characters"
    ))
  } else {
    None
  }
}

fn required_id(
  raw: &str,
  what: &str
) -> Result<u64, String> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return Err(format!("choose {what}"));
  }
  trimmed.parse::<u64>().map_err(|_| {
    format!("expected {what} id, got {trimmed}")
  })
}
