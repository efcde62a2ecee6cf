use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{
  Deserialize,
  Deserializer,
  Serialize
};
use serde_json::Value;

pub type TaskId = u64;

/// Canonical task status. Every status
/// string entering the system goes
/// through [`TaskStatus::parse`], so the
/// mixed vocabularies of older clients
/// (`over_due`, `completed`, ...) collapse
/// onto one enumeration.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
  #[default]
  Due,
  InProgress,
  Done,
  OverDue,
  Other(String)
}

impl TaskStatus {
  pub fn parse(raw: &str) -> Self {
    let key = raw
      .trim()
      .to_lowercase()
      .replace(['_', '-'], " ");
    let key = key
      .split_whitespace()
      .collect::<Vec<_>>()
      .join(" ");

    match key.as_str() {
      | "due" | "pending" => Self::Due,
      | "in progress" => {
        Self::InProgress
      }
      | "done" | "completed"
      | "complete" => Self::Done,
      | "over due" | "overdue" => {
        Self::OverDue
      }
      | _ => {
        Self::Other(raw.trim().to_string())
      }
    }
  }

  pub fn label(&self) -> &str {
    match self {
      | Self::Due => "Due",
      | Self::InProgress => "In Progress",
      | Self::Done => "Done",
      | Self::OverDue => "Over Due",
      | Self::Other(raw) => raw.as_str()
    }
  }

  pub fn is_done(&self) -> bool {
    matches!(self, Self::Done)
  }
}

impl From<String> for TaskStatus {
  fn from(raw: String) -> Self {
    Self::parse(&raw)
  }
}

impl From<&str> for TaskStatus {
  fn from(raw: &str) -> Self {
    Self::parse(raw)
  }
}

impl From<TaskStatus> for String {
  fn from(status: TaskStatus) -> Self {
    status.label().to_string()
  }
}

impl fmt::Display for TaskStatus {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.label())
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
)]
pub enum Priority {
  #[serde(alias = "high")]
  High,
  #[serde(alias = "medium")]
  Medium,
  #[serde(alias = "low")]
  Low
}

impl Priority {
  pub fn label(self) -> &'static str {
    match self {
      | Self::High => "High",
      | Self::Medium => "Medium",
      | Self::Low => "Low"
    }
  }
}

impl FromStr for Priority {
  type Err = String;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "high" => Ok(Self::High),
      | "medium" => Ok(Self::Medium),
      | "low" => Ok(Self::Low),
      | other => {
        Err(format!(
          "unknown priority: {other}"
        ))
      }
    }
  }
}

impl fmt::Display for Priority {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.label())
  }
}

fn lenient_priority<'de, D>(
  deserializer: D
) -> Result<Option<Priority>, D::Error>
where
  D: Deserializer<'de>
{
  let raw = Option::<String>::deserialize(
    deserializer
  )?;
  Ok(
    raw
      .as_deref()
      .and_then(|v| v.parse().ok())
  )
}

/// Reference ids arrive as numbers or, from
/// form posts, as strings. An empty string
/// means no reference.
fn lenient_id<'de, D>(
  deserializer: D
) -> Result<Option<u64>, D::Error>
where
  D: Deserializer<'de>
{
  match Option::<Value>::deserialize(
    deserializer
  )? {
    | None | Some(Value::Null) => Ok(None),
    | Some(Value::Number(n)) => {
      n.as_u64().map(Some).ok_or_else(|| {
        serde::de::Error::custom(format!(
          "invalid id: {n}"
        ))
      })
    }
    | Some(Value::String(raw))
      if raw.trim().is_empty() =>
    {
      Ok(None)
    }
    | Some(Value::String(raw)) => raw
      .trim()
      .parse()
      .map(Some)
      .map_err(|_| {
        serde::de::Error::custom(format!(
          "invalid id: {raw:?}"
        ))
      }),
    | Some(other) => {
      Err(serde::de::Error::custom(format!(
        "invalid id: {other}"
      )))
    }
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct Task {
  pub id:            TaskId,
  #[serde(default)]
  pub title:         String,
  #[serde(default)]
  pub description:   String,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub case_number:   Option<String>,
  #[serde(
    default,
    alias = "caseId",
    deserialize_with = "lenient_id",
    skip_serializing_if = "Option::is_none"
  )]
  pub case_id:       Option<u64>,
  #[serde(
    default,
    deserialize_with = "lenient_id",
    skip_serializing_if = "Option::is_none"
  )]
  pub matter:        Option<u64>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub created_at:    Option<String>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub updated_at:    Option<String>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub due_date:      Option<String>,
  #[serde(
    default,
    deserialize_with = "lenient_id",
    skip_serializing_if = "Option::is_none"
  )]
  pub assigned_to:   Option<u64>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub assignee_name: Option<String>,
  #[serde(default)]
  pub status:        TaskStatus,
  #[serde(
    default,
    deserialize_with = "lenient_priority",
    skip_serializing_if = "Option::is_none"
  )]
  pub priority:      Option<Priority>,
  #[serde(default)]
  pub is_new:        bool,
  #[serde(flatten)]
  pub extra: BTreeMap<String, Value>
}

impl Task {
  pub fn new(
    id: TaskId,
    title: impl Into<String>
  ) -> Self {
    Self {
      id,
      title: title.into(),
      description: String::new(),
      case_number: None,
      case_id: None,
      matter: None,
      created_at: None,
      updated_at: None,
      due_date: None,
      assigned_to: None,
      assignee_name: None,
      status: TaskStatus::default(),
      priority: None,
      is_new: false,
      extra: BTreeMap::new()
    }
  }
}

/// Body of a create request. The server
/// assigns `id` and `is_new`.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct TaskDraft {
  pub title:         String,
  pub description:   String,
  pub status:        TaskStatus,
  pub priority:      Priority,
  pub due_date:      String,
  pub assigned_to:   u64,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub assignee_name: Option<String>,
  pub case_id:       u64,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub case_number:   Option<String>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub matter:        Option<u64>
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct Case {
  pub id:             u64,
  pub case_number:    String,
  #[serde(default)]
  pub coming_up:      String,
  #[serde(default)]
  pub opened:         String,
  #[serde(default)]
  pub last_updated:   String,
  #[serde(default)]
  pub lawyer:         String,
  #[serde(default)]
  pub client:         String,
  #[serde(default)]
  pub matter:         Option<u64>,
  #[serde(default)]
  pub case_documents: u32
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct Matter {
  pub id:    u64,
  pub title: String
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct Employee {
  pub id:        u64,
  pub full_name: String
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct ErrorBody {
  pub error: String
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn status_vocabularies_collapse_to_canonical()
   {
    assert_eq!(
      TaskStatus::parse("over_due"),
      TaskStatus::OverDue
    );
    assert_eq!(
      TaskStatus::parse("Over Due"),
      TaskStatus::OverDue
    );
    assert_eq!(
      TaskStatus::parse("completed"),
      TaskStatus::Done
    );
    assert_eq!(
      TaskStatus::parse(" in_progress "),
      TaskStatus::InProgress
    );
    assert_eq!(
      TaskStatus::parse("Blocked"),
      TaskStatus::Other(
        "Blocked".to_string()
      )
    );
  }

  #[test]
  fn task_decodes_original_record_shape()
  {
    let raw = json!({
      "id": 7,
      "title": "Budget Planning",
      "description": "Plan the budget for Q3.",
      "case_number": "CASE-007",
      "created_at": "2024-06-07T15:00:00Z",
      "due_date": "2024-06-22T12:00:00Z",
      "assignee_name": "Grace Hopper",
      "status": "over_due",
      "priority": "high",
      "is_new": true,
      "caseId": 3,
      "reminder": "weekly"
    });

    let task: Task =
      serde_json::from_value(raw)
        .expect("decode task");

    assert_eq!(
      task.status,
      TaskStatus::OverDue
    );
    assert_eq!(
      task.priority,
      Some(Priority::High)
    );
    assert_eq!(task.case_id, Some(3));
    assert!(task.is_new);
    assert_eq!(
      task.extra.get("reminder"),
      Some(&json!("weekly"))
    );

    let encoded =
      serde_json::to_value(&task)
        .expect("encode task");
    assert_eq!(
      encoded["status"],
      json!("Over Due")
    );
    assert_eq!(
      encoded["reminder"],
      json!("weekly")
    );
  }

  #[test]
  fn unknown_priority_is_dropped_not_fatal()
   {
    let task: Task =
      serde_json::from_value(json!({
        "id": 1,
        "priority": ""
      }))
      .expect("decode task");
    assert_eq!(task.priority, None);
    assert_eq!(
      task.status,
      TaskStatus::Due
    );
  }

  #[test]
  fn form_style_reference_ids_are_accepted()
  {
    let task: Task =
      serde_json::from_value(json!({
        "id": 4,
        "assigned_to": "2",
        "case_id": " 1 ",
        "matter": ""
      }))
      .expect("decode task");
    assert_eq!(task.assigned_to, Some(2));
    assert_eq!(task.case_id, Some(1));
    assert_eq!(task.matter, None);

    let bad = serde_json::from_value::<Task>(
      json!({"id": 4, "matter": "first"})
    );
    assert!(bad.is_err());
  }
}
