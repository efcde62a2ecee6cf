use docket_shared::{
  Case,
  Employee,
  Matter,
  Task,
  TaskStatus
};

/// The in-memory collection the server
/// starts with.
pub fn tasks() -> Vec<Task> {
  let rows = [
    (
      1,
      "Prepare Report",
      "Compile the monthly financial report.",
      "2024-06-01T09:00:00Z",
      "2024-06-10T17:00:00Z",
      "Alice Smith",
      TaskStatus::InProgress,
      true
    ),
    (
      2,
      "Client Meeting",
      "Meet with client to discuss project scope.",
      "2024-06-02T10:30:00Z",
      "2024-06-12T15:00:00Z",
      "Bob Johnson",
      TaskStatus::Due,
      false
    ),
    (
      3,
      "Review Contract",
      "Review the new vendor contract for approval.",
      "2024-06-03T14:00:00Z",
      "2024-06-15T12:00:00Z",
      "Charlie Lee",
      TaskStatus::Done,
      false
    ),
    (
      4,
      "Draft Proposal",
      "Draft the initial project proposal.",
      "2024-06-04T09:00:00Z",
      "2024-06-16T17:00:00Z",
      "Dana White",
      TaskStatus::Due,
      true
    ),
    (
      5,
      "Legal Review",
      "Conduct legal review of documents.",
      "2024-06-05T11:00:00Z",
      "2024-06-18T15:00:00Z",
      "Eve Black",
      TaskStatus::InProgress,
      false
    ),
    (
      6,
      "Team Meeting",
      "Weekly team sync-up.",
      "2024-06-06T13:00:00Z",
      "2024-06-20T10:00:00Z",
      "Frank Green",
      TaskStatus::Done,
      false
    ),
    (
      7,
      "Budget Planning",
      "Plan the budget for Q3.",
      "2024-06-07T15:00:00Z",
      "2024-06-22T12:00:00Z",
      "Grace Hopper",
      TaskStatus::OverDue,
      true
    ),
    (
      8,
      "Client Feedback",
      "Collect feedback from client.",
      "2024-06-08T10:00:00Z",
      "2024-06-24T16:00:00Z",
      "Henry Ford",
      TaskStatus::Due,
      false
    ),
    (
      9,
      "Test New Badge",
      "This task should show a New badge \
       until viewed.",
      "2024-06-09T10:00:00Z",
      "2024-06-30T16:00:00Z",
      "Test User",
      TaskStatus::Due,
      true
    )
  ];

  rows
    .into_iter()
    .map(
      |(
        id,
        title,
        description,
        created_at,
        due_date,
        assignee,
        status,
        is_new
      )| {
        let mut task = Task::new(id, title);
        task.description =
          description.to_string();
        task.case_number =
          Some(format!("CASE-{id:03}"));
        task.created_at =
          Some(created_at.to_string());
        task.due_date =
          Some(due_date.to_string());
        task.assignee_name =
          Some(assignee.to_string());
        task.status = status;
        task.is_new = is_new;
        // The first three tasks belong to
        // the three known cases.
        if id <= 3 {
          task.case_id = Some(id);
        }
        task.assigned_to = match assignee {
          | "Alice Smith" => Some(1),
          | "Bob Johnson" => Some(2),
          | _ => None
        };
        task
      }
    )
    .collect()
}

pub fn cases() -> Vec<Case> {
  vec![
    Case {
      id:             1,
      case_number:    "CASE-001".into(),
      coming_up:      "Hearing on 2024-06-20".into(),
      opened:         "2024-05-01T09:00:00Z".into(),
      last_updated:   "2024-06-05T10:00:00Z".into(),
      lawyer:         "Alice Smith".into(),
      client:         "Acme Corp".into(),
      matter:         Some(1),
      case_documents: 3
    },
    Case {
      id:             2,
      case_number:    "CASE-002".into(),
      coming_up:      "Filing Deadline 2024-06-18"
        .into(),
      opened:         "2024-05-10T11:30:00Z".into(),
      last_updated:   "2024-06-07T14:00:00Z".into(),
      lawyer:         "Bob Johnson".into(),
      client:         "Beta LLC".into(),
      matter:         Some(2),
      case_documents: 5
    },
    Case {
      id:             3,
      case_number:    "CASE-003".into(),
      coming_up:      "Settlement Meeting \
                       2024-06-25"
        .into(),
      opened:         "2024-05-15T13:00:00Z".into(),
      last_updated:   "2024-06-09T16:00:00Z".into(),
      lawyer:         "Charlie Lee".into(),
      client:         "Gamma Inc".into(),
      matter:         None,
      case_documents: 2
    },
  ]
}

pub fn matters() -> Vec<Matter> {
  vec![
    Matter {
      id:    1,
      title: "Matter 1".into()
    },
    Matter {
      id:    2,
      title: "Matter 2".into()
    },
  ]
}

pub fn employees() -> Vec<Employee> {
  vec![
    Employee {
      id:        1,
      full_name: "Alice Smith".into()
    },
    Employee {
      id:        2,
      full_name: "Bob Johnson".into()
    },
  ]
}
