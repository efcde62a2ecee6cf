use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Args, Parser, Subcommand};
use docket_shared::TaskId;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::bulk::BulkAction;
use crate::engine::Layout;
use crate::filter::Completion;
use crate::validate::TaskForm;

#[derive(Debug, Clone)]
pub struct PreprocessedArgs {
    pub cleaned_args: Vec<OsString>,
    pub rc_overrides: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "docket",
    version,
    about = "Docket: task board client for the PMS data source",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "docketrc", global = true)]
    pub docketrc: Option<PathBuf>,

    /// Data source base URL, e.g. http://localhost:3001/pms/
    #[arg(long = "server", global = true)]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List tasks, filtered and paginated
    List(ListArgs),
    /// Show one task and mark it as read
    Show { id: TaskId },
    /// Create a task
    Add(TaskFields),
    /// Edit a task; omitted fields keep their value
    Edit {
        id: TaskId,
        #[command(flatten)]
        fields: TaskFields,
    },
    /// Delete tasks by id
    Delete {
        #[arg(required = true)]
        ids: Vec<TaskId>,
    },
    /// Apply one bulk action to the given tasks
    Bulk {
        /// delete, completed, outstanding, read or unread
        action: BulkAction,
        #[arg(required = true)]
        ids: Vec<TaskId>,
    },
    /// List cases
    Cases,
    /// List matters
    Matters,
    /// List employees
    Employees,
    /// Interactive session over one task list
    Shell,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Case-insensitive text search
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Status filter (Due, "In Progress", Done, "Over Due" or all)
    #[arg(long)]
    pub status: Option<String>,

    /// outstanding or completed
    #[arg(long)]
    pub completion: Option<Completion>,

    #[arg(long)]
    pub layout: Option<Layout>,

    /// 1-based page number
    #[arg(long)]
    pub page: Option<usize>,

    #[arg(long)]
    pub size: Option<usize>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct TaskFields {
    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Employee id
    #[arg(long = "assign")]
    pub assigned_to: Option<String>,

    #[arg(long)]
    pub status: Option<String>,

    /// YYYY-MM-DD, today, tomorrow or an RFC 3339 timestamp
    #[arg(long = "due")]
    pub due_date: Option<String>,

    /// High, Medium or Low
    #[arg(long)]
    pub priority: Option<String>,

    /// Case id; fills the matter from the case unless --matter is given
    #[arg(long = "case")]
    pub case_id: Option<String>,

    /// Matter id
    #[arg(long)]
    pub matter: Option<String>,
}

impl TaskFields {
    /// Writes every given field over `form`.
    pub fn apply_to(&self, form: &mut TaskForm) {
        let pairs = [
            (&self.title, &mut form.title),
            (&self.description, &mut form.description),
            (&self.assigned_to, &mut form.assigned_to),
            (&self.status, &mut form.status),
            (&self.due_date, &mut form.due_date),
            (&self.priority, &mut form.priority),
            (&self.case_id, &mut form.case_id),
            (&self.matter, &mut form.matter),
        ];
        for (given, slot) in pairs {
            if let Some(value) = given {
                *slot = value.clone();
            }
        }
    }
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// Pulls positional `rc.key=value` (or `rc.key:value`) overrides out of the
/// argument list before clap sees it.
#[tracing::instrument(skip_all)]
pub fn preprocess_args(raw: &[OsString]) -> anyhow::Result<PreprocessedArgs> {
    let mut cleaned = Vec::with_capacity(raw.len());
    let mut overrides: Vec<(String, String)> = Vec::new();

    let mut iter = raw.iter().cloned();
    if let Some(bin) = iter.next() {
        cleaned.push(bin);
    }

    for arg in iter {
        let s = arg.to_string_lossy();
        if let Some(rest) = s.strip_prefix("rc.") {
            let parsed = rest.split_once('=').or_else(|| rest.split_once(':'));

            if let Some((k, v)) = parsed {
                if k.is_empty() {
                    return Err(anyhow!("empty key in override: {s}"));
                }
                debug!(key = %k, value = %v, "captured positional rc override");
                overrides.push((format!("rc.{k}"), v.to_string()));
                continue;
            }
        }

        cleaned.push(arg);
    }

    Ok(PreprocessedArgs {
        cleaned_args: cleaned,
        rc_overrides: overrides,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<OsString> {
        list.iter().map(OsString::from).collect()
    }

    #[test]
    fn positional_overrides_are_extracted() {
        let pre = preprocess_args(&args(&[
            "docket",
            "rc.page.size=20",
            "list",
            "rc.layout:grid",
        ]))
        .expect("preprocess");

        assert_eq!(pre.cleaned_args, args(&["docket", "list"]));
        assert_eq!(
            pre.rc_overrides,
            vec![
                ("rc.page.size".to_string(), "20".to_string()),
                ("rc.layout".to_string(), "grid".to_string()),
            ]
        );
    }

    #[test]
    fn parses_bulk_and_list_flags() {
        let cli = GlobalCli::parse_from([
            "docket",
            "--rc",
            "color=off",
            "bulk",
            "markAsRead",
            "1",
            "4",
        ]);
        assert_eq!(cli.rc_overrides[0].key, "color");
        match cli.command {
            Some(Command::Bulk { action, ids }) => {
                assert_eq!(action, BulkAction::MarkRead);
                assert_eq!(ids, vec![1, 4]);
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = GlobalCli::parse_from([
            "docket",
            "list",
            "--completion",
            "completed",
            "--layout",
            "grid",
        ]);
        let Some(Command::List(list)) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(list.completion, Some(Completion::Completed));
        assert_eq!(list.layout, Some(Layout::Grid));
    }

    #[test]
    fn given_fields_overwrite_form() {
        let mut form = TaskForm {
            title: "Old".into(),
            matter: "1".into(),
            ..TaskForm::default()
        };
        TaskFields {
            title: Some("New title".into()),
            priority: Some("Low".into()),
            ..TaskFields::default()
        }
        .apply_to(&mut form);

        assert_eq!(form.title, "New title");
        assert_eq!(form.priority, "Low");
        assert_eq!(form.matter, "1");
    }
}
