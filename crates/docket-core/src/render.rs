use std::io::{self, IsTerminal, Write};

use chrono_tz::Tz;
use docket_shared::{Case, Employee, Matter, Task, TaskStatus};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::board::{Notice, NoticeKind, TaskDetail};
use crate::config::Config;
use crate::datetime::{format_day, format_long, parse_timezone};
use crate::engine::{Layout, PageView};
use crate::selection::SelectionSet;

const DESCRIPTION_WIDTH: usize = 40;
const NEW_MARKER: &str = "●";

/// One table row as seen by a column renderer.
pub struct Row<'a> {
    pub task: &'a Task,
    pub selected: bool,
}

pub struct Column {
    pub key: &'static str,
    pub label: &'static str,
    pub render: fn(&Renderer, &Row<'_>) -> String,
}

pub static COLUMNS: &[Column] = &[
    Column {
        key: "select",
        label: "",
        render: render_select,
    },
    Column {
        key: "title",
        label: "Task Name",
        render: render_title,
    },
    Column {
        key: "description",
        label: "Description",
        render: render_description,
    },
    Column {
        key: "case_number",
        label: "Case",
        render: render_case,
    },
    Column {
        key: "created_at",
        label: "Created On",
        render: render_created,
    },
    Column {
        key: "due_date",
        label: "Due Date",
        render: render_due,
    },
    Column {
        key: "assignee_name",
        label: "Assigned To",
        render: render_assignee,
    },
    Column {
        key: "status",
        label: "Status",
        render: render_status,
    },
];

fn render_select(_: &Renderer, row: &Row<'_>) -> String {
    let mark = if row.selected { "[x]" } else { "[ ]" };
    mark.to_string()
}

fn render_title(r: &Renderer, row: &Row<'_>) -> String {
    if row.task.is_new {
        format!("{} {}", row.task.title, r.paint(NEW_MARKER, "34"))
    } else {
        row.task.title.clone()
    }
}

fn render_description(_: &Renderer, row: &Row<'_>) -> String {
    truncate(&row.task.description, DESCRIPTION_WIDTH)
}

fn render_case(_: &Renderer, row: &Row<'_>) -> String {
    row.task.case_number.clone().unwrap_or_default()
}

fn render_created(r: &Renderer, row: &Row<'_>) -> String {
    r.day(row.task.created_at.as_deref())
}

fn render_due(r: &Renderer, row: &Row<'_>) -> String {
    r.day(row.task.due_date.as_deref())
}

fn render_assignee(_: &Renderer, row: &Row<'_>) -> String {
    row.task.assignee_name.clone().unwrap_or_default()
}

fn render_status(r: &Renderer, row: &Row<'_>) -> String {
    r.status(&row.task.status)
}

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    tz: Tz,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color = cfg.get_bool("color")?.unwrap_or(true);

        let tz = parse_timezone(
            &cfg.get("display.timezone")
                .unwrap_or_else(|| crate::datetime::DEFAULT_DISPLAY_TIMEZONE.to_string()),
        )?;

        Ok(Self {
            color: color && io::stdout().is_terminal(),
            tz,
        })
    }

    /// A renderer that never emits escape codes.
    pub fn plain(tz: Tz) -> Self {
        Self { color: false, tz }
    }

    pub fn timezone(&self) -> &Tz {
        &self.tz
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }

    fn day(&self, raw: Option<&str>) -> String {
        raw.map(|value| format_day(value, &self.tz))
            .unwrap_or_default()
    }

    pub fn status(&self, status: &TaskStatus) -> String {
        let code = match status {
            TaskStatus::Due => "33",
            TaskStatus::InProgress => "34",
            TaskStatus::Done => "32",
            TaskStatus::OverDue => "31",
            TaskStatus::Other(_) => "90",
        };
        self.paint(status.label(), code)
    }

    #[tracing::instrument(skip_all, fields(layout = %layout, rows = page.tasks.len()))]
    pub fn write_page<W: Write>(
        &self,
        out: &mut W,
        layout: Layout,
        page: &PageView<'_>,
        selection: &SelectionSet,
    ) -> anyhow::Result<()> {
        if page.tasks.is_empty() {
            writeln!(out, "No tasks found.")?;
        } else {
            match layout {
                Layout::Table => self.write_table_view(out, page, selection)?,
                Layout::Grid => self.write_grid_view(out, page, selection)?,
            }
        }

        if page.shows_controls() {
            writeln!(out)?;
            writeln!(
                out,
                "Page {} of {}  ({} tasks, {} per page)",
                page.page_index + 1,
                page.page_count,
                page.total,
                page.page_size
            )?;
        }
        Ok(())
    }

    fn write_table_view<W: Write>(
        &self,
        out: &mut W,
        page: &PageView<'_>,
        selection: &SelectionSet,
    ) -> anyhow::Result<()> {
        let headers: Vec<String> = COLUMNS
            .iter()
            .map(|col| {
                if col.key == "select" {
                    page.check.marker().to_string()
                } else {
                    col.label.to_string()
                }
            })
            .collect();

        let rows: Vec<Vec<String>> = page
            .tasks
            .iter()
            .map(|&task| {
                let row = Row {
                    task,
                    selected: selection.contains(task.id),
                };
                COLUMNS
                    .iter()
                    .map(|col| (col.render)(self, &row))
                    .collect()
            })
            .collect();

        write_table(out, headers, rows)
    }

    fn write_grid_view<W: Write>(
        &self,
        out: &mut W,
        page: &PageView<'_>,
        selection: &SelectionSet,
    ) -> anyhow::Result<()> {
        writeln!(out, "{} select page", page.check.marker())?;

        for task in &page.tasks {
            let mark = if selection.contains(task.id) { "[x]" } else { "[ ]" };
            let badge = if task.is_new {
                format!("  {}", self.paint("New", "1;34"))
            } else {
                String::new()
            };

            writeln!(out)?;
            writeln!(out, "{mark} #{} {}{badge}", task.id, task.title)?;
            writeln!(
                out,
                "    Case       {}",
                task.case_number.as_deref().unwrap_or("-")
            )?;
            writeln!(
                out,
                "    Assigned   {}",
                task.assignee_name.as_deref().unwrap_or("-")
            )?;
            writeln!(out, "    Created    {}", self.day(task.created_at.as_deref()))?;
            writeln!(out, "    Due        {}", self.day(task.due_date.as_deref()))?;
            writeln!(out, "    Status     {}", self.status(&task.status))?;
            if !task.description.is_empty() {
                writeln!(out, "    {}", truncate(&task.description, 72))?;
            }
        }
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(task_id = detail.task.id))]
    pub fn write_detail<W: Write>(&self, out: &mut W, detail: &TaskDetail) -> anyhow::Result<()> {
        let task = &detail.task;
        let or_dash = |value: Option<String>| value.unwrap_or_else(|| "-".to_string());

        writeln!(out, "{}", task.title)?;
        writeln!(out, "{}", "=".repeat(UnicodeWidthStr::width(task.title.as_str())))?;
        writeln!(
            out,
            "priority   {}",
            or_dash(task.priority.map(|p| p.label().to_string()))
        )?;
        writeln!(
            out,
            "case       {}",
            or_dash(
                detail
                    .case
                    .as_ref()
                    .map(|c| c.case_number.clone())
                    .or_else(|| task.case_number.clone())
            )
        )?;
        writeln!(
            out,
            "matter     {}",
            or_dash(detail.matter.as_ref().map(|m| m.title.clone()))
        )?;
        writeln!(out, "status     {}", self.status(&task.status))?;
        writeln!(
            out,
            "assignee   {}",
            or_dash(
                detail
                    .assignee
                    .as_ref()
                    .map(|e| e.full_name.clone())
                    .or_else(|| task.assignee_name.clone())
            )
        )?;
        writeln!(out, "due        {}", format_long(task.due_date.as_deref(), &self.tz))?;
        writeln!(out, "created    {}", format_long(task.created_at.as_deref(), &self.tz))?;
        writeln!(out, "updated    {}", format_long(task.updated_at.as_deref(), &self.tz))?;
        if let Some(case) = &detail.case {
            writeln!(out, "client     {}", case.client)?;
            if !case.coming_up.is_empty() {
                writeln!(out, "coming up  {}", case.coming_up)?;
            }
        }
        writeln!(out)?;
        writeln!(out, "{}", task.description)?;
        Ok(())
    }

    pub fn write_cases<W: Write>(&self, out: &mut W, cases: &[Case]) -> anyhow::Result<()> {
        let headers = ["ID", "Case", "Client", "Lawyer", "Docs", "Coming Up", "Last Updated"]
            .iter()
            .map(|h| h.to_string())
            .collect();
        let rows = cases
            .iter()
            .map(|case| {
                vec![
                    case.id.to_string(),
                    case.case_number.clone(),
                    case.client.clone(),
                    case.lawyer.clone(),
                    case.case_documents.to_string(),
                    case.coming_up.clone(),
                    format_long(Some(case.last_updated.as_str()), &self.tz),
                ]
            })
            .collect();
        write_table(out, headers, rows)
    }

    pub fn write_matters<W: Write>(&self, out: &mut W, matters: &[Matter]) -> anyhow::Result<()> {
        let rows = matters
            .iter()
            .map(|m| vec![m.id.to_string(), m.title.clone()])
            .collect();
        write_table(out, vec!["ID".to_string(), "Title".to_string()], rows)
    }

    pub fn write_employees<W: Write>(
        &self,
        out: &mut W,
        employees: &[Employee],
    ) -> anyhow::Result<()> {
        let rows = employees
            .iter()
            .map(|e| vec![e.id.to_string(), e.full_name.clone()])
            .collect();
        write_table(out, vec!["ID".to_string(), "Name".to_string()], rows)
    }

    pub fn write_notice<W: Write>(&self, out: &mut W, notice: &Notice) -> anyhow::Result<()> {
        let title = match notice.kind {
            NoticeKind::Success => self.paint(&notice.title, "32"),
            NoticeKind::Error => self.paint(&notice.title, "31"),
        };
        writeln!(out, "{title}: {}", notice.message)?;
        Ok(())
    }
}

fn truncate(text: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(text) <= max_width {
        return text.to_string();
    }

    let mut out = String::new();
    let mut width = 0;
    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if width + w + 1 > max_width {
            break;
        }
        width += w;
        out.push(ch);
    }
    out.push('…');
    out
}

fn write_table<W: Write>(
    writer: &mut W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for (header, width) in headers.iter().zip(&widths) {
        write!(writer, "{header:width$} ", width = *width)?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for (cell, width) in row.iter().zip(&widths) {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = width.saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TaskListEngine;

    fn sample() -> Vec<Task> {
        let mut first = Task::new(1, "Prepare Report");
        first.is_new = true;
        first.case_number = Some("CASE-001".into());
        first.created_at = Some("2024-06-01T09:00:00Z".into());
        first.due_date = Some("2024-06-10T17:00:00Z".into());
        first.assignee_name = Some("Alice Smith".into());
        first.status = TaskStatus::InProgress;

        let mut second = Task::new(2, "Client Meeting");
        second.due_date = Some("2024-06-12T10:00:00Z".into());
        vec![first, second]
    }

    fn render(layout: Layout, engine: &TaskListEngine) -> String {
        let renderer = Renderer::plain(chrono_tz::UTC);
        let mut buf = Vec::new();
        renderer
            .write_page(&mut buf, layout, &engine.current_page(), engine.selection())
            .expect("render");
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn table_shows_columns_markers_and_dates() {
        let mut engine = TaskListEngine::new(10);
        engine.set_tasks(sample());
        engine.toggle_select(2);

        let text = render(Layout::Table, &engine);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("[-] Task Name"));
        assert!(lines[0].contains("Assigned To"));
        assert!(lines[2].starts_with("[ ] Prepare Report ●"));
        assert!(lines[2].contains("Monday, June 10"));
        assert!(lines[2].contains("In Progress"));
        assert!(lines[3].starts_with("[x] Client Meeting"));
        assert!(!text.contains("Page 1"));
    }

    #[test]
    fn grid_shows_badge_and_footer_past_threshold() {
        let mut tasks = sample();
        for id in 3..=7 {
            tasks.push(Task::new(id, format!("Task {id}")));
        }
        let mut engine = TaskListEngine::new(5);
        engine.set_tasks(tasks);

        let text = render(Layout::Grid, &engine);
        assert!(text.contains("#1 Prepare Report  New"));
        assert!(!text.contains("#2 Client Meeting  New"));
        assert!(text.contains("Page 1 of 2  (7 tasks, 5 per page)"));
    }

    #[test]
    fn truncate_respects_display_width() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }

    #[test]
    fn strip_ansi_removes_escape_sequences() {
        assert_eq!(strip_ansi("\x1b[31mOver Due\x1b[0m"), "Over Due");
    }
}
