use std::io::{BufRead, Write};

use anyhow::{Context, anyhow};
use docket_shared::TaskId;
use tracing::{debug, info, instrument, warn};

use crate::board::{Notice, TaskBoard};
use crate::bulk::BulkAction;
use crate::cli::{Command, ListArgs, TaskFields};
use crate::pagination::PAGE_SIZE_OPTIONS;
use crate::render::Renderer;
use crate::shell;
use crate::source::DataSource;
use crate::validate::TaskForm;

#[instrument(skip_all, fields(command = command_name(&command)))]
pub async fn dispatch<S, R, W>(
    board: &mut TaskBoard<S>,
    renderer: &Renderer,
    command: Command,
    input: R,
    out: &mut W,
) -> anyhow::Result<()>
where
    S: DataSource,
    R: BufRead,
    W: Write,
{
    debug!("dispatching command");

    match command {
        Command::List(args) => cmd_list(board, renderer, &args, out).await,
        Command::Show { id } => cmd_show(board, renderer, id, out).await,
        Command::Add(fields) => cmd_add(board, renderer, &fields, out).await,
        Command::Edit { id, fields } => cmd_edit(board, renderer, id, &fields, out).await,
        Command::Delete { ids } => cmd_delete(board, renderer, &ids, out).await,
        Command::Bulk { action, ids } => cmd_bulk(board, renderer, action, &ids, out).await,
        Command::Cases => {
            let refs = board.references().await?;
            renderer.write_cases(out, &refs.cases)
        }
        Command::Matters => {
            let refs = board.references().await?;
            renderer.write_matters(out, &refs.matters)
        }
        Command::Employees => {
            let refs = board.references().await?;
            renderer.write_employees(out, &refs.employees)
        }
        Command::Shell => shell::run_shell(board, renderer, input, out).await,
    }
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::List(_) => "list",
        Command::Show { .. } => "show",
        Command::Add(_) => "add",
        Command::Edit { .. } => "edit",
        Command::Delete { .. } => "delete",
        Command::Bulk { .. } => "bulk",
        Command::Cases => "cases",
        Command::Matters => "matters",
        Command::Employees => "employees",
        Command::Shell => "shell",
    }
}

pub fn check_page_size(size: usize) -> anyhow::Result<usize> {
    if PAGE_SIZE_OPTIONS.contains(&size) {
        Ok(size)
    } else {
        Err(anyhow!(
            "page size must be one of {PAGE_SIZE_OPTIONS:?}, got {size}"
        ))
    }
}

async fn cmd_list<S: DataSource, W: Write>(
    board: &mut TaskBoard<S>,
    renderer: &Renderer,
    args: &ListArgs,
    out: &mut W,
) -> anyhow::Result<()> {
    board.refresh().await?;

    let engine = board.engine_mut();
    if let Some(query) = &args.search {
        engine.set_search(query);
    }
    if let Some(status) = &args.status {
        engine.set_status_filter(status);
    }
    if let Some(mode) = args.completion {
        engine.set_completion_filter(mode);
    }
    if let Some(layout) = args.layout {
        engine.set_layout(layout);
    }
    if let Some(size) = args.size {
        engine.set_page_size(check_page_size(size)?);
    }
    if let Some(page) = args.page {
        engine.go_to_page(page.saturating_sub(1));
    }

    let engine = board.engine();
    renderer.write_page(
        out,
        engine.layout(),
        &engine.current_page(),
        engine.selection(),
    )
}

async fn cmd_show<S: DataSource, W: Write>(
    board: &mut TaskBoard<S>,
    renderer: &Renderer,
    id: TaskId,
    out: &mut W,
) -> anyhow::Result<()> {
    board.refresh().await?;
    let detail = board.open(id).await?;
    renderer.write_detail(out, &detail)?;
    board.close();
    Ok(())
}

async fn cmd_add<S: DataSource, W: Write>(
    board: &mut TaskBoard<S>,
    renderer: &Renderer,
    fields: &TaskFields,
    out: &mut W,
) -> anyhow::Result<()> {
    let refs = board.references().await?;

    let mut form = TaskForm::default();
    fields.apply_to(&mut form);
    if let Some(case_id) = &fields.case_id
        && fields.matter.is_none()
    {
        form.select_case(case_id, &refs.cases, &refs.matters);
    }

    let created = board.create(&form).await.context("failed to create task")?;
    info!(task_id = created.id, "task created");
    renderer.write_notice(
        out,
        &Notice::success(
            "Task Created",
            format!("Created task {} \"{}\".", created.id, created.title),
        ),
    )
}

async fn cmd_edit<S: DataSource, W: Write>(
    board: &mut TaskBoard<S>,
    renderer: &Renderer,
    id: TaskId,
    fields: &TaskFields,
    out: &mut W,
) -> anyhow::Result<()> {
    board.refresh().await?;
    let refs = board.references().await?;

    let current = board
        .engine()
        .task(id)
        .ok_or_else(|| anyhow!("task {id} not found"))?;
    let mut form = TaskForm::from_task(current);
    fields.apply_to(&mut form);
    if let Some(case_id) = &fields.case_id
        && fields.matter.is_none()
    {
        form.select_case(case_id, &refs.cases, &refs.matters);
    }

    let updated = board
        .update(id, &form)
        .await
        .with_context(|| format!("failed to update task {id}"))?;
    renderer.write_notice(
        out,
        &Notice::success(
            "Task Updated",
            format!("Updated task {} \"{}\".", updated.id, updated.title),
        ),
    )
}

async fn cmd_delete<S: DataSource, W: Write>(
    board: &mut TaskBoard<S>,
    renderer: &Renderer,
    ids: &[TaskId],
    out: &mut W,
) -> anyhow::Result<()> {
    for &id in ids {
        board
            .delete(id)
            .await
            .with_context(|| format!("failed to delete task {id}"))?;
        renderer.write_notice(
            out,
            &Notice::success("Task Deleted", format!("Deleted task {id}.")),
        )?;
    }
    Ok(())
}

async fn cmd_bulk<S: DataSource, W: Write>(
    board: &mut TaskBoard<S>,
    renderer: &Renderer,
    action: BulkAction,
    ids: &[TaskId],
    out: &mut W,
) -> anyhow::Result<()> {
    board.refresh().await?;

    for &id in ids {
        if !board.engine_mut().toggle_select(id) {
            warn!(task_id = id, "skipping unknown task");
        }
    }
    if board.engine().selection().is_empty() {
        return Err(anyhow!("none of the given tasks exist"));
    }

    let changed = board.bulk(action).await?;
    renderer.write_notice(
        out,
        &Notice::success(
            action.label(),
            format!("Applied to {changed} task(s)."),
        ),
    )
}
