use std::io::{BufRead, Write};

use anyhow::{Context, anyhow};
use docket_shared::TaskId;
use tracing::{debug, info, instrument};

use crate::board::{Notice, TaskBoard};
use crate::bulk::BulkAction;
use crate::commands::check_page_size;
use crate::engine::Layout;
use crate::filter::Completion;
use crate::render::Renderer;
use crate::source::DataSource;

const PROMPT: &str = "docket> ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Search(String),
    Status(String),
    Completion(Completion),
    Layout(Layout),
    Next,
    Prev,
    Page(usize),
    Size(usize),
    Select(Vec<TaskId>),
    SelectPage,
    Bulk(BulkAction),
    View(TaskId),
    Close,
    Delete(TaskId),
    Refresh,
    Help,
    Quit,
}

fn parse_id(raw: &str) -> anyhow::Result<TaskId> {
    raw.parse::<TaskId>()
        .with_context(|| format!("expected a task id, got {raw:?}"))
}

fn one_arg<'a>(name: &str, args: &[&'a str]) -> anyhow::Result<&'a str> {
    match args {
        [single] => Ok(*single),
        _ => Err(anyhow!("{name} takes exactly one argument")),
    }
}

/// Parses one input line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> anyhow::Result<Option<ShellCommand>> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match head.to_ascii_lowercase().as_str() {
        "search" | "/" => ShellCommand::Search(args.join(" ")),
        "status" => ShellCommand::Status(args.join(" ")),
        "outstanding" => ShellCommand::Completion(Completion::Outstanding),
        "completed" => ShellCommand::Completion(Completion::Completed),
        "layout" => ShellCommand::Layout(one_arg("layout", &args)?.parse()?),
        "table" => ShellCommand::Layout(Layout::Table),
        "grid" => ShellCommand::Layout(Layout::Grid),
        "next" | "n" => ShellCommand::Next,
        "prev" | "p" => ShellCommand::Prev,
        "page" => {
            let page = one_arg("page", &args)?
                .parse::<usize>()
                .context("page expects a number")?;
            if page == 0 {
                return Err(anyhow!("pages are numbered from 1"));
            }
            ShellCommand::Page(page)
        }
        "size" => ShellCommand::Size(
            one_arg("size", &args)?
                .parse::<usize>()
                .context("size expects a number")?,
        ),
        "select" | "s" => {
            if args.is_empty() {
                return Err(anyhow!("select needs at least one task id"));
            }
            ShellCommand::Select(
                args.iter()
                    .map(|raw| parse_id(raw))
                    .collect::<anyhow::Result<_>>()?,
            )
        }
        "select-page" | "sp" => ShellCommand::SelectPage,
        "bulk" => ShellCommand::Bulk(one_arg("bulk", &args)?.parse()?),
        "view" | "v" => ShellCommand::View(parse_id(one_arg("view", &args)?)?),
        "close" => ShellCommand::Close,
        "delete" => ShellCommand::Delete(parse_id(one_arg("delete", &args)?)?),
        "refresh" | "r" => ShellCommand::Refresh,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" | "q" => ShellCommand::Quit,
        other => return Err(anyhow!("unknown command: {other} (try help)")),
    };
    Ok(Some(command))
}

fn write_help<W: Write>(out: &mut W) -> anyhow::Result<()> {
    let actions = BulkAction::ALL
        .iter()
        .map(|a| a.name())
        .collect::<Vec<_>>()
        .join(", ");
    writeln!(
        out,
        "search <text>        filter by text (empty clears)\n\
         status <status|all>  filter by status\n\
         outstanding          toggle outstanding tasks only\n\
         completed            toggle completed tasks only\n\
         layout table|grid    switch presentation\n\
         next, prev, page N   move between pages\n\
         size N               page size, one of 5 10 15 20 50\n\
         select <id>...       toggle row selection\n\
         select-page          toggle every row on the page\n\
         bulk <action>        {actions}\n\
         view <id>, close     open or close a task detail\n\
         delete <id>          delete one task\n\
         refresh              reload tasks\n\
         quit"
    )?;
    Ok(())
}

fn write_list<S: DataSource, W: Write>(
    board: &TaskBoard<S>,
    renderer: &Renderer,
    out: &mut W,
) -> anyhow::Result<()> {
    let engine = board.engine();
    renderer.write_page(
        out,
        engine.layout(),
        &engine.current_page(),
        engine.selection(),
    )?;
    if !engine.selection().is_empty() {
        writeln!(out, "{} selected", engine.selection().len())?;
    }
    Ok(())
}

/// What to show after a command ran.
enum After {
    List,
    Nothing,
    Quit,
}

async fn execute<S: DataSource, W: Write>(
    board: &mut TaskBoard<S>,
    renderer: &Renderer,
    command: ShellCommand,
    out: &mut W,
) -> anyhow::Result<After> {
    match command {
        ShellCommand::Search(query) => board.engine_mut().set_search(&query),
        ShellCommand::Status(status) => board.engine_mut().set_status_filter(&status),
        ShellCommand::Completion(mode) => board.engine_mut().toggle_completion_filter(mode),
        ShellCommand::Layout(layout) => board.engine_mut().set_layout(layout),
        ShellCommand::Next => board.engine_mut().next_page(),
        ShellCommand::Prev => board.engine_mut().previous_page(),
        ShellCommand::Page(page) => board.engine_mut().go_to_page(page.saturating_sub(1)),
        ShellCommand::Size(size) => {
            let size = check_page_size(size)?;
            board.engine_mut().set_page_size(size);
        }
        ShellCommand::Select(ids) => {
            for id in ids {
                if !board.engine_mut().toggle_select(id) {
                    writeln!(out, "no task {id}")?;
                }
            }
        }
        ShellCommand::SelectPage => board.engine_mut().toggle_select_page(),
        ShellCommand::Bulk(action) => {
            let changed = board.bulk(action).await?;
            renderer.write_notice(
                out,
                &Notice::success(action.label(), format!("Applied to {changed} task(s).")),
            )?;
        }
        ShellCommand::View(id) => {
            let detail = board.open(id).await?;
            renderer.write_detail(out, &detail)?;
            return Ok(After::Nothing);
        }
        ShellCommand::Close => board.close(),
        ShellCommand::Delete(id) => {
            board.delete(id).await?;
            renderer.write_notice(
                out,
                &Notice::success("Task Deleted", format!("Deleted task {id}.")),
            )?;
        }
        ShellCommand::Refresh => board.reload_tasks().await?,
        ShellCommand::Help => {
            write_help(out)?;
            return Ok(After::Nothing);
        }
        ShellCommand::Quit => return Ok(After::Quit),
    }
    Ok(After::List)
}

/// Reads commands from `input` until EOF or `quit`. Failed commands are
/// reported as error notices and the session goes on.
#[instrument(skip_all)]
pub async fn run_shell<S, R, W>(
    board: &mut TaskBoard<S>,
    renderer: &Renderer,
    input: R,
    out: &mut W,
) -> anyhow::Result<()>
where
    S: DataSource,
    R: BufRead,
    W: Write,
{
    board.refresh().await?;
    write_list(board, renderer, out)?;

    let mut lines = input.lines();
    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;

        let Some(line) = lines.next() else {
            writeln!(out)?;
            break;
        };
        let line = line.context("failed to read shell input")?;

        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                renderer.write_notice(out, &Notice::failure("Invalid Command", &err))?;
                continue;
            }
        };
        debug!(?command, "shell command");

        match execute(board, renderer, command, out).await {
            Ok(After::List) => write_list(board, renderer, out)?,
            Ok(After::Nothing) => {}
            Ok(After::Quit) => break,
            Err(err) => {
                renderer.write_notice(out, &Notice::failure("Error", &err))?;
            }
        }
    }

    info!("shell session ended");
    Ok(())
}
