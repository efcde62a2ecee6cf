mod common;

use common::{MemorySource, board};
use docket_core::board::BoardError;
use docket_core::bulk::BulkAction;
use docket_core::filter::Completion;
use docket_core::validate::TaskForm;
use docket_shared::{Task, TaskId, TaskStatus};

fn visible_ids(board: &docket_core::board::TaskBoard<MemorySource>) -> Vec<TaskId> {
    board.engine().visible().iter().map(|t| t.id).collect()
}

#[tokio::test]
async fn search_matches_both_client_tasks() {
    let mut board = board(MemorySource::seeded(), 10);
    assert_eq!(board.refresh().await.expect("refresh"), 9);

    board.engine_mut().set_search("client");
    assert_eq!(visible_ids(&board), vec![2, 8]);

    board.engine_mut().set_search("CLIENT MEETING");
    assert_eq!(visible_ids(&board), vec![2]);

    board.engine_mut().set_search("");
    assert_eq!(visible_ids(&board).len(), 9);
}

#[tokio::test]
async fn completion_toggle_round_trips() {
    let mut first = Task::new(1, "first");
    first.status = TaskStatus::Done;
    let second = Task::new(2, "second");
    let mut board = board(MemorySource::new(vec![first, second]), 10);
    board.refresh().await.expect("refresh");

    board
        .engine_mut()
        .toggle_completion_filter(Completion::Completed);
    assert_eq!(visible_ids(&board), vec![1]);

    board
        .engine_mut()
        .toggle_completion_filter(Completion::Completed);
    assert_eq!(visible_ids(&board), vec![1, 2]);
}

#[tokio::test]
async fn deleting_a_selected_task_prunes_selection() {
    let mut board = board(MemorySource::seeded(), 10);
    board.refresh().await.expect("refresh");
    assert!(board.engine_mut().toggle_select(2));
    assert!(board.engine_mut().toggle_select(3));

    board.delete(2).await.expect("delete");

    assert!(board.engine().task(2).is_none());
    assert!(!board.engine().selection().contains(2));
    assert!(board.engine().selection().contains(3));
}

#[tokio::test]
async fn vanished_task_is_pruned_on_refresh() {
    let mut board = board(MemorySource::seeded(), 10);
    board.refresh().await.expect("refresh");
    board.engine_mut().toggle_select(5);

    board.source().remove_behind_the_back(5);
    board.reload_tasks().await.expect("reload");

    assert!(board.engine().selection().is_empty());
}

#[tokio::test]
async fn refresh_is_served_from_cache_until_invalidated() {
    let mut board = board(MemorySource::seeded(), 10);
    board.refresh().await.expect("first");
    board.refresh().await.expect("second");
    assert_eq!(board.source().list_calls(), 1);

    board.delete(1).await.expect("delete");
    assert_eq!(board.source().list_calls(), 2);
}

#[tokio::test]
async fn bulk_success_invalidates_and_refetches() {
    let mut board = board(MemorySource::seeded(), 10);
    board.refresh().await.expect("refresh");
    board.engine_mut().toggle_select(1);
    board.engine_mut().toggle_select(2);

    let changed = board
        .bulk(BulkAction::MarkCompleted)
        .await
        .expect("bulk");

    assert_eq!(changed, 2);
    assert_eq!(board.source().list_calls(), 2);
    assert!(board.engine().selection().is_empty());
    for id in [1, 2] {
        assert_eq!(
            board.engine().task(id).map(|t| t.status.clone()),
            Some(TaskStatus::Done)
        );
    }
}

#[tokio::test]
async fn bulk_partial_failure_reports_aggregate_without_rollback() {
    let source = MemorySource::seeded();
    source.fail_on(4);
    let mut board = board(source, 10);
    board.refresh().await.expect("refresh");
    for id in [1, 4, 7] {
        board.engine_mut().toggle_select(id);
    }

    let err = board
        .bulk(BulkAction::MarkRead)
        .await
        .expect_err("one request fails");

    match err.downcast_ref::<BoardError>() {
        Some(BoardError::PartialBulk {
            failed,
            total,
            errors,
            ..
        }) => {
            assert_eq!((*failed, *total), (1, 3));
            assert_eq!(errors.len(), 1);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.to_string(), "1 of 3 read requests failed");

    // No invalidation: the engine still shows the old flags.
    assert_eq!(board.source().list_calls(), 1);
    assert_eq!(board.engine().task(1).map(|t| t.is_new), Some(true));

    // No rollback: the requests that succeeded stay applied.
    assert_eq!(board.source().stored(1).map(|t| t.is_new), Some(false));
    assert_eq!(board.source().stored(7).map(|t| t.is_new), Some(false));
    assert_eq!(board.source().stored(4).map(|t| t.is_new), Some(true));
    assert!(board.engine().selection().is_empty());
}

#[tokio::test]
async fn opening_a_new_task_marks_it_viewed_once() {
    let mut board = board(MemorySource::seeded(), 10);
    board.refresh().await.expect("refresh");

    let detail = board.open(9).await.expect("open");
    assert_eq!(detail.task.title, "Test New Badge");
    assert!(!detail.task.is_new);
    assert!(detail.case.is_none());
    assert_eq!(board.source().list_calls(), 2);

    assert!(board.engine_mut().mark_viewed().is_none());
    board.close();

    board.open(9).await.expect("reopen");
    assert_eq!(board.source().list_calls(), 2);
}

#[tokio::test]
async fn failed_view_report_still_opens_detail() {
    let source = MemorySource::seeded();
    source.fail_on(1);
    let mut board = board(source, 10);
    board.refresh().await.expect("refresh");

    let detail = board.open(1).await.expect("open");
    assert_eq!(detail.task.id, 1);
    assert_eq!(board.source().stored(1).map(|t| t.is_new), Some(true));
}

#[tokio::test]
async fn failed_reload_after_view_report_still_opens_detail() {
    let mut board = board(MemorySource::seeded(), 10);
    board.refresh().await.expect("refresh");
    board.source().fail_lists();

    let detail = board.open(9).await.expect("open");
    assert_eq!(detail.task.id, 9);
    assert_eq!(board.source().stored(9).map(|t| t.is_new), Some(false));
    assert_eq!(board.source().list_calls(), 2);
}

fn complete_form() -> TaskForm {
    TaskForm {
        title: "File Motion".into(),
        description: "Prepare and file the motion.".into(),
        assigned_to: "2".into(),
        status: "Due".into(),
        due_date: "2024-07-01".into(),
        priority: "Medium".into(),
        ..TaskForm::default()
    }
}

#[tokio::test]
async fn create_resolves_names_and_refreshes() {
    let mut board = board(MemorySource::seeded(), 10);
    board.refresh().await.expect("refresh");
    let refs = board.references().await.expect("references");

    let mut form = complete_form();
    form.select_case("1", &refs.cases, &refs.matters);
    assert_eq!(form.matter, "1");

    let created = board.create(&form).await.expect("create");
    assert!(created.is_new);
    assert_eq!(created.assignee_name.as_deref(), Some("Bob Johnson"));
    assert_eq!(created.case_number.as_deref(), Some("CASE-001"));
    assert_eq!(created.due_date.as_deref(), Some("2024-07-01T00:00:00Z"));
    assert!(board.engine().task(created.id).is_some());
    assert_eq!(board.engine().tasks().len(), 10);
}

#[tokio::test]
async fn invalid_form_never_reaches_the_source() {
    let mut board = board(MemorySource::seeded(), 10);
    board.refresh().await.expect("refresh");

    let form = TaskForm {
        title: "x".into(),
        ..complete_form()
    };
    let err = board.create(&form).await.expect_err("invalid");
    match err.downcast_ref::<BoardError>() {
        Some(BoardError::Validation(errors)) => {
            assert_eq!(errors.fields(), vec!["title", "case_id"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(board.source().list_calls(), 1);
    assert_eq!(board.engine().tasks().len(), 9);
}

#[tokio::test]
async fn update_merges_form_over_stored_task() {
    let mut board = board(MemorySource::seeded(), 10);
    board.refresh().await.expect("refresh");

    let current = board.engine().task(8).cloned().expect("task 8");
    let mut form = TaskForm::from_task(&current);
    form.title = "Client Feedback Round 2".into();
    form.assigned_to = "1".into();
    form.priority = "High".into();
    form.due_date = "2024-06-28".into();
    form.case_id = "2".into();
    form.matter = "2".into();

    let updated = board.update(8, &form).await.expect("update");
    assert_eq!(updated.title, "Client Feedback Round 2");
    assert_eq!(updated.assignee_name.as_deref(), Some("Alice Smith"));
    assert_eq!(updated.case_number.as_deref(), Some("CASE-002"));
    assert_eq!(updated.created_at, current.created_at);
    assert_eq!(
        board.engine().task(8).map(|t| t.title.clone()),
        Some("Client Feedback Round 2".to_string())
    );

    let missing = board.update(404, &form).await.expect_err("unknown");
    assert!(matches!(
        missing.downcast_ref::<BoardError>(),
        Some(BoardError::UnknownTask(404))
    ));
}

#[tokio::test]
async fn filters_survive_a_refresh() {
    let mut board = board(MemorySource::seeded(), 5);
    board.refresh().await.expect("refresh");
    board.engine_mut().set_status_filter("over_due");
    assert_eq!(visible_ids(&board), vec![7]);

    board.reload_tasks().await.expect("reload");
    assert_eq!(visible_ids(&board), vec![7]);
    assert_eq!(board.engine().filters().query(), "");
}
