mod common;

use chrono::NaiveDate;

use common::{Backend, GOOD_TOKEN};
use vetsoc::db::keys;
use vetsoc::notice::NoticeLevel;
use vetsoc::quotes;
use vetsoc::views::fitness::{FitnessView, ADMIN_HINT};
use vetsoc::views::SyncState;

fn seeded() -> Backend {
    let mut backend = Backend::new();
    backend.tasks = vec![
        common::sample_task("t1", "alice", true),
        common::sample_task("t2", "alice", false),
        common::sample_task("t3", "alice", false),
        common::sample_task("x1", "bob", true),
    ];
    backend
}

#[tokio::test]
async fn loads_own_tasks_with_progress() {
    let (base, _state) = common::spawn(seeded()).await;
    let ctx = common::context(&base, Some(("alice", false)), GOOD_TOKEN).await;

    let mut view = FitnessView::new(&ctx);
    view.load().await;

    assert_eq!(view.tasks().len(), 3);
    assert_eq!(view.progress(), 33);
    assert_eq!(view.completed_ids(), vec!["t1"]);
    assert_eq!(view.admin_hint(), None);
}

#[tokio::test]
async fn toggle_reconciles_with_server() {
    let (base, state) = common::spawn(seeded()).await;
    let ctx = common::context(&base, Some(("alice", false)), GOOD_TOKEN).await;

    let mut view = FitnessView::new(&ctx);
    view.load().await;
    let outcome = view.toggle_task("t2").await;

    assert_eq!(outcome, SyncState::Reconciled);
    assert_eq!(view.progress(), 67);
    assert!(state.lock().unwrap().tasks[1].is_finished);
}

#[tokio::test]
async fn failed_toggle_rolls_back() {
    let mut backend = seeded();
    backend.fail_toggle = true;
    let (base, _state) = common::spawn(backend).await;
    let ctx = common::context(&base, Some(("alice", false)), GOOD_TOKEN).await;

    let mut view = FitnessView::new(&ctx);
    view.load().await;
    let outcome = view.toggle_task("t2").await;

    assert_eq!(outcome, SyncState::RolledBack);
    assert_eq!(view.progress(), 33);
    let notices = ctx.notifier.drain();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
}

#[tokio::test]
async fn delete_recomputes_progress() {
    let (base, _state) = common::spawn(seeded()).await;
    let ctx = common::context(&base, Some(("alice", false)), GOOD_TOKEN).await;

    let mut view = FitnessView::new(&ctx);
    view.load().await;
    let outcome = view.delete_task("t3").await;

    assert_eq!(outcome, SyncState::Reconciled);
    assert_eq!(view.tasks().len(), 2);
    assert_eq!(view.progress(), 50);

    let notices = ctx.notifier.drain();
    assert_eq!(notices[0].title, "Task deleted successfully");
    assert_eq!(notices[0].description, None);
}

#[tokio::test]
async fn failed_delete_puts_task_back() {
    let mut backend = seeded();
    backend.fail_delete = true;
    let (base, _state) = common::spawn(backend).await;
    let ctx = common::context(&base, Some(("alice", false)), GOOD_TOKEN).await;

    let mut view = FitnessView::new(&ctx);
    view.load().await;
    let outcome = view.delete_task("t2").await;

    assert_eq!(outcome, SyncState::RolledBack);
    let ids: Vec<_> = view.tasks().iter().map(|t| t.task_id.as_str()).collect();
    assert_eq!(ids, vec!["t1", "t2", "t3"]);
}

#[tokio::test]
async fn add_task_appends_server_task() {
    let (base, state) = common::spawn(seeded()).await;
    let ctx = common::context(&base, Some(("alice", false)), GOOD_TOKEN).await;

    let mut view = FitnessView::new(&ctx);
    view.load().await;
    view.set_draft("  20 push-ups  ");
    assert!(view.add_task().await);

    assert_eq!(view.tasks().len(), 4);
    assert_eq!(view.tasks()[3].description, "20 push-ups");
    assert_eq!(view.progress(), 25);
    assert_eq!(state.lock().unwrap().tasks.len(), 5);
}

#[tokio::test]
async fn blank_task_is_rejected_locally() {
    let (base, state) = common::spawn(seeded()).await;
    let ctx = common::context(&base, Some(("alice", false)), GOOD_TOKEN).await;

    let mut view = FitnessView::new(&ctx);
    view.set_draft("   ");
    assert!(!view.add_task().await);

    let notices = ctx.notifier.drain();
    assert_eq!(notices[0].description.as_deref(), Some("Task cannot be empty"));
    assert_eq!(state.lock().unwrap().count("/fitness/alice/task/add"), 0);
}

#[tokio::test]
async fn administrators_get_a_hint() {
    let (base, _state) = common::spawn(seeded()).await;
    let ctx = common::context(&base, Some(("root", true)), GOOD_TOKEN).await;

    let view = FitnessView::new(&ctx);
    assert_eq!(view.admin_hint(), Some(ADMIN_HINT));
}

#[tokio::test]
async fn daily_quote_is_stable_within_a_day() {
    let (base, _state) = common::spawn(seeded()).await;
    let ctx = common::context(&base, Some(("alice", false)), GOOD_TOKEN).await;
    let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

    let mut view = FitnessView::new(&ctx);
    view.load_quote(today).await;
    let first = view.quote().cloned().unwrap();

    let mut again = FitnessView::new(&ctx);
    again.load_quote(today).await;
    assert_eq!(again.quote(), Some(&first));
    assert_eq!(
        ctx.store.get(keys::QUOTE_DATE).await.unwrap(),
        Some(quotes::date_key(today))
    );
}
