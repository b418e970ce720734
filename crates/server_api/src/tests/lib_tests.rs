use super::*;
use shared::domain::MAX_TITLE_CHARS;
use std::sync::Arc;

async fn setup() -> ApiContext {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    ApiContext::new(storage)
}

fn add(title: &str) -> Event {
    Event::Add {
        title: title.to_string(),
    }
}

#[tokio::test]
async fn render_of_empty_store_has_zero_counts() {
    let ctx = setup().await;
    let view = render(&ctx).await.expect("render");
    assert!(view.rows.is_empty());
    assert_eq!((view.total, view.active), (0, 0));
    assert!(view.input.is_empty());
}

#[tokio::test]
async fn add_event_appends_row_and_clears_input() {
    let ctx = setup().await;
    let view = dispatch(&ctx, add("Buy milk")).await.expect("dispatch");
    assert_eq!(view.rows.len(), 1);
    assert_eq!(view.rows[0].title, "Buy milk");
    assert_eq!(view.rows[0].status, "❌");
    assert!(!view.rows[0].is_completed);
    assert_eq!((view.total, view.active), (1, 1));
    assert!(view.input.is_empty());
}

#[tokio::test]
async fn render_never_adds_tasks() {
    let ctx = setup().await;
    dispatch(&ctx, add("once")).await.expect("dispatch");
    render(&ctx).await.expect("render");
    let view = render(&ctx).await.expect("render");
    assert_eq!(view.total, 1);
}

#[tokio::test]
async fn blank_add_leaves_counts_unchanged() {
    let ctx = setup().await;
    dispatch(&ctx, add("real")).await.expect("dispatch");
    let view = dispatch(&ctx, add("   ")).await.expect("dispatch");
    assert_eq!((view.total, view.active), (1, 1));
}

#[tokio::test]
async fn overlong_add_is_a_validation_error() {
    let ctx = setup().await;
    let err = dispatch(&ctx, add(&"z".repeat(MAX_TITLE_CHARS + 1)))
        .await
        .expect_err("should fail");
    assert!(matches!(err.code, ErrorCode::Validation));
}

#[tokio::test]
async fn toggle_event_flips_status_glyph_and_active_count() {
    let ctx = setup().await;
    let view = dispatch(&ctx, add("A")).await.expect("dispatch");
    let id = view.rows[0].id;

    let view = dispatch(&ctx, Event::Toggle { id }).await.expect("toggle");
    assert_eq!(view.rows[0].status, "✅");
    assert_eq!((view.total, view.active), (1, 0));

    let view = dispatch(&ctx, Event::Toggle { id }).await.expect("toggle");
    assert_eq!(view.rows[0].status, "❌");
    assert_eq!((view.total, view.active), (1, 1));
}

#[tokio::test]
async fn toggle_of_missing_task_is_not_found() {
    let ctx = setup().await;
    let err = dispatch(&ctx, Event::Toggle { id: TaskId(404) })
        .await
        .expect_err("should fail");
    assert!(matches!(err.code, ErrorCode::NotFound));
}

#[tokio::test]
async fn delete_of_missing_task_still_renders() {
    let ctx = setup().await;
    dispatch(&ctx, add("stay")).await.expect("dispatch");
    let view = dispatch(&ctx, Event::Delete { id: TaskId(404) })
        .await
        .expect("dispatch");
    assert_eq!(view.total, 1);
}

#[tokio::test]
async fn end_to_end_add_toggle_delete() {
    let ctx = setup().await;
    dispatch(&ctx, add("A")).await.expect("add A");
    let view = dispatch(&ctx, add("B")).await.expect("add B");
    let titles: Vec<_> = view.rows.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, ["A", "B"]);
    let (a, b) = (view.rows[0].id, view.rows[1].id);

    let view = dispatch(&ctx, Event::Toggle { id: a }).await.expect("toggle A");
    assert_eq!(view.active, 1);
    let active = ctx.storage.list_active().await.expect("active");
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].title, "B");

    let view = dispatch(&ctx, Event::Delete { id: b }).await.expect("delete B");
    assert_eq!(view.rows.len(), 1);
    assert_eq!(view.rows[0].title, "A");
    assert!(view.rows[0].is_completed);
    assert_eq!((view.total, view.active), (1, 0));
}

#[tokio::test]
async fn overlong_add_leaves_store_untouched() {
    let ctx = setup().await;
    dispatch(&ctx, add(&"z".repeat(MAX_TITLE_CHARS + 1)))
        .await
        .expect_err("should fail");
    let view = dispatch(&ctx, add(&"z".repeat(MAX_TITLE_CHARS)))
        .await
        .expect("exact limit accepted");
    assert_eq!(view.total, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn render_counters_agree_with_rows_under_concurrent_writes() {
    let ctx = Arc::new(setup().await);

    let writers: Vec<_> = (0..40)
        .map(|n| {
            let ctx = ctx.clone();
            tokio::spawn(async move {
                let view = dispatch(&ctx, add(&format!("task-{n}")))
                    .await
                    .expect("add");
                let id = view
                    .rows
                    .iter()
                    .find(|row| row.title == format!("task-{n}"))
                    .expect("added row")
                    .id;
                dispatch(&ctx, Event::Toggle { id }).await.expect("toggle");
            })
        })
        .collect();

    let reader = {
        let ctx = ctx.clone();
        tokio::spawn(async move {
            for _ in 0..200 {
                let view = render(&ctx).await.expect("render");
                let active_rows = view.rows.iter().filter(|r| !r.is_completed).count() as u64;
                assert!(view.active <= view.total);
                assert_eq!(view.total, view.rows.len() as u64);
                assert_eq!(view.active, active_rows);
                tokio::task::yield_now().await;
            }
        })
    };

    for writer in writers {
        writer.await.expect("writer");
    }
    reader.await.expect("reader");

    let view = render(&ctx).await.expect("render");
    assert_eq!((view.total, view.active), (40, 0));
}
