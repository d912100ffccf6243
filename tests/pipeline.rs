//! Mutation pipeline tests
//!
//! History bookkeeping, fingerprint checks and the highlighting round trip.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{edit_line, first_word_highlighter, test_session, wait_until};
use editflow::editable::{EditState, Focus, Line, Position, Selection};
use editflow::syntax::SyntaxHighlights;
use editflow::{ApplyOutcome, EditorSession, Origin, SaveMode};

// ========================================================================
// Fingerprint equivalence
// ========================================================================

#[tokio::test]
async fn test_focus_change_keeps_fingerprint_and_history() {
    let session = test_session("a\nb\nc");
    let before = session.current();

    session.select(before.with_focus(Focus::Line(1))).await;

    let after = session.current();
    assert!(before.same_fields(&after));
    assert_eq!(after.focus, Focus::Line(1));
    assert_eq!(session.history_depths().await, (0, 0));
}

#[tokio::test]
async fn test_each_content_change_adds_one_undo_entry() {
    let session = test_session("a");
    for text in ["b", "c", "d"] {
        session.edit(edit_line(&session, 0, text)).await;
    }
    assert_eq!(session.history_depths().await, (3, 0));
}

// ========================================================================
// Redo invalidation and preservation
// ========================================================================

#[tokio::test]
async fn test_new_edit_after_undo_clears_redo() {
    let session = test_session("one");
    session.edit(edit_line(&session, 0, "two")).await;
    session.undo().await;
    assert!(session.can_redo().await);

    session.edit(edit_line(&session, 0, "three")).await;

    assert!(!session.can_redo().await);
    assert_eq!(session.current().text(), "three");
}

#[tokio::test]
async fn test_selection_after_undo_keeps_redo() {
    let session = test_session("one");
    session.edit(edit_line(&session, 0, "two")).await;
    session.undo().await;

    let selected = session
        .current()
        .with_selection(Some(Selection::new(Position::new(0, 0), Position::new(0, 3))));
    session.select(selected).await;

    assert!(session.can_redo().await);
    assert!(session.redo().await);
    assert_eq!(session.current().text(), "two");
}

#[tokio::test]
async fn test_content_change_without_clearing_redo() {
    let session = test_session("one");
    session.edit(edit_line(&session, 0, "two")).await;
    session.undo().await;

    let caller = session.current().fields_id().clone();
    let outcome = session
        .apply(
            edit_line(&session, 0, "uno"),
            SaveMode::ToUndo,
            false,
            &caller,
            Origin::User,
        )
        .await;

    assert!(outcome.content_changed());
    assert_eq!(session.history_depths().await, (1, 1));
}

#[tokio::test]
async fn test_undo_redo_walk_restores_every_version() {
    let session = test_session("v0");
    for i in 1..=4 {
        session.edit(edit_line(&session, 0, &format!("v{}", i))).await;
    }

    for i in (0..4).rev() {
        assert!(session.undo().await);
        assert_eq!(session.current().text(), format!("v{}", i));
    }
    assert!(!session.undo().await);

    for i in 1..=4 {
        assert!(session.redo().await);
        assert_eq!(session.current().text(), format!("v{}", i));
    }
    assert!(!session.redo().await);
}

#[tokio::test]
async fn test_history_evicts_oldest_entries() {
    let session = EditorSession::new(EditState::from_text("v0"), 3);
    for i in 1..=5 {
        session.edit(edit_line(&session, 0, &format!("v{}", i))).await;
    }
    assert_eq!(session.history_depths().await, (3, 0));

    for _ in 0..3 {
        assert!(session.undo().await);
    }
    assert_eq!(session.current().text(), "v2");
    assert!(!session.undo().await);
}

// ========================================================================
// Highlighting callbacks
// ========================================================================

#[tokio::test]
async fn test_stale_styling_result_is_rejected() {
    let session = test_session("fn main");
    let styled_from = session.current();
    session.edit(edit_line(&session, 0, "fn other")).await;
    let latest = session.current();

    let outcome = session
        .apply(
            (*styled_from).clone(),
            SaveMode::ToUndo,
            false,
            styled_from.fields_id(),
            Origin::StylingApplied,
        )
        .await;

    assert_eq!(outcome, ApplyOutcome::Stale);
    assert!(Arc::ptr_eq(&session.current(), &latest));
    assert_eq!(session.history_depths().await, (1, 0));
}

#[tokio::test]
async fn test_fresh_styling_result_keeps_latest_focus() {
    let session = test_session("fn main\nlet x");
    let styled_from = session.current();
    session.select(styled_from.with_focus(Focus::Line(1))).await;

    let outcome = session
        .apply(
            (*styled_from).clone(),
            SaveMode::ToUndo,
            false,
            styled_from.fields_id(),
            Origin::StylingApplied,
        )
        .await;

    assert_eq!(
        outcome,
        ApplyOutcome::Committed {
            content_changed: false
        }
    );
    assert_eq!(session.current().focus, Focus::Line(1));
    assert!(!session.can_undo().await);
}

#[tokio::test]
async fn test_worker_highlights_current_content() {
    let (session, _worker) = EditorSession::with_highlighter(
        EditState::from_text("fn main\nlet x = 1"),
        100,
        first_word_highlighter(),
    );

    wait_until(|| session.current_highlights().is_some()).await;
    let highlights = session.current_highlights().unwrap();
    assert_eq!(&highlights.fields_id, session.current().fields_id());
    assert_eq!(highlights.get_line_tokens(0)[0].end_col, 2);
    assert_eq!(highlights.get_line_tokens(1)[0].end_col, 3);
    assert!(!session.can_undo().await);
}

#[tokio::test]
async fn test_worker_follows_edits() {
    let (session, _worker) = EditorSession::with_highlighter(
        EditState::from_text("fn main"),
        100,
        first_word_highlighter(),
    );
    wait_until(|| session.current_highlights().is_some()).await;

    session.edit(edit_line(&session, 0, "struct Foo")).await;

    wait_until(|| session.current_highlights().is_some()).await;
    let highlights = session.current_highlights().unwrap();
    assert_eq!(highlights.get_line_tokens(0)[0].end_col, 6);
    assert_eq!(session.current().text(), "struct Foo");
    assert_eq!(session.history_depths().await, (1, 0));
}

#[tokio::test]
async fn test_slow_highlighter_never_overwrites_newer_content() {
    let slow = Arc::new(|_content: &[Line]| {
        std::thread::sleep(Duration::from_millis(30));
        let mut highlights = SyntaxHighlights::default();
        highlights.lines.insert(0, Default::default());
        highlights
    });
    let (session, _worker) =
        EditorSession::with_highlighter(EditState::from_text("first"), 100, slow);

    for text in ["second", "third", "fourth"] {
        session.edit(edit_line(&session, 0, text)).await;
    }

    wait_until(|| session.current_highlights().is_some()).await;
    assert_eq!(session.current().text(), "fourth");
    assert_eq!(session.history_depths().await, (3, 0));
}

#[tokio::test]
async fn test_worker_stops_with_session() {
    let (session, worker) = EditorSession::with_highlighter(
        EditState::from_text("fn main"),
        100,
        first_word_highlighter(),
    );
    drop(session);

    tokio::time::timeout(Duration::from_secs(2), worker)
        .await
        .expect("worker should stop")
        .unwrap();
}

// ========================================================================
// Concurrency
// ========================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_edits_are_serialized() {
    let session = Arc::new(test_session("start"));
    let mut tasks = Vec::new();
    for i in 0..20 {
        let session = Arc::clone(&session);
        tasks.push(tokio::spawn(async move {
            let edited = session
                .current()
                .insert_line(None, format!("line {}", i))
                .unwrap();
            session.edit(edited).await
        }));
    }
    for task in tasks {
        assert!(task.await.unwrap().content_changed());
    }

    assert_eq!(session.history_depths().await, (20, 0));
    for _ in 0..20 {
        assert!(session.undo().await);
    }
    assert_eq!(session.current().text(), "start");
}

#[tokio::test]
async fn test_independent_sessions_do_not_share_history() {
    let a = test_session("a");
    let b = test_session("b");
    a.edit(edit_line(&a, 0, "aa")).await;

    assert!(a.can_undo().await);
    assert!(!b.can_undo().await);
}
