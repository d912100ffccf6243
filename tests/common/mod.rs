//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use editflow::editable::{EditState, Line, LineBreak};
use editflow::syntax::{HighlightId, HighlightToken, Highlighter, LineHighlights, SyntaxHighlights};
use editflow::EditorSession;

/// Session over `text` with a generous history
pub fn test_session(text: &str) -> EditorSession {
    EditorSession::new(EditState::from_text(text), 100)
}

/// Replace line `idx` of the session's current state
pub fn edit_line(session: &EditorSession, idx: usize, text: &str) -> EditState {
    session
        .current()
        .replace_line(idx, text)
        .expect("line index in range")
}

/// Source list of `n` lines: "item 0", "item 1", ...
pub fn numbered_lines(n: usize) -> Arc<[Line]> {
    (0..n)
        .map(|i| Line::new(format!("item {}", i), LineBreak::Lf))
        .collect::<Vec<_>>()
        .into()
}

pub fn texts(lines: &[Line]) -> Vec<String> {
    lines.iter().map(|l| l.text.clone()).collect()
}

const KEYWORD: HighlightId = 3;

/// Highlighter marking the first word of every non-empty line as a keyword
pub fn first_word_highlighter() -> Arc<dyn Highlighter> {
    Arc::new(|content: &[Line]| {
        let mut highlights = SyntaxHighlights::default();
        for (idx, line) in content.iter().enumerate() {
            let end = line.text.find(' ').unwrap_or(line.text.len());
            if end > 0 {
                highlights.lines.insert(
                    idx,
                    LineHighlights {
                        tokens: vec![HighlightToken {
                            start_col: 0,
                            end_col: end,
                            highlight: KEYWORD,
                        }],
                    },
                );
            }
        }
        highlights
    })
}

/// Poll `condition` until it holds, panicking after a couple of seconds
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
