//! Debug state dump for development diagnostics
//!
//! Serializes a snapshot of an editor session to JSON.

use serde::Serialize;

use crate::editable::{FieldsId, Focus, Selection};
use crate::pipeline::EditorSession;

#[derive(Debug, Serialize)]
pub struct SessionDump {
    pub editor: String,
    pub fields_id: FieldsId,
    pub line_count: usize,
    pub char_count: usize,
    pub focus: Focus,
    pub selection: Option<Selection>,
    pub is_content_edited: bool,
    pub is_snapshotted: bool,
    pub undo_stack_size: usize,
    pub redo_stack_size: usize,
    pub remembered_column: Option<usize>,
    pub has_highlights: bool,
}

impl SessionDump {
    pub async fn capture(session: &EditorSession) -> Self {
        let (undo_stack_size, redo_stack_size) = session.history_depths().await;
        let state = session.current();
        Self {
            editor: session.id().to_string(),
            fields_id: state.fields_id().clone(),
            line_count: state.line_count(),
            char_count: state.content().iter().map(|l| l.text.chars().count()).sum(),
            focus: state.focus,
            selection: state.selection,
            is_content_edited: state.is_content_edited,
            is_snapshotted: state.is_snapshotted,
            undo_stack_size,
            redo_stack_size,
            remembered_column: session.remembered_column(),
            has_highlights: session.current_highlights().is_some(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editable::EditState;

    #[tokio::test]
    async fn test_dump_reports_history_depths() {
        let session = EditorSession::new(EditState::from_text("a\nb"), 10);
        let edited = session.current().replace_line(0, "c").unwrap();
        session.edit(edited).await;

        let dump = SessionDump::capture(&session).await;
        assert_eq!(dump.line_count, 2);
        assert_eq!(dump.undo_stack_size, 1);
        assert_eq!(dump.redo_stack_size, 0);

        let json = dump.to_json().unwrap();
        assert!(json.contains("\"undo_stack_size\": 1"));
    }
}
