//! EditState - immutable snapshot of editor content plus cursor metadata.
//!
//! Every content-changing constructor mints a new [`FieldsId`]; selection and
//! focus changes keep the existing one.

use std::sync::Arc;

use ropey::Rope;
use serde::Serialize;

use super::fields_id::FieldsId;
use super::selection::Selection;

/// Line terminator kind of a single line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum LineBreak {
    /// Last line of the document
    #[default]
    None,
    Lf,
    CrLf,
    Cr,
    /// Any other Unicode line separator recognized by the rope
    Other(char),
}

impl LineBreak {
    fn push_to(self, out: &mut String) {
        match self {
            LineBreak::None => {}
            LineBreak::Lf => out.push('\n'),
            LineBreak::CrLf => out.push_str("\r\n"),
            LineBreak::Cr => out.push('\r'),
            LineBreak::Other(ch) => out.push(ch),
        }
    }

    /// Split a trailing line break off `raw`
    fn split(raw: &str) -> (&str, LineBreak) {
        if let Some(text) = raw.strip_suffix("\r\n") {
            return (text, LineBreak::CrLf);
        }
        let Some(last) = raw.chars().next_back() else {
            return (raw, LineBreak::None);
        };
        let text = &raw[..raw.len() - last.len_utf8()];
        match last {
            '\n' => (text, LineBreak::Lf),
            '\r' => (text, LineBreak::Cr),
            '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}' => {
                (text, LineBreak::Other(last))
            }
            _ => (raw, LineBreak::None),
        }
    }
}

/// One line record of the editor content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Line {
    pub text: String,
    pub line_break: LineBreak,
}

impl Line {
    pub fn new(text: impl Into<String>, line_break: LineBreak) -> Self {
        Self {
            text: text.into(),
            line_break,
        }
    }
}

/// Which line the cursor is focused on.
///
/// `Inherit` is the "no explicit focus" marker: the mutation pipeline replaces
/// it with the focus of the state being superseded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Focus {
    #[default]
    None,
    Line(usize),
    Inherit,
}

impl Focus {
    pub fn is_inherit(&self) -> bool {
        matches!(self, Focus::Inherit)
    }

    pub fn line(&self) -> Option<usize> {
        match self {
            Focus::Line(line) => Some(*line),
            _ => None,
        }
    }
}

/// Immutable editor snapshot
#[derive(Debug, Clone)]
pub struct EditState {
    content: Arc<[Line]>,
    fields_id: FieldsId,
    /// Current selection, if any (not part of the fingerprint)
    pub selection: Option<Selection>,
    /// Focused line (not part of the fingerprint)
    pub focus: Focus,
    /// Whether the content differs from what was loaded
    pub is_content_edited: bool,
    /// Whether the content has been snapshotted since the last edit
    pub is_snapshotted: bool,
}

impl Default for EditState {
    fn default() -> Self {
        Self::empty()
    }
}

impl EditState {
    /// Placeholder state used before a file is opened. Its fingerprint is empty.
    pub fn empty() -> Self {
        Self {
            content: Arc::from(Vec::new()),
            fields_id: FieldsId::default(),
            selection: None,
            focus: Focus::None,
            is_content_edited: false,
            is_snapshotted: false,
        }
    }

    /// Create a state from line records with a fresh fingerprint
    pub fn new(lines: Vec<Line>) -> Self {
        Self {
            content: Arc::from(lines),
            fields_id: FieldsId::generate(),
            selection: None,
            focus: Focus::None,
            is_content_edited: false,
            is_snapshotted: false,
        }
    }

    /// Split `text` into line records, keeping each line's terminator
    pub fn from_text(text: &str) -> Self {
        let rope = Rope::from_str(text);
        let lines = rope
            .lines()
            .map(|slice| {
                let raw = slice.to_string();
                let (text, line_break) = LineBreak::split(&raw);
                Line::new(text, line_break)
            })
            .collect();
        Self::new(lines)
    }

    pub fn content(&self) -> &[Line] {
        &self.content
    }

    /// Cheap shared handle to the content for background consumers
    pub fn shared_content(&self) -> Arc<[Line]> {
        Arc::clone(&self.content)
    }

    pub fn fields_id(&self) -> &FieldsId {
        &self.fields_id
    }

    pub fn line_count(&self) -> usize {
        self.content.len()
    }

    pub fn line(&self, idx: usize) -> Option<&Line> {
        self.content.get(idx)
    }

    /// Join the lines back into text
    pub fn text(&self) -> String {
        let mut out = String::new();
        for line in self.content.iter() {
            out.push_str(&line.text);
            line.line_break.push_to(&mut out);
        }
        out
    }

    /// Content-equivalence check by fingerprint.
    ///
    /// Equal ids mean equal content; selection and focus may still differ.
    pub fn same_fields(&self, other: &EditState) -> bool {
        self.fields_id == other.fields_id
    }

    /// New state with replaced content and a fresh fingerprint
    pub fn with_content(&self, lines: Vec<Line>) -> Self {
        Self {
            content: Arc::from(lines),
            fields_id: FieldsId::generate(),
            selection: self.selection,
            focus: self.focus,
            is_content_edited: true,
            is_snapshotted: false,
        }
    }

    /// Replace the text of line `idx`, keeping its terminator
    pub fn replace_line(&self, idx: usize, text: impl Into<String>) -> Option<Self> {
        let mut lines = self.content.to_vec();
        lines.get_mut(idx)?.text = text.into();
        Some(self.with_content(lines).with_focus(Focus::Line(idx)))
    }

    /// Insert a new line after `idx`; `None` inserts at the top
    pub fn insert_line(&self, after: Option<usize>, text: impl Into<String>) -> Option<Self> {
        let mut lines = self.content.to_vec();
        let at = match after {
            Some(idx) if idx < lines.len() => idx + 1,
            Some(_) => return None,
            None => 0,
        };
        // The line that used to be last now needs a terminator
        if at == lines.len() {
            if let Some(prev) = lines.last_mut() {
                if prev.line_break == LineBreak::None {
                    prev.line_break = LineBreak::Lf;
                }
            }
            lines.push(Line::new(text, LineBreak::None));
        } else {
            lines.insert(at, Line::new(text, LineBreak::Lf));
        }
        Some(self.with_content(lines).with_focus(Focus::Line(at)))
    }

    /// Remove line `idx`
    pub fn remove_line(&self, idx: usize) -> Option<Self> {
        let mut lines = self.content.to_vec();
        if idx >= lines.len() {
            return None;
        }
        let removed = lines.remove(idx);
        if idx == lines.len() {
            if let Some(last) = lines.last_mut() {
                last.line_break = removed.line_break;
            }
        }
        let focus = match lines.len() {
            0 => Focus::None,
            len => Focus::Line(idx.min(len - 1)),
        };
        Some(self.with_content(lines).with_focus(focus))
    }

    pub fn with_selection(&self, selection: Option<Selection>) -> Self {
        Self {
            selection,
            ..self.clone()
        }
    }

    pub fn with_focus(&self, focus: Focus) -> Self {
        Self {
            focus,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editable::Position;

    #[test]
    fn test_from_text_keeps_line_breaks() {
        let state = EditState::from_text("one\r\ntwo\nthree");
        assert_eq!(state.line_count(), 3);
        assert_eq!(state.content()[0], Line::new("one", LineBreak::CrLf));
        assert_eq!(state.content()[1], Line::new("two", LineBreak::Lf));
        assert_eq!(state.content()[2], Line::new("three", LineBreak::None));
        assert_eq!(state.text(), "one\r\ntwo\nthree");
    }

    #[test]
    fn test_from_text_trailing_newline_adds_empty_line() {
        let state = EditState::from_text("a\n");
        assert_eq!(state.line_count(), 2);
        assert_eq!(state.content()[1].text, "");
        assert_eq!(state.text(), "a\n");
    }

    #[test]
    fn test_empty_state_has_empty_fingerprint() {
        let state = EditState::empty();
        assert!(state.fields_id().is_empty());
        assert_eq!(state.line_count(), 0);
    }

    #[test]
    fn test_selection_change_keeps_fingerprint() {
        let state = EditState::from_text("hello\nworld");
        let selected = state.with_selection(Some(Selection::collapsed(Position::new(1, 2))));
        assert!(state.same_fields(&selected));
        assert_eq!(selected.with_focus(Focus::Line(1)).fields_id(), state.fields_id());
    }

    #[test]
    fn test_replace_line_changes_fingerprint() {
        let state = EditState::from_text("hello\nworld");
        let edited = state.replace_line(1, "there").unwrap();
        assert!(!state.same_fields(&edited));
        assert!(edited.is_content_edited);
        assert_eq!(edited.text(), "hello\nthere");
        assert_eq!(edited.focus, Focus::Line(1));
    }

    #[test]
    fn test_replace_line_out_of_range() {
        let state = EditState::from_text("hello");
        assert!(state.replace_line(3, "x").is_none());
    }

    #[test]
    fn test_insert_line_at_end_terminates_previous() {
        let state = EditState::from_text("a\nb");
        let edited = state.insert_line(Some(1), "c").unwrap();
        assert_eq!(edited.text(), "a\nb\nc");
        assert_eq!(edited.focus, Focus::Line(2));
    }

    #[test]
    fn test_insert_line_at_top() {
        let state = EditState::from_text("a\nb");
        let edited = state.insert_line(None, "top").unwrap();
        assert_eq!(edited.text(), "top\na\nb");
    }

    #[test]
    fn test_remove_last_line_moves_terminator() {
        let state = EditState::from_text("a\nb");
        let edited = state.remove_line(1).unwrap();
        assert_eq!(edited.text(), "a");
        assert_eq!(edited.focus, Focus::Line(0));
    }

    #[test]
    fn test_shared_content_is_cheap_clone() {
        let state = EditState::from_text("a\nb");
        let shared = state.shared_content();
        assert!(Arc::ptr_eq(&shared, &state.shared_content()));
    }
}
