//! Undo/redo history of whole edit states.
//!
//! Each stack is bounded; pushing past the bound evicts the oldest entry.
//! Whether a push also clears redo is decided by the mutation pipeline, not here.

use std::collections::VecDeque;

use super::state::EditState;

/// Default bound for each stack
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// Two independent bounded stacks of [`EditState`]
#[derive(Debug, Clone)]
pub struct UndoRedoStack {
    undo_stack: VecDeque<EditState>,
    redo_stack: VecDeque<EditState>,
    max_size: usize,
}

impl Default for UndoRedoStack {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoRedoStack {
    /// Create a new history with the default capacity
    pub fn new() -> Self {
        Self::with_max_size(DEFAULT_HISTORY_CAPACITY)
    }

    /// Create a new history with the given capacity per stack (at least 1)
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_size: max_size.max(1),
        }
    }

    pub fn push_undo(&mut self, state: EditState) {
        Self::push_bounded(&mut self.undo_stack, state, self.max_size);
    }

    pub fn push_redo(&mut self, state: EditState) {
        Self::push_bounded(&mut self.redo_stack, state, self.max_size);
    }

    pub fn pop_undo(&mut self) -> Option<EditState> {
        self.undo_stack.pop_back()
    }

    pub fn pop_redo(&mut self) -> Option<EditState> {
        self.redo_stack.pop_back()
    }

    pub fn clear_redo(&mut self) {
        self.redo_stack.clear();
    }

    pub fn is_undo_empty(&self) -> bool {
        self.undo_stack.is_empty()
    }

    pub fn is_redo_empty(&self) -> bool {
        self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Clear both stacks (e.g. after reloading the file)
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    fn push_bounded(stack: &mut VecDeque<EditState>, state: EditState, max_size: usize) {
        stack.push_back(state);
        while stack.len() > max_size {
            stack.pop_front();
        }
    }
}
