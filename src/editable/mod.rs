//! Editor content model for the mutation pipeline.
//!
//! # Architecture
//!
//! - [`EditState`]: immutable snapshot of lines, selection and focus
//! - [`FieldsId`]: content fingerprint, regenerated on every content change
//! - [`UndoRedoStack`]: bounded undo/redo stacks of whole states
//!
//! # Example
//!
//! ```
//! use editflow::editable::{EditState, Focus};
//!
//! let state = EditState::from_text("hello\nworld");
//! let moved = state.with_focus(Focus::Line(1));
//! assert!(state.same_fields(&moved));
//!
//! let edited = state.replace_line(0, "howdy").unwrap();
//! assert!(!state.same_fields(&edited));
//! ```

mod fields_id;
mod history;
mod selection;
mod state;

pub use fields_id::FieldsId;
pub use history::{UndoRedoStack, DEFAULT_HISTORY_CAPACITY};
pub use selection::{Position, Selection};
pub use state::{EditState, Focus, Line, LineBreak};
