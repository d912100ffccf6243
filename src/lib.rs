//! editflow - editor state mutation pipeline
//!
//! This crate provides the state model, undo/redo history and mutation
//! pipeline of a text editor, plus a cancellable list filter for
//! search-as-you-type.

pub mod cli;
pub mod config;
pub mod config_paths;
pub mod debug_dump;
pub mod editable;
pub mod pipeline;
pub mod search;
pub mod syntax;
pub mod tracing;
pub mod util;

// Re-export commonly used types
pub use config::EditorConfig;
pub use editable::{EditState, FieldsId, Focus, UndoRedoStack};
pub use pipeline::{ApplyOutcome, EditorSession, Origin, SaveMode};
pub use search::{FilterEngine, FilterRequest, SearchSession};
