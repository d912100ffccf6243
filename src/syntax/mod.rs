//! Syntax highlighting collaborator contract
//!
//! The highlighting algorithm itself lives outside this crate. This module
//! defines what the pipeline needs from it:
//! - [`Highlighter`]: turns line content into spans
//! - [`HighlightCache`]: spans keyed by content fingerprint
//! - [`HighlightWorker`]: background task running the highlighter
//!
//! ## Architecture
//!
//! ```text
//! EditorSession::apply → HighlightRequest (new fields_id)
//!              → (worker task) → Highlighter::highlight on blocking pool
//!              → HighlightCache::insert → apply(.., Origin::StylingApplied)
//! ```
//!
//! The callback is fingerprint-checked by the pipeline, so a slow pass never
//! overwrites newer content.

mod highlights;
mod worker;

pub use highlights::{
    HighlightCache, HighlightId, HighlightToken, LineHighlights, SyntaxHighlights,
    DEFAULT_CACHE_CAPACITY,
};
pub use worker::HighlightWorker;

use crate::editable::Line;

/// Computes highlight spans for a version of the content.
///
/// Called on tokio's blocking pool; implementations may be slow.
/// The returned value's `fields_id` is overwritten by the worker.
pub trait Highlighter: Send + Sync + 'static {
    fn highlight(&self, content: &[Line]) -> SyntaxHighlights;
}

impl<F> Highlighter for F
where
    F: Fn(&[Line]) -> SyntaxHighlights + Send + Sync + 'static,
{
    fn highlight(&self, content: &[Line]) -> SyntaxHighlights {
        self(content)
    }
}
