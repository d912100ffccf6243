//! Highlight spans produced by the external highlighter, and the cache that
//! keys them by content fingerprint.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::editable::FieldsId;

/// Style class reported by the highlighter; its meaning is up to the renderer
pub type HighlightId = u16;

/// Number of fingerprints kept by [`HighlightCache::new`]
pub const DEFAULT_CACHE_CAPACITY: usize = 32;

/// A single highlighted span within a line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightToken {
    /// Start column (0-indexed, inclusive)
    pub start_col: usize,
    /// End column (exclusive)
    pub end_col: usize,
    pub highlight: HighlightId,
}

/// Highlight information for a single line
#[derive(Debug, Clone, Default)]
pub struct LineHighlights {
    /// Tokens sorted by start_col
    pub tokens: Vec<HighlightToken>,
}

/// Highlights for one version of the content
#[derive(Debug, Clone, Default)]
pub struct SyntaxHighlights {
    /// Map of line number (0-indexed) → tokens
    pub lines: HashMap<usize, LineHighlights>,
    /// Fingerprint of the content these spans were computed for
    pub fields_id: FieldsId,
}

impl SyntaxHighlights {
    pub fn new(fields_id: FieldsId) -> Self {
        Self {
            lines: HashMap::new(),
            fields_id,
        }
    }

    /// Get highlight tokens for a line, or empty slice if none
    pub fn get_line_tokens(&self, line: usize) -> &[HighlightToken] {
        self.lines
            .get(&line)
            .map(|lh| lh.tokens.as_slice())
            .unwrap_or(&[])
    }

    pub fn token_count(&self) -> usize {
        self.lines.values().map(|lh| lh.tokens.len()).sum()
    }
}

#[derive(Debug)]
struct CacheInner {
    entries: HashMap<FieldsId, Arc<SyntaxHighlights>>,
    order: VecDeque<FieldsId>,
    capacity: usize,
}

/// Highlight results keyed by fingerprint.
///
/// Results for older fingerprints are kept (up to the capacity) so that
/// undoing back to an earlier state can reuse them.
#[derive(Debug, Clone)]
pub struct HighlightCache {
    inner: Arc<Mutex<CacheInner>>,
}

impl Default for HighlightCache {
    fn default() -> Self {
        Self::new()
    }
}

impl HighlightCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheInner {
                entries: HashMap::new(),
                order: VecDeque::new(),
                capacity: capacity.max(1),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, fields_id: &FieldsId) -> Option<Arc<SyntaxHighlights>> {
        self.lock().entries.get(fields_id).cloned()
    }

    pub fn contains(&self, fields_id: &FieldsId) -> bool {
        self.lock().entries.contains_key(fields_id)
    }

    /// Store highlights under their own fingerprint, evicting the oldest entry when full
    pub fn insert(&self, highlights: SyntaxHighlights) {
        let mut inner = self.lock();
        let key = highlights.fields_id.clone();
        if inner.entries.insert(key.clone(), Arc::new(highlights)).is_none() {
            inner.order.push_back(key);
        }
        while inner.order.len() > inner.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn highlights_for(id: &str) -> SyntaxHighlights {
        let mut highlights = SyntaxHighlights::new(FieldsId::from(id));
        highlights.lines.insert(
            0,
            LineHighlights {
                tokens: vec![HighlightToken {
                    start_col: 0,
                    end_col: 2,
                    highlight: 1,
                }],
            },
        );
        highlights
    }

    #[test]
    fn test_line_tokens_default_to_empty() {
        let highlights = highlights_for("a");
        assert_eq!(highlights.get_line_tokens(0).len(), 1);
        assert!(highlights.get_line_tokens(7).is_empty());
    }

    #[test]
    fn test_cache_lookup_by_fingerprint() {
        let cache = HighlightCache::new();
        cache.insert(highlights_for("a"));

        assert!(cache.contains(&FieldsId::from("a")));
        assert!(cache.get(&FieldsId::from("b")).is_none());
        assert_eq!(cache.get(&FieldsId::from("a")).unwrap().token_count(), 1);
    }

    #[test]
    fn test_cache_evicts_oldest() {
        let cache = HighlightCache::with_capacity(2);
        cache.insert(highlights_for("a"));
        cache.insert(highlights_for("b"));
        cache.insert(highlights_for("c"));

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(&FieldsId::from("a")));
        assert!(cache.contains(&FieldsId::from("c")));
    }

    #[test]
    fn test_cache_reinsert_does_not_duplicate_order() {
        let cache = HighlightCache::with_capacity(2);
        cache.insert(highlights_for("a"));
        cache.insert(highlights_for("a"));
        cache.insert(highlights_for("b"));

        assert!(cache.contains(&FieldsId::from("a")));
        assert!(cache.contains(&FieldsId::from("b")));
    }
}
