//! Editor state mutation pipeline
//!
//! Every change to an editor's content goes through [`EditorSession::apply`].
//! Each session owns one async mutex, so commits for one editor are totally
//! ordered while independent editors never contend.
//!
//! ```text
//! user input ──┐
//!              ├─► apply (per-editor lock) ─► commit current ─► fingerprint diff
//! highlighter ─┘                                              │
//!                          undo/redo bookkeeping ◄────────────┤
//!                          highlight request ◄────────────────┘
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;

use crate::editable::{EditState, FieldsId, UndoRedoStack};
use crate::syntax::{HighlightCache, HighlightWorker, Highlighter, SyntaxHighlights};

static NEXT_EDITOR_ID: AtomicU64 = AtomicU64::new(1);

const NO_COLUMN: usize = usize::MAX;

/// Identifies one open editor instance (used for logging)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EditorId(pub u64);

impl EditorId {
    fn next() -> Self {
        Self(NEXT_EDITOR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for EditorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "editor-{}", self.0)
    }
}

/// Where the superseded state goes when the content changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// Regular edits and redo replays: previous state goes to the undo stack
    ToUndo,
    /// Undo replays: previous state goes to the redo stack
    ToRedo,
}

/// Who produced a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    User,
    /// A completed asynchronous highlighting pass
    StylingApplied,
}

/// Result of [`EditorSession::apply`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Committed {
        /// False for selection/focus-only changes (no history entry)
        content_changed: bool,
    },
    /// The caller's fingerprint no longer matches the current state; nothing changed
    Stale,
}

impl ApplyOutcome {
    pub fn content_changed(&self) -> bool {
        matches!(
            self,
            ApplyOutcome::Committed {
                content_changed: true
            }
        )
    }
}

/// Sent to the highlighting collaborator whenever a new fingerprint is committed
#[derive(Debug, Clone)]
pub struct HighlightRequest {
    pub state: Arc<EditState>,
}

impl HighlightRequest {
    pub fn fields_id(&self) -> &FieldsId {
        self.state.fields_id()
    }
}

#[derive(Debug)]
struct EditorCore {
    history: UndoRedoStack,
}

/// One open editor: current state, history and the lock that serializes mutations
pub struct EditorSession {
    id: EditorId,
    core: Mutex<EditorCore>,
    /// Single writer: only `commit_locked` sends, always while holding `core`
    current: watch::Sender<Arc<EditState>>,
    remembered_column: AtomicUsize,
    highlight_tx: Option<mpsc::UnboundedSender<HighlightRequest>>,
    highlights: HighlightCache,
}

impl fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorSession")
            .field("id", &self.id)
            .field("fields_id", self.current.borrow().fields_id())
            .field("highlighting", &self.highlight_tx.is_some())
            .finish()
    }
}

impl EditorSession {
    /// Create a session without a highlighting collaborator
    pub fn new(initial: EditState, history_capacity: usize) -> Self {
        Self::build(initial, history_capacity, None, HighlightCache::new())
    }

    /// Create a session wired to a background highlighter.
    ///
    /// Must be called inside a tokio runtime. The worker stops once the
    /// returned session is dropped.
    pub fn with_highlighter(
        initial: EditState,
        history_capacity: usize,
        highlighter: Arc<dyn Highlighter>,
    ) -> (Arc<Self>, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let cache = HighlightCache::new();
        let session = Arc::new(Self::build(
            initial,
            history_capacity,
            Some(tx),
            cache.clone(),
        ));
        let worker = HighlightWorker::spawn(Arc::downgrade(&session), rx, highlighter, cache);
        session.request_highlight(&session.current());
        (session, worker)
    }

    fn build(
        initial: EditState,
        history_capacity: usize,
        highlight_tx: Option<mpsc::UnboundedSender<HighlightRequest>>,
        highlights: HighlightCache,
    ) -> Self {
        let id = EditorId::next();
        tracing::debug!(
            "{}: opened with {} lines, fields_id={}",
            id,
            initial.line_count(),
            initial.fields_id()
        );
        let (current, _) = watch::channel(Arc::new(initial));
        Self {
            id,
            core: Mutex::new(EditorCore {
                history: UndoRedoStack::with_max_size(history_capacity),
            }),
            current,
            remembered_column: AtomicUsize::new(NO_COLUMN),
            highlight_tx,
            highlights,
        }
    }

    pub fn id(&self) -> EditorId {
        self.id
    }

    /// Snapshot of the current state
    pub fn current(&self) -> Arc<EditState> {
        Arc::clone(&self.current.borrow())
    }

    /// Observe state changes (every commit, including focus-only ones)
    pub fn subscribe(&self) -> watch::Receiver<Arc<EditState>> {
        self.current.subscribe()
    }

    /// Highlights computed for the current fingerprint, if available yet
    pub fn current_highlights(&self) -> Option<Arc<SyntaxHighlights>> {
        self.highlights.get(self.current().fields_id())
    }

    pub fn highlight_cache(&self) -> &HighlightCache {
        &self.highlights
    }

    /// Column to aim for when moving the cursor vertically
    pub fn remembered_column(&self) -> Option<usize> {
        match self.remembered_column.load(Ordering::Acquire) {
            NO_COLUMN => None,
            column => Some(column),
        }
    }

    pub fn set_remembered_column(&self, column: usize) {
        self.remembered_column
            .store(column.min(NO_COLUMN - 1), Ordering::Release);
    }

    fn reset_remembered_column(&self) {
        self.remembered_column.store(NO_COLUMN, Ordering::Release);
    }

    /// Apply a mutation.
    ///
    /// `caller` is the fingerprint of the state the producer worked from. It is
    /// only checked for [`Origin::StylingApplied`], where a mismatch means the
    /// highlighting result belongs to superseded content and is dropped.
    pub async fn apply(
        &self,
        new_state: EditState,
        save_mode: SaveMode,
        clear_redo: bool,
        caller: &FieldsId,
        origin: Origin,
    ) -> ApplyOutcome {
        let mut core = self.core.lock().await;
        self.commit_locked(&mut core, new_state, save_mode, clear_redo, caller, origin)
    }

    /// Apply a user edit: previous state goes to undo, redo is cleared
    pub async fn edit(&self, new_state: EditState) -> ApplyOutcome {
        let caller = new_state.fields_id().clone();
        self.apply(new_state, SaveMode::ToUndo, true, &caller, Origin::User)
            .await
    }

    /// Apply a selection/focus change. Never touches redo.
    pub async fn select(&self, new_state: EditState) -> ApplyOutcome {
        let caller = new_state.fields_id().clone();
        self.apply(new_state, SaveMode::ToUndo, false, &caller, Origin::User)
            .await
    }

    /// Restore the most recent undo entry. Returns false when there is nothing to undo.
    pub async fn undo(&self) -> bool {
        let mut core = self.core.lock().await;
        let Some(target) = core.history.pop_undo() else {
            return false;
        };
        let caller = target.fields_id().clone();
        self.commit_locked(&mut core, target, SaveMode::ToRedo, false, &caller, Origin::User);
        true
    }

    /// Replay the most recent redo entry. Returns false when there is nothing to redo.
    pub async fn redo(&self) -> bool {
        let mut core = self.core.lock().await;
        let Some(target) = core.history.pop_redo() else {
            return false;
        };
        let caller = target.fields_id().clone();
        self.commit_locked(&mut core, target, SaveMode::ToUndo, false, &caller, Origin::User);
        true
    }

    /// Replace the content wholesale (file reload) and forget all history
    pub async fn reset(&self, state: EditState) {
        let mut core = self.core.lock().await;
        core.history.clear();
        self.reset_remembered_column();
        let state = Arc::new(state);
        self.current.send_replace(Arc::clone(&state));
        tracing::debug!("{}: reset to fields_id={}", self.id, state.fields_id());
        self.request_highlight(&state);
    }

    pub async fn can_undo(&self) -> bool {
        !self.core.lock().await.history.is_undo_empty()
    }

    pub async fn can_redo(&self) -> bool {
        !self.core.lock().await.history.is_redo_empty()
    }

    /// (undo, redo) stack depths
    pub async fn history_depths(&self) -> (usize, usize) {
        let core = self.core.lock().await;
        (core.history.undo_count(), core.history.redo_count())
    }

    fn commit_locked(
        &self,
        core: &mut EditorCore,
        new_state: EditState,
        save_mode: SaveMode,
        clear_redo: bool,
        caller: &FieldsId,
        origin: Origin,
    ) -> ApplyOutcome {
        let latest = self.current();

        let resolved = match origin {
            Origin::StylingApplied => {
                if caller != latest.fields_id() {
                    tracing::debug!(
                        "{}: ignoring highlighting result for fields_id={}, current is {}",
                        self.id,
                        caller,
                        latest.fields_id()
                    );
                    return ApplyOutcome::Stale;
                }
                // Keep whatever non-content fields changed while highlighting ran
                if latest.focus.is_inherit() {
                    new_state.with_focus(latest.focus)
                } else {
                    (*latest).clone()
                }
            }
            Origin::User => {
                if new_state.focus.is_inherit() {
                    new_state.with_focus(latest.focus)
                } else {
                    new_state
                }
            }
        };

        let resolved = Arc::new(resolved);
        let last_state = self.current.send_replace(Arc::clone(&resolved));

        if last_state.same_fields(&resolved) {
            tracing::trace!("{}: committed non-content change", self.id);
            return ApplyOutcome::Committed {
                content_changed: false,
            };
        }

        self.reset_remembered_column();
        match save_mode {
            SaveMode::ToRedo => core.history.push_redo((*last_state).clone()),
            SaveMode::ToUndo => {
                if clear_redo {
                    core.history.clear_redo();
                }
                core.history.push_undo((*last_state).clone());
            }
        }
        tracing::debug!(
            "{}: committed fields_id={} (undo={}, redo={})",
            self.id,
            resolved.fields_id(),
            core.history.undo_count(),
            core.history.redo_count()
        );

        self.request_highlight(&resolved);
        ApplyOutcome::Committed {
            content_changed: true,
        }
    }

    fn request_highlight(&self, state: &Arc<EditState>) {
        let Some(tx) = &self.highlight_tx else {
            return;
        };
        if state.fields_id().is_empty() || self.highlights.contains(state.fields_id()) {
            return;
        }
        if tx
            .send(HighlightRequest {
                state: Arc::clone(state),
            })
            .is_err()
        {
            tracing::warn!("{}: highlight worker is gone", self.id);
        }
    }
}
