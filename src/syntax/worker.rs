//! Background highlighting task

use std::sync::{Arc, Weak};

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use super::{HighlightCache, Highlighter};
use crate::pipeline::{ApplyOutcome, EditorSession, HighlightRequest, Origin, SaveMode};

/// Runs the highlighter for each committed fingerprint and reports back.
pub struct HighlightWorker;

impl HighlightWorker {
    /// Spawn the worker loop. It exits when the session is dropped.
    pub fn spawn(
        session: Weak<EditorSession>,
        mut rx: UnboundedReceiver<HighlightRequest>,
        highlighter: Arc<dyn Highlighter>,
        cache: HighlightCache,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(mut request) = rx.recv().await {
                // Anything queued behind this request supersedes it
                while let Ok(newer) = rx.try_recv() {
                    request = newer;
                }

                if cache.contains(request.fields_id()) {
                    continue;
                }

                match session.upgrade() {
                    Some(live) => {
                        if live.current().fields_id() != request.fields_id() {
                            tracing::debug!(
                                "Skipping stale highlight request: fields_id={}",
                                request.fields_id()
                            );
                            continue;
                        }
                    }
                    None => break,
                }

                let pass = Arc::clone(&highlighter);
                let content = request.state.shared_content();
                let mut highlights =
                    match tokio::task::spawn_blocking(move || pass.highlight(&content)).await {
                        Ok(highlights) => highlights,
                        Err(e) => {
                            tracing::warn!(
                                "Highlighter failed for fields_id={}: {}",
                                request.fields_id(),
                                e
                            );
                            continue;
                        }
                    };
                highlights.fields_id = request.fields_id().clone();
                tracing::debug!(
                    "Highlighted fields_id={} ({} lines, {} tokens)",
                    highlights.fields_id,
                    highlights.lines.len(),
                    highlights.token_count()
                );
                cache.insert(highlights);

                let Some(live) = session.upgrade() else {
                    break;
                };
                let caller = request.fields_id().clone();
                let outcome = live
                    .apply(
                        (*request.state).clone(),
                        SaveMode::ToUndo,
                        false,
                        &caller,
                        Origin::StylingApplied,
                    )
                    .await;
                if outcome == ApplyOutcome::Stale {
                    tracing::trace!("Highlights for {} kept in cache only", caller);
                }
            }
            tracing::debug!("Highlight worker stopped");
        })
    }
}
