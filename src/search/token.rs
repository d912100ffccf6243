//! Search tokens and cooperative cancellation.
//!
//! Each search invocation publishes a fresh random token into a shared cell.
//! A scan keeps a [`CancelCheck`] holding the token it started with and stops
//! as soon as the cell holds anything else.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;

use crate::util::random_string;

/// Default length of generated tokens
pub const DEFAULT_TOKEN_LEN: usize = 18;

/// Opaque per-invocation search identifier. The empty token means "cancel all".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SearchToken(String);

impl SearchToken {
    fn generate(len: usize) -> Self {
        Self(random_string(len.max(1)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SearchToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Anything a scan loop can poll to learn it should stop
pub trait Cancellation {
    fn is_cancelled(&self) -> bool;
}

impl<F> Cancellation for F
where
    F: Fn() -> bool,
{
    fn is_cancelled(&self) -> bool {
        self()
    }
}

/// Cancellation predicate for one search invocation
#[derive(Debug, Clone)]
pub struct CancelCheck {
    captured: SearchToken,
    live: watch::Receiver<SearchToken>,
}

impl CancelCheck {
    /// True once the live token was cleared or replaced by a newer search
    pub fn is_cancelled(&self) -> bool {
        let live = self.live.borrow();
        let cancelled = live.is_empty() || *live != self.captured;
        if cancelled {
            tracing::trace!(
                "Search {} superseded (live token {:?})",
                self.captured,
                live.as_str()
            );
        }
        cancelled
    }

    /// The token this check was created with
    pub fn token(&self) -> &SearchToken {
        &self.captured
    }
}

impl Cancellation for CancelCheck {
    fn is_cancelled(&self) -> bool {
        CancelCheck::is_cancelled(self)
    }
}

#[derive(Debug)]
struct Shared {
    live: watch::Sender<SearchToken>,
    /// Writer gate; also holds the last keyword so both change together
    last_keyword: Mutex<String>,
    token_len: usize,
}

/// Owner of the live search token.
///
/// Clones share the same cell. Every write to it goes through the writer gate,
/// so a reader never observes a transition that is still in progress.
#[derive(Debug, Clone)]
pub struct SearchSession {
    shared: Arc<Shared>,
}

impl Default for SearchSession {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_LEN)
    }
}

impl SearchSession {
    pub fn new(token_len: usize) -> Self {
        let (live, _) = watch::channel(SearchToken::default());
        Self {
            shared: Arc::new(Shared {
                live,
                last_keyword: Mutex::new(String::new()),
                token_len,
            }),
        }
    }

    fn writer(&self) -> MutexGuard<'_, String> {
        self.shared
            .last_keyword
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start a search for `keyword`, superseding every search still running.
    pub fn begin_search(&self, keyword: &str) -> CancelCheck {
        let token = SearchToken::generate(self.shared.token_len);
        {
            let mut last_keyword = self.writer();
            last_keyword.clear();
            last_keyword.push_str(keyword);

            self.shared.live.send_replace(token.clone());
            if *self.shared.live.borrow() != token {
                tracing::warn!(
                    "Published search token {} was not observed, a later search will resync",
                    token
                );
            }
        }
        tracing::trace!("Search {} started for {:?}", token, keyword);

        CancelCheck {
            captured: token,
            live: self.shared.live.subscribe(),
        }
    }

    /// Cancel every running search without starting a new one
    pub fn cancel_all(&self) {
        let _gate = self.writer();
        self.shared.live.send_replace(SearchToken::default());
    }

    /// Cancel everything and forget the last keyword
    pub fn reset(&self) {
        let mut last_keyword = self.writer();
        last_keyword.clear();
        self.shared.live.send_replace(SearchToken::default());
    }

    pub fn last_keyword(&self) -> String {
        self.writer().clone()
    }

    /// Token of the most recent search (empty after a cancel)
    pub fn live_token(&self) -> SearchToken {
        self.shared.live.borrow().clone()
    }
}
