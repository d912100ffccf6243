//! Cancellable search and filtering
//!
//! - [`SearchSession`] / [`CancelCheck`]: token-based cooperative cancellation
//! - [`FilterEngine`]: change-detecting list filter built on top of it
//! - [`KeywordMatcher`]: substring and fuzzy predicates for filtering text

mod filter;
mod matcher;
mod token;

pub use filter::{
    filter_mode_enabled, is_good_keyword, load_label, search, trigger_refilter, FilterEngine,
    FilterRequest, FilterView, LoadLabel, Refresh, ResultBuffer, ScanContext, ScanFuture,
    ScanOutcome, ScanPhase, ScanStrategy,
};
pub use matcher::{KeywordMatcher, MatchMode};
pub use token::{CancelCheck, Cancellation, SearchSession, SearchToken, DEFAULT_TOKEN_LEN};
