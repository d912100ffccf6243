//! Restartable list filtering
//!
//! [`FilterEngine::refresh`] is meant to be called on every re-render. It only
//! starts a scan when something relevant changed; otherwise it hands back the
//! same result buffer untouched.
//!
//! A scan moves through `Idle → Scanning → (Completed | Cancelled) → Idle`.
//! A finished scan settles back to `Idle` on the next `refresh` or `reset`.
//! A trigger that arrives while a scan is running supersedes it through a new
//! search token instead of queueing behind it.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use super::token::{CancelCheck, Cancellation, SearchSession};
use crate::util::random_string;

const REFRESH_ID_LEN: usize = 8;

/// How a scan ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    Completed { matched: usize },
    /// Superseded or cancelled; the matches found so far stay in the buffer
    Cancelled { matched: usize },
}

impl ScanOutcome {
    pub fn matched(&self) -> usize {
        match self {
            ScanOutcome::Completed { matched } | ScanOutcome::Cancelled { matched } => *matched,
        }
    }
}

/// Lifecycle of the engine's most recent scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanPhase {
    #[default]
    Idle,
    Scanning,
    Completed,
    Cancelled,
}

impl ScanPhase {
    fn can_move_to(self, next: ScanPhase) -> bool {
        matches!(
            (self, next),
            (ScanPhase::Idle, ScanPhase::Scanning)
                | (ScanPhase::Scanning, ScanPhase::Completed)
                | (ScanPhase::Scanning, ScanPhase::Cancelled)
                | (ScanPhase::Completed, ScanPhase::Idle)
                | (ScanPhase::Cancelled, ScanPhase::Idle)
        )
    }
}

/// Keyword worth filtering by
pub fn is_good_keyword(keyword: &str) -> bool {
    !keyword.is_empty()
}

/// Filtering is only in effect when switched on and given a usable keyword
pub fn filter_mode_enabled(filter_on: bool, keyword: &str) -> bool {
    filter_on && is_good_keyword(keyword)
}

/// New refresh id; passing it to the next `refresh` forces a re-scan
pub fn trigger_refilter() -> String {
    random_string(REFRESH_ID_LEN)
}

/// Item count shown under a list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadLabel {
    /// Number of filter matches
    ItemCount(usize),
    /// Number of items loaded so far
    Loaded(usize),
}

impl fmt::Display for LoadLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadLabel::ItemCount(n) => write!(f, "{} items", n),
            LoadLabel::Loaded(n) => write!(f, "Loaded: {}", n),
        }
    }
}

/// Label for `count` items; nothing when the list is empty
pub fn load_label(count: usize, filtering: bool) -> Option<LoadLabel> {
    match (count, filtering) {
        (0, _) => None,
        (n, true) => Some(LoadLabel::ItemCount(n)),
        (n, false) => Some(LoadLabel::Loaded(n)),
    }
}

/// Walk `src` in order, reporting matches until `cancel` fires.
///
/// The cancellation check runs before every element and once more at the end.
/// `on_match` returns whether the match was accepted; only accepted matches
/// are counted.
pub fn search<T, C>(
    src: &[T],
    mut matches: impl FnMut(usize, &T) -> bool,
    mut on_match: impl FnMut(usize, &T) -> bool,
    cancel: &C,
) -> ScanOutcome
where
    C: Cancellation + ?Sized,
{
    let mut matched = 0;
    for (idx, item) in src.iter().enumerate() {
        if cancel.is_cancelled() {
            return ScanOutcome::Cancelled { matched };
        }
        if matches(idx, item) && on_match(idx, item) {
            matched += 1;
        }
    }
    if cancel.is_cancelled() {
        ScanOutcome::Cancelled { matched }
    } else {
        ScanOutcome::Completed { matched }
    }
}

#[derive(Debug)]
struct Buffers<T> {
    items: Vec<T>,
    /// Source index of each item
    indices: Vec<usize>,
}

/// Shared, incrementally filled scan results
#[derive(Debug)]
pub struct ResultBuffer<T> {
    inner: Arc<Mutex<Buffers<T>>>,
}

impl<T> Clone for ResultBuffer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for ResultBuffer<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Buffers {
                items: Vec::new(),
                indices: Vec::new(),
            })),
        }
    }
}

impl<T: Clone> ResultBuffer<T> {
    fn lock(&self) -> MutexGuard<'_, Buffers<T>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Copy of the current matches
    pub fn snapshot(&self) -> Vec<T> {
        self.lock().items.clone()
    }

    /// Source indices of the current matches
    pub fn indices(&self) -> Vec<usize> {
        self.lock().indices.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether both handles refer to the same buffer
    pub fn ptr_eq(&self, other: &ResultBuffer<T>) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn clear(&self) {
        let mut buffers = self.lock();
        buffers.items.clear();
        buffers.indices.clear();
    }

    fn clear_indices(&self) {
        self.lock().indices.clear();
    }

    /// Append unless `cancel` fired. The check happens under the buffer lock so a
    /// superseded scan cannot append after the next scan cleared the buffer.
    fn push_unless_cancelled(&self, idx: usize, item: T, cancel: &CancelCheck) -> bool {
        let mut buffers = self.lock();
        if cancel.is_cancelled() {
            return false;
        }
        buffers.items.push(item);
        buffers.indices.push(idx);
        true
    }
}

/// Handle given to a custom scan routine
pub struct ScanContext<T> {
    cancel: CancelCheck,
    results: ResultBuffer<T>,
    matched: usize,
}

impl<T: Clone> ScanContext<T> {
    pub fn cancel(&self) -> &CancelCheck {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Record a match found at source index `idx`. Returns false if the scan was superseded.
    pub fn push(&mut self, idx: usize, item: T) -> bool {
        let pushed = self.results.push_unless_cancelled(idx, item, &self.cancel);
        if pushed {
            self.matched += 1;
        }
        pushed
    }

    /// Outcome for the routine to return
    pub fn finish(self) -> ScanOutcome {
        if self.cancel.is_cancelled() {
            ScanOutcome::Cancelled {
                matched: self.matched,
            }
        } else {
            ScanOutcome::Completed {
                matched: self.matched,
            }
        }
    }
}

pub type ScanFuture = Pin<Box<dyn Future<Output = ScanOutcome> + Send>>;
type MatchFn<T> = Box<dyn FnMut(usize, &T) -> bool + Send>;
type CustomScan<T> = Box<dyn FnOnce(ScanContext<T>) -> ScanFuture + Send>;

/// How a triggered scan finds its matches
pub enum ScanStrategy<T> {
    /// Test every source element with a predicate, on the blocking pool
    Matching(MatchFn<T>),
    /// Caller-supplied async routine; it must poll the context's cancellation itself
    Custom(CustomScan<T>),
}

impl<T> ScanStrategy<T> {
    pub fn matching<F>(predicate: F) -> Self
    where
        F: FnMut(usize, &T) -> bool + Send + 'static,
    {
        ScanStrategy::Matching(Box::new(predicate))
    }

    pub fn custom<F, Fut>(routine: F) -> Self
    where
        F: FnOnce(ScanContext<T>) -> Fut + Send + 'static,
        Fut: Future<Output = ScanOutcome> + Send + 'static,
    {
        ScanStrategy::Custom(Box::new(move |ctx| Box::pin(routine(ctx))))
    }
}

/// Inputs of one `refresh` call
pub struct FilterRequest<'a> {
    pub filter_on: bool,
    pub keyword: &'a str,
    pub refresh_id: &'a str,
    /// Extra reason to re-scan, evaluated only when nothing else triggered
    pub or_condition: Option<&'a dyn Fn() -> bool>,
    /// Runs after a re-scan was decided, before the scan starts
    pub before_scan: Option<&'a mut dyn FnMut()>,
}

impl<'a> FilterRequest<'a> {
    pub fn new(keyword: &'a str, refresh_id: &'a str) -> Self {
        Self {
            filter_on: true,
            keyword,
            refresh_id,
            or_condition: None,
            before_scan: None,
        }
    }

    pub fn filter_on(mut self, on: bool) -> Self {
        self.filter_on = on;
        self
    }

    pub fn or_condition(mut self, condition: &'a dyn Fn() -> bool) -> Self {
        self.or_condition = Some(condition);
        self
    }

    pub fn before_scan(mut self, hook: &'a mut dyn FnMut()) -> Self {
        self.before_scan = Some(hook);
        self
    }
}

/// What the caller should display
#[derive(Debug)]
pub enum FilterView<T> {
    /// Filtering is off: the source list itself
    Unfiltered(Arc<[T]>),
    /// Filtering is on: the (possibly still filling) result buffer
    Filtered(ResultBuffer<T>),
}

impl<T: Clone> FilterView<T> {
    pub fn items(&self) -> Vec<T> {
        match self {
            FilterView::Unfiltered(list) => list.to_vec(),
            FilterView::Filtered(buffer) => buffer.snapshot(),
        }
    }

    pub fn is_filtered(&self) -> bool {
        matches!(self, FilterView::Filtered(_))
    }
}

/// Result of [`FilterEngine::refresh`]
#[derive(Debug)]
pub struct Refresh<T> {
    pub view: FilterView<T>,
    /// Present when this call started a scan
    pub scan: Option<JoinHandle<ScanOutcome>>,
}

#[derive(Debug, Default)]
struct Tracker {
    phase: ScanPhase,
    generation: u64,
    last_outcome: Option<ScanOutcome>,
}

impl Tracker {
    fn transition(&mut self, next: ScanPhase) {
        if self.phase.can_move_to(next) {
            self.phase = next;
        } else {
            tracing::warn!("Ignoring scan transition {:?} -> {:?}", self.phase, next);
        }
    }

    /// Settle the previous scan and enter `Scanning` for a new generation
    fn start(&mut self) -> u64 {
        if self.phase == ScanPhase::Scanning {
            self.transition(ScanPhase::Cancelled);
        }
        if matches!(self.phase, ScanPhase::Completed | ScanPhase::Cancelled) {
            self.transition(ScanPhase::Idle);
        }
        self.transition(ScanPhase::Scanning);
        self.generation += 1;
        self.generation
    }

    fn finish(&mut self, generation: u64, outcome: ScanOutcome) {
        // A superseded scan already had its phase settled by `start`
        if generation != self.generation || self.phase != ScanPhase::Scanning {
            return;
        }
        self.transition(match outcome {
            ScanOutcome::Completed { .. } => ScanPhase::Completed,
            ScanOutcome::Cancelled { .. } => ScanPhase::Cancelled,
        });
        self.last_outcome = Some(outcome);
    }

    fn settle(&mut self) {
        if matches!(self.phase, ScanPhase::Completed | ScanPhase::Cancelled) {
            self.transition(ScanPhase::Idle);
        }
    }
}

#[derive(Debug, Clone, Default)]
struct SharedTracker(Arc<Mutex<Tracker>>);

impl SharedTracker {
    fn lock(&self) -> MutexGuard<'_, Tracker> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Change-detecting, cancellable filter over a list of `T`
pub struct FilterEngine<T> {
    search: SearchSession,
    handle: Handle,
    track_list_size: bool,
    last_refresh_id: Option<String>,
    last_list_size: Option<usize>,
    results: ResultBuffer<T>,
    tracker: SharedTracker,
    scans_started: usize,
}

impl<T> fmt::Debug for FilterEngine<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterEngine")
            .field("last_refresh_id", &self.last_refresh_id)
            .field("last_list_size", &self.last_list_size)
            .field("scans_started", &self.scans_started)
            .finish()
    }
}

impl<T> FilterEngine<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// `handle` is the runtime scans are spawned on
    pub fn new(handle: Handle, search: SearchSession, track_list_size: bool) -> Self {
        Self {
            search,
            handle,
            track_list_size,
            last_refresh_id: None,
            last_list_size: None,
            results: ResultBuffer::default(),
            tracker: SharedTracker::default(),
            scans_started: 0,
        }
    }

    pub fn search_session(&self) -> &SearchSession {
        &self.search
    }

    /// The buffer handed out by every filtered refresh
    pub fn results(&self) -> &ResultBuffer<T> {
        &self.results
    }

    pub fn phase(&self) -> ScanPhase {
        self.tracker.lock().phase
    }

    pub fn is_searching(&self) -> bool {
        self.phase() == ScanPhase::Scanning
    }

    /// Outcome of the latest scan that was not superseded
    pub fn last_outcome(&self) -> Option<ScanOutcome> {
        self.tracker.lock().last_outcome
    }

    /// Number of scans started so far
    pub fn scans_started(&self) -> usize {
        self.scans_started
    }

    /// Cancel running scans and forget what was last filtered
    pub fn reset(&mut self) {
        self.search.reset();
        self.last_list_size = None;
        self.tracker.lock().settle();
    }

    pub fn refresh(
        &mut self,
        request: FilterRequest<'_>,
        list: Arc<[T]>,
        strategy: ScanStrategy<T>,
    ) -> Refresh<T> {
        if !filter_mode_enabled(request.filter_on, request.keyword) {
            self.reset();
            return Refresh {
                view: FilterView::Unfiltered(list),
                scan: None,
            };
        }

        let page_refreshed = self.last_refresh_id.as_deref() != Some(request.refresh_id);
        self.last_refresh_id = Some(request.refresh_id.to_string());

        let list_size = list.len();
        let size_changed = self.track_list_size && self.last_list_size != Some(list_size);
        let keyword_changed = request.keyword != self.search.last_keyword();

        let triggered = page_refreshed
            || keyword_changed
            || size_changed
            || request.or_condition.is_some_and(|condition| condition());

        if !triggered {
            self.tracker.lock().settle();
            return Refresh {
                view: FilterView::Filtered(self.results.clone()),
                scan: None,
            };
        }

        tracing::debug!(
            "Re-filtering {} items for {:?} (refreshed={}, keyword_changed={}, size_changed={})",
            list_size,
            request.keyword,
            page_refreshed,
            keyword_changed,
            size_changed
        );

        if self.track_list_size {
            self.last_list_size = Some(list_size);
        }
        self.results.clear_indices();
        if let Some(hook) = request.before_scan {
            hook();
        }

        let cancel = self.search.begin_search(request.keyword);
        // Superseded scans may have appended between the two clears
        self.results.clear();

        let generation = self.tracker.lock().start();
        self.scans_started += 1;

        let scan = self.spawn_scan(list, strategy, cancel, generation);
        Refresh {
            view: FilterView::Filtered(self.results.clone()),
            scan: Some(scan),
        }
    }

    fn spawn_scan(
        &self,
        list: Arc<[T]>,
        strategy: ScanStrategy<T>,
        cancel: CancelCheck,
        generation: u64,
    ) -> JoinHandle<ScanOutcome> {
        let results = self.results.clone();
        let tracker = self.tracker.clone();

        match strategy {
            ScanStrategy::Matching(mut predicate) => self.handle.spawn_blocking(move || {
                let outcome = search(
                    &list[..],
                    |idx, item| predicate(idx, item),
                    |idx, item| results.push_unless_cancelled(idx, item.clone(), &cancel),
                    &cancel,
                );
                tracker.lock().finish(generation, outcome);
                outcome
            }),
            ScanStrategy::Custom(routine) => self.handle.spawn(async move {
                let ctx = ScanContext {
                    cancel,
                    results,
                    matched: 0,
                };
                let outcome = routine(ctx).await;
                tracker.lock().finish(generation, outcome);
                outcome
            }),
        }
    }
}
