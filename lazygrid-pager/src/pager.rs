use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::{
    ChangeEvent, Completion, FetchError, FetchTicket, FilterSet, ItemSource, ListModel, Page,
    PagerOptions, PagerState, PaginationCoordinator, PaginationState,
};

type FetchOutcome<R> = (FetchTicket, Result<Page<R>, FetchError>);

/// Delivers the outcome of one fetch task. A task dropped before it finishes (its runtime shut
/// down) reports a transient failure instead, so every issued ticket is answered exactly once.
struct Reply<R> {
    tx: mpsc::UnboundedSender<FetchOutcome<R>>,
    ticket: Option<FetchTicket>,
}

impl<R> Reply<R> {
    fn send(mut self, result: Result<Page<R>, FetchError>) {
        if let Some(ticket) = self.ticket.take() {
            // The receiver lives as long as the pager; a send error means it was dropped.
            let _ = self.tx.send((ticket, result));
        }
    }
}

impl<R> Drop for Reply<R> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            let _ = self.tx.send((
                ticket,
                Err(FetchError::transient("fetch task was cancelled")),
            ));
        }
    }
}

/// Drives a [`PaginationCoordinator`] against an [`ItemSource`].
///
/// Fetches run as tokio tasks. Their results travel back over a channel and are applied by
/// [`Pager::poll_completions`] or [`Pager::next_completion`], so the list is only ever mutated by
/// whoever owns the pager (typically the UI thread).
pub struct Pager<S: ItemSource> {
    source: Arc<S>,
    coordinator: PaginationCoordinator<S::Record>,
    runtime: Option<Handle>,
    tx: mpsc::UnboundedSender<FetchOutcome<S::Record>>,
    rx: mpsc::UnboundedReceiver<FetchOutcome<S::Record>>,
    outstanding: usize,
}

impl<S> Pager<S>
where
    S: ItemSource + 'static,
{
    /// Creates a pager that spawns fetches on the ambient tokio runtime.
    ///
    /// Fetch-issuing methods must then be called from within a runtime context; use
    /// [`Pager::with_runtime`] when the owner lives on a plain thread.
    pub fn new(source: Arc<S>, options: PagerOptions) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            source,
            coordinator: PaginationCoordinator::new(options),
            runtime: None,
            tx,
            rx,
            outstanding: 0,
        }
    }

    /// Spawns fetches on `handle` instead of the ambient runtime.
    pub fn with_runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    pub fn coordinator(&self) -> &PaginationCoordinator<S::Record> {
        &self.coordinator
    }

    pub fn model(&self) -> &ListModel<S::Record> {
        self.coordinator.model()
    }

    pub fn state(&self) -> PagerState {
        self.coordinator.state()
    }

    pub fn pagination(&self) -> &PaginationState {
        self.coordinator.pagination()
    }

    pub fn is_loading(&self) -> bool {
        self.coordinator.is_loading()
    }

    pub fn has_more(&self) -> bool {
        self.coordinator.has_more()
    }

    pub fn can_load_more(&self) -> bool {
        self.coordinator.can_load_more()
    }

    /// Fetches whose results have not been applied yet, stale ones included.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    pub fn subscribe(&mut self, observer: impl Fn(&ChangeEvent) + Send + Sync + 'static) {
        self.coordinator.subscribe(observer);
    }

    /// Issues the next page fetch. Returns `false` when a fetch is already in flight or the
    /// source is exhausted.
    pub fn request_load_more(&mut self) -> bool {
        match self.coordinator.begin_load_more() {
            Some(ticket) => {
                self.spawn(ticket);
                true
            }
            None => false,
        }
    }

    pub fn refresh(&mut self) {
        let ticket = self.coordinator.begin_refresh();
        self.spawn(ticket);
    }

    /// Starts a new search. A blank `query` searches without a text filter.
    pub fn search(&mut self, query: &str, filters: FilterSet) {
        let ticket = self.coordinator.begin_search(Some(query), filters);
        self.spawn(ticket);
    }

    fn spawn(&mut self, ticket: FetchTicket) {
        let source = Arc::clone(&self.source);
        let runtime = self.runtime.clone();
        let request = ticket.request.clone();
        let reply = Reply {
            tx: self.tx.clone(),
            ticket: Some(ticket),
        };
        let task = async move {
            let fetch = async move { source.fetch_page(&request).await };
            let handle = match &runtime {
                Some(runtime) => runtime.spawn(fetch),
                None => tokio::spawn(fetch),
            };
            let result = match handle.await {
                Ok(result) => result,
                Err(err) => Err(FetchError::transient(format!("fetch task failed: {err}"))),
            };
            reply.send(result);
        };
        match &self.runtime {
            Some(runtime) => {
                runtime.spawn(task);
            }
            None => {
                tokio::spawn(task);
            }
        }
        self.outstanding += 1;
    }

    fn apply(&mut self, (ticket, result): FetchOutcome<S::Record>) -> Completion {
        self.outstanding = self.outstanding.saturating_sub(1);
        self.coordinator.complete(&ticket, result)
    }

    /// Applies every fetch result that has already arrived, without waiting.
    pub fn poll_completions(&mut self) -> Vec<Completion> {
        let mut completions = Vec::new();
        while let Ok(outcome) = self.rx.try_recv() {
            completions.push(self.apply(outcome));
        }
        completions
    }

    /// Waits for the next fetch result and applies it.
    ///
    /// Returns `None` right away when nothing is outstanding.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        if self.outstanding == 0 {
            return None;
        }
        let outcome = self.rx.recv().await?;
        Some(self.apply(outcome))
    }

    /// Applies results until nothing is outstanding.
    pub async fn settle(&mut self) -> Vec<Completion> {
        let mut completions = Vec::new();
        while let Some(completion) = self.next_completion().await {
            completions.push(completion);
        }
        completions
    }
}

impl<S> core::fmt::Debug for Pager<S>
where
    S: ItemSource,
    S::Record: core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Pager")
            .field("coordinator", &self.coordinator)
            .field("outstanding", &self.outstanding)
            .finish_non_exhaustive()
    }
}
