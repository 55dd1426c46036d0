use crate::filter::normalize_query;
use crate::{ChangeEvent, FetchError, FilterSet, ListModel, Page, PageRequest, PagerOptions};

/// Coarse state of the pagination state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PagerState {
    /// Ready to load the next page.
    Idle,
    /// One fetch is in flight.
    Loading,
    /// The source returned a short page. Terminal until `refresh`/`search`.
    Exhausted,
}

/// Snapshot of the pagination bookkeeping.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PaginationState {
    /// Offset of the next page to request.
    pub offset: usize,
    pub page_size: usize,
    pub has_more: bool,
    pub is_loading: bool,
    pub search_query: Option<String>,
    pub filters: FilterSet,
}

/// What started a fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FetchKind {
    /// Next page, behind a loading sentinel.
    LoadMore,
    /// First page after an explicit refresh.
    Refresh,
    /// First page after the query or filters changed.
    Search,
}

impl FetchKind {
    /// Whether the fetch replaces the list instead of extending it.
    pub fn is_reset(self) -> bool {
        !matches!(self, FetchKind::LoadMore)
    }
}

/// An issued fetch. The host runs `request` against its source and hands the ticket back to
/// [`PaginationCoordinator::complete`] together with the result.
#[derive(Clone, Debug, PartialEq)]
pub struct FetchTicket {
    /// Unique per coordinator.
    pub id: u64,
    /// Epoch active when the fetch was issued.
    pub epoch: u64,
    pub kind: FetchKind,
    pub request: PageRequest,
}

/// What applying a fetch result did.
#[derive(Clone, Debug, PartialEq)]
pub enum Completion {
    /// Records were merged into the list.
    Merged {
        kind: FetchKind,
        appended: usize,
        has_more: bool,
    },
    /// The fetch failed. The guard is cleared and `has_more` kept, so the page can be retried.
    Failed { kind: FetchKind, error: FetchError },
    /// The result belonged to an older epoch (or was applied twice) and was dropped.
    Stale { epoch: u64 },
}

/// The pagination state machine.
///
/// It owns the [`ListModel`] and is its only mutator. Fetching itself happens elsewhere (see
/// [`crate::Pager`]): `begin_*` hands out a [`FetchTicket`], `complete` applies its result.
/// Every reset bumps an epoch so that results of fetches issued before it are discarded.
#[derive(Debug)]
pub struct PaginationCoordinator<R> {
    state: PaginationState,
    epoch: u64,
    next_ticket: u64,
    in_flight: Option<u64>,
    model: ListModel<R>,
}

impl<R> PaginationCoordinator<R> {
    pub fn new(options: PagerOptions) -> Self {
        if options.page_size == 0 {
            pwarn!("page_size 0 clamped to 1");
        }
        Self {
            state: PaginationState {
                offset: 0,
                page_size: options.page_size.max(1),
                has_more: true,
                is_loading: false,
                search_query: normalize_query(options.query.as_deref()),
                filters: options.filters.normalized(),
            },
            epoch: 0,
            next_ticket: 0,
            in_flight: None,
            model: ListModel::new(),
        }
    }

    pub fn state(&self) -> PagerState {
        if self.state.is_loading {
            PagerState::Loading
        } else if !self.state.has_more {
            PagerState::Exhausted
        } else {
            PagerState::Idle
        }
    }

    pub fn pagination(&self) -> &PaginationState {
        &self.state
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn model(&self) -> &ListModel<R> {
        &self.model
    }

    pub fn subscribe(&mut self, observer: impl Fn(&ChangeEvent) + Send + Sync + 'static) {
        self.model.subscribe(observer);
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading
    }

    pub fn has_more(&self) -> bool {
        self.state.has_more
    }

    pub fn can_load_more(&self) -> bool {
        self.state() == PagerState::Idle
    }

    /// Starts loading the next page, unless a fetch is in flight or the source is exhausted.
    ///
    /// Appends the loading sentinel before returning the ticket.
    pub fn begin_load_more(&mut self) -> Option<FetchTicket> {
        if !self.can_load_more() {
            ptrace!(state = ?self.state(), "load more ignored");
            return None;
        }
        self.state.is_loading = true;
        self.model.push_sentinel();
        let ticket = self.issue(FetchKind::LoadMore);
        pdebug!(
            epoch = ticket.epoch,
            offset = ticket.request.offset,
            limit = ticket.request.limit,
            "load more"
        );
        Some(ticket)
    }

    /// Reloads from the first page with the current query and filters.
    pub fn begin_refresh(&mut self) -> FetchTicket {
        self.reset(FetchKind::Refresh)
    }

    /// Replaces the query and filters and reloads from the first page.
    pub fn begin_search(&mut self, query: Option<&str>, filters: FilterSet) -> FetchTicket {
        self.state.search_query = normalize_query(query);
        self.state.filters = filters.normalized();
        self.reset(FetchKind::Search)
    }

    fn reset(&mut self, kind: FetchKind) -> FetchTicket {
        self.epoch += 1;
        self.state.offset = 0;
        self.state.has_more = true;
        self.state.is_loading = true;
        self.model.clear();
        let ticket = self.issue(kind);
        pdebug!(
            epoch = ticket.epoch,
            kind = ?kind,
            query = ?ticket.request.query,
            "reset"
        );
        ticket
    }

    fn issue(&mut self, kind: FetchKind) -> FetchTicket {
        let id = self.next_ticket;
        self.next_ticket += 1;
        self.in_flight = Some(id);
        FetchTicket {
            id,
            epoch: self.epoch,
            kind,
            request: PageRequest {
                offset: self.state.offset,
                limit: self.state.page_size,
                query: self.state.search_query.clone(),
                filters: self.state.filters.clone(),
            },
        }
    }

    /// Applies the result of a fetch issued by `begin_*`.
    pub fn complete(
        &mut self,
        ticket: &FetchTicket,
        result: Result<Page<R>, FetchError>,
    ) -> Completion {
        if ticket.epoch != self.epoch || self.in_flight != Some(ticket.id) {
            pdebug!(
                epoch = ticket.epoch,
                current = self.epoch,
                "discarding stale fetch result"
            );
            return Completion::Stale {
                epoch: ticket.epoch,
            };
        }

        self.in_flight = None;
        self.state.is_loading = false;
        self.model.remove_sentinel();

        match result {
            Ok(page) => {
                let appended = page.returned_count();
                self.model.append(page.items);
                self.state.offset += self.state.page_size;
                self.state.has_more = appended == self.state.page_size;
                pdebug!(
                    epoch = ticket.epoch,
                    appended,
                    has_more = self.state.has_more,
                    len = self.model.real_len(),
                    "page merged"
                );
                Completion::Merged {
                    kind: ticket.kind,
                    appended,
                    has_more: self.state.has_more,
                }
            }
            Err(error) => {
                pwarn!(
                    epoch = ticket.epoch,
                    offset = ticket.request.offset,
                    error = %error,
                    "page fetch failed"
                );
                Completion::Failed {
                    kind: ticket.kind,
                    error,
                }
            }
        }
    }
}
