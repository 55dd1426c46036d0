use std::ops::Range;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lazygrid::{Grid, GridOptions, Size};
use tokio::sync::Semaphore;

use crate::source::MockItemSource;
use crate::*;

/// Serves ids `0..total`; queried pages are shifted by 1000 so results are distinguishable.
struct Catalog {
    total: usize,
    gate: Option<Arc<Semaphore>>,
    fail_next: AtomicBool,
    calls: AtomicUsize,
    requests: Mutex<Vec<PageRequest>>,
}

impl Catalog {
    fn new(total: usize) -> Self {
        Self {
            total,
            gate: None,
            fail_next: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every fetch waits for a permit on the returned semaphore.
    fn gated(total: usize) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let catalog = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::new(total)
        };
        (catalog, gate)
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ItemSource for Catalog {
    type Record = u32;

    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<u32>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(FetchError::transient("connection reset"));
        }
        let base = if request.query.is_some() { 1000 } else { 0 };
        let end = (request.offset + request.limit).min(self.total);
        let start = request.offset.min(end);
        Ok(Page::new((start..end).map(|i| (base + i) as u32).collect()))
    }
}

struct Exploding;

#[async_trait]
impl ItemSource for Exploding {
    type Record = u32;

    async fn fetch_page(&self, _request: &PageRequest) -> Result<Page<u32>, FetchError> {
        panic!("backend exploded")
    }
}

fn page(ids: Range<u32>) -> Page<u32> {
    Page::new(ids.collect())
}

fn recorder(coordinator: &mut PaginationCoordinator<u32>) -> Arc<Mutex<Vec<ChangeEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    coordinator.subscribe(move |event| sink.lock().unwrap().push(*event));
    events
}

/// 500x600 viewport with default 220x320 cells: two columns, rows of 320.
fn controller(source: Catalog) -> GridController<Catalog> {
    let grid = Grid::new(
        GridOptions::default().with_initial_viewport(Some(Size::new(500.0, 600.0))),
    )
    .unwrap();
    let pager = Pager::new(Arc::new(source), PagerOptions::default());
    GridController::new(grid, pager)
}

#[test]
fn full_page_then_short_page_exhausts() {
    let mut c = PaginationCoordinator::<u32>::new(PagerOptions::default());
    assert_eq!(c.state(), PagerState::Idle);

    let first = c.begin_load_more().unwrap();
    assert_eq!(first.kind, FetchKind::LoadMore);
    assert_eq!(first.request.offset, 0);
    assert_eq!(first.request.limit, DEFAULT_PAGE_SIZE);
    assert_eq!(c.state(), PagerState::Loading);
    assert_eq!(c.model().len(), 1);
    assert_eq!(c.model().real_len(), 0);
    assert!(c.model().has_sentinel());

    assert_eq!(
        c.complete(&first, Ok(page(0..20))),
        Completion::Merged {
            kind: FetchKind::LoadMore,
            appended: 20,
            has_more: true,
        }
    );
    assert_eq!(c.pagination().offset, 20);
    assert_eq!(c.model().real_len(), 20);
    assert!(!c.model().has_sentinel());
    assert_eq!(c.state(), PagerState::Idle);

    let second = c.begin_load_more().unwrap();
    assert_eq!(second.request.offset, 20);
    assert_eq!(
        c.complete(&second, Ok(page(20..27))),
        Completion::Merged {
            kind: FetchKind::LoadMore,
            appended: 7,
            has_more: false,
        }
    );
    assert_eq!(c.model().real_len(), 27);
    assert_eq!(c.model().len(), 27);
    assert_eq!(c.state(), PagerState::Exhausted);
    assert!(c.begin_load_more().is_none());
    assert_eq!(
        c.model().records().copied().collect::<Vec<_>>(),
        (0..27).collect::<Vec<_>>()
    );
}

#[test]
fn load_more_is_single_flight() {
    let mut c = PaginationCoordinator::<u32>::new(PagerOptions::default());
    let ticket = c.begin_load_more();
    assert!(ticket.is_some());
    assert!(c.begin_load_more().is_none());
    assert!(!c.can_load_more());
    assert_eq!(c.model().len(), 1);
}

#[test]
fn sentinel_changes_are_reported() {
    let mut c = PaginationCoordinator::<u32>::new(PagerOptions::default());
    let events = recorder(&mut c);

    let ticket = c.begin_load_more().unwrap();
    c.complete(&ticket, Ok(page(0..3)));

    assert_eq!(
        *events.lock().unwrap(),
        vec![
            ChangeEvent::Inserted { index: 0 },
            ChangeEvent::Removed { index: 0 },
            ChangeEvent::Appended { start: 0, count: 3 },
        ]
    );
}

#[test]
fn failed_fetch_clears_guard_and_keeps_has_more() {
    let mut c = PaginationCoordinator::<u32>::new(PagerOptions::default());
    let first = c.begin_load_more().unwrap();
    c.complete(&first, Ok(page(0..20)));

    let second = c.begin_load_more().unwrap();
    let error = FetchError::transient("timeout");
    assert_eq!(
        c.complete(&second, Err(error.clone())),
        Completion::Failed {
            kind: FetchKind::LoadMore,
            error,
        }
    );
    assert_eq!(c.model().len(), 20);
    assert!(!c.model().has_sentinel());
    assert!(!c.is_loading());
    assert!(c.has_more());
    assert_eq!(c.state(), PagerState::Idle);

    let retry = c.begin_load_more().unwrap();
    assert_eq!(retry.request.offset, 20);
}

#[test]
fn search_resets_before_new_items_and_drops_stale_results() {
    let mut c = PaginationCoordinator::<u32>::new(PagerOptions::default());
    let first = c.begin_load_more().unwrap();
    c.complete(&first, Ok(page(0..20)));
    let stale = c.begin_load_more().unwrap();

    let events = recorder(&mut c);
    let search = c.begin_search(
        Some("  zelda "),
        FilterSet::new().with_genre(0).with_platform(4),
    );
    assert_eq!(search.kind, FetchKind::Search);
    assert_eq!(search.request.offset, 0);
    assert_eq!(search.request.query.as_deref(), Some("zelda"));
    assert_eq!(search.request.filters.genre, None);
    assert_eq!(search.request.filters.platform, Some(4));
    assert!(c.model().is_empty());
    assert_eq!(c.epoch(), 1);
    assert_eq!(c.pagination().offset, 0);
    assert!(c.has_more());

    assert_eq!(
        c.complete(&stale, Ok(page(20..40))),
        Completion::Stale { epoch: 0 }
    );
    assert!(c.model().is_empty());
    assert_eq!(c.state(), PagerState::Loading);

    assert_eq!(
        c.complete(&search, Ok(page(100..105))),
        Completion::Merged {
            kind: FetchKind::Search,
            appended: 5,
            has_more: false,
        }
    );
    assert_eq!(
        c.model().records().copied().collect::<Vec<_>>(),
        (100..105).collect::<Vec<_>>()
    );
    assert_eq!(
        *events.lock().unwrap(),
        vec![
            ChangeEvent::Cleared { previous_len: 21 },
            ChangeEvent::Appended { start: 0, count: 5 },
        ]
    );
}

#[test]
fn completing_twice_is_stale() {
    let mut c = PaginationCoordinator::<u32>::new(PagerOptions::default());
    let ticket = c.begin_load_more().unwrap();
    c.complete(&ticket, Ok(page(0..20)));
    let next = c.begin_load_more().unwrap();

    assert_eq!(
        c.complete(&ticket, Ok(page(0..20))),
        Completion::Stale { epoch: 0 }
    );
    assert_eq!(c.model().real_len(), 20);
    assert!(c.is_loading());

    c.complete(&next, Ok(page(20..40)));
    assert_eq!(c.model().real_len(), 40);
}

#[test]
fn refresh_reopens_an_exhausted_list() {
    let mut c = PaginationCoordinator::<u32>::new(PagerOptions::default());
    let ticket = c.begin_load_more().unwrap();
    c.complete(&ticket, Ok(page(0..4)));
    assert_eq!(c.state(), PagerState::Exhausted);

    let refresh = c.begin_refresh();
    assert_eq!(refresh.kind, FetchKind::Refresh);
    assert!(refresh.kind.is_reset());
    assert_eq!(refresh.request.offset, 0);
    assert_eq!(c.state(), PagerState::Loading);
    assert!(c.model().is_empty());
    // Reset fetches do not show a sentinel.
    assert!(!c.model().has_sentinel());

    c.complete(&refresh, Ok(page(0..20)));
    assert_eq!(c.state(), PagerState::Idle);
    assert_eq!(c.pagination().offset, 20);
}

#[test]
fn failed_reset_leaves_an_empty_idle_list() {
    let mut c = PaginationCoordinator::<u32>::new(PagerOptions::default());
    let refresh = c.begin_refresh();
    let done = c.complete(&refresh, Err(FetchError::permanent("bad request")));
    assert!(matches!(
        done,
        Completion::Failed {
            kind: FetchKind::Refresh,
            ..
        }
    ));
    assert!(c.model().is_empty());
    assert_eq!(c.state(), PagerState::Idle);
    assert_eq!(c.begin_load_more().unwrap().request.offset, 0);
}

#[test]
fn options_are_normalized() {
    let c = PaginationCoordinator::<u32>::new(
        PagerOptions::new()
            .with_page_size(0)
            .with_query("   ")
            .with_filters(FilterSet {
                genre: Some(0),
                min_rating: Some(f64::NAN),
                ..FilterSet::default()
            }),
    );
    assert_eq!(c.pagination().page_size, 1);
    assert_eq!(c.pagination().search_query, None);
    assert!(c.pagination().filters.is_empty());
}

#[test]
fn sort_keys_parse_wire_names_and_labels() {
    assert_eq!(SortKey::parse("Release Date"), Some(SortKey::Released));
    assert_eq!(SortKey::parse("released"), Some(SortKey::Released));
    assert_eq!(SortKey::parse(" RATING "), Some(SortKey::Rating));
    assert_eq!(SortKey::parse(""), None);
    assert_eq!(SortKey::parse("price"), None);
    assert_eq!("name".parse::<SortKey>(), Ok(SortKey::Name));
    assert_eq!(
        "price".parse::<SortKey>(),
        Err(UnknownSortKey("price".to_owned()))
    );
    assert_eq!(SortKey::Released.to_string(), "released");
    assert_eq!(SortKey::Released.label(), "Release Date");
}

#[test]
fn filters_collapse_all_selections() {
    assert!(FilterSet::new().with_genre(0).with_platform(0).is_empty());
    let filters = FilterSet::new()
        .with_genre(3)
        .with_min_rating(f64::INFINITY)
        .with_max_rating(4.5)
        .with_sort(SortKey::parse("Name"));
    assert_eq!(filters.genre, Some(3));
    assert_eq!(filters.min_rating, None);
    assert_eq!(filters.max_rating, Some(4.5));
    assert_eq!(filters.sort, Some(SortKey::Name));

    assert_eq!(normalize_query(Some("  ")), None);
    assert_eq!(normalize_query(Some(" halo ")).as_deref(), Some("halo"));
    assert_eq!(normalize_query(None), None);
}

#[test]
fn fetch_error_classification() {
    let e = FetchError::transient("503");
    assert!(e.is_transient());
    assert_eq!(e.kind(), FetchErrorKind::Transient);
    assert_eq!(e.message(), "503");
    assert_eq!(e.to_string(), "transient fetch error: 503");

    let e = FetchError::permanent("unknown genre");
    assert!(!e.is_transient());
    assert_eq!(e.to_string(), "permanent fetch error: unknown genre");
}

#[test]
fn list_item_accessors() {
    let real = ListItem::Real(7u32);
    assert_eq!(real.as_real(), Some(&7));
    assert!(!real.is_loading());
    assert_eq!(ListItem::<u32>::Loading.into_real(), None);
}

#[test]
fn row_count_uses_ceiling_division() {
    let mut c = PaginationCoordinator::<u32>::new(PagerOptions::default());
    assert_eq!(c.model().row_count(4), 0);
    let ticket = c.begin_load_more().unwrap();
    assert_eq!(c.model().row_count(4), 1);
    c.complete(&ticket, Ok(page(0..20)));
    assert_eq!(c.model().row_count(4), 5);
    let ticket = c.begin_load_more().unwrap();
    assert_eq!(c.model().row_count(4), 6);
    c.complete(&ticket, Ok(page(20..27)));
    assert_eq!(c.model().row_count(4), 7);
    assert_eq!(c.model().row_count(0), 27);
}

#[tokio::test]
async fn pager_issues_one_fetch_while_loading() {
    let mut source = MockItemSource::new();
    source
        .expect_fetch_page()
        .times(1)
        .returning(|request: &PageRequest| {
            let start = request.offset as u32;
            Ok(page(start..start + request.limit as u32))
        });
    let mut pager = Pager::new(Arc::new(source), PagerOptions::default());

    assert!(pager.request_load_more());
    assert!(!pager.request_load_more());
    assert_eq!(pager.outstanding(), 1);

    let done = pager.settle().await;
    assert_eq!(
        done,
        vec![Completion::Merged {
            kind: FetchKind::LoadMore,
            appended: 20,
            has_more: true,
        }]
    );
    assert_eq!(pager.model().real_len(), 20);
    assert_eq!(pager.outstanding(), 0);
}

#[tokio::test]
async fn pager_forwards_query_and_filters() {
    let mut source = MockItemSource::new();
    source
        .expect_fetch_page()
        .withf(|request: &PageRequest| {
            request.offset == 0
                && request.limit == 5
                && request.query.as_deref() == Some("halo")
                && request.filters.platform == Some(2)
                && request.filters.sort == Some(SortKey::Rating)
        })
        .times(1)
        .returning(|_: &PageRequest| Ok(page(0..5)));
    let mut pager = Pager::new(
        Arc::new(source),
        PagerOptions::new().with_page_size(5),
    );

    pager.search(
        "halo",
        FilterSet::new()
            .with_platform(2)
            .with_sort(Some(SortKey::Rating)),
    );
    let done = pager.settle().await;
    assert_eq!(
        done,
        vec![Completion::Merged {
            kind: FetchKind::Search,
            appended: 5,
            has_more: true,
        }]
    );
}

#[tokio::test]
async fn pager_discards_results_of_a_superseded_search() {
    let (catalog, gate) = Catalog::gated(100);
    let catalog = Arc::new(catalog);
    let mut pager = Pager::new(Arc::clone(&catalog), PagerOptions::default());

    assert!(pager.request_load_more());
    pager.search("zelda", FilterSet::new());
    assert_eq!(pager.outstanding(), 2);
    assert!(pager.model().is_empty());

    gate.add_permits(2);
    let done = pager.settle().await;
    assert_eq!(done.len(), 2);
    assert!(done.contains(&Completion::Stale { epoch: 0 }));
    assert!(done.contains(&Completion::Merged {
        kind: FetchKind::Search,
        appended: 20,
        has_more: true,
    }));
    assert_eq!(pager.model().real_len(), 20);
    assert!(pager.model().records().all(|&id| id >= 1000));
    assert_eq!(catalog.calls(), 2);
}

#[tokio::test]
async fn pager_retries_after_a_failure() {
    let catalog = Arc::new(Catalog::new(50));
    catalog.fail_next.store(true, Ordering::SeqCst);
    let mut pager = Pager::new(Arc::clone(&catalog), PagerOptions::default());

    assert!(pager.request_load_more());
    let done = pager.settle().await;
    assert_eq!(
        done,
        vec![Completion::Failed {
            kind: FetchKind::LoadMore,
            error: FetchError::transient("connection reset"),
        }]
    );
    assert!(pager.model().is_empty());
    assert!(pager.has_more());
    assert_eq!(pager.state(), PagerState::Idle);

    assert!(pager.request_load_more());
    pager.settle().await;
    assert_eq!(pager.model().real_len(), 20);
    let offsets: Vec<_> = catalog.requests().iter().map(|r| r.offset).collect();
    assert_eq!(offsets, vec![0, 0]);
}

#[tokio::test]
async fn panicking_fetch_is_a_transient_failure() {
    let mut pager = Pager::new(Arc::new(Exploding), PagerOptions::default());
    assert!(pager.request_load_more());

    let done = pager.next_completion().await;
    match done {
        Some(Completion::Failed { error, .. }) => assert!(error.is_transient()),
        other => panic!("unexpected completion: {other:?}"),
    }
    assert!(!pager.is_loading());
    assert!(pager.model().is_empty());
}

#[tokio::test]
async fn next_completion_without_fetches_returns_none() {
    let mut pager = Pager::new(Arc::new(Catalog::new(10)), PagerOptions::default());
    assert_eq!(pager.next_completion().await, None);
    assert!(pager.poll_completions().is_empty());
}

#[tokio::test]
async fn poll_completions_drains_without_waiting() {
    let mut pager = Pager::new(Arc::new(Catalog::new(10)), PagerOptions::default());
    assert!(pager.request_load_more());

    let mut done = Vec::new();
    while done.is_empty() {
        tokio::task::yield_now().await;
        done = pager.poll_completions();
    }
    assert_eq!(
        done,
        vec![Completion::Merged {
            kind: FetchKind::LoadMore,
            appended: 10,
            has_more: false,
        }]
    );
    assert_eq!(pager.state(), PagerState::Exhausted);
}

#[test]
fn pager_spawns_on_an_explicit_runtime() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .build()
        .unwrap();
    let mut pager = Pager::new(Arc::new(Catalog::new(5)), PagerOptions::default())
        .with_runtime(runtime.handle().clone());

    assert!(pager.request_load_more());
    let done = runtime.block_on(pager.settle());
    assert_eq!(
        done,
        vec![Completion::Merged {
            kind: FetchKind::LoadMore,
            appended: 5,
            has_more: false,
        }]
    );
}

#[test]
fn fetch_dropped_by_runtime_shutdown_is_a_transient_failure() {
    let (catalog, _gate) = Catalog::gated(100);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .build()
        .unwrap();
    let mut pager = Pager::new(Arc::new(catalog), PagerOptions::default())
        .with_runtime(runtime.handle().clone());

    assert!(pager.request_load_more());
    // The fetch is parked on the gate; shutting down drops it before it can answer.
    drop(runtime);

    let owner = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let done = owner.block_on(pager.settle());
    assert_eq!(done.len(), 1);
    match &done[0] {
        Completion::Failed { kind, error } => {
            assert_eq!(*kind, FetchKind::LoadMore);
            assert!(error.is_transient());
        }
        other => panic!("unexpected completion: {other:?}"),
    }
    assert_eq!(pager.outstanding(), 0);
    assert_eq!(pager.state(), PagerState::Idle);
    assert!(pager.model().is_empty());
}

#[tokio::test]
async fn controller_loads_pages_as_the_user_scrolls() {
    let mut c = controller(Catalog::new(45));

    // An empty grid is always near its end.
    c.on_viewport(Some(500.0), Some(600.0)).unwrap();
    assert_eq!(c.pager().outstanding(), 1);
    assert_eq!(c.grid().item_count(), 1);

    c.settle().await;
    assert_eq!(c.pager().model().real_len(), 20);
    assert_eq!(c.grid().item_count(), 20);
    assert_eq!(c.pager().outstanding(), 0);

    // Offset clamps to 2600; rows 7..=9 realized, which reaches index 19.
    c.on_scroll(1e9);
    assert_eq!(c.grid().offset().y, 2600.0);
    assert_eq!(c.pager().outstanding(), 1);
    assert_eq!(c.grid().item_count(), 21);

    c.settle().await;
    assert_eq!(c.grid().item_count(), 40);
    assert_eq!(c.layout().realized.map(|r| r.end_index), Some(23));

    c.on_scroll(1e9);
    c.settle().await;
    assert_eq!(c.grid().item_count(), 45);
    assert_eq!(c.pager().state(), PagerState::Exhausted);

    c.on_scroll(1e9);
    assert!(!c.request_load_more());
    assert_eq!(c.pager().outstanding(), 0);
}

#[tokio::test]
async fn controller_scrolls_to_top_after_search() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let mut c = controller(Catalog::new(100)).with_on_search_completed(Some(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    c.on_viewport(Some(500.0), Some(600.0)).unwrap();
    c.settle().await;
    c.on_scroll(1000.0);
    assert_eq!(c.grid().offset().y, 1000.0);
    assert_eq!(c.pager().outstanding(), 0);

    c.search("mario", FilterSet::new());
    assert_eq!(c.grid().item_count(), 0);
    let done = c.settle().await;
    assert_eq!(done.len(), 1);
    assert_eq!(c.grid().offset().y, 0.0);
    assert_eq!(c.grid().item_count(), 20);
    assert!(c.pager().model().records().all(|&id| id >= 1000));
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    c.refresh();
    c.settle().await;
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn controller_row_count_includes_the_sentinel() {
    let mut c = controller(Catalog::new(27));
    c.refresh();
    c.settle().await;
    assert_eq!(c.grid_row_count(4), 5);

    assert!(c.request_load_more());
    assert_eq!(c.grid_row_count(4), 6);

    c.settle().await;
    assert_eq!(c.grid_row_count(4), 7);
    assert_eq!(c.grid().row_count(), 14);
}
