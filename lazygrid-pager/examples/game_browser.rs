use std::sync::Arc;

use async_trait::async_trait;
use lazygrid::{Grid, GridOptions, Size};
use lazygrid_pager::{
    FetchError, FilterSet, GridController, ItemSource, ListItem, Page, PageRequest, PagerOptions,
    SortKey,
};

#[derive(Clone, Debug)]
struct Game {
    id: u32,
    name: String,
    rating: f64,
}

/// An in-memory stand-in for a game catalog API.
struct Catalog {
    games: Vec<Game>,
}

impl Catalog {
    fn new(n: u32) -> Self {
        let games = (0..n)
            .map(|id| Game {
                id,
                name: format!("Game {id:03}"),
                rating: f64::from(id % 50) / 10.0,
            })
            .collect();
        Self { games }
    }
}

#[async_trait]
impl ItemSource for Catalog {
    type Record = Game;

    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<Game>, FetchError> {
        let mut hits: Vec<&Game> = self
            .games
            .iter()
            .filter(|g| match &request.query {
                Some(q) => g.name.contains(q.as_str()),
                None => true,
            })
            .filter(|g| request.filters.min_rating.is_none_or(|min| g.rating >= min))
            .collect();
        if request.filters.sort == Some(SortKey::Rating) {
            hits.sort_by(|a, b| b.rating.total_cmp(&a.rating));
        }
        Ok(hits
            .into_iter()
            .skip(request.offset)
            .take(request.limit)
            .cloned()
            .collect::<Vec<_>>()
            .into())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Example: a card grid that pages games in as the user scrolls.
    //
    // A UI layer would:
    // - forward viewport/scroll events to the controller
    // - drain completions once per frame (`poll_completions`) instead of awaiting them
    // - render the realized range from `layout()`, drawing `ListItem::Loading` as a spinner
    let grid = Grid::new(
        GridOptions::default().with_initial_viewport(Some(Size::new(1_000.0, 700.0))),
    )
    .expect("valid geometry");
    let pager = lazygrid_pager::Pager::new(Arc::new(Catalog::new(230)), PagerOptions::default());
    let mut c = GridController::new(grid, pager)
        .with_on_search_completed(Some(|| println!("search completed, back at the top")));
    c.pager_mut()
        .subscribe(|event| println!("  items changed: {event:?}"));

    c.on_viewport(Some(1_000.0), Some(700.0))
        .expect("valid viewport");
    c.settle().await;

    for _ in 0..4 {
        c.page_down();
        c.settle().await;
        let layout = c.layout();
        println!(
            "offset={} items={} realized={:?} state={:?}",
            c.grid().offset().y,
            c.pager().model().len(),
            layout.realized,
            c.pager().state()
        );
    }

    c.search(
        "Game 1",
        FilterSet::new()
            .with_min_rating(2.0)
            .with_sort(SortKey::parse("Rating")),
    );
    c.settle().await;

    let layout = c.layout();
    layout.for_each_realized(|i, rect| match c.pager().model().get(i) {
        Some(ListItem::Real(game)) => {
            println!("#{i} {} ({}) id={} at {rect:?}", game.name, game.rating, game.id)
        }
        Some(ListItem::Loading) => println!("#{i} loading..."),
        None => {}
    });
}
