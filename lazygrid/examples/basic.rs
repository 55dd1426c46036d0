// Example: a 100k-cell grid where only the cells near the viewport are alive.
use lazygrid::{CellGeometry, Grid, GridOptions, Realizer, Size, Thickness};

fn main() {
    let geometry = CellGeometry::new(200.0, 300.0).with_margin(Thickness::uniform(10.0));
    let mut grid = Grid::new(
        GridOptions::new(geometry)
            .with_item_count(100_000)
            .with_initial_viewport(Some(Size::new(1_280.0, 720.0))),
    )
    .expect("valid geometry");

    let mut cells = Realizer::new();
    for offset in [0.0, 4_000.0, 4_320.0, 1e12] {
        grid.set_vertical_offset(offset);
        let layout = grid.layout();
        let report = cells.sync(&layout, |i| format!("cell #{i}"), |_, _| {});
        println!(
            "offset={:>10} per_row={} realized={:?} report={:?}",
            grid.offset().y,
            layout.items_per_row,
            layout.realized,
            report
        );
    }

    grid.scroll_index_into_view(42);
    println!("after scroll_index_into_view(42): offset={}", grid.offset().y);
    println!("cell 42 at {:?}", grid.cell_rect(42));
}
