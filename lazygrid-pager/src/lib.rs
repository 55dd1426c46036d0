//! Lazy, single-flight pagination for [`lazygrid`] grids.
//!
//! A [`PaginationCoordinator`] owns the [`ListModel`] shown by a grid and turns "the user is
//! near the end" into page fetches against an [`ItemSource`]. [`Pager`] runs those fetches on
//! tokio and applies their results on the owner; [`GridController`] wires a [`lazygrid::Grid`]
//! and a pager together.
//!
//! Fetches are stamped with an epoch. `refresh`/`search` start a new epoch, so a page that
//! arrives for an old query is dropped instead of being mixed into the new results.
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod controller;
mod coordinator;
mod error;
mod filter;
mod item;
mod model;
mod options;
mod pager;
mod source;

#[cfg(test)]
mod tests;

pub use controller::{GridController, OnSearchCompleted};
pub use coordinator::{
    Completion, FetchKind, FetchTicket, PagerState, PaginationCoordinator, PaginationState,
};
pub use error::{FetchError, FetchErrorKind};
pub use filter::{FilterSet, SortKey, UnknownSortKey, normalize_query};
pub use item::ListItem;
pub use model::{ChangeEvent, ListModel, OnItemsChanged};
pub use options::{DEFAULT_PAGE_SIZE, PagerOptions};
pub use pager::Pager;
pub use source::{ItemSource, Page, PageRequest};
