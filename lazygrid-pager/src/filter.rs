use core::fmt;
use core::str::FromStr;

/// Sort order understood by item sources.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum SortKey {
    Name,
    Released,
    Rating,
}

impl SortKey {
    pub const ALL: [SortKey; 3] = [SortKey::Name, SortKey::Released, SortKey::Rating];

    /// The key as sent to the backend.
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::Released => "released",
            SortKey::Rating => "rating",
        }
    }

    /// Human readable label for sort pickers.
    pub fn label(self) -> &'static str {
        match self {
            SortKey::Name => "Name",
            SortKey::Released => "Release Date",
            SortKey::Rating => "Rating",
        }
    }

    /// Accepts wire names and labels, case-insensitively. Blank input means "no sort".
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        Self::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(s) || key.label().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort key: {0:?}")]
pub struct UnknownSortKey(pub String);

impl FromStr for SortKey {
    type Err = UnknownSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownSortKey(s.to_owned()))
    }
}

/// Opaque filter constraints forwarded to the item source with every page request.
///
/// The pager never interprets them; it only resets pagination when they change. Use the
/// `with_*` setters (or [`FilterSet::normalized`]) so that "All" selections (id `0`) and
/// non-finite ratings collapse to `None`.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilterSet {
    pub genre: Option<u32>,
    pub platform: Option<u32>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub sort: Option<SortKey>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_genre(mut self, genre: u32) -> Self {
        self.genre = non_zero(Some(genre));
        self
    }

    pub fn with_platform(mut self, platform: u32) -> Self {
        self.platform = non_zero(Some(platform));
        self
    }

    pub fn with_min_rating(mut self, rating: f64) -> Self {
        self.min_rating = finite(Some(rating));
        self
    }

    pub fn with_max_rating(mut self, rating: f64) -> Self {
        self.max_rating = finite(Some(rating));
        self
    }

    pub fn with_sort(mut self, sort: Option<SortKey>) -> Self {
        self.sort = sort;
        self
    }

    /// Whether no constraint is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn normalized(self) -> Self {
        Self {
            genre: non_zero(self.genre),
            platform: non_zero(self.platform),
            min_rating: finite(self.min_rating),
            max_rating: finite(self.max_rating),
            sort: self.sort,
        }
    }
}

/// Trims a search query. Blank queries mean "no text search".
pub fn normalize_query(query: Option<&str>) -> Option<String> {
    query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_owned)
}

fn non_zero(id: Option<u32>) -> Option<u32> {
    id.filter(|&id| id != 0)
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}
