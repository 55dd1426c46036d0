/// An entry of the [`crate::ListModel`].
///
/// The loading sentinel takes exactly one grid cell while a page is in flight. It is never a
/// record: code that needs data has to match on `Real`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListItem<R> {
    Real(R),
    Loading,
}

impl<R> ListItem<R> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn as_real(&self) -> Option<&R> {
        match self {
            Self::Real(record) => Some(record),
            Self::Loading => None,
        }
    }

    pub fn into_real(self) -> Option<R> {
        match self {
            Self::Real(record) => Some(record),
            Self::Loading => None,
        }
    }
}
