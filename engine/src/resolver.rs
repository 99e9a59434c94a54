use crate::ItemId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Found(ItemId),
    NotFound,
    EmptyQuery,
}

/// Maps a free-form query to a catalog id.
///
/// Case-insensitive exact match wins over substring match; within each pass the
/// first title in corpus order wins. Linear scan over all titles.
#[derive(Debug, Clone, Default)]
pub struct TitleResolver {
    entries: Vec<(ItemId, String)>,
}

impl TitleResolver {
    /// `titles` must be in corpus order.
    pub fn new<'a, I>(titles: I) -> Self
    where
        I: IntoIterator<Item = (ItemId, &'a str)>,
    {
        let entries = titles.into_iter().map(|(id, t)| (id, t.to_lowercase())).collect();
        Self { entries }
    }

    pub fn resolve(&self, query: &str) -> Resolution {
        let q = query.trim();
        if q.is_empty() {
            return Resolution::EmptyQuery;
        }
        let q = q.to_lowercase();
        if let Some((id, _)) = self.entries.iter().find(|(_, t)| *t == q) {
            return Resolution::Found(*id);
        }
        if let Some((id, _)) = self.entries.iter().find(|(_, t)| t.contains(&q)) {
            return Resolution::Found(*id);
        }
        Resolution::NotFound
    }
}
