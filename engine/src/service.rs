//! Query-time recommendation over a loaded [`Artifact`].
//!
//! A [`Recommender`] is built once and never mutated, so it can be shared
//! behind an `Arc` by any number of concurrent readers.

use crate::error::Result;
use crate::persist::Artifact;
use crate::resolver::{Resolution, TitleResolver};
use crate::vectorizer::Vectorizer;
use crate::{Item, ItemId};
use serde::Serialize;
use std::collections::HashMap;

pub const EMPTY_QUERY_STATUS: &str = "please enter a title";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub id: ItemId,
    pub title: String,
    pub image_ref: Option<String>,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendations {
    pub items: Vec<Recommendation>,
    pub status: String,
    /// Id the query resolved to, if any.
    pub matched: Option<ItemId>,
}

impl Recommendations {
    fn empty(status: String) -> Self {
        Self { items: Vec::new(), status, matched: None }
    }
}

#[derive(Debug, Clone)]
pub struct Recommender {
    artifact: Artifact,
    rows: HashMap<ItemId, usize>,
    resolver: TitleResolver,
}

impl Recommender {
    pub fn new(artifact: Artifact) -> Result<Self> {
        artifact.validate()?;
        let rows = artifact.ids.iter().enumerate().map(|(row, id)| (*id, row)).collect();
        let resolver = TitleResolver::new(
            artifact.ids.iter().map(|id| (*id, artifact.titles[id].as_str())),
        );
        Ok(Self { artifact, rows, resolver })
    }

    /// Build the full pipeline in memory, skipping persistence.
    pub fn from_items(items: &[Item], vectorizer: &Vectorizer) -> Result<Self> {
        let (artifact, _) = Artifact::build(items, vectorizer)?;
        Self::new(artifact)
    }

    pub fn len(&self) -> usize { self.artifact.len() }
    pub fn is_empty(&self) -> bool { self.artifact.is_empty() }

    pub fn title(&self, id: ItemId) -> Option<&str> {
        self.artifact.titles.get(&id).map(String::as_str)
    }

    pub fn image_ref(&self, id: ItemId) -> Option<&str> {
        self.artifact.images.get(&id).map(String::as_str)
    }

    /// All titles sorted, for a picker.
    pub fn titles(&self) -> Vec<&str> {
        let mut titles: Vec<&str> = self.artifact.titles.values().map(String::as_str).collect();
        titles.sort_unstable();
        titles
    }

    pub fn resolve(&self, query: &str) -> Resolution { self.resolver.resolve(query) }

    /// Top `n` items most similar to the title `query` resolves to, `n` clamped
    /// to `[1, len - 1]`. Never fails: unusable queries come back as an empty
    /// list with a status message.
    pub fn recommend(&self, query: &str, n: usize) -> Recommendations {
        let id = match self.resolver.resolve(query) {
            Resolution::EmptyQuery => return Recommendations::empty(EMPTY_QUERY_STATUS.to_string()),
            Resolution::NotFound => {
                return Recommendations::empty(format!(
                    "No match for '{}'. Try selecting from the picker.",
                    query.trim()
                ))
            }
            Resolution::Found(id) => id,
        };
        let title = self.title(id).unwrap_or_default().to_string();
        let row = self.rows[&id];

        let max_n = self.len().saturating_sub(1);
        if max_n == 0 {
            return Recommendations {
                items: Vec::new(),
                status: format!("No other titles to recommend for '{title}'"),
                matched: Some(id),
            };
        }
        let n = n.clamp(1, max_n);

        let items = self
            .artifact
            .matrix
            .neighbors(row, n, true)
            .into_iter()
            .map(|(r, score)| {
                let nid = self.artifact.ids[r];
                Recommendation {
                    id: nid,
                    title: self.title(nid).unwrap_or("Unknown").to_string(),
                    image_ref: self.image_ref(nid).map(String::from),
                    score,
                }
            })
            .collect();
        tracing::debug!(query, matched = id, n, "recommend");
        Recommendations { items, status: format!("Recommendations for '{title}'"), matched: Some(id) }
    }
}
