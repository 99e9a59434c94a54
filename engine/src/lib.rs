pub mod error;
pub mod normalize;
pub mod persist;
pub mod record;
pub mod resolver;
pub mod service;
pub mod similarity;
pub mod tokenizer;
pub mod vectorizer;

pub use error::{EngineError, Result};
pub use persist::Artifact;
pub use resolver::{Resolution, TitleResolver};
pub use service::{Recommendation, Recommendations, Recommender};
pub use similarity::SimilarityMatrix;
pub use vectorizer::{SparseVector, Vectorizer, Vocabulary};

use serde::{Deserialize, Serialize};

pub type ItemId = u64;
pub type TermId = u32;

/// One catalog entry after normalization. `id` is unique across a corpus, `title` is not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub text: String,
    pub image_ref: Option<String>,
}
