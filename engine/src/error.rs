/// Failures raised while building or loading the similarity artifact.
///
/// Query-time outcomes (empty query, unmatched title) are not errors; see
/// [`crate::resolver::Resolution`].
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("corpus is empty")]
    EmptyCorpus,

    #[error("no terms survived tokenization; vocabulary is empty")]
    EmptyVocabulary,

    #[error("id list has {ids} entries but the similarity matrix has {rows} rows")]
    LengthMismatch { ids: usize, rows: usize },

    #[error("artifact missing or malformed: {0}")]
    ArtifactMissingOrMalformed(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("decode error: {0}")]
    Decode(#[from] bincode::Error),

    #[error("metadata error: {0}")]
    Meta(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
