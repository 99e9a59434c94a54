use crate::error::{EngineError, Result};
use crate::similarity::SimilarityMatrix;
use crate::vectorizer::{Vectorizer, Vocabulary};
use crate::{Item, ItemId};
use bincode;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const ARTIFACT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_items: u64,
    pub num_terms: u64,
    pub created_at: String,
    pub version: u32,
}

/// Everything the serving side needs: row order, scores and display metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// Row `i` of `matrix` belongs to `ids[i]`.
    pub ids: Vec<ItemId>,
    pub matrix: SimilarityMatrix,
    pub titles: BTreeMap<ItemId, String>,
    /// Items without an image reference have no entry.
    pub images: BTreeMap<ItemId, String>,
}

impl Artifact {
    pub fn from_parts(items: &[Item], matrix: SimilarityMatrix) -> Result<Self> {
        if items.len() != matrix.rows() {
            return Err(EngineError::LengthMismatch { ids: items.len(), rows: matrix.rows() });
        }
        let ids = items.iter().map(|it| it.id).collect();
        let titles = items.iter().map(|it| (it.id, it.title.clone())).collect();
        let images = items
            .iter()
            .filter_map(|it| it.image_ref.clone().map(|img| (it.id, img)))
            .collect();
        Ok(Self { ids, matrix, titles, images })
    }

    /// Vectorize `items` and compute their similarity matrix, preserving item order.
    pub fn build(items: &[Item], vectorizer: &Vectorizer) -> Result<(Self, Vocabulary)> {
        if items.is_empty() {
            return Err(EngineError::EmptyCorpus);
        }
        let texts: Vec<&str> = items.iter().map(|it| it.text.as_str()).collect();
        let (vocab, vectors) = vectorizer.fit_transform(&texts)?;
        let matrix = SimilarityMatrix::build(&vectors);
        let artifact = Self::from_parts(items, matrix)?;
        artifact.validate()?;
        Ok((artifact, vocab))
    }

    pub fn len(&self) -> usize { self.ids.len() }
    pub fn is_empty(&self) -> bool { self.ids.is_empty() }

    /// Structural checks a serving process relies on.
    pub fn validate(&self) -> Result<()> {
        if self.ids.len() != self.matrix.rows() {
            return Err(EngineError::LengthMismatch { ids: self.ids.len(), rows: self.matrix.rows() });
        }
        if self.matrix.as_slice().len() != self.ids.len() * self.ids.len() {
            return Err(malformed("matrix is not square"));
        }
        let mut seen = HashSet::with_capacity(self.ids.len());
        for id in &self.ids {
            if !seen.insert(*id) {
                return Err(malformed(format!("duplicate id {id}")));
            }
            if !self.titles.contains_key(id) {
                return Err(malformed(format!("id {id} has no title")));
            }
        }
        Ok(())
    }
}

fn malformed(msg: impl Into<String>) -> EngineError {
    EngineError::ArtifactMissingOrMalformed(msg.into())
}

pub struct ArtifactPaths {
    pub root: PathBuf,
}

impl ArtifactPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn artifact(&self) -> PathBuf { self.root.join("artifact.bin") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

pub fn save_artifact(paths: &ArtifactPaths, artifact: &Artifact) -> Result<()> {
    artifact.validate()?;
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.artifact())?;
    let bytes = bincode::serialize(artifact)?;
    f.write_all(&bytes)?;
    Ok(())
}

pub fn save_meta(paths: &ArtifactPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &ArtifactPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

fn read_artifact(paths: &ArtifactPaths) -> Result<Artifact> {
    let mut f = File::open(paths.artifact())?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let artifact = bincode::deserialize(&buf)?;
    Ok(artifact)
}

/// Load and validate a persisted artifact. Any missing file, decode failure or
/// structural inconsistency is reported as `ArtifactMissingOrMalformed`.
pub fn load_artifact(paths: &ArtifactPaths) -> Result<(Artifact, MetaFile)> {
    let meta = load_meta(paths)
        .map_err(|e| malformed(format!("{}: {e}", paths.meta().display())))?;
    if meta.version != ARTIFACT_VERSION {
        return Err(malformed(format!(
            "artifact version {} is not supported (expected {ARTIFACT_VERSION})",
            meta.version
        )));
    }
    let artifact = read_artifact(paths)
        .map_err(|e| malformed(format!("{}: {e}", paths.artifact().display())))?;
    if meta.num_items != artifact.len() as u64 {
        return Err(malformed(format!(
            "meta lists {} items but artifact holds {}",
            meta.num_items,
            artifact.len()
        )));
    }
    artifact.validate().map_err(|e| match e {
        EngineError::ArtifactMissingOrMalformed(_) => e,
        other => malformed(other.to_string()),
    })?;
    tracing::info!(num_items = artifact.len(), version = meta.version, "loaded artifact");
    Ok((artifact, meta))
}
