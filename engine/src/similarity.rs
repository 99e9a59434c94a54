use crate::error::{EngineError, Result};
use crate::vectorizer::SparseVector;
use crate::TermId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Dense, symmetric all-pairs cosine similarity, stored row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMatrix {
    rows: usize,
    data: Vec<f32>,
}

impl SimilarityMatrix {
    /// Compute `sim[i][j] = dot(v_i, v_j) / (|v_i| |v_j|)` for every pair.
    ///
    /// Dot products come from one sparse `X * X^T` pass over per-term postings,
    /// so cost is driven by co-occurring terms rather than `n^2 * d`. Only the
    /// upper triangle is accumulated and then mirrored. A pair involving a
    /// zero-norm vector scores 0, including that vector's own diagonal entry.
    pub fn build(vectors: &[SparseVector]) -> Self {
        let n = vectors.len();
        let mut postings: BTreeMap<TermId, Vec<(usize, f32)>> = BTreeMap::new();
        for (row, v) in vectors.iter().enumerate() {
            for &(tid, w) in &v.entries {
                postings.entry(tid).or_default().push((row, w));
            }
        }

        let mut data = vec![0.0f32; n * n];
        for plist in postings.values() {
            for (a, &(ra, wa)) in plist.iter().enumerate() {
                for &(rb, wb) in &plist[a + 1..] {
                    data[ra * n + rb] += wa * wb;
                }
            }
        }

        let norms: Vec<f32> = vectors.iter().map(SparseVector::norm).collect();
        for i in 0..n {
            data[i * n + i] = if norms[i] > 0.0 { 1.0 } else { 0.0 };
            for j in i + 1..n {
                let denom = norms[i] * norms[j];
                let s = if denom > 0.0 { (data[i * n + j] / denom).clamp(-1.0, 1.0) } else { 0.0 };
                data[i * n + j] = s;
                data[j * n + i] = s;
            }
        }
        tracing::debug!(rows = n, terms = postings.len(), "built similarity matrix");
        Self { rows: n, data }
    }

    /// Rebuild from a row-major buffer, rejecting non-square data.
    pub fn from_raw(rows: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != rows * rows {
            return Err(EngineError::ArtifactMissingOrMalformed(format!(
                "matrix buffer has {} values, expected {rows}x{rows}",
                data.len()
            )));
        }
        Ok(Self { rows, data })
    }

    pub fn rows(&self) -> usize { self.rows }
    pub fn is_empty(&self) -> bool { self.rows == 0 }
    pub fn as_slice(&self) -> &[f32] { &self.data }

    pub fn get(&self, i: usize, j: usize) -> f32 { self.data[i * self.rows + j] }

    pub fn row(&self, i: usize) -> &[f32] { &self.data[i * self.rows..(i + 1) * self.rows] }

    /// Top `k` rows most similar to `row`, by descending score with ties going
    /// to the lower row index. An out-of-range row has no neighbors.
    pub fn neighbors(&self, row: usize, k: usize, exclude_self: bool) -> Vec<(usize, f32)> {
        if row >= self.rows || k == 0 {
            return Vec::new();
        }
        let mut scored: Vec<(usize, f32)> = self
            .row(row)
            .iter()
            .copied()
            .enumerate()
            .filter(|(j, _)| !(exclude_self && *j == row))
            .collect();
        let by_rank = |a: &(usize, f32), b: &(usize, f32)| -> Ordering {
            b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0))
        };
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, by_rank);
            scored.truncate(k);
        }
        scored.sort_by(by_rank);
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorizer::Vectorizer;

    fn matrix(texts: &[&str]) -> SimilarityMatrix {
        let (_, vecs) = Vectorizer::default().fit_transform(texts).unwrap();
        SimilarityMatrix::build(&vecs)
    }

    #[test]
    fn diagonal_and_symmetry() {
        let m = matrix(&["space adventure action", "space adventure drama", "cooking reality", "drama"]);
        for i in 0..m.rows() {
            assert_eq!(m.get(i, i), 1.0);
            for j in 0..m.rows() {
                assert_eq!(m.get(i, j), m.get(j, i));
                assert!((0.0..=1.0).contains(&m.get(i, j)));
            }
        }
        assert!(m.get(0, 1) > m.get(0, 2));
        assert_eq!(m.get(0, 2), 0.0);
    }

    #[test]
    fn zero_norm_rows_score_zero() {
        let vecs = vec![
            SparseVector { entries: vec![(0, 1.0)] },
            SparseVector::default(),
        ];
        let m = SimilarityMatrix::build(&vecs);
        assert_eq!(m.get(0, 0), 1.0);
        assert_eq!(m.get(1, 1), 0.0);
        assert_eq!(m.get(0, 1), 0.0);
    }

    #[test]
    fn matches_pairwise_cosine() {
        let (_, vecs) = Vectorizer::default()
            .fit_transform(&["red green blue", "green blue blue", "red red yellow"])
            .unwrap();
        let m = SimilarityMatrix::build(&vecs);
        for i in 0..3 {
            for j in 0..3 {
                if i == j { continue; }
                let expect = vecs[i].dot(&vecs[j]) / (vecs[i].norm() * vecs[j].norm());
                assert!((m.get(i, j) - expect).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn neighbors_rank_and_exclude_self() {
        let m = SimilarityMatrix::from_raw(4, vec![
            1.0, 0.5, 0.9, 0.5,
            0.5, 1.0, 0.1, 0.2,
            0.9, 0.1, 1.0, 0.3,
            0.5, 0.2, 0.3, 1.0,
        ]).unwrap();
        assert_eq!(m.neighbors(0, 3, true), vec![(2, 0.9), (1, 0.5), (3, 0.5)]);
        assert_eq!(m.neighbors(0, 2, true), vec![(2, 0.9), (1, 0.5)]);
        assert_eq!(m.neighbors(0, 1, false), vec![(0, 1.0)]);
        assert!(m.neighbors(0, 10, true).iter().all(|(r, _)| *r != 0));
        assert_eq!(m.neighbors(0, 10, true).len(), 3);
        assert!(m.neighbors(9, 2, true).is_empty());
        assert!(m.neighbors(0, 0, true).is_empty());
    }

    #[test]
    fn from_raw_rejects_non_square() {
        assert!(SimilarityMatrix::from_raw(2, vec![1.0; 3]).is_err());
    }
}
