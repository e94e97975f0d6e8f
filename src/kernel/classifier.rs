use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::error::{KernelError, KernelResult};
use super::event::{Embedding, Example, Label, Prediction};

pub const DEFAULT_NEIGHBORS: usize = 3;

/// Incremental k-nearest-neighbour classifier over cosine similarity.
///
/// Every `add_example` is visible to the next `predict`; there is no fit step
/// and nothing is ever removed. The first example fixes the embedding length.
#[derive(Debug, Clone)]
pub struct KnnClassifier {
    k: usize,
    examples: Vec<Example>,
}

impl Default for KnnClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_NEIGHBORS)
    }
}

impl KnnClassifier {
    pub fn new(k: usize) -> Self {
        Self {
            k: k.max(1),
            examples: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn dimension(&self) -> Option<usize> {
        self.examples.first().map(|e| e.embedding.len())
    }

    pub fn count(&self, label: Label) -> usize {
        self.examples.iter().filter(|e| e.label == label).count()
    }

    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    fn check_dimension(&self, embedding: &Embedding) -> KernelResult<()> {
        match self.dimension() {
            Some(expected) if expected != embedding.len() => Err(KernelError::DimensionMismatch {
                expected,
                got: embedding.len(),
            }),
            _ => Ok(()),
        }
    }

    pub fn add_example(&mut self, embedding: Embedding, label: Label) -> KernelResult<()> {
        self.check_dimension(&embedding)?;
        self.examples.push(Example { embedding, label });
        Ok(())
    }

    /// Votes among the `min(k, len)` most similar examples.
    ///
    /// Neighbours are ranked by descending similarity, equal similarity
    /// resolved by insertion order (lower index first). A vote tie between
    /// labels goes to the label of the highest-ranked neighbour.
    pub fn predict(&self, embedding: &Embedding) -> KernelResult<Prediction> {
        if self.examples.is_empty() {
            return Err(KernelError::NotTrained);
        }
        self.check_dimension(embedding)?;

        let mut ranked: Vec<(usize, f32)> = self
            .examples
            .iter()
            .enumerate()
            .map(|(i, ex)| (i, ex.embedding.cosine(embedding)))
            .collect();
        // NaN sorts last so a broken vector never outranks a real one
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or_else(|| a.1.is_nan().cmp(&b.1.is_nan()))
                .then(a.0.cmp(&b.0))
        });

        let k = self.k.min(ranked.len());
        let neighbours = &ranked[..k];

        let mut votes: BTreeMap<Label, usize> = BTreeMap::new();
        for ex in &self.examples {
            votes.entry(ex.label).or_insert(0);
        }
        for (i, _) in neighbours {
            *votes.entry(self.examples[*i].label).or_insert(0) += 1;
        }

        let nearest = self.examples[neighbours[0].0].label;
        let mut label = nearest;
        let mut best = votes.get(&nearest).copied().unwrap_or(0);
        for (&candidate, &count) in &votes {
            if count.cmp(&best) == Ordering::Greater {
                label = candidate;
                best = count;
            }
        }

        let confidences = votes
            .into_iter()
            .map(|(l, count)| (l, count as f32 / k as f32))
            .collect();

        Ok(Prediction { label, confidences })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emb(v: &[f32]) -> Embedding {
        Embedding::new(v.to_vec())
    }

    #[test]
    fn single_example_is_always_the_answer() {
        let mut knn = KnnClassifier::default();
        knn.add_example(emb(&[1.0, 0.0]), Label::Touched).unwrap();
        let p = knn.predict(&emb(&[0.0, 1.0])).unwrap();
        assert_eq!(p.label, Label::Touched);
        assert_eq!(p.confidence(Label::Touched), 1.0);
        assert_eq!(p.confidence(Label::NotTouched), 0.0);
    }

    #[test]
    fn vote_tie_goes_to_nearest() {
        let mut knn = KnnClassifier::new(2);
        knn.add_example(emb(&[1.0, 0.0]), Label::NotTouched).unwrap();
        knn.add_example(emb(&[0.0, 1.0]), Label::Touched).unwrap();
        let p = knn.predict(&emb(&[0.2, 1.0])).unwrap();
        assert_eq!(p.label, Label::Touched);
        assert_eq!(p.confidence(Label::Touched), 0.5);
    }

    #[test]
    fn equal_similarity_prefers_lower_index() {
        let mut knn = KnnClassifier::new(1);
        knn.add_example(emb(&[1.0, 0.0]), Label::NotTouched).unwrap();
        knn.add_example(emb(&[1.0, 0.0]), Label::Touched).unwrap();
        let p = knn.predict(&emb(&[1.0, 0.0])).unwrap();
        assert_eq!(p.label, Label::NotTouched);
    }
}
