use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::session::SessionPhase;

/// The two classes the session learns. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Label {
    NotTouched,
    Touched,
}

impl Label {
    pub const ALL: [Label; 2] = [Label::NotTouched, Label::Touched];
}

/// Fixed-length feature vector for one frame. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Cosine similarity in [-1, 1]. Zero vectors are similar to nothing.
    /// Callers guarantee equal lengths.
    pub fn cosine(&self, other: &Embedding) -> f32 {
        let dot: f32 = self.0.iter().zip(other.0.iter()).map(|(a, b)| a * b).sum();
        let norm_a = self.0.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b = other.0.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        dot / (norm_a * norm_b)
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

#[derive(Debug, Clone)]
pub struct Example {
    pub embedding: Embedding,
    pub label: Label,
}

/// Classifier output for one embedding.
/// `confidences` holds every label present in the training set; values sum to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: Label,
    pub confidences: BTreeMap<Label, f32>,
}

impl Prediction {
    /// Confidence for `label`, 0.0 if the label has no stored examples.
    pub fn confidence(&self, label: Label) -> f32 {
        self.confidences.get(&label).copied().unwrap_or(0.0)
    }
}

/// Per-tick decision handed to the alert controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Touched,
    NotTouched,
}

/// Training progress for one collected example.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingProgress {
    pub label: Label,
    pub collected: usize,
    pub total: usize,
}

impl TrainingProgress {
    /// Integer percent, rounded down.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.collected * 100) / self.total).min(100) as u8
    }

    pub fn is_done(&self) -> bool {
        self.collected >= self.total
    }
}

/// Observational updates for whatever renders the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UiEvent {
    Phase(SessionPhase),
    Progress(TrainingProgress),
    Touched(bool),
    Status(String),
}
