use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::classifier::KnnClassifier;
use super::error::KernelResult;
use super::event::{Label, TrainingProgress};
use crate::vision::{FeatureExtractor, FrameSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingEvent {
    Progress(TrainingProgress),
    /// Terminal. Emitted once, after the last example.
    Done { label: Label, collected: usize },
}

/// Collects a fixed number of examples per label, one per `interval`.
#[derive(Debug, Clone, Copy)]
pub struct TrainingController {
    examples_per_phase: usize,
    interval: Duration,
}

impl TrainingController {
    pub fn new(examples_per_phase: usize, interval: Duration) -> Self {
        Self {
            examples_per_phase,
            interval,
        }
    }

    pub fn examples_per_phase(&self) -> usize {
        self.examples_per_phase
    }

    /// Nothing happens until the returned phase is polled with `next`.
    pub fn run_phase<'a>(
        &self,
        label: Label,
        source: &'a dyn FrameSource,
        extractor: &'a dyn FeatureExtractor,
        classifier: &'a RwLock<KnnClassifier>,
    ) -> TrainingPhase<'a> {
        TrainingPhase {
            label,
            total: self.examples_per_phase,
            interval: self.interval,
            collected: 0,
            finished: false,
            source,
            extractor,
            classifier,
        }
    }
}

/// One pass of example collection for a single label.
///
/// Yields `Progress` after every example, then `Done`, then `None` forever.
/// The first error ends the phase: a missing frame is never replaced by a
/// placeholder example.
pub struct TrainingPhase<'a> {
    label: Label,
    total: usize,
    interval: Duration,
    collected: usize,
    finished: bool,
    source: &'a dyn FrameSource,
    extractor: &'a dyn FeatureExtractor,
    classifier: &'a RwLock<KnnClassifier>,
}

impl<'a> TrainingPhase<'a> {
    pub fn label(&self) -> Label {
        self.label
    }

    pub fn collected(&self) -> usize {
        self.collected
    }

    pub async fn next(&mut self) -> Option<KernelResult<TrainingEvent>> {
        if self.finished {
            return None;
        }

        if self.collected >= self.total {
            self.finished = true;
            info!("Training {:?} complete: {} examples", self.label, self.collected);
            return Some(Ok(TrainingEvent::Done {
                label: self.label,
                collected: self.collected,
            }));
        }

        if self.collected == 0 {
            info!("Training {:?}: collecting {} examples", self.label, self.total);
        }

        match self.collect_one().await {
            Ok(progress) => Some(Ok(TrainingEvent::Progress(progress))),
            Err(e) => {
                warn!(
                    "Training {:?} aborted after {} examples: {}",
                    self.label, self.collected, e
                );
                self.finished = true;
                Some(Err(e))
            }
        }
    }

    async fn collect_one(&mut self) -> KernelResult<TrainingProgress> {
        // 1. Frame -> Embedding
        let frame = self.source.current_frame()?;
        let embedding = self.extractor.embed(&frame);

        // 2. Store (write lock released before the pause)
        self.classifier
            .write()
            .await
            .add_example(embedding, self.label)?;
        self.collected += 1;

        let progress = TrainingProgress {
            label: self.label,
            collected: self.collected,
            total: self.total,
        };
        debug!("Training {:?}: {}%", self.label, progress.percent());

        // 3. Give the user time to move
        tokio::time::sleep(self.interval).await;

        Ok(progress)
    }
}
