use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{oneshot, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::alert::{AlertController, AlertEffect, AlertState};
use super::classifier::KnnClassifier;
use super::error::KernelResult;
use super::event::{Label, Prediction, UiEvent, Verdict};
use super::telemetry::{TelemetryEvent, TelemetryRecorder};
use crate::outputs::Outputs;
use crate::vision::{FeatureExtractor, FrameSource};

pub const DEFAULT_TOUCH_THRESHOLD: f32 = 0.8;

/// `Touched` iff the winning label is `Touched` with confidence strictly above the threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionRule {
    pub threshold: f32,
}

impl Default for DecisionRule {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_TOUCH_THRESHOLD,
        }
    }
}

impl DecisionRule {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn verdict(&self, prediction: &Prediction) -> Verdict {
        if prediction.label == Label::Touched
            && prediction.confidence(Label::Touched) > self.threshold
        {
            Verdict::Touched
        } else {
            Verdict::NotTouched
        }
    }
}

/// Counters for one run of the loop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InferenceReport {
    pub ticks: u64,
    pub touched_ticks: u64,
    pub skipped_ticks: u64,
    pub alerts: u64,
    pub cues_finished: u64,
}

/// Steady-state monitoring: frame -> embedding -> prediction -> alert controller.
pub struct InferenceLoop {
    source: Arc<dyn FrameSource>,
    extractor: Arc<dyn FeatureExtractor>,
    classifier: Arc<RwLock<KnnClassifier>>,
    rule: DecisionRule,
    interval: Duration,
    alert: AlertController,
    outputs: Outputs,
    telemetry: TelemetryRecorder,
    pending_cue: Option<oneshot::Receiver<()>>,
    report: InferenceReport,
}

impl InferenceLoop {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: Arc<dyn FrameSource>,
        extractor: Arc<dyn FeatureExtractor>,
        classifier: Arc<RwLock<KnnClassifier>>,
        rule: DecisionRule,
        interval: Duration,
        alert: AlertController,
        outputs: Outputs,
        telemetry: TelemetryRecorder,
    ) -> Self {
        Self {
            source,
            extractor,
            classifier,
            rule,
            interval,
            alert,
            outputs,
            telemetry,
            pending_cue: None,
            report: InferenceReport::default(),
        }
    }

    pub fn alert_state(&self) -> AlertState {
        self.alert.state()
    }

    pub fn report(&self) -> &InferenceReport {
        &self.report
    }

    async fn classify(&self) -> KernelResult<Verdict> {
        let frame = self.source.current_frame()?;
        let embedding = self.extractor.embed(&frame);
        let prediction = self.classifier.read().await.predict(&embedding)?;
        debug!(
            "Frame {}: {:?} (touched {:.2})",
            frame.sequence,
            prediction.label,
            prediction.confidence(Label::Touched)
        );
        Ok(self.rule.verdict(&prediction))
    }

    /// One tick without the pause. Alert effects are executed before returning.
    pub async fn step(&mut self) -> KernelResult<Verdict> {
        let verdict = self.classify().await?;

        let touched = verdict == Verdict::Touched;
        self.report.ticks += 1;
        if touched {
            self.report.touched_ticks += 1;
        }
        self.telemetry.record(TelemetryEvent::InferenceTick { touched });

        for effect in self.alert.on_verdict(verdict) {
            self.apply(effect);
        }
        Ok(verdict)
    }

    fn apply(&mut self, effect: AlertEffect) {
        match effect {
            AlertEffect::PlayCue => {
                self.report.alerts += 1;
                self.telemetry.record(TelemetryEvent::AlertFired);
                self.pending_cue = Some(self.outputs.cue.play());
            }
            AlertEffect::Notify { title, body } => self.outputs.notifier.notify(&title, &body),
            AlertEffect::SetTouched(touched) => self.outputs.ui.publish(UiEvent::Touched(touched)),
        }
    }

    /// The audio cue's completion event.
    pub fn cue_finished(&mut self) {
        self.pending_cue = None;
        self.report.cues_finished += 1;
        self.telemetry.record(TelemetryEvent::CueFinished);
        self.alert.on_cue_finished();
    }

    /// Runs until `cancel` fires. A missing frame skips the tick; contract
    /// violations (`NotTrained`, `DimensionMismatch`) stop the loop.
    pub async fn run(mut self, cancel: CancellationToken) -> KernelResult<InferenceReport> {
        info!("Inference loop started. Interval: {:?}", self.interval);

        'ticks: loop {
            if cancel.is_cancelled() {
                break;
            }

            match self.step().await {
                Ok(_) => {}
                Err(e) if e.is_fatal() => {
                    error!("Inference loop stopped: {}", e);
                    return Err(e);
                }
                Err(e) => {
                    warn!("Inference tick skipped: {}", e);
                    self.report.skipped_ticks += 1;
                    self.telemetry.record(TelemetryEvent::TickSkipped);
                }
            }

            // Pause, still listening for the cue and for teardown.
            let pause = tokio::time::sleep(self.interval);
            tokio::pin!(pause);
            loop {
                tokio::select! {
                    _ = &mut pause => break,
                    _ = cancel.cancelled() => break 'ticks,
                    _ = wait_for_cue(&mut self.pending_cue) => self.cue_finished(),
                }
            }
        }

        info!(
            "Inference loop stopped after {} ticks ({} alerts)",
            self.report.ticks, self.report.alerts
        );
        Ok(self.report)
    }
}

/// Resolves when the pending cue finishes; never resolves without one.
/// A dropped sender counts as finished so the controller cannot stay in cooldown.
async fn wait_for_cue(pending: &mut Option<oneshot::Receiver<()>>) {
    match pending {
        Some(rx) => {
            let _ = rx.await;
        }
        None => std::future::pending::<()>().await,
    }
}
