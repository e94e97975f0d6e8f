use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::alert::AlertController;
use super::classifier::KnnClassifier;
use super::error::{KernelError, KernelResult};
use super::event::{Label, TrainingProgress, UiEvent};
use super::inference::{DecisionRule, InferenceLoop, InferenceReport};
use super::telemetry::{TelemetryEvent, TelemetryRecorder};
use super::training::{TrainingController, TrainingEvent};
use crate::config::SessionConfig;
use crate::outputs::Outputs;
use crate::vision::{FeatureExtractor, FrameSource};

/// What the session is doing. Phases only move forward; `Running` is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Waiting for camera and model.
    #[default]
    Init,
    /// Waiting for (or collecting) "hand away from face" examples.
    TrainNotTouched,
    /// Waiting for (or collecting) "hand touching face" examples.
    TrainTouched,
    /// Trained; waiting for the user to start monitoring.
    Ready,
    Running,
}

/// Button presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserAction {
    CollectNotTouched,
    CollectTouched,
    StartMonitoring,
}

impl UserAction {
    pub const ALL: [UserAction; 3] = [
        UserAction::CollectNotTouched,
        UserAction::CollectTouched,
        UserAction::StartMonitoring,
    ];
}

/// The phase graph. Pure functions only.
pub struct PhaseGraph;

impl PhaseGraph {
    /// Phase reached once `action` has completed, or None if `phase` does not accept it.
    pub fn transition(phase: SessionPhase, action: UserAction) -> Option<SessionPhase> {
        use SessionPhase::*;
        use UserAction::*;

        match (phase, action) {
            (TrainNotTouched, CollectNotTouched) => Some(TrainTouched),
            (TrainTouched, CollectTouched) => Some(Ready),
            (Ready, StartMonitoring) => Some(Running),
            _ => None,
        }
    }

    /// The buttons a UI should show in `phase`.
    pub fn valid_actions(phase: SessionPhase) -> Vec<UserAction> {
        UserAction::ALL
            .into_iter()
            .filter(|action| Self::transition(phase, *action).is_some())
            .collect()
    }

    pub fn status(phase: SessionPhase) -> &'static str {
        match phase {
            SessionPhase::Init => "Looking for camera...",
            SessionPhase::TrainNotTouched => "Step 1: record yourself NOT touching your face.",
            SessionPhase::TrainTouched => {
                "Step 2: record yourself with a hand close to your face (about 10cm)."
            }
            SessionPhase::Ready => "Model ready, press start!",
            SessionPhase::Running => "Watching your hands...",
        }
    }

    pub fn progress_status(progress: &TrainingProgress) -> String {
        let hint = match progress.label {
            Label::NotTouched => "Keep your hands away from your face until done.",
            Label::Touched => "Keep your hand in view of the camera until done.",
        };
        format!("{} Learning... {}%", hint, progress.percent())
    }
}

/// One detection session. Owns the phase, the classifier and the
/// collaborators; every component gets them from here.
pub struct Session {
    id: Uuid,
    config: SessionConfig,
    phase: SessionPhase,
    source: Arc<dyn FrameSource>,
    extractor: Arc<dyn FeatureExtractor>,
    classifier: Arc<RwLock<KnnClassifier>>,
    outputs: Outputs,
    telemetry: TelemetryRecorder,
    cancel: CancellationToken,
    monitor: Option<JoinHandle<KernelResult<InferenceReport>>>,
}

impl Session {
    pub fn new(
        config: SessionConfig,
        source: Arc<dyn FrameSource>,
        extractor: Arc<dyn FeatureExtractor>,
        outputs: Outputs,
    ) -> KernelResult<Self> {
        config.validate()?;
        let classifier = KnnClassifier::new(config.neighbors);

        Ok(Self {
            id: Uuid::new_v4(),
            config,
            phase: SessionPhase::Init,
            source,
            extractor,
            classifier: Arc::new(RwLock::new(classifier)),
            outputs,
            telemetry: TelemetryRecorder::new(),
            cancel: CancellationToken::new(),
            monitor: None,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn valid_actions(&self) -> Vec<UserAction> {
        PhaseGraph::valid_actions(self.phase)
    }

    pub fn classifier(&self) -> Arc<RwLock<KnnClassifier>> {
        Arc::clone(&self.classifier)
    }

    pub fn telemetry(&self) -> &TelemetryRecorder {
        &self.telemetry
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitor.as_ref().is_some_and(|h| !h.is_finished())
    }

    fn status(&self, text: impl Into<String>) {
        self.outputs.ui.publish(UiEvent::Status(text.into()));
    }

    fn advance(&mut self, next: SessionPhase) {
        info!(session = %self.id, "Phase {:?} -> {:?}", self.phase, next);
        self.telemetry.record(TelemetryEvent::PhaseTransition {
            from: self.phase,
            to: next,
        });
        self.phase = next;
        self.outputs.ui.publish(UiEvent::Phase(next));
        self.status(PhaseGraph::status(next));
    }

    /// Camera and model check. Leaves `Init` on success; on failure the
    /// session stays in `Init` with the error as its status.
    pub async fn initialize(&mut self) -> KernelResult<()> {
        if self.phase != SessionPhase::Init {
            debug!("Session already initialized");
            return Ok(());
        }

        // 1. Camera
        self.status(PhaseGraph::status(SessionPhase::Init));
        let frame = match self.source.current_frame() {
            Ok(frame) => frame,
            Err(e) => {
                let err = KernelError::SetupFailed(format!("camera: {}", e));
                self.status(format!("Camera unavailable: {}", e));
                error!("{}", err);
                return Err(err);
            }
        };

        // 2. Model
        self.status("Starting model...");
        let embedding = self.extractor.embed(&frame);
        if embedding.is_empty() || embedding.len() != self.extractor.dimension() {
            let err = KernelError::SetupFailed(format!(
                "extractor '{}' produced {} values, expected {}",
                self.extractor.name(),
                embedding.len(),
                self.extractor.dimension()
            ));
            self.status(format!("Model unavailable: {}", err));
            error!("{}", err);
            return Err(err);
        }
        info!(
            "Camera and model '{}' ready ({} dims)",
            self.extractor.name(),
            embedding.len()
        );

        self.advance(SessionPhase::TrainNotTouched);
        Ok(())
    }

    /// Applies a user action. Actions the current phase does not accept are
    /// rejected with `InvalidTransition` and change nothing.
    pub async fn handle(&mut self, action: UserAction) -> KernelResult<()> {
        let Some(next) = PhaseGraph::transition(self.phase, action) else {
            debug!("Ignoring {:?} in phase {:?}", action, self.phase);
            return Err(KernelError::InvalidTransition {
                phase: self.phase,
                action,
            });
        };

        match action {
            UserAction::CollectNotTouched => self.train(Label::NotTouched).await?,
            UserAction::CollectTouched => self.train(Label::Touched).await?,
            UserAction::StartMonitoring => self.start_monitoring(),
        }

        self.advance(next);
        Ok(())
    }

    async fn train(&mut self, label: Label) -> KernelResult<()> {
        let controller = TrainingController::new(
            self.config.examples_per_phase,
            self.config.training_interval(),
        );
        let mut phase = controller.run_phase(
            label,
            self.source.as_ref(),
            self.extractor.as_ref(),
            self.classifier.as_ref(),
        );

        while let Some(event) = phase.next().await {
            match event {
                Ok(TrainingEvent::Progress(progress)) => {
                    self.outputs.ui.publish(UiEvent::Progress(progress));
                    self.status(PhaseGraph::progress_status(&progress));
                }
                Ok(TrainingEvent::Done { label, collected }) => {
                    self.telemetry.record(TelemetryEvent::TrainingCompleted {
                        label,
                        examples: collected,
                    });
                }
                Err(e) => {
                    self.telemetry.record(TelemetryEvent::TrainingAborted {
                        label,
                        collected: phase.collected(),
                    });
                    self.status(format!("Training stopped: {}", e));
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    fn start_monitoring(&mut self) {
        let alert = AlertController::new(
            self.config.notification_title.clone(),
            self.config.notification_body.clone(),
        );
        let inference = InferenceLoop::new(
            Arc::clone(&self.source),
            Arc::clone(&self.extractor),
            Arc::clone(&self.classifier),
            DecisionRule::new(self.config.touch_threshold),
            self.config.inference_interval(),
            alert,
            self.outputs.clone(),
            self.telemetry.clone(),
        );
        self.monitor = Some(tokio::spawn(inference.run(self.cancel.child_token())));
    }

    /// Stops the inference loop (if any) and waits for it. Dropping the
    /// session also stops the loop, without waiting.
    pub async fn shutdown(mut self) -> KernelResult<Option<InferenceReport>> {
        info!(session = %self.id, "Session shutting down in phase {:?}", self.phase);
        self.cancel.cancel();

        let Some(handle) = self.monitor.take() else {
            return Ok(None);
        };
        match handle.await {
            Ok(result) => result.map(Some),
            Err(e) => {
                warn!("Inference task did not finish cleanly: {}", e);
                Ok(None)
            }
        }
    }
}

impl Drop for Session {
    // Without `shutdown`, the monitor task would keep running detached.
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
