#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use image::{DynamicImage, GrayImage};
use tokio::sync::oneshot;

use touchguard::kernel::error::{KernelError, KernelResult};
use touchguard::kernel::event::{Embedding, UiEvent};
use touchguard::outputs::{AlertCue, Notifier, Outputs, UiSink};
use touchguard::vision::{FeatureExtractor, Frame, FrameSource};

// Two well-separated "poses" (cosine ~0.1)
pub const AWAY: [u8; 4] = [200, 10, 10, 10];
pub const TOUCH: [u8; 4] = [10, 10, 10, 200];

/// Frame source whose picture is set by the test. `None` = camera gone.
pub struct SceneSource {
    scene: Mutex<Option<Vec<u8>>>,
    remaining: Mutex<Option<usize>>,
    sequence: AtomicU64,
}

impl SceneSource {
    pub fn new(pixels: &[u8]) -> Arc<Self> {
        Arc::new(Self {
            scene: Mutex::new(Some(pixels.to_vec())),
            remaining: Mutex::new(None),
            sequence: AtomicU64::new(0),
        })
    }

    pub fn dark() -> Arc<Self> {
        Arc::new(Self {
            scene: Mutex::new(None),
            remaining: Mutex::new(None),
            sequence: AtomicU64::new(0),
        })
    }

    pub fn show(&self, pixels: &[u8]) {
        *self.scene.lock().unwrap() = Some(pixels.to_vec());
    }

    pub fn blackout(&self) {
        *self.scene.lock().unwrap() = None;
    }

    /// Serve `frames` more frames, then fail.
    pub fn fail_after(&self, frames: usize) {
        *self.remaining.lock().unwrap() = Some(frames);
    }

    pub fn frames_served(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }
}

impl FrameSource for SceneSource {
    fn current_frame(&self) -> KernelResult<Frame> {
        {
            let mut remaining = self.remaining.lock().unwrap();
            if let Some(n) = remaining.as_mut() {
                if *n == 0 {
                    return Err(KernelError::FrameUnavailable("camera unplugged".into()));
                }
                *n -= 1;
            }
        }
        let pixels = self
            .scene
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| KernelError::FrameUnavailable("no picture".into()))?;
        let width = pixels.len() as u32;
        let image = GrayImage::from_raw(width, 1, pixels).unwrap();
        Ok(Frame {
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst),
            image: DynamicImage::ImageLuma8(image),
        })
    }
}

/// Raw pixel values as the embedding.
pub struct PixelExtractor {
    pub width: usize,
}

impl FeatureExtractor for PixelExtractor {
    fn embed(&self, frame: &Frame) -> Embedding {
        Embedding::new(frame.image.to_luma8().pixels().map(|p| p[0] as f32).collect())
    }

    fn dimension(&self) -> usize {
        self.width
    }

    fn name(&self) -> &str {
        "pixels"
    }
}

pub fn extractor() -> Arc<PixelExtractor> {
    Arc::new(PixelExtractor { width: AWAY.len() })
}

/// Cue that only finishes when the test says so.
#[derive(Default)]
pub struct RecordingCue {
    plays: AtomicU64,
    waiting: Mutex<Vec<oneshot::Sender<()>>>,
}

impl RecordingCue {
    pub fn plays(&self) -> u64 {
        self.plays.load(Ordering::SeqCst)
    }

    pub fn finish_all(&self) {
        for tx in self.waiting.lock().unwrap().drain(..) {
            let _ = tx.send(());
        }
    }
}

impl AlertCue for RecordingCue {
    fn play(&self) -> oneshot::Receiver<()> {
        self.plays.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.waiting.lock().unwrap().push(tx);
        rx
    }
}

/// Cue whose player dies at once: the completion sender is dropped unsent.
#[derive(Default)]
pub struct BrokenCue {
    plays: AtomicU64,
}

impl BrokenCue {
    pub fn plays(&self) -> u64 {
        self.plays.load(Ordering::SeqCst)
    }
}

impl AlertCue for BrokenCue {
    fn play(&self) -> oneshot::Receiver<()> {
        self.plays.fetch_add(1, Ordering::SeqCst);
        let (_tx, rx) = oneshot::channel();
        rx
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, body: &str) {
        self.sent
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
    }
}

#[derive(Default)]
pub struct RecordingUi {
    pub events: Mutex<Vec<UiEvent>>,
}

impl RecordingUi {
    pub fn events(&self) -> Vec<UiEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::Status(s) => Some(s),
                _ => None,
            })
            .collect()
    }
}

impl UiSink for RecordingUi {
    fn publish(&self, event: UiEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub struct Harness {
    pub outputs: Outputs,
    pub cue: Arc<RecordingCue>,
    pub notifier: Arc<RecordingNotifier>,
    pub ui: Arc<RecordingUi>,
}

pub fn harness() -> Harness {
    let cue = Arc::new(RecordingCue::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let ui = Arc::new(RecordingUi::default());
    Harness {
        outputs: Outputs::new(cue.clone(), notifier.clone(), ui.clone()),
        cue,
        notifier,
        ui,
    }
}

/// Deterministic pseudo-random vectors (LCG).
pub fn vectors(seed: u64, count: usize, dim: usize) -> Vec<Vec<f32>> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
    (0..count)
        .map(|_| {
            (0..dim)
                .map(|_| {
                    state = state
                        .wrapping_mul(6364136223846793005)
                        .wrapping_add(1442695040888963407);
                    ((state >> 33) as f32 / (1u64 << 31) as f32) - 0.5
                })
                .collect()
        })
        .collect()
}
