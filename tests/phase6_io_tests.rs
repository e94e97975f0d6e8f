mod common;

use std::sync::Arc;
use std::time::Duration;

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};

use touchguard::kernel::error::KernelError;
use touchguard::outputs::{AlertCue, CommandCue, Notifier, ThrottledNotifier, TimedCue};
use touchguard::vision::{
    FeatureExtractor, Frame, FrameSource, PerceptualHashExtractor, SnapshotFileSource,
    ThumbnailExtractor,
};
use touchguard::SessionConfig;

use common::RecordingNotifier;

fn gradient_frame() -> Frame {
    let img = RgbImage::from_fn(64, 48, |x, y| Rgb([(x * 4) as u8, (y * 5) as u8, 128]));
    Frame {
        sequence: 0,
        image: DynamicImage::ImageRgb8(img),
    }
}

#[test]
fn test_phase6_1_snapshot_source_reads_latest_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("latest.png");
    let source = SnapshotFileSource::new(&path);

    assert!(matches!(source.current_frame(), Err(KernelError::FrameUnavailable(_))));

    gradient_frame().image.save(&path).unwrap();
    let first = source.current_frame().unwrap();
    let second = source.current_frame().unwrap();
    assert_eq!(first.image.to_rgb8().dimensions(), (64, 48));
    assert_eq!(second.sequence, first.sequence + 1);
}

#[test]
fn test_phase6_2_thumbnail_is_unit_length() {
    let extractor = ThumbnailExtractor::default();
    let embedding = extractor.embed(&gradient_frame());

    assert_eq!(embedding.len(), extractor.dimension());
    assert_eq!(embedding.len(), 256);
    let norm: f32 = embedding.as_slice().iter().map(|v| v * v).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-4, "norm {}", norm);

    // Same frame, same embedding
    assert_eq!(extractor.embed(&gradient_frame()), embedding);
}

#[test]
fn test_phase6_3_flat_frame_embeds_to_zero() {
    let flat = Frame {
        sequence: 0,
        image: DynamicImage::ImageLuma8(GrayImage::from_pixel(32, 32, Luma([90]))),
    };
    let embedding = ThumbnailExtractor::new(8).embed(&flat);
    assert_eq!(embedding.len(), 64);
    assert!(embedding.as_slice().iter().all(|v| v.abs() < 1e-6));
}

#[test]
fn test_phase6_4_hash_extractor_emits_signs() {
    let extractor = PerceptualHashExtractor::new();
    let embedding = extractor.embed(&gradient_frame());
    assert_eq!(embedding.len(), extractor.dimension());
    assert!(embedding.as_slice().iter().all(|v| *v == 1.0 || *v == -1.0));
}

#[tokio::test(start_paused = true)]
async fn test_phase6_5_notifications_respect_cooldown() {
    let inner = Arc::new(RecordingNotifier::default());
    let throttled = ThrottledNotifier::new(inner.clone(), Duration::from_millis(3000));

    throttled.notify("a", "1");
    throttled.notify("a", "2");
    tokio::time::advance(Duration::from_millis(2999)).await;
    throttled.notify("a", "3");
    tokio::time::advance(Duration::from_millis(1)).await;
    throttled.notify("a", "4");

    let bodies: Vec<String> = inner.sent.lock().unwrap().iter().map(|(_, b)| b.clone()).collect();
    assert_eq!(bodies, vec!["1".to_string(), "4".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_phase6_6_timed_cue_finishes_after_duration() {
    let cue = TimedCue::new(Duration::from_millis(1500));
    let started = tokio::time::Instant::now();
    cue.play().await.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(1500));
}

#[test]
fn test_phase6_7_timed_cue_reads_wav_length() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cue.wav");
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    // 0.5s of stereo silence
    for _ in 0..(4000 * 2) {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();

    let cue = TimedCue::from_wav(&path).unwrap();
    assert_eq!(cue.duration(), Duration::from_millis(500));
}

#[test]
fn test_phase6_8_config_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("touchguard.json");
    std::fs::write(&path, r#"{ "examples_per_phase": 20, "touch_threshold": 0.9 }"#).unwrap();

    let config = SessionConfig::from_json_file(&path).unwrap();
    assert_eq!(config.examples_per_phase, 20);
    assert_eq!(config.touch_threshold, 0.9);
    assert_eq!(config.inference_interval(), Duration::from_millis(200));
    assert_eq!(config.neighbors, 3);

    std::fs::write(&path, r#"{ "neighbors": 0 }"#).unwrap();
    assert!(SessionConfig::from_json_file(&path).is_err());
}

#[tokio::test]
async fn test_phase6_9_missing_cue_player_finishes_at_once() {
    let cue = CommandCue::new("/nonexistent/touchguard-player", Vec::new());
    let done = tokio::time::timeout(Duration::from_secs(1), cue.play())
        .await
        .expect("cue must resolve when the player cannot start");
    assert!(done.is_ok(), "completion is sent, not dropped");
}
