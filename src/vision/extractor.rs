use image::imageops::FilterType;
use img_hash::{HashAlg, HasherConfig};

use super::frame::Frame;
use crate::kernel::event::Embedding;

/// Frozen frame -> embedding map. Pure and infallible for a decoded frame;
/// every call returns `dimension()` values.
pub trait FeatureExtractor: Send + Sync {
    fn embed(&self, frame: &Frame) -> Embedding;

    fn dimension(&self) -> usize;

    fn name(&self) -> &str;
}

// Below this the frame is treated as flat (rounding noise only).
const MIN_CONTRAST: f32 = 1e-3;

/// Downscaled grayscale thumbnail, mean-centred and scaled to unit length so
/// cosine similarity ignores overall brightness and contrast.
/// A flat frame yields the zero vector.
pub struct ThumbnailExtractor {
    side: u32,
}

impl ThumbnailExtractor {
    pub fn new(side: u32) -> Self {
        Self { side: side.max(1) }
    }
}

impl Default for ThumbnailExtractor {
    fn default() -> Self {
        Self::new(16)
    }
}

impl FeatureExtractor for ThumbnailExtractor {
    fn embed(&self, frame: &Frame) -> Embedding {
        let thumb = frame
            .image
            .resize_exact(self.side, self.side, FilterType::Triangle)
            .to_luma8();

        let mut values: Vec<f32> = thumb.pixels().map(|p| p[0] as f32 / 255.0).collect();
        let mean = values.iter().sum::<f32>() / values.len() as f32;
        for v in values.iter_mut() {
            *v -= mean;
        }

        let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm < MIN_CONTRAST {
            return Embedding::new(vec![0.0; values.len()]);
        }
        for v in values.iter_mut() {
            *v /= norm;
        }
        Embedding::new(values)
    }

    fn dimension(&self) -> usize {
        (self.side * self.side) as usize
    }

    fn name(&self) -> &str {
        "thumbnail"
    }
}

/// 8x8 gradient hash, each bit mapped to +1 / -1.
pub struct PerceptualHashExtractor {
    width: u32,
    height: u32,
}

impl PerceptualHashExtractor {
    pub fn new() -> Self {
        Self { width: 8, height: 8 }
    }
}

impl Default for PerceptualHashExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureExtractor for PerceptualHashExtractor {
    fn embed(&self, frame: &Frame) -> Embedding {
        // Gradient hashing needs no DCT tables, so a hasher per frame is cheap.
        let hasher = HasherConfig::new()
            .hash_alg(HashAlg::Gradient)
            .hash_size(self.width, self.height)
            .to_hasher();
        let hash = hasher.hash_image(&frame.image);
        let values = hash
            .as_bytes()
            .iter()
            .flat_map(|byte| (0..8).map(move |bit| if (byte >> bit) & 1 == 1 { 1.0 } else { -1.0 }))
            .take(self.dimension())
            .collect();
        Embedding::new(values)
    }

    fn dimension(&self) -> usize {
        (self.width * self.height) as usize
    }

    fn name(&self) -> &str {
        "gradient-hash"
    }
}
