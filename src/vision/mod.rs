pub mod extractor;
pub mod frame;

pub use extractor::{FeatureExtractor, PerceptualHashExtractor, ThumbnailExtractor};
pub use frame::{Frame, FrameSource, SnapshotFileSource};
