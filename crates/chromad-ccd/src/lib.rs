pub mod assembler;
pub mod constants;
pub mod preprocess;
pub mod source;
pub mod stats;

pub use assembler::FrameAssembler;
pub use constants::{FRAME_BYTES, FRAME_SAMPLES, IQR_EPSILON, NORM_CLIP};
pub use preprocess::{median_filter3, Percentiles, Preprocessor};
pub use source::{ByteSource, ChannelByteSource};
pub use stats::FrameStats;
