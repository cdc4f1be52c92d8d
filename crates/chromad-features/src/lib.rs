pub mod extractor;
pub mod standardizer;

pub use extractor::{
    FeatureExtractor, GLOBAL_FEATURES, REGIONS, REGION_FEATURES,
};
pub use standardizer::{Standardizer, STANDARD_CLIP};
