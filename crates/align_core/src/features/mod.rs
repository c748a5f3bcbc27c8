//! MFCC feature extraction.
//!
//! Audio enters the aligner as a sequence of MFCC frames; both the real
//! recording and the synthesized speech go through the same extractor so the
//! DTW distance compares like with like.

mod matrix;
mod mfcc;

pub use matrix::FeatureMatrix;
pub use mfcc::{MfccConfig, MfccExtractor};
