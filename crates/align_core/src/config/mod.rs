//! Task configuration.
//!
//! A single immutable [`TaskConfig`] is passed into the pipeline; there are
//! no configuration globals. Sections map to TOML tables and every field has
//! a default, so a partial file (or an empty one) is valid.

mod settings;

pub use settings::{
    AudioSettings, BoundaryAlgorithm, BoundarySettings, OutputSettings, PathSettings, TaskConfig,
};
