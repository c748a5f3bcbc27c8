//! Task execution pipeline.
//!
//! Stages run sequentially: decode → MFCC → head/tail trim → synthesize →
//! DTW → anchor projection → re-translation → boundary adjustment → sync
//! map. A cancel handle is polled between stages (and inside DTW); temp
//! files are tracked by a registry that cleans up on every exit path.

mod cancel;
mod executor;
mod task;
mod temp;

pub use cancel::CancelHandle;
pub use executor::TaskExecutor;
pub use task::{ExecutionReport, Task};
pub use temp::TempRegistry;
