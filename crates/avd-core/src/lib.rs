pub mod config;
pub mod logging;

pub mod control;
pub mod cover;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod job;
pub mod merge;
pub mod paths;
pub mod pipeline;
pub mod planner;
pub mod probe;
pub mod progress;
pub mod storage;

pub use engine::Engine;
pub use fetch::{MediaKind, StreamSource};
pub use job::{JobRequest, JobStatus};
pub use progress::{ProgressEvent, ProgressSink};
