//! The concurrent read-processing pipeline.
//!
//! Producer roles push read units into a bounded queue, processor roles
//! consume them and push results to a write queue, and the orchestrator
//! drives the whole graph phase by phase. See [`queue::ReadQueue`] for the
//! termination protocol everything else is built on.

pub mod orchestrator;
pub mod pool;
pub mod queue;
pub mod roles;

pub use orchestrator::{Pipeline, SourceFactory};
pub use pool::WorkerPool;
pub use queue::ReadQueue;
pub use roles::{AlignFn, PostProcessor, Processor, Reader, ReportFn, ReportProcessor, Writer};
