//! In-process orchestration of batch jobs: one operation applied to many
//! items with bounded concurrency, pause/resume, cancellation and retry of
//! failed items.

pub mod config;
pub mod events;
pub mod filter;
pub mod job;
pub mod operation;
mod runner;
pub mod stats;
pub mod store;
pub mod types;

pub use config::BatchConfig;
pub use events::BatchEvent;
pub use filter::JobFilter;
pub use job::{BatchItem, BatchJob, JobParams, NewBatchItem};
pub use operation::{FnOperation, ItemOperation, OperationRegistry, operation_fn};
pub use stats::BatchStats;
pub use store::BatchJobStore;
pub use types::{ItemFailurePolicy, ItemStatus, JobStatus, OperationType};
