//! Batch compression worker.
//!
//! This crate provides:
//! - Recursive discovery of source files and the existing-output skip check
//! - A sequential batch runner on top of the transcode supervisor
//! - Background execution with a cancellation handle
//! - The post-batch shutdown/hibernate action
//! - Environment configuration and terminal progress display

pub mod batch;
pub mod config;
pub mod console;
pub mod discovery;
pub mod error;
pub mod handle;
pub mod logging;
pub mod post_task;

pub use batch::BatchRunner;
pub use config::WorkerConfig;
pub use console::ConsoleProgress;
pub use error::{WorkerError, WorkerResult};
pub use handle::{spawn_batch, BatchHandle};
pub use logging::JobLogger;
pub use post_task::{PostTaskRunner, SystemPostTask};
