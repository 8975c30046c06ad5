//! Background side of the loader: the worker pool and the tasks it runs.

pub mod loader_task;
pub mod worker_pool;

pub use loader_task::{LoadRequest, LoaderTask};
pub use worker_pool::WorkerPool;
