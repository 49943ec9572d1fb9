use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{FaceError, Result};

/// Controls the worker pool used for batch feature extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Number of extraction threads; 0 lets rayon decide
    pub worker_threads: usize,
}

impl RuntimeConfig {
    /// Runs everything on one worker thread.
    pub fn single_threaded() -> Self {
        Self { worker_threads: 1 }
    }
}

pub fn create_thread_pool(config: &RuntimeConfig) -> Result<ThreadPool> {
    let mut builder = ThreadPoolBuilder::new().thread_name(|i| format!("lbpface-worker-{}", i));

    if config.worker_threads > 0 {
        builder = builder.num_threads(config.worker_threads);
    }

    builder
        .build()
        .map_err(|e| FaceError::Runtime(format!("Failed to build worker pool: {}", e)))
}
