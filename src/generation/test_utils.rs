//! Shared test utilities for the `generation` module.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::generation::store::{
    GenerationErrorLog, GenerationId, GenerationRecord, GenerationStore, MemoryStore,
    NewGeneration, NewGenerationErrorLog, StoreFuture,
};

/// In-memory store whose inserts can be made to fail.
///
/// Successful inserts land in a wrapped [`MemoryStore`]. Failed inserts
/// are counted but leave no row behind, so tests can assert both that a
/// write was attempted and that nothing was persisted.
pub(crate) struct ConfigurableMockStore {
    inner: MemoryStore,
    fail_generations: AtomicBool,
    fail_error_logs: AtomicBool,
    error_log_attempts: AtomicUsize,
}

impl ConfigurableMockStore {
    /// Creates a store where every insert succeeds.
    pub(crate) fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_generations: AtomicBool::new(false),
            fail_error_logs: AtomicBool::new(false),
            error_log_attempts: AtomicUsize::new(0),
        }
    }

    /// Makes generation inserts fail.
    pub(crate) fn fail_generations(self) -> Self {
        self.fail_generations.store(true, Ordering::SeqCst);
        self
    }

    /// Makes error log inserts fail.
    pub(crate) fn fail_error_logs(self) -> Self {
        self.fail_error_logs.store(true, Ordering::SeqCst);
        self
    }

    /// Stored generations.
    pub(crate) fn generations(&self) -> Vec<GenerationRecord> {
        self.inner.generations()
    }

    /// Stored error logs.
    pub(crate) fn error_logs(&self) -> Vec<GenerationErrorLog> {
        self.inner.error_logs()
    }

    /// Number of error log inserts attempted, including failed ones.
    pub(crate) fn error_log_attempts(&self) -> usize {
        self.error_log_attempts.load(Ordering::SeqCst)
    }
}

impl GenerationStore for ConfigurableMockStore {
    fn insert_generation(&self, generation: NewGeneration) -> StoreFuture<'_, GenerationId> {
        if self.fail_generations.load(Ordering::SeqCst) {
            return Box::pin(async { Err(anyhow::anyhow!("generations table unavailable")) });
        }
        self.inner.insert_generation(generation)
    }

    fn insert_error_log(&self, log: NewGenerationErrorLog) -> StoreFuture<'_, ()> {
        self.error_log_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_error_logs.load(Ordering::SeqCst) {
            return Box::pin(async { Err(anyhow::anyhow!("error log table unavailable")) });
        }
        self.inner.insert_error_log(log)
    }
}
