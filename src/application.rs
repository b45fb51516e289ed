//! The forwarder context: types database, flush buffer and dispatcher wired
//! together behind the per-sample write callback.

use crate::catalog::TypeCatalog;
use crate::core::{Config, FlushdError, RawSample, Result};
use crate::export::Dispatcher;
use crate::metrics::{normalize, FlushBuffer, FlushDecision};
use crate::monitoring::{ForwarderStats, StatsSnapshot};
use arc_swap::ArcSwap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What happened to an accepted sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The record is waiting in the buffer
    Buffered,
    /// The record triggered a flush of `count` records
    Flushed {
        /// Records in the flushed batch
        count: usize,
        /// Whether the collector accepted the batch
        delivered: bool,
    },
}

/// Owns everything the write path needs. Built once at startup and shared
/// by reference (usually behind an `Arc`) with every producer.
pub struct Forwarder {
    catalog: ArcSwap<TypeCatalog>,
    types_db: PathBuf,
    buffer: FlushBuffer,
    dispatcher: Dispatcher,
    stats: ForwarderStats,
}

impl Forwarder {
    /// One-time initialization: load the types database and set up the
    /// buffer and dispatcher. Fails on any configuration problem.
    pub fn new(config: &Config) -> Result<Self> {
        let catalog = TypeCatalog::load(&config.types_db)?;
        Self::with_catalog(config, catalog)
    }

    /// Initialize with an already loaded catalog
    pub fn with_catalog(config: &Config, catalog: TypeCatalog) -> Result<Self> {
        let dispatcher = Dispatcher::new(&config.endpoint)?;
        Ok(Self::from_parts(
            catalog,
            config.types_db.clone(),
            FlushBuffer::new(config.flush),
            dispatcher,
        ))
    }

    /// Assemble a forwarder from its parts
    pub fn from_parts(
        catalog: TypeCatalog,
        types_db: PathBuf,
        buffer: FlushBuffer,
        dispatcher: Dispatcher,
    ) -> Self {
        tracing::info!(
            "Forwarding to {} (auth: {}, flush every {}s or {} records)",
            dispatcher.url(),
            dispatcher.auth_scheme(),
            buffer.config().interval_secs,
            buffer.config().max_values
        );

        Self {
            catalog: ArcSwap::from_pointee(catalog),
            types_db,
            buffer,
            dispatcher,
            stats: ForwarderStats::new(),
        }
    }

    /// Per-sample callback.
    ///
    /// Rejected samples are logged, counted and returned as errors without
    /// touching the buffer. If the sample triggers a flush, the batch is sent
    /// on the calling task after the buffer lock has been released; a failed
    /// send is logged and never surfaces as an error here.
    pub async fn write(&self, sample: &RawSample) -> Result<WriteOutcome> {
        let record = {
            let catalog = self.catalog.load();
            match normalize(sample, &catalog) {
                Ok(record) => record,
                Err(err) => {
                    self.reject(&err);
                    return Err(err);
                },
            }
        };
        self.stats.record_accepted();

        match self.buffer.append(record) {
            FlushDecision::Hold => Ok(WriteOutcome::Buffered),
            FlushDecision::Flush(batch) => {
                let count = batch.len();
                let delivered = self.dispatcher.flush(batch).await;
                self.stats.record_flush(count, delivered);
                Ok(WriteOutcome::Flushed { count, delivered })
            },
        }
    }

    /// Send whatever is buffered, regardless of thresholds.
    ///
    /// Returns the number of records that were sent (or dropped on failure).
    pub async fn flush_now(&self) -> usize {
        let batch = self.buffer.drain();
        let count = batch.len();
        if count > 0 {
            let delivered = self.dispatcher.flush(batch).await;
            self.stats.record_flush(count, delivered);
        }
        count
    }

    /// Replace the types database with a fresh load from disk.
    ///
    /// On failure the current catalog stays in place.
    pub fn reload_catalog(&self) -> Result<usize> {
        let catalog = TypeCatalog::load(&self.types_db)?;
        let count = catalog.len();
        self.catalog.store(Arc::new(catalog));
        Ok(count)
    }

    /// Current types database
    pub fn catalog(&self) -> Arc<TypeCatalog> {
        self.catalog.load_full()
    }

    /// Path the types database is (re)loaded from
    pub fn types_db(&self) -> &Path {
        &self.types_db
    }

    /// Number of records waiting for the next flush
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Counter snapshot
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    fn reject(&self, err: &FlushdError) {
        match err {
            FlushdError::UnknownType { type_name } => {
                self.stats.record_unknown_type();
                tracing::warn!(
                    "Unknown type '{}'. Types database ({:?}) properly configured?",
                    type_name,
                    self.types_db
                );
            },
            FlushdError::ArityMismatch { .. } => {
                self.stats.record_arity_mismatch();
                tracing::warn!("{}", err);
            },
            other => tracing::warn!("Dropping sample: {}", other),
        }
    }
}
