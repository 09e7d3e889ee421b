use std::sync::Arc;

use log::{info, warn};

use crate::broadcast::{ProgressBroadcaster, Subscription};
use crate::config::{validate_config, Config};
use crate::db::Database;
use crate::error::{FilePulseError, Result, ServiceError};
use crate::intake::{UploadIntake, UploadReceipt};
use crate::parser::ParserRegistry;
use crate::pipeline::{Pipeline, PipelineConfig};
use crate::queries::FileQueries;
use crate::store::{FileStore, SqliteFileStore};
use crate::worker::WorkerPool;

/// Everything needed to accept uploads, process them in the background and
/// answer queries, wired from one [`Config`].
pub struct FilePulse {
    config: Config,
    store: Arc<dyn FileStore>,
    broadcaster: Arc<ProgressBroadcaster>,
    pool: Arc<WorkerPool>,
    intake: UploadIntake,
    queries: FileQueries,
}

impl FilePulse {
    /// Opens the configured SQLite database and starts the worker pool.
    pub fn new(config: Config) -> Result<Self> {
        validate_config(&config)?;
        let database = Database::open(&config.database_path())?;
        Self::with_store(config, Arc::new(SqliteFileStore::new(database)))
    }

    pub fn with_store(config: Config, store: Arc<dyn FileStore>) -> Result<Self> {
        validate_config(&config)?;

        let upload_dir = config.upload_directory();
        std::fs::create_dir_all(&upload_dir).map_err(|e| FilePulseError::CreateDirectory {
            path: upload_dir.clone(),
            source: e,
        })?;

        let broadcaster = Arc::new(ProgressBroadcaster::new(config.broadcast.observer_buffer));
        let pipeline = Arc::new(Pipeline::new(
            Arc::new(PipelineConfig::from_config(&config)),
            Arc::new(ParserRegistry::new()),
            Arc::clone(&store),
            Arc::clone(&broadcaster),
        ));
        let pool = Arc::new(WorkerPool::new(
            pipeline,
            config.worker_count,
            config.queue_capacity,
        ));

        let intake = UploadIntake::new(
            &upload_dir,
            config.max_upload_bytes,
            Arc::clone(&store),
            Arc::clone(&pool),
        );
        let queries = FileQueries::new(Arc::clone(&store), &upload_dir);

        info!(
            "FilePulse ready: {} workers, queue capacity {}",
            pool.worker_count(),
            config.queue_capacity
        );

        Ok(Self {
            config,
            store,
            broadcaster,
            pool,
            intake,
            queries,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn FileStore> {
        &self.store
    }

    pub fn broadcaster(&self) -> &Arc<ProgressBroadcaster> {
        &self.broadcaster
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub fn intake(&self) -> &UploadIntake {
        &self.intake
    }

    pub fn queries(&self) -> &FileQueries {
        &self.queries
    }

    pub fn upload(
        &self,
        owner_id: i64,
        filename: &str,
        bytes: &[u8],
    ) -> std::result::Result<UploadReceipt, ServiceError> {
        self.intake.upload(owner_id, filename, bytes)
    }

    /// Registers an observer for `file_id`. Events published before this
    /// call are not replayed.
    pub fn subscribe(&self, file_id: &str) -> Subscription {
        self.broadcaster.subscribe(file_id)
    }

    /// Stops intake and waits for queued jobs to finish.
    pub fn shutdown(self) {
        let Self { pool, intake, .. } = self;
        drop(intake);

        match Arc::try_unwrap(pool) {
            Ok(pool) => pool.wait(),
            Err(pool) => {
                warn!("Worker pool still shared; signalling shutdown without waiting");
                pool.shutdown();
            }
        }
    }
}
