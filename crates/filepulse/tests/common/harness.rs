//! Test harness for isolated upload-to-terminal runs.
//!
//! Each `TestHarness` owns a temporary upload directory, an in-memory
//! database behind a `RecordingStore`, and a running `FilePulse` with
//! pacing disabled.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use filepulse::db::Database;
use filepulse::{
    Config, FilePulse, FileRecord, FileStatus, FileStore, ProcessingOutcome, ServiceError,
    SqliteFileStore, UploadReceipt,
};

use super::stores::RecordingStore;

pub const OWNER: i64 = 42;
const TERMINAL_TIMEOUT: Duration = Duration::from_secs(10);
const POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Terminal record plus every `(status, progress)` seen while polling.
pub struct Completed {
    pub record: FileRecord,
    pub observed: Vec<(FileStatus, u8)>,
}

pub struct TestHarness {
    temp_dir: TempDir,
    pub upload_dir: PathBuf,
    pub store: Arc<RecordingStore<SqliteFileStore>>,
    app: Option<FilePulse>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Builds a harness after letting `adjust` tweak the base config.
    pub fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let upload_dir = temp_dir.path().join("uploads");

        let mut config = Config::default();
        config.upload_directory = upload_dir.display().to_string();
        config.database_path = Some(":memory:".to_string());
        config.worker_count = 2;
        config.progress.tick_interval_ms = 0;
        adjust(&mut config);

        let database = Database::open_in_memory().expect("Failed to open database");
        let store = Arc::new(RecordingStore::new(SqliteFileStore::new(database)));
        let shared: Arc<dyn FileStore> = store.clone();
        let app = FilePulse::with_store(config, shared).expect("Failed to start FilePulse");

        Self {
            temp_dir,
            upload_dir,
            store,
            app: Some(app),
        }
    }

    /// Builds a harness whose pipeline writes through `store`.
    pub fn with_store(store: Arc<dyn FileStore>) -> (TempDir, FilePulse) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut config = Config::default();
        config.upload_directory = temp_dir.path().join("uploads").display().to_string();
        config.worker_count = 1;
        config.progress.tick_interval_ms = 0;
        let app = FilePulse::with_store(config, store).expect("Failed to start FilePulse");
        (temp_dir, app)
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn app(&self) -> &FilePulse {
        self.app.as_ref().expect("FilePulse already shut down")
    }

    pub fn upload(&self, filename: &str, bytes: &[u8]) -> Result<UploadReceipt, ServiceError> {
        self.app().upload(OWNER, filename, bytes)
    }

    /// Polls the record until it is terminal.
    pub fn wait_for_terminal(&self, file_id: &str) -> Completed {
        wait_for_terminal(self.app().store().as_ref(), file_id)
    }

    /// Blocks until the worker has finished with `file_id`, cleanup included.
    pub fn wait_for_outcome(&self, file_id: &str) -> ProcessingOutcome {
        wait_for_outcome(self.app(), file_id)
    }

    /// Files currently in the upload directory.
    pub fn upload_files(&self) -> Vec<PathBuf> {
        upload_files(&self.upload_dir)
    }

    /// Waits for all queued jobs and stops the workers.
    pub fn shutdown(&mut self) {
        if let Some(app) = self.app.take() {
            app.shutdown();
        }
    }
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        self.shutdown();
    }
}

pub fn wait_for_terminal(store: &dyn FileStore, file_id: &str) -> Completed {
    let deadline = Instant::now() + TERMINAL_TIMEOUT;
    let mut observed = Vec::new();

    loop {
        let record = store
            .get_by_owner(file_id, OWNER)
            .expect("Store read failed")
            .expect("Record disappeared");

        if observed.last() != Some(&(record.status, record.progress)) {
            observed.push((record.status, record.progress));
        }
        if record.status.is_terminal() {
            return Completed { record, observed };
        }

        assert!(
            Instant::now() < deadline,
            "File {} still {} after {:?}",
            file_id,
            record.status,
            TERMINAL_TIMEOUT
        );
        thread::sleep(POLL_INTERVAL);
    }
}

pub fn wait_for_outcome(app: &FilePulse, file_id: &str) -> ProcessingOutcome {
    let deadline = Instant::now() + TERMINAL_TIMEOUT;
    while Instant::now() < deadline {
        if let Some(outcome) = app.pool().recv_result_timeout(Duration::from_millis(100)) {
            if outcome.file_id == file_id {
                return outcome;
            }
        }
    }
    panic!("No outcome for file {} after {:?}", file_id, TERMINAL_TIMEOUT);
}

pub fn upload_files(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Position of a status in the forward state machine.
pub fn status_rank(status: FileStatus) -> u8 {
    match status {
        FileStatus::Uploading => 0,
        FileStatus::Processing => 1,
        FileStatus::Ready | FileStatus::Failed => 2,
    }
}
