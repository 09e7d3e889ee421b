use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use log::{debug, error, info, warn};

use crate::error::WorkerError;
use crate::pipeline::{Pipeline, PipelineError};
use crate::worker::job::{ProcessingJob, ProcessingOutcome};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Fixed set of threads running pipeline jobs from a bounded queue.
///
/// `submit` never blocks: a full queue is reported to the caller. After
/// `shutdown`, workers finish whatever is already queued and exit.
pub struct WorkerPool {
    /// `None` once shut down. Sends and the close happen under this lock,
    /// so every accepted job is queued before workers see the flag.
    job_sender: Mutex<Option<Sender<ProcessingJob>>>,
    job_receiver: Receiver<ProcessingJob>,
    result_receiver: Receiver<ProcessingOutcome>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl WorkerPool {
    pub fn new(pipeline: Arc<Pipeline>, worker_count: usize, queue_capacity: usize) -> Self {
        let worker_count = worker_count.max(1);
        let (job_sender, job_receiver) = bounded::<ProcessingJob>(queue_capacity.max(1));
        let (result_sender, result_receiver) =
            bounded::<ProcessingOutcome>(queue_capacity.max(1) + worker_count);
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let job_rx = job_receiver.clone();
            let result_tx = result_sender.clone();
            let shutdown_flag = Arc::clone(&shutdown);
            let worker_pipeline = Arc::clone(&pipeline);

            let handle = thread::Builder::new()
                .name(format!("filepulse-worker-{}", worker_id))
                .spawn(move || {
                    run_worker(worker_id, job_rx, result_tx, shutdown_flag, worker_pipeline);
                });

            match handle {
                Ok(handle) => workers.push(handle),
                Err(e) => error!("Failed to spawn worker {}: {}", worker_id, e),
            }
        }

        info!("Started {} workers", workers.len());

        Self {
            job_sender: Mutex::new(Some(job_sender)),
            job_receiver,
            result_receiver,
            workers,
            shutdown,
        }
    }

    /// Queues a job without blocking.
    pub fn submit(&self, job: ProcessingJob) -> Result<(), WorkerError> {
        let sender = self.sender();
        let Some(sender) = sender.as_ref() else {
            return Err(WorkerError::ChannelClosed);
        };

        sender.try_send(job).map_err(|e| match e {
            TrySendError::Full(_) => WorkerError::QueueFull,
            TrySendError::Disconnected(_) => WorkerError::ChannelClosed,
        })
    }

    fn sender(&self) -> MutexGuard<'_, Option<Sender<ProcessingJob>>> {
        match self.job_sender.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Job sender lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Drops the job sender, then raises the shutdown flag.
    fn close(&self) {
        let mut sender = self.sender();
        sender.take();
        self.shutdown.store(true, Ordering::SeqCst);
    }

    pub fn try_recv_result(&self) -> Option<ProcessingOutcome> {
        self.result_receiver.try_recv().ok()
    }

    pub fn recv_result(&self) -> Option<ProcessingOutcome> {
        self.result_receiver.recv().ok()
    }

    pub fn recv_result_timeout(&self, timeout: Duration) -> Option<ProcessingOutcome> {
        self.result_receiver.recv_timeout(timeout).ok()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Jobs waiting for a worker.
    pub fn queued(&self) -> usize {
        self.job_receiver.len()
    }

    pub fn shutdown(&self) {
        info!("Shutting down worker pool...");
        self.close();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Stops accepting jobs and joins every worker once the queue is drained.
    pub fn wait(self) {
        self.close();

        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Worker {} panicked: {:?}", i, e);
            } else {
                debug!("Worker {} finished", i);
            }
        }

        info!("All workers have stopped");
    }
}

fn run_worker(
    worker_id: usize,
    job_receiver: Receiver<ProcessingJob>,
    result_sender: Sender<ProcessingOutcome>,
    shutdown: Arc<AtomicBool>,
    pipeline: Arc<Pipeline>,
) {
    debug!("Worker {} started", worker_id);

    loop {
        if shutdown.load(Ordering::SeqCst) {
            while let Ok(job) = job_receiver.try_recv() {
                let outcome = process(worker_id, &pipeline, job);
                deliver(worker_id, &result_sender, outcome);
            }
            debug!("Worker {} received shutdown signal", worker_id);
            break;
        }

        match job_receiver.recv_timeout(POLL_INTERVAL) {
            Ok(job) => {
                let outcome = process(worker_id, &pipeline, job);
                deliver(worker_id, &result_sender, outcome);
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                debug!("Worker {} job channel disconnected", worker_id);
                break;
            }
        }
    }

    debug!("Worker {} stopped", worker_id);
}

/// Runs one job. A panic inside the run is turned into a failed file.
fn process(worker_id: usize, pipeline: &Pipeline, job: ProcessingJob) -> ProcessingOutcome {
    debug!("Worker {} processing file {}", worker_id, job.file_id);
    let snapshot = job.clone();

    match panic::catch_unwind(AssertUnwindSafe(|| pipeline.run(job))) {
        Ok(outcome) => outcome,
        Err(payload) => {
            let err = PipelineError::Panicked(panic_message(payload.as_ref()));
            let message = err.user_message();
            error!(
                "Worker {} recovered from panic on file {}: {}",
                worker_id, snapshot.file_id, err
            );
            pipeline.mark_failed(&snapshot.file_id, &message);
            ProcessingOutcome::failed(&snapshot, message, 0)
        }
    }
}

/// Results are informational; nobody is required to drain them.
fn deliver(worker_id: usize, sender: &Sender<ProcessingOutcome>, outcome: ProcessingOutcome) {
    match sender.try_send(outcome) {
        Ok(()) => {}
        Err(TrySendError::Full(outcome)) => {
            debug!(
                "Worker {} dropped result for file {}: result queue full",
                worker_id, outcome.file_id
            );
        }
        Err(TrySendError::Disconnected(outcome)) => {
            warn!(
                "Worker {} dropped result for file {}: pool is gone",
                worker_id, outcome.file_id
            );
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
