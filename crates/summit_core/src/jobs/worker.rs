//! In-process worker-thread job dispatcher.
//!
//! # Responsibility
//! - Drain enqueued jobs on a dedicated thread holding its own connection
//!   to the same database file.
//! - Keep enqueue non-blocking and result-free for callers.
//!
//! # Invariants
//! - Handler failures are logged and swallowed; the worker keeps draining.
//! - Dropping the queue closes the channel; `shutdown` joins the worker
//!   after the remaining jobs are drained.

use crate::db::open_db;
use crate::jobs::{execute_job, Job, JobQueue, QueuedJob};
use log::{error, info};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Sender};
use std::thread::JoinHandle;

/// Default in-process implementation of [`JobQueue`].
///
/// Jobs flow through an unbounded channel to one worker thread. The
/// worker opens its own connection to `db_path`; file-backed databases
/// are required because in-memory databases are per-connection.
pub struct WorkerJobQueue {
    sender: Option<Sender<QueuedJob>>,
    handle: Option<JoinHandle<()>>,
}

impl WorkerJobQueue {
    /// Starts the worker thread for the given database file.
    pub fn start(db_path: impl Into<PathBuf>) -> Self {
        let db_path = db_path.into();
        let (sender, receiver) = channel::<QueuedJob>();

        let handle = std::thread::spawn(move || {
            let conn = match open_db(&db_path) {
                Ok(conn) => conn,
                Err(err) => {
                    error!(
                        "event=job_worker module=jobs status=error error_code=worker_db_open_failed error={err}"
                    );
                    return;
                }
            };

            info!("event=job_worker module=jobs status=started");
            while let Ok(queued) = receiver.recv() {
                match execute_job(&conn, &queued.job) {
                    Ok(()) => info!(
                        "event=job_execute module=jobs status=ok job_id={} job_type={}",
                        queued.job_id,
                        queued.job.job_type()
                    ),
                    Err(err) => error!(
                        "event=job_execute module=jobs status=error job_id={} job_type={} error={err}",
                        queued.job_id,
                        queued.job.job_type()
                    ),
                }
            }
            info!("event=job_worker module=jobs status=stopped");
        });

        Self {
            sender: Some(sender),
            handle: Some(handle),
        }
    }

    /// Closes the channel and waits for remaining jobs to drain.
    pub fn shutdown(mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl JobQueue for WorkerJobQueue {
    fn enqueue(&self, job: Job) {
        let queued = QueuedJob::new(job);
        info!(
            "event=job_enqueue module=jobs status=ok job_id={} job_type={}",
            queued.job_id,
            queued.job.job_type()
        );
        if let Some(sender) = &self.sender {
            if sender.send(queued).is_err() {
                error!(
                    "event=job_enqueue module=jobs status=error error_code=worker_unavailable"
                );
            }
        }
    }
}

impl Drop for WorkerJobQueue {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
