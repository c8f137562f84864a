//! DispatchTrigger — launches the batch send script without waiting for it.
//!
//! The caller gets a ticket as soon as the process is running. A supervising
//! task waits for exit, logs the output and records the outcome in the job
//! registry, which is the only place completion becomes visible.
//! One batch runs at a time.

use std::collections::HashMap;
use std::io;
use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::process::{Child, Command};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::process::{log_output, output_tail, MAX_OUTPUT_TAIL_CHARS};

pub mod handlers;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to launch dispatch process: {0}")]
    Spawn(#[source] io::Error),

    #[error("dispatch job {0} is still running")]
    AlreadyRunning(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchJob {
    pub id: Uuid,
    pub status: JobStatus,
    pub exit_code: Option<i32>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub stdout_tail: String,
    pub stderr_tail: String,
    /// Set when waiting on the process itself failed.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct DispatchTicket {
    pub job_id: Uuid,
    pub started_at: DateTime<Utc>,
}

#[derive(Default)]
struct JobRegistry {
    jobs: HashMap<Uuid, DispatchJob>,
    running: Option<Uuid>,
}

#[derive(Clone)]
pub struct DispatchTrigger {
    program: String,
    script: Option<String>,
    registry: Arc<Mutex<JobRegistry>>,
}

impl DispatchTrigger {
    pub fn new(program: String, script: Option<String>) -> Self {
        Self {
            program,
            script,
            registry: Arc::new(Mutex::new(JobRegistry::default())),
        }
    }

    /// Starts the send script and returns immediately.
    /// Must be called from inside a Tokio runtime.
    pub fn trigger_send(&self) -> Result<DispatchTicket, DispatchError> {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(running) = registry.running {
            return Err(DispatchError::AlreadyRunning(running));
        }

        let mut command = Command::new(&self.program);
        if let Some(script) = &self.script {
            command.arg(script);
        }
        let child = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(DispatchError::Spawn)?;

        let job_id = Uuid::new_v4();
        let started_at = Utc::now();
        registry.jobs.insert(
            job_id,
            DispatchJob {
                id: job_id,
                status: JobStatus::Running,
                exit_code: None,
                started_at,
                finished_at: None,
                stdout_tail: String::new(),
                stderr_tail: String::new(),
                error: None,
            },
        );
        registry.running = Some(job_id);
        drop(registry);

        info!("Dispatch job {job_id} started: {} {:?}", self.program, self.script);
        tokio::spawn(supervise(child, job_id, self.registry.clone()));

        Ok(DispatchTicket { job_id, started_at })
    }

    pub fn job(&self, job_id: Uuid) -> Option<DispatchJob> {
        let registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        registry.jobs.get(&job_id).cloned()
    }

    pub fn running_job(&self) -> Option<Uuid> {
        let registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        registry.running
    }
}

async fn supervise(child: Child, job_id: Uuid, registry: Arc<Mutex<JobRegistry>>) {
    let result = child.wait_with_output().await;

    let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
    if registry.running == Some(job_id) {
        registry.running = None;
    }
    let Some(job) = registry.jobs.get_mut(&job_id) else {
        return;
    };
    job.finished_at = Some(Utc::now());

    match result {
        Ok(output) => {
            log_output("dispatch", "stdout", &output.stdout);
            log_output("dispatch", "stderr", &output.stderr);
            job.exit_code = output.status.code();
            job.stdout_tail = output_tail(&output.stdout, MAX_OUTPUT_TAIL_CHARS);
            job.stderr_tail = output_tail(&output.stderr, MAX_OUTPUT_TAIL_CHARS);
            if output.status.success() {
                job.status = JobStatus::Succeeded;
                info!("Dispatch job {job_id} completed successfully");
            } else {
                job.status = JobStatus::Failed;
                warn!(
                    "Dispatch job {job_id} failed with exit code {:?}",
                    output.status.code()
                );
            }
        }
        Err(e) => {
            error!("Dispatch job {job_id} could not be awaited: {e}");
            job.status = JobStatus::Failed;
            job.error = Some(e.to_string());
        }
    }
}
