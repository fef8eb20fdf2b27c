use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use chrono::{DateTime, Utc};
use contimg_common::{
    error::{OpsError, Result},
    time::{new_id, now},
};
use tokio::{
    runtime::Handle,
    sync::{Semaphore, broadcast},
};
use tracing::{debug, info, warn};

use crate::{
    config::BatchConfig,
    events::BatchEvent,
    filter::JobFilter,
    job::{BatchItem, BatchJob, JobParams, NewBatchItem},
    operation::OperationRegistry,
    runner::{JobRunner, current_runtime},
    stats::BatchStats,
    types::{ItemStatus, JobStatus, OperationType},
};

struct JobEntry {
    job: BatchJob,
    /// Concurrency window shared by every run of this job.
    permits: Arc<Semaphore>,
}

#[derive(Default)]
struct StoreState {
    jobs: BTreeMap<u64, JobEntry>,
    index: HashMap<String, u64>,
    next_seq: u64,
    selected: Option<String>,
}

impl StoreState {
    fn entry(&self, job_id: &str) -> Option<&JobEntry> {
        self.index.get(job_id).and_then(|seq| self.jobs.get(seq))
    }

    fn entry_mut(&mut self, job_id: &str) -> Option<&mut JobEntry> {
        let seq = *self.index.get(job_id)?;
        self.jobs.get_mut(&seq)
    }

    fn require_mut(&mut self, job_id: &str) -> Result<&mut JobEntry> {
        self.entry_mut(job_id)
            .ok_or_else(|| OpsError::JobNotFound(job_id.to_string()))
    }
}

struct StoreInner {
    config: BatchConfig,
    registry: OperationRegistry,
    state: RwLock<StoreState>,
    events: broadcast::Sender<BatchEvent>,
}

/// Process-wide container for batch jobs.
///
/// Commands mutate state inside a single write-lock section and hand
/// asynchronous work to a job runner. Selectors only take the read lock.
/// Runners are spawned onto the current Tokio runtime; `submit`, `resume_job`
/// and `retry_job` are rejected with no state change outside of one.
#[derive(Clone)]
pub struct BatchJobStore {
    inner: Arc<StoreInner>,
}

impl BatchJobStore {
    pub fn new(config: BatchConfig, registry: OperationRegistry) -> Result<Self> {
        config.validate()?;
        let (events, _) = broadcast::channel(config.event_capacity);
        Ok(Self {
            inner: Arc::new(StoreInner {
                config,
                registry,
                state: RwLock::new(StoreState::default()),
                events,
            }),
        })
    }

    pub fn config(&self) -> &BatchConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &OperationRegistry {
        &self.inner.registry
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BatchEvent> {
        self.inner.events.subscribe()
    }

    /// Submits a job whose operation takes no parameters.
    pub fn submit(
        &self,
        name: impl Into<String>,
        operation_type: OperationType,
        items: Vec<NewBatchItem>,
        submitted_by: impl Into<String>,
    ) -> Result<String> {
        self.submit_with_params(name, operation_type, items, JobParams::new(), submitted_by)
    }

    /// Creates a queued job and starts running it. `params` are stored on the
    /// job and handed to the operation with every item.
    pub fn submit_with_params(
        &self,
        name: impl Into<String>,
        operation_type: OperationType,
        items: Vec<NewBatchItem>,
        params: JobParams,
        submitted_by: impl Into<String>,
    ) -> Result<String> {
        let name = name.into();
        let submitted_by = submitted_by.into();
        validate_submission(&name, &items, &submitted_by)?;
        let operation = self.inner.registry.get(operation_type)?;
        let runtime = current_runtime()?;

        let job_id = new_id();
        let item_count = items.len();
        let job = BatchJob {
            id: job_id.clone(),
            name,
            operation_type,
            status: JobStatus::Queued,
            items: items.into_iter().map(BatchItem::from).collect(),
            params: params.clone(),
            progress: 0,
            completed_count: 0,
            failed_count: 0,
            error: None,
            submitted_at: now(),
            started_at: None,
            completed_at: None,
            submitted_by,
        };
        let permits = Arc::new(Semaphore::new(self.inner.config.concurrency));

        {
            let mut state = self.state_write();
            let seq = state.next_seq;
            state.next_seq += 1;
            state.index.insert(job_id.clone(), seq);
            state.jobs.insert(
                seq,
                JobEntry {
                    job,
                    permits: Arc::clone(&permits),
                },
            );
            self.emit(BatchEvent::JobSubmitted {
                job_id: job_id.clone(),
            });
        }

        info!(
            job_id = %job_id,
            operation = %operation_type,
            items = item_count,
            "batch job submitted"
        );
        JobRunner::new(
            self.clone(),
            job_id.clone(),
            operation,
            params,
            permits,
            self.inner.config.concurrency,
        )
        .spawn(&runtime);

        Ok(job_id)
    }

    pub fn cancel_job(&self, job_id: &str) -> Result<BatchJob> {
        let mut state = self.state_write();
        let entry = state.require_mut(job_id)?;
        let job = &mut entry.job;
        if job.is_terminal() {
            return Err(invalid_state(job, "cancel"));
        }

        let timestamp = now();
        let skipped = job.skip_unfinished(timestamp, false);
        job.refresh_counts();
        self.transition(job, JobStatus::Cancelled, timestamp);
        info!(
            job_id = %job_id,
            skipped,
            in_flight = job.processing_count(),
            "batch job cancelled"
        );
        Ok(job.clone())
    }

    pub fn pause_job(&self, job_id: &str) -> Result<BatchJob> {
        let mut state = self.state_write();
        let entry = state.require_mut(job_id)?;
        let job = &mut entry.job;
        if job.status != JobStatus::Running {
            return Err(invalid_state(job, "pause"));
        }

        self.transition(job, JobStatus::Paused, now());
        info!(job_id = %job_id, pending = job.pending_count(), "batch job paused");
        Ok(job.clone())
    }

    pub fn resume_job(&self, job_id: &str) -> Result<BatchJob> {
        let runtime = current_runtime()?;
        let (snapshot, permits) = {
            let mut state = self.state_write();
            let entry = state.require_mut(job_id)?;
            if entry.job.status != JobStatus::Paused {
                return Err(invalid_state(&entry.job, "resume"));
            }

            self.transition(&mut entry.job, JobStatus::Running, now());
            (entry.job.clone(), Arc::clone(&entry.permits))
        };

        info!(job_id = %job_id, pending = snapshot.pending_count(), "batch job resumed");
        self.spawn_runner(&runtime, &snapshot, permits)?;
        Ok(snapshot)
    }

    pub fn retry_job(&self, job_id: &str) -> Result<BatchJob> {
        let runtime = current_runtime()?;
        let (snapshot, permits, reset) = {
            let mut state = self.state_write();
            let entry = state.require_mut(job_id)?;
            let job = &mut entry.job;
            if !job.can_retry() {
                return Err(invalid_state(job, "retry"));
            }

            let mut reset = 0;
            for item in job
                .items
                .iter_mut()
                .filter(|item| item.status == ItemStatus::Failed)
            {
                item.status = ItemStatus::Pending;
                item.error = None;
                item.started_at = None;
                item.completed_at = None;
                reset += 1;
            }
            job.refresh_counts();
            job.completed_at = None;
            self.transition(job, JobStatus::Running, now());
            (job.clone(), Arc::clone(&entry.permits), reset)
        };

        info!(job_id = %job_id, reset, "batch job retry started");
        self.spawn_runner(&runtime, &snapshot, permits)?;
        Ok(snapshot)
    }

    /// Removes every job in a terminal state and returns how many were removed.
    pub fn clear_completed(&self) -> usize {
        let mut state = self.state_write();
        let removable: Vec<(u64, String)> = state
            .jobs
            .iter()
            .filter(|(_, entry)| entry.job.is_terminal())
            .map(|(seq, entry)| (*seq, entry.job.id.clone()))
            .collect();

        for (seq, job_id) in &removable {
            state.jobs.remove(seq);
            state.index.remove(job_id);
            self.emit(BatchEvent::JobRemoved {
                job_id: job_id.clone(),
            });
        }

        let removed: HashSet<&str> = removable.iter().map(|(_, id)| id.as_str()).collect();
        if state
            .selected
            .as_deref()
            .is_some_and(|selected| removed.contains(selected))
        {
            state.selected = None;
            self.emit(BatchEvent::SelectionChanged { job_id: None });
        }

        if !removable.is_empty() {
            info!(removed = removable.len(), "cleared finished batch jobs");
        }
        removable.len()
    }

    pub fn select_job(&self, job_id: Option<&str>) -> Result<()> {
        let mut state = self.state_write();
        if let Some(job_id) = job_id
            && state.entry(job_id).is_none()
        {
            return Err(OpsError::JobNotFound(job_id.to_string()));
        }

        let selected = job_id.map(str::to_string);
        if state.selected != selected {
            state.selected = selected.clone();
            self.emit(BatchEvent::SelectionChanged { job_id: selected });
        }
        Ok(())
    }

    pub fn selected_job_id(&self) -> Option<String> {
        self.state_read().selected.clone()
    }

    pub fn selected_job(&self) -> Option<BatchJob> {
        let state = self.state_read();
        let selected = state.selected.as_deref()?;
        state.entry(selected).map(|entry| entry.job.clone())
    }

    pub fn get_job(&self, job_id: &str) -> Option<BatchJob> {
        self.state_read()
            .entry(job_id)
            .map(|entry| entry.job.clone())
    }

    /// Jobs matching `filter`, most recently submitted first.
    pub fn get_filtered_jobs(&self, filter: &JobFilter) -> Vec<BatchJob> {
        self.state_read()
            .jobs
            .values()
            .rev()
            .filter(|entry| filter.matches(&entry.job))
            .map(|entry| entry.job.clone())
            .collect()
    }

    pub fn get_stats(&self) -> BatchStats {
        self.state_read()
            .jobs
            .values()
            .map(|entry| &entry.job)
            .collect()
    }

    /// Moves a queued job to running. Returns whether the job is running.
    pub(crate) fn start_run(&self, job_id: &str) -> bool {
        let mut state = self.state_write();
        let Some(entry) = state.entry_mut(job_id) else {
            return false;
        };
        if entry.job.status == JobStatus::Queued {
            self.transition(&mut entry.job, JobStatus::Running, now());
        }
        entry.job.status == JobStatus::Running
    }

    /// Marks the next pending item as processing, in item order.
    pub(crate) fn claim_next(&self, job_id: &str) -> Option<BatchItem> {
        let mut state = self.state_write();
        let job = &mut state.entry_mut(job_id)?.job;
        if job.status != JobStatus::Running {
            return None;
        }

        let timestamp = now();
        let item = job
            .items
            .iter_mut()
            .find(|item| item.status == ItemStatus::Pending)?;
        item.status = ItemStatus::Processing;
        item.started_at = Some(timestamp);
        let claimed = item.clone();
        job.started_at.get_or_insert(timestamp);

        debug!(job_id = %job_id, item_id = %claimed.id, "batch item started");
        self.emit(BatchEvent::ItemStarted {
            job_id: job_id.to_string(),
            item_id: claimed.id.clone(),
        });
        Some(claimed)
    }

    /// Records the outcome of an item's operation. Outcomes for items that are
    /// no longer processing (skipped by a fatal failure, or a removed job) are
    /// dropped.
    pub(crate) fn settle_item(&self, job_id: &str, item_id: &str, outcome: Result<()>) {
        let mut state = self.state_write();
        let Some(entry) = state.entry_mut(job_id) else {
            debug!(job_id = %job_id, item_id = %item_id, "dropping outcome for removed batch job");
            return;
        };
        let job = &mut entry.job;
        let Some(item) = job.item_mut(item_id) else {
            return;
        };
        if item.status != ItemStatus::Processing {
            debug!(
                job_id = %job_id,
                item_id = %item_id,
                status = ?item.status,
                "dropping stale batch item outcome"
            );
            return;
        }

        let timestamp = now();
        item.completed_at = Some(timestamp);
        match outcome {
            Ok(()) => {
                item.status = ItemStatus::Completed;
                item.error = None;
            }
            Err(err) => {
                warn!(job_id = %job_id, item_id = %item_id, error = %err, "batch item failed");
                item.status = ItemStatus::Failed;
                item.error = Some(err.to_string());
            }
        }
        let status = item.status;
        job.refresh_counts();
        self.emit(BatchEvent::ItemSettled {
            job_id: job_id.to_string(),
            item_id: item_id.to_string(),
            status,
            progress: job.progress,
        });

        self.finalize_if_drained(job, timestamp);
    }

    pub(crate) fn finish_run(&self, job_id: &str) {
        let mut state = self.state_write();
        if let Some(entry) = state.entry_mut(job_id) {
            self.finalize_if_drained(&mut entry.job, now());
        }
    }

    /// Stops a job permanently after a runner defect.
    pub(crate) fn fail_job(&self, job_id: &str, message: String) {
        let mut state = self.state_write();
        let Some(entry) = state.entry_mut(job_id) else {
            return;
        };
        let job = &mut entry.job;
        if job.is_terminal() {
            warn!(
                job_id = %job_id,
                status = %job.status,
                error = %message,
                "runner failure after job finished"
            );
            return;
        }

        let timestamp = now();
        job.skip_unfinished(timestamp, true);
        job.refresh_counts();
        job.error = Some(message);
        self.transition(job, JobStatus::Failed, timestamp);
    }

    fn finalize_if_drained(&self, job: &mut BatchJob, timestamp: DateTime<Utc>) {
        if job.status != JobStatus::Running || !job.is_drained() {
            return;
        }

        let status = job.drained_status(self.inner.config.failure_policy);
        self.transition(job, status, timestamp);
        info!(
            job_id = %job.id,
            status = %status,
            completed = job.completed_count,
            failed = job.failed_count,
            skipped = job.skipped_count(),
            "batch job finished"
        );
    }

    fn transition(&self, job: &mut BatchJob, status: JobStatus, timestamp: DateTime<Utc>) {
        job.status = status;
        if status.is_terminal() {
            job.completed_at.get_or_insert(timestamp);
        }
        self.emit(BatchEvent::JobStatusChanged {
            job_id: job.id.clone(),
            status,
        });
    }

    fn spawn_runner(
        &self,
        runtime: &Handle,
        job: &BatchJob,
        permits: Arc<Semaphore>,
    ) -> Result<()> {
        let operation = self.inner.registry.get(job.operation_type)?;
        JobRunner::new(
            self.clone(),
            job.id.clone(),
            operation,
            job.params.clone(),
            permits,
            self.inner.config.concurrency,
        )
        .spawn(runtime);
        Ok(())
    }

    fn emit(&self, event: BatchEvent) {
        // No subscribers is not an error.
        let _ = self.inner.events.send(event);
    }

    fn state_read(&self) -> RwLockReadGuard<'_, StoreState> {
        match self.inner.state.read() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn state_write(&self) -> RwLockWriteGuard<'_, StoreState> {
        match self.inner.state.write() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn invalid_state(job: &BatchJob, action: &'static str) -> OpsError {
    OpsError::InvalidState {
        job_id: job.id.clone(),
        status: job.status.to_string(),
        action,
    }
}

fn validate_submission(name: &str, items: &[NewBatchItem], submitted_by: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(OpsError::InvalidArgument(
            "job name must be a non-empty string".to_string(),
        ));
    }
    if submitted_by.trim().is_empty() {
        return Err(OpsError::InvalidArgument(
            "submitted_by must be a non-empty string".to_string(),
        ));
    }
    if items.is_empty() {
        return Err(OpsError::InvalidArgument(
            "a batch job needs at least one item".to_string(),
        ));
    }

    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if item.id.trim().is_empty() || item.name.trim().is_empty() {
            return Err(OpsError::InvalidArgument(
                "all item ids and names must be non-empty strings".to_string(),
            ));
        }
        if !seen.insert(item.id.as_str()) {
            return Err(OpsError::InvalidArgument(format!(
                "duplicate item id in batch: {}",
                item.id
            )));
        }
    }
    Ok(())
}
