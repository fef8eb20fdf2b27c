use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};

use contimg_common::error::{OpsError, Result};
use futures::FutureExt;
use tokio::{
    runtime::Handle,
    sync::Semaphore,
    task::{JoinHandle, JoinSet},
};
use tracing::{debug, error};

use crate::{
    job::{BatchItem, JobParams},
    operation::ItemOperation,
    store::BatchJobStore,
};

/// Runtime that job runners are spawned onto.
pub(crate) fn current_runtime() -> Result<Handle> {
    Handle::try_current().map_err(|err| {
        OpsError::InternalError(format!("batch jobs need a Tokio runtime: {err}"))
    })
}

/// Drives one run of a job: a fixed pool of workers that claim pending items
/// in order and settle each outcome back into the store.
///
/// Pause and cancel are observed when a worker claims its next item. Work
/// already handed to the operation is never interrupted.
pub(crate) struct JobRunner {
    store: BatchJobStore,
    job_id: String,
    operation: Arc<dyn ItemOperation>,
    params: JobParams,
    permits: Arc<Semaphore>,
    workers: usize,
}

impl JobRunner {
    pub(crate) fn new(
        store: BatchJobStore,
        job_id: String,
        operation: Arc<dyn ItemOperation>,
        params: JobParams,
        permits: Arc<Semaphore>,
        workers: usize,
    ) -> Self {
        Self {
            store,
            job_id,
            operation,
            params,
            permits,
            workers: workers.max(1),
        }
    }

    pub(crate) fn spawn(self, runtime: &Handle) -> JoinHandle<()> {
        runtime.spawn(self.run())
    }

    async fn run(self) {
        if !self.store.start_run(&self.job_id) {
            debug!(job_id = %self.job_id, "batch job not runnable, runner exiting");
            return;
        }

        let runner = Arc::new(self);
        let mut workers = JoinSet::new();
        for worker in 0..runner.workers {
            let runner = Arc::clone(&runner);
            workers.spawn(async move { runner.work(worker).await });
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(err) = joined
                && err.is_panic()
            {
                error!(job_id = %runner.job_id, error = %err, "batch runner worker panicked");
                runner
                    .store
                    .fail_job(&runner.job_id, format!("batch runner worker failed: {err}"));
            }
        }

        runner.store.finish_run(&runner.job_id);
    }

    async fn work(&self, worker: usize) {
        loop {
            let Ok(permit) = Arc::clone(&self.permits).acquire_owned().await else {
                break;
            };
            let Some(item) = self.store.claim_next(&self.job_id) else {
                break;
            };

            let outcome = self.perform(&item).await;
            self.store.settle_item(&self.job_id, &item.id, outcome);
            drop(permit);
        }
        debug!(job_id = %self.job_id, worker, "batch worker idle");
    }

    async fn perform(&self, item: &BatchItem) -> Result<()> {
        AssertUnwindSafe(self.operation.perform(item, &self.params))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(OpsError::OperationFailed(format!(
                    "operation panicked: {}",
                    panic_message(panic.as_ref())
                )))
            })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
