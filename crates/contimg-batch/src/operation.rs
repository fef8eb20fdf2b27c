use std::{collections::HashMap, future::Future, sync::Arc};

use async_trait::async_trait;
use contimg_common::error::{OpsError, Result};
use futures::future::BoxFuture;

use crate::{
    job::{BatchItem, JobParams},
    types::OperationType,
};

/// Performs one operation on one item. `params` are the owning job's
/// parameters. Errors are recorded on the item and never abort the rest of the
/// job.
#[async_trait]
pub trait ItemOperation: Send + Sync {
    async fn perform(&self, item: &BatchItem, params: &JobParams) -> Result<()>;
}

/// Adapts an async closure into an [`ItemOperation`].
pub struct FnOperation<F> {
    func: F,
}

impl<F> FnOperation<F>
where
    F: Fn(BatchItem, JobParams) -> BoxFuture<'static, Result<()>> + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F> ItemOperation for FnOperation<F>
where
    F: Fn(BatchItem, JobParams) -> BoxFuture<'static, Result<()>> + Send + Sync,
{
    async fn perform(&self, item: &BatchItem, params: &JobParams) -> Result<()> {
        (self.func)(item.clone(), params.clone()).await
    }
}

pub fn operation_fn<F, Fut>(func: F) -> Arc<dyn ItemOperation>
where
    F: Fn(BatchItem, JobParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(FnOperation::new(
        move |item: BatchItem, params: JobParams| -> BoxFuture<'static, Result<()>> {
            Box::pin(func(item, params))
        },
    ))
}

#[derive(Clone, Default)]
pub struct OperationRegistry {
    operations: HashMap<OperationType, Arc<dyn ItemOperation>>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, operation_type: OperationType, operation: Arc<dyn ItemOperation>) {
        self.operations.insert(operation_type, operation);
    }

    pub fn with(
        mut self,
        operation_type: OperationType,
        operation: Arc<dyn ItemOperation>,
    ) -> Self {
        self.register(operation_type, operation);
        self
    }

    pub fn get(&self, operation_type: OperationType) -> Result<Arc<dyn ItemOperation>> {
        self.operations
            .get(&operation_type)
            .cloned()
            .ok_or_else(|| OpsError::OperationNotRegistered(operation_type.to_string()))
    }

    pub fn contains(&self, operation_type: OperationType) -> bool {
        self.operations.contains_key(&operation_type)
    }

    pub fn operation_types(&self) -> Vec<OperationType> {
        let mut types: Vec<OperationType> = self.operations.keys().copied().collect();
        types.sort_by_key(|operation| operation.as_str());
        types
    }
}
