use contimg_common::error::{OpsError, Result};

use crate::types::ItemFailurePolicy;

pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_EVENT_CAPACITY: usize = 1_024;

pub const ENV_CONCURRENCY: &str = "CONTIMG_BATCH_CONCURRENCY";
pub const ENV_FAILURE_POLICY: &str = "CONTIMG_BATCH_FAILURE_POLICY";
pub const ENV_EVENT_CAPACITY: &str = "CONTIMG_BATCH_EVENT_CAPACITY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    /// Upper bound on items of one job in flight at once.
    pub concurrency: usize,
    pub failure_policy: ItemFailurePolicy,
    pub event_capacity: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            failure_policy: ItemFailurePolicy::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl BatchConfig {
    /// Defaults overridden by any `CONTIMG_BATCH_*` variables that are set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(value) = non_empty(lookup(ENV_CONCURRENCY)) {
            config.concurrency = value.parse().map_err(|_| {
                OpsError::InvalidArgument(format!("{ENV_CONCURRENCY} must be a positive integer"))
            })?;
        }
        if let Some(value) = non_empty(lookup(ENV_FAILURE_POLICY)) {
            config.failure_policy = value.parse()?;
        }
        if let Some(value) = non_empty(lookup(ENV_EVENT_CAPACITY)) {
            config.event_capacity = value.parse().map_err(|_| {
                OpsError::InvalidArgument(format!(
                    "{ENV_EVENT_CAPACITY} must be a positive integer"
                ))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(OpsError::InvalidArgument(
                "batch concurrency must be at least 1".to_string(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(OpsError::InvalidArgument(
                "batch event capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
