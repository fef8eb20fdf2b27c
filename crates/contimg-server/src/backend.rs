use async_trait::async_trait;
use contimg_batch::{BatchItem, ItemOperation, JobParams, OperationType};
use contimg_common::error::{OpsError, Result};
use serde::Serialize;
use url::Url;

#[derive(Debug, Serialize)]
struct OperationRequest<'a> {
    id: &'a str,
    name: &'a str,
    params: &'a JobParams,
}

/// Runs one item operation by POSTing the item and its job's parameters to the
/// dashboard backend at `{base}/api/batch/{operation}`.
pub struct BackendOperation {
    endpoint: Url,
    client: reqwest::Client,
}

impl BackendOperation {
    pub fn new(client: reqwest::Client, base_url: &str, operation: OperationType) -> Result<Self> {
        Ok(Self {
            endpoint: operation_endpoint(base_url, operation)?,
            client,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ItemOperation for BackendOperation {
    async fn perform(&self, item: &BatchItem, params: &JobParams) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&OperationRequest {
                id: &item.id,
                name: &item.name,
                params,
            })
            .send()
            .await
            .map_err(|err| {
                OpsError::OperationFailed(format!(
                    "request to {} failed for item {}: {err}",
                    self.endpoint, item.id
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            let detail = detail.trim();
            return Err(OpsError::OperationFailed(if detail.is_empty() {
                format!("{} returned status {status}", self.endpoint)
            } else {
                format!("{} returned status {status}: {detail}", self.endpoint)
            }));
        }

        Ok(())
    }
}

fn operation_endpoint(base_url: &str, operation: OperationType) -> Result<Url> {
    let base = if base_url.starts_with("http://") || base_url.starts_with("https://") {
        base_url.to_string()
    } else {
        format!("http://{base_url}")
    };

    let mut url = Url::parse(&base)
        .map_err(|err| OpsError::InvalidArgument(format!("invalid backend url: {err}")))?;
    {
        let mut segments = url.path_segments_mut().map_err(|_| {
            OpsError::InvalidArgument("backend url cannot be a base url".to_string())
        })?;
        segments.pop_if_empty();
        segments.push("api");
        segments.push("batch");
        segments.push(operation.as_str());
    }
    Ok(url)
}
