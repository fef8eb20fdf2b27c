mod backend;

use std::{sync::Arc, time::Duration};

use clap::Parser;
use contimg_admin::{AdminSys, router::admin_api_router};
use contimg_batch::{BatchConfig, BatchJobStore, OperationRegistry, OperationType};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::backend::BackendOperation;

#[derive(Parser)]
#[command(
    name = "contimg-ops",
    about = "Batch job orchestration for the observatory operations dashboard"
)]
struct Cli {
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    #[arg(long, default_value = "8010")]
    port: u16,

    /// Dashboard backend that performs item operations.
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    backend_url: String,

    /// Comma-separated operation types to enable; all when omitted.
    #[arg(long)]
    operations: Option<String>,

    /// Overrides CONTIMG_BATCH_CONCURRENCY.
    #[arg(long)]
    concurrency: Option<usize>,

    /// `complete` or `fail_job`; overrides CONTIMG_BATCH_FAILURE_POLICY.
    #[arg(long)]
    failure_policy: Option<String>,

    #[arg(long, default_value = "300")]
    request_timeout_secs: u64,

    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let env_filter = EnvFilter::from_default_env().add_directive("contimg=info".parse()?);
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let mut config = BatchConfig::from_env()?;
    if let Some(concurrency) = cli.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(policy) = cli.failure_policy.as_deref() {
        config.failure_policy = policy.parse()?;
    }

    let operations = match cli.operations.as_deref() {
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::parse::<OperationType>)
            .collect::<Result<Vec<_>, _>>()?,
        None => OperationType::ALL.to_vec(),
    };
    if operations.is_empty() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "--operations must name at least one operation type",
        )
        .into());
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cli.request_timeout_secs))
        .build()?;
    let mut registry = OperationRegistry::new();
    for operation in operations {
        let backend = BackendOperation::new(client.clone(), &cli.backend_url, operation)?;
        info!(operation = %operation, endpoint = %backend.endpoint(), "item operation registered");
        registry.register(operation, Arc::new(backend));
    }

    info!(
        concurrency = config.concurrency,
        failure_policy = ?config.failure_policy,
        "batch engine configured"
    );
    let store = BatchJobStore::new(config, registry)?;
    let app = admin_api_router(Arc::new(AdminSys::new(store)));

    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("contimg-ops listening on {addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
