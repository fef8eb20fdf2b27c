use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{AdminSys, types::AdminInfo};

pub async fn server_info(State(admin): State<Arc<AdminSys>>) -> Json<AdminInfo> {
    let store = admin.store();
    Json(AdminInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: admin.uptime_seconds(),
        boot_time: admin.boot_time(),
        concurrency: store.config().concurrency,
        failure_policy: store.config().failure_policy,
        active_jobs: store.get_stats().active(),
        operations: store.registry().operation_types(),
    })
}
