use std::sync::Arc;

use gigsync_workflow::{BulkCoordinator, WorkflowEngine};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<WorkflowEngine>,
    pub bulk: Arc<BulkCoordinator>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(engine: Arc<WorkflowEngine>, config: ServerConfig) -> Self {
        Self {
            bulk: Arc::new(BulkCoordinator::new(Arc::clone(&engine))),
            engine,
            config: Arc::new(config),
        }
    }
}
