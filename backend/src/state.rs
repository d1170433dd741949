use std::sync::Arc;

use crate::{
    config::Config,
    repositories::Store,
    services::{ApprovalPolicy, ApprovalService},
    utils::time::Clock,
};

pub struct AppState<S: Store> {
    pub service: Arc<ApprovalService<S>>,
    pub config: Arc<Config>,
}

impl<S: Store> AppState<S> {
    pub fn new(store: S, config: Config, clock: Arc<dyn Clock>) -> Self {
        let policy = ApprovalPolicy::from(&config);
        Self {
            service: Arc::new(ApprovalService::new(store, policy, clock)),
            config: Arc::new(config),
        }
    }
}

impl<S: Store> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            config: Arc::clone(&self.config),
        }
    }
}
