use crate::{
    config::ServerConfig,
    data::{Store, StoreSession},
    error::TpsiResult,
};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct TpsiState {
    store: Arc<dyn Store>,
    server_config: Arc<ServerConfig>,
}

impl TpsiState {
    pub fn new(store: Arc<dyn Store>, server_config: Arc<ServerConfig>) -> Self {
        Self {
            store,
            server_config,
        }
    }

    pub async fn get_session(&self) -> TpsiResult<Box<dyn StoreSession>> {
        self.store.session().await
    }

    pub fn server_config(&self) -> &ServerConfig {
        &self.server_config
    }

    pub fn api_prefix(&self) -> &str {
        &self.server_config.api_prefix
    }

    pub async fn sensible_shutdown(&self) {
        self.store.close().await;
    }
}
