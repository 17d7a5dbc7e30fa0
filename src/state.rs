use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{SeaOrmUserService, UserService};
use crate::storage::PublicDisk;

/// Long-lived handles built once at startup and shared by every request.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub disk: PublicDisk,

    pub user_service: Arc<dyn UserService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await?;

        Ok(Self::with_store(config, store))
    }

    /// Wires services around an already connected store.
    #[must_use]
    pub fn with_store(config: Config, store: Store) -> Self {
        let disk = PublicDisk::from_config(&config.storage);

        let user_service = Arc::new(SeaOrmUserService::new(store.clone(), disk.clone(), &config))
            as Arc<dyn UserService>;

        Self {
            config: Arc::new(config),
            store,
            disk,
            user_service,
        }
    }
}
