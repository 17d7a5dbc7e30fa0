//! Seed command handler

use crate::config::Config;
use crate::db::Store;

pub async fn cmd_seed(config: &Config) -> anyhow::Result<()> {
    let store = Store::with_pool_options(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;

    let report = store.seed_settings().await?;

    println!(
        "✓ Seeded {} settings with {} items",
        report.settings, report.items
    );

    Ok(())
}
