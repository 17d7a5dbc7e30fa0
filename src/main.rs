use backoffice::{Config, cli::Cli, load_config, run};
use clap::Parser;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Runtime sizing needs the config before the runtime exists; `run`
    // parses and loads it again inside.
    let cli = Cli::parse();
    let worker_threads = load_config(&cli)
        .map(|c| c.general.worker_threads)
        .unwrap_or_else(|_| Config::default().general.worker_threads);

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();

    if worker_threads > 0 {
        builder.worker_threads(worker_threads);
    }

    let runtime = builder.build()?;
    runtime.block_on(run())
}
