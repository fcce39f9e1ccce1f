mod cli;

use transcode_watch::{
    config,
    watch::{DispatchOptions, Dispatcher},
    worker::WorkerCommand,
};

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use tokio_util::sync::CancellationToken;

async fn start_dispatcher(cli: Cli, config: config::Config) -> Result<()> {
    let worker = WorkerCommand::resolve(&config.worker, cli.config.as_deref())?;
    tracing::info!("Using worker {:?}", worker.program());

    for dir in [&cli.in_dir, &cli.out_dir] {
        if !dir.is_dir() {
            tracing::warn!("Directory does not exist yet: {:?}", dir);
        }
    }

    let dispatcher = Dispatcher::new(
        &cli.in_dir,
        &cli.work_dir,
        &cli.out_dir,
        worker,
        DispatchOptions::from(&config.dispatch),
    );

    if !dispatcher.prepare_staging() {
        anyhow::bail!(
            "Staging directories could not be created under {:?}",
            cli.work_dir
        );
    }

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, shutting down...");
            ctrl_c.cancel();
        }
    });

    dispatcher.run(cancel).await;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "transcode_watch=trace".to_string()
        } else {
            "transcode_watch=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    let mut config = config::load_config_or_default(cli.config.as_deref())?;
    cli.apply(&mut config);
    config::validate_config(&config)?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(start_dispatcher(cli, config))
}
