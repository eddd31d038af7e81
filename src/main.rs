mod cli;

use transforge::{
    config::{self, Config},
    notifications::NotificationManager,
    pending::load_pending,
    runner::{InputFile, RunOptions, Runner},
    FfmpegProber,
};

use anyhow::Result;
use cli::{Invocation, Source};
use std::path::PathBuf;
use std::sync::Arc;

fn main() -> Result<()> {
    let invocation = Invocation::parse();
    let cli = &invocation.cli;

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "transforge=debug,transforge_av=debug".to_string()
        } else {
            "transforge=info,transforge_av=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config = config::load_config_or_default(cli.config.as_deref())?;

    let (inputs, queue_file) = collect_inputs(&invocation, &config)?;
    if inputs.is_empty() && queue_file.is_none() {
        tracing::info!("Nothing to do");
        return Ok(());
    }

    let options = RunOptions {
        dry_run: cli.dry_run,
        keep_source: cli.keep_source,
        sequential: cli.sequential,
    };

    let prober = Arc::new(FfmpegProber::new(&config.config.ffmpeg));
    let config = Arc::new(config);
    let runner = Runner::new(Arc::clone(&config), prober, options);

    let report = runner.run(inputs, queue_file.as_deref())?;
    println!("{}", report);

    if !options.dry_run {
        let notifications = NotificationManager::new(&config);
        if notifications.has_targets() {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(notifications.notify_run_completed());
        }
    }

    Ok(())
}

/// Turn command-line sources into input files, loading pending lists.
///
/// Returns the pending file to reconcile, if the run uses one.
fn collect_inputs(
    invocation: &Invocation,
    config: &Config,
) -> Result<(Vec<InputFile>, Option<PathBuf>)> {
    let mut inputs = Vec::new();
    let mut queue_file = None;

    for arg in &invocation.sources {
        match &arg.source {
            Source::File(path) => inputs.push(InputFile::new(path, arg.profile.clone())),
            Source::List(path) => {
                inputs.extend(
                    load_pending(path)?
                        .into_iter()
                        .map(|entry| InputFile::new(entry, arg.profile.clone())),
                );
                queue_file = Some(path.clone());
            }
        }
    }

    if invocation.sources.is_empty() {
        if let Some(path) = &config.config.default_queue_file {
            tracing::info!("Processing default queue file {}", path.display());
            inputs.extend(
                load_pending(path)?
                    .into_iter()
                    .map(|entry| InputFile::new(entry, invocation.last_profile.clone())),
            );
            queue_file = Some(path.clone());
        }
    }

    Ok((inputs, queue_file))
}
