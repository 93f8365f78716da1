//! huntforge: sweep the treasure hunt map and collect every hint.
//!
//! Exit codes: 0 after a completed or cleanly interrupted run, 1 on fatal
//! configuration or page-structure failures.

use clap::Parser;
use huntforge_atlas::{snapshot, Atlas};
use huntforge_core::{Backend, Config, HuntArgs, RunReport, Session};
use huntforge_driver::{HuntBrowser, SimBrowser, SimWorld};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = HuntArgs::try_parse().unwrap_or_else(|error| {
        let fatal = error.use_stderr();
        let _ = error.print();
        std::process::exit(if fatal { 1 } else { 0 });
    });
    init_tracing(&args.log_level);

    match run(args).await {
        Ok(report) => {
            tracing::info!(
                positions = report.positions,
                names = report.names,
                excluded = report.excluded,
                saved = report.saved,
                outcome = ?report.outcome,
                "run finished"
            );
        }
        Err(error) => {
            tracing::error!("{error:#}");
            std::process::exit(1);
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run(args: HuntArgs) -> anyhow::Result<RunReport> {
    let config = Config::from_args(args)?;

    let atlas = if snapshot::exists(&config.input_save_path) {
        snapshot::load(&config.input_save_path)?
    } else {
        tracing::info!("no previous save found, starting fresh");
        Atlas::new()
    };

    let browser: Box<dyn HuntBrowser> = match config.backend {
        Backend::Sim => Box::new(SimBrowser::connect(&config.launch, SimWorld::new())),
    };

    tracing::info!(
        instances = config.instances,
        manual = config.manual,
        bounds = %config.bounds,
        "starting hunt"
    );
    Ok(Session::new(config).run(browser, atlas).await?)
}
