//! windfarm-aep entry point: CLI wiring and config-driven service construction.

use std::fmt::Display;
use std::path::Path;
use std::process;

use clap::Parser;
use tracing::info;

use windfarm_aep::analysis::BasicAnalysis;
use windfarm_aep::batch::{DEFAULT_SIZES, precompute_all};
use windfarm_aep::cache::ArtifactStore;
use windfarm_aep::cli::{Cli, Command};
use windfarm_aep::config::ServiceConfig;
use windfarm_aep::io::export::export_distribution;
use windfarm_aep::logging;
use windfarm_aep::pipeline::PlantSimulator;
use windfarm_aep::risk;

fn fail(context: &str, err: impl Display) -> ! {
    eprintln!("error: {context}: {err}");
    process::exit(1);
}

fn main() {
    let cli = Cli::parse();

    let cfg = cli
        .service_config()
        .unwrap_or_else(|e| fail("invalid configuration", e));
    let errors = cfg.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    logging::init(&cfg.logging);
    info!(policy = %cfg.cache.policy, "configuration loaded");

    match cli.command {
        Command::Serve { .. } => serve(&cfg),
        Command::Precompute { sizes, .. } => {
            let sizes = if sizes.is_empty() {
                DEFAULT_SIZES.to_vec()
            } else {
                sizes
            };
            let simulator = PlantSimulator::from_config(&cfg).reuse_dataset(true);
            let store = ArtifactStore::new(&cfg.cache.artifact_dir);
            let written = precompute_all(&simulator, &store, &sizes)
                .unwrap_or_else(|e| fail("precompute failed", e));
            for path in written {
                println!("{}", path.display());
            }
        }
        Command::Simulate {
            num_sim,
            distribution_out,
        } => {
            let simulator = PlantSimulator::from_config(&cfg);
            let result = simulator
                .simulate(num_sim)
                .unwrap_or_else(|e| fail("simulation failed", e));
            let risk = risk::classify(result.p50_gwh, result.p90_gwh);

            println!("simulations  {}", result.num_simulations);
            println!("mean AEP     {:.3} GWh", result.mean_aep_gwh);
            println!("P50          {:.3} GWh", result.p50_gwh);
            println!("P90          {:.3} GWh", result.p90_gwh);
            println!("std dev      {:.3} GWh", result.std_dev);
            println!("risk         {} (spread {:.2} GWh)", risk.level, risk.spread);

            if let Some(ref path) = distribution_out {
                export_distribution(&result, Path::new(path))
                    .unwrap_or_else(|e| fail("failed to write distribution CSV", e));
                eprintln!("Distribution written to {}", path.display());
            }
        }
        Command::Analyze => {
            let simulator = PlantSimulator::from_config(&cfg);
            let records = simulator
                .loader()
                .load_scada()
                .unwrap_or_else(|e| fail("cannot load SCADA", e));
            let summary = BasicAnalysis::from_records(&records);
            let json = serde_json::to_string_pretty(&summary)
                .unwrap_or_else(|e| fail("cannot encode summary", e));
            println!("{json}");
        }
    }
}

#[cfg(feature = "api")]
fn serve(cfg: &ServiceConfig) {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use windfarm_aep::api::{self, AppState};
    use windfarm_aep::cache::ResultCache;

    let addr: SocketAddr = cfg
        .server
        .bind
        .parse()
        .unwrap_or_else(|e| fail("invalid bind address", e));
    let simulator = PlantSimulator::from_config(cfg);
    let loader = simulator.loader().clone();
    let cache = ResultCache::from_config(&cfg.cache, Arc::new(simulator))
        .unwrap_or_else(|e| fail("invalid cache configuration", e));
    let state = Arc::new(AppState {
        cache,
        loader,
        cors_origins: cfg.server.cors_origins.clone(),
    });

    let rt = tokio::runtime::Runtime::new()
        .unwrap_or_else(|e| fail("failed to create tokio runtime", e));
    rt.block_on(async move {
        if let Err(e) = state.cache.warm().await {
            tracing::error!(error = %e, "cache warm-up failed, serving anyway");
        }
        if let Err(e) = api::serve(state, addr).await {
            fail("server error", e);
        }
    });
}

#[cfg(not(feature = "api"))]
fn serve(_cfg: &ServiceConfig) {
    fail("serve", "built without the `api` feature");
}
