//! Wind farm annual energy production (AEP) analytics.
//!
//! Loads a plant's SCADA, meter, and reanalysis data, estimates the AEP
//! distribution by Monte Carlo simulation, caches results per simulation
//! count, and serves them with a risk annotation over HTTP.

pub mod analysis;
#[cfg(feature = "api")]
pub mod api;
pub mod batch;
/// Result cache, population policies, and precomputed artifacts.
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod logging;
pub mod pipeline;
pub mod plant;
pub mod risk;
/// Estimator, runner, and distribution statistics.
pub mod sim;
