mod app;
mod config;
mod data;
mod error;
mod format;
mod monitor;
mod trigger;

use crate::config::SamplerConfig;
use crate::error::SamplerError;
use env_logger::Env;
use std::process::ExitCode;

fn main() -> ExitCode {
    // stdout carries samples only, diagnostics go to stderr
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = match SamplerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            log::error!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    let nvml = match monitor::init() {
        Ok(nvml) => nvml,
        Err(err) => {
            log::error!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    // from here on NVML is shut down on every way out
    let outcome = app::run(&nvml, config);
    finish(outcome, || monitor::release(nvml))
}

/// Runs `release` exactly once, then maps the loop outcome and the release
/// result to the process exit code.
fn finish(
    outcome: Result<(), SamplerError>,
    release: impl FnOnce() -> Result<(), SamplerError>,
) -> ExitCode {
    let released = release();

    let mut code = ExitCode::SUCCESS;
    if let Err(err) = outcome {
        log::error!("Aborting: {}", err);
        code = ExitCode::FAILURE;
    }
    if let Err(err) = released {
        log::error!("{}", err);
        code = ExitCode::FAILURE;
    }
    code
}
