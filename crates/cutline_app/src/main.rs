// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cutline - headless timeline compositor
//!
//! Loads a project file, renders single frames or exports the whole
//! timeline as a PNG sequence. Set `RUST_LOG` to change log verbosity.

use cutline_app::cli::{self, CliError, USAGE};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "warn,cutline=info,cutline_app=info,cutline_render=info,cutline_timeline=info";

fn main() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let parsed = match cli::parse_args(pico_args::Arguments::from_env()) {
        Ok(parsed) => parsed,
        Err(e @ (CliError::Args(_) | CliError::Usage(_))) => {
            eprintln!("{e}\n\n{USAGE}");
            std::process::exit(2);
        }
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(1);
        }
    };

    tracing::debug!("Cutline v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = cli::run(parsed) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
