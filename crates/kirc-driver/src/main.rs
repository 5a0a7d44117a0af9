//! Thin binary entry point: parse arguments, install tracing, hand off to
//! the library, convert the result to a process exit code. Grounded on
//! `faxc-drv/src/main.rs`'s shape plus `faxt/src/main.rs`'s
//! `tracing_subscriber` setup (same pack, same project's sibling tool).

use kirc_driver::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    let config = Config::parse_args(std::env::args_os());
    init_logging(config.verbose);
    std::process::exit(kirc_driver::run(config));
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { "warn" })
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init();
}
