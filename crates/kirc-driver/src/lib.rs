//! kirc-driver - the `kirc` CLI: argument parsing, pipeline orchestration,
//! and process exit codes (spec.md §6.4). Grounded on `faxc-drv::lib.rs`'s
//! `Config`/`Session` split, shortened to this spec's three-mode surface.

pub mod config;
pub mod session;

use anyhow::Context;

pub use config::{Config, EmitKind};
pub use session::{compile_source, DriverError, DriverResult, Session};

/// Runs one compile, aggregating the phase-specific `thiserror` enums each
/// crate defines behind `anyhow` at this one boundary (matching
/// `faxc-drv`'s declared `anyhow` dependency), then maps the result to a
/// process exit code (spec.md §6.4: "0 on success, non-zero on any parse
/// or semantic error").
pub fn run(config: Config) -> i32 {
    let input = config.input.display().to_string();
    let session = Session::new(config);
    match session.compile().with_context(|| format!("compiling {input}")) {
        Ok(_) => 0,
        Err(err) => {
            eprintln!("kirc: {err:#}");
            1
        }
    }
}
