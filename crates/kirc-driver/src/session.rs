//! Pipeline orchestration (spec.md §2's data-flow line, §6.4): read source
//! → lex+parse (`kirc_front`) → lower to KIR (`kirc_kir`, which owns its own
//! scoped symbol table internally) → print KIR text or generate RISC-V
//! (`kirc_codegen`) → write output. Grounded on `faxc-drv::Session::compile`/
//! `run_pipeline`'s phase-by-phase shape, shortened to this spec's pipeline.

use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::{Config, EmitKind};

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(#[from] kirc_front::ParseError),

    #[error("semantic error: {0}")]
    Lower(#[from] kirc_kir::LowerError),

    #[error("codegen error: {0}")]
    Codegen(#[from] kirc_codegen::CodegenError),

    #[error("{0}")]
    InvalidArgs(String),
}

pub type DriverResult<T> = Result<T, DriverError>;

/// One compiler invocation: owns the [`Config`] and runs every phase.
pub struct Session {
    config: Config,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Runs the full pipeline and writes the result to the configured
    /// output (or stdout). Returns the emitted text as well, so tests can
    /// assert on it without round-tripping through the filesystem.
    pub fn compile(&self) -> DriverResult<String> {
        let emit = self
            .config
            .emit_kind()
            .map_err(DriverError::InvalidArgs)?;

        let path = &self.config.input;
        debug!(path = %path.display(), "reading source");
        let source = fs::read_to_string(path).map_err(|source| DriverError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let text = compile_source(&source, emit)?;

        match &self.config.output {
            Some(out) => {
                debug!(path = %out.display(), "writing output");
                fs::write(out, &text).map_err(|source| DriverError::Write {
                    path: out.display().to_string(),
                    source,
                })?;
            }
            None => print!("{text}"),
        }

        Ok(text)
    }
}

/// The pipeline proper, factored out of [`Session::compile`] so tests (and
/// `-perf`'s identical path) can drive it directly from an in-memory string.
pub fn compile_source(source: &str, emit: EmitKind) -> DriverResult<String> {
    info!("lexing and parsing");
    let comp_unit = kirc_front::parse(source)?;

    info!("lowering to KIR");
    let program = kirc_kir::lower(&comp_unit)?;

    match emit {
        EmitKind::Kir => {
            info!("emitting KIR text");
            Ok(program.to_string())
        }
        EmitKind::Riscv => {
            info!("generating RISC-V assembly");
            let asm = kirc_codegen::generate(&program)?;
            Ok(asm)
        }
    }
}

/// Convenience used by integration tests and `main.rs`'s error path: turns
/// a file extension stem into a sensible default output path when `-o` was
/// omitted and the caller still wants a file on disk.
pub fn default_output_path(input: &Path, emit: EmitKind) -> std::path::PathBuf {
    let stem = input.file_stem().unwrap_or_default();
    let ext = match emit {
        EmitKind::Kir => "koopa",
        EmitKind::Riscv => "s",
    };
    input.with_file_name(format!("{}.{}", stem.to_string_lossy(), ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_minimal_program_to_kir() {
        let text = compile_source("int main() { return 0; }", EmitKind::Kir).unwrap();
        assert!(text.contains("fun @main"));
        assert!(text.contains("ret 0"));
    }

    #[test]
    fn compiles_minimal_program_to_riscv() {
        let text = compile_source("int main() { return 0; }", EmitKind::Riscv).unwrap();
        assert!(text.contains(".text"));
        assert!(text.contains("main:"));
        assert!(text.contains("ret"));
    }

    #[test]
    fn parse_errors_propagate() {
        let err = compile_source("int main( { return 0; }", EmitKind::Kir).unwrap_err();
        assert!(matches!(err, DriverError::Parse(_)));
    }

    #[test]
    fn sema_errors_propagate() {
        let err = compile_source("int main() { return x; }", EmitKind::Kir).unwrap_err();
        assert!(matches!(err, DriverError::Lower(_)));
    }

    #[test]
    fn default_output_path_picks_extension() {
        let p = default_output_path(Path::new("prog.c"), EmitKind::Kir);
        assert_eq!(p, Path::new("prog.koopa"));
        let p = default_output_path(Path::new("prog.c"), EmitKind::Riscv);
        assert_eq!(p, Path::new("prog.s"));
    }
}
