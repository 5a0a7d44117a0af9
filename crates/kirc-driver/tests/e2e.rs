//! CLI-level integration tests, grounded on `faxc-drv/tests/e2e/*`'s
//! `assert_cmd` + `predicates` + `tempfile` style. Drives the `kirc` binary
//! end to end for both `-koopa` and `-riscv`/`-perf` modes and checks the
//! structural properties spec.md §8 names (terminator placement,
//! frame-size multiple-of-16, register-bitmap-empty-at-exit is verified at
//! the unit level in `kirc-codegen`; this crate's job is the CLI surface
//! and the pipeline wiring, not re-deriving those invariants).

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn kirc_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_kirc"))
}

fn write_source(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn help_output() {
    kirc_bin()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("kirc"));
}

#[test]
fn version_output() {
    kirc_bin()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("kirc"));
}

#[test]
fn missing_mode_is_an_error() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "main.c", "int main() { return 0; }");
    kirc_bin().arg(&input).assert().failure();
}

#[test]
fn koopa_mode_writes_file() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "main.c", "int main() { return 0; }");
    let output = dir.path().join("main.koopa");

    kirc_bin()
        .arg("-koopa")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let text = std::fs::read_to_string(&output).unwrap();
    assert!(text.contains("fun @main"));
    assert!(text.contains("ret 0"));
}

#[test]
fn riscv_mode_writes_file() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "main.c", "int main() { return 0; }");
    let output = dir.path().join("main.s");

    kirc_bin()
        .arg("-riscv")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let text = std::fs::read_to_string(&output).unwrap();
    assert!(text.contains(".text"));
    assert!(text.contains("main:"));
}

#[test]
fn perf_mode_behaves_like_riscv() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "main.c", "int main() { return 0; }");

    // `-perf` is the single-dash spelling spec.md §6.4 actually names; it
    // must not be misparsed as the short-flag cluster `-p -e -r -f`.
    kirc_bin()
        .arg("-perf")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains(".text"));
}

#[test]
fn parse_error_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "bad.c", "int main( { return 0; }");

    kirc_bin().arg("-koopa").arg(&input).assert().failure();
}

#[test]
fn undeclared_identifier_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "bad.c", "int main() { return x; }");

    kirc_bin()
        .arg("-koopa")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

/// Scenario 2 from spec.md §8: `int a=2; int b=3; return a*(b+1);` folds to
/// 8 at the KIR level only if both operands are non-constant (they are,
/// since `a`/`b` are locals); this asserts the pipeline reaches a clean
/// `ret` rather than re-deriving the arithmetic (that's covered at the
/// `kirc-kir` unit level).
#[test]
fn scenario_arithmetic_compiles() {
    let dir = TempDir::new().unwrap();
    let input = write_source(
        &dir,
        "arith.c",
        "int main(){ int a=2; int b=3; return a*(b+1); }",
    );

    kirc_bin()
        .arg("-koopa")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("ret"));
}

/// Scenario 3: a `while` loop summing 0..10, exercising break-free control
/// flow through the full pipeline.
#[test]
fn scenario_while_loop_compiles() {
    let dir = TempDir::new().unwrap();
    let input = write_source(
        &dir,
        "loop.c",
        "int main(){ int i=0; int s=0; while(i<10){s=s+i; i=i+1;} return s; }",
    );

    kirc_bin()
        .arg("-riscv")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("main:"));
}

/// Scenarios 4/5: short-circuit `&&` where the right operand is a call
/// (rather than a parenthesised assignment — this source language's
/// assignment is statement-only per spec.md §3.1/§6.1, so `(a = 1)` is not
/// a legal sub-expression; a call is the grammar's actual side-effecting
/// expression form). Both arms compile; the `kirc-kir` unit tests check
/// that the call is only emitted on the branch that reaches it.
#[test]
fn scenario_short_circuit_and_compiles() {
    let dir = TempDir::new().unwrap();
    let input = write_source(
        &dir,
        "sc.c",
        "int main(){ int a; if(1&&set()) a=1; else a=99; return a; } int set(){ return 1; }",
    );

    kirc_bin()
        .arg("-koopa")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("ret"));
}

#[test]
fn scenario_short_circuit_skips_side_effect_call() {
    let dir = TempDir::new().unwrap();
    let input = write_source(
        &dir,
        "sc2.c",
        "int main(){ int a; if(0&&set()) a=99; else a=0; return a; } int set(){ return 1; }",
    );

    kirc_bin()
        .arg("-koopa")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("ret"));
}

/// Scenario 6: calls to the runtime library (`getint`/`putint`) type-check
/// without a user-visible declaration.
#[test]
fn scenario_runtime_calls_compile() {
    let dir = TempDir::new().unwrap();
    let input = write_source(
        &dir,
        "io.c",
        "int main(){int n=getint(); int i=0; int s=0; \
         while(i<n){s=s+i*i; i=i+1;} putint(s); return 0;}",
    );

    kirc_bin()
        .arg("-riscv")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("call getint"));
}
