//! End-to-end lowering tests driving the six concrete scenarios and the
//! scoping/control-flow properties of spec.md §8, from source text down to
//! the `kir::Program` this crate produces (no codegen, no text round-trip —
//! component F stays an external contract, see `src/lib.rs`).

use kirc_kir::{lower, BasicBlock, Function, Program, ValueKind};
use std::collections::HashSet;

fn lower_src(src: &str) -> Program {
    let unit = kirc_front::parse(src).expect("parses");
    lower(&unit).expect("lowers")
}

fn main_fn(prog: &Program) -> &Function {
    prog.functions
        .iter()
        .find(|f| f.name.as_str() == "@main")
        .expect("has @main")
}

/// Every basic block ends in exactly one terminator, and no instruction
/// follows it (spec.md §3.4, §8 "Control flow").
fn assert_single_terminator_per_block(func: &Function) {
    for block in func.blocks.iter() {
        let terminator_positions: Vec<usize> = block
            .instrs
            .iter()
            .enumerate()
            .filter(|(_, id)| func.values[**id].kind.is_terminator())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(
            terminator_positions.len(),
            1,
            "block {} has {} terminators",
            block.name,
            terminator_positions.len()
        );
        assert_eq!(
            *terminator_positions.last().unwrap(),
            block.instrs.len() - 1,
            "block {} has instructions after its terminator",
            block.name
        );
    }
}

/// Every `br`/`jump` target names a block defined in the same function.
fn assert_branch_targets_resolve(func: &Function) {
    let valid: HashSet<_> = func.blocks.indices().collect();
    for block in func.blocks.iter() {
        for id in &block.instrs {
            match &func.values[*id].kind {
                ValueKind::Jump { target } => assert!(valid.contains(target)),
                ValueKind::Branch {
                    then_bb, else_bb, ..
                } => {
                    assert!(valid.contains(then_bb));
                    assert!(valid.contains(else_bb));
                }
                _ => {}
            }
        }
    }
}

fn assert_entry_is_first(func: &Function) {
    assert_eq!(func.entry, func.blocks.indices().next().unwrap());
}

fn collect_names(block: &BasicBlock, func: &Function) -> Vec<String> {
    block
        .instrs
        .iter()
        .filter_map(|id| func.values[*id].name.map(|n| n.to_string()))
        .collect()
}

#[test]
fn scenario_1_return_zero() {
    let prog = lower_src("int main(){ return 0; }");
    let f = main_fn(&prog);
    assert_single_terminator_per_block(f);
    assert_entry_is_first(f);
    assert_eq!(prog.to_string(), "fun @main(): i32 {\n%entry:\n  ret 0\n}\n");
}

#[test]
fn scenario_2_arithmetic() {
    let prog = lower_src("int main(){ int a=2; int b=3; return a*(b+1); }");
    let f = main_fn(&prog);
    assert_single_terminator_per_block(f);
    let text = prog.to_string();
    assert!(text.contains("mul"));
    assert!(text.contains("add"));
    assert!(text.contains("ret"));
}

#[test]
fn scenario_3_while_sum() {
    let prog = lower_src(
        "int main(){ int i=0; int s=0; while(i<10){s=s+i; i=i+1;} return s; }",
    );
    let f = main_fn(&prog);
    assert_single_terminator_per_block(f);
    assert_branch_targets_resolve(f);
    // entry -> while_entry -> (while_body | end); while_body loops back.
    assert!(f.blocks.iter().any(|b| b.name.as_str().contains("while_entry")));
    assert!(f.blocks.iter().any(|b| b.name.as_str().contains("while_body")));
}

#[test]
fn scenario_4_and_short_circuit_runs_rhs_when_left_is_truthy() {
    // The side effect is a call (this language's assignment is statement-
    // only, §3.1) — the property under test is identical to spec.md
    // scenario 4: the right operand of `&&` is lowered when the left side
    // does not already decide the result.
    let prog = lower_src(
        "int main(){ int a; if(1&&set()) a=1; else a=99; return a; } int set(){ return 1; }",
    );
    let f = main_fn(&prog);
    assert_single_terminator_per_block(f);
    let text = prog.to_string();
    assert!(text.contains("call @set"));
}

#[test]
fn scenario_5_and_short_circuit_skips_rhs_when_left_is_falsy() {
    let prog = lower_src(
        "int main(){ int a; if(0&&set()) a=99; else a=0; return a; } int set(){ return 1; }",
    );
    let f = main_fn(&prog);
    assert_single_terminator_per_block(f);
    let text = prog.to_string();
    assert!(
        !text.contains("call @set"),
        "constant-false && must not lower its right operand"
    );
}

#[test]
fn or_short_circuits_to_constant_one_when_lhs_folds_truthy() {
    let prog = lower_src(
        "int main(){ int a; if(1||set()) a=1; else a=99; return a; } int set(){ return 1; }",
    );
    let text = prog.to_string();
    assert!(
        !text.contains("call @set"),
        "constant-truthy || must not lower its right operand"
    );
}

#[test]
fn or_evaluates_rhs_when_lhs_folds_falsy() {
    let prog = lower_src(
        "int main(){ int a; if(0||set()) a=1; else a=99; return a; } int set(){ return 1; }",
    );
    let text = prog.to_string();
    assert!(
        text.contains("call @set"),
        "constant-falsy || must still lower its right operand"
    );
}

/// Regression test for the swapped-branch `||` bug: with a non-constant
/// (call-based) left operand, the right operand must be lowered on the
/// `lhs == 0` side of the branch, and the constant `1` stored on the
/// `lhs != 0` side — the opposite wiring of `&&`.
#[test]
fn or_short_circuit_evaluates_rhs_only_on_the_lhs_zero_branch() {
    use kirc_kir::Operand;

    let prog = lower_src(
        "int main(){ int x; if(a()||b()) x=1; else x=0; return x; } \
         int a(){ return 0; } int b(){ return 1; }",
    );
    let f = main_fn(&prog);
    assert_single_terminator_per_block(f);

    // The `||`'s own skeleton is the first then/else pair allocated in this
    // function (label 0): lowering the `if`'s condition — which lowers the
    // `||` — runs before the `if` statement allocates its own labels.
    let then0 = f
        .blocks
        .iter()
        .find(|b| b.name.as_str() == "%then_0")
        .expect("then_0 exists");
    let else0 = f
        .blocks
        .iter()
        .find(|b| b.name.as_str() == "%else_0")
        .expect("else_0 exists");

    let calls = |block: &BasicBlock, callee: &str| {
        block.instrs.iter().any(|id| {
            matches!(&f.values[*id].kind, ValueKind::Call { callee: c, .. } if c.as_str() == callee)
        })
    };
    let stores_const_one = |block: &BasicBlock| {
        block.instrs.iter().any(|id| {
            matches!(&f.values[*id].kind, ValueKind::Store { value: Operand::Const(1), .. })
        })
    };

    assert!(
        !calls(then0, "@b"),
        "`||`'s then branch (lhs != 0) must not evaluate the rhs"
    );
    assert!(
        calls(else0, "@b"),
        "`||`'s else branch (lhs == 0) must evaluate the rhs"
    );
    assert!(
        stores_const_one(then0),
        "`||`'s then branch (lhs != 0) must store the deciding constant 1"
    );
}

#[test]
fn scenario_6_runtime_io_calls_type_check() {
    let prog = lower_src(
        "int main(){int n=getint(); int i=0; int s=0; \
         while(i<n){s=s+i*i; i=i+1;} putint(s); return 0;}",
    );
    let text = prog.to_string();
    assert!(text.contains("call @getint"));
    assert!(text.contains("call @putint"));
    // Runtime primitives are declared, not defined.
    assert!(text.contains("decl @getint"));
    assert!(text.contains("decl @putint"));
}

#[test]
fn shadowed_locals_get_unique_kir_names() {
    let prog = lower_src(
        "int main(){ int x=1; { int x=2; x=x+1; } x=x+1; return x; }",
    );
    let f = main_fn(&prog);
    let mut allocs = Vec::new();
    for block in f.blocks.iter() {
        for id in &block.instrs {
            if matches!(f.values[*id].kind, ValueKind::Alloc) {
                allocs.push(f.values[*id].name.unwrap().to_string());
            }
        }
    }
    let unique: HashSet<_> = allocs.iter().collect();
    assert_eq!(allocs.len(), unique.len(), "alloc names must be unique: {allocs:?}");
    assert_eq!(allocs.len(), 2, "expected one alloc per shadowed `x`");
}

#[test]
fn missing_terminal_return_in_int_function_gets_synthesised_ret_zero() {
    let prog = lower_src("int main(){ int a=1; }");
    let f = main_fn(&prog);
    let last_block = f.blocks.iter().last().unwrap();
    let last_id = *last_block.instrs.last().unwrap();
    match &f.values[last_id].kind {
        ValueKind::Return { value: Some(_) } => {}
        other => panic!("expected synthesised `ret 0`, found {other:?}"),
    }
}

#[test]
fn void_function_without_return_gets_bare_ret() {
    let unit = kirc_front::parse("void f(){ int a=1; } int main(){ f(); return 0; }").unwrap();
    let prog = lower(&unit).unwrap();
    let f = prog.functions.iter().find(|f| f.name.as_str() == "@f").unwrap();
    let last_block = f.blocks.iter().last().unwrap();
    let last_id = *last_block.instrs.last().unwrap();
    match &f.values[last_id].kind {
        ValueKind::Return { value: None } => {}
        other => panic!("expected bare `ret`, found {other:?}"),
    }
}

#[test]
fn every_block_has_exactly_one_terminator_across_all_functions() {
    let prog = lower_src(
        "int helper(int x) { if (x > 0) { return x; } else { return -x; } } \
         int main(){ return helper(3) + helper(-4); }",
    );
    for func in prog.functions.iter() {
        assert_single_terminator_per_block(func);
        assert_branch_targets_resolve(func);
        assert_entry_is_first(func);
    }
}

#[test]
fn global_vars_fold_initialisers_at_compile_time() {
    let prog = lower_src("int g = 2 + 3 * 4; int main(){ return g; }");
    let text = prog.to_string();
    assert!(text.contains("global @g = alloc i32, 14"));
}

#[test]
fn const_redefinition_in_same_scope_is_rejected() {
    let unit = kirc_front::parse("int main(){ const int a = 1; const int a = 2; return a; }").unwrap();
    assert!(lower(&unit).is_err());
}

#[test]
fn assigning_to_a_const_is_rejected() {
    let unit = kirc_front::parse("int main(){ const int a = 1; a = 2; return a; }").unwrap();
    assert!(lower(&unit).is_err());
}

#[test]
fn break_outside_loop_is_rejected() {
    let unit = kirc_front::parse("int main(){ break; return 0; }").unwrap();
    assert!(lower(&unit).is_err());
}

#[test]
fn continue_outside_loop_is_rejected() {
    let unit = kirc_front::parse("int main(){ continue; return 0; }").unwrap();
    assert!(lower(&unit).is_err());
}

#[test]
fn void_call_used_as_value_is_rejected() {
    let unit = kirc_front::parse(
        "void f(){} int main(){ return f(); }",
    )
    .unwrap();
    assert!(lower(&unit).is_err());
}

#[test]
fn block_names_are_unused_once_collected() {
    // Sanity: `collect_names` helper compiles and returns entry-block names
    // for a trivial function (guards against the helper silently matching
    // nothing in the tests above).
    let prog = lower_src("int main(){ int a = 1; return a; }");
    let f = main_fn(&prog);
    let entry = f.blocks.iter().next().unwrap();
    let names = collect_names(entry, f);
    assert!(names.iter().any(|n| n.starts_with('@')));
}
