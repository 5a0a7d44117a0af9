//! Statement, block, and top-level declaration lowering (spec.md §4.4,
//! component D): control flow, `break`/`continue`, `return`, assignment,
//! and declarations. Also wires the whole compilation unit together,
//! generalising "one function's statements" to "every item in the file."

use crate::builder::{FunctionBuilder, ProgramBuilder};
use crate::error::LowerResult;
use crate::kir::{self, FuncDecl, GlobalInit, GlobalVar, Operand, Program, Ptr, Ty, ValueKind};
use crate::lower::ctx::{LoopLabels, LoweringCtx};
use crate::lower::expr::{fold_const, kir_ty, lower_expr_for_effect, lower_expr_value, lower_lval_ptr};
use kirc_front::{Block, BlockItem, CompUnit, Decl, Expr, FuncDef, Item, Stmt};
use kirc_sem::{declare_runtime, RibKind, ScopeTree};
use kirc_util::Symbol;

/// Lowers a full compilation unit (spec.md §2, components A-E strung
/// together): function signatures are registered before any body is
/// lowered so forward calls and recursion resolve, then every item is
/// lowered in source order.
pub fn lower_comp_unit(unit: &CompUnit) -> LowerResult<Program> {
    let mut scopes = ScopeTree::new();
    declare_runtime(&mut scopes)?;

    let mut program = ProgramBuilder::new();
    for rt in kirc_sem::RUNTIME_FUNCTIONS {
        program.push_decl(FuncDecl {
            name: Symbol::intern(&format!("@{}", rt.name)),
            param_tys: vec![Ty::I32; rt.arity],
            ret_ty: kir_ty(rt.ret_ty),
        });
    }

    for item in &unit.items {
        if let Item::Func(func) = item {
            scopes.insert_function(func.name, func.ret_ty, func.params.len(), func.span)?;
        }
    }

    for item in &unit.items {
        match item {
            Item::Decl(decl) => lower_global_decl(&mut scopes, &mut program, decl)?,
            Item::Func(func) => {
                let (s, function) = lower_function(scopes, func)?;
                scopes = s;
                program.push_function(function);
            }
        }
    }

    Ok(program.finish())
}

fn lower_global_decl(
    scopes: &mut ScopeTree,
    program: &mut ProgramBuilder,
    decl: &Decl,
) -> LowerResult<()> {
    match decl {
        Decl::Const(const_decl) => {
            for def in &const_decl.defs {
                let value = fold_const(scopes, &def.init)?;
                scopes.insert_const(def.name, value, def.span)?;
            }
        }
        Decl::Var(var_decl) => {
            for def in &var_decl.defs {
                let init = match &def.init {
                    Some(expr) => GlobalInit::Const(fold_const(scopes, expr)?),
                    None => GlobalInit::Zero,
                };
                let kir_name = Symbol::intern(&format!("@{}", def.name.as_str()));
                scopes.insert_global_var(def.name, kir_name, def.span)?;
                program.push_global(GlobalVar {
                    name: kir_name,
                    init,
                });
            }
        }
    }
    Ok(())
}

/// Lowers one function definition, taking and returning ownership of the
/// shared `ScopeTree` (it lives across the whole compilation unit, not
/// just this function — spec.md §5).
fn lower_function(scopes: ScopeTree, func: &FuncDef) -> LowerResult<(ScopeTree, kir::Function)> {
    let mut scopes = scopes;
    scopes.push_scope(RibKind::Function);

    let kir_name = Symbol::intern(&format!("@{}", func.name.as_str()));
    let mut builder = FunctionBuilder::new(kir_name, kir_ty(func.ret_ty));
    let entry = builder.new_block("entry");
    builder.set_entry(entry);

    let mut ctx = LoweringCtx::new(scopes, builder);

    for param in &func.params {
        let base = format!("@{}", param.name.as_str());
        let arg_value = ctx.builder.add_param(Symbol::intern(&base));
        let slot_name = ctx
            .scopes
            .insert_local_var(param.name, &base, param.span)?;
        let slot = ctx.builder.emit_alloc(slot_name);
        ctx.record_local(slot_name, slot);
        ctx.builder.emit_unit(ValueKind::Store {
            value: Operand::Value(arg_value),
            ptr: Ptr::Local(slot),
        });
    }

    lower_block_items(&mut ctx, &func.body)?;
    ctx.finish_function(kir_ty(func.ret_ty))?;
    ctx.scopes.pop_scope()?;

    let (scopes, builder) = ctx.finish();
    Ok((scopes, builder.finish()))
}

/// Lowers a block's items in order, stopping as soon as the current block
/// is terminated — everything after that point is unreachable and is
/// suppressed at emission time rather than compiled into dead code
/// (spec.md §4.4).
fn lower_block_items(ctx: &mut LoweringCtx, block: &Block) -> LowerResult<()> {
    for item in &block.items {
        if ctx.is_terminated() {
            break;
        }
        match item {
            BlockItem::Decl(decl) => lower_local_decl(ctx, decl)?,
            BlockItem::Stmt(stmt) => lower_stmt(ctx, stmt)?,
        }
    }
    Ok(())
}

fn lower_local_decl(ctx: &mut LoweringCtx, decl: &Decl) -> LowerResult<()> {
    match decl {
        Decl::Const(const_decl) => {
            for def in &const_decl.defs {
                let value = fold_const(&ctx.scopes, &def.init)?;
                ctx.scopes.insert_const(def.name, value, def.span)?;
            }
        }
        Decl::Var(var_decl) => {
            for def in &var_decl.defs {
                let base = format!("@{}", def.name.as_str());
                let kir_name = ctx.scopes.insert_local_var(def.name, &base, def.span)?;
                let slot = ctx.builder.emit_alloc(kir_name);
                ctx.record_local(kir_name, slot);
                if let Some(init) = &def.init {
                    let value = lower_expr_value(ctx, init)?;
                    ctx.builder.emit_unit(ValueKind::Store {
                        value,
                        ptr: Ptr::Local(slot),
                    });
                }
            }
        }
    }
    Ok(())
}

fn lower_stmt(ctx: &mut LoweringCtx, stmt: &Stmt) -> LowerResult<()> {
    match stmt {
        Stmt::Assign { lval, expr, span } => {
            let value = lower_expr_value(ctx, expr)?;
            let ptr = lower_lval_ptr(ctx, *lval, *span)?;
            ctx.builder.emit_unit(ValueKind::Store { value, ptr });
            Ok(())
        }

        Stmt::Expr(expr) => {
            if let Some(expr) = expr {
                lower_expr_for_effect(ctx, expr)?;
            }
            Ok(())
        }

        Stmt::Block(block) => {
            ctx.scopes.push_scope(RibKind::Block);
            lower_block_items(ctx, block)?;
            ctx.scopes.pop_scope()?;
            Ok(())
        }

        Stmt::If {
            cond,
            then_branch,
            else_branch,
        } => lower_if(ctx, cond, then_branch, else_branch.as_deref()),

        Stmt::While { cond, body } => lower_while(ctx, cond, body),

        Stmt::Break(span) => {
            let labels = ctx
                .innermost_loop()
                .ok_or(kirc_sem::SemaError::BreakOutsideLoop { span: *span })?;
            ctx.builder
                .emit_terminator(ValueKind::Jump { target: labels.exit });
            Ok(())
        }

        Stmt::Continue(span) => {
            let labels = ctx
                .innermost_loop()
                .ok_or(kirc_sem::SemaError::ContinueOutsideLoop { span: *span })?;
            ctx.builder.emit_terminator(ValueKind::Jump {
                target: labels.entry,
            });
            Ok(())
        }

        Stmt::Return { value, .. } => {
            let value = match value {
                Some(expr) => Some(lower_expr_value(ctx, expr)?),
                None => None,
            };
            ctx.builder.emit_terminator(ValueKind::Return { value });
            Ok(())
        }
    }
}

/// Lowers `if (cond) then_branch [else else_branch]` (spec.md §4.4). The
/// join block is only materialised, and only switched into, when at
/// least one arm actually reaches it — if both arms terminate
/// unconditionally the current block is left on whichever arm ran last
/// (already terminated), so the caller's dead-code check sees the rest
/// of the enclosing block as unreachable without an orphaned empty block
/// left behind in the function.
fn lower_if(
    ctx: &mut LoweringCtx,
    cond: &Expr,
    then_branch: &Stmt,
    else_branch: Option<&Stmt>,
) -> LowerResult<()> {
    let cond_val = lower_expr_value(ctx, cond)?;
    let label = ctx.alloc_label();
    let then_bb = ctx.builder.new_block(&format!("then_{label}"));

    match else_branch {
        None => {
            let end_bb = ctx.builder.new_block(&format!("end_{label}"));
            ctx.builder.emit_terminator(ValueKind::Branch {
                cond: cond_val,
                then_bb,
                else_bb: end_bb,
            });

            ctx.builder.set_current_block(then_bb);
            lower_stmt(ctx, then_branch)?;
            ctx.jump_unless_terminated(end_bb);

            ctx.builder.set_current_block(end_bb);
        }
        Some(else_stmt) => {
            let else_bb = ctx.builder.new_block(&format!("else_{label}"));
            ctx.builder.emit_terminator(ValueKind::Branch {
                cond: cond_val,
                then_bb,
                else_bb,
            });

            ctx.builder.set_current_block(then_bb);
            lower_stmt(ctx, then_branch)?;
            let mut end_bb = None;
            if !ctx.is_terminated() {
                let eb = *end_bb.get_or_insert_with(|| ctx.builder.new_block(&format!("end_{label}")));
                ctx.builder.emit_terminator(ValueKind::Jump { target: eb });
            }

            ctx.builder.set_current_block(else_bb);
            lower_stmt(ctx, else_stmt)?;
            if !ctx.is_terminated() {
                let eb = *end_bb.get_or_insert_with(|| ctx.builder.new_block(&format!("end_{label}")));
                ctx.builder.emit_terminator(ValueKind::Jump { target: eb });
            }

            if let Some(end_bb) = end_bb {
                ctx.builder.set_current_block(end_bb);
            }
        }
    }
    Ok(())
}

/// Lowers `while (cond) body` (spec.md §4.4): a three-block skeleton
/// (entry re-evaluates the condition, body runs and loops back, end is
/// the exit target) with the loop's labels pushed onto `LoweringCtx` so
/// nested `break`/`continue` can find them.
fn lower_while(ctx: &mut LoweringCtx, cond: &Expr, body: &Stmt) -> LowerResult<()> {
    let label = ctx.alloc_label();
    let entry_bb = ctx.builder.new_block(&format!("while_entry_{label}"));
    let body_bb = ctx.builder.new_block(&format!("while_body_{label}"));
    let end_bb = ctx.builder.new_block(&format!("end_{label}"));

    ctx.builder
        .emit_terminator(ValueKind::Jump { target: entry_bb });

    ctx.builder.set_current_block(entry_bb);
    let cond_val = lower_expr_value(ctx, cond)?;
    ctx.builder.emit_terminator(ValueKind::Branch {
        cond: cond_val,
        then_bb: body_bb,
        else_bb: end_bb,
    });

    ctx.scopes.push_scope(RibKind::Loop);
    ctx.push_loop(LoopLabels {
        entry: entry_bb,
        exit: end_bb,
    });
    ctx.builder.set_current_block(body_bb);
    lower_stmt(ctx, body)?;
    ctx.jump_unless_terminated(entry_bb);
    ctx.pop_loop();
    ctx.scopes.pop_scope()?;

    ctx.builder.set_current_block(end_bb);
    Ok(())
}
