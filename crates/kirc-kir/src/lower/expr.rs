//! Expression lowering (spec.md §4.2, §4.3, component C): a recursive fold
//! that either produces a compile-time constant or emits KIR and returns a
//! reference to the result. Each `Expr` node is visited exactly once — the
//! AST topology guarantees this, so the source's `is_evaled` memoisation
//! cache is unnecessary (spec.md §9).

use crate::error::{LowerError, LowerResult};
use crate::kir::{BinOp as KirBinOp, Operand, Ptr, Ty, ValueKind};
use crate::lower::ctx::LoweringCtx;
use kirc_front::{BinOp, Expr, UnOp};
use kirc_sem::{Binding, ScopeTree, SemaError};
use kirc_util::Span;

/// Lowers `expr` and requires the result to carry a usable `i32` value,
/// erroring if it turns out to be a `void`-returning call used as a value
/// (spec.md §7 "Type-ish").
pub fn lower_expr_value(ctx: &mut LoweringCtx, expr: &Expr) -> LowerResult<Operand> {
    let (operand, ty, call_name) = lower_expr(ctx, expr)?;
    if ty == Ty::Unit {
        let name = call_name.unwrap_or_else(|| "<call>".to_string());
        return Err(LowerError::Sema(SemaError::VoidValueUsed {
            name,
            span: expr.span(),
        }));
    }
    Ok(operand)
}

/// Lowers `expr`, returning its operand, its KIR type, and (only for a
/// direct function call) the callee name for diagnostics.
fn lower_expr(
    ctx: &mut LoweringCtx,
    expr: &Expr,
) -> LowerResult<(Operand, Ty, Option<String>)> {
    match expr {
        Expr::IntLit(value, _) => Ok((Operand::Const(*value), Ty::I32, None)),

        Expr::LVal(name, span) => lower_lval(ctx, *name, *span),

        Expr::Unary { op, expr, span } => lower_unary(ctx, *op, expr, *span),

        Expr::Binary {
            op,
            lhs,
            rhs,
            span,
        } => lower_binary(ctx, *op, lhs, rhs, *span),

        Expr::Call { name, args, span } => lower_call(ctx, *name, args, *span),
    }
}

/// Lowers `expr` purely for its side effects, discarding the result —
/// the only place a `void`-returning call is legal (an expression
/// statement, spec.md §4.4).
pub fn lower_expr_for_effect(ctx: &mut LoweringCtx, expr: &Expr) -> LowerResult<()> {
    lower_expr(ctx, expr)?;
    Ok(())
}

/// Evaluates `expr` at compile time, without a `LoweringCtx` and without
/// ever emitting KIR — the const-decl and global-decl initialiser rule of
/// spec.md §4.4 ("must fold to a constant"). Anything that would require a
/// runtime value (a non-const identifier, a call) is an error.
pub fn fold_const(scopes: &ScopeTree, expr: &Expr) -> LowerResult<i32> {
    match expr {
        Expr::IntLit(value, _) => Ok(*value),

        Expr::LVal(name, span) => match scopes.lookup(*name) {
            Some(Binding::Const(value)) => Ok(*value),
            Some(_) => Err(LowerError::Sema(SemaError::NotConstant { span: *span })),
            None => Err(LowerError::Sema(SemaError::UndeclaredIdent {
                name: name.as_str().to_string(),
                span: *span,
            })),
        },

        Expr::Unary { op, expr, .. } => {
            let value = fold_const(scopes, expr)?;
            Ok(match op {
                UnOp::Plus => value,
                UnOp::Neg => value.wrapping_neg(),
                UnOp::Not => i32::from(value == 0),
            })
        }

        Expr::Binary { op, lhs, rhs, .. } => match op {
            BinOp::And => {
                let l = fold_const(scopes, lhs)?;
                if l == 0 {
                    return Ok(0);
                }
                Ok(i32::from(fold_const(scopes, rhs)? != 0))
            }
            BinOp::Or => {
                let l = fold_const(scopes, lhs)?;
                if l != 0 {
                    return Ok(1);
                }
                Ok(i32::from(fold_const(scopes, rhs)? != 0))
            }
            _ => {
                let l = fold_const(scopes, lhs)?;
                let r = fold_const(scopes, rhs)?;
                Ok(fold_arith(*op, l, r))
            }
        },

        Expr::Call { span, .. } => Err(LowerError::Sema(SemaError::NotConstant { span: *span })),
    }
}

fn lower_lval(
    ctx: &mut LoweringCtx,
    name: kirc_util::Symbol,
    span: Span,
) -> LowerResult<(Operand, Ty, Option<String>)> {
    let binding = ctx
        .scopes
        .lookup(name)
        .ok_or_else(|| SemaError::UndeclaredIdent {
            name: name.as_str().to_string(),
            span,
        })?
        .clone();
    match binding {
        Binding::Const(value) => Ok((Operand::Const(value), Ty::I32, None)),
        Binding::LocalVar { kir_name } | Binding::GlobalVar { kir_name } => {
            let ptr = ctx.name_to_value(kir_name).ok_or_else(|| {
                LowerError::InternalInvariant(format!("no value recorded for '{kir_name}'"))
            })?;
            let loaded = ctx.builder.emit(ValueKind::Load { ptr });
            Ok((Operand::Value(loaded), Ty::I32, None))
        }
        Binding::Function { .. } => Err(LowerError::Sema(SemaError::NotAFunction {
            name: name.as_str().to_string(),
            span,
        })),
    }
}

/// Resolves the pointer (alloc or global) backing an l-value, without
/// emitting a load — used by assignment (spec.md §4.4, the `is_left` flag).
pub fn lower_lval_ptr(
    ctx: &mut LoweringCtx,
    name: kirc_util::Symbol,
    span: Span,
) -> LowerResult<crate::kir::Ptr> {
    let binding = ctx
        .scopes
        .lookup(name)
        .ok_or_else(|| SemaError::UndeclaredIdent {
            name: name.as_str().to_string(),
            span,
        })?
        .clone();
    match binding {
        Binding::Const(_) => Err(LowerError::Sema(SemaError::AssignToConst {
            name: name.as_str().to_string(),
            span,
        })),
        Binding::LocalVar { kir_name } | Binding::GlobalVar { kir_name } => {
            ctx.name_to_value(kir_name).ok_or_else(|| {
                LowerError::InternalInvariant(format!("no value recorded for '{kir_name}'"))
            })
        }
        Binding::Function { .. } => Err(LowerError::Sema(SemaError::NotAFunction {
            name: name.as_str().to_string(),
            span,
        })),
    }
}

fn lower_unary(
    ctx: &mut LoweringCtx,
    op: UnOp,
    operand: &Expr,
    span: Span,
) -> LowerResult<(Operand, Ty, Option<String>)> {
    let value = lower_expr_value(ctx, operand)?;

    if let Operand::Const(n) = value {
        let folded = match op {
            UnOp::Plus => n,
            UnOp::Neg => n.wrapping_neg(),
            UnOp::Not => i32::from(n == 0),
        };
        return Ok((Operand::Const(folded), Ty::I32, None));
    }

    let _ = span;
    match op {
        // `+x` is a no-op once `x` is known non-constant.
        UnOp::Plus => Ok((value, Ty::I32, None)),
        // `-x` lowers to `sub 0, x` (spec.md §4.3).
        UnOp::Neg => {
            let result = ctx.builder.emit(ValueKind::Binary {
                op: KirBinOp::Sub,
                lhs: Operand::Const(0),
                rhs: value,
            });
            Ok((Operand::Value(result), Ty::I32, None))
        }
        // `!x` lowers to `eq x, 0`.
        UnOp::Not => {
            let result = ctx.builder.emit(ValueKind::Binary {
                op: KirBinOp::Eq,
                lhs: value,
                rhs: Operand::Const(0),
            });
            Ok((Operand::Value(result), Ty::I32, None))
        }
    }
}

fn lower_binary(
    ctx: &mut LoweringCtx,
    op: BinOp,
    lhs: &Expr,
    rhs: &Expr,
    span: Span,
) -> LowerResult<(Operand, Ty, Option<String>)> {
    match op {
        BinOp::And => return lower_short_circuit(ctx, true, lhs, rhs, span),
        BinOp::Or => return lower_short_circuit(ctx, false, lhs, rhs, span),
        _ => {}
    }

    let lhs_val = lower_expr_value(ctx, lhs)?;
    let rhs_val = lower_expr_value(ctx, rhs)?;

    if let (Operand::Const(a), Operand::Const(b)) = (lhs_val, rhs_val) {
        return Ok((Operand::Const(fold_arith(op, a, b)), Ty::I32, None));
    }

    let kir_op = to_kir_binop(op);
    let result = ctx.builder.emit(ValueKind::Binary {
        op: kir_op,
        lhs: lhs_val,
        rhs: rhs_val,
    });
    Ok((Operand::Value(result), Ty::I32, None))
}

/// Two's-complement 32-bit arithmetic; division truncates toward zero and
/// `%` takes the sign of the dividend, matching Rust's native `i32` `/`
/// and `%` (spec.md §3.4). Division/modulo by zero is not exercised by the
/// tests (spec.md §4.3) so it is left to panic like any other Rust
/// division by zero rather than specially handled.
pub(crate) fn fold_arith(op: BinOp, a: i32, b: i32) -> i32 {
    match op {
        BinOp::Add => a.wrapping_add(b),
        BinOp::Sub => a.wrapping_sub(b),
        BinOp::Mul => a.wrapping_mul(b),
        BinOp::Div => a.wrapping_div(b),
        BinOp::Mod => a.wrapping_rem(b),
        BinOp::Lt => i32::from(a < b),
        BinOp::Gt => i32::from(a > b),
        BinOp::Le => i32::from(a <= b),
        BinOp::Ge => i32::from(a >= b),
        BinOp::Eq => i32::from(a == b),
        BinOp::Ne => i32::from(a != b),
        BinOp::And | BinOp::Or => unreachable!("short-circuit ops never reach fold_arith"),
    }
}

/// Maps a surface return type to its KIR type; shared by call lowering and
/// function-signature lowering (`lower/stmt.rs`).
pub(crate) fn kir_ty(ty: kirc_front::Type) -> Ty {
    match ty {
        kirc_front::Type::Int => Ty::I32,
        kirc_front::Type::Void => Ty::Unit,
    }
}

fn to_kir_binop(op: BinOp) -> KirBinOp {
    match op {
        BinOp::Add => KirBinOp::Add,
        BinOp::Sub => KirBinOp::Sub,
        BinOp::Mul => KirBinOp::Mul,
        BinOp::Div => KirBinOp::Div,
        BinOp::Mod => KirBinOp::Mod,
        BinOp::Lt => KirBinOp::Lt,
        BinOp::Gt => KirBinOp::Gt,
        BinOp::Le => KirBinOp::Le,
        BinOp::Ge => KirBinOp::Ge,
        BinOp::Eq => KirBinOp::Eq,
        BinOp::Ne => KirBinOp::Ne,
        BinOp::And | BinOp::Or => unreachable!("short-circuit ops never reach to_kir_binop"),
    }
}

/// `is_and = true` lowers `&&`; `false` lowers `||`. Both shapes share one
/// then/else/join skeleton; `Branch { cond: lhs, then_bb, else_bb }` always
/// takes `then_bb` when `lhs != 0` and `else_bb` when `lhs == 0`, so which of
/// the two blocks evaluates the right operand (and which stores the
/// deciding constant) flips with `is_and` (spec.md §4.3): `&&` evaluates the
/// rhs when `lhs != 0` (the `then` side); `||` evaluates it when `lhs == 0`
/// (the `else` side).
fn lower_short_circuit(
    ctx: &mut LoweringCtx,
    is_and: bool,
    lhs: &Expr,
    rhs: &Expr,
    span: Span,
) -> LowerResult<(Operand, Ty, Option<String>)> {
    let lhs_val = lower_expr_value(ctx, lhs)?;

    if let Operand::Const(n) = lhs_val {
        let deciding = if is_and { n == 0 } else { n != 0 };
        if deciding {
            return Ok((Operand::Const(i32::from(!is_and)), Ty::I32, None));
        }
    }

    let label = ctx.alloc_label();
    let tmp_name = kirc_util::Symbol::intern(&format!("@t{label}"));
    let slot = Ptr::Local(ctx.builder.emit_alloc(tmp_name));

    let then_bb = ctx.builder.new_block(&format!("then_{label}"));
    let else_bb = ctx.builder.new_block(&format!("else_{label}"));
    let join_bb = ctx.builder.new_block(&format!("end_{label}"));

    ctx.builder.emit_terminator(ValueKind::Branch {
        cond: lhs_val,
        then_bb,
        else_bb,
    });

    // `&&`: rhs evaluates on the `then_bb != 0` side, constant on `else_bb`.
    // `||`: rhs evaluates on the `else_bb == 0` side, constant on `then_bb`.
    let (eval_bb, const_bb) = if is_and { (then_bb, else_bb) } else { (else_bb, then_bb) };
    let deciding_const = Operand::Const(i32::from(!is_and));

    ctx.builder.set_current_block(eval_bb);
    let rhs_val = lower_expr_value(ctx, rhs)?;
    let normalised = normalise_bool(ctx, rhs_val);
    ctx.builder.emit_unit(ValueKind::Store {
        value: normalised,
        ptr: slot,
    });
    ctx.jump_unless_terminated(join_bb);

    ctx.builder.set_current_block(const_bb);
    ctx.builder.emit_unit(ValueKind::Store {
        value: deciding_const,
        ptr: slot,
    });
    ctx.jump_unless_terminated(join_bb);

    ctx.builder.set_current_block(join_bb);
    let result = ctx.builder.emit(ValueKind::Load { ptr: slot });
    let _ = span;
    Ok((Operand::Value(result), Ty::I32, None))
}

/// Normalises a value to `0`/`1` the way `!!x` would: `eq (eq x, 0), 0`
/// collapses to a single `ne x, 0` since it is always applied to a value
/// already known to be on the non-deciding branch.
fn normalise_bool(ctx: &mut LoweringCtx, value: Operand) -> Operand {
    if let Operand::Const(n) = value {
        return Operand::Const(i32::from(n != 0));
    }
    let result = ctx.builder.emit(ValueKind::Binary {
        op: KirBinOp::Ne,
        lhs: value,
        rhs: Operand::Const(0),
    });
    Operand::Value(result)
}

fn lower_call(
    ctx: &mut LoweringCtx,
    name: kirc_util::Symbol,
    args: &[Expr],
    span: Span,
) -> LowerResult<(Operand, Ty, Option<String>)> {
    let binding = ctx
        .scopes
        .lookup(name)
        .ok_or_else(|| SemaError::UndeclaredFunction {
            name: name.as_str().to_string(),
            span,
        })?
        .clone();

    let (ret_ty, arity) = match binding {
        Binding::Function { ret_ty, arity } => (ret_ty, arity),
        _ => {
            return Err(LowerError::Sema(SemaError::NotAFunction {
                name: name.as_str().to_string(),
                span,
            }))
        }
    };

    if args.len() != arity {
        return Err(LowerError::Sema(SemaError::ArityMismatch {
            name: name.as_str().to_string(),
            expected: arity,
            found: args.len(),
            span,
        }));
    }

    // Arguments are evaluated left-to-right: order matters since they may
    // emit KIR side effects (spec.md §4.3).
    let mut arg_values = Vec::with_capacity(args.len());
    for arg in args {
        arg_values.push(lower_expr_value(ctx, arg)?);
    }

    let kir_ty = kir_ty(ret_ty);
    let callee = kirc_util::Symbol::intern(&format!("@{}", name.as_str()));
    let call_kind = ValueKind::Call {
        callee,
        args: arg_values,
    };

    match kir_ty {
        Ty::I32 => {
            let result = ctx.builder.emit(call_kind);
            Ok((Operand::Value(result), Ty::I32, None))
        }
        Ty::Unit => {
            ctx.builder.emit_unit(call_kind);
            // There is no usable operand for a void call; the placeholder
            // constant is never read because `ty` is `Unit`.
            Ok((
                Operand::Const(0),
                Ty::Unit,
                Some(name.as_str().to_string()),
            ))
        }
    }
}
