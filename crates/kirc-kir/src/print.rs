//! Textual KIR printer (spec.md §6.2): turns the typed `Program` of `kir.rs`
//! into the line-oriented text Koopa-style IR tools read (the `-koopa`
//! driver mode's output format; this text is never read back in-process).
//! No teacher analogue (the teacher never serialises its MIR to text); the
//! grammar below is spec.md §6.2's example, generalised.

use crate::kir::*;
use std::fmt;

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for decl in &self.decls {
            write_decl(f, decl)?;
        }
        if !self.decls.is_empty() {
            writeln!(f)?;
        }
        for (i, func) in self.functions.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write_function(f, func)?;
        }
        if !self.functions.is_empty() && !self.globals.is_empty() {
            writeln!(f)?;
        }
        for (i, global) in self.globals.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write_global(f, global)?;
        }
        Ok(())
    }
}

fn write_decl(f: &mut fmt::Formatter<'_>, decl: &FuncDecl) -> fmt::Result {
    write!(f, "decl {}(", decl.name)?;
    for (i, ty) in decl.param_tys.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", ty_str(*ty))?;
    }
    write!(f, ")")?;
    if decl.ret_ty == Ty::I32 {
        write!(f, ": i32")?;
    }
    writeln!(f)
}

fn write_global(f: &mut fmt::Formatter<'_>, global: &GlobalVar) -> fmt::Result {
    match global.init {
        GlobalInit::Const(n) => writeln!(f, "global {} = alloc i32, {n}", global.name),
        GlobalInit::Zero => writeln!(f, "global {} = alloc i32, zeroinit", global.name),
    }
}

fn write_function(f: &mut fmt::Formatter<'_>, func: &Function) -> fmt::Result {
    write!(f, "fun {}(", func.name)?;
    for (i, param) in func.params.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        let name = func.values[*param].name.expect("param has a name");
        write!(f, "{name}: i32")?;
    }
    write!(f, ")")?;
    if func.ret_ty == Ty::I32 {
        write!(f, ": i32")?;
    }
    writeln!(f, " {{")?;
    for block_id in func.block_order() {
        let block = &func.blocks[block_id];
        writeln!(f, "{}:", block.name)?;
        for value_id in &block.instrs {
            write_instr(f, func, *value_id)?;
        }
    }
    writeln!(f, "}}")
}

fn operand_str(func: &Function, op: Operand) -> String {
    match op {
        Operand::Const(n) => n.to_string(),
        Operand::Value(id) => func.values[id]
            .name
            .map(|n| n.to_string())
            .unwrap_or_else(|| format!("<anon:{}>", id_debug(id))),
    }
}

fn id_debug(id: ValueId) -> String {
    format!("{id:?}")
}

fn ptr_str(func: &Function, ptr: Ptr) -> String {
    match ptr {
        Ptr::Local(id) => func.values[id]
            .name
            .map(|n| n.to_string())
            .expect("alloc target has a name"),
        Ptr::Global(name) => name.to_string(),
    }
}

fn ty_str(ty: Ty) -> &'static str {
    match ty {
        Ty::I32 => "i32",
        Ty::Unit => "unit",
    }
}

fn bin_op_str(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "add",
        BinOp::Sub => "sub",
        BinOp::Mul => "mul",
        BinOp::Div => "div",
        BinOp::Mod => "mod",
        BinOp::Lt => "lt",
        BinOp::Gt => "gt",
        BinOp::Le => "le",
        BinOp::Ge => "ge",
        BinOp::Eq => "eq",
        BinOp::Ne => "ne",
        BinOp::And => "and",
        BinOp::Or => "or",
    }
}

fn write_instr(f: &mut fmt::Formatter<'_>, func: &Function, id: ValueId) -> fmt::Result {
    let data = &func.values[id];
    match &data.kind {
        ValueKind::FuncArg(_) => Ok(()), // materialised by the signature line, not a body instruction
        ValueKind::Alloc => {
            writeln!(f, "  {} = alloc i32", data.name.unwrap())
        }
        ValueKind::Binary { op, lhs, rhs } => {
            writeln!(
                f,
                "  {} = {} {}, {}",
                data.name.unwrap(),
                bin_op_str(*op),
                operand_str(func, *lhs),
                operand_str(func, *rhs)
            )
        }
        ValueKind::Load { ptr } => {
            writeln!(f, "  {} = load {}", data.name.unwrap(), ptr_str(func, *ptr))
        }
        ValueKind::Store { value, ptr } => {
            writeln!(
                f,
                "  store {}, {}",
                operand_str(func, *value),
                ptr_str(func, *ptr)
            )
        }
        ValueKind::Branch {
            cond,
            then_bb,
            else_bb,
        } => {
            writeln!(
                f,
                "  br {}, {}, {}",
                operand_str(func, *cond),
                func.blocks[*then_bb].name,
                func.blocks[*else_bb].name
            )
        }
        ValueKind::Jump { target } => {
            writeln!(f, "  jump {}", func.blocks[*target].name)
        }
        ValueKind::Call { callee, args } => {
            let args_str = args
                .iter()
                .map(|a| operand_str(func, *a))
                .collect::<Vec<_>>()
                .join(", ");
            match data.name {
                Some(name) => writeln!(f, "  {name} = call {callee}({args_str})"),
                None => writeln!(f, "  call {callee}({args_str})"),
            }
        }
        ValueKind::Return { value } => match value {
            Some(v) => writeln!(f, "  ret {}", operand_str(func, *v)),
            None => writeln!(f, "  ret"),
        },
    }
}
