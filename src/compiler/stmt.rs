use tracing::debug;

use crate::{
    ast::{
        ast::{Node, NodeKind},
        types::PrimitiveType,
    },
    errors::errors::ErrorImpl,
    EMIT,
};

use super::{
    backend::{Backend, Predicate, Repr},
    compiler::{Binding, BoolInputSlots, Compiler, LoopTargets},
    expr::{gen_condition, gen_expression},
    runtime::{input_format, print_format},
};

pub fn gen_statement<B: Backend>(compiler: &mut Compiler<B>, statement: &Node) {
    let line = statement.line;

    match &statement.kind {
        NodeKind::Declaration {
            declared_type,
            name,
            initializer,
        } => {
            let repr = Repr::of(*declared_type);
            let Some(slot) = EMIT!(compiler, compiler.backend.alloca(repr, name), line) else {
                return;
            };

            let binding = Binding { slot, repr };
            if let Some(value) = gen_expression(compiler, initializer) {
                store_value(compiler, name, binding, value, line);
            }

            // Rebinding replaces any earlier storage for the same name
            compiler.bind(name, binding);
        }
        NodeKind::Assignment { name, value } => {
            let Some(binding) = compiler.binding(name) else {
                compiler.report(
                    ErrorImpl::UndefinedVariable {
                        variable: name.clone(),
                    },
                    line,
                );
                return;
            };

            if let Some(value) = gen_expression(compiler, value) {
                store_value(compiler, name, binding, value, line);
            }
        }
        NodeKind::Print { expr } => {
            if let Some(value) = gen_expression(compiler, expr) {
                gen_print(compiler, value, line);
            }
        }
        NodeKind::Input {
            requested_type,
            name,
        } => gen_input(compiler, *requested_type, name, line),
        NodeKind::If {
            condition,
            then_block,
            else_block,
        } => gen_if(compiler, condition, then_block, else_block.as_deref(), line),
        NodeKind::Repeat { condition, body } => gen_repeat(compiler, condition, body, line),
        NodeKind::Break | NodeKind::Continue => {
            let is_break = matches!(statement.kind, NodeKind::Break);
            let keyword = if is_break { "break" } else { "continue" };

            let Some(targets) = compiler.innermost_loop() else {
                compiler.report(
                    ErrorImpl::MissingLoopTarget {
                        keyword: keyword.to_string(),
                    },
                    line,
                );
                return;
            };

            let target = if is_break {
                targets.break_target
            } else {
                targets.continue_target
            };
            if EMIT!(compiler, compiler.backend.branch(target), line).is_none() {
                return;
            }

            // Anything after the jump lands in a block with no predecessors
            let unreachable = compiler.backend.append_block(&format!("after_{}", keyword));
            compiler.backend.position_at_end(unreachable);
        }
        NodeKind::Block { statements } => {
            for statement in statements {
                gen_statement(compiler, statement);
            }
        }
        NodeKind::Return { .. } => {
            debug!(line, "return statement produces no code");
        }
        NodeKind::Literal { .. }
        | NodeKind::Identifier { .. }
        | NodeKind::Binary { .. }
        | NodeKind::Unary { .. }
        | NodeKind::BuiltinCall { .. } => {
            gen_expression(compiler, statement);
        }
    }
}

/// Stores `value` into the storage bound to `name`.
///
/// Analysis types a variable by its declaration, but `input bool` rebinds
/// the name to `i1` storage, so the value may not fit the slot.
fn store_value<B: Backend>(
    compiler: &mut Compiler<B>,
    name: &str,
    binding: Binding<B::Slot>,
    value: B::Value,
    line: u32,
) {
    let received = compiler.backend.repr_of(value);
    if received != binding.repr {
        compiler.report(
            ErrorImpl::StorageMismatch {
                variable: name.to_string(),
                expected: binding.repr.to_string(),
                received: received.to_string(),
            },
            line,
        );
        return;
    }

    EMIT!(compiler, compiler.backend.store(binding.slot, value), line);
}

fn gen_print<B: Backend>(compiler: &mut Compiler<B>, value: B::Value, line: u32) {
    let repr = compiler.backend.repr_of(value);
    let Some(format) = print_format(repr) else {
        compiler.report(
            ErrorImpl::UnsupportedPrintType {
                repr: repr.to_string(),
            },
            line,
        );
        return;
    };

    let value = match repr {
        Repr::F32 => EMIT!(compiler, compiler.backend.extend_float(value, "fpext"), line),
        // Variadic arguments are at least int sized
        Repr::I1 => EMIT!(
            compiler,
            compiler.backend.extend_int(value, Repr::I32, "zext"),
            line
        ),
        _ => Some(value),
    };

    if let Some(value) = value {
        EMIT!(compiler, compiler.backend.formatted_output(format, value), line);
    }
}

fn gen_input<B: Backend>(compiler: &mut Compiler<B>, requested_type: PrimitiveType, name: &str, line: u32) {
    let Some((format, repr)) = input_format(requested_type) else {
        compiler.report(
            ErrorImpl::UnsupportedInputType {
                type_: requested_type.to_string(),
            },
            line,
        );
        return;
    };

    match requested_type {
        PrimitiveType::String => {
            let buffer_name = format!("{}_buf", name);
            let Some(buffer) = EMIT!(compiler, compiler.backend.alloca(repr, &buffer_name), line) else {
                return;
            };
            let Some(address) = EMIT!(compiler, compiler.backend.address_of(buffer, name), line) else {
                return;
            };
            if EMIT!(compiler, compiler.backend.formatted_input(format, address), line).is_none() {
                return;
            }

            let Some(slot) = EMIT!(compiler, compiler.slot_for(name, Repr::Ptr), line) else {
                return;
            };
            EMIT!(compiler, compiler.backend.store(slot, address), line);
            compiler.bind(name, Binding { slot, repr: Repr::Ptr });
        }
        PrimitiveType::Bool => {
            let Some(slots) = prepare_bool_input(compiler, name, repr, line) else {
                return;
            };
            if read_into(compiler, format, slots.scratch, name, line).is_none() {
                return;
            }

            let Some(raw) = EMIT!(compiler, compiler.backend.load(slots.scratch, repr, name), line) else {
                return;
            };
            let Some(zero) = EMIT!(compiler, compiler.backend.const_int(repr, 0), line) else {
                return;
            };
            let Some(truth) = EMIT!(
                compiler,
                compiler.backend.compare(Predicate::Ne, raw, zero, "tobool"),
                line
            ) else {
                return;
            };

            EMIT!(compiler, compiler.backend.store(slots.value, truth), line);
            compiler.bind(
                name,
                Binding {
                    slot: slots.value,
                    repr: Repr::I1,
                },
            );
        }
        _ => {
            let Some(slot) = EMIT!(compiler, compiler.slot_for(name, repr), line) else {
                return;
            };
            compiler.bind(name, Binding { slot, repr });
            read_into(compiler, format, slot, name, line);
        }
    }
}

/// Storage for `input bool`, allocated on the first read of `name`.
fn prepare_bool_input<B: Backend>(
    compiler: &mut Compiler<B>,
    name: &str,
    scratch_repr: Repr,
    line: u32,
) -> Option<BoolInputSlots<B::Slot>> {
    if let Some(slots) = compiler.bool_input_slots(name) {
        return Some(slots);
    }

    let scratch = EMIT!(compiler, compiler.slot_for(name, scratch_repr), line)?;
    let bool_name = format!("{}_bool", name);
    let value = EMIT!(compiler, compiler.backend.alloca(Repr::I1, &bool_name), line)?;

    let slots = BoolInputSlots { scratch, value };
    compiler.set_bool_input_slots(name, slots);
    Some(slots)
}

fn read_into<B: Backend>(
    compiler: &mut Compiler<B>,
    format: &str,
    slot: B::Slot,
    name: &str,
    line: u32,
) -> Option<()> {
    let address = EMIT!(compiler, compiler.backend.address_of(slot, name), line)?;
    EMIT!(compiler, compiler.backend.formatted_input(format, address), line)
}

fn gen_if<B: Backend>(
    compiler: &mut Compiler<B>,
    condition: &Node,
    then_block: &Node,
    else_block: Option<&Node>,
    line: u32,
) {
    let Some(value) = gen_expression(compiler, condition) else {
        return;
    };
    let Some(condition) = gen_condition(compiler, "if", value, line) else {
        return;
    };

    let then_bb = compiler.backend.append_block("then");
    let else_bb = compiler.backend.append_block("else");
    let merge_bb = compiler.backend.append_block("merge");

    if EMIT!(
        compiler,
        compiler.backend.conditional_branch(condition, then_bb, else_bb),
        line
    )
    .is_none()
    {
        return;
    }

    compiler.backend.position_at_end(then_bb);
    gen_statement(compiler, then_block);
    branch_unless_terminated(compiler, merge_bb, line);

    compiler.backend.position_at_end(else_bb);
    if let Some(else_block) = else_block {
        gen_statement(compiler, else_block);
    }
    branch_unless_terminated(compiler, merge_bb, line);

    compiler.backend.position_at_end(merge_bb);
}

/// Lowers a test-at-bottom loop: the body always runs once before the
/// condition is evaluated.
fn gen_repeat<B: Backend>(compiler: &mut Compiler<B>, condition: &Node, body: &Node, line: u32) {
    let body_bb = compiler.backend.append_block("body");
    let cond_bb = compiler.backend.append_block("cond");
    let after_bb = compiler.backend.append_block("after");

    if EMIT!(compiler, compiler.backend.branch(body_bb), line).is_none() {
        return;
    }

    compiler.backend.position_at_end(body_bb);
    compiler.push_loop(LoopTargets {
        break_target: after_bb,
        continue_target: cond_bb,
    });
    debug!(line, depth = compiler.loop_depth(), "lowering repeat body");
    gen_statement(compiler, body);
    compiler.pop_loop();
    branch_unless_terminated(compiler, cond_bb, line);

    compiler.backend.position_at_end(cond_bb);
    let condition = gen_expression(compiler, condition)
        .and_then(|value| gen_condition(compiler, "repeat", value, line));

    match condition {
        Some(condition) => {
            EMIT!(
                compiler,
                compiler.backend.conditional_branch(condition, body_bb, after_bb),
                line
            );
        }
        // Already reported; leave the loop so the graph stays well formed
        None => branch_unless_terminated(compiler, after_bb, line),
    }

    compiler.backend.position_at_end(after_bb);
}

fn branch_unless_terminated<B: Backend>(compiler: &mut Compiler<B>, target: B::Block, line: u32) {
    let current = compiler.backend.current_block();
    if !compiler.backend.is_terminated(current) {
        EMIT!(compiler, compiler.backend.branch(target), line);
    }
}
