//! Unit tests for lowering into the in-crate control flow graph.

use std::rc::Rc;

use super::{
    backend::{Backend, Predicate, Repr, ScalarOp, UnaryScalarOp},
    cfg::{BlockId, CfgBuilder, Constant, ControlFlowGraph, Instruction, Terminator, ValueId},
    compiler::compile,
};
use crate::{
    ast::{
        ast::{Node, Program},
        types::{LiteralKind, PrimitiveType},
    },
    errors::diagnostics::Diagnostics,
    lexer::lexer::tokenize,
    parser::parser::parse,
    type_checker::type_checker::type_check,
};

fn lower_program(program: &Program) -> (ControlFlowGraph, Diagnostics) {
    let (backend, diagnostics) = compile(program, CfgBuilder::new()).unwrap();
    (backend.into_graph(), diagnostics)
}

fn lower_source(source: &str) -> (ControlFlowGraph, Diagnostics) {
    let tokens = tokenize(source.to_string(), None).unwrap();
    let mut program = parse(tokens, Rc::new(String::from("test.fl"))).unwrap();
    let type_checker = type_check(&mut program).unwrap();
    assert!(
        !type_checker.has_errors(),
        "unexpected analysis errors: {:?}",
        type_checker.diagnostics().error_names()
    );
    lower_program(&program)
}

fn lower_clean(source: &str) -> ControlFlowGraph {
    let (graph, diagnostics) = lower_source(source);
    assert!(
        !diagnostics.has_errors(),
        "unexpected lowering errors: {:?}",
        diagnostics.error_names()
    );
    graph
}

fn block(graph: &ControlFlowGraph, name: &str) -> BlockId {
    graph
        .block_named(name)
        .unwrap_or_else(|| panic!("no block named {}", name))
}

fn string_constant(graph: &ControlFlowGraph, value: ValueId) -> String {
    match graph.constant(value) {
        Some(Constant::String(string)) => string.clone(),
        other => panic!("expected a string constant, got {:?}", other),
    }
}

fn int_constant(graph: &ControlFlowGraph, value: ValueId) -> i64 {
    match graph.constant(value) {
        Some(Constant::Int { value, .. }) => *value,
        other => panic!("expected an integer constant, got {:?}", other),
    }
}

fn printf_formats(graph: &ControlFlowGraph) -> Vec<String> {
    graph
        .calls("printf")
        .iter()
        .map(|args| string_constant(graph, args[0]))
        .collect()
}

fn scanf_formats(graph: &ControlFlowGraph) -> Vec<String> {
    graph
        .calls("scanf")
        .iter()
        .map(|args| string_constant(graph, args[0]))
        .collect()
}

fn instructions(graph: &ControlFlowGraph) -> Vec<&Instruction> {
    graph
        .blocks
        .iter()
        .flat_map(|block| block.instructions.iter())
        .collect()
}

#[test]
fn test_declaration_and_integer_print() {
    let graph = lower_clean("int x = 5; print x;");

    let slots = graph.slots_named("x");
    assert_eq!(slots.len(), 1);
    assert_eq!(graph.slots[slots[0].0].repr, Repr::I32);

    let stores = graph.stores_to(slots[0]);
    assert_eq!(stores.len(), 1);
    assert_eq!(
        graph.constant(stores[0]),
        Some(&Constant::Int {
            repr: Repr::I32,
            value: 5
        })
    );

    assert_eq!(printf_formats(&graph), vec![String::from("%d\n")]);
}

#[test]
fn test_if_else_diamond() {
    let graph = lower_clean("bool b = 1 == 2; if b { print 1; } else { print 0; }");

    let then_bb = block(&graph, "then");
    let else_bb = block(&graph, "else");
    let merge_bb = block(&graph, "merge");

    assert_eq!(graph.successors(graph.entry()), vec![then_bb, else_bb]);
    assert_eq!(graph.successors(then_bb), vec![merge_bb]);
    assert_eq!(graph.successors(else_bb), vec![merge_bb]);

    let then_prints = graph.calls_in(then_bb, "printf");
    assert_eq!(then_prints.len(), 1);
    assert_eq!(string_constant(&graph, then_prints[0][0]), "%d\n");
    assert_eq!(int_constant(&graph, then_prints[0][1]), 1);

    let else_prints = graph.calls_in(else_bb, "printf");
    assert_eq!(else_prints.len(), 1);
    assert_eq!(int_constant(&graph, else_prints[0][1]), 0);
}

#[test]
fn test_if_without_else_reaches_merge_from_both_arms() {
    let graph = lower_clean("if true { print 1; }");

    let then_bb = block(&graph, "then");
    let else_bb = block(&graph, "else");
    let merge_bb = block(&graph, "merge");

    assert!(graph.block(else_bb).instructions.is_empty());
    assert_eq!(graph.successors(then_bb), vec![merge_bb]);
    assert_eq!(graph.successors(else_bb), vec![merge_bb]);
    assert!(graph.reaches(graph.entry(), merge_bb));
}

#[test]
fn test_top_level_break_reports_and_emits_no_branch() {
    let program = Program::new(vec![Node::brk(1)]);

    let (graph, diagnostics) = lower_program(&program);

    assert_eq!(diagnostics.error_names(), vec!["MissingLoopTarget"]);
    assert_eq!(diagnostics.errors()[0].get_line(), 1);
    assert_eq!(graph.blocks.len(), 1);
    assert!(matches!(
        graph.block(graph.entry()).terminator,
        Some(Terminator::Return(_))
    ));
}

#[test]
fn test_repeat_runs_body_before_condition() {
    let graph = lower_clean("int x = 0; repeat (false) { x = x + 1; }");

    let body_bb = block(&graph, "body");
    let cond_bb = block(&graph, "cond");
    let after_bb = block(&graph, "after");

    // The body is entered unconditionally
    assert_eq!(graph.successors(graph.entry()), vec![body_bb]);
    assert_eq!(graph.successors(body_bb), vec![cond_bb]);

    let x = graph.slots_named("x")[0];
    assert!(graph.block(body_bb).instructions.iter().any(|instruction| matches!(
        instruction,
        Instruction::Store { slot, .. } if *slot == x
    )));

    match graph.block(cond_bb).terminator {
        Some(Terminator::CondBranch {
            then_block,
            else_block,
            ..
        }) => {
            assert_eq!(then_block, body_bb);
            assert_eq!(else_block, after_bb);
        }
        other => panic!("expected a conditional branch, got {:?}", other),
    }
}

#[test]
fn test_repeat_condition_is_evaluated_in_cond_block() {
    let graph = lower_clean("int i = 0; repeat (i < 3) { i = i + 1; }");

    let cond_bb = block(&graph, "cond");
    assert!(graph.block(cond_bb).instructions.iter().any(|instruction| matches!(
        instruction,
        Instruction::Compare {
            predicate: Predicate::Slt,
            ..
        }
    )));
}

#[test]
fn test_break_jumps_to_loop_exit() {
    let graph = lower_clean("int i = 0; repeat (i < 10) { i = i + 1; if i == 5 { break; } }");

    let then_bb = block(&graph, "then");
    let after_bb = block(&graph, "after");
    let merge_bb = block(&graph, "merge");

    assert_eq!(graph.successors(then_bb), vec![after_bb]);
    // Code after the jump lives in its own block
    assert_eq!(graph.successors(block(&graph, "after_break")), vec![merge_bb]);
    assert!(graph.blocks.iter().all(|block| block.terminator.is_some()));
}

#[test]
fn test_continue_jumps_to_condition() {
    let graph = lower_clean("int i = 0; repeat (i < 10) { i = i + 1; continue; print i; }");

    let body_bb = block(&graph, "body");
    let cond_bb = block(&graph, "cond");

    assert_eq!(graph.successors(body_bb), vec![cond_bb]);
    let after_continue = block(&graph, "after_continue");
    assert_eq!(graph.calls_in(after_continue, "printf").len(), 1);
    assert_eq!(graph.successors(after_continue), vec![cond_bb]);
}

#[test]
fn test_nested_loops_use_innermost_targets() {
    let graph = lower_clean("repeat (true) { repeat (true) { break; } break; }");

    let after_bb = block(&graph, "after");
    let inner_body = block(&graph, "body1");
    let inner_after = block(&graph, "after1");

    assert_eq!(graph.successors(inner_body), vec![inner_after]);
    assert_eq!(graph.successors(inner_after), vec![after_bb]);
}

#[test]
fn test_loop_target_stack_is_balanced() {
    let program = {
        let tokens = tokenize(String::from("repeat (true) { repeat (true) { } }"), None).unwrap();
        let mut program = parse(tokens, Rc::new(String::from("test.fl"))).unwrap();
        type_check(&mut program).unwrap();
        program
    };

    let mut compiler = super::compiler::Compiler::new(CfgBuilder::new()).unwrap();
    compiler.lower_program(&program);

    assert_eq!(compiler.loop_depth(), 0);
    assert!(compiler.innermost_loop().is_none());
}

#[test]
fn test_float_operations() {
    let graph = lower_clean("float f = 1.5; print f + 2.0; bool b = f < 2.0; print -f;");

    let instructions = instructions(&graph);
    assert!(instructions.iter().any(|instruction| matches!(
        instruction,
        Instruction::Binary {
            op: ScalarOp::FAdd,
            ..
        }
    )));
    assert!(instructions.iter().any(|instruction| matches!(
        instruction,
        Instruction::Compare {
            predicate: Predicate::Olt,
            ..
        }
    )));
    assert!(instructions.iter().any(|instruction| matches!(
        instruction,
        Instruction::Unary {
            op: UnaryScalarOp::FNeg,
            ..
        }
    )));
    assert!(instructions.iter().any(|instruction| matches!(
        instruction,
        Instruction::Extend { to: Repr::F64, .. }
    )));
    assert_eq!(printf_formats(&graph), vec![String::from("%f\n"), String::from("%f\n")]);
}

#[test]
fn test_print_formats_per_representation() {
    let graph = lower_clean("print true; print \"hi\"; print 3;");

    assert_eq!(
        printf_formats(&graph),
        vec![String::from("%d\n"), String::from("%s\n"), String::from("%d\n")]
    );

    // Booleans are widened before the variadic call
    let bool_print = &graph.calls("printf")[0];
    assert_eq!(graph.value_repr(bool_print[1]), Repr::I32);
}

#[test]
fn test_print_char_is_unsupported() {
    let (graph, diagnostics) = lower_source("print 'a';");

    assert_eq!(diagnostics.error_names(), vec!["UnsupportedPrintType"]);
    assert!(graph.calls("printf").is_empty());
}

#[test]
fn test_input_int_reads_into_slot() {
    let graph = lower_clean("input int n; print n;");

    let slots = graph.slots_named("n");
    assert_eq!(slots.len(), 1);
    assert_eq!(graph.slots[slots[0].0].repr, Repr::I32);
    assert_eq!(scanf_formats(&graph), vec![String::from("%d")]);
}

#[test]
fn test_input_reuses_matching_storage() {
    let graph = lower_clean("int n = 1; input int n;");
    assert_eq!(graph.slots_named("n").len(), 1);

    let graph = lower_clean("int n = 1; input float n;");
    let slots = graph.slots_named("n");
    assert_eq!(slots.len(), 2);
    assert_eq!(graph.slots[slots[1].0].repr, Repr::F32);
    assert_eq!(scanf_formats(&graph), vec![String::from("%f")]);
}

#[test]
fn test_input_bool_converts_and_rebinds() {
    let graph = lower_clean("input bool b; print b;");

    let scratch = graph.slots_named("b");
    let bool_slot = graph.slots_named("b_bool");
    assert_eq!(scratch.len(), 1);
    assert_eq!(bool_slot.len(), 1);
    assert_eq!(graph.slots[scratch[0].0].repr, Repr::I32);
    assert_eq!(graph.slots[bool_slot[0].0].repr, Repr::I1);

    assert_eq!(scanf_formats(&graph), vec![String::from("%d")]);
    assert_eq!(graph.stores_to(bool_slot[0]).len(), 1);

    // The later print reads the converted value
    assert!(instructions(&graph).iter().any(|instruction| matches!(
        instruction,
        Instruction::Load { slot, repr: Repr::I1, .. } if *slot == bool_slot[0]
    )));
}

#[test]
fn test_input_bool_twice_reuses_bool_slot() {
    let graph = lower_clean("input bool b; input bool b;");

    assert_eq!(graph.slots_named("b_bool").len(), 1);
    assert_eq!(graph.slots_named("b").len(), 1);
    assert_eq!(graph.calls("scanf").len(), 2);
}

#[test]
fn test_store_into_rebound_bool_is_reported() {
    let (graph, diagnostics) = lower_source("input bool b; b = 5; print b;");

    assert_eq!(diagnostics.error_names(), vec!["StorageMismatch"]);
    assert_eq!(diagnostics.errors()[0].get_line(), 1);

    let bool_slot = graph.slots_named("b_bool")[0];
    let stored: Vec<Repr> = graph
        .stores_to(bool_slot)
        .iter()
        .map(|value| graph.value_repr(*value))
        .collect();
    assert_eq!(stored, vec![Repr::I1]);
}

#[test]
fn test_allocas_stay_in_entry_block() {
    let graph = lower_clean(
        "int i = 0; repeat (i < 3) { int t = i; input bool b; input string s; i = i + 1; }",
    );

    let body_bb = block(&graph, "body");
    assert!(!graph
        .block(body_bb)
        .instructions
        .iter()
        .any(|instruction| matches!(instruction, Instruction::Alloca { .. })));

    let entry_allocas = graph
        .block(graph.entry())
        .instructions
        .iter()
        .take_while(|instruction| matches!(instruction, Instruction::Alloca { .. }))
        .count();
    assert_eq!(entry_allocas, graph.slots.len());
    assert_eq!(graph.slots_named("t").len(), 1);
}

#[test]
fn test_input_string_binds_buffer_pointer() {
    let graph = lower_clean("input string s; print s;");

    let buffer = graph.slots_named("s_buf");
    let pointer = graph.slots_named("s");
    assert_eq!(buffer.len(), 1);
    assert_eq!(graph.slots[buffer[0].0].repr, Repr::ByteArray(256));
    assert_eq!(graph.slots[pointer[0].0].repr, Repr::Ptr);

    assert_eq!(scanf_formats(&graph), vec![String::from("%s")]);
    assert_eq!(printf_formats(&graph), vec![String::from("%s\n")]);
}

#[test]
fn test_input_char_is_unsupported() {
    let (graph, diagnostics) = lower_source("input char c;");

    assert_eq!(diagnostics.error_names(), vec!["UnsupportedInputType"]);
    assert!(graph.calls("scanf").is_empty());
}

#[test]
fn test_unknown_builtin_is_reported() {
    let (_, diagnostics) = lower_source("abs(-3);");

    assert_eq!(diagnostics.error_names(), vec!["UnknownBuiltin"]);
}

#[test]
fn test_builtin_call_to_declared_function() {
    let graph = lower_clean("printf(\"hello\");");

    let calls = graph.calls("printf");
    assert_eq!(calls.len(), 1);
    assert_eq!(string_constant(&graph, calls[0][0]), "hello");
}

#[test]
fn test_undefined_variable_is_reported() {
    let program = Program::new(vec![Node::print(Node::identifier("y", 3), 3)]);

    let (graph, diagnostics) = lower_program(&program);

    assert_eq!(diagnostics.error_names(), vec!["UndefinedVariable"]);
    assert_eq!(diagnostics.errors()[0].get_line(), 3);
    assert!(graph.calls("printf").is_empty());
}

#[test]
fn test_assignment_without_binding_is_reported() {
    let program = Program::new(vec![Node::assignment("y", Node::int(1, 1), 1)]);

    let (_, diagnostics) = lower_program(&program);

    assert_eq!(diagnostics.error_names(), vec!["UndefinedVariable"]);
}

#[test]
fn test_unanalyzed_identifier_has_unresolved_type() {
    let program = Program::new(vec![
        Node::declaration(PrimitiveType::Int, "x", Node::int(1, 1), 1),
        Node::print(Node::identifier("x", 2), 2),
    ]);

    let (_, diagnostics) = lower_program(&program);

    assert_eq!(diagnostics.error_names(), vec!["UnresolvedType"]);
}

#[test]
fn test_invalid_char_literal_is_reported() {
    let program = Program::new(vec![Node::declaration(
        PrimitiveType::Char,
        "c",
        Node::literal(LiteralKind::Char, "ab", 1),
        1,
    )]);

    let (_, diagnostics) = lower_program(&program);

    assert_eq!(diagnostics.error_names(), vec!["InvalidLiteral"]);
}

#[test]
fn test_bindings_are_flat_across_blocks() {
    let graph = lower_clean("int x = 1; { int x = 2; } print x;");

    let slots = graph.slots_named("x");
    assert_eq!(slots.len(), 2);

    // The inner declaration replaced the binding for the rest of the function
    assert!(instructions(&graph).iter().any(|instruction| matches!(
        instruction,
        Instruction::Load { slot, .. } if *slot == slots[1]
    )));
}

#[test]
fn test_entry_function_returns_zero() {
    let graph = lower_clean("int x = 5;");

    match graph.block(graph.entry()).terminator {
        Some(Terminator::Return(value)) => assert_eq!(int_constant(&graph, value), 0),
        other => panic!("expected a return, got {:?}", other),
    }
}

#[test]
fn test_runtime_is_declared() {
    let graph = lower_clean("");

    let names: Vec<&str> = graph
        .declarations
        .iter()
        .map(|declaration| declaration.name.as_str())
        .collect();
    assert_eq!(names, vec!["printf", "scanf"]);
}

#[test]
fn test_graph_dump() {
    let graph = lower_clean("if true { print 1; }");
    let dump = graph.to_string();

    assert!(dump.contains("declare i32 @printf(ptr, ...)"));
    assert!(dump.contains("define i32 @main() {"));
    assert!(dump.contains("br label %merge"));
    assert!(dump.contains("ret i32"));
}

#[test]
fn test_cfg_builder_rejects_code_after_terminator() {
    let mut builder = CfgBuilder::new();
    let target = builder.append_block("next");

    builder.branch(target).unwrap();

    assert!(builder.const_int(Repr::I32, 1).is_err());
    assert!(builder.branch(target).is_err());
}

#[test]
fn test_cfg_builder_rejects_mixed_operands() {
    let mut builder = CfgBuilder::new();
    let int = builder.const_int(Repr::I32, 1).unwrap();
    let float = builder.const_float(Repr::F32, 1.0).unwrap();

    assert!(builder.binary(ScalarOp::Add, int, float, "bad").is_err());
    assert!(builder.binary(ScalarOp::FAdd, int, int, "bad").is_err());
    assert!(builder.compare(Predicate::Eq, int, float, "bad").is_err());
}

#[test]
fn test_cfg_builder_rejects_mismatched_slot_access() {
    let mut builder = CfgBuilder::new();
    let slot = builder.alloca(Repr::I1, "flag").unwrap();
    let int = builder.const_int(Repr::I32, 5).unwrap();

    assert!(builder.store(slot, int).is_err());
    assert!(builder.load(slot, Repr::I32, "flag").is_err());
    assert!(builder.load(slot, Repr::I1, "flag").is_ok());
}

#[test]
fn test_cfg_builder_unique_block_names() {
    let mut builder = CfgBuilder::new();
    let first = builder.append_block("then");
    let second = builder.append_block("then");

    let graph = builder.into_graph();
    assert_eq!(graph.block(first).name, "then");
    assert_eq!(graph.block(second).name, "then1");
}

#[test]
fn test_cfg_builder_call_requires_declaration() {
    let mut builder = CfgBuilder::new();

    let error = builder.call("missing", &[], "call").unwrap_err();
    assert_eq!(error.get_error_name(), "UnknownBuiltin");
}
