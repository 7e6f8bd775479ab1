//! Integration tests for end-to-end compilation.
//!
//! These tests run the complete pipeline from source code through
//! tokenization, parsing, analysis and lowering.

use std::rc::Rc;

use flowlang::{
    ast::ast::Program,
    compiler::{cfg::CfgBuilder, cfg::ControlFlowGraph, compiler::compile},
    display_error,
    errors::{diagnostics::Diagnostics, errors::Error},
    lexer::lexer::tokenize,
    parser::parser::parse,
    type_checker::type_checker::{type_check, TypeChecker},
};

fn analyze(source: &str) -> Result<(Program, TypeChecker), Error> {
    let tokens = tokenize(source.to_string(), Some(String::from("test.fl")))?;
    let mut program = parse(tokens, Rc::new(String::from("test.fl")))?;
    let type_checker = type_check(&mut program)?;
    Ok((program, type_checker))
}

fn compile_source(source: &str) -> (ControlFlowGraph, Diagnostics) {
    let (program, type_checker) = analyze(source).unwrap();
    assert!(!type_checker.has_errors(), "analysis should succeed");

    let (backend, diagnostics) = compile(&program, CfgBuilder::new()).unwrap();
    (backend.into_graph(), diagnostics)
}

#[test]
fn test_compile_simple_program() {
    let (graph, diagnostics) = compile_source("int x = 5;\nprint x;\n");

    assert!(!diagnostics.has_errors());
    assert_eq!(graph.slots_named("x").len(), 1);
    assert_eq!(graph.calls("printf").len(), 1);
}

#[test]
fn test_compile_counting_loop() {
    let source = "
        int i = 0;
        int total = 0;
        repeat (i < 10) {
            i = i + 1;
            if i == 3 {
                continue;
            } else if i == 8 {
                break;
            }
            total = total + i;
        }
        print total;
    ";

    let (graph, diagnostics) = compile_source(source);

    assert!(!diagnostics.has_errors(), "{:?}", diagnostics.error_names());
    assert!(graph.blocks.iter().all(|block| block.terminator.is_some()));

    let body = graph.block_named("body").unwrap();
    let after = graph.block_named("after").unwrap();
    assert!(graph.reaches(graph.entry(), body));
    assert!(graph.reaches(body, after));
    assert_eq!(graph.calls("printf").len(), 1);
}

#[test]
fn test_all_value_kinds() {
    let source = "
        float f = 2.5;
        string s = \"hi\";
        bool b = not (1 > 2) and true;
        char c = 'z';
        print f * 2.0;
        print s;
        print b;
        input int n;
        print n / 2 - 1;
    ";

    let (graph, diagnostics) = compile_source(source);

    assert!(!diagnostics.has_errors(), "{:?}", diagnostics.error_names());
    assert_eq!(graph.calls("printf").len(), 4);
    assert_eq!(graph.calls("scanf").len(), 1);
}

#[test]
fn test_duplicate_declaration_aborts_analysis() {
    let error = analyze("{ int y = 1; float y = 2.0; }").unwrap_err();

    assert_eq!(error.get_error_name(), "VariableAlreadyDeclared");
    assert_eq!(error.get_line(), 1);
}

#[test]
fn test_break_outside_loop() {
    let (program, type_checker) = analyze("break;").unwrap();

    assert_eq!(type_checker.diagnostics().error_names(), vec!["OutsideOfLoop"]);

    // Lowering the program anyway reports instead of branching
    let (backend, diagnostics) = compile(&program, CfgBuilder::new()).unwrap();
    assert_eq!(diagnostics.error_names(), vec!["MissingLoopTarget"]);
    assert_eq!(backend.graph().blocks.len(), 1);
}

#[test]
fn test_analysis_errors_are_collected() {
    let source = "int x = true;\ny = 2;\nif 3 { }\n";

    let (_, type_checker) = analyze(source).unwrap();

    assert_eq!(
        type_checker.diagnostics().error_names(),
        vec![
            "DeclarationTypeMismatch",
            "VariableNotDeclared",
            "NonBooleanCondition"
        ]
    );
}

#[test]
fn test_render_analysis_error() {
    let source = "int x = 1;\nprint y;\n";

    let (_, type_checker) = analyze(source).unwrap();
    let error = &type_checker.diagnostics().errors()[0];

    let rendered = display_error(error, source, "test.fl");
    assert!(rendered.starts_with("Error: VariableNotDeclared (Variable `y` not declared)\n"));
    assert!(rendered.contains("\n2 | print y;\n"));
}

#[test]
fn test_lex_error() {
    let error = tokenize(String::from("int x = 1;\nint y = $;"), None).unwrap_err();

    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert_eq!(error.get_line(), 2);
}

#[test]
fn test_parse_error() {
    let tokens = tokenize(String::from("int x = ;"), None).unwrap();
    let error = parse(tokens, Rc::new(String::from("test.fl"))).unwrap_err();

    assert_eq!(error.get_error_name(), "UnexpectedToken");
}

#[cfg(feature = "llvm")]
mod llvm {
    use super::*;
    use flowlang::compiler::llvm::LlvmBackend;
    use inkwell::context::Context;

    fn compile_to_ir(source: &str) -> String {
        let (program, type_checker) = analyze(source).unwrap();
        assert!(!type_checker.has_errors());

        let context = Context::create();
        let backend = LlvmBackend::new(&context, "test").unwrap();
        let (backend, diagnostics) = compile(&program, backend).unwrap();
        assert!(!diagnostics.has_errors(), "{:?}", diagnostics.error_names());

        backend.verify().unwrap();
        backend.print_to_string()
    }

    #[test]
    fn test_llvm_module_verifies() {
        let ir = compile_to_ir(
            "int i = 0; repeat (i < 3) { i = i + 1; if i == 2 { break; } } print i;",
        );

        assert!(ir.contains("define i32 @main()"));
        assert!(ir.contains("declare i32 @printf(i8*, ...)"));
        assert!(ir.contains("ret i32 0"));
    }

    #[test]
    fn test_llvm_input_and_float_print() {
        let ir = compile_to_ir("input bool b; input string s; float f = 1.5; print f; print s;");

        assert!(ir.contains("fpext float"));
        assert!(ir.contains("[256 x i8]"));
        assert!(ir.contains("b_bool"));
    }

    #[test]
    fn test_llvm_allocas_stay_in_entry_block() {
        let ir = compile_to_ir("int i = 0; repeat (i < 3) { int t = i; i = i + 1; }");

        let (entry, loop_blocks) = ir.split_once("body:").unwrap();
        assert!(entry.contains("%t = alloca i32"));
        assert!(!loop_blocks.contains("alloca"));
    }
}
