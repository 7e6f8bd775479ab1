//! Unit tests for error handling.
//!
//! This module contains tests for error types, tips and the diagnostics sink.

use crate::errors::diagnostics::Diagnostics;
use crate::errors::errors::{Error, ErrorImpl, ErrorTip};

#[test]
fn test_error_creation() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "@".to_string(),
        },
        10,
    );

    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert_eq!(error.get_line(), 10);
}

#[test]
fn test_error_display_includes_line() {
    let error = Error::new(
        ErrorImpl::OutsideOfLoop {
            keyword: "break".to_string(),
        },
        3,
    );

    assert_eq!(error.to_string(), "line 3: \"break\" used outside of loop");
}

#[test]
fn test_error_display_without_line() {
    let error = Error::new(
        ErrorImpl::UnknownBuiltin {
            function: "sqrt".to_string(),
        },
        0,
    );

    assert_eq!(error.to_string(), "unknown built-in function: \"sqrt\"");
}

#[test]
fn test_duplicate_declaration_error() {
    let error = Error::new(
        ErrorImpl::VariableAlreadyDeclared {
            variable: "y".to_string(),
        },
        2,
    );

    assert_eq!(error.get_error_name(), "VariableAlreadyDeclared");
    assert!(error.to_string().contains("already declared in this scope"));
}

#[test]
fn test_type_mismatch_error() {
    let error = Error::new(
        ErrorImpl::DeclarationTypeMismatch {
            variable: "x".to_string(),
            expected: "int".to_string(),
            received: "string".to_string(),
        },
        1,
    );

    assert_eq!(error.get_error_name(), "DeclarationTypeMismatch");
    assert_eq!(
        error.to_string(),
        "line 1: type mismatch in declaration of \"x\": expected int, got string"
    );
}

#[test]
fn test_error_tip_none() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "@".to_string(),
        },
        1,
    );

    assert!(matches!(error.get_tip(), ErrorTip::None));
}

#[test]
fn test_error_tip_suggestion() {
    let error = Error::new(
        ErrorImpl::UnexpectedToken {
            token: "}".to_string(),
        },
        1,
    );

    match error.get_tip() {
        ErrorTip::Suggestion(_) => (),
        _ => panic!("Expected suggestion tip"),
    }
}

#[test]
fn test_error_tip_display() {
    let tip = ErrorTip::Suggestion("Try this instead".to_string());
    assert_eq!(tip.to_string(), "Try this instead");

    let tip = ErrorTip::None;
    assert_eq!(tip.to_string(), "");
}

#[test]
fn test_diagnostics_accumulate_in_order() {
    let mut diagnostics = Diagnostics::new();
    assert!(!diagnostics.has_errors());

    diagnostics.report(Error::new(
        ErrorImpl::VariableNotDeclared {
            variable: "a".to_string(),
        },
        1,
    ));
    diagnostics.report(Error::new(
        ErrorImpl::OutsideOfLoop {
            keyword: "continue".to_string(),
        },
        4,
    ));

    assert!(diagnostics.has_errors());
    assert_eq!(diagnostics.error_count(), 2);
    assert_eq!(
        diagnostics.error_names(),
        vec!["VariableNotDeclared", "OutsideOfLoop"]
    );
    assert_eq!(diagnostics.errors()[1].get_line(), 4);
}

#[test]
fn test_at_line_only_fills_missing_line() {
    let backend = Error::new(
        ErrorImpl::BackendError {
            message: "bad store".to_string(),
        },
        0,
    );
    assert_eq!(backend.at_line(7).get_line(), 7);

    let located = Error::new(
        ErrorImpl::UnknownBuiltin {
            function: "abs".to_string(),
        },
        2,
    );
    assert_eq!(located.at_line(7).get_line(), 2);
}
