//! Unit tests for the lexer module.
//!
//! Covers keywords, type names, literals with escapes, operators, comments,
//! line tracking and error cases.

use super::{lexer::tokenize, tokens::TokenKind};

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source.to_string(), Some("test.fl".to_string()))
        .unwrap()
        .iter()
        .map(|token| token.kind)
        .collect()
}

#[test]
fn test_tokenize_keywords() {
    assert_eq!(
        kinds("print input return if else repeat break continue true false and or not"),
        vec![
            TokenKind::Print,
            TokenKind::Input,
            TokenKind::Return,
            TokenKind::If,
            TokenKind::Else,
            TokenKind::Repeat,
            TokenKind::Break,
            TokenKind::Continue,
            TokenKind::True,
            TokenKind::False,
            TokenKind::And,
            TokenKind::Or,
            TokenKind::Not,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_type_names() {
    let tokens = tokenize("int float bool string char".to_string(), None).unwrap();

    let names: Vec<&str> = tokens[..5].iter().map(|token| token.value.as_str()).collect();
    assert_eq!(names, vec!["int", "float", "bool", "string", "char"]);
    assert!(tokens[..5].iter().all(|token| token.kind == TokenKind::TypeName));
}

#[test]
fn test_tokenize_identifiers() {
    let tokens = tokenize("foo bar_1 _x printer".to_string(), None).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Identifier);
    assert_eq!(tokens[0].value, "foo");
    assert_eq!(tokens[1].value, "bar_1");
    assert_eq!(tokens[2].value, "_x");
    // Keywords only match whole words
    assert_eq!(tokens[3].kind, TokenKind::Identifier);
    assert_eq!(tokens[3].value, "printer");
}

#[test]
fn test_tokenize_numbers() {
    let tokens = tokenize("42 3.14 0".to_string(), None).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Number);
    assert_eq!(tokens[0].value, "42");
    assert_eq!(tokens[1].kind, TokenKind::Float);
    assert_eq!(tokens[1].value, "3.14");
    assert_eq!(tokens[2].kind, TokenKind::Number);
    assert_eq!(tokens[3].kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_string_escapes() {
    let tokens = tokenize(r#""hello\nworld" "say \"hi\"""#.to_string(), None).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].value, "hello\nworld");
    assert_eq!(tokens[1].kind, TokenKind::String);
    assert_eq!(tokens[1].value, "say \"hi\"");
}

#[test]
fn test_tokenize_chars() {
    let tokens = tokenize(r"'a' '\n'".to_string(), None).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Char);
    assert_eq!(tokens[0].value, "a");
    assert_eq!(tokens[1].kind, TokenKind::Char);
    assert_eq!(tokens[1].value, "\n");
}

#[test]
fn test_tokenize_operators() {
    assert_eq!(
        kinds("+ - * / == != < > <= >= = && || !"),
        vec![
            TokenKind::Plus,
            TokenKind::Dash,
            TokenKind::Star,
            TokenKind::Slash,
            TokenKind::Equals,
            TokenKind::NotEquals,
            TokenKind::Less,
            TokenKind::Greater,
            TokenKind::LessEquals,
            TokenKind::GreaterEquals,
            TokenKind::Assignment,
            TokenKind::And,
            TokenKind::Or,
            TokenKind::Not,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_comments_are_skipped() {
    assert_eq!(
        kinds("int x = 1; // trailing comment\nprint x;"),
        vec![
            TokenKind::TypeName,
            TokenKind::Identifier,
            TokenKind::Assignment,
            TokenKind::Number,
            TokenKind::Semicolon,
            TokenKind::Print,
            TokenKind::Identifier,
            TokenKind::Semicolon,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_tracks_lines() {
    let tokens = tokenize("int x = 1;\n\nprint x;".to_string(), None).unwrap();

    assert_eq!(tokens[0].line(), 1);
    let print = tokens.iter().find(|token| token.kind == TokenKind::Print).unwrap();
    assert_eq!(print.line(), 3);
}

#[test]
fn test_tokenize_unrecognised_token() {
    let error = tokenize("int x = 1;\nx = @;".to_string(), None).unwrap_err();

    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert_eq!(error.get_line(), 2);
}
