//! Utility macros for the compiler.
//!
//! This module defines helper macros used by the lexer and the lowering pass:
//!
//! - `MK_TOKEN!` - Creates a Token instance
//! - `MK_DEFAULT_HANDLER!` - Creates a default lexer handler for simple tokens
//! - `EMIT!` - Unwraps a backend result, reporting the error on failure

/// Creates a Token instance.
///
/// # Arguments
///
/// * `$kind` - The TokenKind
/// * `$value` - The token's string value
/// * `$span` - The source span
///
/// # Example
///
/// ```ignore
/// let token = MK_TOKEN!(TokenKind::Number, "42".to_string(), span);
/// ```
#[macro_export]
macro_rules! MK_TOKEN {
    ($kind:expr, $value:expr, $span:expr) => {
        Token {
            kind: $kind,
            value: $value,
            span: $span,
        }
    };
}

/// Creates a default lexer handler for fixed-text tokens.
///
/// The generated handler pushes a token with the given kind and moves the
/// lexer past the literal text.
///
/// # Example
///
/// ```ignore
/// RegexPattern::new("\\+", MK_DEFAULT_HANDLER!(TokenKind::Plus, "+"))
/// ```
#[macro_export]
macro_rules! MK_DEFAULT_HANDLER {
    ($kind:expr, $value:literal) => {
        |lexer: &mut Lexer, _matched: &str| {
            lexer.push_token($kind, String::from($value), $value);
        }
    };
}

/// Unwraps the `Result` of a backend call into an `Option`.
///
/// On failure the error is reported to the compiler's diagnostics at
/// `$line` and `None` is produced, so lowering can bail out of the current
/// node with `?`.
///
/// # Example
///
/// ```ignore
/// let value = EMIT!(compiler, compiler.backend.load(slot, repr, name), line)?;
/// ```
#[macro_export]
macro_rules! EMIT {
    ($compiler:expr, $result:expr, $line:expr) => {
        match $result {
            Ok(value) => Some(value),
            Err(error) => {
                $compiler.report_error(error, $line);
                None
            }
        }
    };
}
