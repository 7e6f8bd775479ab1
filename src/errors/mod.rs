//! Error types and error handling for the compiler.
//!
//! This module defines the error types used throughout the compilation
//! process. It includes:
//!
//! - Error structures carrying the source line they were raised at
//! - Specific error variants for the lexer, parser, analyzer and lowering
//! - A diagnostics sink that accumulates recoverable errors
//! - Helpful error messages and suggestions

pub mod diagnostics;
pub mod errors;

#[cfg(test)]
mod tests;
