//! Parser module for building the syntax tree.
//!
//! This module contains the parser that transforms a stream of tokens
//! into a `Program`. It uses a Pratt parser for expressions
//! with proper operator precedence and handles:
//!
//! - Statement parsing (declarations, assignments, print/input, control flow)
//! - Expression parsing (binary and unary operators, builtin calls, literals)
//!
//! The parser uses NUD (null denotation) and LED (left denotation) functions
//! for expression parsing with binding power for precedence handling.

pub mod expr;
pub mod lookups;
pub mod parser;
pub mod stmt;
