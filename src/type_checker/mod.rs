//! Type checking and semantic analysis module.
//!
//! This module performs semantic analysis on the syntax tree:
//!
//! - Resolving identifiers through a stack of lexical scopes with shadowing
//! - Verifying type correctness of declarations, assignments and operators
//! - Tracking loop nesting so `break`/`continue` outside a loop are reported
//! - Caching the resolved type of each identifier for lowering
//!
//! Errors are collected and analysis continues. A duplicate declaration in
//! the same scope aborts the run.

pub mod symbol_table;
pub mod type_checker;
