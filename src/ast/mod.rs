//! Abstract Syntax Tree (AST) definitions.
//!
//! The tree is a closed set of node kinds, each tagged with the source line it
//! came from. Children are uniquely owned, so the tree is acyclic by
//! construction. It contains:
//!
//! - Node and operator definitions
//! - Primitive types, literal kinds and the type tags produced by analysis

pub mod ast;
pub mod types;
