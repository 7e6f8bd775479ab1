//! Lowering of analyzed programs into a control flow graph.
//!
//! This module contains the structured control flow lowering and the
//! backends it drives:
//!
//! - `backend` - the `Backend` trait and machine representations
//! - `cfg` - the in-crate CFG builder with a textual dump
//! - `llvm` - LLVM IR through inkwell (with the `llvm` feature)
//! - `runtime` - the C functions used for `print` and `input`

pub mod backend;
pub mod cfg;
pub mod compiler;
pub mod expr;
#[cfg(feature = "llvm")]
pub mod llvm;
pub mod runtime;
pub mod stmt;

#[cfg(test)]
mod tests;
