//! Main compiler module.
//!
//! This module contains the `Compiler` structure that lowers an analyzed
//! `Program` into a single entry function through a `Backend`.

use std::{collections::HashMap, time::Instant};

use tracing::debug;

use crate::{
    ast::ast::Program,
    errors::{
        diagnostics::Diagnostics,
        errors::{Error, ErrorImpl},
    },
};

use super::{
    backend::{Backend, Repr},
    runtime::runtime_functions,
    stmt::gen_statement,
};

/// Storage registered for a variable name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Binding<S> {
    pub slot: S,
    pub repr: Repr,
}

/// Storage behind `input bool`: the integer read by `scanf` and the
/// boolean the name is rebound to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoolInputSlots<S> {
    pub scratch: S,
    pub value: S,
}

/// Where `break` and `continue` jump to inside the innermost loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopTargets<K> {
    pub break_target: K,
    pub continue_target: K,
}

/// State of the lowering pass.
///
/// Bindings are flat for the whole entry function: a block does not scope
/// the storage of the variables declared inside it. The loop target stack
/// grows by one entry per enclosing `repeat`.
pub struct Compiler<B: Backend> {
    /// The backend receiving instructions
    pub backend: B,
    /// Variable name to its current storage
    bindings: HashMap<String, Binding<B::Slot>>,
    /// Slots reused by every `input bool` of the same name
    bool_inputs: HashMap<String, BoolInputSlots<B::Slot>>,
    loop_targets: Vec<LoopTargets<B::Block>>,
    diagnostics: Diagnostics,
}

impl<B: Backend> Compiler<B> {
    /// Creates a compiler and declares the runtime functions in `backend`.
    pub fn new(mut backend: B) -> Result<Self, Error> {
        for function in runtime_functions() {
            backend.declare_function(&function)?;
        }

        Ok(Compiler {
            backend,
            bindings: HashMap::new(),
            bool_inputs: HashMap::new(),
            loop_targets: Vec::new(),
            diagnostics: Diagnostics::new(),
        })
    }

    /// Lowers every top-level statement in order.
    pub fn lower_program(&mut self, program: &Program) {
        for statement in &program.statements {
            gen_statement(self, statement);
        }
    }

    /// Seals the entry function and hands back the backend with the
    /// diagnostics collected while lowering.
    pub fn finish(mut self) -> Result<(B, Diagnostics), Error> {
        self.backend.finish()?;
        Ok((self.backend, self.diagnostics))
    }

    pub fn binding(&self, name: &str) -> Option<Binding<B::Slot>> {
        self.bindings.get(name).copied()
    }

    pub fn bind(&mut self, name: &str, binding: Binding<B::Slot>) {
        self.bindings.insert(name.to_string(), binding);
    }

    /// Slot bound to `name` if it holds `repr`, otherwise a new one.
    pub fn slot_for(&mut self, name: &str, repr: Repr) -> Result<B::Slot, Error> {
        match self.binding(name) {
            Some(binding) if binding.repr == repr => Ok(binding.slot),
            _ => self.backend.alloca(repr, name),
        }
    }

    pub fn bool_input_slots(&self, name: &str) -> Option<BoolInputSlots<B::Slot>> {
        self.bool_inputs.get(name).copied()
    }

    pub fn set_bool_input_slots(&mut self, name: &str, slots: BoolInputSlots<B::Slot>) {
        self.bool_inputs.insert(name.to_string(), slots);
    }

    pub fn push_loop(&mut self, targets: LoopTargets<B::Block>) {
        self.loop_targets.push(targets);
    }

    pub fn pop_loop(&mut self) -> Option<LoopTargets<B::Block>> {
        self.loop_targets.pop()
    }

    pub fn innermost_loop(&self) -> Option<LoopTargets<B::Block>> {
        self.loop_targets.last().copied()
    }

    pub fn loop_depth(&self) -> usize {
        self.loop_targets.len()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn report(&mut self, error_impl: ErrorImpl, line: u32) {
        self.diagnostics.report(Error::new(error_impl, line));
    }

    pub fn report_error(&mut self, error: Error, line: u32) {
        self.diagnostics.report(error.at_line(line));
    }
}

/// Lowers an analyzed `program` into `backend`.
///
/// Recoverable lowering errors are returned in the `Diagnostics`. An `Err`
/// means the backend could not be prepared or sealed.
///
/// # Arguments
///
/// * `program` - The program, after a successful analysis
/// * `backend` - A backend positioned at the start of its entry block
pub fn compile<B: Backend>(program: &Program, backend: B) -> Result<(B, Diagnostics), Error> {
    let start = Instant::now();

    let mut compiler = Compiler::new(backend)?;
    compiler.lower_program(program);
    let (backend, diagnostics) = compiler.finish()?;

    debug!(
        statements = program.statements.len(),
        errors = diagnostics.error_count(),
        elapsed = ?start.elapsed(),
        "lowered program"
    );
    Ok((backend, diagnostics))
}
