//! The instruction-building surface the lowering pass talks to.
//!
//! Lowering never constructs IR itself. It asks a `Backend` for slots,
//! values, blocks and branches, so the same traversal drives the in-crate
//! CFG builder and the LLVM backend.

use std::fmt::{Debug, Display};

use crate::{ast::types::PrimitiveType, errors::errors::Error};

/// Machine-level representation of a value or storage slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Repr {
    I1,
    I8,
    I32,
    F32,
    F64,
    /// Byte pointer, used for strings.
    Ptr,
    /// Fixed-size byte buffer, used for string input.
    ByteArray(u32),
}

impl Repr {
    pub fn of(primitive: PrimitiveType) -> Repr {
        match primitive {
            PrimitiveType::Int => Repr::I32,
            PrimitiveType::Float => Repr::F32,
            PrimitiveType::Bool => Repr::I1,
            PrimitiveType::String => Repr::Ptr,
            PrimitiveType::Char => Repr::I8,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Repr::F32 | Repr::F64)
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Repr::I1 | Repr::I8 | Repr::I32)
    }
}

impl Display for Repr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Repr::I1 => write!(f, "i1"),
            Repr::I8 => write!(f, "i8"),
            Repr::I32 => write!(f, "i32"),
            Repr::F32 => write!(f, "float"),
            Repr::F64 => write!(f, "double"),
            Repr::Ptr => write!(f, "ptr"),
            Repr::ByteArray(size) => write!(f, "[{} x i8]", size),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarOp {
    Add,
    Sub,
    Mul,
    SDiv,
    FAdd,
    FSub,
    FMul,
    FDiv,
    And,
    Or,
}

impl ScalarOp {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            ScalarOp::Add => "add",
            ScalarOp::Sub => "sub",
            ScalarOp::Mul => "mul",
            ScalarOp::SDiv => "sdiv",
            ScalarOp::FAdd => "fadd",
            ScalarOp::FSub => "fsub",
            ScalarOp::FMul => "fmul",
            ScalarOp::FDiv => "fdiv",
            ScalarOp::And => "and",
            ScalarOp::Or => "or",
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(
            self,
            ScalarOp::FAdd | ScalarOp::FSub | ScalarOp::FMul | ScalarOp::FDiv
        )
    }
}

/// Comparison predicates. Integer ones are signed, float ones ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    Eq,
    Ne,
    Slt,
    Sgt,
    Sle,
    Sge,
    Oeq,
    One,
    Olt,
    Ogt,
    Ole,
    Oge,
}

impl Predicate {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Predicate::Eq => "icmp eq",
            Predicate::Ne => "icmp ne",
            Predicate::Slt => "icmp slt",
            Predicate::Sgt => "icmp sgt",
            Predicate::Sle => "icmp sle",
            Predicate::Sge => "icmp sge",
            Predicate::Oeq => "fcmp oeq",
            Predicate::One => "fcmp one",
            Predicate::Olt => "fcmp olt",
            Predicate::Ogt => "fcmp ogt",
            Predicate::Ole => "fcmp ole",
            Predicate::Oge => "fcmp oge",
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(
            self,
            Predicate::Oeq
                | Predicate::One
                | Predicate::Olt
                | Predicate::Ogt
                | Predicate::Ole
                | Predicate::Oge
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryScalarOp {
    Not,
    Neg,
    FNeg,
}

impl UnaryScalarOp {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            UnaryScalarOp::Not => "not",
            UnaryScalarOp::Neg => "neg",
            UnaryScalarOp::FNeg => "fneg",
        }
    }
}

/// Signature of a function provided outside the module, such as `printf`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalFunction {
    pub name: String,
    pub params: Vec<Repr>,
    /// `None` for functions returning void.
    pub returns: Option<Repr>,
    pub variadic: bool,
}

impl Display for ExternalFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut params: Vec<String> = self.params.iter().map(|param| param.to_string()).collect();
        if self.variadic {
            params.push(String::from("..."));
        }

        match self.returns {
            Some(repr) => write!(f, "declare {} @{}({})", repr, self.name, params.join(", ")),
            None => write!(f, "declare void @{}({})", self.name, params.join(", ")),
        }
    }
}

/// Instruction construction for a single entry function.
///
/// Implementations start positioned at the end of the entry block of a
/// function named `main` returning `i32`.
pub trait Backend {
    type Value: Copy + Debug;
    type Slot: Copy + Debug;
    type Block: Copy + Debug + PartialEq;

    fn const_int(&mut self, repr: Repr, value: i64) -> Result<Self::Value, Error>;
    fn const_float(&mut self, repr: Repr, value: f64) -> Result<Self::Value, Error>;
    /// A pointer to a NUL-terminated global holding `value`.
    fn const_string(&mut self, value: &str, name: &str) -> Result<Self::Value, Error>;
    fn repr_of(&self, value: Self::Value) -> Repr;

    fn alloca(&mut self, repr: Repr, name: &str) -> Result<Self::Slot, Error>;
    fn load(&mut self, slot: Self::Slot, repr: Repr, name: &str) -> Result<Self::Value, Error>;
    fn store(&mut self, slot: Self::Slot, value: Self::Value) -> Result<(), Error>;
    /// Byte pointer to the start of `slot`.
    fn address_of(&mut self, slot: Self::Slot, name: &str) -> Result<Self::Value, Error>;

    fn binary(
        &mut self,
        op: ScalarOp,
        lhs: Self::Value,
        rhs: Self::Value,
        name: &str,
    ) -> Result<Self::Value, Error>;
    fn compare(
        &mut self,
        predicate: Predicate,
        lhs: Self::Value,
        rhs: Self::Value,
        name: &str,
    ) -> Result<Self::Value, Error>;
    fn unary(&mut self, op: UnaryScalarOp, operand: Self::Value, name: &str) -> Result<Self::Value, Error>;
    /// Widens a float to double precision.
    fn extend_float(&mut self, value: Self::Value, name: &str) -> Result<Self::Value, Error>;
    /// Zero-extends an integer to `to`.
    fn extend_int(&mut self, value: Self::Value, to: Repr, name: &str) -> Result<Self::Value, Error>;

    fn append_block(&mut self, name: &str) -> Self::Block;
    fn position_at_end(&mut self, block: Self::Block);
    fn current_block(&self) -> Self::Block;
    fn is_terminated(&self, block: Self::Block) -> bool;
    fn branch(&mut self, target: Self::Block) -> Result<(), Error>;
    fn conditional_branch(
        &mut self,
        condition: Self::Value,
        then_block: Self::Block,
        else_block: Self::Block,
    ) -> Result<(), Error>;

    fn declare_function(&mut self, function: &ExternalFunction) -> Result<(), Error>;
    fn has_function(&self, name: &str) -> bool;
    /// Calls a declared function. Void functions yield `None`.
    fn call(
        &mut self,
        function: &str,
        args: &[Self::Value],
        name: &str,
    ) -> Result<Option<Self::Value>, Error>;

    /// Seals the entry function with `ret i32 0`.
    fn finish(&mut self) -> Result<(), Error>;

    /// `printf(format, value)`.
    fn formatted_output(&mut self, format: &str, value: Self::Value) -> Result<(), Error> {
        let format = self.const_string(format, "fmt")?;
        self.call(super::runtime::PRINTF, &[format, value], "printcall")
            .map(|_| ())
    }

    /// `scanf(format, target)` where `target` points at the storage to fill.
    fn formatted_input(&mut self, format: &str, target: Self::Value) -> Result<(), Error> {
        let format = self.const_string(format, "fmt")?;
        self.call(super::runtime::SCANF, &[format, target], "scancall")
            .map(|_| ())
    }
}
