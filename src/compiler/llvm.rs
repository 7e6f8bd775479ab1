//! LLVM backend built on inkwell.
//!
//! Only compiled with the `llvm` feature.

use std::path::Path;

use inkwell::{
    basic_block::BasicBlock,
    builder::{Builder, BuilderError},
    context::Context,
    module::{Linkage, Module},
    targets::{CodeModel, InitializationConfig, RelocMode, Target, TargetMachine},
    types::{AnyType, BasicMetadataTypeEnum, BasicType, BasicTypeEnum},
    values::{BasicMetadataValueEnum, BasicValueEnum, FloatValue, FunctionValue, IntValue, PointerValue},
    AddressSpace, FloatPredicate, IntPredicate, OptimizationLevel,
};

use crate::errors::errors::{Error, ErrorImpl};

use super::backend::{Backend, ExternalFunction, Predicate, Repr, ScalarOp, UnaryScalarOp};

fn backend_error(message: impl Into<String>) -> Error {
    Error::new(
        ErrorImpl::BackendError {
            message: message.into(),
        },
        0,
    )
}

fn builder_error(error: BuilderError) -> Error {
    backend_error(error.to_string())
}

/// Emits LLVM IR for a single `main` function into its own module.
pub struct LlvmBackend<'ctx> {
    context: &'ctx Context,
    module: Module<'ctx>,
    builder: Builder<'ctx>,
    function: FunctionValue<'ctx>,
    entry: BasicBlock<'ctx>,
    current: BasicBlock<'ctx>,
}

impl<'ctx> LlvmBackend<'ctx> {
    /// Creates the module, targets it at the host and positions the builder
    /// at the start of `main`.
    pub fn new(context: &'ctx Context, module_name: &str) -> Result<Self, Error> {
        let module = context.create_module(module_name);
        let builder = context.create_builder();

        Target::initialize_native(&InitializationConfig::default()).map_err(backend_error)?;
        let target_triple = TargetMachine::get_default_triple();
        let target = Target::from_triple(&target_triple).map_err(|error| backend_error(error.to_string()))?;
        let target_machine = target
            .create_target_machine(
                &target_triple,
                "generic",
                "",
                OptimizationLevel::None,
                RelocMode::PIC,
                CodeModel::Default,
            )
            .ok_or_else(|| backend_error("could not create a target machine for the host"))?;

        module.set_triple(&target_triple);
        module.set_data_layout(&target_machine.get_target_data().get_data_layout());

        let function = module.add_function("main", context.i32_type().fn_type(&[], false), None);
        let entry = context.append_basic_block(function, "entry");
        builder.position_at_end(entry);

        Ok(LlvmBackend {
            context,
            module,
            builder,
            function,
            entry,
            current: entry,
        })
    }

    pub fn module(&self) -> &Module<'ctx> {
        &self.module
    }

    pub fn verify(&self) -> Result<(), Error> {
        self.module
            .verify()
            .map_err(|message| backend_error(message.to_string()))
    }

    pub fn print_to_string(&self) -> String {
        self.module.print_to_string().to_string()
    }

    pub fn save_module_to_file(&self, output_file: &Path) -> Result<(), Error> {
        self.module
            .print_to_file(output_file)
            .map_err(|message| backend_error(message.to_string()))
    }

    fn basic_type(&self, repr: Repr) -> BasicTypeEnum<'ctx> {
        match repr {
            Repr::I1 => self.context.bool_type().into(),
            Repr::I8 => self.context.i8_type().into(),
            Repr::I32 => self.context.i32_type().into(),
            Repr::F32 => self.context.f32_type().into(),
            Repr::F64 => self.context.f64_type().into(),
            Repr::Ptr => self.context.i8_type().ptr_type(AddressSpace::default()).into(),
            Repr::ByteArray(size) => self.context.i8_type().array_type(size).into(),
        }
    }

    fn int_operand(&self, value: BasicValueEnum<'ctx>) -> Result<IntValue<'ctx>, Error> {
        match value {
            BasicValueEnum::IntValue(value) => Ok(value),
            other => Err(backend_error(format!("expected an integer operand, got {}", self.repr_of(other)))),
        }
    }

    fn float_operand(&self, value: BasicValueEnum<'ctx>) -> Result<FloatValue<'ctx>, Error> {
        match value {
            BasicValueEnum::FloatValue(value) => Ok(value),
            other => Err(backend_error(format!("expected a float operand, got {}", self.repr_of(other)))),
        }
    }
}

impl<'ctx> Backend for LlvmBackend<'ctx> {
    type Value = BasicValueEnum<'ctx>;
    type Slot = PointerValue<'ctx>;
    type Block = BasicBlock<'ctx>;

    fn const_int(&mut self, repr: Repr, value: i64) -> Result<Self::Value, Error> {
        match self.basic_type(repr) {
            BasicTypeEnum::IntType(int_type) => Ok(int_type.const_int(value as u64, true).into()),
            _ => Err(backend_error(format!("{} is not an integer representation", repr))),
        }
    }

    fn const_float(&mut self, repr: Repr, value: f64) -> Result<Self::Value, Error> {
        match self.basic_type(repr) {
            BasicTypeEnum::FloatType(float_type) => Ok(float_type.const_float(value).into()),
            _ => Err(backend_error(format!("{} is not a float representation", repr))),
        }
    }

    fn const_string(&mut self, value: &str, name: &str) -> Result<Self::Value, Error> {
        let global = self
            .builder
            .build_global_string_ptr(value, name)
            .map_err(builder_error)?;
        Ok(global.as_pointer_value().into())
    }

    fn repr_of(&self, value: Self::Value) -> Repr {
        match value {
            BasicValueEnum::IntValue(value) => match value.get_type().get_bit_width() {
                1 => Repr::I1,
                8 => Repr::I8,
                _ => Repr::I32,
            },
            BasicValueEnum::FloatValue(value) => {
                if value.get_type() == self.context.f64_type() {
                    Repr::F64
                } else {
                    Repr::F32
                }
            }
            BasicValueEnum::ArrayValue(value) => Repr::ByteArray(value.get_type().len()),
            _ => Repr::Ptr,
        }
    }

    fn alloca(&mut self, repr: Repr, name: &str) -> Result<Self::Slot, Error> {
        // Every slot is allocated once, at the top of the entry block
        let entry_builder = self.context.create_builder();
        match self.entry.get_first_instruction() {
            Some(first) => entry_builder.position_before(&first),
            None => entry_builder.position_at_end(self.entry),
        }

        entry_builder
            .build_alloca(self.basic_type(repr), name)
            .map_err(builder_error)
    }

    fn load(&mut self, slot: Self::Slot, _repr: Repr, name: &str) -> Result<Self::Value, Error> {
        // Typed pointers carry the pointee type
        self.builder.build_load(slot, name).map_err(builder_error)
    }

    fn store(&mut self, slot: Self::Slot, value: Self::Value) -> Result<(), Error> {
        let pointee = slot.get_type().get_element_type();
        if pointee != value.get_type().as_any_type_enum() {
            return Err(backend_error(format!(
                "cannot store {} into a slot of {}",
                self.repr_of(value),
                pointee.print_to_string().to_string()
            )));
        }

        self.builder
            .build_store(slot, value)
            .map(|_| ())
            .map_err(builder_error)
    }

    fn address_of(&mut self, slot: Self::Slot, name: &str) -> Result<Self::Value, Error> {
        let byte_ptr = self.context.i8_type().ptr_type(AddressSpace::default());
        self.builder
            .build_pointer_cast(slot, byte_ptr, name)
            .map(Into::into)
            .map_err(builder_error)
    }

    fn binary(
        &mut self,
        op: ScalarOp,
        lhs: Self::Value,
        rhs: Self::Value,
        name: &str,
    ) -> Result<Self::Value, Error> {
        if op.is_float() {
            let (lhs, rhs) = (self.float_operand(lhs)?, self.float_operand(rhs)?);
            let result = match op {
                ScalarOp::FAdd => self.builder.build_float_add(lhs, rhs, name),
                ScalarOp::FSub => self.builder.build_float_sub(lhs, rhs, name),
                ScalarOp::FMul => self.builder.build_float_mul(lhs, rhs, name),
                _ => self.builder.build_float_div(lhs, rhs, name),
            };
            return result.map(Into::into).map_err(builder_error);
        }

        let (lhs, rhs) = (self.int_operand(lhs)?, self.int_operand(rhs)?);
        let result = match op {
            ScalarOp::Add => self.builder.build_int_add(lhs, rhs, name),
            ScalarOp::Sub => self.builder.build_int_sub(lhs, rhs, name),
            ScalarOp::Mul => self.builder.build_int_mul(lhs, rhs, name),
            ScalarOp::SDiv => self.builder.build_int_signed_div(lhs, rhs, name),
            ScalarOp::And => self.builder.build_and(lhs, rhs, name),
            _ => self.builder.build_or(lhs, rhs, name),
        };
        result.map(Into::into).map_err(builder_error)
    }

    fn compare(
        &mut self,
        predicate: Predicate,
        lhs: Self::Value,
        rhs: Self::Value,
        name: &str,
    ) -> Result<Self::Value, Error> {
        if predicate.is_float() {
            let float_predicate = match predicate {
                Predicate::Oeq => FloatPredicate::OEQ,
                Predicate::One => FloatPredicate::ONE,
                Predicate::Olt => FloatPredicate::OLT,
                Predicate::Ogt => FloatPredicate::OGT,
                Predicate::Ole => FloatPredicate::OLE,
                _ => FloatPredicate::OGE,
            };
            let (lhs, rhs) = (self.float_operand(lhs)?, self.float_operand(rhs)?);
            return self
                .builder
                .build_float_compare(float_predicate, lhs, rhs, name)
                .map(Into::into)
                .map_err(builder_error);
        }

        let int_predicate = match predicate {
            Predicate::Eq => IntPredicate::EQ,
            Predicate::Ne => IntPredicate::NE,
            Predicate::Slt => IntPredicate::SLT,
            Predicate::Sgt => IntPredicate::SGT,
            Predicate::Sle => IntPredicate::SLE,
            _ => IntPredicate::SGE,
        };
        let (lhs, rhs) = (self.int_operand(lhs)?, self.int_operand(rhs)?);
        self.builder
            .build_int_compare(int_predicate, lhs, rhs, name)
            .map(Into::into)
            .map_err(builder_error)
    }

    fn unary(&mut self, op: UnaryScalarOp, operand: Self::Value, name: &str) -> Result<Self::Value, Error> {
        match op {
            UnaryScalarOp::Not => {
                let operand = self.int_operand(operand)?;
                self.builder.build_not(operand, name).map(Into::into)
            }
            UnaryScalarOp::Neg => {
                let operand = self.int_operand(operand)?;
                self.builder.build_int_neg(operand, name).map(Into::into)
            }
            UnaryScalarOp::FNeg => {
                let operand = self.float_operand(operand)?;
                self.builder.build_float_neg(operand, name).map(Into::into)
            }
        }
        .map_err(builder_error)
    }

    fn extend_float(&mut self, value: Self::Value, name: &str) -> Result<Self::Value, Error> {
        let value = self.float_operand(value)?;
        self.builder
            .build_float_ext(value, self.context.f64_type(), name)
            .map(Into::into)
            .map_err(builder_error)
    }

    fn extend_int(&mut self, value: Self::Value, to: Repr, name: &str) -> Result<Self::Value, Error> {
        let value = self.int_operand(value)?;
        let BasicTypeEnum::IntType(int_type) = self.basic_type(to) else {
            return Err(backend_error(format!("cannot extend an integer to {}", to)));
        };
        self.builder
            .build_int_z_extend(value, int_type, name)
            .map(Into::into)
            .map_err(builder_error)
    }

    fn append_block(&mut self, name: &str) -> Self::Block {
        self.context.append_basic_block(self.function, name)
    }

    fn position_at_end(&mut self, block: Self::Block) {
        self.builder.position_at_end(block);
        self.current = block;
    }

    fn current_block(&self) -> Self::Block {
        self.current
    }

    fn is_terminated(&self, block: Self::Block) -> bool {
        block.get_terminator().is_some()
    }

    fn branch(&mut self, target: Self::Block) -> Result<(), Error> {
        self.builder
            .build_unconditional_branch(target)
            .map(|_| ())
            .map_err(builder_error)
    }

    fn conditional_branch(
        &mut self,
        condition: Self::Value,
        then_block: Self::Block,
        else_block: Self::Block,
    ) -> Result<(), Error> {
        let condition = self.int_operand(condition)?;
        self.builder
            .build_conditional_branch(condition, then_block, else_block)
            .map(|_| ())
            .map_err(builder_error)
    }

    fn declare_function(&mut self, function: &ExternalFunction) -> Result<(), Error> {
        if self.has_function(&function.name) {
            return Ok(());
        }

        let params: Vec<BasicMetadataTypeEnum<'ctx>> = function
            .params
            .iter()
            .map(|param| self.basic_type(*param).into())
            .collect();
        let function_type = match function.returns {
            Some(repr) => self.basic_type(repr).fn_type(&params, function.variadic),
            None => self.context.void_type().fn_type(&params, function.variadic),
        };

        self.module
            .add_function(&function.name, function_type, Some(Linkage::External));
        Ok(())
    }

    fn has_function(&self, name: &str) -> bool {
        self.module.get_function(name).is_some()
    }

    fn call(
        &mut self,
        function: &str,
        args: &[Self::Value],
        name: &str,
    ) -> Result<Option<Self::Value>, Error> {
        let Some(callee) = self.module.get_function(function) else {
            return Err(Error::new(
                ErrorImpl::UnknownBuiltin {
                    function: function.to_string(),
                },
                0,
            ));
        };

        let args: Vec<BasicMetadataValueEnum<'ctx>> = args.iter().map(|arg| (*arg).into()).collect();
        let call = self
            .builder
            .build_call(callee, &args, name)
            .map_err(builder_error)?;
        Ok(call.try_as_basic_value().left())
    }

    fn finish(&mut self) -> Result<(), Error> {
        if self.is_terminated(self.current) {
            return Ok(());
        }
        self.builder
            .build_return(Some(&self.context.i32_type().const_zero()))
            .map(|_| ())
            .map_err(builder_error)
    }
}
