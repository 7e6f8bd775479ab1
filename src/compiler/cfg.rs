//! Backend-agnostic control flow graph.
//!
//! `CfgBuilder` records the instructions lowering asks for into plain
//! basic blocks. The resulting `ControlFlowGraph` can be dumped as text or
//! inspected directly, which is how lowering is tested without LLVM.

use std::{collections::HashSet, fmt::Display};

use crate::errors::errors::{Error, ErrorImpl};

use super::backend::{
    Backend, ExternalFunction, Predicate, Repr, ScalarOp, UnaryScalarOp,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int { repr: Repr, value: i64 },
    Float { repr: Repr, value: f64 },
    String(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Const {
        result: ValueId,
        constant: Constant,
    },
    Alloca {
        slot: SlotId,
        repr: Repr,
    },
    Load {
        result: ValueId,
        slot: SlotId,
        repr: Repr,
    },
    Store {
        slot: SlotId,
        value: ValueId,
    },
    AddressOf {
        result: ValueId,
        slot: SlotId,
    },
    Binary {
        result: ValueId,
        op: ScalarOp,
        lhs: ValueId,
        rhs: ValueId,
    },
    Compare {
        result: ValueId,
        predicate: Predicate,
        lhs: ValueId,
        rhs: ValueId,
    },
    Unary {
        result: ValueId,
        op: UnaryScalarOp,
        operand: ValueId,
    },
    Extend {
        result: ValueId,
        value: ValueId,
        to: Repr,
    },
    Call {
        result: Option<ValueId>,
        function: String,
        args: Vec<ValueId>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Terminator {
    Branch(BlockId),
    CondBranch {
        condition: ValueId,
        then_block: BlockId,
        else_block: BlockId,
    },
    Return(ValueId),
}

impl Terminator {
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Terminator::Branch(target) => vec![*target],
            Terminator::CondBranch {
                then_block,
                else_block,
                ..
            } => vec![*then_block, *else_block],
            Terminator::Return(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    pub name: String,
    pub instructions: Vec<Instruction>,
    pub terminator: Option<Terminator>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StackSlot {
    pub name: String,
    pub repr: Repr,
}

/// The entry function as a list of basic blocks, the first being `entry`.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlFlowGraph {
    pub function: String,
    pub blocks: Vec<BasicBlock>,
    pub slots: Vec<StackSlot>,
    pub declarations: Vec<ExternalFunction>,
    values: Vec<Repr>,
}

impl ControlFlowGraph {
    pub fn entry(&self) -> BlockId {
        BlockId(0)
    }

    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.0]
    }

    /// First block called exactly `name`.
    pub fn block_named(&self, name: &str) -> Option<BlockId> {
        self.blocks
            .iter()
            .position(|block| block.name == name)
            .map(BlockId)
    }

    pub fn successors(&self, id: BlockId) -> Vec<BlockId> {
        self.block(id)
            .terminator
            .map(|terminator| terminator.successors())
            .unwrap_or_default()
    }

    /// Whether `to` can be reached from `from` by following terminators.
    pub fn reaches(&self, from: BlockId, to: BlockId) -> bool {
        let mut visited = HashSet::new();
        let mut pending = vec![from];

        while let Some(block) = pending.pop() {
            if block == to {
                return true;
            }
            if visited.insert(block) {
                pending.extend(self.successors(block));
            }
        }
        false
    }

    pub fn value_repr(&self, value: ValueId) -> Repr {
        self.values[value.0]
    }

    /// The constant that produced `value`, if any.
    pub fn constant(&self, value: ValueId) -> Option<&Constant> {
        self.blocks
            .iter()
            .flat_map(|block| block.instructions.iter())
            .find_map(|instruction| match instruction {
                Instruction::Const { result, constant } if *result == value => Some(constant),
                _ => None,
            })
    }

    /// Calls to `function` in `block`, as argument lists.
    pub fn calls_in(&self, block: BlockId, function: &str) -> Vec<Vec<ValueId>> {
        self.block(block)
            .instructions
            .iter()
            .filter_map(|instruction| match instruction {
                Instruction::Call {
                    function: callee,
                    args,
                    ..
                } if callee == function => Some(args.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn calls(&self, function: &str) -> Vec<Vec<ValueId>> {
        (0..self.blocks.len())
            .flat_map(|index| self.calls_in(BlockId(index), function))
            .collect()
    }

    pub fn slots_named(&self, name: &str) -> Vec<SlotId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.name == name)
            .map(|(index, _)| SlotId(index))
            .collect()
    }

    /// Values stored into `slot`, in program order.
    pub fn stores_to(&self, slot: SlotId) -> Vec<ValueId> {
        self.blocks
            .iter()
            .flat_map(|block| block.instructions.iter())
            .filter_map(|instruction| match instruction {
                Instruction::Store { slot: target, value } if *target == slot => Some(*value),
                _ => None,
            })
            .collect()
    }

    fn fmt_value(&self, value: ValueId) -> String {
        format!("%{}", value.0)
    }

    fn fmt_slot(&self, slot: SlotId) -> String {
        format!("%{}.{}", self.slots[slot.0].name, slot.0)
    }

    fn fmt_block(&self, block: BlockId) -> String {
        format!("%{}", self.blocks[block.0].name)
    }

    fn fmt_instruction(&self, instruction: &Instruction) -> String {
        match instruction {
            Instruction::Const { result, constant } => {
                let constant = match constant {
                    Constant::Int { repr, value } => format!("{} {}", repr, value),
                    Constant::Float { repr, value } => format!("{} {:?}", repr, value),
                    Constant::String(value) => format!("ptr c{:?}", value),
                };
                format!("{} = const {}", self.fmt_value(*result), constant)
            }
            Instruction::Alloca { slot, repr } => {
                format!("{} = alloca {}", self.fmt_slot(*slot), repr)
            }
            Instruction::Load { result, slot, repr } => format!(
                "{} = load {}, {}",
                self.fmt_value(*result),
                repr,
                self.fmt_slot(*slot)
            ),
            Instruction::Store { slot, value } => format!(
                "store {} {}, {}",
                self.value_repr(*value),
                self.fmt_value(*value),
                self.fmt_slot(*slot)
            ),
            Instruction::AddressOf { result, slot } => format!(
                "{} = addressof {}",
                self.fmt_value(*result),
                self.fmt_slot(*slot)
            ),
            Instruction::Binary {
                result,
                op,
                lhs,
                rhs,
            } => format!(
                "{} = {} {} {}, {}",
                self.fmt_value(*result),
                op.mnemonic(),
                self.value_repr(*lhs),
                self.fmt_value(*lhs),
                self.fmt_value(*rhs)
            ),
            Instruction::Compare {
                result,
                predicate,
                lhs,
                rhs,
            } => format!(
                "{} = {} {} {}, {}",
                self.fmt_value(*result),
                predicate.mnemonic(),
                self.value_repr(*lhs),
                self.fmt_value(*lhs),
                self.fmt_value(*rhs)
            ),
            Instruction::Unary {
                result,
                op,
                operand,
            } => format!(
                "{} = {} {} {}",
                self.fmt_value(*result),
                op.mnemonic(),
                self.value_repr(*operand),
                self.fmt_value(*operand)
            ),
            Instruction::Extend { result, value, to } => format!(
                "{} = ext {} {} to {}",
                self.fmt_value(*result),
                self.value_repr(*value),
                self.fmt_value(*value),
                to
            ),
            Instruction::Call {
                result,
                function,
                args,
            } => {
                let args: Vec<String> = args
                    .iter()
                    .map(|arg| format!("{} {}", self.value_repr(*arg), self.fmt_value(*arg)))
                    .collect();
                match result {
                    Some(result) => format!(
                        "{} = call @{}({})",
                        self.fmt_value(*result),
                        function,
                        args.join(", ")
                    ),
                    None => format!("call @{}({})", function, args.join(", ")),
                }
            }
        }
    }

    fn fmt_terminator(&self, terminator: &Terminator) -> String {
        match terminator {
            Terminator::Branch(target) => format!("br label {}", self.fmt_block(*target)),
            Terminator::CondBranch {
                condition,
                then_block,
                else_block,
            } => format!(
                "br i1 {}, label {}, label {}",
                self.fmt_value(*condition),
                self.fmt_block(*then_block),
                self.fmt_block(*else_block)
            ),
            Terminator::Return(value) => format!(
                "ret {} {}",
                self.value_repr(*value),
                self.fmt_value(*value)
            ),
        }
    }
}

impl Display for ControlFlowGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for declaration in &self.declarations {
            writeln!(f, "{}", declaration)?;
        }
        if !self.declarations.is_empty() {
            writeln!(f)?;
        }

        writeln!(f, "define i32 @{}() {{", self.function)?;
        for (index, block) in self.blocks.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{}:", block.name)?;
            for instruction in &block.instructions {
                writeln!(f, "  {}", self.fmt_instruction(instruction))?;
            }
            match &block.terminator {
                Some(terminator) => writeln!(f, "  {}", self.fmt_terminator(terminator))?,
                None => writeln!(f, "  <unterminated>")?,
            }
        }
        writeln!(f, "}}")
    }
}

fn backend_error(message: String) -> Error {
    Error::new(ErrorImpl::BackendError { message }, 0)
}

/// Records lowering output into a `ControlFlowGraph`.
#[derive(Debug)]
pub struct CfgBuilder {
    graph: ControlFlowGraph,
    current: BlockId,
}

impl Default for CfgBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CfgBuilder {
    pub fn new() -> Self {
        CfgBuilder {
            graph: ControlFlowGraph {
                function: String::from("main"),
                blocks: vec![BasicBlock {
                    name: String::from("entry"),
                    instructions: Vec::new(),
                    terminator: None,
                }],
                slots: Vec::new(),
                declarations: Vec::new(),
                values: Vec::new(),
            },
            current: BlockId(0),
        }
    }

    pub fn graph(&self) -> &ControlFlowGraph {
        &self.graph
    }

    pub fn into_graph(self) -> ControlFlowGraph {
        self.graph
    }

    fn new_value(&mut self, repr: Repr) -> ValueId {
        self.graph.values.push(repr);
        ValueId(self.graph.values.len() - 1)
    }

    fn push(&mut self, instruction: Instruction) -> Result<(), Error> {
        let block = &mut self.graph.blocks[self.current.0];
        if block.terminator.is_some() {
            return Err(backend_error(format!(
                "instruction appended to terminated block `{}`",
                block.name
            )));
        }
        block.instructions.push(instruction);
        Ok(())
    }

    fn terminate(&mut self, terminator: Terminator) -> Result<(), Error> {
        let block = &mut self.graph.blocks[self.current.0];
        if block.terminator.is_some() {
            return Err(backend_error(format!(
                "block `{}` already has a terminator",
                block.name
            )));
        }
        block.terminator = Some(terminator);
        Ok(())
    }

    fn unique_block_name(&self, name: &str) -> String {
        let taken = |candidate: &str| self.graph.blocks.iter().any(|block| block.name == candidate);
        if !taken(name) {
            return name.to_string();
        }

        let mut suffix = 1;
        while taken(&format!("{}{}", name, suffix)) {
            suffix += 1;
        }
        format!("{}{}", name, suffix)
    }

    fn check_slot_repr(&self, slot: SlotId, repr: Repr) -> Result<(), Error> {
        let StackSlot { name, repr: held } = &self.graph.slots[slot.0];
        if *held != repr {
            return Err(backend_error(format!(
                "slot `{}` holds {}, accessed as {}",
                name, held, repr
            )));
        }
        Ok(())
    }

    fn check_same_repr(&self, lhs: ValueId, rhs: ValueId) -> Result<Repr, Error> {
        let (left, right) = (self.graph.value_repr(lhs), self.graph.value_repr(rhs));
        if left != right {
            return Err(backend_error(format!(
                "operand representations differ: {} and {}",
                left, right
            )));
        }
        Ok(left)
    }
}

impl Backend for CfgBuilder {
    type Value = ValueId;
    type Slot = SlotId;
    type Block = BlockId;

    fn const_int(&mut self, repr: Repr, value: i64) -> Result<ValueId, Error> {
        if !repr.is_int() {
            return Err(backend_error(format!("{} is not an integer representation", repr)));
        }
        let result = self.new_value(repr);
        self.push(Instruction::Const {
            result,
            constant: Constant::Int { repr, value },
        })?;
        Ok(result)
    }

    fn const_float(&mut self, repr: Repr, value: f64) -> Result<ValueId, Error> {
        if !repr.is_float() {
            return Err(backend_error(format!("{} is not a float representation", repr)));
        }
        let result = self.new_value(repr);
        self.push(Instruction::Const {
            result,
            constant: Constant::Float { repr, value },
        })?;
        Ok(result)
    }

    fn const_string(&mut self, value: &str, _name: &str) -> Result<ValueId, Error> {
        let result = self.new_value(Repr::Ptr);
        self.push(Instruction::Const {
            result,
            constant: Constant::String(value.to_string()),
        })?;
        Ok(result)
    }

    fn repr_of(&self, value: ValueId) -> Repr {
        self.graph.value_repr(value)
    }

    fn alloca(&mut self, repr: Repr, name: &str) -> Result<SlotId, Error> {
        self.graph.slots.push(StackSlot {
            name: name.to_string(),
            repr,
        });
        let slot = SlotId(self.graph.slots.len() - 1);

        // Every slot is allocated once, at the top of the entry block
        let entry = &mut self.graph.blocks[0].instructions;
        let position = entry
            .iter()
            .position(|instruction| !matches!(instruction, Instruction::Alloca { .. }))
            .unwrap_or(entry.len());
        entry.insert(position, Instruction::Alloca { slot, repr });
        Ok(slot)
    }

    fn load(&mut self, slot: SlotId, repr: Repr, _name: &str) -> Result<ValueId, Error> {
        self.check_slot_repr(slot, repr)?;
        let result = self.new_value(repr);
        self.push(Instruction::Load { result, slot, repr })?;
        Ok(result)
    }

    fn store(&mut self, slot: SlotId, value: ValueId) -> Result<(), Error> {
        self.check_slot_repr(slot, self.graph.value_repr(value))?;
        self.push(Instruction::Store { slot, value })
    }

    fn address_of(&mut self, slot: SlotId, _name: &str) -> Result<ValueId, Error> {
        let result = self.new_value(Repr::Ptr);
        self.push(Instruction::AddressOf { result, slot })?;
        Ok(result)
    }

    fn binary(&mut self, op: ScalarOp, lhs: ValueId, rhs: ValueId, _name: &str) -> Result<ValueId, Error> {
        let repr = self.check_same_repr(lhs, rhs)?;
        if op.is_float() != repr.is_float() {
            return Err(backend_error(format!("`{}` applied to {}", op.mnemonic(), repr)));
        }

        let result = self.new_value(repr);
        self.push(Instruction::Binary {
            result,
            op,
            lhs,
            rhs,
        })?;
        Ok(result)
    }

    fn compare(
        &mut self,
        predicate: Predicate,
        lhs: ValueId,
        rhs: ValueId,
        _name: &str,
    ) -> Result<ValueId, Error> {
        let repr = self.check_same_repr(lhs, rhs)?;
        if predicate.is_float() != repr.is_float() {
            return Err(backend_error(format!(
                "`{}` applied to {}",
                predicate.mnemonic(),
                repr
            )));
        }

        let result = self.new_value(Repr::I1);
        self.push(Instruction::Compare {
            result,
            predicate,
            lhs,
            rhs,
        })?;
        Ok(result)
    }

    fn unary(&mut self, op: UnaryScalarOp, operand: ValueId, _name: &str) -> Result<ValueId, Error> {
        let repr = self.graph.value_repr(operand);
        let result = self.new_value(repr);
        self.push(Instruction::Unary { result, op, operand })?;
        Ok(result)
    }

    fn extend_float(&mut self, value: ValueId, _name: &str) -> Result<ValueId, Error> {
        let result = self.new_value(Repr::F64);
        self.push(Instruction::Extend {
            result,
            value,
            to: Repr::F64,
        })?;
        Ok(result)
    }

    fn extend_int(&mut self, value: ValueId, to: Repr, _name: &str) -> Result<ValueId, Error> {
        let result = self.new_value(to);
        self.push(Instruction::Extend { result, value, to })?;
        Ok(result)
    }

    fn append_block(&mut self, name: &str) -> BlockId {
        let name = self.unique_block_name(name);
        self.graph.blocks.push(BasicBlock {
            name,
            instructions: Vec::new(),
            terminator: None,
        });
        BlockId(self.graph.blocks.len() - 1)
    }

    fn position_at_end(&mut self, block: BlockId) {
        self.current = block;
    }

    fn current_block(&self) -> BlockId {
        self.current
    }

    fn is_terminated(&self, block: BlockId) -> bool {
        self.graph.blocks[block.0].terminator.is_some()
    }

    fn branch(&mut self, target: BlockId) -> Result<(), Error> {
        self.terminate(Terminator::Branch(target))
    }

    fn conditional_branch(
        &mut self,
        condition: ValueId,
        then_block: BlockId,
        else_block: BlockId,
    ) -> Result<(), Error> {
        if self.graph.value_repr(condition) != Repr::I1 {
            return Err(backend_error(format!(
                "branch condition must be i1, got {}",
                self.graph.value_repr(condition)
            )));
        }
        self.terminate(Terminator::CondBranch {
            condition,
            then_block,
            else_block,
        })
    }

    fn declare_function(&mut self, function: &ExternalFunction) -> Result<(), Error> {
        if !self.has_function(&function.name) {
            self.graph.declarations.push(function.clone());
        }
        Ok(())
    }

    fn has_function(&self, name: &str) -> bool {
        self.graph
            .declarations
            .iter()
            .any(|declaration| declaration.name == name)
    }

    fn call(&mut self, function: &str, args: &[ValueId], _name: &str) -> Result<Option<ValueId>, Error> {
        let Some((arity, variadic, returns)) = self
            .graph
            .declarations
            .iter()
            .find(|declaration| declaration.name == function)
            .map(|declaration| (declaration.params.len(), declaration.variadic, declaration.returns))
        else {
            return Err(Error::new(
                ErrorImpl::UnknownBuiltin {
                    function: function.to_string(),
                },
                0,
            ));
        };

        let arity_ok = if variadic {
            args.len() >= arity
        } else {
            args.len() == arity
        };
        if !arity_ok {
            return Err(backend_error(format!(
                "`{}` called with {} arguments",
                function,
                args.len()
            )));
        }

        let result = returns.map(|repr| self.new_value(repr));
        self.push(Instruction::Call {
            result,
            function: function.to_string(),
            args: args.to_vec(),
        })?;
        Ok(result)
    }

    fn finish(&mut self) -> Result<(), Error> {
        if self.is_terminated(self.current) {
            return Ok(());
        }
        let zero = self.const_int(Repr::I32, 0)?;
        self.terminate(Terminator::Return(zero))
    }
}
