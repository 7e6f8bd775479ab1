use tracing::debug;

use crate::{
    ast::{
        ast::{BinaryOp, Node, NodeKind, Program, UnaryOp},
        types::{PrimitiveType, TypeTag},
    },
    errors::{
        diagnostics::Diagnostics,
        errors::{Error, ErrorImpl},
    },
};

use super::symbol_table::SymbolTable;

/// Semantic analysis state for a single program.
///
/// Recoverable problems are collected in `diagnostics` and analysis carries
/// on. Only a duplicate declaration aborts, through the `Err` channel.
#[derive(Debug, Default)]
pub struct TypeChecker {
    symbol_table: SymbolTable,
    diagnostics: Diagnostics,
}

impl TypeChecker {
    pub fn new() -> Self {
        TypeChecker {
            symbol_table: SymbolTable::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn symbol_table(&self) -> &SymbolTable {
        &self.symbol_table
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.error_count()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    pub fn report(&mut self, error_impl: ErrorImpl, line: u32) {
        self.diagnostics.report(Error::new(error_impl, line));
    }
}

/// Analyzes `program` in the global scope and caches the resolved type of
/// every identifier that could be looked up.
pub fn type_check(program: &mut Program) -> Result<TypeChecker, Error> {
    let mut type_checker = TypeChecker::new();

    for statement in program.statements.iter_mut() {
        type_check_node(&mut type_checker, statement)?;
    }

    debug!(
        statements = program.statements.len(),
        errors = type_checker.error_count(),
        "type checked program"
    );
    Ok(type_checker)
}

pub fn type_check_node(type_checker: &mut TypeChecker, node: &mut Node) -> Result<TypeTag, Error> {
    let line = node.line;

    match &mut node.kind {
        NodeKind::Literal { kind, .. } => Ok(kind.primitive().into()),
        NodeKind::Identifier { name, resolved } => {
            match type_checker.symbol_table.lookup(name, line) {
                Ok(symbol) => {
                    *resolved = Some(symbol.symbol_type);
                    Ok(symbol.symbol_type.into())
                }
                Err(error) => {
                    type_checker.diagnostics.report(error);
                    Ok(TypeTag::Error)
                }
            }
        }
        NodeKind::Declaration {
            declared_type,
            name,
            initializer,
        } => {
            let initializer_type = type_check_node(type_checker, initializer)?;

            if initializer_type != TypeTag::Error && !initializer_type.accepts_into(*declared_type) {
                type_checker.report(
                    ErrorImpl::DeclarationTypeMismatch {
                        variable: name.clone(),
                        expected: declared_type.to_string(),
                        received: initializer_type.to_string(),
                    },
                    line,
                );
            }

            // Declared even after a mismatch so later uses resolve
            type_checker.symbol_table.declare(name, *declared_type, line)?;
            Ok(TypeTag::Void)
        }
        NodeKind::Assignment { name, value } => {
            let declared_type = match type_checker.symbol_table.lookup(name, line) {
                Ok(symbol) => Some(symbol.symbol_type),
                Err(error) => {
                    type_checker.diagnostics.report(error);
                    None
                }
            };

            let value_type = type_check_node(type_checker, value)?;

            if let Some(declared_type) = declared_type {
                if value_type != TypeTag::Error && !value_type.accepts_into(declared_type) {
                    type_checker.report(
                        ErrorImpl::AssignmentTypeMismatch {
                            variable: name.clone(),
                            expected: declared_type.to_string(),
                            received: value_type.to_string(),
                        },
                        line,
                    );
                }
            }

            Ok(TypeTag::Void)
        }
        NodeKind::Input { name, .. } => {
            // The requested type only matters to lowering
            if !type_checker.symbol_table.is_declared(name) {
                type_checker
                    .symbol_table
                    .declare(name, PrimitiveType::Int, line)?;
            }
            Ok(TypeTag::Void)
        }
        NodeKind::Binary { op, left, right } => {
            let op = *op;
            let left_type = type_check_node(type_checker, left)?;
            let right_type = type_check_node(type_checker, right)?;

            Ok(type_check_binary(type_checker, op, left_type, right_type, line))
        }
        NodeKind::Unary { op, operand } => {
            let op = *op;
            let operand_type = type_check_node(type_checker, operand)?;

            Ok(type_check_unary(type_checker, op, operand_type, line))
        }
        NodeKind::Block { statements } => {
            type_checker.symbol_table.enter_scope();
            let result = type_check_statements(type_checker, statements);
            type_checker.symbol_table.exit_scope();

            result.map(|_| TypeTag::Void)
        }
        NodeKind::If {
            condition,
            then_block,
            else_block,
        } => {
            let condition_type = type_check_node(type_checker, condition)?;
            check_condition(type_checker, "if", condition_type, line);

            type_check_node(type_checker, then_block)?;
            if let Some(else_block) = else_block {
                type_check_node(type_checker, else_block)?;
            }
            Ok(TypeTag::Void)
        }
        NodeKind::Repeat { condition, body } => {
            let condition_type = type_check_node(type_checker, condition)?;
            check_condition(type_checker, "repeat", condition_type, line);

            type_checker.symbol_table.enter_loop();
            let result = type_check_node(type_checker, body);
            type_checker.symbol_table.exit_loop();

            result.map(|_| TypeTag::Void)
        }
        NodeKind::Break => {
            check_inside_loop(type_checker, "break", line);
            Ok(TypeTag::Void)
        }
        NodeKind::Continue => {
            check_inside_loop(type_checker, "continue", line);
            Ok(TypeTag::Void)
        }
        NodeKind::Print { expr } => {
            type_check_node(type_checker, expr)?;
            Ok(TypeTag::Void)
        }
        NodeKind::BuiltinCall { args, .. } => {
            for arg in args.iter_mut() {
                type_check_node(type_checker, arg)?;
            }
            Ok(TypeTag::Unknown)
        }
        NodeKind::Return { expr } => {
            let return_type = type_check_node(type_checker, expr)?;
            debug!(line, %return_type, "return statement");
            Ok(return_type)
        }
    }
}

fn type_check_statements(type_checker: &mut TypeChecker, statements: &mut [Node]) -> Result<(), Error> {
    for statement in statements.iter_mut() {
        type_check_node(type_checker, statement)?;
    }
    Ok(())
}

fn check_condition(type_checker: &mut TypeChecker, construct: &str, condition_type: TypeTag, line: u32) {
    if matches!(condition_type, TypeTag::Error | TypeTag::Unknown) || condition_type == TypeTag::BOOL {
        return;
    }

    type_checker.report(
        ErrorImpl::NonBooleanCondition {
            construct: construct.to_string(),
            received: condition_type.to_string(),
        },
        line,
    );
}

fn check_inside_loop(type_checker: &mut TypeChecker, keyword: &str, line: u32) {
    if !type_checker.symbol_table.is_inside_loop() {
        type_checker.report(
            ErrorImpl::OutsideOfLoop {
                keyword: keyword.to_string(),
            },
            line,
        );
    }
}

fn type_check_binary(
    type_checker: &mut TypeChecker,
    op: BinaryOp,
    left_type: TypeTag,
    right_type: TypeTag,
    line: u32,
) -> TypeTag {
    let common_type = match (left_type, right_type) {
        // Already reported further down the tree
        (TypeTag::Error, _) | (_, TypeTag::Error) => return TypeTag::Error,
        (TypeTag::Unknown, other) | (other, TypeTag::Unknown) => other,
        (left, right) if left == right => left,
        (left, right) => {
            type_checker.report(
                ErrorImpl::OperandTypeMismatch {
                    left: left.to_string(),
                    right: right.to_string(),
                },
                line,
            );
            return TypeTag::Error;
        }
    };

    if op.is_arithmetic() {
        if common_type.is_numeric() || common_type == TypeTag::Unknown {
            return common_type;
        }

        type_checker.report(
            ErrorImpl::InvalidOperand {
                operator: op.symbol().to_string(),
                expected: String::from("int or float"),
                received: common_type.to_string(),
            },
            line,
        );
        TypeTag::Error
    } else if op.is_comparison() {
        TypeTag::BOOL
    } else {
        if common_type != TypeTag::BOOL && common_type != TypeTag::Unknown {
            type_checker.report(
                ErrorImpl::InvalidOperand {
                    operator: op.symbol().to_string(),
                    expected: String::from("bool"),
                    received: common_type.to_string(),
                },
                line,
            );
        }
        TypeTag::BOOL
    }
}

fn type_check_unary(type_checker: &mut TypeChecker, op: UnaryOp, operand_type: TypeTag, line: u32) -> TypeTag {
    if matches!(operand_type, TypeTag::Error | TypeTag::Unknown) {
        return operand_type;
    }

    let (valid, expected) = match op {
        UnaryOp::Not => (operand_type == TypeTag::BOOL, "bool"),
        UnaryOp::Minus => (operand_type.is_numeric(), "int or float"),
    };

    if valid {
        return operand_type;
    }

    type_checker.report(
        ErrorImpl::InvalidOperand {
            operator: op.symbol().to_string(),
            expected: expected.to_string(),
            received: operand_type.to_string(),
        },
        line,
    );
    TypeTag::Error
}
