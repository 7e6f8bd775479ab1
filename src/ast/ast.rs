use std::fmt::Display;

use super::types::{LiteralKind, PrimitiveType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Neq,
    Lt,
    Gt,
    Leq,
    Geq,
    And,
    Or,
}

impl BinaryOp {
    pub fn is_arithmetic(&self) -> bool {
        matches!(self, BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div)
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Neq | BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Leq | BinaryOp::Geq
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "==",
            BinaryOp::Neq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Leq => "<=",
            BinaryOp::Geq => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Minus,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Not => "not",
            UnaryOp::Minus => "-",
        }
    }
}

/// A syntax tree node together with the source line it was parsed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Literal {
        kind: LiteralKind,
        value: String,
    },
    Identifier {
        name: String,
        /// Filled in by the analyzer once the name resolves.
        resolved: Option<PrimitiveType>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Node>,
    },
    Declaration {
        declared_type: PrimitiveType,
        name: String,
        initializer: Box<Node>,
    },
    Assignment {
        name: String,
        value: Box<Node>,
    },
    Print {
        expr: Box<Node>,
    },
    Input {
        requested_type: PrimitiveType,
        name: String,
    },
    Return {
        expr: Box<Node>,
    },
    If {
        condition: Box<Node>,
        then_block: Box<Node>,
        else_block: Option<Box<Node>>,
    },
    Repeat {
        condition: Box<Node>,
        body: Box<Node>,
    },
    Block {
        statements: Vec<Node>,
    },
    Break,
    Continue,
    BuiltinCall {
        name: String,
        args: Vec<Node>,
    },
}

impl Node {
    pub fn new(kind: NodeKind, line: u32) -> Self {
        Node { kind, line }
    }

    pub fn literal(kind: LiteralKind, value: impl Into<String>, line: u32) -> Self {
        Node::new(
            NodeKind::Literal {
                kind,
                value: value.into(),
            },
            line,
        )
    }

    pub fn int(value: i32, line: u32) -> Self {
        Node::literal(LiteralKind::Int, value.to_string(), line)
    }

    pub fn boolean(value: bool, line: u32) -> Self {
        Node::literal(LiteralKind::Bool, if value { "true" } else { "false" }, line)
    }

    pub fn identifier(name: impl Into<String>, line: u32) -> Self {
        Node::new(
            NodeKind::Identifier {
                name: name.into(),
                resolved: None,
            },
            line,
        )
    }

    pub fn binary(left: Node, op: BinaryOp, right: Node, line: u32) -> Self {
        Node::new(
            NodeKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            line,
        )
    }

    pub fn unary(op: UnaryOp, operand: Node, line: u32) -> Self {
        Node::new(
            NodeKind::Unary {
                op,
                operand: Box::new(operand),
            },
            line,
        )
    }

    pub fn declaration(
        declared_type: PrimitiveType,
        name: impl Into<String>,
        initializer: Node,
        line: u32,
    ) -> Self {
        Node::new(
            NodeKind::Declaration {
                declared_type,
                name: name.into(),
                initializer: Box::new(initializer),
            },
            line,
        )
    }

    pub fn assignment(name: impl Into<String>, value: Node, line: u32) -> Self {
        Node::new(
            NodeKind::Assignment {
                name: name.into(),
                value: Box::new(value),
            },
            line,
        )
    }

    pub fn print(expr: Node, line: u32) -> Self {
        Node::new(NodeKind::Print { expr: Box::new(expr) }, line)
    }

    pub fn input(requested_type: PrimitiveType, name: impl Into<String>, line: u32) -> Self {
        Node::new(
            NodeKind::Input {
                requested_type,
                name: name.into(),
            },
            line,
        )
    }

    pub fn ret(expr: Node, line: u32) -> Self {
        Node::new(NodeKind::Return { expr: Box::new(expr) }, line)
    }

    pub fn if_stmt(condition: Node, then_block: Node, else_block: Option<Node>, line: u32) -> Self {
        Node::new(
            NodeKind::If {
                condition: Box::new(condition),
                then_block: Box::new(then_block),
                else_block: else_block.map(Box::new),
            },
            line,
        )
    }

    pub fn repeat(condition: Node, body: Node, line: u32) -> Self {
        Node::new(
            NodeKind::Repeat {
                condition: Box::new(condition),
                body: Box::new(body),
            },
            line,
        )
    }

    pub fn block(statements: Vec<Node>, line: u32) -> Self {
        Node::new(NodeKind::Block { statements }, line)
    }

    pub fn brk(line: u32) -> Self {
        Node::new(NodeKind::Break, line)
    }

    pub fn cont(line: u32) -> Self {
        Node::new(NodeKind::Continue, line)
    }

    pub fn builtin_call(name: impl Into<String>, args: Vec<Node>, line: u32) -> Self {
        Node::new(
            NodeKind::BuiltinCall {
                name: name.into(),
                args,
            },
            line,
        )
    }
}

/// Root of the tree. Its statements live directly in the global scope.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Node>,
}

impl Program {
    pub fn new(statements: Vec<Node>) -> Self {
        Program { statements }
    }

    pub fn add_statement(&mut self, statement: Node) {
        self.statements.push(statement);
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            NodeKind::Literal { value, .. } => write!(f, "Literal({})", value),
            NodeKind::Identifier { name, .. } => write!(f, "Identifier({})", name),
            NodeKind::Binary { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            NodeKind::Unary { op, operand } => write!(f, "Unary({} {})", op.symbol(), operand),
            NodeKind::Declaration {
                declared_type,
                name,
                initializer,
            } => write!(f, "Declare({} {} = {})", declared_type, name, initializer),
            NodeKind::Assignment { name, value } => write!(f, "Assignment({} = {})", name, value),
            NodeKind::Print { expr } => write!(f, "Print({})", expr),
            NodeKind::Input {
                requested_type,
                name,
            } => write!(f, "Input({}, {})", requested_type, name),
            NodeKind::Return { expr } => write!(f, "Return({})", expr),
            NodeKind::If {
                condition,
                then_block,
                else_block,
            } => {
                write!(f, "If({}) Then {}", condition, then_block)?;
                if let Some(else_block) = else_block {
                    write!(f, " Else {}", else_block)?;
                }
                Ok(())
            }
            NodeKind::Repeat { condition, body } => write!(f, "Repeat({}) {}", condition, body),
            NodeKind::Block { statements } => {
                write!(f, "{{ ")?;
                for statement in statements {
                    write!(f, "{}; ", statement)?;
                }
                write!(f, "}}")
            }
            NodeKind::Break => write!(f, "Break"),
            NodeKind::Continue => write!(f, "Continue"),
            NodeKind::BuiltinCall { name, args } => {
                let args = args.iter().map(|arg| arg.to_string()).collect::<Vec<_>>();
                write!(f, "BuiltinCall({}({}))", name, args.join(", "))
            }
        }
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Program:")?;
        for statement in &self.statements {
            writeln!(f, "{}", statement)?;
        }
        Ok(())
    }
}
