use std::{fmt::Display, str::FromStr};

/// The surface types a variable can be declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Int,
    Float,
    Bool,
    String,
    Char,
}

impl PrimitiveType {
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveType::Int => "int",
            PrimitiveType::Float => "float",
            PrimitiveType::Bool => "bool",
            PrimitiveType::String => "string",
            PrimitiveType::Char => "char",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, PrimitiveType::Int | PrimitiveType::Float)
    }
}

impl Display for PrimitiveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for PrimitiveType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int" => Ok(PrimitiveType::Int),
            "float" => Ok(PrimitiveType::Float),
            "bool" => Ok(PrimitiveType::Bool),
            "string" => Ok(PrimitiveType::String),
            "char" => Ok(PrimitiveType::Char),
            _ => Err(format!("unknown type {}", s)),
        }
    }
}

/// Result of analysing a node.
///
/// Statements yield `Void`, builtin calls yield `Unknown`, and any node whose
/// type could not be established yields the `Error` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Primitive(PrimitiveType),
    Void,
    Unknown,
    Error,
}

impl TypeTag {
    pub const INT: TypeTag = TypeTag::Primitive(PrimitiveType::Int);
    pub const FLOAT: TypeTag = TypeTag::Primitive(PrimitiveType::Float);
    pub const BOOL: TypeTag = TypeTag::Primitive(PrimitiveType::Bool);
    pub const STRING: TypeTag = TypeTag::Primitive(PrimitiveType::String);
    pub const CHAR: TypeTag = TypeTag::Primitive(PrimitiveType::Char);

    pub fn is_numeric(&self) -> bool {
        matches!(self, TypeTag::Primitive(primitive) if primitive.is_numeric())
    }

    /// Whether a value of this type may stand where `expected` is required.
    ///
    /// `Unknown` is accepted everywhere since builtin results are not modelled.
    pub fn accepts_into(&self, expected: PrimitiveType) -> bool {
        match self {
            TypeTag::Primitive(primitive) => *primitive == expected,
            TypeTag::Unknown => true,
            TypeTag::Void | TypeTag::Error => false,
        }
    }
}

impl From<PrimitiveType> for TypeTag {
    fn from(value: PrimitiveType) -> Self {
        TypeTag::Primitive(value)
    }
}

impl Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeTag::Primitive(primitive) => write!(f, "{}", primitive),
            TypeTag::Void => write!(f, "void"),
            TypeTag::Unknown => write!(f, "unknown"),
            TypeTag::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    Int,
    Float,
    String,
    Char,
    Bool,
}

impl LiteralKind {
    pub fn primitive(&self) -> PrimitiveType {
        match self {
            LiteralKind::Int => PrimitiveType::Int,
            LiteralKind::Float => PrimitiveType::Float,
            LiteralKind::String => PrimitiveType::String,
            LiteralKind::Char => PrimitiveType::Char,
            LiteralKind::Bool => PrimitiveType::Bool,
        }
    }
}
