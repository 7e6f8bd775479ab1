use std::fmt::Display;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    internal_error: ErrorImpl,
    line: u32,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, line: u32) -> Self {
        Error {
            internal_error: error_impl,
            line,
        }
    }

    /// 1-based source line, or 0 when the construct carries no line.
    pub fn get_line(&self) -> u32 {
        self.line
    }

    /// Attaches `line` to an error raised without one.
    pub fn at_line(mut self, line: u32) -> Self {
        if self.line == 0 {
            self.line = line;
        }
        self
    }

    pub fn get_kind(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::VariableAlreadyDeclared { .. } => "VariableAlreadyDeclared",
            ErrorImpl::VariableNotDeclared { .. } => "VariableNotDeclared",
            ErrorImpl::DeclarationTypeMismatch { .. } => "DeclarationTypeMismatch",
            ErrorImpl::AssignmentTypeMismatch { .. } => "AssignmentTypeMismatch",
            ErrorImpl::OperandTypeMismatch { .. } => "OperandTypeMismatch",
            ErrorImpl::InvalidOperand { .. } => "InvalidOperand",
            ErrorImpl::NonBooleanCondition { .. } => "NonBooleanCondition",
            ErrorImpl::OutsideOfLoop { .. } => "OutsideOfLoop",
            ErrorImpl::UndefinedVariable { .. } => "UndefinedVariable",
            ErrorImpl::UnresolvedType { .. } => "UnresolvedType",
            ErrorImpl::StorageMismatch { .. } => "StorageMismatch",
            ErrorImpl::UnsupportedPrintType { .. } => "UnsupportedPrintType",
            ErrorImpl::UnsupportedInputType { .. } => "UnsupportedInputType",
            ErrorImpl::MissingLoopTarget { .. } => "MissingLoopTarget",
            ErrorImpl::UnknownBuiltin { .. } => "UnknownBuiltin",
            ErrorImpl::InvalidLiteral { .. } => "InvalidLiteral",
            ErrorImpl::BackendError { .. } => "BackendError",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => ErrorTip::None,
            ErrorImpl::UnexpectedToken { token } => ErrorTip::Suggestion(format!(
                "Unexpected token: `{}`, did you miss a semicolon?",
                token
            )),
            ErrorImpl::UnexpectedTokenDetailed { token, message } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`, {}", token, message))
            }
            ErrorImpl::NumberParseError { token } => ErrorTip::Suggestion(format!(
                "Invalid number: `{}`, is it above the integer limit?",
                token
            )),
            ErrorImpl::VariableAlreadyDeclared { variable } => ErrorTip::Suggestion(format!(
                "Variable `{}` already declared in this scope",
                variable
            )),
            ErrorImpl::VariableNotDeclared { variable } => {
                ErrorTip::Suggestion(format!("Variable `{}` not declared", variable))
            }
            ErrorImpl::DeclarationTypeMismatch {
                variable,
                expected,
                received,
            } => ErrorTip::Suggestion(format!(
                "`{}` is declared as `{}` but initialised with `{}`",
                variable, expected, received
            )),
            ErrorImpl::AssignmentTypeMismatch {
                variable,
                expected,
                received,
            } => ErrorTip::Suggestion(format!(
                "`{}` has type `{}`, cannot assign `{}`",
                variable, expected, received
            )),
            ErrorImpl::OperandTypeMismatch { left, right } => ErrorTip::Suggestion(format!(
                "Both operands must have the same type, found `{}` and `{}`",
                left, right
            )),
            ErrorImpl::InvalidOperand { operator, expected, received } => {
                ErrorTip::Suggestion(format!(
                    "`{}` expects {}, received `{}`",
                    operator, expected, received
                ))
            }
            ErrorImpl::NonBooleanCondition { construct, received } => ErrorTip::Suggestion(
                format!("Condition of `{}` must be `bool`, got `{}`", construct, received),
            ),
            ErrorImpl::OutsideOfLoop { keyword } => ErrorTip::Suggestion(format!(
                "`{}` can only appear inside a `repeat` body",
                keyword
            )),
            ErrorImpl::UndefinedVariable { variable } => ErrorTip::Suggestion(format!(
                "No storage was allocated for `{}`",
                variable
            )),
            ErrorImpl::UnresolvedType { variable } => ErrorTip::Suggestion(format!(
                "The type of `{}` was never resolved, was the program analyzed?",
                variable
            )),
            ErrorImpl::StorageMismatch {
                variable,
                expected,
                received,
            } => ErrorTip::Suggestion(format!(
                "`{}` is stored as `{}`, cannot store a `{}` value into it",
                variable, expected, received
            )),
            ErrorImpl::UnsupportedPrintType { repr } => {
                ErrorTip::Suggestion(format!("Values of representation `{}` cannot be printed", repr))
            }
            ErrorImpl::UnsupportedInputType { type_ } => {
                ErrorTip::Suggestion(format!("Values of type `{}` cannot be read", type_))
            }
            ErrorImpl::MissingLoopTarget { keyword } => ErrorTip::Suggestion(format!(
                "No enclosing loop to `{}` to",
                keyword
            )),
            ErrorImpl::UnknownBuiltin { function } => ErrorTip::Suggestion(format!(
                "Function `{}` is not declared in the target module",
                function
            )),
            ErrorImpl::InvalidLiteral { .. } => ErrorTip::None,
            ErrorImpl::BackendError { .. } => ErrorTip::None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.line == 0 {
            write!(f, "{}", self.internal_error)
        } else {
            write!(f, "line {}: {}", self.line, self.internal_error)
        }
    }
}

impl std::error::Error for Error {}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    // Lexing and parsing
    #[error("unrecognised token: {token:?}")]
    UnrecognisedToken { token: String },
    #[error("unexpected token: {token:?}")]
    UnexpectedToken { token: String },
    #[error("unexpected token ({message:?}): {token:?}")]
    UnexpectedTokenDetailed { token: String, message: String },
    #[error("error parsing number: {token:?}")]
    NumberParseError { token: String },

    // Scope errors
    #[error("variable {variable:?} already declared in this scope")]
    VariableAlreadyDeclared { variable: String },
    #[error("variable {variable:?} not declared")]
    VariableNotDeclared { variable: String },

    // Type errors
    #[error("type mismatch in declaration of {variable:?}: expected {expected}, got {received}")]
    DeclarationTypeMismatch {
        variable: String,
        expected: String,
        received: String,
    },
    #[error("type mismatch in assignment to {variable:?}: expected {expected}, got {received}")]
    AssignmentTypeMismatch {
        variable: String,
        expected: String,
        received: String,
    },
    #[error("type mismatch in binary expression: {left} vs {right}")]
    OperandTypeMismatch { left: String, right: String },
    #[error("operator {operator:?} requires {expected}, got {received}")]
    InvalidOperand {
        operator: String,
        expected: String,
        received: String,
    },
    #[error("condition in {construct} statement must be of type 'bool', got {received:?}")]
    NonBooleanCondition { construct: String, received: String },

    // Control-flow context errors
    #[error("{keyword:?} used outside of loop")]
    OutsideOfLoop { keyword: String },

    // Lowering errors
    #[error("undefined variable {variable:?}")]
    UndefinedVariable { variable: String },
    #[error("cannot determine type for {variable:?}")]
    UnresolvedType { variable: String },
    #[error("cannot store {received} into {variable:?}, which holds {expected}")]
    StorageMismatch {
        variable: String,
        expected: String,
        received: String,
    },
    #[error("unsupported type for printing: {repr}")]
    UnsupportedPrintType { repr: String },
    #[error("unsupported input type: {type_}")]
    UnsupportedInputType { type_: String },
    #[error("{keyword:?} has no enclosing loop target")]
    MissingLoopTarget { keyword: String },
    #[error("unknown built-in function: {function:?}")]
    UnknownBuiltin { function: String },
    #[error("invalid {kind} literal: {value:?}")]
    InvalidLiteral { kind: String, value: String },
    #[error("backend error: {message}")]
    BackendError { message: String },
}
