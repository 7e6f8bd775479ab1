//! External C runtime functions used by `print` and `input`.

use crate::ast::types::PrimitiveType;

use super::backend::{ExternalFunction, Repr};

pub const PRINTF: &str = "printf";
pub const SCANF: &str = "scanf";

/// Size of the buffer a string `input` reads into.
pub const INPUT_BUFFER_SIZE: u32 = 256;

/// Functions declared in every module before lowering starts.
pub fn runtime_functions() -> Vec<ExternalFunction> {
    vec![
        // i32 printf(i8*, ...)
        ExternalFunction {
            name: String::from(PRINTF),
            params: vec![Repr::Ptr],
            returns: Some(Repr::I32),
            variadic: true,
        },
        // i32 scanf(i8*, ...)
        ExternalFunction {
            name: String::from(SCANF),
            params: vec![Repr::Ptr],
            returns: Some(Repr::I32),
            variadic: true,
        },
    ]
}

/// `printf` format for a value of `repr`, or `None` when it cannot be printed.
///
/// Floats are widened to double before the call, and booleans are printed
/// as integers.
pub fn print_format(repr: Repr) -> Option<&'static str> {
    match repr {
        Repr::I32 | Repr::I1 => Some("%d\n"),
        Repr::F32 | Repr::F64 => Some("%f\n"),
        Repr::Ptr => Some("%s\n"),
        Repr::I8 | Repr::ByteArray(_) => None,
    }
}

/// `scanf` format and the storage it reads into for an `input` of `requested`.
///
/// Booleans are read as an integer and converted afterwards.
pub fn input_format(requested: PrimitiveType) -> Option<(&'static str, Repr)> {
    match requested {
        PrimitiveType::Int | PrimitiveType::Bool => Some(("%d", Repr::I32)),
        PrimitiveType::Float => Some(("%f", Repr::F32)),
        PrimitiveType::String => Some(("%s", Repr::ByteArray(INPUT_BUFFER_SIZE))),
        PrimitiveType::Char => None,
    }
}
