#![allow(clippy::module_inception)]

use std::rc::Rc;

use crate::errors::errors::{Error, ErrorTip};

pub mod ast;
pub mod compiler;
pub mod errors;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod type_checker;

extern crate regex;

#[derive(Debug, Clone)]
pub struct Position {
    /// Byte offset into the source.
    pub offset: u32,
    /// 1-based line number.
    pub line: u32,
    pub file: Rc<String>,
}

impl Position {
    pub fn null() -> Self {
        Position {
            offset: 0,
            line: 0,
            file: Rc::new(String::from("<null>")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

/// Returns the text of the 1-based `line` in `source`, without its newline.
pub fn get_line(source: &str, line: u32) -> Option<&str> {
    if line == 0 {
        return None;
    }

    source
        .split('\n')
        .nth(line as usize - 1)
        .map(|text| text.trim_end_matches('\r'))
}

/// Renders an error together with the offending source line.
///
/// ```text
/// Error: DeclarationTypeMismatch (`x` is declared as `int` but initialised with `bool`)
/// -> main.fl
///    |
///  3 | int x = true;
///    |
/// line 3: type mismatch in declaration of "x": expected int, got bool
/// ```
pub fn display_error(error: &Error, source: &str, file: &str) -> String {
    let mut rendered = String::new();

    if let ErrorTip::None = error.get_tip() {
        rendered.push_str(&format!("Error: {}\n", error.get_error_name()));
    } else {
        rendered.push_str(&format!(
            "Error: {} ({})\n",
            error.get_error_name(),
            error.get_tip()
        ));
    }
    rendered.push_str(&format!("-> {}\n", file));

    if let Some(line_text) = get_line(source, error.get_line()) {
        let line_string = error.get_line().to_string();
        let padding = line_string.len() + 2;

        rendered.push_str(&format!("{:>padding$}\n", "|"));
        rendered.push_str(&format!("{} | {}\n", line_string, line_text.trim()));
        rendered.push_str(&format!("{:>padding$}\n", "|"));
    }

    rendered.push_str(&format!("{}\n", error));
    rendered
}
