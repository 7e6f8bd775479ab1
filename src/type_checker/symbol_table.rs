use std::{collections::HashMap, fmt::Display};

use crate::{
    ast::types::PrimitiveType,
    errors::errors::{Error, ErrorImpl},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub symbol_type: PrimitiveType,
    pub line: u32,
}

#[derive(Debug, Default)]
pub struct Scope {
    pub symbols: HashMap<String, Symbol>,
}

impl Scope {
    pub fn new() -> Self {
        Scope {
            symbols: HashMap::new(),
        }
    }

    pub fn get_symbol(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }
}

/// Stack of lexical scopes plus the number of enclosing loops.
///
/// The global scope is pushed on construction. Every `enter_scope` must be
/// paired with an `exit_scope`, and every `enter_loop` with an `exit_loop`.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    loop_depth: u32,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![Scope::new()],
            loop_depth: 0,
        }
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(Scope::new());
    }

    /// Pops the innermost scope.
    ///
    /// # Panics
    ///
    /// Panics when there is no scope left to pop. Scope pushes and pops are
    /// paired by the analyzer, so this only happens on an internal bug.
    pub fn exit_scope(&mut self) {
        if self.scopes.pop().is_none() {
            panic!("exit_scope called with no active scope");
        }
    }

    pub fn enter_loop(&mut self) {
        self.loop_depth += 1;
    }

    pub fn exit_loop(&mut self) {
        self.loop_depth = self.loop_depth.saturating_sub(1);
    }

    pub fn is_inside_loop(&self) -> bool {
        self.loop_depth > 0
    }

    pub fn loop_depth(&self) -> u32 {
        self.loop_depth
    }

    pub fn scope_depth(&self) -> usize {
        self.scopes.len()
    }

    /// Declares `name` in the innermost scope. Outer scopes are not consulted,
    /// so shadowing an outer declaration is allowed.
    pub fn declare(
        &mut self,
        name: &str,
        symbol_type: PrimitiveType,
        line: u32,
    ) -> Result<(), Error> {
        let Some(scope) = self.scopes.last_mut() else {
            panic!("declare called with no active scope");
        };

        if scope.symbols.contains_key(name) {
            return Err(Error::new(
                ErrorImpl::VariableAlreadyDeclared {
                    variable: name.to_string(),
                },
                line,
            ));
        }

        scope.symbols.insert(
            name.to_string(),
            Symbol {
                name: name.to_string(),
                symbol_type,
                line,
            },
        );
        Ok(())
    }

    /// Searches from the innermost scope outwards.
    pub fn lookup(&self, name: &str, line: u32) -> Result<&Symbol, Error> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get_symbol(name))
            .ok_or_else(|| {
                Error::new(
                    ErrorImpl::VariableNotDeclared {
                        variable: name.to_string(),
                    },
                    line,
                )
            })
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.scopes
            .iter()
            .any(|scope| scope.get_symbol(name).is_some())
    }
}

impl Display for SymbolTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Symbol table (loop depth {}):", self.loop_depth)?;
        for (depth, scope) in self.scopes.iter().enumerate() {
            writeln!(f, "  scope {}:", depth)?;

            let mut symbols: Vec<&Symbol> = scope.symbols.values().collect();
            symbols.sort_by(|a, b| a.name.cmp(&b.name));
            for symbol in symbols {
                writeln!(
                    f,
                    "    {}: {} (line {})",
                    symbol.name, symbol.symbol_type, symbol.line
                )?;
            }
        }
        Ok(())
    }
}
