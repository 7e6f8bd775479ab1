use tracing::debug;

use super::errors::Error;

/// Collects recoverable errors reported by a compilation phase.
///
/// Reporting never unwinds the traversal. Callers decide what to do with the
/// accumulated errors once the phase returns.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    errors: Vec<Error>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics { errors: vec![] }
    }

    pub fn report(&mut self, error: Error) {
        debug!(line = error.get_line(), name = error.get_error_name(), "{}", error);
        self.errors.push(error);
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// Names of the reported errors, in report order.
    pub fn error_names(&self) -> Vec<&str> {
        self.errors.iter().map(|error| error.get_error_name()).collect()
    }
}
