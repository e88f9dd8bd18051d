//! Variable identity and fresh-id allocation.
//!
//! Variables are identified by string id, not by node identity: the same id
//! may appear in many leaves of a tree and always denotes the same logical
//! decision variable. Two id families are derived by the compiler:
//!
//! - `"{id}:{index}"` — a consensus copy introduced by the splitter;
//! - `"canon.{n}"` — a fresh variable introduced by the canonicalizer
//!   (epigraph variables and argument copies).

use std::fmt;

use super::expression::{Expr, VariableData};
use super::shape::Shape;

/// Prefix reserved for canonicalizer-introduced variables.
const SYNTHETIC_PREFIX: &str = "canon.";

/// Identity of a decision variable.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(String);

impl VarId {
    /// Create an id from a string.
    pub fn new(id: impl Into<String>) -> Self {
        VarId(id.into())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derive the id of the `index`-th consensus copy of this variable.
    pub fn copy(&self, index: usize) -> VarId {
        VarId(format!("{}:{}", self.0, index))
    }

    /// The source id, collapsing one `":{index}"` copy suffix if present.
    pub fn base(&self) -> &str {
        match self.0.rsplit_once(':') {
            Some((base, suffix)) if suffix.chars().all(|c| c.is_ascii_digit()) => base,
            _ => &self.0,
        }
    }

    /// Check whether this id is a consensus copy of another variable.
    pub fn is_copy(&self) -> bool {
        self.base() != self.0
    }

    /// Check whether this id was introduced by the canonicalizer.
    pub fn is_synthetic(&self) -> bool {
        self.0.starts_with(SYNTHETIC_PREFIX)
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VarId({:?})", self.0)
    }
}

impl From<&str> for VarId {
    fn from(s: &str) -> Self {
        VarId::new(s)
    }
}

impl From<String> for VarId {
    fn from(s: String) -> Self {
        VarId::new(s)
    }
}

/// Per-compilation allocator of fresh variable ids.
///
/// Threaded through one compilation; concurrent compilations never share
/// state and identical inputs yield identical id sequences.
#[derive(Debug, Default)]
pub struct IdAlloc {
    next: u32,
}

impl IdAlloc {
    /// Create an allocator starting at index 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next fresh id, skipping any id `taken` reports as used.
    pub fn fresh(&mut self, mut taken: impl FnMut(&VarId) -> bool) -> VarId {
        loop {
            let id = VarId(format!("{}{}", SYNTHETIC_PREFIX, self.next));
            self.next += 1;
            if !taken(&id) {
                return id;
            }
        }
    }
}

/// Create a variable expression with the given id and shape.
pub fn variable(id: impl Into<VarId>, shape: impl Into<Shape>) -> Expr {
    Expr::Variable(VariableData {
        id: id.into(),
        shape: shape.into(),
    })
}

/// Create a scalar variable expression.
pub fn scalar_variable(id: impl Into<VarId>) -> Expr {
    variable(id, Shape::scalar())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_and_base() {
        let x = VarId::new("x");
        let c = x.copy(0);
        assert_eq!(c.as_str(), "x:0");
        assert_eq!(c.base(), "x");
        assert!(c.is_copy());
        assert!(!x.is_copy());
    }

    #[test]
    fn test_base_ignores_non_numeric_suffix() {
        let id = VarId::new("x:alpha");
        assert_eq!(id.base(), "x:alpha");
        assert!(!id.is_copy());
    }

    #[test]
    fn test_synthetic() {
        assert!(VarId::new("canon.3").is_synthetic());
        assert!(!VarId::new("x").is_synthetic());
        // Synthetic ids never collapse: the prefix uses '.', not ':'.
        assert_eq!(VarId::new("canon.3").base(), "canon.3");
    }

    #[test]
    fn test_alloc_sequence() {
        let mut alloc = IdAlloc::new();
        assert_eq!(alloc.fresh(|_| false).as_str(), "canon.0");
        assert_eq!(alloc.fresh(|_| false).as_str(), "canon.1");
    }

    #[test]
    fn test_alloc_skips_taken() {
        let mut alloc = IdAlloc::new();
        let id = alloc.fresh(|id| id.as_str() == "canon.0");
        assert_eq!(id.as_str(), "canon.1");
    }

    #[test]
    fn test_variable_constructor() {
        let x = variable("x", 5);
        assert_eq!(x.shape(), Shape::vector(5));
    }
}
