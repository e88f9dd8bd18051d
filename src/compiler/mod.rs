//! The compilation pipeline.
//!
//! `compile` sequences the three passes over an already-annotated problem:
//! canonicalize -> split -> validate. Any stage failure aborts the
//! compilation; a partially-built problem is never returned. The transform
//! is deterministic, so there is nothing to retry.

pub mod canonicalize;
pub mod split;
pub mod validate;

use log::debug;

use crate::error::{CanonError, Result};
use crate::problem::Problem;

pub use canonicalize::canonicalize;
pub use split::split;
pub use validate::{prox_operators, validate};

/// Options for one compilation.
#[derive(Debug, Clone)]
pub struct CompilerOptions {
    /// Maximum expression nesting depth accepted from the front-end.
    /// Deeper input fails with `NestingTooDeep` instead of overflowing.
    pub max_depth: usize,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        CompilerOptions { max_depth: 64 }
    }
}

/// Compile a problem with default options.
pub fn compile(problem: &Problem) -> Result<Problem> {
    compile_with(problem, &CompilerOptions::default())
}

/// Compile a problem: admission checks, then canonicalize, split, validate.
pub fn compile_with(problem: &Problem, options: &CompilerOptions) -> Result<Problem> {
    admit(problem, options)?;
    debug!("input:\n{}", problem);

    let canonical = canonicalize(problem)?;
    debug!("canonicalized:\n{}", canonical);

    let separable = split(&canonical)?;
    debug!("split:\n{}", separable);

    validate(&separable)?;
    Ok(separable)
}

/// Structural admission of front-end input: bounded nesting depth and
/// consistent variable shapes. Depth is measured iteratively, so arbitrarily
/// deep input is reported as an error rather than overflowing the stack in a
/// recursive pass.
fn admit(problem: &Problem, options: &CompilerOptions) -> Result<()> {
    let mut exprs = vec![&problem.objective];
    for c in &problem.constraints {
        exprs.push(&c.lhs);
        exprs.push(&c.rhs);
    }

    let mut shapes = std::collections::BTreeMap::new();
    for expr in exprs {
        let depth = expr.nesting_depth();
        if depth > options.max_depth {
            return Err(CanonError::NestingTooDeep {
                depth,
                limit: options.max_depth,
            });
        }
        expr.collect_variable_shapes(&mut shapes)
            .map_err(|c| CanonError::Structural(c.to_string()))?;
    }
    Ok(())
}
