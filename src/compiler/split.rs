//! Variable splitting: enforce objective separability.
//!
//! If two objective terms reference the same variable, every term but the
//! last gets a renamed copy `"{id}:{index}"` and a consensus equality
//! constraint ties each copy back to the original. The pass is a no-op on an
//! already-separable problem.

use std::collections::BTreeMap;

use crate::error::{CanonError, Result};
use crate::expr::{variable, Expr, VarId};
use crate::problem::{Constraint, Problem};

/// Split shared variables so that objective terms are separable.
pub fn split(problem: &Problem) -> Result<Problem> {
    let children = match &problem.objective {
        Expr::Add(children) => children,
        other => {
            return Err(CanonError::Internal(format!(
                "splitter requires a canonicalized sum objective, got `{}`",
                other
            )))
        }
    };

    let mut terms: Vec<Expr> = children.clone();
    let mut constraints = problem.constraints.clone();
    let mut shapes = problem.variable_shapes.clone();

    // Map each variable id to the ordered list of terms referencing it.
    // Sorted iteration keeps copy indices reproducible across runs.
    let mut references: BTreeMap<VarId, Vec<usize>> = BTreeMap::new();
    for (index, term) in terms.iter().enumerate() {
        for var in term.variables() {
            references.entry(var).or_default().push(index);
        }
    }

    for (var, indices) in &references {
        if indices.len() < 2 {
            continue;
        }
        let shape = shapes
            .get(var)
            .cloned()
            .ok_or_else(|| CanonError::Internal(format!("variable `{}` has no shape", var)))?;

        // The last referencing term keeps the original id; the rest, walked
        // in reverse, receive copies 0, 1, ...
        let copied = &indices[..indices.len() - 1];
        for (copy_index, &term_index) in copied.iter().rev().enumerate() {
            let copy = var.copy(copy_index);
            if shapes.contains_key(&copy) {
                return Err(CanonError::Internal(format!(
                    "derived copy id `{}` collides with an existing variable",
                    copy
                )));
            }
            let renamed = terms[term_index].rename_variable(var, &copy);
            terms[term_index] = renamed;
            constraints.push(Constraint::eq(
                variable(var.clone(), shape.clone()),
                variable(copy.clone(), shape.clone()),
            ));
            shapes.insert(copy, shape.clone());
        }
    }

    Problem::new(Expr::Add(terms), constraints)
}
