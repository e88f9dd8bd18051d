//! Structural validation of compiled problems.
//!
//! A pure check with no mutation: the objective must be a sum whose every
//! term resolves to a proximal operator through the registry, and every
//! constraint must be an equality of affine expressions. The downstream
//! solver assumes this contract without re-checking, so a failure here
//! always indicates an upstream defect.

use crate::error::{CanonError, Result};
use crate::expr::Expr;
use crate::problem::Problem;
use crate::registry::{self, ProxOp};

/// Check the sum-of-prox contract and return the proximal operator of each
/// objective term.
pub fn prox_operators(problem: &Problem) -> Result<Vec<ProxOp>> {
    let children = match &problem.objective {
        Expr::Add(children) => children,
        other => {
            return Err(CanonError::Validation(format!(
                "objective is not a sum of terms: `{}`",
                other
            )))
        }
    };
    children
        .iter()
        .enumerate()
        .map(|(index, term)| {
            registry::resolve_term(term)
                .map_err(|reason| CanonError::Validation(format!("objective term {}: {}", index, reason)))
        })
        .collect()
}

/// Validate a compiled problem.
pub fn validate(problem: &Problem) -> Result<()> {
    prox_operators(problem)?;
    for (index, constraint) in problem.constraints.iter().enumerate() {
        if !constraint.lhs.is_affine() || !constraint.rhs.is_affine() {
            return Err(CanonError::Validation(format!(
                "constraint {} `{}` is not an equality of affine expressions",
                index, constraint
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::{norm1, norm2, sum_squares};
    use crate::expr::{constant, constant_vec, variable};
    use crate::problem::Constraint;

    #[test]
    fn test_accepts_sum_of_prox() {
        let obj = Expr::Add(vec![
            norm1(variable("x", 5)),
            2.0 * sum_squares([variable("y", 5) - constant_vec(vec![1.0; 5])]),
        ]);
        let p = Problem::minimize(obj).unwrap();
        assert!(validate(&p).is_ok());
        assert_eq!(
            prox_operators(&p).unwrap(),
            vec![ProxOp::NormL1, ProxOp::LeastSquares]
        );
    }

    #[test]
    fn test_rejects_non_sum_objective() {
        let p = Problem::minimize(norm1(variable("x", 5))).unwrap();
        assert!(matches!(
            validate(&p).unwrap_err(),
            CanonError::Validation(_)
        ));
    }

    #[test]
    fn test_rejects_nested_atom_term() {
        let obj = Expr::Add(vec![norm2(norm1(variable("x", 5)))]);
        let p = Problem::minimize(obj).unwrap();
        let err = validate(&p).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("term 0"), "error names the term: {}", msg);
    }

    #[test]
    fn test_rejects_nonaffine_constraint() {
        let p = Problem::new(
            Expr::Add(vec![norm1(variable("x", 5))]),
            vec![Constraint::eq(norm2(variable("x", 5)), constant(1.0))],
        )
        .unwrap();
        let err = validate(&p).unwrap_err();
        assert!(err.to_string().contains("constraint 0"));
    }

    #[test]
    fn test_no_mutation() {
        let obj = Expr::Add(vec![norm1(variable("x", 5))]);
        let p = Problem::minimize(obj).unwrap();
        let before = p.clone();
        let _ = validate(&p);
        assert_eq!(p, before);
    }
}
