//! Proximal-template registry.
//!
//! A closed mapping from atom identity and argument-shape pattern to a known
//! proximal-operator identifier. The table is exhaustively enumerated at
//! compile time and read-only: an atom/shape combination outside it is a
//! defined error case, never a runtime lookup miss.
//!
//! The identifiers themselves are owned by the external proximal-operator
//! library; this module tracks them but carries no solver numerics.

use std::fmt;

use crate::atoms::AtomKind;
use crate::expr::{Expr, Shape};

/// Identifier of a proximal operator known to the downstream solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxOp {
    /// Prox of the L1 norm (soft thresholding).
    NormL1,
    /// Prox of the L2 norm.
    NormL2,
    /// Prox of the sum of column-group L2 norms.
    NormL1L2,
    /// Joint prox of a sum of squared affine residuals.
    LeastSquares,
    /// Projection onto an affine equality set.
    LinearEquality,
    /// Prox of a sum of exponentials.
    Exp,
    /// Prox of a plain affine term (a shift).
    Affine,
    /// Projection onto the epigraph of the L1 norm.
    NormL1Epigraph,
    /// Projection onto the epigraph of the L2 norm.
    NormL2Epigraph,
    /// Projection onto the epigraph of the combined L1/L2 norm.
    NormL1L2Epigraph,
    /// Projection onto the epigraph of a sum of squares.
    LeastSquaresEpigraph,
    /// Projection onto the epigraph of a sum of exponentials.
    ExpEpigraph,
}

impl ProxOp {
    /// The string identifier exposed to the downstream solver.
    pub fn name(&self) -> &'static str {
        match self {
            ProxOp::NormL1 => "NormL1Prox",
            ProxOp::NormL2 => "NormL2Prox",
            ProxOp::NormL1L2 => "NormL1L2Prox",
            ProxOp::LeastSquares => "LeastSquaresProx",
            ProxOp::LinearEquality => "LinearEqualityProx",
            ProxOp::Exp => "ExpProx",
            ProxOp::Affine => "AffineProx",
            ProxOp::NormL1Epigraph => "NormL1EpigraphProx",
            ProxOp::NormL2Epigraph => "NormL2EpigraphProx",
            ProxOp::NormL1L2Epigraph => "NormL1L2EpigraphProx",
            ProxOp::LeastSquaresEpigraph => "LeastSquaresEpigraphProx",
            ProxOp::ExpEpigraph => "ExpEpigraphProx",
        }
    }
}

impl fmt::Display for ProxOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Argument-shape pattern of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgPattern {
    /// Exactly one argument of any shape.
    Any,
    /// Exactly one vector or scalar argument.
    Vector,
    /// Exactly one matrix argument.
    Matrix,
    /// One or more arguments of any shape.
    Many,
}

impl ArgPattern {
    /// Check the pattern against argument shapes.
    pub fn matches(&self, shapes: &[Shape]) -> bool {
        match self {
            ArgPattern::Any => shapes.len() == 1,
            ArgPattern::Vector => shapes.len() == 1 && !shapes[0].is_matrix(),
            ArgPattern::Matrix => shapes.len() == 1 && shapes[0].is_matrix(),
            ArgPattern::Many => !shapes.is_empty(),
        }
    }
}

/// One entry of the registry.
#[derive(Debug, Clone, Copy)]
pub struct ProxTemplate {
    /// The atom this template applies to.
    pub atom: AtomKind,
    /// Argument-shape pattern (excluding the epigraph bound).
    pub pattern: ArgPattern,
    /// Whether this is the epigraph-indicator form of the atom.
    pub epigraph: bool,
    /// Whether the prox accepts general affine arguments; when false the
    /// canonicalizer must reduce every argument to a plain variable.
    pub affine_args: bool,
    /// The proximal operator implementing the template.
    pub prox: ProxOp,
}

/// The registry. Populated once, read-only thereafter.
pub const TEMPLATES: &[ProxTemplate] = &[
    ProxTemplate {
        atom: AtomKind::NormL1,
        pattern: ArgPattern::Any,
        epigraph: false,
        affine_args: false,
        prox: ProxOp::NormL1,
    },
    ProxTemplate {
        atom: AtomKind::NormL2,
        pattern: ArgPattern::Vector,
        epigraph: false,
        affine_args: false,
        prox: ProxOp::NormL2,
    },
    ProxTemplate {
        atom: AtomKind::NormL1L2,
        pattern: ArgPattern::Matrix,
        epigraph: false,
        affine_args: false,
        prox: ProxOp::NormL1L2,
    },
    ProxTemplate {
        atom: AtomKind::SumSquares,
        pattern: ArgPattern::Many,
        epigraph: false,
        affine_args: true,
        prox: ProxOp::LeastSquares,
    },
    ProxTemplate {
        atom: AtomKind::Exp,
        pattern: ArgPattern::Any,
        epigraph: false,
        affine_args: false,
        prox: ProxOp::Exp,
    },
    ProxTemplate {
        atom: AtomKind::LinearEquality,
        pattern: ArgPattern::Any,
        epigraph: false,
        affine_args: true,
        prox: ProxOp::LinearEquality,
    },
    ProxTemplate {
        atom: AtomKind::NormL1,
        pattern: ArgPattern::Any,
        epigraph: true,
        affine_args: false,
        prox: ProxOp::NormL1Epigraph,
    },
    ProxTemplate {
        atom: AtomKind::NormL2,
        pattern: ArgPattern::Vector,
        epigraph: true,
        affine_args: false,
        prox: ProxOp::NormL2Epigraph,
    },
    ProxTemplate {
        atom: AtomKind::NormL1L2,
        pattern: ArgPattern::Matrix,
        epigraph: true,
        affine_args: false,
        prox: ProxOp::NormL1L2Epigraph,
    },
    ProxTemplate {
        atom: AtomKind::SumSquares,
        pattern: ArgPattern::Many,
        epigraph: true,
        affine_args: true,
        prox: ProxOp::LeastSquaresEpigraph,
    },
    ProxTemplate {
        atom: AtomKind::Exp,
        pattern: ArgPattern::Any,
        epigraph: true,
        affine_args: false,
        prox: ProxOp::ExpEpigraph,
    },
];

/// Look up the template for an atom applied to arguments of the given
/// shapes. For epigraph forms the final argument is the scalar bound and is
/// matched separately from the pattern.
pub fn lookup(atom: AtomKind, shapes: &[Shape], epigraph: bool) -> Option<&'static ProxTemplate> {
    let value_shapes = if epigraph {
        match shapes.split_last() {
            Some((bound, rest)) if bound.is_scalar() => rest,
            _ => return None,
        }
    } else {
        shapes
    };
    TEMPLATES
        .iter()
        .find(|t| t.atom == atom && t.epigraph == epigraph && t.pattern.matches(value_shapes))
}

/// Resolve one objective term to its proximal operator.
///
/// Peels at most one non-negative scalar `Multiply` wrapper, then matches
/// the remaining expression: a registered atom call with affine arguments,
/// or a plain affine expression (`AffineProx`). On failure the returned
/// string names the offense for the caller's error.
pub fn resolve_term(term: &Expr) -> std::result::Result<ProxOp, String> {
    let inner = peel_weight(term).map_or(term, |(_, e)| e);
    match inner {
        Expr::Atom(a) => {
            let shapes: Vec<Shape> = a.args.iter().map(Expr::shape).collect();
            let template = lookup(a.atom, &shapes, a.epigraph).ok_or_else(|| {
                format!(
                    "atom `{}` with argument shapes {} has no proximal template",
                    a.atom.name(),
                    render_shapes(&shapes)
                )
            })?;
            if let Some(bad) = a.args.iter().find(|e| e.contains_atom()) {
                return Err(format!(
                    "argument `{}` of `{}` contains a nested atom",
                    bad,
                    a.atom.name()
                ));
            }
            Ok(template.prox)
        }
        e if e.is_affine() => Ok(ProxOp::Affine),
        e => Err(format!("term `{}` is not in sum-of-prox form", e)),
    }
}

/// Split a term into its non-negative scalar weight and body, if wrapped.
pub fn peel_weight(term: &Expr) -> Option<(f64, &Expr)> {
    if let Expr::Multiply(m) = term {
        if let Some(v) = m.factor.constant_value().and_then(|a| a.as_scalar()) {
            if v >= 0.0 {
                return Some((v, &m.arg));
            }
        }
    }
    None
}

pub(crate) fn render_shapes(shapes: &[Shape]) -> String {
    let parts: Vec<String> = shapes.iter().map(Shape::to_string).collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::{norm1, norm2, norm_l1_l2, sum_squares};
    use crate::expr::{constant, variable};

    #[test]
    fn test_lookup_direct() {
        let t = lookup(AtomKind::NormL1, &[Shape::vector(10)], false).unwrap();
        assert_eq!(t.prox, ProxOp::NormL1);
        assert!(!t.affine_args);
    }

    #[test]
    fn test_lookup_shape_mismatch() {
        // norm2 of a matrix has no template
        assert!(lookup(AtomKind::NormL2, &[Shape::matrix(3, 4)], false).is_none());
        // norm_l1_l2 requires a matrix argument
        assert!(lookup(AtomKind::NormL1L2, &[Shape::vector(10)], false).is_none());
    }

    #[test]
    fn test_lookup_epigraph_requires_scalar_bound() {
        assert!(lookup(AtomKind::NormL2, &[Shape::vector(5), Shape::scalar()], true).is_some());
        assert!(lookup(AtomKind::NormL2, &[Shape::vector(5), Shape::vector(2)], true).is_none());
    }

    #[test]
    fn test_resolve_plain_atom() {
        let term = norm1(variable("x", 10));
        assert_eq!(resolve_term(&term), Ok(ProxOp::NormL1));
    }

    #[test]
    fn test_resolve_weighted_term() {
        let term = 2.5 * norm2(variable("x", 10));
        assert_eq!(resolve_term(&term), Ok(ProxOp::NormL2));
    }

    #[test]
    fn test_negative_weight_not_peeled() {
        let term = -1.0 * norm2(variable("x", 10));
        assert!(resolve_term(&term).is_err());
    }

    #[test]
    fn test_resolve_affine_term() {
        let term = 2.0 * variable("x", ()) + constant(1.0);
        assert_eq!(resolve_term(&term), Ok(ProxOp::Affine));
    }

    #[test]
    fn test_resolve_rejects_nested_atom_argument() {
        let term = norm2(norm1(variable("x", 10)));
        assert!(resolve_term(&term).is_err());
    }

    #[test]
    fn test_resolve_multi_arg_least_squares() {
        let b = crate::expr::constant_vec(vec![0.5; 10]);
        let term = sum_squares([variable("x", 10) - b, variable("y", 10)]);
        assert_eq!(resolve_term(&term), Ok(ProxOp::LeastSquares));
    }

    #[test]
    fn test_norm_l1_l2_matrix() {
        let term = norm_l1_l2(variable("z", (2, 9)));
        assert_eq!(resolve_term(&term), Ok(ProxOp::NormL1L2));
    }

    #[test]
    fn test_names() {
        assert_eq!(ProxOp::LeastSquares.name(), "LeastSquaresProx");
        assert_eq!(ProxOp::NormL2Epigraph.to_string(), "NormL2EpigraphProx");
    }
}
