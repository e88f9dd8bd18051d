//! Atom kinds and constructor functions.
//!
//! Atoms are the named nonlinear building blocks of an objective. The set is
//! closed: every kind listed here is either resolvable through the proximal
//! template registry or rejected as a defined error, never a lookup miss.

use crate::expr::{AtomData, Expr};

/// The closed set of atom kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtomKind {
    /// L1 norm: `||x||_1`.
    NormL1,
    /// L2 norm: `||x||_2`.
    NormL2,
    /// Sum of column-group L2 norms of a matrix argument.
    NormL1L2,
    /// Sum of squared residuals; accepts one or more affine arguments.
    SumSquares,
    /// Sum of elementwise exponentials.
    Exp,
    /// Indicator of `e == 0` for an affine argument.
    LinearEquality,
}

impl AtomKind {
    /// Surface name of the atom.
    pub fn name(&self) -> &'static str {
        match self {
            AtomKind::NormL1 => "norm1",
            AtomKind::NormL2 => "norm2",
            AtomKind::NormL1L2 => "norm_l1_l2",
            AtomKind::SumSquares => "sum_squares",
            AtomKind::Exp => "exp",
            AtomKind::LinearEquality => "linear_equality",
        }
    }
}

/// L1 norm: `||x||_1 = sum(|x_i|)`.
pub fn norm1(x: Expr) -> Expr {
    Expr::Atom(AtomData::call(AtomKind::NormL1, vec![x]))
}

/// L2 norm: `||x||_2 = sqrt(sum(x_i^2))`.
pub fn norm2(x: Expr) -> Expr {
    Expr::Atom(AtomData::call(AtomKind::NormL2, vec![x]))
}

/// Combined L1/L2 norm of a matrix argument: the sum over columns of the
/// column's L2 norm (the isotropic total-variation / group-norm atom).
pub fn norm_l1_l2(x: Expr) -> Expr {
    Expr::Atom(AtomData::call(AtomKind::NormL1L2, vec![x]))
}

/// Sum of squared residuals: `sum_i ||r_i||_2^2`.
///
/// The multi-argument form is the least-squares template the canonicalizer
/// consolidates shared-variable quadratic terms into.
pub fn sum_squares(residuals: impl IntoIterator<Item = Expr>) -> Expr {
    Expr::Atom(AtomData::call(
        AtomKind::SumSquares,
        residuals.into_iter().collect(),
    ))
}

/// Sum of elementwise exponentials of the argument.
pub fn exp(x: Expr) -> Expr {
    Expr::Atom(AtomData::call(AtomKind::Exp, vec![x]))
}

/// Indicator of the affine equality `e == 0`.
///
/// Produced by the compiler when absorbing input constraints; available to
/// front-ends that already carry constraints in indicator form.
pub fn linear_equality(e: Expr) -> Expr {
    Expr::Atom(AtomData::call(AtomKind::LinearEquality, vec![e]))
}
