//! # proxcanon
//!
//! A compiler from convex expression trees to the canonical form consumed by
//! proximal-operator / operator-splitting solvers: an objective that is a sum
//! of independently-solvable terms, each resolvable to a known
//! proximal-operator identifier, plus affine equality constraints linking
//! variables shared between terms.
//!
//! ## Quick start
//!
//! ```ignore
//! use proxcanon::prelude::*;
//!
//! // minimize ||x||_1  subject to  A x = b
//! let x = variable("x", 30);
//! let problem = Problem::new(
//!     norm1(x.clone()),
//!     vec![Constraint::eq(Expr::multiply(a, x), b)],
//! )?;
//!
//! let compiled = compile(&problem)?;
//! for op in compiled.proximal_operators()? {
//!     println!("{}", op); // NormL1Prox, LinearEqualityProx
//! }
//! ```
//!
//! ## Pipeline
//!
//! Compilation runs three passes over an already-annotated expression tree
//! (annotation is the front-end's job):
//!
//! - **Canonicalize** rewrites the objective into a sum of template-matching
//!   terms, removing composite structure by epigraph substitution and
//!   absorbing input constraints as linear-equality indicator terms.
//! - **Split** copies variables shared between terms and ties each copy to
//!   its original with a consensus equality, making the objective separable.
//! - **Validate** checks the sum-of-prox and constraint-affineness contract
//!   the downstream numeric solver assumes without re-checking.
//!
//! Each pass consumes a problem and builds a new one; trees are immutable
//! values and nothing is shared between passes. Compiling distinct problems
//! from different threads is safe: all state is per-compilation.

pub mod atoms;
pub mod compiler;
pub mod error;
pub mod expr;
pub mod problem;
pub mod registry;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use proxcanon::prelude::*;
/// ```
pub mod prelude {
    // Expression types
    pub use crate::expr::{
        constant, constant_dmatrix, constant_sparse, constant_vec, ones, scalar_variable,
        variable, zeros, Array, Expr, Shape, VarId,
    };

    // Atoms
    pub use crate::atoms::{exp, linear_equality, norm1, norm2, norm_l1_l2, sum_squares, AtomKind};

    // Problem
    pub use crate::problem::{Constraint, Problem};

    // Registry
    pub use crate::registry::ProxOp;

    // Compiler
    pub use crate::compiler::{compile, compile_with, CompilerOptions};

    // Errors
    pub use crate::error::{CanonError, Result};
}

// Re-export main types at crate root
pub use compiler::{compile, compile_with, CompilerOptions};
pub use error::{CanonError, Result};
pub use problem::{Constraint, Problem};
