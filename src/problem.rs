//! Problem and constraint types.
//!
//! A `Problem` is an objective expression plus affine equality constraints.
//! The compiler consumes one `Problem` and produces a new one at every pass;
//! nothing is mutated in place.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{CanonError, Result};
use crate::expr::{Expr, Shape, VarId};
use crate::registry::ProxOp;

/// Equality between two affine expressions: `lhs - rhs == 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Left-hand side.
    pub lhs: Expr,
    /// Right-hand side.
    pub rhs: Expr,
}

impl Constraint {
    /// Create an equality constraint `lhs == rhs`.
    pub fn eq(lhs: Expr, rhs: Expr) -> Self {
        Constraint { lhs, rhs }
    }

    /// The residual expression `lhs - rhs`.
    pub fn residual(&self) -> Expr {
        self.lhs.clone() - self.rhs.clone()
    }

    /// All variable ids referenced by either side, sorted and deduplicated.
    pub fn variables(&self) -> Vec<VarId> {
        let mut vars = self.lhs.variables();
        vars.extend(self.rhs.variables());
        vars.sort();
        vars.dedup();
        vars
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} == {}", self.lhs, self.rhs)
    }
}

/// An optimization problem in expression form.
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    /// The objective to minimize. After canonicalization this is a
    /// top-level `Add` of prox-ready terms.
    pub objective: Expr,
    /// Affine equality constraints.
    pub constraints: Vec<Constraint>,
    /// Shape of every variable id appearing in the problem.
    pub variable_shapes: BTreeMap<VarId, Shape>,
}

impl Problem {
    /// Create a problem, collecting variable shapes from the objective and
    /// constraints. Fails if two leaves disagree on the shape of one id.
    pub fn new(objective: Expr, constraints: Vec<Constraint>) -> Result<Self> {
        let mut shapes = BTreeMap::new();
        objective
            .collect_variable_shapes(&mut shapes)
            .map_err(|c| CanonError::Structural(c.to_string()))?;
        for constraint in &constraints {
            constraint
                .lhs
                .collect_variable_shapes(&mut shapes)
                .map_err(|c| CanonError::Structural(c.to_string()))?;
            constraint
                .rhs
                .collect_variable_shapes(&mut shapes)
                .map_err(|c| CanonError::Structural(c.to_string()))?;
        }
        Ok(Problem {
            objective,
            constraints,
            variable_shapes: shapes,
        })
    }

    /// Create an unconstrained minimization problem.
    pub fn minimize(objective: Expr) -> Result<Self> {
        Problem::new(objective, Vec::new())
    }

    /// The direct children of the objective `Add`, or the objective itself
    /// as a single term when it is not a sum.
    pub fn objective_terms(&self) -> &[Expr] {
        match &self.objective {
            Expr::Add(children) => children,
            other => std::slice::from_ref(other),
        }
    }

    /// All variable ids in the problem, sorted.
    pub fn variables(&self) -> Vec<VarId> {
        self.variable_shapes.keys().cloned().collect()
    }

    /// Resolve every objective term to its proximal operator id.
    ///
    /// This is the sum-of-prox face of the validator; it fails on a problem
    /// that has not been canonicalized.
    pub fn proximal_operators(&self) -> Result<Vec<ProxOp>> {
        crate::compiler::validate::prox_operators(self)
    }

    /// The variable ids of the original (pre-compilation) problem: copy
    /// suffixes collapse back to their source id and compiler-introduced
    /// variables are dropped.
    pub fn source_variable_ids(&self) -> Vec<VarId> {
        let mut ids: Vec<VarId> = self
            .variable_shapes
            .keys()
            .filter(|id| !id.is_synthetic())
            .map(|id| VarId::new(id.base()))
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "minimize")?;
        for term in self.objective_terms() {
            writeln!(f, "  {}", term)?;
        }
        if !self.constraints.is_empty() {
            writeln!(f, "subject to")?;
            for c in &self.constraints {
                writeln!(f, "  {}", c)?;
            }
        }
        Ok(())
    }
}
