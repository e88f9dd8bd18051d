//! Canonicalization: rewrite an annotated problem into a sum of prox-ready
//! terms.
//!
//! The output objective is a top-level `Add` whose children, after peeling
//! at most one non-negative scalar `Multiply` wrapper, match a proximal
//! template. Composite structure is removed by epigraph substitution: an
//! atom nested inside another atom's argument is replaced by a fresh scalar
//! variable bounded by a new epigraph-indicator objective term. Traversal is
//! fixed left-to-right and auxiliary ids come from a per-compilation
//! allocator, so identical inputs canonicalize identically.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::atoms::linear_equality;
use crate::error::{CanonError, Result};
use crate::expr::{variable, AtomData, Expr, IdAlloc, Shape, VarId};
use crate::problem::{Constraint, Problem};
use crate::registry;

/// Canonicalize a problem.
pub fn canonicalize(problem: &Problem) -> Result<Problem> {
    let mut pass = Pass {
        alloc: IdAlloc::new(),
        shapes: problem.variable_shapes.clone(),
        terms: Vec::new(),
        constraints: Vec::new(),
    };

    let mut flat = Vec::new();
    flatten(&problem.objective, 1.0, &mut flat);
    for (weight, expr) in flat {
        pass.term(weight, expr)?;
    }
    pass.absorb_constraints(&problem.constraints)?;
    pass.consolidate_least_squares();

    Problem::new(Expr::Add(pass.terms), pass.constraints)
}

/// Per-compilation canonicalization state.
struct Pass {
    alloc: IdAlloc,
    shapes: BTreeMap<VarId, Shape>,
    terms: Vec<Expr>,
    constraints: Vec<Constraint>,
}

/// Flatten nested sums and non-negative scalar wrappers into weighted terms.
fn flatten(expr: &Expr, weight: f64, out: &mut Vec<(f64, Expr)>) {
    match expr {
        Expr::Add(children) => {
            for c in children {
                flatten(c, weight, out);
            }
        }
        Expr::Multiply(m) => {
            let scalar = m.factor.constant_value().and_then(|a| a.as_scalar());
            match scalar {
                Some(v) if v >= 0.0 => flatten(&m.arg, weight * v, out),
                _ => out.push((weight, expr.clone())),
            }
        }
        _ => out.push((weight, expr.clone())),
    }
}

impl Pass {
    /// Allocate a fresh variable of the given shape.
    fn fresh(&mut self, shape: Shape) -> VarId {
        let shapes = &self.shapes;
        let id = self.alloc.fresh(|id| shapes.contains_key(id));
        self.shapes.insert(id.clone(), shape);
        id
    }

    /// Canonicalize one weighted objective term.
    fn term(&mut self, weight: f64, expr: Expr) -> Result<()> {
        if !expr.contains_atom() {
            self.terms.push(apply_weight(weight, expr));
            return Ok(());
        }
        match expr {
            Expr::Atom(atom) => self.atom_term(weight, atom),
            other => Err(CanonError::Structural(format!(
                "term `{}` is not decomposable into proximal form",
                other
            ))),
        }
    }

    /// Canonicalize an atom-call term: purify arguments, match a template,
    /// and reduce arguments to variables where the template demands it.
    fn atom_term(&mut self, weight: f64, atom: AtomData) -> Result<()> {
        for field in [&atom.affine, &atom.regularization].into_iter().flatten() {
            if field.contains_atom() {
                return Err(CanonError::Structural(format!(
                    "attached sub-expression `{}` of `{}` is not affine",
                    field,
                    atom.atom.name()
                )));
            }
        }

        let mut args = Vec::with_capacity(atom.args.len());
        for arg in &atom.args {
            args.push(self.purify(arg)?);
        }

        let shapes: Vec<Shape> = args.iter().map(Expr::shape).collect();
        let template = registry::lookup(atom.atom, &shapes, atom.epigraph).ok_or_else(|| {
            CanonError::UnsupportedAtom {
                atom: atom.atom.name(),
                shapes: registry::render_shapes(&shapes),
            }
        })?;
        if !template.affine_args {
            for arg in &mut args {
                self.reduce_to_variable(arg);
            }
        }

        self.terms.push(apply_weight(
            weight,
            Expr::Atom(AtomData { args, ..atom }),
        ));
        Ok(())
    }

    /// Replace every atom nested inside `expr` with a fresh scalar variable
    /// bounded by a new epigraph-indicator term, returning the atom-free
    /// remainder. Substitution runs inner-first, so each step strictly
    /// reduces the residual composite depth.
    fn purify(&mut self, expr: &Expr) -> Result<Expr> {
        match expr {
            Expr::Constant(_) | Expr::Variable(_) => Ok(expr.clone()),
            Expr::Add(children) => {
                let mut out = Vec::with_capacity(children.len());
                for c in children {
                    out.push(self.purify(c)?);
                }
                Ok(Expr::Add(out))
            }
            Expr::Multiply(m) => {
                if m.factor.contains_atom() {
                    return Err(CanonError::Structural(format!(
                        "multiplication factor `{}` contains an atom",
                        m.factor
                    )));
                }
                Ok(Expr::multiply((*m.factor).clone(), self.purify(&m.arg)?))
            }
            Expr::Atom(inner) => {
                let mut args = Vec::with_capacity(inner.args.len());
                for arg in &inner.args {
                    args.push(self.purify(arg)?);
                }

                let mut shapes: Vec<Shape> = args.iter().map(Expr::shape).collect();
                shapes.push(Shape::scalar());
                let template =
                    registry::lookup(inner.atom, &shapes, true).ok_or_else(|| {
                        CanonError::UnsupportedAtom {
                            atom: inner.atom.name(),
                            shapes: registry::render_shapes(&shapes),
                        }
                    })?;
                if !template.affine_args {
                    for arg in &mut args {
                        self.reduce_to_variable(arg);
                    }
                }

                let bound = self.fresh(Shape::scalar());
                args.push(variable(bound.clone(), Shape::scalar()));
                self.terms.push(Expr::Atom(AtomData {
                    atom: inner.atom,
                    args,
                    affine: inner.affine.clone(),
                    regularization: inner.regularization.clone(),
                    epigraph: true,
                }));
                Ok(variable(bound, Shape::scalar()))
            }
        }
    }

    /// Replace a non-variable argument by a fresh copy variable linked by an
    /// equality constraint.
    fn reduce_to_variable(&mut self, arg: &mut Expr) {
        if arg.is_variable() {
            return;
        }
        let shape = arg.shape();
        let copy = self.fresh(shape.clone());
        let copy_var = variable(copy, shape);
        let original = std::mem::replace(arg, copy_var.clone());
        self.constraints.push(Constraint::eq(copy_var, original));
    }

    /// Absorb input equality constraints as linear-equality indicator terms.
    fn absorb_constraints(&mut self, constraints: &[Constraint]) -> Result<()> {
        for constraint in constraints {
            if !constraint.lhs.is_affine() || !constraint.rhs.is_affine() {
                return Err(CanonError::Structural(format!(
                    "constraint `{}` is not an equality of affine expressions",
                    constraint
                )));
            }
            self.terms.push(linear_equality(constraint.residual()));
        }
        Ok(())
    }

    /// Collapse sum-of-squares terms that share a variable into one
    /// multi-argument least-squares term. Weights fold into the residuals as
    /// `sqrt(w)` scalings, so `w * ||r||^2` joins a group as `||sqrt(w) r||^2`.
    fn consolidate_least_squares(&mut self) {
        let mut out: Vec<Expr> = Vec::with_capacity(self.terms.len());
        // Variable sets of the least-squares groups already in `out`,
        // keyed by their position there.
        let mut groups: Vec<(usize, BTreeSet<VarId>)> = Vec::new();

        for term in self.terms.drain(..) {
            let (weight, body) = match registry::peel_weight(&term) {
                Some((w, body)) => (w, body.clone()),
                None => (1.0, term.clone()),
            };
            let atom = match body {
                Expr::Atom(a) if a.atom == crate::atoms::AtomKind::SumSquares && !a.epigraph => a,
                _ => {
                    out.push(term);
                    continue;
                }
            };

            let args: Vec<Expr> = if (weight - 1.0).abs() < f64::EPSILON {
                atom.args
            } else {
                let scale = weight.sqrt();
                atom.args
                    .into_iter()
                    .map(|r| Expr::multiply(crate::expr::constant(scale), r))
                    .collect()
            };
            let vars: BTreeSet<VarId> = args
                .iter()
                .flat_map(|a| a.variables())
                .collect();

            match groups
                .iter_mut()
                .find(|(_, group_vars)| !group_vars.is_disjoint(&vars))
            {
                Some((pos, group_vars)) => {
                    if let Expr::Atom(existing) = &mut out[*pos] {
                        existing.args.extend(args);
                    }
                    group_vars.extend(vars);
                }
                None => {
                    out.push(Expr::Atom(AtomData::call(
                        crate::atoms::AtomKind::SumSquares,
                        args,
                    )));
                    groups.push((out.len() - 1, vars));
                }
            }
        }
        self.terms = out;
    }
}

fn apply_weight(weight: f64, expr: Expr) -> Expr {
    if (weight - 1.0).abs() < f64::EPSILON {
        expr
    } else {
        Expr::multiply(crate::expr::constant(weight), expr)
    }
}
