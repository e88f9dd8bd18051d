//! Core expression types.
//!
//! The `Expr` enum is the tree every compiler pass operates on. Nodes are
//! immutable values with owned children: a pass never mutates a tree in
//! place, it builds and returns a new one. Variables are identified by
//! string id (`VarId`), so the same logical variable may appear in any
//! number of independent leaves.

use std::collections::BTreeMap;
use std::fmt;

use crate::atoms::AtomKind;

use super::constant::Array;
use super::shape::Shape;
use super::variable::VarId;

/// Data for a variable expression.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableData {
    /// Identity of the decision variable.
    pub id: VarId,
    /// Shape of the variable.
    pub shape: Shape,
}

/// Data for a constant expression.
#[derive(Debug, Clone)]
pub struct ConstantData {
    /// The constant value.
    pub value: Array,
}

impl ConstantData {
    /// Get the shape of the constant.
    pub fn shape(&self) -> Shape {
        self.value.shape()
    }
}

/// Data for a multiplication node: a constant factor applied to one child.
///
/// Scalar factors scale elementwise; matrix factors left-multiply.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiplyData {
    /// The factor (a constant expression by the input contract).
    pub factor: Box<Expr>,
    /// The expression being scaled.
    pub arg: Box<Expr>,
}

/// Data for a named atom call.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomData {
    /// Which atom this is.
    pub atom: AtomKind,
    /// Ordered arguments.
    pub args: Vec<Expr>,
    /// Optional attached affine sub-expression (front-end interop).
    pub affine: Option<Box<Expr>>,
    /// Optional attached regularization sub-expression (front-end interop).
    pub regularization: Option<Box<Expr>>,
    /// When set, this term is the epigraph indicator `atom(args[..n-1]) <=
    /// args[n-1]`; the last argument is the bounding variable.
    pub epigraph: bool,
}

impl AtomData {
    /// Plain atom call over the given arguments.
    pub fn call(atom: AtomKind, args: Vec<Expr>) -> Self {
        AtomData {
            atom,
            args,
            affine: None,
            regularization: None,
            epigraph: false,
        }
    }
}

/// The expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A constant tensor value.
    Constant(ConstantData),
    /// A decision variable leaf.
    Variable(VariableData),
    /// Sum of an ordered sequence of children.
    Add(Vec<Expr>),
    /// Constant factor applied to one child.
    Multiply(MultiplyData),
    /// A named atom call.
    Atom(AtomData),
}

impl Expr {
    /// Build a multiplication node.
    pub fn multiply(factor: Expr, arg: Expr) -> Expr {
        Expr::Multiply(MultiplyData {
            factor: Box::new(factor),
            arg: Box::new(arg),
        })
    }

    /// Get the shape of the expression.
    pub fn shape(&self) -> Shape {
        match self {
            Expr::Constant(c) => c.shape(),
            Expr::Variable(v) => v.shape.clone(),
            Expr::Add(children) => children
                .first()
                .map(Expr::shape)
                .unwrap_or_else(Shape::scalar),
            Expr::Multiply(m) => m
                .arg
                .shape()
                .scaled_by(&m.factor.shape())
                .unwrap_or_else(Shape::scalar),
            // Registered atoms are scalar-valued functionals.
            Expr::Atom(_) => Shape::scalar(),
        }
    }

    /// Check if this expression is a variable leaf.
    pub fn is_variable(&self) -> bool {
        matches!(self, Expr::Variable(_))
    }

    /// Get the variable id if this is a variable leaf.
    pub fn variable_id(&self) -> Option<&VarId> {
        match self {
            Expr::Variable(v) => Some(&v.id),
            _ => None,
        }
    }

    /// Get the constant value if this is a constant expression.
    pub fn constant_value(&self) -> Option<&Array> {
        match self {
            Expr::Constant(c) => Some(&c.value),
            _ => None,
        }
    }

    /// Check whether any atom call occurs in this expression.
    pub fn contains_atom(&self) -> bool {
        match self {
            Expr::Constant(_) | Expr::Variable(_) => false,
            Expr::Add(children) => children.iter().any(Expr::contains_atom),
            Expr::Multiply(m) => m.factor.contains_atom() || m.arg.contains_atom(),
            Expr::Atom(_) => true,
        }
    }

    /// Check whether this expression references no variables.
    pub fn is_constant_expr(&self) -> bool {
        match self {
            Expr::Constant(_) => true,
            Expr::Variable(_) => false,
            Expr::Add(children) => children.iter().all(Expr::is_constant_expr),
            Expr::Multiply(m) => m.factor.is_constant_expr() && m.arg.is_constant_expr(),
            Expr::Atom(_) => false,
        }
    }

    /// Check whether this expression is affine: built from constants,
    /// variables, sums, and constant-factor multiplications only.
    pub fn is_affine(&self) -> bool {
        match self {
            Expr::Constant(_) | Expr::Variable(_) => true,
            Expr::Add(children) => children.iter().all(Expr::is_affine),
            Expr::Multiply(m) => m.factor.is_constant_expr() && m.arg.is_affine(),
            Expr::Atom(_) => false,
        }
    }

    /// Collect all variable ids in this expression, sorted and deduplicated.
    ///
    /// Traversal includes atom arguments and the attached `affine` and
    /// `regularization` sub-fields.
    pub fn variables(&self) -> Vec<VarId> {
        let mut vars = Vec::new();
        self.collect_variables(&mut vars);
        vars.sort();
        vars.dedup();
        vars
    }

    fn collect_variables(&self, vars: &mut Vec<VarId>) {
        match self {
            Expr::Constant(_) => {}
            Expr::Variable(v) => vars.push(v.id.clone()),
            Expr::Add(children) => {
                for c in children {
                    c.collect_variables(vars);
                }
            }
            Expr::Multiply(m) => {
                m.factor.collect_variables(vars);
                m.arg.collect_variables(vars);
            }
            Expr::Atom(a) => {
                for arg in &a.args {
                    arg.collect_variables(vars);
                }
                if let Some(e) = &a.affine {
                    e.collect_variables(vars);
                }
                if let Some(e) = &a.regularization {
                    e.collect_variables(vars);
                }
            }
        }
    }

    /// Collect variable shapes, rejecting two leaves that disagree on the
    /// shape of one id.
    pub fn collect_variable_shapes(
        &self,
        shapes: &mut BTreeMap<VarId, Shape>,
    ) -> Result<(), ShapeConflict> {
        match self {
            Expr::Constant(_) => Ok(()),
            Expr::Variable(v) => match shapes.get(&v.id) {
                None => {
                    shapes.insert(v.id.clone(), v.shape.clone());
                    Ok(())
                }
                Some(existing) if *existing == v.shape => Ok(()),
                Some(existing) => Err(ShapeConflict {
                    id: v.id.clone(),
                    first: existing.clone(),
                    second: v.shape.clone(),
                }),
            },
            Expr::Add(children) => {
                for c in children {
                    c.collect_variable_shapes(shapes)?;
                }
                Ok(())
            }
            Expr::Multiply(m) => {
                m.factor.collect_variable_shapes(shapes)?;
                m.arg.collect_variable_shapes(shapes)
            }
            Expr::Atom(a) => {
                for arg in &a.args {
                    arg.collect_variable_shapes(shapes)?;
                }
                if let Some(e) = &a.affine {
                    e.collect_variable_shapes(shapes)?;
                }
                if let Some(e) = &a.regularization {
                    e.collect_variable_shapes(shapes)?;
                }
                Ok(())
            }
        }
    }

    /// Build a new tree with every occurrence of `old` renamed to `new`,
    /// including occurrences inside atom `affine`/`regularization` fields.
    pub fn rename_variable(&self, old: &VarId, new: &VarId) -> Expr {
        match self {
            Expr::Constant(_) => self.clone(),
            Expr::Variable(v) if v.id == *old => Expr::Variable(VariableData {
                id: new.clone(),
                shape: v.shape.clone(),
            }),
            Expr::Variable(_) => self.clone(),
            Expr::Add(children) => Expr::Add(
                children
                    .iter()
                    .map(|c| c.rename_variable(old, new))
                    .collect(),
            ),
            Expr::Multiply(m) => Expr::Multiply(MultiplyData {
                factor: Box::new(m.factor.rename_variable(old, new)),
                arg: Box::new(m.arg.rename_variable(old, new)),
            }),
            Expr::Atom(a) => Expr::Atom(AtomData {
                atom: a.atom,
                args: a
                    .args
                    .iter()
                    .map(|e| e.rename_variable(old, new))
                    .collect(),
                affine: a
                    .affine
                    .as_ref()
                    .map(|e| Box::new(e.rename_variable(old, new))),
                regularization: a
                    .regularization
                    .as_ref()
                    .map(|e| Box::new(e.rename_variable(old, new))),
                epigraph: a.epigraph,
            }),
        }
    }

    /// Maximum nesting depth of this tree, measured iteratively so that it
    /// is safe on arbitrarily deep input.
    pub fn nesting_depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack: Vec<(&Expr, usize)> = vec![(self, 1)];
        while let Some((node, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            match node {
                Expr::Constant(_) | Expr::Variable(_) => {}
                Expr::Add(children) => {
                    stack.extend(children.iter().map(|c| (c, depth + 1)));
                }
                Expr::Multiply(m) => {
                    stack.push((&m.factor, depth + 1));
                    stack.push((&m.arg, depth + 1));
                }
                Expr::Atom(a) => {
                    stack.extend(a.args.iter().map(|e| (e, depth + 1)));
                    if let Some(e) = &a.affine {
                        stack.push((e, depth + 1));
                    }
                    if let Some(e) = &a.regularization {
                        stack.push((e, depth + 1));
                    }
                }
            }
        }
        max_depth
    }
}

/// Two leaves disagreed on the shape of one variable id.
#[derive(Debug, Clone)]
pub struct ShapeConflict {
    /// The offending id.
    pub id: VarId,
    /// The shape seen first.
    pub first: Shape,
    /// The conflicting shape.
    pub second: Shape,
}

impl fmt::Display for ShapeConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "variable `{}` has conflicting shapes {} and {}",
            self.id, self.first, self.second
        )
    }
}

// Constants compare structurally on value; sparse and dense storage of the
// same numbers compare unequal, which is what structural identity wants.
impl PartialEq for ConstantData {
    fn eq(&self, other: &Self) -> bool {
        match (&self.value, &other.value) {
            (Array::Scalar(a), Array::Scalar(b)) => a == b,
            (Array::Dense(a), Array::Dense(b)) => a == b,
            (Array::Sparse(a), Array::Sparse(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Constant(c) => match c.value.as_scalar() {
                Some(v) => write!(f, "{}", v),
                None => write!(f, "const{}", c.shape()),
            },
            Expr::Variable(v) => write!(f, "var({})", v.id),
            Expr::Add(children) => {
                write!(f, "add(")?;
                for (i, c) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", c)?;
                }
                write!(f, ")")
            }
            Expr::Multiply(m) => write!(f, "mul({}, {})", m.factor, m.arg),
            Expr::Atom(a) => {
                write!(f, "{}", a.atom.name())?;
                if a.epigraph {
                    write!(f, "_epi")?;
                }
                write!(f, "(")?;
                for (i, arg) in a.args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                if let Some(e) = &a.affine {
                    write!(f, "; affine={}", e)?;
                }
                if let Some(e) = &a.regularization {
                    write!(f, "; reg={}", e)?;
                }
                write!(f, ")")
            }
        }
    }
}

// ============================================================================
// Operator sugar
// ============================================================================

impl std::ops::Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        Expr::Add(vec![self, rhs])
    }
}

impl std::ops::Sub for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        Expr::Add(vec![self, -rhs])
    }
}

impl std::ops::Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::multiply(crate::expr::constant(-1.0), self)
    }
}

impl std::ops::Mul<Expr> for f64 {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        Expr::multiply(crate::expr::constant(self), rhs)
    }
}
