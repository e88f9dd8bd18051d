//! Expression types and creation utilities.
//!
//! This module provides the expression IR every compiler pass operates on:
//! - `Expr` - the expression tree
//! - `Shape` - shape information for expressions
//! - `VarId` / `IdAlloc` - variable identity and fresh-id allocation
//! - Constant creation via `constant()` and related functions

pub mod constant;
pub mod expression;
pub mod shape;
pub mod variable;

pub use constant::{constant, constant_dmatrix, constant_sparse, constant_vec, ones, zeros, Array};
pub use expression::{AtomData, ConstantData, Expr, MultiplyData, ShapeConflict, VariableData};
pub use shape::Shape;
pub use variable::{scalar_variable, variable, IdAlloc, VarId};
