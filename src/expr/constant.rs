//! Constant tensor values and constant-expression constructors.

use nalgebra::DMatrix;
use nalgebra_sparse::CscMatrix;

use super::expression::{ConstantData, Expr};
use super::shape::Shape;

/// Tensor storage for constants (dense, sparse, or scalar).
#[derive(Debug, Clone)]
pub enum Array {
    /// Dense matrix storage.
    Dense(DMatrix<f64>),
    /// Sparse CSC matrix storage.
    Sparse(CscMatrix<f64>),
    /// Scalar value.
    Scalar(f64),
}

impl Array {
    /// Get the shape of the array.
    ///
    /// A dense or sparse single column reads as a vector; a single cell
    /// reads as a scalar.
    pub fn shape(&self) -> Shape {
        match self {
            Array::Dense(m) => matrix_shape(m.nrows(), m.ncols()),
            Array::Sparse(m) => matrix_shape(m.nrows(), m.ncols()),
            Array::Scalar(_) => Shape::scalar(),
        }
    }

    /// Get the total number of elements.
    pub fn size(&self) -> usize {
        match self {
            Array::Dense(m) => m.nrows() * m.ncols(),
            Array::Sparse(m) => m.nrows() * m.ncols(),
            Array::Scalar(_) => 1,
        }
    }

    /// Try to get as a scalar value.
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Array::Scalar(v) => Some(*v),
            Array::Dense(m) if m.nrows() == 1 && m.ncols() == 1 => Some(m[(0, 0)]),
            _ => None,
        }
    }

    /// Check if all elements are non-negative.
    pub fn is_nonneg(&self) -> bool {
        match self {
            Array::Scalar(v) => *v >= 0.0,
            Array::Dense(m) => m.iter().all(|&v| v >= 0.0),
            // Implicit zeros are non-negative.
            Array::Sparse(m) => m.values().iter().all(|&v| v >= 0.0),
        }
    }

    /// Create from a vector.
    pub fn from_vec(v: Vec<f64>) -> Self {
        let n = v.len();
        Array::Dense(DMatrix::from_vec(n, 1, v))
    }
}

fn matrix_shape(rows: usize, cols: usize) -> Shape {
    match (rows, cols) {
        (1, 1) => Shape::scalar(),
        (_, 1) => Shape::vector(rows),
        _ => Shape::matrix(rows, cols),
    }
}

impl From<f64> for Array {
    fn from(v: f64) -> Self {
        Array::Scalar(v)
    }
}

impl From<Vec<f64>> for Array {
    fn from(v: Vec<f64>) -> Self {
        Array::from_vec(v)
    }
}

impl From<DMatrix<f64>> for Array {
    fn from(m: DMatrix<f64>) -> Self {
        Array::Dense(m)
    }
}

impl From<CscMatrix<f64>> for Array {
    fn from(m: CscMatrix<f64>) -> Self {
        Array::Sparse(m)
    }
}

/// Create a constant expression from a scalar.
pub fn constant(value: f64) -> Expr {
    Expr::Constant(ConstantData {
        value: Array::Scalar(value),
    })
}

/// Create a constant expression from a vector.
pub fn constant_vec(values: Vec<f64>) -> Expr {
    Expr::Constant(ConstantData {
        value: Array::from_vec(values),
    })
}

/// Create a constant expression from a nalgebra DMatrix.
pub fn constant_dmatrix(matrix: DMatrix<f64>) -> Expr {
    Expr::Constant(ConstantData {
        value: Array::Dense(matrix),
    })
}

/// Create a constant expression from a sparse CSC matrix.
pub fn constant_sparse(matrix: CscMatrix<f64>) -> Expr {
    Expr::Constant(ConstantData {
        value: Array::Sparse(matrix),
    })
}

/// Create a zero constant with the given shape.
pub fn zeros(shape: impl Into<Shape>) -> Expr {
    let shape = shape.into();
    let value = if shape.is_scalar() {
        Array::Scalar(0.0)
    } else {
        Array::Dense(DMatrix::zeros(shape.rows(), shape.cols()))
    };
    Expr::Constant(ConstantData { value })
}

/// Create a ones constant with the given shape.
pub fn ones(shape: impl Into<Shape>) -> Expr {
    let shape = shape.into();
    let value = if shape.is_scalar() {
        Array::Scalar(1.0)
    } else {
        Array::Dense(DMatrix::from_element(shape.rows(), shape.cols(), 1.0))
    };
    Expr::Constant(ConstantData { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_scalar() {
        let arr = Array::Scalar(5.0);
        assert_eq!(arr.as_scalar(), Some(5.0));
        assert!(arr.is_nonneg());
    }

    #[test]
    fn test_array_from_vec() {
        let arr = Array::from_vec(vec![1.0, 2.0, 3.0]);
        assert_eq!(arr.shape(), Shape::vector(3));
        assert!(arr.is_nonneg());
    }

    #[test]
    fn test_single_cell_reads_as_scalar() {
        let arr = Array::Dense(DMatrix::from_element(1, 1, 2.0));
        assert_eq!(arr.shape(), Shape::scalar());
        assert_eq!(arr.as_scalar(), Some(2.0));
    }

    #[test]
    fn test_sparse_shape() {
        let coo = nalgebra_sparse::CooMatrix::try_from_triplets(
            3,
            4,
            vec![0, 2],
            vec![1, 3],
            vec![1.0, -2.0],
        )
        .unwrap();
        let arr = Array::Sparse(CscMatrix::from(&coo));
        assert_eq!(arr.shape(), Shape::matrix(3, 4));
        assert!(!arr.is_nonneg());
    }

    #[test]
    fn test_constant_constructors() {
        assert_eq!(constant(5.0).shape(), Shape::scalar());
        assert_eq!(constant_vec(vec![1.0, 2.0, 3.0]).shape(), Shape::vector(3));
        assert_eq!(zeros((3, 4)).shape(), Shape::matrix(3, 4));
        assert_eq!(ones(5).shape(), Shape::vector(5));
    }
}
