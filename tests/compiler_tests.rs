//! Conformance tests for the full compile pipeline.
//!
//! Each scenario is a classic problem family: basis pursuit, least absolute
//! deviations, total-variation smoothing, and the composite nesting
//! boundary case.

use nalgebra::DMatrix;
use nalgebra_sparse::{CooMatrix, CscMatrix};

use proxcanon::prelude::*;

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Deterministic dense test matrix.
fn dense(rows: usize, cols: usize, seed: u64) -> DMatrix<f64> {
    DMatrix::from_fn(rows, cols, |i, j| {
        let v = (i as u64)
            .wrapping_mul(31)
            .wrapping_add((j as u64).wrapping_mul(17))
            .wrapping_add(seed);
        ((v % 13) as f64) - 6.0
    })
}

/// Forward-difference operator as a sparse (n-1) x n matrix.
fn difference(n: usize) -> CscMatrix<f64> {
    let mut coo = CooMatrix::new(n - 1, n);
    for i in 0..n - 1 {
        coo.push(i, i, -1.0);
        coo.push(i, i + 1, 1.0);
    }
    CscMatrix::from(&coo)
}

fn prox_names(problem: &Problem) -> Vec<&'static str> {
    problem
        .proximal_operators()
        .expect("compiled problem must be in sum-of-prox form")
        .into_iter()
        .map(|op| op.name())
        .collect()
}

fn sorted(mut names: Vec<&'static str>) -> Vec<&'static str> {
    names.sort();
    names
}

// ============================================================================
// Scenario A: a single norm term
// ============================================================================

#[test]
fn test_l1_objective_compiles_to_single_term() {
    init_logs();
    let p = Problem::minimize(norm1(variable("x", 10))).unwrap();
    let out = compile(&p).unwrap();

    assert_eq!(out.objective_terms().len(), 1);
    assert!(out.constraints.is_empty());
    assert_eq!(prox_names(&out), vec!["NormL1Prox"]);
}

// ============================================================================
// Scenario B: total-variation smoothing
// ============================================================================

/// Three quadratic data-fidelity terms over one image plus an isotropic
/// total-variation penalty on its differences.
fn tv_smooth(n: usize, lam: f64) -> Problem {
    let x = || variable("x", (n, n));
    let obs = |seed| constant_dmatrix(dense(n, n, seed));
    let d = constant_sparse(difference(n));

    let objective = sum_squares([x() - obs(1)])
        + sum_squares([x() - obs(2)])
        + sum_squares([x() - obs(3)])
        + lam * norm_l1_l2(Expr::multiply(d, x()));
    Problem::minimize(objective).unwrap()
}

#[test]
fn test_tv_smooth_counts() {
    init_logs();
    let out = compile(&tv_smooth(10, 0.5)).unwrap();

    assert_eq!(
        sorted(prox_names(&out)),
        vec!["LeastSquaresProx", "NormL1L2Prox"]
    );
    // the three residual terms survive as the arguments of one
    // consolidated least-squares term
    let ls = out
        .objective_terms()
        .iter()
        .find_map(|t| match t {
            Expr::Atom(a) if a.atom == AtomKind::SumSquares => Some(a),
            _ => None,
        })
        .expect("least-squares term present");
    assert_eq!(ls.args.len(), 3);

    // exactly one equality: the copy of the stacked differences
    assert_eq!(out.constraints.len(), 1);
}

// ============================================================================
// Scenario C: basis pursuit
// ============================================================================

fn basis_pursuit(m: usize, n: usize) -> Problem {
    let a = constant_dmatrix(dense(m, n, 7));
    let b = constant_vec((0..m).map(|i| (i as f64) - 4.0).collect());
    let x = variable("x", n);
    Problem::new(
        norm1(x.clone()),
        vec![Constraint::eq(Expr::multiply(a, x), b)],
    )
    .unwrap()
}

#[test]
fn test_basis_pursuit_counts() {
    init_logs();
    let out = compile(&basis_pursuit(10, 30)).unwrap();

    assert_eq!(
        sorted(prox_names(&out)),
        vec!["LinearEqualityProx", "NormL1Prox"]
    );
    // the single constraint is the consensus equality from splitting
    assert_eq!(out.constraints.len(), 1);
    let consensus = &out.constraints[0];
    assert_eq!(consensus.lhs, variable("x", 30));
    assert_eq!(consensus.rhs, variable("x:0", 30));
}

// ============================================================================
// Least absolute deviations
// ============================================================================

fn least_abs_dev(m: usize, n: usize) -> Problem {
    let a = constant_dmatrix(dense(m, n, 11));
    let b = constant_vec((0..m).map(|i| ((i * i) % 5) as f64).collect());
    let x = variable("x", n);
    Problem::minimize(norm1(Expr::multiply(a, x) - b)).unwrap()
}

#[test]
fn test_least_abs_deviations_counts() {
    init_logs();
    let out = compile(&least_abs_dev(10, 5)).unwrap();

    assert_eq!(prox_names(&out), vec!["NormL1Prox"]);
    // one copy constraint tying the norm argument to the affine residual
    assert_eq!(out.constraints.len(), 1);
    let term_vars = out.objective_terms()[0].variables();
    assert_eq!(term_vars.len(), 1);
    assert!(term_vars[0].is_synthetic());
}

// ============================================================================
// Boundary: an atom over a sum of atoms plus an affine term
// ============================================================================

fn composite(n: usize) -> Problem {
    let x = || variable("x", n);
    let c = constant_vec((0..n).map(|i| i as f64).collect());
    let inner = norm2(x()) + norm1(x()) + Expr::multiply(c, x());
    Problem::minimize(exp(inner) + norm2(x())).unwrap()
}

#[test]
fn test_composite_epigraph_terminates_and_validates() {
    init_logs();
    let out = compile(&composite(5)).unwrap();

    assert_eq!(
        sorted(prox_names(&out)),
        vec![
            "ExpProx",
            "NormL1EpigraphProx",
            "NormL2EpigraphProx",
            "NormL2Prox",
        ]
    );
    // one argument-copy equality plus two consensus equalities for x
    assert_eq!(out.constraints.len(), 3);
}

// ============================================================================
// Error paths
// ============================================================================

#[test]
fn test_unsupported_atom_shape_is_reported() {
    let p = Problem::minimize(norm_l1_l2(variable("x", 10))).unwrap();
    let err = compile(&p).unwrap_err();
    assert!(matches!(err, CanonError::UnsupportedAtom { .. }));
    assert!(err.to_string().contains("norm_l1_l2"));
}

#[test]
fn test_nonaffine_constraint_is_reported() {
    let p = Problem::new(
        sum_squares([variable("x", 5)]),
        vec![Constraint::eq(norm1(variable("x", 5)), constant(1.0))],
    )
    .unwrap();
    let err = compile(&p).unwrap_err();
    assert!(matches!(err, CanonError::Structural(_)));
}

#[test]
fn test_excessive_nesting_is_reported() {
    let mut e = variable("x", ());
    for _ in 0..200 {
        e = Expr::Add(vec![e]);
    }
    let p = Problem::minimize(norm1(e)).unwrap();
    assert!(matches!(
        compile(&p).unwrap_err(),
        CanonError::NestingTooDeep { .. }
    ));
}

#[test]
fn test_identical_inputs_compile_identically() {
    let a = compile(&composite(5)).unwrap();
    let b = compile(&composite(5)).unwrap();
    assert_eq!(a, b);
}
