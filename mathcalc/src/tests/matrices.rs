use crate::ast::Expr;
use crate::matrix::Matrix;

fn m(rows: Vec<Vec<i64>>) -> Matrix {
    let rows = rows
        .into_iter()
        .map(|r| r.into_iter().map(Expr::integer).collect())
        .collect();
    Matrix::from_rows(rows).unwrap()
}

#[test]
fn test_display_matches_constructor_notation() {
    assert_eq!(
        m(vec![vec![1, 2], vec![3, 4]]).to_string(),
        "Matrix([[1, 2], [3, 4]])"
    );
    assert_eq!(Matrix::identity(2).to_string(), "Matrix([[1, 0], [0, 1]])");
}

#[test]
fn test_ragged_rows_are_rejected() {
    let err = Matrix::from_rows(vec![vec![Expr::one()], vec![]]).unwrap_err();
    assert_eq!(err.to_string(), "matrix rows must all have the same length");
    let err = Matrix::from_rows(vec![]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "matrix must have at least one row and one column"
    );
}

#[test]
fn test_determinant() {
    assert_eq!(
        m(vec![vec![1, 2], vec![3, 4]]).determinant().unwrap().to_string(),
        "-2"
    );
    let diag = m(vec![vec![2, 0, 0], vec![0, 3, 0], vec![0, 0, 4]]);
    assert_eq!(diag.determinant().unwrap().to_string(), "24");
}

#[test]
fn test_symbolic_determinant_uses_cofactors() {
    let x = || Expr::symbol("x");
    let rows = vec![
        vec![x(), Expr::one()],
        vec![Expr::one(), x()],
    ];
    let matrix = Matrix::from_rows(rows).unwrap();
    assert_eq!(matrix.determinant().unwrap().to_string(), "x**2 - 1");
}

#[test]
fn test_determinant_requires_square() {
    let wide = m(vec![vec![1, 2, 3], vec![4, 5, 6]]);
    let err = wide.determinant().unwrap_err();
    assert_eq!(err.to_string(), "determinant requires a square matrix");
}

#[test]
fn test_multiplication() {
    let a = m(vec![vec![1, 2], vec![3, 4]]);
    let b = m(vec![vec![5, 6], vec![7, 8]]);
    assert_eq!(
        a.multiply(&b).unwrap().to_string(),
        "Matrix([[19, 22], [43, 50]])"
    );
}

#[test]
fn test_multiplication_shape_mismatch() {
    let a = m(vec![vec![1, 2], vec![3, 4]]);
    let b = m(vec![vec![1, 2], vec![3, 4], vec![5, 6]]);
    let err = a.multiply(&b).unwrap_err();
    assert_eq!(
        err.to_string(),
        "cannot multiply a 2x2 matrix by a 3x2 matrix"
    );
}

#[test]
fn test_inverse_of_rational_matrix() {
    let diag = m(vec![vec![2, 0], vec![0, 4]]);
    assert_eq!(
        diag.inverse().unwrap().to_string(),
        "Matrix([[1/2, 0], [0, 1/4]])"
    );
    let a = m(vec![vec![1, 2], vec![3, 4]]);
    assert_eq!(
        a.inverse().unwrap().to_string(),
        "Matrix([[-2, 1], [3/2, -1/2]])"
    );
}

#[test]
fn test_inverse_round_trips_to_identity() {
    let a = m(vec![vec![1, 2], vec![3, 4]]);
    let product = a.multiply(&a.inverse().unwrap()).unwrap();
    assert_eq!(product, Matrix::identity(2));
}

#[test]
fn test_singular_matrix_has_no_inverse() {
    let a = m(vec![vec![1, 2], vec![2, 4]]);
    let err = a.inverse().unwrap_err();
    assert_eq!(err.to_string(), "Matrix det == 0; not invertible.");
}

#[test]
fn test_symbolic_inverse_via_adjugate() {
    let rows = vec![
        vec![Expr::symbol("a"), Expr::zero()],
        vec![Expr::zero(), Expr::symbol("d")],
    ];
    let matrix = Matrix::from_rows(rows).unwrap();
    assert_eq!(
        matrix.inverse().unwrap().to_string(),
        "Matrix([[1/a, 0], [0, 1/d]])"
    );
}

#[test]
fn test_rref_full_rank() {
    let (reduced, pivots) = m(vec![vec![1, 2], vec![3, 4]]).rref();
    assert_eq!(reduced, Matrix::identity(2));
    assert_eq!(pivots, vec![0, 1]);
}

#[test]
fn test_rref_rank_deficient() {
    let (reduced, pivots) = m(vec![vec![1, 2], vec![2, 4]]).rref();
    assert_eq!(reduced.to_string(), "Matrix([[1, 2], [0, 0]])");
    assert_eq!(pivots, vec![0]);
}

#[test]
fn test_rref_rectangular() {
    let (reduced, pivots) = m(vec![vec![1, 2, 3], vec![4, 5, 6]]).rref();
    assert_eq!(reduced.to_string(), "Matrix([[1, 0, -1], [0, 1, 2]])");
    assert_eq!(pivots, vec![0, 1]);
}

#[test]
fn test_eigenvalues_of_diagonal_matrix() {
    let pairs = m(vec![vec![2, 0], vec![0, 3]]).eigenvalues().unwrap();
    let rendered: Vec<(String, usize)> = pairs
        .into_iter()
        .map(|(v, k)| (v.to_string(), k))
        .collect();
    assert_eq!(
        rendered,
        vec![("2".to_string(), 1), ("3".to_string(), 1)]
    );
}

#[test]
fn test_eigenvalue_multiplicity() {
    let pairs = m(vec![vec![2, 1], vec![0, 2]]).eigenvalues().unwrap();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].0.to_string(), "2");
    assert_eq!(pairs[0].1, 2);
}

#[test]
fn test_eigenvalues_include_zero() {
    let pairs = m(vec![vec![1, 0], vec![0, 0]]).eigenvalues().unwrap();
    let rendered: Vec<(String, usize)> = pairs
        .into_iter()
        .map(|(v, k)| (v.to_string(), k))
        .collect();
    assert_eq!(
        rendered,
        vec![("0".to_string(), 1), ("1".to_string(), 1)]
    );
}

#[test]
fn test_eigenvectors_of_diagonal_matrix() {
    let pairs = m(vec![vec![2, 0], vec![0, 3]]).eigenvectors().unwrap();
    assert_eq!(pairs.len(), 2);

    let (value, multiplicity, basis) = &pairs[0];
    assert_eq!(value.to_string(), "2");
    assert_eq!(*multiplicity, 1);
    assert_eq!(basis, &vec![vec![Expr::one(), Expr::zero()]]);

    let (_, _, basis) = &pairs[1];
    assert_eq!(basis, &vec![vec![Expr::zero(), Expr::one()]]);
}

#[test]
fn test_defective_matrix_has_short_basis() {
    let pairs = m(vec![vec![2, 1], vec![0, 2]]).eigenvectors().unwrap();
    assert_eq!(pairs.len(), 1);
    let (_, multiplicity, basis) = &pairs[0];
    assert_eq!(*multiplicity, 2);
    assert_eq!(basis.len(), 1);
    assert_eq!(basis[0], vec![Expr::one(), Expr::zero()]);
}

#[test]
fn test_identity_eigenspace_spans_the_plane() {
    let pairs = Matrix::identity(2).eigenvectors().unwrap();
    assert_eq!(pairs.len(), 1);
    let (value, multiplicity, basis) = &pairs[0];
    assert_eq!(value.to_string(), "1");
    assert_eq!(*multiplicity, 2);
    assert_eq!(basis.len(), 2);
}

#[test]
fn test_symbolic_eigenvalues_are_rejected() {
    let matrix = Matrix::from_rows(vec![vec![Expr::symbol("x")]]).unwrap();
    let err = matrix.eigenvalues().unwrap_err();
    assert_eq!(err.to_string(), "eigenvalues require a fully numeric matrix");
}
