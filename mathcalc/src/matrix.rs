//! Exact matrices over symbolic entries.
//!
//! Entries are full expressions, so `[[1, "x"], [0, 2]]` is as valid as a
//! numeric grid. Fully numeric matrices take exact rational fast paths;
//! symbolic ones fall back to cofactor expansion with small size caps.

use crate::ast::Expr;
use crate::error::{MathError, MathResult};
use crate::latex;
use crate::numeric::order_key;
use crate::simplify::simplify;
use crate::solve::poly_root_multiplicities;
use num_rational::BigRational;
use num_traits::{One, Zero};
use std::fmt;

const MAX_COFACTOR_DIM: usize = 8;
const SINGULAR_MESSAGE: &str = "Matrix det == 0; not invertible.";

#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<Expr>,
}

impl Matrix {
    pub fn from_rows(rows: Vec<Vec<Expr>>) -> MathResult<Matrix> {
        if rows.is_empty() || rows[0].is_empty() {
            return Err(MathError::Argument(
                "matrix must have at least one row and one column".to_string(),
            ));
        }
        let cols = rows[0].len();
        if rows.iter().any(|r| r.len() != cols) {
            return Err(MathError::Argument(
                "matrix rows must all have the same length".to_string(),
            ));
        }
        let row_count = rows.len();
        let data = rows.into_iter().flatten().collect();
        Ok(Matrix {
            rows: row_count,
            cols,
            data,
        })
    }

    pub fn identity(n: usize) -> Matrix {
        let mut data = vec![Expr::zero(); n * n];
        for i in 0..n {
            data[i * n + i] = Expr::one();
        }
        Matrix {
            rows: n,
            cols: n,
            data,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, r: usize, c: usize) -> &Expr {
        &self.data[r * self.cols + c]
    }

    fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// All-rational entry view, when the matrix is fully numeric.
    fn rational_entries(&self) -> Option<Vec<Vec<BigRational>>> {
        let mut out = Vec::with_capacity(self.rows);
        for r in 0..self.rows {
            let mut row = Vec::with_capacity(self.cols);
            for c in 0..self.cols {
                row.push(self.get(r, c).as_number()?.clone());
            }
            out.push(row);
        }
        Some(out)
    }

    pub fn multiply(&self, other: &Matrix) -> MathResult<Matrix> {
        if self.cols != other.rows {
            return Err(MathError::Engine(format!(
                "cannot multiply a {}x{} matrix by a {}x{} matrix",
                self.rows, self.cols, other.rows, other.cols
            )));
        }
        let mut data = Vec::with_capacity(self.rows * other.cols);
        for r in 0..self.rows {
            for c in 0..other.cols {
                let terms: Vec<Expr> = (0..self.cols)
                    .map(|k| Expr::mul2(self.get(r, k).clone(), other.get(k, c).clone()))
                    .collect();
                data.push(simplify(&Expr::add(terms)));
            }
        }
        Ok(Matrix {
            rows: self.rows,
            cols: other.cols,
            data,
        })
    }

    pub fn determinant(&self) -> MathResult<Expr> {
        if !self.is_square() {
            return Err(MathError::Engine(
                "determinant requires a square matrix".to_string(),
            ));
        }
        if let Some(entries) = self.rational_entries() {
            return Ok(Expr::Number(rational_determinant(entries)));
        }
        if self.rows > MAX_COFACTOR_DIM {
            return Err(MathError::Engine(format!(
                "symbolic determinant supports up to {0}x{0}",
                MAX_COFACTOR_DIM
            )));
        }
        Ok(simplify(&self.cofactor_determinant()))
    }

    fn cofactor_determinant(&self) -> Expr {
        let n = self.rows;
        if n == 1 {
            return self.get(0, 0).clone();
        }
        if n == 2 {
            return Expr::sub(
                Expr::mul2(self.get(0, 0).clone(), self.get(1, 1).clone()),
                Expr::mul2(self.get(0, 1).clone(), self.get(1, 0).clone()),
            );
        }
        let mut terms = Vec::with_capacity(n);
        for c in 0..n {
            let entry = self.get(0, c);
            if entry.is_zero() {
                continue;
            }
            let minor = self.minor(0, c).cofactor_determinant();
            let term = Expr::mul2(entry.clone(), minor);
            terms.push(if c % 2 == 0 { term } else { term.neg() });
        }
        Expr::add(terms)
    }

    fn minor(&self, skip_row: usize, skip_col: usize) -> Matrix {
        let mut data = Vec::with_capacity((self.rows - 1) * (self.cols - 1));
        for r in 0..self.rows {
            if r == skip_row {
                continue;
            }
            for c in 0..self.cols {
                if c == skip_col {
                    continue;
                }
                data.push(self.get(r, c).clone());
            }
        }
        Matrix {
            rows: self.rows - 1,
            cols: self.cols - 1,
            data,
        }
    }

    pub fn inverse(&self) -> MathResult<Matrix> {
        if !self.is_square() {
            return Err(MathError::Engine(
                "inverse requires a square matrix".to_string(),
            ));
        }
        if let Some(entries) = self.rational_entries() {
            return rational_inverse(entries);
        }
        if self.rows > MAX_COFACTOR_DIM {
            return Err(MathError::Engine(format!(
                "symbolic inverse supports up to {0}x{0}",
                MAX_COFACTOR_DIM
            )));
        }
        let det = simplify(&self.cofactor_determinant());
        if det.is_zero() {
            return Err(MathError::SingularMatrix(SINGULAR_MESSAGE.to_string()));
        }
        // Adjugate over determinant.
        let n = self.rows;
        let mut data = Vec::with_capacity(n * n);
        for r in 0..n {
            for c in 0..n {
                // Transposed cofactor: minor of (c, r).
                let cof = self.minor(c, r).cofactor_determinant();
                let signed = if (r + c) % 2 == 0 { cof } else { cof.neg() };
                data.push(simplify(&Expr::div(signed, det.clone())));
            }
        }
        Ok(Matrix {
            rows: n,
            cols: n,
            data,
        })
    }

    /// Reduced row echelon form and the zero-based pivot columns. Symbolic
    /// pivots count as nonzero unless they are literally zero.
    pub fn rref(&self) -> (Matrix, Vec<usize>) {
        let mut m: Vec<Vec<Expr>> = (0..self.rows)
            .map(|r| (0..self.cols).map(|c| self.get(r, c).clone()).collect())
            .collect();
        let mut pivots = Vec::new();
        let mut row = 0usize;

        for col in 0..self.cols {
            if row >= self.rows {
                break;
            }
            let Some(pivot_row) = (row..self.rows).find(|r| !m[*r][col].is_zero()) else {
                continue;
            };
            m.swap(row, pivot_row);

            let pivot = m[row][col].clone();
            if !pivot.is_one() {
                for c in col..self.cols {
                    m[row][c] = simplify(&Expr::div(m[row][c].clone(), pivot.clone()));
                }
            }
            for r in 0..self.rows {
                if r == row || m[r][col].is_zero() {
                    continue;
                }
                let factor = m[r][col].clone();
                for c in col..self.cols {
                    let scaled = Expr::mul2(factor.clone(), m[row][c].clone());
                    m[r][c] = simplify(&Expr::sub(m[r][c].clone(), scaled));
                }
            }
            pivots.push(col);
            row += 1;
        }

        let data = m.into_iter().flatten().collect();
        (
            Matrix {
                rows: self.rows,
                cols: self.cols,
                data,
            },
            pivots,
        )
    }

    /// Eigenvalues with algebraic multiplicities, ordered deterministically.
    pub fn eigenvalues(&self) -> MathResult<Vec<(Expr, usize)>> {
        if !self.is_square() {
            return Err(MathError::Engine(
                "eigenvalues require a square matrix".to_string(),
            ));
        }
        let entries = self.rational_entries().ok_or_else(|| {
            MathError::Engine("eigenvalues require a fully numeric matrix".to_string())
        })?;
        let char_poly = characteristic_polynomial(&entries);
        let mut roots = poly_root_multiplicities(&char_poly)?;
        roots.sort_by_key(|(value, _)| order_key(value));
        Ok(roots)
    }

    /// Per-eigenvalue null-space bases. Rational eigenvalues only; anything
    /// irrational or complex has no exact basis here.
    pub fn eigenvectors(&self) -> MathResult<Vec<(Expr, usize, Vec<Vec<Expr>>)>> {
        let values = self.eigenvalues()?;
        let entries = self.rational_entries().ok_or_else(|| {
            MathError::Engine("eigenvectors require a fully numeric matrix".to_string())
        })?;
        let mut out = Vec::with_capacity(values.len());
        for (value, multiplicity) in values {
            let r = value.as_number().cloned().ok_or_else(|| {
                MathError::Engine(format!(
                    "eigenvector basis for non-rational eigenvalue {} is not supported",
                    value
                ))
            })?;
            let basis = rational_null_space(&entries, &r);
            out.push((value, multiplicity, basis));
        }
        Ok(out)
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Matrix([")?;
        for r in 0..self.rows {
            if r > 0 {
                write!(f, ", ")?;
            }
            write!(f, "[")?;
            for c in 0..self.cols {
                if c > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", self.get(r, c))?;
            }
            write!(f, "]")?;
        }
        write!(f, "])")
    }
}

/// `\left[\begin{matrix} ... \end{matrix}\right]` rendering.
pub fn matrix_latex(m: &Matrix) -> String {
    let mut body = String::new();
    for r in 0..m.rows() {
        if r > 0 {
            body.push_str("\\\\");
        }
        for c in 0..m.cols() {
            if c > 0 {
                body.push_str(" & ");
            }
            body.push_str(&latex::latex(m.get(r, c)));
        }
    }
    format!("\\left[\\begin{{matrix}}{}\\end{{matrix}}\\right]", body)
}

fn rational_determinant(mut m: Vec<Vec<BigRational>>) -> BigRational {
    let n = m.len();
    let mut det = BigRational::one();
    for col in 0..n {
        let Some(pivot_row) = (col..n).find(|r| !m[*r][col].is_zero()) else {
            return BigRational::zero();
        };
        if pivot_row != col {
            m.swap(col, pivot_row);
            det = -det;
        }
        let pivot = m[col][col].clone();
        det *= &pivot;
        for r in (col + 1)..n {
            if m[r][col].is_zero() {
                continue;
            }
            let factor = &m[r][col] / &pivot;
            for c in col..n {
                let delta = &factor * &m[col][c];
                m[r][c] -= delta;
            }
        }
    }
    det
}

fn rational_inverse(m: Vec<Vec<BigRational>>) -> MathResult<Matrix> {
    let n = m.len();
    // Augment with the identity and run Gauss-Jordan.
    let mut aug: Vec<Vec<BigRational>> = m
        .into_iter()
        .enumerate()
        .map(|(i, mut row)| {
            let mut identity = vec![BigRational::zero(); n];
            identity[i] = BigRational::one();
            row.extend(identity);
            row
        })
        .collect();

    for col in 0..n {
        let Some(pivot_row) = (col..n).find(|r| !aug[*r][col].is_zero()) else {
            return Err(MathError::SingularMatrix(SINGULAR_MESSAGE.to_string()));
        };
        aug.swap(col, pivot_row);
        let pivot = aug[col][col].clone();
        for c in 0..2 * n {
            aug[col][c] /= &pivot;
        }
        for r in 0..n {
            if r == col || aug[r][col].is_zero() {
                continue;
            }
            let factor = aug[r][col].clone();
            for c in 0..2 * n {
                let delta = &factor * &aug[col][c];
                aug[r][c] -= delta;
            }
        }
    }

    let data = aug
        .into_iter()
        .flat_map(|row| row.into_iter().skip(n).map(Expr::Number).collect::<Vec<_>>())
        .collect();
    Ok(Matrix {
        rows: n,
        cols: n,
        data,
    })
}

/// Monic characteristic polynomial coefficients, constant term first, by
/// the Faddeev-LeVerrier trace recurrence.
fn characteristic_polynomial(a: &[Vec<BigRational>]) -> Vec<BigRational> {
    let n = a.len();
    let mut coeffs = vec![BigRational::zero(); n + 1];
    coeffs[n] = BigRational::one();

    let mut m: Vec<Vec<BigRational>> = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| {
                    if i == j {
                        BigRational::one()
                    } else {
                        BigRational::zero()
                    }
                })
                .collect()
        })
        .collect();
    let mut c = BigRational::one();

    for k in 1..=n {
        // M_k = A * (M_{k-1} + c_{n-k+1} I)
        let mut shifted = m.clone();
        for (i, row) in shifted.iter_mut().enumerate().take(n) {
            row[i] += &c;
        }
        if k > 1 {
            m = mat_mul_rational(a, &shifted);
        } else {
            m = a.to_vec();
        }
        let trace: BigRational = (0..n).map(|i| m[i][i].clone()).sum();
        c = -trace / BigRational::from_integer(k.into());
        coeffs[n - k] = c.clone();
    }
    coeffs
}

fn mat_mul_rational(a: &[Vec<BigRational>], b: &[Vec<BigRational>]) -> Vec<Vec<BigRational>> {
    let n = a.len();
    let mut out = vec![vec![BigRational::zero(); n]; n];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            for k in 0..n {
                *cell += &a[i][k] * &b[k][j];
            }
        }
    }
    out
}

/// Basis of `(A - rI) v = 0` as column vectors of exact entries.
fn rational_null_space(a: &[Vec<BigRational>], r: &BigRational) -> Vec<Vec<Expr>> {
    let n = a.len();
    let mut m: Vec<Vec<BigRational>> = a.to_vec();
    for (i, row) in m.iter_mut().enumerate() {
        row[i] -= r;
    }

    // Rational RREF.
    let mut pivots: Vec<usize> = Vec::new();
    let mut row = 0usize;
    for col in 0..n {
        if row >= n {
            break;
        }
        let Some(pivot_row) = (row..n).find(|i| !m[*i][col].is_zero()) else {
            continue;
        };
        m.swap(row, pivot_row);
        let pivot = m[row][col].clone();
        for c in col..n {
            m[row][c] /= &pivot;
        }
        for i in 0..n {
            if i == row || m[i][col].is_zero() {
                continue;
            }
            let factor = m[i][col].clone();
            for c in col..n {
                let delta = &factor * &m[row][c];
                m[i][c] -= delta;
            }
        }
        pivots.push(col);
        row += 1;
    }

    let free: Vec<usize> = (0..n).filter(|c| !pivots.contains(c)).collect();
    let mut basis = Vec::with_capacity(free.len());
    for &f in &free {
        let mut v = vec![BigRational::zero(); n];
        v[f] = BigRational::one();
        for (pivot_index, &p) in pivots.iter().enumerate() {
            v[p] = -m[pivot_index][f].clone();
        }
        basis.push(v.into_iter().map(Expr::Number).collect());
    }
    basis
}
