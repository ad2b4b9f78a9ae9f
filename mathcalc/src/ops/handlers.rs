//! Per-operation handlers.
//!
//! Each handler extracts its parameters from the binding, calls the engine,
//! and serializes one envelope. Handlers stay thin: anything mathematical
//! lives behind [`SymbolicEngine`].

use num_bigint::BigInt;
use num_rational::BigRational;
use serde_json::Value;

use crate::ast::{Constant, Expr, Func};
use crate::calculus::Direction;
use crate::engine::SymbolicEngine;
use crate::error::{MathError, MathResult};
use crate::matrix::{matrix_latex, Matrix};
use crate::numeric::{self, NumericValue};
use crate::solve::SystemSolution;

use super::binding::{ArgumentBinding, Params, RawArg};
use super::envelope::{
    format_value, CompareEnvelope, EigenPair, EigenvaluesEnvelope, EigenvectorsEnvelope,
    EvaluateEnvelope, IsPrimeEnvelope, LatexEnvelope, MatrixEnvelope, Numeric, OrderedCounts,
    PrimeFactorsEnvelope, RrefEnvelope, SolveEnvelope, SystemEnvelope,
};
use super::{to_doc, Operation};

const MAX_DERIVATIVE_ORDER: i64 = 100_000;
const MAX_SERIES_ORDER: i64 = 64;

pub(crate) fn dispatch(
    engine: &dyn SymbolicEngine,
    operation: Operation,
    binding: &ArgumentBinding,
) -> MathResult<String> {
    match operation {
        Operation::Add => add(engine, binding),
        Operation::Subtract => subtract(engine, binding),
        Operation::Multiply => multiply(engine, binding),
        Operation::Divide => divide(engine, binding),
        Operation::Mod => modulo(engine, binding),
        Operation::Power => power(engine, binding),
        Operation::Sqrt => square_root(engine, binding),
        Operation::Abs => absolute_value(engine, binding),
        Operation::Factorial => factorial(engine, binding),
        Operation::Simplify => simplify_expr(engine, binding),
        Operation::Expand => expand_expr(engine, binding),
        Operation::Factor => factor_expr(engine, binding),
        Operation::Solve => solve_equation(engine, binding),
        Operation::SolveSystem => solve_system(engine, binding),
        Operation::Substitute => substitute(engine, binding),
        Operation::Derivative => derivative(engine, binding),
        Operation::Partial => partial_derivative(engine, binding),
        Operation::Integrate => integral(engine, binding),
        Operation::Limit => limit(engine, binding),
        Operation::Series => taylor_series(engine, binding),
        Operation::Sum => sum_series(engine, binding),
        Operation::TrigSimplify => trig_simplify(engine, binding),
        Operation::TrigExpand => trig_expand(engine, binding),
        Operation::ToRadians => to_radians(engine, binding),
        Operation::ToDegrees => to_degrees(engine, binding),
        Operation::Matrix => matrix_create(engine, binding),
        Operation::Determinant => matrix_determinant(engine, binding),
        Operation::Inverse => matrix_inverse(engine, binding),
        Operation::MatrixMult => matrix_multiply(engine, binding),
        Operation::Eigenvalues => matrix_eigenvalues(engine, binding),
        Operation::Eigenvectors => matrix_eigenvectors(engine, binding),
        Operation::Rref => matrix_rref(engine, binding),
        Operation::Gcd => gcd(engine, binding),
        Operation::Lcm => lcm(engine, binding),
        Operation::PrimeFactors => prime_factors(engine, binding),
        Operation::IsPrime => is_prime(engine, binding),
        Operation::NthPrime => nth_prime(engine, binding),
        Operation::Binomial => binomial(engine, binding),
        Operation::Mean => mean(engine, binding),
        Operation::Variance => variance(engine, binding),
        Operation::StdDev => std_dev(engine, binding),
        Operation::Evaluate => evaluate(engine, binding),
        Operation::Latex => to_latex(engine, binding),
        Operation::Compare => compare(engine, binding),
    }
}

fn formatted(e: &Expr) -> MathResult<String> {
    to_doc(&format_value(e))
}

fn parse_arg(engine: &dyn SymbolicEngine, arg: &RawArg<'_>) -> MathResult<Expr> {
    engine.parse(&arg.expr_text())
}

fn int_expr(n: BigInt) -> Expr {
    Expr::Number(BigRational::from_integer(n))
}

// ---------------------------------------------------------------------------
// arithmetic
// ---------------------------------------------------------------------------

fn add(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let mut params = Params::new("add", binding);
    let mut terms = Vec::new();
    for arg in params.rest() {
        terms.push(parse_arg(engine, &arg)?);
    }
    params.finish()?;
    // An empty sum is zero.
    formatted(&engine.simplify(&Expr::add(terms)))
}

fn subtract(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let mut params = Params::new("subtract", binding);
    let a = parse_arg(engine, &params.required("a")?)?;
    let b = parse_arg(engine, &params.required("b")?)?;
    params.finish()?;
    formatted(&engine.simplify(&Expr::sub(a, b)))
}

fn multiply(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let mut params = Params::new("multiply", binding);
    let mut factors = Vec::new();
    for arg in params.rest() {
        factors.push(parse_arg(engine, &arg)?);
    }
    params.finish()?;
    if factors.is_empty() {
        return Err(MathError::Argument(
            "multiply() requires at least one argument".to_string(),
        ));
    }
    formatted(&engine.simplify(&Expr::mul(factors)))
}

fn divide(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let mut params = Params::new("divide", binding);
    let num = parse_arg(engine, &params.required("a")?)?;
    let den = engine.simplify(&parse_arg(engine, &params.required("b")?)?);
    params.finish()?;
    // A denominator that merely simplifies to zero (x - x) still counts.
    if den.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    formatted(&engine.simplify(&Expr::div(num, den)))
}

fn modulo(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let mut params = Params::new("mod", binding);
    let a = parse_arg(engine, &params.required("a")?)?;
    let b = parse_arg(engine, &params.required("b")?)?;
    params.finish()?;
    formatted(&engine.simplify(&Expr::func(Func::Mod, vec![a, b])))
}

fn power(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let mut params = Params::new("power", binding);
    let base = parse_arg(engine, &params.required("base")?)?;
    let exp = parse_arg(engine, &params.required("exp")?)?;
    params.finish()?;
    formatted(&engine.simplify(&Expr::pow(base, exp)))
}

fn square_root(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let mut params = Params::new("sqrt", binding);
    let x = parse_arg(engine, &params.required("x")?)?;
    params.finish()?;
    formatted(&engine.simplify(&Expr::sqrt(x)))
}

fn absolute_value(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let mut params = Params::new("abs", binding);
    let x = parse_arg(engine, &params.required("x")?)?;
    params.finish()?;
    formatted(&engine.simplify(&Expr::func(Func::Abs, vec![x])))
}

fn factorial(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let mut params = Params::new("factorial", binding);
    let n = params.required("n")?.integer("n")?;
    params.finish()?;
    if n < 0 {
        // Factorial of a negative integer is complex infinity.
        return formatted(&Expr::Constant(Constant::ComplexInfinity));
    }
    let value = engine.factorial(n as u64)?;
    formatted(&int_expr(value))
}

// ---------------------------------------------------------------------------
// algebra
// ---------------------------------------------------------------------------

fn one_expression(
    engine: &dyn SymbolicEngine,
    op: &'static str,
    binding: &ArgumentBinding,
) -> MathResult<Expr> {
    let mut params = Params::new(op, binding);
    let e = parse_arg(engine, &params.required("expr_str")?)?;
    params.finish()?;
    Ok(e)
}

fn simplify_expr(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let e = one_expression(engine, "simplify", binding)?;
    formatted(&engine.simplify(&e))
}

fn expand_expr(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let e = one_expression(engine, "expand", binding)?;
    formatted(&engine.expand(&e))
}

fn factor_expr(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let e = one_expression(engine, "factor", binding)?;
    formatted(&engine.factor(&e))
}

fn solution_numeric(engine: &dyn SymbolicEngine, solution: &Expr) -> Numeric {
    match engine.approx(solution) {
        NumericValue::Real(v) => Numeric::Float(v),
        NumericValue::Complex(c) => Numeric::Text(numeric::complex_string(c)),
        NumericValue::Partial(s) => Numeric::Text(s),
        NumericValue::Undefined => Numeric::Text(solution.to_string()),
    }
}

fn solve_equation(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let mut params = Params::new("solve", binding);
    let equation_text = params.required("equation_str")?.string("equation_str")?;
    let variable = match params.optional("variable_str")? {
        Some(arg) => arg.string("variable_str")?,
        None => "x".to_string(),
    };
    params.finish()?;

    let equation = engine.parse_equation(&equation_text)?;
    let solutions = engine.solve(&equation, &variable)?;

    let envelope = SolveEnvelope {
        success: true,
        solutions: solutions.iter().map(|s| s.to_string()).collect(),
        solutions_latex: solutions.iter().map(|s| engine.latex(s)).collect(),
        solutions_numeric: solutions
            .iter()
            .map(|s| solution_numeric(engine, s))
            .collect(),
        count: solutions.len(),
    };
    to_doc(&envelope)
}

fn solve_system(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let mut params = Params::new("solve_system", binding);
    let raw_equations = params.required("equations")?.json_array("equations")?;
    let raw_variables = params.required("variables")?.json_array("variables")?;
    params.finish()?;

    let mut equations = Vec::with_capacity(raw_equations.len());
    for value in &raw_equations {
        equations.push(engine.parse_equation(&RawArg::Json(value).expr_text())?);
    }
    let variables: Vec<String> = raw_variables
        .iter()
        .map(|v| RawArg::Json(v).expr_text())
        .collect();

    let (solutions, type_name) = match engine.solve_system(&equations, &variables)? {
        SystemSolution::Assignments(pairs) if !pairs.is_empty() => {
            let body = pairs
                .iter()
                .map(|(name, value)| format!("{}: {}", name, value))
                .collect::<Vec<_>>()
                .join(", ");
            (format!("{{{}}}", body), "dict")
        }
        _ => ("[]".to_string(), "list"),
    };
    to_doc(&SystemEnvelope {
        success: true,
        solutions,
        type_name,
    })
}

fn substitute(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let mut params = Params::new("substitute", binding);
    let expr = parse_arg(engine, &params.required("expr_str")?)?;
    let substitutions = params.required("substitutions")?.json_object("substitutions")?;
    params.finish()?;

    let mut result = expr;
    for (name, value) in &substitutions {
        let replacement = engine.parse(&RawArg::Json(value).expr_text())?;
        result = result.subs_symbol(name, &replacement);
    }
    formatted(&engine.simplify(&result))
}

// ---------------------------------------------------------------------------
// calculus
// ---------------------------------------------------------------------------

fn derivative(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let mut params = Params::new("derivative", binding);
    let expr = parse_arg(engine, &params.required("expr_str")?)?;
    let var = match params.optional("var_str")? {
        Some(arg) => arg.string("var_str")?,
        None => "x".to_string(),
    };
    let order = match params.optional("order")? {
        Some(arg) => arg.integer("order")?,
        None => 1,
    };
    params.finish()?;

    if order < 0 {
        return Err(MathError::Argument(
            "argument 'order' must be a non-negative integer".to_string(),
        ));
    }
    if order > MAX_DERIVATIVE_ORDER {
        return Err(MathError::Engine(format!(
            "derivative order too large (max {})",
            MAX_DERIVATIVE_ORDER
        )));
    }
    formatted(&engine.derivative(&expr, &var, order as u32)?)
}

fn partial_derivative(
    engine: &dyn SymbolicEngine,
    binding: &ArgumentBinding,
) -> MathResult<String> {
    let mut params = Params::new("partial", binding);
    let mut expr = parse_arg(engine, &params.required("expr_str")?)?;
    let vars = params.rest();
    for arg in &vars {
        let var = arg.string("vars")?;
        expr = engine.derivative(&expr, &var, 1)?;
    }
    params.finish()?;
    formatted(&expr)
}

fn integral(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let mut params = Params::new("integrate", binding);
    let expr = parse_arg(engine, &params.required("expr_str")?)?;
    let var = match params.optional("var_str")? {
        Some(arg) => arg.string("var_str")?,
        None => "x".to_string(),
    };
    let lower = params.optional("lower")?.map(|a| a.expr_text());
    let upper = params.optional("upper")?.map(|a| a.expr_text());
    params.finish()?;

    let result = match (lower, upper) {
        (Some(lo), Some(hi)) => {
            let lo = engine.parse(&lo)?;
            let hi = engine.parse(&hi)?;
            engine.integrate_definite(&expr, &var, &lo, &hi)?
        }
        _ => engine.integrate(&expr, &var)?,
    };
    formatted(&result)
}

/// `oo`/`inf` spellings accepted where the original accepted them.
fn infinity_point(engine: &dyn SymbolicEngine, text: &str) -> MathResult<Expr> {
    match text.trim() {
        "oo" | "inf" => Ok(Expr::Constant(Constant::Infinity)),
        "-oo" | "-inf" => Ok(Expr::Constant(Constant::NegInfinity)),
        other => engine.parse(other),
    }
}

fn limit(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let mut params = Params::new("limit", binding);
    let expr = parse_arg(engine, &params.required("expr_str")?)?;
    let var = params.required("var_str")?.string("var_str")?;
    let point_text = params.required("point")?.expr_text();
    let direction = match params.optional("direction")? {
        Some(arg) => Direction::parse(&arg.string("direction")?)?,
        None => Direction::Plus,
    };
    params.finish()?;

    let point = infinity_point(engine, &point_text)?;
    formatted(&engine.limit(&expr, &var, &point, direction)?)
}

fn taylor_series(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let mut params = Params::new("series", binding);
    let expr = parse_arg(engine, &params.required("expr_str")?)?;
    let var = match params.optional("var_str")? {
        Some(arg) => arg.string("var_str")?,
        None => "x".to_string(),
    };
    let point = match params.optional("point")? {
        Some(arg) => engine.parse(&arg.expr_text())?,
        None => Expr::zero(),
    };
    let order = match params.optional("order")? {
        Some(arg) => arg.integer("order")?,
        None => 6,
    };
    params.finish()?;

    if order < 0 {
        return Err(MathError::Argument(
            "argument 'order' must be a non-negative integer".to_string(),
        ));
    }
    if order > MAX_SERIES_ORDER {
        return Err(MathError::Engine(format!(
            "series order too large (max {})",
            MAX_SERIES_ORDER
        )));
    }
    formatted(&engine.series(&expr, &var, &point, order as u32)?)
}

fn sum_series(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let mut params = Params::new("sum", binding);
    let expr = parse_arg(engine, &params.required("expr_str")?)?;
    let var = params.required("var_str")?.string("var_str")?;
    let start = engine.parse(&params.required("start")?.expr_text())?;
    let end_text = params.required("end")?.expr_text();
    params.finish()?;

    let end = match end_text.trim() {
        "oo" | "inf" => Expr::Constant(Constant::Infinity),
        other => engine.parse(other)?,
    };
    formatted(&engine.summation(&expr, &var, &start, &end)?)
}

// ---------------------------------------------------------------------------
// trigonometry
// ---------------------------------------------------------------------------

fn trig_simplify(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let e = one_expression(engine, "trig_simplify", binding)?;
    formatted(&engine.trig_simplify(&e))
}

fn trig_expand(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let e = one_expression(engine, "trig_expand", binding)?;
    formatted(&engine.trig_expand(&e))
}

fn to_radians(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let mut params = Params::new("to_radians", binding);
    let degrees = parse_arg(engine, &params.required("degrees")?)?;
    params.finish()?;
    let scaled = Expr::div(
        Expr::mul2(degrees, Expr::Constant(Constant::Pi)),
        Expr::integer(180),
    );
    formatted(&engine.simplify(&scaled))
}

fn to_degrees(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let mut params = Params::new("to_degrees", binding);
    let radians = parse_arg(engine, &params.required("radians")?)?;
    params.finish()?;
    let scaled = Expr::div(
        Expr::mul2(radians, Expr::integer(180)),
        Expr::Constant(Constant::Pi),
    );
    formatted(&engine.simplify(&scaled))
}

// ---------------------------------------------------------------------------
// linear algebra
// ---------------------------------------------------------------------------

fn entry_expr(engine: &dyn SymbolicEngine, value: &Value) -> MathResult<Expr> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(int_expr(BigInt::from(i)))
            } else if let Some(u) = n.as_u64() {
                Ok(int_expr(BigInt::from(u)))
            } else if let Some(f) = n.as_f64() {
                BigRational::from_float(f).map(Expr::Number).ok_or_else(|| {
                    MathError::Argument("matrix entries must be finite numbers".to_string())
                })
            } else {
                Err(MathError::Argument(
                    "matrix entries must be numbers or expression strings".to_string(),
                ))
            }
        }
        Value::String(s) => engine.parse(s),
        _ => Err(MathError::Argument(
            "matrix entries must be numbers or expression strings".to_string(),
        )),
    }
}

fn matrix_from_rows(engine: &dyn SymbolicEngine, rows: &[Value]) -> MathResult<Matrix> {
    let grid = rows.iter().all(|r| matches!(r, Value::Array(_)));
    let flat = rows.iter().all(|r| !matches!(r, Value::Array(_)));
    let data: Vec<Vec<Expr>> = if grid {
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let Value::Array(cells) = row else { unreachable!() };
            let mut entries = Vec::with_capacity(cells.len());
            for cell in cells {
                entries.push(entry_expr(engine, cell)?);
            }
            out.push(entries);
        }
        out
    } else if flat {
        // A flat list of scalars builds a column vector.
        let mut out = Vec::with_capacity(rows.len());
        for cell in rows {
            out.push(vec![entry_expr(engine, cell)?]);
        }
        out
    } else {
        return Err(MathError::Argument(
            "matrix rows must all be JSON arrays".to_string(),
        ));
    };
    Matrix::from_rows(data)
}

fn matrix_param(
    engine: &dyn SymbolicEngine,
    params: &mut Params<'_>,
    name: &'static str,
) -> MathResult<Matrix> {
    let rows = params.whole_list(name)?;
    matrix_from_rows(engine, &rows)
}

fn matrix_create(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let mut params = Params::new("matrix", binding);
    let m = matrix_param(engine, &mut params, "rows")?;
    params.finish()?;
    to_doc(&MatrixEnvelope {
        success: true,
        matrix: m.to_string(),
        latex: matrix_latex(&m),
        shape: Some(vec![m.rows(), m.cols()]),
    })
}

fn matrix_determinant(
    engine: &dyn SymbolicEngine,
    binding: &ArgumentBinding,
) -> MathResult<String> {
    let mut params = Params::new("determinant", binding);
    let m = matrix_param(engine, &mut params, "rows")?;
    params.finish()?;
    formatted(&engine.determinant(&m)?)
}

fn matrix_inverse(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let mut params = Params::new("inverse", binding);
    let m = matrix_param(engine, &mut params, "rows")?;
    params.finish()?;
    let inv = engine.inverse(&m)?;
    to_doc(&MatrixEnvelope {
        success: true,
        matrix: inv.to_string(),
        latex: matrix_latex(&inv),
        shape: None,
    })
}

fn matrix_multiply(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let mut params = Params::new("matrix_mult", binding);
    let a_rows = params.required("matrix_a")?.json_array("matrix_a")?;
    let b_rows = params.required("matrix_b")?.json_array("matrix_b")?;
    params.finish()?;
    let a = matrix_from_rows(engine, &a_rows)?;
    let b = matrix_from_rows(engine, &b_rows)?;
    let product = engine.matrix_multiply(&a, &b)?;
    to_doc(&MatrixEnvelope {
        success: true,
        matrix: product.to_string(),
        latex: matrix_latex(&product),
        shape: None,
    })
}

fn matrix_eigenvalues(
    engine: &dyn SymbolicEngine,
    binding: &ArgumentBinding,
) -> MathResult<String> {
    let mut params = Params::new("eigenvalues", binding);
    let m = matrix_param(engine, &mut params, "rows")?;
    params.finish()?;
    let eigenvalues = engine.eigenvalues(&m)?;
    to_doc(&EigenvaluesEnvelope {
        success: true,
        eigenvalues: OrderedCounts(
            eigenvalues
                .iter()
                .map(|(value, mult)| (value.to_string(), *mult))
                .collect(),
        ),
        latex: OrderedCounts(
            eigenvalues
                .iter()
                .map(|(value, mult)| (engine.latex(value), *mult))
                .collect(),
        ),
    })
}

fn column_string(column: &[Expr]) -> MathResult<String> {
    let rows = column.iter().map(|e| vec![e.clone()]).collect();
    Ok(Matrix::from_rows(rows)?.to_string())
}

fn matrix_eigenvectors(
    engine: &dyn SymbolicEngine,
    binding: &ArgumentBinding,
) -> MathResult<String> {
    let mut params = Params::new("eigenvectors", binding);
    let m = matrix_param(engine, &mut params, "rows")?;
    params.finish()?;
    let mut pairs = Vec::new();
    for (value, multiplicity, basis) in engine.eigenvectors(&m)? {
        let mut vectors = Vec::with_capacity(basis.len());
        for column in &basis {
            vectors.push(column_string(column)?);
        }
        pairs.push(EigenPair {
            eigenvalue: value.to_string(),
            multiplicity,
            eigenvectors: vectors,
        });
    }
    to_doc(&EigenvectorsEnvelope {
        success: true,
        eigenvectors: pairs,
    })
}

fn matrix_rref(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let mut params = Params::new("rref", binding);
    let m = matrix_param(engine, &mut params, "rows")?;
    params.finish()?;
    let (reduced, pivots) = engine.rref(&m);
    to_doc(&RrefEnvelope {
        success: true,
        rref: reduced.to_string(),
        latex: matrix_latex(&reduced),
        pivot_columns: pivots,
    })
}

// ---------------------------------------------------------------------------
// number theory
// ---------------------------------------------------------------------------

fn integer_fold(
    op: &'static str,
    binding: &ArgumentBinding,
) -> MathResult<Vec<BigInt>> {
    let mut params = Params::new(op, binding);
    let args = params.rest();
    params.finish()?;
    if args.len() < 2 {
        return Err(MathError::Argument(format!(
            "{}() requires at least 2 arguments",
            op
        )));
    }
    args.iter().map(|a| a.big_integer("numbers")).collect()
}

fn gcd(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let numbers = integer_fold("gcd", binding)?;
    formatted(&int_expr(engine.gcd(&numbers)))
}

fn lcm(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let numbers = integer_fold("lcm", binding)?;
    formatted(&int_expr(engine.lcm(&numbers)))
}

fn prime_factors(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let mut params = Params::new("prime_factors", binding);
    let n = params.required("n")?.big_integer("n")?;
    params.finish()?;
    let factors = engine.factorint(&n);
    let factorization = factors
        .iter()
        .map(|(p, e)| {
            if *e > 1 {
                format!("{}^{}", p, e)
            } else {
                p.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" × ");
    to_doc(&PrimeFactorsEnvelope {
        success: true,
        factors: OrderedCounts(
            factors
                .iter()
                .map(|(p, e)| (p.to_string(), *e))
                .collect(),
        ),
        factorization,
    })
}

fn is_prime(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let mut params = Params::new("is_prime", binding);
    let n = params.required("n")?.big_integer("n")?;
    params.finish()?;
    let number = match i64::try_from(n.clone()) {
        Ok(small) => Value::from(small),
        Err(_) => Value::String(n.to_string()),
    };
    to_doc(&IsPrimeEnvelope {
        success: true,
        is_prime: engine.is_prime(&n),
        number,
    })
}

fn nth_prime(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let mut params = Params::new("nth_prime", binding);
    let n = params.required("n")?.integer("n")?;
    params.finish()?;
    let index = if n < 0 { 0 } else { n as u64 };
    let p = engine.nth_prime(index)?;
    formatted(&int_expr(BigInt::from(p)))
}

fn binomial(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let mut params = Params::new("binomial", binding);
    let n = params.required("n")?.big_integer("n")?;
    let k = params.required("k")?.big_integer("k")?;
    params.finish()?;
    formatted(&int_expr(engine.binomial(&n, &k)?))
}

// ---------------------------------------------------------------------------
// statistics
// ---------------------------------------------------------------------------

fn number_list(
    engine: &dyn SymbolicEngine,
    op: &'static str,
    params: &mut Params<'_>,
) -> MathResult<Vec<Expr>> {
    let values = params.whole_list("numbers")?;
    if values.is_empty() {
        return Err(MathError::Argument(format!(
            "{}() requires at least one number",
            op
        )));
    }
    values
        .iter()
        .map(|v| engine.parse(&RawArg::Json(v).expr_text()))
        .collect()
}

fn mean_expr(numbers: &[Expr]) -> Expr {
    Expr::div(
        Expr::add(numbers.to_vec()),
        Expr::integer(numbers.len() as i64),
    )
}

fn variance_expr(numbers: &[Expr], population: bool) -> Expr {
    let n = numbers.len() as i64;
    let m = mean_expr(numbers);
    let deviations: Vec<Expr> = numbers
        .iter()
        .map(|x| Expr::pow(Expr::sub(x.clone(), m.clone()), Expr::integer(2)))
        .collect();
    let denominator = if population { n } else { n - 1 };
    // A sample variance of one observation divides by zero and reports it.
    Expr::div(Expr::add(deviations), Expr::integer(denominator))
}

fn mean(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let mut params = Params::new("mean", binding);
    let numbers = number_list(engine, "mean", &mut params)?;
    params.finish()?;
    formatted(&engine.simplify(&mean_expr(&numbers)))
}

fn variance(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let mut params = Params::new("variance", binding);
    let numbers = number_list(engine, "variance", &mut params)?;
    let population = match params.optional("population")? {
        Some(arg) => arg.boolean("population")?,
        None => true,
    };
    params.finish()?;
    formatted(&engine.simplify(&variance_expr(&numbers, population)))
}

fn std_dev(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let mut params = Params::new("std_dev", binding);
    let numbers = number_list(engine, "std_dev", &mut params)?;
    let population = match params.optional("population")? {
        Some(arg) => arg.boolean("population")?,
        None => true,
    };
    params.finish()?;
    let var = engine.simplify(&variance_expr(&numbers, population));
    formatted(&engine.simplify(&Expr::sqrt(var)))
}

// ---------------------------------------------------------------------------
// utility
// ---------------------------------------------------------------------------

fn evaluate(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let mut params = Params::new("evaluate", binding);
    let expr = parse_arg(engine, &params.required("expr_str")?)?;
    let precision = match params.optional("precision")? {
        Some(arg) => arg.integer("precision")?,
        None => 15,
    };
    params.finish()?;
    if precision < 1 {
        return Err(MathError::Argument(
            "argument 'precision' must be a positive integer".to_string(),
        ));
    }

    let simplified = engine.simplify(&expr);
    let (result, numeric) = match engine.approx(&simplified) {
        NumericValue::Real(v) => {
            let text = numeric::fmt_sig(v, precision as usize);
            (text, Some(Numeric::Float(v)))
        }
        NumericValue::Complex(c) => {
            let text = numeric::complex_string(c);
            (text.clone(), Some(Numeric::Text(text)))
        }
        NumericValue::Partial(s) => (s.clone(), Some(Numeric::Text(s))),
        NumericValue::Undefined => (simplified.to_string(), None),
    };
    to_doc(&EvaluateEnvelope {
        success: true,
        result,
        numeric,
    })
}

fn to_latex(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let e = one_expression(engine, "latex", binding)?;
    to_doc(&LatexEnvelope {
        success: true,
        latex: engine.latex(&e),
    })
}

fn compare(engine: &dyn SymbolicEngine, binding: &ArgumentBinding) -> MathResult<String> {
    let mut params = Params::new("compare", binding);
    let a = parse_arg(engine, &params.required("a")?)?;
    let b = parse_arg(engine, &params.required("b")?)?;
    params.finish()?;
    // Expanding catches distributed forms; the trig pass catches identities
    // like sin(x)**2 + cos(x)**2 against 1.
    let difference = engine.expand(&Expr::sub(a, b));
    let equal = difference.is_zero() || engine.trig_simplify(&difference).is_zero();
    to_doc(&CompareEnvelope {
        success: true,
        equal,
        difference: if equal {
            "0".to_string()
        } else {
            difference.to_string()
        },
    })
}
