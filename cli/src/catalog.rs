//! Help text listing every operation by category.

const HEADER: &str = "\
Math Calculator - deterministic symbolic math operations

A comprehensive math engine that handles:
- Basic arithmetic (add, subtract, multiply, divide, modulo, power)
- Algebra (simplify, expand, factor, solve equations)
- Calculus (derivatives, integrals, limits, series)
- Linear algebra (matrices, determinants, eigenvalues)
- Trigonometry and special functions
- Statistics and probability basics
- Number theory (gcd, lcm, prime factorization)

Usage:
    mathcalc <operation> <args...>

Examples:
    mathcalc add 5 3
    mathcalc derivative \"x**2 + 3*x\" x
    mathcalc solve \"x**2 - 4\" x
    mathcalc integrate \"sin(x)\" x
";

const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Arithmetic",
        &[
            "add",
            "subtract",
            "multiply",
            "divide",
            "mod",
            "power",
            "sqrt",
            "abs",
            "factorial",
        ],
    ),
    (
        "Algebra",
        &[
            "simplify",
            "expand",
            "factor",
            "solve",
            "solve_system",
            "substitute",
        ],
    ),
    (
        "Calculus",
        &["derivative", "partial", "integrate", "limit", "series", "sum"],
    ),
    (
        "Trigonometry",
        &["trig_simplify", "trig_expand", "to_radians", "to_degrees"],
    ),
    (
        "Linear Algebra",
        &[
            "matrix",
            "det",
            "inverse",
            "matrix_mult",
            "eigenvalues",
            "eigenvectors",
            "rref",
        ],
    ),
    (
        "Number Theory",
        &[
            "gcd",
            "lcm",
            "prime_factors",
            "is_prime",
            "nth_prime",
            "binomial",
        ],
    ),
    ("Statistics", &["mean", "variance", "std_dev"]),
    ("Utility", &["evaluate", "latex", "compare"]),
];

/// Full help document: usage header plus the operation catalog.
pub fn render() -> String {
    let mut out = String::from(HEADER);
    out.push_str("\nAvailable operations:\n");
    for (category, operations) in CATEGORIES {
        out.push_str(&format!("\n  {}: {}\n", category, operations.join(", ")));
    }
    out
}
