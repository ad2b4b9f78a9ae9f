//! LaTeX rendering.
//!
//! Mirrors the plain-text printer's term ordering so the `result` and
//! `latex` fields of an envelope always describe the same arrangement.
//! Negative signs sit outside fractions, and explicit `\cdot` marks every
//! product.

use crate::ast::{is_numeric_power, ordered_terms, sign_split, Constant, Expr, Func};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed};

/// Render an expression as LaTeX source.
pub fn latex(e: &Expr) -> String {
    render(e)
}

/// Symbol names with a conventional LaTeX spelling.
fn symbol_latex(name: &str) -> String {
    const GREEK: [&str; 19] = [
        "alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta", "kappa", "lambda",
        "mu", "nu", "xi", "rho", "sigma", "tau", "phi", "psi", "omega",
    ];
    if GREEK.contains(&name) {
        format!("\\{}", name)
    } else {
        name.to_string()
    }
}

fn constant_latex(c: Constant) -> String {
    match c {
        Constant::Pi => "\\pi".to_string(),
        Constant::E => "e".to_string(),
        Constant::I => "i".to_string(),
        Constant::Infinity => "\\infty".to_string(),
        Constant::NegInfinity => "-\\infty".to_string(),
        Constant::ComplexInfinity => "\\tilde{\\infty}".to_string(),
        Constant::NotANumber => "\\text{NaN}".to_string(),
    }
}

fn number_latex(n: &BigRational) -> String {
    if n.is_integer() {
        n.numer().to_string()
    } else if n.is_negative() {
        let positive = -n;
        format!("-\\frac{{{}}}{{{}}}", positive.numer(), positive.denom())
    } else {
        format!("\\frac{{{}}}{{{}}}", n.numer(), n.denom())
    }
}

fn needs_parens_in_product(e: &Expr) -> bool {
    matches!(e, Expr::Add(_))
}

fn render_operand(e: &Expr) -> String {
    if needs_parens_in_product(e) {
        format!("\\left({}\\right)", render(e))
    } else {
        render(e)
    }
}

fn render_pow_base(e: &Expr) -> String {
    match e {
        Expr::Add(_) | Expr::Mul(_) | Expr::Pow(_, _) => {
            format!("\\left({}\\right)", render(e))
        }
        Expr::Number(n) if n.is_negative() || !n.is_integer() => {
            format!("\\left({}\\right)", render(e))
        }
        _ => render(e),
    }
}

fn render_mul(items: &[Expr]) -> String {
    let mut coeff = BigRational::one();
    let mut numer: Vec<Expr> = Vec::new();
    let mut denom: Vec<Expr> = Vec::new();

    for item in items {
        match item {
            Expr::Number(n) => coeff *= n,
            Expr::Pow(base, exp) => {
                if let Expr::Number(k) = &**exp {
                    if k.is_negative() {
                        let flipped = -k;
                        if flipped.is_one() {
                            denom.push((**base).clone());
                        } else {
                            denom.push(Expr::pow((**base).clone(), Expr::Number(flipped)));
                        }
                        continue;
                    }
                }
                numer.push(item.clone());
            }
            other => numer.push(other.clone()),
        }
    }

    let negative = coeff.is_negative();
    if negative {
        coeff = -coeff;
    }
    let (cn, cd) = (coeff.numer().clone(), coeff.denom().clone());

    let mut sorted_numer = numer;
    sorted_numer.sort_by_key(|f| (!is_numeric_power(f), f.clone()));
    let mut num_factors: Vec<String> = Vec::new();
    if !cn.is_one() || sorted_numer.is_empty() {
        num_factors.push(cn.to_string());
    }
    for f in &sorted_numer {
        num_factors.push(render_operand(f));
    }
    let num_str = num_factors.join(" \\cdot ");

    let mut sorted_denom = denom;
    sorted_denom.sort_by_key(|f| (!is_numeric_power(f), f.clone()));
    let mut den_factors: Vec<String> = Vec::new();
    if !cd.is_one() {
        den_factors.push(cd.to_string());
    }
    for f in &sorted_denom {
        den_factors.push(render_operand(f));
    }

    let body = if den_factors.is_empty() {
        num_str
    } else {
        format!("\\frac{{{}}}{{{}}}", num_str, den_factors.join(" \\cdot "))
    };

    if negative {
        format!("-{}", body)
    } else {
        body
    }
}

fn render_add(items: &[Expr]) -> String {
    let terms = ordered_terms(items);
    let mut out = String::new();
    for (i, term) in terms.iter().enumerate() {
        let (neg, abs) = sign_split(term);
        if i == 0 {
            if neg {
                out.push('-');
            }
            out.push_str(&render(&abs));
        } else if neg {
            out.push_str(" - ");
            out.push_str(&render(&abs));
        } else {
            out.push_str(" + ");
            out.push_str(&render(&abs));
        }
    }
    out
}

fn render_function(f: Func, args: &[Expr]) -> String {
    let arg = |i: usize| -> String { args.get(i).map(render).unwrap_or_default() };
    match f {
        Func::Sin | Func::Cos | Func::Tan | Func::Sec | Func::Csc | Func::Cot => {
            format!("\\{}\\left({}\\right)", f.name(), arg(0))
        }
        Func::Sinh | Func::Cosh | Func::Tanh => {
            format!("\\{}\\left({}\\right)", f.name(), arg(0))
        }
        Func::Asin | Func::Acos | Func::Atan | Func::Asinh | Func::Acosh | Func::Atanh => {
            format!("\\operatorname{{{}}}\\left({}\\right)", f.name(), arg(0))
        }
        Func::Exp => format!("e^{{{}}}", arg(0)),
        Func::Log => format!("\\log\\left({}\\right)", arg(0)),
        Func::Abs => format!("\\left|{}\\right|", arg(0)),
        Func::Sign => format!("\\operatorname{{sign}}\\left({}\\right)", arg(0)),
        Func::Factorial => match args.first() {
            Some(inner @ (Expr::Number(_) | Expr::Symbol(_) | Expr::Constant(_))) => {
                format!("{}!", render(inner))
            }
            _ => format!("\\left({}\\right)!", arg(0)),
        },
        Func::Mod => format!("{} \\bmod {}", arg(0), arg(1)),
        Func::Order => format!("O\\left({}\\right)", arg(0)),
    }
}

fn render(e: &Expr) -> String {
    match e {
        Expr::Number(n) => number_latex(n),
        Expr::Constant(c) => constant_latex(*c),
        Expr::Symbol(name) => symbol_latex(name),
        Expr::Add(items) => render_add(items),
        Expr::Mul(items) => render_mul(items),
        Expr::Pow(base, exp) => {
            if let Expr::Number(k) = &**exp {
                let half = BigRational::new(BigInt::from(1), BigInt::from(2));
                if *k == half {
                    return format!("\\sqrt{{{}}}", render(base));
                }
                if *k == -&half {
                    return format!("\\frac{{1}}{{\\sqrt{{{}}}}}", render(base));
                }
                if k.is_negative() {
                    let flipped = -k;
                    let den = if flipped.is_one() {
                        render(base)
                    } else {
                        render(&Expr::pow((**base).clone(), Expr::Number(flipped)))
                    };
                    return format!("\\frac{{1}}{{{}}}", den);
                }
            }
            format!("{}^{{{}}}", render_pow_base(base), render(exp))
        }
        Expr::Function(f, args) => render_function(*f, args),
    }
}
