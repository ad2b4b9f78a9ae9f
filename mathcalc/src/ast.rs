//! Symbolic expression tree.
//!
//! Expressions are immutable values. Numbers are exact rationals; division
//! and subtraction are surface syntax that lowers to `Mul`/`Pow` and
//! `Add`/`Mul` nodes, so the tree has one canonical shape per value family.
//! `Display` reconstructs the conventional notation (`x - 1`, `2/x`,
//! `sqrt(2)`) from that shape.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::collections::BTreeSet;
use std::fmt;

/// Named mathematical constants.
///
/// `NegInfinity` is kept distinct from `-1 * Infinity` so that limits and
/// printing can treat it atomically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Constant {
    Pi,
    E,
    I,
    Infinity,
    NegInfinity,
    ComplexInfinity,
    NotANumber,
}

impl Constant {
    pub fn name(&self) -> &'static str {
        match self {
            Constant::Pi => "pi",
            Constant::E => "E",
            Constant::I => "I",
            Constant::Infinity => "oo",
            Constant::NegInfinity => "-oo",
            Constant::ComplexInfinity => "zoo",
            Constant::NotANumber => "nan",
        }
    }

    /// Value-category tag used in result envelopes.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Constant::Pi => "Pi",
            Constant::E => "Exp1",
            Constant::I => "ImaginaryUnit",
            Constant::Infinity => "Infinity",
            Constant::NegInfinity => "NegativeInfinity",
            Constant::ComplexInfinity => "ComplexInfinity",
            Constant::NotANumber => "NaN",
        }
    }
}

/// Function vocabulary known to the parser and printers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Func {
    Sin,
    Cos,
    Tan,
    Sec,
    Csc,
    Cot,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Asinh,
    Acosh,
    Atanh,
    Exp,
    Log,
    Abs,
    Sign,
    Factorial,
    Mod,
    /// Series remainder term `O(...)`.
    Order,
}

impl Func {
    pub fn name(&self) -> &'static str {
        match self {
            Func::Sin => "sin",
            Func::Cos => "cos",
            Func::Tan => "tan",
            Func::Sec => "sec",
            Func::Csc => "csc",
            Func::Cot => "cot",
            Func::Asin => "asin",
            Func::Acos => "acos",
            Func::Atan => "atan",
            Func::Sinh => "sinh",
            Func::Cosh => "cosh",
            Func::Tanh => "tanh",
            Func::Asinh => "asinh",
            Func::Acosh => "acosh",
            Func::Atanh => "atanh",
            Func::Exp => "exp",
            Func::Log => "log",
            Func::Abs => "Abs",
            Func::Sign => "sign",
            Func::Factorial => "factorial",
            Func::Mod => "Mod",
            Func::Order => "O",
        }
    }

    /// Value-category tag used in result envelopes.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Func::Order => "Order",
            other => other.name(),
        }
    }

    /// Resolve a source-text name. `None` means the name is an ordinary
    /// symbol (or an unknown function, decided by the caller).
    pub fn from_name(name: &str) -> Option<Func> {
        Some(match name {
            "sin" => Func::Sin,
            "cos" => Func::Cos,
            "tan" => Func::Tan,
            "sec" => Func::Sec,
            "csc" => Func::Csc,
            "cot" => Func::Cot,
            "asin" | "arcsin" => Func::Asin,
            "acos" | "arccos" => Func::Acos,
            "atan" | "arctan" => Func::Atan,
            "sinh" => Func::Sinh,
            "cosh" => Func::Cosh,
            "tanh" => Func::Tanh,
            "asinh" => Func::Asinh,
            "acosh" => Func::Acosh,
            "atanh" => Func::Atanh,
            "exp" => Func::Exp,
            "log" | "ln" => Func::Log,
            "abs" | "Abs" => Func::Abs,
            "sign" => Func::Sign,
            "factorial" => Func::Factorial,
            "Mod" | "mod" => Func::Mod,
            "O" => Func::Order,
            _ => return None,
        })
    }
}

/// An immutable symbolic expression.
///
/// Variant order defines the canonical sort order used when normalizing
/// `Add`/`Mul` argument lists, so it is part of the crate's behavior.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Expr {
    Number(BigRational),
    Constant(Constant),
    Symbol(String),
    Pow(Box<Expr>, Box<Expr>),
    Mul(Vec<Expr>),
    Add(Vec<Expr>),
    Function(Func, Vec<Expr>),
}

impl Expr {
    pub fn integer(n: i64) -> Expr {
        Expr::Number(BigRational::from_integer(BigInt::from(n)))
    }

    pub fn from_bigint(n: BigInt) -> Expr {
        Expr::Number(BigRational::from_integer(n))
    }

    pub fn rational(num: i64, den: i64) -> Expr {
        Expr::Number(BigRational::new(BigInt::from(num), BigInt::from(den)))
    }

    pub fn number(n: BigRational) -> Expr {
        Expr::Number(n)
    }

    pub fn symbol(name: impl Into<String>) -> Expr {
        Expr::Symbol(name.into())
    }

    pub fn zero() -> Expr {
        Expr::integer(0)
    }

    pub fn one() -> Expr {
        Expr::integer(1)
    }

    /// Raw n-ary sum; collapses trivial arities but performs no arithmetic.
    pub fn add(terms: Vec<Expr>) -> Expr {
        match terms.len() {
            0 => Expr::zero(),
            1 => terms.into_iter().next().unwrap_or_else(Expr::zero),
            _ => Expr::Add(terms),
        }
    }

    pub fn add2(a: Expr, b: Expr) -> Expr {
        Expr::Add(vec![a, b])
    }

    /// Raw n-ary product; collapses trivial arities but performs no arithmetic.
    pub fn mul(factors: Vec<Expr>) -> Expr {
        match factors.len() {
            0 => Expr::one(),
            1 => factors.into_iter().next().unwrap_or_else(Expr::one),
            _ => Expr::Mul(factors),
        }
    }

    pub fn mul2(a: Expr, b: Expr) -> Expr {
        Expr::Mul(vec![a, b])
    }

    pub fn pow(base: Expr, exp: Expr) -> Expr {
        Expr::Pow(Box::new(base), Box::new(exp))
    }

    pub fn func(f: Func, args: Vec<Expr>) -> Expr {
        Expr::Function(f, args)
    }

    pub fn neg(self) -> Expr {
        Expr::mul2(Expr::integer(-1), self)
    }

    pub fn sub(a: Expr, b: Expr) -> Expr {
        Expr::add2(a, b.neg())
    }

    pub fn div(a: Expr, b: Expr) -> Expr {
        Expr::mul2(a, Expr::pow(b, Expr::integer(-1)))
    }

    pub fn sqrt(e: Expr) -> Expr {
        Expr::pow(e, Expr::rational(1, 2))
    }

    pub fn as_number(&self) -> Option<&BigRational> {
        match self {
            Expr::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<BigInt> {
        match self {
            Expr::Number(n) if n.is_integer() => Some(n.to_integer()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_integer().and_then(|n| n.to_i64())
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Number(n) if n.is_zero())
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Number(n) if n.is_one())
    }

    pub fn is_minus_one(&self) -> bool {
        matches!(self, Expr::Number(n) if (-n).is_one())
    }

    pub fn is_negative_number(&self) -> bool {
        matches!(self, Expr::Number(n) if n.is_negative())
    }

    pub fn is_infinite(&self) -> bool {
        matches!(
            self,
            Expr::Constant(Constant::Infinity)
                | Expr::Constant(Constant::NegInfinity)
                | Expr::Constant(Constant::ComplexInfinity)
        )
    }

    /// All free symbol names, sorted.
    pub fn free_symbols(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols(&self, out: &mut BTreeSet<String>) {
        match self {
            Expr::Number(_) | Expr::Constant(_) => {}
            Expr::Symbol(name) => {
                out.insert(name.clone());
            }
            Expr::Pow(b, e) => {
                b.collect_symbols(out);
                e.collect_symbols(out);
            }
            Expr::Mul(items) | Expr::Add(items) | Expr::Function(_, items) => {
                for item in items {
                    item.collect_symbols(out);
                }
            }
        }
    }

    pub fn has_symbol(&self, name: &str) -> bool {
        match self {
            Expr::Number(_) | Expr::Constant(_) => false,
            Expr::Symbol(s) => s == name,
            Expr::Pow(b, e) => b.has_symbol(name) || e.has_symbol(name),
            Expr::Mul(items) | Expr::Add(items) | Expr::Function(_, items) => {
                items.iter().any(|item| item.has_symbol(name))
            }
        }
    }

    pub fn is_constant(&self) -> bool {
        self.free_symbols().is_empty()
    }

    /// Replace every occurrence of the symbol `name` with `value`.
    pub fn subs_symbol(&self, name: &str, value: &Expr) -> Expr {
        match self {
            Expr::Number(_) | Expr::Constant(_) => self.clone(),
            Expr::Symbol(s) => {
                if s == name {
                    value.clone()
                } else {
                    self.clone()
                }
            }
            Expr::Pow(b, e) => Expr::pow(b.subs_symbol(name, value), e.subs_symbol(name, value)),
            Expr::Mul(items) => {
                Expr::Mul(items.iter().map(|i| i.subs_symbol(name, value)).collect())
            }
            Expr::Add(items) => {
                Expr::Add(items.iter().map(|i| i.subs_symbol(name, value)).collect())
            }
            Expr::Function(f, items) => Expr::Function(
                *f,
                items.iter().map(|i| i.subs_symbol(name, value)).collect(),
            ),
        }
    }

    /// Value-category tag used in result envelopes.
    pub fn kind_name(&self) -> String {
        match self {
            Expr::Number(n) => {
                if n.is_integer() {
                    "Integer".to_string()
                } else {
                    "Rational".to_string()
                }
            }
            Expr::Constant(c) => c.kind_name().to_string(),
            Expr::Symbol(_) => "Symbol".to_string(),
            Expr::Pow(_, _) => "Pow".to_string(),
            Expr::Mul(_) => "Mul".to_string(),
            Expr::Add(_) => "Add".to_string(),
            Expr::Function(f, _) => f.kind_name().to_string(),
        }
    }

    /// Total polynomial degree, used for display ordering. Non-polynomial
    /// pieces count as degree zero.
    pub fn total_degree(&self) -> i64 {
        match self {
            Expr::Number(_) | Expr::Constant(_) | Expr::Function(_, _) => 0,
            Expr::Symbol(_) => 1,
            Expr::Pow(base, exp) => match exp.as_i64() {
                Some(k) if k > 0 => k.saturating_mul(base.total_degree()),
                _ => 0,
            },
            Expr::Mul(items) => items.iter().map(Expr::total_degree).sum(),
            Expr::Add(items) => items.iter().map(Expr::total_degree).max().unwrap_or(0),
        }
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

/// Whether `e` is a multiple of the imaginary unit. Pure-imaginary terms sort
/// after the real constant in sums so complex values read `1 + 2*I`.
pub(crate) fn is_imaginary_term(e: &Expr) -> bool {
    match e {
        Expr::Constant(Constant::I) => true,
        Expr::Mul(items) => items
            .iter()
            .any(|i| matches!(i, Expr::Constant(Constant::I))),
        _ => false,
    }
}

pub(crate) fn is_order_term(e: &Expr) -> bool {
    matches!(e, Expr::Function(Func::Order, _))
}

/// Split a term into (is_negative, absolute value) for sign-aware joining.
pub(crate) fn sign_split(term: &Expr) -> (bool, Expr) {
    match term {
        Expr::Number(n) if n.is_negative() => (true, Expr::Number(-n)),
        Expr::Mul(items) => {
            if let Some(Expr::Number(n)) = items.first() {
                if n.is_negative() {
                    let mut rest = items.clone();
                    let pos = -n;
                    if pos.is_one() && rest.len() > 1 {
                        rest.remove(0);
                    } else {
                        rest[0] = Expr::Number(pos);
                    }
                    return (true, Expr::mul(rest));
                }
            }
            (false, term.clone())
        }
        _ => (false, term.clone()),
    }
}

/// Display ordering for sum terms: descending polynomial degree with the
/// numeric tail last, except in the presence of a series remainder where
/// ascending powers read naturally.
pub(crate) fn ordered_terms(items: &[Expr]) -> Vec<Expr> {
    let mut terms: Vec<Expr> = items.to_vec();
    let has_order = terms.iter().any(is_order_term);
    if has_order {
        terms.sort_by_key(|t| {
            (
                is_order_term(t),
                t.total_degree(),
                is_imaginary_term(t),
                t.clone(),
            )
        });
    } else {
        terms.sort_by_key(|t| {
            (
                -t.total_degree(),
                is_imaginary_term(t),
                matches!(t, Expr::Number(_)),
                t.clone(),
            )
        });
    }
    terms
}

/// True when the power renders as a numeric surd like `sqrt(2)`; those come
/// first in a product, before symbols.
pub(crate) fn is_numeric_power(e: &Expr) -> bool {
    matches!(e, Expr::Pow(b, x) if matches!(**b, Expr::Number(_)) && matches!(**x, Expr::Number(_)))
}

fn render_mul_operand(e: &Expr) -> String {
    match e {
        Expr::Add(_) => format!("({})", render(e)),
        Expr::Mul(_) => format!("({})", render(e)),
        Expr::Number(n) if n.is_negative() || !n.is_integer() => format!("({})", render(e)),
        _ => render(e),
    }
}

fn render_pow_base(e: &Expr) -> String {
    match e {
        Expr::Add(_) | Expr::Mul(_) | Expr::Pow(_, _) => format!("({})", render(e)),
        Expr::Number(n) if n.is_negative() || !n.is_integer() => format!("({})", render(e)),
        _ => render(e),
    }
}

fn render_pow_exp(e: &Expr) -> String {
    match e {
        Expr::Add(_) | Expr::Mul(_) | Expr::Pow(_, _) => format!("({})", render(e)),
        Expr::Number(n) if n.is_negative() || !n.is_integer() => format!("({})", render(e)),
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
                // Negative numeric exponents render underneath the bar.
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

    let mut num_factors: Vec<String> = Vec::new();
    if !cn.is_one() || numer.is_empty() {
        num_factors.push(cn.to_string());
    }
    let mut sorted_numer = numer;
    sorted_numer.sort_by_key(|f| (!is_numeric_power(f), f.clone()));
    for f in &sorted_numer {
        num_factors.push(render_mul_operand(f));
    }
    let num_str = num_factors.join("*");

    let mut den_factors: Vec<String> = Vec::new();
    if !cd.is_one() {
        den_factors.push(cd.to_string());
    }
    let mut sorted_denom = denom;
    sorted_denom.sort_by_key(|f| (!is_numeric_power(f), f.clone()));
    for f in &sorted_denom {
        den_factors.push(render_mul_operand(f));
    }

    let body = if den_factors.is_empty() {
        num_str
    } else if den_factors.len() == 1 && !den_factors[0].contains('*') {
        format!("{}/{}", num_str, den_factors[0])
    } else {
        format!("{}/({})", num_str, den_factors.join("*"))
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

fn render(e: &Expr) -> String {
    match e {
        Expr::Number(n) => n.to_string(),
        Expr::Constant(c) => c.name().to_string(),
        Expr::Symbol(name) => name.clone(),
        Expr::Add(items) => render_add(items),
        Expr::Mul(items) => render_mul(items),
        Expr::Pow(base, exp) => {
            if let Expr::Number(k) = &**exp {
                let half = BigRational::new(BigInt::from(1), BigInt::from(2));
                if *k == half {
                    return format!("sqrt({})", render(base));
                }
                if *k == -&half {
                    return format!("1/sqrt({})", render(base));
                }
                if (-k).is_one() {
                    return format!("1/{}", render_pow_base(base));
                }
            }
            format!("{}**{}", render_pow_base(base), render_pow_exp(exp))
        }
        Expr::Function(f, args) => {
            let rendered: Vec<String> = args.iter().map(render).collect();
            format!("{}({})", f.name(), rendered.join(", "))
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", render(self))
    }
}
