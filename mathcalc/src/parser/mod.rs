//! Expression parsing.
//!
//! Turns calculator notation into an [`Expr`] tree. Implicit multiplication
//! is part of the grammar; the builder resolves names against the constant
//! and function vocabulary, so `sin(x)` is a function application while
//! `x(x+1)` is a product with an unknown name.

use crate::ast::{Constant, Expr, Func};
use crate::error::{MathError, MathResult};
use num_bigint::BigInt;
use num_rational::BigRational;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "src/parser/expr.pest"]
struct ExprParser;

/// Parse `input` into an expression tree.
///
/// Every failure is reported as [`MathError::Parse`] carrying the original
/// text, so callers can surface the message verbatim.
pub fn parse(input: &str) -> MathResult<Expr> {
    let pairs = ExprParser::parse(Rule::program, input)
        .map_err(|e| MathError::parse(input, describe_pest_error(&e)))?;

    for pair in pairs {
        if pair.as_rule() == Rule::program {
            for inner in pair.into_inner() {
                if inner.as_rule() == Rule::expression {
                    return build_expression(inner).map_err(|d| MathError::parse(input, d));
                }
            }
        }
    }
    Err(MathError::parse(input, "empty input"))
}

fn describe_pest_error(e: &pest::error::Error<Rule>) -> String {
    match e.line_col {
        pest::error::LineColLocation::Pos((_, col)) => {
            format!("invalid syntax at column {}", col)
        }
        pest::error::LineColLocation::Span((_, col), _) => {
            format!("invalid syntax at column {}", col)
        }
    }
}

fn build_expression(pair: Pair<Rule>) -> Result<Expr, String> {
    let mut inner = pair.into_inner();
    let first = inner
        .next()
        .ok_or_else(|| "empty expression".to_string())?;
    let mut expr = build_term(first)?;

    while let Some(op) = inner.next() {
        let rhs_pair = inner
            .next()
            .ok_or_else(|| "dangling operator".to_string())?;
        let rhs = build_term(rhs_pair)?;
        expr = if op.as_str() == "+" {
            Expr::add2(expr, rhs)
        } else {
            Expr::sub(expr, rhs)
        };
    }
    Ok(expr)
}

fn build_term(pair: Pair<Rule>) -> Result<Expr, String> {
    let mut inner = pair.into_inner();
    let first = inner
        .next()
        .ok_or_else(|| "empty term".to_string())?;
    let mut expr = build_signed(first)?;

    while let Some(p) = inner.next() {
        match p.as_rule() {
            Rule::mul_op => {
                let rhs_pair = inner
                    .next()
                    .ok_or_else(|| "dangling operator".to_string())?;
                let rhs = build_signed(rhs_pair)?;
                expr = if p.as_str() == "/" {
                    Expr::div(expr, rhs)
                } else {
                    Expr::mul2(expr, rhs)
                };
            }
            Rule::adjacent => {
                let power_pair = p
                    .into_inner()
                    .next()
                    .ok_or_else(|| "empty adjacent operand".to_string())?;
                let rhs = build_power(power_pair)?;
                expr = Expr::mul2(expr, rhs);
            }
            other => return Err(format!("unexpected token '{:?}' in term", other)),
        }
    }
    Ok(expr)
}

fn build_signed(pair: Pair<Rule>) -> Result<Expr, String> {
    let mut negative = false;
    let mut power_pair = None;
    for p in pair.into_inner() {
        if p.as_rule() == Rule::sign {
            if p.as_str() == "-" {
                negative = !negative;
            }
        } else {
            power_pair = Some(p);
        }
    }
    let expr = build_power(power_pair.ok_or_else(|| "missing operand".to_string())?)?;
    Ok(if negative { expr.neg() } else { expr })
}

fn build_power(pair: Pair<Rule>) -> Result<Expr, String> {
    let mut inner = pair.into_inner();
    let base_pair = inner
        .next()
        .ok_or_else(|| "missing operand".to_string())?;
    let base = build_postfix(base_pair)?;

    if inner.next().is_some() {
        // The consumed pair was the power operator; the exponent follows.
        let exp_pair = inner
            .next()
            .ok_or_else(|| "missing exponent".to_string())?;
        let exp = build_signed(exp_pair)?;
        Ok(Expr::pow(base, exp))
    } else {
        Ok(base)
    }
}

fn build_postfix(pair: Pair<Rule>) -> Result<Expr, String> {
    let mut inner = pair.into_inner();
    let atom_pair = inner
        .next()
        .ok_or_else(|| "missing operand".to_string())?;
    let mut expr = build_atom(atom_pair)?;
    for p in inner {
        if p.as_rule() == Rule::bang {
            expr = Expr::func(Func::Factorial, vec![expr]);
        }
    }
    Ok(expr)
}

fn build_atom(pair: Pair<Rule>) -> Result<Expr, String> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| "empty atom".to_string())?;
    match inner.as_rule() {
        Rule::number => build_number(inner.as_str()),
        Rule::call => build_call(inner),
        Rule::name => build_name(inner.as_str()),
        Rule::group => {
            let expr_pair = inner
                .into_inner()
                .next()
                .ok_or_else(|| "empty parentheses".to_string())?;
            build_expression(expr_pair)
        }
        other => Err(format!("unexpected token '{:?}'", other)),
    }
}

fn constant_from_name(name: &str) -> Option<Constant> {
    Some(match name {
        "pi" => Constant::Pi,
        "E" => Constant::E,
        "I" => Constant::I,
        "oo" => Constant::Infinity,
        "zoo" => Constant::ComplexInfinity,
        "nan" => Constant::NotANumber,
        _ => return None,
    })
}

fn build_name(name: &str) -> Result<Expr, String> {
    if let Some(c) = constant_from_name(name) {
        return Ok(Expr::Constant(c));
    }
    if name == "sqrt" || name == "cbrt" || Func::from_name(name).is_some() {
        return Err(format!("missing argument list for function '{}'", name));
    }
    Ok(Expr::symbol(name))
}

fn build_call(pair: Pair<Rule>) -> Result<Expr, String> {
    let mut inner = pair.into_inner();
    let name = inner
        .next()
        .ok_or_else(|| "missing function name".to_string())?
        .as_str()
        .to_string();

    let mut args = Vec::new();
    if let Some(arguments) = inner.next() {
        for p in arguments.into_inner() {
            args.push(build_expression(p)?);
        }
    }

    match name.as_str() {
        "sqrt" => {
            let arg = single_arg("sqrt", args)?;
            Ok(Expr::sqrt(arg))
        }
        "cbrt" => {
            let arg = single_arg("cbrt", args)?;
            Ok(Expr::pow(arg, Expr::rational(1, 3)))
        }
        _ => match Func::from_name(&name) {
            Some(Func::Log) => match args.len() {
                1 => Ok(Expr::func(Func::Log, args)),
                2 => {
                    let mut it = args.into_iter();
                    let value = it.next().ok_or_else(|| "missing argument".to_string())?;
                    let base = it.next().ok_or_else(|| "missing argument".to_string())?;
                    Ok(Expr::div(
                        Expr::func(Func::Log, vec![value]),
                        Expr::func(Func::Log, vec![base]),
                    ))
                }
                n => Err(format!("log() takes 1 or 2 arguments, got {}", n)),
            },
            Some(Func::Mod) => {
                if args.len() == 2 {
                    Ok(Expr::func(Func::Mod, args))
                } else {
                    Err(format!("Mod() takes exactly 2 arguments, got {}", args.len()))
                }
            }
            Some(f) => {
                let arg = single_arg(f.name(), args)?;
                Ok(Expr::func(f, vec![arg]))
            }
            None => {
                // Unknown name applied to one argument is adjacency, i.e.
                // multiplication: x(x+1) means x*(x+1).
                if args.len() == 1 {
                    let base = match constant_from_name(&name) {
                        Some(c) => Expr::Constant(c),
                        None => Expr::symbol(name),
                    };
                    let arg = args.into_iter().next().ok_or_else(|| "missing argument".to_string())?;
                    Ok(Expr::mul2(base, arg))
                } else {
                    Err(format!("unknown function '{}'", name))
                }
            }
        },
    }
}

fn single_arg(name: &str, args: Vec<Expr>) -> Result<Expr, String> {
    if args.len() != 1 {
        return Err(format!(
            "{}() takes exactly 1 argument, got {}",
            name,
            args.len()
        ));
    }
    args.into_iter()
        .next()
        .ok_or_else(|| "missing argument".to_string())
}

fn build_number(text: &str) -> Result<Expr, String> {
    let (mantissa, exp10) = match text.find(['e', 'E']) {
        Some(idx) => {
            let exp: i64 = text[idx + 1..]
                .parse()
                .map_err(|_| format!("invalid exponent in '{}'", text))?;
            (&text[..idx], exp)
        }
        None => (text, 0),
    };
    if exp10.abs() > 32_768 {
        return Err(format!("exponent out of range in '{}'", text));
    }

    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i, f),
        None => (mantissa, ""),
    };
    let digits = format!("{}{}", int_part, frac_part);
    let digits = if digits.is_empty() { "0".to_string() } else { digits };
    let value = BigInt::parse_bytes(digits.as_bytes(), 10)
        .ok_or_else(|| format!("invalid number '{}'", text))?;

    let ten = BigInt::from(10);
    let scale = num_traits::pow(ten.clone(), frac_part.len());
    let mut number = BigRational::new(value, scale);
    if exp10 > 0 {
        number *= BigRational::from_integer(num_traits::pow(ten, exp10 as usize));
    } else if exp10 < 0 {
        number /= BigRational::from_integer(num_traits::pow(ten, (-exp10) as usize));
    }
    Ok(Expr::Number(number))
}
