//! Argument binding.
//!
//! One CLI surface serves scalar calls (`add 2 3`), keyword calls
//! (`derivative '{"expr_str": "x**3"}'`), and list calls
//! (`matrix '[[1,2],[3,4]]'`). The shape is decided once, by syntactic
//! inspection of the raw argument list, before any handler runs. A single
//! argument that merely looks like JSON but fails to parse falls back to
//! positional text; that fallback is never an error.

use num_bigint::BigInt;
use num_traits::FromPrimitive;
use serde_json::{Map, Value};

use crate::error::{MathError, MathResult};

/// How the raw CLI arguments bind to handler parameters.
#[derive(Debug, Clone)]
pub enum ArgumentBinding {
    /// Plain string arguments, one per parameter (varargs allowed).
    Positional(Vec<String>),
    /// A single JSON object: keys bind to parameter names.
    Keyword(Map<String, Value>),
    /// A single JSON array: binds as a list, element-wise or whole.
    List(Vec<Value>),
}

impl ArgumentBinding {
    pub fn from_raw(args: &[String]) -> ArgumentBinding {
        if args.len() == 1 {
            let only = &args[0];
            if only.starts_with('{') {
                if let Ok(Value::Object(map)) = serde_json::from_str(only) {
                    return ArgumentBinding::Keyword(map);
                }
            } else if only.starts_with('[') {
                if let Ok(Value::Array(items)) = serde_json::from_str(only) {
                    return ArgumentBinding::List(items);
                }
            }
        }
        ArgumentBinding::Positional(args.to_vec())
    }
}

/// One bound argument, either raw CLI text or a JSON value.
#[derive(Debug, Clone, Copy)]
pub(crate) enum RawArg<'a> {
    Text(&'a str),
    Json(&'a Value),
}

fn value_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

impl<'a> RawArg<'a> {
    /// The argument as expression text, ready for the parser.
    pub(crate) fn expr_text(&self) -> String {
        match self {
            RawArg::Text(s) => (*s).to_string(),
            RawArg::Json(v) => value_text(v),
        }
    }

    pub(crate) fn string(&self, name: &str) -> MathResult<String> {
        match self {
            RawArg::Text(s) => Ok((*s).to_string()),
            RawArg::Json(Value::String(s)) => Ok(s.clone()),
            RawArg::Json(_) => Err(MathError::Argument(format!(
                "argument '{}' must be a string",
                name
            ))),
        }
    }

    pub(crate) fn integer(&self, name: &str) -> MathResult<i64> {
        let bad = || {
            MathError::Argument(format!("argument '{}' must be an integer", name))
        };
        match self {
            RawArg::Text(s) => s.trim().parse::<i64>().map_err(|_| bad()),
            RawArg::Json(Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    Ok(i)
                } else if let Some(f) = n.as_f64() {
                    // Same truncation a float-to-int conversion applies.
                    if f.is_finite() && f.abs() < i64::MAX as f64 {
                        Ok(f.trunc() as i64)
                    } else {
                        Err(bad())
                    }
                } else {
                    Err(bad())
                }
            }
            RawArg::Json(Value::String(s)) => s.trim().parse::<i64>().map_err(|_| bad()),
            RawArg::Json(_) => Err(bad()),
        }
    }

    pub(crate) fn big_integer(&self, name: &str) -> MathResult<BigInt> {
        let bad = || {
            MathError::Argument(format!("argument '{}' must be an integer", name))
        };
        let from_text = |s: &str| {
            BigInt::parse_bytes(s.trim().as_bytes(), 10).ok_or_else(bad)
        };
        match self {
            RawArg::Text(s) => from_text(s),
            RawArg::Json(Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    Ok(BigInt::from(i))
                } else if let Some(u) = n.as_u64() {
                    Ok(BigInt::from(u))
                } else if let Some(f) = n.as_f64() {
                    BigInt::from_f64(f.trunc()).ok_or_else(bad)
                } else {
                    Err(bad())
                }
            }
            RawArg::Json(Value::String(s)) => from_text(s),
            RawArg::Json(_) => Err(bad()),
        }
    }

    pub(crate) fn boolean(&self, name: &str) -> MathResult<bool> {
        let parse = |s: &str| match s.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        };
        let value = match self {
            RawArg::Text(s) => parse(s),
            RawArg::Json(Value::Bool(b)) => Some(*b),
            RawArg::Json(Value::String(s)) => parse(s),
            RawArg::Json(_) => None,
        };
        value.ok_or_else(|| {
            MathError::Argument(format!("argument '{}' must be a boolean", name))
        })
    }

    pub(crate) fn json_array(&self, name: &str) -> MathResult<Vec<Value>> {
        let bad = || {
            MathError::Argument(format!("argument '{}' must be a JSON array", name))
        };
        match self {
            RawArg::Json(Value::Array(items)) => Ok(items.clone()),
            RawArg::Text(s) => match serde_json::from_str(s) {
                Ok(Value::Array(items)) => Ok(items),
                _ => Err(bad()),
            },
            RawArg::Json(_) => Err(bad()),
        }
    }

    pub(crate) fn json_object(&self, name: &str) -> MathResult<Map<String, Value>> {
        let bad = || {
            MathError::Argument(format!("argument '{}' must be a JSON object", name))
        };
        match self {
            RawArg::Json(Value::Object(map)) => Ok(map.clone()),
            RawArg::Text(s) => match serde_json::from_str(s) {
                Ok(Value::Object(map)) => Ok(map),
                _ => Err(bad()),
            },
            RawArg::Json(_) => Err(bad()),
        }
    }
}

enum Source<'a> {
    Positional { items: &'a [String], cursor: usize },
    Keyword { map: &'a Map<String, Value>, taken: Vec<&'static str> },
    List { items: &'a [Value], cursor: usize },
}

/// Sequential parameter extractor over one binding.
///
/// Handlers pull parameters in declaration order with [`Params::required`] /
/// [`Params::optional`], then call [`Params::finish`] so surplus positional
/// arguments and unknown keyword arguments fail loudly.
pub(crate) struct Params<'a> {
    op: &'static str,
    source: Source<'a>,
    required_declared: usize,
    total_declared: usize,
}

impl<'a> Params<'a> {
    pub(crate) fn new(op: &'static str, binding: &'a ArgumentBinding) -> Params<'a> {
        let source = match binding {
            ArgumentBinding::Positional(items) => Source::Positional { items, cursor: 0 },
            ArgumentBinding::Keyword(map) => Source::Keyword { map, taken: Vec::new() },
            ArgumentBinding::List(items) => Source::List { items, cursor: 0 },
        };
        Params {
            op,
            source,
            required_declared: 0,
            total_declared: 0,
        }
    }

    pub(crate) fn required(&mut self, name: &'static str) -> MathResult<RawArg<'a>> {
        self.required_declared += 1;
        self.next(name)?.ok_or_else(|| {
            MathError::Argument(format!(
                "{}() missing 1 required positional argument: '{}'",
                self.op, name
            ))
        })
    }

    pub(crate) fn optional(&mut self, name: &'static str) -> MathResult<Option<RawArg<'a>>> {
        self.next(name)
    }

    fn next(&mut self, name: &'static str) -> MathResult<Option<RawArg<'a>>> {
        self.total_declared += 1;
        match &mut self.source {
            Source::Positional { items, cursor } => {
                if *cursor < items.len() {
                    let arg = RawArg::Text(&items[*cursor]);
                    *cursor += 1;
                    Ok(Some(arg))
                } else {
                    Ok(None)
                }
            }
            Source::Keyword { map, taken } => {
                taken.push(name);
                Ok(map.get(name).map(RawArg::Json))
            }
            Source::List { items, cursor } => {
                if *cursor < items.len() {
                    let arg = RawArg::Json(&items[*cursor]);
                    *cursor += 1;
                    Ok(Some(arg))
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// Remaining arguments for a varargs tail. Keyword bindings contribute
    /// nothing here; stray keys surface in [`Params::finish`].
    pub(crate) fn rest(&mut self) -> Vec<RawArg<'a>> {
        match &mut self.source {
            Source::Positional { items, cursor } => {
                let out = items[*cursor..].iter().map(|s| RawArg::Text(s)).collect();
                *cursor = items.len();
                out
            }
            Source::Keyword { .. } => Vec::new(),
            Source::List { items, cursor } => {
                let out = items[*cursor..].iter().map(RawArg::Json).collect();
                *cursor = items.len();
                out
            }
        }
    }

    /// A parameter that is itself a list. Under a `List` binding the whole
    /// array is this parameter; otherwise it binds like any other argument.
    pub(crate) fn whole_list(&mut self, name: &'static str) -> MathResult<Vec<Value>> {
        self.required_declared += 1;
        self.total_declared += 1;
        match &mut self.source {
            Source::List { items, cursor } => {
                let out = items[*cursor..].to_vec();
                *cursor = items.len();
                Ok(out)
            }
            Source::Keyword { map, taken } => {
                taken.push(name);
                match map.get(name) {
                    Some(v) => RawArg::Json(v).json_array(name),
                    None => Err(MathError::Argument(format!(
                        "{}() missing 1 required positional argument: '{}'",
                        self.op, name
                    ))),
                }
            }
            Source::Positional { items, cursor } => {
                if *cursor < items.len() {
                    let arg = RawArg::Text(&items[*cursor]);
                    *cursor += 1;
                    arg.json_array(name)
                } else {
                    Err(MathError::Argument(format!(
                        "{}() missing 1 required positional argument: '{}'",
                        self.op, name
                    )))
                }
            }
        }
    }

    pub(crate) fn finish(&self) -> MathResult<()> {
        match &self.source {
            Source::Positional { items, cursor } => {
                if *cursor < items.len() {
                    Err(self.arity_error(items.len()))
                } else {
                    Ok(())
                }
            }
            Source::List { items, cursor } => {
                if *cursor < items.len() {
                    Err(self.arity_error(items.len()))
                } else {
                    Ok(())
                }
            }
            Source::Keyword { map, taken } => {
                for key in map.keys() {
                    if !taken.contains(&key.as_str()) {
                        return Err(MathError::Argument(format!(
                            "{}() got an unexpected keyword argument '{}'",
                            self.op, key
                        )));
                    }
                }
                Ok(())
            }
        }
    }

    fn arity_error(&self, given: usize) -> MathError {
        let wording = if self.required_declared == self.total_declared {
            format!(
                "{}() takes {} positional arguments but {} were given",
                self.op, self.total_declared, given
            )
        } else {
            format!(
                "{}() takes from {} to {} positional arguments but {} were given",
                self.op, self.required_declared, self.total_declared, given
            )
        };
        MathError::Argument(wording)
    }
}
