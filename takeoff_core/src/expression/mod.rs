//! # Expression Evaluator
//!
//! Evaluates the arithmetic formulas that component and material
//! definitions carry (e.g. `"buildup_area * 0.15"`) against a set of named
//! numeric variables. Formulas are parsed into a small expression tree and
//! walked; nothing outside arithmetic, parentheses, variables and a fixed
//! list of pure functions can run.
//!
//! ## Supported syntax
//!
//! - Numbers: `12`, `2.5`, `.5`, `1e3`
//! - Operators: `+ - * /`, `^` (power, right-associative), postfix `%` (÷100)
//! - Grouping: `( … )`
//! - Functions: `min`, `max`, `abs`, `round`, `floor`, `ceil`, `sqrt`
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::expression::{evaluate, Env};
//! use takeoff_core::quantity::Quantity;
//!
//! let env = Env::new().with("width", 40.0).with("depth", 30.0);
//!
//! assert_eq!(evaluate("width * depth * 10%", &env), Quantity::Value(120.0));
//! assert_eq!(evaluate("width * height", &env), Quantity::Unavailable);
//! ```

pub mod lexer;
pub mod parser;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::quantity::Quantity;
pub use parser::{parse, BinaryOp, Expr};

/// Why a formula could not produce a number.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    #[error("formula is empty")]
    Empty,

    #[error("unexpected character '{ch}' at {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("invalid number '{text}' at {pos}")]
    InvalidNumber { text: String, pos: usize },

    #[error("unexpected '{found}' at {pos}")]
    UnexpectedToken { found: String, pos: usize },

    #[error("unexpected end of formula")]
    UnexpectedEnd,

    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("{name}() takes {expected} argument(s), got {found}")]
    Arity {
        name: String,
        expected: &'static str,
        found: usize,
    },

    #[error("result is not a finite number")]
    NonFinite,

    #[error("formula nests deeper than {0} levels")]
    TooDeep(usize),

    #[error("formula is longer than {0} tokens")]
    TooLong(usize),
}

/// Named numeric variables a formula can reference.
///
/// Lookup is exact first, then case-insensitive, so `BuildupArea` and
/// `buildupArea` both resolve when only one spelling is bound.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Env {
    vars: BTreeMap<String, f64>,
}

impl Env {
    pub fn new() -> Self {
        Env::default()
    }

    /// Builder-style binding
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.vars.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.vars.get(name).copied().or_else(|| {
            self.vars
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| *v)
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }
}

impl Expr {
    /// Evaluate the tree against `env`.
    pub fn eval(&self, env: &Env) -> Result<f64, ExprError> {
        match self {
            Expr::Number(n) => Ok(*n),
            Expr::Variable(name) => env
                .get(name)
                .ok_or_else(|| ExprError::UnknownVariable(name.clone())),
            Expr::Negate(inner) => Ok(-inner.eval(env)?),
            Expr::Percent(inner) => Ok(inner.eval(env)? / 100.0),
            Expr::Binary { op, lhs, rhs } => {
                let a = lhs.eval(env)?;
                let b = rhs.eval(env)?;
                Ok(match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    BinaryOp::Pow => a.powf(b),
                })
            }
            Expr::Call { name, args } => {
                let values = args
                    .iter()
                    .map(|a| a.eval(env))
                    .collect::<Result<Vec<_>, _>>()?;
                call_function(name, &values)
            }
        }
    }

    /// Every variable name the expression references.
    pub fn variables(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out.sort();
        out.dedup();
        out
    }

    fn collect_variables(&self, out: &mut Vec<String>) {
        match self {
            Expr::Number(_) => {}
            Expr::Variable(name) => out.push(name.clone()),
            Expr::Negate(inner) | Expr::Percent(inner) => inner.collect_variables(out),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_variables(out);
                rhs.collect_variables(out);
            }
            Expr::Call { args, .. } => args.iter().for_each(|a| a.collect_variables(out)),
        }
    }
}

fn call_function(name: &str, args: &[f64]) -> Result<f64, ExprError> {
    let unary = |f: fn(f64) -> f64| -> Result<f64, ExprError> {
        match args {
            [x] => Ok(f(*x)),
            _ => Err(ExprError::Arity {
                name: name.to_string(),
                expected: "1",
                found: args.len(),
            }),
        }
    };
    let fold = |f: fn(f64, f64) -> f64| -> Result<f64, ExprError> {
        match args.split_first() {
            Some((first, rest)) => Ok(rest.iter().fold(*first, |acc, x| f(acc, *x))),
            None => Err(ExprError::Arity {
                name: name.to_string(),
                expected: "1 or more",
                found: 0,
            }),
        }
    };

    match name.to_ascii_lowercase().as_str() {
        "min" => fold(f64::min),
        "max" => fold(f64::max),
        "abs" => unary(f64::abs),
        "round" => unary(f64::round),
        "floor" => unary(f64::floor),
        "ceil" => unary(f64::ceil),
        "sqrt" => unary(f64::sqrt),
        _ => Err(ExprError::UnknownFunction(name.to_string())),
    }
}

/// Parse and evaluate, keeping the failure reason.
pub fn try_evaluate(formula: &str, env: &Env) -> Result<f64, ExprError> {
    let value = parse(formula)?.eval(env)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ExprError::NonFinite)
    }
}

/// Parse and evaluate, mapping any failure to [`Quantity::Unavailable`].
///
/// This is the entry point the pipeline uses: a broken formula never aborts
/// a pass, it only blanks the one result that depends on it.
pub fn evaluate(formula: &str, env: &Env) -> Quantity {
    match try_evaluate(formula, env) {
        Ok(value) => Quantity::Value(value),
        Err(e) => {
            log::warn!("formula '{}' unavailable: {}", formula, e);
            Quantity::Unavailable
        }
    }
}
