//! Strategy compiler: AST to executable signal functions.
//!
//! Compilation resolves indicator names and checks argument shapes up front,
//! so every semantic error surfaces before any market data is touched. The
//! output is a tree of boxed closures, each producing a vector aligned with
//! the bar series. Comparisons involving NaN are false, never signals.

use std::fmt;

use crate::domain::ast::{CmpOp, Expr, Strategy, Value};
use crate::domain::bar::PriceSeries;
use crate::domain::error::{SemanticError, StratlangError};
use crate::domain::indicator::{rsi, sma};

/// A compiled numeric expression: one f64 per bar, NaN where undefined.
pub type ValueFn = Box<dyn Fn(&PriceSeries) -> Vec<f64>>;

/// A compiled boolean expression: one bool per bar.
pub type PredicateFn = Box<dyn Fn(&PriceSeries) -> Vec<bool>>;

/// Entry and exit signal vectors, aligned with the bar series.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSet {
    pub entry: Vec<bool>,
    pub exit: Vec<bool>,
}

/// A strategy compiled down to signal functions, reusable across series.
pub struct CompiledStrategy {
    entry: Option<PredicateFn>,
    exit: Option<PredicateFn>,
}

impl fmt::Debug for CompiledStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The clauses are opaque closures; show only their presence.
        f.debug_struct("CompiledStrategy")
            .field("entry", &self.entry.as_ref().map(|_| "<compiled>"))
            .field("exit", &self.exit.as_ref().map(|_| "<compiled>"))
            .finish()
    }
}

impl CompiledStrategy {
    /// Evaluate both clauses against a series. An absent clause yields an
    /// all-false vector.
    pub fn evaluate(&self, series: &PriceSeries) -> SignalSet {
        let all_false = || vec![false; series.len()];
        SignalSet {
            entry: self.entry.as_ref().map_or_else(all_false, |f| f(series)),
            exit: self.exit.as_ref().map_or_else(all_false, |f| f(series)),
        }
    }
}

pub fn compile(strategy: &Strategy) -> Result<CompiledStrategy, StratlangError> {
    Ok(CompiledStrategy {
        entry: strategy.entry.as_ref().map(compile_expr).transpose()?,
        exit: strategy.exit.as_ref().map(compile_expr).transpose()?,
    })
}

fn compile_expr(expr: &Expr) -> Result<PredicateFn, StratlangError> {
    match expr {
        Expr::Comparison { left, op, right } => {
            let left = compile_value(left)?;
            let right = compile_value(right)?;
            let op = *op;
            Ok(Box::new(move |series| {
                left(series)
                    .iter()
                    .zip(right(series).iter())
                    .map(|(&a, &b)| apply_cmp(op, a, b))
                    .collect()
            }))
        }
        Expr::Cross { left, right } => {
            let left = compile_value(left)?;
            let right = compile_value(right)?;
            Ok(Box::new(move |series| {
                cross_above(&left(series), &right(series))
            }))
        }
        Expr::And(a, b) => {
            let a = compile_expr(a)?;
            let b = compile_expr(b)?;
            Ok(Box::new(move |series| {
                a(series)
                    .iter()
                    .zip(b(series).iter())
                    .map(|(&x, &y)| x && y)
                    .collect()
            }))
        }
        Expr::Or(a, b) => {
            let a = compile_expr(a)?;
            let b = compile_expr(b)?;
            Ok(Box::new(move |series| {
                a(series)
                    .iter()
                    .zip(b(series).iter())
                    .map(|(&x, &y)| x || y)
                    .collect()
            }))
        }
    }
}

fn compile_value(value: &Value) -> Result<ValueFn, StratlangError> {
    match value {
        Value::Column(column) => {
            let column = *column;
            Ok(Box::new(move |series| series.column(column)))
        }
        Value::Number(n) => {
            let n = *n;
            Ok(Box::new(move |series| vec![n; series.len()]))
        }
        Value::Shift { column, lag } => {
            let column = *column;
            let lag = *lag;
            Ok(Box::new(move |series| shift(&series.column(column), lag)))
        }
        Value::Indicator { name, args } => compile_indicator(name, args),
    }
}

fn compile_indicator(name: &str, args: &[Value]) -> Result<ValueFn, StratlangError> {
    let kind: fn(&[f64], usize) -> Vec<f64> = match name.to_ascii_lowercase().as_str() {
        "sma" => sma,
        "rsi" => rsi,
        _ => {
            return Err(SemanticError::new(format!("unknown indicator '{name}'")).into());
        }
    };
    if args.len() != 2 {
        return Err(SemanticError::new(format!(
            "{name} takes 2 arguments (series, period), got {}",
            args.len()
        ))
        .into());
    }
    let input = compile_value(&args[0])?;
    let period = match &args[1] {
        Value::Number(n) if n.fract() == 0.0 && *n >= 1.0 => *n as usize,
        _ => {
            return Err(SemanticError::new(format!(
                "{name} period must be a positive integer"
            ))
            .into());
        }
    };
    Ok(Box::new(move |series| kind(&input(series), period)))
}

fn apply_cmp(op: CmpOp, a: f64, b: f64) -> bool {
    if a.is_nan() || b.is_nan() {
        return false;
    }
    match op {
        CmpOp::Gt => a > b,
        CmpOp::Lt => a < b,
        CmpOp::Ge => a >= b,
        CmpOp::Le => a <= b,
        CmpOp::Eq => a == b,
    }
}

/// True at `i` when `left` was at or below `right` on the previous bar and is
/// strictly above on this one. False at index 0 and wherever any of the four
/// operands is NaN.
fn cross_above(left: &[f64], right: &[f64]) -> Vec<bool> {
    let n = left.len().min(right.len());
    let mut out = vec![false; n];
    for i in 1..n {
        let operands = [left[i - 1], right[i - 1], left[i], right[i]];
        if operands.iter().any(|v| v.is_nan()) {
            continue;
        }
        out[i] = left[i - 1] <= right[i - 1] && left[i] > right[i];
    }
    out
}

/// Shift a vector forward by `lag` positions, filling the head with NaN.
fn shift(values: &[f64], lag: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    for i in lag..n {
        out[i] = values[i - lag];
    }
    out
}
