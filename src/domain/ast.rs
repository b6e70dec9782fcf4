//! Strategy AST data structures.
//!
//! Two closed tagged unions:
//! - [`Value`]: numeric per-bar series (columns, literals, indicator calls,
//!   lagged column references)
//! - [`Expr`]: boolean per-bar predicates (comparisons, crosses, AND/OR)
//!
//! The split makes boolean-vs-numeric type mismatches unrepresentable;
//! a comparison can only ever hold value operands.

use std::fmt;

use crate::domain::bar::Column;

/// Comparison operators usable between two values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CmpOp::Gt => ">",
            CmpOp::Lt => "<",
            CmpOp::Ge => ">=",
            CmpOp::Le => "<=",
            CmpOp::Eq => "==",
        };
        write!(f, "{s}")
    }
}

/// A numeric per-bar value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Column(Column),
    Number(f64),
    /// Indicator call, e.g. `SMA(close, 20)`. The name is resolved by the
    /// compiler so unknown indicators surface as semantic errors.
    Indicator { name: String, args: Vec<Value> },
    /// `column.shift(lag)`: the column value `lag` bars in the past.
    Shift { column: Column, lag: usize },
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Column(column) => write!(f, "{}", column.name()),
            Value::Number(n) => write!(f, "{n}"),
            Value::Indicator { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Value::Shift { column, lag } => write!(f, "{}.shift({lag})", column.name()),
        }
    }
}

/// A boolean per-bar predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Comparison {
        left: Value,
        op: CmpOp,
        right: Value,
    },
    /// `CROSS(left, right)`: left moves from at-or-below to strictly above.
    Cross {
        left: Value,
        right: Value,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Comparison { left, op, right } => write!(f, "{left} {op} {right}"),
            Expr::Cross { left, right } => write!(f, "CROSS({left}, {right})"),
            Expr::And(a, b) => write!(f, "({a} AND {b})"),
            Expr::Or(a, b) => write!(f, "({a} OR {b})"),
        }
    }
}

/// A parsed strategy. Either clause may be absent; an absent clause
/// evaluates to an all-false signal vector.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Strategy {
    pub entry: Option<Expr>,
    pub exit: Option<Expr>,
}
