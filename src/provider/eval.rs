//! Success/failure condition evaluation.
//!
//! Conditions are small boolean expressions over the measurement's result
//! value, bound to the variable `result`:
//!
//! ```text
//! result > 10
//! asInt(result) >= 3 && asInt(result) < 10
//! result == "Healthy" || result == "Degraded"
//! ```
//!
//! Grammar: `||` over `&&` over single comparisons. The left operand is
//! `result`, optionally wrapped in `asInt(...)` or `asFloat(...)`; the right
//! operand is a numeric or (optionally quoted) string literal. Bare `result`
//! compares numerically when both sides parse as numbers, otherwise by
//! string equality operators.

use crate::error::EvalError;

/// Evaluate a condition expression against a result value.
pub fn evaluate(expr: &str, result: &str) -> Result<bool, EvalError> {
    let parse_err = |reason: &str| EvalError::Parse {
        expr: expr.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = expr.trim();
    if trimmed.is_empty() {
        return Err(parse_err("empty expression"));
    }

    // Disjunction of conjunctions; short-circuiting is not needed since
    // every clause is side-effect free.
    let mut any = false;
    for clause in trimmed.split("||") {
        let mut all = true;
        for comparison in clause.split("&&") {
            if !evaluate_comparison(expr, comparison.trim(), result)? {
                all = false;
            }
        }
        if all {
            any = true;
        }
    }
    Ok(any)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Ne,
    Le,
    Ge,
    Lt,
    Gt,
}

fn evaluate_comparison(full_expr: &str, comparison: &str, result: &str) -> Result<bool, EvalError> {
    let parse_err = |reason: String| EvalError::Parse {
        expr: full_expr.to_string(),
        reason,
    };

    // Multi-character operators must be probed first.
    let ops = [
        ("==", Op::Eq),
        ("!=", Op::Ne),
        ("<=", Op::Le),
        (">=", Op::Ge),
        ("<", Op::Lt),
        (">", Op::Gt),
    ];

    let (lhs, op, rhs) = ops
        .iter()
        .find_map(|(sym, op)| {
            comparison
                .split_once(sym)
                .map(|(l, r)| (l.trim(), *op, r.trim()))
        })
        .ok_or_else(|| parse_err(format!("no comparison operator in '{comparison}'")))?;

    let literal = rhs.trim_matches('"').trim_matches('\'');
    if literal.is_empty() {
        return Err(parse_err(format!("missing right-hand side in '{comparison}'")));
    }

    match lhs {
        "result" => compare_loose(result, op, literal),
        "asInt(result)" => {
            let left = coerce_int(result)?;
            let right: i64 = literal.parse().map_err(|_| {
                parse_err(format!("'{literal}' is not an integer literal"))
            })?;
            Ok(apply_ord(left.cmp(&right), op))
        }
        "asFloat(result)" => {
            let left = coerce_float(result)?;
            let right: f64 = literal.parse().map_err(|_| {
                parse_err(format!("'{literal}' is not a numeric literal"))
            })?;
            compare_floats(left, op, right)
        }
        other => Err(parse_err(format!("unsupported operand '{other}'"))),
    }
}

/// Compare numerically when both sides are numbers, by string otherwise.
fn compare_loose(result: &str, op: Op, literal: &str) -> Result<bool, EvalError> {
    let result = result.trim().trim_matches('"');
    if let (Ok(l), Ok(r)) = (result.parse::<f64>(), literal.parse::<f64>()) {
        return compare_floats(l, op, r);
    }
    match op {
        Op::Eq => Ok(result == literal),
        Op::Ne => Ok(result != literal),
        Op::Lt | Op::Le | Op::Gt | Op::Ge => Err(EvalError::Coerce {
            value: result.to_string(),
            wanted: "number",
        }),
    }
}

fn compare_floats(l: f64, op: Op, r: f64) -> Result<bool, EvalError> {
    Ok(match op {
        Op::Eq => l == r,
        Op::Ne => l != r,
        Op::Lt => l < r,
        Op::Le => l <= r,
        Op::Gt => l > r,
        Op::Ge => l >= r,
    })
}

fn apply_ord(ord: std::cmp::Ordering, op: Op) -> bool {
    use std::cmp::Ordering::*;
    match op {
        Op::Eq => ord == Equal,
        Op::Ne => ord != Equal,
        Op::Lt => ord == Less,
        Op::Le => ord != Greater,
        Op::Gt => ord == Greater,
        Op::Ge => ord != Less,
    }
}

fn coerce_int(value: &str) -> Result<i64, EvalError> {
    let trimmed = value.trim().trim_matches('"');
    // Accept float-shaped values with an integral part, as stores often
    // return "3" as "3.0".
    if let Ok(i) = trimmed.parse::<i64>() {
        return Ok(i);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if f.fract() == 0.0 {
            return Ok(f as i64);
        }
    }
    Err(EvalError::Coerce {
        value: value.to_string(),
        wanted: "integer",
    })
}

fn coerce_float(value: &str) -> Result<f64, EvalError> {
    value
        .trim()
        .trim_matches('"')
        .parse()
        .map_err(|_| EvalError::Coerce {
            value: value.to_string(),
            wanted: "float",
        })
}
