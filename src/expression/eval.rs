//! Sandboxed evaluation of parsed formulas.
//!
//! Only bound variables and the functions in [`FUNCTIONS`] are reachable.

use super::ast::{BinOp, Expr, ExprError, UnaryOp};
use super::environment::Environment;

/// The complete set of callable functions
pub const FUNCTIONS: [&str; 8] = ["ceil", "floor", "round", "abs", "min", "max", "int", "float"];

impl Expr {
    /// Evaluate against an environment. Comparisons and logic yield 1.0 / 0.0.
    pub fn evaluate(&self, env: &Environment) -> Result<f64, ExprError> {
        let result = match self {
            Expr::Literal(value) => *value,
            Expr::Var(name) => env
                .get(name)
                .ok_or_else(|| ExprError::UndefinedVariable(name.clone()))?,
            Expr::BinOp { op, left, right } => {
                let lhs = left.evaluate(env)?;
                match op {
                    BinOp::And => {
                        if lhs == 0.0 {
                            0.0
                        } else {
                            truth(right.evaluate(env)? != 0.0)
                        }
                    }
                    BinOp::Or => {
                        if lhs != 0.0 {
                            1.0
                        } else {
                            truth(right.evaluate(env)? != 0.0)
                        }
                    }
                    _ => apply_binary(*op, lhs, right.evaluate(env)?)?,
                }
            }
            Expr::UnaryOp { op, operand } => {
                let value = operand.evaluate(env)?;
                match op {
                    UnaryOp::Neg => -value,
                    UnaryOp::Not => truth(value == 0.0),
                }
            }
            Expr::Conditional {
                condition,
                true_expr,
                false_expr,
            } => {
                if condition.evaluate(env)? != 0.0 {
                    true_expr.evaluate(env)?
                } else {
                    false_expr.evaluate(env)?
                }
            }
            Expr::Function { name, args } => {
                if !FUNCTIONS.contains(&name.as_str()) {
                    return Err(ExprError::UnknownFunction(name.clone()));
                }
                let values = args
                    .iter()
                    .map(|arg| arg.evaluate(env))
                    .collect::<Result<Vec<_>, _>>()?;
                call_function(name, &values)?
            }
        };

        if result.is_finite() {
            Ok(result)
        } else {
            Err(ExprError::NonFinite(format!("{:?}", self)))
        }
    }
}

fn truth(condition: bool) -> f64 {
    if condition {
        1.0
    } else {
        0.0
    }
}

fn apply_binary(op: BinOp, lhs: f64, rhs: f64) -> Result<f64, ExprError> {
    let value = match op {
        BinOp::Add => lhs + rhs,
        BinOp::Sub => lhs - rhs,
        BinOp::Mul => lhs * rhs,
        BinOp::Div => {
            if rhs == 0.0 {
                return Err(ExprError::DivisionByZero);
            }
            lhs / rhs
        }
        // Floored modulo: the sign follows the divisor
        BinOp::Mod => {
            if rhs == 0.0 {
                return Err(ExprError::DivisionByZero);
            }
            lhs - rhs * (lhs / rhs).floor()
        }
        BinOp::Gt => truth(lhs > rhs),
        BinOp::Lt => truth(lhs < rhs),
        BinOp::Gte => truth(lhs >= rhs),
        BinOp::Lte => truth(lhs <= rhs),
        BinOp::Eq => truth(lhs == rhs),
        BinOp::Neq => truth(lhs != rhs),
        BinOp::And => truth(lhs != 0.0 && rhs != 0.0),
        BinOp::Or => truth(lhs != 0.0 || rhs != 0.0),
    };
    Ok(value)
}

fn call_function(name: &str, args: &[f64]) -> Result<f64, ExprError> {
    let arg_count = |expected: &str| ExprError::InvalidArgCount {
        func: name.to_string(),
        expected: expected.to_string(),
        got: args.len(),
    };

    match (name, args) {
        ("ceil", [x]) => Ok(x.ceil()),
        ("floor", [x]) => Ok(x.floor()),
        ("abs", [x]) => Ok(x.abs()),
        ("int", [x]) => Ok(x.trunc()),
        ("float", [x]) => Ok(*x),
        ("round", [x]) => Ok(x.round()),
        ("round", [x, digits]) => {
            let factor = 10f64.powi(digits.trunc() as i32);
            Ok((x * factor).round() / factor)
        }
        ("min", [first, rest @ ..]) => Ok(rest.iter().fold(*first, |acc, v| acc.min(*v))),
        ("max", [first, rest @ ..]) => Ok(rest.iter().fold(*first, |acc, v| acc.max(*v))),
        ("round", _) => Err(arg_count("1 or 2")),
        ("min" | "max", _) => Err(arg_count("at least 1")),
        ("ceil" | "floor" | "abs" | "int" | "float", _) => Err(arg_count("1")),
        _ => Err(ExprError::UnknownFunction(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(formula: &str, env: &Environment) -> Result<f64, ExprError> {
        Expr::parse(formula)?.evaluate(env)
    }

    fn env() -> Environment {
        [("L", 5.0), ("a", 2.0), ("b", 3.0), ("zero", 0.0)]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_price_formula() {
        assert_eq!(eval("L * 10 + 50", &env()), Ok(100.0));
    }

    #[test]
    fn test_functions() {
        let env = env();
        assert_eq!(eval("ceil(10 / 2.5) + 1", &env), Ok(5.0));
        assert_eq!(eval("ceil(10 / 3)", &env), Ok(4.0));
        assert_eq!(eval("floor(2.7)", &env), Ok(2.0));
        assert_eq!(eval("round(2.5)", &env), Ok(3.0));
        assert_eq!(eval("round(-2.5)", &env), Ok(-3.0));
        assert_eq!(eval("round(1.2345, 2)", &env), Ok(1.23));
        assert_eq!(eval("min(a, b, 1)", &env), Ok(1.0));
        assert_eq!(eval("max(a)", &env), Ok(2.0));
        assert_eq!(eval("int(-2.7)", &env), Ok(-2.0));
        assert_eq!(eval("float(a) / 4", &env), Ok(0.5));
        assert_eq!(eval("abs(a - b)", &env), Ok(1.0));
    }

    #[test]
    fn test_conditional_and_logic() {
        let env = env();
        assert_eq!(eval("if a > 1 then 30 else 0", &env), Ok(30.0));
        assert_eq!(eval("if a > 2 then 30 else 0", &env), Ok(0.0));
        assert_eq!(eval("a < b && !zero", &env), Ok(1.0));
        assert_eq!(eval("zero || a == 2", &env), Ok(1.0));
        assert_eq!(eval("7 % 3", &env), Ok(1.0));
        assert_eq!(eval("-7 % 3", &env), Ok(2.0));
    }

    #[test]
    fn test_untaken_branch_is_not_evaluated() {
        assert_eq!(eval("if zero > 0 then a / zero else 0", &env()), Ok(0.0));
        assert_eq!(eval("zero && missing", &env()), Ok(0.0));
    }

    #[test]
    fn test_undefined_variable() {
        assert_eq!(
            eval("L * price_per_m", &env()),
            Err(ExprError::UndefinedVariable("price_per_m".into()))
        );
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval("a / zero", &env()), Err(ExprError::DivisionByZero));
        assert_eq!(eval("a % zero", &env()), Err(ExprError::DivisionByZero));
    }

    #[test]
    fn test_only_allow_listed_functions() {
        for formula in ["exec(1)", "open(a)", "eval(L)", "pow(a, b)"] {
            assert!(matches!(
                eval(formula, &env()),
                Err(ExprError::UnknownFunction(_))
            ));
        }
    }

    #[test]
    fn test_wrong_arg_counts() {
        assert!(matches!(
            eval("ceil(a, b)", &env()),
            Err(ExprError::InvalidArgCount { got: 2, .. })
        ));
        assert!(matches!(
            eval("max()", &env()),
            Err(ExprError::InvalidArgCount { got: 0, .. })
        ));
        assert!(matches!(
            eval("round(a, b, 1)", &env()),
            Err(ExprError::InvalidArgCount { got: 3, .. })
        ));
    }

    #[test]
    fn test_non_finite_result_is_rejected() {
        let env: Environment = [("huge", f64::MAX)].into_iter().collect();
        assert!(matches!(
            eval("huge * 10", &env),
            Err(ExprError::NonFinite(_))
        ));
    }
}
