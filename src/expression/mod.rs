//! Restricted arithmetic formulas
//!
//! Formulas are parsed into a small AST and evaluated against an
//! [`Environment`]. There is no path from a formula to anything other than
//! the bound variables and the functions in [`FUNCTIONS`].

pub mod ast;
pub mod environment;
pub mod eval;
pub mod parser;

pub use ast::{BinOp, Expr, ExprError, UnaryOp};
pub use environment::Environment;
pub use eval::FUNCTIONS;
pub use parser::{MAX_DEPTH, MAX_OPERATORS};

/// Parse and evaluate a formula in one step
pub fn evaluate(formula: &str, env: &Environment) -> Result<f64, ExprError> {
    let trimmed = formula.trim();
    tracing::trace!(formula = trimmed, "evaluating formula");
    Expr::parse(trimmed)?.evaluate(env)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_one_shot() {
        let env: Environment = [("L", 5.0)].into_iter().collect();
        assert_eq!(evaluate(" L * 10 + 50 ", &env), Ok(100.0));
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let env: Environment = [("a", 1.1), ("b", 2.2)].into_iter().collect();
        let first = evaluate("round(a * b / 3, 4) + max(a, b)", &env);
        for _ in 0..10 {
            assert_eq!(evaluate("round(a * b / 3, 4) + max(a, b)", &env), first);
        }
    }

    #[test]
    fn test_hostile_formulas_fail_as_syntax_errors() {
        let env = Environment::new();
        let deep = format!("{}1{}", "(".repeat(1_000), ")".repeat(1_000));
        assert!(matches!(evaluate(&deep, &env), Err(ExprError::Syntax { .. })));

        let long = vec!["1"; 10_000].join("+");
        assert!(matches!(evaluate(&long, &env), Err(ExprError::Syntax { .. })));

        let within = vec!["1"; 200].join("+");
        assert_eq!(evaluate(&within, &env), Ok(200.0));
    }
}
