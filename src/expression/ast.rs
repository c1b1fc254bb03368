//! Expression types and AST for pricing formulas.
//!
//! Formulas come from an editable configuration source, so the AST only has
//! room for arithmetic: literals, variable references, operators, a
//! conditional, and calls into a fixed function table.

use std::collections::BTreeSet;

use thiserror::Error;

/// Binary operators supported in formulas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Gt,
    Lt,
    Gte,
    Lte,
    Eq,
    Neq,
    And,
    Or,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// Expression AST node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A numeric literal (e.g., 42.5)
    Literal(f64),
    /// A variable reference (e.g., "laenge")
    Var(String),
    /// A binary operation (e.g., left + right)
    BinOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// A unary operation (e.g., -x, !flag)
    UnaryOp { op: UnaryOp, operand: Box<Expr> },
    /// if condition then true_expr else false_expr
    Conditional {
        condition: Box<Expr>,
        true_expr: Box<Expr>,
        false_expr: Box<Expr>,
    },
    /// A call into the function allow-list (e.g., ceil(l / 2))
    Function { name: String, args: Vec<Expr> },
}

impl Expr {
    /// Every variable name the expression references, sorted and deduplicated.
    pub fn variables(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables(&self, names: &mut BTreeSet<String>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Var(name) => {
                names.insert(name.clone());
            }
            Expr::BinOp { left, right, .. } => {
                left.collect_variables(names);
                right.collect_variables(names);
            }
            Expr::UnaryOp { operand, .. } => operand.collect_variables(names),
            Expr::Conditional {
                condition,
                true_expr,
                false_expr,
            } => {
                condition.collect_variables(names);
                true_expr.collect_variables(names);
                false_expr.collect_variables(names);
            }
            Expr::Function { args, .. } => {
                for arg in args {
                    arg.collect_variables(names);
                }
            }
        }
    }
}

/// Errors raised while parsing or evaluating a formula
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    /// The formula text is not a valid expression
    #[error("syntax error in '{formula}': {detail}")]
    Syntax { formula: String, detail: String },
    /// Referenced a variable that is not bound (misspelled or declared later)
    #[error("undefined variable: {0}")]
    UndefinedVariable(String),
    /// Called a function outside the allow-list
    #[error("unknown function: {0}")]
    UnknownFunction(String),
    /// Function called with wrong number of arguments
    #[error("function {func} expected {expected} args, got {got}")]
    InvalidArgCount {
        func: String,
        expected: String,
        got: usize,
    },
    /// Attempted to divide by zero
    #[error("division by zero")]
    DivisionByZero,
    /// Arithmetic produced NaN or infinity
    #[error("non-finite result: {0}")]
    NonFinite(String),
}

impl ExprError {
    /// Arithmetic failures, as opposed to authoring mistakes in names or syntax.
    pub fn is_evaluation_error(&self) -> bool {
        !matches!(
            self,
            ExprError::Syntax { .. } | ExprError::UndefinedVariable(_)
        )
    }
}
