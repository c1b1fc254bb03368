//! nom grammar for pricing formulas.
//!
//! Precedence, loosest first:
//! `if/then/else`, `||`, `&&`, comparisons, `+ -`, `* / %`, unary `- + !`,
//! then literals, calls, variables and parentheses.
//!
//! Formulas come from editable configuration, so the grammar bounds both the
//! nesting depth and the operator count. Past either limit parsing fails with
//! a syntax error instead of recursing further.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit0, digit1, multispace0, satisfy},
    combinator::{all_consuming, map_res, not, opt, recognize, value, verify},
    error::{Error, ErrorKind},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, terminated},
    IResult, Parser,
};

use super::ast::{BinOp, Expr, ExprError, UnaryOp};

type Res<'a, T> = IResult<&'a str, T>;

const KEYWORDS: [&str; 3] = ["if", "then", "else"];

/// Deepest nesting of parentheses, call arguments, prefix operators and
/// conditionals a formula may use
pub const MAX_DEPTH: usize = 32;

/// Most operator characters a formula may contain
pub const MAX_OPERATORS: usize = 256;

const OPERATOR_CHARS: [char; 11] = ['+', '-', '*', '/', '%', '<', '>', '=', '!', '&', '|'];

impl Expr {
    /// Parse a formula string into an AST
    pub fn parse(formula: &str) -> Result<Expr, ExprError> {
        let operators = formula.chars().filter(|c| OPERATOR_CHARS.contains(c)).count();
        if operators > MAX_OPERATORS {
            return Err(ExprError::Syntax {
                formula: formula.to_string(),
                detail: format!(
                    "formula has too many operators ({}, at most {})",
                    operators, MAX_OPERATORS
                ),
            });
        }

        match all_consuming(|i| expression(i, 0)).parse(formula) {
            Ok((_, expr)) => Ok(expr),
            Err(nom::Err::Failure(e)) if e.code == ErrorKind::TooLarge => Err(ExprError::Syntax {
                formula: formula.to_string(),
                detail: "formula nested too deeply".to_string(),
            }),
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(ExprError::Syntax {
                formula: formula.to_string(),
                detail: describe_position(e.input),
            }),
            Err(nom::Err::Incomplete(_)) => Err(ExprError::Syntax {
                formula: formula.to_string(),
                detail: "incomplete expression".to_string(),
            }),
        }
    }
}

fn describe_position(rest: &str) -> String {
    let rest = rest.trim();
    if rest.is_empty() {
        "unexpected end of formula".to_string()
    } else {
        format!("unexpected input at '{}'", rest)
    }
}

/// Enter one nesting level, failing hard once `MAX_DEPTH` is reached
fn nested(input: &str, depth: usize) -> Result<usize, nom::Err<Error<&str>>> {
    if depth >= MAX_DEPTH {
        Err(nom::Err::Failure(Error::new(input, ErrorKind::TooLarge)))
    } else {
        Ok(depth + 1)
    }
}

fn ws<'a, O, P>(inner: P) -> impl Parser<&'a str, Output = O, Error = Error<&'a str>>
where
    P: Parser<&'a str, Output = O, Error = Error<&'a str>>,
{
    delimited(multispace0, inner, multispace0)
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn keyword<'a>(
    word: &'static str,
) -> impl Parser<&'a str, Output = &'a str, Error = Error<&'a str>> {
    terminated(tag(word), not(satisfy(is_ident_char)))
}

fn identifier(input: &str) -> Res<'_, &str> {
    verify(
        recognize(pair(take_while1(is_ident_start), take_while(is_ident_char))),
        |name: &str| !KEYWORDS.contains(&name),
    )
    .parse(input)
}

fn number(input: &str) -> Res<'_, Expr> {
    map_res(
        alt((
            recognize((digit1, opt((char('.'), digit0)))),
            recognize((char('.'), digit1)),
        )),
        |text: &str| text.parse::<f64>(),
    )
    .map(Expr::Literal)
    .parse(input)
}

fn call_or_var(input: &str, depth: usize) -> Res<'_, Expr> {
    let (input, name) = identifier(input)?;
    let (rest, open) = opt(ws(char('('))).parse(input)?;
    if open.is_none() {
        return Ok((input, Expr::Var(name.to_string())));
    }

    let depth = nested(rest, depth)?;
    let (rest, args) = separated_list0(char(','), |i| expression(i, depth)).parse(rest)?;
    let (rest, _) = char(')').parse(rest)?;
    Ok((
        rest,
        Expr::Function {
            name: name.to_string(),
            args,
        },
    ))
}

fn parens(input: &str, depth: usize) -> Res<'_, Expr> {
    let (input, _) = char('(').parse(input)?;
    let depth = nested(input, depth)?;
    let (input, expr) = expression(input, depth)?;
    let (input, _) = char(')').parse(input)?;
    Ok((input, expr))
}

fn primary(input: &str, depth: usize) -> Res<'_, Expr> {
    ws(alt((number, |i| parens(i, depth), |i| call_or_var(i, depth)))).parse(input)
}

fn unary(input: &str, depth: usize) -> Res<'_, Expr> {
    let (rest, prefix) = opt(ws(alt((char('-'), char('+'), char('!'))))).parse(input)?;
    let Some(prefix) = prefix else {
        return primary(input, depth);
    };

    let depth = nested(rest, depth)?;
    let (rest, operand) = unary(rest, depth)?;
    let expr = match prefix {
        '-' => Expr::UnaryOp {
            op: UnaryOp::Neg,
            operand: Box::new(operand),
        },
        '!' => Expr::UnaryOp {
            op: UnaryOp::Not,
            operand: Box::new(operand),
        },
        _ => operand,
    };
    Ok((rest, expr))
}

fn fold_left(first: Expr, rest: Vec<(BinOp, Expr)>) -> Expr {
    rest.into_iter().fold(first, |left, (op, right)| Expr::BinOp {
        op,
        left: Box::new(left),
        right: Box::new(right),
    })
}

fn term(input: &str, depth: usize) -> Res<'_, Expr> {
    let (input, first) = unary(input, depth)?;
    let (input, rest) = many0((
        ws(alt((
            value(BinOp::Mul, char('*')),
            value(BinOp::Div, char('/')),
            value(BinOp::Mod, char('%')),
        ))),
        |i| unary(i, depth),
    ))
    .parse(input)?;
    Ok((input, fold_left(first, rest)))
}

fn additive(input: &str, depth: usize) -> Res<'_, Expr> {
    let (input, first) = term(input, depth)?;
    let (input, rest) = many0((
        ws(alt((value(BinOp::Add, char('+')), value(BinOp::Sub, char('-'))))),
        |i| term(i, depth),
    ))
    .parse(input)?;
    Ok((input, fold_left(first, rest)))
}

fn comparison(input: &str, depth: usize) -> Res<'_, Expr> {
    let (input, left) = additive(input, depth)?;
    let (input, tail) = opt((
        ws(alt((
            value(BinOp::Eq, tag("==")),
            value(BinOp::Neq, tag("!=")),
            value(BinOp::Gte, tag(">=")),
            value(BinOp::Lte, tag("<=")),
            value(BinOp::Gt, tag(">")),
            value(BinOp::Lt, tag("<")),
        ))),
        |i| additive(i, depth),
    ))
    .parse(input)?;

    let expr = match tail {
        Some((op, right)) => Expr::BinOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        None => left,
    };
    Ok((input, expr))
}

fn logical_and(input: &str, depth: usize) -> Res<'_, Expr> {
    let (input, first) = comparison(input, depth)?;
    let (input, rest) =
        many0((value(BinOp::And, ws(tag("&&"))), |i| comparison(i, depth))).parse(input)?;
    Ok((input, fold_left(first, rest)))
}

fn logical_or(input: &str, depth: usize) -> Res<'_, Expr> {
    let (input, first) = logical_and(input, depth)?;
    let (input, rest) =
        many0((value(BinOp::Or, ws(tag("||"))), |i| logical_and(i, depth))).parse(input)?;
    Ok((input, fold_left(first, rest)))
}

fn conditional(input: &str, depth: usize) -> Res<'_, Expr> {
    let (input, _) = ws(keyword("if")).parse(input)?;
    let depth = nested(input, depth)?;
    let (input, condition) = logical_or(input, depth)?;
    let (input, _) = ws(keyword("then")).parse(input)?;
    let (input, true_expr) = expression(input, depth)?;
    let (input, _) = ws(keyword("else")).parse(input)?;
    let (input, false_expr) = expression(input, depth)?;

    Ok((
        input,
        Expr::Conditional {
            condition: Box::new(condition),
            true_expr: Box::new(true_expr),
            false_expr: Box::new(false_expr),
        },
    ))
}

fn expression(input: &str, depth: usize) -> Res<'_, Expr> {
    alt((|i| conditional(i, depth), |i| logical_or(i, depth))).parse(input)
}
