//! Expression evaluation against the analyzer's view of the symbol table.

use crate::dialect::ops::{apply_binary, apply_unary, BinaryOp, Func, UnaryOp};
use crate::dialect::DialectConfig;
use crate::error::Error;
use crate::grammer::ast::Expr;
use crate::grammer::token::{AnonMark, Span};

#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    // Not known in this pass, may resolve later
    Unresolved(String, Span),
    Semantic(Error, Span),
}

impl EvalError {
    pub fn span(&self) -> Span {
        match self {
            EvalError::Unresolved(_, s) | EvalError::Semantic(_, s) => *s,
        }
    }
}

pub trait EvalContext {
    /// Value of a named symbol, recording the reference
    fn lookup(&mut self, name: &str, span: Span) -> Option<i64>;

    /// Whether a symbol is defined, without counting as a use
    fn defined(&mut self, name: &str) -> bool;

    /// Current program counter
    fn pc(&self) -> Option<i64>;

    /// Address of the anonymous label a mark refers to
    fn anon(&mut self, mark: AnonMark, span: Span) -> Option<i64>;
}

/// Intermediate value. Floats come only from the math functions and turn
/// back into integers, truncated, where a value is used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    pub fn to_int(self) -> i64 {
        match self {
            Num::Int(v) => v,
            Num::Float(f) => f as i64,
        }
    }

    fn to_float(self) -> f64 {
        match self {
            Num::Int(v) => v as f64,
            Num::Float(f) => f,
        }
    }

    fn is_true(self) -> bool {
        match self {
            Num::Int(v) => v != 0,
            Num::Float(f) => f != 0.0,
        }
    }
}

pub fn eval(expr: &Expr, dialect: &DialectConfig, ctx: &mut dyn EvalContext) -> Result<i64, EvalError> {
    eval_num(expr, dialect, ctx).map(Num::to_int)
}

pub fn eval_num(
    expr: &Expr,
    dialect: &DialectConfig,
    ctx: &mut dyn EvalContext,
) -> Result<Num, EvalError> {
    match expr {
        Expr::Number(n, _) => Ok(Num::Int(*n)),
        Expr::Text(s, span) => text_value(s, *span).map(Num::Int),
        Expr::Symbol(name, span) => ctx
            .lookup(name, *span)
            .map(Num::Int)
            .ok_or_else(|| EvalError::Unresolved(name.clone(), *span)),
        Expr::Pc(span) => ctx
            .pc()
            .map(Num::Int)
            .ok_or_else(|| EvalError::Unresolved(dialect.lex.pc_symbol.into(), *span)),
        Expr::Anon(mark, span) => ctx
            .anon(*mark, *span)
            .map(Num::Int)
            .ok_or_else(|| EvalError::Unresolved(mark.to_string(), *span)),
        Expr::Unary(op, inner, _) => Ok(unary(*op, eval_num(inner, dialect, ctx)?)),
        Expr::Group(inner, _) => eval_num(inner, dialect, ctx),
        Expr::Binary(op, l, r, span) => {
            let lv = eval_num(l, dialect, ctx);
            let rv = eval_num(r, dialect, ctx);
            // Logical operators decide on one side alone
            match (op, &lv, &rv) {
                (BinaryOp::LogAnd, Ok(v), _) | (BinaryOp::LogAnd, _, Ok(v)) if !v.is_true() => {
                    return Ok(Num::Int(0))
                }
                (BinaryOp::LogOr, Ok(v), _) | (BinaryOp::LogOr, _, Ok(v)) if v.is_true() => {
                    return Ok(Num::Int(1))
                }
                _ => {}
            }
            binary(*op, lv?, rv?).ok_or(EvalError::Semantic(Error::DivisionByZero, *span))
        }
        Expr::Call(name, args, span) => call(name, args, *span, dialect, ctx),
    }
}

fn unary(op: UnaryOp, v: Num) -> Num {
    match (op, v) {
        (UnaryOp::Neg, Num::Float(f)) => Num::Float(-f),
        (UnaryOp::Pos | UnaryOp::Group, v) => v,
        (op, v) => Num::Int(apply_unary(op, v.to_int())),
    }
}

fn binary(op: BinaryOp, l: Num, r: Num) -> Option<Num> {
    let (Num::Int(a), Num::Int(b)) = (l, r) else {
        return float_binary(op, l.to_float(), r.to_float());
    };
    apply_binary(op, a, b).map(Num::Int)
}

fn float_binary(op: BinaryOp, a: f64, b: f64) -> Option<Num> {
    use BinaryOp::*;
    let flag = |v: bool| Num::Int(v as i64);
    Some(match op {
        Add => Num::Float(a + b),
        Sub => Num::Float(a - b),
        Mul => Num::Float(a * b),
        Div | Mod if b == 0.0 => return None,
        Div => Num::Float(a / b),
        Mod => Num::Float(a % b),
        Pow => Num::Float(a.powf(b)),
        Eq => flag(a == b),
        Ne => flag(a != b),
        Lt => flag(a < b),
        Le => flag(a <= b),
        Gt => flag(a > b),
        Ge => flag(a >= b),
        // Bit and logical operators work on integers
        _ => return apply_binary(op, a as i64, b as i64).map(Num::Int),
    })
}

/// Strings stand for their character code only when one character long
fn text_value(s: &str, span: Span) -> Result<i64, EvalError> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c as i64),
        _ => Err(EvalError::Semantic(Error::NotANumber(s.into()), span)),
    }
}

fn extreme(values: &[Num], max: bool) -> Num {
    values
        .iter()
        .copied()
        .reduce(|a, b| {
            let keep = match (a, b) {
                (Num::Int(x), Num::Int(y)) => (x >= y) == max,
                _ => (a.to_float() >= b.to_float()) == max,
            };
            if keep {
                a
            } else {
                b
            }
        })
        .unwrap_or(Num::Int(0))
}

fn call(
    name: &str,
    args: &[Expr],
    span: Span,
    dialect: &DialectConfig,
    ctx: &mut dyn EvalContext,
) -> Result<Num, EvalError> {
    let info = dialect
        .function(name)
        .ok_or_else(|| EvalError::Semantic(Error::UnknownFunction(name.into()), span))?;
    if args.len() < info.min || args.len() > info.max {
        let expected = if info.min == info.max {
            info.min.to_string()
        } else {
            format!("{} to {}", info.min, info.max)
        };
        return Err(EvalError::Semantic(Error::ArgumentCount(name.into(), expected), span));
    }

    match (info.func, args) {
        (Func::Defined, [Expr::Symbol(sym, _)]) => return Ok(Num::Int(ctx.defined(sym) as i64)),
        (Func::Defined, _) => {
            return Err(EvalError::Semantic(Error::Expected("symbol name".into()), span))
        }
        (Func::Strlen, [Expr::Text(s, _)]) => return Ok(Num::Int(s.chars().count() as i64)),
        _ => {}
    }

    let values = args
        .iter()
        .map(|a| eval_num(a, dialect, ctx))
        .collect::<Result<Vec<_>, _>>()?;
    let first = values.first().copied().unwrap_or(Num::Int(0));
    let float = |f: fn(f64) -> f64| Num::Float(f(first.to_float()));
    let whole = |f: fn(f64) -> f64| Num::Int(f(first.to_float()) as i64);
    Ok(match info.func {
        Func::Min => extreme(&values, false),
        Func::Max => extreme(&values, true),
        Func::Abs => match first {
            Num::Int(v) => Num::Int(v.wrapping_abs()),
            Num::Float(f) => Num::Float(f.abs()),
        },
        Func::Int => Num::Int(first.to_int()),
        Func::Float => Num::Float(first.to_float()),
        Func::Floor => whole(f64::floor),
        Func::Ceil => whole(f64::ceil),
        Func::Round => whole(f64::round),
        Func::Sqrt => float(f64::sqrt),
        Func::Sin => float(f64::sin),
        Func::Cos => float(f64::cos),
        Func::Strlen | Func::Defined => first,
        Func::Pow | Func::Mod => {
            let op = if info.func == Func::Pow {
                BinaryOp::Pow
            } else {
                BinaryOp::Mod
            };
            let second = values.get(1).copied().unwrap_or(Num::Int(0));
            binary(op, first, second).ok_or(EvalError::Semantic(Error::DivisionByZero, span))?
        }
    })
}

/// Context with no symbols, for constant expressions
pub struct ConstContext;

impl EvalContext for ConstContext {
    fn lookup(&mut self, _name: &str, _span: Span) -> Option<i64> {
        None
    }

    fn defined(&mut self, _name: &str) -> bool {
        false
    }

    fn pc(&self) -> Option<i64> {
        None
    }

    fn anon(&mut self, _mark: AnonMark, _span: Span) -> Option<i64> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{get_dialect, DialectId};
    use crate::grammer::{parse_expression, tokenize};

    fn value(text: &str, id: DialectId) -> Result<i64, EvalError> {
        let dialect = get_dialect(id);
        let tokens = tokenize(text, dialect).tokens;
        let (expr, _) = parse_expression(&tokens, dialect).unwrap();
        eval(&expr, dialect, &mut ConstContext)
    }

    #[test]
    fn test() {
        assert_eq!(value("1+2*3", DialectId::Acme), Ok(7));
        assert_eq!(value("2^3^2", DialectId::Acme), Ok(512));
        assert_eq!(value(".not. 1", DialectId::Ca65), Ok(0));
        assert_eq!(value("2 ^ 3", DialectId::Ca65), Ok(1));
        assert_eq!(value("1+2*3", DialectId::Merlin), Ok(9));
        assert_eq!(value("[1+2]*3", DialectId::Dasm), Ok(9));
        assert_eq!(value("2**10", DialectId::Tass64), Ok(1024));
        assert_eq!(value("max(1, 5)", DialectId::Kick), Ok(5));

        // Math functions work in floating point until the value is used
        assert_eq!(value("round(sin(1)*100)", DialectId::Kick), Ok(84));
        assert_eq!(value("sqrt(2)*10", DialectId::Kick), Ok(14));
        assert_eq!(value("sin(1)*100 > 84", DialectId::Kick), Ok(1));
        assert_eq!(value("max(sqrt(2), 1)", DialectId::Kick), Ok(1));
        assert_eq!(value("floor(sqrt(10))", DialectId::Tass64), Ok(3));
        assert_eq!(value("ceil(sqrt(10))", DialectId::Tass64), Ok(4));
        assert_eq!(value("int(cos(0)*3)", DialectId::Acme), Ok(3));

        // Byte selectors lex as word operators
        assert_eq!(value(".hibyte($1234)", DialectId::Ca65), Ok(0x12));
        assert_eq!(value(".lobyte($1234)", DialectId::Ca65), Ok(0x34));
        assert_eq!(value(".bankbyte($123456)", DialectId::Ca65), Ok(0x12));
        assert!(matches!(
            value("1/0", DialectId::Acme),
            Err(EvalError::Semantic(Error::DivisionByZero, _))
        ));
        assert!(matches!(
            value("nowhere+1", DialectId::Acme),
            Err(EvalError::Unresolved(..))
        ));
    }
}
