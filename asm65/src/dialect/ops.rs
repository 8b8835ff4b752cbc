use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
    BitNot,
    Lo,
    Hi,
    Bank,
    Group,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Lsr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    LogAnd,
    LogOr,
    LogXor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
}

/// Prefix operator. `close` is set for grouping brackets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnaryInfo {
    pub prec: u8,
    pub op: UnaryOp,
    pub close: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryInfo {
    pub prec: u8,
    pub op: BinaryOp,
    pub assoc: Assoc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Func {
    Defined,
    Min,
    Max,
    Abs,
    Int,
    Float,
    Floor,
    Ceil,
    Round,
    Sqrt,
    Sin,
    Cos,
    Pow,
    Mod,
    Strlen,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuncInfo {
    pub func: Func,
    pub min: usize,
    pub max: usize,
}

// ----------------------------------------------------------------------------
// Table builders
// ----------------------------------------------------------------------------

pub const fn un(prec: u8, op: UnaryOp) -> UnaryInfo {
    UnaryInfo {
        prec,
        op,
        close: None,
    }
}

pub const fn group(close: &'static str) -> UnaryInfo {
    UnaryInfo {
        prec: 0,
        op: UnaryOp::Group,
        close: Some(close),
    }
}

pub const fn bin(prec: u8, op: BinaryOp) -> BinaryInfo {
    BinaryInfo {
        prec,
        op,
        assoc: Assoc::Left,
    }
}

pub const fn binr(prec: u8, op: BinaryOp) -> BinaryInfo {
    BinaryInfo {
        prec,
        op,
        assoc: Assoc::Right,
    }
}

pub const fn func(func: Func, min: usize, max: usize) -> FuncInfo {
    FuncInfo { func, min, max }
}

/// Arithmetic used both by constant folding and by the analyzer.
/// Shifts and powers saturate instead of panicking on large operands.
pub fn apply_binary(op: BinaryOp, l: i64, r: i64) -> Option<i64> {
    use BinaryOp::*;
    let b = |v: bool| v as i64;
    let v = match op {
        Add => l.wrapping_add(r),
        Sub => l.wrapping_sub(r),
        Mul => l.wrapping_mul(r),
        Div => l.checked_div(r)?,
        Mod => l.checked_rem(r)?,
        Pow => {
            if r < 0 {
                0
            } else {
                l.wrapping_pow(r.min(u32::MAX as i64) as u32)
            }
        }
        And => l & r,
        Or => l | r,
        Xor => l ^ r,
        Shl => l.checked_shl(r.clamp(0, 64) as u32).unwrap_or(0),
        Shr => l.checked_shr(r.clamp(0, 64) as u32).unwrap_or(if l < 0 { -1 } else { 0 }),
        Lsr => (l as u64).checked_shr(r.clamp(0, 64) as u32).unwrap_or(0) as i64,
        Eq => b(l == r),
        Ne => b(l != r),
        Lt => b(l < r),
        Le => b(l <= r),
        Gt => b(l > r),
        Ge => b(l >= r),
        LogAnd => b(l != 0 && r != 0),
        LogOr => b(l != 0 || r != 0),
        LogXor => b((l != 0) != (r != 0)),
    };
    Some(v)
}

pub fn apply_unary(op: UnaryOp, v: i64) -> i64 {
    match op {
        UnaryOp::Neg => v.wrapping_neg(),
        UnaryOp::Pos | UnaryOp::Group => v,
        UnaryOp::Not => (v == 0) as i64,
        UnaryOp::BitNot => !v,
        UnaryOp::Lo => v & 0xFF,
        UnaryOp::Hi => (v >> 8) & 0xFF,
        UnaryOp::Bank => (v >> 16) & 0xFF,
    }
}

#[test]
fn test() {
    assert_eq!(apply_binary(BinaryOp::Div, 7, 2), Some(3));
    assert_eq!(apply_binary(BinaryOp::Div, 7, 0), None);
    assert_eq!(apply_binary(BinaryOp::Pow, 2, 10), Some(1024));
    assert_eq!(apply_binary(BinaryOp::Lsr, -1, 60), Some(15));
    assert_eq!(apply_unary(UnaryOp::Hi, 0x1234), 0x12);
    assert_eq!(apply_unary(UnaryOp::Not, 1), 0);
}
