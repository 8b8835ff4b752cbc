use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum AddrMode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndirectX,
    IndirectY,
    ZeroPageIndirect,
    Relative,
}

impl AddrMode {
    /// Instruction length in bytes, opcode included.
    pub fn size(&self) -> u32 {
        use AddrMode::*;
        match self {
            Implied | Accumulator => 1,
            Immediate | ZeroPage | ZeroPageX | ZeroPageY => 2,
            IndirectX | IndirectY | ZeroPageIndirect | Relative => 2,
            Absolute | AbsoluteX | AbsoluteY | Indirect => 3,
        }
    }

    /// Modes that address a single zero-page byte.
    pub fn is_zeropage(&self) -> bool {
        use AddrMode::*;
        matches!(
            self,
            ZeroPage | ZeroPageX | ZeroPageY | IndirectX | IndirectY | ZeroPageIndirect
        )
    }

    /// Modes whose operand is a memory address (as opposed to an immediate value).
    pub fn is_address(&self) -> bool {
        !matches!(
            self,
            AddrMode::Implied | AddrMode::Accumulator | AddrMode::Immediate
        )
    }
}

/// Operand shape as written in source, before a size is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Form {
    Implied,
    Accumulator,
    Immediate,
    Direct,
    DirectX,
    DirectY,
    Indirect,
    IndirectX,
    IndirectY,
}

#[test]
fn test() {
    assert_eq!(AddrMode::Absolute.size(), 3);
    assert_eq!(AddrMode::Relative.size(), 2);
    assert!(AddrMode::IndirectY.is_zeropage());
    assert!(!AddrMode::Immediate.is_address());
}
